//! Request/response envelope shared by every backend

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::GatewayError;
use crate::entities::record::{NewRecord, Record, RecordId};

pub const GET_SERVICES: &str = "getServices";
pub const ADD_SERVICE: &str = "addService";
pub const UPDATE_SERVICE: &str = "updateService";
pub const DELETE_SERVICE: &str = "deleteService";

/// `{ action, payload? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

impl Request {
    pub fn new(action: impl Into<String>, payload: Option<Value>) -> Self {
        Self {
            action: action.into(),
            payload,
        }
    }

    pub fn get_services() -> Self {
        Self::new(GET_SERVICES, None)
    }

    pub fn add_service(record: &NewRecord) -> Self {
        Self::new(ADD_SERVICE, Some(serde_json::json!({ "service": record })))
    }

    pub fn update_service(record: &Record) -> Self {
        Self::new(
            UPDATE_SERVICE,
            Some(serde_json::json!({ "service": record.to_sheet_row() })),
        )
    }

    pub fn delete_service(id: RecordId) -> Self {
        Self::new(DELETE_SERVICE, Some(serde_json::json!({ "id": id })))
    }

    /// Field of the payload object, if any
    pub fn payload_field(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|p| p.get(key))
    }
}

/// `{ success, data?, error?, code? }`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Machine-readable failure category (`network`, `protocol`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

impl Response {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
        }
    }

    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            code: None,
        }
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Unwrap the payload, turning `success: false` into a business error
    pub fn into_data(self) -> Result<Value, GatewayError> {
        if self.success {
            Ok(self.data.unwrap_or(Value::Null))
        } else {
            Err(GatewayError::Business {
                message: self
                    .error
                    .unwrap_or_else(|| "The backend reported an unknown error".to_string()),
                code: self.code,
            })
        }
    }
}

/// Decode an envelope payload into a typed value
pub fn decode<T>(action: &str, data: Value) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
{
    serde_json::from_value(data)
        .map_err(|e| GatewayError::Protocol(format!("invalid JSON data for {}: {}", action, e)))
}

#[derive(Debug, Deserialize)]
struct Deleted {
    id: RecordId,
}

/// Id echoed by a delete; falls back to the requested id when absent
pub fn deleted_id(data: Value, requested: RecordId) -> RecordId {
    serde_json::from_value::<Deleted>(data)
        .map(|d| d.id)
        .unwrap_or(requested)
}
