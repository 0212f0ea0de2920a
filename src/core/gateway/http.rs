//! HTTP backend speaking the `{action, payload}` envelope.
//!
//! Requests are POSTed as `text/plain` JSON so a script-hosted backend
//! accepts them without a CORS preflight; redirects are followed.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, redirect, Client};
use serde_json::Value;

use super::envelope::{self, Request, Response};
use super::webhook::{AutomationPayload, WebhookClient};
use super::{Gateway, GatewayError};
use crate::entities::record::{NewRecord, Record, RecordId};

const CONTENT_TYPE: &str = "text/plain;charset=utf-8";
const MAX_REDIRECTS: usize = 10;

/// Gateway backed by a remote web app
pub struct HttpGateway {
    client: Client,
    url: String,
    webhook: WebhookClient,
}

impl HttpGateway {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        webhook_url: Option<String>,
    ) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(concat!("idf/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| GatewayError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self {
            webhook: WebhookClient::new(client.clone(), webhook_url),
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Send one envelope and return its `data`
    async fn call(&self, request: Request) -> Result<Value, GatewayError> {
        tracing::debug!(action = %request.action, url = %self.url, "sending request");

        let body = serde_json::to_string(&request)
            .map_err(|e| GatewayError::Protocol(format!("could not encode request: {}", e)))?;

        let response = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(action = %request.action, error = %e, "request failed");
                GatewayError::Transport(e.to_string())
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !status.is_success() {
            tracing::warn!(action = %request.action, status = status.as_u16(), "backend returned an error status");
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        let envelope: Response = serde_json::from_str(&text).map_err(|e| {
            GatewayError::Protocol(format!(
                "invalid JSON in response to {}: {}",
                request.action, e
            ))
        })?;

        tracing::debug!(action = %request.action, success = envelope.success, "response received");
        envelope.into_data()
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    fn describe(&self) -> String {
        self.url.clone()
    }

    fn is_demo(&self) -> bool {
        false
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, GatewayError> {
        let data = self.call(Request::get_services()).await?;
        if data.is_null() {
            return Ok(Vec::new());
        }
        envelope::decode(envelope::GET_SERVICES, data)
    }

    async fn create(&self, record: NewRecord) -> Result<Record, GatewayError> {
        let data = self.call(Request::add_service(&record)).await?;
        envelope::decode(envelope::ADD_SERVICE, data)
    }

    async fn update(&self, record: Record) -> Result<Record, GatewayError> {
        let data = self.call(Request::update_service(&record)).await?;
        // prefer the server echo; older backends answer with nothing useful
        match serde_json::from_value::<Record>(data) {
            Ok(saved) if saved.id == record.id => Ok(saved),
            _ => Ok(record),
        }
    }

    async fn delete(&self, id: RecordId) -> Result<RecordId, GatewayError> {
        let data = self.call(Request::delete_service(id)).await?;
        Ok(envelope::deleted_id(data, id))
    }

    async fn trigger_automation(&self, record: &Record, note: &str) -> Result<(), GatewayError> {
        self.webhook
            .send(&AutomationPayload::new(record, note))
            .await
    }
}
