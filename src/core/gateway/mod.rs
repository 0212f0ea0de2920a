//! Persistence gateway abstraction
//!
//! Provides a trait-based interface over the portfolio backend:
//! - HTTP backend speaking the `{action, payload}` envelope
//! - In-process demo backend with the same contract

pub mod demo;
pub mod envelope;
pub mod http;
pub mod webhook;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::core::config::Config;
use crate::entities::record::{NewRecord, Record, RecordId};

pub use demo::DemoGateway;
pub use http::HttpGateway;
pub use webhook::{AutomationPayload, WebhookClient};

/// Errors raised by gateway calls.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GatewayError {
    /// The request never got a response
    #[error("Could not reach the server. Check your connection. Details: {0}")]
    Transport(String),

    /// The backend answered with something that is not the expected envelope
    #[error("Unexpected response from the backend: {0}")]
    Protocol(String),

    /// The backend answered with a non-2xx status
    #[error("API error: {status} - {body}")]
    Http { status: u16, body: String },

    /// The backend parsed the request and rejected it
    #[error("{message}")]
    Business {
        message: String,
        code: Option<String>,
    },

    /// The automation webhook answered with a non-2xx status
    #[error("Failed to send to webhook: {status} - {body}")]
    Webhook { status: u16, body: String },

    /// A required endpoint or client setting is missing
    #[error("{0}")]
    NotConfigured(String),
}

impl GatewayError {
    /// Structured failure code carried by the envelope, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            GatewayError::Business { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

/// Backend CRUD plus the automation side-channel.
///
/// Every call resolves with its payload or fails with a human-readable
/// error; nothing is retried.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Short description of the backend for status output
    fn describe(&self) -> String;

    /// Whether this is the in-process demo backend
    fn is_demo(&self) -> bool;

    /// Fetch every record
    async fn fetch_all(&self) -> Result<Vec<Record>, GatewayError>;

    /// Create a record; the backend assigns id, date and zero scores
    async fn create(&self, record: NewRecord) -> Result<Record, GatewayError>;

    /// Full-record upsert by id
    async fn update(&self, record: Record) -> Result<Record, GatewayError>;

    /// Delete by id, returning the deleted id
    async fn delete(&self, id: RecordId) -> Result<RecordId, GatewayError>;

    /// Send a record to the automation workflow
    async fn trigger_automation(&self, record: &Record, note: &str) -> Result<(), GatewayError>;
}

/// Build the gateway selected by the configuration
pub fn connect(config: &Config) -> Result<Arc<dyn Gateway>, GatewayError> {
    match config.backend_url() {
        Some(url) => {
            tracing::debug!(url = %url, "using HTTP backend");
            let gateway = HttpGateway::new(
                url,
                config.timeout(),
                config.webhook_url().map(str::to_string),
            )?;
            Ok(Arc::new(gateway))
        }
        None => {
            let (min, max) = config.demo_latency();
            tracing::debug!(min_ms = min, max_ms = max, "using demo backend");
            Ok(Arc::new(DemoGateway::seeded().with_latency(min, max)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_message_prefix() {
        let err = GatewayError::Transport("connection refused".to_string());
        assert_eq!(
            err.to_string(),
            "Could not reach the server. Check your connection. Details: connection refused"
        );
    }

    #[test]
    fn test_connect_defaults_to_demo() {
        let gateway = connect(&Config::default()).unwrap();
        assert!(gateway.is_demo());

        let config = Config {
            backend_url: Some("http://127.0.0.1:9/exec".to_string()),
            ..Default::default()
        };
        let gateway = connect(&config).unwrap();
        assert!(!gateway.is_demo());
    }
}
