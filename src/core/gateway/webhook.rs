//! Automation webhook payload and client

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::GatewayError;
use crate::core::entity::Status;
use crate::entities::record::{Record, RecordId, Scores};

/// Identifies this application to the automation workflow
pub const TRIGGERED_BY: &str = "FabricaDeIdeiasApp";

/// Record snapshot as sent to the workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationIdea {
    pub id: RecordId,
    pub name: String,
    pub description: String,
    pub cluster: String,
    pub business_model: String,
    pub target_audience: String,
    pub status: Status,
    pub creator: String,
    pub creation_date: Option<DateTime<Utc>>,
    pub scores: Scores,
    pub total_score: u32,
    pub revenue_estimate: f64,
}

/// Body POSTed to the webhook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationPayload {
    pub idea: AutomationIdea,
    pub message: String,
    pub triggered_by: String,
    pub timestamp: DateTime<Utc>,
}

impl AutomationPayload {
    pub fn new(record: &Record, note: &str) -> Self {
        Self {
            idea: AutomationIdea {
                id: record.id,
                name: record.name.clone(),
                description: record.description.clone(),
                cluster: record.cluster.clone(),
                business_model: record.business_model.clone(),
                target_audience: record.target_audience.clone(),
                status: record.status(),
                creator: record.creator_name.clone(),
                creation_date: record.creation_date,
                scores: record.scores.clone(),
                total_score: record.total(),
                revenue_estimate: record.revenue_estimate,
            },
            message: note.to_string(),
            triggered_by: TRIGGERED_BY.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Posts automation payloads as JSON; no retry
pub struct WebhookClient {
    client: Client,
    url: Option<String>,
}

impl WebhookClient {
    pub fn new(client: Client, url: Option<String>) -> Self {
        Self { client, url }
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub async fn send(&self, payload: &AutomationPayload) -> Result<(), GatewayError> {
        let url = self.url.as_deref().ok_or_else(|| {
            GatewayError::NotConfigured(
                "The webhook URL is not configured. Set it with `idf config set webhook_url <URL>`."
                    .to_string(),
            )
        })?;

        tracing::debug!(url = %url, id = payload.idea.id, "posting automation payload");

        let response = self
            .client
            .post(url)
            .json(payload)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Webhook {
                status: status.as_u16(),
                body,
            });
        }

        tracing::info!(id = payload.idea.id, "automation triggered");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> Record {
        serde_json::from_value(serde_json::json!({
            "id": 2,
            "service": "Premium Tech Support Plan",
            "need": "24/7 support",
            "creatorName": "Bruno",
            "scores": [4, 5, 5, 4, 3],
            "revenueEstimate": 500000
        }))
        .unwrap()
    }

    #[test]
    fn test_payload_shape() {
        let payload = AutomationPayload::new(&record(), "please review");
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["triggeredBy"], TRIGGERED_BY);
        assert_eq!(json["message"], "please review");
        assert_eq!(json["idea"]["name"], "Premium Tech Support Plan");
        assert_eq!(json["idea"]["creator"], "Bruno");
        assert_eq!(json["idea"]["totalScore"], 21);
        assert_eq!(json["idea"]["status"], "under-review");
        assert!(json["timestamp"].as_str().unwrap().contains('T'));
    }

    #[tokio::test]
    async fn test_missing_url_is_config_error() {
        let client = WebhookClient::new(Client::new(), None);
        let err = client
            .send(&AutomationPayload::new(&record(), ""))
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::NotConfigured(_)));
    }
}
