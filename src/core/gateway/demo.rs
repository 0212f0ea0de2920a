//! In-process demo backend.
//!
//! Honors the same envelope contract as the HTTP backend and answers after
//! a random delay so the UI boundary sees realistic asynchrony.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use rand::Rng;
use serde_json::Value;
use tokio::sync::Mutex;

use super::envelope::{self, Request, Response};
use super::webhook::AutomationPayload;
use super::{Gateway, GatewayError};
use crate::core::entity::Status;
use crate::entities::record::{NewRecord, Record, RecordId, Scores};

#[derive(Debug, Default)]
struct DemoState {
    records: Vec<Record>,
    next_id: RecordId,
    outbox: Vec<AutomationPayload>,
}

/// Demo gateway holding its records in memory
pub struct DemoGateway {
    state: Mutex<DemoState>,
    latency: (u64, u64),
}

impl DemoGateway {
    /// Demo backend with the given records and no latency
    pub fn with_records(records: Vec<Record>) -> Self {
        let next_id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        Self {
            state: Mutex::new(DemoState {
                records,
                next_id,
                outbox: Vec::new(),
            }),
            latency: (0, 0),
        }
    }

    /// Demo backend with the three sample ideas
    pub fn seeded() -> Self {
        Self::with_records(sample_records())
    }

    /// Answer after a random delay in `min..=max` milliseconds
    pub fn with_latency(mut self, min: u64, max: u64) -> Self {
        self.latency = (min.min(max), min.max(max));
        self
    }

    /// Automation payloads recorded instead of being posted
    pub async fn outbox(&self) -> Vec<AutomationPayload> {
        self.state.lock().await.outbox.clone()
    }

    fn pick_delay(&self) -> Duration {
        let (min, max) = self.latency;
        let ms = if min == max {
            min
        } else {
            rand::rng().random_range(min..=max)
        };
        Duration::from_millis(ms)
    }

    async fn simulate_latency(&self) {
        let delay = self.pick_delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Process one envelope the way the real backend would
    pub async fn handle(&self, request: Request) -> Response {
        self.simulate_latency().await;
        let mut state = self.state.lock().await;
        let response = state.dispatch(&request);
        if !response.success {
            tracing::debug!(action = %request.action, error = ?response.error, "demo request rejected");
        }
        response
    }
}

impl DemoState {
    fn dispatch(&mut self, request: &Request) -> Response {
        match request.action.as_str() {
            envelope::GET_SERVICES => match serde_json::to_value(&self.records) {
                Ok(data) => Response::ok(data),
                Err(e) => Response::fail(e.to_string()),
            },
            envelope::ADD_SERVICE => self.add(request),
            envelope::UPDATE_SERVICE => self.update(request),
            envelope::DELETE_SERVICE => self.delete(request),
            other => Response::fail(format!("Unknown action: {}", other)).with_code("protocol"),
        }
    }

    fn add(&mut self, request: &Request) -> Response {
        let Some(service) = request.payload_field("service") else {
            return Response::fail("Missing service payload").with_code("protocol");
        };
        let new: NewRecord = match serde_json::from_value(service.clone()) {
            Ok(new) => new,
            Err(e) => return Response::fail(format!("Invalid JSON service: {}", e)).with_code("protocol"),
        };

        let record = Record {
            id: self.next_id,
            name: new.name,
            description: new.description,
            cluster: new.cluster,
            business_model: new.business_model,
            target_audience: new.target_audience,
            status: Some(Status::UnderReview),
            creator_name: new.creator_name,
            creation_date: Some(Utc::now()),
            scores: Scores::zeroed(),
            revenue_estimate: 0.0,
        };
        self.next_id += 1;
        self.records.push(record.clone());
        to_response(&record)
    }

    fn update(&mut self, request: &Request) -> Response {
        let Some(service) = request.payload_field("service") else {
            return Response::fail("Missing service payload").with_code("protocol");
        };
        let incoming: Record = match serde_json::from_value(service.clone()) {
            Ok(record) => record,
            Err(e) => return Response::fail(format!("Invalid JSON service: {}", e)).with_code("protocol"),
        };

        match self.records.iter_mut().find(|r| r.id == incoming.id) {
            Some(existing) => {
                let creation_date = incoming.creation_date.or(existing.creation_date);
                *existing = Record {
                    creation_date,
                    ..incoming
                };
                to_response(existing)
            }
            None => Response::fail(format!("Service with id {} not found.", incoming.id)),
        }
    }

    fn delete(&mut self, request: &Request) -> Response {
        let Some(id) = request.payload_field("id").and_then(Value::as_u64) else {
            return Response::fail("Missing id payload").with_code("protocol");
        };
        self.records.retain(|r| r.id != id);
        Response::ok(serde_json::json!({ "id": id }))
    }
}

fn to_response(record: &Record) -> Response {
    match serde_json::to_value(record) {
        Ok(data) => Response::ok(data),
        Err(e) => Response::fail(e.to_string()),
    }
}

#[async_trait]
impl Gateway for DemoGateway {
    fn describe(&self) -> String {
        "demo (in-memory sample data)".to_string()
    }

    fn is_demo(&self) -> bool {
        true
    }

    async fn fetch_all(&self) -> Result<Vec<Record>, GatewayError> {
        let data = self.handle(Request::get_services()).await.into_data()?;
        envelope::decode(envelope::GET_SERVICES, data)
    }

    async fn create(&self, record: NewRecord) -> Result<Record, GatewayError> {
        let data = self.handle(Request::add_service(&record)).await.into_data()?;
        envelope::decode(envelope::ADD_SERVICE, data)
    }

    async fn update(&self, record: Record) -> Result<Record, GatewayError> {
        let data = self
            .handle(Request::update_service(&record))
            .await
            .into_data()?;
        envelope::decode(envelope::UPDATE_SERVICE, data)
    }

    async fn delete(&self, id: RecordId) -> Result<RecordId, GatewayError> {
        let data = self
            .handle(Request::delete_service(id))
            .await
            .into_data()?;
        Ok(envelope::deleted_id(data, id))
    }

    async fn trigger_automation(&self, record: &Record, note: &str) -> Result<(), GatewayError> {
        self.simulate_latency().await;
        let payload = AutomationPayload::new(record, note);
        tracing::info!(id = record.id, "demo automation recorded");
        self.state.lock().await.outbox.push(payload);
        Ok(())
    }
}

#[allow(clippy::too_many_arguments)]
fn sample(
    id: RecordId,
    name: &str,
    description: &str,
    cluster: &str,
    business_model: &str,
    target_audience: &str,
    status: Status,
    creator: &str,
    created: (i32, u32, u32, u32, u32),
    scores: [i64; 5],
    revenue: f64,
) -> Record {
    let (year, month, day, hour, minute) = created;
    Record {
        id,
        name: name.to_string(),
        description: description.to_string(),
        cluster: cluster.to_string(),
        business_model: business_model.to_string(),
        target_audience: target_audience.to_string(),
        status: Some(status),
        creator_name: creator.to_string(),
        creation_date: Utc
            .with_ymd_and_hms(year, month, day, hour, minute, 0)
            .single(),
        scores: Scores::from_values(scores),
        revenue_estimate: revenue,
    }
}

/// The three sample ideas served in demo mode
pub fn sample_records() -> Vec<Record> {
    vec![
        sample(
            1,
            "Smart Home Consulting",
            "Help choosing and installing compatible smart home devices.",
            "Smart Home",
            "consulting",
            "Homeowners",
            Status::Approved,
            "Ana",
            (2023, 10, 1, 10, 0),
            [5, 4, 3, 5, 4],
            150_000.0,
        ),
        sample(
            2,
            "Premium Tech Support Plan",
            "24/7 technical support for every electronic device in the home.",
            "Tech Support",
            "subscription",
            "Families with many devices",
            Status::UnderReview,
            "Bruno",
            (2023, 10, 2, 11, 30),
            [4, 5, 5, 4, 3],
            500_000.0,
        ),
        sample(
            3,
            "VR Equipment Rental",
            "Access to high-end VR equipment for events or casual use.",
            "Flexible Access",
            "rental",
            "Gamers and event planners",
            Status::UnderReview,
            "Carlos",
            (2023, 10, 3, 14, 0),
            [3, 4, 3, 4, 4],
            80_000.0,
        ),
    ]
}
