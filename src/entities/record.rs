//! Idea record entity, its score vector and the editable-field model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

use crate::core::catalog::{criterion_index, CRITERIA, CRITERIA_COUNT, MAX_SCORE};
use crate::core::entity::{Classification, Status};

/// Backend-assigned record identity
pub type RecordId = u64;

/// Errors raised while validating a field edit or a new record
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FieldError {
    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Field '{field}' expects {expected}")]
    KindMismatch {
        field: String,
        expected: &'static str,
    },

    #[error("Required field '{0}' is missing")]
    MissingField(&'static str),
}

/// Per-criterion scores, always `CRITERIA_COUNT` long and clamped to 0..=5
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Scores(Vec<u8>);

impl Default for Scores {
    fn default() -> Self {
        Self::zeroed()
    }
}

impl Scores {
    pub fn zeroed() -> Self {
        Self(vec![0; CRITERIA_COUNT])
    }

    /// Build from raw values: clamp each, pad with zeros, drop extras
    pub fn from_values<I>(values: I) -> Self
    where
        I: IntoIterator<Item = i64>,
    {
        let mut scores: Vec<u8> = values
            .into_iter()
            .take(CRITERIA_COUNT)
            .map(clamp_score)
            .collect();
        scores.resize(CRITERIA_COUNT, 0);
        Self(scores)
    }

    pub fn get(&self, index: usize) -> u8 {
        self.0.get(index).copied().unwrap_or(0)
    }

    /// Set a score, returning the clamped value actually stored
    pub fn set(&mut self, index: usize, value: i64) -> u8 {
        let clamped = clamp_score(value);
        if let Some(slot) = self.0.get_mut(index) {
            *slot = clamped;
        }
        clamped
    }

    pub fn total(&self) -> u32 {
        self.0.iter().map(|&s| u32::from(s)).sum()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.0
    }
}

fn clamp_score(value: i64) -> u8 {
    value.clamp(0, i64::from(MAX_SCORE)) as u8
}

fn clamp_revenue(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Accept any JSON shape for `scores`: arrays are normalized, anything else is zeroed
fn deserialize_scores<'de, D>(deserializer: D) -> Result<Scores, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let scores = match raw {
        serde_json::Value::Array(items) => Scores::from_values(items.iter().map(|v| {
            v.as_f64()
                .or_else(|| v.as_str().and_then(|s| s.trim().parse().ok()))
                .map(|f| f.round() as i64)
                .unwrap_or(0)
        })),
        _ => Scores::zeroed(),
    };
    Ok(scores)
}

impl<'de> Deserialize<'de> for Scores {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserialize_scores(deserializer)
    }
}

fn deserialize_revenue<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let value = match raw {
        serde_json::Value::Number(n) => n.as_f64().unwrap_or(0.0),
        serde_json::Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(clamp_revenue(value))
}

fn deserialize_status<'de, D>(deserializer: D) -> Result<Option<Status>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = cell_text(serde_json::Value::deserialize(deserializer)?);
    Ok(raw.and_then(|s| {
        if s.trim().is_empty() {
            return None;
        }
        match s.parse::<Status>() {
            Ok(status) => Some(status),
            Err(_) => {
                tracing::warn!(status = %s, "ignoring unknown status from backend");
                None
            }
        }
    }))
}

fn deserialize_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = cell_text(serde_json::Value::deserialize(deserializer)?);
    Ok(raw.and_then(|s| {
        if s.trim().is_empty() {
            return None;
        }
        match DateTime::parse_from_rfc3339(s.trim()) {
            Ok(dt) => Some(dt.with_timezone(&Utc)),
            Err(e) => {
                tracing::warn!(date = %s, error = %e, "ignoring unparsable creation date");
                None
            }
        }
    }))
}

/// Sheet cells arrive as strings, numbers or booleans; all of them read as text
fn cell_text(raw: serde_json::Value) -> Option<String> {
    match raw {
        serde_json::Value::String(s) => Some(s),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn deserialize_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(cell_text(raw).unwrap_or_default())
}

/// Ids may come back as `5`, `5.0` or `"5"`
fn deserialize_id<'de, D>(deserializer: D) -> Result<RecordId, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    let id = match &raw {
        serde_json::Value::Number(n) => n.as_u64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                .map(|f| f as u64)
        }),
        serde_json::Value::String(s) => {
            let trimmed = s.trim();
            trimmed.parse::<u64>().ok().or_else(|| {
                trimmed
                    .parse::<f64>()
                    .ok()
                    .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                    .map(|f| f as u64)
            })
        }
        _ => None,
    };
    id.ok_or_else(|| serde::de::Error::custom(format!("invalid record id: {}", raw)))
}

/// A scored idea as held by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Unique identifier assigned by the backend
    #[serde(deserialize_with = "deserialize_id")]
    pub id: RecordId,

    /// Idea name (`service` on the wire)
    #[serde(rename = "service", default, deserialize_with = "deserialize_text")]
    pub name: String,

    /// Main benefit / need addressed (`need` on the wire)
    #[serde(rename = "need", default, deserialize_with = "deserialize_text")]
    pub description: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub cluster: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub business_model: String,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub target_audience: String,

    /// Lifecycle status; absent means under review
    #[serde(default, deserialize_with = "deserialize_status")]
    pub status: Option<Status>,

    #[serde(default, deserialize_with = "deserialize_text")]
    pub creator_name: String,

    #[serde(
        default,
        deserialize_with = "deserialize_date",
        skip_serializing_if = "Option::is_none"
    )]
    pub creation_date: Option<DateTime<Utc>>,

    #[serde(default, deserialize_with = "deserialize_scores")]
    pub scores: Scores,

    #[serde(default, deserialize_with = "deserialize_revenue")]
    pub revenue_estimate: f64,
}

impl Record {
    /// Effective status (absent status counts as under review)
    pub fn status(&self) -> Status {
        self.status.unwrap_or_default()
    }

    pub fn total(&self) -> u32 {
        self.scores.total()
    }

    pub fn classification(&self) -> Classification {
        Classification::from_total(self.total())
    }

    /// Flattened form sent on update: the record plus one column per criterion
    pub fn to_sheet_row(&self) -> serde_json::Value {
        let mut row = serde_json::json!({
            "id": self.id,
            "service": self.name,
            "need": self.description,
            "cluster": self.cluster,
            "businessModel": self.business_model,
            "targetAudience": self.target_audience,
            "status": self.status().to_string(),
            "creatorName": self.creator_name,
            "creationDate": self.creation_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
            "scores": self.scores,
            "revenueEstimate": self.revenue_estimate,
            "revenue_estimate": self.revenue_estimate,
        });
        if let Some(map) = row.as_object_mut() {
            for (i, criterion) in CRITERIA.iter().enumerate() {
                map.insert(criterion.column.to_string(), self.scores.get(i).into());
            }
        }
        row
    }
}

/// Fields supplied when creating a record; the backend fills in the rest
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    #[serde(rename = "service")]
    pub name: String,
    #[serde(rename = "need")]
    pub description: String,
    pub target_audience: String,
    pub business_model: String,
    pub cluster: String,
    pub status: Status,
    pub creator_name: String,
}

impl NewRecord {
    /// Trim every field and check the required ones are present
    pub fn validated(mut self) -> Result<Self, FieldError> {
        self.name = self.name.trim().to_string();
        self.description = self.description.trim().to_string();
        self.target_audience = self.target_audience.trim().to_string();
        self.business_model = self.business_model.trim().to_string();
        self.cluster = self.cluster.trim().to_string();
        self.creator_name = self.creator_name.trim().to_string();

        let required = [
            ("name", &self.name),
            ("description", &self.description),
            ("target_audience", &self.target_audience),
            ("cluster", &self.cluster),
            ("business_model", &self.business_model),
        ];
        for (field, value) in required {
            if value.is_empty() {
                return Err(FieldError::MissingField(field));
            }
        }
        Ok(self)
    }
}

/// An editable field of a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
    Name,
    Description,
    TargetAudience,
    BusinessModel,
    Cluster,
    Status,
    CreatorName,
    Score(usize),
    Revenue,
}

impl std::fmt::Display for RecordField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecordField::Name => write!(f, "name"),
            RecordField::Description => write!(f, "description"),
            RecordField::TargetAudience => write!(f, "target_audience"),
            RecordField::BusinessModel => write!(f, "business_model"),
            RecordField::Cluster => write!(f, "cluster"),
            RecordField::Status => write!(f, "status"),
            RecordField::CreatorName => write!(f, "creator"),
            RecordField::Score(i) => write!(f, "score_{}", i),
            RecordField::Revenue => write!(f, "revenue"),
        }
    }
}

impl std::str::FromStr for RecordField {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let field = match key.as_str() {
            "name" | "service" => RecordField::Name,
            "description" | "need" => RecordField::Description,
            "target_audience" | "targetaudience" | "audience" => RecordField::TargetAudience,
            "business_model" | "businessmodel" | "model" => RecordField::BusinessModel,
            "cluster" => RecordField::Cluster,
            "status" => RecordField::Status,
            "creator" | "creator_name" | "creatorname" => RecordField::CreatorName,
            "revenue" | "revenue_estimate" | "revenueestimate" => RecordField::Revenue,
            other => {
                let index = match other.strip_prefix("score_") {
                    Some(n) => n.parse::<usize>().ok(),
                    None => criterion_index(other),
                };
                match index {
                    Some(i) if i < CRITERIA_COUNT => RecordField::Score(i),
                    _ => return Err(FieldError::UnknownField(s.to_string())),
                }
            }
        };
        Ok(field)
    }
}

/// A typed value for a [`RecordField`]
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Status(Status),
    Score(i64),
    Revenue(f64),
}

impl RecordField {
    /// Parse a raw string into the value kind this field expects
    pub fn parse_value(&self, raw: &str) -> Result<FieldValue, FieldError> {
        let invalid = |reason: &str| FieldError::InvalidValue {
            field: self.to_string(),
            value: raw.to_string(),
            reason: reason.to_string(),
        };
        match self {
            RecordField::Status => raw
                .parse::<Status>()
                .map(FieldValue::Status)
                .map_err(|e| invalid(&e)),
            RecordField::Score(_) => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| FieldValue::Score(v.round() as i64))
                .ok_or_else(|| invalid("expected a number")),
            RecordField::Revenue => raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(FieldValue::Revenue)
                .ok_or_else(|| invalid("expected a finite number")),
            _ => Ok(FieldValue::Text(raw.to_string())),
        }
    }
}

/// Overlay copy of a record's mutable fields, as held by the edit buffer
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub name: String,
    pub description: String,
    pub target_audience: String,
    pub business_model: String,
    pub cluster: String,
    pub status: Option<Status>,
    pub creator_name: String,
    pub scores: Scores,
    pub revenue_estimate: f64,
}

impl Draft {
    pub fn from_record(record: &Record) -> Self {
        Self {
            name: record.name.clone(),
            description: record.description.clone(),
            target_audience: record.target_audience.clone(),
            business_model: record.business_model.clone(),
            cluster: record.cluster.clone(),
            status: record.status,
            creator_name: record.creator_name.clone(),
            scores: record.scores.clone(),
            revenue_estimate: record.revenue_estimate,
        }
    }

    /// Apply one edit with clamping
    pub fn set(&mut self, field: RecordField, value: FieldValue) -> Result<(), FieldError> {
        let mismatch = |expected| FieldError::KindMismatch {
            field: field.to_string(),
            expected,
        };
        match (field, value) {
            (RecordField::Name, FieldValue::Text(v)) => self.name = v,
            (RecordField::Description, FieldValue::Text(v)) => self.description = v,
            (RecordField::TargetAudience, FieldValue::Text(v)) => self.target_audience = v,
            (RecordField::BusinessModel, FieldValue::Text(v)) => self.business_model = v,
            (RecordField::Cluster, FieldValue::Text(v)) => self.cluster = v,
            (RecordField::CreatorName, FieldValue::Text(v)) => self.creator_name = v,
            (RecordField::Status, FieldValue::Status(s)) => self.status = Some(s),
            (RecordField::Score(i), FieldValue::Score(v)) => {
                self.scores.set(i, v);
            }
            (RecordField::Revenue, FieldValue::Revenue(v)) => {
                self.revenue_estimate = clamp_revenue(v);
            }
            (RecordField::Status, _) => return Err(mismatch("a status")),
            (RecordField::Score(_), _) => return Err(mismatch("an integer score")),
            (RecordField::Revenue, _) => return Err(mismatch("a number")),
            (_, _) => return Err(mismatch("text")),
        }
        Ok(())
    }

    /// Produce the display record: mutable fields from the draft, identity
    /// and creation date from the canonical record
    pub fn overlay(&self, canonical: &Record) -> Record {
        Record {
            id: canonical.id,
            name: self.name.clone(),
            description: self.description.clone(),
            cluster: self.cluster.clone(),
            business_model: self.business_model.clone(),
            target_audience: self.target_audience.clone(),
            status: self.status,
            creator_name: self.creator_name.clone(),
            creation_date: canonical.creation_date,
            scores: self.scores.clone(),
            revenue_estimate: self.revenue_estimate,
        }
    }
}
