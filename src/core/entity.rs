//! Lifecycle status and score classification shared by records and views

use serde::{Deserialize, Serialize};

/// Lifecycle status of an idea
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Status {
    #[default]
    #[serde(alias = "avaliação", alias = "avaliacao")]
    UnderReview,
    #[serde(alias = "aprovada")]
    Approved,
    #[serde(alias = "cancelada")]
    Cancelled,
    #[serde(alias = "finalizada")]
    Completed,
}

impl Status {
    pub const ALL: [Status; 4] = [
        Status::UnderReview,
        Status::Approved,
        Status::Cancelled,
        Status::Completed,
    ];

    /// Human-readable label used in tables and exports
    pub fn label(&self) -> &'static str {
        match self {
            Status::UnderReview => "Under Review",
            Status::Approved => "Approved",
            Status::Cancelled => "Cancelled",
            Status::Completed => "Completed",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::UnderReview => write!(f, "under-review"),
            Status::Approved => write!(f, "approved"),
            Status::Cancelled => write!(f, "cancelled"),
            Status::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for Status {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "under-review" | "under_review" | "review" | "avaliação" | "avaliacao" => {
                Ok(Status::UnderReview)
            }
            "approved" | "aprovada" => Ok(Status::Approved),
            "cancelled" | "canceled" | "cancelada" => Ok(Status::Cancelled),
            "completed" | "finalizada" => Ok(Status::Completed),
            _ => Err(format!("Unknown status: {}", s)),
        }
    }
}

/// Priority tier derived from a record's total score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl Classification {
    /// Tiers from highest to lowest, as offered in filters
    pub const ALL: [Classification; 4] = [
        Classification::VeryHigh,
        Classification::High,
        Classification::Medium,
        Classification::Low,
    ];

    /// Classify a total score. Tiers start at 0, 11, 16 and 21.
    pub fn from_total(total: u32) -> Self {
        match total {
            21.. => Classification::VeryHigh,
            16..=20 => Classification::High,
            11..=15 => Classification::Medium,
            _ => Classification::Low,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Classification::VeryHigh => "Very High",
            Classification::High => "High",
            Classification::Medium => "Medium",
            Classification::Low => "Low",
        }
    }
}

impl std::fmt::Display for Classification {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl std::str::FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .to_lowercase()
            .chars()
            .filter(|c| c.is_alphanumeric())
            .collect();
        match normalized.as_str() {
            "veryhigh" | "altissima" | "altíssima" => Ok(Classification::VeryHigh),
            "high" | "alta" => Ok(Classification::High),
            "medium" | "media" | "média" => Ok(Classification::Medium),
            "low" | "baixa" => Ok(Classification::Low),
            _ => Err(format!("Unknown classification: {}", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_default_is_under_review() {
        assert_eq!(Status::default(), Status::UnderReview);
    }

    #[test]
    fn test_status_parse_and_display() {
        for status in Status::ALL {
            let parsed: Status = status.to_string().parse().unwrap();
            assert_eq!(parsed, status);
        }
        assert_eq!("aprovada".parse::<Status>().unwrap(), Status::Approved);
        assert!("archived".parse::<Status>().is_err());
    }

    #[test]
    fn test_status_accepts_legacy_wire_values() {
        let status: Status = serde_json::from_str("\"avaliação\"").unwrap();
        assert_eq!(status, Status::UnderReview);
        let status: Status = serde_json::from_str("\"finalizada\"").unwrap();
        assert_eq!(status, Status::Completed);
        assert_eq!(serde_json::to_string(&Status::UnderReview).unwrap(), "\"under-review\"");
    }

    #[test]
    fn test_classification_boundaries() {
        assert_eq!(Classification::from_total(0), Classification::Low);
        assert_eq!(Classification::from_total(10), Classification::Low);
        assert_eq!(Classification::from_total(11), Classification::Medium);
        assert_eq!(Classification::from_total(15), Classification::Medium);
        assert_eq!(Classification::from_total(16), Classification::High);
        assert_eq!(Classification::from_total(20), Classification::High);
        assert_eq!(Classification::from_total(21), Classification::VeryHigh);
        assert_eq!(Classification::from_total(25), Classification::VeryHigh);
    }

    #[test]
    fn test_classification_is_non_decreasing() {
        let mut previous = Classification::from_total(0);
        for total in 1..=30 {
            let current = Classification::from_total(total);
            assert!(current >= previous, "tier dropped at total {}", total);
            previous = current;
        }
    }

    #[test]
    fn test_classification_parse() {
        assert_eq!("Very High".parse::<Classification>().unwrap(), Classification::VeryHigh);
        assert_eq!("very-high".parse::<Classification>().unwrap(), Classification::VeryHigh);
        assert_eq!("low".parse::<Classification>().unwrap(), Classification::Low);
        assert!("extreme".parse::<Classification>().is_err());
    }
}
