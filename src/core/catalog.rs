//! Static reference data: ranking criteria, strategic clusters and
//! business-model labels
//!
//! The catalog is never mutated at runtime. It drives score vector length,
//! column order in exports and the labels shown in tables.

/// Upper bound for a single criterion score
pub const MAX_SCORE: u8 = 5;

/// A fixed, ordered scoring dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Criterion {
    /// Stable key, also accepted as an edit field name
    pub id: &'static str,
    /// Full title used in exports
    pub title: &'static str,
    /// Compact title used as a table header
    pub short_title: &'static str,
    /// Flattened column name understood by sheet-backed backends
    pub column: &'static str,
}

/// Criteria in ranking order. Index `i` here is index `i` in every score vector.
pub const CRITERIA: &[Criterion] = &[
    Criterion {
        id: "alignment",
        title: "Strategic Alignment",
        short_title: "Align",
        column: "score_alignment",
    },
    Criterion {
        id: "customer_value",
        title: "Customer Value",
        short_title: "Value",
        column: "score_customer_value",
    },
    Criterion {
        id: "financial_impact",
        title: "Financial Impact",
        short_title: "Fin",
        column: "score_financial_impact",
    },
    Criterion {
        id: "feasibility",
        title: "Feasibility",
        short_title: "Feas",
        column: "score_feasibility",
    },
    Criterion {
        id: "competitive_advantage",
        title: "Competitive Advantage",
        short_title: "Edge",
        column: "score_competitive_advantage",
    },
];

/// Number of criteria; every record carries exactly this many scores
pub const CRITERIA_COUNT: usize = CRITERIA.len();

/// Find a criterion index by its id (case-insensitive)
pub fn criterion_index(id: &str) -> Option<usize> {
    CRITERIA.iter().position(|c| c.id.eq_ignore_ascii_case(id))
}

/// A strategic category used to group ideas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cluster {
    pub id: &'static str,
    /// Value stored on records
    pub short_title: &'static str,
    pub title: &'static str,
    /// One-line value proposition
    pub value: &'static str,
}

pub const CLUSTERS: &[Cluster] = &[
    Cluster {
        id: "smart-home",
        short_title: "Smart Home",
        title: "Smart Home & Connected Living",
        value: "Make connected devices simple to choose, install and run.",
    },
    Cluster {
        id: "tech-support",
        short_title: "Tech Support",
        title: "Technical Support & Care",
        value: "Keep every device in the household working, all year round.",
    },
    Cluster {
        id: "flexible-access",
        short_title: "Flexible Access",
        title: "Flexible Access to Technology",
        value: "Use premium equipment without the cost of owning it.",
    },
    Cluster {
        id: "sustainability",
        short_title: "Sustainability",
        title: "Sustainability & Circular Economy",
        value: "Extend product life through repair, refurbishment and recycling.",
    },
];

/// Look up a cluster by id or short title
pub fn find_cluster(name: &str) -> Option<&'static Cluster> {
    CLUSTERS
        .iter()
        .find(|c| c.id.eq_ignore_ascii_case(name) || c.short_title.eq_ignore_ascii_case(name))
}

/// Known business models as (key, label)
pub const BUSINESS_MODELS: &[(&str, &str)] = &[
    ("consulting", "Consulting"),
    ("subscription", "Subscription/Recurring"),
    ("rental", "Rental"),
    ("one-off", "One-off Service"),
    ("marketplace", "Marketplace"),
    ("licensing", "Licensing"),
];

/// Human-readable label for a business model.
///
/// Accepts either the key or the label itself; unknown values are returned
/// unchanged so free-text models still export.
pub fn business_model_label(value: &str) -> String {
    let trimmed = value.trim();
    BUSINESS_MODELS
        .iter()
        .find(|(key, label)| key.eq_ignore_ascii_case(trimmed) || label.eq_ignore_ascii_case(trimmed))
        .map(|(_, label)| label.to_string())
        .unwrap_or_else(|| trimmed.to_string())
}
