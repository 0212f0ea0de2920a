//! Portfolio summaries by strategic cluster and by classification tier

use std::collections::BTreeMap;

use crate::core::catalog::CLUSTERS;
use crate::core::entity::Classification;
use crate::entities::record::{Record, RecordId};

/// Aggregates for one cluster
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterSummary {
    /// Cluster value as stored on records
    pub cluster: String,
    /// Catalog title, when the cluster is a known one
    pub title: Option<&'static str>,
    pub count: usize,
    pub average_total: f64,
    pub revenue_total: f64,
    /// Highest-scoring idea as (id, name, total)
    pub top: Option<(RecordId, String, u32)>,
}

/// Summarize records per cluster.
///
/// Every catalog cluster appears, in catalog order, even when empty.
/// Clusters not in the catalog follow alphabetically.
pub fn cluster_summaries(records: &[Record]) -> Vec<ClusterSummary> {
    let mut groups: BTreeMap<String, Vec<&Record>> = BTreeMap::new();
    for record in records {
        let cluster = record.cluster.trim();
        if !cluster.is_empty() {
            groups.entry(cluster.to_string()).or_default().push(record);
        }
    }

    let mut summaries: Vec<ClusterSummary> = CLUSTERS
        .iter()
        .map(|c| {
            let members = groups.remove(c.short_title).unwrap_or_default();
            summarize(c.short_title.to_string(), Some(c.title), &members)
        })
        .collect();

    summaries.extend(
        groups
            .into_iter()
            .map(|(cluster, members)| summarize(cluster, None, &members)),
    );
    summaries
}

fn summarize(cluster: String, title: Option<&'static str>, members: &[&Record]) -> ClusterSummary {
    let count = members.len();
    let total: u32 = members.iter().map(|r| r.total()).sum();
    let average_total = if count == 0 {
        0.0
    } else {
        f64::from(total) / count as f64
    };
    let top = members
        .iter()
        .max_by_key(|r| r.total())
        .map(|r| (r.id, r.name.clone(), r.total()));

    ClusterSummary {
        cluster,
        title,
        count,
        average_total,
        revenue_total: members.iter().map(|r| r.revenue_estimate).sum(),
        top,
    }
}

/// Number of records per classification tier, highest tier first
pub fn tier_counts(records: &[Record]) -> Vec<(Classification, usize)> {
    Classification::ALL
        .iter()
        .map(|tier| {
            let count = records.iter().filter(|r| r.classification() == *tier).count();
            (*tier, count)
        })
        .collect()
}
