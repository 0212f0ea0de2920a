//! Cluster report: portfolio composition by strategic cluster

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{format_revenue, open_portfolio, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::catalog::find_cluster;
use crate::core::report::{tier_counts, ClusterSummary};
use crate::entities::record::Record;

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct ClustersArgs {
    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Leave out clusters without ideas
    #[arg(long)]
    pub non_empty: bool,
}

pub async fn run(args: ClustersArgs, global: &GlobalOpts) -> Result<()> {
    let portfolio = open_portfolio(global).await?;
    let mut summaries = portfolio.cluster_report();
    if args.non_empty {
        summaries.retain(|s| s.count > 0);
    }
    let content = render(&summaries, &portfolio.snapshot());
    write_output(&content, args.output)
}

/// Markdown report for the given summaries
pub fn render(summaries: &[ClusterSummary], records: &[Record]) -> String {
    let mut output = String::new();
    output.push_str("# Cluster Report\n\n");

    let mut builder = Builder::default();
    builder.push_record(["Cluster", "Ideas", "Avg Total", "Revenue", "Top Idea"]);
    for summary in summaries {
        let top = summary
            .top
            .as_ref()
            .map(|(id, name, total)| format!("#{} {} ({})", id, truncate_str(name, 28), total))
            .unwrap_or_else(|| "-".to_string());
        builder.push_record([
            summary.cluster.clone(),
            summary.count.to_string(),
            format!("{:.1}", summary.average_total),
            format_revenue(summary.revenue_total),
            top,
        ]);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());
    output.push('\n');

    let described: Vec<_> = summaries
        .iter()
        .filter_map(|s| find_cluster(&s.cluster))
        .collect();
    if !described.is_empty() {
        output.push_str("\n## Clusters\n\n");
        for cluster in described {
            output.push_str(&format!("- **{}:** {}\n", cluster.title, cluster.value));
        }
    }

    output.push_str("\n## Summary\n\n");
    output.push_str(&format!("- **Total Ideas:** {}\n", records.len()));
    output.push_str(&format!(
        "- **Total Revenue:** {}\n",
        format_revenue(records.iter().map(|r| r.revenue_estimate).sum())
    ));
    for (tier, count) in tier_counts(records) {
        output.push_str(&format!("- **{}:** {}\n", tier.label(), count));
    }
    output
}
