//! Ranking report: every matching idea with per-criterion scores

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::commands::list::{FilterArgs, SortArgs};
use crate::cli::helpers::{format_revenue, open_portfolio, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::catalog::CRITERIA;
use crate::core::ranking::RankedRow;

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct RankingArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub async fn run(args: RankingArgs, global: &GlobalOpts) -> Result<()> {
    let filter = args.filter.to_filter()?;
    let sort = args.sort.to_sort()?;

    let mut portfolio = open_portfolio(global).await?;
    portfolio.set_filter(filter);
    portfolio.set_sort(sort);

    let content = render(&portfolio.ranked(), portfolio.len());
    write_output(&content, args.output)
}

pub fn render(rows: &[RankedRow], total_records: usize) -> String {
    let mut output = String::new();
    output.push_str("# Idea Ranking\n\n");

    let mut header = vec!["#".to_string(), "ID".to_string(), "Idea".to_string()];
    header.extend(CRITERIA.iter().map(|c| c.short_title.to_string()));
    header.extend(["Total", "Tier", "Revenue", "Status"].map(String::from));

    let mut builder = Builder::default();
    builder.push_record(header);
    for (rank, row) in rows.iter().enumerate() {
        let record = &row.record;
        let mut cells = vec![
            (rank + 1).to_string(),
            record.id.to_string(),
            truncate_str(&record.name, 32),
        ];
        cells.extend(record.scores.as_slice().iter().map(|s| s.to_string()));
        cells.push(row.total.to_string());
        cells.push(row.classification.label().to_string());
        cells.push(format_revenue(record.revenue_estimate));
        cells.push(record.status().label().to_string());
        builder.push_record(cells);
    }
    output.push_str(&builder.build().with(Style::markdown()).to_string());

    output.push_str("\n\n## Summary\n\n");
    output.push_str(&format!(
        "- **Ideas Listed:** {} of {}\n",
        rows.len(),
        total_records
    ));
    if !rows.is_empty() {
        let average = rows.iter().map(|r| f64::from(r.total)).sum::<f64>() / rows.len() as f64;
        output.push_str(&format!("- **Average Total:** {:.1}\n", average));
    }
    output
}
