//! `idf show` command - one idea in full

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::list::ListedIdea;
use crate::cli::helpers::{format_revenue, load_config, open_portfolio, output_format, score_bar};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::{business_model_label, find_cluster, CRITERIA, MAX_SCORE};
use crate::core::ranking::RankedRow;
use crate::entities::record::{Record, RecordId};

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Idea id
    pub id: RecordId,
}

pub async fn run(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let format = output_format(global, &config, OutputFormat::Tsv);
    let portfolio = open_portfolio(global).await?;

    let record = portfolio
        .record(args.id)
        .ok_or_else(|| miette::miette!("Idea {} not found", args.id))?;

    match format {
        OutputFormat::Json | OutputFormat::Yaml => {
            let row = RankedRow {
                total: record.total(),
                classification: record.classification(),
                dirty: portfolio.is_dirty(record.id),
                record,
            };
            let idea = ListedIdea::from(row);
            if format == OutputFormat::Json {
                println!("{}", serde_json::to_string_pretty(&idea).into_diagnostic()?);
            } else {
                print!("{}", serde_yml::to_string(&idea).into_diagnostic()?);
            }
        }
        OutputFormat::Id => println!("{}", record.id),
        _ => print_detail(&record),
    }
    Ok(())
}

/// Human-readable detail card
pub fn print_detail(record: &Record) {
    println!(
        "{} {}",
        style(format!("#{}", record.id)).cyan(),
        style(&record.name).bold()
    );
    println!("{}", "-".repeat(60));

    let cluster = match find_cluster(&record.cluster) {
        Some(c) => format!("{} ({})", c.short_title, c.title),
        None => record.cluster.clone(),
    };
    let created = record
        .creation_date
        .map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_else(|| "-".to_string());

    print_field("Description", &record.description);
    print_field("Target audience", &record.target_audience);
    print_field("Cluster", &cluster);
    print_field("Business model", &business_model_label(&record.business_model));
    print_field("Status", record.status().label());
    print_field("Creator", &record.creator_name);
    print_field("Created", &created);
    print_field("Revenue", &format_revenue(record.revenue_estimate));

    println!();
    println!("{}", style("Scores").bold());
    for (i, criterion) in CRITERIA.iter().enumerate() {
        let score = record.scores.get(i);
        println!(
            "  {:<28} {} {}/{}",
            criterion.title,
            style(score_bar(score)).yellow(),
            score,
            MAX_SCORE
        );
    }
    println!();
    println!(
        "  {:<28} {} ({})",
        style("Total").bold(),
        style(record.total()).bold(),
        record.classification().label()
    );
}

fn print_field(label: &str, value: &str) {
    let value = if value.is_empty() { "-" } else { value };
    println!("{:<16} {}", style(format!("{}:", label)).dim(), value);
}
