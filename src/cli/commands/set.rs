//! `idf set` command - edit fields of an idea and save them
//!
//! Edits go through the edit buffer and are flushed in one save, so a
//! validation error in any assignment leaves the backend untouched.

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::commands::show::print_detail;
use crate::cli::helpers::{drain_notices, open_portfolio};
use crate::cli::GlobalOpts;
use crate::entities::record::RecordId;

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Idea id
    pub id: RecordId,

    /// Assignments as FIELD=VALUE (e.g. feasibility=4 status=approved revenue=120000)
    #[arg(required = true, value_name = "FIELD=VALUE")]
    pub assignments: Vec<String>,

    /// Show the edited idea without saving
    #[arg(long)]
    pub dry_run: bool,
}

/// Split `FIELD=VALUE`; the value may itself contain `=`
pub fn parse_assignment(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((field, value)) if !field.trim().is_empty() => {
            Ok((field.trim().to_string(), value.to_string()))
        }
        _ => Err(miette::miette!(
            help = "Use FIELD=VALUE, e.g. feasibility=4",
            "Invalid assignment '{}'",
            raw
        )),
    }
}

pub async fn run(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let assignments = args
        .assignments
        .iter()
        .map(|raw| parse_assignment(raw))
        .collect::<Result<Vec<_>>>()?;

    let mut portfolio = open_portfolio(global).await?;
    let mut events = portfolio.subscribe();

    for (field, value) in &assignments {
        portfolio
            .set_field_str(args.id, field, value)
            .into_diagnostic()?;
    }

    if args.dry_run {
        if let Some(record) = portfolio.record(args.id) {
            print_detail(&record);
        }
        println!();
        println!("{}", style("Dry run: nothing was saved.").dim());
        return Ok(());
    }

    let report = portfolio.save().await;
    drain_notices(&mut events, global.quiet);

    if report.failed.is_empty() {
        return Ok(());
    }
    let details = report
        .failed
        .iter()
        .map(|(id, error)| format!("idea {}: {}", id, error))
        .collect::<Vec<_>>()
        .join("; ");
    Err(miette::miette!("Changes were not saved ({})", details))
}
