//! `idf delete` command - remove an idea from the backend

use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{drain_notices, open_portfolio};
use crate::cli::GlobalOpts;
use crate::entities::record::RecordId;

#[derive(clap::Args, Debug)]
pub struct DeleteArgs {
    /// Idea id
    pub id: RecordId,

    /// Do not ask for confirmation
    #[arg(long, short = 'y')]
    pub yes: bool,
}

pub async fn run(args: DeleteArgs, global: &GlobalOpts) -> Result<()> {
    let mut portfolio = open_portfolio(global).await?;
    let record = portfolio
        .record(args.id)
        .ok_or_else(|| miette::miette!("Idea {} not found", args.id))?;

    if !args.yes {
        let confirmed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!(
                "Delete idea #{} '{}'? This cannot be undone",
                record.id, record.name
            ))
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !confirmed {
            println!("{}", style("Cancelled.").dim());
            return Ok(());
        }
    }

    let mut events = portfolio.subscribe();
    let result = portfolio.delete(args.id).await;
    drain_notices(&mut events, global.quiet);
    result.into_diagnostic()
}
