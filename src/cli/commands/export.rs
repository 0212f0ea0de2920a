//! `idf export` command - CSV export of the portfolio

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::PathBuf;

use crate::cli::helpers::open_portfolio;
use crate::cli::GlobalOpts;
use crate::core::export::{ExportError, FILE_NAME};

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    /// Output file (default: ideas_prioritized.csv), "-" for stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub async fn run(args: ExportArgs, global: &GlobalOpts) -> Result<()> {
    let portfolio = open_portfolio(global).await?;

    if portfolio.is_empty() {
        println!("{} {}", style("ℹ").blue(), ExportError::Empty);
        return Ok(());
    }

    let path = args.output.unwrap_or_else(|| PathBuf::from(FILE_NAME));
    if path.as_os_str() == "-" {
        print!("{}", portfolio.export_csv().into_diagnostic()?);
        return Ok(());
    }

    let rows = portfolio.export_to(&path).into_diagnostic()?;
    if !global.quiet {
        println!(
            "{} Exported {} idea(s) to {}",
            style("✓").green(),
            style(rows).cyan(),
            style(path.display()).yellow()
        );
    }
    Ok(())
}
