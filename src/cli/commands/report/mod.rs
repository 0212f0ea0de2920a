//! `idf report` command - portfolio reports as Markdown

mod clusters;
mod ranking;

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::cli::GlobalOpts;

pub use clusters::ClustersArgs;
pub use ranking::RankingArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// Ideas, scores and revenue per strategic cluster
    Clusters(ClustersArgs),

    /// Full ranking with per-criterion scores and tiers
    #[clap(alias = "rank")]
    Ranking(RankingArgs),
}

pub async fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Clusters(args) => clusters::run(args, global).await,
        ReportCommands::Ranking(args) => ranking::run(args, global).await,
    }
}

// Shared helper functions

pub(crate) fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            println!("Report written to: {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
