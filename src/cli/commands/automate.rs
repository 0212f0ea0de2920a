//! `idf automate` command - hand an idea to the automation workflow

use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{drain_notices, open_portfolio};
use crate::cli::GlobalOpts;
use crate::entities::record::RecordId;

#[derive(clap::Args, Debug)]
pub struct AutomateArgs {
    /// Idea id
    pub id: RecordId,

    /// Note sent along with the idea
    #[arg(long, short = 'm', default_value = "")]
    pub message: String,
}

pub async fn run(args: AutomateArgs, global: &GlobalOpts) -> Result<()> {
    let portfolio = open_portfolio(global).await?;
    let mut events = portfolio.subscribe();
    let result = portfolio.trigger_automation(args.id, &args.message).await;
    drain_notices(&mut events, global.quiet);
    result.into_diagnostic()
}
