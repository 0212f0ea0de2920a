//! `idf add` command - register a new idea

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::cli::helpers::{drain_notices, load_config, open_portfolio, output_format};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::find_cluster;
use crate::core::entity::Status;
use crate::entities::record::NewRecord;

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Idea name
    #[arg(long, short = 'n')]
    pub name: String,

    /// Main benefit or need addressed
    #[arg(long, short = 'd')]
    pub description: String,

    /// Who the idea serves
    #[arg(long, short = 'a')]
    pub audience: String,

    /// Business model (consulting, subscription, rental, one-off, marketplace, licensing)
    #[arg(long, short = 'm')]
    pub model: String,

    /// Strategic cluster (name or id)
    #[arg(long, short = 'c')]
    pub cluster: String,

    /// Initial status
    #[arg(long, short = 's', default_value = "under-review")]
    pub status: String,

    /// Author of the idea
    #[arg(long, default_value = "")]
    pub creator: String,
}

impl AddArgs {
    pub fn to_new_record(&self) -> Result<NewRecord> {
        let status: Status = self.status.parse().map_err(|e: String| miette::miette!("{}", e))?;
        let cluster = find_cluster(&self.cluster)
            .map(|c| c.short_title.to_string())
            .unwrap_or_else(|| self.cluster.clone());
        Ok(NewRecord {
            name: self.name.clone(),
            description: self.description.clone(),
            target_audience: self.audience.clone(),
            business_model: self.model.clone(),
            cluster,
            status,
            creator_name: self.creator.clone(),
        })
    }
}

pub async fn run(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let format = output_format(global, &config, OutputFormat::Tsv);
    let new = args.to_new_record()?;

    let mut portfolio = open_portfolio(global).await?;
    let mut events = portfolio.subscribe();
    let result = portfolio.add(new).await;
    drain_notices(&mut events, global.quiet || format != OutputFormat::Tsv);

    let record = result.into_diagnostic()?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record).into_diagnostic()?),
        OutputFormat::Yaml => print!("{}", serde_yml::to_string(&record).into_diagnostic()?),
        OutputFormat::Id => println!("{}", record.id),
        _ => {
            if !global.quiet {
                println!(
                    "   {} {}",
                    style(format!("#{}", record.id)).cyan(),
                    style(&record.name).bold()
                );
                println!(
                    "   {}",
                    style(format!("Score it with: idf set {} feasibility=4", record.id)).dim()
                );
            }
        }
    }
    Ok(())
}
