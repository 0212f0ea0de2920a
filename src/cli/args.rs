//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    add::AddArgs, automate::AutomateArgs, completions::CompletionsArgs, config::ConfigCommands,
    delete::DeleteArgs, export::ExportArgs, list::ListArgs, report::ReportCommands,
    set::SetArgs, shell::ShellArgs, show::ShowArgs,
};

#[derive(Parser)]
#[command(name = "idf")]
#[command(author, version, about = "Idea Factory portfolio manager")]
#[command(long_about = "Idea Factory: score, rank and curate a portfolio of service ideas stored in a spreadsheet backend, or in a built-in demo backend when none is configured.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Backend web app URL (overrides config and IDF_BACKEND_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub backend_url: Option<String>,

    /// Use the in-memory demo backend even if a backend is configured
    #[arg(long, global = true)]
    pub demo: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List ideas ranked by score
    #[command(alias = "ls")]
    List(ListArgs),

    /// Show one idea in full
    Show(ShowArgs),

    /// Register a new idea
    Add(AddArgs),

    /// Edit fields of an idea and save them
    Set(SetArgs),

    /// Delete an idea
    #[command(alias = "rm")]
    Delete(DeleteArgs),

    /// Export the portfolio as CSV
    Export(ExportArgs),

    /// Send an idea to the automation workflow
    Automate(AutomateArgs),

    /// Portfolio reports (clusters, ranking)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Interactive session with buffered edits
    Shell(ShellArgs),

    /// Configuration management
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Aligned columns for the terminal
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl OutputFormat {
    /// Resolve `Auto` against the configured default, then `fallback`
    pub fn resolve(self, configured: Option<&str>, fallback: OutputFormat) -> OutputFormat {
        if self != OutputFormat::Auto {
            return self;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name.trim(), true).ok())
            .filter(|f| *f != OutputFormat::Auto)
            .unwrap_or(fallback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_resolve_format() {
        assert_eq!(
            OutputFormat::Json.resolve(Some("md"), OutputFormat::Tsv),
            OutputFormat::Json
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("md"), OutputFormat::Tsv),
            OutputFormat::Md
        );
        assert_eq!(
            OutputFormat::Auto.resolve(Some("bogus"), OutputFormat::Tsv),
            OutputFormat::Tsv
        );
        assert_eq!(OutputFormat::Auto.resolve(None, OutputFormat::Yaml), OutputFormat::Yaml);
    }

    #[test]
    fn test_global_flags_parse() {
        let cli = Cli::try_parse_from(["idf", "--demo", "-v", "list", "--cluster", "Smart Home"])
            .unwrap();
        assert!(cli.global.demo);
        assert!(cli.global.verbose);
        assert!(matches!(cli.command, Commands::List(_)));
    }
}
