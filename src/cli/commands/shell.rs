//! `idf shell` command - interactive session with buffered edits
//!
//! Edits made with `set` stay in the edit buffer, shown in the ranking with
//! a `*` marker, until `save` flushes them or `discard` drops them.

use clap::{Parser, Subcommand};
use console::style;
use dialoguer::{theme::ColorfulTheme, Confirm};
use miette::{IntoDiagnostic, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast;

use crate::cli::commands::add::AddArgs;
use crate::cli::commands::automate::AutomateArgs;
use crate::cli::commands::export::ExportArgs;
use crate::cli::commands::list::FilterArgs;
use crate::cli::commands::set::parse_assignment;
use crate::cli::commands::show::print_detail;
use crate::cli::helpers::{open_portfolio, print_notice};
use crate::cli::table::{TableFormatter, TableRow, IDEA_COLUMNS};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::export::FILE_NAME;
use crate::core::ranking::{RankedView, SortKey, ViewState};
use crate::core::{Portfolio, PortfolioEvent};
use crate::entities::record::RecordId;

#[derive(clap::Args, Debug)]
pub struct ShellArgs {
    /// Answer yes to every confirmation (for scripted sessions)
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// One line typed at the shell prompt
#[derive(Parser, Debug)]
#[command(name = "idf", no_binary_name = true, disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: ShellCommand,
}

#[derive(Subcommand, Debug)]
enum ShellCommand {
    /// Show the current page of the ranking
    #[command(alias = "ls")]
    List,

    /// Show one idea, unsaved edits included
    Show { id: RecordId },

    /// Buffer edits as FIELD=VALUE without saving
    Set {
        id: RecordId,
        #[arg(required = true, value_name = "FIELD=VALUE")]
        assignments: Vec<String>,
    },

    /// Drop unsaved edits for one idea, or for all ideas
    Discard { id: Option<RecordId> },

    /// Save every unsaved edit
    Save,

    /// List ideas with unsaved edits
    Pending,

    /// Sort by a key; repeating the active key flips the direction
    Sort { key: String },

    /// Replace the filter; no options clears it
    Filter(FilterArgs),

    /// Go to a page
    Page { page: usize },

    /// Next page
    Next,

    /// Previous page
    Prev,

    /// Reload ideas from the backend, keeping unsaved edits
    Refresh,

    /// Register a new idea
    Add(AddArgs),

    /// Delete an idea
    Delete { id: RecordId },

    /// Send an idea to the automation workflow
    Automate(AutomateArgs),

    /// Export the saved portfolio as CSV
    Export(ExportArgs),

    /// Leave the shell
    #[command(alias = "exit")]
    Quit,
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    portfolio: Portfolio,
    events: broadcast::Receiver<PortfolioEvent>,
    assume_yes: bool,
}

pub async fn run(args: ShellArgs, global: &GlobalOpts) -> Result<()> {
    let portfolio = open_portfolio(global).await?;
    let events = portfolio.subscribe();
    let mut session = Session {
        portfolio,
        events,
        assume_yes: args.yes,
    };

    println!(
        "{} {} idea(s) loaded from {}. Type {} for commands.",
        style("idf shell").bold(),
        session.portfolio.len(),
        session.portfolio.gateway().describe(),
        style("help").cyan()
    );
    session.print_view();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        session.prompt();
        let Some(line) = lines.next_line().await.into_diagnostic()? else {
            println!();
            session.leave_on_eof();
            break;
        };

        let words = match split_line(&line) {
            Ok(words) => words,
            Err(e) => {
                eprintln!("{} {}", style("✗").red(), e);
                continue;
            }
        };
        if words.is_empty() {
            continue;
        }

        let parsed = match ShellLine::try_parse_from(&words) {
            Ok(parsed) => parsed,
            Err(e) => {
                let _ = e.print();
                continue;
            }
        };

        let flow = session.execute(parsed.command).await;
        session.print_events();
        match flow {
            Ok(Flow::Quit) => break,
            Ok(Flow::Continue) => {}
            Err(e) => eprintln!("{:?}", e),
        }
    }
    Ok(())
}

impl Session {
    async fn execute(&mut self, command: ShellCommand) -> Result<Flow> {
        match command {
            ShellCommand::List => self.print_view(),
            ShellCommand::Show { id } => {
                let record = self
                    .portfolio
                    .record(id)
                    .ok_or_else(|| miette::miette!("Idea {} not found", id))?;
                print_detail(&record);
                if self.portfolio.is_dirty(id) {
                    println!();
                    println!("{}", style("* unsaved changes").yellow());
                }
            }
            ShellCommand::Set { id, assignments } => {
                for raw in &assignments {
                    let (field, value) = parse_assignment(raw)?;
                    self.portfolio
                        .set_field_str(id, &field, &value)
                        .into_diagnostic()?;
                }
                self.print_view();
            }
            ShellCommand::Discard { id: Some(id) } => {
                if self.portfolio.discard(id) {
                    println!("{} Discarded changes to idea {}", style("ℹ").blue(), id);
                    self.print_view();
                } else {
                    println!("Idea {} has no unsaved changes.", id);
                }
            }
            ShellCommand::Discard { id: None } => {
                let pending = self.portfolio.dirty_ids().len();
                if pending == 0 {
                    println!("No unsaved changes.");
                } else if self.confirm(&format!("Discard changes to {} idea(s)?", pending))? {
                    self.portfolio.discard_all();
                    self.print_view();
                }
            }
            ShellCommand::Save => {
                let report = self.portfolio.save().await;
                if report.attempted() > 0 {
                    self.print_events();
                    self.print_view();
                }
            }
            ShellCommand::Pending => {
                let ids = self.portfolio.dirty_ids();
                if ids.is_empty() {
                    println!("No unsaved changes.");
                }
                for id in ids {
                    if let Some(record) = self.portfolio.record(id) {
                        println!("  {} {}", style(format!("#{}", id)).cyan(), record.name);
                    }
                }
            }
            ShellCommand::Sort { key } => {
                let key: SortKey = key.parse().map_err(|e: String| miette::miette!("{}", e))?;
                self.portfolio.toggle_sort(key);
                self.print_view();
            }
            ShellCommand::Filter(args) => {
                self.portfolio.set_filter(args.to_filter()?);
                self.print_view();
            }
            ShellCommand::Page { page } => {
                self.portfolio.set_page(page);
                self.print_view();
            }
            ShellCommand::Next => {
                let view = self.portfolio.view();
                self.portfolio.set_page(view.page + 1);
                self.print_view();
            }
            ShellCommand::Prev => {
                let view = self.portfolio.view();
                self.portfolio.set_page(view.page.saturating_sub(1));
                self.print_view();
            }
            ShellCommand::Refresh => {
                if self.portfolio.refresh().await.is_ok() {
                    self.print_events();
                    self.print_view();
                }
            }
            ShellCommand::Add(args) => {
                let new = args.to_new_record()?;
                if self.portfolio.add(new).await.is_ok() {
                    self.print_events();
                    self.print_view();
                }
            }
            ShellCommand::Delete { id } => {
                let record = self
                    .portfolio
                    .record(id)
                    .ok_or_else(|| miette::miette!("Idea {} not found", id))?;
                let prompt = format!("Delete idea #{} '{}'? This cannot be undone", id, record.name);
                if self.confirm(&prompt)? && self.portfolio.delete(id).await.is_ok() {
                    self.print_events();
                    self.print_view();
                }
            }
            ShellCommand::Automate(args) => {
                // failures arrive as notices
                let _ = self
                    .portfolio
                    .trigger_automation(args.id, &args.message)
                    .await;
            }
            ShellCommand::Export(args) => {
                if self.portfolio.is_empty() {
                    println!("{} There is no data to export", style("ℹ").blue());
                } else {
                    let path = args.output.unwrap_or_else(|| FILE_NAME.into());
                    let rows = self.portfolio.export_to(&path).into_diagnostic()?;
                    println!(
                        "{} Exported {} idea(s) to {}",
                        style("✓").green(),
                        rows,
                        path.display()
                    );
                }
            }
            ShellCommand::Quit => {
                let pending = self.portfolio.dirty_ids().len();
                if pending > 0
                    && !self.confirm(&format!(
                        "{} idea(s) have unsaved changes. Quit anyway?",
                        pending
                    ))?
                {
                    return Ok(Flow::Continue);
                }
                return Ok(Flow::Quit);
            }
        }
        Ok(Flow::Continue)
    }

    fn prompt(&self) {
        let pending = self.portfolio.dirty_ids().len();
        if pending > 0 {
            print!("idf [{} unsaved]> ", style(pending).yellow());
        } else {
            print!("idf> ");
        }
        let _ = std::io::stdout().flush();
    }

    /// Ask before a destructive step; unattended sessions only proceed with --yes
    fn confirm(&self, prompt: &str) -> Result<bool> {
        if self.assume_yes {
            return Ok(true);
        }
        if !console::user_attended() {
            println!("{} (use --yes to confirm in scripts)", prompt);
            return Ok(false);
        }
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()
            .into_diagnostic()
    }

    fn leave_on_eof(&self) {
        let pending = self.portfolio.dirty_ids().len();
        if pending > 0 {
            eprintln!(
                "{} Leaving with {} unsaved change(s); they were not saved",
                style("!").yellow(),
                pending
            );
        }
    }

    fn print_events(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(PortfolioEvent::Notice { level, message }) => print_notice(level, &message, false),
                Ok(PortfolioEvent::LoadFailed(diagnosis)) => {
                    eprintln!("{:?}", miette::Report::new(diagnosis));
                }
                Ok(_) => {}
                Err(broadcast::error::TryRecvError::Lagged(_)) => {}
                Err(_) => break,
            }
        }
    }

    fn print_view(&self) {
        let view = self.portfolio.view();
        if view.is_empty() {
            println!("No ideas found.");
        } else {
            let rows: Vec<TableRow> = view.rows.iter().map(TableRow::from_ranked).collect();
            TableFormatter::new(IDEA_COLUMNS, "idea")
                .without_summary()
                .output(&rows, OutputFormat::Tsv);
        }

        let footer = footer(&view, self.portfolio.view_state(), self.portfolio.dirty_ids().len());
        println!("{}", style(footer).dim());
    }
}

/// Status line under the table; no page indicator when nothing matched
fn footer(view: &RankedView, state: &ViewState, pending: usize) -> String {
    let mut parts = Vec::new();
    if view.page_count > 0 {
        parts.push(format!("Page {}/{}", view.page, view.page_count));
    }
    parts.push(format!("{} of {} idea(s)", view.matched, view.total_records));
    parts.push(format!("sort: {} {}", state.sort.key, state.sort.direction));
    if !state.filter.is_empty() {
        parts.push("filtered".to_string());
    }
    if pending > 0 {
        parts.push(format!("{} unsaved", pending));
    }
    parts.join(" | ")
}

/// Split a command line into words, honoring quotes and backslash escapes
fn split_line(line: &str) -> std::result::Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quote: Option<char> = None;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some('"'), '\\') | (None, '\\') => match chars.next() {
                Some(escaped) => {
                    current.push(escaped);
                    in_word = true;
                }
                None => return Err("Trailing backslash".to_string()),
            },
            (Some(_), c) => current.push(c),
            (None, '"') | (None, '\'') => {
                quote = Some(c);
                in_word = true;
            }
            (None, c) if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            (None, c) => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("Unclosed quote {}", q));
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
