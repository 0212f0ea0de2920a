//! `idf list` command - ranked idea listing

use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;

use crate::cli::helpers::{load_config, open_portfolio, output_format};
use crate::cli::table::{TableFormatter, TableRow, IDEA_COLUMNS};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::catalog::find_cluster;
use crate::core::entity::{Classification, Status};
use crate::core::ranking::{parse_selector, RankedRow, SortDirection, SortKey, SortState};
use crate::core::Filter;
use crate::entities::record::Record;

/// Filter options shared by listing commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct FilterArgs {
    /// Only ideas in this cluster (name or id, "all" for any)
    #[arg(long, short = 'c')]
    pub cluster: Option<String>,

    /// Only ideas with this status (under-review, approved, cancelled, completed)
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Only ideas in this tier (very-high, high, medium, low)
    #[arg(long, short = 't')]
    pub tier: Option<String>,

    /// Case-insensitive text search over name and description
    #[arg(long)]
    pub search: Option<String>,
}

impl FilterArgs {
    /// Build the ranking filter, rejecting unknown selectors
    pub fn to_filter(&self) -> Result<Filter> {
        let cluster = match self.cluster.as_deref() {
            Some(raw) => parse_selector::<String>(raw)
                .map_err(|e| miette::miette!("{}", e))?
                .map(|name| {
                    find_cluster(&name)
                        .map(|c| c.short_title.to_string())
                        .unwrap_or(name)
                }),
            None => None,
        };
        let status = match self.status.as_deref() {
            Some(raw) => parse_selector::<Status>(raw).map_err(|e| miette::miette!("{}", e))?,
            None => None,
        };
        let classification = match self.tier.as_deref() {
            Some(raw) => {
                parse_selector::<Classification>(raw).map_err(|e| miette::miette!("{}", e))?
            }
            None => None,
        };
        let search = self
            .search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(Filter {
            cluster,
            status,
            classification,
            search,
        })
    }
}

/// Sort options shared by listing commands
#[derive(clap::Args, Debug, Clone)]
pub struct SortArgs {
    /// Sort key: total, name, revenue, created, cluster, status, a criterion id or score_N
    #[arg(long, default_value = "total")]
    pub sort: String,

    /// Sort ascending instead of descending
    #[arg(long)]
    pub asc: bool,
}

impl SortArgs {
    pub fn to_sort(&self) -> Result<SortState> {
        let key: SortKey = self.sort.parse().map_err(|e: String| {
            miette::miette!(
                help = format!(
                    "Valid keys: {}",
                    SortKey::all()
                        .iter()
                        .map(|k| k.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
                "{}",
                e
            )
        })?;
        let direction = if self.asc {
            SortDirection::Ascending
        } else {
            SortDirection::Descending
        };
        Ok(SortState { key, direction })
    }
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub filter: FilterArgs,

    #[command(flatten)]
    pub sort: SortArgs,

    /// Page to show (10 ideas per page)
    #[arg(long, short = 'p', default_value_t = 1)]
    pub page: usize,

    /// Show every matching idea without paging
    #[arg(long, conflicts_with = "page")]
    pub all: bool,

    /// Print only the number of matching ideas
    #[arg(long)]
    pub count: bool,
}

/// Machine-readable listing entry: the record plus its derived values
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListedIdea {
    #[serde(flatten)]
    pub record: Record,
    pub total_score: u32,
    pub classification: Classification,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub unsaved: bool,
}

impl From<RankedRow> for ListedIdea {
    fn from(row: RankedRow) -> Self {
        Self {
            record: row.record,
            total_score: row.total,
            classification: row.classification,
            unsaved: row.dirty,
        }
    }
}

pub async fn run(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let config = load_config(global);
    let format = output_format(global, &config, OutputFormat::Tsv);

    let filter = args.filter.to_filter()?;
    let sort = args.sort.to_sort()?;

    let mut portfolio = open_portfolio(global).await?;
    portfolio.set_filter(filter);
    portfolio.set_sort(sort);
    portfolio.set_page(args.page);

    let (rows, page, page_count, matched) = if args.all {
        let rows = portfolio.ranked();
        let matched = rows.len();
        (rows, 1, 1, matched)
    } else {
        let view = portfolio.view();
        (view.rows, view.page, view.page_count, view.matched)
    };

    if args.count {
        println!("{}", matched);
        return Ok(());
    }

    if rows.is_empty() {
        match format {
            OutputFormat::Json => println!("[]"),
            OutputFormat::Yaml => println!("[]"),
            _ => {
                println!("No ideas found.");
                if !portfolio.view_state().filter.is_empty() {
                    println!();
                    println!("{}", style("Try relaxing the filters, or use 'all'.").dim());
                }
            }
        }
        return Ok(());
    }

    print_rows(rows, format, global)?;

    if format == OutputFormat::Tsv && !global.quiet && !args.all && page_count > 1 {
        println!(
            "{}",
            style(format!(
                "Page {} of {} ({} matching, {} total). Use --page N or --all.",
                page,
                page_count,
                matched,
                portfolio.len()
            ))
            .dim()
        );
    }

    Ok(())
}

/// Print ranked rows in the requested format
pub fn print_rows(rows: Vec<RankedRow>, format: OutputFormat, global: &GlobalOpts) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let ideas: Vec<ListedIdea> = rows.into_iter().map(ListedIdea::from).collect();
            let json = serde_json::to_string_pretty(&ideas).into_diagnostic()?;
            println!("{}", json);
        }
        OutputFormat::Yaml => {
            let ideas: Vec<ListedIdea> = rows.into_iter().map(ListedIdea::from).collect();
            let yaml = serde_yml::to_string(&ideas).into_diagnostic()?;
            print!("{}", yaml);
        }
        _ => {
            let table_rows: Vec<TableRow> = rows.iter().map(TableRow::from_ranked).collect();
            let mut formatter = TableFormatter::new(IDEA_COLUMNS, "idea");
            if global.quiet {
                formatter = formatter.without_summary();
            }
            formatter.output(&table_rows, format);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_args_all_disables_predicates() {
        let args = FilterArgs {
            cluster: Some("all".to_string()),
            status: Some("ALL".to_string()),
            tier: None,
            search: Some("  ".to_string()),
        };
        assert!(args.to_filter().unwrap().is_empty());
    }

    #[test]
    fn test_filter_args_resolves_cluster_id() {
        let args = FilterArgs {
            cluster: Some("smart-home".to_string()),
            tier: Some("very-high".to_string()),
            ..Default::default()
        };
        let filter = args.to_filter().unwrap();
        assert_eq!(filter.cluster.as_deref(), Some("Smart Home"));
        assert_eq!(filter.classification, Some(Classification::VeryHigh));
    }

    #[test]
    fn test_filter_args_rejects_unknown_status() {
        let args = FilterArgs {
            status: Some("shipped".to_string()),
            ..Default::default()
        };
        assert!(args.to_filter().is_err());
    }

    #[test]
    fn test_sort_args() {
        let args = SortArgs {
            sort: "revenue".to_string(),
            asc: true,
        };
        let sort = args.to_sort().unwrap();
        assert_eq!(sort.key, SortKey::Revenue);
        assert_eq!(sort.direction, SortDirection::Ascending);

        let args = SortArgs {
            sort: "bogus".to_string(),
            asc: false,
        };
        assert!(args.to_sort().is_err());
    }
}
