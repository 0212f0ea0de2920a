//! Table formatting for ranked idea listings
//!
//! Rows are built from typed cells so the same data can be rendered as
//! aligned terminal columns, CSV, Markdown or bare ids.

use chrono::{DateTime, Utc};
use console::style;

use crate::cli::helpers::{escape_csv, format_revenue, truncate_str};
use crate::cli::OutputFormat;
use crate::core::entity::{Classification, Status};
use crate::core::ranking::RankedRow;
use crate::core::catalog::CRITERIA;
use crate::entities::record::RecordId;

/// A typed cell value with semantic meaning for formatting
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Plain text, truncated to the column width
    Text(String),
    /// Status with color coding
    Status(Status),
    /// Classification tier with color coding
    Tier(Classification),
    /// Single criterion score, 0..=5
    Score(u8),
    /// Score total
    Total(u32),
    /// Revenue estimate in whole units
    Revenue(f64),
    /// Creation date, shown as dd/mm/yyyy
    Date(Option<DateTime<Utc>>),
    /// Unsaved-changes marker
    Dirty(bool),
}

impl CellValue {
    /// Aligned, colored terminal form
    pub fn format_tsv(&self, width: usize) -> String {
        match self {
            CellValue::Text(s) => {
                format!("{:<width$}", truncate_str(s, width), width = width)
            }
            CellValue::Status(status) => {
                let s = status.label();
                let styled = match status {
                    Status::UnderReview => style(s).yellow(),
                    Status::Approved => style(s).green(),
                    Status::Cancelled => style(s).red().dim(),
                    Status::Completed => style(s).cyan().bold(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Tier(tier) => {
                let s = tier.label();
                let styled = match tier {
                    Classification::VeryHigh => style(s).green().bold(),
                    Classification::High => style(s).green(),
                    Classification::Medium => style(s).yellow(),
                    Classification::Low => style(s).dim(),
                };
                format!("{:<width$}", styled, width = width)
            }
            CellValue::Score(n) => {
                let styled = match n {
                    4..=5 => style(n).green(),
                    2..=3 => style(n).white(),
                    _ => style(n).dim(),
                };
                format!("{:>width$}", styled, width = width)
            }
            CellValue::Total(n) => format!("{:>width$}", style(n).bold(), width = width),
            CellValue::Revenue(v) => format!("{:>width$}", format_revenue(*v), width = width),
            CellValue::Date(_) => format!("{:<width$}", self.raw(), width = width),
            CellValue::Dirty(true) => format!("{:<width$}", style("*").yellow().bold(), width = width),
            CellValue::Dirty(false) => format!("{:<width$}", "", width = width),
        }
    }

    /// RFC 4180 form, no colors
    pub fn format_csv(&self) -> String {
        match self {
            CellValue::Text(s) => escape_csv(s),
            CellValue::Status(status) => status.to_string(),
            CellValue::Tier(tier) => tier.to_string(),
            CellValue::Revenue(v) => format!("{}", v),
            CellValue::Dirty(dirty) => dirty.to_string(),
            _ => self.raw(),
        }
    }

    /// Markdown form with escaped pipes
    pub fn format_md(&self) -> String {
        let raw = match self {
            CellValue::Revenue(v) => format_revenue(*v),
            CellValue::Dirty(true) => "*".to_string(),
            _ => self.raw(),
        };
        raw.replace('|', "\\|")
    }

    /// Unformatted display value
    pub fn raw(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Status(status) => status.label().to_string(),
            CellValue::Tier(tier) => tier.label().to_string(),
            CellValue::Score(n) => n.to_string(),
            CellValue::Total(n) => n.to_string(),
            CellValue::Revenue(v) => format_revenue(*v),
            CellValue::Date(date) => date
                .map(|d| d.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|| "-".to_string()),
            CellValue::Dirty(_) => String::new(),
        }
    }

    /// Width of the unstyled content, in characters
    pub fn display_width(&self) -> usize {
        match self {
            CellValue::Dirty(_) => 1,
            CellValue::Revenue(v) => format_revenue(*v).chars().count(),
            _ => self.raw().chars().count(),
        }
    }
}

/// Column definition with header label and maximum width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// Columns of the ranked idea listing
pub const IDEA_COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("dirty", "", 1),
    ColumnDef::new("name", "NAME", 32),
    ColumnDef::new("cluster", "CLUSTER", 18),
    ColumnDef::new("status", "STATUS", 13),
    ColumnDef::new("score_0", "ALN", 3),
    ColumnDef::new("score_1", "CUS", 3),
    ColumnDef::new("score_2", "FIN", 3),
    ColumnDef::new("score_3", "FEA", 3),
    ColumnDef::new("score_4", "CMP", 3),
    ColumnDef::new("total", "TOTAL", 5),
    ColumnDef::new("tier", "TIER", 10),
    ColumnDef::new("revenue", "REVENUE", 12),
    ColumnDef::new("created", "CREATED", 10),
];

/// A row of cell values keyed by column
pub struct TableRow {
    pub id: RecordId,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }

    /// Table row for one ranked idea
    pub fn from_ranked(row: &RankedRow) -> Self {
        const SCORE_KEYS: [&str; 5] = ["score_0", "score_1", "score_2", "score_3", "score_4"];

        let record = &row.record;
        let mut table_row = TableRow::new(record.id)
            .cell("dirty", CellValue::Dirty(row.dirty))
            .cell("name", CellValue::Text(record.name.clone()))
            .cell("cluster", CellValue::Text(record.cluster.clone()))
            .cell("status", CellValue::Status(record.status()));
        for (i, key) in SCORE_KEYS.iter().enumerate().take(CRITERIA.len()) {
            table_row = table_row.cell(key, CellValue::Score(record.scores.get(i)));
        }
        table_row
            .cell("total", CellValue::Total(row.total))
            .cell("tier", CellValue::Tier(row.classification))
            .cell("revenue", CellValue::Revenue(record.revenue_estimate))
            .cell("created", CellValue::Date(record.creation_date))
    }
}

/// Renders rows in the selected output format
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    noun: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], noun: &'static str) -> Self {
        Self {
            columns,
            noun,
            show_summary: true,
        }
    }

    /// Drop the trailing "N idea(s)" line
    pub fn without_summary(mut self) -> Self {
        self.show_summary = false;
        self
    }

    /// Render rows to a string in the given format
    pub fn render(&self, rows: &[TableRow], format: OutputFormat) -> String {
        match format {
            OutputFormat::Csv => self.render_csv(rows),
            OutputFormat::Md => self.render_md(rows),
            OutputFormat::Id => rows.iter().map(|r| format!("{}\n", r.id)).collect(),
            _ => self.render_tsv(rows),
        }
    }

    pub fn output(&self, rows: &[TableRow], format: OutputFormat) {
        print!("{}", self.render(rows, format));
    }

    /// Column widths sized to content, capped at each column's maximum
    fn widths(&self, rows: &[TableRow]) -> Vec<usize> {
        let id_width = rows
            .iter()
            .map(|r| r.id.to_string().len())
            .max()
            .unwrap_or(0)
            .max(2);

        std::iter::once(id_width)
            .chain(self.columns.iter().map(|col| {
                let content = rows
                    .iter()
                    .filter_map(|r| r.get(col.key))
                    .map(CellValue::display_width)
                    .max()
                    .unwrap_or(0);
                col.header.chars().count().max(content).min(col.width)
            }))
            .collect()
    }

    fn render_tsv(&self, rows: &[TableRow]) -> String {
        let widths = self.widths(rows);
        let mut out = String::new();

        let mut header = vec![format!("{:>width$}", style("ID").bold().dim(), width = widths[0])];
        for (col, width) in self.columns.iter().zip(&widths[1..]) {
            header.push(format!("{:<width$}", style(col.header).bold(), width = *width));
        }
        out.push_str(header.join(" ").trim_end());
        out.push('\n');

        let total_width: usize = widths.iter().sum::<usize>() + widths.len() - 1;
        out.push_str(&"-".repeat(total_width));
        out.push('\n');

        for row in rows {
            let mut parts = vec![format!("{:>width$}", style(row.id).cyan(), width = widths[0])];
            for (col, width) in self.columns.iter().zip(&widths[1..]) {
                match row.get(col.key) {
                    Some(value) => parts.push(value.format_tsv(*width)),
                    None => parts.push(format!("{:<width$}", "-", width = *width)),
                }
            }
            out.push_str(parts.join(" ").trim_end());
            out.push('\n');
        }

        if self.show_summary {
            out.push('\n');
            out.push_str(&format!("{} {}(s)\n", style(rows.len()).cyan(), self.noun));
        }
        out
    }

    fn render_csv(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = std::iter::once("id")
            .chain(self.columns.iter().map(|c| c.key))
            .collect();
        out.push_str(&headers.join(","));
        out.push('\n');

        for row in rows {
            let values: Vec<String> = std::iter::once(row.id.to_string())
                .chain(
                    self.columns
                        .iter()
                        .map(|c| row.get(c.key).map(CellValue::format_csv).unwrap_or_default()),
                )
                .collect();
            out.push_str(&values.join(","));
            out.push('\n');
        }
        out
    }

    fn render_md(&self, rows: &[TableRow]) -> String {
        let mut out = String::new();
        let headers: Vec<&str> = std::iter::once("ID")
            .chain(self.columns.iter().map(|c| if c.header.is_empty() { " " } else { c.header }))
            .collect();
        out.push_str(&format!("| {} |\n", headers.join(" | ")));
        out.push_str(&format!("|{}|\n", vec!["---"; headers.len()].join("|")));

        for row in rows {
            let values: Vec<String> = std::iter::once(row.id.to_string())
                .chain(self.columns.iter().map(|c| {
                    row.get(c.key)
                        .map(CellValue::format_md)
                        .unwrap_or_else(|| "-".to_string())
                }))
                .collect();
            out.push_str(&format!("| {} |\n", values.join(" | ")));
        }
        out
    }
}
