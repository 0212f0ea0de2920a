//! Ranking pipeline: overlay → filter → sort → classify → paginate
//!
//! Every step is a pure function over plain records. The pipeline never
//! mutates the store or the buffer; it produces an owned [`RankedView`].

use std::cmp::Ordering;
use std::str::FromStr;

use crate::core::buffer::EditBuffer;
use crate::core::catalog::{criterion_index, CRITERIA, CRITERIA_COUNT};
use crate::core::entity::{Classification, Status};
use crate::core::store::RecordStore;
use crate::entities::record::Record;

/// Rows per page
pub const PAGE_SIZE: usize = 10;

/// Canonical records with buffered edits applied, in store order
pub fn overlay(store: &RecordStore, buffer: &EditBuffer) -> Vec<Record> {
    store.records().iter().map(|r| buffer.effective(r)).collect()
}

/// Parse a filter selector where `all` (or nothing) disables the predicate
pub fn parse_selector<T>(raw: &str) -> Result<Option<T>, T::Err>
where
    T: FromStr,
{
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
        Ok(None)
    } else {
        trimmed.parse().map(Some)
    }
}

/// Conjunction of optional predicates; `None` matches everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub cluster: Option<String>,
    pub status: Option<Status>,
    pub classification: Option<Classification>,
    /// Case-insensitive substring over name and description
    pub search: Option<String>,
}

impl Filter {
    pub fn matches(&self, record: &Record) -> bool {
        if let Some(cluster) = &self.cluster {
            if !record.cluster.trim().eq_ignore_ascii_case(cluster.trim()) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if record.status() != status {
                return false;
            }
        }
        if let Some(tier) = self.classification {
            if record.classification() != tier {
                return false;
            }
        }
        if let Some(search) = &self.search {
            let needle = fold(search);
            if !needle.is_empty()
                && !fold(&record.name).contains(&needle)
                && !fold(&record.description).contains(&needle)
            {
                return false;
            }
        }
        true
    }

    pub fn is_empty(&self) -> bool {
        *self == Filter::default()
    }
}

/// A sortable column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SortKey {
    Id,
    Name,
    Description,
    TargetAudience,
    BusinessModel,
    Cluster,
    Status,
    Creator,
    Created,
    Revenue,
    Total,
    Score(usize),
}

impl SortKey {
    /// Keys compared as text rather than numbers
    pub fn is_text(&self) -> bool {
        matches!(
            self,
            SortKey::Name
                | SortKey::Description
                | SortKey::TargetAudience
                | SortKey::BusinessModel
                | SortKey::Cluster
                | SortKey::Status
                | SortKey::Creator
        )
    }

    /// All keys, for help output
    pub fn all() -> Vec<SortKey> {
        let mut keys = vec![
            SortKey::Id,
            SortKey::Name,
            SortKey::Description,
            SortKey::TargetAudience,
            SortKey::BusinessModel,
            SortKey::Cluster,
            SortKey::Status,
            SortKey::Creator,
            SortKey::Created,
            SortKey::Revenue,
            SortKey::Total,
        ];
        keys.extend((0..CRITERIA_COUNT).map(SortKey::Score));
        keys
    }

    fn text<'a>(&self, record: &'a Record) -> &'a str {
        match self {
            SortKey::Name => &record.name,
            SortKey::Description => &record.description,
            SortKey::TargetAudience => &record.target_audience,
            SortKey::BusinessModel => &record.business_model,
            SortKey::Cluster => &record.cluster,
            SortKey::Status => record.status().label(),
            SortKey::Creator => &record.creator_name,
            _ => "",
        }
    }

    fn number(&self, record: &Record) -> f64 {
        match self {
            SortKey::Id => record.id as f64,
            SortKey::Created => record
                .creation_date
                .map(|d| d.timestamp_millis() as f64)
                .unwrap_or(f64::MIN),
            SortKey::Revenue => record.revenue_estimate,
            SortKey::Total => f64::from(record.total()),
            SortKey::Score(i) => f64::from(record.scores.get(*i)),
            _ => 0.0,
        }
    }

    /// Ascending comparison of two records on this key
    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        if self.is_text() {
            fold(self.text(a)).cmp(&fold(self.text(b)))
        } else {
            self.number(a).total_cmp(&self.number(b))
        }
    }
}

impl std::fmt::Display for SortKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortKey::Id => write!(f, "id"),
            SortKey::Name => write!(f, "name"),
            SortKey::Description => write!(f, "description"),
            SortKey::TargetAudience => write!(f, "target_audience"),
            SortKey::BusinessModel => write!(f, "business_model"),
            SortKey::Cluster => write!(f, "cluster"),
            SortKey::Status => write!(f, "status"),
            SortKey::Creator => write!(f, "creator"),
            SortKey::Created => write!(f, "created"),
            SortKey::Revenue => write!(f, "revenue"),
            SortKey::Total => write!(f, "total"),
            SortKey::Score(i) => match CRITERIA.get(*i) {
                Some(c) => write!(f, "{}", c.id),
                None => write!(f, "score_{}", i),
            },
        }
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        let parsed = match key.as_str() {
            "id" => SortKey::Id,
            "name" | "service" => SortKey::Name,
            "description" | "need" => SortKey::Description,
            "target_audience" | "audience" => SortKey::TargetAudience,
            "business_model" | "model" => SortKey::BusinessModel,
            "cluster" => SortKey::Cluster,
            "status" => SortKey::Status,
            "creator" => SortKey::Creator,
            "created" | "creation_date" | "date" => SortKey::Created,
            "revenue" | "revenue_estimate" => SortKey::Revenue,
            "total" => SortKey::Total,
            other => {
                let index = match other.strip_prefix("score_") {
                    Some(n) => n.parse::<usize>().ok(),
                    None => criterion_index(other),
                };
                match index {
                    Some(i) if i < CRITERIA_COUNT => SortKey::Score(i),
                    _ => return Err(format!("Unknown sort key: {}", s)),
                }
            }
        };
        Ok(parsed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

impl std::fmt::Display for SortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortDirection::Ascending => write!(f, "asc"),
            SortDirection::Descending => write!(f, "desc"),
        }
    }
}

/// Active sort key and direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortState {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortState {
    fn default() -> Self {
        Self {
            key: SortKey::Total,
            direction: SortDirection::Descending,
        }
    }
}

impl SortState {
    /// Select a key: the active key flips direction, a new key starts descending
    pub fn toggle(&mut self, key: SortKey) {
        if self.key == key {
            self.direction = self.direction.flipped();
        } else {
            self.key = key;
            self.direction = SortDirection::Descending;
        }
    }

    /// Sort in place. Ties keep no particular order.
    pub fn apply(&self, records: &mut [Record]) {
        let key = self.key;
        match self.direction {
            SortDirection::Ascending => records.sort_unstable_by(|a, b| key.compare(a, b)),
            SortDirection::Descending => records.sort_unstable_by(|a, b| key.compare(b, a)),
        }
    }
}

/// Number of pages needed for `items` rows
pub fn page_count(items: usize) -> usize {
    items.div_ceil(PAGE_SIZE)
}

/// Clamp a requested page (1-based) into the valid range; 1 when empty
pub fn clamp_page(requested: usize, pages: usize) -> usize {
    requested.clamp(1, pages.max(1))
}

/// Filter, sort and paging selections of a view
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub filter: Filter,
    pub sort: SortState,
    /// 1-based requested page
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            filter: Filter::default(),
            sort: SortState::default(),
            page: 1,
        }
    }
}

impl ViewState {
    /// Replace the filter; any change sends the view back to page 1
    pub fn set_filter(&mut self, filter: Filter) {
        if filter != self.filter {
            self.filter = filter;
            self.page = 1;
        }
    }

    pub fn toggle_sort(&mut self, key: SortKey) {
        self.sort.toggle(key);
    }

    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }
}

/// One displayed row with its derived values
#[derive(Debug, Clone, PartialEq)]
pub struct RankedRow {
    pub record: Record,
    pub total: u32,
    pub classification: Classification,
    /// Row shows unsaved edits
    pub dirty: bool,
}

/// One page of the ranked portfolio
#[derive(Debug, Clone, PartialEq)]
pub struct RankedView {
    pub rows: Vec<RankedRow>,
    /// Effective (clamped) page, 1-based
    pub page: usize,
    pub page_count: usize,
    /// Rows that passed the filter
    pub matched: usize,
    /// Records in the store
    pub total_records: usize,
}

impl RankedView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Overlay, filter, sort and classify every record, without paging
pub fn rank_all(store: &RecordStore, buffer: &EditBuffer, view: &ViewState) -> Vec<RankedRow> {
    let mut records: Vec<Record> = overlay(store, buffer)
        .into_iter()
        .filter(|r| view.filter.matches(r))
        .collect();
    view.sort.apply(&mut records);

    records
        .into_iter()
        .map(|record| {
            let total = record.total();
            RankedRow {
                classification: Classification::from_total(total),
                dirty: buffer.is_dirty(record.id),
                total,
                record,
            }
        })
        .collect()
}

/// Run the full pipeline and cut out the current page
pub fn rank(store: &RecordStore, buffer: &EditBuffer, view: &ViewState) -> RankedView {
    let rows = rank_all(store, buffer, view);
    let matched = rows.len();
    let pages = page_count(matched);
    let page = clamp_page(view.page, pages);

    let rows = rows
        .into_iter()
        .skip((page - 1) * PAGE_SIZE)
        .take(PAGE_SIZE)
        .collect();

    RankedView {
        rows,
        page,
        page_count: pages,
        matched,
        total_records: store.len(),
    }
}

/// Lowercase and strip common Latin diacritics for primary-strength comparison
pub fn fold(s: &str) -> String {
    s.chars()
        .flat_map(char::to_lowercase)
        .map(|c| match c {
            'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
            'é' | 'è' | 'ê' | 'ë' => 'e',
            'í' | 'ì' | 'î' | 'ï' => 'i',
            'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
            'ú' | 'ù' | 'û' | 'ü' => 'u',
            'ç' => 'c',
            'ñ' => 'n',
            'ý' | 'ÿ' => 'y',
            other => other,
        })
        .collect()
}
