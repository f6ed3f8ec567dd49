use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A publication date. Every string form used in URLs and file names is
/// derived from the one `NaiveDate` held here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        DateKey(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// `YYYY-MM-DD`
    pub fn canonical(&self) -> String {
        self.0.format("%Y-%m-%d").to_string()
    }

    /// `YYYYMMDD`, used in file names and pattern URLs
    pub fn compact(&self) -> String {
        self.0.format("%Y%m%d").to_string()
    }

    /// `YYYY-MM/DD`, used by the historical image archive
    pub fn path_fragment(&self) -> String {
        self.0.format("%Y-%m/%d").to_string()
    }

    /// `YYYYMM/DD`, used by the layout pages
    pub fn layout_fragment(&self) -> String {
        self.0.format("%Y%m/%d").to_string()
    }

    /// Inclusive, ascending range of dates. Empty when `from > to`.
    pub fn range_inclusive(from: NaiveDate, to: NaiveDate) -> Vec<DateKey> {
        from.iter_days()
            .take_while(|d| *d <= to)
            .map(DateKey)
            .collect()
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// 1-based page number within one day's issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PageIndex(u32);

impl PageIndex {
    pub const FIRST: PageIndex = PageIndex(1);

    /// Zero-padded to two digits
    pub fn padded(&self) -> String {
        format!("{:02}", self.0)
    }

    /// Pages `1..=count` in order
    pub fn up_to(count: u32) -> impl Iterator<Item = PageIndex> {
        (1..=count).map(PageIndex)
    }
}

impl fmt::Display for PageIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.padded())
    }
}

/// Which page locator to use for a date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StrategyKind {
    /// Crawl the layout index and detail pages
    IndexCrawl,
    /// Synthesize URLs for the historical image archive
    PatternSynthesis,
    /// Pattern synthesis before the site cutover date, index crawl after
    Era,
}

impl StrategyKind {
    pub fn as_str(&self) -> &str {
        match self {
            StrategyKind::IndexCrawl => "index",
            StrategyKind::PatternSynthesis => "pattern",
            StrategyKind::Era => "era",
        }
    }
}

/// How an index crawl treats a single detail page that cannot be resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetailFailurePolicy {
    /// The whole date resolves to nothing
    #[default]
    AbortDate,
    /// Only the broken page is left out
    SkipPage,
}

/// Result of processing one date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayOutcome {
    Merged { pages: usize, rejected: usize },
    AlreadyMerged,
    NoUrls,
    NoFiles,
    MergeFailed(String),
}

impl DayOutcome {
    pub fn as_str(&self) -> &str {
        match self {
            DayOutcome::Merged { .. } => "merged",
            DayOutcome::AlreadyMerged => "already merged",
            DayOutcome::NoUrls => "no urls",
            DayOutcome::NoFiles => "no files",
            DayOutcome::MergeFailed(_) => "merge failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub dates: usize,
    pub merged: usize,
    pub already_merged: usize,
    pub no_urls: usize,
    pub no_files: usize,
    pub merge_failed: usize,
}

impl RunSummary {
    pub fn record(&mut self, outcome: &DayOutcome) {
        self.dates += 1;
        match outcome {
            DayOutcome::Merged { .. } => self.merged += 1,
            DayOutcome::AlreadyMerged => self.already_merged += 1,
            DayOutcome::NoUrls => self.no_urls += 1,
            DayOutcome::NoFiles => self.no_files += 1,
            DayOutcome::MergeFailed(_) => self.merge_failed += 1,
        }
    }
}
