//! Per-date pipeline and the date-range driver

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::Result;
use crate::fetcher::{FetchStatus, Fetcher};
use crate::locator::LocatorSelection;
use crate::merger;
use crate::models::{DateKey, DayOutcome, PageIndex, RunSummary};
use crate::pacer::Pacer;
use crate::storage::{ArchiveLayout, DownloadLog};
use crate::transport::Transport;

pub struct Archiver {
    transport: Arc<dyn Transport>,
    locators: LocatorSelection,
    fetcher: Fetcher,
    layout: ArchiveLayout,
    log: DownloadLog,
    day_pacer: Pacer,
    force: bool,
}

impl Archiver {
    pub fn new(
        transport: Arc<dyn Transport>,
        locators: LocatorSelection,
        layout: ArchiveLayout,
        download_pacer: Pacer,
        day_pacer: Pacer,
    ) -> Self {
        let fetcher = Fetcher::new(transport.clone(), download_pacer);
        let log = DownloadLog::new(layout.log_path());
        Archiver {
            transport,
            locators,
            fetcher,
            layout,
            log,
            day_pacer,
            force: false,
        }
    }

    /// Process dates that already have a merged file instead of skipping them
    pub fn with_force(mut self, force: bool) -> Self {
        self.force = force;
        self
    }

    /// Process every date in order, pausing between dates
    pub async fn run(&self, dates: &[DateKey]) -> RunSummary {
        let mut summary = RunSummary::default();

        for (i, date) in dates.iter().enumerate() {
            if i > 0 {
                self.day_pacer.ready().await;
            }
            info!("Processing {} ({}/{})", date, i + 1, dates.len());

            let outcome = self.process_date(*date).await;
            summary.record(&outcome);
            self.day_pacer.completed();
        }

        info!(
            "Run finished: {} dates, {} merged, {} already merged, {} without links, {} without files, {} merge failures",
            summary.dates,
            summary.merged,
            summary.already_merged,
            summary.no_urls,
            summary.no_files,
            summary.merge_failed
        );
        summary
    }

    /// Resolve, log, fetch and merge one date. Never fails; the outcome says what happened.
    pub async fn process_date(&self, date: DateKey) -> DayOutcome {
        let merged_path = self.layout.merged_path(date);
        if !self.force && merged_path.exists() {
            info!("{} already merged at {}, skipping", date, merged_path.display());
            return DayOutcome::AlreadyMerged;
        }

        let urls = self.locators.resolve(self.transport.as_ref(), date).await;
        if urls.is_empty() {
            warn!("{}: no PDF links found, skipping", date);
            return DayOutcome::NoUrls;
        }

        if let Err(e) = self.log.append(date, &urls) {
            warn!("Failed to record {} in download log: {}", date, e);
        }

        let files = self.fetch_pages(date, &urls).await;
        if files.is_empty() {
            warn!("{}: no PDF files downloaded", date);
            return DayOutcome::NoFiles;
        }

        merge_day(&self.layout, date, &files)
    }

    async fn fetch_pages(&self, date: DateKey, urls: &[String]) -> Vec<PathBuf> {
        let mut files = Vec::with_capacity(urls.len());

        for (page, url) in PageIndex::up_to(urls.len() as u32).zip(urls) {
            let destination = self.layout.page_path(date, page);
            match self.fetcher.fetch(url, &destination).await {
                Ok(FetchStatus::Downloaded { .. }) | Ok(FetchStatus::AlreadyPresent) => {
                    files.push(destination);
                }
                Err(e) => {
                    warn!("Failed to download {}: {}", url, e);
                }
            }
        }

        files
    }
}

/// Merge whatever page files for `date` are already in `download/`
pub fn merge_existing(layout: &ArchiveLayout, date: DateKey) -> Result<DayOutcome> {
    let files = layout.existing_pages(date)?;
    if files.is_empty() {
        warn!("{}: no page files in {}", date, layout.download_dir().display());
        return Ok(DayOutcome::NoFiles);
    }
    Ok(merge_day(layout, date, &files))
}

fn merge_day(layout: &ArchiveLayout, date: DateKey, files: &[PathBuf]) -> DayOutcome {
    let output = layout.merged_path(date);
    match merger::merge(files, &output) {
        Ok(report) => {
            info!(
                "{}: merged {} of {} files into {}",
                date,
                report.appended.len(),
                files.len(),
                output.display()
            );
            DayOutcome::Merged {
                pages: report.appended.len(),
                rejected: report.rejected.len(),
            }
        }
        Err(e) => {
            warn!("{}: merge failed: {}", date, e);
            DayOutcome::MergeFailed(e.to_string())
        }
    }
}
