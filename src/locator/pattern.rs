//! URL synthesis for the historical image archive

use url::Url;

use crate::errors::{ArchiveError, Result};
use crate::models::{DateKey, PageIndex};

/// Builds `{base}{YYYY-MM}/{DD}/{PP}/rmrb{YYYYMMDD}{PP}.pdf` for a fixed
/// number of pages. Pages past the real end of an issue simply fail to fetch.
#[derive(Debug, Clone)]
pub struct PatternSynthesis {
    base: String,
    max_pages: u32,
}

impl PatternSynthesis {
    pub fn new(base: impl Into<String>, max_pages: u32) -> Self {
        PatternSynthesis {
            base: base.into(),
            max_pages,
        }
    }

    pub fn max_pages(&self) -> u32 {
        self.max_pages
    }

    pub fn synthesize(&self, date: DateKey) -> Result<Vec<String>> {
        let base = Url::parse(&self.base).map_err(|e| ArchiveError::invalid_url(&self.base, e))?;

        PageIndex::up_to(self.max_pages)
            .map(|page| {
                let relative = format!(
                    "{}/{}/rmrb{}{}.pdf",
                    date.path_fragment(),
                    page.padded(),
                    date.compact(),
                    page.padded()
                );
                base.join(&relative)
                    .map(String::from)
                    .map_err(|e| ArchiveError::invalid_url(relative, e))
            })
            .collect()
    }
}
