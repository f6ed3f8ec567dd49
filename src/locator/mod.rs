//! Date to page-URL resolution
//!
//! The publisher changed its site layout at a known date, so there are two
//! independent strategies. They are picked explicitly (or by the cutover
//! date), never guessed from the site's responses.

pub mod index_crawl;
pub mod pattern;

pub use index_crawl::IndexCrawl;
pub use pattern::PatternSynthesis;

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::config::Config;
use crate::errors::Result;
use crate::models::{DateKey, DetailFailurePolicy, StrategyKind};
use crate::pacer::Pacer;
use crate::transport::Transport;

#[derive(Debug)]
pub enum Locator {
    IndexCrawl(IndexCrawl),
    PatternSynthesis(PatternSynthesis),
}

impl Locator {
    /// Ordered page URLs for `date`. Failures are logged and yield an empty list.
    pub async fn resolve(&self, transport: &dyn Transport, date: DateKey) -> Vec<String> {
        match self.try_resolve(transport, date).await {
            Ok(urls) => urls,
            Err(e) => {
                warn!(
                    "Failed to resolve page links for {} via {}: {}",
                    date,
                    self.kind().as_str(),
                    e
                );
                Vec::new()
            }
        }
    }

    async fn try_resolve(&self, transport: &dyn Transport, date: DateKey) -> Result<Vec<String>> {
        match self {
            Locator::IndexCrawl(crawl) => crawl.crawl(transport, date).await,
            Locator::PatternSynthesis(pattern) => {
                info!("{}: assuming {} pages", date, pattern.max_pages());
                pattern.synthesize(date)
            }
        }
    }

    pub fn kind(&self) -> StrategyKind {
        match self {
            Locator::IndexCrawl(_) => StrategyKind::IndexCrawl,
            Locator::PatternSynthesis(_) => StrategyKind::PatternSynthesis,
        }
    }
}

/// The strategy (or pair of strategies) chosen for a run
#[derive(Debug)]
pub enum LocatorSelection {
    Fixed(Locator),
    Era {
        cutover: NaiveDate,
        before: Locator,
        after: Locator,
    },
}

impl LocatorSelection {
    pub fn from_config(config: &Config, kind: StrategyKind, policy: DetailFailurePolicy) -> Self {
        let crawl = || {
            Locator::IndexCrawl(IndexCrawl::new(
                config.site.layout_base.clone(),
                config.site.pdf_base.clone(),
                config.site.relative_prefix.clone(),
                policy,
                Pacer::new("detail", config.detail_delay()),
            ))
        };
        let pattern = || {
            Locator::PatternSynthesis(PatternSynthesis::new(
                config.site.pattern_base.clone(),
                config.site.pattern_max_pages,
            ))
        };

        match kind {
            StrategyKind::IndexCrawl => LocatorSelection::Fixed(crawl()),
            StrategyKind::PatternSynthesis => LocatorSelection::Fixed(pattern()),
            StrategyKind::Era => LocatorSelection::Era {
                cutover: config.site.era_cutover,
                before: pattern(),
                after: crawl(),
            },
        }
    }

    /// Locator that handles `date`
    pub fn locator_for(&self, date: DateKey) -> &Locator {
        match self {
            LocatorSelection::Fixed(locator) => locator,
            LocatorSelection::Era { cutover, before, .. } if date.date() < *cutover => before,
            LocatorSelection::Era { after, .. } => after,
        }
    }

    pub async fn resolve(&self, transport: &dyn Transport, date: DateKey) -> Vec<String> {
        self.locator_for(date).resolve(transport, date).await
    }
}
