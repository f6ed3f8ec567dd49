use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::models::{DateKey, DetailFailurePolicy, StrategyKind};

#[derive(Parser)]
#[command(name = "rmrb-archive")]
#[command(about = "Download People's Daily page PDFs and merge them into one file per day")]
#[command(version)]
pub struct Cli {
    /// Archive root holding download/, merged/ and download_log.txt
    #[arg(long, global = true)]
    pub root: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Download and merge every date in a range
    Run {
        /// Start date (YYYY-MM-DD)
        #[arg(long, requires = "to", conflicts_with = "year")]
        from: Option<NaiveDate>,

        /// End date, inclusive (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,

        /// Whole calendar year instead of --from/--to
        #[arg(long)]
        year: Option<i32>,

        /// Link source: index, pattern or era
        #[arg(short, long, default_value = "index")]
        strategy: String,

        /// Drop unresolvable layout pages instead of skipping the whole date
        #[arg(long)]
        tolerate_bad_pages: bool,

        /// Reprocess dates that already have a merged file
        #[arg(long)]
        force: bool,

        /// Print the run summary as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the page URLs for one date without downloading
    Resolve {
        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,

        /// Link source: index, pattern or era
        #[arg(short, long, default_value = "index")]
        strategy: String,

        /// Drop unresolvable layout pages instead of failing the date
        #[arg(long)]
        tolerate_bad_pages: bool,
    },

    /// Merge the page files already in download/ for one date
    Merge {
        /// Date (YYYY-MM-DD)
        #[arg(short, long)]
        date: NaiveDate,
    },
}

impl Commands {
    pub fn parse_strategy(strategy: &str) -> Result<StrategyKind, anyhow::Error> {
        match strategy.to_lowercase().as_str() {
            "index" | "index-crawl" | "crawl" => Ok(StrategyKind::IndexCrawl),
            "pattern" | "pattern-synthesis" => Ok(StrategyKind::PatternSynthesis),
            "era" => Ok(StrategyKind::Era),
            other => Err(anyhow::anyhow!(
                "Unsupported strategy: {}. Supported strategies: index, pattern, era",
                other
            )),
        }
    }

    pub fn failure_policy(tolerate_bad_pages: bool) -> DetailFailurePolicy {
        if tolerate_bad_pages {
            DetailFailurePolicy::SkipPage
        } else {
            DetailFailurePolicy::AbortDate
        }
    }

    /// Dates covered by `run`, from either `--from/--to` or `--year`
    pub fn run_dates(
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
        year: Option<i32>,
    ) -> Result<Vec<DateKey>, anyhow::Error> {
        let (from, to) = match (from, to, year) {
            (Some(from), Some(to), None) => (from, to),
            (None, None, Some(year)) => {
                let first = NaiveDate::from_ymd_opt(year, 1, 1)
                    .ok_or_else(|| anyhow::anyhow!("Invalid year: {}", year))?;
                let last = NaiveDate::from_ymd_opt(year, 12, 31)
                    .ok_or_else(|| anyhow::anyhow!("Invalid year: {}", year))?;
                (first, last)
            }
            _ => anyhow::bail!("Specify either --from and --to, or --year"),
        };

        if from > to {
            anyhow::bail!("Start date {} is after end date {}", from, to);
        }
        Ok(DateKey::range_inclusive(from, to))
    }
}
