//! Centralized configuration management for rmrb-archive

use anyhow::{Context, Result};
use chrono::NaiveDate;
use std::path::PathBuf;
use std::time::Duration;

use crate::storage::ArchiveLayout;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:77.0) Gecko/20100101 Firefox/77.0";

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding `download/`, `merged/` and the download log
    pub root: PathBuf,
    /// Pacing between requests
    pub rate_limits: RateLimits,
    /// HTTP client configuration
    pub http: HttpConfig,
    /// Source site locations
    pub site: SiteConfig,
}

/// Pacing configuration, all in milliseconds
#[derive(Debug, Clone)]
pub struct RateLimits {
    /// Delay between layout detail page fetches
    pub detail_delay_ms: u64,
    /// Delay after each PDF download
    pub download_delay_ms: u64,
    /// Delay between dates
    pub day_delay_ms: u64,
}

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// User agent string
    pub user_agent: String,
}

/// Where the publisher keeps its pages
#[derive(Debug, Clone)]
pub struct SiteConfig {
    /// Base of the layout index and detail pages
    pub layout_base: String,
    /// Base that relative PDF links on detail pages resolve against
    pub pdf_base: String,
    /// Relative prefix stripped from detail page links
    pub relative_prefix: String,
    /// Base of the historical image archive
    pub pattern_base: String,
    /// Page count assumed by pattern synthesis
    pub pattern_max_pages: u32,
    /// First date served by the layout site
    pub era_cutover: NaiveDate,
}

impl Default for RateLimits {
    fn default() -> Self {
        Self {
            detail_delay_ms: 500,
            download_delay_ms: 500,
            day_delay_ms: 1000,
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            layout_base: "http://paper.people.com.cn/rmrb/pc/layout/".to_string(),
            pdf_base: "https://paper.people.com.cn/rmrb/pc/".to_string(),
            relative_prefix: "../../../".to_string(),
            pattern_base: "https://paper.people.com.cn/rmrb/images/".to_string(),
            pattern_max_pages: 20,
            era_cutover: default_era_cutover(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            rate_limits: RateLimits::default(),
            http: HttpConfig::default(),
            site: SiteConfig::default(),
        }
    }
}

fn default_era_cutover() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 12, 1).unwrap_or(NaiveDate::MIN)
}

impl Config {
    /// Load configuration from environment variables and defaults
    pub fn from_env() -> Result<Self> {
        let defaults = Config::default();

        let root = std::env::var("RMRB_ROOT")
            .map(PathBuf::from)
            .unwrap_or(defaults.root);

        let rate_limits = RateLimits {
            detail_delay_ms: parse_env_var("RMRB_DETAIL_DELAY_MS")?
                .unwrap_or(defaults.rate_limits.detail_delay_ms),
            download_delay_ms: parse_env_var("RMRB_DOWNLOAD_DELAY_MS")?
                .unwrap_or(defaults.rate_limits.download_delay_ms),
            day_delay_ms: parse_env_var("RMRB_DAY_DELAY_MS")?
                .unwrap_or(defaults.rate_limits.day_delay_ms),
        };

        let http = HttpConfig {
            timeout_seconds: parse_env_var("RMRB_HTTP_TIMEOUT_SECONDS")?
                .unwrap_or(defaults.http.timeout_seconds),
            user_agent: std::env::var("RMRB_USER_AGENT").unwrap_or(defaults.http.user_agent),
        };

        let site = SiteConfig {
            layout_base: std::env::var("RMRB_LAYOUT_BASE").unwrap_or(defaults.site.layout_base),
            pdf_base: std::env::var("RMRB_PDF_BASE").unwrap_or(defaults.site.pdf_base),
            relative_prefix: defaults.site.relative_prefix,
            pattern_base: std::env::var("RMRB_PATTERN_BASE").unwrap_or(defaults.site.pattern_base),
            pattern_max_pages: parse_env_var("RMRB_PATTERN_MAX_PAGES")?
                .unwrap_or(defaults.site.pattern_max_pages),
            era_cutover: parse_env_var("RMRB_ERA_CUTOVER")?.unwrap_or(defaults.site.era_cutover),
        };

        Ok(Config {
            root,
            rate_limits,
            http,
            site,
        })
    }

    pub fn layout(&self) -> ArchiveLayout {
        ArchiveLayout::new(&self.root)
    }

    pub fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limits.detail_delay_ms)
    }

    pub fn download_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limits.download_delay_ms)
    }

    pub fn day_delay(&self) -> Duration {
        Duration::from_millis(self.rate_limits.day_delay_ms)
    }

    /// Get HTTP timeout as Duration
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    /// Validate configuration and create the archive directories
    pub fn validate(&self) -> Result<()> {
        if self.site.pattern_max_pages == 0 {
            return Err(anyhow::anyhow!("RMRB_PATTERN_MAX_PAGES must be at least 1"));
        }

        for base in [&self.site.layout_base, &self.site.pdf_base, &self.site.pattern_base] {
            url::Url::parse(base).with_context(|| format!("Invalid base URL: {}", base))?;
            // Url::join replaces the last segment of a base without one
            if !base.ends_with('/') {
                return Err(anyhow::anyhow!("Base URL must end with '/': {}", base));
            }
        }

        self.layout()
            .ensure()
            .with_context(|| format!("Cannot create archive directories under {}", self.root.display()))?;

        Ok(())
    }
}

/// Helper function to parse environment variable as a specific type
fn parse_env_var<T>(var_name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display + Send + Sync + std::error::Error + 'static,
{
    match std::env::var(var_name) {
        Ok(val) => val.parse().map(Some).with_context(|| {
            format!("Failed to parse environment variable {} = '{}'", var_name, val)
        }),
        Err(_) => Ok(None),
    }
}
