use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::errors::Result;
use crate::models::{DateKey, PageIndex};

const DOWNLOAD_DIR: &str = "download";
const MERGED_DIR: &str = "merged";
const LOG_FILE: &str = "download_log.txt";
const FILE_PREFIX: &str = "rmrb";

/// On-disk layout of the archive
#[derive(Debug, Clone)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    pub fn new(root: impl AsRef<Path>) -> Self {
        ArchiveLayout {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.root.join(DOWNLOAD_DIR)
    }

    pub fn merged_dir(&self) -> PathBuf {
        self.root.join(MERGED_DIR)
    }

    pub fn log_path(&self) -> PathBuf {
        self.root.join(LOG_FILE)
    }

    /// `download/rmrb{YYYYMMDD}{PP}.pdf`
    pub fn page_path(&self, date: DateKey, page: PageIndex) -> PathBuf {
        self.download_dir()
            .join(format!("{}{}{}.pdf", FILE_PREFIX, date.compact(), page.padded()))
    }

    /// `merged/rmrb{YYYYMMDD}.pdf`
    pub fn merged_path(&self, date: DateKey) -> PathBuf {
        self.merged_dir()
            .join(format!("{}{}.pdf", FILE_PREFIX, date.compact()))
    }

    /// Page files for `date` currently in `download/`, in page order
    pub fn existing_pages(&self, date: DateKey) -> Result<Vec<PathBuf>> {
        let prefix = format!("{}{}", FILE_PREFIX, date.compact());
        let mut pages = Vec::new();

        for entry in fs::read_dir(self.download_dir())? {
            let path = entry?.path();
            let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
                continue;
            };
            let Some(page) = name
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".pdf"))
            else {
                continue;
            };
            if page.len() == 2 && page.bytes().all(|b| b.is_ascii_digit()) {
                pages.push(path);
            }
        }

        pages.sort();
        Ok(pages)
    }

    /// Create `download/` and `merged/` if absent
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(self.download_dir())?;
        fs::create_dir_all(self.merged_dir())?;
        Ok(())
    }
}

/// Append-only record of the URLs resolved for each date
#[derive(Debug, Clone)]
pub struct DownloadLog {
    path: PathBuf,
}

impl DownloadLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DownloadLog { path: path.into() }
    }

    pub fn append(&self, date: DateKey, urls: &[String]) -> Result<()> {
        let mut block = format!("{}:\n", date.canonical());
        for url in urls {
            block.push_str(url);
            block.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(block.as_bytes())?;
        Ok(())
    }
}
