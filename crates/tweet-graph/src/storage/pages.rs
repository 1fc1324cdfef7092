//! Raw page archive: one JSON document per fetched page.

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::twitter::RawPage;

/// Writes fetched pages into a directory for later replay.
#[derive(Debug, Clone)]
pub struct PageArchive {
    dir: PathBuf,
    prefix: String,
}

impl PageArchive {
    /// Archive into `dir`, naming files `{prefix}_{index}_{cursor}.json`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File name for the page fetched with `cursor` at position `index`.
    ///
    /// The first page (no cursor) gets `00` in place of the cursor.
    #[must_use]
    pub fn file_name(&self, index: usize, cursor: Option<&str>) -> String {
        let cursor: String = cursor
            .unwrap_or("00")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        format!("{}_{index:06}_{cursor}.json", self.prefix)
    }

    /// Index after the highest one already archived under this prefix.
    ///
    /// A resumed run continues numbering here so its pages sort after the
    /// earlier run's. A missing directory starts at 0.
    pub fn next_index(&self) -> Result<usize> {
        if !self.dir.is_dir() {
            return Ok(0);
        }
        let prefix = format!("{}_", self.prefix);
        let next = list_pages(&self.dir)?
            .iter()
            .filter_map(|path| {
                let name = path.file_name()?.to_str()?;
                name.strip_prefix(&prefix)?
                    .split('_')
                    .next()?
                    .parse::<usize>()
                    .ok()
            })
            .max()
            .map_or(0, |last| last + 1);
        Ok(next)
    }

    /// Write one page as pretty-printed JSON.
    pub fn write(&self, index: usize, cursor: Option<&str>, page: &RawPage) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir).map_err(|e| Error::io(&self.dir, e))?;
        let path = self.dir.join(self.file_name(index, cursor));
        let content = serde_json::to_string_pretty(page)?;
        std::fs::write(&path, content).map_err(|e| Error::io(&path, e))?;
        tracing::debug!(path = %path.display(), "Archived response page");
        Ok(path)
    }
}

/// Regular, non-hidden files directly inside `dir`, sorted by file name.
pub fn list_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| Error::io(dir, e.into()))?;
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type().is_file() && !hidden {
            paths.push(entry.into_path());
        }
    }
    Ok(paths)
}

/// Read and decode one archived page.
pub fn read_page(path: &Path) -> Result<RawPage> {
    let content = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    Ok(serde_json::from_str(&content)?)
}
