//! Suffix-match blocklist.
//!
//! An entry `X` blocks `X` and every name ending in `.X`. See
//! `blocklist::Blocklist::has` for the suffix walk.

use compact_str::CompactString;
use rustc_hash::FxHashSet;
use std::io::BufRead;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlocklistParseError {
    #[error("failed to read blocklist stream: {0}")]
    Io(#[from] std::io::Error),
}

/// An unordered set of lower-case, dot-separated domain labels. Immutable
/// once constructed; the handler swaps in a whole new snapshot on reload.
#[derive(Debug, Clone, Default)]
pub struct Blocklist {
    entries: FxHashSet<CompactString>,
}

impl Blocklist {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parse a UTF-8 text stream line by line. `#`-prefixed lines and lines
    /// that are empty or all-whitespace are ignored; every other line
    /// contributes its (lower-cased) content as one entry.
    pub fn parse<R: BufRead>(reader: R) -> Result<Self, BlocklistParseError> {
        let mut entries = FxHashSet::default();

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            entries.insert(CompactString::new(trimmed.to_lowercase()));
        }

        Ok(Self { entries })
    }

    /// Suffix-match lookup: split `name` into DNS labels (dropping a trailing
    /// empty root label, e.g. from `ads.com.`), then for every suffix
    /// `labels[i..]` test set membership, returning true on the first hit.
    pub fn has(&self, name: &str) -> bool {
        let lower = name.to_lowercase();
        let trimmed = lower.strip_suffix('.').unwrap_or(&lower);
        if trimmed.is_empty() {
            return false;
        }

        let labels: Vec<&str> = trimmed.split('.').collect();

        for i in 0..labels.len() {
            let suffix = labels[i..].join(".");
            if self.entries.contains(suffix.as_str()) {
                return true;
            }
        }

        false
    }
}
