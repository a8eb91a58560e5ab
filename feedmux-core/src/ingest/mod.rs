//! Ingestion layer: the record normalizer
//!
//! Connectors deliver heterogeneous per-platform payloads. This module turns
//! them into [`ChatRecord`]s, the single tagged-variant record type the
//! [`Feed`](crate::feed::Feed) accepts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌──────────────────┐     ┌─────────────────┐
//! │ Platform payload│ ──► │    Normalizer    │ ──► │   ChatRecord    │
//! │ {"source": ...} │     │                  │     │  (unsequenced)  │
//! └─────────────────┘     └──────────────────┘     └─────────────────┘
//!                               │
//!                               ▼
//!                    ┌──────────────────────┐
//!                    │  SourceParser        │
//!                    │  ├─ PrimaryParser    │
//!                    │  ├─ PlatformAParser  │
//!                    │  └─ ...              │
//!                    └──────────────────────┘
//! ```
//!
//! Malformed payloads never reach the feed. They are logged, reported in
//! [`NormalizeResult::warnings`], and otherwise ignored.

mod parser;
pub mod parsers;

pub use parser::{ParseContext, SourceParser};

use crate::error::{Error, Result};
use crate::types::{ChatRecord, Source};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

/// Outcome of normalizing a batch of payloads.
#[derive(Debug, Default)]
pub struct NormalizeResult {
    /// Records in input order
    pub records: Vec<ChatRecord>,
    /// Number of payloads dropped because their author is ignored
    pub ignored: usize,
    /// One entry per malformed payload (non-fatal)
    pub warnings: Vec<String>,
}

/// Dispatches payloads to the parser for their `source` tag.
pub struct Normalizer {
    parsers: Vec<Box<dyn SourceParser>>,
    ignored_authors: HashSet<String>,
}

impl Normalizer {
    /// Create a normalizer with the default parsers.
    pub fn new() -> Self {
        Self::with_parsers(parsers::create_all_parsers())
    }

    /// Create a normalizer with custom parsers.
    pub fn with_parsers(parsers: Vec<Box<dyn SourceParser>>) -> Self {
        Self {
            parsers,
            ignored_authors: HashSet::new(),
        }
    }

    /// Drop records from these authors (case-insensitive).
    pub fn with_ignored_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignored_authors = authors
            .into_iter()
            .map(|a| a.as_ref().trim().to_lowercase())
            .filter(|a| !a.is_empty())
            .collect();
        self
    }

    pub fn is_ignored(&self, author: &str) -> bool {
        !author.is_empty() && self.ignored_authors.contains(&author.to_lowercase())
    }

    /// Normalize one payload received now.
    pub fn normalize(&self, payload: &serde_json::Value) -> Result<Option<ChatRecord>> {
        self.normalize_at(payload, Utc::now())
    }

    /// Normalize one payload received at `received_at`.
    ///
    /// Returns `Ok(None)` when the author is ignored and `Err` when the
    /// payload is malformed.
    pub fn normalize_at(
        &self,
        payload: &serde_json::Value,
        received_at: DateTime<Utc>,
    ) -> Result<Option<ChatRecord>> {
        let source = Self::source_of(payload)?;
        let parser = self
            .parsers
            .iter()
            .find(|p| p.source() == source)
            .ok_or_else(|| Error::UnknownSource(source.to_string()))?;

        let record = parser.parse(payload, &ParseContext::new(received_at))?;
        if self.is_ignored(record.kind.author_name()) {
            tracing::debug!(
                source = %source,
                author = record.kind.author_name(),
                "Dropping record from ignored author"
            );
            return Ok(None);
        }
        Ok(Some(record))
    }

    /// Normalize a batch, keeping input order and collecting warnings.
    pub fn normalize_batch(
        &self,
        payloads: &[serde_json::Value],
        received_at: DateTime<Utc>,
    ) -> NormalizeResult {
        let mut result = NormalizeResult::default();

        for (index, payload) in payloads.iter().enumerate() {
            match self.normalize_at(payload, received_at) {
                Ok(Some(record)) => result.records.push(record),
                Ok(None) => result.ignored += 1,
                Err(e) => {
                    tracing::warn!(index, error = %e, "Dropping malformed payload");
                    result.warnings.push(format!("payload {}: {}", index, e));
                }
            }
        }

        result
    }

    fn source_of(payload: &serde_json::Value) -> Result<Source> {
        let tag = payload
            .get("source")
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::parse("unknown", "missing source tag"))?;
        tag.parse::<Source>()
            .map_err(|_| Error::UnknownSource(tag.to_string()))
    }
}

impl std::fmt::Debug for Normalizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sources: Vec<Source> = self.parsers.iter().map(|p| p.source()).collect();
        f.debug_struct("Normalizer")
            .field("sources", &sources)
            .field("ignored_authors", &self.ignored_authors)
            .finish()
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}
