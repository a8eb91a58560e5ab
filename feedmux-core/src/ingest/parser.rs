//! Parser trait abstraction
//!
//! Every connector hands over its payloads as JSON objects tagged with a
//! `source` field. Each source has a parser implementing [`SourceParser`]
//! that turns its platform-specific shape into a [`ChatRecord`].
//!
//! ## Design Principles
//!
//! 1. **Resilience**: a malformed payload is an `Err` for that payload only;
//!    the [`Normalizer`](super::Normalizer) turns it into a warning and moves on
//! 2. **Timestamp fallback**: a missing or unreadable producer timestamp
//!    becomes the receipt time
//! 3. **Extensible**: a new platform only requires implementing this trait

use crate::error::{Error, Result};
use crate::types::{ChatRecord, Source};
use chrono::{DateTime, Utc};

/// Context passed to a parser with receipt metadata.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext {
    /// When the payload reached this process
    pub received_at: DateTime<Utc>,
}

impl ParseContext {
    pub fn new(received_at: DateTime<Utc>) -> Self {
        Self { received_at }
    }

    /// Receipt time in epoch milliseconds
    pub fn received_ms(&self) -> i64 {
        self.received_at.timestamp_millis()
    }
}

/// Trait implemented by all source parsers.
///
/// ## Example
///
/// ```rust,ignore
/// use feedmux_core::ingest::{ParseContext, SourceParser};
///
/// struct MyParser;
///
/// impl SourceParser for MyParser {
///     fn source(&self) -> Source { Source::PlatformA }
///     // ... implement parse
/// }
/// ```
pub trait SourceParser: Send + Sync {
    /// Which source this parser handles
    fn source(&self) -> Source;

    /// Parse one payload.
    ///
    /// Missing required fields (author or body for chat lines) and
    /// out-of-range timestamps are errors; the caller drops the payload.
    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord>;
}

/// Deserialize a payload into its raw shape, mapping failures to a parse error.
pub(crate) fn decode<T>(source: Source, payload: &serde_json::Value) -> Result<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(payload.clone()).map_err(|e| Error::parse(source.as_str(), e.to_string()))
}

/// Returns the trimmed-non-empty value of a required text field.
pub(crate) fn required(source: Source, field: &str, value: Option<String>) -> Result<String> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(Error::parse(source.as_str(), format!("missing {}", field))),
    }
}

/// Resolve a producer timestamp in epoch milliseconds.
pub(crate) fn epoch_millis(source: Source, value: Option<i64>, ctx: &ParseContext) -> Result<i64> {
    match value {
        Some(ms) if ms < 0 => Err(Error::parse(
            source.as_str(),
            format!("timestamp out of range: {}", ms),
        )),
        Some(ms) => Ok(ms),
        None => Ok(ctx.received_ms()),
    }
}

/// Resolve an epoch-millisecond timestamp of any JSON type.
///
/// Integers and integral floats are taken as-is. Anything else (strings,
/// fractions, booleans, objects) is unreadable and becomes the receipt time.
pub(crate) fn json_epoch_millis(
    source: Source,
    value: Option<&serde_json::Value>,
    ctx: &ParseContext,
) -> Result<i64> {
    let Some(raw) = value.filter(|v| !v.is_null()) else {
        return Ok(ctx.received_ms());
    };
    let ms = raw.as_i64().or_else(|| {
        raw.as_f64()
            .filter(|f| f.is_finite() && f.fract() == 0.0 && f.abs() < i64::MAX as f64)
            .map(|f| f as i64)
    });
    if ms.is_none() {
        tracing::debug!(source = %source, raw = %raw, "Unreadable timestamp, using receipt time");
    }
    epoch_millis(source, ms, ctx)
}

/// RFC 3339 timestamp of any JSON type; non-strings fall back to receipt time.
pub(crate) fn json_rfc3339_millis(
    source: Source,
    value: Option<&serde_json::Value>,
    ctx: &ParseContext,
) -> Result<i64> {
    match value {
        None | Some(serde_json::Value::Null) => Ok(ctx.received_ms()),
        Some(serde_json::Value::String(raw)) => rfc3339_millis(source, Some(raw), ctx),
        Some(other) => {
            tracing::debug!(source = %source, raw = %other, "Unreadable timestamp, using receipt time");
            Ok(ctx.received_ms())
        }
    }
}

/// Resolve an RFC 3339 producer timestamp, falling back to receipt time when
/// absent or unreadable.
pub(crate) fn rfc3339_millis(
    source: Source,
    value: Option<&str>,
    ctx: &ParseContext,
) -> Result<i64> {
    let Some(raw) = value else {
        return Ok(ctx.received_ms());
    };
    match DateTime::parse_from_rfc3339(raw) {
        Ok(ts) => epoch_millis(source, Some(ts.timestamp_millis()), ctx),
        Err(e) => {
            tracing::debug!(source = %source, raw, error = %e, "Unreadable timestamp, using receipt time");
            Ok(ctx.received_ms())
        }
    }
}
