//! Platform A (IRC-style channel chat) parser
//!
//! Payloads carry IRC tag values: `display_name` (falling back to `login`),
//! `message`, `tmi_sent_ts` as a decimal string of epoch milliseconds, and
//! the `channel` the line was sent to.

use crate::error::Result;
use crate::ingest::parser::{decode, epoch_millis, required, ParseContext, SourceParser};
use crate::types::{ChatLine, ChatRecord, RecordKind, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawChannelMessage {
    display_name: Option<String>,
    login: Option<String>,
    message: Option<String>,
    tmi_sent_ts: Option<String>,
    channel: Option<String>,
}

/// Parser for platform A channel messages.
#[derive(Debug, Default)]
pub struct PlatformAParser;

impl PlatformAParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for PlatformAParser {
    fn source(&self) -> Source {
        Source::PlatformA
    }

    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord> {
        let raw: RawChannelMessage = decode(Source::PlatformA, payload)?;

        let author = raw
            .display_name
            .filter(|name| !name.trim().is_empty())
            .or(raw.login);
        let author = required(Source::PlatformA, "display_name", author)?;
        let body = required(Source::PlatformA, "message", raw.message)?;

        let sent_ms = raw.tmi_sent_ts.as_deref().and_then(|ts| {
            let parsed = ts.trim().parse::<i64>().ok();
            if parsed.is_none() {
                tracing::debug!(raw = ts, "Unreadable tmi_sent_ts, using receipt time");
            }
            parsed
        });
        let timestamp_ms = epoch_millis(Source::PlatformA, sent_ms, ctx)?;

        // Channels arrive as "#name" or "name"; key on the bare lowercase name.
        let channel = raw
            .channel
            .unwrap_or_default()
            .trim_start_matches('#')
            .to_lowercase();

        Ok(ChatRecord::new(
            timestamp_ms,
            RecordKind::PlatformA(ChatLine::new(author, body, channel)),
        ))
    }
}
