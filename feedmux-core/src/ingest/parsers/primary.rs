//! Primary community chat parser
//!
//! The primary chat delivers messages as `{"nick", "data", "timestamp"}`
//! objects with epoch-millisecond timestamps. Broadcasts come over the same
//! connection as `{"data", "timestamp"}` and are parsed by [`BroadcastParser`].

use crate::error::Result;
use crate::ingest::parser::{decode, json_epoch_millis, required, ParseContext, SourceParser};
use crate::types::{ChatLine, ChatRecord, RecordKind, Source};
use serde::Deserialize;

/// Raw primary chat message.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawPrimaryMessage {
    nick: Option<String>,
    data: Option<String>,
    timestamp: Option<serde_json::Value>,
    room: Option<String>,
}

/// Raw primary chat broadcast.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawBroadcast {
    data: Option<String>,
    timestamp: Option<serde_json::Value>,
}

/// Parser for primary chat messages.
#[derive(Debug, Default)]
pub struct PrimaryParser;

impl PrimaryParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for PrimaryParser {
    fn source(&self) -> Source {
        Source::Primary
    }

    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord> {
        let raw: RawPrimaryMessage = decode(Source::Primary, payload)?;
        let author = required(Source::Primary, "nick", raw.nick)?;
        let body = required(Source::Primary, "data", raw.data)?;
        let timestamp_ms = json_epoch_millis(Source::Primary, raw.timestamp.as_ref(), ctx)?;

        Ok(ChatRecord::new(
            timestamp_ms,
            RecordKind::Primary(ChatLine::new(author, body, raw.room.unwrap_or_default())),
        ))
    }
}

/// Parser for broadcasts pushed by the primary chat.
#[derive(Debug, Default)]
pub struct BroadcastParser;

impl BroadcastParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for BroadcastParser {
    fn source(&self) -> Source {
        Source::Broadcast
    }

    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord> {
        let raw: RawBroadcast = decode(Source::Broadcast, payload)?;
        let text = required(Source::Broadcast, "data", raw.data)?;
        let timestamp_ms = json_epoch_millis(Source::Broadcast, raw.timestamp.as_ref(), ctx)?;

        Ok(ChatRecord::new(timestamp_ms, RecordKind::Broadcast { text }))
    }
}
