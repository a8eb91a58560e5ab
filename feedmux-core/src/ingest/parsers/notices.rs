//! Event and system notice parsers

use crate::error::Result;
use crate::ingest::parser::{decode, json_epoch_millis, required, ParseContext, SourceParser};
use crate::types::{ChatRecord, EventNotice, RecordKind, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawEvent {
    kind: Option<String>,
    nick: Option<String>,
    text: Option<String>,
    timestamp: Option<serde_json::Value>,
    channel: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawSystemNotice {
    text: Option<String>,
    timestamp: Option<serde_json::Value>,
}

/// Parser for platform events (subscriptions, donations, raids).
///
/// An event needs a kind and an author; the attached message is optional.
#[derive(Debug, Default)]
pub struct EventParser;

impl EventParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for EventParser {
    fn source(&self) -> Source {
        Source::Event
    }

    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord> {
        let raw: RawEvent = decode(Source::Event, payload)?;
        let kind = required(Source::Event, "kind", raw.kind)?;
        let author = required(Source::Event, "nick", raw.nick)?;
        let timestamp_ms = json_epoch_millis(Source::Event, raw.timestamp.as_ref(), ctx)?;

        Ok(ChatRecord::new(
            timestamp_ms,
            RecordKind::Event(EventNotice {
                kind,
                author,
                body: raw.text.unwrap_or_default(),
                source_key: raw.channel.unwrap_or_default(),
            }),
        ))
    }
}

/// Parser for locally generated system notices.
#[derive(Debug, Default)]
pub struct SystemParser;

impl SystemParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for SystemParser {
    fn source(&self) -> Source {
        Source::System
    }

    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord> {
        let raw: RawSystemNotice = decode(Source::System, payload)?;
        let text = required(Source::System, "text", raw.text)?;
        let timestamp_ms = json_epoch_millis(Source::System, raw.timestamp.as_ref(), ctx)?;

        Ok(ChatRecord::new(timestamp_ms, RecordKind::System { text }))
    }
}
