//! Platform B (video live chat) parser
//!
//! Live chat items nest the author (`author.name`), carry the rendered
//! `text`, an RFC 3339 `published_at`, and the `video_id` of the stream.

use crate::error::Result;
use crate::ingest::parser::{decode, json_rfc3339_millis, required, ParseContext, SourceParser};
use crate::types::{ChatLine, ChatRecord, RecordKind, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawLiveChatItem {
    author: RawAuthor,
    text: Option<String>,
    published_at: Option<serde_json::Value>,
    video_id: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawAuthor {
    name: Option<String>,
}

/// Parser for platform B live chat items.
#[derive(Debug, Default)]
pub struct PlatformBParser;

impl PlatformBParser {
    pub fn new() -> Self {
        Self
    }
}

impl SourceParser for PlatformBParser {
    fn source(&self) -> Source {
        Source::PlatformB
    }

    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord> {
        let raw: RawLiveChatItem = decode(Source::PlatformB, payload)?;
        let author = required(Source::PlatformB, "author.name", raw.author.name)?;
        let body = required(Source::PlatformB, "text", raw.text)?;
        let timestamp_ms = json_rfc3339_millis(Source::PlatformB, raw.published_at.as_ref(), ctx)?;

        Ok(ChatRecord::new(
            timestamp_ms,
            RecordKind::PlatformB(ChatLine::new(author, body, raw.video_id.unwrap_or_default())),
        ))
    }
}
