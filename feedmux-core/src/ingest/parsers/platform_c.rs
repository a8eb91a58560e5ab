//! Platform C (chatroom chat) parser
//!
//! Chatroom events carry `sender.username`, `content`, an RFC 3339
//! `created_at`, and a numeric or string `chatroom_id`.

use crate::error::Result;
use crate::ingest::parser::{decode, json_rfc3339_millis, required, ParseContext, SourceParser};
use crate::types::{ChatLine, ChatRecord, RecordKind, Source};
use serde::Deserialize;

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawChatroomMessage {
    sender: RawSender,
    content: Option<String>,
    created_at: Option<serde_json::Value>,
    chatroom_id: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct RawSender {
    username: Option<String>,
}

/// Parser for platform C chatroom messages.
#[derive(Debug, Default)]
pub struct PlatformCParser;

impl PlatformCParser {
    pub fn new() -> Self {
        Self
    }

    fn chatroom_key(id: Option<serde_json::Value>) -> String {
        match id {
            Some(serde_json::Value::String(s)) => s,
            Some(serde_json::Value::Number(n)) => n.to_string(),
            _ => String::new(),
        }
    }
}

impl SourceParser for PlatformCParser {
    fn source(&self) -> Source {
        Source::PlatformC
    }

    fn parse(&self, payload: &serde_json::Value, ctx: &ParseContext) -> Result<ChatRecord> {
        let raw: RawChatroomMessage = decode(Source::PlatformC, payload)?;
        let author = required(Source::PlatformC, "sender.username", raw.sender.username)?;
        let body = required(Source::PlatformC, "content", raw.content)?;
        let timestamp_ms = json_rfc3339_millis(Source::PlatformC, raw.created_at.as_ref(), ctx)?;

        Ok(ChatRecord::new(
            timestamp_ms,
            RecordKind::PlatformC(ChatLine::new(
                author,
                body,
                Self::chatroom_key(raw.chatroom_id),
            )),
        ))
    }
}
