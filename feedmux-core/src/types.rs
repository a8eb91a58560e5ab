//! Core domain types for feedmux
//!
//! These types represent the canonical record model that normalizes chat
//! activity from every connected platform into a single feed.
//!
//! ## Terminology
//!
//! | Term | Definition |
//! |------|------------|
//! | **Source** | Which connector produced a record (primary chat, a third-party platform, or a notice) |
//! | **Source key** | The channel, room or video within a source |
//! | **ChatRecord** | A normalized record that has not been sequenced yet |
//! | **NormalizedRecord** | A record owned by the [`Feed`](crate::feed::Feed), stamped with its arrival sequence |
//! | **History replay** | A record delivered as part of a reconnect backfill rather than live |
//!
//! Only the feed hands out arrival sequences, so a [`NormalizedRecord`] can
//! not be built outside this crate. That keeps sequence numbers unique.

use serde::{Deserialize, Serialize};

// ============================================
// Sources
// ============================================

/// Discriminant of the seven record variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    /// The community chat the viewer is built around
    Primary,
    /// Third-party chat, platform A (IRC-style channel chat)
    PlatformA,
    /// Third-party chat, platform B (video live chat)
    PlatformB,
    /// Third-party chat, platform C (chatroom chat)
    PlatformC,
    /// Platform events (subscriptions, donations, raids)
    Event,
    /// Locally generated notices
    System,
    /// Broadcasts pushed by the primary chat
    Broadcast,
}

impl Source {
    /// Every source, in display order.
    pub const ALL: [Source; 7] = [
        Source::Primary,
        Source::PlatformA,
        Source::PlatformB,
        Source::PlatformC,
        Source::Event,
        Source::System,
        Source::Broadcast,
    ];

    /// Returns the identifier used on the wire and in config
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Primary => "primary",
            Source::PlatformA => "platform_a",
            Source::PlatformB => "platform_b",
            Source::PlatformC => "platform_c",
            Source::Event => "event",
            Source::System => "system",
            Source::Broadcast => "broadcast",
        }
    }

    /// Short label for compact feed rendering
    pub fn label(&self) -> &'static str {
        match self {
            Source::Primary => "chat",
            Source::PlatformA => "A",
            Source::PlatformB => "B",
            Source::PlatformC => "C",
            Source::Event => "event",
            Source::System => "system",
            Source::Broadcast => "broadcast",
        }
    }

    /// Whether a history replace for `self` also supersedes records of `other`.
    ///
    /// The primary chat's backfill carries its broadcasts, so both are
    /// replaced together.
    pub fn history_covers(&self, other: Source) -> bool {
        *self == other || (*self == Source::Primary && other == Source::Broadcast)
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Source {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "primary" => Ok(Source::Primary),
            "platform_a" => Ok(Source::PlatformA),
            "platform_b" => Ok(Source::PlatformB),
            "platform_c" => Ok(Source::PlatformC),
            "event" => Ok(Source::Event),
            "system" => Ok(Source::System),
            "broadcast" => Ok(Source::Broadcast),
            _ => Err(format!("unknown source: {}", s)),
        }
    }
}

// ============================================
// Record payloads
// ============================================

/// A line of chat written by someone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatLine {
    /// Display identity of the author
    pub author: String,
    /// Platform-decoded message text
    pub body: String,
    /// Channel, room or video within the source (empty for the primary room)
    pub source_key: String,
}

impl ChatLine {
    pub fn new(
        author: impl Into<String>,
        body: impl Into<String>,
        source_key: impl Into<String>,
    ) -> Self {
        Self {
            author: author.into(),
            body: body.into(),
            source_key: source_key.into(),
        }
    }
}

/// A platform event such as a subscription or donation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventNotice {
    /// Event kind as reported by the platform ("subscription", "donation", ...)
    pub kind: String,
    /// Who triggered the event
    pub author: String,
    /// Attached message, possibly empty
    pub body: String,
    /// Channel the event belongs to
    pub source_key: String,
}

/// Closed tagged union over the seven record variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum RecordKind {
    Primary(ChatLine),
    PlatformA(ChatLine),
    PlatformB(ChatLine),
    PlatformC(ChatLine),
    Event(EventNotice),
    System { text: String },
    Broadcast { text: String },
}

impl RecordKind {
    pub fn source(&self) -> Source {
        match self {
            RecordKind::Primary(_) => Source::Primary,
            RecordKind::PlatformA(_) => Source::PlatformA,
            RecordKind::PlatformB(_) => Source::PlatformB,
            RecordKind::PlatformC(_) => Source::PlatformC,
            RecordKind::Event(_) => Source::Event,
            RecordKind::System { .. } => Source::System,
            RecordKind::Broadcast { .. } => Source::Broadcast,
        }
    }

    /// Display identity; empty for system and broadcast records.
    pub fn author_name(&self) -> &str {
        match self {
            RecordKind::Primary(line)
            | RecordKind::PlatformA(line)
            | RecordKind::PlatformB(line)
            | RecordKind::PlatformC(line) => &line.author,
            RecordKind::Event(event) => &event.author,
            RecordKind::System { .. } | RecordKind::Broadcast { .. } => "",
        }
    }

    pub fn body(&self) -> &str {
        match self {
            RecordKind::Primary(line)
            | RecordKind::PlatformA(line)
            | RecordKind::PlatformB(line)
            | RecordKind::PlatformC(line) => &line.body,
            RecordKind::Event(event) => &event.body,
            RecordKind::System { text } | RecordKind::Broadcast { text } => text,
        }
    }

    pub fn source_key(&self) -> &str {
        match self {
            RecordKind::Primary(line)
            | RecordKind::PlatformA(line)
            | RecordKind::PlatformB(line)
            | RecordKind::PlatformC(line) => &line.source_key,
            RecordKind::Event(event) => &event.source_key,
            RecordKind::System { .. } | RecordKind::Broadcast { .. } => "",
        }
    }
}

// ============================================
// Records
// ============================================

/// A normalized record that has not entered the feed yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRecord {
    /// Producer timestamp, or receipt time when the producer sent none
    pub timestamp_ms: i64,
    pub kind: RecordKind,
}

impl ChatRecord {
    pub fn new(timestamp_ms: i64, kind: RecordKind) -> Self {
        Self { timestamp_ms, kind }
    }

    pub fn source(&self) -> Source {
        self.kind.source()
    }
}

/// Arrival order stamp handed out by the feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ArrivalSeq(pub(crate) u64);

impl ArrivalSeq {
    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ArrivalSeq {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A record as stored in the feed.
///
/// Fields are read-only; the arrival sequence and history flag are fixed at
/// ingest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedRecord {
    arrival_seq: ArrivalSeq,
    timestamp_ms: i64,
    is_history_replay: bool,
    kind: RecordKind,
}

impl NormalizedRecord {
    pub(crate) fn stamp(record: ChatRecord, arrival_seq: ArrivalSeq, is_history_replay: bool) -> Self {
        Self {
            arrival_seq,
            timestamp_ms: record.timestamp_ms,
            is_history_replay,
            kind: record.kind,
        }
    }

    pub fn arrival_seq(&self) -> ArrivalSeq {
        self.arrival_seq
    }

    pub fn timestamp_ms(&self) -> i64 {
        self.timestamp_ms
    }

    pub fn is_history_replay(&self) -> bool {
        self.is_history_replay
    }

    pub fn kind(&self) -> &RecordKind {
        &self.kind
    }

    pub fn source(&self) -> Source {
        self.kind.source()
    }

    pub fn author_name(&self) -> &str {
        self.kind.author_name()
    }

    pub fn body(&self) -> &str {
        self.kind.body()
    }

    pub fn source_key(&self) -> &str {
        self.kind.source_key()
    }

    /// Sort key for timestamp ordering; arrival breaks ties between skewed clocks.
    pub fn timeline_key(&self) -> (i64, ArrivalSeq) {
        (self.timestamp_ms, self.arrival_seq)
    }
}

// ============================================
// Display
// ============================================

/// How the feed orders records for display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    /// History sorted by time first, then live records in arrival order
    #[default]
    ByArrival,
    /// Everything sorted by time
    ByTimestamp,
}

impl DisplayMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DisplayMode::ByArrival => "by_arrival",
            DisplayMode::ByTimestamp => "by_timestamp",
        }
    }
}

impl std::str::FromStr for DisplayMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "by_arrival" | "by-arrival" | "arrival" => Ok(DisplayMode::ByArrival),
            "by_timestamp" | "by-timestamp" | "timestamp" => Ok(DisplayMode::ByTimestamp),
            _ => Err(format!("unknown display mode: {}", s)),
        }
    }
}
