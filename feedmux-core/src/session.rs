//! Single-owner chat session
//!
//! [`Session`] is the one place feed state changes. Connection tasks,
//! directory lookups and whisper sends never touch the feed directly; they
//! hand their results over as [`InboundEvent`]s and the owner applies them
//! one at a time, in the order they arrive.

use crate::annotate::{Annotated, Annotator};
use crate::autocomplete::{Completer, Direction, SuggestionState};
use crate::combo::{collapse_combos, single_emote, FeedEntry};
use crate::config::Config;
use crate::error::Result;
use crate::feed::Feed;
use crate::ingest::Normalizer;
use crate::pending::Debounced;
use crate::types::{ChatRecord, DisplayMode, NormalizedRecord, RecordKind, Source};
use crate::whispers::WhisperTracker;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashSet;
use std::time::Instant;

/// Everything that can change a session, in wire form.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InboundEvent {
    /// One live record
    Message { payload: serde_json::Value },
    /// Backfill for one source
    History {
        source: Source,
        #[serde(default)]
        records: Vec<serde_json::Value>,
    },
    /// A source reconnected; its next history applies again
    Reconnect { source: Source },
    /// Emote name lookup finished
    EmoteDirectory { names: Vec<String> },
    /// Nick list lookup finished
    NickDirectory { names: Vec<String> },
    Join { nick: String },
    Quit { nick: String },
    /// Incoming private message
    Whisper { from: String, body: String },
    /// Outgoing private message finished
    WhisperSent {
        to: String,
        #[serde(default)]
        error: Option<String>,
    },
    /// Reader scrolled; `at_bottom` is false while reading older lines
    Scroll { at_bottom: bool },
}

/// What applying one event did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied {
    /// Records added to the feed
    Appended(usize),
    /// Author is on the ignore list
    Ignored,
    /// History accepted; records added and payloads dropped as malformed
    HistoryReplaced { added: usize, dropped: usize },
    /// History arrived for a source whose slot is already spent
    HistorySkipped,
    /// Directory, whisper or scroll state changed
    Updated,
}

/// Text being composed plus its cursor (byte offset).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Input {
    pub text: String,
    pub cursor: usize,
}

/// Owner of one merged chat view.
#[derive(Debug)]
pub struct Session {
    normalizer: Normalizer,
    feed: Feed,
    display_mode: DisplayMode,
    emotes: HashSet<String>,
    nicks: HashSet<String>,
    annotator: Annotator,
    completer: Completer,
    refresh: Debounced<()>,
    input: Input,
    whispers: WhisperTracker,
    /// Sources whose history already applied this connection lifecycle
    history_applied: HashSet<Source>,
}

impl Session {
    pub fn new(config: &Config) -> Self {
        Self {
            normalizer: Normalizer::new()
                .with_ignored_authors(config.ingest.ignored_authors.iter()),
            feed: Feed::new(config.feed.soft_cap, config.feed.hard_cap),
            display_mode: config.feed.display_mode,
            emotes: HashSet::new(),
            nicks: HashSet::new(),
            annotator: Annotator::default(),
            completer: Completer::new(config.autocomplete.suggester()),
            refresh: Debounced::new(config.autocomplete.debounce()),
            input: Input::default(),
            whispers: WhisperTracker::new(),
            history_applied: HashSet::new(),
        }
    }

    pub fn feed(&self) -> &Feed {
        &self.feed
    }

    pub fn whispers(&self) -> &WhisperTracker {
        &self.whispers
    }

    pub fn whispers_mut(&mut self) -> &mut WhisperTracker {
        &mut self.whispers
    }

    pub fn emotes(&self) -> &HashSet<String> {
        &self.emotes
    }

    pub fn nicks(&self) -> &HashSet<String> {
        &self.nicks
    }

    pub fn display_mode(&self) -> DisplayMode {
        self.display_mode
    }

    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.display_mode = mode;
    }

    /// Apply one event received now.
    pub fn handle(&mut self, event: InboundEvent) -> Result<Applied> {
        self.handle_at(event, Utc::now())
    }

    /// Apply one event received at `received_at`.
    ///
    /// A malformed live payload is an error and leaves the session untouched.
    pub fn handle_at(
        &mut self,
        event: InboundEvent,
        received_at: DateTime<Utc>,
    ) -> Result<Applied> {
        match event {
            InboundEvent::Message { payload } => {
                match self.normalizer.normalize_at(&payload, received_at)? {
                    Some(record) => {
                        self.learn_author(&record);
                        Ok(Applied::Appended(self.feed.append([record])))
                    }
                    None => Ok(Applied::Ignored),
                }
            }
            InboundEvent::History { source, records } => {
                Ok(self.apply_history(source, &records, received_at))
            }
            InboundEvent::Reconnect { source } => {
                if self.history_applied.remove(&source) {
                    tracing::debug!(source = %source, "History re-armed after reconnect");
                }
                Ok(Applied::Updated)
            }
            InboundEvent::EmoteDirectory { names } => {
                self.emotes = names.into_iter().filter(|n| !n.is_empty()).collect();
                tracing::info!(count = self.emotes.len(), "Emote directory loaded");
                self.annotator.set_emotes(&self.emotes);
                Ok(Applied::Updated)
            }
            InboundEvent::NickDirectory { names } => {
                for name in names {
                    self.add_nick(name);
                }
                Ok(Applied::Updated)
            }
            InboundEvent::Join { nick } => {
                self.add_nick(nick);
                Ok(Applied::Updated)
            }
            InboundEvent::Quit { nick } => {
                if self.nicks.remove(&nick) {
                    let folded = nick.to_lowercase();
                    // Another casing of the same name stays mentionable.
                    if !self.nicks.iter().any(|n| n.to_lowercase() == folded) {
                        self.annotator.remove_nick(&nick);
                    }
                }
                Ok(Applied::Updated)
            }
            InboundEvent::Whisper { from, body } => {
                let unread = self.whispers.record(&from);
                tracing::debug!(from = %from, unread, len = body.len(), "Whisper received");
                Ok(Applied::Updated)
            }
            InboundEvent::WhisperSent { to, error } => {
                self.whispers.send_completed(&to, error);
                Ok(Applied::Updated)
            }
            InboundEvent::Scroll { at_bottom } => {
                self.feed.set_at_bottom(at_bottom);
                Ok(Applied::Updated)
            }
        }
    }

    fn apply_history(
        &mut self,
        source: Source,
        payloads: &[serde_json::Value],
        received_at: DateTime<Utc>,
    ) -> Applied {
        if self.history_applied.contains(&source) {
            tracing::warn!(source = %source, "History already applied for this connection, ignoring");
            return Applied::HistorySkipped;
        }
        self.history_applied.insert(source);

        let result = self.normalizer.normalize_batch(payloads, received_at);
        let (records, foreign): (Vec<ChatRecord>, Vec<ChatRecord>) = result
            .records
            .into_iter()
            .partition(|record| source.history_covers(record.source()));
        if !foreign.is_empty() {
            tracing::warn!(
                source = %source,
                count = foreign.len(),
                "Dropping history records from other sources"
            );
        }
        for record in &records {
            self.learn_author(record);
        }
        let dropped = result.warnings.len() + foreign.len();
        let added = self.feed.replace_history(source, records);
        Applied::HistoryReplaced { added, dropped }
    }

    /// Primary-source authors become mentionable nicks.
    fn learn_author(&mut self, record: &ChatRecord) {
        if let RecordKind::Primary(line) = &record.kind {
            self.add_nick(line.author.clone());
        }
    }

    fn add_nick(&mut self, nick: String) {
        if nick.is_empty() {
            return;
        }
        self.annotator.add_nick(&nick);
        self.nicks.insert(nick);
    }

    /// Display sequence with emote runs collapsed.
    pub fn entries(&self) -> Vec<FeedEntry<'_>> {
        let view = self.feed.view(self.display_mode);
        collapse_combos(&view, |record| single_emote(record, &self.emotes))
    }

    /// Annotate a record's body against the current directories.
    pub fn annotate(&self, record: &NormalizedRecord) -> Annotated {
        self.annotator.annotate(record.body())
    }

    pub fn input(&self) -> &Input {
        &self.input
    }

    pub fn suggestions(&self) -> &SuggestionState {
        self.completer.state()
    }

    /// Replace the composed text after a keystroke or cursor move.
    ///
    /// Ends any completion cycle and schedules a suggestion refresh that
    /// supersedes the previous one.
    pub fn edit(&mut self, text: impl Into<String>, cursor: usize, now: Instant) {
        let text = text.into();
        self.input.cursor = cursor.min(text.len());
        self.input.text = text;
        self.completer.reset();
        self.refresh.schedule((), now);
    }

    /// Whether a suggestion refresh is waiting for its debounce delay.
    pub fn refresh_pending(&self) -> bool {
        self.refresh.is_pending()
    }

    /// Run a due suggestion refresh. Returns whether one ran.
    pub fn tick(&mut self, now: Instant) -> bool {
        if self.refresh.poll(now).is_none() {
            return false;
        }
        self.completer
            .refresh(&self.input.text, self.input.cursor, &self.emotes, &self.nicks);
        true
    }

    /// Tab (or Shift-Tab): put the next suggestion in place of the word at
    /// the cursor. Returns whether the input changed.
    pub fn complete(&mut self, direction: Direction) -> bool {
        self.refresh.cancel();
        let Some(replacement) = self.completer.advance(
            &self.input.text,
            self.input.cursor,
            direction,
            &self.emotes,
            &self.nicks,
        ) else {
            return false;
        };
        self.input.cursor = replacement.apply(&mut self.input.text);
        true
    }

    /// Stop cycling and keep the current word.
    pub fn accept(&mut self) -> Option<&str> {
        self.completer.accept()
    }

    /// Show suggestions for the last accepted word again.
    pub fn reopen(&mut self) -> &[String] {
        self.completer.reopen(&self.emotes, &self.nicks)
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new(&Config::default())
    }
}
