//! Private message (whisper) unread tracking
//!
//! Keeps the list of people the user has a whisper conversation with and how
//! many of their messages are unread. Counts move only through
//! [`WhisperTracker::record`], [`WhisperTracker::open`] and
//! [`WhisperTracker::remove`]; a conversation leaves the list only when the
//! user removes it.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::HashMap;

/// Unread whisper counts per correspondent.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WhisperTracker {
    /// Correspondents in first-seen order unless promoted
    unread: IndexMap<String, u32>,
    /// Error text from the most recent failed send, shown verbatim
    send_errors: HashMap<String, String>,
}

impl WhisperTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one incoming whisper from `correspondent`.
    pub fn record(&mut self, correspondent: &str) -> u32 {
        let count = self.entry(correspondent);
        *count += 1;
        *count
    }

    /// Mark the conversation read. Returns how many were unread.
    pub fn open(&mut self, correspondent: &str) -> u32 {
        self.send_errors.remove(correspondent);
        self.unread
            .get_mut(correspondent)
            .map(std::mem::take)
            .unwrap_or(0)
    }

    /// Forget the conversation entirely. Returns whether it existed.
    pub fn remove(&mut self, correspondent: &str) -> bool {
        self.send_errors.remove(correspondent);
        self.unread.shift_remove(correspondent).is_some()
    }

    /// Move a correspondent to the front of the list.
    pub fn promote(&mut self, correspondent: &str) -> bool {
        let Some(pos) = self.unread.get_index_of(correspondent) else {
            return false;
        };
        self.unread.move_index(pos, 0);
        true
    }

    /// Completion of an outgoing whisper.
    ///
    /// The recipient joins the conversation list with their count untouched.
    /// A failure message is kept as-is for display; a success clears it.
    pub fn send_completed(&mut self, to: &str, error: Option<String>) {
        self.entry(to);
        match error {
            Some(message) => {
                tracing::warn!(to, error = %message, "Whisper send failed");
                self.send_errors.insert(to.to_string(), message);
            }
            None => {
                self.send_errors.remove(to);
            }
        }
    }

    pub fn last_error(&self, correspondent: &str) -> Option<&str> {
        self.send_errors.get(correspondent).map(String::as_str)
    }

    pub fn unread(&self, correspondent: &str) -> u32 {
        self.unread.get(correspondent).copied().unwrap_or(0)
    }

    pub fn total_unread(&self) -> u64 {
        self.unread.values().map(|&c| u64::from(c)).sum()
    }

    /// Correspondents in display order.
    pub fn correspondents(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.unread.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.unread.is_empty()
    }

    pub fn contains(&self, correspondent: &str) -> bool {
        self.unread.contains_key(correspondent)
    }

    /// New correspondents join at the end of the list.
    fn entry(&mut self, correspondent: &str) -> &mut u32 {
        self.unread.entry(correspondent.to_string()).or_insert(0)
    }
}
