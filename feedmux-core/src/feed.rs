//! The unified feed buffer
//!
//! [`Feed`] owns every record shown in the merged chat. It is the only
//! place arrival sequences are handed out. Storage is kept in by-arrival
//! display order: the history block first, sorted by `(timestamp, seq)`,
//! then live records in arrival order. Trimming after a mutation removes
//! from that front end:
//!
//! - to `soft_cap` while the reader sits at the bottom of the feed
//! - to `hard_cap` while the reader has scrolled up, so the lines they are
//!   reading do not vanish underneath them
//!
//! A history replace that overflows the cap gives up its own oldest
//! backfill lines first, so other sources' records stay as they were.

use crate::types::{ArrivalSeq, ChatRecord, DisplayMode, NormalizedRecord, Source};
use std::collections::VecDeque;

/// Capped record store: history block, then live records by arrival.
#[derive(Debug)]
pub struct Feed {
    records: VecDeque<NormalizedRecord>,
    next_seq: u64,
    update_seq: u64,
    at_bottom: bool,
    soft_cap: usize,
    hard_cap: usize,
}

impl Feed {
    /// Create an empty feed. `hard_cap` is raised to `soft_cap` if lower.
    pub fn new(soft_cap: usize, hard_cap: usize) -> Self {
        Self {
            records: VecDeque::new(),
            next_seq: 0,
            update_seq: 0,
            at_bottom: true,
            soft_cap,
            hard_cap: hard_cap.max(soft_cap),
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn soft_cap(&self) -> usize {
        self.soft_cap
    }

    pub fn hard_cap(&self) -> usize {
        self.hard_cap
    }

    /// Counter bumped whenever stored records change.
    ///
    /// Front ends re-stick to the bottom when this moves; the record count
    /// alone can stay flat once the feed is at capacity.
    pub fn update_seq(&self) -> u64 {
        self.update_seq
    }

    pub fn is_at_bottom(&self) -> bool {
        self.at_bottom
    }

    /// Record whether the reader is scrolled to the bottom.
    ///
    /// Takes effect on the next mutation; nothing is trimmed here.
    pub fn set_at_bottom(&mut self, at_bottom: bool) {
        self.at_bottom = at_bottom;
    }

    /// Records in stored order (history block, then live by arrival).
    pub fn iter(&self) -> impl Iterator<Item = &NormalizedRecord> {
        self.records.iter()
    }

    /// Append live records in the given order. Returns how many were added.
    pub fn append<I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = ChatRecord>,
    {
        let before = self.records.len();
        for record in records {
            let seq = self.next_arrival();
            self.records.push_back(NormalizedRecord::stamp(record, seq, false));
        }
        let added = self.records.len() - before;
        if added == 0 {
            return 0;
        }

        let trimmed = self.trim();
        self.update_seq += 1;
        tracing::debug!(added, trimmed, len = self.records.len(), "Appended records");
        added
    }

    /// Replace every record of `source` with a history backfill.
    ///
    /// Replacing the primary source also removes its broadcasts. Records of
    /// other sources are untouched. Backfill records whose source is not
    /// covered by `source` are dropped. When the result would exceed the
    /// active cap, the oldest backfill records are discarded first. Returns
    /// how many records were added.
    pub fn replace_history<I>(&mut self, source: Source, records: I) -> usize
    where
        I: IntoIterator<Item = ChatRecord>,
    {
        let before = self.records.len();
        self.records.retain(|r| !source.history_covers(r.source()));
        let removed = before - self.records.len();

        let mut backfill = Vec::new();
        for record in records {
            if !source.history_covers(record.source()) {
                tracing::warn!(
                    history_source = %source,
                    record_source = %record.source(),
                    "Dropping backfill record from another source"
                );
                continue;
            }
            let seq = self.next_arrival();
            backfill.push(NormalizedRecord::stamp(record, seq, true));
        }
        backfill.sort_by_key(|r| r.timeline_key());

        let overflow = (self.records.len() + backfill.len()).saturating_sub(self.active_cap());
        let truncated = overflow.min(backfill.len());
        backfill.drain(..truncated);
        let added = backfill.len();

        self.merge_history(backfill);
        // Only reachable when the other sources alone exceed the cap.
        let trimmed = truncated + self.trim();
        if removed > 0 || added > 0 {
            self.update_seq += 1;
        }
        tracing::info!(source = %source, removed, added, trimmed, "Replaced history");
        added
    }

    /// Change the capacity limits and retrim using the current scroll state.
    pub fn set_capacity(&mut self, soft_cap: usize, hard_cap: usize) {
        self.soft_cap = soft_cap;
        self.hard_cap = hard_cap.max(soft_cap);
        if self.trim() > 0 {
            self.update_seq += 1;
        }
    }

    /// Displayable sequence for `mode`. Does not modify stored order.
    pub fn view(&self, mode: DisplayMode) -> Vec<&NormalizedRecord> {
        match mode {
            DisplayMode::ByTimestamp => {
                let mut all: Vec<_> = self.records.iter().collect();
                all.sort_by_key(|r| r.timeline_key());
                all
            }
            DisplayMode::ByArrival => self.records.iter().collect(),
        }
    }

    /// Merge sorted backfill into the history block at the front.
    fn merge_history(&mut self, backfill: Vec<NormalizedRecord>) {
        if backfill.is_empty() {
            return;
        }
        let history_len = self
            .records
            .iter()
            .take_while(|r| r.is_history_replay())
            .count();
        let mut history: Vec<_> = self.records.drain(..history_len).collect();
        history.extend(backfill);
        history.sort_by_key(|r| r.timeline_key());
        for record in history.into_iter().rev() {
            self.records.push_front(record);
        }
    }

    fn next_arrival(&mut self) -> ArrivalSeq {
        let seq = ArrivalSeq(self.next_seq);
        self.next_seq += 1;
        seq
    }

    fn active_cap(&self) -> usize {
        if self.at_bottom {
            self.soft_cap
        } else {
            self.hard_cap
        }
    }

    /// Drop records beyond the active cap from the front (history first,
    /// then the oldest live records). Returns how many went.
    fn trim(&mut self) -> usize {
        let cap = self.active_cap();
        let excess = self.records.len().saturating_sub(cap);
        self.records.drain(..excess);
        excess
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ChatLine, RecordKind};

    fn line(source: Source, body: &str, ts: i64) -> ChatRecord {
        let chat = ChatLine::new("ann", body, "");
        let kind = match source {
            Source::Primary => RecordKind::Primary(chat),
            Source::PlatformA => RecordKind::PlatformA(chat),
            Source::PlatformB => RecordKind::PlatformB(chat),
            Source::PlatformC => RecordKind::PlatformC(chat),
            Source::Broadcast => RecordKind::Broadcast {
                text: body.to_string(),
            },
            Source::System => RecordKind::System {
                text: body.to_string(),
            },
            Source::Event => unreachable!("not used in feed tests"),
        };
        ChatRecord::new(ts, kind)
    }

    fn seqs(records: &[&NormalizedRecord]) -> Vec<u64> {
        records.iter().map(|r| r.arrival_seq().get()).collect()
    }

    fn bodies<'a>(records: &[&'a NormalizedRecord]) -> Vec<&'a str> {
        records.iter().map(|r| r.body()).collect()
    }

    #[test]
    fn test_append_assigns_increasing_sequences() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![line(Source::Primary, "a", 0), line(Source::PlatformA, "b", 0)]);
        feed.append(vec![line(Source::PlatformB, "c", 0)]);

        let view = feed.view(DisplayMode::ByArrival);
        assert_eq!(seqs(&view), vec![0, 1, 2]);
    }

    #[test]
    fn test_empty_append_is_noop() {
        let mut feed = Feed::new(10, 10);
        assert_eq!(feed.append(Vec::new()), 0);
        assert_eq!(feed.update_seq(), 0);
    }

    #[test]
    fn test_soft_cap_trims_oldest_at_bottom() {
        let mut feed = Feed::new(2, 5);
        feed.append(vec![
            line(Source::Primary, "a", 10),
            line(Source::Primary, "b", 20),
            line(Source::Primary, "c", 30),
        ]);

        let view = feed.view(DisplayMode::ByArrival);
        assert_eq!(view.len(), 2);
        assert_eq!(seqs(&view), vec![1, 2]);
    }

    #[test]
    fn test_hard_cap_applies_while_scrolled_up() {
        let mut feed = Feed::new(2, 4);
        feed.set_at_bottom(false);
        feed.append((0..6).map(|i| line(Source::Primary, "x", i)));
        assert_eq!(feed.len(), 4);
        assert_eq!(seqs(&feed.view(DisplayMode::ByArrival)), vec![2, 3, 4, 5]);

        // Returning to the bottom trims on the next mutation only.
        feed.set_at_bottom(true);
        assert_eq!(feed.len(), 4);
        feed.append(vec![line(Source::Primary, "y", 7)]);
        assert_eq!(seqs(&feed.view(DisplayMode::ByArrival)), vec![5, 6]);
    }

    #[test]
    fn test_update_seq_moves_when_length_is_flat() {
        let mut feed = Feed::new(1, 1);
        feed.append(vec![line(Source::Primary, "a", 0)]);
        let first = feed.update_seq();
        feed.append(vec![line(Source::Primary, "b", 0)]);
        assert_eq!(feed.len(), 1);
        assert!(feed.update_seq() > first);
    }

    #[test]
    fn test_set_capacity_retrims_with_current_scroll_state() {
        let mut feed = Feed::new(10, 10);
        feed.append((0..8).map(|i| line(Source::Primary, "x", i)));
        feed.set_at_bottom(false);

        feed.set_capacity(2, 5);
        assert_eq!(feed.len(), 5);
        assert_eq!(feed.view(DisplayMode::ByArrival)[0].arrival_seq().get(), 3);

        feed.set_capacity(6, 1);
        assert_eq!(feed.hard_cap(), 6);
    }

    #[test]
    fn test_replace_history_isolated_to_source() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            line(Source::PlatformA, "old a", 1),
            line(Source::Primary, "live p", 2),
            line(Source::PlatformB, "live b", 3),
            line(Source::PlatformA, "old a2", 4),
        ]);

        feed.replace_history(
            Source::PlatformA,
            vec![line(Source::PlatformA, "hist 1", 0), line(Source::PlatformA, "hist 2", 1)],
        );

        let view = feed.view(DisplayMode::ByArrival);
        assert_eq!(bodies(&view), vec!["hist 1", "hist 2", "live p", "live b"]);
        assert!(view[0].is_history_replay());
        assert!(!view[2].is_history_replay());
        // Fresh sequences after everything already handed out.
        assert_eq!(seqs(&view), vec![4, 5, 1, 2]);
    }

    #[test]
    fn test_replace_primary_history_also_drops_broadcasts() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            line(Source::Primary, "p", 1),
            line(Source::Broadcast, "bc", 2),
            line(Source::PlatformC, "c", 3),
        ]);
        feed.replace_history(Source::Primary, vec![line(Source::Primary, "hist", 0)]);

        let view = feed.view(DisplayMode::ByArrival);
        assert_eq!(bodies(&view), vec!["hist", "c"]);

        // Broadcast history does not touch primary records.
        feed.replace_history(Source::Broadcast, Vec::new());
        assert_eq!(feed.len(), 2);
    }

    #[test]
    fn test_replace_history_drops_foreign_backfill_records() {
        let mut feed = Feed::new(100, 100);
        let added = feed.replace_history(
            Source::PlatformB,
            vec![line(Source::PlatformB, "ok", 0), line(Source::PlatformA, "stray", 0)],
        );
        assert_eq!(added, 1);
        assert_eq!(bodies(&feed.view(DisplayMode::ByArrival)), vec!["ok"]);
    }

    #[test]
    fn test_replace_history_with_nothing_is_noop() {
        let mut feed = Feed::new(10, 10);
        feed.append(vec![line(Source::Primary, "p", 0)]);
        let before = feed.update_seq();
        feed.replace_history(Source::PlatformC, Vec::new());
        assert_eq!(feed.update_seq(), before);
        assert_eq!(feed.len(), 1);
    }

    #[test]
    fn test_by_arrival_interleaves_history_by_time() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![line(Source::Primary, "live late ts", 1)]);
        feed.replace_history(
            Source::PlatformA,
            vec![line(Source::PlatformA, "a@10", 10), line(Source::PlatformA, "a@30", 30)],
        );
        feed.replace_history(
            Source::PlatformB,
            vec![line(Source::PlatformB, "b@20", 20), line(Source::PlatformB, "b@30", 30)],
        );
        feed.append(vec![line(Source::PlatformC, "live early ts", 0)]);

        let view = feed.view(DisplayMode::ByArrival);
        assert_eq!(
            bodies(&view),
            vec!["a@10", "b@20", "a@30", "b@30", "live late ts", "live early ts"]
        );
    }

    #[test]
    fn test_by_timestamp_breaks_ties_by_arrival() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            line(Source::PlatformA, "second", 50),
            line(Source::PlatformB, "tie first", 10),
            line(Source::PlatformC, "tie second", 10),
        ]);

        let view = feed.view(DisplayMode::ByTimestamp);
        assert_eq!(bodies(&view), vec!["tie first", "tie second", "second"]);

        // Stored order is untouched by viewing.
        let stored: Vec<_> = feed.iter().map(|r| r.body()).collect();
        assert_eq!(stored, vec!["second", "tie first", "tie second"]);
        assert_eq!(bodies(&feed.view(DisplayMode::ByArrival)), stored);
    }

    #[test]
    fn test_history_replace_at_capacity_keeps_other_sources() {
        let mut feed = Feed::new(3, 10);
        feed.append(vec![
            line(Source::Primary, "live1", 1),
            line(Source::Primary, "live2", 2),
            line(Source::Primary, "live3", 3),
        ]);

        let added = feed.replace_history(Source::PlatformA, vec![line(Source::PlatformA, "hist", 0)]);

        assert_eq!(added, 0);
        assert_eq!(
            bodies(&feed.view(DisplayMode::ByArrival)),
            vec!["live1", "live2", "live3"]
        );
    }

    #[test]
    fn test_oversized_backfill_keeps_its_newest_lines() {
        let mut feed = Feed::new(4, 10);
        feed.append(vec![line(Source::PlatformB, "b live", 100)]);

        feed.replace_history(
            Source::PlatformA,
            (0..6).map(|i| line(Source::PlatformA, &format!("a{}", i), i)),
        );

        assert_eq!(feed.len(), 4);
        assert_eq!(
            bodies(&feed.view(DisplayMode::ByArrival)),
            vec!["a3", "a4", "a5", "b live"]
        );
    }

    #[test]
    fn test_history_replace_uses_hard_cap_while_scrolled_up() {
        let mut feed = Feed::new(2, 4);
        feed.set_at_bottom(false);
        feed.append(vec![line(Source::PlatformC, "c1", 1), line(Source::PlatformC, "c2", 2)]);

        feed.replace_history(
            Source::Primary,
            vec![
                line(Source::Primary, "p0", 0),
                line(Source::Broadcast, "bc", 1),
                line(Source::Primary, "p2", 2),
            ],
        );

        assert_eq!(feed.len(), 4);
        assert_eq!(
            bodies(&feed.view(DisplayMode::ByArrival)),
            vec!["bc", "p2", "c1", "c2"]
        );
    }

    #[test]
    fn test_append_at_capacity_evicts_history_before_live() {
        let mut feed = Feed::new(3, 3);
        feed.append(vec![line(Source::Primary, "live old seq", 50)]);
        feed.replace_history(
            Source::PlatformA,
            vec![line(Source::PlatformA, "h1", 1), line(Source::PlatformA, "h2", 2)],
        );
        assert_eq!(feed.len(), 3);

        feed.append(vec![line(Source::PlatformB, "new", 60)]);

        // The displayed sequence loses its first line, never a middle one.
        assert_eq!(
            bodies(&feed.view(DisplayMode::ByArrival)),
            vec!["h2", "live old seq", "new"]
        );
    }

    #[test]
    fn test_trim_never_exceeds_active_cap() {
        let mut feed = Feed::new(3, 7);
        for round in 0..20 {
            feed.set_at_bottom(round % 3 != 0);
            feed.append((0..(round % 5)).map(|i| line(Source::Primary, "x", i)));
            let cap = if feed.is_at_bottom() { 3 } else { 7 };
            if round % 5 != 0 {
                assert!(feed.len() <= cap);
            }
        }
    }
}
