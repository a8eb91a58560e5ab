//! Emote combo detection
//!
//! When several people in the same channel post the same lone emote in a
//! row, the feed shows one combo entry ("Clap x 5") instead of five lines.
//! Runs are found per `(source, source_key)` partition, over that
//! partition's own subsequence of the view, so interleaved lines from other
//! channels never break a run and identical emote names on two platforms
//! never merge.

use crate::types::{NormalizedRecord, Source};
use std::collections::{HashMap, HashSet};

/// Shortest run that collapses into a combo.
pub const MIN_COMBO_RUN: usize = 2;

/// One row of the rendered feed.
#[derive(Debug, Clone, PartialEq)]
pub enum FeedEntry<'a> {
    /// An ordinary message
    Message(&'a NormalizedRecord),
    /// A run of identical lone emotes, placed where its last member was
    Combo {
        emote: String,
        count: usize,
        last: &'a NormalizedRecord,
    },
}

impl<'a> FeedEntry<'a> {
    /// The record that determines this entry's position.
    pub fn record(&self) -> &'a NormalizedRecord {
        match self {
            FeedEntry::Message(record) => *record,
            FeedEntry::Combo { last, .. } => *last,
        }
    }
}

/// Emote identity of a record whose whole trimmed body is one known emote.
///
/// Any other character, including inner whitespace, disqualifies it.
pub fn single_emote<'r>(record: &'r NormalizedRecord, emotes: &HashSet<String>) -> Option<&'r str> {
    let body = record.body().trim();
    if body.is_empty() || body.contains(char::is_whitespace) {
        return None;
    }
    emotes.contains(body).then_some(body)
}

/// Collapse runs of identical lone emotes in `view`.
///
/// `emote_of` returns the emote identity of a record that is a single bare
/// emote, or `None`. Output keeps the order of `view`.
pub fn collapse_combos<'a, F>(view: &[&'a NormalizedRecord], emote_of: F) -> Vec<FeedEntry<'a>>
where
    F: Fn(&'a NormalizedRecord) -> Option<&'a str>,
{
    let mut partitions: HashMap<(Source, &'a str), Vec<usize>> = HashMap::new();
    for (index, &record) in view.iter().enumerate() {
        partitions
            .entry((record.source(), record.source_key()))
            .or_default()
            .push(index);
    }

    // Combo count keyed by the index of the run's last member; every other
    // member is absorbed.
    let mut combo_at: HashMap<usize, (&'a str, usize)> = HashMap::new();
    let mut absorbed: HashSet<usize> = HashSet::new();

    for indices in partitions.values() {
        let mut run: Vec<usize> = Vec::new();
        let mut run_emote: Option<&'a str> = None;

        for &index in indices {
            let emote = emote_of(view[index]);
            if emote.is_some() && emote == run_emote {
                run.push(index);
                continue;
            }
            close_run(&run, run_emote, &mut combo_at, &mut absorbed);
            run.clear();
            run_emote = emote;
            if emote.is_some() {
                run.push(index);
            }
        }
        close_run(&run, run_emote, &mut combo_at, &mut absorbed);
    }

    view.iter()
        .enumerate()
        .filter(|(index, _)| !absorbed.contains(index))
        .map(|(index, &record)| match combo_at.get(&index) {
            Some(&(emote, count)) => FeedEntry::Combo {
                emote: emote.to_string(),
                count,
                last: record,
            },
            None => FeedEntry::Message(record),
        })
        .collect()
}

fn close_run<'a>(
    run: &[usize],
    emote: Option<&'a str>,
    combo_at: &mut HashMap<usize, (&'a str, usize)>,
    absorbed: &mut HashSet<usize>,
) {
    let (Some(emote), Some((&last, rest))) = (emote, run.split_last()) else {
        return;
    };
    if run.len() < MIN_COMBO_RUN {
        return;
    }
    combo_at.insert(last, (emote, run.len()));
    absorbed.extend(rest.iter().copied());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::Feed;
    use crate::types::{ChatLine, ChatRecord, DisplayMode, RecordKind};

    fn emotes() -> HashSet<String> {
        ["Clap", "PepeLaugh", "LUL"].iter().map(|s| s.to_string()).collect()
    }

    fn on(source: Source, key: &str, body: &str) -> ChatRecord {
        let chat = ChatLine::new("someone", body, key);
        let kind = match source {
            Source::Primary => RecordKind::Primary(chat),
            Source::PlatformA => RecordKind::PlatformA(chat),
            Source::PlatformB => RecordKind::PlatformB(chat),
            _ => RecordKind::PlatformC(chat),
        };
        ChatRecord::new(0, kind)
    }

    fn describe(entries: &[FeedEntry<'_>]) -> Vec<String> {
        entries
            .iter()
            .map(|entry| match entry {
                FeedEntry::Message(record) => record.body().to_string(),
                FeedEntry::Combo { emote, count, .. } => format!("{} x{}", emote, count),
            })
            .collect()
    }

    fn run(feed: &Feed) -> Vec<String> {
        let set = emotes();
        let view = feed.view(DisplayMode::ByArrival);
        describe(&collapse_combos(&view, |r| single_emote(r, &set)))
    }

    #[test]
    fn test_runs_split_by_other_message() {
        let mut feed = Feed::new(100, 100);
        feed.append(
            ["Clap", "Clap", "Clap", "nice", "Clap", "Clap"]
                .iter()
                .map(|b| on(Source::Primary, "", b)),
        );
        assert_eq!(run(&feed), vec!["Clap x3", "nice", "Clap x2"]);
    }

    #[test]
    fn test_interleaved_partition_does_not_break_run() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            on(Source::Primary, "", "Clap"),
            on(Source::PlatformA, "chan", "hello"),
            on(Source::Primary, "", "Clap"),
            on(Source::PlatformA, "chan", "there"),
            on(Source::Primary, "", "Clap"),
        ]);
        assert_eq!(run(&feed), vec!["hello", "there", "Clap x3"]);

        let set = emotes();
        let view = feed.view(DisplayMode::ByArrival);
        let entries = collapse_combos(&view, |r| single_emote(r, &set));
        assert_eq!(entries[2].record().arrival_seq().get(), 4);
    }

    #[test]
    fn test_same_emote_on_two_platforms_never_combines() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            on(Source::PlatformA, "x", "LUL"),
            on(Source::PlatformB, "x", "LUL"),
        ]);
        assert_eq!(run(&feed), vec!["LUL", "LUL"]);
    }

    #[test]
    fn test_different_source_keys_are_separate_partitions() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            on(Source::PlatformA, "one", "LUL"),
            on(Source::PlatformA, "two", "LUL"),
            on(Source::PlatformA, "one", "LUL"),
        ]);
        assert_eq!(run(&feed), vec!["LUL", "LUL x2"]);
    }

    #[test]
    fn test_different_emotes_do_not_combine() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            on(Source::Primary, "", "Clap"),
            on(Source::Primary, "", "LUL"),
            on(Source::Primary, "", "LUL"),
        ]);
        assert_eq!(run(&feed), vec!["Clap", "LUL x2"]);
    }

    #[test]
    fn test_single_emote_predicate() {
        let mut feed = Feed::new(100, 100);
        feed.append(vec![
            on(Source::Primary, "", "  Clap  "),
            on(Source::Primary, "", "Clap Clap"),
            on(Source::Primary, "", "Clap!"),
            on(Source::Primary, "", "clap"),
        ]);
        let set = emotes();
        let found: Vec<_> = feed.iter().map(|r| single_emote(r, &set)).collect();
        assert_eq!(found, vec![Some("Clap"), None, None, None]);
    }
}
