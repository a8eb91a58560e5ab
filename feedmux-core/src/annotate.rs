//! Message body annotation
//!
//! Splits a message body into typed segments for rendering. Recognition runs
//! in a fixed order, each stage only looking at text the earlier stages left
//! unclaimed:
//!
//! 1. links (`http(s)://...` and `#platform/identifier` deep links)
//! 2. emote names, whole-word and case-sensitive, longest name first
//! 3. nicks, whole-word and case-insensitive
//!
//! Lines whose trimmed text starts with `>` are flagged as quoted
//! (greentext); that flag wraps the line and is not a segment.
//!
//! Annotation is a pure function of its inputs. The link pattern is a shared
//! compiled [`Regex`], which keeps no match position between calls.

use regex::Regex;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::LazyLock;

static LINK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bhttps?://[^\s<>]+|#([a-z][a-z0-9_]*)/([^\s#/]+)")
        .expect("link pattern is valid")
});

/// Trailing characters that usually close the sentence, not the URL.
const TRAILING_PUNCTUATION: &[char] = &['.', ',', ';', ':', '!', '?', '\'', '"', ')', ']'];

/// Where a link points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LinkTarget {
    /// Absolute web URL
    Web { url: String },
    /// In-app deep link to an embedded stream (`#platform/identifier`)
    Embed { platform: String, id: String },
}

/// A typed slice of a message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Segment {
    Text(String),
    Emote(String),
    Link { text: String, target: LinkTarget },
    Mention(String),
}

/// One line of an annotated body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedLine {
    /// Greentext: the trimmed line starts with `>`
    pub quoted: bool,
    pub segments: Vec<Segment>,
}

/// Annotated message body, one entry per input line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotated {
    pub lines: Vec<AnnotatedLine>,
}

impl Annotated {
    /// All segments in order, ignoring line structure.
    pub fn segments(&self) -> impl Iterator<Item = &Segment> {
        self.lines.iter().flat_map(|line| line.segments.iter())
    }
}

/// Lookup tables for emote and nick recognition.
#[derive(Debug, Clone, Default)]
pub struct Annotator {
    /// Emote names bucketed by first char, longest first
    emotes: HashMap<char, Vec<String>>,
    /// Lowercased nicks
    nicks: HashSet<String>,
}

impl Annotator {
    pub fn new<E, N>(emotes: E, nicks: N) -> Self
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
        N: IntoIterator,
        N::Item: AsRef<str>,
    {
        let mut annotator = Self::default();
        annotator.set_emotes(emotes);
        for nick in nicks {
            annotator.add_nick(nick.as_ref());
        }
        annotator
    }

    /// Replace the emote table.
    pub fn set_emotes<E>(&mut self, emotes: E)
    where
        E: IntoIterator,
        E::Item: AsRef<str>,
    {
        let mut buckets: HashMap<char, Vec<String>> = HashMap::new();
        for name in emotes {
            let name = name.as_ref();
            if let Some(first) = name.chars().next() {
                buckets.entry(first).or_default().push(name.to_string());
            }
        }
        for names in buckets.values_mut() {
            names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
            names.dedup();
        }
        self.emotes = buckets;
    }

    /// Make `nick` mentionable. Returns whether it was new.
    pub fn add_nick(&mut self, nick: &str) -> bool {
        !nick.is_empty() && self.nicks.insert(nick.to_lowercase())
    }

    /// Stop recognizing `nick` in any casing. Returns whether it was known.
    pub fn remove_nick(&mut self, nick: &str) -> bool {
        self.nicks.remove(&nick.to_lowercase())
    }

    pub fn annotate(&self, body: &str) -> Annotated {
        let lines = body
            .split('\n')
            .map(|line| {
                let line = line.strip_suffix('\r').unwrap_or(line);
                AnnotatedLine {
                    quoted: line.trim().starts_with('>'),
                    segments: self.annotate_line(line),
                }
            })
            .collect();
        Annotated { lines }
    }

    fn annotate_line(&self, line: &str) -> Vec<Segment> {
        let mut segments = Vec::new();
        let mut cursor = 0;

        for caps in LINK_PATTERN.captures_iter(line) {
            let Some(whole) = caps.get(0) else {
                continue;
            };
            let deep_link = caps.get(1).zip(caps.get(2));
            // Deep links must stand alone as a token.
            if deep_link.is_some() && !preceded_by_space(line, whole.start()) {
                continue;
            }

            let text = trim_link_end(whole.as_str());
            if text.is_empty() {
                continue;
            }
            let target = match deep_link {
                Some((platform, id)) => {
                    let id_end = (whole.start() + text.len()).min(id.end());
                    // Punctuation alone is not an identifier.
                    if id_end <= id.start() {
                        continue;
                    }
                    LinkTarget::Embed {
                        platform: platform.as_str().to_lowercase(),
                        id: line[id.start()..id_end].to_string(),
                    }
                }
                None if text.ends_with("://") => continue,
                None => LinkTarget::Web {
                    url: text.to_string(),
                },
            };

            self.scan_words(&line[cursor..whole.start()], &mut segments);
            segments.push(Segment::Link {
                text: text.to_string(),
                target,
            });
            cursor = whole.start() + text.len();
        }

        self.scan_words(&line[cursor..], &mut segments);
        segments
    }

    /// Claim emotes, then nicks, in link-free text.
    fn scan_words(&self, text: &str, out: &mut Vec<Segment>) {
        let mut plain_start = 0;
        let mut i = 0;
        let mut prev: Option<char> = None;

        while let Some(ch) = text[i..].chars().next() {
            let at_boundary = prev.map_or(true, |p| !is_word_char(p));
            if !at_boundary {
                prev = Some(ch);
                i += ch.len_utf8();
                continue;
            }

            if let Some(name) = self.emote_at(&text[i..]) {
                push_text(out, &text[plain_start..i]);
                out.push(Segment::Emote(name.to_string()));
                i += name.len();
                plain_start = i;
                prev = name.chars().next_back();
                continue;
            }

            if is_word_char(ch) {
                let word = word_at(&text[i..]);
                if self.nicks.contains(&word.to_lowercase()) {
                    push_text(out, &text[plain_start..i]);
                    out.push(Segment::Mention(word.to_string()));
                    plain_start = i + word.len();
                }
                i += word.len();
                prev = word.chars().next_back();
                continue;
            }

            prev = Some(ch);
            i += ch.len_utf8();
        }

        push_text(out, &text[plain_start..]);
    }

    /// Longest emote name starting at the head of `rest` and ending on a word
    /// boundary.
    fn emote_at<'s>(&'s self, rest: &str) -> Option<&'s str> {
        let first = rest.chars().next()?;
        self.emotes.get(&first)?.iter().map(String::as_str).find(|name| {
            rest.starts_with(name)
                && rest[name.len()..]
                    .chars()
                    .next()
                    .map_or(true, |next| !is_word_char(next))
        })
    }
}

/// Annotate `body` against one-off lookup tables.
pub fn annotate(body: &str, emotes: &HashSet<String>, nicks: &HashSet<String>) -> Annotated {
    Annotator::new(emotes, nicks).annotate(body)
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn word_at(text: &str) -> &str {
    let end = text
        .char_indices()
        .find(|(_, c)| !is_word_char(*c))
        .map_or(text.len(), |(idx, _)| idx);
    &text[..end]
}

fn preceded_by_space(line: &str, start: usize) -> bool {
    line[..start]
        .chars()
        .next_back()
        .map_or(true, char::is_whitespace)
}

/// Strip sentence punctuation off a matched link, keeping a closing paren
/// that balances one inside the link.
fn trim_link_end(link: &str) -> &str {
    let mut end = link;
    while let Some(last) = end.chars().next_back() {
        if !TRAILING_PUNCTUATION.contains(&last) {
            break;
        }
        if last == ')' && end.matches('(').count() >= end.matches(')').count() {
            break;
        }
        end = &end[..end.len() - last.len_utf8()];
    }
    end
}

fn push_text(out: &mut Vec<Segment>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Segment::Text(prev)) = out.last_mut() {
        prev.push_str(text);
    } else {
        out.push(Segment::Text(text.to_string()));
    }
}
