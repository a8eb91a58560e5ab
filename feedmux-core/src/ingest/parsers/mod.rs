//! Source-specific parsers
//!
//! Each source has a parser module that implements
//! the [`SourceParser`](super::SourceParser) trait.
//!
//! | Source | Module | Payload shape |
//! |--------|--------|---------------|
//! | Primary, Broadcast | [`primary`] | `nick` / `data` / epoch-ms `timestamp` |
//! | Platform A | [`platform_a`] | IRC tags, `tmi_sent_ts` |
//! | Platform B | [`platform_b`] | nested author, RFC 3339 `published_at` |
//! | Platform C | [`platform_c`] | nested sender, RFC 3339 `created_at` |
//! | Event, System | [`notices`] | `kind` / `nick` / `text` |

pub mod notices;
pub mod platform_a;
pub mod platform_b;
pub mod platform_c;
pub mod primary;

pub use notices::{EventParser, SystemParser};
pub use platform_a::PlatformAParser;
pub use platform_b::PlatformBParser;
pub use platform_c::PlatformCParser;
pub use primary::{BroadcastParser, PrimaryParser};

use super::SourceParser;
use crate::types::Source;

/// Create all available parsers.
///
/// Returns one boxed parser per [`Source`].
/// Use this to initialize a [`Normalizer`](super::Normalizer).
pub fn create_all_parsers() -> Vec<Box<dyn SourceParser>> {
    Source::ALL.into_iter().map(parser_for).collect()
}

/// Get the parser for a specific source.
pub fn parser_for(source: Source) -> Box<dyn SourceParser> {
    match source {
        Source::Primary => Box::new(PrimaryParser::new()),
        Source::PlatformA => Box::new(PlatformAParser::new()),
        Source::PlatformB => Box::new(PlatformBParser::new()),
        Source::PlatformC => Box::new(PlatformCParser::new()),
        Source::Event => Box::new(EventParser::new()),
        Source::System => Box::new(SystemParser::new()),
        Source::Broadcast => Box::new(BroadcastParser::new()),
    }
}
