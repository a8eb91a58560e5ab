//! # feedmux-core
//!
//! Core library for feedmux - one merged chat feed over several streaming
//! platforms.
//!
//! This library provides:
//! - Per-platform payload normalization into a common record type
//! - A capped, arrival-ordered feed buffer with history backfill
//! - Emote combo collapsing, message annotation and autocompletion
//! - Whisper unread tracking
//! - Configuration management and logging infrastructure
//!
//! ## Architecture
//!
//! A [`Session`] is the single owner of feed state. Inbound work (live
//! messages, history backfills, directory lookups, whisper outcomes) reaches
//! it as [`InboundEvent`]s, applied one at a time:
//!
//! - **Ingest:** raw JSON payloads become [`ChatRecord`]s
//! - **Feed:** records are stamped with an [`ArrivalSeq`] and trimmed to the
//!   active capacity
//! - **Render:** [`Session::entries`] orders the view and collapses combos;
//!   [`Session::annotate`] splits a body into text, emotes, links and mentions
//!
//! ## Example
//!
//! ```rust
//! use feedmux_core::{Config, InboundEvent, Session};
//!
//! let mut session = Session::new(&Config::default());
//! let event: InboundEvent = serde_json::from_str(
//!     r#"{"type":"message","payload":{"source":"primary","nick":"ann","data":"hi"}}"#,
//! )
//! .unwrap();
//! session.handle(event).unwrap();
//! assert_eq!(session.entries().len(), 1);
//! ```

// Re-export commonly used items at the crate root
pub use config::Config;
pub use error::{Error, Result};
pub use feed::Feed;
pub use ingest::{NormalizeResult, Normalizer};
pub use session::{Applied, InboundEvent, Input, Session};
pub use types::*;

// Public modules
pub mod annotate;
pub mod autocomplete;
pub mod combo;
pub mod config;
pub mod error;
pub mod feed;
pub mod format;
pub mod ingest;
pub mod logging;
pub mod pending;
pub mod session;
pub mod types;
pub mod whispers;
