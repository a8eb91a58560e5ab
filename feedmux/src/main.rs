//! feedmux - merged multi-platform chat feed
//!
//! Replays recorded inbound events through a session and prints the merged
//! feed, or prints autocomplete suggestions for a fragment.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Logs: $XDG_STATE_HOME/feedmux/feedmux.YYYY-MM-DD.log (~/.local/state/feedmux/)
//! - Config: $XDG_CONFIG_HOME/feedmux/config.toml (~/.config/feedmux/config.toml)

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use feedmux_core::autocomplete::Suggester;
use feedmux_core::format::format_entry;
use feedmux_core::{Config, DisplayMode, InboundEvent, Session};
use std::collections::HashSet;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "feedmux")]
#[command(about = "Merged multi-platform chat feed")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply recorded events (one JSON object per line) and print the feed
    Replay {
        /// Path to the events file
        file: PathBuf,

        /// Display ordering: by_arrival or by_timestamp
        #[arg(long)]
        mode: Option<DisplayMode>,

        /// Records kept while at the bottom of the feed
        #[arg(long)]
        soft_cap: Option<usize>,

        /// Records kept while scrolled up
        #[arg(long)]
        hard_cap: Option<usize>,

        /// Treat the reader as scrolled up for the whole replay
        #[arg(long)]
        scrolled_up: bool,
    },
    /// Print autocomplete suggestions for a fragment
    Complete {
        /// Word fragment; prefix with the trigger (default '@') for nicks
        fragment: String,

        /// Known emote name (repeatable)
        #[arg(long = "emote")]
        emotes: Vec<String>,

        /// Known nick (repeatable)
        #[arg(long = "nick")]
        nicks: Vec<String>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Ensure XDG environment variables are set before using core library
    Config::ensure_xdg_env();

    let mut config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        feedmux_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::info!("feedmux starting");

    match args.command {
        Command::Replay {
            file,
            mode,
            soft_cap,
            hard_cap,
            scrolled_up,
        } => {
            if let Some(mode) = mode {
                config.feed.display_mode = mode;
            }
            if let Some(soft_cap) = soft_cap {
                config.feed.soft_cap = soft_cap;
                config.feed.hard_cap = config.feed.hard_cap.max(soft_cap);
            }
            if let Some(hard_cap) = hard_cap {
                config.feed.hard_cap = hard_cap;
            }
            config.validate().context("invalid feed options")?;
            run_replay(&config, &file, scrolled_up)
        }
        Command::Complete {
            fragment,
            emotes,
            nicks,
        } => run_complete(&config, &fragment, emotes, nicks),
    }
}

fn run_replay(config: &Config, path: &Path, scrolled_up: bool) -> Result<()> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open events file {}", path.display()))?;

    let mut session = Session::new(config);
    if scrolled_up {
        session.handle(InboundEvent::Scroll { at_bottom: false })?;
    }

    let mut applied = 0usize;
    let mut skipped = 0usize;
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line = line.context("failed to read events file")?;
        let line_no = index + 1;
        if line.trim().is_empty() {
            continue;
        }

        let event: InboundEvent = match serde_json::from_str(&line) {
            Ok(event) => event,
            Err(e) => {
                eprintln!("line {}: invalid event: {}", line_no, e);
                skipped += 1;
                continue;
            }
        };
        match session.handle(event) {
            Ok(_) => applied += 1,
            Err(e) => {
                eprintln!("line {}: {}", line_no, e);
                skipped += 1;
            }
        }
    }
    tracing::info!(applied, skipped, "Replay complete");

    for entry in session.entries() {
        println!("{}", format_entry(&entry));
    }

    let whispers = session.whispers();
    if !whispers.is_empty() {
        println!();
        println!("Whispers ({} unread):", whispers.total_unread());
        for name in whispers.correspondents() {
            match whispers.last_error(name) {
                Some(error) => println!(
                    "  {}: {} (send failed: {})",
                    name,
                    whispers.unread(name),
                    error
                ),
                None => println!("  {}: {}", name, whispers.unread(name)),
            }
        }
    }

    Ok(())
}

fn run_complete(
    config: &Config,
    fragment: &str,
    emotes: Vec<String>,
    nicks: Vec<String>,
) -> Result<()> {
    let suggester: Suggester = config.autocomplete.suggester();
    let emotes: HashSet<String> = emotes.into_iter().collect();
    let nicks: HashSet<String> = nicks.into_iter().collect();

    for suggestion in suggester.suggest(fragment, &emotes, &nicks) {
        println!("{}", suggestion);
    }
    Ok(())
}
