#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that drives the Deck Tally experience.

mod config;
mod render;

use std::{io, path::PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use deck_tally_core::{parse_count_input, CategoryId, Command, EntityId, CATEGORY_COUNT};
use deck_tally_persistence::{
    decode_transfer, encode_transfer, FileStore, PersistenceCodec, Session,
};
use deck_tally_system_scoring::ScoreEngine;
use deck_tally_world::query;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::TallyConfig;

const DEFAULT_LOG_FILTER: &str = "warn";

#[derive(Debug, Parser)]
#[command(
    name = "deck-tally",
    version,
    about = "Scores three decks against a ceiling derived from the difficulty level"
)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Directory holding the persisted tally. Overrides the configuration.
    #[arg(long, global = true)]
    store_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<TallyCommand>,
}

#[derive(Debug, Subcommand)]
enum TallyCommand {
    /// Print totals, ceiling and per-category counts (default).
    Show,
    /// Print the category table.
    Categories,
    /// Set the difficulty level. Values below 1 or non-numeric input become 1.
    Level {
        #[arg(allow_hyphen_values = true)]
        level: String,
    },
    /// Raise the level by one, up to the configured display maximum.
    LevelUp,
    /// Lower the level by one, never below 1.
    LevelDown,
    /// Switch the modifier on or off, or toggle it when no state is given.
    Modifier {
        #[arg(value_enum)]
        state: Option<Switch>,
    },
    /// Set a category count. Input is clamped to the category cap.
    Set {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=3))]
        entity: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=8))]
        category: u32,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Add one to a category count.
    Inc {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=3))]
        entity: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=8))]
        category: u32,
    },
    /// Remove one from a category count.
    Dec {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=3))]
        entity: u32,
        #[arg(value_parser = clap::value_parser!(u32).range(1..=8))]
        category: u32,
    },
    /// Reset one entity to all zeros.
    Reset {
        #[arg(value_parser = clap::value_parser!(u32).range(1..=3))]
        entity: u32,
    },
    /// Reset every entity, keeping level and modifier.
    ResetAll,
    /// Print the whole state as a single-line transfer string.
    Export,
    /// Replace the whole state with a transfer string produced by `export`.
    Import { transfer: String },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Switch {
    On,
    Off,
}

/// Entry point for the Deck Tally command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = TallyConfig::load(cli.config.as_deref());

    let store_dir = cli
        .store_dir
        .or_else(|| config.storage_dir())
        .context("could not determine a storage directory; pass --store-dir")?;
    let codec = PersistenceCodec::new(config.schema_policy());
    let mut session = Session::open(FileStore::new(store_dir), codec, config.storage.key.clone());

    let command = match cli.command.unwrap_or(TallyCommand::Show) {
        TallyCommand::Show => None,
        TallyCommand::Categories => {
            println!("{}", render::render_categories());
            return Ok(());
        }
        TallyCommand::Export => {
            println!("{}", encode_transfer(session.codec(), &session.snapshot()));
            return Ok(());
        }
        TallyCommand::Import { transfer } => {
            let state = decode_transfer(session.codec(), &transfer)
                .context("could not import transfer string")?;
            Some(Command::RestoreState { state })
        }
        TallyCommand::Level { level } => Some(Command::SetLevel {
            level: parse_count_input(&level),
        }),
        TallyCommand::LevelUp => {
            let level = query::level(session.tally()).stepped_up(config.level_max());
            Some(Command::SetLevel {
                level: i64::from(level.get()),
            })
        }
        TallyCommand::LevelDown => {
            let level = query::level(session.tally()).stepped_down();
            Some(Command::SetLevel {
                level: i64::from(level.get()),
            })
        }
        TallyCommand::Modifier { state } => Some(match state {
            Some(Switch::On) => Command::SetModifier { active: true },
            Some(Switch::Off) => Command::SetModifier { active: false },
            None => Command::ToggleModifier,
        }),
        TallyCommand::Set {
            entity,
            category,
            value,
        } => Some(Command::SetCount {
            entity: entity_arg(entity)?,
            category: category_arg(category)?,
            value: parse_count_input(&value),
        }),
        TallyCommand::Inc { entity, category } => Some(Command::IncrementCount {
            entity: entity_arg(entity)?,
            category: category_arg(category)?,
        }),
        TallyCommand::Dec { entity, category } => Some(Command::DecrementCount {
            entity: entity_arg(entity)?,
            category: category_arg(category)?,
        }),
        TallyCommand::Reset { entity } => Some(Command::ResetEntity {
            entity: entity_arg(entity)?,
        }),
        TallyCommand::ResetAll => Some(Command::ResetAll),
    };

    if let Some(command) = command {
        let mut events = Vec::new();
        session.apply(command, &mut events);
        for event in &events {
            tracing::debug!(?event, "tally updated");
        }
    }

    println!(
        "{}",
        render::render_overview(&session.snapshot(), &ScoreEngine::new())
    );
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
}

fn entity_arg(ordinal: u32) -> Result<EntityId> {
    EntityId::from_ordinal(ordinal).ok_or_else(|| anyhow!("entity must be between 1 and 3"))
}

fn category_arg(ordinal: u32) -> Result<CategoryId> {
    usize::try_from(ordinal)
        .ok()
        .and_then(|ordinal| ordinal.checked_sub(1))
        .and_then(CategoryId::new)
        .ok_or_else(|| anyhow!("category must be between 1 and {CATEGORY_COUNT}"))
}
