//! Swift CLI entry point.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use eyre::{eyre, Result, WrapErr};
use swift_metrics::LogArgs;
use swift_swarm::{Origin, SwarmManager, SwarmManagerConfig};
use swift_transfer::Direction;

use crate::uri;

/// Seed, leech, and inspect swift swarms from the command line.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct SwiftCli {
    #[command(flatten)]
    pub logs: LogArgs,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Hash a local file and register it as a swarm, printing its tswift:// URI.
    Seed {
        file: PathBuf,
        #[arg(long, default_value_t = swift_static_tree::DEFAULT_CHUNK_SIZE)]
        chunk_size: u32,
    },
    /// Register a swarm expected to be filled in by peers under a known id.
    Leech {
        uri: String,
        file: PathBuf,
    },
    /// Print size/completeness for an already-registered swarm.
    Info { uri: String, file: PathBuf },
    /// Force a checkpoint write for a swarm without deactivating it.
    Checkpoint { uri: String, file: PathBuf },
    /// How many contiguous bytes are available from the start.
    SeqComplete { uri: String, file: PathBuf },
    /// Cap a swarm's transfer speed in one direction.
    SetMaxSpeed {
        uri: String,
        file: PathBuf,
        #[arg(value_enum)]
        direction: CliDirection,
        bytes_per_sec: Option<f64>,
    },
    /// Stop tracking a swarm, optionally deleting its on-disk state.
    Close {
        uri: String,
        file: PathBuf,
        #[arg(long)]
        remove_content: bool,
    },
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliDirection {
    Download,
    Upload,
}

impl From<CliDirection> for Direction {
    fn from(d: CliDirection) -> Self {
        match d {
            CliDirection::Download => Direction::Download,
            CliDirection::Upload => Direction::Upload,
        }
    }
}

pub fn run(cli: SwiftCli) -> Result<()> {
    swift_metrics::init_logging(&cli.logs)?;

    let mut manager = SwarmManager::new(SwarmManagerConfig::default());

    match cli.command {
        Command::Seed { file, chunk_size } => {
            let id = manager
                .add_swarm(&file, Origin::Seed, None, chunk_size, true)
                .wrap_err("failed to seed swarm")?;
            let root_hash = manager
                .find_swarm(id)
                .ok_or_else(|| eyre!("swarm vanished immediately after being added"))?
                .root_hash();
            tracing::info!(root_hash = %root_hash, file = %file.display(), "swarm seeded");
            println!("{}", uri::format(None, root_hash, chunk_size, swift_static_tree::DEFAULT_CHUNK_SIZE));
            manager.shutdown();
        }
        Command::Leech { uri, file } => {
            let parsed = uri::parse(&uri).wrap_err("invalid tswift:// uri")?;
            let chunk_size = parsed.chunk_size.unwrap_or(swift_static_tree::DEFAULT_CHUNK_SIZE);
            manager
                .add_swarm(&file, Origin::Leech(parsed.root_hash), None, chunk_size, true)
                .wrap_err("failed to register leech swarm")?;
            tracing::info!(root_hash = %parsed.root_hash, file = %file.display(), "swarm registered for leeching");
            manager.shutdown();
        }
        Command::Info { uri, file } => {
            let parsed = uri::parse(&uri).wrap_err("invalid tswift:// uri")?;
            let chunk_size = parsed.chunk_size.unwrap_or(swift_static_tree::DEFAULT_CHUNK_SIZE);
            manager.add_swarm(&file, Origin::Leech(parsed.root_hash), None, chunk_size, false)?;
            println!("size: {:?}", manager.size(parsed.root_hash)?);
            println!("chunks complete: {}", manager.chunks_complete(parsed.root_hash)?);
            println!("complete: {}", manager.is_complete(parsed.root_hash)?);
        }
        Command::Checkpoint { uri, file } => {
            let parsed = uri::parse(&uri).wrap_err("invalid tswift:// uri")?;
            let chunk_size = parsed.chunk_size.unwrap_or(swift_static_tree::DEFAULT_CHUNK_SIZE);
            manager.add_swarm(&file, Origin::Leech(parsed.root_hash), None, chunk_size, true)?;
            manager.checkpoint(parsed.root_hash)?;
            manager.shutdown();
        }
        Command::SeqComplete { uri, file } => {
            let parsed = uri::parse(&uri).wrap_err("invalid tswift:// uri")?;
            let chunk_size = parsed.chunk_size.unwrap_or(swift_static_tree::DEFAULT_CHUNK_SIZE);
            manager.add_swarm(&file, Origin::Leech(parsed.root_hash), None, chunk_size, false)?;
            println!("{}", manager.seq_complete(parsed.root_hash, 0)?);
        }
        Command::SetMaxSpeed {
            uri,
            file,
            direction,
            bytes_per_sec,
        } => {
            let parsed = uri::parse(&uri).wrap_err("invalid tswift:// uri")?;
            let chunk_size = parsed.chunk_size.unwrap_or(swift_static_tree::DEFAULT_CHUNK_SIZE);
            manager.add_swarm(&file, Origin::Leech(parsed.root_hash), None, chunk_size, true)?;
            manager.set_max_speed(parsed.root_hash, direction.into(), bytes_per_sec)?;
            manager.shutdown();
        }
        Command::Close { uri, file, remove_content } => {
            let parsed = uri::parse(&uri).wrap_err("invalid tswift:// uri")?;
            let chunk_size = parsed.chunk_size.unwrap_or(swift_static_tree::DEFAULT_CHUNK_SIZE);
            manager.add_swarm(&file, Origin::Leech(parsed.root_hash), None, chunk_size, false)?;
            manager.force_remove_swarm(parsed.root_hash, true, remove_content)?;
        }
    }

    Ok(())
}
