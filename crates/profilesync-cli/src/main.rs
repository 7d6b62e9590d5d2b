//! Profilesync CLI
//!
//! Thin wrapper around profilesync-core for inspecting the local profile
//! record and exercising the sync protocol in-process.
//!
//! ## Usage
//!
//! ```bash
//! # Show the local profile info
//! profilesync show
//!
//! # Store new local profile info
//! profilesync set --version 3 --payload "loadout=smg"
//! profilesync set --version 4 --payload-hex 0a1b2c
//!
//! # Run a hosted session with three joiners
//! profilesync simulate --peers 3
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use profilesync_core::logging::LoggingBuilder;
use profilesync_core::{
    ConnectedPeer, FsStorage, HostServices, InvalidationCounter, LocalProfileStore, MemoryStorage,
    MemoryTransport, PeerAddress, ProfileInfo, ProfileInfoMessage, ProfileSyncComponent,
    ProfileSyncConfig, SessionFlags, StaticIdentity, TokioScheduler, UserId,
};

/// Identity of the hosting process in `simulate`
const SIMULATED_HOST_ID: UserId = UserId::new(1);
/// First identity handed to simulated joiners
const FIRST_PEER_ID: u64 = 100;
const FIRST_PEER_PORT: u16 = 28961;

/// Profilesync - profile info sync for multiplayer sessions
#[derive(Parser)]
#[command(name = "profilesync")]
#[command(version = "0.1.0")]
#[command(about = "Profilesync - profile info sync for multiplayer sessions")]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Data directory (default: ~/.profilesync)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// JSON config file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Also write JSONL logs under this directory
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the local profile info
    Show,

    /// Store the local profile info
    Set {
        /// Profile info version
        #[arg(long, allow_negative_numbers = true)]
        version: i32,

        /// Payload as text
        #[arg(long, conflicts_with = "payload_hex", required_unless_present = "payload_hex")]
        payload: Option<String>,

        /// Payload as hex
        #[arg(long)]
        payload_hex: Option<String>,
    },

    /// Run a hosted session in-process and show what each joiner receives
    Simulate {
        /// Number of participants joining the session
        #[arg(short, long, default_value = "3", value_parser = clap::value_parser!(u16).range(0..=1000))]
        peers: u16,
    },
}

fn setup_logging(verbosity: u8, log_dir: Option<PathBuf>, participant: &str) -> Result<()> {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    let mut builder = LoggingBuilder::new(filter).with_participant(participant);
    if let Some(dir) = log_dir {
        builder = builder.with_logs_dir(dir);
    }
    builder.init().context("Failed to set up logging")
}

/// Get the default data directory (~/.profilesync)
fn default_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".profilesync")
}

fn load_config(path: Option<&PathBuf>) -> Result<ProfileSyncConfig> {
    match path {
        Some(path) => ProfileSyncConfig::load(path)
            .with_context(|| format!("Failed to load config '{}'", path.display())),
        None => Ok(ProfileSyncConfig::default()),
    }
}

fn parse_payload(payload: Option<String>, payload_hex: Option<String>) -> Result<Vec<u8>> {
    match (payload, payload_hex) {
        (Some(text), None) => Ok(text.into_bytes()),
        (None, Some(hex_str)) => hex::decode(hex_str.trim())
            .map_err(|e| anyhow::anyhow!("Invalid hex payload '{}': {}", hex_str, e)),
        _ => anyhow::bail!("Exactly one of --payload or --payload-hex is required"),
    }
}

fn print_local(info: &ProfileInfo) {
    println!("Local profile info:");
    println!("  Version: {}", info.version);
    println!("  Payload: {} bytes", info.payload.len());
    println!("  Hex: {}", hex::encode(&info.payload));
}

async fn simulate(config: &ProfileSyncConfig, peers: u16) -> Result<()> {
    let transport = Arc::new(MemoryTransport::new());
    let cache = Arc::new(InvalidationCounter::new());

    let services = HostServices {
        identity: Arc::new(StaticIdentity(SIMULATED_HOST_ID)),
        role: Arc::new(SessionFlags::hosting()),
        transport: transport.clone(),
        scheduler: Arc::new(TokioScheduler::current()?),
        storage: Arc::new(MemoryStorage::new()),
        cache: cache.clone(),
    };
    let profiles = ProfileSyncComponent::start(services, config)?;

    println!("Hosting session as {}", SIMULATED_HOST_ID);
    println!();

    let mut joined = Vec::new();
    for n in 0..peers {
        let user_id = UserId(FIRST_PEER_ID + u64::from(n));
        let address = PeerAddress::new(SocketAddr::from(([127, 0, 0, 1], FIRST_PEER_PORT + n)));
        let info = ProfileInfo::new(1, format!("profile-{}", user_id));

        transport.take_sent();
        transport.connect(ConnectedPeer::new(address, user_id));
        profiles.add_and_distribute_profile_info(&address, user_id, info);

        println!("Peer {} joined from {}", user_id, address);
        for sent in transport.sent_to(&address) {
            let msg = ProfileInfoMessage::decode(&sent.data)?;
            println!(
                "  received {} (version {}, {} bytes)",
                msg.user_id,
                msg.info.version,
                msg.info.payload.len()
            );
        }
        let relayed = transport
            .sent()
            .iter()
            .filter(|sent| sent.to != address)
            .count();
        println!("  relayed to {} other peer(s)", relayed);

        joined.push(user_id);
    }

    let mut entries = profiles.registry().snapshot();
    entries.sort_by_key(|(user_id, _)| *user_id);

    println!();
    println!("Registry ({} entries):", entries.len());
    for (user_id, info) in &entries {
        println!(
            "  {}: version {}, {} bytes",
            user_id,
            info.version,
            info.payload.len()
        );
    }

    if let Some(first) = joined.first() {
        transport.disconnect(*first);
        let removed = profiles.sweep_now();
        println!();
        println!("Peer {} left; sweep removed {} entry(s)", first, removed);
    }

    println!("Cache refreshes: {}", cache.count());
    profiles.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let participant = match cli.command {
        Commands::Simulate { .. } => SIMULATED_HOST_ID.to_string(),
        _ => "local".to_string(),
    };
    setup_logging(cli.verbose, cli.log_dir.clone(), &participant)?;

    let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
    let config = load_config(cli.config.as_ref())?;
    tracing::debug!(data_dir = %data_dir.display(), "Using data directory");

    match cli.command {
        Commands::Show => {
            let store = LocalProfileStore::new(
                Arc::new(FsStorage::new(data_dir.clone())),
                config.profile_path.clone(),
            );
            match store.load() {
                Some(info) => print_local(&info),
                None => println!("No local profile info"),
            }
        }

        Commands::Set {
            version,
            payload,
            payload_hex,
        } => {
            let payload = parse_payload(payload, payload_hex)?;
            let info = ProfileInfo::new(version, payload);

            let store = LocalProfileStore::new(
                Arc::new(FsStorage::new(data_dir.clone())),
                config.profile_path.clone(),
            );
            store
                .save(&info)
                .with_context(|| format!("Failed to write {}", store.path().display()))?;

            println!(
                "Saved local profile info (version {}, {} bytes)",
                info.version,
                info.payload.len()
            );
        }

        Commands::Simulate { peers } => simulate(&config, peers).await?,
    }

    Ok(())
}
