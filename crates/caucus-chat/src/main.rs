//! Multi-peer conversation simulator
//!
//! Starts several peers on replicas of one in-memory shared map, has them
//! post, edit and retract messages, then checks that every peer ends up with
//! the same ordered conversation.

use anyhow::{bail, Context, Result};
use caucus_chat::{chat_registry, Conversation, Message, Persona};
use caucus_core::{Caucus, CaucusConfig, InMemorySharedMap, MemberNotification, SharedMap, MEMBER_ADDED};
use caucus_notify::Interest;
use chrono::{Duration as ChronoDuration, Utc};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "caucus-sim", version, about = "Simulate peers sharing one conversation")]
struct Args {
    /// Number of peers
    #[arg(long, default_value_t = 3)]
    peers: usize,

    /// Messages posted per peer
    #[arg(long, default_value_t = 10)]
    messages: usize,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,

    /// Caucus configuration file (TOML)
    #[arg(long)]
    config: Option<PathBuf>,
}

struct Peer {
    persona: Persona,
    conversation: Conversation,
    added: Arc<AtomicUsize>,
}

fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    match format {
        LogFormat::Pretty => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<CaucusConfig> {
    let Some(path) = path else {
        return Ok(CaucusConfig::default());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    CaucusConfig::from_toml_str(&text).with_context(|| format!("parsing config {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_format);
    let config = load_config(args.config.as_ref())?;
    if args.peers == 0 {
        bail!("at least one peer is required");
    }

    let registry = chat_registry()?;
    let messages = InMemorySharedMap::new();
    let personas = InMemorySharedMap::new();
    let roster: Caucus<Persona> = Caucus::new(
        Arc::new(personas.replica()),
        Arc::clone(&registry),
        None,
        config.clone(),
    );

    let mut peers = Vec::with_capacity(args.peers);
    for index in 0..args.peers {
        let persona = if index == 0 {
            Persona::bot("moderator").with_icon("robot.png")
        } else {
            Persona::human(format!("peer-{index}"))
        };
        roster.add(&persona.name, &persona)?;

        let map: Arc<dyn SharedMap> = Arc::new(messages.replica());
        let conversation = Conversation::new(map, Arc::clone(&registry), config.clone());
        conversation.caucus().schedule_kick()?;

        let added = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&added);
        conversation.caucus().observe(
            MEMBER_ADDED,
            Arc::new(move |_: &Interest, _: &MemberNotification| {
                counter.fetch_add(1, Ordering::Relaxed);
            }),
        );
        peers.push(Peer {
            persona,
            conversation,
            added,
        });
    }
    tracing::info!(peers = peers.len(), roster = roster.len(), "peers connected");

    // Peers take turns; send times interleave so every peer's posts mix in the final order
    let start = Utc::now();
    let mut posted = Vec::new();
    for round in 0..args.messages {
        for (index, peer) in peers.iter().enumerate() {
            let offset = i64::try_from(round * peers.len() + index).unwrap_or(i64::MAX);
            let message = Message::new(
                peer.persona.name.clone(),
                format!("message {round} from {}", peer.persona.name),
                start + ChronoDuration::milliseconds(offset),
            );
            peer.conversation.post(&message)?;
            posted.push(message);
        }
    }

    // Last peer edits the first message, first peer retracts the last one
    if let (Some(first), Some(last)) = (posted.first(), posted.last()) {
        if let Some(editor) = peers.last() {
            editor.conversation.edit(&first.edit(format!("{} (edited)", first.text())))?;
        }
        if let Some(moderator) = peers.first() {
            moderator.conversation.retract(last.id())?;
        }
    }

    tokio::time::sleep(config.kick_delay() + Duration::from_millis(50)).await;

    let mut reference: Option<Vec<Message>> = None;
    for peer in &peers {
        let current = peer.conversation.messages()?;
        println!(
            "== {} ({} messages, {} added notifications)",
            peer.persona.name,
            current.len(),
            peer.added.load(Ordering::Relaxed)
        );
        for message in &current {
            let marker = if message.is_edited() { " *" } else { "" };
            println!(
                "  [{}] {}: {}{marker}",
                message.sent_at().format("%H:%M:%S%.3f"),
                message.author(),
                message.text()
            );
        }

        match &reference {
            None => reference = Some(current),
            Some(expected) if *expected != current => {
                bail!("peer {} diverged from peer {}", peer.persona.name, peers[0].persona.name);
            }
            Some(_) => {}
        }
    }

    for peer in &peers {
        peer.conversation.caucus().disconnect();
    }
    roster.disconnect();
    tracing::info!(posted = posted.len(), "all peers converged");
    Ok(())
}
