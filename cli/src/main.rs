// labichat-cli — local chat log from the terminal
//
// Reads and writes the same room collection the browser client keeps in
// localStorage, backed by sled on the desktop.

mod config;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use labichat_core::{BlobStore, ContentHash, LabiError, MemoryBlobStore, Message, SledStorage, ThreadStore};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "labichat")]
#[command(about = "Labi Chat — local two-party chat log", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store a message from one address to another
    Send {
        from: String,
        to: String,
        /// Message text (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        message: Vec<String>,
        #[arg(short, long)]
        signature: Option<String>,
    },
    /// Show the conversation between two addresses
    History { user1: String, user2: String },
    /// List rooms an address takes part in
    Rooms { address: String },
    /// Conversations of an address, most recent first
    Recent { address: String },
    /// Delete every stored conversation
    Clear {
        /// Confirm deletion
        #[arg(long)]
        yes: bool,
    },
    /// Check that the stored data is readable
    Verify,
    /// Print the gateway link of a profile or avatar content hash
    Link { hash: String },
    /// Configure settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: String, value: String },
    Get { key: String },
    List,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = config::Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .init();

    match cli.command {
        Commands::Send {
            from,
            to,
            message,
            signature,
        } => cmd_send(&config, from, to, message.join(" "), signature),
        Commands::History { user1, user2 } => cmd_history(&config, &user1, &user2),
        Commands::Rooms { address } => cmd_rooms(&config, &address),
        Commands::Recent { address } => cmd_recent(&config, &address),
        Commands::Clear { yes } => cmd_clear(&config, yes),
        Commands::Verify => cmd_verify(&config),
        Commands::Link { hash } => cmd_link(&config, &hash),
        Commands::Config { action } => cmd_config(config, action),
    }
}

fn open_store(config: &config::Config) -> Result<ThreadStore> {
    let path = config.chat_db_path()?;
    let path = path
        .to_str()
        .context("Chat database path is not valid UTF-8")?;
    tracing::debug!("Opening chat database at {}", path);
    let storage = SledStorage::new(path)
        .map_err(anyhow::Error::msg)
        .context("Failed to open chat database")?;

    Ok(ThreadStore::with_slot(
        Arc::new(storage),
        config.storage_key.clone(),
    ))
}

fn cmd_send(
    config: &config::Config,
    from: String,
    to: String,
    text: String,
    signature: Option<String>,
) -> Result<()> {
    let threads = open_store(config)?;

    let mut message =
        Message::compose(from, to, &text).context("Message must not be empty")?;
    if let Some(signature) = signature {
        message = message.with_signature(signature);
    }

    let id = message.id.clone();
    let recipient = message.to.clone();
    threads
        .add_message(message)
        .context("Failed to store message")?;
    threads.flush().context("Failed to flush chat database")?;

    println!("{} Message stored for {}", "✓".green(), recipient.bright_cyan());
    println!("  ID: {}", id.dimmed());
    Ok(())
}

fn cmd_history(config: &config::Config, user1: &str, user2: &str) -> Result<()> {
    let threads = open_store(config)?;
    let messages = threads.get_messages(user1, user2);

    if messages.is_empty() {
        println!("{}", "No messages found.".dimmed());
        return Ok(());
    }

    println!(
        "{} {} ↔ {} ({} messages)",
        "Conversation".bold(),
        user1.bright_cyan(),
        user2.bright_cyan(),
        messages.len()
    );
    println!();

    for msg in messages {
        let direction = if msg.from == user1 {
            "→".bright_green()
        } else {
            "←".bright_blue()
        };

        println!(
            "{} {} [{}]",
            direction,
            msg.from.bright_cyan(),
            format_timestamp(msg.timestamp).dimmed()
        );
        println!("   {}", msg.content);
        if let Some(signature) = msg.signature {
            println!("   {} {}", "sig".dimmed(), signature.dimmed());
        }
        println!();
    }

    Ok(())
}

fn cmd_rooms(config: &config::Config, address: &str) -> Result<()> {
    let threads = open_store(config)?;
    let rooms = threads.get_chat_rooms(address);

    if rooms.is_empty() {
        println!("{}", "No conversations yet.".dimmed());
        return Ok(());
    }

    println!("{} ({} total)", "Rooms".bold(), rooms.len());
    println!();

    for room in rooms {
        println!(
            "  {} {} ↔ {}",
            "•".bright_green(),
            room.participants[0].bright_cyan(),
            room.participants[1].bright_cyan()
        );
        println!(
            "    {} messages, last activity {}",
            room.messages.len(),
            format_timestamp(room.last_activity).dimmed()
        );
    }

    Ok(())
}

fn cmd_recent(config: &config::Config, address: &str) -> Result<()> {
    let threads = open_store(config)?;
    let chats = threads.get_recent_chats(address);

    if chats.is_empty() {
        println!("{}", "No conversations yet.".dimmed());
        return Ok(());
    }

    println!("{}", "Recent Chats".bold());
    println!();

    for chat in chats {
        println!(
            "  {} {} [{}]",
            "•".bright_green(),
            chat.other_user.bright_cyan(),
            format_timestamp(chat.last_message.timestamp).dimmed()
        );
        println!("    {}", preview(&chat.last_message.content, 60));
    }

    Ok(())
}

fn cmd_clear(config: &config::Config, yes: bool) -> Result<()> {
    if !yes {
        println!(
            "{} This deletes every conversation. Re-run with {} to confirm.",
            "!".bright_red().bold(),
            "--yes".bright_green()
        );
        return Ok(());
    }

    let threads = open_store(config)?;
    threads
        .clear_all_chats()
        .context("Failed to clear chat database")?;
    threads.flush().context("Failed to flush chat database")?;

    println!("{} All conversations deleted", "✓".green());
    Ok(())
}

fn cmd_verify(config: &config::Config) -> Result<()> {
    let threads = open_store(config)?;

    match threads.verify() {
        Ok(stats) => {
            println!("{} Chat data is readable", "✓".green());
            println!("  Rooms:    {}", stats.rooms);
            println!("  Messages: {}", stats.messages);
            Ok(())
        }
        Err(LabiError::CorruptedStore) => {
            println!(
                "{} Slot {} cannot be parsed; the next send will replace it.",
                "✗".bright_red(),
                threads.slot().bright_yellow()
            );
            anyhow::bail!("chat data is corrupted")
        }
        Err(e) => Err(e).context("Failed to read chat database"),
    }
}

fn gateway_link(config: &config::Config, hash: &str) -> Result<String> {
    let hash = ContentHash::parse(hash).context("Not a content hash")?;
    Ok(MemoryBlobStore::new(&config.gateway_url).gateway_url(&hash))
}

fn cmd_link(config: &config::Config, hash: &str) -> Result<()> {
    println!("{}", gateway_link(config, hash)?.bright_cyan());
    Ok(())
}

fn cmd_config(mut config: config::Config, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            println!("{} Set {} = {}", "✓".green(), key.bright_cyan(), value);
        }

        ConfigAction::Get { key } => {
            if let Some(value) = config.get(&key) {
                println!("{} = {}", key.bright_cyan(), value);
            } else {
                anyhow::bail!("Unknown or unset config key: {}", key);
            }
        }

        ConfigAction::List => {
            println!("{}", "Configuration".bold());
            println!();

            for (key, value) in config.list() {
                println!("  {:<20} {}", key.bright_cyan(), value);
            }
        }
    }

    Ok(())
}

fn format_timestamp(timestamp_ms: u64) -> String {
    use chrono::{DateTime, Local};

    match i64::try_from(timestamp_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
    {
        Some(dt) => DateTime::<Local>::from(dt)
            .format("%Y-%m-%d %H:%M:%S")
            .to_string(),
        None => format!("invalid time ({})", timestamp_ms),
    }
}

/// First `max` characters of `text` on one line
fn preview(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max || line.len() < text.len() {
        let cut: String = line.chars().take(max).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}
