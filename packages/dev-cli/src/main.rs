//! `chatcap`: exercise the capture pipeline from the command line.
//!
//! Works against a JSON archive file (the same envelope format the
//! library exports), so saved pages can be extracted, merged, listed,
//! and re-exported without a browser in the loop.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use capture::{
    capture_pass, detect_platform, export_conversations, import_conversations, persist_conversation,
    Conversation, ConversationFilter, ConversationStore, MemoryStore, Platform,
};

#[derive(Parser)]
#[command(name = "chatcap", version, about = "Chat transcript capture toolbox")]
struct Cli {
    /// Archive file the commands read and write
    #[arg(long, global = true, default_value = "chatcap-archive.json")]
    archive: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an extraction pass over a saved page
    Extract {
        /// Serialized page markup
        file: PathBuf,

        /// Page URL, used for platform detection and archive merging
        #[arg(long)]
        url: String,

        /// Print the captured conversation as JSON
        #[arg(long)]
        json: bool,

        /// Merge the capture into the archive
        #[arg(long)]
        save: bool,
    },

    /// List archived conversations
    List {
        /// Only this platform (chatgpt, claude, gemini, poe, perplexity)
        #[arg(long)]
        source: Option<Platform>,

        /// Only conversations on or after this day (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,

        /// Only conversations on or before this day (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,

        /// Only conversations whose content or URL contains this text
        #[arg(long)]
        search: Option<String>,
    },

    /// Write the archive out as an export document
    Export {
        #[arg(long, default_value = "chatcap-export.json")]
        out: PathBuf,
    },

    /// Merge an export document into the archive
    Import {
        /// Export document to merge
        file: PathBuf,
    },

    /// Delete every archived conversation
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Extract { file, url, json, save } => extract(&cli.archive, &file, &url, json, save).await,
        Command::List { source, from, to, search } => list(&cli.archive, source, from, to, search).await,
        Command::Export { out } => export(&cli.archive, &out).await,
        Command::Import { file } => import(&cli.archive, &file).await,
        Command::Clear => clear(&cli.archive).await,
    }
}

async fn extract(archive: &Path, file: &Path, url: &str, json: bool, save: bool) -> Result<()> {
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("reading page markup from {}", file.display()))?;
    let Some(platform) = detect_platform(url) else {
        bail!("no supported platform matches url {url}");
    };

    let mut conversation = Conversation::shell(platform, url);
    let count = capture_pass(platform, &html, &mut conversation);
    if count == 0 {
        println!("no messages extracted from {}", file.display());
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&conversation)?);
    } else {
        println!("{platform}: {count} turns from {url}");
        for utterance in &conversation.interactions {
            let preview: String = utterance.content.chars().take(70).collect();
            println!("  [{}] {preview}", utterance.actor);
        }
    }

    if save {
        let store = load_archive(archive).await?;
        let id = persist_conversation(&store, &conversation).await?;
        write_archive(archive, &store).await?;
        println!("saved as {id}");
    }
    Ok(())
}

async fn list(
    archive: &Path,
    source: Option<Platform>,
    from: Option<String>,
    to: Option<String>,
    search: Option<String>,
) -> Result<()> {
    let mut filter = ConversationFilter::new();
    if let Some(platform) = source {
        filter = ConversationFilter::for_source(platform);
    }
    if let Some(day) = from {
        filter = filter.with_from_date(parse_day(&day)?);
    }
    if let Some(day) = to {
        filter = filter.with_to_date(end_of_day(&day)?);
    }
    if let Some(text) = search {
        filter = filter.with_search(text);
    }

    let store = load_archive(archive).await?;
    let conversations = store.list(Some(&filter)).await?;
    for c in &conversations {
        println!(
            "{}  {:<10}  {:>3} turns  {}",
            c.timestamp.format("%Y-%m-%d %H:%M"),
            c.source_chatbot.to_string(),
            c.interactions.len(),
            c.conversation_url
        );
    }
    println!("{} conversation(s)", conversations.len());
    Ok(())
}

async fn export(archive: &Path, out: &Path) -> Result<()> {
    let store = load_archive(archive).await?;
    let conversations = store.list(None).await?;
    let json = export_conversations(&conversations)?;
    std::fs::write(out, json).with_context(|| format!("writing {}", out.display()))?;
    println!("exported {} conversation(s) to {}", conversations.len(), out.display());
    Ok(())
}

async fn import(archive: &Path, file: &Path) -> Result<()> {
    let json = std::fs::read_to_string(file)
        .with_context(|| format!("reading export from {}", file.display()))?;
    let incoming = import_conversations(&json)?;

    let store = load_archive(archive).await?;
    for conversation in &incoming {
        persist_conversation(&store, conversation).await?;
    }
    write_archive(archive, &store).await?;
    println!("merged {} conversation(s) into {}", incoming.len(), archive.display());
    Ok(())
}

async fn clear(archive: &Path) -> Result<()> {
    let store = MemoryStore::new();
    write_archive(archive, &store).await?;
    println!("archive cleared");
    Ok(())
}

/// Load the archive file into a fresh in-memory store. A missing file is
/// an empty archive.
async fn load_archive(path: &Path) -> Result<MemoryStore> {
    let store = MemoryStore::new();
    if !path.exists() {
        debug!(path = %path.display(), "archive does not exist yet");
        return Ok(store);
    }
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading archive {}", path.display()))?;
    for conversation in import_conversations(&json)? {
        store.save(&conversation).await?;
    }
    Ok(store)
}

async fn write_archive(path: &Path, store: &MemoryStore) -> Result<()> {
    let json = export_conversations(&store.list(None).await?)?;
    std::fs::write(path, json).with_context(|| format!("writing archive {}", path.display()))
}

fn parse_day(day: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {day}"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc())
        .context("date out of range")
}

fn end_of_day(day: &str) -> Result<DateTime<Utc>> {
    let date = NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .with_context(|| format!("invalid date (expected YYYY-MM-DD): {day}"))?;
    date.and_hms_opt(23, 59, 59)
        .map(|dt| dt.and_utc())
        .context("date out of range")
}

#[cfg(test)]
mod tests {
    use super::*;
    use capture::{Actor, Utterance};

    #[test]
    fn test_day_parsing_bounds() {
        let start = parse_day("2025-03-14").unwrap();
        let end = end_of_day("2025-03-14").unwrap();
        assert_eq!(start.format("%H:%M:%S").to_string(), "00:00:00");
        assert_eq!(end.format("%H:%M:%S").to_string(), "23:59:59");
        assert!(parse_day("14-03-2025").is_err());
        assert!(parse_day("not a date").is_err());
    }

    #[tokio::test]
    async fn test_archive_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.json");

        // A missing file is an empty archive.
        let store = load_archive(&path).await.unwrap();
        assert_eq!(store.count().await.unwrap(), 0);

        let mut conversation =
            Conversation::shell(Platform::Poe, "https://poe.com/chat/archive-test");
        conversation
            .interactions
            .push(Utterance::new(Actor::User, "keep this across runs"));
        store.save(&conversation).await.unwrap();
        write_archive(&path, &store).await.unwrap();

        let reloaded = load_archive(&path).await.unwrap();
        assert_eq!(reloaded.count().await.unwrap(), 1);
        let stored = reloaded
            .find_by_url("https://poe.com/chat/archive-test")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.interactions[0].content, "keep this across runs");
    }

    #[tokio::test]
    async fn test_clear_truncates_the_archive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("archive.json");

        let store = MemoryStore::new();
        store
            .save(&Conversation::shell(Platform::Claude, "https://claude.ai/chat/x"))
            .await
            .unwrap();
        write_archive(&path, &store).await.unwrap();

        clear(&path).await.unwrap();
        let reloaded = load_archive(&path).await.unwrap();
        assert_eq!(reloaded.count().await.unwrap(), 0);
    }
}
