//! Jot CLI - Offline-first notes from the command line
//!
//! Every command works without connectivity; edits made while the
//! remote API is unreachable are queued and replayed by `jot sync`.

use std::env;
use std::io;
use std::path::PathBuf;

use chrono::{TimeZone, Utc};
use clap::{Parser, Subcommand};
use serde::Serialize;
use thiserror::Error;

use jot_core::remote::{HttpRemoteStore, RemoteError, RemoteResult, RemoteStore};
use jot_core::{Note, NoteId, NotePatch, NotesService};

#[derive(Parser)]
#[command(name = "jot")]
#[command(about = "Offline-first notes from the command line")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Optional path to local database file
    #[arg(long, value_name = "PATH")]
    db_path: Option<PathBuf>,

    /// Owner id for note operations (falls back to JOT_OWNER, then "local")
    #[arg(long, value_name = "OWNER")]
    owner: Option<String>,

    /// Quick capture: jot "my note here"
    #[arg(trailing_var_arg = true)]
    note: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new note
    #[command(alias = "new")]
    Add {
        /// Note content
        content: Vec<String>,
        /// Note title (defaults to "Untitled")
        #[arg(short, long)]
        title: Option<String>,
    },
    /// List notes, newest first
    List {
        /// Number of notes to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Update an existing note
    Update {
        /// Note ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New content (tags are re-derived from it)
        #[arg(long)]
        content: Option<String>,
        /// Pin or unpin
        #[arg(long)]
        pinned: Option<bool>,
        /// Archive or unarchive
        #[arg(long)]
        archived: Option<bool>,
    },
    /// Soft-delete a note
    Delete {
        /// Note ID
        id: String,
    },
    /// Replay queued offline edits against the remote store
    Sync,
    /// Show pending sync state
    Status,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Core(#[from] jot_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No note content provided")]
    EmptyContent,
    #[error("Nothing to update - pass at least one of --title/--content/--pinned/--archived")]
    EmptyUpdate,
    #[error("Invalid note ID: {0}")]
    InvalidNoteId(String),
    #[error("Note not found: {0}")]
    NoteNotFound(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error(
        "Remote sync is not configured. Set JOT_REMOTE_URL and JOT_REMOTE_TOKEN to enable `jot sync`."
    )]
    SyncNotConfigured,
}

/// Remote client resolved from the environment.
///
/// When the remote env vars are unset every remote call reports
/// unavailable, so the facade runs on its offline path throughout.
enum CliRemote {
    Http(HttpRemoteStore),
    Unconfigured,
}

impl CliRemote {
    fn from_env() -> Result<Self, CliError> {
        match (env::var("JOT_REMOTE_URL"), env::var("JOT_REMOTE_TOKEN")) {
            (Ok(url), Ok(token)) => {
                let client = HttpRemoteStore::new(url, token)
                    .map_err(|error| CliError::Config(error.to_string()))?;
                Ok(Self::Http(client))
            }
            _ => Ok(Self::Unconfigured),
        }
    }

    const fn is_configured(&self) -> bool {
        matches!(self, Self::Http(_))
    }

    fn unavailable() -> RemoteError {
        RemoteError::InvalidConfiguration("remote sync is not configured".to_string())
    }
}

impl RemoteStore for CliRemote {
    async fn create_note(&self, note: &Note) -> RemoteResult<Note> {
        match self {
            Self::Http(client) => client.create_note(note).await,
            Self::Unconfigured => Err(Self::unavailable()),
        }
    }

    async fn update_note(&self, note_id: NoteId, patch: &NotePatch) -> RemoteResult<Note> {
        match self {
            Self::Http(client) => client.update_note(note_id, patch).await,
            Self::Unconfigured => Err(Self::unavailable()),
        }
    }

    async fn list_notes(&self, owner_id: &str, limit: usize) -> RemoteResult<Vec<Note>> {
        match self {
            Self::Http(client) => client.list_notes(owner_id, limit).await,
            Self::Unconfigured => Err(Self::unavailable()),
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jot=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();
    let db_path = resolve_db_path(cli.db_path);
    let owner = resolve_owner(cli.owner);
    tracing::debug!(path = %db_path.display(), owner, "using local database");

    let remote = CliRemote::from_env()?;
    let remote_configured = remote.is_configured();
    let service = NotesService::open_path(&db_path, remote).await?;

    match cli.command {
        Some(Commands::Add { content, title }) => {
            run_add(&service, &owner, title.as_deref(), &content).await?;
        }
        Some(Commands::List { limit, json }) => {
            run_list(&service, &owner, limit, json).await?;
        }
        Some(Commands::Update {
            id,
            title,
            content,
            pinned,
            archived,
        }) => {
            let patch = build_patch(title, content, pinned, archived)?;
            run_update(&service, &id, patch).await?;
        }
        Some(Commands::Delete { id }) => run_delete(&service, &id).await?,
        Some(Commands::Sync) => run_sync(&service, &owner, remote_configured).await?,
        Some(Commands::Status) => run_status(&service, remote_configured).await?,
        None => {
            // Quick capture mode: jot "my note"
            if cli.note.is_empty() {
                use clap::CommandFactory;
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_add(&service, &owner, None, &cli.note).await?;
            }
        }
    }

    Ok(())
}

fn resolve_db_path(flag: Option<PathBuf>) -> PathBuf {
    if let Some(path) = flag {
        return path;
    }
    if let Ok(path) = env::var("JOT_DB_PATH") {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
    }
    dirs::data_dir().map_or_else(
        || PathBuf::from("jot.db"),
        |data| data.join("jot").join("jot.db"),
    )
}

fn resolve_owner(flag: Option<String>) -> String {
    flag.or_else(|| env::var("JOT_OWNER").ok())
        .filter(|owner| !owner.trim().is_empty())
        .unwrap_or_else(|| "local".to_string())
}

fn resolve_note_content(parts: &[String]) -> Result<String, CliError> {
    let content = parts.join(" ");
    if content.trim().is_empty() {
        return Err(CliError::EmptyContent);
    }
    Ok(content)
}

fn build_patch(
    title: Option<String>,
    content: Option<String>,
    pinned: Option<bool>,
    archived: Option<bool>,
) -> Result<NotePatch, CliError> {
    let patch = NotePatch {
        title,
        content,
        pinned,
        archived,
        ..NotePatch::default()
    };
    if patch.is_empty() {
        return Err(CliError::EmptyUpdate);
    }
    Ok(patch)
}

fn parse_note_id(raw: &str) -> Result<NoteId, CliError> {
    raw.parse()
        .map_err(|_| CliError::InvalidNoteId(raw.to_string()))
}

async fn run_add(
    service: &NotesService<CliRemote>,
    owner: &str,
    title: Option<&str>,
    content_parts: &[String],
) -> Result<(), CliError> {
    let content = resolve_note_content(content_parts)?;
    let note = service
        .create_note(owner, title.unwrap_or_default(), &content)
        .await?;

    println!("{}", note.id);
    let pending = service.pending_mutations().await?;
    if pending > 0 {
        println!("(saved locally; {pending} edit(s) awaiting sync)");
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct NoteListItem {
    id: String,
    title: String,
    content: String,
    tags: Vec<String>,
    pinned: bool,
    archived: bool,
    updated_at: i64,
}

async fn run_list(
    service: &NotesService<CliRemote>,
    owner: &str,
    limit: usize,
    as_json: bool,
) -> Result<(), CliError> {
    let notes: Vec<Note> = service
        .get_notes(owner)
        .await?
        .into_iter()
        .filter(|note| !note.is_deleted)
        .take(limit)
        .collect();

    if as_json {
        let items: Vec<NoteListItem> = notes
            .iter()
            .map(|note| NoteListItem {
                id: note.id.as_str(),
                title: note.title.clone(),
                content: note.content.clone(),
                tags: note.tags.clone(),
                pinned: note.pinned,
                archived: note.archived,
                updated_at: note.updated_at,
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if notes.is_empty() {
        println!("No notes yet.");
        return Ok(());
    }

    for note in &notes {
        let pin = if note.pinned { "* " } else { "  " };
        let when = format_timestamp(note.updated_at);
        let tags = if note.tags.is_empty() {
            String::new()
        } else {
            format!("  #{}", note.tags.join(" #"))
        };
        println!("{pin}{}  {}  {}{tags}", note.id, when, note.title);
    }
    Ok(())
}

async fn run_update(
    service: &NotesService<CliRemote>,
    id: &str,
    patch: NotePatch,
) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    match service.update_note(note_id, patch).await? {
        Some(note) => {
            println!("Updated {}", note.id);
            Ok(())
        }
        None => Err(CliError::NoteNotFound(id.to_string())),
    }
}

async fn run_delete(service: &NotesService<CliRemote>, id: &str) -> Result<(), CliError> {
    let note_id = parse_note_id(id)?;
    service.delete_note(note_id).await?;
    println!("Deleted {note_id}");
    Ok(())
}

async fn run_sync(
    service: &NotesService<CliRemote>,
    owner: &str,
    remote_configured: bool,
) -> Result<(), CliError> {
    if !remote_configured {
        return Err(CliError::SyncNotConfigured);
    }

    let outcome = service.sync_notes(owner).await?;
    println!(
        "Sync completed: {} applied, {} failed, {} still pending",
        outcome.applied, outcome.failed, outcome.remaining
    );
    Ok(())
}

async fn run_status(
    service: &NotesService<CliRemote>,
    remote_configured: bool,
) -> Result<(), CliError> {
    let pending = service.pending_mutations().await?;
    let remote = if remote_configured {
        "configured"
    } else {
        "not configured"
    };
    println!("Remote: {remote}");
    println!("Pending mutations: {pending}");
    Ok(())
}

fn format_timestamp(ms: i64) -> String {
    Utc.timestamp_millis_opt(ms)
        .single()
        .map_or_else(|| ms.to_string(), |dt| dt.format("%Y-%m-%d %H:%M").to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn resolve_note_content_joins_parts() {
        let parts = vec!["hello".to_string(), "world".to_string()];
        assert_eq!(resolve_note_content(&parts).unwrap(), "hello world");
    }

    #[test]
    fn resolve_note_content_rejects_blank() {
        assert!(resolve_note_content(&[]).is_err());
        assert!(resolve_note_content(&["   ".to_string()]).is_err());
    }

    #[test]
    fn build_patch_requires_at_least_one_field() {
        assert!(build_patch(None, None, None, None).is_err());
        let patch = build_patch(None, None, Some(true), None).unwrap();
        assert_eq!(patch.pinned, Some(true));
    }

    #[test]
    fn parse_note_id_rejects_garbage() {
        assert!(parse_note_id("not-a-uuid").is_err());
        let id = NoteId::new();
        assert_eq!(parse_note_id(&id.as_str()).unwrap(), id);
    }

    #[test]
    fn resolve_owner_prefers_flag() {
        assert_eq!(resolve_owner(Some("cato".to_string())), "cato");
    }

    #[test]
    fn format_timestamp_renders_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
    }
}
