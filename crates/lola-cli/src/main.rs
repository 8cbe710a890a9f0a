//! Lola CLI - Command-line interface for the document-chat client.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;
use ulid::Ulid;

use lola_backend::api::{ChatRequest, ChatTurn};
use lola_backend::{import, BackendClient, ImportDocument};
use lola_core::{
    ChatMessage, ChatSession, ChunkOptions, LolaConfig, LolaError, RagSettings,
    RagSettingsUpdate, Result, Role, Store,
};
use lola_store::SqliteStore;

/// Lola - chat with your documents
#[derive(Parser)]
#[command(name = "lola")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Database path (default: platform data dir)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Backend base URL (default: http://localhost:8000)
    #[arg(short, long, global = true)]
    backend_url: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the local database
    Init,

    /// Import a file or directory into a collection
    Import {
        /// Path to file or directory to import
        path: PathBuf,

        /// Collection to import into
        #[arg(short, long)]
        collection: String,

        /// Recursively process directories
        #[arg(short, long)]
        recursive: bool,

        /// Target chunk size in characters
        #[arg(long)]
        size: Option<i64>,

        /// Overlap between chunks in characters
        #[arg(long)]
        overlap: Option<i64>,
    },

    /// Send a chat message
    Chat {
        /// The message to send
        message: String,

        /// Session to continue (starts a new one if not specified)
        #[arg(short, long)]
        session: Option<String>,

        /// Collection to retrieve context from
        #[arg(short, long)]
        collection: Option<String>,
    },

    /// Manage chat sessions
    Sessions {
        #[command(subcommand)]
        action: SessionAction,
    },

    /// Manage backend collections
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
    },

    /// Manage RAG settings
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Check backend health
    Health,
}

#[derive(Subcommand)]
enum SessionAction {
    /// List all sessions
    List,

    /// Show the messages of a session
    Show {
        /// Session id
        id: String,
    },

    /// Delete a session and its messages
    Delete {
        /// Session id
        id: String,
    },

    /// Clear a session's messages, keeping the session
    Clear {
        /// Session id
        id: String,
    },
}

#[derive(Subcommand)]
enum CollectionAction {
    /// List all collections
    List,

    /// Create a new collection
    Create {
        /// Collection name
        name: String,
    },

    /// Show a collection's info
    Info {
        /// Collection name
        name: String,
    },

    /// Delete records from a collection by id
    DeleteRecords {
        /// Collection name
        name: String,

        /// Record ids to delete
        #[arg(required = true)]
        ids: Vec<String>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Show the current RAG settings
    Show,

    /// Update RAG settings
    Set {
        /// Number of chunks to retrieve per query
        #[arg(long)]
        n_results: Option<u32>,

        /// Minimum similarity for retrieved chunks (0.0 - 1.0)
        #[arg(long)]
        similarity_threshold: Option<f32>,

        /// Token budget for retrieved context
        #[arg(long)]
        max_context_tokens: Option<u32>,

        /// Chat completion model
        #[arg(long)]
        chat_model: Option<String>,
    },
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::WARN };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = LolaConfig::load_default()?;
    if let Some(path) = cli.database {
        config.database.path = path;
    }
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }

    match cli.command {
        Commands::Init => {
            let _store = SqliteStore::open(&config.database.path, config.database.busy_timeout_ms)?;
            println!("Initialized database at: {}", config.database.path.display());
        }
        Commands::Import {
            path,
            collection,
            recursive,
            size,
            overlap,
        } => {
            let client = make_client(&config)?;
            let options = ChunkOptions {
                size: size.unwrap_or(config.chunking.size),
                overlap: overlap.unwrap_or(config.chunking.overlap),
            };
            import_path(&client, &path, &collection, recursive, &options).await?;
        }
        Commands::Chat {
            message,
            session,
            collection,
        } => {
            let store = SqliteStore::open(&config.database.path, config.database.busy_timeout_ms)?;
            let client = make_client(&config)?;
            chat(&store, &client, &message, session, collection).await?;
        }
        Commands::Sessions { action } => {
            let store = SqliteStore::open(&config.database.path, config.database.busy_timeout_ms)?;
            match action {
                SessionAction::List => list_sessions(&store).await?,
                SessionAction::Show { id } => show_session(&store, &id).await?,
                SessionAction::Delete { id } => {
                    store.delete_session(parse_session_id(&id)?).await?;
                    println!("Deleted session {}", id);
                }
                SessionAction::Clear { id } => {
                    let id = parse_session_id(&id)?;
                    store
                        .get_session(id)
                        .await?
                        .ok_or(LolaError::SessionNotFound { id: id.to_string() })?;
                    store.delete_messages_for_session(id).await?;
                    println!("Cleared messages for session {}", id);
                }
            }
        }
        Commands::Collection { action } => {
            let client = make_client(&config)?;
            match action {
                CollectionAction::List => {
                    let list = client.list_collections().await?;
                    for info in &list.collections {
                        match info.count {
                            Some(count) => println!("{} ({} records)", info.name, count),
                            None => println!("{}", info.name),
                        }
                    }
                    println!("\n{} collection(s)", list.total);
                }
                CollectionAction::Create { name } => {
                    let info = client.create_collection(&name, None).await?;
                    println!("Created collection: {}", info.name);
                }
                CollectionAction::Info { name } => {
                    let info = client.get_collection(&name).await?;
                    println!("Name: {}", info.name);
                    if let Some(count) = info.count {
                        println!("Records: {}", count);
                    }
                    if let Some(metadata) = &info.metadata {
                        for (key, value) in metadata {
                            println!("{}: {}", key, value);
                        }
                    }
                }
                CollectionAction::DeleteRecords { name, ids } => {
                    client.delete_records(&name, &ids).await?;
                    println!("Deleted {} record(s) from {}", ids.len(), name);
                }
            }
        }
        Commands::Settings { action } => {
            let store = SqliteStore::open(&config.database.path, config.database.busy_timeout_ms)?;
            match action {
                SettingsAction::Show => {
                    let settings = store
                        .get_settings()
                        .await?
                        .unwrap_or_else(|| config.rag.clone());
                    print_settings(&settings);
                }
                SettingsAction::Set {
                    n_results,
                    similarity_threshold,
                    max_context_tokens,
                    chat_model,
                } => {
                    let client = make_client(&config)?;
                    let current = store
                        .get_settings()
                        .await?
                        .unwrap_or_else(|| config.rag.clone());

                    let update = RagSettingsUpdate {
                        n_results,
                        similarity_threshold,
                        max_context_tokens,
                        chat_model,
                    };
                    let merged = current.apply(&update);

                    // The backend validates; the client persists.
                    let validated = client.update_rag_config(&merged).await?;
                    store.upsert_settings(&validated).await?;

                    print_settings(&validated);
                }
            }
        }
        Commands::Health => {
            let client = make_client(&config)?;
            let health = client.health().await?;
            println!("Backend status: {}", health.status);
        }
    }

    Ok(())
}

fn make_client(config: &LolaConfig) -> Result<BackendClient> {
    BackendClient::with_timeout(
        &config.backend.base_url,
        Duration::from_secs(config.backend.timeout_secs),
    )
}

fn parse_session_id(id: &str) -> Result<Ulid> {
    Ulid::from_string(id)
        .map_err(|_| LolaError::invalid_argument(format!("Invalid session id: {}", id)))
}

fn print_settings(settings: &RagSettings) {
    println!("n_results: {}", settings.n_results);
    println!("similarity_threshold: {}", settings.similarity_threshold);
    println!("max_context_tokens: {}", settings.max_context_tokens);
    println!("chat_model: {}", settings.chat_model);
}

async fn chat(
    store: &SqliteStore,
    client: &BackendClient,
    message: &str,
    session: Option<String>,
    collection: Option<String>,
) -> Result<()> {
    // Resolve the session and its history
    let (session, is_new, history) = match session {
        Some(id) => {
            let id = parse_session_id(&id)?;
            let session = store
                .get_session(id)
                .await?
                .ok_or(LolaError::SessionNotFound { id: id.to_string() })?;
            let history = store.list_messages(id).await?;
            (session, false, history)
        }
        None => {
            let title = client
                .generate_title(message)
                .await
                .unwrap_or_else(|_| "New chat".to_string());
            (ChatSession::new(&title), true, Vec::new())
        }
    };

    let settings = store.get_settings().await?.unwrap_or_default();

    let mut turns: Vec<ChatTurn> = history
        .iter()
        .map(|m| ChatTurn::new(m.role, m.content.clone()))
        .collect();
    turns.push(ChatTurn::new(Role::User, message));

    let request = ChatRequest {
        messages: turns,
        collection_name: collection,
        stream: false,
        rag_n_results: Some(settings.n_results),
        rag_similarity_threshold: Some(settings.similarity_threshold),
        rag_max_context_tokens: Some(settings.max_context_tokens),
    };

    let response = client.chat(&request).await?;

    // Persist only after the backend call succeeds, so a failed turn
    // leaves no trace (the CLI analogue of rolling back an optimistic
    // UI update).
    if is_new {
        store.create_session(session.clone()).await?;
    }
    store
        .insert_message(ChatMessage::new(session.id, Role::User, message))
        .await?;
    store
        .insert_message(ChatMessage::new(
            session.id,
            Role::Assistant,
            &response.content,
        ))
        .await?;

    if is_new {
        println!("[session {} - {}]", session.id, session.title);
    }
    println!("{}", response.content);

    Ok(())
}

async fn list_sessions(store: &SqliteStore) -> Result<()> {
    let sessions = store.list_sessions().await?;
    if sessions.is_empty() {
        println!("No sessions yet.");
        return Ok(());
    }

    for session in sessions {
        println!("{}  {}", session.id, session.title);
    }

    Ok(())
}

async fn show_session(store: &SqliteStore, id: &str) -> Result<()> {
    let id = parse_session_id(id)?;
    let session = store
        .get_session(id)
        .await?
        .ok_or(LolaError::SessionNotFound { id: id.to_string() })?;

    println!("{}\n", session.title);
    for message in store.list_messages(id).await? {
        println!("[{}] {}", message.role, message.content);
    }

    Ok(())
}

async fn import_path(
    client: &BackendClient,
    path: &PathBuf,
    collection: &str,
    recursive: bool,
    options: &ChunkOptions,
) -> Result<()> {
    let files = collect_files(path, recursive)?;

    if files.is_empty() {
        println!("No supported files found at: {}", path.display());
        return Ok(());
    }

    println!(
        "Importing {} file(s) into collection '{}'...",
        files.len(),
        collection
    );

    let mut success_count = 0;
    let mut error_count = 0;

    for file_path in files {
        let text = match fs::read_to_string(&file_path) {
            Ok(t) => t,
            Err(e) => {
                eprintln!("  Error reading {}: {}", file_path.display(), e);
                error_count += 1;
                continue;
            }
        };

        let filename = file_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let document = ImportDocument::new(&filename, &text);

        match import::import_document(client, collection, &document, options).await {
            Ok(chunks) => {
                println!("  {} - {} chunk(s)", file_path.display(), chunks);
                success_count += 1;
            }
            Err(e) => {
                eprintln!("  {} - Error: {}", file_path.display(), e);
                error_count += 1;
            }
        }
    }

    println!(
        "\nComplete: {} succeeded, {} failed",
        success_count, error_count
    );

    Ok(())
}

fn collect_files(path: &PathBuf, recursive: bool) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    if path.is_file() {
        if is_supported_file(path) {
            files.push(path.clone());
        }
    } else if path.is_dir() {
        for entry in fs::read_dir(path)? {
            let entry = entry?;
            let entry_path = entry.path();

            if entry_path.is_file() && is_supported_file(&entry_path) {
                files.push(entry_path);
            } else if entry_path.is_dir() && recursive {
                files.extend(collect_files(&entry_path, recursive)?);
            }
        }
    }

    Ok(files)
}

fn is_supported_file(path: &PathBuf) -> bool {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
    matches!(
        ext.to_lowercase().as_str(),
        "txt" | "md" | "markdown" | "csv" | "json" | "html" | "htm" | "xml" | "yaml" | "yml"
    )
}
