//! SQLite-based storage implementation.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use tracing::{debug, info};
use ulid::Ulid;

use lola_core::{
    now_millis, ChatMessage, ChatSession, LolaError, RagSettings, Result, Role, Store,
};

use crate::schema::SCHEMA;

/// SQLite-based store implementation.
///
/// Uses a blocking Mutex for thread-safe access; every operation is a
/// single short statement, so holding the lock across a call is cheap.
pub struct SqliteStore {
    /// Connection wrapped in blocking Mutex.
    conn: Arc<Mutex<Connection>>,
}

// Manually implement Send + Sync since Connection is protected by Mutex
unsafe impl Send for SqliteStore {}
unsafe impl Sync for SqliteStore {}

/// Busy timeout applied when no configured value is given.
const DEFAULT_BUSY_TIMEOUT_MS: u32 = 30000;

impl SqliteStore {
    /// Open or create a database at the given path.
    pub fn open(path: impl AsRef<Path>, busy_timeout_ms: u32) -> Result<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| LolaError::database(format!("Failed to open database: {}", e)))?;

        Self::init(conn, path, busy_timeout_ms)
    }

    /// Open an in-memory database (for testing).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| LolaError::database(format!("Failed to open in-memory database: {}", e)))?;

        Self::init(conn, Path::new(":memory:"), DEFAULT_BUSY_TIMEOUT_MS)
    }

    /// Initialize the store with a connection.
    fn init(conn: Connection, path: &Path, busy_timeout_ms: u32) -> Result<Self> {
        Self::configure_connection(&conn, busy_timeout_ms)?;

        conn.execute_batch(SCHEMA)
            .map_err(|e| LolaError::database(format!("Failed to initialize schema: {}", e)))?;

        info!("Database opened at {:?}", path);

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Configure SQLite connection for optimal performance.
    fn configure_connection(conn: &Connection, busy_timeout_ms: u32) -> Result<()> {
        conn.execute_batch(&format!(
            r#"
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA busy_timeout = {};
            PRAGMA foreign_keys = ON;
            "#,
            busy_timeout_ms
        ))
        .map_err(|e| LolaError::database(format!("Failed to configure connection: {}", e)))?;

        Ok(())
    }

    /// Execute a blocking operation on the connection.
    fn with_conn<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&Connection) -> Result<R>,
    {
        let conn = self.conn.lock().map_err(|e| LolaError::database(e.to_string()))?;
        f(&conn)
    }
}

#[async_trait]
impl Store for SqliteStore {
    // Session operations

    async fn create_session(&self, session: ChatSession) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_sessions (id, title, created_at, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    session.id.to_string(),
                    session.title,
                    session.created_at as i64,
                    session.updated_at as i64,
                ],
            )
            .map_err(|e| LolaError::database(format!("Failed to create session: {}", e)))?;

            debug!("Created session: {}", session.id);
            Ok(())
        })
    }

    async fn get_session(&self, id: Ulid) -> Result<Option<ChatSession>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT id, title, created_at, updated_at FROM chat_sessions WHERE id = ?1")
                .map_err(|e| LolaError::database(e.to_string()))?;

            let result = stmt
                .query_row(params![id.to_string()], Self::row_to_session)
                .optional()
                .map_err(|e| LolaError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn list_sessions(&self) -> Result<Vec<ChatSession>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    "SELECT id, title, created_at, updated_at FROM chat_sessions ORDER BY updated_at DESC",
                )
                .map_err(|e| LolaError::database(e.to_string()))?;

            let sessions = stmt
                .query_map([], Self::row_to_session)
                .map_err(|e| LolaError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| LolaError::database(e.to_string()))?;

            Ok(sessions)
        })
    }

    async fn rename_session(&self, id: Ulid, title: &str) -> Result<()> {
        let title = title.to_string();
        self.with_conn(|conn| {
            let updated = conn
                .execute(
                    "UPDATE chat_sessions SET title = ?2, updated_at = ?3 WHERE id = ?1",
                    params![id.to_string(), title, now_millis() as i64],
                )
                .map_err(|e| LolaError::database(e.to_string()))?;

            if updated == 0 {
                return Err(LolaError::SessionNotFound { id: id.to_string() });
            }

            Ok(())
        })
    }

    async fn delete_session(&self, id: Ulid) -> Result<()> {
        self.with_conn(|conn| {
            // Messages are deleted by CASCADE
            let deleted = conn
                .execute(
                    "DELETE FROM chat_sessions WHERE id = ?1",
                    params![id.to_string()],
                )
                .map_err(|e| LolaError::database(e.to_string()))?;

            if deleted == 0 {
                return Err(LolaError::SessionNotFound { id: id.to_string() });
            }

            debug!("Deleted session: {}", id);
            Ok(())
        })
    }

    // Message operations

    async fn insert_message(&self, message: ChatMessage) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO chat_messages (id, session_id, role, content, created_at)
                VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
                params![
                    message.id.to_string(),
                    message.session_id.to_string(),
                    message.role.as_str(),
                    message.content,
                    message.created_at as i64,
                ],
            )
            .map_err(|e| LolaError::database(format!("Failed to insert message: {}", e)))?;

            conn.execute(
                "UPDATE chat_sessions SET updated_at = ?2 WHERE id = ?1",
                params![message.session_id.to_string(), now_millis() as i64],
            )
            .map_err(|e| LolaError::database(e.to_string()))?;

            debug!("Inserted message: {}", message.id);
            Ok(())
        })
    }

    async fn list_messages(&self, session_id: Ulid) -> Result<Vec<ChatMessage>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT id, session_id, role, content, created_at
                    FROM chat_messages
                    WHERE session_id = ?1
                    ORDER BY created_at, rowid
                    "#,
                )
                .map_err(|e| LolaError::database(e.to_string()))?;

            let messages = stmt
                .query_map(params![session_id.to_string()], Self::row_to_message)
                .map_err(|e| LolaError::database(e.to_string()))?
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| LolaError::database(e.to_string()))?;

            Ok(messages)
        })
    }

    async fn delete_messages_for_session(&self, session_id: Ulid) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute(
                "DELETE FROM chat_messages WHERE session_id = ?1",
                params![session_id.to_string()],
            )
            .map_err(|e| LolaError::database(e.to_string()))?;

            Ok(())
        })
    }

    // RAG settings

    async fn get_settings(&self) -> Result<Option<RagSettings>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare(
                    r#"
                    SELECT n_results, similarity_threshold, max_context_tokens, chat_model
                    FROM rag_settings WHERE id = 1
                    "#,
                )
                .map_err(|e| LolaError::database(e.to_string()))?;

            let result = stmt
                .query_row([], |row| {
                    Ok(RagSettings {
                        n_results: row.get(0)?,
                        similarity_threshold: row.get::<_, f64>(1)? as f32,
                        max_context_tokens: row.get(2)?,
                        chat_model: row.get(3)?,
                    })
                })
                .optional()
                .map_err(|e| LolaError::database(e.to_string()))?;

            Ok(result)
        })
    }

    async fn upsert_settings(&self, settings: &RagSettings) -> Result<()> {
        settings.validate()?;

        self.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO rag_settings (id, n_results, similarity_threshold,
                                          max_context_tokens, chat_model, updated_at)
                VALUES (1, ?1, ?2, ?3, ?4, ?5)
                ON CONFLICT(id) DO UPDATE SET
                    n_results = excluded.n_results,
                    similarity_threshold = excluded.similarity_threshold,
                    max_context_tokens = excluded.max_context_tokens,
                    chat_model = excluded.chat_model,
                    updated_at = excluded.updated_at
                "#,
                params![
                    settings.n_results,
                    settings.similarity_threshold as f64,
                    settings.max_context_tokens,
                    settings.chat_model,
                    now_millis() as i64,
                ],
            )
            .map_err(|e| LolaError::database(format!("Failed to upsert settings: {}", e)))?;

            debug!("Upserted RAG settings");
            Ok(())
        })
    }
}

// Helper methods
impl SqliteStore {
    /// Convert a row to a ChatSession.
    fn row_to_session(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatSession> {
        let id_str: String = row.get(0)?;

        Ok(ChatSession {
            id: Ulid::from_string(&id_str).unwrap_or_else(|_| Ulid::nil()),
            title: row.get(1)?,
            created_at: row.get::<_, i64>(2)? as u64,
            updated_at: row.get::<_, i64>(3)? as u64,
        })
    }

    /// Convert a row to a ChatMessage.
    fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<ChatMessage> {
        let id_str: String = row.get(0)?;
        let session_id_str: String = row.get(1)?;
        let role_str: String = row.get(2)?;

        Ok(ChatMessage {
            id: Ulid::from_string(&id_str).unwrap_or_else(|_| Ulid::nil()),
            session_id: Ulid::from_string(&session_id_str).unwrap_or_else(|_| Ulid::nil()),
            role: Role::from_name(&role_str).unwrap_or(Role::User),
            content: row.get(3)?,
            created_at: row.get::<_, i64>(4)? as u64,
        })
    }
}
