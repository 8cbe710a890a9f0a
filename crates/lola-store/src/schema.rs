//! Database schema definitions.

/// Main schema SQL for initializing the database.
pub const SCHEMA: &str = r#"
-- Chat sessions table
CREATE TABLE IF NOT EXISTS chat_sessions (
    id TEXT PRIMARY KEY,
    title TEXT NOT NULL,
    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON chat_sessions(updated_at);

-- Chat messages table
CREATE TABLE IF NOT EXISTS chat_messages (
    id TEXT PRIMARY KEY,
    session_id TEXT NOT NULL REFERENCES chat_sessions(id) ON DELETE CASCADE,
    role TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_session_id ON chat_messages(session_id);

-- Single-row RAG settings table
CREATE TABLE IF NOT EXISTS rag_settings (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    n_results INTEGER NOT NULL,
    similarity_threshold REAL NOT NULL,
    max_context_tokens INTEGER NOT NULL,
    chat_model TEXT NOT NULL,
    updated_at INTEGER NOT NULL
);
"#;
