//! Core domain types for the lola system.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire/database name for the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    /// Parse a role name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A chat session (one conversation thread).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique identifier (ULID).
    pub id: Ulid,

    /// Human-readable title, usually generated from the first prompt.
    pub title: String,

    /// Creation timestamp (Unix millis).
    pub created_at: u64,

    /// Last update timestamp (Unix millis).
    pub updated_at: u64,
}

impl ChatSession {
    /// Create a new session with the given title.
    pub fn new(title: &str) -> Self {
        let now = now_millis();
        Self {
            id: Ulid::new(),
            title: title.to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

/// A single message within a chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Unique identifier (ULID).
    pub id: Ulid,

    /// Parent session ID.
    pub session_id: Ulid,

    /// Message author.
    pub role: Role,

    /// Message text.
    pub content: String,

    /// Creation timestamp (Unix millis).
    pub created_at: u64,
}

impl ChatMessage {
    /// Create a new message in the given session.
    pub fn new(session_id: Ulid, role: Role, content: &str) -> Self {
        Self {
            id: Ulid::new(),
            session_id,
            role,
            content: content.to_string(),
            created_at: now_millis(),
        }
    }
}

/// The single global RAG configuration record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RagSettings {
    /// Number of chunks to retrieve per query.
    #[serde(default = "default_n_results")]
    pub n_results: u32,

    /// Minimum similarity for a retrieved chunk to be used (0.0 - 1.0).
    #[serde(default)]
    pub similarity_threshold: f32,

    /// Token budget for retrieved context in the chat prompt.
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: u32,

    /// Chat completion model to use.
    #[serde(default = "default_chat_model")]
    pub chat_model: String,
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            n_results: default_n_results(),
            similarity_threshold: 0.0,
            max_context_tokens: default_max_context_tokens(),
            chat_model: default_chat_model(),
        }
    }
}

impl RagSettings {
    /// Validate value ranges.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(1..=100).contains(&self.n_results) {
            return Err(crate::error::LolaError::invalid_argument(
                "n_results must be between 1 and 100",
            ));
        }
        if !(0.0..=1.0).contains(&self.similarity_threshold) {
            return Err(crate::error::LolaError::invalid_argument(
                "similarity_threshold must be between 0.0 and 1.0",
            ));
        }
        if !(1..=10000).contains(&self.max_context_tokens) {
            return Err(crate::error::LolaError::invalid_argument(
                "max_context_tokens must be between 1 and 10000",
            ));
        }
        Ok(())
    }

    /// Merge a partial update into these settings, keeping current values
    /// for absent fields.
    pub fn apply(&self, update: &RagSettingsUpdate) -> Self {
        Self {
            n_results: update.n_results.unwrap_or(self.n_results),
            similarity_threshold: update
                .similarity_threshold
                .unwrap_or(self.similarity_threshold),
            max_context_tokens: update.max_context_tokens.unwrap_or(self.max_context_tokens),
            chat_model: update
                .chat_model
                .clone()
                .unwrap_or_else(|| self.chat_model.clone()),
        }
    }
}

/// Partial update for [`RagSettings`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagSettingsUpdate {
    #[serde(default)]
    pub n_results: Option<u32>,

    #[serde(default)]
    pub similarity_threshold: Option<f32>,

    #[serde(default)]
    pub max_context_tokens: Option<u32>,

    #[serde(default)]
    pub chat_model: Option<String>,
}

/// Options for the windowed chunker.
///
/// Fields are signed so out-of-range inputs stay expressible; the chunker
/// clamps them rather than rejecting (`overlap < 0` becomes 0,
/// `overlap >= size` becomes `size / 4`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkOptions {
    /// Target maximum characters per chunk.
    #[serde(default = "default_chunk_size")]
    pub size: i64,

    /// Characters repeated between consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub overlap: i64,
}

impl Default for ChunkOptions {
    fn default() -> Self {
        Self {
            size: default_chunk_size(),
            overlap: default_chunk_overlap(),
        }
    }
}

/// A vector-store collection as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionInfo {
    /// Collection name (unique identifier).
    pub name: String,

    /// Collection metadata.
    #[serde(default)]
    pub metadata: Option<HashMap<String, serde_json::Value>>,

    /// Number of records, if the backend could count them.
    #[serde(default)]
    pub count: Option<u64>,
}

fn default_n_results() -> u32 {
    3
}

fn default_max_context_tokens() -> u32 {
    2000
}

fn default_chat_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_chunk_size() -> i64 {
    1200
}

fn default_chunk_overlap() -> i64 {
    200
}

/// Current time as Unix milliseconds.
pub fn now_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
