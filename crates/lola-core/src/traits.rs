//! Core traits defining the interfaces between components.

use async_trait::async_trait;
use ulid::Ulid;

use crate::error::Result;
use crate::types::{ChatMessage, ChatSession, RagSettings};

/// Storage layer trait for chats, messages, and RAG settings.
#[async_trait]
pub trait Store: Send + Sync {
    // Session operations
    async fn create_session(&self, session: ChatSession) -> Result<()>;
    async fn get_session(&self, id: Ulid) -> Result<Option<ChatSession>>;
    async fn list_sessions(&self) -> Result<Vec<ChatSession>>;
    async fn rename_session(&self, id: Ulid, title: &str) -> Result<()>;
    async fn delete_session(&self, id: Ulid) -> Result<()>;

    // Message operations
    async fn insert_message(&self, message: ChatMessage) -> Result<()>;
    async fn list_messages(&self, session_id: Ulid) -> Result<Vec<ChatMessage>>;
    async fn delete_messages_for_session(&self, session_id: Ulid) -> Result<()>;

    // RAG settings (single global record)
    async fn get_settings(&self) -> Result<Option<RagSettings>>;
    async fn upsert_settings(&self, settings: &RagSettings) -> Result<()>;
}
