//! lola-store - SQLite storage layer
//!
//! This crate provides persistent storage for chat sessions, messages,
//! and the single global RAG configuration record.

mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

// Re-export schema for testing/migrations
pub use schema::SCHEMA;
