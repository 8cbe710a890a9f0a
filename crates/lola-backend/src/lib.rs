//! lola-backend - HTTP client for the external RAG/chat backend
//!
//! The backend (embeddings, vector search, LLM prompting) is an opaque
//! JSON-over-HTTP service. This crate provides a typed client for its
//! endpoints plus the document import flow that chunks text and upserts
//! the chunks into a collection.

pub mod api;
mod client;
pub mod import;

pub use client::BackendClient;
pub use import::ImportDocument;
