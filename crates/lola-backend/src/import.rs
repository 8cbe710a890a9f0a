//! Document import flow.
//!
//! Chunks a document, assigns a fresh id and metadata to every chunk,
//! and upserts the batch into a backend collection for embedding.

use std::collections::HashMap;

use serde_json::Value;
use tracing::info;
use ulid::Ulid;

use lola_chunk::chunk_text;
use lola_core::{now_millis, ChunkOptions, Result};

use crate::api::UpsertRequest;
use crate::client::BackendClient;

/// A document queued for import.
#[derive(Debug, Clone)]
pub struct ImportDocument {
    /// Original filename.
    pub filename: String,

    /// File type, usually the extension.
    pub file_type: Option<String>,

    /// Full document text.
    pub text: String,
}

impl ImportDocument {
    /// Create a document, deriving the file type from the filename
    /// extension.
    pub fn new(filename: &str, text: &str) -> Self {
        let file_type = filename
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_lowercase());

        Self {
            filename: filename.to_string(),
            file_type,
            text: text.to_string(),
        }
    }
}

/// Build the upsert request for a document: one record per chunk, each
/// with a fresh ULID and per-chunk metadata (filename, file type, chunk
/// index, upload timestamp).
///
/// Returns `None` if the document produces no chunks.
pub fn build_upsert_request(
    document: &ImportDocument,
    options: &ChunkOptions,
) -> Option<UpsertRequest> {
    let chunks = chunk_text(&document.text, options);
    if chunks.is_empty() {
        return None;
    }

    let uploaded_at = now_millis();

    let ids: Vec<String> = chunks.iter().map(|_| Ulid::new().to_string()).collect();
    let metadatas: Vec<HashMap<String, Value>> = (0..chunks.len())
        .map(|index| chunk_metadata(document, index, uploaded_at))
        .collect();

    Some(UpsertRequest {
        ids,
        documents: Some(chunks),
        embeddings: None,
        metadatas: Some(metadatas),
        model: None,
    })
}

/// Metadata attached to one chunk record.
fn chunk_metadata(
    document: &ImportDocument,
    index: usize,
    uploaded_at: u64,
) -> HashMap<String, Value> {
    let mut metadata = HashMap::new();
    metadata.insert("filename".to_string(), Value::from(document.filename.clone()));
    metadata.insert(
        "file_type".to_string(),
        document
            .file_type
            .clone()
            .map(Value::from)
            .unwrap_or(Value::Null),
    );
    metadata.insert("chunk_index".to_string(), Value::from(index as u64));
    metadata.insert("uploaded_at".to_string(), Value::from(uploaded_at));
    metadata
}

/// Chunk a document and upsert it into the given collection.
///
/// Returns the number of chunks sent; a document with no chunkable text
/// short-circuits without a request.
pub async fn import_document(
    client: &BackendClient,
    collection: &str,
    document: &ImportDocument,
    options: &ChunkOptions,
) -> Result<usize> {
    let Some(request) = build_upsert_request(document, options) else {
        info!(filename = %document.filename, "document produced no chunks, skipping");
        return Ok(0);
    };

    let count = request.ids.len();
    client.upsert(collection, &request).await?;

    info!(
        filename = %document.filename,
        collection,
        chunks = count,
        "imported document"
    );

    Ok(count)
}
