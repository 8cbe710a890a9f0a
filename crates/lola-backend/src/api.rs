//! Wire types for the backend's JSON API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use lola_core::{CollectionInfo, Role};

/// Request body for `POST /collections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCollectionRequest {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<HashMap<String, Value>>,
}

/// Response body for `GET /collections`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionList {
    pub collections: Vec<CollectionInfo>,
    pub total: usize,
}

/// Request body for `POST /collections/{name}/upsert`.
///
/// Either `documents` (embedded server-side) or `embeddings` must be
/// present; all parallel lists must match `ids` in length.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertRequest {
    pub ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embeddings: Option<Vec<Vec<f32>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadatas: Option<Vec<HashMap<String, Value>>>,

    /// Optional embedding model override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

/// Response body for an upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertResponse {
    pub status: String,
    pub upserted: usize,
}

/// Request body for `POST /collections/{name}/delete`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRecordsRequest {
    pub ids: Vec<String>,
}

/// Request body for `POST /collections/{name}/query`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_texts: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_embeddings: Option<Vec<Vec<f32>>>,

    #[serde(default = "default_n_results")]
    pub n_results: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// Metadata filter.
    #[serde(default, rename = "where", skip_serializing_if = "Option::is_none")]
    pub where_filter: Option<Value>,

    /// Fields to include: "metadatas", "documents", "distances", "embeddings".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include: Option<Vec<String>>,
}

impl Default for QueryRequest {
    fn default() -> Self {
        Self {
            query_texts: None,
            query_embeddings: None,
            n_results: default_n_results(),
            model: None,
            where_filter: None,
            include: None,
        }
    }
}

fn default_n_results() -> u32 {
    5
}

/// Response body for a query. Lists are nested per query text.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub ids: Vec<Vec<String>>,

    #[serde(default)]
    pub documents: Option<Vec<Vec<Option<String>>>>,

    #[serde(default)]
    pub metadatas: Option<Vec<Vec<Option<HashMap<String, Value>>>>>,

    #[serde(default)]
    pub distances: Option<Vec<Vec<f32>>>,
}

/// One turn of a conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: String,
}

impl ChatTurn {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub messages: Vec<ChatTurn>,

    /// Collection to retrieve context from; plain chat if absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,

    #[serde(default)]
    pub stream: bool,

    // Per-request RAG setting overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_n_results: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_similarity_threshold: Option<f32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rag_max_context_tokens: Option<u32>,
}

/// Response body for `POST /chat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    pub content: String,

    #[serde(default)]
    pub tokens_used: Option<u32>,

    #[serde(default)]
    pub model: Option<String>,
}

/// Request body for `POST /chat/generate-title`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleRequest {
    pub user_message: String,
}

/// Response body for `POST /chat/generate-title`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TitleResponse {
    pub title: String,
}

/// RAG configuration as exchanged with `/rag/config`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfigBody {
    pub rag_n_results: u32,
    pub rag_similarity_threshold: f32,
    pub rag_max_context_tokens: u32,
}

/// Response body for `GET /health`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

/// JSON error body shape used by the backend.
///
/// FastAPI reports errors under `detail`; some endpoints use `message`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<String>,

    #[serde(default)]
    pub message: Option<String>,
}
