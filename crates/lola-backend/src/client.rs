//! Typed HTTP client for the backend.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use lola_core::{CollectionInfo, LolaError, RagSettings, Result};

use crate::api::{
    ChatRequest, ChatResponse, CollectionList, CreateCollectionRequest, DeleteRecordsRequest,
    ErrorBody, HealthResponse, QueryRequest, QueryResponse, RagConfigBody, TitleRequest,
    TitleResponse, UpsertRequest, UpsertResponse,
};

/// Client for the external RAG/chat backend.
///
/// Failures carry the `detail` (or `message`) field of the backend's
/// JSON error body when one is present, falling back to the HTTP status.
/// No retries are attempted.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: reqwest::Client,
    base_url: String,
}

impl BackendClient {
    /// Create a client with the default timeout.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(30))
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LolaError::internal(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self { http, base_url })
    }

    /// The backend base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // Health

    /// Check backend liveness.
    pub async fn health(&self) -> Result<HealthResponse> {
        self.get_json("/health").await
    }

    // Collections

    /// Create (or get) a collection.
    pub async fn create_collection(
        &self,
        name: &str,
        metadata: Option<HashMap<String, Value>>,
    ) -> Result<CollectionInfo> {
        let body = CreateCollectionRequest {
            name: name.to_string(),
            metadata,
        };
        self.post_json("/collections", &body).await
    }

    /// List all collections.
    pub async fn list_collections(&self) -> Result<CollectionList> {
        self.get_json("/collections").await
    }

    /// Get a single collection's info, including its record count.
    pub async fn get_collection(&self, name: &str) -> Result<CollectionInfo> {
        let response = self
            .http
            .get(format!("{}/collections/{}", self.base_url, name))
            .send()
            .await
            .map_err(|e| LolaError::backend(format!("Request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LolaError::CollectionNotFound {
                name: name.to_string(),
            });
        }

        Self::read_json(response).await
    }

    /// Delete records from a collection by id.
    pub async fn delete_records(&self, collection: &str, ids: &[String]) -> Result<()> {
        let body = DeleteRecordsRequest { ids: ids.to_vec() };
        let _: Value = self
            .post_json(&format!("/collections/{}/delete", collection), &body)
            .await?;
        Ok(())
    }

    // Documents

    /// Upsert chunk records into a collection.
    pub async fn upsert(&self, collection: &str, request: &UpsertRequest) -> Result<UpsertResponse> {
        debug!(
            collection,
            items = request.ids.len(),
            "upserting records"
        );
        self.post_json(&format!("/collections/{}/upsert", collection), request)
            .await
    }

    /// Run a semantic query against a collection.
    pub async fn query(&self, collection: &str, request: &QueryRequest) -> Result<QueryResponse> {
        self.post_json(&format!("/collections/{}/query", collection), request)
            .await
    }

    // Chat

    /// Request a chat completion, optionally grounded in a collection.
    pub async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse> {
        if request.messages.is_empty() {
            return Err(LolaError::invalid_argument("Messages list cannot be empty"));
        }
        self.post_json("/chat", request).await
    }

    /// Generate a short title for a chat from its first user prompt.
    pub async fn generate_title(&self, user_message: &str) -> Result<String> {
        let body = TitleRequest {
            user_message: user_message.to_string(),
        };
        let response: TitleResponse = self.post_json("/chat/generate-title", &body).await?;
        Ok(response.title)
    }

    // RAG configuration

    /// Fetch the backend's view of the RAG configuration.
    pub async fn get_rag_config(&self) -> Result<RagSettings> {
        let body: RagConfigBody = self.get_json("/rag/config").await?;
        Ok(RagSettings {
            n_results: body.rag_n_results,
            similarity_threshold: body.rag_similarity_threshold,
            max_context_tokens: body.rag_max_context_tokens,
            ..RagSettings::default()
        })
    }

    /// Validate RAG configuration values against the backend.
    pub async fn update_rag_config(&self, settings: &RagSettings) -> Result<RagSettings> {
        let body = RagConfigBody {
            rag_n_results: settings.n_results,
            rag_similarity_threshold: settings.similarity_threshold,
            rag_max_context_tokens: settings.max_context_tokens,
        };

        let response = self
            .http
            .put(format!("{}{}", self.base_url, "/rag/config"))
            .json(&body)
            .send()
            .await
            .map_err(|e| LolaError::backend(format!("Request failed: {}", e)))?;

        let body: RagConfigBody = Self::read_json(response).await?;
        Ok(RagSettings {
            n_results: body.rag_n_results,
            similarity_threshold: body.rag_similarity_threshold,
            max_context_tokens: body.rag_max_context_tokens,
            chat_model: settings.chat_model.clone(),
        })
    }

    // Plumbing

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .map_err(|e| LolaError::backend(format!("Request failed: {}", e)))?;

        Self::read_json(response).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl serde::Serialize,
    ) -> Result<T> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .json(body)
            .send()
            .await
            .map_err(|e| LolaError::backend(format!("Request failed: {}", e)))?;

        Self::read_json(response).await
    }

    /// Decode a JSON response, mapping non-success statuses to the
    /// backend's error message.
    async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| LolaError::backend(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            return Err(LolaError::backend(error_message(status, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| LolaError::backend(format!("Failed to parse response: {}", e)))
    }
}

/// Extract the `detail`/`message` field from an error body, falling back
/// to the HTTP status line.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail.or(b.message))
        .unwrap_or_else(|| format!("HTTP {}", status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lola_core::Role;
    use wiremock::matchers::{body_json_string, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::api::ChatTurn;

    #[test]
    fn test_error_message_prefers_detail() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            error_message(status, r#"{"detail": "embedding failed"}"#),
            "embedding failed"
        );
        assert_eq!(
            error_message(status, r#"{"message": "bad request"}"#),
            "bad request"
        );
        assert_eq!(
            error_message(status, "<html>gateway timeout</html>"),
            "HTTP 500 Internal Server Error"
        );
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let client = BackendClient::new("http://localhost:8000/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000");
    }

    #[tokio::test]
    async fn test_chat_rejects_empty_messages() {
        let client = BackendClient::new("http://localhost:8000").unwrap();
        let request = ChatRequest {
            messages: Vec::new(),
            collection_name: None,
            stream: false,
            rag_n_results: None,
            rag_similarity_threshold: None,
            rag_max_context_tokens: None,
        };

        let err = client.chat(&request).await.unwrap_err();
        assert!(matches!(err, LolaError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_chat_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "content": "Paris is the capital of France.",
                "tokens_used": 42,
                "model": "gpt-4o-mini"
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let request = ChatRequest {
            messages: vec![ChatTurn::new(Role::User, "What is the capital of France?")],
            collection_name: Some("notes".to_string()),
            stream: false,
            rag_n_results: Some(3),
            rag_similarity_threshold: None,
            rag_max_context_tokens: None,
        };

        let response = client.chat(&request).await.unwrap();
        assert_eq!(response.content, "Paris is the capital of France.");
        assert_eq!(response.tokens_used, Some(42));
    }

    #[tokio::test]
    async fn test_backend_error_detail_surfaced() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/collections/notes/upsert"))
            .respond_with(
                ResponseTemplate::new(500)
                    .set_body_json(serde_json::json!({ "detail": "Embedding generation failed" })),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let request = UpsertRequest {
            ids: vec!["id-1".to_string()],
            documents: Some(vec!["chunk".to_string()]),
            embeddings: None,
            metadatas: None,
            model: None,
        };
        let err = client.upsert("notes", &request).await.unwrap_err();

        match err {
            LolaError::Backend { message } => {
                assert_eq!(message, "Embedding generation failed")
            }
            other => panic!("expected backend error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_missing_collection_maps_to_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/collections/missing"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(serde_json::json!({ "detail": "Collection missing not found" })),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let err = client.get_collection("missing").await.unwrap_err();

        match err {
            LolaError::CollectionNotFound { name } => assert_eq!(name, "missing"),
            other => panic!("expected collection-not-found, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_upsert_posts_to_collection_path() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/collections/notes/upsert"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "status": "ok",
                "upserted": 2
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let request = UpsertRequest {
            ids: vec!["id-1".to_string(), "id-2".to_string()],
            documents: Some(vec!["first chunk".to_string(), "second chunk".to_string()]),
            embeddings: None,
            metadatas: None,
            model: None,
        };

        let response = client.upsert("notes", &request).await.unwrap();
        assert_eq!(response.upserted, 2);
    }

    #[tokio::test]
    async fn test_query_decodes_nested_lists() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/collections/notes/query"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "ids": [["id-1", "id-2"]],
                "documents": [["first chunk", "second chunk"]],
                "distances": [[0.12, 0.34]]
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let request = QueryRequest {
            query_texts: Some(vec!["what is in my notes?".to_string()]),
            n_results: 2,
            ..Default::default()
        };

        let response = client.query("notes", &request).await.unwrap();
        assert_eq!(response.ids[0].len(), 2);
        assert_eq!(
            response.documents.unwrap()[0][0].as_deref(),
            Some("first chunk")
        );
        assert!(response.metadatas.is_none());
    }

    #[tokio::test]
    async fn test_generate_title() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/chat/generate-title"))
            .and(body_json_string(
                r#"{"user_message": "Summarize my tax documents"}"#,
            ))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "title": "Tax document summary" })),
            )
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let title = client
            .generate_title("Summarize my tax documents")
            .await
            .unwrap();
        assert_eq!(title, "Tax document summary");
    }

    #[tokio::test]
    async fn test_rag_config_round_trip() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/rag/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "rag_n_results": 5,
                "rag_similarity_threshold": 0.25,
                "rag_max_context_tokens": 1500
            })))
            .mount(&server)
            .await;

        let client = BackendClient::new(server.uri()).unwrap();
        let settings = client.get_rag_config().await.unwrap();
        assert_eq!(settings.n_results, 5);
        assert_eq!(settings.max_context_tokens, 1500);
    }
}
