//! HTTP client wrapper for the Pinecone control and data planes.

use crate::config::Config;
use crate::pinecone::types::{
    IndexDescription, ListIndexesResponse, PineconeError, QueryResponse, ScoredMatch,
    UpsertResponse, VectorRecord,
};
use reqwest::{Client, Method, StatusCode};
use serde_json::json;
use std::time::Duration;

const API_VERSION: &str = "2024-07";
const UPSERT_BATCH_SIZE: usize = 100;

/// Lightweight HTTP client for Pinecone operations.
pub struct PineconeService {
    pub(crate) client: Client,
    pub(crate) controller_url: String,
    pub(crate) api_key: String,
    pub(crate) cloud: String,
    pub(crate) region: String,
}

impl PineconeService {
    /// Construct a new client from configuration.
    pub fn new(config: &Config) -> Result<Self, PineconeError> {
        let client = Client::builder().user_agent("arogyam/0.1").build()?;
        let controller_url =
            normalize_base_url(&config.pinecone_controller_url).map_err(PineconeError::InvalidUrl)?;
        tracing::debug!(
            url = %controller_url,
            has_api_key = !config.pinecone_api_key.is_empty(),
            "Initialized Pinecone HTTP client"
        );

        Ok(Self {
            client,
            controller_url,
            api_key: config.pinecone_api_key.clone(),
            cloud: config.pinecone_cloud.clone(),
            region: config.pinecone_region.clone(),
        })
    }

    /// Retrieve descriptions of every index in the project.
    pub async fn list_indexes(&self) -> Result<Vec<IndexDescription>, PineconeError> {
        let response = self.control(Method::GET, "indexes").send().await?;
        let response = self.ensure_success(response, "list indexes").await?;
        let payload: ListIndexesResponse = response.json().await?;
        Ok(payload.indexes)
    }

    /// Create a serverless cosine index only when it is missing.
    ///
    /// Returns `true` when a creation request was issued. An existing index whose reported
    /// dimension differs from `dimension` is an error.
    pub async fn create_index_if_not_exists(
        &self,
        name: &str,
        dimension: usize,
    ) -> Result<bool, PineconeError> {
        let indexes = self.list_indexes().await?;
        if let Some(existing) = indexes.iter().find(|index| index.name == name) {
            if let Some(actual) = existing.dimension.filter(|actual| *actual != dimension) {
                return Err(PineconeError::DimensionMismatch {
                    index: name.to_string(),
                    expected: dimension,
                    actual,
                });
            }
            tracing::info!(index = name, "Pinecone index already exists");
            return Ok(false);
        }

        tracing::info!(index = name, dimension, "Creating Pinecone index");
        let body = json!({
            "name": name,
            "dimension": dimension,
            "metric": "cosine",
            "spec": {
                "serverless": {
                    "cloud": self.cloud,
                    "region": self.region,
                }
            }
        });
        let response = self
            .control(Method::POST, "indexes")
            .json(&body)
            .send()
            .await?;

        if response.status() == StatusCode::CONFLICT {
            tracing::debug!(index = name, "Index created concurrently");
            return Ok(false);
        }
        self.ensure_success(response, "create index").await?;
        Ok(true)
    }

    /// Describe a single index, including its data-plane host.
    pub async fn describe_index(&self, name: &str) -> Result<IndexDescription, PineconeError> {
        let response = self
            .control(Method::GET, &format!("indexes/{name}"))
            .send()
            .await?;
        let response = self.ensure_success(response, "describe index").await?;
        Ok(response.json().await?)
    }

    /// Poll the index description until it reports ready, returning its data-plane host.
    pub async fn wait_until_ready(
        &self,
        name: &str,
        attempts: usize,
        interval: Duration,
    ) -> Result<String, PineconeError> {
        for attempt in 1..=attempts.max(1) {
            let description = self.describe_index(name).await?;
            if description.is_ready() {
                let host = description
                    .host
                    .filter(|host| !host.trim().is_empty())
                    .ok_or_else(|| PineconeError::MissingHost(name.to_string()))?;
                return data_plane_url(&host);
            }
            tracing::debug!(index = name, attempt, "Index not ready yet");
            tokio::time::sleep(interval).await;
        }
        Err(PineconeError::NotReady(name.to_string()))
    }

    /// Resolve the data-plane URL of an existing index.
    pub async fn resolve_host(&self, name: &str) -> Result<String, PineconeError> {
        let host = self
            .describe_index(name)
            .await?
            .host
            .filter(|host| !host.trim().is_empty())
            .ok_or_else(|| PineconeError::MissingHost(name.to_string()))?;
        data_plane_url(&host)
    }

    /// Upsert records in batches, returning the number Pinecone acknowledged.
    pub async fn upsert(
        &self,
        host: &str,
        records: Vec<VectorRecord>,
    ) -> Result<usize, PineconeError> {
        let mut upserted = 0;
        for batch in records.chunks(UPSERT_BATCH_SIZE) {
            let response = self
                .data(Method::POST, host, "vectors/upsert")
                .json(&json!({ "vectors": batch }))
                .send()
                .await?;
            let response = self.ensure_success(response, "upsert vectors").await?;
            let UpsertResponse { upserted_count } = response.json().await?;
            upserted += upserted_count;
            tracing::debug!(batch = batch.len(), upserted_count, "Vectors upserted");
        }
        Ok(upserted)
    }

    /// Return the `top_k` stored entries most similar to `vector`, with metadata.
    pub async fn query(
        &self,
        host: &str,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<ScoredMatch>, PineconeError> {
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "includeMetadata": true,
            "includeValues": false,
        });
        let response = self
            .data(Method::POST, host, "query")
            .json(&body)
            .send()
            .await?;
        let response = self.ensure_success(response, "query").await?;
        let QueryResponse { matches } = response.json().await?;
        tracing::debug!(top_k, matches = matches.len(), "Pinecone query completed");
        Ok(matches)
    }

    fn control(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.with_headers(
            self.client
                .request(method, format_endpoint(&self.controller_url, path)),
        )
    }

    fn data(&self, method: Method, host: &str, path: &str) -> reqwest::RequestBuilder {
        self.with_headers(self.client.request(method, format_endpoint(host, path)))
    }

    fn with_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    async fn ensure_success(
        &self,
        response: reqwest::Response,
        operation: &str,
    ) -> Result<reqwest::Response, PineconeError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let error = PineconeError::UnexpectedStatus { status, body };
        tracing::error!(operation, error = %error, "Pinecone request failed");
        Err(error)
    }
}

fn normalize_base_url(url: &str) -> Result<String, String> {
    let mut parsed = reqwest::Url::parse(url).map_err(|err| err.to_string())?;
    let path = parsed.path().trim_end_matches('/').to_string();
    parsed.set_path(&path);
    Ok(parsed.to_string().trim_end_matches('/').to_string())
}

/// Index hosts come back without a scheme; data-plane traffic is always HTTPS unless a scheme
/// was given explicitly.
fn data_plane_url(host: &str) -> Result<String, PineconeError> {
    let host = host.trim();
    let candidate = if host.contains("://") {
        host.to_string()
    } else {
        format!("https://{host}")
    };
    normalize_base_url(&candidate).map_err(PineconeError::InvalidUrl)
}

fn format_endpoint(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{path}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use httpmock::{
        Method::{GET, POST},
        MockServer,
    };
    use serde_json::{Map, Value};

    fn service(server: &MockServer) -> PineconeService {
        PineconeService::new(&test_config(&server.base_url())).expect("service")
    }

    #[tokio::test]
    async fn create_index_is_skipped_when_index_exists() {
        let server = MockServer::start_async().await;
        let list = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/indexes")
                    .header("api-key", "pc-test");
                then.status(200).json_body(json!({
                    "indexes": [{ "name": "arogyam", "dimension": 768, "host": "arogyam.example" }]
                }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/indexes");
                then.status(201).json_body(json!({ "name": "arogyam" }));
            })
            .await;

        let pinecone = service(&server);
        let created = pinecone
            .create_index_if_not_exists("arogyam", 768)
            .await
            .expect("first call");
        let created_again = pinecone
            .create_index_if_not_exists("arogyam", 768)
            .await
            .expect("second call");

        assert!(!created);
        assert!(!created_again);
        list.assert_hits_async(2).await;
        create.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn create_index_rejects_existing_index_with_other_dimension() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes");
                then.status(200).json_body(json!({
                    "indexes": [{ "name": "arogyam", "dimension": 1536 }]
                }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/indexes");
                then.status(201).json_body(json!({ "name": "arogyam" }));
            })
            .await;

        let error = service(&server)
            .create_index_if_not_exists("arogyam", 768)
            .await
            .expect_err("dimension mismatch");

        assert!(matches!(
            error,
            PineconeError::DimensionMismatch {
                expected: 768,
                actual: 1536,
                ..
            }
        ));
        create.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn create_index_sends_serverless_cosine_spec() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes");
                then.status(200).json_body(json!({ "indexes": [] }));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/indexes").json_body(json!({
                    "name": "arogyam",
                    "dimension": 768,
                    "metric": "cosine",
                    "spec": { "serverless": { "cloud": "aws", "region": "us-east-1" } }
                }));
                then.status(201).json_body(json!({ "name": "arogyam" }));
            })
            .await;

        let created = service(&server)
            .create_index_if_not_exists("arogyam", 768)
            .await
            .expect("create");

        create.assert_async().await;
        assert!(created);
    }

    #[tokio::test]
    async fn create_index_tolerates_conflict() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes");
                then.status(200).json_body(json!({ "indexes": [] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/indexes");
                then.status(409).body("ALREADY_EXISTS");
            })
            .await;

        let created = service(&server)
            .create_index_if_not_exists("arogyam", 768)
            .await
            .expect("conflict is not an error");
        assert!(!created);
    }

    #[tokio::test]
    async fn upsert_batches_records() {
        let server = MockServer::start_async().await;
        let upsert = server
            .mock_async(|when, then| {
                when.method(POST).path("/vectors/upsert");
                then.status(200).json_body(json!({ "upsertedCount": 100 }));
            })
            .await;

        let records: Vec<VectorRecord> = (0..150)
            .map(|idx| VectorRecord {
                id: format!("id-{idx}"),
                values: vec![0.0; 4],
                metadata: Map::new(),
            })
            .collect();

        let upserted = service(&server)
            .upsert(&server.base_url(), records)
            .await
            .expect("upsert");

        upsert.assert_hits_async(2).await;
        assert_eq!(upserted, 200);
    }

    #[tokio::test]
    async fn query_requests_metadata_and_parses_matches() {
        let server = MockServer::start_async().await;
        let query = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/query")
                    .json_body_partial(r#"{"topK": 5, "includeMetadata": true}"#);
                then.status(200).json_body(json!({
                    "matches": [
                        {
                            "id": "chunk-1",
                            "score": 0.91,
                            "metadata": { "text": "Drink water often.", "source": "a.pdf", "page": 2.0 }
                        },
                        { "id": "chunk-2", "score": 0.5 }
                    ],
                    "namespace": ""
                }));
            })
            .await;

        let matches = service(&server)
            .query(&server.base_url(), vec![0.1, 0.2, 0.3, 0.4], 5)
            .await
            .expect("query");

        query.assert_async().await;
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].id, "chunk-1");
        assert!((matches[0].score - 0.91).abs() < f32::EPSILON);
        assert_eq!(matches[0].text(), Some("Drink water often."));
        assert_eq!(
            matches[0].metadata.as_ref().unwrap()["source"],
            Value::String("a.pdf".into())
        );
        assert_eq!(matches[1].text(), None);
    }

    #[tokio::test]
    async fn query_surfaces_unexpected_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/query");
                then.status(401).body("invalid api key");
            })
            .await;

        let error = service(&server)
            .query(&server.base_url(), vec![0.1], 5)
            .await
            .expect_err("unauthorized");

        assert!(matches!(
            error,
            PineconeError::UnexpectedStatus { status, ref body }
                if status == StatusCode::UNAUTHORIZED && body.contains("invalid api key")
        ));
    }

    #[tokio::test]
    async fn wait_until_ready_returns_https_host() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes/arogyam");
                then.status(200).json_body(json!({
                    "name": "arogyam",
                    "host": "arogyam-abc123.svc.pinecone.io",
                    "status": { "ready": true, "state": "Ready" }
                }));
            })
            .await;

        let host = service(&server)
            .wait_until_ready("arogyam", 3, Duration::from_millis(1))
            .await
            .expect("ready");
        assert_eq!(host, "https://arogyam-abc123.svc.pinecone.io");
    }

    #[tokio::test]
    async fn wait_until_ready_gives_up() {
        let server = MockServer::start_async().await;
        let describe = server
            .mock_async(|when, then| {
                when.method(GET).path("/indexes/arogyam");
                then.status(200).json_body(json!({
                    "name": "arogyam",
                    "status": { "ready": false, "state": "Initializing" }
                }));
            })
            .await;

        let error = service(&server)
            .wait_until_ready("arogyam", 2, Duration::from_millis(1))
            .await
            .expect_err("never ready");
        describe.assert_hits_async(2).await;
        assert!(matches!(error, PineconeError::NotReady(_)));
    }

    #[test]
    fn data_plane_url_keeps_explicit_scheme() {
        assert_eq!(
            data_plane_url("http://127.0.0.1:5080/").unwrap(),
            "http://127.0.0.1:5080"
        );
        assert_eq!(
            data_plane_url("idx.svc.pinecone.io").unwrap(),
            "https://idx.svc.pinecone.io"
        );
    }
}
