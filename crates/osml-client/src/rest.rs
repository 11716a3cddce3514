//! Native OpenSearch ML Client
//!
//! REST access to the cluster's ML plugin (model search, register, deploy,
//! tasks, profile stats) and the ingest pipeline API.
//!
//! ## Configuration
//!
//! HTTP basic auth is optional. Settings come from the environment:
//!
//! ```text
//! OPENSEARCH_URL=https://localhost:9200
//! OPENSEARCH_USERNAME=admin
//! OPENSEARCH_PASSWORD=admin
//! OPENSEARCH_VERIFY_CERTS=false
//! OPENSEARCH_TIMEOUT_SECS=30
//! ```

use crate::api::MlApi;
use async_trait::async_trait;
use osml_core::config::{get_config, get_config_bool, get_config_opt, get_config_u64};
use osml_core::error::{Error, Result};
use osml_core::model::{ModelFormat, ModelRecord, TaskStatus};
use osml_core::pipeline::PipelineSpec;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Fixed result window for the model search. One page covers any realistic
/// model count; search_after paging is not worth carrying here.
const MODEL_SEARCH_WINDOW: usize = 1000;

/// Path constants and builders for the cluster endpoints we touch.
pub mod endpoints {
    pub const ML_BASE: &str = "/_plugins/_ml";
    pub const MODELS_SEARCH: &str = "/_plugins/_ml/models/_search";
    pub const MODELS_REGISTER: &str = "/_plugins/_ml/models/_register";

    pub fn task(task_id: &str) -> String {
        format!("{}/tasks/{}", ML_BASE, task_id)
    }

    pub fn model(model_id: &str) -> String {
        format!("{}/models/{}", ML_BASE, model_id)
    }

    pub fn model_deploy(model_id: &str) -> String {
        format!("{}/models/{}/_deploy", ML_BASE, model_id)
    }

    pub fn model_undeploy(model_id: &str) -> String {
        format!("{}/models/{}/_undeploy", ML_BASE, model_id)
    }

    pub fn model_profile(model_id: &str) -> String {
        format!("{}/profile/models/{}", ML_BASE, model_id)
    }

    pub fn ingest_pipeline(name: &str) -> String {
        format!("/_ingest/pipeline/{}", name)
    }
}

/// Connection settings for [`ClusterClient`]
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub endpoint: String,
    pub username: Option<String>,
    pub password: Option<String>,
    /// Verify TLS certificates. Off by default: local clusters ship
    /// self-signed certs.
    pub verify_certs: bool,
    pub timeout: Duration,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://localhost:9200".to_string(),
            username: None,
            password: None,
            verify_certs: false,
            timeout: Duration::from_secs(30),
        }
    }
}

impl ClusterConfig {
    /// Read settings from `OPENSEARCH_*` environment variables, falling back
    /// to the defaults above for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: get_config("OPENSEARCH_URL", &defaults.endpoint),
            username: get_config_opt("OPENSEARCH_USERNAME"),
            password: get_config_opt("OPENSEARCH_PASSWORD"),
            verify_certs: get_config_bool("OPENSEARCH_VERIFY_CERTS", defaults.verify_certs),
            timeout: Duration::from_secs(get_config_u64("OPENSEARCH_TIMEOUT_SECS", 30)),
        }
    }
}

/// HTTP basic auth credentials
#[derive(Clone, Debug)]
struct BasicCredentials {
    username: String,
    password: Option<String>,
}

/// Cluster root-info response, used by the health probe
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    pub cluster_name: String,
    pub version: ClusterVersion,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusterVersion {
    pub number: String,
}

/// OpenSearch client scoped to the ML plugin and ingest pipeline APIs
pub struct ClusterClient {
    client: Client,
    base_url: String,
    credentials: Option<BasicCredentials>,
}

impl ClusterClient {
    /// Create a new client with default settings
    pub fn new() -> Self {
        Self::with_config(ClusterConfig::default())
    }

    /// Create a client with custom configuration
    pub fn with_config(config: ClusterConfig) -> Self {
        let client = Client::builder()
            .danger_accept_invalid_certs(!config.verify_certs)
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to create HTTP client");

        let credentials = config.username.map(|username| BasicCredentials {
            username,
            password: config.password,
        });

        Self {
            client,
            base_url: config.endpoint.trim_end_matches('/').to_string(),
            credentials,
        }
    }

    /// Create a client from environment variables
    pub fn from_env() -> Self {
        Self::with_config(ClusterConfig::from_env())
    }

    /// Get the base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Check that the cluster is reachable and answering
    pub async fn ping(&self) -> Result<ClusterInfo> {
        self.get_json("/").await
    }

    /// Attach basic auth if credentials are configured
    fn authorize(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.credentials {
            Some(creds) => req.basic_auth(&creds.username, creds.password.as_ref()),
            None => req,
        }
    }

    /// Make a GET request to the cluster
    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let req = self.authorize(self.client.get(&url));
        let resp = req
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;
        Self::into_json(resp).await
    }

    /// Make a POST request with a JSON body
    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {}", url);

        let req = self.authorize(self.client.post(&url).json(body));
        let resp = req
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;
        Self::into_json(resp).await
    }

    /// Make a PUT request with a JSON body
    async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("PUT {}", url);

        let req = self.authorize(self.client.put(&url).json(body));
        let resp = req
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;
        Self::into_json(resp).await
    }

    /// Make a DELETE request to the cluster
    async fn delete_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("DELETE {}", url);

        let req = self.authorize(self.client.delete(&url));
        let resp = req
            .send()
            .await
            .map_err(|e| Error::transport(e.to_string()))?;
        Self::into_json(resp).await
    }

    /// Decode a response, surfacing non-success statuses with their body text
    async fn into_json<T: for<'de> Deserialize<'de>>(resp: Response) -> Result<T> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Api {
                status: status.as_u16(),
                body,
            });
        }

        resp.json().await.map_err(|e| Error::unexpected(e.to_string()))
    }
}

impl Default for ClusterClient {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Wire shapes
// =============================================================================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    hits: SearchHits,
}

#[derive(Debug, Deserialize)]
struct SearchHits {
    #[serde(default)]
    hits: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    #[serde(rename = "_id")]
    id: String,
    #[serde(rename = "_source")]
    source: ModelSource,
}

#[derive(Debug, Deserialize)]
struct ModelSource {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    model_version: Option<String>,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
    name: &'a str,
    version: &'a str,
    model_format: ModelFormat,
}

#[derive(Debug, Deserialize)]
struct TaskSubmission {
    task_id: String,
}

fn records_from_search(resp: SearchResponse) -> Vec<ModelRecord> {
    resp.hits
        .hits
        .into_iter()
        .map(|hit| ModelRecord {
            name: hit.source.name.unwrap_or_default(),
            version: hit.source.model_version.unwrap_or_default(),
            id: hit.id,
        })
        .collect()
}

/// Pull the deployment state out of a profile response.
///
/// The profile nests state per node under
/// `nodes.{node_id}.models.{model_id}.model_state`; the first node reporting
/// a state wins.
fn extract_model_state(profile: &Value, model_id: &str) -> Option<String> {
    let nodes = profile.get("nodes")?.as_object()?;
    for node in nodes.values() {
        let state = node
            .get("models")
            .and_then(|models| models.get(model_id))
            .and_then(|model| model.get("model_state"))
            .and_then(Value::as_str);
        if let Some(state) = state {
            return Some(state.to_string());
        }
    }
    None
}

#[async_trait]
impl MlApi for ClusterClient {
    async fn search_models(&self) -> Result<Vec<ModelRecord>> {
        // Root model documents only; chunk documents carry a chunk_number field
        let body = json!({
            "query": {
                "bool": {
                    "must_not": {
                        "exists": { "field": "chunk_number" }
                    }
                }
            },
            "size": MODEL_SEARCH_WINDOW,
        });

        let resp: SearchResponse = self.post_json(endpoints::MODELS_SEARCH, &body).await?;
        Ok(records_from_search(resp))
    }

    async fn register_model(
        &self,
        name: &str,
        version: &str,
        format: ModelFormat,
    ) -> Result<String> {
        info!("Registering model '{}' v{} ({})", name, version, format);
        let path = format!("{}?deploy=true", endpoints::MODELS_REGISTER);
        let submission: TaskSubmission = self
            .post_json(
                &path,
                &RegisterRequest {
                    name,
                    version,
                    model_format: format,
                },
            )
            .await?;
        Ok(submission.task_id)
    }

    async fn deploy_model(&self, model_id: &str) -> Result<String> {
        info!("Deploying model {}", model_id);
        let submission: TaskSubmission = self
            .post_json(&endpoints::model_deploy(model_id), &json!({}))
            .await?;
        Ok(submission.task_id)
    }

    async fn undeploy_model(&self, model_id: &str) -> Result<()> {
        info!("Undeploying model {}", model_id);
        let _: Value = self
            .post_json(&endpoints::model_undeploy(model_id), &json!({}))
            .await?;
        Ok(())
    }

    async fn delete_model(&self, model_id: &str) -> Result<()> {
        info!("Deleting model {}", model_id);
        let _: Value = self.delete_json(&endpoints::model(model_id)).await?;
        Ok(())
    }

    async fn task_status(&self, task_id: &str) -> Result<TaskStatus> {
        self.get_json(&endpoints::task(task_id)).await
    }

    async fn model_state(&self, model_id: &str) -> Result<Option<String>> {
        let profile: Value = self.get_json(&endpoints::model_profile(model_id)).await?;
        Ok(extract_model_state(&profile, model_id))
    }

    async fn put_pipeline(&self, name: &str, spec: &PipelineSpec) -> Result<()> {
        info!("Creating ingest pipeline '{}'", name);
        let _: Value = self
            .put_json(&endpoints::ingest_pipeline(name), spec)
            .await?;
        Ok(())
    }
}
