//! ML Plugin API Trait
//!
//! This module defines the interface the lifecycle layer talks to. The
//! production implementation is [`crate::rest::ClusterClient`]; tests supply
//! in-memory fakes.

use async_trait::async_trait;
use osml_core::error::Result;
use osml_core::model::{ModelFormat, ModelRecord, TaskStatus};
use osml_core::pipeline::PipelineSpec;
use std::sync::Arc;

/// Shared handle for dynamic dispatch
pub type SharedApi = Arc<dyn MlApi>;

/// Operations the cluster's ML plugin exposes.
///
/// Long-running operations (register, deploy) return a task id; callers poll
/// [`MlApi::task_status`] until the task reaches a terminal state.
#[async_trait]
pub trait MlApi: Send + Sync {
    /// List all registered models, one record per model (chunks excluded).
    async fn search_models(&self) -> Result<Vec<ModelRecord>>;

    /// Register a model and request immediate deployment. Returns the task id.
    async fn register_model(
        &self,
        name: &str,
        version: &str,
        format: ModelFormat,
    ) -> Result<String>;

    /// Deploy an already-registered model. Returns the task id.
    async fn deploy_model(&self, model_id: &str) -> Result<String>;

    /// Undeploy a model from all nodes.
    async fn undeploy_model(&self, model_id: &str) -> Result<()>;

    /// Delete a registered model.
    async fn delete_model(&self, model_id: &str) -> Result<()>;

    /// Fetch the current status of a long-running task.
    async fn task_status(&self, task_id: &str) -> Result<TaskStatus>;

    /// Fetch the deployment state reported for a model, if any node knows it.
    async fn model_state(&self, model_id: &str) -> Result<Option<String>>;

    /// Create or overwrite an ingest pipeline.
    async fn put_pipeline(&self, name: &str, spec: &PipelineSpec) -> Result<()>;
}
