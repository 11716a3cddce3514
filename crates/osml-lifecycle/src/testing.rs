//! Scripted in-memory collaborator for unit tests

use async_trait::async_trait;
use osml_client::api::MlApi;
use osml_core::error::{Error, Result};
use osml_core::model::{ModelFormat, ModelRecord, TaskStatus, TASK_STATE_COMPLETED};
use osml_core::pipeline::PipelineSpec;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

pub fn record(name: &str, version: &str, id: &str) -> ModelRecord {
    ModelRecord::new(name, version, id)
}

pub fn task(state: &str, error: Option<&str>) -> TaskStatus {
    TaskStatus {
        state: state.to_string(),
        error: error.map(str::to_string),
        model_id: None,
        task_type: None,
    }
}

/// Scripted `MlApi` double.
///
/// Catalog contents, task-state sequences, and per-model deployment states
/// are all set up front; atomic counters let tests assert exact external
/// call counts through an `Arc`.
#[derive(Default)]
pub struct MockApi {
    /// Records returned by `search_models`.
    pub models: Mutex<Vec<ModelRecord>>,
    /// Record added to `models` when `register_model` is called. When unset,
    /// registration synthesizes a record from the request.
    pub pending_model: Mutex<Option<ModelRecord>>,
    /// Statuses returned by successive `task_status` calls. The final entry
    /// repeats; an empty queue always reports COMPLETED.
    pub task_states: Mutex<VecDeque<TaskStatus>>,
    /// Deployment state per model id, as the profile endpoint would report.
    pub model_states: Mutex<HashMap<String, String>>,
    /// Pipelines received via `put_pipeline`, in call order.
    pub pipelines: Mutex<Vec<(String, PipelineSpec)>>,

    pub search_calls: AtomicUsize,
    pub register_calls: AtomicUsize,
    pub deploy_calls: AtomicUsize,
    pub undeploy_calls: AtomicUsize,
    pub delete_calls: AtomicUsize,
    pub poll_calls: AtomicUsize,

    pub fail_search: AtomicBool,
    pub fail_model_state: AtomicBool,
    pub fail_undeploy: AtomicBool,
}

impl MockApi {
    pub fn with_models(models: Vec<ModelRecord>) -> Self {
        let mock = Self::default();
        *mock.models.lock().unwrap() = models;
        mock
    }

    pub fn queue_tasks(&self, states: Vec<TaskStatus>) {
        *self.task_states.lock().unwrap() = states.into();
    }

    pub fn set_pending_model(&self, record: ModelRecord) {
        *self.pending_model.lock().unwrap() = Some(record);
    }

    pub fn set_model_state(&self, model_id: &str, state: &str) {
        self.model_states
            .lock()
            .unwrap()
            .insert(model_id.to_string(), state.to_string());
    }
}

#[async_trait]
impl MlApi for MockApi {
    async fn search_models(&self) -> Result<Vec<ModelRecord>> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search.load(Ordering::SeqCst) {
            return Err(Error::transport("search unavailable"));
        }
        Ok(self.models.lock().unwrap().clone())
    }

    async fn register_model(
        &self,
        name: &str,
        version: &str,
        _format: ModelFormat,
    ) -> Result<String> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        let registered = self
            .pending_model
            .lock()
            .unwrap()
            .take()
            .unwrap_or_else(|| ModelRecord::new(name, version, format!("{}-id", name)));
        self.models.lock().unwrap().push(registered);
        Ok("task-register".to_string())
    }

    async fn deploy_model(&self, _model_id: &str) -> Result<String> {
        self.deploy_calls.fetch_add(1, Ordering::SeqCst);
        Ok("task-deploy".to_string())
    }

    async fn undeploy_model(&self, _model_id: &str) -> Result<()> {
        self.undeploy_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_undeploy.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 500,
                body: "undeploy failed".to_string(),
            });
        }
        Ok(())
    }

    async fn delete_model(&self, model_id: &str) -> Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.models.lock().unwrap().retain(|m| m.id != model_id);
        Ok(())
    }

    async fn task_status(&self, _task_id: &str) -> Result<TaskStatus> {
        self.poll_calls.fetch_add(1, Ordering::SeqCst);
        let mut queue = self.task_states.lock().unwrap();
        let status = if queue.len() > 1 {
            queue.pop_front().expect("queue checked non-empty")
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| task(TASK_STATE_COMPLETED, None))
        };
        Ok(status)
    }

    async fn model_state(&self, model_id: &str) -> Result<Option<String>> {
        if self.fail_model_state.load(Ordering::SeqCst) {
            return Err(Error::Api {
                status: 503,
                body: "profile unavailable".to_string(),
            });
        }
        Ok(self.model_states.lock().unwrap().get(model_id).cloned())
    }

    async fn put_pipeline(&self, name: &str, spec: &PipelineSpec) -> Result<()> {
        self.pipelines
            .lock()
            .unwrap()
            .push((name.to_string(), spec.clone()));
        Ok(())
    }
}
