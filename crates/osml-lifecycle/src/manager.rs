//! Lifecycle Orchestration
//!
//! Composes the catalog, resolver, and poller into idempotent register,
//! deploy, undeploy, and delete flows plus ingest pipeline wiring.

use crate::catalog::ModelCatalog;
use crate::poller::{await_completion, PollSettings};
use crate::resolver::IdentifierResolver;
use osml_client::api::{MlApi, SharedApi};
use osml_core::error::{Error, Result};
use osml_core::model::{ModelFormat, ModelRecord, MODEL_STATE_DEPLOYED};
use osml_core::pipeline::{sanitize_pipeline_name, PipelineSpec};
use std::sync::Arc;
use tracing::{info, warn};

/// Orchestrates model lifecycle operations against the cluster.
///
/// Within every operation the order is: resolve, then mutate, then
/// invalidate the catalog, then re-resolve, as sequential awaits.
pub struct ModelManager {
    api: SharedApi,
    catalog: Arc<ModelCatalog>,
    resolver: IdentifierResolver,
}

impl ModelManager {
    pub fn new(api: SharedApi) -> Self {
        let catalog = Arc::new(ModelCatalog::new(api.clone()));
        let resolver = IdentifierResolver::new(catalog.clone());
        Self {
            api,
            catalog,
            resolver,
        }
    }

    /// Access the resolver directly, for existence checks and tooling.
    pub fn resolver(&self) -> &IdentifierResolver {
        &self.resolver
    }

    /// List known models, optionally forcing a catalog refresh.
    pub async fn models(&self, refresh: bool) -> Result<Vec<ModelRecord>> {
        self.catalog.list(refresh).await
    }

    /// Drop the cached catalog; the next resolution refetches.
    pub async fn refresh_catalog(&self) {
        self.catalog.invalidate().await;
    }

    /// Register a model (with immediate deployment) and wait for it to come
    /// up.
    ///
    /// Idempotent: when the resolver already finds `name`, that record is
    /// returned unchanged and no register call is made. Poll failures arrive
    /// as the registration error flavors; see
    /// [`Error::is_registration_failure`].
    pub async fn register(
        &self,
        name: &str,
        version: &str,
        format: ModelFormat,
        poll: PollSettings,
    ) -> Result<ModelRecord> {
        if let Some(existing) = self.resolver.resolve(name).await? {
            info!("Model '{}' already registered as {}", name, existing);
            return Ok(existing);
        }

        let task_id = self.api.register_model(name, version, format).await?;
        await_completion(self.api.as_ref(), &task_id, poll)
            .await
            .map_err(|e| wrap_registration_error(name, e))?;

        self.catalog.invalidate().await;
        self.resolver.resolve_required(name).await
    }

    /// True only when the resolved model currently reports DEPLOYED.
    ///
    /// Fail-safe: a resolution miss or any error while checking yields
    /// `false` with a warning, never an error.
    pub async fn is_deployed(&self, identifier: &str) -> bool {
        let resolved = match self.resolver.resolve(identifier).await {
            Ok(Some(record)) => record,
            Ok(None) => return false,
            Err(e) => {
                warn!("Deployment check could not resolve '{}': {}", identifier, e);
                return false;
            }
        };

        match self.api.model_state(&resolved.id).await {
            Ok(state) => state.as_deref() == Some(MODEL_STATE_DEPLOYED),
            Err(e) => {
                warn!("Deployment check for '{}' failed: {}", identifier, e);
                false
            }
        }
    }

    /// Deploy a model unless it already reports DEPLOYED.
    ///
    /// Poll failures propagate untranslated; only registration wraps them.
    pub async fn ensure_deployed(
        &self,
        identifier: &str,
        poll: PollSettings,
    ) -> Result<ModelRecord> {
        if self.is_deployed(identifier).await {
            return self.resolver.resolve_required(identifier).await;
        }

        let resolved = self.resolver.resolve_required(identifier).await?;
        let task_id = self.api.deploy_model(&resolved.id).await?;
        await_completion(self.api.as_ref(), &task_id, poll).await?;

        self.catalog.invalidate().await;
        self.resolver.resolve_required(identifier).await
    }

    /// Undeploy a model. Synchronous at the API boundary; no polling.
    pub async fn undeploy(&self, identifier: &str) -> Result<()> {
        let resolved = self.resolver.resolve_required(identifier).await?;
        self.api.undeploy_model(&resolved.id).await?;
        info!("Undeployed {}", resolved);
        Ok(())
    }

    /// Remove a model from the cluster. Destructive and irreversible.
    ///
    /// Undeploys first, tolerating any undeploy failure as the
    /// already-undeployed case; the delete call is the authoritative gate.
    pub async fn delete(&self, identifier: &str) -> Result<()> {
        let resolved = self.resolver.resolve_required(identifier).await?;

        if let Err(e) = self.api.undeploy_model(&resolved.id).await {
            warn!("Undeploy before delete of {} failed: {}", resolved, e);
        }
        self.api.delete_model(&resolved.id).await?;
        info!("Deleted {}", resolved);

        self.catalog.invalidate().await;
        Ok(())
    }

    /// Create an ingest pipeline that embeds the mapped fields with the
    /// resolved model. Returns the sanitized pipeline name.
    pub async fn create_pipeline(
        &self,
        name: &str,
        model_identifier: &str,
        description: &str,
        field_map: &[(String, String)],
    ) -> Result<String> {
        let resolved = self.resolver.resolve_required(model_identifier).await?;
        let pipeline_name = sanitize_pipeline_name(name);
        let spec = PipelineSpec::for_model(&resolved, description, field_map);

        self.api.put_pipeline(&pipeline_name, &spec).await?;
        info!("Created pipeline '{}' using {}", pipeline_name, resolved);
        Ok(pipeline_name)
    }
}

/// Translate poll failures into the registration error flavors.
fn wrap_registration_error(name: &str, err: Error) -> Error {
    match err {
        Error::TaskTimeout { task_id, elapsed } => Error::RegistrationTimeout {
            name: name.to_string(),
            elapsed,
            source: Box::new(Error::TaskTimeout { task_id, elapsed }),
        },
        other => Error::Registration {
            name: name.to_string(),
            source: Box::new(other),
        },
    }
}
