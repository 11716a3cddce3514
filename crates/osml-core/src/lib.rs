//! Core types for osml
//!
//! # Modules
//!
//! - `config`: Environment-backed configuration helpers
//! - `error`: Error types and Result alias
//! - `model`: Model records, formats, and task states
//! - `pipeline`: Ingest pipeline specs for embedding generation

pub mod config;
pub mod error;
pub mod model;
pub mod pipeline;

// Re-exports
pub use error::{Error, Result};
pub use model::{ModelFormat, ModelRecord, TaskStatus};
pub use pipeline::{sanitize_pipeline_name, PipelineSpec, Processor};

/// Common imports for crates building on osml-core.
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::model::{
        ModelFormat, ModelRecord, TaskStatus, MODEL_STATE_DEPLOYED, TASK_STATE_COMPLETED,
        TASK_STATE_FAILED,
    };
    pub use crate::pipeline::{sanitize_pipeline_name, PipelineSpec, Processor};
}
