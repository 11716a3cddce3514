//! osml-client: REST access to the cluster's ML plugin
//!
//! Features:
//! - `MlApi` trait: the seam the lifecycle layer is written against
//! - `ClusterClient`: reqwest implementation with optional basic auth
//! - Endpoint path constants for the ML plugin and ingest pipeline APIs

pub mod api;
pub mod rest;

pub use api::{MlApi, SharedApi};
pub use rest::{ClusterClient, ClusterConfig, ClusterInfo};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::api::{MlApi, SharedApi};
    pub use super::rest::{ClusterClient, ClusterConfig};
}
