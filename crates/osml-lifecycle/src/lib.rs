//! osml-lifecycle: model lifecycle orchestration
//!
//! Features:
//! - Catalog cache over the cluster's registered models
//! - Multi-tier identifier resolution (exact name, id, pattern)
//! - Task polling with first-class timeout and cancellation
//! - Idempotent register / deploy / undeploy / delete flows and ingest
//!   pipeline wiring

pub mod catalog;
pub mod manager;
pub mod poller;
pub mod resolver;

#[cfg(test)]
pub(crate) mod testing;

pub use catalog::ModelCatalog;
pub use manager::ModelManager;
pub use poller::{await_completion, PollSettings};
pub use resolver::{IdentifierResolver, NameMatcher, RegexMatcher, SubstringMatcher};

/// Prelude for convenient imports
pub mod prelude {
    pub use super::catalog::ModelCatalog;
    pub use super::manager::ModelManager;
    pub use super::poller::{await_completion, PollSettings};
    pub use super::resolver::{IdentifierResolver, NameMatcher};
}
