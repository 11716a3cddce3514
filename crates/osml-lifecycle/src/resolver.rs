//! Identifier Resolution
//!
//! Maps user-supplied identifiers (exact name, internal id, or partial
//! pattern) to catalog records. Tiers are tried in strict priority order and
//! short-circuit on first match.

use crate::catalog::ModelCatalog;
use osml_core::error::{Error, Result};
use osml_core::model::ModelRecord;
use regex::RegexBuilder;
use std::cmp::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Pattern matching capability for the partial-match tier.
///
/// The resolver's contract is independent of how patterns match; swapping
/// the matcher changes only which names tier 3 considers.
pub trait NameMatcher: Sized {
    /// Compile a user-supplied pattern. Malformed patterns are a client
    /// error, not an empty result.
    fn compile(pattern: &str) -> Result<Self>;

    fn matches(&self, name: &str) -> bool;
}

/// Case-insensitive regular-expression matching, the default.
pub struct RegexMatcher(regex::Regex);

impl NameMatcher for RegexMatcher {
    fn compile(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| Error::InvalidIdentifierPattern {
                pattern: pattern.to_string(),
                reason: e.to_string(),
            })?;
        Ok(Self(regex))
    }

    fn matches(&self, name: &str) -> bool {
        self.0.is_match(name)
    }
}

/// Case-insensitive substring matching. Compilation never fails, so any
/// pattern that would be invalid regex still resolves.
pub struct SubstringMatcher(String);

impl NameMatcher for SubstringMatcher {
    fn compile(pattern: &str) -> Result<Self> {
        Ok(Self(pattern.to_lowercase()))
    }

    fn matches(&self, name: &str) -> bool {
        name.to_lowercase().contains(&self.0)
    }
}

/// Compare two version strings.
///
/// Plain lexical comparison, matching the cluster-side convention. Known
/// limitation: multi-digit components sort wrong ("1.9" beats "1.10"). Kept
/// deliberately so resolution picks the same record an operator scanning the
/// raw strings would predict.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

/// Resolves identifiers against the shared catalog.
pub struct IdentifierResolver {
    catalog: Arc<ModelCatalog>,
}

impl IdentifierResolver {
    pub fn new(catalog: Arc<ModelCatalog>) -> Self {
        Self { catalog }
    }

    /// Resolve with the default regex matcher.
    pub async fn resolve(&self, identifier: &str) -> Result<Option<ModelRecord>> {
        self.resolve_with::<RegexMatcher>(identifier).await
    }

    /// Resolve using a caller-chosen matcher for the partial-match tier.
    ///
    /// Tier order: exact name, exact id, then pattern match over names with
    /// the maximum version winning among pattern matches.
    pub async fn resolve_with<M: NameMatcher>(
        &self,
        identifier: &str,
    ) -> Result<Option<ModelRecord>> {
        let models = self.catalog.list(false).await?;

        if let Some(found) = models.iter().find(|m| m.name == identifier) {
            debug!("Resolved '{}' by exact name: {}", identifier, found);
            return Ok(Some(found.clone()));
        }

        if let Some(found) = models.iter().find(|m| m.id == identifier) {
            debug!("Resolved '{}' by id: {}", identifier, found);
            return Ok(Some(found.clone()));
        }

        let matcher = M::compile(identifier)?;
        let found = models
            .iter()
            .filter(|m| matcher.matches(&m.name))
            .max_by(|a, b| compare_versions(&a.version, &b.version))
            .cloned();
        if let Some(ref found) = found {
            debug!("Resolved '{}' by pattern: {}", identifier, found);
        }
        Ok(found)
    }

    /// Resolve, converting a miss into [`Error::ModelNotFound`].
    pub async fn resolve_required(&self, identifier: &str) -> Result<ModelRecord> {
        self.resolve(identifier)
            .await?
            .ok_or_else(|| Error::model_not_found(identifier))
    }
}
