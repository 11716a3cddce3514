//! Ingest pipeline definitions for embedding generation

use crate::model::ModelRecord;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Embedding output lands in a scratch field first, then a copy processor
/// moves the vector into the user-visible target field.
const TEMP_FIELD_SUFFIX: &str = "_temp";

/// Subfield under which the embedding processor nests the raw vector.
const KNN_SUBFIELD: &str = "knn";

/// A single ingest processor.
///
/// Serializes to the cluster's processor shape: one outer key naming the
/// processor type, the settings object underneath.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Processor {
    TextEmbedding {
        model_id: String,
        field_map: BTreeMap<String, String>,
    },
    Copy {
        source_field: String,
        target_field: String,
        ignore_missing: bool,
        remove_source: bool,
    },
}

/// Body of a `PUT /_ingest/pipeline/{name}` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub description: String,
    pub processors: Vec<Processor>,
}

impl PipelineSpec {
    /// Builds the embedding pipeline for `model` over the given
    /// `(source_field, target_field)` mappings.
    ///
    /// One text_embedding processor writes each source field's vector into a
    /// scratch field, then one copy processor per mapping (in input order)
    /// relocates the nested vector into the target field. The copies tolerate
    /// documents that never produced an embedding and drop the scratch field
    /// afterwards.
    pub fn for_model(
        model: &ModelRecord,
        description: impl Into<String>,
        mappings: &[(String, String)],
    ) -> Self {
        let field_map: BTreeMap<String, String> = mappings
            .iter()
            .map(|(source, target)| (source.clone(), format!("{}{}", target, TEMP_FIELD_SUFFIX)))
            .collect();

        let mut processors = Vec::with_capacity(1 + mappings.len());
        processors.push(Processor::TextEmbedding {
            model_id: model.id.clone(),
            field_map,
        });
        for (_, target) in mappings {
            processors.push(Processor::Copy {
                source_field: format!("{}{}.{}", target, TEMP_FIELD_SUFFIX, KNN_SUBFIELD),
                target_field: target.clone(),
                ignore_missing: true,
                remove_source: true,
            });
        }

        Self {
            description: description.into(),
            processors,
        }
    }
}

lazy_static::lazy_static! {
    static ref WHITESPACE_RUN: Regex =
        Regex::new(r"\s+").expect("whitespace pattern is valid");
}

/// Collapses each whitespace run in a requested pipeline name to a single
/// underscore, yielding an identifier the cluster accepts in URLs.
pub fn sanitize_pipeline_name(name: &str) -> String {
    WHITESPACE_RUN.replace_all(name, "_").into_owned()
}
