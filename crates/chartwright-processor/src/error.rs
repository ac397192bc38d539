//! Error types for resource processing

use chartwright_core::CoreError;
use kube::core::DynamicObject;
use thiserror::Error;

use crate::preview::PreviewError;

/// Result type for processor operations
pub type Result<T> = std::result::Result<T, ProcessError>;

/// Errors raised while turning one resource into a template
///
/// A processor that does not handle a resource kind returns `Ok(None)`;
/// that is never an error.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProcessError {
    /// The object does not match the schema of its declared kind
    #[error("unable to decode {resource}: {source}")]
    Decode {
        resource: String,
        source: serde_json::Error,
    },

    /// Two resources (or two fields) claimed the same values path
    #[error("values conflict while processing {resource}: {source}")]
    Values { resource: String, source: CoreError },

    /// The object carries no apiVersion/kind
    #[error("{resource} has no apiVersion/kind")]
    MissingTypeMeta { resource: String },

    /// Manifest document could not be read as a Kubernetes object
    #[error("invalid manifest document {index}: {source}")]
    InvalidManifest {
        index: usize,
        source: serde_yaml::Error,
    },

    /// Serializing part of the object back to YAML failed
    #[error("failed to serialize {what} of {resource}: {source}")]
    Serialize {
        what: &'static str,
        resource: String,
        source: serde_yaml::Error,
    },

    /// Template preview failed
    #[error("preview of {template} failed: {source}")]
    Preview {
        template: String,
        source: PreviewError,
    },
}

impl ProcessError {
    /// Check if this error is a values-tree collision
    ///
    /// Collisions leave the generated chart incomplete, so callers abort the
    /// whole run on them.
    pub fn is_conflict(&self) -> bool {
        matches!(self, ProcessError::Values { .. })
    }

    /// Check if this error is a malformed input object
    pub fn is_decode(&self) -> bool {
        matches!(
            self,
            ProcessError::Decode { .. }
                | ProcessError::MissingTypeMeta { .. }
                | ProcessError::InvalidManifest { .. }
        )
    }
}

/// Identify a resource as `Kind/name` for diagnostics
pub fn resource_id(obj: &DynamicObject) -> String {
    let kind = obj
        .types
        .as_ref()
        .map(|t| t.kind.as_str())
        .filter(|k| !k.is_empty())
        .unwrap_or("<unknown kind>");
    let name = obj.metadata.name.as_deref().unwrap_or("<unnamed>");
    format!("{}/{}", kind, name)
}
