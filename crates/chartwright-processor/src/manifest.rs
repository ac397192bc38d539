//! Reading Kubernetes manifests into untyped objects

use kube::core::DynamicObject;

use crate::error::{ProcessError, Result};

/// Parse a YAML manifest (possibly multi-document) into dynamic objects
///
/// Empty and comment-only documents are skipped.
pub fn parse_manifests(manifest: &str) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();

    for (index, doc) in split_documents(manifest).into_iter().enumerate() {
        if doc
            .lines()
            .all(|l| l.trim().is_empty() || l.trim().starts_with('#'))
        {
            continue;
        }

        let obj: DynamicObject = serde_yaml::from_str(doc)
            .map_err(|source| ProcessError::InvalidManifest { index, source })?;
        objects.push(obj);
    }

    Ok(objects)
}

/// Split on `---` document markers that start a line
fn split_documents(manifest: &str) -> Vec<&str> {
    let mut docs = Vec::new();
    let mut start = 0;
    let mut offset = 0;

    for line in manifest.split_inclusive('\n') {
        let marker = line.trim_end();
        if marker == "---" || marker.starts_with("--- ") {
            docs.push(&manifest[start..offset]);
            start = offset + line.len();
        }
        offset += line.len();
    }
    docs.push(&manifest[start..]);

    docs
}
