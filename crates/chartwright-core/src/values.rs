//! Values tree with conflict-checked insertion and merging

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::path::Path;

use crate::error::{CoreError, Result};

/// Nested default-values document
///
/// Keys are kept sorted so the same set of insertions always serializes
/// to the same `values.yaml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Values(pub JsonValue);

impl Default for Values {
    fn default() -> Self {
        Self::new()
    }
}

impl Values {
    /// Create empty values
    pub fn new() -> Self {
        Self(JsonValue::Object(serde_json::Map::new()))
    }

    /// Load values from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse values from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let value: JsonValue = serde_yaml::from_str(yaml)?;
        Ok(Self(value))
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.0)?)
    }

    /// Insert a value at `path`, creating intermediate mappings as needed.
    ///
    /// Returns the leaf previously stored at `path`, if any. Walking through
    /// a leaf, or replacing a mapping with a new value, is a
    /// [`CoreError::Conflict`] and leaves the tree untouched.
    ///
    /// ```
    /// use chartwright_core::Values;
    ///
    /// let mut values = Values::new();
    /// values.insert(&["web", "enabled"], true).unwrap();
    /// assert!(values.insert(&["web", "enabled", "x"], 1).is_err());
    /// ```
    pub fn insert<V: Into<JsonValue>>(
        &mut self,
        path: &[&str],
        value: V,
    ) -> Result<Option<JsonValue>> {
        let Some((last, parents)) = path.split_last() else {
            return Err(CoreError::Conflict {
                path: String::new(),
                message: "cannot insert at an empty path".to_string(),
            });
        };

        let mut current = &mut self.0;
        for (depth, key) in parents.iter().enumerate() {
            let map = current.as_object_mut().ok_or_else(|| CoreError::Conflict {
                path: join_path(&path[..depth]),
                message: "segment holds a value, not a mapping".to_string(),
            })?;
            current = map
                .entry(key.to_string())
                .or_insert_with(|| JsonValue::Object(serde_json::Map::new()));
        }

        let map = current.as_object_mut().ok_or_else(|| CoreError::Conflict {
            path: join_path(parents),
            message: "segment holds a value, not a mapping".to_string(),
        })?;

        if map.get(*last).is_some_and(JsonValue::is_object) {
            return Err(CoreError::Conflict {
                path: join_path(path),
                message: "refusing to replace a mapping with a value".to_string(),
            });
        }

        Ok(map.insert(last.to_string(), value.into()))
    }

    /// Get a value by path segments
    pub fn get(&self, path: &[&str]) -> Option<&JsonValue> {
        path.iter()
            .try_fold(&self.0, |value, key| value.as_object()?.get(*key))
    }

    /// Merge a values fragment into this document
    ///
    /// Rules:
    /// - Mappings: recursive merge
    /// - Missing keys: copied from the fragment
    /// - Equal leaves: kept
    /// - Anything else (leaf vs. different leaf, leaf vs. mapping): conflict
    pub fn merge_fragment(&mut self, fragment: &Values) -> Result<()> {
        let mut path = Vec::new();
        merge_checked(&mut self.0, &fragment.0, &mut path)
    }

    /// Merge many fragments in order, stopping at the first conflict
    pub fn merge_all<'a, I>(fragments: I) -> Result<Self>
    where
        I: IntoIterator<Item = &'a Values>,
    {
        let mut result = Values::new();
        for fragment in fragments {
            result.merge_fragment(fragment)?;
        }
        Ok(result)
    }

    /// Get the inner JSON value
    pub fn inner(&self) -> &JsonValue {
        &self.0
    }

    /// Convert to JSON value
    pub fn into_inner(self) -> JsonValue {
        self.0
    }

    /// Check if values are empty
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            JsonValue::Object(map) => map.is_empty(),
            JsonValue::Null => true,
            _ => false,
        }
    }
}

fn join_path(path: &[&str]) -> String {
    path.join(".")
}

fn merge_checked(base: &mut JsonValue, overlay: &JsonValue, path: &mut Vec<String>) -> Result<()> {
    match (base, overlay) {
        (JsonValue::Object(base_map), JsonValue::Object(overlay_map)) => {
            for (key, overlay_value) in overlay_map {
                path.push(key.clone());
                match base_map.get_mut(key) {
                    Some(base_value) => merge_checked(base_value, overlay_value, path)?,
                    None => {
                        base_map.insert(key.clone(), overlay_value.clone());
                    }
                }
                path.pop();
            }
            Ok(())
        }
        (base, overlay) if *base == *overlay => Ok(()),
        (base, overlay) => Err(CoreError::Conflict {
            path: path.join("."),
            message: format!("existing {} collides with {}", describe(base), describe(overlay)),
        }),
    }
}

fn describe(value: &JsonValue) -> String {
    match value {
        JsonValue::Object(_) => "mapping".to_string(),
        JsonValue::Array(_) => "list".to_string(),
        other => format!("value {}", other),
    }
}
