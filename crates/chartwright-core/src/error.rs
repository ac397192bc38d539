//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("values conflict at '{path}': {message}")]
    Conflict { path: String, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid chart name '{name}': {message}")]
    InvalidChartName { name: String, message: String },
}

impl CoreError {
    /// Check if this error is a values-tree path collision
    pub fn is_conflict(&self) -> bool {
        matches!(self, CoreError::Conflict { .. })
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
