//! CLI error types with exit code handling

use chartwright_core::CoreError;
use chartwright_processor::ProcessError;
use miette::Diagnostic;
use thiserror::Error;

use crate::exit_codes;

/// CLI-specific error type that includes exit code information
#[derive(Error, Debug, Diagnostic, Clone)]
pub enum CliError {
    /// A manifest could not be decoded
    #[error("Decode error: {message}")]
    #[diagnostic(code(chartwright::cli::decode))]
    Decode {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// Two resources produced the same values path
    #[error("Values conflict: {message}")]
    #[diagnostic(
        code(chartwright::cli::conflict),
        help("rename one of the resources or pass a different --prefix")
    )]
    Conflict { message: String },

    /// Invalid arguments or refused operation
    #[error("{message}")]
    #[diagnostic(code(chartwright::cli::input))]
    Input {
        message: String,
        #[help]
        help: Option<String>,
    },

    /// IO error (file not found, permissions, etc.)
    #[error("IO error: {message}")]
    #[diagnostic(code(chartwright::cli::io))]
    Io { message: String },

    /// Anything else
    #[error("{message}")]
    #[diagnostic(code(chartwright::cli::error))]
    Other { message: String },
}

impl CliError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Decode { .. } => exit_codes::DECODE_ERROR,
            CliError::Conflict { .. } => exit_codes::CONFLICT_ERROR,
            CliError::Io { .. } => exit_codes::IO_ERROR,
            CliError::Input { .. } | CliError::Other { .. } => exit_codes::ERROR,
        }
    }

    /// Create an input error with help text
    pub fn input_with_help(message: impl Into<String>, help: impl Into<String>) -> Self {
        Self::Input {
            message: message.into(),
            help: Some(help.into()),
        }
    }

    /// Create an IO error naming the path involved
    pub fn io_at(path: impl std::fmt::Display, err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{}: {}", path, err),
        }
    }

    /// Prefix the message with the input it came from
    pub fn in_input(self, input: impl std::fmt::Display) -> Self {
        match self {
            CliError::Decode { message, help } => CliError::Decode {
                message: format!("{}: {}", input, message),
                help,
            },
            other => other,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(err: std::io::Error) -> Self {
        CliError::Io {
            message: err.to_string(),
        }
    }
}

impl From<ProcessError> for CliError {
    fn from(err: ProcessError) -> Self {
        let message = err.to_string();
        if err.is_decode() {
            CliError::Decode {
                message,
                help: Some("check the manifest against its apiVersion/kind schema".to_string()),
            }
        } else if err.is_conflict() {
            CliError::Conflict { message }
        } else {
            CliError::Other { message }
        }
    }
}

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        match err {
            CoreError::Conflict { .. } => CliError::Conflict { message },
            CoreError::Io(_) => CliError::Io { message },
            CoreError::InvalidChartName { .. } => CliError::Input {
                message,
                help: Some("chart names may not contain whitespace or quotes".to_string()),
            },
            _ => CliError::Other { message },
        }
    }
}

/// Result type for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chartwright_processor::parse_manifests;

    #[test]
    fn test_exit_codes() {
        let decode = CliError::from(parse_manifests("a: [").unwrap_err());
        assert_eq!(decode.exit_code(), exit_codes::DECODE_ERROR);

        let conflict = CliError::from(CoreError::Conflict {
            path: "pdb.enabled".to_string(),
            message: "different values".to_string(),
        });
        assert_eq!(conflict.exit_code(), exit_codes::CONFLICT_ERROR);

        let io = CliError::io_at("missing.yaml", std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(io.exit_code(), exit_codes::IO_ERROR);
        assert!(io.to_string().contains("missing.yaml"));

        let name = CliError::from(chartwright_core::ChartMeta::new("my app").unwrap_err());
        assert_eq!(name.exit_code(), exit_codes::ERROR);
    }

    #[test]
    fn test_in_input_prefixes_decode_errors_only() {
        let decode = CliError::Decode {
            message: "bad".to_string(),
            help: None,
        }
        .in_input("pdb.yaml");
        assert_eq!(decode.to_string(), "Decode error: pdb.yaml: bad");

        let other = CliError::Other {
            message: "bad".to_string(),
        }
        .in_input("pdb.yaml");
        assert_eq!(other.to_string(), "bad");
    }
}
