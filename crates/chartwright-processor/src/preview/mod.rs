//! Template preview
//!
//! Renders generated templates with a values document, so a chart can be
//! checked without a Helm installation. Only the template subset emitted by
//! chartwright processors is understood: text, `{{ pipeline }}`, `if`,
//! `with`, `else`, `end`, whitespace trimming, field access, and the
//! `include`, `nindent`, `indent` and `quote` functions. Named templates are
//! not evaluated; `include` returns caller-supplied helper text.

pub mod ast;
pub mod parser;
mod render;

use std::collections::BTreeMap;
use thiserror::Error;

pub use render::{Preview, is_truthy};

/// Preview error
#[derive(Debug, Error)]
pub enum PreviewError {
    #[error("Parse error: {0}")]
    Parse(Box<pest::error::Error<parser::Rule>>),

    #[error("Invalid number: {0}")]
    InvalidNumber(String),

    #[error("Invalid string: {0}")]
    InvalidString(String),

    #[error("Unexpected rule: {0}")]
    UnexpectedRule(String),

    #[error("unexpected {{{{ {0} }}}}")]
    UnexpectedKeyword(&'static str),

    #[error("unclosed {{{{ {0} }}}} block")]
    UnclosedBlock(&'static str),

    #[error("nil pointer evaluating .{0}")]
    NilPointer(String),

    #[error("can't evaluate field {field} in type {kind}")]
    NotAMapping { field: String, kind: &'static str },

    #[error("function {0:?} not defined")]
    UnknownFunction(String),

    #[error("no template {0:?} associated with include")]
    UnknownTemplate(String),

    #[error("wrong arguments for {function}: {message}")]
    WrongArguments { function: String, message: String },
}

impl From<pest::error::Error<parser::Rule>> for PreviewError {
    fn from(e: pest::error::Error<parser::Rule>) -> Self {
        PreviewError::Parse(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, PreviewError>;

/// Helper text returned by `include`, keyed by template name
pub type Helpers = BTreeMap<String, String>;

/// Stand-ins for the standard chart helpers
///
/// `fullname` renders as the chart name; `labels` and `selectorLabels`
/// render as the usual `app.kubernetes.io/*` pairs.
pub fn stub_helpers(chart_name: &str) -> Helpers {
    let selector = format!(
        "app.kubernetes.io/name: {chart}\napp.kubernetes.io/instance: {chart}",
        chart = chart_name
    );
    let labels = format!("{}\napp.kubernetes.io/managed-by: Helm", selector);

    [
        (format!("{}.fullname", chart_name), chart_name.to_string()),
        (format!("{}.labels", chart_name), labels),
        (format!("{}.selectorLabels", chart_name), selector),
    ]
    .into_iter()
    .collect()
}
