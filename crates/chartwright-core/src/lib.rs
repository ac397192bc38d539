//! Chartwright Core - Core types shared by the chart generator
//!
//! This crate provides the foundational types used throughout chartwright:
//! - `Values`: the nested default-values tree with conflict-checked insertion
//! - `ChartMeta`: chart-wide naming (prefix trimming, logical names)

pub mod error;
pub mod naming;
pub mod values;

pub use error::{CoreError, Result};
pub use naming::{ChartMeta, detect_common_prefix, to_lower_camel};
pub use values::Values;
