//! Chartwright Processor - Kubernetes objects to Helm chart templates
//!
//! Each [`Processor`] recognises one resource kind and turns an object of
//! that kind into a parameterised template plus the default values the
//! template reads:
//!
//! | Source object field             | Template                                     |
//! |---------------------------------|----------------------------------------------|
//! | `spec.minAvailable: 2`          | `{{ with .Values.<name>.minAvailable -}}`    |
//! | `spec.maxUnavailable: 50%`      | `{{ with .Values.<name>.maxUnavailable -}}`  |
//! | `spec.selector`                 | selector + `include "<chart>.selectorLabels"`|
//! | whole resource                  | `{{- if .Values.<name>.enabled }}`           |
//!
//! # Example
//!
//! ```no_run
//! use chartwright_core::ChartMeta;
//! use chartwright_processor::{Registry, parse_manifests};
//!
//! let objects = parse_manifests(&std::fs::read_to_string("pdb.yaml").unwrap()).unwrap();
//! let meta = ChartMeta::new("my-app").unwrap().with_common_prefix("my-app-");
//!
//! let chart = Registry::with_defaults().generate(&meta, &objects).unwrap();
//! for template in &chart.templates {
//!     println!("{}", template.filename());
//! }
//! println!("{}", chart.values.to_yaml().unwrap());
//! ```

pub mod error;
pub mod manifest;
pub mod metadata;
pub mod pdb;
pub mod preview;
pub mod processor;
pub mod yaml;

// Re-exports
pub use error::{ProcessError, Result, resource_id};
pub use kube::core::DynamicObject;
pub use manifest::parse_manifests;
pub use metadata::{AppMetadata, render_object_meta};
pub use pdb::PodDisruptionBudgetProcessor;
pub use preview::{Preview, PreviewError};
pub use processor::{Artifact, GeneratedChart, Processor, Registry, Template};
