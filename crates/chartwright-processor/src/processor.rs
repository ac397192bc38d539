//! Processor seam, produced artifacts and dispatch

use std::collections::BTreeMap;
use std::fmt;
use std::io::Write;

use chartwright_core::{CoreError, Values};
use kube::core::DynamicObject;

use crate::error::{ProcessError, Result, resource_id};
use crate::metadata::AppMetadata;
use crate::pdb::PodDisruptionBudgetProcessor;

/// Turns objects of one kind into templates
pub trait Processor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Process `obj` into a template
    ///
    /// Returns `Ok(None)` when the object is not of the kind this processor
    /// handles, so the next processor can try.
    fn process(
        &self,
        meta: &dyn AppMetadata,
        obj: &DynamicObject,
    ) -> Result<Option<Box<dyn Template>>>;
}

/// A generated chart template with its default values
pub trait Template: fmt::Debug + Send + Sync {
    /// File name under `templates/`
    fn filename(&self) -> String;

    /// Default values read by the template
    fn values(&self) -> &Values;

    /// Write the template text verbatim
    fn write(&self, writer: &mut dyn Write) -> std::io::Result<()>;
}

/// Template text, values fragment and the logical name they are keyed by
#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    name: String,
    content: String,
    values: Values,
}

impl Artifact {
    pub fn new(name: impl Into<String>, content: impl Into<String>, values: Values) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            values,
        }
    }

    /// Logical name of the source resource
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rendered template text
    pub fn content(&self) -> &str {
        &self.content
    }
}

impl Template for Artifact {
    fn filename(&self) -> String {
        format!("{}.yaml", self.name)
    }

    fn values(&self) -> &Values {
        &self.values
    }

    fn write(&self, writer: &mut dyn Write) -> std::io::Result<()> {
        writer.write_all(self.content.as_bytes())
    }
}

/// Templates and merged values produced from a set of objects
#[derive(Debug, Default)]
pub struct GeneratedChart {
    pub templates: Vec<Box<dyn Template>>,
    /// Objects no processor handled, as `Kind/name`
    pub skipped: Vec<String>,
    pub values: Values,
}

/// Ordered list of processors; the first to claim an object wins
pub struct Registry {
    processors: Vec<Box<dyn Processor>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl Registry {
    /// Registry without processors
    pub fn empty() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Registry with every built-in processor
    pub fn with_defaults() -> Self {
        Self::empty().register(PodDisruptionBudgetProcessor)
    }

    pub fn register<P: Processor + 'static>(mut self, processor: P) -> Self {
        self.processors.push(Box::new(processor));
        self
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }

    /// Run `obj` through the processors in registration order
    pub fn process(
        &self,
        meta: &dyn AppMetadata,
        obj: &DynamicObject,
    ) -> Result<Option<Box<dyn Template>>> {
        for processor in &self.processors {
            if let Some(template) = processor.process(meta, obj)? {
                tracing::debug!(
                    processor = processor.name(),
                    resource = %resource_id(obj),
                    file = %template.filename(),
                    "processed resource"
                );
                return Ok(Some(template));
            }
        }
        Ok(None)
    }

    /// Process every object and merge all values fragments
    ///
    /// Decode errors and values conflicts abort generation, as do two
    /// resources claiming the same template file. Objects nobody handles are
    /// listed in [`GeneratedChart::skipped`].
    pub fn generate(&self, meta: &dyn AppMetadata, objects: &[DynamicObject]) -> Result<GeneratedChart> {
        let mut chart = GeneratedChart::default();
        let mut claimed: BTreeMap<String, String> = BTreeMap::new();

        for obj in objects {
            let Some(template) = self.process(meta, obj)? else {
                tracing::warn!(resource = %resource_id(obj), "no processor for resource, skipping");
                chart.skipped.push(resource_id(obj));
                continue;
            };

            let filename = template.filename();
            if let Some(owner) = claimed.get(&filename) {
                return Err(ProcessError::Values {
                    resource: resource_id(obj),
                    source: CoreError::Conflict {
                        path: filename,
                        message: format!("template file already produced by {}", owner),
                    },
                });
            }
            claimed.insert(filename, resource_id(obj));

            chart
                .values
                .merge_fragment(template.values())
                .map_err(|source| ProcessError::Values {
                    resource: resource_id(obj),
                    source,
                })?;
            chart.templates.push(template);
        }

        Ok(chart)
    }
}
