//! PodDisruptionBudget processor
//!
//! Turns a `policy/v1` PodDisruptionBudget into a template whose thresholds
//! are read from `.Values.<name>` and whose whole document is guarded by
//! `.Values.<name>.enabled`:
//!
//! ```text
//! {{- if .Values.webPdb.enabled }}
//! apiVersion: policy/v1
//! kind: PodDisruptionBudget
//! metadata:
//!   ...
//! spec:
//!   {{ with .Values.webPdb.minAvailable -}}
//!   minAvailable: {{ . }}
//!   {{ end -}}
//!   {{ with .Values.webPdb.maxUnavailable -}}
//!   maxUnavailable: {{ . }}
//!   {{ end -}}
//!   selector:
//!     matchLabels:
//!       app: web
//!     {{- include "<chart>.selectorLabels" . | nindent 6 }}
//! {{- end }}
//! ```
//!
//! Threshold lines use `with`, so both an unset and an empty value drop the
//! line entirely.

use chartwright_core::{Values, to_lower_camel};
use k8s_openapi::api::policy::v1::PodDisruptionBudget;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::core::{DynamicObject, GroupVersionKind};

use crate::error::{ProcessError, Result, resource_id};
use crate::metadata::AppMetadata;
use crate::processor::{Artifact, Processor, Template};
use crate::yaml;

const GROUP: &str = "policy";
const VERSION: &str = "v1";
const KIND: &str = "PodDisruptionBudget";

/// Indent of the selector body under `spec.selector`
const SELECTOR_INDENT: usize = 4;

/// Indent passed to `nindent` for the shared selector labels
const SELECTOR_LABELS_INDENT: usize = 6;

/// Type identity handled by this processor
pub fn pdb_gvk() -> GroupVersionKind {
    GroupVersionKind::gvk(GROUP, VERSION, KIND)
}

/// Whether `gvk` is a `policy/v1` PodDisruptionBudget
pub fn matches(gvk: &GroupVersionKind) -> bool {
    gvk.group == GROUP && gvk.version == VERSION && gvk.kind == KIND
}

/// Type identity of an untyped object; `None` without apiVersion/kind
pub fn object_gvk(obj: &DynamicObject) -> Option<GroupVersionKind> {
    let types = obj.types.as_ref()?;
    let (group, version) = match types.api_version.split_once('/') {
        Some((group, version)) => (group, version),
        None => ("", types.api_version.as_str()),
    };
    Some(GroupVersionKind::gvk(group, version, &types.kind))
}

/// The fields of a PodDisruptionBudget that end up in the chart
///
/// Both thresholds may be set at once; no exclusivity is enforced.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DisruptionPolicy {
    pub min_available: Option<IntOrString>,
    pub max_unavailable: Option<IntOrString>,
    pub selector: Option<LabelSelector>,
}

impl DisruptionPolicy {
    /// Decode an untyped object into its disruption policy
    pub fn decode(obj: &DynamicObject) -> Result<Self> {
        let decode_err = |source: serde_json::Error| ProcessError::Decode {
            resource: resource_id(obj),
            source,
        };

        let value = serde_json::to_value(obj).map_err(decode_err)?;
        let pdb: PodDisruptionBudget = serde_json::from_value(value).map_err(decode_err)?;
        let spec = pdb.spec.unwrap_or_default();

        Ok(Self {
            min_available: spec.min_available,
            max_unavailable: spec.max_unavailable,
            selector: spec.selector,
        })
    }

    /// The selector as YAML indented to sit under `spec.selector`
    ///
    /// Empty when the object has no selector or an empty one.
    pub fn selector_fragment(&self) -> std::result::Result<String, serde_yaml::Error> {
        match &self.selector {
            Some(selector) if !is_empty_selector(selector) => {
                yaml::to_fragment(selector, SELECTOR_INDENT)
            }
            _ => Ok(String::new()),
        }
    }
}

fn is_empty_selector(selector: &LabelSelector) -> bool {
    selector.match_labels.as_ref().is_none_or(|l| l.is_empty())
        && selector.match_expressions.as_ref().is_none_or(|e| e.is_empty())
}

/// Default value for a threshold: its scalar form, or `""` when unset
pub fn threshold_value(threshold: Option<&IntOrString>) -> String {
    match threshold {
        Some(IntOrString::Int(n)) => n.to_string(),
        Some(IntOrString::String(s)) => s.clone(),
        None => String::new(),
    }
}

/// Render the `spec` stanza
///
/// `selector` is the pre-indented selector body; it may be empty.
pub fn render_spec(name: &str, selector: &str, chart_name: &str) -> String {
    let mut lines = vec!["spec:".to_string()];

    for field in ["minAvailable", "maxUnavailable"] {
        lines.push(format!("  {{{{ with .Values.{}.{} -}}}}", name, field));
        lines.push(format!("  {}: {{{{ . }}}}", field));
        lines.push("  {{ end -}}".to_string());
    }

    lines.push("  selector:".to_string());
    if !selector.is_empty() {
        lines.push(selector.to_string());
    }
    lines.push(format!(
        "{}{{{{- include \"{}.selectorLabels\" . | nindent {} }}}}",
        " ".repeat(SELECTOR_INDENT),
        chart_name,
        SELECTOR_LABELS_INDENT
    ));

    lines.join("\n")
}

/// Guard a whole document with `.Values.<name>.enabled`
pub fn wrap_enabled(name: &str, body: &str) -> String {
    format!("{{{{- if .Values.{}.enabled }}}}\n{}\n{{{{- end }}}}\n", name, body)
}

/// Default values for one PodDisruptionBudget, keyed under `name`
pub fn build_values(name: &str, policy: &DisruptionPolicy) -> chartwright_core::Result<Values> {
    let mut values = Values::new();
    values.insert(
        &[name, "maxUnavailable"],
        threshold_value(policy.max_unavailable.as_ref()),
    )?;
    values.insert(
        &[name, "minAvailable"],
        threshold_value(policy.min_available.as_ref()),
    )?;
    values.insert(&[name, "enabled"], true)?;
    Ok(values)
}

/// Processor for `policy/v1` PodDisruptionBudget objects
#[derive(Debug, Clone, Copy, Default)]
pub struct PodDisruptionBudgetProcessor;

impl PodDisruptionBudgetProcessor {
    /// Process into the concrete artifact type
    pub fn process_object(
        &self,
        meta: &dyn AppMetadata,
        obj: &DynamicObject,
    ) -> Result<Option<Artifact>> {
        if !object_gvk(obj).is_some_and(|gvk| matches(&gvk)) {
            return Ok(None);
        }

        let policy = DisruptionPolicy::decode(obj)?;
        let selector = policy
            .selector_fragment()
            .map_err(|source| ProcessError::Serialize {
                what: "selector",
                resource: resource_id(obj),
                source,
            })?;

        let name = to_lower_camel(&meta.trim_name(obj.metadata.name.as_deref().unwrap_or_default()));
        let values = build_values(&name, &policy).map_err(|source| ProcessError::Values {
            resource: resource_id(obj),
            source,
        })?;

        let preamble = meta.render_meta(obj)?;
        let body = format!(
            "{}\n{}",
            preamble,
            render_spec(&name, &selector, meta.chart_name())
        );

        Ok(Some(Artifact::new(name.as_str(), wrap_enabled(&name, &body), values)))
    }
}

impl Processor for PodDisruptionBudgetProcessor {
    fn name(&self) -> &'static str {
        "poddisruptionbudget"
    }

    fn process(
        &self,
        meta: &dyn AppMetadata,
        obj: &DynamicObject,
    ) -> Result<Option<Box<dyn Template>>> {
        Ok(self
            .process_object(meta, obj)?
            .map(|artifact| Box::new(artifact) as Box<dyn Template>))
    }
}
