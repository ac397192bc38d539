//! Chart metadata seen by processors, and the shared metadata preamble

use chartwright_core::ChartMeta;
use kube::core::DynamicObject;

use crate::error::{ProcessError, Result, resource_id};
use crate::yaml;

/// Chart-level information a processor needs
pub trait AppMetadata {
    /// Chart identifier used in `include "<chart>.<helper>"` references
    fn chart_name(&self) -> &str;

    /// Resource name with chart-wide prefixes removed
    fn trim_name(&self, name: &str) -> String;

    /// Whether generated metadata keeps the source namespace
    fn preserve_namespace(&self) -> bool {
        false
    }

    /// Render the `apiVersion`/`kind`/`metadata` preamble for `obj`
    fn render_meta(&self, obj: &DynamicObject) -> Result<String> {
        render_object_meta(self, obj)
    }
}

impl AppMetadata for ChartMeta {
    fn chart_name(&self) -> &str {
        ChartMeta::chart_name(self)
    }

    fn trim_name(&self, name: &str) -> String {
        ChartMeta::trim_name(self, name)
    }

    fn preserve_namespace(&self) -> bool {
        ChartMeta::preserve_namespace(self)
    }
}

/// Render the metadata preamble of a generated template
///
/// ```text
/// apiVersion: policy/v1
/// kind: PodDisruptionBudget
/// metadata:
///   name: {{ include "<chart>.fullname" . }}-<trimmed name>
///   labels:
///     <object labels>
///   {{- include "<chart>.labels" . | nindent 4 }}
/// ```
///
/// The result has no trailing newline.
pub fn render_object_meta<M: AppMetadata + ?Sized>(meta: &M, obj: &DynamicObject) -> Result<String> {
    let types = obj
        .types
        .as_ref()
        .filter(|t| !t.api_version.is_empty() && !t.kind.is_empty())
        .ok_or_else(|| ProcessError::MissingTypeMeta {
            resource: resource_id(obj),
        })?;

    let chart = meta.chart_name();
    let name = meta.trim_name(obj.metadata.name.as_deref().unwrap_or_default());

    let mut lines = vec![
        format!("apiVersion: {}", types.api_version),
        format!("kind: {}", types.kind),
        "metadata:".to_string(),
        format!("  name: {{{{ include \"{}.fullname\" . }}}}-{}", chart, name),
    ];

    if meta.preserve_namespace() {
        if let Some(namespace) = &obj.metadata.namespace {
            lines.push(format!("  namespace: {}", namespace));
        }
    }

    lines.push("  labels:".to_string());
    if let Some(labels) = obj.metadata.labels.as_ref().filter(|l| !l.is_empty()) {
        lines.push(fragment(labels, "labels", obj)?);
    }
    lines.push(format!("  {{{{- include \"{}.labels\" . | nindent 4 }}}}", chart));

    if let Some(annotations) = obj.metadata.annotations.as_ref().filter(|a| !a.is_empty()) {
        lines.push("  annotations:".to_string());
        lines.push(fragment(annotations, "annotations", obj)?);
    }

    Ok(lines.join("\n"))
}

fn fragment<T: serde::Serialize>(value: &T, what: &'static str, obj: &DynamicObject) -> Result<String> {
    yaml::to_fragment(value, 4).map_err(|source| ProcessError::Serialize {
        what,
        resource: resource_id(obj),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::manifest::parse_manifests;

    fn object(yaml: &str) -> DynamicObject {
        parse_manifests(yaml).unwrap().remove(0)
    }

    #[test]
    fn test_preamble_without_labels() {
        let meta = ChartMeta::new("my-app").unwrap().with_common_prefix("my-app-");
        let obj = object("apiVersion: policy/v1\nkind: PodDisruptionBudget\nmetadata:\n  name: my-app-pdb\n  namespace: prod\n");

        assert_eq!(
            render_object_meta(&meta, &obj).unwrap(),
            "apiVersion: policy/v1\n\
             kind: PodDisruptionBudget\n\
             metadata:\n  \
             name: {{ include \"my-app.fullname\" . }}-pdb\n  \
             labels:\n  \
             {{- include \"my-app.labels\" . | nindent 4 }}"
        );
    }

    #[test]
    fn test_preamble_with_labels_annotations_and_namespace() {
        let meta = ChartMeta::new("shop").unwrap().with_preserve_namespace(true);
        let obj = object(
            r#"
apiVersion: policy/v1
kind: PodDisruptionBudget
metadata:
  name: web
  namespace: prod
  labels:
    tier: frontend
    team: core
  annotations:
    owner: platform
"#,
        );

        let rendered = render_object_meta(&meta, &obj).unwrap();
        assert!(rendered.contains("  namespace: prod\n"));
        assert!(rendered.contains("  labels:\n    team: core\n    tier: frontend\n  {{- include \"shop.labels\" . | nindent 4 }}"));
        assert!(rendered.ends_with("  annotations:\n    owner: platform"));
    }

    #[test]
    fn test_preamble_requires_type_meta() {
        let meta = ChartMeta::new("shop").unwrap();
        let obj = object("metadata:\n  name: web\n");

        let err = render_object_meta(&meta, &obj).unwrap_err();
        assert!(matches!(err, ProcessError::MissingTypeMeta { .. }));
    }
}
