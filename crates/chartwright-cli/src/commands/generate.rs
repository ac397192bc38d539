//! Generate command - build a Helm chart from manifest files
//!
//! Every input document is dispatched through the processor registry; the
//! templates it yields are written under `templates/` and their values
//! fragments are merged into a single `values.yaml`.

use chartwright_core::ChartMeta;
use chartwright_processor::{
    DynamicObject, GeneratedChart, Preview, ProcessError, Registry, Template, parse_manifests,
};
use console::style;
use serde::Serialize;
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

/// Standard helpers referenced by every generated template
const HELPERS_TPL: &str = r#"{{/*
Expand the name of the chart.
*/}}
{{- define "CHART.name" -}}
{{- default .Chart.Name .Values.nameOverride | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Create a default fully qualified app name.
Truncated at 63 chars because some Kubernetes name fields are limited to this.
*/}}
{{- define "CHART.fullname" -}}
{{- if .Values.fullnameOverride }}
{{- .Values.fullnameOverride | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- $name := default .Chart.Name .Values.nameOverride }}
{{- if contains $name .Release.Name }}
{{- .Release.Name | trunc 63 | trimSuffix "-" }}
{{- else }}
{{- printf "%s-%s" .Release.Name $name | trunc 63 | trimSuffix "-" }}
{{- end }}
{{- end }}
{{- end }}

{{/*
Chart name and version as used by the chart label.
*/}}
{{- define "CHART.chart" -}}
{{- printf "%s-%s" .Chart.Name .Chart.Version | replace "+" "_" | trunc 63 | trimSuffix "-" }}
{{- end }}

{{/*
Common labels
*/}}
{{- define "CHART.labels" -}}
helm.sh/chart: {{ include "CHART.chart" . }}
{{ include "CHART.selectorLabels" . }}
{{- if .Chart.AppVersion }}
app.kubernetes.io/version: {{ .Chart.AppVersion | quote }}
{{- end }}
app.kubernetes.io/managed-by: {{ .Release.Service }}
{{- end }}

{{/*
Selector labels
*/}}
{{- define "CHART.selectorLabels" -}}
app.kubernetes.io/name: {{ include "CHART.name" . }}
app.kubernetes.io/instance: {{ .Release.Name }}
{{- end }}
"#;

/// Options for [`run`]
#[derive(Debug)]
pub struct GenerateOptions<'a> {
    pub inputs: &'a [PathBuf],
    pub chart_name: &'a str,
    pub output: &'a Path,
    pub prefix: Option<&'a str>,
    pub preserve_namespace: bool,
    pub force: bool,
    pub dry_run: bool,
    pub preview: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChartFile<'a> {
    api_version: &'static str,
    name: &'a str,
    description: &'static str,
    #[serde(rename = "type")]
    chart_type: &'static str,
    version: &'static str,
    app_version: &'static str,
}

pub fn run(opts: &GenerateOptions<'_>) -> Result<()> {
    let objects = read_objects(opts.inputs)?;

    let meta = ChartMeta::new(opts.chart_name)?.with_preserve_namespace(opts.preserve_namespace);
    let meta = match opts.prefix {
        Some(prefix) => meta.with_common_prefix(prefix),
        None => meta.with_detected_prefix(objects.iter().filter_map(|o| o.metadata.name.as_deref())),
    };
    if let Some(prefix) = meta.common_prefix() {
        tracing::debug!(prefix, "trimming common name prefix");
    }

    let chart = Registry::with_defaults().generate(&meta, &objects)?;

    print_header(opts);

    if opts.dry_run {
        print_files(opts.output, &chart, false);
    } else {
        ensure_output(opts.output, opts.force)?;
        write_chart(opts.output, opts.chart_name, &chart)?;
        print_files(opts.output, &chart, true);
    }
    print_skipped(&chart);

    if opts.preview {
        print_preview(opts.chart_name, &chart)?;
    }

    Ok(())
}

/// Read and split every input; `-` reads stdin
fn read_objects(inputs: &[PathBuf]) -> Result<Vec<DynamicObject>> {
    let mut objects = Vec::new();

    for input in inputs {
        let text = if input.as_os_str() == "-" {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| CliError::io_at("<stdin>", e))?;
            buf
        } else {
            fs::read_to_string(input).map_err(|e| CliError::io_at(input.display(), e))?
        };

        let parsed =
            parse_manifests(&text).map_err(|e| CliError::from(e).in_input(input.display()))?;
        tracing::debug!(input = %input.display(), objects = parsed.len(), "read manifests");
        objects.extend(parsed);
    }

    Ok(objects)
}

/// Refuse to write into a non-empty directory unless forced
///
/// Forcing clears `templates/` so no file from an earlier run survives.
fn ensure_output(output: &Path, force: bool) -> Result<()> {
    if !output.exists() {
        return Ok(());
    }

    if force {
        let templates_dir = output.join("templates");
        if templates_dir.exists() {
            fs::remove_dir_all(&templates_dir)
                .map_err(|e| CliError::io_at(templates_dir.display(), e))?;
            tracing::debug!(dir = %templates_dir.display(), "cleared previous templates");
        }
        return Ok(());
    }

    let is_empty = output
        .read_dir()
        .map_err(|e| CliError::io_at(output.display(), e))?
        .next()
        .is_none();
    if is_empty {
        return Ok(());
    }

    Err(CliError::input_with_help(
        format!("output directory {} already exists", output.display()),
        "pass --force to overwrite it",
    ))
}

fn chart_yaml(chart_name: &str) -> Result<String> {
    let chart = ChartFile {
        api_version: "v2",
        name: chart_name,
        description: "A Helm chart for Kubernetes",
        chart_type: "application",
        version: "0.1.0",
        app_version: "0.1.0",
    };
    serde_yaml::to_string(&chart).map_err(|e| CliError::Other {
        message: format!("failed to serialize Chart.yaml: {}", e),
    })
}

fn write_chart(output: &Path, chart_name: &str, chart: &GeneratedChart) -> Result<()> {
    let templates_dir = output.join("templates");
    fs::create_dir_all(&templates_dir).map_err(|e| CliError::io_at(templates_dir.display(), e))?;

    write_file(&output.join("Chart.yaml"), &chart_yaml(chart_name)?)?;
    write_file(&output.join("values.yaml"), &chart.values.to_yaml()?)?;
    write_file(
        &templates_dir.join("_helpers.tpl"),
        &HELPERS_TPL.replace("CHART", chart_name),
    )?;

    for template in &chart.templates {
        let path = templates_dir.join(template.filename());
        let mut file = fs::File::create(&path).map_err(|e| CliError::io_at(path.display(), e))?;
        template
            .write(&mut file)
            .map_err(|e| CliError::io_at(path.display(), e))?;
        tracing::debug!(file = %path.display(), "wrote template");
    }

    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).map_err(|e| CliError::io_at(path.display(), e))
}

fn template_text(template: &dyn Template) -> Result<String> {
    let mut buf = Vec::new();
    template.write(&mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn print_header(opts: &GenerateOptions<'_>) {
    eprintln!();
    eprintln!(
        "  {} {} {}",
        style("Chartwright Generate").bold().cyan(),
        style("─").dim(),
        style(format!("chart {}", opts.chart_name)).dim()
    );
    eprintln!();
    eprintln!(
        "  {} {}",
        style("Target:").dim(),
        style(opts.output.display()).green()
    );
    eprintln!();
}

fn print_files(output: &Path, chart: &GeneratedChart, written: bool) {
    let title = if written { "Generated Files" } else { "Would Generate" };
    eprintln!("  {}", style(title).bold());
    eprintln!("  {}", style("─".repeat(title.chars().count())).dim());

    let icon = if written { style("✓").green().bold() } else { style("○").cyan() };
    let fixed = ["Chart.yaml", "values.yaml", "templates/_helpers.tpl"];
    for file in fixed {
        eprintln!("  {} {}", icon, file);
    }
    for template in &chart.templates {
        eprintln!("  {} templates/{}", icon, template.filename());
    }
    eprintln!();

    if !written {
        eprintln!(
            "  {} {} {}",
            style("ℹ").cyan(),
            style("Dry run mode - nothing was written to").dim(),
            style(output.display()).dim()
        );
        eprintln!();
    }
}

fn print_skipped(chart: &GeneratedChart) {
    if chart.skipped.is_empty() {
        return;
    }

    eprintln!("  {}", style("Skipped Resources").bold().yellow());
    eprintln!("  {}", style("─────────────────").dim());
    for resource in &chart.skipped {
        eprintln!("  {} {}", style("○").yellow(), resource);
    }
    eprintln!();
}

/// Render every template with the merged defaults and print it to stdout
fn print_preview(chart_name: &str, chart: &GeneratedChart) -> Result<()> {
    let preview = Preview::for_chart(chart_name);

    for template in &chart.templates {
        let filename = template.filename();
        let rendered = preview
            .render(&template_text(&**template)?, &chart.values)
            .map_err(|source| ProcessError::Preview {
                template: filename.clone(),
                source,
            })?;

        let rendered = rendered.trim_matches('\n');
        if rendered.is_empty() {
            continue;
        }
        println!("---");
        println!("# Source: {}/templates/{}", chart_name, filename);
        println!("{}", rendered);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forced_output_drops_stale_templates() {
        let dir = tempfile::tempdir().unwrap();
        let templates = dir.path().join("templates");
        fs::create_dir_all(&templates).unwrap();
        fs::write(templates.join("old.yaml"), "kind: Stale\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "kept").unwrap();

        assert!(ensure_output(dir.path(), false).is_err());
        ensure_output(dir.path(), true).unwrap();

        assert!(!templates.exists());
        assert!(dir.path().join("notes.txt").exists());
    }

    #[test]
    fn test_chart_yaml() {
        let yaml = chart_yaml("shop").unwrap();
        let parsed: serde_yaml::Value = serde_yaml::from_str(&yaml).unwrap();

        assert_eq!(parsed["apiVersion"], "v2");
        assert_eq!(parsed["name"], "shop");
        assert_eq!(parsed["type"], "application");
    }

    #[test]
    fn test_helpers_define_referenced_templates() {
        let helpers = HELPERS_TPL.replace("CHART", "shop");
        for name in ["shop.fullname", "shop.labels", "shop.selectorLabels"] {
            assert!(helpers.contains(&format!("{{{{- define \"{}\" -}}}}", name)));
        }
        assert!(!helpers.contains("CHART"));
    }
}
