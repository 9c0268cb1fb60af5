use crate::error::ScanError;
use crate::types::{OutputFormat, UnusedResource};

use super::AggregateReport;

/// Human summary of the report. Namespaces without findings are left out, so a clean
/// report renders to an empty string.
pub fn render_text(report: &AggregateReport) -> String {
    let mut blocks: Vec<String> = Vec::new();
    for (namespace, kinds) in report.iter() {
        for (kind, findings) in kinds {
            if findings.is_empty() {
                continue;
            }
            blocks.push(render_block(namespace, kind, findings));
        }
    }
    blocks.join("\n\n")
}

fn render_block(namespace: &str, kind: &str, findings: &[UnusedResource]) -> String {
    let width = findings
        .iter()
        .map(|f| f.name.chars().count())
        .max()
        .unwrap_or(0)
        .max("NAME".len());
    let mut lines = Vec::with_capacity(findings.len() + 2);
    lines.push(format!("Unused {} in Namespace: {}", kind, namespace));
    lines.push(format!("{:<width$}  REASON", "NAME", width = width));
    for f in findings {
        lines.push(format!("{:<width$}  {}", f.name, f.reason, width = width));
    }
    lines.join("\n")
}

/// Full report as pretty JSON, including namespaces with no findings.
pub fn render_json(report: &AggregateReport) -> Result<String, ScanError> {
    Ok(serde_json::to_string_pretty(report)?)
}

/// Full report as YAML, converted from the JSON tree.
pub fn render_yaml(report: &AggregateReport) -> Result<String, ScanError> {
    let json = render_json(report)?;
    let tree: serde_json::Value = serde_json::from_str(&json)?;
    Ok(serde_yaml::to_string(&tree)?)
}

pub fn render_structured(report: &AggregateReport, format: OutputFormat) -> Result<String, ScanError> {
    match format {
        OutputFormat::Yaml => render_yaml(report),
        OutputFormat::Json | OutputFormat::Text => render_json(report),
    }
}
