use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{NamespaceFindings, UnusedResource};

mod render;

pub use render::{render_json, render_structured, render_text, render_yaml};

/// Per-namespace findings keyed by resource kind.
pub type ResourceMap = BTreeMap<String, NamespaceFindings>;

/// Findings across all scanned namespaces.
///
/// Serializes as a map sorted by namespace then resource kind. The scan order is kept
/// separately for the text rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AggregateReport {
    namespaces: BTreeMap<String, ResourceMap>,
    #[serde(skip)]
    scan_order: Vec<String>,
}

impl AggregateReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the findings of `kind` for `namespace`. Replaces earlier findings for the
    /// same pair.
    pub fn insert(&mut self, namespace: &str, kind: &str, findings: NamespaceFindings) {
        if !self.namespaces.contains_key(namespace) {
            self.scan_order.push(namespace.to_string());
        }
        self.namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(kind.to_string(), findings);
    }

    pub fn get(&self, namespace: &str) -> Option<&ResourceMap> {
        self.namespaces.get(namespace)
    }

    pub fn contains(&self, namespace: &str) -> bool {
        self.namespaces.contains_key(namespace)
    }

    /// Namespaces in the order they were scanned.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceMap)> {
        self.scan_order
            .iter()
            .filter_map(|ns| self.namespaces.get(ns).map(|m| (ns.as_str(), m)))
    }

    pub fn namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    pub fn findings(&self) -> impl Iterator<Item = &UnusedResource> {
        self.namespaces.values().flat_map(|m| m.values()).flatten()
    }

    pub fn summary(&self) -> ReportSummary {
        ReportSummary {
            scanned_namespaces: self.namespace_count(),
            namespaces_with_findings: self
                .namespaces
                .values()
                .filter(|m| m.values().any(|f| !f.is_empty()))
                .count(),
            unused_count: self.findings().count(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub scanned_namespaces: usize,
    pub namespaces_with_findings: usize,
    pub unused_count: usize,
}

impl ReportSummary {
    pub fn has_findings(&self) -> bool {
        self.unused_count > 0
    }
}
