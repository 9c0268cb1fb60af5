use tracing::{debug, error, info, warn};

use crate::classifier::classify_deployments;
use crate::error::ScanError;
use crate::kubernetes::DeploymentSource;
use crate::report::AggregateReport;
use crate::types::DEPLOYMENTS;

/// Walks namespaces one at a time and collects unused Deployments
pub struct UnusedCollector<'a, S> {
    source: &'a S,
}

/// A namespace that could not be scanned
#[derive(Debug)]
pub struct NamespaceFailure {
    pub namespace: String,
    pub error: ScanError,
}

/// Report plus the namespaces that were skipped
#[derive(Debug)]
pub struct ScanOutcome {
    pub report: AggregateReport,
    pub failures: Vec<NamespaceFailure>,
}

impl ScanOutcome {
    pub fn is_partial(&self) -> bool {
        !self.failures.is_empty()
    }
}

impl<'a, S: DeploymentSource> UnusedCollector<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self { source }
    }

    /// Scan every namespace. A failing namespace is logged, recorded and left out of the
    /// report; the remaining namespaces are still scanned.
    pub async fn scan(&self, namespaces: &[String]) -> ScanOutcome {
        let mut report = AggregateReport::new();
        let mut failures = Vec::new();

        for ns in namespaces {
            debug!("Scanning namespace: {}", ns);
            match self.scan_namespace(ns, &mut report).await {
                Ok(()) => {}
                Err(e) => {
                    error!("Failed to process namespace {}: {}", ns, e);
                    failures.push(NamespaceFailure { namespace: ns.clone(), error: e });
                }
            }
        }

        info!(
            "Scanned {} namespaces ({} failed)",
            report.namespace_count(),
            failures.len()
        );
        ScanOutcome { report, failures }
    }

    async fn scan_namespace(&self, ns: &str, report: &mut AggregateReport) -> Result<(), ScanError> {
        let deployments = self
            .source
            .list_deployments(ns)
            .await
            .map_err(|source| ScanError::Fetch {
                namespace: ns.to_string(),
                kind: DEPLOYMENTS,
                source,
            })?;

        let classification = classify_deployments(&deployments);
        for e in &classification.malformed {
            warn!("Skipping resource in namespace {}: {}", ns, e);
        }
        report.insert(ns, DEPLOYMENTS, classification.findings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BoxError;
    use k8s_openapi::api::apps::v1::{Deployment, DeploymentSpec};
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockSource {
        namespaces: HashMap<String, Vec<Deployment>>,
        calls: AtomicUsize,
    }

    impl MockSource {
        fn with(mut self, ns: &str, deployments: Vec<Deployment>) -> Self {
            self.namespaces.insert(ns.to_string(), deployments);
            self
        }
    }

    impl DeploymentSource for MockSource {
        async fn list_deployments(&self, namespace: &str) -> Result<Vec<Deployment>, BoxError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.namespaces
                .get(namespace)
                .cloned()
                .ok_or_else(|| format!("namespaces \"{}\" is forbidden", namespace).into())
        }
    }

    fn deployment(name: &str, replicas: Option<i32>) -> Deployment {
        Deployment {
            metadata: ObjectMeta { name: Some(name.to_string()), ..Default::default() },
            spec: Some(DeploymentSpec { replicas, ..Default::default() }),
            ..Default::default()
        }
    }

    fn ns(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_partial_failure_continues() {
        let source = MockSource::default()
            .with("a", vec![deployment("idle", Some(0))])
            .with("c", vec![deployment("web", Some(2))]);
        let collector = UnusedCollector::new(&source);

        let outcome = collector.scan(&ns(&["a", "b", "c"])).await;

        assert_eq!(source.calls.load(Ordering::SeqCst), 3);
        assert!(outcome.report.contains("a"));
        assert!(!outcome.report.contains("b"));
        assert!(outcome.report.contains("c"));
        assert!(outcome.report.get("c").unwrap()[DEPLOYMENTS].is_empty());
        assert!(outcome.is_partial());
        assert_eq!(outcome.failures.len(), 1);
        assert_eq!(outcome.failures[0].namespace, "b");
        assert!(matches!(outcome.failures[0].error, ScanError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_scan_is_idempotent() {
        let source = MockSource::default()
            .with("x", vec![deployment("one", Some(0)), deployment("two", Some(1))])
            .with("y", vec![]);
        let collector = UnusedCollector::new(&source);
        let namespaces = ns(&["x", "y"]);

        let first = collector.scan(&namespaces).await;
        let second = collector.scan(&namespaces).await;
        assert_eq!(first.report, second.report);
        assert!(!first.is_partial());
    }

    #[tokio::test]
    async fn test_malformed_resource_keeps_namespace() {
        let source = MockSource::default()
            .with("x", vec![deployment("broken", None), deployment("idle", Some(0))]);
        let outcome = UnusedCollector::new(&source).scan(&ns(&["x"])).await;

        let findings = &outcome.report.get("x").unwrap()[DEPLOYMENTS];
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].name, "idle");
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_scan_order_preserved() {
        let source = MockSource::default().with("b", vec![]).with("a", vec![]);
        let outcome = UnusedCollector::new(&source).scan(&ns(&["b", "a"])).await;
        let order: Vec<_> = outcome.report.iter().map(|(n, _)| n.to_string()).collect();
        assert_eq!(order, ns(&["b", "a"]));
    }
}
