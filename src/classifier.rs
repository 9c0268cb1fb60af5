use k8s_openapi::api::apps::v1::Deployment;
use kube::ResourceExt;

use crate::error::ScanError;
use crate::types::{NamespaceFindings, UnusedResource};

/// Label that overrides every other rule when set to "true" or "false".
pub const USED_LABEL: &str = "kor/used";

pub const REASON_MARKED_UNUSED: &str = "Label kor/used set to false";
pub const REASON_NO_REPLICAS: &str = "No resource using this Deployment";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    InUse,
    Unused(&'static str),
}

/// One entry of a rule table. `check` returns `None` when the rule does not apply.
pub struct Rule<K> {
    pub name: &'static str,
    pub check: fn(&K) -> Result<Option<Verdict>, ScanError>,
}

/// Rules for Deployments, highest priority first.
pub const DEPLOYMENT_RULES: &[Rule<Deployment>] = &[
    Rule { name: "marked-used", check: marked_used::<Deployment> },
    Rule { name: "marked-unused", check: marked_unused::<Deployment> },
    Rule { name: "zero-replicas", check: zero_replicas },
];

/// Result of classifying one namespace. Malformed resources are kept apart so one bad
/// object does not hide the findings of the others.
#[derive(Debug, Default)]
pub struct Classification {
    pub findings: NamespaceFindings,
    pub malformed: Vec<ScanError>,
}

/// Runs `rules` in order and returns the first verdict. Resources no rule matches are in use.
pub fn evaluate<K>(rules: &[Rule<K>], resource: &K) -> Result<Verdict, ScanError> {
    for rule in rules {
        if let Some(verdict) = (rule.check)(resource)? {
            return Ok(verdict);
        }
    }
    Ok(Verdict::InUse)
}

pub fn classify_resource<K: ResourceExt>(
    rules: &[Rule<K>],
    resource: &K,
) -> Result<Option<UnusedResource>, ScanError> {
    match evaluate(rules, resource)? {
        Verdict::InUse => Ok(None),
        Verdict::Unused(reason) => Ok(Some(UnusedResource {
            name: resource.name_any(),
            reason: reason.to_string(),
        })),
    }
}

pub fn classify_deployment(deployment: &Deployment) -> Result<Option<UnusedResource>, ScanError> {
    classify_resource(DEPLOYMENT_RULES, deployment)
}

/// Classify every Deployment of a namespace, preserving input order in the findings.
pub fn classify_deployments(deployments: &[Deployment]) -> Classification {
    let mut out = Classification::default();
    for deployment in deployments {
        match classify_deployment(deployment) {
            Ok(Some(finding)) => out.findings.push(finding),
            Ok(None) => {}
            Err(e) => out.malformed.push(e),
        }
    }
    out
}

fn used_label<K: ResourceExt>(resource: &K) -> Option<&str> {
    resource.labels().get(USED_LABEL).map(String::as_str)
}

fn marked_used<K: ResourceExt>(resource: &K) -> Result<Option<Verdict>, ScanError> {
    Ok((used_label(resource) == Some("true")).then_some(Verdict::InUse))
}

fn marked_unused<K: ResourceExt>(resource: &K) -> Result<Option<Verdict>, ScanError> {
    Ok((used_label(resource) == Some("false")).then_some(Verdict::Unused(REASON_MARKED_UNUSED)))
}

fn zero_replicas(deployment: &Deployment) -> Result<Option<Verdict>, ScanError> {
    let replicas = deployment
        .spec
        .as_ref()
        .and_then(|s| s.replicas)
        .ok_or_else(|| ScanError::MalformedResource {
            kind: "Deployment",
            name: deployment.name_any(),
            detail: "spec.replicas is not set",
        })?;
    Ok((replicas == 0).then_some(Verdict::Unused(REASON_NO_REPLICAS)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::apps::v1::DeploymentSpec;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
    use std::collections::BTreeMap;

    fn deployment(name: &str, replicas: Option<i32>, used: Option<&str>) -> Deployment {
        let labels = used.map(|v| BTreeMap::from([(USED_LABEL.to_string(), v.to_string())]));
        Deployment {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                labels,
                ..Default::default()
            },
            spec: Some(DeploymentSpec {
                replicas,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_marked_used_wins_over_zero_replicas() {
        for replicas in [0, 1, 5] {
            let d = deployment("api", Some(replicas), Some("true"));
            assert_eq!(classify_deployment(&d).unwrap(), None);
        }
    }

    #[test]
    fn test_marked_used_skips_replica_check() {
        // The label short-circuits before replicas are inspected
        let d = deployment("api", None, Some("true"));
        assert_eq!(classify_deployment(&d).unwrap(), None);
    }

    #[test]
    fn test_marked_unused_regardless_of_replicas() {
        for replicas in [0, 5] {
            let d = deployment("legacy", Some(replicas), Some("false"));
            let finding = classify_deployment(&d).unwrap().unwrap();
            assert_eq!(finding.name, "legacy");
            assert_eq!(finding.reason, REASON_MARKED_UNUSED);
        }
    }

    #[test]
    fn test_marked_unused_skips_replica_check() {
        let d = deployment("legacy", None, Some("false"));
        let finding = classify_deployment(&d).unwrap().unwrap();
        assert_eq!(finding.reason, REASON_MARKED_UNUSED);
    }

    #[test]
    fn test_zero_replicas_without_label() {
        let d = deployment("batch", Some(0), None);
        let finding = classify_deployment(&d).unwrap().unwrap();
        assert_eq!(finding.reason, REASON_NO_REPLICAS);
    }

    #[test]
    fn test_running_replicas_in_use() {
        let d = deployment("web", Some(3), None);
        assert_eq!(classify_deployment(&d).unwrap(), None);
    }

    #[test]
    fn test_unknown_label_value_falls_through() {
        let d = deployment("odd", Some(0), Some("maybe"));
        assert_eq!(classify_deployment(&d).unwrap().unwrap().reason, REASON_NO_REPLICAS);

        let d = deployment("odd", Some(2), Some("TRUE"));
        assert_eq!(classify_deployment(&d).unwrap(), None);
    }

    #[test]
    fn test_missing_replicas_is_malformed() {
        let d = deployment("broken", None, None);
        match classify_deployment(&d) {
            Err(ScanError::MalformedResource { name, .. }) => assert_eq!(name, "broken"),
            other => panic!("expected MalformedResource, got {:?}", other),
        }

        let mut d = deployment("no-spec", Some(1), None);
        d.spec = None;
        assert!(matches!(
            classify_deployment(&d),
            Err(ScanError::MalformedResource { .. })
        ));
    }

    #[test]
    fn test_namespace_scenario() {
        let deployments = vec![
            deployment("web", Some(3), None),
            deployment("batch", Some(0), None),
        ];
        let result = classify_deployments(&deployments);
        assert_eq!(
            result.findings,
            vec![UnusedResource {
                name: "batch".to_string(),
                reason: REASON_NO_REPLICAS.to_string(),
            }]
        );
        assert!(result.malformed.is_empty());
    }

    #[test]
    fn test_malformed_does_not_drop_namespace() {
        let deployments = vec![
            deployment("a", Some(0), None),
            deployment("broken", None, None),
            deployment("c", Some(4), Some("false")),
        ];
        let result = classify_deployments(&deployments);
        let names: Vec<_> = result.findings.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
        assert_eq!(result.malformed.len(), 1);
    }

    #[test]
    fn test_rule_table_order() {
        let names: Vec<_> = DEPLOYMENT_RULES.iter().map(|r| r.name).collect();
        assert_eq!(names, vec!["marked-used", "marked-unused", "zero-replicas"]);
    }

    #[test]
    fn test_evaluate_empty_table() {
        let d = deployment("x", Some(0), None);
        assert_eq!(evaluate::<Deployment>(&[], &d).unwrap(), Verdict::InUse);
    }
}
