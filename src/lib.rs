// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod classifier;
pub mod kubernetes;
pub mod collector;
pub mod report;
pub mod slack;

// Re-export commonly used items
pub use types::*;
pub use error::{BoxError, ScanError, UndeliveredReport};
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use classifier::{classify_deployment, classify_deployments, Classification, Rule, Verdict, DEPLOYMENT_RULES};
pub use kubernetes::{resolve_namespaces, select_namespaces, DeploymentSource, KubeDeploymentSource};
pub use collector::{NamespaceFailure, ScanOutcome, UnusedCollector};
pub use report::{render_json, render_structured, render_text, render_yaml, AggregateReport, ReportSummary};
pub use slack::{send_to_slack, ReportSender, SlackNotifier};
