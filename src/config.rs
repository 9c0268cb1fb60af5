use anyhow::{anyhow, Result};
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::slack::default_report_path;
use crate::types::{Config, NotificationTarget, OutputFormat};

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Trait for abstracting environment variable access
pub trait EnvironmentProvider {
    fn get_var(&self, key: &str) -> Option<String>;
}

/// Production implementation using std::env
pub struct SystemEnvironment;

impl EnvironmentProvider for SystemEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

/// Mock implementation for testing
#[derive(Debug, Default)]
pub struct MockEnvironment {
    vars: HashMap<String, String>,
}

impl MockEnvironment {
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
        }
    }

    pub fn set_var<K, V>(&mut self, key: K, value: V) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars.insert(key.into(), value.into());
        self
    }

    pub fn with_var<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.set_var(key, value);
        self
    }
}

impl EnvironmentProvider for MockEnvironment {
    fn get_var(&self, key: &str) -> Option<String> {
        self.vars.get(key).cloned()
    }
}

pub fn load_config() -> Result<Config> {
    load_config_with_env(&SystemEnvironment)
}

pub fn load_config_with_env<E: EnvironmentProvider>(env: &E) -> Result<Config> {
    let namespaces = split_list(env.get_var("NAMESPACES"));
    let exclude_namespaces = split_list(env.get_var("EXCLUDE_NAMESPACES"));
    if !namespaces.is_empty() && !exclude_namespaces.is_empty() {
        return Err(anyhow!("NAMESPACES and EXCLUDE_NAMESPACES cannot be used together"));
    }

    let output_format = parse_output_format(env.get_var("OUTPUT_FORMAT").as_deref());

    let notification = NotificationTarget::from_parts(
        env.get_var("SLACK_WEBHOOK_URL"),
        env.get_var("SLACK_CHANNEL"),
        env.get_var("SLACK_AUTH_TOKEN"),
    )?;

    let home = env.get_var("HOME").filter(|h| !h.is_empty());
    if matches!(notification, NotificationTarget::Channel { .. }) && home.is_none() {
        return Err(anyhow!("HOME must be set to upload reports to a Slack channel"));
    }
    let report_file = home.map(|h| default_report_path(Path::new(&h)));

    let http_timeout_seconds: u64 = env.get_var("HTTP_TIMEOUT_SECONDS")
        .and_then(|v| v.trim().parse().ok())
        .filter(|&secs: &u64| secs > 0)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS);

    let keep_report_file = env.get_var("KEEP_REPORT_FILE")
        .map(|v| matches!(v.as_str(), "1" | "true" | "TRUE" | "True"))
        .unwrap_or(false);

    Ok(Config {
        namespaces,
        exclude_namespaces,
        output_format,
        notification,
        http_timeout: Duration::from_secs(http_timeout_seconds),
        report_file,
        keep_report_file,
    })
}

fn split_list(value: Option<String>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_output_format(value: Option<&str>) -> OutputFormat {
    match value.map(str::trim) {
        Some("json") => OutputFormat::Json,
        Some("yaml") => OutputFormat::Yaml,
        None | Some("") | Some("table") | Some("text") => OutputFormat::Text,
        Some(other) => {
            warn!("Unknown OUTPUT_FORMAT {:?}, falling back to text", other);
            OutputFormat::Text
        }
    }
}
