use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ScanError;

/// Resource kind label used as the inner key of the report.
pub const DEPLOYMENTS: &str = "Deployments";

#[derive(Debug, Clone)]
pub struct Config {
    pub namespaces: Vec<String>,
    pub exclude_namespaces: Vec<String>,
    pub output_format: OutputFormat,
    pub notification: NotificationTarget,
    pub http_timeout: Duration,
    pub report_file: Option<PathBuf>,
    pub keep_report_file: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Yaml,
}

impl OutputFormat {
    pub fn is_structured(self) -> bool {
        !matches!(self, OutputFormat::Text)
    }
}

/// A resource that the classifier considers unused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UnusedResource {
    pub name: String,
    pub reason: String,
}

pub type NamespaceFindings = Vec<UnusedResource>;

/// Where a text report goes. Only one transport can be selected at a time.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NotificationTarget {
    #[default]
    None,
    Webhook { url: String },
    Channel { channel: String, token: String },
}

impl NotificationTarget {
    /// Builds a target from raw settings. Empty strings count as unset.
    pub fn from_parts(
        webhook_url: Option<String>,
        channel: Option<String>,
        token: Option<String>,
    ) -> Result<Self, ScanError> {
        let non_empty = |v: Option<String>| {
            v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };
        match (non_empty(webhook_url), non_empty(channel), non_empty(token)) {
            (None, None, None) => Ok(NotificationTarget::None),
            (Some(url), None, None) => Ok(NotificationTarget::Webhook { url }),
            (None, Some(channel), Some(token)) => Ok(NotificationTarget::Channel { channel, token }),
            (Some(_), _, _) => Err(ScanError::TransportConfig(
                "webhook URL cannot be combined with channel or token".to_string(),
            )),
            (None, Some(_), None) => Err(ScanError::TransportConfig(
                "channel requires a token".to_string(),
            )),
            (None, None, Some(_)) => Err(ScanError::TransportConfig(
                "token requires a channel".to_string(),
            )),
        }
    }

    pub fn is_configured(&self) -> bool {
        !matches!(self, NotificationTarget::None)
    }
}

#[derive(Serialize)]
pub struct SlackPayload<'a> {
    pub text: &'a str,
}
