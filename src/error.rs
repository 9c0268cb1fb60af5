use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by resource sources.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("failed to list {kind} in namespace {namespace}: {source}")]
    Fetch {
        namespace: String,
        kind: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("malformed {kind} {name}: {detail}")]
    MalformedResource {
        kind: &'static str,
        name: String,
        detail: &'static str,
    },

    #[error("failed to serialize report as JSON")]
    SerializeJson(#[from] serde_json::Error),

    #[error("failed to serialize report as YAML")]
    SerializeYaml(#[from] serde_yaml::Error),

    #[error("invalid notification config: {0}")]
    TransportConfig(String),

    #[error("no notification transport configured: set either a webhook URL or a channel and token")]
    MissingTransportConfig,

    #[error("failed to write report file {path}")]
    ReportFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{transport} request failed")]
    DeliveryRequest {
        transport: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("{transport} returned non-OK status code: {status}")]
    DeliveryStatus { transport: &'static str, status: u16 },
}

impl ScanError {
    /// True for failures that happened while handing a report to a transport.
    pub fn is_delivery(&self) -> bool {
        matches!(
            self,
            ScanError::ReportFile { .. }
                | ScanError::DeliveryRequest { .. }
                | ScanError::DeliveryStatus { .. }
        )
    }
}

/// A rendered report that could not be delivered. Keeps the text so the caller can
/// still print it.
#[derive(Debug, Error)]
#[error("failed to deliver report")]
pub struct UndeliveredReport {
    pub text: String,
    #[source]
    pub source: ScanError,
}
