use anyhow::{Context, Result};
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tracing::{debug, error, info, warn};

use crate::error::{ScanError, UndeliveredReport};
use crate::types::{Config, NotificationTarget, SlackPayload};

pub const FILES_UPLOAD_URL: &str = "https://slack.com/api/files.upload";
pub const REPORT_FILE_NAME: &str = "kor-scan-results.txt";

const WEBHOOK: &str = "slack webhook";
const FILES_UPLOAD: &str = "slack files.upload";

/// Something that can hand a text report to a notification target.
pub trait ReportSender {
    fn send(
        &self,
        target: &NotificationTarget,
        text: &str,
    ) -> impl Future<Output = Result<(), ScanError>> + Send;
}

pub struct SlackNotifier {
    client: reqwest::Client,
    upload_url: String,
    report_file: Option<PathBuf>,
    keep_report_file: bool,
}

impl SlackNotifier {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            upload_url: FILES_UPLOAD_URL.to_string(),
            report_file: None,
            keep_report_file: false,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut notifier = Self::new(cfg.http_timeout)?.keep_report_file(cfg.keep_report_file);
        notifier.report_file = cfg.report_file.clone();
        Ok(notifier)
    }

    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    pub fn with_report_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_file = Some(path.into());
        self
    }

    pub fn keep_report_file(mut self, keep: bool) -> Self {
        self.keep_report_file = keep;
        self
    }

    pub async fn deliver(&self, target: &NotificationTarget, text: &str) -> Result<(), ScanError> {
        match target {
            NotificationTarget::Webhook { url } => self.send_webhook(url, text).await,
            NotificationTarget::Channel { channel, token } => {
                self.upload_to_channel(channel, token, text).await
            }
            NotificationTarget::None => Err(ScanError::MissingTransportConfig),
        }
    }

    async fn send_webhook(&self, url: &str, text: &str) -> Result<(), ScanError> {
        let res = self
            .client
            .post(url)
            .json(&SlackPayload { text })
            .send()
            .await
            .map_err(|source| ScanError::DeliveryRequest { transport: WEBHOOK, source })?;
        if !res.status().is_success() {
            let status = res.status();
            let body = res.text().await.unwrap_or_default();
            error!("Slack webhook failed: {} - {}", status, body);
            return Err(ScanError::DeliveryStatus { transport: WEBHOOK, status: status.as_u16() });
        }
        Ok(())
    }

    async fn upload_to_channel(&self, channel: &str, token: &str, text: &str) -> Result<(), ScanError> {
        info!("Sending message to Slack channel {}", channel);
        let path = self.report_file.clone().ok_or_else(|| ScanError::ReportFile {
            path: PathBuf::from(REPORT_FILE_NAME),
            source: std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "failed to get user's home directory",
            ),
        })?;

        // Dropping the guard removes the file, whichever way this function returns
        let report = ReportFile::write(path, text, self.keep_report_file).await?;
        let contents = report.read().await?;

        let part = Part::bytes(contents).file_name(report.file_name());
        let form = Form::new()
            .part("file", part)
            .text("channels", channel.to_string());

        let res = self
            .client
            .post(&self.upload_url)
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|source| ScanError::DeliveryRequest { transport: FILES_UPLOAD, source })?;

        if res.status() != StatusCode::OK {
            let status = res.status();
            error!("Slack file upload failed: {}", status);
            return Err(ScanError::DeliveryStatus { transport: FILES_UPLOAD, status: status.as_u16() });
        }
        debug!("Uploaded {} to Slack channel {}", report.path.display(), channel);
        Ok(())
    }
}

impl ReportSender for SlackNotifier {
    async fn send(&self, target: &NotificationTarget, text: &str) -> Result<(), ScanError> {
        self.deliver(target, text).await
    }
}

/// Default location of the upload file, under the given home directory.
pub fn default_report_path(home: &Path) -> PathBuf {
    home.join(REPORT_FILE_NAME)
}

/// Deliver an already rendered report. On failure the text comes back with the error.
pub async fn send_to_slack<S: ReportSender>(
    sender: &S,
    target: &NotificationTarget,
    text: String,
) -> Result<(), UndeliveredReport> {
    match sender.send(target, &text).await {
        Ok(()) => Ok(()),
        Err(source) => Err(UndeliveredReport { text, source }),
    }
}

/// On-disk copy of the report used for the file upload.
struct ReportFile {
    path: PathBuf,
    keep: bool,
}

impl ReportFile {
    async fn write(path: PathBuf, text: &str, keep: bool) -> Result<Self, ScanError> {
        if let Err(source) = tokio::fs::write(&path, text).await {
            return Err(ScanError::ReportFile { path, source });
        }
        Ok(Self { path, keep })
    }

    async fn read(&self) -> Result<Vec<u8>, ScanError> {
        let io_err = |source: std::io::Error| ScanError::ReportFile { path: self.path.clone(), source };
        let mut file = tokio::fs::File::open(&self.path).await.map_err(io_err)?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await.map_err(io_err)?;
        Ok(buf)
    }

    fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| REPORT_FILE_NAME.to_string())
    }
}

impl Drop for ReportFile {
    fn drop(&mut self) {
        if self.keep {
            return;
        }
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove report file {}: {}", self.path.display(), e);
        }
    }
}
