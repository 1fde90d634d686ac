use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use slog::{debug, info, Logger};
use std::time::Duration;

/// A rendered report on its way to a recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub place: String,
    pub chat_id: Option<String>,
    pub text: String,
}

#[derive(thiserror::Error, Debug)]
pub enum DeliveryError {
    #[error("error sending report: {0}")]
    Request(#[from] reqwest::Error),
    #[error("webhook responded {status}")]
    Status { status: StatusCode },
}

/// Where finished reports are handed over.
#[async_trait]
pub trait ReportSink: Send + Sync {
    async fn deliver(&self, report: &Report) -> Result<(), DeliveryError>;
}

/// Prints reports to stdout.
pub struct LogSink {
    logger: Logger,
}

impl LogSink {
    pub fn new(logger: Logger) -> Self {
        LogSink { logger }
    }
}

#[async_trait]
impl ReportSink for LogSink {
    async fn deliver(&self, report: &Report) -> Result<(), DeliveryError> {
        info!(self.logger, "report for {}", report.place);
        println!("{}", report.text);
        Ok(())
    }
}

#[derive(Serialize)]
struct WebhookPayload<'a> {
    chat_id: Option<&'a str>,
    text: &'a str,
}

/// Posts reports as JSON `{chat_id, text}` to a configured URL.
pub struct WebhookSink {
    logger: Logger,
    url: String,
    client: Client,
}

impl WebhookSink {
    pub fn new(logger: Logger, url: &str, timeout: Duration) -> Result<Self, DeliveryError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(WebhookSink {
            logger,
            url: url.to_string(),
            client,
        })
    }
}

#[async_trait]
impl ReportSink for WebhookSink {
    async fn deliver(&self, report: &Report) -> Result<(), DeliveryError> {
        let payload = WebhookPayload {
            chat_id: report.chat_id.as_deref(),
            text: &report.text,
        };
        debug!(self.logger, "posting report for {} to {}", report.place, self.url);
        let response = self.client.post(&self.url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeliveryError::Status { status });
        }
        Ok(())
    }
}
