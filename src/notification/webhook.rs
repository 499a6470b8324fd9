//! Blocking webhook transport
//!
//! Thin wrapper over a blocking reqwest client: POST a payload, hand the
//! status code back. Delivery policy (what counts as accepted, whether to
//! warn) lives with the caller.

use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use reqwest::StatusCode;

/// The status Discord returns for an accepted webhook execution.
pub const ACCEPTED_STATUS: StatusCode = StatusCode::NO_CONTENT;

#[derive(Debug, Clone)]
pub struct WebhookConfig {
    /// Webhook endpoint URL
    pub url: String,
    /// Request timeout, seconds
    pub timeout_secs: u64,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug)]
pub struct WebhookClient {
    client: Client,
    config: WebhookConfig,
}

impl WebhookClient {
    pub fn new(config: WebhookConfig) -> Result<Self> {
        if config.url.trim().is_empty() {
            bail!("webhook url is invalid");
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self { client, config })
    }

    pub fn url(&self) -> &str {
        &self.config.url
    }

    /// POST a JSON body; returns the response status.
    pub fn post_json(&self, payload: &serde_json::Value) -> Result<StatusCode> {
        let response = self
            .client
            .post(&self.config.url)
            .json(payload)
            .send()
            .context("webhook request failed")?;
        Ok(response.status())
    }

    /// POST a multipart form carrying the embed payload plus the raw dump
    /// file, tagged with its original base name.
    pub fn post_with_attachment(
        &self,
        payload_json: String,
        file_name: &str,
        contents: Vec<u8>,
    ) -> Result<StatusCode> {
        let form = Form::new()
            .text("payload_json", payload_json)
            .part("file", Part::bytes(contents).file_name(file_name.to_string()));

        let response = self
            .client
            .post(&self.config.url)
            .multipart(form)
            .send()
            .context("webhook request failed")?;
        Ok(response.status())
    }
}
