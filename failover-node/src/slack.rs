//! Slack incoming-webhook alert sink.

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use failover_monitor::AlertSink;

#[derive(Debug, Deserialize, Serialize, Default, Clone, PartialEq, Eq)]
pub struct SlackConfig {
    pub url: Option<String>,
    pub channel: Option<String>,
    /// Label prefixed to every message, e.g. `jungle4`
    pub chain: Option<String>,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct SlackMessage {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
}

pub struct SlackWebhook {
    http: Client,
    config: SlackConfig,
}

impl SlackWebhook {
    pub fn new(config: SlackConfig, timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build webhook client")?;
        Ok(Self { http, config })
    }

    /// Without a URL every alert is only logged
    pub fn is_enabled(&self) -> bool {
        self.config.url.as_deref().is_some_and(|url| !url.is_empty())
    }

    pub fn format(&self, message: &str) -> SlackMessage {
        let text = match &self.config.chain {
            Some(chain) => format!("[{}] {}", chain, message),
            None => message.to_string(),
        };
        SlackMessage {
            text,
            channel: self.config.channel.clone(),
        }
    }

    pub async fn send(&self, message: &str) -> Result<()> {
        let Some(url) = self.config.url.as_deref().filter(|url| !url.is_empty()) else {
            return Ok(());
        };

        let res = self
            .http
            .post(url)
            .json(&self.format(message))
            .send()
            .await
            .context("Failed to post to webhook")?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            anyhow::bail!("Webhook returned HTTP {}: {}", status, body);
        }
        Ok(())
    }
}

#[async_trait]
impl AlertSink for SlackWebhook {
    async fn notify(&self, message: &str) {
        log::info!("Alert: {}", message);
        if let Err(e) = self.send(message).await {
            log::warn!("Failed to deliver alert: {:#}", e);
        }
    }
}
