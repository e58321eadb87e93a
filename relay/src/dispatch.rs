// Copyright (c) 2020-present, UMD Database Group.
//
// This program is free software: you can use, redistribute, and/or modify
// it under the terms of the GNU Affero General Public License, version 3
// or later ("AGPL"), as published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or
// FITNESS FOR A PARTICULAR PURPOSE.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.

//! Delivery of notifications to the chat webhook.

use crate::configs::WebhookConfig;
use crate::error::{RelayError, Result};
use crate::message::NotificationMessage;
use async_trait::async_trait;
use log::info;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// The webhook request body.
///
/// `embeds` always holds exactly one entry. It is `null` when the event
/// produced no message; the request is sent anyway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookPayload {
    /// Display name of the posting bot.
    pub username:   String,
    /// Avatar of the posting bot.
    pub avatar_url: String,
    /// Plain-text content.
    pub content:    String,
    /// The embeds.
    pub embeds:     Vec<Option<NotificationMessage>>,
}

impl WebhookPayload {
    /// Wraps `message` into a payload posted as the configured bot.
    pub fn new(config: &WebhookConfig, message: Option<NotificationMessage>) -> Self {
        Self {
            username:   config.username.clone(),
            avatar_url: config.avatar_url.clone(),
            content:    config.content.clone(),
            embeds:     vec![message],
        }
    }
}

/// Delivers webhook payloads.
#[async_trait]
pub trait Dispatcher: Debug + Send + Sync {
    /// Delivers one payload. Failures are not retried.
    async fn dispatch(&self, payload: &WebhookPayload) -> Result<()>;
}

/// Posts payloads to an HTTP webhook.
#[derive(Debug, Clone)]
pub struct WebhookDispatcher {
    client: reqwest::Client,
    url:    String,
}

impl WebhookDispatcher {
    /// Creates a dispatcher for the webhook at `url`.
    pub fn new(url: &str) -> Self {
        Self {
            client: reqwest::Client::new(),
            url:    url.to_owned(),
        }
    }
}

#[async_trait]
impl Dispatcher for WebhookDispatcher {
    async fn dispatch(&self, payload: &WebhookPayload) -> Result<()> {
        let response = self.client.post(&self.url).json(payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Http(format!(
                "webhook responded {}: {}",
                status, body
            )));
        }
        info!("Webhook delivered ({}).", status);
        Ok(())
    }
}
