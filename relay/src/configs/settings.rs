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

//! Typed view over the relay settings.

use super::*;
use crate::error::{RelayError, Result};
use crate::state::ParameterScope;
use ini::Ini;
use rusoto_core::Region;
use std::str::FromStr;

/// The chat webhook the notifications are delivered to.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookConfig {
    /// The webhook endpoint.
    pub url:        String,
    /// The display name of the posting bot.
    pub username:   String,
    /// The avatar of the posting bot. Empty means the webhook default.
    pub avatar_url: String,
    /// Plain-text content sent alongside the embed.
    pub content:    String,
}

/// Relay configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayConfig {
    /// The AWS region of the parameter store and the build service.
    pub region:           String,
    /// The path prefix of every persisted parameter, e.g. `/discord-notify`.
    pub parameter_prefix: String,
    /// How persisted parameters are partitioned between pipeline runs.
    pub scope:            ParameterScope,
    /// The outbound webhook.
    pub webhook:          WebhookConfig,
}

fn required(conf: &Ini, section: &str, key: &str) -> Result<String> {
    conf.get_from(Some(section), key)
        .map(|v| v.trim().to_string())
        .ok_or_else(|| RelayError::Config(format!("missing [{}] {}", section, key)))
}

fn optional(conf: &Ini, section: &str, key: &str) -> String {
    conf.get_from(Some(section), key)
        .map(|v| v.trim().to_string())
        .unwrap_or_default()
}

impl RelayConfig {
    /// Builds the configuration from an ini document.
    pub fn from_ini(conf: &Ini) -> Result<Self> {
        let prefix = required(conf, "parameters", "prefix")?;
        Ok(RelayConfig {
            region:           required(conf, "aws", "region")?,
            parameter_prefix: prefix.trim_end_matches('/').to_string(),
            scope:            ParameterScope::from_str(&required(conf, "parameters", "scope")?)?,
            webhook:          WebhookConfig {
                url:        required(conf, "webhook", "url")?,
                username:   optional(conf, "webhook", "username"),
                avatar_url: optional(conf, "webhook", "avatar_url"),
                content:    optional(conf, "webhook", "content"),
            },
        })
    }

    /// Builds the configuration from the bundled settings, then applies the
    /// `RELAY_*` environment overrides.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::from_ini(&RELAY_CONF)?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides looked up by `lookup`. Empty values are ignored.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = lookup(RELAY_WEBHOOK_URL_ENV) {
            self.webhook.url = url;
        }
        if let Some(region) = lookup(RELAY_REGION_ENV) {
            self.region = region;
        }
        if let Some(prefix) = lookup(RELAY_PARAMETER_PREFIX_ENV) {
            self.parameter_prefix = prefix.trim_end_matches('/').to_string();
        }
        if let Some(scope) = lookup(RELAY_PARAMETER_SCOPE_ENV) {
            self.scope = ParameterScope::from_str(&scope)?;
        }
        Ok(())
    }

    /// Returns the AWS region for the service clients.
    pub fn aws_region(&self) -> Result<Region> {
        Region::from_str(&self.region)
            .map_err(|e| RelayError::Config(format!("invalid region {}: {}", self.region, e)))
    }
}
