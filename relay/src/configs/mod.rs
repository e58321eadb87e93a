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

//! This module provides various default configurations for Relay.

mod relay;
pub use self::relay::RELAY_CONF;

mod settings;
pub use settings::{RelayConfig, WebhookConfig};

/// Environment variable that overrides the webhook endpoint.
pub const RELAY_WEBHOOK_URL_ENV: &str = "RELAY_WEBHOOK_URL";
/// Environment variable that overrides the AWS region of the collaborators.
pub const RELAY_REGION_ENV: &str = "RELAY_REGION";
/// Environment variable that overrides the parameter path prefix.
pub const RELAY_PARAMETER_PREFIX_ENV: &str = "RELAY_PARAMETER_PREFIX";
/// Environment variable that overrides the parameter scope.
pub const RELAY_PARAMETER_SCOPE_ENV: &str = "RELAY_PARAMETER_SCOPE";

/// The SSM parameter type used for every persisted value.
pub const RELAY_PARAMETER_TYPE: &str = "String";
/// Response body of a successful invocation.
pub const RELAY_OK_BODY: &str = "Discord Webhook sent successfully.";
/// Response body of a failed invocation.
pub const RELAY_ERROR_BODY: &str = "Error sending Discord Webhook.";
