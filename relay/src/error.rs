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

//! Relay error types

use std::error;
use std::fmt::{Display, Formatter};
use std::result;

/// Result type for operations that could result in an [RelayError]
pub type Result<T> = result::Result<T, RelayError>;

/// Relay error
#[derive(Debug)]
pub enum RelayError {
    /// Error associated to Lambda runtime execution.
    LambdaError(Box<dyn std::error::Error + Send + Sync>),
    /// Error returned when serde_json failed to serialize or deserialize data.
    SerdeJson(serde_json::Error),
    /// Error returned when the inbound event lacks a field the handler needs.
    MalformedEvent(String),
    /// Error returned when a parameter is absent from the parameter store.
    MissingParameter(String),
    /// Error returned when accessing the AWS services fails.
    AWS(String),
    /// Error returned when the webhook request fails or is rejected.
    Http(String),
    /// Error returned when the configuration cannot be read or is invalid.
    Config(String),
    /// Error returned as a consequence of an error in Relay.
    /// Relay has internal invariants that we are unable to ask the
    /// compiler to check for us. This error is raised when one of those
    /// invariants is not verified during execution.
    Internal(String),
}

impl From<serde_json::Error> for RelayError {
    fn from(e: serde_json::Error) -> Self {
        RelayError::SerdeJson(e)
    }
}

impl From<reqwest::Error> for RelayError {
    fn from(e: reqwest::Error) -> Self {
        RelayError::Http(e.to_string())
    }
}

impl From<Box<dyn std::error::Error + Send + Sync>> for RelayError {
    fn from(e: Box<dyn std::error::Error + Send + Sync>) -> Self {
        RelayError::LambdaError(e)
    }
}

impl Display for RelayError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match *self {
            RelayError::LambdaError(ref desc) => write!(f, "Lambda error: {}", desc),
            RelayError::SerdeJson(ref desc) => write!(f, "serde_json error: {:?}", desc),
            RelayError::MalformedEvent(ref desc) => write!(f, "Malformed event: {}", desc),
            RelayError::MissingParameter(ref name) => {
                write!(f, "Parameter not found: {}", name)
            }
            RelayError::AWS(ref desc) => write!(f, "AWS error: {}", desc),
            RelayError::Http(ref desc) => write!(f, "Webhook error: {}", desc),
            RelayError::Config(ref desc) => write!(f, "Configuration error: {}", desc),
            RelayError::Internal(ref desc) => write!(
                f,
                "Internal error: {}. This was likely caused by a bug in Relay's \
                    code and we would welcome that you file an bug report in our issue tracker",
                desc
            ),
        }
    }
}

impl error::Error for RelayError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_parameter_names_the_key() {
        let err = RelayError::MissingParameter("/discord-notify/commitMsg".to_string());
        assert_eq!(
            err.to_string(),
            "Parameter not found: /discord-notify/commitMsg"
        );
    }

    #[test]
    fn serde_errors_convert() {
        let err: RelayError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, RelayError::SerdeJson(_)));
        assert!(err.to_string().starts_with("serde_json error"));
    }
}
