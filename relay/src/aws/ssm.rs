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

//! This crate contains all wrapped functions of the AWS Systems Manager
//! Parameter Store.

use crate::configs::RELAY_PARAMETER_TYPE;
use crate::error::{RelayError, Result};
use log::debug;
use rusoto_core::RusotoError;
use rusoto_ssm::{
    GetParameterError, GetParameterRequest, PutParameterRequest, PutParameterResult, Ssm,
    SsmClient,
};

/// Gets the value of a parameter.
///
/// # Arguments
/// * `client` - The SSM client.
/// * `name` - The full name of the parameter.
///
/// # Returns
/// The parameter value, or [`RelayError::MissingParameter`] if the parameter
/// does not exist.
pub async fn get_parameter(client: &SsmClient, name: &str) -> Result<String> {
    let request = GetParameterRequest {
        name: name.to_owned(),
        ..Default::default()
    };

    match client.get_parameter(request).await {
        Ok(output) => output
            .parameter
            .and_then(|p| p.value)
            .ok_or_else(|| RelayError::MissingParameter(name.to_owned())),
        Err(RusotoError::Service(GetParameterError::ParameterNotFound(_))) => {
            Err(RelayError::MissingParameter(name.to_owned()))
        }
        Err(e) => Err(RelayError::AWS(e.to_string())),
    }
}

/// Puts a `String` parameter. If the parameter exists, it is overwritten.
///
/// # Arguments
/// * `client` - The SSM client.
/// * `name` - The full name of the parameter.
/// * `value` - The value to store.
pub async fn put_parameter(
    client: &SsmClient,
    name: &str,
    value: &str,
) -> Result<PutParameterResult> {
    debug!("Putting parameter {}", name);
    client
        .put_parameter(PutParameterRequest {
            name: name.to_owned(),
            value: value.to_owned(),
            type_: Some(RELAY_PARAMETER_TYPE.to_owned()),
            overwrite: Some(true),
            ..Default::default()
        })
        .await
        .map_err(|e| RelayError::AWS(e.to_string()))
}
