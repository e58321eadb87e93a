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

use super::{ParameterStore, PutAck};
use crate::aws::ssm;
use crate::error::Result;
use async_trait::async_trait;
use rusoto_core::Region;
use rusoto_ssm::SsmClient;
use std::fmt;

/// A parameter store backed by AWS Systems Manager.
pub struct SsmParameterStore {
    client: SsmClient,
}

impl fmt::Debug for SsmParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SsmParameterStore").finish()
    }
}

impl SsmParameterStore {
    /// Creates a new SsmParameterStore for the given region.
    pub fn new(region: Region) -> Self {
        Self {
            client: SsmClient::new(region),
        }
    }
}

#[async_trait]
impl ParameterStore for SsmParameterStore {
    async fn get(&self, name: &str) -> Result<String> {
        ssm::get_parameter(&self.client, name).await
    }

    async fn put(&self, name: &str, value: &str) -> Result<PutAck> {
        let result = ssm::put_parameter(&self.client, name, value).await?;
        Ok(PutAck {
            name:    name.to_string(),
            version: result.version.unwrap_or_default(),
            tier:    result.tier.unwrap_or_else(|| "Standard".to_string()),
        })
    }
}
