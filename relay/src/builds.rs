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

//! Build metadata lookup.

use crate::aws::codebuild;
use crate::error::Result;
use async_trait::async_trait;
use rusoto_codebuild::CodeBuildClient;
use rusoto_core::Region;
use std::fmt::{self, Debug};

/// The value persisted when the build service knows no build number for the
/// reported build id.
pub const UNDEFINED_BUILD_NUMBER: &str = "undefined";

/// A source of build metadata.
#[async_trait]
pub trait BuildInfo: Debug + Send + Sync {
    /// Returns the sequential build number of `build_id`, or `None` if no
    /// matching build exists.
    async fn build_number(&self, build_id: &str) -> Result<Option<i64>>;
}

/// Renders a build number the way it is persisted.
pub fn persisted_build_number(number: Option<i64>) -> String {
    number.map_or_else(|| UNDEFINED_BUILD_NUMBER.to_string(), |n| n.to_string())
}

/// Build metadata from AWS CodeBuild.
pub struct CodeBuildInfo {
    client: CodeBuildClient,
}

impl Debug for CodeBuildInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CodeBuildInfo").finish()
    }
}

impl CodeBuildInfo {
    /// Creates a new CodeBuildInfo for the given region.
    pub fn new(region: Region) -> Self {
        Self {
            client: CodeBuildClient::new(region),
        }
    }
}

#[async_trait]
impl BuildInfo for CodeBuildInfo {
    async fn build_number(&self, build_id: &str) -> Result<Option<i64>> {
        Ok(codebuild::get_build(&self.client, build_id)
            .await?
            .and_then(|build| build.build_number))
    }
}
