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

//! This crate contains all wrapped functions of the AWS CodeBuild service.

use crate::error::{RelayError, Result};
use rusoto_codebuild::{BatchGetBuildsInput, Build, CodeBuild, CodeBuildClient};

/// Gets the metadata of a single build.
///
/// # Arguments
/// * `client` - The CodeBuild client.
/// * `build_id` - The build id, e.g. `my-project:6a2e0f1c-...`.
///
/// # Returns
/// The build, or `None` if CodeBuild does not know the id.
pub async fn get_build(client: &CodeBuildClient, build_id: &str) -> Result<Option<Build>> {
    let output = client
        .batch_get_builds(BatchGetBuildsInput {
            ids: vec![build_id.to_owned()],
        })
        .await
        .map_err(|e| RelayError::AWS(e.to_string()))?;

    Ok(output.builds.and_then(|builds| builds.into_iter().next()))
}
