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

//! A pipeline run is observed by several independent invocations of the
//! function:
//!
//! - the Source action completes and reports the commit;
//! - the Build action completes and reports the CodeBuild build id;
//! - the Build and Deploy stages start, succeed or fail.
//!
//! Only the last kind of event is reported to the chat, and it carries none
//! of the information gathered by the first two. The invocations therefore
//! share state through a key/value parameter store.
//!
//! Out of the box, Relay bundles these parameter stores:
//!
//! - `HashMapParameterStore`: holds parameters in the function's memory. It
//!   does not survive a cold start and is meant for tests and local runs.
//!
//! - `SsmParameterStore`: holds parameters in the AWS Systems Manager
//!   Parameter Store as `String` parameters.
//!
//! Parameters are written unconditionally; the last writer wins. Which key a
//! value lands under is decided by the [`ParameterScope`]: with the `global`
//! scope every pipeline run shares the same keys, the `pipeline` scope
//! separates pipelines, and the `execution` scope separates runs.

mod run;
pub use run::{
    RunState, ScopedStore, BRANCH_NAME_PARAM, BUILD_NUMBER_PARAM, COMMIT_MESSAGE_PARAM,
    PENDING_BUILD_NUMBER, REPO_NAME_PARAM,
};

mod ssm;
pub use ssm::SsmParameterStore;

use crate::error::{RelayError, Result};
use crate::event::PipelineEvent;
use async_trait::async_trait;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::RwLock;

/// Acknowledgement of a parameter write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PutAck {
    /// The full parameter name.
    pub name:    String,
    /// The parameter version after the write.
    pub version: i64,
    /// The storage tier.
    pub tier:    String,
}

/// The parameter store trait defines the interface for parameter stores.
#[async_trait]
pub trait ParameterStore: Debug + Send + Sync {
    /// Reads a parameter. Fails with [`RelayError::MissingParameter`] if the
    /// parameter does not exist.
    async fn get(&self, name: &str) -> Result<String>;
    /// Writes a parameter, overwriting any previous value.
    async fn put(&self, name: &str, value: &str) -> Result<PutAck>;
}

/// How persisted parameters are partitioned between pipeline runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterScope {
    /// `{prefix}/{name}`: one set of parameters for every pipeline.
    Global,
    /// `{prefix}/{pipeline}/{name}`: one set per pipeline.
    Pipeline,
    /// `{prefix}/{pipeline}/{execution-id}/{name}`: one set per run. Events
    /// without an execution id fall back to the pipeline scope.
    Execution,
}

impl FromStr for ParameterScope {
    type Err = RelayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "global" => Ok(ParameterScope::Global),
            "pipeline" => Ok(ParameterScope::Pipeline),
            "execution" => Ok(ParameterScope::Execution),
            other => Err(RelayError::Config(format!(
                "unknown parameter scope: {}",
                other
            ))),
        }
    }
}

/// Replaces the characters SSM does not accept in parameter paths.
fn path_segment(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' | '-' => c,
            _ => '_',
        })
        .collect()
}

impl ParameterScope {
    /// Returns the parameter path under which the state of the event's run
    /// is stored.
    pub fn namespace(&self, prefix: &str, event: &PipelineEvent) -> String {
        let pipeline = path_segment(&event.detail.pipeline);
        match (self, event.detail.execution_id.as_deref()) {
            (ParameterScope::Global, _) => prefix.to_string(),
            (ParameterScope::Execution, Some(id)) if !id.is_empty() => {
                format!("{}/{}/{}", prefix, pipeline, path_segment(id))
            }
            _ => format!("{}/{}", prefix, pipeline),
        }
    }
}

/// The in-memory parameter store.
#[derive(Debug, Default)]
pub struct HashMapParameterStore {
    params: RwLock<HashMap<String, (String, i64)>>,
}

impl HashMapParameterStore {
    /// Creates a new HashMapParameterStore.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current value of a parameter without going through the
    /// async interface.
    pub fn value(&self, name: &str) -> Option<String> {
        self.params
            .read()
            .ok()
            .and_then(|params| params.get(name).map(|(v, _)| v.clone()))
    }

    /// Returns the number of stored parameters.
    pub fn len(&self) -> usize {
        self.params.read().map(|params| params.len()).unwrap_or(0)
    }

    /// Returns true if no parameter has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ParameterStore for HashMapParameterStore {
    async fn get(&self, name: &str) -> Result<String> {
        self.value(name)
            .ok_or_else(|| RelayError::MissingParameter(name.to_string()))
    }

    async fn put(&self, name: &str, value: &str) -> Result<PutAck> {
        let mut params = self
            .params
            .write()
            .map_err(|_| RelayError::Internal("parameter map lock poisoned".to_string()))?;
        let version = params.get(name).map_or(1, |(_, v)| v + 1);
        params.insert(name.to_string(), (value.to_string(), version));
        Ok(PutAck {
            name: name.to_string(),
            version,
            tier: "Standard".to_string(),
        })
    }
}
