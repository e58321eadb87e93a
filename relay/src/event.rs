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

//! CodePipeline lifecycle events as delivered by the SNS notification rule.
//!
//! The Lambda function receives an SNS batch whose first record carries the
//! pipeline event as a JSON string:
//!
//! ```json
//! {
//!     "Records": [
//!         {
//!             "Sns": {
//!                 "Message": "{\"detailType\":\"CodePipeline Stage Execution State Change\", ...}"
//!             }
//!         }
//!     ]
//! }
//! ```

use crate::error::{RelayError, Result};
use aws_lambda_events::event::sns::SnsEvent;
use serde::Deserialize;
use serde_json::Value;

/// The branch name reported when the pipeline name does not encode one.
pub const UNKNOWN_BRANCH: &str = "Unknown";

/// The kind of a pipeline notification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DetailType {
    /// A whole stage started, succeeded or failed.
    StageExecutionStateChange,
    /// A single action within a stage changed state.
    ActionExecutionStateChange,
    /// Any other notification, e.g. pipeline-level state changes.
    Other(String),
}

impl From<String> for DetailType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CodePipeline Stage Execution State Change" => DetailType::StageExecutionStateChange,
            "CodePipeline Action Execution State Change" => DetailType::ActionExecutionStateChange,
            _ => DetailType::Other(s),
        }
    }
}

/// The pipeline stage the event refers to.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum Stage {
    /// Source checkout.
    Source,
    /// CodeBuild compilation.
    Build,
    /// Deployment.
    Deploy,
    /// Any stage the relay does not know about.
    Other(String),
}

impl From<String> for Stage {
    fn from(s: String) -> Self {
        match s.as_str() {
            "Source" => Stage::Source,
            "Build" => Stage::Build,
            "Deploy" => Stage::Deploy,
            _ => Stage::Other(s),
        }
    }
}

/// The execution state carried by the event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum State {
    /// STARTED
    Started,
    /// SUCCEEDED
    Succeeded,
    /// FAILED
    Failed,
    /// CANCELED, SUPERSEDED, RESUMED, ...
    Other(String),
}

impl From<String> for State {
    fn from(s: String) -> Self {
        match s.as_str() {
            "STARTED" => State::Started,
            "SUCCEEDED" => State::Succeeded,
            "FAILED" => State::Failed,
            _ => State::Other(s),
        }
    }
}

/// Output of the action that produced the event.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecutionResult {
    /// For source actions, the commit summary: either the plain commit message
    /// or a JSON document `{"ProviderType": ..., "CommitMessage": ...}`.
    #[serde(rename = "external-execution-summary")]
    pub summary: Option<String>,
    /// For build actions, the CodeBuild build id.
    #[serde(rename = "external-execution-id")]
    pub id:      Option<String>,
}

/// The `detail` object of a pipeline event.
#[derive(Debug, Clone, Deserialize)]
pub struct Detail {
    /// The pipeline name, conventionally `{repo}-{branch}`.
    pub pipeline:         String,
    /// The pipeline execution this event belongs to.
    #[serde(rename = "execution-id")]
    pub execution_id:     Option<String>,
    /// The stage name.
    pub stage:            Stage,
    /// The action name, only present on action events.
    pub action:           Option<String>,
    /// The new state.
    pub state:            State,
    /// The action output, only present on completed action events.
    #[serde(rename = "execution-result")]
    pub execution_result: Option<ExecutionResult>,
}

/// Variables exported by a source action.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceActionVariables {
    /// The checked out branch.
    #[serde(rename = "BranchName")]
    pub branch_name:     Option<String>,
    /// The checked out repository.
    #[serde(rename = "RepositoryName")]
    pub repository_name: Option<String>,
}

/// A source action of the pipeline.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceAction {
    /// Variables exported by the action.
    #[serde(rename = "sourceActionVariables")]
    pub variables: Option<SourceActionVariables>,
}

/// Extra attributes attached by the notification rule.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdditionalAttributes {
    /// The source actions of the pipeline.
    #[serde(rename = "sourceActions", default)]
    pub source_actions: Vec<SourceAction>,
}

/// A pipeline lifecycle event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineEvent {
    /// The kind of notification.
    #[serde(alias = "detail-type")]
    pub detail_type:           DetailType,
    /// The region of the pipeline.
    pub region:                String,
    /// The event detail.
    pub detail:                Detail,
    /// Attributes added by the notification rule.
    pub additional_attributes: Option<AdditionalAttributes>,
}

/// What the handler does with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// The Source stage changed state. Nothing to report.
    SourceStage,
    /// The Build stage changed state. Notify.
    BuildStage,
    /// The Deploy stage changed state. Notify.
    DeployStage,
    /// A Source action changed state. Persist the commit.
    SourceAction,
    /// A Build action changed state. Persist the build number.
    BuildAction,
    /// Anything else.
    Unhandled,
}

/// Extracts the pipeline event from the first record of an SNS batch.
pub fn parse_sns(value: Value) -> Result<PipelineEvent> {
    let event: SnsEvent = serde_json::from_value(value)?;
    let record = event
        .records
        .into_iter()
        .next()
        .ok_or_else(|| RelayError::MalformedEvent("the SNS batch has no records".to_string()))?;
    Ok(serde_json::from_str(&record.sns.message)?)
}

/// Splits a `{repo}-{branch}` pipeline name at its last `-`.
///
/// A name without a separator yields the whole name as the repository and
/// [`UNKNOWN_BRANCH`] as the branch.
pub fn split_pipeline(pipeline: &str) -> (String, String) {
    match pipeline.rsplit_once('-') {
        Some((repo, branch)) => (repo.to_string(), branch.to_string()),
        None => (pipeline.to_string(), UNKNOWN_BRANCH.to_string()),
    }
}

impl PipelineEvent {
    /// Classifies the event.
    pub fn route(&self) -> Route {
        match (&self.detail_type, &self.detail.stage) {
            (DetailType::StageExecutionStateChange, Stage::Source) => Route::SourceStage,
            (DetailType::StageExecutionStateChange, Stage::Build) => Route::BuildStage,
            (DetailType::StageExecutionStateChange, Stage::Deploy) => Route::DeployStage,
            (DetailType::ActionExecutionStateChange, Stage::Source) => Route::SourceAction,
            (DetailType::ActionExecutionStateChange, Stage::Build) => Route::BuildAction,
            _ => Route::Unhandled,
        }
    }

    fn execution_result(&self) -> Result<&ExecutionResult> {
        self.detail.execution_result.as_ref().ok_or_else(|| {
            RelayError::MalformedEvent(format!(
                "{:?} action of {} has no execution-result",
                self.detail.stage, self.detail.pipeline
            ))
        })
    }

    /// Returns the commit message reported by a source action.
    pub fn commit_message(&self) -> Result<String> {
        let summary = self.execution_result()?.summary.clone().ok_or_else(|| {
            RelayError::MalformedEvent("missing external-execution-summary".to_string())
        })?;

        match serde_json::from_str::<Value>(&summary) {
            Ok(Value::Object(doc)) if doc.get("ProviderType").map_or(false, |p| !p.is_null()) => doc
                .get("CommitMessage")
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| {
                    RelayError::MalformedEvent("summary has no CommitMessage".to_string())
                }),
            _ => Ok(summary),
        }
    }

    /// Returns the CodeBuild build id reported by a build action.
    pub fn build_execution_id(&self) -> Result<&str> {
        self.execution_result()?
            .id
            .as_deref()
            .ok_or_else(|| RelayError::MalformedEvent("missing external-execution-id".to_string()))
    }

    /// Returns the variables of the first source action, if the notification
    /// rule attached them.
    pub fn source_variables(&self) -> Option<&SourceActionVariables> {
        self.additional_attributes
            .as_ref()?
            .source_actions
            .first()?
            .variables
            .as_ref()
    }

    /// Returns the repository and branch derived from the pipeline name.
    pub fn pipeline_repo_and_branch(&self) -> (String, String) {
        split_pipeline(&self.detail.pipeline)
    }

    /// Returns the console link of the pipeline.
    pub fn console_url(&self) -> String {
        format!(
            "https://{region}.console.aws.amazon.com/codesuite/codepipeline/pipelines/{pipeline}/view?region={region}",
            region = self.region,
            pipeline = self.detail.pipeline
        )
    }
}
