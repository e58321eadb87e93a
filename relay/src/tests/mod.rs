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

//! Common unit test utility methods

use crate::builds::BuildInfo;
use crate::configs::{RelayConfig, WebhookConfig};
use crate::dispatch::{Dispatcher, WebhookPayload};
use crate::error::{RelayError, Result};
use crate::state::{ParameterScope, ParameterStore, PutAck};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;

/// The pipeline of the generated events.
pub const TEST_PIPELINE: &str = "myrepo-main";
/// The region of the generated events.
pub const TEST_REGION: &str = "us-west-2";
/// The execution id of the generated events.
pub const TEST_EXECUTION_ID: &str = "5a1c1b5e-8f3d-4f63-9d5c-2b1f0c9a7e10";

/// Wraps a raw message into an SNS batch.
///
/// # Example
///
/// ```json
/// {
///     "Records": [
///         {
///             "EventSource": "aws:sns",
///             "EventVersion": "1.0",
///             "EventSubscriptionArn": "arn:aws:sns:us-west-2:123456789012:codepipeline-notifications:3f1c...",
///             "Sns": {
///                 "Type": "Notification",
///                 "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
///                 "TopicArn": "arn:aws:sns:us-west-2:123456789012:codepipeline-notifications",
///                 "Subject": null,
///                 "Message": "{\"detailType\": ...}",
///                 "Timestamp": "2024-03-09T08:00:00.000Z",
///                 "SignatureVersion": "1",
///                 "Signature": "EXAMPLE",
///                 "SigningCertUrl": "https://sns.us-west-2.amazonaws.com/SimpleNotificationService.pem",
///                 "UnsubscribeUrl": "https://sns.us-west-2.amazonaws.com/?Action=Unsubscribe",
///                 "MessageAttributes": {}
///             }
///         }
///     ]
/// }
/// ```
pub fn sns_message(message: &str) -> Value {
    json!({
        "Records": [
            {
                "EventSource": "aws:sns",
                "EventVersion": "1.0",
                "EventSubscriptionArn": "arn:aws:sns:us-west-2:123456789012:codepipeline-notifications:3f1c2a8e-6d0b-4e1a-9a57-0c8e1b7d2f45",
                "Sns": {
                    "Type": "Notification",
                    "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
                    "TopicArn": "arn:aws:sns:us-west-2:123456789012:codepipeline-notifications",
                    "Subject": null,
                    "Message": message,
                    "Timestamp": "2024-03-09T08:00:00.000Z",
                    "SignatureVersion": "1",
                    "Signature": "EXAMPLE",
                    "SigningCertUrl": "https://sns.us-west-2.amazonaws.com/SimpleNotificationService.pem",
                    "UnsubscribeUrl": "https://sns.us-west-2.amazonaws.com/?Action=Unsubscribe&SubscriptionArn=arn:aws:sns:us-west-2:123456789012:codepipeline-notifications",
                    "MessageAttributes": {}
                }
            }
        ]
    })
}

/// Wraps a pipeline event into an SNS batch.
pub fn sns_event(message: Value) -> Value {
    sns_message(&message.to_string())
}

fn pipeline_event(detail_type: &str, detail: Value) -> Value {
    let mut base = json!({
        "pipeline": TEST_PIPELINE,
        "execution-id": TEST_EXECUTION_ID,
    });
    if let (Some(base), Value::Object(detail)) = (base.as_object_mut(), detail) {
        base.extend(detail);
    }
    json!({
        "account": "123456789012",
        "detailType": detail_type,
        "region": TEST_REGION,
        "source": "aws.codepipeline",
        "time": "2024-03-09T08:00:00Z",
        "detail": base,
    })
}

/// A stage execution state change.
pub fn stage_event(stage: &str, state: &str) -> Value {
    sns_event(pipeline_event(
        "CodePipeline Stage Execution State Change",
        json!({ "stage": stage, "state": state }),
    ))
}

/// A completed Source action reporting `summary`.
pub fn source_action_event(summary: &str) -> Value {
    sns_event(pipeline_event(
        "CodePipeline Action Execution State Change",
        json!({
            "stage": "Source",
            "action": "Source",
            "state": "SUCCEEDED",
            "execution-result": {
                "external-execution-summary": summary,
                "external-execution-id": "0d2b9c4e7a1f",
            }
        }),
    ))
}

/// A completed Source action that also carries the source action variables.
pub fn source_action_event_with_variables(summary: &str, repo: &str, branch: &str) -> Value {
    let mut event = source_action_event(summary);
    update_message(&mut event, |message| {
        message["additionalAttributes"] = json!({
            "sourceActions": [
                {
                    "sourceActionName": "Source",
                    "sourceActionProvider": "CodeCommit",
                    "sourceActionVariables": {
                        "BranchName": branch,
                        "CommitId": "0d2b9c4e7a1f",
                        "RepositoryName": repo,
                    }
                }
            ]
        });
    });
    event
}

/// A completed Build action reporting the CodeBuild build `build_id`.
pub fn build_action_event(build_id: &str) -> Value {
    sns_event(pipeline_event(
        "CodePipeline Action Execution State Change",
        json!({
            "stage": "Build",
            "action": "Build",
            "state": "SUCCEEDED",
            "execution-result": {
                "external-execution-url": "https://console.aws.amazon.com/codebuild/",
                "external-execution-id": build_id,
            }
        }),
    ))
}

fn update_message<F: FnOnce(&mut Value)>(event: &mut Value, f: F) {
    let raw = event["Records"][0]["Sns"]["Message"]
        .as_str()
        .unwrap_or("{}")
        .to_string();
    let mut message: Value = serde_json::from_str(&raw).unwrap_or(Value::Null);
    f(&mut message);
    event["Records"][0]["Sns"]["Message"] = Value::String(message.to_string());
}

/// Moves an SNS event to another pipeline run.
pub fn for_execution(mut event: Value, pipeline: &str, execution_id: &str) -> Value {
    update_message(&mut event, |message| {
        message["detail"]["pipeline"] = json!(pipeline);
        message["detail"]["execution-id"] = json!(execution_id);
    });
    event
}

/// A configuration that never reaches the network.
pub fn test_config(scope: ParameterScope) -> RelayConfig {
    RelayConfig {
        region:           TEST_REGION.to_string(),
        parameter_prefix: "/discord-notify".to_string(),
        scope,
        webhook:          WebhookConfig {
            url:        "http://127.0.0.1:1/webhook".to_string(),
            username:   "Rhythm Game Map".to_string(),
            avatar_url: "".to_string(),
            content:    "".to_string(),
        },
    }
}

/// A dispatcher that keeps the payloads instead of posting them.
#[derive(Debug, Default)]
pub struct RecordingDispatcher {
    payloads: Mutex<Vec<WebhookPayload>>,
    /// Reject every payload.
    pub fail: bool,
}

impl RecordingDispatcher {
    /// A dispatcher that rejects every payload.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Default::default()
        }
    }

    /// The payloads delivered so far.
    pub fn payloads(&self) -> Vec<WebhookPayload> {
        self.payloads
            .lock()
            .map(|p| p.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl Dispatcher for RecordingDispatcher {
    async fn dispatch(&self, payload: &WebhookPayload) -> Result<()> {
        if self.fail {
            return Err(RelayError::Http("webhook responded 404 Not Found".to_string()));
        }
        self.payloads
            .lock()
            .map_err(|_| RelayError::Internal("payload lock poisoned".to_string()))?
            .push(payload.clone());
        Ok(())
    }
}

/// Build numbers keyed by build id.
#[derive(Debug, Default)]
pub struct FixedBuildInfo {
    numbers: HashMap<String, i64>,
}

impl FixedBuildInfo {
    /// Knows `build_id` as build `number`.
    pub fn with_build(mut self, build_id: &str, number: i64) -> Self {
        self.numbers.insert(build_id.to_string(), number);
        self
    }
}

#[async_trait]
impl BuildInfo for FixedBuildInfo {
    async fn build_number(&self, build_id: &str) -> Result<Option<i64>> {
        Ok(self.numbers.get(build_id).copied())
    }
}

/// A parameter store whose backend is unreachable.
#[derive(Debug, Default)]
pub struct FailingParameterStore {}

#[async_trait]
impl ParameterStore for FailingParameterStore {
    async fn get(&self, _name: &str) -> Result<String> {
        Err(RelayError::AWS("ThrottlingException: Rate exceeded".to_string()))
    }

    async fn put(&self, _name: &str, _value: &str) -> Result<PutAck> {
        Err(RelayError::AWS("ThrottlingException: Rate exceeded".to_string()))
    }
}
