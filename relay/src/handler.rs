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

//! The notification handler.
//!
//! One invocation handles one pipeline event:
//!
//! | event                      | effect                                       |
//! |----------------------------|----------------------------------------------|
//! | Source action              | persist commit message (+ repo and branch)   |
//! | Build action               | persist build number, post an empty embed    |
//! | Build / Deploy stage       | load the run state, post the notification    |
//! | Source stage, anything else| post an empty embed                          |
//!
//! Every failure is caught here and reported as a 500 response; nothing is
//! posted after a failure.

use crate::builds::{persisted_build_number, BuildInfo, CodeBuildInfo};
use crate::configs::{RelayConfig, RELAY_ERROR_BODY, RELAY_OK_BODY};
use crate::dispatch::{Dispatcher, WebhookDispatcher, WebhookPayload};
use crate::error::{RelayError, Result};
use crate::event::{parse_sns, PipelineEvent, Route};
use crate::message::{self, NotificationMessage, RunSummary};
use crate::state::{
    ParameterStore, PutAck, RunState, ScopedStore, SsmParameterStore, BRANCH_NAME_PARAM,
    BUILD_NUMBER_PARAM, COMMIT_MESSAGE_PARAM, REPO_NAME_PARAM,
};
use chrono::{NaiveDate, Utc};
use log::{debug, error, info};
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// The invocation result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Response {
    /// `{ statusCode, body, message? }`
    Status {
        /// 200 or 500.
        #[serde(rename = "statusCode")]
        status_code: u16,
        /// Human readable outcome.
        body:        String,
        /// Diagnostic detail of a failure.
        #[serde(skip_serializing_if = "Option::is_none")]
        message:     Option<String>,
    },
    /// The raw write acknowledgements of the Source action branch.
    Acknowledgements(Vec<PutAck>),
}

impl Response {
    /// The success response.
    pub fn ok() -> Self {
        Response::Status {
            status_code: 200,
            body:        RELAY_OK_BODY.to_string(),
            message:     None,
        }
    }

    /// The failure response carrying the error as diagnostic.
    pub fn error(e: &RelayError) -> Self {
        Response::Status {
            status_code: 500,
            body:        RELAY_ERROR_BODY.to_string(),
            message:     Some(e.to_string()),
        }
    }

    /// The status code, if the response has one.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Response::Status { status_code, .. } => Some(*status_code),
            Response::Acknowledgements(_) => None,
        }
    }
}

fn utc_today() -> NaiveDate {
    Utc::now().naive_utc().date()
}

/// Handles pipeline events against a parameter store, a build-info source and
/// a webhook.
#[derive(Debug)]
pub struct Notifier {
    config:     RelayConfig,
    store:      Arc<dyn ParameterStore>,
    builds:     Arc<dyn BuildInfo>,
    dispatcher: Arc<dyn Dispatcher>,
    today:      fn() -> NaiveDate,
}

impl Notifier {
    /// Creates a notifier from its collaborators.
    pub fn new(
        config: RelayConfig,
        store: Arc<dyn ParameterStore>,
        builds: Arc<dyn BuildInfo>,
        dispatcher: Arc<dyn Dispatcher>,
    ) -> Self {
        Self {
            config,
            store,
            builds,
            dispatcher,
            today: utc_today,
        }
    }

    /// Creates a notifier talking to SSM, CodeBuild and the configured
    /// webhook.
    pub fn from_config(config: RelayConfig) -> Result<Self> {
        let region = config.aws_region()?;
        let dispatcher = Arc::new(WebhookDispatcher::new(&config.webhook.url));
        Ok(Self::new(
            config,
            Arc::new(SsmParameterStore::new(region.clone())),
            Arc::new(CodeBuildInfo::new(region)),
            dispatcher,
        ))
    }

    /// Replaces the clock that dates the version string.
    pub fn with_today(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// The configuration in use.
    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Handles one SNS batch.
    pub async fn handle(&self, event: Value) -> Response {
        match self.try_handle(event).await {
            Ok(response) => response,
            Err(e) => {
                error!("Failed to relay the pipeline event: {}", e);
                Response::error(&e)
            }
        }
    }

    async fn try_handle(&self, event: Value) -> Result<Response> {
        debug!("Received: {}", event);
        let event = parse_sns(event)?;
        let route = event.route();
        info!(
            "{:?} of {} ({:?}, {:?}) in {}",
            route, event.detail.pipeline, event.detail.stage, event.detail.state, event.region
        );

        let store = ScopedStore::new(
            self.store.as_ref(),
            &self.config.parameter_prefix,
            self.config.scope,
            &event,
        );

        let message = match route {
            Route::SourceAction => {
                let acks = self.record_source(&event, &store).await?;
                return Ok(Response::Acknowledgements(acks));
            }
            Route::BuildAction => {
                self.record_build(&event, &store).await?;
                None
            }
            Route::BuildStage | Route::DeployStage => self.render(&event, &store).await?,
            Route::SourceStage | Route::Unhandled => None,
        };

        let payload = WebhookPayload::new(&self.config.webhook, message);
        self.dispatcher.dispatch(&payload).await?;
        Ok(Response::ok())
    }

    async fn record_source(
        &self,
        event: &PipelineEvent,
        store: &ScopedStore<'_>,
    ) -> Result<Vec<PutAck>> {
        let mut params = vec![(COMMIT_MESSAGE_PARAM, event.commit_message()?)];
        if let Some(vars) = event.source_variables() {
            if let Some(repo) = &vars.repository_name {
                params.push((REPO_NAME_PARAM, repo.clone()));
            }
            if let Some(branch) = &vars.branch_name {
                params.push((BRANCH_NAME_PARAM, branch.clone()));
            }
        }
        info!(
            "Recording {} source parameter(s) under {}",
            params.len(),
            store.namespace()
        );
        store.put_all(&params).await
    }

    async fn record_build(&self, event: &PipelineEvent, store: &ScopedStore<'_>) -> Result<()> {
        let build_id = event.build_execution_id()?;
        let number = self.builds.build_number(build_id).await?;
        let number = persisted_build_number(number);
        info!("build number: {}", number);
        store.put_all(&[(BUILD_NUMBER_PARAM, number)]).await?;
        Ok(())
    }

    async fn render(
        &self,
        event: &PipelineEvent,
        store: &ScopedStore<'_>,
    ) -> Result<Option<NotificationMessage>> {
        let state = RunState::load(store).await?;
        let commit_message = state.require_commit_message(store)?;
        let build_number =
            state.build_number_for(store, &event.detail.stage, &event.detail.state)?;
        let (repo, branch) = state.repo_and_branch(event);
        let console_url = event.console_url();

        let run = RunSummary {
            repo:           &repo,
            branch:         &branch,
            build_number,
            commit_message,
            console_url:    &console_url,
        };
        Ok(message::format(
            &event.detail.stage,
            &event.detail.state,
            &run,
            (self.today)(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn response_shapes() {
        assert_eq!(
            serde_json::to_value(Response::ok()).unwrap(),
            json!({ "statusCode": 200, "body": "Discord Webhook sent successfully." })
        );

        let error = Response::error(&RelayError::MissingParameter("/n/commitMsg".to_string()));
        assert_eq!(error.status_code(), Some(500));
        assert_eq!(
            serde_json::to_value(error).unwrap(),
            json!({
                "statusCode": 500,
                "body": "Error sending Discord Webhook.",
                "message": "Parameter not found: /n/commitMsg"
            })
        );

        let acks = Response::Acknowledgements(vec![PutAck {
            name:    "/n/commitMsg".to_string(),
            version: 3,
            tier:    "Standard".to_string(),
        }]);
        assert_eq!(acks.status_code(), None);
        assert_eq!(
            serde_json::to_value(acks).unwrap(),
            json!([{ "Name": "/n/commitMsg", "Version": 3, "Tier": "Standard" }])
        );
    }
}
