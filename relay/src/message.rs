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

//! Rendering of the chat embed.

use crate::event::{Stage, State};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Embed color of a successful stage (green).
pub const SUCCESS_COLOR: u32 = 65280;
/// Embed color of any other stage state (red).
pub const FAILURE_COLOR: u32 = 16711680;

/// The footer of an embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footer {
    /// Footer text.
    pub text: String,
}

/// One chat embed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// e.g. `組建成功 ✅ myrepo`
    pub title:       String,
    /// e.g. `20240309.17 Fix the scoring bug`
    pub description: String,
    /// [`SUCCESS_COLOR`] or [`FAILURE_COLOR`].
    pub color:       u32,
    /// The branch.
    pub footer:      Footer,
    /// Link to the pipeline console, failures only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub url:         Option<String>,
}

/// Everything the message needs to know about the run.
#[derive(Debug, Clone)]
pub struct RunSummary<'a> {
    /// Repository name.
    pub repo:           &'a str,
    /// Branch name.
    pub branch:         &'a str,
    /// Build number as persisted by the Build action.
    pub build_number:   &'a str,
    /// Commit message as persisted by the Source action.
    pub commit_message: &'a str,
    /// Pipeline console link.
    pub console_url:    &'a str,
}

/// The verb of a reportable stage.
pub fn stage_verb(stage: &Stage) -> Option<&'static str> {
    match stage {
        Stage::Build => Some("組建"),
        Stage::Deploy => Some("部署"),
        _ => None,
    }
}

/// The state word; everything but STARTED and SUCCEEDED reads as a failure.
pub fn state_word(state: &State) -> &'static str {
    match state {
        State::Started => "開始",
        State::Succeeded => "成功",
        _ => "失敗",
    }
}

/// The state emoji.
pub fn state_emoji(state: &State) -> &'static str {
    match state {
        State::Started => "⚪️",
        State::Succeeded => "✅",
        _ => "❌",
    }
}

/// The version string `{YYYYMMDD}.{build} {commit}`.
pub fn version(date: NaiveDate, build_number: &str, commit_message: &str) -> String {
    format!("{}.{} {}", date.format("%Y%m%d"), build_number, commit_message)
}

/// Formats the embed of a Build or Deploy stage transition. Other stages
/// produce no message.
pub fn format(
    stage: &Stage,
    state: &State,
    run: &RunSummary<'_>,
    date: NaiveDate,
) -> Option<NotificationMessage> {
    let verb = stage_verb(stage)?;
    Some(NotificationMessage {
        title:       format!(
            "{}{} {} {}",
            verb,
            state_word(state),
            state_emoji(state),
            run.repo
        ),
        description: version(date, run.build_number, run.commit_message),
        color:       match state {
            State::Succeeded => SUCCESS_COLOR,
            _ => FAILURE_COLOR,
        },
        footer:      Footer {
            text: run.branch.to_string(),
        },
        url:         match state {
            State::Failed => Some(run.console_url.to_string()),
            _ => None,
        },
    })
}
