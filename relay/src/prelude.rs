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

//! A "prelude" for users of the relay crate.
//!
//! Like the standard library's prelude, this module simplifies importing of
//! common items. Unlike the standard prelude, the contents of this module must
//! be imported manually:
//!
//! ```
//! use relay::prelude::*;
//! ```

pub use crate::builds::{BuildInfo, CodeBuildInfo};
pub use crate::configs::*;
pub use crate::dispatch::{Dispatcher, WebhookDispatcher, WebhookPayload};
pub use crate::error::{RelayError, Result};
pub use crate::event::{DetailType, PipelineEvent, Route, Stage, State};
pub use crate::handler::{Notifier, Response};
pub use crate::message::NotificationMessage;
pub use crate::state::{
    HashMapParameterStore, ParameterStore, PutAck, RunState, ScopedStore, SsmParameterStore,
};
