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

#![warn(missing_docs, clippy::needless_borrow)]
// Clippy lints, some should be disabled incrementally
#![allow(clippy::upper_case_acronyms)]

//! Relay is the cloud function that turns CodePipeline lifecycle events into
//! chat webhook notifications.
//!
//! A pipeline run is observed through several independent invocations: the
//! Source and Build actions persist the commit message and build number, and
//! the later stage transitions read them back to render the notification.

pub mod aws;
pub mod builds;
pub mod configs;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod handler;
pub mod message;
pub mod prelude;
pub mod state;
pub mod tests;
