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

//! The main entry point of the notification function.

use lambda_runtime::{service_fn, LambdaEvent};
use lazy_static::lazy_static;
use log::info;
use relay::prelude::*;
use serde_json::Value;

lazy_static! {
    static ref NOTIFIER: Result<Notifier> = RelayConfig::from_env().and_then(Notifier::from_config);
}

async fn handler(event: LambdaEvent<Value>) -> Result<Value> {
    let (event, context) = event.into_parts();
    info!("Invocation {}", context.request_id);

    let response = match &*NOTIFIER {
        Ok(notifier) => notifier.handle(event).await,
        Err(e) => Response::error(e),
    };
    Ok(serde_json::to_value(response)?)
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    if let Ok(notifier) = &*NOTIFIER {
        let config = notifier.config();
        info!(
            "Relaying to {} with {:?} parameters under {} ({})",
            config.webhook.username, config.scope, config.parameter_prefix, config.region
        );
    }
    lambda_runtime::run(service_fn(handler)).await?;
    Ok(())
}
