// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! `dataprotector` - read-only command line front-end of the SDK.
//!
//! Configuration comes from the environment (`DATAPROTECTOR_ENV` and the
//! per-field overrides); the signing key from `DATAPROTECTOR_PRIVATE_KEY`.
//! Results are printed as JSON on stdout, logs go to stderr.

use std::env;
use std::process::ExitCode;

use dataprotector::config::PRIVATE_KEY_ENV;
use dataprotector::protector::{GetGrantedAccessParams, GetProtectedDataParams};
use dataprotector::sharing::GetProtectedDataRentalsParams;
use dataprotector::telemetry::init_tracing;
use dataprotector::{get_multiaddr_as_string, DataProtectorConfig, IExecDataProtector};
use serde::Serialize;
use tracing::{error, info};

const USAGE: &str = "usage: dataprotector <command> <argument>

commands:
  protected-data <owner>           protected data owned by an address or ENS name
  collections <owner>              collections of an address or ENS name
  rentals <protectedData>          running rentals of a protected data
  granted-access <protectedData>   open accesses granted on a protected data
  voucher <owner>                  voucher held by an address or ENS name
  multiaddr <hex>                  decode a binary multiaddr";

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let args: Vec<String> = env::args().skip(1).collect();
    let (Some(command), Some(argument)) = (args.first(), args.get(1)) else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match run(command, argument).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            error!(%command, error = %message, "Command failed");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: &str, argument: &str) -> Result<(), String> {
    if command == "multiaddr" {
        return print(&get_multiaddr_as_string(Some(argument)));
    }

    let config = DataProtectorConfig::from_env().map_err(|e| e.to_string())?;
    let private_key =
        env::var(PRIVATE_KEY_ENV).map_err(|_| format!("{PRIVATE_KEY_ENV} is not set"))?;
    info!(
        environment = %config.environment.as_str(),
        chain_id = config.chain_id,
        "Connecting"
    );
    let sdk = IExecDataProtector::connect(config, &private_key).map_err(|e| e.to_string())?;

    match command {
        "protected-data" => {
            let params = GetProtectedDataParams {
                owner: Some(argument.to_string()),
                ..Default::default()
            };
            print(&sdk.core.get_protected_data(&params).await.map_err(|e| e.to_string())?)
        }
        "collections" => print(
            &sdk.sharing
                .get_collections_by_owner(argument, false)
                .await
                .map_err(|e| e.to_string())?,
        ),
        "rentals" => {
            let params = GetProtectedDataRentalsParams {
                protected_data: Some(argument.to_string()),
                ..Default::default()
            };
            print(
                &sdk.sharing
                    .get_protected_data_rentals(&params)
                    .await
                    .map_err(|e| e.to_string())?,
            )
        }
        "granted-access" => {
            let params = GetGrantedAccessParams {
                protected_data: Some(argument.to_string()),
                ..Default::default()
            };
            print(&sdk.core.get_granted_access(&params).await.map_err(|e| e.to_string())?)
        }
        "voucher" => print(
            &sdk.core
                .get_user_voucher(argument)
                .await
                .map_err(|e| e.to_string())?,
        ),
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print<T: Serialize>(value: &T) -> Result<(), String> {
    let json = serde_json::to_string_pretty(value).map_err(|e| e.to_string())?;
    println!("{json}");
    Ok(())
}
