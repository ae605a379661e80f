// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! Per-network contract addresses and service endpoints, resolved from a named
//! environment at construction time and threaded explicitly through every
//! operation (there is no global "current contract" state).
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `DATAPROTECTOR_ENV` | Named environment (`prod` or `staging`) | `prod` |
//! | `DATAPROTECTOR_RPC_URL` | Chain JSON-RPC endpoint | environment default |
//! | `DATAPROTECTOR_SUBGRAPH_URL` | DataProtector subgraph endpoint | environment default |
//! | `DATAPROTECTOR_MARKET_URL` | iExec market API endpoint | environment default |
//! | `DATAPROTECTOR_SHARING_ADDRESS` | DataProtector sharing contract | environment default |
//! | `DATAPROTECTOR_VOUCHER_HUB_ADDRESS` | Voucher hub contract, empty to disable | environment default |
//! | `DATAPROTECTOR_WORKERPOOL` | Default workerpool (address or ENS) | environment default |
//! | `DATAPROTECTOR_TASK_POLL_SECS` | Task status poll interval | `5` |
//! | `DATAPROTECTOR_PRIVATE_KEY` | Hex private key of the signer (CLI only) | Required for writes |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info` |

use std::{env, fmt, str::FromStr, time::Duration};

use alloy::primitives::{address, Address};

pub const ENVIRONMENT_ENV: &str = "DATAPROTECTOR_ENV";
pub const RPC_URL_ENV: &str = "DATAPROTECTOR_RPC_URL";
pub const SUBGRAPH_URL_ENV: &str = "DATAPROTECTOR_SUBGRAPH_URL";
pub const MARKET_URL_ENV: &str = "DATAPROTECTOR_MARKET_URL";
pub const SHARING_ADDRESS_ENV: &str = "DATAPROTECTOR_SHARING_ADDRESS";
pub const VOUCHER_HUB_ADDRESS_ENV: &str = "DATAPROTECTOR_VOUCHER_HUB_ADDRESS";
pub const WORKERPOOL_ENV: &str = "DATAPROTECTOR_WORKERPOOL";
pub const TASK_POLL_SECS_ENV: &str = "DATAPROTECTOR_TASK_POLL_SECS";

/// Environment variable holding the signer's private key (used by the CLI).
pub const PRIVATE_KEY_ENV: &str = "DATAPROTECTOR_PRIVATE_KEY";

/// Logging format selector (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

const DEFAULT_TASK_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Named deployment environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Prod,
    Staging,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Staging => "staging",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" | "bellecour" => Ok(Environment::Prod),
            "staging" => Ok(Environment::Staging),
            other => Err(ConfigError::UnknownEnvironment(other.to_string())),
        }
    }
}

/// Deployed contract addresses for one environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractAddresses {
    /// DataProtector sharing (collections, renting, sale, subscriptions).
    pub sharing: Address,
    pub app_whitelist_registry: Address,
    /// iExec dataset registry (ERC-721 of protected data).
    pub dataset_registry: Address,
    /// iExec PoCo hub (accounts, orders, tasks).
    pub hub: Address,
    pub ens_registry: Address,
    /// Voucher hub, `None` on networks without vouchers.
    pub voucher_hub: Option<Address>,
}

/// Complete SDK configuration.
#[derive(Debug, Clone)]
pub struct DataProtectorConfig {
    pub environment: Environment,
    pub chain_id: u64,
    pub rpc_url: String,
    pub subgraph_url: String,
    pub market_url: String,
    pub contracts: ContractAddresses,
    /// Workerpool used by `consume_protected_data` when none is given.
    pub default_workerpool: String,
    pub task_poll_interval: Duration,
}

const BELLECOUR_CONTRACTS: ContractAddresses = ContractAddresses {
    sharing: address!("1390c3c6a545198809f1c7c5dd2a1f6a5f9b5a08"),
    app_whitelist_registry: address!("256bcd881c33bdf9df952f2a0148f27d439f2e64"),
    dataset_registry: address!("799daa22654128d0c64d5b79eac9283008158730"),
    hub: address!("3eca1b216a7df1c7689aeb259ffb83adfb894e7f"),
    ens_registry: address!("5f5b93fca68c9c79318d1f3868a354ee67d8c006"),
    voucher_hub: Some(address!("3137b6df4f36d338b82260edbb2e7bab034afeda")),
};

impl DataProtectorConfig {
    /// Built-in defaults for a named environment.
    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Prod => Self {
                environment,
                chain_id: 134,
                rpc_url: "https://bellecour.iex.ec".to_string(),
                subgraph_url:
                    "https://thegraph.bellecour.iex.ec/subgraphs/name/bellecour/dataprotector-v2"
                        .to_string(),
                market_url: "https://api.market.v8-bellecour.iex.ec".to_string(),
                contracts: BELLECOUR_CONTRACTS,
                default_workerpool: "prod-v8-bellecour.main.pools.iexec.eth".to_string(),
                task_poll_interval: DEFAULT_TASK_POLL_INTERVAL,
            },
            Environment::Staging => Self {
                environment,
                chain_id: 134,
                rpc_url: "https://bellecour.iex.ec".to_string(),
                subgraph_url:
                    "https://thegraph.bellecour.iex.ec/subgraphs/name/bellecour/dataprotector-v2-staging"
                        .to_string(),
                market_url: "https://api-market-staging.iex.ec".to_string(),
                contracts: BELLECOUR_CONTRACTS,
                default_workerpool: "staging-v8-bellecour.main.pools.iexec.eth".to_string(),
                task_poll_interval: DEFAULT_TASK_POLL_INTERVAL,
            },
        }
    }

    /// Load the configuration from `DATAPROTECTOR_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] but reading values through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let environment = match lookup(ENVIRONMENT_ENV) {
            Some(raw) => raw.parse()?,
            None => Environment::default(),
        };
        let mut config = Self::for_environment(environment);

        if let Some(url) = lookup(RPC_URL_ENV) {
            config.rpc_url = parse_url(RPC_URL_ENV, &url)?;
        }
        if let Some(url) = lookup(SUBGRAPH_URL_ENV) {
            config.subgraph_url = parse_url(SUBGRAPH_URL_ENV, &url)?;
        }
        if let Some(url) = lookup(MARKET_URL_ENV) {
            config.market_url = parse_url(MARKET_URL_ENV, &url)?;
        }
        if let Some(raw) = lookup(SHARING_ADDRESS_ENV) {
            config.contracts.sharing = parse_address(SHARING_ADDRESS_ENV, &raw)?;
        }
        if let Some(raw) = lookup(VOUCHER_HUB_ADDRESS_ENV) {
            config.contracts.voucher_hub = match raw.trim() {
                "" => None,
                raw => Some(parse_address(VOUCHER_HUB_ADDRESS_ENV, raw)?),
            };
        }
        if let Some(workerpool) = lookup(WORKERPOOL_ENV) {
            config.default_workerpool = workerpool.trim().to_string();
        }
        if let Some(raw) = lookup(TASK_POLL_SECS_ENV) {
            let secs: u64 = raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: TASK_POLL_SECS_ENV,
                message: format!("`{raw}` is not a number of seconds"),
            })?;
            config.task_poll_interval = Duration::from_secs(secs.max(1));
        }

        Ok(config)
    }
}

fn parse_url(key: &'static str, raw: &str) -> Result<String, ConfigError> {
    let url: url::Url = raw.trim().parse().map_err(|e: url::ParseError| {
        ConfigError::InvalidValue {
            key,
            message: e.to_string(),
        }
    })?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}

fn parse_address(key: &'static str, raw: &str) -> Result<Address, ConfigError> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| ConfigError::InvalidValue {
            key,
            message: e.to_string(),
        })
}

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("Unknown environment `{0}` (expected `prod` or `staging`)")]
    UnknownEnvironment(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
}
