// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Explicit dependencies of every operation.
//!
//! The configuration and the three remote seams are threaded through the
//! namespaces instead of living in process-wide state, so several SDK
//! instances (different accounts or networks) can coexist.

use std::sync::Arc;

use crate::blockchain::{signing::signer_from_hex, AlloyChainClient, ChainClient};
use crate::config::{
    ConfigError, DataProtectorConfig, MARKET_URL_ENV, PRIVATE_KEY_ENV, RPC_URL_ENV,
    SUBGRAPH_URL_ENV,
};
use crate::error::DataProtectorError;
use crate::market::{MarketApiClient, Marketplace};
use crate::subgraph::{GraphQlTransport, HttpSubgraphClient};

#[derive(Clone)]
pub struct DataProtectorContext {
    pub config: DataProtectorConfig,
    pub chain: Arc<dyn ChainClient>,
    pub subgraph: Arc<dyn GraphQlTransport>,
    pub market: Arc<dyn Marketplace>,
}

impl DataProtectorContext {
    /// Build the production clients for `config`, signing with `private_key`.
    pub fn connect(
        config: DataProtectorConfig,
        private_key: &str,
    ) -> Result<Self, DataProtectorError> {
        let signer = signer_from_hex(private_key).map_err(invalid(PRIVATE_KEY_ENV))?;

        let chain = AlloyChainClient::new(&config, signer.clone()).map_err(invalid(RPC_URL_ENV))?;
        let subgraph = HttpSubgraphClient::new(config.subgraph_url.clone())
            .map_err(invalid(SUBGRAPH_URL_ENV))?;
        let market = MarketApiClient::new(config.market_url.clone(), config.chain_id, signer)
            .map_err(invalid(MARKET_URL_ENV))?;

        Ok(Self {
            config,
            chain: Arc::new(chain),
            subgraph: Arc::new(subgraph),
            market: Arc::new(market),
        })
    }

    /// Current unix time in seconds.
    pub fn now(&self) -> u64 {
        unix_now()
    }
}

pub fn unix_now() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

fn invalid<E: std::fmt::Display>(key: &'static str) -> impl FnOnce(E) -> DataProtectorError {
    move |e| {
        ConfigError::InvalidValue {
            key,
            message: e.to_string(),
        }
        .into()
    }
}
