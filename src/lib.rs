// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! DataProtector - Client SDK for iExec protected data
//!
//! This crate registers, shares and monetizes protected data through the
//! iExec DataProtector contracts. It is a caller of the contracts, the iExec
//! market API and the DataProtector subgraph; it holds no state of its own.
//!
//! ## Modules
//!
//! - `protector` - `core` namespace: protected data, granted access, tasks
//! - `sharing` - `sharing` namespace: collections, rentals, sales, subscriptions
//! - `workflow` - validate / resolve / preflight / submit template
//! - `blockchain` - contract accessors over alloy
//! - `subgraph` - GraphQL read layer
//! - `market` - iExec market API client
//! - `validators` - input schemas
//!
//! ```no_run
//! # async fn run() -> Result<(), dataprotector::DataProtectorError> {
//! use dataprotector::{DataProtectorConfig, Environment, IExecDataProtector};
//!
//! let config = DataProtectorConfig::for_environment(Environment::Prod);
//! let sdk = IExecDataProtector::connect(config, "0x...")?;
//! let collection = sdk.sharing.create_collection().await?;
//! sdk.sharing
//!     .set_subscription_params(collection.collection_id, 10, 86_400)
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod blockchain;
pub mod config;
pub mod context;
pub mod error;
pub mod market;
pub mod multiaddr;
pub mod protector;
pub mod sharing;
pub mod subgraph;
pub mod telemetry;
pub mod validators;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use config::{DataProtectorConfig, Environment};
pub use context::DataProtectorContext;
pub use error::{DataProtectorError, ErrorKind, ValidationError, WorkflowError};
pub use multiaddr::get_multiaddr_as_string;
pub use protector::{DataProtectorCore, GrantedAccess, TaskEvent, TaskWatch};
pub use sharing::DataProtectorSharing;

/// Entry point: both namespaces over one shared context.
#[derive(Clone)]
pub struct IExecDataProtector {
    pub core: DataProtectorCore,
    pub sharing: DataProtectorSharing,
}

impl IExecDataProtector {
    /// Connect to the configured network, signing with `private_key`.
    pub fn connect(
        config: DataProtectorConfig,
        private_key: &str,
    ) -> Result<Self, DataProtectorError> {
        Ok(Self::with_context(DataProtectorContext::connect(
            config,
            private_key,
        )?))
    }

    /// Build the namespaces over an existing context (custom clients, tests).
    pub fn with_context(context: DataProtectorContext) -> Self {
        Self {
            core: DataProtectorCore::new(context.clone()),
            sharing: DataProtectorSharing::new(context),
        }
    }
}
