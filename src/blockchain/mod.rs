// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Blockchain integration for the iExec sidechain.
//!
//! This module provides functionality for:
//! - Reading protected data, collection and task state from the contracts
//! - Signing and broadcasting sharing, registry and hub transactions
//! - Signing dataset orders (EIP-712)
//! - Extracting minted identifiers from receipt logs

pub mod client;
pub mod contracts;
pub mod ens;
pub mod events;
pub mod orders;
pub mod signing;
pub mod types;

pub use client::{AlloyChainClient, ChainClient, ChainError, SharingCall, WhitelistCall};
pub use orders::{SignedDatasetOrder, WorkerpoolOrder};
pub use types::*;
