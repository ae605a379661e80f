// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Chain-side types shared by the contract accessors and the workflows.

use alloy::primitives::{Address, Bytes, Log, B256, U256};
use serde::{Deserialize, Serialize};

/// A mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    pub tx_hash: B256,
    /// Block where the transaction was included
    pub block_number: Option<u64>,
    /// Logs emitted by the transaction, in receipt order
    pub logs: Vec<Log>,
}

impl TxOutcome {
    /// `0x`-prefixed lower-case transaction hash.
    pub fn tx_hash_hex(&self) -> String {
        format!("{:#x}", self.tx_hash)
    }
}

/// Rental terms of a protected data. A zero duration means "not rentable".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RentingParams {
    pub price: u64,
    pub duration: u64,
}

/// Subscription terms of a collection. A zero duration means "no subscription offered".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionParams {
    pub price: u64,
    pub duration: u64,
}

/// On-chain state of a protected data inside the sharing contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProtectedDataDetails {
    /// Collection holding the protected data, `None` when not in any collection
    pub collection_id: Option<u64>,
    /// Unix timestamp when the last running rental ends
    pub last_rental_expiration: u64,
    pub in_subscription: bool,
    pub renting: RentingParams,
    pub for_sale: bool,
    pub sale_price: u64,
}

impl ProtectedDataDetails {
    pub fn is_rentable(&self) -> bool {
        self.renting.duration > 0
    }
}

/// On-chain state of a collection inside the sharing contract.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionDetails {
    /// Unix timestamp when the last running subscription ends
    pub last_subscription_expiration: u64,
    pub app_whitelist: Address,
    pub subscription: SubscriptionParams,
}

/// iExec account of a wallet (nRLC).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AccountBalance {
    pub stake: U256,
    pub locked: U256,
}

/// Voucher held by an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherInfo {
    pub address: Address,
    pub voucher_type: u64,
    /// Remaining sponsored nRLC
    pub balance: U256,
    /// Unix timestamp after which the voucher can no longer be used
    pub expiration: u64,
}

impl VoucherInfo {
    pub fn is_active(&self, now: u64) -> bool {
        self.expiration > now
    }
}

/// Status of an iExec task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Unset,
    Active,
    Revealing,
    Completed,
    Failed,
    Timeout,
}

impl TaskStatus {
    /// Map the PoCo `TaskStatusEnum` value.
    pub fn from_chain(raw: u8) -> Self {
        match raw {
            1 => TaskStatus::Active,
            2 => TaskStatus::Revealing,
            3 => TaskStatus::Completed,
            4 => TaskStatus::Failed,
            _ => TaskStatus::Unset,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Timeout
        )
    }
}

/// Subset of the PoCo task record needed to follow its progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskView {
    pub task_id: B256,
    pub deal_id: B256,
    pub status: TaskStatus,
    /// Unix timestamp after which an unfinished task is considered timed out
    pub final_deadline: u64,
    pub results: Bytes,
}

impl TaskView {
    /// Status as seen by a caller at time `now`: an unfinished task past its
    /// final deadline is reported as [`TaskStatus::Timeout`].
    pub fn effective_status(&self, now: u64) -> TaskStatus {
        let unfinished = matches!(
            self.status,
            TaskStatus::Active | TaskStatus::Revealing
        );
        if unfinished && self.final_deadline > 0 && now >= self.final_deadline {
            TaskStatus::Timeout
        } else {
            self.status
        }
    }
}
