// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # SDK Errors
//!
//! Every public operation returns [`DataProtectorError`]. Callers branch on
//! [`DataProtectorError::kind`] instead of matching message strings:
//!
//! | Kind | Raised when | Network call made? |
//! |------|-------------|--------------------|
//! | `Validation` | An input fails its schema, or an ENS name does not resolve | No (ENS lookup only) |
//! | `Precondition` | A preflight invariant does not hold | Reads only, never a transaction |
//! | `Remote` | The chain, subgraph or market rejected or failed the call | Yes |
//! | `Config` | The SDK configuration is incomplete or malformed | No |

use crate::blockchain::ChainError;
use crate::config::ConfigError;
use crate::market::MarketError;
use crate::subgraph::SubgraphError;
use crate::workflow::Operation;

/// An input value failed its validation schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field} {message}")]
pub struct ValidationError {
    /// Name of the offending parameter, as it appears in the API.
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// A named preflight invariant was violated. Nothing was submitted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {}", .operation.failure_message(), .message)]
pub struct PreconditionError {
    pub operation: Operation,
    /// Name of the violated invariant (e.g. `collection is empty`).
    pub check: &'static str,
    pub message: String,
}

/// Failure of one of the remote services the SDK talks to.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    #[error(transparent)]
    Chain(#[from] ChainError),

    #[error(transparent)]
    Subgraph(#[from] SubgraphError),

    #[error(transparent)]
    Market(#[from] MarketError),
}

impl RemoteError {
    /// `true` when the remote service itself was unreachable, as opposed to
    /// the call being semantically rejected.
    pub fn is_protocol_error(&self) -> bool {
        match self {
            RemoteError::Chain(e) => e.is_protocol_error(),
            RemoteError::Subgraph(e) => e.is_protocol_error(),
            RemoteError::Market(e) => e.is_protocol_error(),
        }
    }
}

/// A remote interaction failed while running an operation.
#[derive(Debug, thiserror::Error)]
#[error("{}: {}", .operation.failure_message(), .source)]
pub struct WorkflowError {
    pub operation: Operation,
    #[source]
    pub source: RemoteError,
}

impl WorkflowError {
    pub fn new(operation: Operation, source: impl Into<RemoteError>) -> Self {
        Self {
            operation,
            source: source.into(),
        }
    }

    pub fn is_protocol_error(&self) -> bool {
        self.source.is_protocol_error()
    }
}

/// Coarse classification of a [`DataProtectorError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Precondition,
    Remote,
    Config,
}

/// Top-level SDK error.
#[derive(Debug, thiserror::Error)]
pub enum DataProtectorError {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl DataProtectorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DataProtectorError::Validation(_) => ErrorKind::Validation,
            DataProtectorError::Precondition(_) => ErrorKind::Precondition,
            DataProtectorError::Workflow(_) => ErrorKind::Remote,
            DataProtectorError::Config(_) => ErrorKind::Config,
        }
    }

    /// See [`RemoteError::is_protocol_error`]. Always `false` for local errors.
    pub fn is_protocol_error(&self) -> bool {
        match self {
            DataProtectorError::Workflow(e) => e.is_protocol_error(),
            _ => false,
        }
    }

    /// The operation that failed, when the failure happened inside one.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            DataProtectorError::Precondition(e) => Some(e.operation),
            DataProtectorError::Workflow(e) => Some(e.operation),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use super::*;

    #[test]
    fn validation_error_names_field() {
        let err: DataProtectorError =
            ValidationError::new("protectedData", "should be an ethereum address or a ENS name")
                .into();
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(
            err.to_string(),
            "Validation error: protectedData should be an ethereum address or a ENS name"
        );
        assert!(!err.is_protocol_error());
        assert!(err.operation().is_none());
    }

    #[test]
    fn precondition_error_mentions_operation() {
        let err: DataProtectorError = PreconditionError {
            operation: Operation::RemoveCollection,
            check: "collection is empty",
            message: "Collection is not empty".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert_eq!(
            err.to_string(),
            "Failed to remove collection: Collection is not empty"
        );
        assert_eq!(err.operation(), Some(Operation::RemoveCollection));
    }

    #[test]
    fn workflow_error_keeps_cause_and_protocol_flag() {
        let unavailable = WorkflowError::new(
            Operation::TransferOwnership,
            ChainError::Rpc("connection refused".to_string()),
        );
        assert!(unavailable.is_protocol_error());
        assert!(unavailable.source().is_some());

        let rejected = WorkflowError::new(
            Operation::TransferOwnership,
            ChainError::Reverted("ERC721: caller is not token owner".to_string()),
        );
        assert!(!rejected.is_protocol_error());
        assert!(rejected
            .to_string()
            .starts_with("Failed to transfer protectedData ownership:"));
    }
}
