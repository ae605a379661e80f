// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Workflow Template
//!
//! Every mutating operation runs the same sequence:
//!
//! 1. **Validate** inputs (done by the caller, see [`crate::validators`])
//! 2. **Resolve** ENS names ([`resolve`])
//! 3. **Load** a snapshot of the on-chain state the operation depends on.
//!    Independent reads are fanned out concurrently.
//! 4. **Check** the declared invariants over the snapshot, in declaration
//!    order. The first violation aborts with a
//!    [`PreconditionError`](crate::error::PreconditionError) naming the
//!    invariant, before anything is submitted.
//! 5. **Submit** the transaction(s), strictly one after the other, and
//!    shape the result.
//!
//! Remote failures in steps 3 and 5 are wrapped in a
//! [`WorkflowError`](crate::error::WorkflowError) naming the operation.
//!
//! ```ignore
//! Workflow::new(Operation::RemoveCollection)
//!     .require("collection exists", |s: &Snapshot| preflight::collection_exists(&s.collection))
//!     .require("collection is empty", |s: &Snapshot| preflight::collection_empty(s.size))
//!     .run(load(..), |_| async { chain.send_sharing(call).await.map_err(Into::into) })
//!     .await
//! ```

pub mod operation;
pub mod preflight;
pub mod resolve;

use std::future::Future;

use tracing::{debug, info, warn};

use crate::error::{DataProtectorError, PreconditionError, RemoteError, WorkflowError};
pub use operation::Operation;

type Predicate<'a, S> = Box<dyn Fn(&S) -> Result<(), String> + Send + Sync + 'a>;

struct Invariant<'a, S> {
    name: &'static str,
    predicate: Predicate<'a, S>,
}

/// Declarative preflight checks and submission for one operation.
pub struct Workflow<'a, S> {
    operation: Operation,
    invariants: Vec<Invariant<'a, S>>,
}

impl<'a, S> Workflow<'a, S> {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            invariants: Vec::new(),
        }
    }

    /// Declare a named invariant. `predicate` returns the user-facing
    /// message when the invariant does not hold.
    pub fn require<F>(mut self, name: &'static str, predicate: F) -> Self
    where
        F: Fn(&S) -> Result<(), String> + Send + Sync + 'a,
    {
        self.invariants.push(Invariant {
            name,
            predicate: Box::new(predicate),
        });
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Names of the declared invariants, in evaluation order.
    pub fn invariant_names(&self) -> Vec<&'static str> {
        self.invariants.iter().map(|i| i.name).collect()
    }

    /// Evaluate the invariants over `snapshot`; the first violation wins.
    pub fn check(&self, snapshot: &S) -> Result<(), PreconditionError> {
        for invariant in &self.invariants {
            if let Err(message) = (invariant.predicate)(snapshot) {
                warn!(
                    operation = %self.operation,
                    check = invariant.name,
                    %message,
                    "Preflight check failed"
                );
                return Err(PreconditionError {
                    operation: self.operation,
                    check: invariant.name,
                    message,
                });
            }
            debug!(operation = %self.operation, check = invariant.name, "Preflight check passed");
        }
        Ok(())
    }

    /// Load the snapshot, check every invariant, then submit.
    pub async fn run<T, L, F, Fut>(self, load: L, submit: F) -> Result<T, DataProtectorError>
    where
        L: Future<Output = Result<S, RemoteError>>,
        F: FnOnce(S) -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
    {
        let operation = self.operation;
        let snapshot = load.await.map_err(failed(operation))?;

        self.check(&snapshot)?;

        info!(operation = %operation, "Submitting transaction");
        submit(snapshot).await.map_err(failed(operation))
    }
}

/// Wrap a remote failure of `operation` into a [`DataProtectorError`].
pub fn failed<E: Into<RemoteError>>(operation: Operation) -> impl FnOnce(E) -> DataProtectorError {
    move |e| {
        let source = e.into();
        warn!(operation = %operation, error = %source, "Remote call failed");
        WorkflowError::new(operation, source).into()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::blockchain::ChainError;
    use crate::error::ErrorKind;

    struct Snapshot {
        exists: bool,
        size: usize,
    }

    fn workflow<'a>() -> Workflow<'a, Snapshot> {
        Workflow::new(Operation::RemoveCollection)
            .require("collection exists", |s: &Snapshot| {
                s.exists
                    .then_some(())
                    .ok_or_else(|| "Collection does not exist".to_string())
            })
            .require("collection is empty", |s: &Snapshot| {
                (s.size == 0)
                    .then_some(())
                    .ok_or_else(|| "Collection is not empty".to_string())
            })
    }

    #[test]
    fn invariants_keep_declaration_order() {
        assert_eq!(
            workflow().invariant_names(),
            vec!["collection exists", "collection is empty"]
        );
    }

    #[test]
    fn first_violation_is_reported() {
        let err = workflow()
            .check(&Snapshot {
                exists: false,
                size: 3,
            })
            .unwrap_err();
        assert_eq!(err.check, "collection exists");
        assert_eq!(err.message, "Collection does not exist");
    }

    #[tokio::test]
    async fn violation_prevents_submission() {
        let submitted = AtomicUsize::new(0);
        let err = workflow()
            .run(
                async {
                    Ok(Snapshot {
                        exists: true,
                        size: 1,
                    })
                },
                |_| async {
                    submitted.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                },
            )
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Precondition);
        assert!(err.to_string().contains("not empty"));
        assert_eq!(submitted.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn remote_failures_are_wrapped() {
        let err = workflow()
            .run(
                async { Err::<Snapshot, _>(ChainError::Rpc("down".to_string()).into()) },
                |_| async { Ok(()) },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert!(err.is_protocol_error());
        assert_eq!(err.operation(), Some(Operation::RemoveCollection));

        let err = workflow()
            .run(
                async {
                    Ok(Snapshot {
                        exists: true,
                        size: 0,
                    })
                },
                |_| async { Err::<(), _>(ChainError::Reverted("burn".to_string()).into()) },
            )
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Remote);
        assert!(!err.is_protocol_error());
    }

    #[tokio::test]
    async fn passing_checks_submit_once() {
        let submitted = AtomicUsize::new(0);
        let value = workflow()
            .run(
                async {
                    Ok(Snapshot {
                        exists: true,
                        size: 0,
                    })
                },
                |_| async {
                    submitted.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                },
            )
            .await
            .unwrap();
        assert_eq!(value, 42);
        assert_eq!(submitted.load(Ordering::SeqCst), 1);
    }
}
