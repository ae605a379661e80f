// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Task Watcher
//!
//! Follows an iExec task until it reaches a terminal status.
//!
//! A background poller reads the task record every `task_poll_interval`
//! and pushes a [`TaskEvent`] on a channel each time the status changes.
//! The stream ends after the terminal event, after the first remote error,
//! or when the [`CancellationToken`] is triggered. Cancelling only stops
//! the watcher; the task itself keeps running on the protocol.

use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Bytes, B256};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::blockchain::{ChainClient, TaskStatus};
use crate::error::DataProtectorError;
use crate::workflow::{failed, Operation};

const EVENT_BUFFER: usize = 16;

/// Coarse task progress events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "message", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskEvent {
    /// Status changed but the task is still running
    TaskUpdated { task_id: B256, status: TaskStatus },
    TaskCompleted {
        task_id: B256,
        deal_id: B256,
        results: Bytes,
    },
    TaskFailed { task_id: B256 },
    TaskTimedout { task_id: B256 },
}

impl TaskEvent {
    pub fn status(&self) -> TaskStatus {
        match self {
            TaskEvent::TaskUpdated { status, .. } => *status,
            TaskEvent::TaskCompleted { .. } => TaskStatus::Completed,
            TaskEvent::TaskFailed { .. } => TaskStatus::Failed,
            TaskEvent::TaskTimedout { .. } => TaskStatus::Timeout,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskEvent::TaskUpdated { .. })
    }
}

/// Handle on a running watcher.
pub struct TaskWatch {
    pub task_id: B256,
    events: mpsc::Receiver<Result<TaskEvent, DataProtectorError>>,
    cancel: CancellationToken,
}

impl TaskWatch {
    /// Next event, `None` once the stream has ended.
    pub async fn next(&mut self) -> Option<Result<TaskEvent, DataProtectorError>> {
        self.events.recv().await
    }

    /// Stop watching. Already queued events can still be read.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

impl Drop for TaskWatch {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// Spawn a watcher for `task_id`.
pub fn spawn(
    chain: Arc<dyn ChainClient>,
    task_id: B256,
    poll_interval: Duration,
    now: fn() -> u64,
) -> TaskWatch {
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let cancel = CancellationToken::new();

    let poller = TaskPoller {
        chain,
        task_id,
        poll_interval,
        now,
        events: tx,
    };
    tokio::spawn(poller.run(cancel.clone()));

    TaskWatch {
        task_id,
        events: rx,
        cancel,
    }
}

struct TaskPoller {
    chain: Arc<dyn ChainClient>,
    task_id: B256,
    poll_interval: Duration,
    now: fn() -> u64,
    events: mpsc::Sender<Result<TaskEvent, DataProtectorError>>,
}

impl TaskPoller {
    async fn run(self, shutdown: CancellationToken) {
        info!(task_id = %self.task_id, "Task watcher starting");
        let mut last_status = None;

        loop {
            if shutdown.is_cancelled() {
                info!(task_id = %self.task_id, "Task watcher cancelled");
                return;
            }

            match self.poll_step(&mut last_status).await {
                Ok(Some(event)) => {
                    let terminal = event.is_terminal();
                    if self.events.send(Ok(event)).await.is_err() {
                        debug!(task_id = %self.task_id, "Task watcher receiver dropped");
                        return;
                    }
                    if terminal {
                        info!(task_id = %self.task_id, "Task reached a terminal status");
                        return;
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!(task_id = %self.task_id, error = %e, "Task watcher failed");
                    let _ = self.events.send(Err(e)).await;
                    return;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {},
                _ = shutdown.cancelled() => {
                    info!(task_id = %self.task_id, "Task watcher cancelled");
                    return;
                }
            }
        }
    }

    /// Read the task once; emit an event when the status changed.
    async fn poll_step(
        &self,
        last_status: &mut Option<TaskStatus>,
    ) -> Result<Option<TaskEvent>, DataProtectorError> {
        let view = self
            .chain
            .view_task(self.task_id)
            .await
            .map_err(failed(Operation::WaitForTaskCompletion))?;
        let status = view.effective_status((self.now)());

        if *last_status == Some(status) {
            return Ok(None);
        }
        *last_status = Some(status);
        debug!(task_id = %self.task_id, ?status, "Task status changed");

        let task_id = self.task_id;
        Ok(Some(match status {
            TaskStatus::Completed => TaskEvent::TaskCompleted {
                task_id,
                deal_id: view.deal_id,
                results: view.results,
            },
            TaskStatus::Failed => TaskEvent::TaskFailed { task_id },
            TaskStatus::Timeout => TaskEvent::TaskTimedout { task_id },
            status => TaskEvent::TaskUpdated { task_id, status },
        }))
    }
}
