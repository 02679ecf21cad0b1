//! Pending-action queue shared between producers and the consumer task
//!
//! All structural edits happen under one lock, held only for the edit itself,
//! never across a gateway call or a sleep. Removal by id preserves the
//! relative order of the remaining entries.

use crate::catalog::ActionCatalog;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, Notify};
use tracing::debug;
use uuid::Uuid;

/// Rejection at submission time
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("unknown action '{0}'")]
    UnknownAction(String),
}

/// One queued request, created at enqueue time
#[derive(Debug, Clone, Serialize)]
pub struct ActionRequest {
    pub id: Uuid,
    pub name: String,
}

/// FIFO of pending requests with catalog-validated admission
pub struct ActionQueue {
    catalog: Arc<ActionCatalog>,
    entries: Mutex<VecDeque<ActionRequest>>,
    /// Wakes the consumer's bounded wait when an entry is appended
    notify: Notify,
}

impl ActionQueue {
    pub fn new(catalog: Arc<ActionCatalog>) -> Self {
        Self {
            catalog,
            entries: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Validate the name against the catalog and append a new request.
    ///
    /// Unknown names are rejected here so the queue never holds an entry
    /// without a matching definition.
    pub async fn enqueue(&self, name: &str) -> Result<Uuid, SubmitError> {
        if !self.catalog.contains(name) {
            return Err(SubmitError::UnknownAction(name.to_string()));
        }

        let request = ActionRequest {
            id: Uuid::new_v4(),
            name: name.to_string(),
        };
        let id = request.id;

        self.entries.lock().await.push_back(request);
        self.notify.notify_one();
        debug!("Enqueued action '{}' as {}", name, id);
        Ok(id)
    }

    /// Remove a pending request by id; no-op when absent.
    pub async fn remove_by_id(&self, id: Uuid) -> bool {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|r| r.id != id);
        before != entries.len()
    }

    /// Drop all pending requests, returning how many were discarded.
    pub async fn clear(&self) -> usize {
        let mut entries = self.entries.lock().await;
        let cleared = entries.len();
        entries.clear();
        cleared
    }

    /// Pop the head entry, waiting up to `wait` for one to arrive.
    pub async fn pop_next(&self, wait: Duration) -> Option<ActionRequest> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            // Arm the wakeup before checking, so an enqueue between the check
            // and the wait is not lost.
            let notified = self.notify.notified();

            if let Some(request) = self.entries.lock().await.pop_front() {
                return Some(request);
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return self.entries.lock().await.pop_front();
            }
        }
    }

    /// Point-in-time copy of the pending entries, head first.
    pub async fn snapshot(&self) -> Vec<ActionRequest> {
        self.entries.lock().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }
}
