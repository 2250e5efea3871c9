//! Bounded-concurrency scheduler for fetch tasks.
//!
//! The engine submits one task per file descriptor and uses a semaphore as
//! the admission gate: a permit is acquired before a task starts and
//! released when it finishes (RAII), so at most `concurrency` fetches run
//! at any instant regardless of how many files were listed.
//!
//! Per-task failure isolation is the caller's half of the contract: the
//! fetch closure must absorb its own errors (converting them into stats
//! updates) so one failing file never aborts its siblings. Task panics are
//! logged and do not fail the batch.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, instrument, warn};

use crate::api::models::FileSummary;

/// Minimum allowed concurrency value.
const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
const MAX_CONCURRENCY: usize = 100;

/// Error type for scheduler operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// Semaphore-bounded scheduler for concurrent fetch tasks.
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
}

impl DownloadEngine {
    /// Creates a new engine with the specified concurrency limit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-100).
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(concurrency, "creating download engine");

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs `fetch` once per file, at most `concurrency` at a time, and
    /// waits for every task to reach a terminal state before returning.
    ///
    /// Submission order follows `files`; completion order is unspecified.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if the semaphore is closed.
    /// Individual fetch outcomes never surface here; the closure handles
    /// them.
    pub async fn run<F, Fut>(&self, files: Vec<FileSummary>, fetch: F) -> Result<(), EngineError>
    where
        F: Fn(FileSummary) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut handles = Vec::with_capacity(files.len());

        for file in files {
            // Acquire semaphore permit (blocks if at concurrency limit)
            let permit = self
                .semaphore
                .clone()
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let task = fetch(file);
            handles.push(tokio::spawn(async move {
                // Permit is dropped when this block exits (RAII)
                let _permit = permit;
                task.await;
            }));
        }

        debug!(task_count = handles.len(), "waiting for fetch tasks");

        // Wait for all tasks to complete
        for handle in handles {
            // Ignore JoinError - task panics are logged but don't fail the batch
            if let Err(e) = handle.await {
                warn!(error = %e, "fetch task panicked");
            }
        }

        Ok(())
    }
}
