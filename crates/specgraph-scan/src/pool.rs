//! # Extraction Worker Pool
//!
//! A fixed number of scoped threads pull document paths from a bounded job
//! channel, load and extract each one, and send the result back over a
//! second channel. Workers share no mutable state; the only cross-thread
//! signal is the cancellation flag, checked before every job.
//!
//! The enumerating thread feeds jobs while workers run, so large trees never
//! hold every path in memory at once. Results arrive in completion order and
//! are sorted by path before they are returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;

use crossbeam_channel::{bounded, unbounded};

use specgraph_core::{DocPath, LoadError};

use crate::error::ScanError;
use crate::extract::{extract_document, FileExtraction};
use crate::loader::DocumentLoader;

/// Upper bound on the default worker count.
pub const MAX_DEFAULT_WORKERS: usize = 8;

/// Jobs buffered per worker before the enumerator blocks.
const QUEUE_DEPTH_PER_WORKER: usize = 4;

/// Everything the pool produced for one run.
#[derive(Debug, Default)]
pub struct PoolOutput {
    /// One entry per successfully loaded document, sorted by path.
    pub extractions: Vec<FileExtraction>,
    /// Non-fatal per-file or per-directory failures, sorted by path.
    pub failures: Vec<LoadError>,
}

/// Fixed-size pool running [`extract_document`] over a repository.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionPool {
    workers: usize,
}

impl Default for ExtractionPool {
    fn default() -> Self {
        Self::new(default_workers())
    }
}

/// Available parallelism, capped at [`MAX_DEFAULT_WORKERS`].
pub fn default_workers() -> usize {
    thread::available_parallelism()
        .map_or(1, |n| n.get())
        .min(MAX_DEFAULT_WORKERS)
}

impl ExtractionPool {
    /// A pool of `workers` threads (at least one).
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Number of worker threads.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Load and extract every document `loader` enumerates.
    ///
    /// # Errors
    ///
    /// - [`ScanError::Load`] if the root is missing or unreadable, or no
    ///   document could be read.
    /// - [`ScanError::Interrupted`] if `cancel` was raised during the run.
    pub fn run(&self, loader: &DocumentLoader, cancel: &AtomicBool) -> Result<PoolOutput, ScanError> {
        loader.check_root()?;

        let (job_tx, job_rx) = bounded::<DocPath>(self.workers * QUEUE_DEPTH_PER_WORKER);
        let (result_tx, result_rx) = unbounded::<Result<FileExtraction, LoadError>>();
        let mut output = PoolOutput::default();

        tracing::debug!(workers = self.workers, root = %loader.root().display(), "starting extraction pool");

        thread::scope(|scope| {
            for _ in 0..self.workers {
                let jobs = job_rx.clone();
                let results = result_tx.clone();
                scope.spawn(move || {
                    for path in jobs.iter() {
                        if cancel.load(Ordering::Relaxed) {
                            break;
                        }
                        let result = loader.load(&path).map(|doc| extract_document(&doc));
                        if results.send(result).is_err() {
                            break;
                        }
                    }
                });
            }
            // Workers hold the only receivers, so sends fail once they all stop.
            drop(job_rx);
            drop(result_tx);

            for entry in loader.paths() {
                if cancel.load(Ordering::Relaxed) {
                    break;
                }
                match entry {
                    Ok(path) => {
                        if job_tx.send(path).is_err() {
                            break;
                        }
                    }
                    Err(failure) => output.failures.push(failure),
                }
            }
            drop(job_tx);
        });

        if cancel.load(Ordering::Relaxed) {
            tracing::debug!("extraction cancelled");
            return Err(ScanError::Interrupted);
        }

        for result in result_rx.iter() {
            match result {
                Ok(extraction) => output.extractions.push(extraction),
                Err(failure) => {
                    tracing::debug!(path = %failure.path().display(), error = %failure, "skipping document");
                    output.failures.push(failure);
                }
            }
        }

        output
            .extractions
            .sort_by(|a, b| a.doc_path.cmp(&b.doc_path));
        output
            .failures
            .sort_by(|a, b| a.path().cmp(b.path()));

        if output.extractions.is_empty() {
            return Err(LoadError::NoDocuments {
                path: loader.root().to_path_buf(),
            }
            .into());
        }

        tracing::info!(
            documents = output.extractions.len(),
            failures = output.failures.len(),
            workers = self.workers,
            "extraction complete"
        );
        Ok(output)
    }
}
