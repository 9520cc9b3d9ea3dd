// src/pipeline.rs
//! Concurrent reduction of many sources into one bounded run.
//!
//! One blocking task per source folds that source's batches into a run and
//! pushes it onto a shared queue; a single dedicated merger task repeatedly
//! takes two queued runs, merges them, and pushes the result back, until it
//! has performed exactly `source_count - 1` merges and one run remains.
//! Which runs get paired, and when, is opportunistic: whatever is queued
//! first merges first. Completion is observed through a countdown of
//! `source_count + 1` arrivals (every reducer plus the merger); the caller
//! waits for the full countdown before reporting either the final run or the
//! first recorded failure, so no partial result ever escapes.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::{mpsc, watch, Semaphore};
use tokio::task;
use tracing::debug;

use crate::config::Params;
use crate::csv::BatchReader;
use crate::error::Error;
use crate::merge::{bounded_merge, Run};
use crate::metrics::Metrics;
use crate::record::{parse_batch, Record};

/// Fold one source's batches into a single bounded run.
///
/// Each batch is parsed (malformed rows skipped and counted), sorted into a
/// descending run, and merged into the accumulator, so at most two runs plus
/// the current batch are ever in memory. An empty source yields an empty run.
pub fn reduce_source(path: &Path, params: &Params, metrics: &Metrics) -> Result<Run, Error> {
    let file = File::open(path)
        .map_err(|e| Error::SourceRead { path: path.to_path_buf(), source: e })?;
    let batches = BatchReader::new(BufReader::new(file), params.delimiter, params.result_rows);

    let mut acc: Option<Run> = None;
    for batch in batches {
        let rows = batch.map_err(|e| Error::SourceRead { path: path.to_path_buf(), source: e })?;
        metrics.inc_batch();
        let run = Run::from_unsorted(parse_batch(rows, metrics));
        acc = Some(match acc.take() {
            None => run,
            Some(prev) => {
                metrics.inc_source_merge();
                bounded_merge(prev, run, params.result_rows, params.duplicate_cap)
            }
        });
    }

    let run = acc.unwrap_or_else(Run::empty);
    debug!(?path, occupied = run.occupied(), "source reduced");
    Ok(run)
}

/// Aggregate every source and return the globally cheapest records,
/// ascending by price.
///
/// If any task fails, all remaining tasks still run to completion and the
/// first recorded failure is returned instead of a partial result.
pub async fn cheapest_records(
    files: Vec<PathBuf>,
    params: Params,
    metrics: Arc<Metrics>,
) -> Result<Vec<Record>, Error> {
    if files.is_empty() {
        return Err(Error::Config("at least one source file is required".into()));
    }

    let source_count = files.len();
    let result_rows = params.result_rows;
    let duplicate_cap = params.duplicate_cap;
    let params = Arc::new(params);

    let workers = std::thread::available_parallelism()
        .map(|n| n.get().max(1))
        .unwrap_or(4);
    let permits = Arc::new(Semaphore::new(workers));
    debug!(sources = source_count, workers, "aggregation started");

    let (run_tx, run_rx) = mpsc::unbounded_channel::<Run>();
    let completion = Arc::new(Completion::new(source_count + 1));
    let failure = Arc::new(FirstFailure::default());

    for path in files {
        let permits = permits.clone();
        let params = params.clone();
        let metrics = metrics.clone();
        let run_tx = run_tx.clone();
        let completion = completion.clone();
        let failure = failure.clone();

        tokio::spawn(async move {
            let _permit = permits.acquire_owned().await.expect("worker semaphore closed");
            let outcome =
                task::spawn_blocking(move || reduce_source(&path, &params, &metrics)).await;
            let run = match outcome {
                Ok(Ok(run)) => run,
                Ok(Err(err)) => {
                    failure.record(err);
                    Run::empty()
                }
                Err(join) => {
                    failure.record(Error::Worker(format!("source task died: {join}")));
                    Run::empty()
                }
            };
            // a failed source still contributes a run, keeping the merger's
            // take arithmetic and the countdown exact
            let _ = run_tx.send(run);
            completion.arrive();
        });
    }

    let merger = tokio::spawn({
        let feed = run_tx;
        let metrics = metrics.clone();
        let completion = completion.clone();
        let failure = failure.clone();
        async move {
            let mut queue = run_rx;
            for _ in 0..source_count - 1 {
                let (Some(first), Some(second)) = (queue.recv().await, queue.recv().await)
                else {
                    failure.record(Error::Worker(
                        "run queue closed before the merge schedule finished".into(),
                    ));
                    break;
                };
                let merged = bounded_merge(first, second, result_rows, duplicate_cap);
                metrics.inc_cross_merge();
                let _ = feed.send(merged);
            }
            completion.arrive();
            queue
        }
    });

    completion.wait().await;
    if let Some(err) = failure.take() {
        return Err(err);
    }

    let mut queue = merger
        .await
        .map_err(|e| Error::Worker(format!("merger task died: {e}")))?;
    let final_run = queue
        .recv()
        .await
        .ok_or_else(|| Error::Worker("final run missing from queue".into()))?;
    Ok(final_run.into_ascending())
}

/// Countdown latch: every task calls [`arrive`](Completion::arrive) exactly
/// once; [`wait`](Completion::wait) resolves when the count drains to zero.
struct Completion {
    remaining: AtomicUsize,
    done: watch::Sender<bool>,
}

impl Completion {
    fn new(tasks: usize) -> Self {
        Self {
            remaining: AtomicUsize::new(tasks),
            done: watch::Sender::new(tasks == 0),
        }
    }

    fn arrive(&self) {
        if self.remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
            let _ = self.done.send(true);
        }
    }

    async fn wait(&self) {
        let mut rx = self.done.subscribe();
        // wait_for inspects the current value first, so arrivals that beat
        // the subscription are not missed
        let _ = rx.wait_for(|done| *done).await;
    }
}

/// First recorded failure wins; later ones are dropped.
#[derive(Default)]
struct FirstFailure {
    slot: Mutex<Option<Error>>,
}

impl FirstFailure {
    fn record(&self, err: Error) {
        let mut slot = self.slot.lock().expect("failure slot poisoned");
        if slot.is_none() {
            *slot = Some(err);
        }
    }

    fn take(&self) -> Option<Error> {
        self.slot.lock().expect("failure slot poisoned").take()
    }
}
