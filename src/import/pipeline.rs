//! Parallel parse, ordered write
//!
//! A rayon pool of `workers` threads pulls job indices from a shared counter
//! and sends each job's chunks over a bounded channel. The calling thread is
//! the single writer: it restores job order with a reorder buffer and hands
//! every job to `consume` in index order. Workers never run more than
//! `2 * workers` jobs ahead of the writer.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};
use std::time::Duration;

use crate::cancel::CancelSignal;
use crate::error::{DictError, Result};
use crate::model::Chunk;

use super::ChunkSource;

type JobResult = (usize, Result<Vec<Chunk>>);

pub(crate) fn run_pipeline<S, F>(
    source: &S,
    workers: usize,
    cancel: &CancelSignal,
    mut consume: F,
) -> Result<()>
where
    S: ChunkSource + ?Sized,
    F: FnMut(usize, Vec<Chunk>) -> Result<()>,
{
    let jobs = source.job_count();
    if jobs == 0 {
        return Ok(());
    }
    let workers = workers.clamp(1, jobs);
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(workers)
        .thread_name(|i| format!("dict-parse-{i}"))
        .build()?;
    let (tx, rx) = kanal::bounded::<JobResult>(workers * 2);

    let next = AtomicUsize::new(0);
    let stop = AtomicBool::new(false);
    let window = Window::new(workers * 2);
    let (next, stop, window) = (&next, &stop, &window);

    tracing::debug!("Parsing {} job(s) on {} worker(s)", jobs, workers);

    std::thread::scope(|scope| {
        scope.spawn(move || {
            pool.scope(|s| {
                for _ in 0..workers {
                    let tx = tx.clone();
                    s.spawn(move |_| loop {
                        if stop.load(Ordering::SeqCst) || cancel.is_cancelled() {
                            break;
                        }
                        let index = next.fetch_add(1, Ordering::SeqCst);
                        if index >= jobs || !window.admit(index, stop, cancel) {
                            break;
                        }
                        let result = source.run_job(index);
                        if tx.send((index, result)).is_err() {
                            break;
                        }
                    });
                }
            });
        });

        let mut pending: BTreeMap<usize, Result<Vec<Chunk>>> = BTreeMap::new();
        let mut expected = 0;
        let mut write_all = || -> Result<()> {
            while expected < jobs {
                let Ok((index, result)) = rx.recv() else {
                    // workers only stop early once cancelled
                    return Err(DictError::Cancelled);
                };
                pending.insert(index, result);
                while let Some(result) = pending.remove(&expected) {
                    let chunks = result?;
                    cancel.check()?;
                    consume(expected, chunks)?;
                    expected += 1;
                    window.advance(expected);
                }
            }
            Ok(())
        };

        let outcome = write_all();
        if outcome.is_err() {
            stop.store(true, Ordering::SeqCst);
            window.wake_all();
            let _ = rx.close();
        }
        outcome
    })
}

/// Keeps workers at most `size` jobs ahead of the writer, so parsed chunks
/// waiting in the reorder buffer stay bounded.
struct Window {
    size: usize,
    written: Mutex<usize>,
    advanced: Condvar,
}

impl Window {
    /// How long a parked worker sleeps before rechecking cancellation.
    const RECHECK: Duration = Duration::from_millis(50);

    fn new(size: usize) -> Self {
        Self {
            size,
            written: Mutex::new(0),
            advanced: Condvar::new(),
        }
    }

    /// Blocks until job `index` is inside the window. `false` once the
    /// pipeline is stopping.
    fn admit(&self, index: usize, stop: &AtomicBool, cancel: &CancelSignal) -> bool {
        let mut written = self.written.lock().unwrap_or_else(PoisonError::into_inner);
        while index >= *written + self.size {
            if stop.load(Ordering::SeqCst) || cancel.is_cancelled() {
                return false;
            }
            written = self
                .advanced
                .wait_timeout(written, Self::RECHECK)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
        true
    }

    fn advance(&self, written: usize) {
        *self.written.lock().unwrap_or_else(PoisonError::into_inner) = written;
        self.advanced.notify_all();
    }

    fn wake_all(&self) {
        self.advanced.notify_all();
    }
}
