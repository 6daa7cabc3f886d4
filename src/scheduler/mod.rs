//! The deduplicated job queue and its worker pool.
//!
//! One mutex guards the pending queue, the in-flight set, and the
//! catalog-refresh flag; config-file mutation shares the same lock through
//! [`Scheduler::with_lock`]. A single lock keeps the critical sections
//! coarse but rules out lock-ordering bugs between queue and config
//! updates, which always happen in the same logical step.
//!
//! Termination is detected by polling: a worker that finds the queue empty
//! exits only when the in-flight set is empty too, otherwise it naps and
//! re-polls. With a small fixed pool the latency cost is negligible.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{anyhow, Result};

/// Size of the worker pool.
pub const DEFAULT_WORKERS: usize = 32;

/// Nap between termination polls.
const IDLE_POLL: Duration = Duration::from_millis(20);

#[derive(Default)]
struct QueueState {
    pending: VecDeque<String>,
    in_flight: HashSet<String>,
    catalog_refreshed: bool,
}

/// Shared scheduler state for one top-level command invocation.
#[derive(Default)]
pub struct Scheduler {
    state: Mutex<QueueState>,
}

impl Scheduler {
    /// Create an empty scheduler.
    pub fn new() -> Scheduler {
        Scheduler::default()
    }

    /// Append a job unless it is already pending or in flight.
    ///
    /// This dedup check is what keeps cyclic and diamond-shaped dependency
    /// graphs from re-fetching forever: an identifier is processed at most
    /// once per run, so a silent no-op here is correct, not lossy.
    pub fn enqueue(&self, job: impl Into<String>) {
        let job = job.into();
        let mut state = self.state.lock().unwrap();

        if state.in_flight.contains(&job) || state.pending.iter().any(|j| j == &job) {
            return;
        }
        state.pending.push_back(job);
    }

    /// Pop the head of the queue into the in-flight set. Non-blocking;
    /// `None` is the empty sentinel.
    fn dequeue(&self) -> Option<String> {
        let mut state = self.state.lock().unwrap();
        let job = state.pending.pop_front()?;
        state.in_flight.insert(job.clone());
        Some(job)
    }

    /// Retire a job. Only the worker that popped it calls this.
    fn finish(&self, job: &str) {
        let mut state = self.state.lock().unwrap();
        state.in_flight.remove(job);
    }

    /// The termination predicate: nothing pending and nothing in flight.
    fn is_idle(&self) -> bool {
        let state = self.state.lock().unwrap();
        state.pending.is_empty() && state.in_flight.is_empty()
    }

    /// Number of jobs currently pending.
    pub fn pending_len(&self) -> usize {
        self.state.lock().unwrap().pending.len()
    }

    /// Run `f` while holding the scheduler mutex.
    ///
    /// Used for config-file mutation, which shares this lock with the
    /// queue. Do not enqueue from inside `f`.
    pub fn with_lock<T>(&self, f: impl FnOnce() -> T) -> T {
        let _guard = self.state.lock().unwrap();
        f()
    }

    /// Run `refresh` at most once per process, double-checked under the
    /// scheduler mutex so only the first worker to need the catalog pays
    /// the clone/pull cost while the rest wait.
    pub fn refresh_catalog_once(&self, refresh: impl FnOnce() -> Result<()>) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        if state.catalog_refreshed {
            return Ok(());
        }
        refresh()?;
        state.catalog_refreshed = true;
        Ok(())
    }

    /// Drain the queue with exactly `workers` OS threads, blocking until
    /// all of them have exited. This is the only synchronization point the
    /// caller needs.
    pub fn run(&self, workers: usize, worker: impl Fn(&str) -> Result<()> + Sync) -> Result<()> {
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..workers.max(1))
                .map(|_| scope.spawn(|| self.worker_loop(&worker)))
                .collect();

            for handle in handles {
                handle.join().map_err(|_| anyhow!("worker thread panicked"))??;
            }
            Ok(())
        })
    }

    fn worker_loop(&self, worker: &(impl Fn(&str) -> Result<()> + Sync)) -> Result<()> {
        loop {
            let Some(job) = self.dequeue() else {
                if self.is_idle() {
                    return Ok(());
                }
                std::thread::sleep(IDLE_POLL);
                continue;
            };

            let result = worker(&job);
            self.finish(&job);
            result?;
        }
    }
}
