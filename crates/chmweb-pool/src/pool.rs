use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crossbeam_channel::{Receiver, Sender};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::PoolError;
use crate::protocol::Envelope;
use crate::worker::Worker;

/// A tagged result: which worker produced it, and in what order relative to
/// that worker's own stream (spec §4.3: per-worker FIFO ordering is
/// guaranteed, cross-worker ordering is not).
pub struct Delivered<Resp> {
    pub worker_id: usize,
    pub response: Resp,
}

/// A fixed-size pool of isolated worker processes, dispatched round-robin.
/// Spec §4.3 (C3).
pub struct Pool<Resp> {
    workers: Vec<Worker>,
    next: AtomicUsize,
    results_rx: Receiver<Delivered<Resp>>,
    pending: AtomicUsize,
    fatal: Arc<Mutex<Option<String>>>,
}

impl<Resp: DeserializeOwned + Send + 'static> Pool<Resp> {
    pub fn spawn(binary: &Path, worker_count: usize) -> Result<Self, PoolError> {
        assert!(worker_count > 0, "a pool needs at least one worker");
        let (tx, rx) = crossbeam_channel::unbounded();
        let fatal = Arc::new(Mutex::new(None));
        let mut workers = Vec::with_capacity(worker_count);
        for id in 0..worker_count {
            let mut worker = Worker::spawn(binary, id)?;
            let stdout = worker.take_stdout();
            spawn_reader(id, stdout, tx.clone(), Arc::clone(&fatal));
            workers.push(worker);
        }
        Ok(Self {
            workers,
            next: AtomicUsize::new(0),
            results_rx: rx,
            pending: AtomicUsize::new(0),
            fatal,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Submits `job` to the next worker in round-robin order.
    pub fn submit<Req: Serialize>(&self, job: &Req) -> Result<(), PoolError> {
        if let Some(msg) = self.fatal.lock().expect("fatal mutex poisoned").clone() {
            return Err(PoolError::Protocol(msg));
        }
        let idx = self.next.fetch_add(1, Ordering::Relaxed) % self.workers.len();
        self.workers[idx].submit(job)?;
        self.pending.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    /// Blocks until every job submitted so far has a result, a worker
    /// reports a fatal error, or a worker's stdout closes unexpectedly
    /// (`PoolError::WorkerDied`) — spec §4.3 "Failure semantics".
    pub fn drain(&self) -> Result<Vec<Delivered<Resp>>, PoolError> {
        let expected = self.pending.swap(0, Ordering::Relaxed);
        let mut out = Vec::with_capacity(expected);
        let poll_interval = std::time::Duration::from_millis(20);
        while out.len() < expected {
            if let Some(msg) = self.fatal.lock().expect("fatal mutex poisoned").clone() {
                return Err(PoolError::Protocol(msg));
            }
            match self.results_rx.recv_timeout(poll_interval) {
                Ok(delivered) => out.push(delivered),
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    return match self.fatal.lock().expect("fatal mutex poisoned").clone() {
                        Some(msg) => Err(PoolError::Protocol(msg)),
                        None => Err(PoolError::WorkerDied),
                    }
                }
            }
        }
        Ok(out)
    }
}

/// Reads `Envelope<Resp>` frames off one worker's stdout forever: warnings
/// are forwarded straight to `tracing` without counting toward a job's
/// completion, results are handed to the pool's shared channel, and an
/// error or an unexpected close poisons the pool for every future
/// `submit`/`drain` — spec §4.3.
fn spawn_reader<Resp: DeserializeOwned + Send + 'static>(
    worker_id: usize,
    mut stdout: impl std::io::Read + Send + 'static,
    tx: Sender<Delivered<Resp>>,
    fatal: Arc<Mutex<Option<String>>>,
) {
    std::thread::spawn(move || loop {
        match crate::protocol::read_frame::<_, Envelope<Resp>>(&mut stdout) {
            Ok(Some(Envelope::Result(response))) => {
                if tx.send(Delivered { worker_id, response }).is_err() {
                    break;
                }
            }
            Ok(Some(Envelope::Warning(message))) => {
                warn!(source = "worker", worker = worker_id, "{message}");
            }
            Ok(Some(Envelope::Error(message))) => {
                *fatal.lock().expect("fatal mutex poisoned") = Some(message);
                break;
            }
            Ok(None) => {
                let mut slot = fatal.lock().expect("fatal mutex poisoned");
                if slot.is_none() {
                    *slot = Some(format!("worker {worker_id} exited unexpectedly"));
                }
                break;
            }
            Err(e) => {
                *fatal.lock().expect("fatal mutex poisoned") = Some(e.to_string());
                break;
            }
        }
    });
}
