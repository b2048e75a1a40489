//! Isolated worker process pool, spec §4.3 (C3). Jobs are dispatched
//! round-robin to a fixed set of subprocesses over a length-prefixed
//! `bincode` protocol (`protocol`); `chmweb-cli`'s `worker_main` is the
//! binary that answers on the other end.

pub mod error;
pub mod pool;
pub mod protocol;
pub mod worker;

pub use error::PoolError;
pub use pool::{Delivered, Pool};
pub use protocol::{read_frame, write_frame, Envelope};
pub use worker::{default_worker_binary, Worker};
