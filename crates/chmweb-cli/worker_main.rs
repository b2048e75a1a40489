//! The worker binary (`chmweb-worker`), spec §9 "Suspend/resume semantics":
//! reads one length-prefixed `Job` from stdin, runs it, writes back a
//! `Result` envelope, and loops — exiting 1 after writing an `Error`
//! envelope on any read failure or panic. Never writes to stdout outside
//! the frame protocol (`print_stdout` is denied crate-wide).

use std::io::{self, BufReader, BufWriter};
use std::panic;
use std::process::ExitCode;

use chmweb_pool::{read_frame, write_frame, Envelope};
use chmweb_scan::{run_job, Job, JobResponse};

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .without_time()
        .with_target(false)
        .init();

    let mut stdin = BufReader::new(io::stdin());
    let mut stdout = BufWriter::new(io::stdout());

    loop {
        let job: Job = match read_frame(&mut stdin) {
            Ok(Some(job)) => job,
            Ok(None) => return ExitCode::SUCCESS,
            Err(e) => {
                let _ = write_frame(&mut stdout, &Envelope::<JobResponse>::Error(e.to_string()));
                return ExitCode::FAILURE;
            }
        };

        let response = panic::catch_unwind(panic::AssertUnwindSafe(|| run_job(job)));
        match response {
            Ok(response) => {
                if write_frame(&mut stdout, &Envelope::Result(response)).is_err() {
                    return ExitCode::FAILURE;
                }
            }
            Err(payload) => {
                let message = payload
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| payload.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "worker panicked".to_string());
                let _ = write_frame(&mut stdout, &Envelope::<JobResponse>::Error(message));
                return ExitCode::FAILURE;
            }
        }
    }
}
