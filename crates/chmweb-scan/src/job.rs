//! The two pure functions dispatched to the worker pool, spec §4.3/§4.7/§4.8:
//! parsing one HHC file (C6, run remotely so large collections parse in
//! parallel) and scanning one HTML page (C7). `chmweb-worker`'s main loop
//! matches on `Job` and answers with `JobResponse`.
//!
//! Both variants echo back the identifier (archive stem / page path) they
//! were given. The pool only guarantees per-worker FIFO delivery (spec
//! §4.3) — responses from different workers can interleave in any order —
//! so the tree scanner needs the echo to match a `JobResponse` back to the
//! pending item it answers.

use serde::{Deserialize, Serialize};

use chmweb_toc::DetachedNode;
use chmweb_types::RootPath;

use crate::page::{scan_page, ScannedPage};

#[derive(Debug, Serialize, Deserialize)]
pub enum Job {
    ParseHhc { stem: String, src: String },
    ScanPage { path: RootPath, html: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub enum JobResponse {
    Hhc { stem: String, nodes: Vec<DetachedNode> },
    Page { path: RootPath, page: ScannedPage },
}

/// Executes one job. Pure: no filesystem or archive-wide state — exactly
/// what spec §4.3 requires of the function a worker runs.
pub fn run_job(job: Job) -> JobResponse {
    match job {
        Job::ParseHhc { stem, src } => JobResponse::Hhc {
            stem,
            nodes: chmweb_toc::parse_hhc(&src),
        },
        Job::ScanPage { path, html } => JobResponse::Page {
            path,
            page: scan_page(&html),
        },
    }
}
