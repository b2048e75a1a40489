use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::PoolError;
use crate::protocol::{read_frame, write_frame};

/// One isolated worker process. Spec §4.3 requires workers to be "separate
/// OS processes or an equivalent isolation boundary", never threads sharing
/// the control process's memory — so this re-execs the `chmweb-worker`
/// binary rather than spawning a thread pool.
pub struct Worker {
    pub id: usize,
    child: Child,
    stdin: Mutex<ChildStdin>,
}

impl Worker {
    pub fn spawn(binary: &Path, id: usize) -> Result<Self, PoolError> {
        let mut child = Command::new(binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PoolError::Spawn {
                binary: binary.to_path_buf(),
                source: e,
            })?;

        let stderr = child.stderr.take().expect("stderr was piped");
        let worker_id = id;
        std::thread::spawn(move || {
            use std::io::BufRead;
            for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                warn!(source = "worker-stderr", worker = worker_id, "{line}");
            }
        });

        let stdin = child.stdin.take().expect("stdin was piped");
        Ok(Self {
            id,
            child,
            stdin: Mutex::new(stdin),
        })
    }

    pub fn submit<Req: Serialize>(&self, job: &Req) -> Result<(), PoolError> {
        let mut stdin = self.stdin.lock().expect("worker stdin mutex poisoned");
        write_frame(&mut *stdin, job)
    }

    pub fn take_stdout(&mut self) -> impl std::io::Read {
        BufReader::new(self.child.stdout.take().expect("stdout was piped"))
    }

    pub fn wait(&mut self) -> std::io::Result<std::process::ExitStatus> {
        self.child.wait()
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

pub fn recv_one<Resp: DeserializeOwned>(
    mut stdout: impl std::io::Read,
) -> Result<Option<Resp>, PoolError> {
    read_frame(&mut stdout)
}

pub const DEFAULT_WORKER_ENV_VAR: &str = "CHMWEB_WORKER_BINARY";

/// Resolves the worker binary path: an explicit override, then the env var
/// set by the CLI's own argv[0] (spec §A.4 / SPEC_FULL §A.3), then the name
/// Cargo installs it under alongside the main binary.
pub fn default_worker_binary() -> PathBuf {
    std::env::var_os(DEFAULT_WORKER_ENV_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("chmweb-worker"))
}
