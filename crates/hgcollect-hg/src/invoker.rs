use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use crate::{Error, Result};

/// Template handed to `hg log`: ten tab-separated fields per history entry,
/// newline-terminated. The surrounding quotes are part of the template text,
/// so hg wraps every serialized entry in a literal quote character; the
/// parser strips them back off.
const LOG_TEMPLATE: &str = "'{date|isodatesec}\\t{node}\\t{rev}\\t{parents}\\t{author}\\t{tags}\\t{branch}\\t{diffstat}\\t{files}\\t{graphnode}\\n'";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);
const POLL_INTERVAL: Duration = Duration::from_millis(50);
// How long to wait for pipe readers after killing a timed-out child. The
// pipes may never close if the child left a grandchild holding them.
const PIPE_GRACE: Duration = Duration::from_millis(200);

/// Invokes `hg log` against one repository and captures its output.
#[derive(Debug, Clone)]
pub struct HgClient {
    program: String,
    timeout: Duration,
}

impl Default for HgClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HgClient {
    pub fn new() -> Self {
        Self {
            program: "hg".to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the binary invoked (tests point this at a fixture script).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Bound the subprocess lifetime; on expiry the child is killed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Run `hg log <repo> --template …` and return the captured stdout.
    ///
    /// Blocks the calling thread for the lifetime of the subprocess, bounded
    /// by the configured timeout. Captured stderr rides along in the error
    /// on every failure path.
    pub fn query_logs(&self, repo: &Path) -> Result<String> {
        let mut child = Command::new(&self.program)
            .arg("log")
            .arg(repo)
            .arg("--template")
            .arg(LOG_TEMPLATE)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| Error::Spawn {
                program: self.program.clone(),
                source,
            })?;

        // Drain both pipes on their own threads so a full pipe can never
        // wedge the child while we poll for exit.
        let out_pipe = drain(child.stdout.take());
        let err_pipe = drain(child.stderr.take());

        let started = Instant::now();
        let status = loop {
            if let Some(status) = child.try_wait()? {
                break status;
            }
            if started.elapsed() >= self.timeout {
                let _ = child.kill();
                let _ = child.wait();
                return Err(Error::Timeout {
                    limit: self.timeout,
                    stderr: err_pipe.recv_timeout(PIPE_GRACE).unwrap_or_default(),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        };

        let stdout = out_pipe.recv().unwrap_or_default();
        let stderr = err_pipe.recv().unwrap_or_default();

        if !status.success() {
            return Err(Error::Exit { status, stderr });
        }
        Ok(stdout)
    }
}

/// Read a child pipe to completion on a dedicated thread; the captured text
/// arrives on the returned channel once the pipe closes.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut pipe) = pipe {
            let _ = pipe.read_to_string(&mut buf);
        }
        let _ = tx.send(buf);
    });
    rx
}
