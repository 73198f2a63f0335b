//! Spawning `git` plumbing and reading its output within bounds.
//!
//! Every query runs as a short-lived `git` child process. Two limits apply to
//! each: a watchdog kills it once the configured deadline passes, and
//! dropping its output stream kills it early, which is how a settled scan
//! cancels the rest of a diff.

use std::ffi::OsString;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStderr, ChildStdout, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bstr::{BString, ByteSlice};
use gix_eol_core::ChangeRange;
use gix_hash::ObjectId;

use super::{DiffRequest, VcsClient};
use crate::Error;

/// Chunk size for draining process output.
const BUFFER_SIZE: usize = 8192;
/// Poll interval while waiting for a drained child to be reapable.
const REAP_INTERVAL: Duration = Duration::from_millis(10);

/// Options governing how git child processes are run.
#[derive(Debug, Clone)]
pub struct GitClientOptions {
    /// Hard deadline per spawned process. A process exceeding it is killed
    /// and the query fails, which in turn fails the check closed.
    pub timeout: Duration,
    /// The `objects` directory of a second repository to make visible to
    /// git, used when a pull request spans two repositories that share
    /// object storage, as fork pull requests do.
    pub alternate_objects: Option<PathBuf>,
    /// The hash kind of the repository, needed to name the empty tree.
    pub object_hash: gix_hash::Kind,
}

impl Default for GitClientOptions {
    fn default() -> Self {
        GitClientOptions {
            timeout: Duration::from_secs(30),
            alternate_objects: None,
            object_hash: gix_hash::Kind::Sha1,
        }
    }
}

/// [`VcsClient`] implementation that shells out to the `git` binary.
///
/// All queries are read-only with respect to the repository. Paths travel as
/// raw bytes end to end: changed paths are read NUL-separated and handed back
/// to `git` verbatim, so unusual file names survive the round trip.
#[derive(Debug)]
pub struct GitClient {
    git_dir: PathBuf,
    options: GitClientOptions,
}

impl GitClient {
    /// A client for the repository at `git_dir` with default options.
    pub fn new(git_dir: impl Into<PathBuf>) -> Self {
        Self::with_options(git_dir, GitClientOptions::default())
    }

    /// A client for the repository at `git_dir` with explicit options.
    pub fn with_options(git_dir: impl Into<PathBuf>, options: GitClientOptions) -> Self {
        GitClient {
            git_dir: git_dir.into(),
            options,
        }
    }

    /// The repository this client queries.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    fn base_id(&self, range: ChangeRange) -> ObjectId {
        range
            .since
            .unwrap_or_else(|| ObjectId::empty_tree(self.options.object_hash))
    }

    fn spawn(&self, label: &str, args: Vec<OsString>) -> Result<BoundedProcess, Error> {
        let mut git_args: Vec<OsString> = vec!["--git-dir".into(), self.git_dir.clone().into()];
        git_args.extend(args);
        let mut prepare = gix_command::prepare("git")
            .args(git_args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(objects) = &self.options.alternate_objects {
            prepare = prepare.env("GIT_ALTERNATE_OBJECT_DIRECTORIES", objects.as_os_str());
        }
        BoundedProcess::spawn(prepare, label, self.options.timeout)
    }

    fn run(&self, label: &str, args: Vec<OsString>) -> Result<(ExitStatus, Vec<u8>), Error> {
        let mut process = self.spawn(label, args)?;
        let mut output = Vec::new();
        process.read_stdout_to_end(&mut output)?;
        let (status, stderr) = process.finish()?;
        if !status.success() && !is_benign_failure(label, status, &output) {
            return Err(Error::Tool {
                command: label.to_owned(),
                status,
                stderr: stderr.trim().as_bstr().to_string(),
            });
        }
        Ok((status, output))
    }

    fn run_lines(&self, label: &str, args: Vec<OsString>) -> Result<Vec<BString>, Error> {
        let (_, output) = self.run(label, args)?;
        Ok(output.lines().map(BString::from).collect())
    }
}

/// `git merge-base` reports unrelated histories by exiting 1 with no output,
/// which is an answer rather than a failure.
fn is_benign_failure(label: &str, status: ExitStatus, output: &[u8]) -> bool {
    label == "merge-base" && status.code() == Some(1) && output.is_empty()
}

impl VcsClient for GitClient {
    fn changed_paths(&self, range: ChangeRange) -> Result<std::collections::BTreeSet<BString>, Error> {
        let base = self.base_id(range);
        let args: Vec<OsString> = vec![
            "diff".into(),
            "--name-only".into(),
            "-z".into(),
            "--no-color".into(),
            base.to_string().into(),
            range.to.to_string().into(),
        ];
        let (_, output) = self.run("diff --name-only", args)?;
        Ok(output
            .split_str(b"\0")
            .filter(|path| !path.is_empty())
            .map(BString::from)
            .collect())
    }

    fn diff(&self, request: DiffRequest<'_>) -> Result<Box<dyn Read + '_>, Error> {
        let base = self.base_id(request.range);
        let args: Vec<OsString> = vec![
            "diff".into(),
            "--no-color".into(),
            "--no-ext-diff".into(),
            "--no-textconv".into(),
            format!("--unified={}", request.context_lines).into(),
            base.to_string().into(),
            request.range.to.to_string().into(),
            "--".into(),
            request.path.to_os_str_lossy().into_owned(),
        ];
        let process = self.spawn("diff", args)?;
        Ok(Box::new(DiffStream {
            process: Some(process),
        }))
    }

    fn rev_list(&self, tip: ObjectId) -> Result<Vec<ObjectId>, Error> {
        let args: Vec<OsString> = vec!["rev-list".into(), tip.to_string().into()];
        self.run_lines("rev-list", args)?
            .iter()
            .map(|line| parse_object_id(line, "rev-list"))
            .collect()
    }

    fn branches_containing(&self, commit: ObjectId) -> Result<Vec<BString>, Error> {
        let args: Vec<OsString> = vec![
            "branch".into(),
            "--contains".into(),
            commit.to_string().into(),
        ];
        Ok(self
            .run_lines("branch --contains", args)?
            .into_iter()
            .filter_map(|line| {
                // Lines are "* name", "+ name" or "  name"; a detached HEAD
                // shows up as "* (HEAD detached at ...)" and is not a branch.
                let name = line.get(2..).unwrap_or_default();
                if name.is_empty() || name.starts_with(b"(") {
                    None
                } else {
                    Some(BString::from(name))
                }
            })
            .collect())
    }

    fn merge_base(&self, a: ObjectId, b: ObjectId) -> Result<Option<ObjectId>, Error> {
        let args: Vec<OsString> = vec![
            "merge-base".into(),
            a.to_string().into(),
            b.to_string().into(),
        ];
        let (status, output) = self.run("merge-base", args)?;
        if !status.success() {
            return Ok(None);
        }
        output
            .lines()
            .next()
            .map(|line| parse_object_id(line, "merge-base"))
            .transpose()
    }
}

fn parse_object_id(line: &[u8], label: &str) -> Result<ObjectId, Error> {
    ObjectId::from_hex(line).map_err(|err| {
        Error::Protocol(format!(
            "unexpected {label} output line {:?}: {err}",
            line.as_bstr()
        ))
    })
}

/// Live unified-diff output of a `git diff` process.
///
/// Reading yields raw diff bytes. Dropping the stream before end-of-stream
/// terminates the process, which is how a settled verdict cancels the rest
/// of the read. Reading through to end-of-stream verifies the exit status,
/// so a failing diff surfaces as a read error rather than a truncated diff.
pub struct DiffStream {
    process: Option<BoundedProcess>,
}

impl Read for DiffStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let Some(process) = self.process.as_mut() else {
            return Ok(0);
        };
        let count = process.read_stdout(buf).map_err(into_io_error)?;
        if count == 0 {
            if let Some(process) = self.process.take() {
                let (status, stderr) = process.finish().map_err(into_io_error)?;
                if !status.success() {
                    return Err(into_io_error(Error::Tool {
                        command: "diff".to_owned(),
                        status,
                        stderr: stderr.trim().as_bstr().to_string(),
                    }));
                }
            }
        }
        Ok(count)
    }
}

fn into_io_error(err: Error) -> io::Error {
    match &err {
        Error::Timeout { .. } => io::Error::new(io::ErrorKind::TimedOut, err.to_string()),
        _ => io::Error::other(err.to_string()),
    }
}

/// A spawned git process whose lifetime is bounded by a deadline.
///
/// The child handle is shared with a watchdog thread that kills the process
/// if it is still around when the deadline passes; blocked reads then
/// unblock at end-of-stream and the timeout surfaces as an error. Dropping
/// the value without finishing kills and reaps the child.
struct BoundedProcess {
    label: String,
    timeout: Duration,
    child: Arc<Mutex<Child>>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    expired: Arc<AtomicBool>,
    _disarm: mpsc::Sender<()>,
    finished: bool,
}

impl BoundedProcess {
    fn spawn(prepare: gix_command::Prepare, label: &str, timeout: Duration) -> Result<Self, Error> {
        let mut child = prepare.spawn()?;
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let child = Arc::new(Mutex::new(child));
        let expired = Arc::new(AtomicBool::new(false));
        let (disarm, armed) = mpsc::channel::<()>();

        let watched = Arc::clone(&child);
        let watchdog_expired = Arc::clone(&expired);
        std::thread::spawn(move || {
            // The sender disconnects when the process is finished or dropped,
            // which ends the wait early.
            if armed.recv_timeout(timeout) == Err(mpsc::RecvTimeoutError::Timeout) {
                watchdog_expired.store(true, Ordering::SeqCst);
                let _ = lock_ignoring_poison(&watched).kill();
            }
        });

        Ok(BoundedProcess {
            label: label.to_owned(),
            timeout,
            child,
            stdout,
            stderr,
            expired,
            _disarm: disarm,
            finished: false,
        })
    }

    fn timed_out(&self) -> Error {
        Error::Timeout {
            command: self.label.clone(),
            timeout: self.timeout,
        }
    }

    fn expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    /// One blocking chunk read from stdout. A watchdog kill unblocks the
    /// read with end-of-stream and is reported as a timeout here.
    fn read_stdout(&mut self, buf: &mut [u8]) -> Result<usize, Error> {
        if self.expired() {
            return Err(self.timed_out());
        }
        let count = match &mut self.stdout {
            Some(stdout) => stdout.read(buf)?,
            None => 0,
        };
        if self.expired() {
            return Err(self.timed_out());
        }
        Ok(count)
    }

    fn read_stdout_to_end(&mut self, out: &mut Vec<u8>) -> Result<(), Error> {
        let mut chunk = [0u8; BUFFER_SIZE];
        loop {
            let count = self.read_stdout(&mut chunk)?;
            if count == 0 {
                return Ok(());
            }
            out.extend_from_slice(&chunk[..count]);
        }
    }

    /// Drain stderr, reap the child and disarm the watchdog.
    fn finish(mut self) -> Result<(ExitStatus, Vec<u8>), Error> {
        let mut stderr_output = Vec::new();
        if let Some(mut stderr) = self.stderr.take() {
            let mut chunk = [0u8; BUFFER_SIZE];
            loop {
                if self.expired() {
                    return Err(self.timed_out());
                }
                match stderr.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(count) => stderr_output.extend_from_slice(&chunk[..count]),
                    Err(err) => return Err(err.into()),
                }
            }
        }
        let status = loop {
            if self.expired() {
                return Err(self.timed_out());
            }
            if let Some(status) = lock_ignoring_poison(&self.child).try_wait()? {
                break status;
            }
            std::thread::sleep(REAP_INTERVAL);
        };
        if self.expired() {
            return Err(self.timed_out());
        }
        self.finished = true;
        Ok((status, stderr_output))
    }
}

impl Drop for BoundedProcess {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        // Dropped mid-stream: the verdict settled early or an error unwound.
        // Terminate the producer and reap it; the watchdog disarms when the
        // channel sender in this value disconnects.
        let mut child = lock_ignoring_poison(&self.child);
        let _ = child.kill();
        let _ = child.wait();
    }
}

fn lock_ignoring_poison<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
