/*!
Server-side enforcement of a line-ending policy for git repositories.

Content pushed or proposed for merging is vetted by scanning unified diffs:
under the strict policy no added line may end in a carriage return, while the
inherit policy tolerates CR endings in files that demonstrably carried them
before the change. Only newly introduced content is vetted; history that is
already part of the repository is never re-judged.

The crate is organized around a small set of seams:

- [`client`] is the boundary to the version control system. [`GitClient`]
  shells out to `git` plumbing; tests substitute in-memory fakes.
- [`resolve`] finds the comparison base for updates whose nominal parent is
  unknown, such as new branches and force-pushes.
- [`check`] walks a revision range: changed paths, exclusion filter, then one
  bounded diff scan per path.
- [`hooks`] adapts the checker to the three integration points: the
  pre-receive hook, the pre-merge vet of a pull request, and the veto at pull
  request creation time.
- [`config`] reads per-repository settings from the `eolcheck` section of the
  repository configuration.
*/

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]

pub mod check;
pub mod client;
pub mod config;
pub mod hooks;
pub mod resolve;

pub use check::RangeEolChecker;
pub use client::{DiffRequest, GitClient, GitClientOptions, VcsClient};
pub use hooks::Decision;

/// Stable high-level error classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    /// Invalid repository configuration.
    Config,
    /// Malformed hook input or revision arguments.
    Protocol,
    /// The external git process failed, timed out, or could not be read.
    Tool,
}

/// Error type for operations provided by this crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The configured exclusion patterns do not compile.
    #[error(transparent)]
    Settings(#[from] gix_eol_core::filter::ParseError),
    /// Any other invalid configuration value.
    #[error("configuration error: {0}")]
    Config(String),
    /// Malformed pre-receive input or revision argument.
    #[error("protocol error: {0}")]
    Protocol(String),
    /// git exited with a failure status.
    #[error("git {command} failed ({status}): {stderr}")]
    Tool {
        /// The git subcommand that failed.
        command: String,
        /// Its exit status.
        status: std::process::ExitStatus,
        /// What it printed to stderr, trimmed.
        stderr: String,
    },
    /// The watchdog cut down a process that exceeded its deadline.
    #[error("git {command} timed out after {timeout:?}")]
    Timeout {
        /// The git subcommand that was killed.
        command: String,
        /// The configured deadline.
        timeout: std::time::Duration,
    },
    /// Spawning or reading the external process failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Fast classification helper returning a stable error kind.
    pub fn kind(&self) -> Kind {
        match self {
            Error::Settings(_) | Error::Config(_) => Kind::Config,
            Error::Protocol(_) => Kind::Protocol,
            Error::Tool { .. } | Error::Timeout { .. } | Error::Io(_) => Kind::Tool,
        }
    }

    /// True when the failure came from running the external git process.
    ///
    /// Such failures say nothing about the content under scrutiny; callers
    /// fail closed and report the tool problem instead of a policy verdict.
    pub fn is_tool_failure(&self) -> bool {
        matches!(self.kind(), Kind::Tool)
    }
}
