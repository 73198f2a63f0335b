//! The boundary between check logic and the version control system.
//!
//! Everything the checker wants from a repository goes through [`VcsClient`],
//! which keeps range resolution and diff scanning a pure function of byte
//! streams and revision ids. [`GitClient`] is the process-spawning
//! implementation; tests substitute in-memory fakes.

pub mod git;

use std::collections::BTreeSet;
use std::io::Read;

use bstr::{BStr, BString};
use gix_eol_core::ChangeRange;
use gix_hash::ObjectId;

use crate::Error;

pub use git::{DiffStream, GitClient, GitClientOptions};

/// A single-path diff request bounded to a revision range.
#[derive(Debug, Clone, Copy)]
pub struct DiffRequest<'a> {
    /// The revision pair to diff; a `since` of `None` compares against the
    /// empty tree.
    pub range: ChangeRange,
    /// Repository-relative path of the file to diff.
    pub path: &'a BStr,
    /// Unchanged lines to include around each hunk.
    ///
    /// The strict policy needs none; the inherit policy needs at least one to
    /// witness the file's prior line endings.
    pub context_lines: u32,
}

/// Read-only queries the checker issues against a repository.
pub trait VcsClient {
    /// All paths changed in `range`, deduplicated and byte-exact.
    fn changed_paths(&self, range: ChangeRange) -> Result<BTreeSet<BString>, Error>;

    /// The unified diff for one path as a byte stream.
    ///
    /// Callers may drop the stream before end-of-stream once a verdict is
    /// settled. Implementations must terminate whatever produces the bytes
    /// when that happens instead of buffering the remainder.
    fn diff(&self, request: DiffRequest<'_>) -> Result<Box<dyn Read + '_>, Error>;

    /// Commits reachable from `tip`, newest first.
    fn rev_list(&self, tip: ObjectId) -> Result<Vec<ObjectId>, Error>;

    /// Names of existing branches whose history contains `commit`.
    fn branches_containing(&self, commit: ObjectId) -> Result<Vec<BString>, Error>;

    /// The nearest common ancestor of `a` and `b`, or `None` when their
    /// histories are unrelated.
    fn merge_base(&self, a: ObjectId, b: ObjectId) -> Result<Option<ObjectId>, Error>;
}
