//! Walking a revision range: changed paths, exclusion filter, then one
//! bounded diff scan per remaining path.

use std::collections::BTreeSet;
use std::io::Read;

use bstr::{BStr, BString, ByteSlice};
use gix_eol_core::scan::{Scan, Status};
use gix_eol_core::{ChangeRange, RefChange, Settings};

use crate::client::{DiffRequest, VcsClient};
use crate::{resolve, Error};

/// Chunk size for pulling diff output into the scanner.
const BUFFER_SIZE: usize = 8192;

/// Checks every changed path of a revision range against one repository's
/// line-ending policy.
pub struct RangeEolChecker<'a, C> {
    client: &'a C,
    settings: &'a Settings,
}

impl<'a, C: VcsClient> RangeEolChecker<'a, C> {
    /// A checker over `client`, applying the repository's `settings`.
    pub fn new(client: &'a C, settings: &'a Settings) -> Self {
        RangeEolChecker { client, settings }
    }

    /// The paths in `range` whose diff violates the policy, in path order.
    ///
    /// Paths matching an exclusion pattern are never diffed at all.
    pub fn check_range(&self, range: ChangeRange) -> Result<BTreeSet<BString>, Error> {
        if range.is_empty() {
            return Ok(BTreeSet::new());
        }
        let paths = self.settings.exclude.filter(self.client.changed_paths(range)?);
        let mut violating = BTreeSet::new();
        for path in paths {
            if !self.scan_path(range, path.as_bstr())? {
                violating.insert(path);
            }
        }
        Ok(violating)
    }

    /// Resolve one ref update to a range and check it.
    ///
    /// Updates that cannot introduce content, deletions and unmoved tips as
    /// well as updates whose resolved base is the new tip itself, yield an
    /// empty set without touching the repository further.
    pub fn check_ref_change(&self, change: &RefChange) -> Result<BTreeSet<BString>, Error> {
        #[cfg(feature = "tracing")]
        let _span = gix_trace::coarse!("check_ref_change");
        if change.is_noop() {
            return Ok(BTreeSet::new());
        }
        let since = resolve::comparison_base(self.client, change)?;
        if since == Some(change.to) {
            return Ok(BTreeSet::new());
        }
        self.check_range(ChangeRange::new(since, change.to))
    }

    /// The union of violating paths across every update of one push.
    ///
    /// The first failing query aborts the whole push, so a reported
    /// acceptance is never based on partial information.
    pub fn check_all(&self, changes: &[RefChange]) -> Result<BTreeSet<BString>, Error> {
        let mut violating = BTreeSet::new();
        for change in changes {
            violating.extend(self.check_ref_change(change)?);
        }
        Ok(violating)
    }

    /// Scan one path's diff, stopping the moment the verdict settles.
    fn scan_path(&self, range: ChangeRange, path: &BStr) -> Result<bool, Error> {
        #[cfg(feature = "tracing")]
        let _span = gix_trace::detail!("scan_path");
        let mut scan = Scan::new(self.settings.policy);
        let mut diff = self.client.diff(DiffRequest {
            range,
            path,
            context_lines: self.settings.policy.context_lines(),
        })?;
        let mut chunk = [0u8; BUFFER_SIZE];
        loop {
            let count = diff.read(&mut chunk)?;
            if count == 0 {
                break;
            }
            if scan.update(&chunk[..count]) == Status::Settled {
                // Dropping the stream cancels the rest of the diff.
                break;
            }
        }
        Ok(scan.verdict())
    }
}
