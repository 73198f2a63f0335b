//! The creation-time veto: refuse to open a pull request that already
//! carries wrong line endings.
//!
//! Unlike the pre-merge vet this may span two repositories, a fork proposing
//! changes to its parent. The client must then be configured with the source
//! repository's object store as an alternate so merge-base and diff see both
//! histories. Scanning starts at the merge base, so only commits unique to
//! the source side are judged; unrelated histories fall back to the empty
//! tree.

use gix_eol_core::{ChangeRange, Settings};
use gix_hash::ObjectId;

use crate::check::RangeEolChecker;
use crate::client::VcsClient;
use crate::hooks::Decision;
use crate::{resolve, Error};

/// Vet the commits a new pull request proposes, from the merge base of both
/// tips up to the source tip.
pub fn evaluate<C: VcsClient>(
    client: &C,
    settings: &Settings,
    target_tip: ObjectId,
    source_tip: ObjectId,
) -> Result<Decision, Error> {
    let since = resolve::merge_base(client, target_tip, source_tip)?;
    if since == Some(source_tip) {
        // The source tip is already part of the target history, so the pull
        // request proposes nothing new.
        return Ok(Decision::accepted());
    }
    let checker = RangeEolChecker::new(client, settings);
    let violating = checker.check_range(ChangeRange::new(since, source_tip))?;
    Ok(if violating.is_empty() {
        Decision::accepted()
    } else {
        Decision::rejected_pull_request(violating)
    })
}
