//! The pre-merge adapter: vet a pull request before it may merge.
//!
//! The range from the target branch tip to the source branch tip is exactly
//! what the merge would bring in, so it is vetted the way a push would be.

use gix_eol_core::{ChangeRange, Settings};
use gix_hash::ObjectId;

use crate::check::RangeEolChecker;
use crate::client::VcsClient;
use crate::hooks::Decision;
use crate::Error;

/// Vet the changes a pull request would merge, from the current tip of the
/// target branch to the current tip of the source branch.
pub fn evaluate<C: VcsClient>(
    client: &C,
    settings: &Settings,
    target_tip: ObjectId,
    source_tip: ObjectId,
) -> Result<Decision, Error> {
    let checker = RangeEolChecker::new(client, settings);
    let violating = checker.check_range(ChangeRange::new(Some(target_tip), source_tip))?;
    Ok(if violating.is_empty() {
        Decision::accepted()
    } else {
        Decision::rejected_pull_request(violating)
    })
}
