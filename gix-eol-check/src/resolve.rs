//! Comparison-base resolution for ref updates with an unknown parent.
//!
//! A push can move a ref to a tip whose nominal predecessor the repository
//! does not know: a new branch, a rewritten history, a tag on freshly pushed
//! commits. Scanning such an update against its entire history would re-judge
//! content that was accepted long ago, so the scan is bounded to the nearest
//! ancestor the repository already vouches for.

use gix_eol_core::RefChange;
use gix_hash::ObjectId;

use crate::client::VcsClient;
use crate::Error;

/// The nearest common ancestor of `a` and `b`, or `None` when their
/// histories are unrelated.
///
/// Identical ids are their own merge base and short-circuit without
/// consulting the repository.
pub fn merge_base<C: VcsClient>(
    client: &C,
    a: ObjectId,
    b: ObjectId,
) -> Result<Option<ObjectId>, Error> {
    if a == b {
        return Ok(Some(a));
    }
    client.merge_base(a, b)
}

/// The comparison base for one ref update: the nearest ancestor of
/// `change.to` that the repository already contains, or `None` when the
/// update brings an entirely unrelated history.
///
/// An update whose `from` is a real commit needs no resolution, that commit
/// is the base. Otherwise the ancestry of the new tip is walked newest-first
/// until a commit contained in at least one existing branch turns up:
///
/// - the tip itself, when it is already known, say a tag pointing at an
///   existing commit, making the update content-free;
/// - an ancestor, whose merge base with the tip bounds the scan to the
///   commits this update actually introduces;
/// - no commit at all, which means everything is new and the scan runs
///   against the empty tree.
pub fn comparison_base<C: VcsClient>(
    client: &C,
    change: &RefChange,
) -> Result<Option<ObjectId>, Error> {
    if !change.from.is_null() {
        return Ok(Some(change.from));
    }
    for commit in client.rev_list(change.to)? {
        if client.branches_containing(commit)?.is_empty() {
            continue;
        }
        if commit == change.to {
            return Ok(Some(commit));
        }
        return merge_base(client, commit, change.to);
    }
    Ok(None)
}
