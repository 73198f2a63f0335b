//! The push-time adapter.
//!
//! Reads the `<old-oid> <new-oid> <refname>` lines git feeds a pre-receive
//! hook, vets every update and folds all violating paths into one decision.
//! A single bad path anywhere rejects the whole push.

use std::io::BufRead;

use bstr::io::BufReadExt;
use bstr::ByteSlice;
use gix_eol_core::{RefChange, Settings};

use crate::check::RangeEolChecker;
use crate::client::VcsClient;
use crate::hooks::Decision;
use crate::Error;

/// Parse the ref-change lines git writes to a pre-receive hook's stdin.
///
/// Blank lines are skipped. A malformed line is a protocol error; rejecting
/// the push beats guessing at what should have been checked.
pub fn parse_ref_changes(input: impl BufRead) -> Result<Vec<RefChange>, Error> {
    let mut changes = Vec::new();
    for line in input.byte_lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let change = RefChange::from_line(line.as_bstr())
            .map_err(|err| Error::Protocol(err.to_string()))?;
        changes.push(change);
    }
    Ok(changes)
}

/// Vet every update of one push.
pub fn evaluate<C: VcsClient>(
    client: &C,
    settings: &Settings,
    changes: &[RefChange],
) -> Result<Decision, Error> {
    let checker = RangeEolChecker::new(client, settings);
    let violating = checker.check_all(changes)?;
    Ok(if violating.is_empty() {
        Decision::accepted()
    } else {
        Decision::rejected_push(violating)
    })
}
