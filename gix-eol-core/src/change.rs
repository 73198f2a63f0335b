//! The ref-update and revision-range model the checking hooks operate on.

use bstr::{BStr, BString, ByteSlice};
use gix_hash::ObjectId;

/// One ref update as git reports it to a pre-receive hook.
///
/// Either id may be the all-zero sentinel: an all-zero `from` announces a
/// newly created ref, an all-zero `to` a deletion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefChange {
    /// The previous tip, all-zero when the ref is being created.
    pub from: ObjectId,
    /// The new tip, all-zero when the ref is being deleted.
    pub to: ObjectId,
    /// Fully qualified name of the ref being updated.
    pub name: BString,
}

/// Failure to parse a `<old-oid> <new-oid> <refname>` line.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A field was absent entirely.
    #[error("missing {field} in ref-change line {line:?}")]
    Missing {
        /// Which of the three fields was not present.
        field: &'static str,
        /// The offending input line.
        line: BString,
    },
    /// An object id field did not decode as hex.
    #[error("invalid {field} id in ref-change line: {source}")]
    InvalidId {
        /// Which id field was malformed.
        field: &'static str,
        /// The decoding failure.
        source: gix_hash::decode::Error,
    },
    /// More tokens followed the refname.
    #[error("unexpected trailing tokens in ref-change line {line:?}")]
    Trailing {
        /// The offending input line.
        line: BString,
    },
}

impl RefChange {
    /// A change moving `name` from `from` to `to`.
    pub fn new(from: ObjectId, to: ObjectId, name: impl Into<BString>) -> Self {
        RefChange {
            from,
            to,
            name: name.into(),
        }
    }

    /// Parse one line of the pre-receive stdin protocol,
    /// `<old-oid> <new-oid> <refname>`, fields separated by whitespace.
    pub fn from_line(line: &BStr) -> Result<Self, ParseError> {
        let mut fields = line.fields();
        let from = parse_id(fields.next(), "old", line)?;
        let to = parse_id(fields.next(), "new", line)?;
        let name = fields.next().ok_or_else(|| ParseError::Missing {
            field: "refname",
            line: line.into(),
        })?;
        if fields.next().is_some() {
            return Err(ParseError::Trailing { line: line.into() });
        }
        Ok(RefChange::new(from, to, name))
    }

    /// True when this update cannot introduce new content, that is the tip
    /// did not move or the ref is being deleted.
    pub fn is_noop(&self) -> bool {
        self.from == self.to || self.to.is_null()
    }

    /// True when the ref did not exist before this update.
    pub fn is_creation(&self) -> bool {
        self.from.is_null()
    }

    /// True when the ref is being removed.
    pub fn is_deletion(&self) -> bool {
        self.to.is_null()
    }
}

fn parse_id(
    field: Option<&[u8]>,
    name: &'static str,
    line: &BStr,
) -> Result<ObjectId, ParseError> {
    let hex = field.ok_or_else(|| ParseError::Missing {
        field: name,
        line: line.into(),
    })?;
    ObjectId::from_hex(hex).map_err(|source| ParseError::InvalidId {
        field: name,
        source,
    })
}

/// The revision pair a changed-path or diff query is bounded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeRange {
    /// The known-good base, or `None` to compare against the empty tree.
    pub since: Option<ObjectId>,
    /// The tip whose newly introduced content is under scrutiny.
    pub to: ObjectId,
}

impl ChangeRange {
    /// The range from a resolved base, or the empty tree, up to `to`.
    pub fn new(since: Option<ObjectId>, to: ObjectId) -> Self {
        ChangeRange { since, to }
    }

    /// The range covering everything reachable from `to`.
    pub fn since_empty_tree(to: ObjectId) -> Self {
        ChangeRange { since: None, to }
    }

    /// True when the range cannot contain any change.
    pub fn is_empty(&self) -> bool {
        self.since == Some(self.to)
    }
}
