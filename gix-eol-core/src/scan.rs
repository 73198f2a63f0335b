//! Folding a unified-diff byte stream into a line-ending verdict.
//!
//! The scan walks diff output byte by byte, tracks which hunk partition the
//! current line belongs to, and evaluates only line terminator bytes against
//! the active [`EolPolicy`]. Feed chunks with [`Scan::update()`] until it
//! reports [`Status::Settled`] or input runs out, then read
//! [`Scan::verdict()`]. A settled scan ignores all further input, so callers
//! can stop reading and cancel whatever produces the stream the moment the
//! outcome is decided.

/// Line-feed, the terminator every policy accepts.
const LF: u8 = b'\n';
/// Carriage-return, the byte whose placement decides every verdict.
const CR: u8 = b'\r';

/// The rule newly pushed content is held to.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EolPolicy {
    /// Every added line must end in LF alone.
    #[default]
    Strict,
    /// Added CR endings are tolerated when the file already had CR endings
    /// before the change, as witnessed by removed or unchanged lines.
    Inherit,
}

impl EolPolicy {
    /// The policy selected by the `allowInheritedEol` repository setting.
    pub fn from_allow_inherited(allow: bool) -> Self {
        if allow {
            EolPolicy::Inherit
        } else {
            EolPolicy::Strict
        }
    }

    /// Unchanged lines a diff must carry around each hunk for this policy.
    ///
    /// Strict scans look at added lines only. Inherit scans need at least one
    /// line of prior content per hunk to witness the file's existing style.
    pub fn context_lines(&self) -> u32 {
        match self {
            EolPolicy::Strict => 0,
            EolPolicy::Inherit => 1,
        }
    }
}

/// The hunk partition a diff line belongs to.
///
/// Re-derived from the first byte of every line: `+` marks an added line,
/// `-` a removed one, and anything else, including hunk and file headers,
/// counts as context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    /// An unchanged line, or any diff metadata line.
    Context,
    /// A line introduced by the change.
    Added,
    /// A line removed by the change.
    Removed,
}

impl Segment {
    fn classify(first_byte: u8) -> Self {
        match first_byte {
            b'+' => Segment::Added,
            b'-' => Segment::Removed,
            _ => Segment::Context,
        }
    }
}

/// Whether a scan can still change its mind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Further input may still flip the verdict.
    Scanning,
    /// The verdict is final and the rest of the stream is irrelevant.
    Settled,
}

/// Fold state for scanning one diff stream.
///
/// A value scans exactly one diff; construct a fresh one per file. The fold
/// carries the position within the current line, the partition that line
/// belongs to, and the verdict accumulated so far.
#[derive(Debug, Clone)]
pub struct Scan {
    policy: EolPolicy,
    at_line_start: bool,
    segment: Segment,
    acceptable: bool,
    status: Status,
}

impl Scan {
    /// Start scanning a diff under `policy`.
    pub fn new(policy: EolPolicy) -> Self {
        Scan {
            policy,
            at_line_start: true,
            segment: Segment::Context,
            acceptable: true,
            status: Status::Scanning,
        }
    }

    /// Fold the next chunk of diff output into the verdict.
    ///
    /// Returns the status after the chunk. Once [`Status::Settled`] is
    /// reported, this and any later chunk is ignored.
    pub fn update(&mut self, chunk: &[u8]) -> Status {
        if self.status == Status::Settled {
            return Status::Settled;
        }
        for &byte in chunk {
            let terminator = byte == CR || byte == LF;
            if self.at_line_start && !terminator {
                self.segment = Segment::classify(byte);
            }
            if terminator {
                self.evaluate(byte);
                if self.status == Status::Settled {
                    break;
                }
            }
            self.at_line_start = terminator;
        }
        self.status
    }

    /// The verdict folded so far: `true` while nothing violates the policy.
    ///
    /// Final once the scan settles. When the stream ends before that, the
    /// running value is the verdict, which makes an empty diff acceptable.
    pub fn verdict(&self) -> bool {
        self.acceptable
    }

    /// Only terminator bytes reach this; LF never changes a verdict.
    fn evaluate(&mut self, terminator: u8) {
        if terminator != CR {
            return;
        }
        match (self.policy, self.segment) {
            (EolPolicy::Strict, Segment::Added) => {
                self.acceptable = false;
                self.status = Status::Settled;
            }
            (EolPolicy::Strict, _) => {}
            // Prior content carried CR endings: the inherited style wins over
            // any added CR seen earlier or later.
            (EolPolicy::Inherit, Segment::Context | Segment::Removed) => {
                self.acceptable = true;
                self.status = Status::Settled;
            }
            // Tentative: a context or removed CR further on can overturn it.
            (EolPolicy::Inherit, Segment::Added) => {
                self.acceptable = false;
            }
        }
    }
}

/// Scan a complete in-memory diff in one call.
pub fn scan(diff: &[u8], policy: EolPolicy) -> bool {
    let mut state = Scan::new(policy);
    state.update(diff);
    state.verdict()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const ADDED_CRLF: &str = concat!(
        "diff --git a/file.txt b/file.txt\n",
        "index 0000000..1111111 100644\n",
        "--- a/file.txt\n",
        "+++ b/file.txt\n",
        "@@ -2,0 +3 @@\n",
        "+third\r\n",
    );

    const ADDED_LF_REMOVED_CRLF: &str = concat!(
        "diff --git a/file.txt b/file.txt\n",
        "--- a/file.txt\n",
        "+++ b/file.txt\n",
        "@@ -1 +1 @@\n",
        "-old\r\n",
        "+new\n",
    );

    const INHERITED_STYLE: &str = concat!(
        "diff --git a/file.txt b/file.txt\n",
        "--- a/file.txt\n",
        "+++ b/file.txt\n",
        "@@ -2 +2,2 @@\n",
        " second\r\n",
        "+third\r\n",
    );

    const ADDED_CR_BEFORE_CONTEXT_CR: &str = concat!(
        "diff --git a/file.txt b/file.txt\n",
        "--- a/file.txt\n",
        "+++ b/file.txt\n",
        "@@ -1 +1,2 @@\n",
        "+zeroth\r\n",
        " first\r\n",
    );

    const ADDED_CR_WITH_LF_CONTEXT: &str = concat!(
        "diff --git a/file.txt b/file.txt\n",
        "--- a/file.txt\n",
        "+++ b/file.txt\n",
        "@@ -1 +1,2 @@\n",
        " first\n",
        "+second\r\n",
    );

    #[test]
    fn strict_accepts_lf_only_additions() {
        let diff = concat!(
            "diff --git a/file.txt b/file.txt\n",
            "--- a/file.txt\n",
            "+++ b/file.txt\n",
            "@@ -0,0 +1,2 @@\n",
            "+first\n",
            "+second\n",
        );
        assert!(scan(diff.as_bytes(), EolPolicy::Strict));
    }

    #[test]
    fn strict_rejects_added_cr() {
        assert!(!scan(ADDED_CRLF.as_bytes(), EolPolicy::Strict));
    }

    #[test]
    fn strict_settles_on_first_added_cr() {
        let mut state = Scan::new(EolPolicy::Strict);
        assert_eq!(state.update(ADDED_CRLF.as_bytes()), Status::Settled);
        // Later evidence cannot reopen the verdict.
        assert_eq!(state.update(b" harmless\n"), Status::Settled);
        assert!(!state.verdict());
    }

    #[test]
    fn strict_ignores_cr_outside_added_lines() {
        assert!(scan(ADDED_LF_REMOVED_CRLF.as_bytes(), EolPolicy::Strict));
        let context_cr = concat!(
            "--- a/file.txt\n",
            "+++ b/file.txt\n",
            "@@ -1 +1,2 @@\n",
            " first\r\n",
            "+second\n",
        );
        assert!(scan(context_cr.as_bytes(), EolPolicy::Strict));
    }

    #[test]
    fn inherit_accepts_added_cr_after_context_cr() {
        assert!(scan(INHERITED_STYLE.as_bytes(), EolPolicy::Inherit));
    }

    #[test]
    fn inherit_accepts_added_cr_before_context_cr() {
        let mut state = Scan::new(EolPolicy::Inherit);
        assert_eq!(
            state.update(ADDED_CR_BEFORE_CONTEXT_CR.as_bytes()),
            Status::Settled
        );
        assert!(state.verdict());
    }

    #[test]
    fn inherit_accepts_added_cr_after_removed_cr() {
        let diff = concat!(
            "--- a/file.txt\n",
            "+++ b/file.txt\n",
            "@@ -1 +1 @@\n",
            "-first\r\n",
            "+first!\r\n",
        );
        assert!(scan(diff.as_bytes(), EolPolicy::Inherit));
    }

    #[test]
    fn inherit_rejects_added_cr_without_prior_cr() {
        assert!(!scan(ADDED_CR_WITH_LF_CONTEXT.as_bytes(), EolPolicy::Inherit));
    }

    #[test]
    fn inherit_does_not_settle_on_added_cr_alone() {
        let mut state = Scan::new(EolPolicy::Inherit);
        assert_eq!(
            state.update(ADDED_CR_WITH_LF_CONTEXT.as_bytes()),
            Status::Scanning
        );
        assert!(!state.verdict());
    }

    #[test]
    fn empty_diff_is_acceptable() {
        assert!(scan(b"", EolPolicy::Strict));
        assert!(scan(b"", EolPolicy::Inherit));
    }

    #[test]
    fn binary_notice_is_acceptable() {
        let diff = "Binary files a/blob and b/blob differ\n";
        assert!(scan(diff.as_bytes(), EolPolicy::Strict));
        assert!(scan(diff.as_bytes(), EolPolicy::Inherit));
    }

    #[test]
    fn mid_line_cr_counts_as_terminator() {
        // A bare CR splits the line, so an added line containing one is
        // CR-terminated as far as the policy is concerned.
        let diff = concat!(
            "--- a/file.txt\n",
            "+++ b/file.txt\n",
            "@@ -0,0 +1 @@\n",
            "+left\rright\n",
        );
        assert!(!scan(diff.as_bytes(), EolPolicy::Strict));
    }

    #[test]
    fn no_newline_marker_is_context() {
        let diff = concat!(
            "--- a/file.txt\n",
            "+++ b/file.txt\n",
            "@@ -1 +1 @@\n",
            "-first\n",
            "+first!\n",
            "\\ No newline at end of file\n",
        );
        assert!(scan(diff.as_bytes(), EolPolicy::Strict));
    }

    #[test]
    fn verdict_is_stable_across_chunk_boundaries() {
        // Splitting the stream anywhere must not change the outcome.
        for (diff, policy, expected) in [
            (ADDED_CRLF, EolPolicy::Strict, false),
            (INHERITED_STYLE, EolPolicy::Inherit, true),
            (ADDED_CR_BEFORE_CONTEXT_CR, EolPolicy::Inherit, true),
            (ADDED_CR_WITH_LF_CONTEXT, EolPolicy::Inherit, false),
            (ADDED_LF_REMOVED_CRLF, EolPolicy::Strict, true),
        ] {
            let bytes = diff.as_bytes();
            for split in 0..=bytes.len() {
                let mut state = Scan::new(policy);
                state.update(&bytes[..split]);
                state.update(&bytes[split..]);
                assert_eq!(
                    state.verdict(),
                    expected,
                    "split at {split} under {policy:?}"
                );
            }
        }
    }

    #[test]
    fn context_lines_per_policy() {
        assert_eq!(EolPolicy::Strict.context_lines(), 0);
        assert_eq!(EolPolicy::Inherit.context_lines(), 1);
    }

    #[test]
    fn policy_from_setting() {
        assert_eq!(EolPolicy::from_allow_inherited(false), EolPolicy::Strict);
        assert_eq!(EolPolicy::from_allow_inherited(true), EolPolicy::Inherit);
    }
}
