//! Exclusion of configured paths from a change set.
//!
//! Repositories opt paths out of the check with a comma-separated list of
//! regular expressions. A pattern excludes a path only when it matches the
//! whole path, so `ex.*` spares `excluded.txt` but not `src/excluded.txt`.
//! Paths are matched as raw bytes, exactly as git reports them.

use std::collections::BTreeSet;

use bstr::{BStr, BString, ByteSlice};
use regex::bytes::Regex;

/// Separator between patterns in the configuration value.
pub const PATTERN_SEPARATOR: char = ',';

/// A compiled set of path exclusion patterns.
#[derive(Debug, Clone, Default)]
pub struct ExcludePatterns {
    patterns: Vec<Regex>,
}

/// One unparsable pattern from the configuration value.
#[derive(Debug, thiserror::Error)]
#[error("pattern {pattern:?} is invalid: {source}")]
pub struct PatternError {
    /// The pattern as configured.
    pub pattern: String,
    source: regex::Error,
}

/// Failure to compile the configured pattern list.
///
/// Carries every broken pattern rather than the first one found, so a
/// settings screen can report them all in one round.
#[derive(Debug, thiserror::Error)]
#[error("wrong exclude pattern value: {}", summarize(.patterns))]
pub struct ParseError {
    /// Each broken pattern with the error its compilation produced.
    pub patterns: Vec<PatternError>,
}

fn summarize(errors: &[PatternError]) -> String {
    let mut out = String::new();
    for (index, error) in errors.iter().enumerate() {
        if index > 0 {
            out.push_str("; ");
        }
        out.push_str(&error.to_string());
    }
    out
}

impl ExcludePatterns {
    /// Compile a comma-separated pattern list.
    ///
    /// An empty value yields an empty set, as do empty list entries. Each
    /// pattern is validated on its own and all failures are reported.
    pub fn parse(value: &str) -> Result<Self, ParseError> {
        let mut patterns = Vec::new();
        let mut broken = Vec::new();
        for raw in value.split(PATTERN_SEPARATOR).filter(|p| !p.is_empty()) {
            // Validate the pattern as configured so errors refer to it
            // verbatim, then anchor it for whole-path matching.
            match Regex::new(raw).and_then(|_| Regex::new(&format!("^(?:{raw})$"))) {
                Ok(anchored) => patterns.push(anchored),
                Err(source) => broken.push(PatternError {
                    pattern: raw.to_owned(),
                    source,
                }),
            }
        }
        if broken.is_empty() {
            Ok(ExcludePatterns { patterns })
        } else {
            Err(ParseError { patterns: broken })
        }
    }

    /// True when no pattern is configured.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Number of compiled patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// True when any pattern matches `path` in full.
    pub fn is_excluded(&self, path: &BStr) -> bool {
        self.patterns.iter().any(|pattern| pattern.is_match(path))
    }

    /// Drop every excluded path from `paths`.
    ///
    /// With no patterns configured the set is returned untouched.
    pub fn filter(&self, mut paths: BTreeSet<BString>) -> BTreeSet<BString> {
        if self.patterns.is_empty() {
            return paths;
        }
        paths.retain(|path| !self.is_excluded(path.as_bstr()));
        paths
    }
}
