//! Per-repository check settings.

use crate::filter::{ExcludePatterns, ParseError};
use crate::scan::EolPolicy;

/// Everything the checker needs to know about one repository's policy.
#[derive(Debug, Clone, Default)]
pub struct Settings {
    /// The rule newly pushed content is held to.
    pub policy: EolPolicy,
    /// Paths exempt from the check.
    pub exclude: ExcludePatterns,
}

impl Settings {
    /// The configuration default: strict policy, no exclusions.
    pub fn strict() -> Self {
        Settings::default()
    }

    /// Build settings from raw configuration values, validating the pattern
    /// list as a whole so every broken pattern is reported.
    pub fn from_values(
        exclude_files: Option<&str>,
        allow_inherited_eol: bool,
    ) -> Result<Self, ParseError> {
        let exclude = match exclude_files {
            Some(value) => ExcludePatterns::parse(value)?,
            None => ExcludePatterns::default(),
        };
        Ok(Settings {
            policy: EolPolicy::from_allow_inherited(allow_inherited_eol),
            exclude,
        })
    }
}
