//! Repository-local configuration for the check.
//!
//! Settings live in the repository's own configuration file under the
//! `eolcheck` section:
//!
//! ```text
//! [eolcheck]
//!     allowInheritedEol = true
//!     excludeFiles = vendor/.*,.*\\.bat
//! ```
//!
//! Both keys are optional. A repository without them gets the defaults:
//! strict policy, no exclusions.

use std::path::Path;

use bstr::ByteSlice;
use gix_eol_core::Settings;

use crate::Error;

/// Boolean key selecting the inherit policy instead of the strict one.
pub const ALLOW_INHERITED_EOL: &str = "eolcheck.allowInheritedEol";
/// String key holding the comma-separated exclusion patterns.
pub const EXCLUDE_FILES: &str = "eolcheck.excludeFiles";

/// Load settings from the configuration of the repository at `git_dir`.
///
/// A missing configuration file yields the defaults, a present but invalid
/// one an error: a repository that configured the check badly must not be
/// silently checked against rules its owners did not choose.
pub fn load(git_dir: &Path) -> Result<Settings, Error> {
    let path = git_dir.join("config");
    if !path.is_file() {
        return Ok(Settings::default());
    }
    let config = gix_config::File::from_path_no_includes(path, gix_config::Source::Local)
        .map_err(|err| Error::Config(format!("cannot read repository configuration: {err}")))?;
    from_config(&config)
}

/// Extract settings from an already parsed configuration file.
pub fn from_config(config: &gix_config::File<'_>) -> Result<Settings, Error> {
    let allow_inherited = match config.boolean(ALLOW_INHERITED_EOL) {
        Some(Ok(value)) => value,
        Some(Err(err)) => {
            return Err(Error::Config(format!(
                "invalid boolean value for '{ALLOW_INHERITED_EOL}': {err}"
            )))
        }
        None => false,
    };
    let exclude_files = match config.string(EXCLUDE_FILES) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|err| {
                    Error::Config(format!("invalid UTF-8 in '{EXCLUDE_FILES}': {err}"))
                })?
                .to_owned(),
        ),
        None => None,
    };
    Ok(Settings::from_values(
        exclude_files.as_deref(),
        allow_inherited,
    )?)
}
