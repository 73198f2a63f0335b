//! gix-eol-core: line-ending policy primitives for git server-side checks.
//!
//! This crate holds the pure, I/O-free half of the check: the model of a ref
//! update as a pre-receive hook sees it, the scan that folds a unified-diff
//! byte stream into an accept/reject verdict, the path exclusion filter, and
//! the per-repository settings those pieces are configured with.
//!
//! Process orchestration, the actual `git` invocations, and the hook adapters
//! live in `gix-eol-check`, which drives these types.
#![deny(missing_docs, rust_2018_idioms)]
#![forbid(unsafe_code)]

pub mod change;
pub mod filter;
pub mod scan;
pub mod settings;

pub use change::{ChangeRange, RefChange};
pub use filter::ExcludePatterns;
pub use scan::{scan, EolPolicy, Scan};
pub use settings::Settings;
