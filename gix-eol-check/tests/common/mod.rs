//! Helpers for building real repositories to test against.
#![allow(dead_code)] // not every test binary uses every helper

use std::path::Path;
use std::process::Command;

use gix_hash::ObjectId;

/// Run one git command in `dir`, panicking on failure.
pub fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .current_dir(dir)
        .env("GIT_AUTHOR_NAME", "Test Author")
        .env("GIT_AUTHOR_EMAIL", "author@example.com")
        .env("GIT_COMMITTER_NAME", "Test Author")
        .env("GIT_COMMITTER_EMAIL", "author@example.com")
        .args(args)
        .output()
        .expect("git is installed");
    assert!(
        output.status.success(),
        "git {args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Initialize a repository with a stable default branch name and no
/// line-ending conversion on checkout.
pub fn init_repo(dir: &Path) {
    git(dir, &["init", "-q"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(dir, &["config", "core.autocrlf", "false"]);
}

/// Write `bytes` to `name`, commit it and return the new head id.
pub fn commit_file(dir: &Path, name: &str, bytes: &[u8], message: &str) -> ObjectId {
    std::fs::write(dir.join(name), bytes).expect("writes file");
    git(dir, &["add", "--", name]);
    git(dir, &["commit", "-q", "-m", message]);
    head(dir)
}

/// The commit id HEAD points at.
pub fn head(dir: &Path) -> ObjectId {
    ObjectId::from_hex(git(dir, &["rev-parse", "HEAD"]).as_bytes()).expect("valid id")
}
