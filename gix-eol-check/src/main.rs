//! Command-line front end for the line-ending policy check.
//!
//! Installed as a `pre-receive` hook it reads ref updates from stdin. The
//! other subcommands vet an explicit revision range: `check-range` with push
//! semantics, `merge-check` and `pr-create` with pull-request semantics, for
//! hosting integrations and CI jobs that invoke the check out of band. Exit
//! code 0 accepts, 1 rejects with an explanation on stderr, 2 reports that
//! the check itself failed.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use gix_eol_check::client::{GitClient, GitClientOptions};
use gix_eol_check::hooks::{merge_check, pr_create, pre_receive, Decision};
use gix_eol_check::{config, Error, RangeEolChecker};
use gix_eol_core::{ChangeRange, EolPolicy, ExcludePatterns, Settings};
use gix_hash::ObjectId;

#[derive(Debug, Parser)]
#[command(
    name = "gix-eol-check",
    version,
    about = "Enforce a line-ending policy on content entering a git repository"
)]
struct Cli {
    /// Path to the repository's git directory.
    ///
    /// Defaults to $GIT_DIR, which git sets for hooks, and then to the
    /// working directory.
    #[arg(long, global = true)]
    git_dir: Option<PathBuf>,

    /// Per-git-process timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,

    /// Enforce the strict policy regardless of repository configuration.
    #[arg(long, global = true, conflicts_with = "allow_inherited")]
    strict: bool,

    /// Tolerate CR endings in files that already had them, regardless of
    /// repository configuration.
    #[arg(long, global = true)]
    allow_inherited: bool,

    /// Comma-separated exclusion patterns, overriding repository
    /// configuration.
    #[arg(long, global = true, value_name = "PATTERNS")]
    exclude: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Read `<old-oid> <new-oid> <refname>` lines from stdin and vet every
    /// update, the way git invokes a pre-receive hook.
    PreReceive,
    /// Vet one revision range with push semantics.
    CheckRange {
        /// The known-good base revision; omit to compare against the empty
        /// tree.
        #[arg(long, value_name = "REVISION")]
        since: Option<String>,
        /// The tip whose new content is vetted.
        #[arg(long, value_name = "REVISION")]
        to: String,
    },
    /// Vet the changes a pull request would merge, from the target branch
    /// tip to the source branch tip.
    MergeCheck {
        /// Current tip of the branch the pull request merges into.
        #[arg(long, value_name = "REVISION")]
        target: String,
        /// Current tip of the branch the pull request comes from.
        #[arg(long, value_name = "REVISION")]
        source: String,
    },
    /// Vet the commits a new pull request proposes, bounded below by the
    /// merge base of the two tips.
    PrCreate {
        /// Current tip of the branch the pull request merges into.
        #[arg(long, value_name = "REVISION")]
        target: String,
        /// Current tip of the branch the pull request comes from.
        #[arg(long, value_name = "REVISION")]
        source: String,
        /// The `objects` directory of the source repository, for pull
        /// requests proposed from a fork.
        #[arg(long, value_name = "DIR")]
        alternate_objects: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(&cli) {
        Ok(decision) if decision.allowed => ExitCode::SUCCESS,
        Ok(decision) => {
            eprintln!("{}", decision.summary);
            eprint!("{}", decision.detail);
            if !decision.detail.ends_with('\n') {
                eprintln!();
            }
            ExitCode::from(1)
        }
        Err(err) => {
            eprintln!("gix-eol-check: {err}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<Decision, Error> {
    let git_dir = resolve_git_dir(cli);
    let settings = effective_settings(cli, &git_dir)?;
    let alternate_objects = match &cli.command {
        Command::PrCreate {
            alternate_objects, ..
        } => alternate_objects.clone(),
        _ => None,
    };
    let options = GitClientOptions {
        timeout: Duration::from_secs(cli.timeout),
        alternate_objects,
        ..GitClientOptions::default()
    };
    let client = GitClient::with_options(git_dir, options);
    match &cli.command {
        Command::PreReceive => {
            let stdin = std::io::stdin();
            let changes = pre_receive::parse_ref_changes(stdin.lock())?;
            pre_receive::evaluate(&client, &settings, &changes)
        }
        Command::CheckRange { since, to } => {
            let to = parse_revision(to)?;
            let since = since.as_deref().map(parse_revision).transpose()?;
            let checker = RangeEolChecker::new(&client, &settings);
            let violating = checker.check_range(ChangeRange::new(since, to))?;
            Ok(if violating.is_empty() {
                Decision::accepted()
            } else {
                Decision::rejected_push(violating)
            })
        }
        Command::MergeCheck { target, source } => {
            let target = parse_revision(target)?;
            let source = parse_revision(source)?;
            merge_check::evaluate(&client, &settings, target, source)
        }
        Command::PrCreate { target, source, .. } => {
            let target = parse_revision(target)?;
            let source = parse_revision(source)?;
            pr_create::evaluate(&client, &settings, target, source)
        }
    }
}

fn resolve_git_dir(cli: &Cli) -> PathBuf {
    cli.git_dir
        .clone()
        .or_else(|| std::env::var_os("GIT_DIR").map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn effective_settings(cli: &Cli, git_dir: &Path) -> Result<Settings, Error> {
    let mut settings = config::load(git_dir)?;
    if cli.strict {
        settings.policy = EolPolicy::Strict;
    }
    if cli.allow_inherited {
        settings.policy = EolPolicy::Inherit;
    }
    if let Some(patterns) = &cli.exclude {
        settings.exclude = ExcludePatterns::parse(patterns)?;
    }
    Ok(settings)
}

fn parse_revision(hex: &str) -> Result<ObjectId, Error> {
    ObjectId::from_hex(hex.as_bytes())
        .map_err(|err| Error::Protocol(format!("invalid revision '{hex}': {err}")))
}
