//! Policy adapters for the three integration points and their shared
//! decision type.
//!
//! Each adapter translates one host event, a push, a pre-merge vet or a pull
//! request being opened, into checker calls and folds the violating paths
//! into an accept/reject decision carrying the user-facing explanation.

pub mod merge_check;
pub mod pr_create;
pub mod pre_receive;

use std::collections::BTreeSet;

use bstr::BString;

/// Where users can read up on line-ending configuration.
const EOL_HELP_URL: &str =
    "http://git-scm.com/book/en/v2/Customizing-Git-Git-Configuration#Formatting-and-Whitespace";

/// The outcome of one policy adapter run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    /// Whether the event may proceed.
    pub allowed: bool,
    /// Short reason, empty when allowed.
    pub summary: String,
    /// Full user-facing explanation listing every violating path, empty when
    /// allowed.
    pub detail: String,
    /// The violating paths themselves, in path order.
    pub violating_paths: BTreeSet<BString>,
}

impl Decision {
    /// Let the event proceed.
    pub fn accepted() -> Self {
        Decision {
            allowed: true,
            summary: String::new(),
            detail: String::new(),
            violating_paths: BTreeSet::new(),
        }
    }

    /// Reject a push, listing `violating` line by line for hook output.
    pub fn rejected_push(violating: BTreeSet<BString>) -> Self {
        let mut detail = String::from("The following files have wrong EOL-style:\n");
        for path in &violating {
            detail.push_str("  ");
            detail.push_str(&path.to_string());
            detail.push('\n');
        }
        detail.push_str("Please, take a look at ");
        detail.push_str(EOL_HELP_URL);
        detail.push_str(" for more information\n");
        Decision {
            allowed: false,
            summary: "Wrong EOL found".to_owned(),
            detail,
            violating_paths: violating,
        }
    }

    /// Reject a pull-request event, listing `violating` inline.
    pub fn rejected_pull_request(violating: BTreeSet<BString>) -> Self {
        let joined = violating
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        Decision {
            allowed: false,
            summary: "Wrong EOL-style used in the pull request".to_owned(),
            detail: format!(
                "End-of-line style must be LF (Linux-style) on committing changes to Git: {joined}"
            ),
            violating_paths: violating,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn violating(paths: &[&str]) -> BTreeSet<BString> {
        paths.iter().map(|path| BString::from(*path)).collect()
    }

    #[test]
    fn accepted_is_empty() {
        let decision = Decision::accepted();
        assert!(decision.allowed);
        assert!(decision.summary.is_empty());
        assert!(decision.detail.is_empty());
        assert!(decision.violating_paths.is_empty());
    }

    #[test]
    fn push_rejection_message() {
        let decision = Decision::rejected_push(violating(&["b.txt", "a.txt"]));
        assert!(!decision.allowed);
        assert_eq!(decision.summary, "Wrong EOL found");
        assert_eq!(
            decision.detail,
            concat!(
                "The following files have wrong EOL-style:\n",
                "  a.txt\n",
                "  b.txt\n",
                "Please, take a look at http://git-scm.com/book/en/v2/",
                "Customizing-Git-Git-Configuration#Formatting-and-Whitespace ",
                "for more information\n",
            )
        );
    }

    #[test]
    fn pull_request_rejection_message() {
        let decision = Decision::rejected_pull_request(violating(&["b.txt", "a.txt"]));
        assert!(!decision.allowed);
        assert_eq!(decision.summary, "Wrong EOL-style used in the pull request");
        assert_eq!(
            decision.detail,
            "End-of-line style must be LF (Linux-style) on committing changes to Git: a.txt, b.txt"
        );
    }
}
