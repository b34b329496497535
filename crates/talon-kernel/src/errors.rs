//! Error taxonomy for the kernel.
//!
//! Every operation returns a tagged result rather than panicking; messages
//! use the wording scripts see. `Break`/`Continue` are *not* errors — they
//! are [`Control`](crate::interp::Control) values absorbed by the nearest
//! enclosing loop.

use thiserror::Error;

/// Errors produced by the scoping, aliasing, trace, and dispatch core.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KernelError {
    /// A null/invalid frame, name, or table was supplied.
    #[error("invalid {what}")]
    InvalidArgument {
        /// What was invalid, e.g. `"other" call frame`.
        what: String,
    },

    /// Both sides of a link resolve to the same variable.
    #[error("can't upvar from variable to itself")]
    SelfAlias,

    /// The local name already denotes a defined, non-link variable.
    #[error("variable \"{name}\" already exists")]
    AlreadyExists {
        /// The offending variable name.
        name: String,
    },

    /// Following or creating a link would revisit a variable in the chain.
    #[error("variable \"{name}\" has a circular link chain")]
    CycleDetected {
        /// The name the chain was entered through.
        name: String,
    },

    /// The variable exists but does not have the required array shape.
    #[error("\"{name}\" isn't an array")]
    NotAnArray {
        /// The accessed variable name.
        name: String,
    },

    /// A link target's frame or slot no longer exists.
    #[error("can't access \"{name}\": link target no longer exists")]
    BrokenLink {
        /// The alias name the access went through.
        name: String,
    },

    /// A name could not be read/written/unset for an ordinary reason.
    #[error("can't {operation} \"{name}\": {reason}")]
    NoSuchVariable {
        /// The attempted operation (`read`, `set`, `unset`).
        operation: &'static str,
        /// The accessed name, including any element index.
        name: String,
        /// The script-visible reason, e.g. `no such variable`.
        reason: String,
    },

    /// More than one sub-command matched a prefix.
    #[error("{}", bad_sub_command("ambiguous", .kind, .name, .candidates))]
    AmbiguousMatch {
        /// The noun used in the diagnostic, usually `option`.
        kind: &'static str,
        /// The name fragment that was looked up.
        name: String,
        /// The matching candidates, sorted.
        candidates: Vec<String>,
    },

    /// No sub-command matched in strict mode.
    #[error("{}", bad_sub_command("bad", .kind, .name, .candidates))]
    NotFound {
        /// The noun used in the diagnostic, usually `option`.
        kind: &'static str,
        /// The name fragment that was looked up.
        name: String,
        /// The legal alternatives, sorted (may be empty).
        candidates: Vec<String>,
    },

    /// A trace callback failed; the original error is carried verbatim.
    #[error("{0}")]
    TraceFailed(Box<KernelError>),

    /// A collaborator (evaluator, parser, host) failed.
    #[error("{message}\n    ({context})")]
    HostFailure {
        /// Added context, e.g. `"foreach" body line 2`.
        context: String,
        /// The collaborator's own message.
        message: String,
    },
}

impl KernelError {
    /// Wrap an error with added context, preserving the inner message.
    pub fn with_context(self, context: impl Into<String>) -> KernelError {
        KernelError::HostFailure {
            context: context.into(),
            message: self.to_string(),
        }
    }
}

/// Build a `bad option "x": must be a, b, or c` style message.
///
/// With no candidates the `must be` clause is omitted entirely.
fn bad_sub_command(prefix: &str, kind: &str, name: &str, candidates: &[String]) -> String {
    if candidates.is_empty() {
        return format!("{prefix} {kind} \"{name}\"");
    }
    let list = match candidates {
        [one] => one.clone(),
        [a, b] => format!("{a} or {b}"),
        _ => {
            let mut list = candidates[..candidates.len() - 1].join(", ");
            list.push_str(", or ");
            list.push_str(&candidates[candidates.len() - 1]);
            list
        }
    };
    format!("{prefix} {kind} \"{name}\": must be {list}")
}
