//! Script control flow and the evaluator seam.
//!
//! Every body evaluation produces a [`Control`]: a normal completion, or
//! one of the loop-control statuses. `Break` and `Continue` are not errors;
//! the nearest enclosing loop absorbs them. Genuine failures travel as
//! `Err(KernelError)` alongside.
//!
//! Command execution needs to evaluate script bodies, which is the job of
//! a higher layer. The [`Evaluator`] trait is that seam; for standalone
//! use of the core, [`NoOpEvaluator`] refuses every evaluation.

use crate::errors::KernelError;
use crate::interp::{Interp, ScriptLocation};

/// The status carried out of one script-body evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Control {
    /// Normal completion with a result value.
    Normal(String),
    /// A `break`, carrying the payload that becomes the loop's result.
    Break(String),
    /// A `continue`; the loop proceeds with its next iteration.
    Continue,
    /// A `return`, propagated through loops to the enclosing procedure.
    Return(String),
}

impl Control {
    /// The carried value, empty for `Continue`.
    pub fn value(&self) -> &str {
        match self {
            Control::Normal(v) | Control::Break(v) | Control::Return(v) => v,
            Control::Continue => "",
        }
    }

    /// True for `Normal` completion.
    pub fn is_normal(&self) -> bool {
        matches!(self, Control::Normal(_))
    }
}

/// Evaluates script text on behalf of the core.
///
/// Implemented by the engine layer. The interpreter state is passed back
/// in so evaluated bodies can read and write variables through the same
/// frames the calling command sees.
pub trait Evaluator {
    /// Evaluate a script body at the given location.
    fn eval(
        &mut self,
        interp: &mut Interp,
        script: &str,
        location: &ScriptLocation,
    ) -> Result<Control, KernelError>;
}

/// An evaluator that refuses every script.
///
/// Useful for exercising the core without an engine attached.
pub struct NoOpEvaluator;

impl Evaluator for NoOpEvaluator {
    fn eval(
        &mut self,
        _interp: &mut Interp,
        _script: &str,
        _location: &ScriptLocation,
    ) -> Result<Control, KernelError> {
        Err(KernelError::HostFailure {
            context: "script evaluation".into(),
            message: "no evaluator available".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_of_normal_and_break() {
        assert_eq!(Control::Normal("ok".into()).value(), "ok");
        assert_eq!(Control::Break("payload".into()).value(), "payload");
        assert_eq!(Control::Continue.value(), "");
    }

    #[test]
    fn noop_evaluator_refuses() {
        let mut interp = Interp::new();
        let mut ev = NoOpEvaluator;
        let loc = ScriptLocation::unknown();
        assert!(ev.eval(&mut interp, "set x 1", &loc).is_err());
    }
}
