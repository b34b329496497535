//! Loop commands built on the interpreter core.
//!
//! Commands receive the interpreter and an [`Evaluator`] for their script
//! bodies; control statuses coming out of a body are absorbed here —
//! `continue` skips to the next iteration, `break` ends the loop with its
//! payload, and `return` propagates unchanged to the enclosing procedure.

mod array_for;
mod foreach;

pub use array_for::ArrayLoop;
pub use foreach::Foreach;

pub use crate::interp::variable::ArrayKeySource;

use crate::errors::KernelError;
use crate::interp::{Control, Evaluator, Interp};

/// A command implemented on top of the core.
pub trait Command {
    /// The script-visible command name, used in diagnostics.
    fn name(&self) -> &str;

    /// Execute with pre-split arguments.
    fn execute(
        &self,
        interp: &mut Interp,
        evaluator: &mut dyn Evaluator,
        args: &[String],
    ) -> Result<Control, KernelError>;
}

/// What a loop should do after one body evaluation.
pub(crate) enum LoopStep {
    /// Proceed to the next iteration.
    Next,
    /// End the loop; the payload is the `break` value.
    Stop(String),
    /// Pass a `return` through to the caller.
    Propagate(Control),
}

/// Absorb one body result the way every loop does.
///
/// Normal results are collected when a collector is supplied (the
/// `lmap`-style variants); `continue` collects nothing.
pub(crate) fn absorb_body(control: Control, collected: Option<&mut Vec<String>>) -> LoopStep {
    match control {
        Control::Normal(value) => {
            if let Some(collected) = collected {
                collected.push(value);
            }
            LoopStep::Next
        }
        Control::Continue => LoopStep::Next,
        Control::Break(payload) => LoopStep::Stop(payload),
        control @ Control::Return(_) => LoopStep::Propagate(control),
    }
}
