//! `foreach` and `lmap`: parallel list iteration.
//!
//! Arguments are one or more varlist/list pairs followed by a body:
//!
//! ```text
//! foreach {a b} {1 2 3 4} x {p q} { ... }
//! ```
//!
//! Each iteration consumes one stripe of values from every list; the
//! iteration count is the maximum any pair needs, and exhausted lists
//! supply empty strings. `lmap` is the collecting variant: the body's
//! normal results become the loop's result list.

use crate::commands::{absorb_body, Command, LoopStep};
use crate::errors::KernelError;
use crate::interp::{Control, Evaluator, Interp, ScriptLocation};
use crate::syntax::{join_list, split_list};

/// The `foreach`/`lmap` command.
pub struct Foreach {
    collect: bool,
}

impl Foreach {
    /// The plain variant: the loop's result is the `break` payload, or
    /// empty.
    pub fn foreach() -> Self {
        Foreach { collect: false }
    }

    /// The collecting (`lmap`) variant.
    pub fn lmap() -> Self {
        Foreach { collect: true }
    }
}

struct Pair {
    vars: Vec<String>,
    items: Vec<String>,
}

impl Command for Foreach {
    fn name(&self) -> &str {
        if self.collect {
            "lmap"
        } else {
            "foreach"
        }
    }

    fn execute(
        &self,
        interp: &mut Interp,
        evaluator: &mut dyn Evaluator,
        args: &[String],
    ) -> Result<Control, KernelError> {
        if args.len() < 3 || args.len() % 2 == 0 {
            return Err(KernelError::InvalidArgument {
                what: format!(
                    "\"{}\" arguments: expected varList list ?varList list ...? body",
                    self.name()
                ),
            });
        }
        let body = &args[args.len() - 1];

        let mut pairs: Vec<Pair> = Vec::new();
        let mut iterations = 0usize;
        for chunk in args[..args.len() - 1].chunks_exact(2) {
            let vars = split_list(&chunk[0])?;
            if vars.is_empty() {
                return Err(KernelError::InvalidArgument {
                    what: format!("\"{}\" varlist (empty)", self.name()),
                });
            }
            let items = split_list(&chunk[1])?;
            iterations = iterations.max(items.len().div_ceil(vars.len()));
            pairs.push(Pair { vars, items });
        }

        let location = interp
            .current_location()
            .cloned()
            .unwrap_or_else(ScriptLocation::unknown);
        let mut collected: Vec<String> = Vec::new();
        let mut break_payload = String::new();

        'outer: for iteration in 0..iterations {
            for pair in &pairs {
                let width = pair.vars.len();
                for (offset, var) in pair.vars.iter().enumerate() {
                    let value = pair
                        .items
                        .get(iteration * width + offset)
                        .map(String::as_str)
                        .unwrap_or("");
                    interp.set_var(var, value)?;
                }
            }
            let control = evaluator.eval(interp, body, &location).map_err(|err| {
                err.with_context(format!(
                    "\"{}\" body line {}",
                    self.name(),
                    location.start_line
                ))
            })?;
            let step = if self.collect {
                absorb_body(control, Some(&mut collected))
            } else {
                absorb_body(control, None)
            };
            match step {
                LoopStep::Next => {}
                LoopStep::Stop(payload) => {
                    break_payload = payload;
                    break 'outer;
                }
                LoopStep::Propagate(control) => return Ok(control),
            }
        }

        if self.collect {
            Ok(Control::Normal(join_list(&collected)))
        } else {
            Ok(Control::Normal(break_payload))
        }
    }
}
