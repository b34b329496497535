//! `array foreach` and `array for`: iteration over array keys.
//!
//! ```text
//! array foreach k a { ... }        ;# keys only
//! array for {k v} a { ... }        ;# key/value pairs
//! ```
//!
//! The key set is snapshotted before the first iteration, so a body that
//! adds or removes elements does not disturb the walk; a key whose element
//! vanished mid-loop is skipped in the key/value variant. Registered
//! pseudo-array sources (environment-style arrays) supply keys and values
//! the same way real element storage does.

use crate::commands::{absorb_body, Command, LoopStep};
use crate::errors::KernelError;
use crate::interp::{Control, Evaluator, Interp, ScriptLocation};
use crate::syntax::{join_list, split_list};

/// The `array foreach`/`array for` command.
pub struct ArrayLoop {
    with_values: bool,
    collect: bool,
}

impl ArrayLoop {
    /// Keys-only iteration (`array foreach`).
    pub fn keys() -> Self {
        ArrayLoop {
            with_values: false,
            collect: false,
        }
    }

    /// Key/value iteration (`array for`).
    pub fn keys_and_values() -> Self {
        ArrayLoop {
            with_values: true,
            collect: false,
        }
    }

    /// The collecting variant of either shape.
    pub fn collecting(mut self) -> Self {
        self.collect = true;
        self
    }
}

impl Command for ArrayLoop {
    fn name(&self) -> &str {
        if self.with_values {
            "array for"
        } else {
            "array foreach"
        }
    }

    fn execute(
        &self,
        interp: &mut Interp,
        evaluator: &mut dyn Evaluator,
        args: &[String],
    ) -> Result<Control, KernelError> {
        let [varlist, array_name, body] = args else {
            return Err(KernelError::InvalidArgument {
                what: format!(
                    "\"{}\" arguments: expected varList arrayName body",
                    self.name()
                ),
            });
        };

        let vars = split_list(varlist)?;
        let expected = if self.with_values { 2 } else { 1 };
        if vars.len() != expected {
            return Err(KernelError::InvalidArgument {
                what: format!(
                    "\"{}\" varlist: expected {} variable name{}",
                    self.name(),
                    expected,
                    if expected == 1 { "" } else { "s" }
                ),
            });
        }

        let frame = interp.current_frame();
        let keys = interp.array_keys_in(frame, array_name)?;

        let location = interp
            .current_location()
            .cloned()
            .unwrap_or_else(ScriptLocation::unknown);
        let mut collected: Vec<String> = Vec::new();
        let mut break_payload = String::new();

        for key in keys {
            if self.with_values {
                let Some(value) = interp.array_element_in(frame, array_name, &key)? else {
                    continue;
                };
                interp.set_var(&vars[0], &key)?;
                interp.set_var(&vars[1], &value)?;
            } else {
                interp.set_var(&vars[0], &key)?;
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
                    break;
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
