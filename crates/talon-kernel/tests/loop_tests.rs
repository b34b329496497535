//! Integration tests for the looping commands.
//!
//! The loops only need an [`Evaluator`] for their bodies, so these tests
//! drive them with small closure-backed evaluators that read and write
//! interpreter variables the way evaluated script text would.

use talon_kernel::{
    ArrayLoop, Command, Control, Evaluator, Foreach, Interp, KernelError, ScriptLocation,
};

/// An evaluator backed by a closure, standing in for the script engine.
struct FnEval<F>(F);

impl<F> Evaluator for FnEval<F>
where
    F: FnMut(&mut Interp, &str) -> Result<Control, KernelError>,
{
    fn eval(
        &mut self,
        interp: &mut Interp,
        script: &str,
        _location: &ScriptLocation,
    ) -> Result<Control, KernelError> {
        (self.0)(interp, script)
    }
}

fn strs(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// foreach / lmap
// ============================================================================

#[test]
fn two_variables_walk_the_list_in_stripes() {
    let mut interp = Interp::new();
    interp.set_var("r", "").unwrap();
    // body: append "$a$b" to r as a list element
    let mut body = FnEval(|interp: &mut Interp, _: &str| {
        let a = interp.get_var("a")?;
        let b = interp.get_var("b")?;
        let r = interp.get_var("r")?;
        let joined = if r.is_empty() {
            format!("{a}{b}")
        } else {
            format!("{r} {a}{b}")
        };
        interp.set_var("r", &joined)?;
        Ok(Control::Normal(String::new()))
    });

    let cmd = Foreach::foreach();
    let result = cmd
        .execute(&mut interp, &mut body, &strs(&["a b", "1 2 3 4", "body"]))
        .unwrap();
    assert_eq!(result, Control::Normal(String::new()));
    assert_eq!(interp.get_var("r").unwrap(), "12 34");
}

#[test]
fn break_ends_the_loop_with_its_payload() {
    let mut interp = Interp::new();
    let mut body = FnEval(|interp: &mut Interp, _: &str| {
        let x = interp.get_var("x")?;
        if x == "3" {
            Ok(Control::Break("stopped at 3".into()))
        } else {
            Ok(Control::Normal(String::new()))
        }
    });

    let cmd = Foreach::foreach();
    let result = cmd
        .execute(&mut interp, &mut body, &strs(&["x", "1 2 3 4 5", "body"]))
        .unwrap();
    assert_eq!(result, Control::Normal("stopped at 3".into()));
    // iteration stopped; the loop variable keeps its last assignment
    assert_eq!(interp.get_var("x").unwrap(), "3");
}

#[test]
fn continue_skips_collection_in_lmap() {
    let mut interp = Interp::new();
    let mut body = FnEval(|interp: &mut Interp, _: &str| {
        let x = interp.get_var("x")?;
        if x.len() > 1 {
            Ok(Control::Continue)
        } else {
            Ok(Control::Normal(x))
        }
    });

    let cmd = Foreach::lmap();
    let result = cmd
        .execute(&mut interp, &mut body, &strs(&["x", "a bb c dd e", "body"]))
        .unwrap();
    assert_eq!(result, Control::Normal("a c e".into()));
}

#[test]
fn return_propagates_through_the_loop() {
    let mut interp = Interp::new();
    let mut body = FnEval(|_: &mut Interp, _: &str| Ok(Control::Return("early".into())));

    let cmd = Foreach::foreach();
    let result = cmd
        .execute(&mut interp, &mut body, &strs(&["x", "1 2 3", "body"]))
        .unwrap();
    assert_eq!(result, Control::Return("early".into()));
    // the loop stopped at the first iteration
    assert_eq!(interp.get_var("x").unwrap(), "1");
}

#[test]
fn body_errors_carry_loop_context() {
    let mut interp = Interp::new();
    let mut body = FnEval(|_: &mut Interp, _: &str| {
        Err(KernelError::InvalidArgument {
            what: "thing".into(),
        })
    });

    let cmd = Foreach::foreach();
    let err = cmd
        .execute(&mut interp, &mut body, &strs(&["x", "1", "body"]))
        .unwrap_err();
    let message = err.to_string();
    assert!(message.starts_with("invalid thing"), "{message}");
    assert!(message.contains("\"foreach\" body"), "{message}");
}

#[test]
fn braced_elements_arrive_unwrapped() {
    let mut interp = Interp::new();
    let mut body = FnEval(|_: &mut Interp, _: &str| Ok(Control::Normal(String::new())));

    let cmd = Foreach::foreach();
    cmd.execute(
        &mut interp,
        &mut body,
        &strs(&["x", "a {b c} d", "body"]),
    )
    .unwrap();
    // three iterations; the braced element was one value
    assert_eq!(interp.get_var("x").unwrap(), "d");
}

// ============================================================================
// array foreach / array for
// ============================================================================

#[test]
fn array_for_sees_a_snapshot_of_the_keys() {
    let mut interp = Interp::new();
    interp.set_var("a(b)", "1").unwrap();
    interp.set_var("a(m)", "2").unwrap();
    interp.set_var("a(z)", "3").unwrap();

    let mut body = FnEval(|interp: &mut Interp, _: &str| {
        let k = interp.get_var("k")?;
        if k == "b" {
            // mutating the array mid-loop must not disturb the walk
            interp.unset_var("a(z)")?;
            interp.set_var("a(new)", "4")?;
        }
        let v = interp.array_element_in(interp.current_frame(), "a", &k)?;
        Ok(Control::Normal(format!("{k}={}", v.unwrap_or_default())))
    });

    let cmd = ArrayLoop::keys_and_values().collecting();
    let result = cmd
        .execute(&mut interp, &mut body, &strs(&["k v", "a", "body"]))
        .unwrap();
    // z was removed after the snapshot, so its iteration is skipped;
    // the key added mid-loop is not visited
    assert_eq!(result, Control::Normal("b=1 m=2".into()));
}

#[test]
fn array_foreach_through_an_alias() {
    let mut interp = Interp::new();
    interp.set_var("a(x)", "1").unwrap();
    interp.set_var("a(y)", "2").unwrap();
    interp.push_frame("proc p");
    interp.upvar(1, "a", "local").unwrap();

    let mut body = FnEval(|interp: &mut Interp, _: &str| {
        Ok(Control::Normal(interp.get_var("k")?))
    });

    let cmd = ArrayLoop::keys().collecting();
    let result = cmd
        .execute(&mut interp, &mut body, &strs(&["k", "local", "body"]))
        .unwrap();
    assert_eq!(result, Control::Normal("x y".into()));
}

#[test]
fn break_in_an_array_loop() {
    let mut interp = Interp::new();
    interp.set_var("a(1)", "one").unwrap();
    interp.set_var("a(2)", "two").unwrap();
    interp.set_var("a(3)", "three").unwrap();

    let mut body = FnEval(|interp: &mut Interp, _: &str| {
        let k = interp.get_var("k")?;
        if k == "2" {
            Ok(Control::Break(String::new()))
        } else {
            Ok(Control::Normal(String::new()))
        }
    });

    let cmd = ArrayLoop::keys();
    cmd.execute(&mut interp, &mut body, &strs(&["k", "a", "body"]))
        .unwrap();
    assert_eq!(interp.get_var("k").unwrap(), "2");
}
