//! Integration tests for variable links across frames and namespaces.
//!
//! These cover the `upvar`/`global` surface end to end: redirected reads
//! and writes, unset-through-alias, namespace frame indirection, and the
//! deterministic breakage of links whose targets are torn down.

use talon_kernel::{Interp, KernelError};

// ============================================================================
// Basic aliasing
// ============================================================================

#[test]
fn upvar_several_levels_up() {
    let mut interp = Interp::new();
    interp.set_var("x", "global").unwrap();
    interp.push_frame("a");
    interp.push_frame("b");
    interp.upvar(2, "x", "deep").unwrap();
    assert_eq!(interp.get_var("deep").unwrap(), "global");
    interp.set_var("deep", "from b").unwrap();
    interp.pop_frame().unwrap();
    interp.pop_frame().unwrap();
    assert_eq!(interp.get_var("x").unwrap(), "from b");
}

#[test]
fn upvar_to_a_missing_target_materializes_it_on_write() {
    let mut interp = Interp::new();
    interp.push_frame("proc p");
    interp.upvar(1, "fresh", "local").unwrap();
    // the target exists only as a tombstone until the first write
    assert!(interp.get_var("local").is_err());
    interp.set_var("local", "born").unwrap();
    interp.pop_frame().unwrap();
    assert_eq!(interp.get_var("fresh").unwrap(), "born");
}

#[test]
fn global_link_from_a_nested_frame() {
    let mut interp = Interp::new();
    interp.set_var("counter", "10").unwrap();
    interp.push_frame("proc p");
    interp.global_link("counter").unwrap();
    interp.set_var("counter", "11").unwrap();
    interp.pop_frame().unwrap();
    assert_eq!(interp.get_var("counter").unwrap(), "11");
}

#[test]
fn unset_through_an_alias_unsets_the_target() {
    let mut interp = Interp::new();
    interp.set_var("x", "1").unwrap();
    interp.push_frame("proc p");
    interp.upvar(1, "x", "local").unwrap();
    interp.unset_var("local").unwrap();
    interp.pop_frame().unwrap();
    assert!(!interp.var_defined("x"));
}

#[test]
fn alias_to_an_array_element_is_scalar_shaped() {
    let mut interp = Interp::new();
    interp.set_var("a(k)", "v").unwrap();
    interp.push_frame("proc p");
    interp.upvar(1, "a(k)", "e").unwrap();
    // the alias reads and writes like a scalar
    assert_eq!(interp.get_var("e").unwrap(), "v");
    interp.set_var("e", "v2").unwrap();
    // but an element access through it is rejected
    assert!(interp.get_var("e(nested)").is_err());
    interp.pop_frame().unwrap();
    assert_eq!(interp.get_var("a(k)").unwrap(), "v2");
}

// ============================================================================
// Namespace indirection
// ============================================================================

#[test]
fn use_namespace_frames_link_against_the_namespace_frame() {
    let mut interp = Interp::new();
    let ns = interp.create_namespace("cfg");
    let ns_frame = interp.namespace(ns).unwrap().variable_frame;
    interp.set_var_in(ns_frame, "limit", "100").unwrap();

    // a frame executing inside the namespace sees the namespace variables
    let frame = interp.push_frame("proc cfg::get");
    interp.associate_namespace(frame, ns, true).unwrap();
    assert_eq!(interp.get_var("limit").unwrap(), "100");

    // linking from an unrelated frame reaches the same storage
    let global = interp.global_frame();
    interp
        .link_variable(global, "cfg_limit", ns_frame, "limit")
        .unwrap();
    interp.pop_frame().unwrap();
    assert_eq!(interp.get_var("cfg_limit").unwrap(), "100");
}

#[test]
fn self_alias_through_namespace_indirection_is_caught() {
    let mut interp = Interp::new();
    let global_ns = interp.global_namespace();
    let frame = interp.push_frame("proc p");
    interp.associate_namespace(frame, global_ns, true).unwrap();
    // both sides resolve to the global frame and the same name
    let err = interp
        .link_variable(frame, "x", interp.global_frame(), "x")
        .unwrap_err();
    assert_eq!(err, KernelError::SelfAlias);
}

// ============================================================================
// Teardown and breakage
// ============================================================================

#[test]
fn alias_outliving_its_target_breaks_cleanly() {
    let mut interp = Interp::new();
    let global = interp.global_frame();
    let inner = interp.push_frame("proc p");
    interp.set_var("v", "transient").unwrap();
    interp.link_variable(global, "alias", inner, "v").unwrap();
    assert_eq!(interp.get_var_in(global, "alias").unwrap(), "transient");

    interp.pop_frame().unwrap();
    let err = interp.get_var("alias").unwrap_err();
    assert!(matches!(err, KernelError::BrokenLink { .. }));
    // writes through the broken alias fail the same way
    assert!(matches!(
        interp.set_var("alias", "x").unwrap_err(),
        KernelError::BrokenLink { .. }
    ));
}

#[test]
fn slot_reuse_does_not_resurrect_a_broken_alias() {
    let mut interp = Interp::new();
    let global = interp.global_frame();
    interp.set_var("victim", "old").unwrap();
    interp.link_variable(global, "alias", global, "victim").unwrap();
    interp.unset_var("victim").unwrap();

    // a new variable may land in the recycled slot; the stale generation
    // on the link still refuses to resolve
    interp.set_var("squatter", "new").unwrap();
    assert!(matches!(
        interp.get_var("alias").unwrap_err(),
        KernelError::BrokenLink { .. }
    ));
}

#[test]
fn unlink_restores_ordinary_storage() {
    let mut interp = Interp::new();
    interp.set_var("x", "global").unwrap();
    let frame = interp.push_frame("proc p");
    interp.upvar(1, "x", "local").unwrap();
    interp.set_var("local", "through link").unwrap();

    assert!(interp.unlink_variable(frame, "local").unwrap());
    // the name is undefined again, exactly as before the link
    assert!(interp.get_var("local").is_err());
    interp.set_var("local", "own storage").unwrap();
    assert_eq!(interp.get_var("local").unwrap(), "own storage");
    interp.pop_frame().unwrap();
    // the old target kept the value written through the link
    assert_eq!(interp.get_var("x").unwrap(), "through link");

    // unlinking a non-link is a no-op report
    let global = interp.global_frame();
    assert!(!interp.unlink_variable(global, "x").unwrap());
}

#[test]
fn retargeting_an_existing_link_is_allowed() {
    let mut interp = Interp::new();
    let global = interp.global_frame();
    interp.set_var("a", "1").unwrap();
    interp.set_var("b", "2").unwrap();
    interp.link_variable(global, "l", global, "a").unwrap();
    assert_eq!(interp.get_var("l").unwrap(), "1");
    interp.link_variable(global, "l", global, "b").unwrap();
    assert_eq!(interp.get_var("l").unwrap(), "2");
    // the old target is untouched
    assert_eq!(interp.get_var("a").unwrap(), "1");
}
