//! talon-kernel: the scoping core of the talon scripting language.
//!
//! This crate provides:
//!
//! - **Interp**: Call frames, namespaces, and the variable tables they own
//! - **Links**: Variable aliases (`upvar`-style) redirecting across frames
//! - **Traces**: Ordered interception callbacks around variable reads,
//!   writes, unsets, and resets, with cancel and value substitution
//! - **Dispatch**: Sub-command resolution for ensembles by exact or
//!   longest-unambiguous-prefix match
//! - **Commands**: The looping primitives (`foreach`/`lmap`, `array
//!   foreach`/`array for`) built on the primitives above
//! - **Syntax**: The list and variable-name splitting the parser layer
//!   normally supplies
//!
//! The lexer/parser for full script text, the host reflection bridge, and
//! host I/O live in other crates; this core treats values as opaque strings
//! and talks to the script evaluator through the [`Evaluator`] trait.

pub mod commands;
pub mod dispatch;
pub mod errors;
pub mod interp;
pub mod syntax;

pub use commands::{ArrayKeySource, ArrayLoop, Command, Foreach};
pub use dispatch::{Ensemble, EnsembleFilter, Resolved};
pub use errors::KernelError;
pub use interp::{
    Breakpoint, Control, Evaluator, FrameId, Interp, NoOpEvaluator, ScriptLocation, SharedInterp,
    Trace, TraceFlow, TraceInfo, VarFlags, VarId,
};
