//! The interpreter core: frames, variables, links, traces, control flow.
//!
//! Submodules split along the data model:
//!
//! - [`frame`] — call frames, namespaces, generational frame handles
//! - [`variable`] — variables, flags, the per-frame slot table
//! - [`link`] — `upvar`/`global` aliasing across frames
//! - [`trace`] — lifecycle interception callbacks
//! - [`control`] — loop/return statuses and the evaluator seam
//! - [`location`] — script origin records for diagnostics
//! - [`core`] — the [`Interp`] itself and the variable operations
//! - [`shared`] — the cross-thread embedding wrapper

pub mod control;
pub mod core;
pub mod frame;
pub mod link;
pub mod location;
pub mod shared;
pub mod trace;
pub mod variable;

pub use self::control::{Control, Evaluator, NoOpEvaluator};
pub use self::core::Interp;
pub use self::frame::{CallFrame, FrameId, Namespace, NamespaceId};
pub use self::location::ScriptLocation;
pub use self::shared::SharedInterp;
pub use self::trace::{Breakpoint, Trace, TraceFlow, TraceInfo};
pub use self::variable::{ArrayKeySource, Link, VarFlags, VarId, VarTable, Variable};
