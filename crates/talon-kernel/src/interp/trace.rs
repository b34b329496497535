//! Variable traces: ordered interception callbacks around lifecycle events.
//!
//! Traces fire before a variable is read, written, unset, or reset. A
//! trace may cancel the operation, substitute the carried value, or stop
//! the rest of the chain; trace callbacks receive the interpreter back and
//! may themselves read and write variables, including the one being traced
//! (the `NO_TRACE` latch keeps that from recursing forever).
//!
//! The read ("get") breakpoint has the subtlest semantics:
//!
//! - read failed + trace cancels → the operation is *promoted* to success
//!   and the trace's carried value becomes the result
//! - read succeeded + trace cancels → the read is *demoted*: a value the
//!   trace wrote over the carried one becomes the result; cancel without
//!   touching the value is a no-op returning the original
//!
//! For set/unset/reset, cancellation only gates whether the mutation
//! happens; a trace error aborts the operation and surfaces verbatim.

use std::fmt;
use std::sync::Arc;

use tracing::trace;

use crate::errors::KernelError;
use crate::interp::core::Interp;
use crate::interp::frame::FrameId;
use crate::interp::variable::{VarFlags, VarId};

/// The lifecycle event a trace fires for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Breakpoint {
    /// Before a variable read.
    BeforeGet,
    /// Before a variable write.
    BeforeSet,
    /// Before a variable unset.
    BeforeUnset,
    /// Before a variable reset.
    BeforeReset,
}

/// What the rest of the trace chain should do after one callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceFlow {
    /// Keep firing the remaining traces.
    Continue,
    /// Skip the remaining traces; the operation itself proceeds.
    Stop,
}

/// One trace-firing event, handed mutably to every callback in turn.
///
/// Records are pooled per interpreter and reused across firings; the
/// reuse is invisible to callbacks — behavior is identical to a freshly
/// allocated record.
#[derive(Debug, Clone)]
pub struct TraceInfo {
    /// The (link-resolved) variable the operation targets.
    pub variable: Option<VarId>,
    /// The name the access went through, element index stripped.
    pub name: String,
    /// The accessed array element, if any.
    pub index: Option<String>,
    /// Which lifecycle event is firing.
    pub breakpoint: Breakpoint,
    /// The carried old value. For a get this starts as the value the read
    /// produced (or `None` when the read failed) and may be overwritten by
    /// callbacks to substitute the result.
    pub old_value: Option<String>,
    /// The value about to be written, for set events. Callbacks may
    /// overwrite it to substitute what gets stored.
    pub new_value: Option<String>,
    /// Set by a callback to cancel the operation.
    pub cancel: bool,
    /// Whether the underlying operation had already succeeded when the
    /// trace chain started firing.
    pub ok: bool,
}

impl TraceInfo {
    fn blank() -> Self {
        TraceInfo {
            variable: None,
            name: String::new(),
            index: None,
            breakpoint: Breakpoint::BeforeGet,
            old_value: None,
            new_value: None,
            cancel: false,
            ok: true,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn prepare(
        &mut self,
        variable: VarId,
        name: &str,
        index: Option<&str>,
        breakpoint: Breakpoint,
        old_value: Option<String>,
        new_value: Option<String>,
        ok: bool,
    ) {
        self.variable = Some(variable);
        self.name.clear();
        self.name.push_str(name);
        self.index = index.map(str::to_owned);
        self.breakpoint = breakpoint;
        self.old_value = old_value;
        self.new_value = new_value;
        self.cancel = false;
        self.ok = ok;
    }
}

/// A variable trace callback.
///
/// One method is the whole interface; closures get a blanket
/// implementation, so `Arc::new(|interp, info| ...)` registers directly.
pub trait Trace: Send + Sync {
    /// Called before the traced operation; inspect and mutate `info`.
    fn invoke(&self, interp: &mut Interp, info: &mut TraceInfo) -> Result<TraceFlow, KernelError>;
}

impl<F> Trace for F
where
    F: Fn(&mut Interp, &mut TraceInfo) -> Result<TraceFlow, KernelError> + Send + Sync,
{
    fn invoke(&self, interp: &mut Interp, info: &mut TraceInfo) -> Result<TraceFlow, KernelError> {
        self(interp, info)
    }
}

/// One registered trace: the callback plus bookkeeping.
#[derive(Clone)]
pub struct TraceEntry {
    pub(crate) callback: Arc<dyn Trace>,
    pub(crate) token: u32,
    pub(crate) enabled: bool,
}

impl fmt::Debug for TraceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TraceEntry")
            .field("token", &self.token)
            .field("enabled", &self.enabled)
            .finish()
    }
}

/// Maximum number of pooled TraceInfo records kept around.
const TRACE_POOL_LIMIT: usize = 8;

impl Interp {
    /// Attach a trace to a variable in the current frame.
    ///
    /// The name is link-resolved first: tracing an alias attaches to the
    /// target, which is where every access through any alias fires. A
    /// missing variable is created as a tombstone so the registration has
    /// somewhere to live. Returns a token for later removal.
    pub fn trace_add(&mut self, name: &str, callback: Arc<dyn Trace>) -> Result<u32, KernelError> {
        self.trace_add_in(self.current_frame(), name, callback)
    }

    /// Attach a trace to a variable in the given frame.
    pub fn trace_add_in(
        &mut self,
        frame: FrameId,
        name: &str,
        callback: Arc<dyn Trace>,
    ) -> Result<u32, KernelError> {
        let (target, _, base) = self.resolve_target(frame, name, "trace")?;
        let token = self.next_trace_token();
        let Some(var) = self.var_mut(target) else {
            return Err(KernelError::BrokenLink { name: base });
        };
        var.traces.push(TraceEntry {
            callback,
            token,
            enabled: true,
        });
        trace!(name = %base, token, "trace attached");
        Ok(token)
    }

    /// Detach a trace by token. Returns true when something was removed.
    pub fn trace_remove(&mut self, name: &str, token: u32) -> Result<bool, KernelError> {
        let (target, _, base) = self.resolve_target(self.current_frame(), name, "trace")?;
        let Some(var) = self.var_mut(target) else {
            return Err(KernelError::BrokenLink { name: base });
        };
        let before = var.traces.len();
        var.traces.retain(|entry| entry.token != token);
        Ok(var.traces.len() != before)
    }

    /// Enable or disable a trace without removing it.
    pub fn trace_set_enabled(
        &mut self,
        name: &str,
        token: u32,
        enabled: bool,
    ) -> Result<bool, KernelError> {
        let (target, _, base) = self.resolve_target(self.current_frame(), name, "trace")?;
        let Some(var) = self.var_mut(target) else {
            return Err(KernelError::BrokenLink { name: base });
        };
        for entry in &mut var.traces {
            if entry.token == token {
                entry.enabled = enabled;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Number of traces attached to a variable (after link resolution).
    pub fn trace_count(&mut self, name: &str) -> Result<usize, KernelError> {
        let (target, _, _) = self.resolve_target(self.current_frame(), name, "trace")?;
        Ok(self.var(target).map_or(0, |v| v.traces.len()))
    }

    /// Current trace-firing nesting depth (diagnostic).
    pub fn trace_level(&self) -> u32 {
        self.trace_level
    }

    /// Fire the trace chain attached to `target` for the event in `info`.
    ///
    /// Traces run in registration order. A callback returning
    /// [`TraceFlow::Stop`] skips the rest of the chain; an error aborts
    /// the owning operation as [`KernelError::TraceFailed`]. The
    /// `NO_TRACE` latch on the variable suppresses recursive firing when
    /// a callback touches the variable it is tracing.
    pub(crate) fn fire_traces(
        &mut self,
        target: VarId,
        info: &mut TraceInfo,
    ) -> Result<(), KernelError> {
        let Some(var) = self.var(target) else {
            return Ok(());
        };
        if var.traces.is_empty() || var.flags.contains(VarFlags::NO_TRACE) {
            return Ok(());
        }
        let entries: Vec<TraceEntry> = var.traces.clone();
        if let Some(var) = self.var_mut(target) {
            var.flags.insert(VarFlags::NO_TRACE);
        }
        self.trace_level += 1;
        trace!(
            name = %info.name,
            breakpoint = ?info.breakpoint,
            count = entries.len(),
            "firing traces"
        );

        let mut outcome = Ok(());
        for entry in &entries {
            if !entry.enabled {
                continue;
            }
            match entry.callback.invoke(self, info) {
                Ok(TraceFlow::Continue) => {}
                Ok(TraceFlow::Stop) => break,
                Err(err) => {
                    outcome = Err(KernelError::TraceFailed(Box::new(err)));
                    break;
                }
            }
        }

        self.trace_level -= 1;
        if let Some(var) = self.var_mut(target) {
            var.flags.remove(VarFlags::NO_TRACE);
        }
        outcome
    }

    /// Take a TraceInfo record from the pool, or allocate a fresh one.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn take_trace_info(
        &mut self,
        variable: VarId,
        name: &str,
        index: Option<&str>,
        breakpoint: Breakpoint,
        old_value: Option<String>,
        new_value: Option<String>,
        ok: bool,
    ) -> TraceInfo {
        let mut info = self.trace_pool.pop().unwrap_or_else(TraceInfo::blank);
        info.prepare(variable, name, index, breakpoint, old_value, new_value, ok);
        info
    }

    /// Return a TraceInfo record to the pool.
    pub(crate) fn release_trace_info(&mut self, info: TraceInfo) {
        if self.trace_pool.len() < TRACE_POOL_LIMIT {
            self.trace_pool.push(info);
        }
    }
}
