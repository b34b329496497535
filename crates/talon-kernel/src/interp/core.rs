//! The Interp — owner and coordinator of the scoping core.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                         Interp                           │
//! │  ┌─────────────┐  ┌──────────────┐  ┌────────────────┐   │
//! │  │ frame arena │  │  namespaces  │  │ location stack │   │
//! │  │ (stack +    │  │ (variable    │  │ (diagnostics)  │   │
//! │  │  global)    │  │  frames)     │  │                │   │
//! │  └─────────────┘  └──────────────┘  └────────────────┘   │
//! │  ┌──────────────────────────────┐  ┌────────────────┐    │
//! │  │ variable ops (get/set/unset/ │  │ TraceInfo pool │    │
//! │  │ reset, link-redirected)      │  │                │    │
//! │  └──────────────────────────────┘  └────────────────┘    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! All operations take `&mut Interp`; script execution is one logical
//! thread per interpreter, and nested re-entry (a trace callback touching
//! variables) happens by passing the interpreter back down, never by
//! re-locking. Embedders that share an interpreter across threads
//! serialize access through [`SharedInterp`](crate::interp::SharedInterp).

use std::collections::HashMap;

use tracing::debug;

use crate::errors::KernelError;
use crate::interp::frame::{CallFrame, FrameId, FrameSlot, Namespace, NamespaceId};
use crate::interp::location::ScriptLocation;
use crate::interp::trace::{Breakpoint, TraceInfo};
use crate::interp::variable::{var_id, ArrayKeySource, VarFlags, VarId, Variable};
use crate::syntax::{split_variable_name, tail_only};

/// The interpreter core: call frames, namespaces, variables, links,
/// traces, and the diagnostics location stack.
pub struct Interp {
    frames: Vec<FrameSlot>,
    stack: Vec<FrameId>,
    global: FrameId,
    namespaces: Vec<Namespace>,
    locations: Vec<ScriptLocation>,
    array_sources: HashMap<String, Box<dyn ArrayKeySource>>,
    pub(crate) trace_pool: Vec<TraceInfo>,
    pub(crate) trace_level: u32,
    trace_token: u32,
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}

impl Interp {
    /// Create an interpreter with a global frame and the global namespace.
    pub fn new() -> Self {
        let global = FrameId {
            index: 0,
            generation: 0,
        };
        let mut global_frame = CallFrame::new("global");
        global_frame.namespace = Some(NamespaceId(0));
        Interp {
            frames: vec![FrameSlot {
                generation: 0,
                frame: Some(global_frame),
            }],
            stack: vec![global],
            global,
            namespaces: vec![Namespace {
                name: String::new(),
                global: true,
                variable_frame: global,
            }],
            locations: Vec::new(),
            array_sources: HashMap::new(),
            trace_pool: Vec::new(),
            trace_level: 0,
            trace_token: 0,
        }
    }

    // ================================================================
    // Frames
    // ================================================================

    /// The interpreter's global frame. Lives as long as the interpreter.
    pub fn global_frame(&self) -> FrameId {
        self.global
    }

    /// The innermost frame on the call stack.
    pub fn current_frame(&self) -> FrameId {
        *self.stack.last().unwrap_or(&self.global)
    }

    /// Number of frames on the call stack (the global frame counts).
    pub fn frame_depth(&self) -> usize {
        self.stack.len()
    }

    /// The frame `level` steps up from the current one; level 1 is the
    /// caller. Level equal to the depth-1 reaches the global frame.
    pub fn frame_at_level(&self, level: usize) -> Option<FrameId> {
        let depth = self.stack.len();
        if level >= depth {
            return None;
        }
        self.stack.get(depth - 1 - level).copied()
    }

    /// Allocate a frame in the arena without pushing it on the call
    /// stack. Used for namespace variable frames.
    pub fn make_frame(&mut self, name: &str) -> FrameId {
        let index = self.frames.len() as u32;
        self.frames.push(FrameSlot {
            generation: 0,
            frame: Some(CallFrame::new(name)),
        });
        FrameId {
            index,
            generation: 0,
        }
    }

    /// Push a new transient frame (procedure call, `scope` block).
    pub fn push_frame(&mut self, name: &str) -> FrameId {
        let id = self.make_frame(name);
        self.stack.push(id);
        id
    }

    /// Pop and destroy the innermost frame.
    ///
    /// The frame's variables are gone afterwards; any surviving links into
    /// it resolve to [`KernelError::BrokenLink`] on their next access.
    /// The global frame cannot be popped.
    pub fn pop_frame(&mut self) -> Result<(), KernelError> {
        if self.stack.len() <= 1 {
            return Err(KernelError::InvalidArgument {
                what: "call frame (cannot pop the global frame)".into(),
            });
        }
        let id = match self.stack.pop() {
            Some(id) => id,
            None => {
                return Err(KernelError::InvalidArgument {
                    what: "call frame".into(),
                })
            }
        };
        if let Some(slot) = self.frames.get_mut(id.index as usize) {
            slot.frame = None;
            slot.generation = slot.generation.wrapping_add(1);
        }
        Ok(())
    }

    /// Access a frame, failing on a stale handle.
    pub fn frame(&self, id: FrameId) -> Option<&CallFrame> {
        let slot = self.frames.get(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.frame.as_ref()
    }

    /// Mutable access to a frame, failing on a stale handle.
    pub fn frame_mut(&mut self, id: FrameId) -> Option<&mut CallFrame> {
        let slot = self.frames.get_mut(id.index as usize)?;
        if slot.generation != id.generation {
            return None;
        }
        slot.frame.as_mut()
    }

    /// Apply the use-namespace indirection to a candidate frame.
    ///
    /// A frame flagged to use its associated namespace resolves to that
    /// namespace's variable frame — or to the global frame when the
    /// namespace is the global one. Both sides of a link operation go
    /// through this before any name comparison.
    pub fn resolve_frame(&self, candidate: FrameId) -> FrameId {
        let Some(frame) = self.frame(candidate) else {
            return candidate;
        };
        if !frame.use_namespace {
            return candidate;
        }
        let Some(ns_id) = frame.namespace else {
            return candidate;
        };
        let Some(ns) = self.namespaces.get(ns_id.0 as usize) else {
            return candidate;
        };
        if ns.global {
            self.global
        } else {
            ns.variable_frame
        }
    }

    // ================================================================
    // Namespaces
    // ================================================================

    /// Register a namespace with its own variable frame.
    pub fn create_namespace(&mut self, name: &str) -> NamespaceId {
        let variable_frame = self.make_frame(&format!("namespace {name}"));
        let id = NamespaceId(self.namespaces.len() as u32);
        self.namespaces.push(Namespace {
            name: name.into(),
            global: false,
            variable_frame,
        });
        if let Some(frame) = self.frame_mut(variable_frame) {
            frame.namespace = Some(id);
        }
        id
    }

    /// The handle of the global namespace.
    pub fn global_namespace(&self) -> NamespaceId {
        NamespaceId(0)
    }

    /// Look up a registered namespace.
    pub fn namespace(&self, id: NamespaceId) -> Option<&Namespace> {
        self.namespaces.get(id.0 as usize)
    }

    /// Associate a frame with a namespace and set its use-namespace flag.
    pub fn associate_namespace(
        &mut self,
        frame: FrameId,
        namespace: NamespaceId,
        use_namespace: bool,
    ) -> Result<(), KernelError> {
        let Some(frame) = self.frame_mut(frame) else {
            return Err(KernelError::InvalidArgument {
                what: "call frame".into(),
            });
        };
        frame.namespace = Some(namespace);
        frame.use_namespace = use_namespace;
        Ok(())
    }

    /// The namespace-qualified form of a name in a frame, for comparing
    /// the two sides of a link before their tails are stripped.
    pub(crate) fn qualified_name(&self, frame: FrameId, name: &str) -> String {
        let tail = tail_only(name);
        let Some(frame) = self.frame(frame) else {
            return tail.to_owned();
        };
        match frame.namespace.and_then(|id| self.namespaces.get(id.0 as usize)) {
            Some(ns) if !ns.global => format!("{}::{}", ns.name, tail),
            _ => tail.to_owned(),
        }
    }

    // ================================================================
    // Script locations
    // ================================================================

    /// Enter a nested evaluation at the given location.
    pub fn push_location(&mut self, location: ScriptLocation) {
        self.locations.push(location);
    }

    /// Leave the innermost nested evaluation.
    pub fn pop_location(&mut self) -> Option<ScriptLocation> {
        self.locations.pop()
    }

    /// The innermost evaluation location, if any.
    pub fn current_location(&self) -> Option<&ScriptLocation> {
        self.locations.last()
    }

    // ================================================================
    // Variable plumbing
    // ================================================================

    /// Access a variable by handle, failing on stale frame or slot.
    pub fn var(&self, id: VarId) -> Option<&Variable> {
        self.frame(id.frame)?.vars.get(id.slot, id.generation)
    }

    /// Mutable access to a variable by handle.
    pub fn var_mut(&mut self, id: VarId) -> Option<&mut Variable> {
        self.frame_mut(id.frame)?.vars.get_mut(id.slot, id.generation)
    }

    /// Find a variable by (tail-stripped) name in a frame.
    pub(crate) fn lookup_var(&self, frame: FrameId, base: &str) -> Option<VarId> {
        let (slot, generation) = self.frame(frame)?.vars.lookup(tail_only(base))?;
        Some(var_id(frame, slot, generation))
    }

    /// The GLOBAL/LOCAL provenance flag for variables born in a frame.
    pub(crate) fn new_var_flags(&self, frame: FrameId) -> VarFlags {
        if frame == self.global {
            VarFlags::GLOBAL
        } else {
            VarFlags::LOCAL
        }
    }

    /// Create an undefined variable in a frame.
    pub(crate) fn create_var(&mut self, frame: FrameId, base: &str) -> Result<VarId, KernelError> {
        let flags = self.new_var_flags(frame);
        let tail = tail_only(base).to_owned();
        let Some(frame_ref) = self.frame_mut(frame) else {
            return Err(KernelError::InvalidArgument {
                what: "call frame".into(),
            });
        };
        let (slot, generation) = frame_ref.vars.insert(Variable::undefined(tail, flags));
        Ok(var_id(frame, slot, generation))
    }

    /// Follow a link chain to the ultimate non-link variable.
    ///
    /// Returns the target handle and the element index designated by the
    /// chain, if any. A revisited variable is a cycle; a stale handle is a
    /// broken link; two element indexes along one chain are rejected.
    pub(crate) fn follow_links(
        &self,
        name: &str,
        start: VarId,
    ) -> Result<(VarId, Option<String>), KernelError> {
        let mut current = start;
        let mut index: Option<String> = None;
        let mut visited: Vec<VarId> = Vec::new();
        loop {
            let Some(var) = self.var(current) else {
                return Err(KernelError::BrokenLink {
                    name: name.to_owned(),
                });
            };
            if !var.is_link() {
                return Ok((current, index));
            }
            let Some(link) = &var.link else {
                return Err(KernelError::BrokenLink {
                    name: name.to_owned(),
                });
            };
            if visited.contains(&current) {
                return Err(KernelError::CycleDetected {
                    name: name.to_owned(),
                });
            }
            visited.push(current);
            if let Some(link_index) = &link.index {
                if index.is_some() {
                    return Err(KernelError::InvalidArgument {
                        what: format!("link \"{name}\" (element of an element link)"),
                    });
                }
                index = Some(link_index.clone());
            }
            current = link.target;
        }
    }

    /// Split, frame-resolve, find-or-create, and link-follow a raw name.
    ///
    /// Shared by writes and trace registration, which both materialize a
    /// tombstone when the variable does not exist yet.
    pub(crate) fn resolve_target(
        &mut self,
        frame: FrameId,
        raw: &str,
        _operation: &'static str,
    ) -> Result<(VarId, Option<String>, String), KernelError> {
        let parts = split_variable_name(raw);
        let effective = self.resolve_frame(frame);
        let id = match self.lookup_var(effective, parts.name) {
            Some(id) => id,
            None => self.create_var(effective, parts.name)?,
        };
        let (target, link_index) = self.follow_links(parts.name, id)?;
        let index = merge_index(raw, parts.index, link_index)?;
        Ok((target, index, parts.name.to_owned()))
    }

    /// Like [`Interp::resolve_target`] but never creates the variable.
    fn resolve_existing(
        &self,
        frame: FrameId,
        raw: &str,
        operation: &'static str,
    ) -> Result<(VarId, Option<String>, String), KernelError> {
        let parts = split_variable_name(raw);
        let effective = self.resolve_frame(frame);
        let Some(id) = self.lookup_var(effective, parts.name) else {
            return Err(KernelError::NoSuchVariable {
                operation,
                name: raw.to_owned(),
                reason: "no such variable".into(),
            });
        };
        let (target, link_index) = self.follow_links(parts.name, id)?;
        let index = merge_index(raw, parts.index, link_index)?;
        Ok((target, index, parts.name.to_owned()))
    }

    fn should_fire(&self, target: VarId) -> bool {
        self.var(target)
            .is_some_and(|v| v.has_traces() && !v.flags.contains(VarFlags::NO_TRACE))
    }

    fn snapshot(&self, target: VarId, index: Option<&str>) -> Option<String> {
        let var = self.var(target)?;
        match index {
            Some(index) => var.element(index).map(str::to_owned),
            None => var.scalar().map(str::to_owned),
        }
    }

    // ================================================================
    // Variable operations
    // ================================================================

    /// Read a variable in the current frame. `a(b)` reads one element.
    pub fn get_var(&mut self, raw: &str) -> Result<String, KernelError> {
        self.get_var_in(self.current_frame(), raw)
    }

    /// Read a variable in the given frame, redirecting through links and
    /// firing any `BeforeGet` traces on the ultimate target.
    pub fn get_var_in(&mut self, frame: FrameId, raw: &str) -> Result<String, KernelError> {
        let (target, index, base) = self.resolve_existing(frame, raw, "read")?;
        let read = self.read_value(target, raw, index.as_deref());

        if !self.should_fire(target) {
            return read;
        }

        let was_ok = read.is_ok();
        let original = read.as_ref().ok().cloned();
        let mut info = self.take_trace_info(
            target,
            &base,
            index.as_deref(),
            Breakpoint::BeforeGet,
            original.clone(),
            None,
            was_ok,
        );
        let fired = self.fire_traces(target, &mut info);
        let outcome = match fired {
            Err(err) => Err(err),
            Ok(()) => {
                if info.cancel {
                    if was_ok {
                        // Demotion: a trace-substituted value wins; cancel
                        // without touching the carried value keeps the
                        // original read result.
                        match (&info.old_value, &original) {
                            (Some(substituted), Some(original_value))
                                if substituted != original_value =>
                            {
                                Ok(substituted.clone())
                            }
                            _ => Ok(original.clone().unwrap_or_default()),
                        }
                    } else {
                        // Promotion: the failed read becomes a success and
                        // the trace's carried value is the result.
                        Ok(info.old_value.clone().unwrap_or_default())
                    }
                } else {
                    read
                }
            }
        };
        self.release_trace_info(info);
        outcome
    }

    fn read_value(
        &self,
        target: VarId,
        raw: &str,
        index: Option<&str>,
    ) -> Result<String, KernelError> {
        let Some(var) = self.var(target) else {
            return Err(KernelError::BrokenLink {
                name: raw.to_owned(),
            });
        };
        let missing = |reason: &str| KernelError::NoSuchVariable {
            operation: "read",
            name: raw.to_owned(),
            reason: reason.into(),
        };
        if var.is_undefined() {
            return Err(missing("no such variable"));
        }
        match index {
            Some(index) => {
                if !var.is_array() {
                    return Err(missing("variable isn't array"));
                }
                var.element(index)
                    .map(str::to_owned)
                    .ok_or_else(|| missing("no such element in array"))
            }
            None => {
                if var.is_array() {
                    return Err(missing("variable is array"));
                }
                var.scalar().map(str::to_owned).ok_or_else(|| missing("no such variable"))
            }
        }
    }

    /// Write a variable in the current frame. Returns the stored value.
    pub fn set_var(&mut self, raw: &str, value: &str) -> Result<String, KernelError> {
        self.set_var_in(self.current_frame(), raw, value)
    }

    /// Write a variable in the given frame, redirecting through links and
    /// firing `BeforeSet` traces on the target before the store.
    ///
    /// A canceling trace gates the write (the previous value, if any, is
    /// returned); a trace may also overwrite the value being stored.
    pub fn set_var_in(
        &mut self,
        frame: FrameId,
        raw: &str,
        value: &str,
    ) -> Result<String, KernelError> {
        let (target, index, base) = self.resolve_target(frame, raw, "set")?;

        let mut write_value = value.to_owned();
        if self.should_fire(target) {
            let old = self.snapshot(target, index.as_deref());
            let mut info = self.take_trace_info(
                target,
                &base,
                index.as_deref(),
                Breakpoint::BeforeSet,
                old.clone(),
                Some(write_value.clone()),
                true,
            );
            let fired = self.fire_traces(target, &mut info);
            if let Err(err) = fired {
                self.release_trace_info(info);
                return Err(err);
            }
            if info.cancel {
                let result = old.unwrap_or_default();
                self.release_trace_info(info);
                return Ok(result);
            }
            if let Some(substituted) = info.new_value.take() {
                write_value = substituted;
            }
            self.release_trace_info(info);
        }

        let Some(var) = self.var_mut(target) else {
            return Err(KernelError::BrokenLink {
                name: raw.to_owned(),
            });
        };
        match index.as_deref() {
            Some(index) => {
                if !var.is_undefined() && !var.is_array() {
                    return Err(KernelError::NoSuchVariable {
                        operation: "set",
                        name: raw.to_owned(),
                        reason: "variable isn't array".into(),
                    });
                }
                var.set_element(index, write_value.clone());
            }
            None => {
                if var.is_array() {
                    return Err(KernelError::NoSuchVariable {
                        operation: "set",
                        name: raw.to_owned(),
                        reason: "variable is array".into(),
                    });
                }
                var.set_scalar(write_value.clone());
            }
        }
        Ok(write_value)
    }

    /// Unset a variable in the current frame.
    pub fn unset_var(&mut self, raw: &str) -> Result<(), KernelError> {
        self.unset_var_in(self.current_frame(), raw)
    }

    /// Unset a variable (or one array element) in the given frame.
    ///
    /// Redirects through links, so unsetting an alias unsets its target.
    /// A target still carrying traces is tombstoned instead of destroyed,
    /// keeping the registrations alive; otherwise its slot is freed and
    /// surviving links to it break deterministically.
    pub fn unset_var_in(&mut self, frame: FrameId, raw: &str) -> Result<(), KernelError> {
        let (target, index, base) = self.resolve_existing(frame, raw, "unset")?;

        if self.should_fire(target) {
            let old = self.snapshot(target, index.as_deref());
            let mut info = self.take_trace_info(
                target,
                &base,
                index.as_deref(),
                Breakpoint::BeforeUnset,
                old,
                None,
                true,
            );
            let fired = self.fire_traces(target, &mut info);
            let canceled = info.cancel;
            self.release_trace_info(info);
            fired?;
            if canceled {
                return Ok(());
            }
        }

        match index.as_deref() {
            Some(index) => {
                let Some(var) = self.var_mut(target) else {
                    return Err(KernelError::BrokenLink {
                        name: raw.to_owned(),
                    });
                };
                let removed = var
                    .array
                    .as_mut()
                    .and_then(|array| array.remove(index))
                    .is_some();
                if !removed {
                    return Err(KernelError::NoSuchVariable {
                        operation: "unset",
                        name: raw.to_owned(),
                        reason: if var.is_array() {
                            "no such element in array".into()
                        } else {
                            "variable isn't array".into()
                        },
                    });
                }
                var.flags.insert(VarFlags::DIRTY);
                Ok(())
            }
            None => {
                let Some(var) = self.var_mut(target) else {
                    return Err(KernelError::BrokenLink {
                        name: raw.to_owned(),
                    });
                };
                if var.is_undefined() {
                    return Err(KernelError::NoSuchVariable {
                        operation: "unset",
                        name: raw.to_owned(),
                        reason: "no such variable".into(),
                    });
                }
                if var.has_traces() {
                    var.reset();
                    return Ok(());
                }
                let name = var.name.clone();
                match self.frame_mut(target.frame) {
                    Some(frame) => {
                        frame.vars.remove(&name);
                        Ok(())
                    }
                    None => Err(KernelError::BrokenLink { name: base }),
                }
            }
        }
    }

    /// Reset a variable to the undefined state without destroying it.
    ///
    /// Fires `BeforeReset` traces; storage and shape are dropped, traces
    /// and the slot survive.
    pub fn reset_var(&mut self, raw: &str) -> Result<(), KernelError> {
        self.reset_var_in(self.current_frame(), raw)
    }

    /// Reset a variable in the given frame. See [`Interp::reset_var`].
    pub fn reset_var_in(&mut self, frame: FrameId, raw: &str) -> Result<(), KernelError> {
        let (target, index, base) = self.resolve_existing(frame, raw, "reset")?;

        if self.should_fire(target) {
            let old = self.snapshot(target, index.as_deref());
            let mut info = self.take_trace_info(
                target,
                &base,
                index.as_deref(),
                Breakpoint::BeforeReset,
                old,
                None,
                true,
            );
            let fired = self.fire_traces(target, &mut info);
            let canceled = info.cancel;
            self.release_trace_info(info);
            fired?;
            if canceled {
                return Ok(());
            }
        }

        match self.var_mut(target) {
            Some(var) => {
                var.reset();
                Ok(())
            }
            None => Err(KernelError::BrokenLink { name: base }),
        }
    }

    /// True when the name currently denotes a defined variable.
    pub fn var_defined(&self, raw: &str) -> bool {
        self.var_defined_in(self.current_frame(), raw)
    }

    /// True when the name denotes a defined variable in the given frame.
    pub fn var_defined_in(&self, frame: FrameId, raw: &str) -> bool {
        match self.resolve_existing(frame, raw, "read") {
            Ok((target, index, _)) => self.read_value(target, raw, index.as_deref()).is_ok(),
            Err(_) => false,
        }
    }

    // ================================================================
    // Arrays
    // ================================================================

    /// The key set of an array variable, links followed.
    ///
    /// A registered pseudo-array source supplies the keys for
    /// environment-like arrays; otherwise the variable must be a defined
    /// array.
    pub fn array_keys_in(&self, frame: FrameId, raw: &str) -> Result<Vec<String>, KernelError> {
        let (target, _, _) = self.resolve_existing(frame, raw, "read").map_err(|_| {
            KernelError::NotAnArray {
                name: raw.to_owned(),
            }
        })?;
        let Some(var) = self.var(target) else {
            return Err(KernelError::BrokenLink {
                name: raw.to_owned(),
            });
        };
        if let Some(source) = self.array_sources.get(&var.name) {
            if target.frame == self.global {
                return Ok(source.keys());
            }
        }
        if var.is_undefined() || !var.is_array() {
            return Err(KernelError::NotAnArray {
                name: raw.to_owned(),
            });
        }
        Ok(var.array_keys())
    }

    /// One element of an array variable, links followed; pseudo-array
    /// sources are consulted the same way as for keys.
    pub fn array_element_in(
        &self,
        frame: FrameId,
        raw: &str,
        key: &str,
    ) -> Result<Option<String>, KernelError> {
        let (target, _, _) = self.resolve_existing(frame, raw, "read").map_err(|_| {
            KernelError::NotAnArray {
                name: raw.to_owned(),
            }
        })?;
        let Some(var) = self.var(target) else {
            return Err(KernelError::BrokenLink {
                name: raw.to_owned(),
            });
        };
        if let Some(source) = self.array_sources.get(&var.name) {
            if target.frame == self.global {
                return Ok(source.get(key));
            }
        }
        Ok(var.element(key).map(str::to_owned))
    }

    /// Register an environment-like pseudo-array under a global name.
    ///
    /// The name becomes a defined global array whose keys and values are
    /// answered by the source.
    pub fn register_array_source(
        &mut self,
        name: &str,
        source: Box<dyn ArrayKeySource>,
    ) -> Result<(), KernelError> {
        let id = match self.lookup_var(self.global, name) {
            Some(id) => id,
            None => self.create_var(self.global, name)?,
        };
        let Some(var) = self.var_mut(id) else {
            return Err(KernelError::BrokenLink {
                name: name.to_owned(),
            });
        };
        var.flags.insert(VarFlags::ARRAY);
        var.flags.remove(VarFlags::UNDEFINED);
        self.array_sources.insert(name.to_owned(), source);
        debug!(name, "registered pseudo-array source");
        Ok(())
    }

    pub(crate) fn next_trace_token(&mut self) -> u32 {
        self.trace_token = self.trace_token.wrapping_add(1);
        self.trace_token
    }
}

/// Combine an explicit element index with one designated by a link chain.
fn merge_index(
    raw: &str,
    explicit: Option<&str>,
    from_link: Option<String>,
) -> Result<Option<String>, KernelError> {
    match (explicit, from_link) {
        (Some(_), Some(_)) => Err(KernelError::InvalidArgument {
            what: format!("\"{raw}\" (element access through an element link)"),
        }),
        (Some(explicit), None) => Ok(Some(explicit.to_owned())),
        (None, link) => Ok(link),
    }
}
