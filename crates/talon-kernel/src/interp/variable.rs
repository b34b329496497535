//! Variables and the per-frame variable table.
//!
//! A [`Variable`] is either a scalar, an array (associative map), or a
//! link redirecting to a variable owned by another frame. Links are stored
//! as generational handles ([`VarId`]) rather than pointers, so a target
//! torn down with its frame is detected as a broken link instead of
//! becoming a dangling reference.
//!
//! An unset variable that still carries traces is kept in the table in the
//! `UNDEFINED` tombstone state; that keeps trace registrations alive across
//! unset/redefine cycles.

use std::collections::{BTreeMap, HashMap};

use bitflags::bitflags;

use crate::interp::frame::FrameId;
use crate::interp::trace::TraceEntry;

bitflags! {
    /// Per-variable state flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct VarFlags: u16 {
        /// Created in the global frame.
        const GLOBAL = 1 << 0;
        /// Created in a transient (procedure) frame.
        const LOCAL = 1 << 1;
        /// Has associative element storage.
        const ARRAY = 1 << 2;
        /// Redirects to another variable; holds no storage itself.
        const LINK = 1 << 3;
        /// Tombstone: logically deleted, retained for trace continuity.
        const UNDEFINED = 1 << 4;
        /// Modified since the flag was last cleared.
        const DIRTY = 1 << 5;
        /// Trace firing is in progress; suppresses recursive firing.
        const NO_TRACE = 1 << 6;
    }
}

/// A generational handle to a variable: frame, slot, and the slot
/// generation observed at creation time. A stale generation means the
/// target was destroyed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VarId {
    /// The frame owning the slot.
    pub frame: FrameId,
    /// Slot index within the frame's table.
    pub slot: u32,
    /// Slot generation when the handle was taken.
    pub generation: u32,
}

/// The target half of a link variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// The variable the link redirects to.
    pub target: VarId,
    /// When set, the link designates a single element of the target array.
    pub index: Option<String>,
}

/// One variable: identity, flags, storage, and attached traces.
#[derive(Debug, Clone)]
pub struct Variable {
    /// The tail-stripped name the owning frame knows this variable by.
    pub name: String,
    /// State flags.
    pub flags: VarFlags,
    pub(crate) value: Option<String>,
    pub(crate) array: Option<BTreeMap<String, String>>,
    pub(crate) link: Option<Link>,
    pub(crate) traces: Vec<TraceEntry>,
}

impl Variable {
    /// Create a new variable in the undefined state.
    pub fn undefined(name: impl Into<String>, flags: VarFlags) -> Self {
        Variable {
            name: name.into(),
            flags: flags | VarFlags::UNDEFINED,
            value: None,
            array: None,
            link: None,
            traces: Vec::new(),
        }
    }

    /// True while the variable is a tombstone.
    pub fn is_undefined(&self) -> bool {
        self.flags.contains(VarFlags::UNDEFINED)
    }

    /// True when the variable redirects to another variable.
    pub fn is_link(&self) -> bool {
        self.flags.contains(VarFlags::LINK)
    }

    /// True when the variable has array storage.
    pub fn is_array(&self) -> bool {
        self.flags.contains(VarFlags::ARRAY)
    }

    /// True when at least one trace is attached.
    pub fn has_traces(&self) -> bool {
        !self.traces.is_empty()
    }

    /// The scalar value, if defined as a scalar.
    pub fn scalar(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// One element of the array storage, if present.
    pub fn element(&self, index: &str) -> Option<&str> {
        self.array.as_ref().and_then(|a| a.get(index)).map(|s| s.as_str())
    }

    /// The array keys in deterministic (sorted) order.
    pub fn array_keys(&self) -> Vec<String> {
        match &self.array {
            Some(array) => array.keys().cloned().collect(),
            None => Vec::new(),
        }
    }

    /// Store a scalar value, making the variable defined.
    pub(crate) fn set_scalar(&mut self, value: impl Into<String>) {
        self.value = Some(value.into());
        self.flags.remove(VarFlags::UNDEFINED);
        self.flags.insert(VarFlags::DIRTY);
    }

    /// Store one array element, making the variable a defined array.
    pub(crate) fn set_element(&mut self, index: impl Into<String>, value: impl Into<String>) {
        self.array
            .get_or_insert_with(BTreeMap::new)
            .insert(index.into(), value.into());
        self.flags.insert(VarFlags::ARRAY | VarFlags::DIRTY);
        self.flags.remove(VarFlags::UNDEFINED);
    }

    /// Reset all storage and shape flags, entering the tombstone state.
    ///
    /// Traces and the GLOBAL/LOCAL provenance flags survive; everything
    /// else (value, elements, link target) is dropped so stale state can
    /// never leak through a later reuse.
    pub(crate) fn reset(&mut self) {
        self.value = None;
        self.array = None;
        self.link = None;
        self.flags.remove(VarFlags::ARRAY | VarFlags::LINK | VarFlags::DIRTY);
        self.flags.insert(VarFlags::UNDEFINED);
    }
}

/// A source of keys and values for an environment-like pseudo-array.
///
/// Registered against a global array variable; `array foreach`/`array for`
/// consult the source instead of the (empty) element storage.
pub trait ArrayKeySource: Send {
    /// The current key set.
    fn keys(&self) -> Vec<String>;
    /// The value for one key, if present.
    fn get(&self, key: &str) -> Option<String>;
}

pub(crate) struct Slot {
    pub(crate) generation: u32,
    pub(crate) var: Option<Variable>,
}

/// Per-frame variable storage: a slot arena with a name index.
///
/// Slots are reused after removal with a bumped generation, which is what
/// turns links to destroyed variables into detectable broken links.
#[derive(Default)]
pub struct VarTable {
    slots: Vec<Slot>,
    names: HashMap<String, u32>,
    free: Vec<u32>,
}

impl VarTable {
    /// Create an empty table.
    pub fn new() -> Self {
        VarTable::default()
    }

    /// Number of live (non-removed) variables, tombstones included.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True when no variables are present.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Find a variable by name, returning its slot and current generation.
    pub fn lookup(&self, name: &str) -> Option<(u32, u32)> {
        let slot = *self.names.get(name)?;
        let generation = self.slots.get(slot as usize)?.generation;
        Some((slot, generation))
    }

    /// Access a variable by slot, failing on a stale generation.
    pub fn get(&self, slot: u32, generation: u32) -> Option<&Variable> {
        let entry = self.slots.get(slot as usize)?;
        if entry.generation != generation {
            return None;
        }
        entry.var.as_ref()
    }

    /// Mutable access by slot, failing on a stale generation.
    pub fn get_mut(&mut self, slot: u32, generation: u32) -> Option<&mut Variable> {
        let entry = self.slots.get_mut(slot as usize)?;
        if entry.generation != generation {
            return None;
        }
        entry.var.as_mut()
    }

    /// Insert a variable, reusing a free slot when one exists.
    ///
    /// Returns the slot and generation of the stored variable.
    pub fn insert(&mut self, var: Variable) -> (u32, u32) {
        let name = var.name.clone();
        if let Some(slot) = self.free.pop() {
            let entry = &mut self.slots[slot as usize];
            entry.var = Some(var);
            self.names.insert(name, slot);
            (slot, entry.generation)
        } else {
            let slot = self.slots.len() as u32;
            self.slots.push(Slot {
                generation: 0,
                var: Some(var),
            });
            self.names.insert(name, slot);
            (slot, 0)
        }
    }

    /// Remove a variable by name, bumping the slot generation so any
    /// surviving handles to it become stale.
    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        let slot = self.names.remove(name)?;
        let entry = &mut self.slots[slot as usize];
        let var = entry.var.take();
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(slot);
        var
    }

    /// All variable names in deterministic (sorted) order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.names.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }
}

/// Attach a frame id to a table slot, producing a full handle.
pub(crate) fn var_id(frame: FrameId, slot: u32, generation: u32) -> VarId {
    VarId {
        frame,
        slot,
        generation,
    }
}
