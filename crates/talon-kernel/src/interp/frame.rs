//! Call frames and namespaces.
//!
//! Frames form the lexical/dynamic call stack; each owns a variable table.
//! A frame may additionally be associated with a namespace and flagged to
//! use that namespace's designated variable frame for name resolution —
//! the indirection every lookup (and both sides of a link operation) must
//! apply before comparing names.

use crate::interp::variable::VarTable;

/// A generational handle to a call frame.
///
/// Frames are destroyed when procedure calls return; a stale generation
/// means the frame (and every variable it owned) is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId {
    /// Index into the interpreter's frame arena.
    pub index: u32,
    /// Arena generation when the handle was taken.
    pub generation: u32,
}

/// A handle to a registered namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespaceId(pub u32);

/// A namespace: a name, a global marker, and the frame its variables
/// live in.
#[derive(Debug)]
pub struct Namespace {
    /// Fully qualified namespace name; empty for the global namespace.
    pub name: String,
    /// True only for the global namespace.
    pub global: bool,
    /// The frame holding this namespace's variables.
    pub variable_frame: FrameId,
}

/// One scope: a variable table plus namespace linkage.
pub struct CallFrame {
    /// Descriptive name for diagnostics (procedure name, `global`, ...).
    pub name: String,
    /// The variables this frame owns.
    pub vars: VarTable,
    /// The associated namespace, if any.
    pub namespace: Option<NamespaceId>,
    /// When set, name resolution targets the namespace's variable frame
    /// rather than this frame itself.
    pub use_namespace: bool,
}

impl CallFrame {
    /// Create an empty frame with no namespace association.
    pub fn new(name: impl Into<String>) -> Self {
        CallFrame {
            name: name.into(),
            vars: VarTable::new(),
            namespace: None,
            use_namespace: false,
        }
    }
}

pub(crate) struct FrameSlot {
    pub(crate) generation: u32,
    pub(crate) frame: Option<CallFrame>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_frame_is_plain() {
        let frame = CallFrame::new("proc foo");
        assert!(frame.vars.is_empty());
        assert!(frame.namespace.is_none());
        assert!(!frame.use_namespace);
    }

    #[test]
    fn frame_ids_compare_by_index_and_generation() {
        let a = FrameId {
            index: 1,
            generation: 0,
        };
        let b = FrameId {
            index: 1,
            generation: 1,
        };
        assert_ne!(a, b);
    }
}
