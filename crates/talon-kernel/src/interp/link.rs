//! Variable links: `upvar`- and `global`-style aliasing across frames.
//!
//! A link is a variable whose storage lives elsewhere: reads and writes
//! through the alias are redirected to the ultimate target, and a target
//! destroyed with its frame turns the alias into a detectable broken link
//! rather than a dangling pointer.
//!
//! Linking is ordered carefully: both frames go through the use-namespace
//! indirection first, the two sides are compared by qualified name before
//! their tails are stripped, the target is materialized (a tombstone when
//! it does not exist yet), and only then is the alias slot created or
//! retargeted. An existing *defined* non-link variable refuses to become
//! an alias; an existing link is silently retargeted.

use tracing::debug;

use crate::errors::KernelError;
use crate::interp::core::Interp;
use crate::interp::frame::FrameId;
use crate::interp::variable::{Link, VarFlags};
use crate::syntax::split_variable_name;

impl Interp {
    /// Create (or retarget) a link so that `local_name` in `local_frame`
    /// aliases `other_name` in `other_frame`.
    ///
    /// The other side may name an array element (`a(k)`); the local side
    /// may not. Chains collapse on creation: linking to an alias links to
    /// its ultimate target, and a retarget that would close a chain into
    /// a cycle is rejected.
    pub fn link_variable(
        &mut self,
        local_frame: FrameId,
        local_name: &str,
        other_frame: FrameId,
        other_name: &str,
    ) -> Result<(), KernelError> {
        let local_parts = split_variable_name(local_name);
        if local_parts.index.is_some() {
            return Err(KernelError::InvalidArgument {
                what: format!("local name \"{local_name}\" (cannot be an array element)"),
            });
        }

        let local_eff = self.resolve_frame(local_frame);
        let other_eff = self.resolve_frame(other_frame);

        // Same frame, same qualified name: nothing to alias.
        if local_eff == other_eff {
            let local_qualified = self.qualified_name(local_eff, local_parts.name);
            let other_parts = split_variable_name(other_name);
            let other_qualified = self.qualified_name(other_eff, other_parts.name);
            if local_qualified == other_qualified {
                return Err(KernelError::SelfAlias);
            }
        }

        // Materialize the other side and collapse its chain.
        let other_parts = split_variable_name(other_name);
        let other_id = match self.lookup_var(other_eff, other_parts.name) {
            Some(id) => id,
            None => self.create_var(other_eff, other_parts.name)?,
        };
        let (target, chain_index) = self.follow_links(other_parts.name, other_id)?;
        let index = match (other_parts.index, chain_index) {
            (Some(_), Some(_)) => {
                return Err(KernelError::InvalidArgument {
                    what: format!(
                        "\"{other_name}\" (element access through an element link)"
                    ),
                })
            }
            (Some(explicit), None) => Some(explicit.to_owned()),
            (None, chain) => chain,
        };

        // Find or create the alias slot.
        let local_id = match self.lookup_var(local_eff, local_parts.name) {
            Some(id) => id,
            None => self.create_var(local_eff, local_parts.name)?,
        };

        if target == local_id {
            // The chain from the other side ends at the alias being
            // created, so completing the link would close a cycle.
            return Err(KernelError::CycleDetected {
                name: local_parts.name.to_owned(),
            });
        }

        let Some(var) = self.var_mut(local_id) else {
            return Err(KernelError::BrokenLink {
                name: local_parts.name.to_owned(),
            });
        };
        if !var.is_link() && !var.is_undefined() {
            return Err(KernelError::AlreadyExists {
                name: local_parts.name.to_owned(),
            });
        }
        var.value = None;
        var.array = None;
        var.link = Some(Link { target, index });
        var.flags.insert(VarFlags::LINK);
        var.flags.remove(VarFlags::UNDEFINED | VarFlags::ARRAY);
        // dirty goes last, after every other mutation
        var.flags.insert(VarFlags::DIRTY);

        debug!(
            local = local_parts.name,
            other = other_name,
            "variable linked"
        );
        Ok(())
    }

    /// Remove a link, returning the name to ordinary (undefined) storage.
    ///
    /// The target is untouched; the local name behaves exactly as it did
    /// before the link was made — undefined until the next write, which
    /// lands in the local frame. Returns false when the name is not a
    /// link.
    pub fn unlink_variable(
        &mut self,
        frame: FrameId,
        name: &str,
    ) -> Result<bool, KernelError> {
        let parts = split_variable_name(name);
        if parts.index.is_some() {
            return Err(KernelError::InvalidArgument {
                what: format!("local name \"{name}\" (cannot be an array element)"),
            });
        }
        let effective = self.resolve_frame(frame);
        let Some(id) = self.lookup_var(effective, parts.name) else {
            return Ok(false);
        };
        match self.var_mut(id) {
            Some(var) if var.is_link() => {
                var.reset();
                debug!(local = parts.name, "variable unlinked");
                Ok(true)
            }
            Some(_) => Ok(false),
            None => Err(KernelError::BrokenLink {
                name: parts.name.to_owned(),
            }),
        }
    }

    /// `upvar`: alias `local_name` in the current frame to `other_name`
    /// in the frame `level` steps up the call stack.
    pub fn upvar(
        &mut self,
        level: usize,
        other_name: &str,
        local_name: &str,
    ) -> Result<(), KernelError> {
        let Some(other_frame) = self.frame_at_level(level) else {
            return Err(KernelError::InvalidArgument {
                what: format!("level \"{level}\""),
            });
        };
        self.link_variable(self.current_frame(), local_name, other_frame, other_name)
    }

    /// `global`: alias a name in the current frame to the same name in
    /// the global frame. A no-op when already executing at global scope.
    pub fn global_link(&mut self, name: &str) -> Result<(), KernelError> {
        let current = self.current_frame();
        if self.resolve_frame(current) == self.global_frame() {
            return Ok(());
        }
        self.link_variable(current, name, self.global_frame(), name)
    }
}
