//! Sharing one interpreter across threads.
//!
//! The core itself is single-threaded by construction: every operation
//! takes `&mut Interp`, and nested re-entry (trace callbacks, loop bodies)
//! happens by passing the interpreter back down the stack. [`SharedInterp`]
//! is the embedding-side wrapper for hosts that hold the interpreter from
//! several threads: a reentrant lock serializes them, while a thread that
//! already holds the lock may re-enter freely.

use std::cell::RefCell;
use std::sync::Arc;

use parking_lot::ReentrantMutex;

use crate::interp::core::Interp;

/// A clonable, thread-safe handle to one interpreter.
#[derive(Clone)]
pub struct SharedInterp {
    inner: Arc<ReentrantMutex<RefCell<Interp>>>,
}

impl SharedInterp {
    /// Wrap a fresh interpreter.
    pub fn new() -> Self {
        SharedInterp::from_interp(Interp::new())
    }

    /// Wrap an existing interpreter.
    pub fn from_interp(interp: Interp) -> Self {
        SharedInterp {
            inner: Arc::new(ReentrantMutex::new(RefCell::new(interp))),
        }
    }

    /// Run a closure with exclusive access to the interpreter.
    ///
    /// Reentrant from the owning thread; other threads block until the
    /// outermost borrow ends. Do not call `with` from inside another
    /// `with` on the same handle — the lock permits it but the inner
    /// `RefCell` borrow does not; pass the `&mut Interp` down instead.
    pub fn with<R>(&self, f: impl FnOnce(&mut Interp) -> R) -> R {
        let guard = self.inner.lock();
        let mut interp = guard.borrow_mut();
        f(&mut interp)
    }
}

impl Default for SharedInterp {
    fn default() -> Self {
        SharedInterp::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_handle_round_trips_state() {
        let shared = SharedInterp::new();
        shared.with(|interp| interp.set_var("x", "1").unwrap());
        let value = shared.with(|interp| interp.get_var("x").unwrap());
        assert_eq!(value, "1");
    }

    #[test]
    fn clones_see_the_same_interpreter() {
        let shared = SharedInterp::new();
        let other = shared.clone();
        shared.with(|interp| interp.set_var("shared", "yes").unwrap());
        assert_eq!(other.with(|interp| interp.get_var("shared").unwrap()), "yes");
    }

    #[test]
    fn handle_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<SharedInterp>();
    }
}
