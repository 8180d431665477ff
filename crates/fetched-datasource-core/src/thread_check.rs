//! Thread affinity verification.
//!
//! Widget mutations must land on the single UI-owning thread, while result
//! set notifications may arrive from any thread the store chooses. This
//! module records which thread owns a resource and checks later accesses
//! against it.
//!
//! Two levels of checking are provided:
//!
//! - **Runtime assertions** ([`ThreadAffinity::assert_same_thread_with_msg`]):
//!   always active. The UI queue uses them so it is never drained off its
//!   owning thread.
//! - **Debug assertions** ([`ThreadAffinity::debug_assert_same_thread_with_msg`]):
//!   only active in debug builds. Batch application checks it runs on the UI
//!   thread this way.
//!
//! # Example
//!
//! ```
//! use fetched_datasource_core::thread_check::ThreadAffinity;
//!
//! struct Owned {
//!     affinity: ThreadAffinity,
//!     value: std::cell::Cell<i32>,
//! }
//!
//! impl Owned {
//!     fn new() -> Self {
//!         Self {
//!             affinity: ThreadAffinity::current(),
//!             value: std::cell::Cell::new(0),
//!         }
//!     }
//!
//!     fn set_value(&self, v: i32) {
//!         self.affinity.debug_assert_same_thread_with_msg("value set off its thread");
//!         self.value.set(v);
//!     }
//! }
//! ```

use std::thread::ThreadId;

/// Records the thread a resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThreadAffinity {
    thread_id: ThreadId,
}

impl ThreadAffinity {
    /// Bind to the current thread.
    #[inline]
    pub fn current() -> Self {
        Self {
            thread_id: std::thread::current().id(),
        }
    }

    /// The thread ID this affinity is bound to.
    #[inline]
    pub fn thread_id(&self) -> ThreadId {
        self.thread_id
    }

    /// Check if the current thread matches this affinity.
    #[inline]
    pub fn is_same_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    /// Assert that we are on the bound thread, with a custom message.
    ///
    /// # Panics
    ///
    /// Panics if called from a different thread.
    pub fn assert_same_thread_with_msg(&self, msg: &str) {
        if !self.is_same_thread() {
            self.panic_wrong_thread(msg);
        }
    }

    /// Debug-only assertion with a custom message.
    #[inline]
    pub fn debug_assert_same_thread_with_msg(&self, msg: &str) {
        #[cfg(debug_assertions)]
        self.assert_same_thread_with_msg(msg);
    }

    #[cold]
    #[inline(never)]
    fn panic_wrong_thread(&self, msg: &str) -> ! {
        let current = std::thread::current();
        let current_name = current.name().unwrap_or("<unnamed>");
        let current_id = current.id();

        panic!(
            "\n\
            ══════════════════════════════════════════════════════════════════════\n\
            THREAD AFFINITY VIOLATION\n\
            ══════════════════════════════════════════════════════════════════════\n\
            \n\
            {msg}\n\
            \n\
            Owning thread: {:?}\n\
            Current thread: \"{current_name}\" (ID: {current_id:?})\n\
            \n\
            Widget mutations and UI queue draining must happen on the thread\n\
            that created the UiQueue. Post the work with UiQueue::post() from\n\
            other threads instead of running it in place.\n\
            \n\
            ══════════════════════════════════════════════════════════════════════",
            self.thread_id
        )
    }
}
