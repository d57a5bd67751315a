//! Short-held, non-reentrant locking for process-wide tables
//!
//! The handle table and the attribute arena are each guarded by a
//! [`CheckedMutex`]. Critical sections never call out into driver code, so a
//! thread that tries to take a lock it already holds has a bug; that case is
//! asserted instead of deadlocking silently.

use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::thread::{current_thread_id, NO_THREAD};

/// Mutex that records its holder and rejects reentrant acquisition
#[derive(Debug)]
pub struct CheckedMutex<T> {
    name: &'static str,
    holder: AtomicU64,
    inner: Mutex<T>,
}

impl<T> CheckedMutex<T> {
    /// Wrap `value` in a named lock
    pub fn new(name: &'static str, value: T) -> Self {
        Self {
            name,
            holder: AtomicU64::new(NO_THREAD),
            inner: Mutex::new(value),
        }
    }

    /// Acquire the lock
    ///
    /// # Panics
    ///
    /// Panics if the calling thread already holds this lock.
    pub fn lock(&self) -> CheckedGuard<'_, T> {
        let me = current_thread_id();
        assert!(
            self.holder.load(Ordering::Acquire) != me,
            "{} lock acquired twice by the same thread",
            self.name
        );

        // Every critical section leaves the data consistent, so a panic in
        // another holder does not invalidate it.
        let guard = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        self.holder.store(me, Ordering::Release);
        CheckedGuard { lock: self, guard }
    }

    /// Whether the calling thread currently holds the lock
    pub fn is_held_by_current_thread(&self) -> bool {
        self.holder.load(Ordering::Acquire) == current_thread_id()
    }

    /// Name given at construction, used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// RAII guard returned by [`CheckedMutex::lock`]
pub struct CheckedGuard<'a, T> {
    lock: &'a CheckedMutex<T>,
    guard: MutexGuard<'a, T>,
}

impl<T> Deref for CheckedGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> DerefMut for CheckedGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.guard
    }
}

impl<T> Drop for CheckedGuard<'_, T> {
    fn drop(&mut self) {
        self.lock.holder.store(NO_THREAD, Ordering::Release);
    }
}
