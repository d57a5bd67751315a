//! Stable numeric thread identities
//!
//! `std::thread::ThreadId` cannot be stored in an atomic, so every thread that
//! touches the service is assigned a small non-zero integer on first use. Zero
//! is reserved to mean "no owner".

use std::sync::atomic::{AtomicU64, Ordering};

/// Marker stored in ownership fields when nobody holds the object
pub const NO_THREAD: u64 = 0;

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Identity of the calling thread, never [`NO_THREAD`]
pub fn current_thread_id() -> u64 {
    THREAD_ID.with(|id| *id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_stable_and_distinct() {
        let here = current_thread_id();
        assert_ne!(here, NO_THREAD);
        assert_eq!(here, current_thread_id());

        let there = std::thread::spawn(current_thread_id).join().unwrap();
        assert_ne!(here, there);
    }
}
