//! Device contexts
//!
//! A [`DeviceContext`] is shared through the handle table as an
//! `Arc<DeviceContext>`, but it is used by one thread at a time. A thread
//! claims it by bumping an atomic owner/count pair ([`DeviceContext::try_acquire`]);
//! the first claim binds the owner, further claims by the same thread nest,
//! and a claim from any other thread fails at once instead of waiting.
//!
//! The mutable state lives behind a mutex that only the owning thread ever
//! touches, so taking it never blocks. A failed `try_lock` means the owner
//! re-entered while already inside an operation and is reported as
//! [`GdiError::DcInUse`].

pub mod modes;
pub mod path;
pub mod xform;

mod clip;
mod mapping;
mod state;

pub use state::{initial_attr, DcState, DcStock, Selected, Selection};
pub use xform::Transforms;

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, TryLockError};

use crate::error::{GdiError, GdiResult};
use crate::foundation::thread::{current_thread_id, NO_THREAD};
use crate::handle::{Handle, ObjectType};

/// A display or memory device context
pub struct DeviceContext {
    handle: OnceLock<Handle>,
    kind: ObjectType,
    owner: AtomicU64,
    count: AtomicU32,
    deleted: AtomicBool,
    state: Mutex<DcState>,
}

impl std::fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceContext")
            .field("handle", &self.handle())
            .field("kind", &self.kind)
            .field("owner", &self.owner())
            .field("count", &self.count())
            .finish_non_exhaustive()
    }
}

impl DeviceContext {
    /// Wrap freshly initialized state
    pub fn new(kind: ObjectType, state: DcState) -> Self {
        Self {
            handle: OnceLock::new(),
            kind,
            owner: AtomicU64::new(NO_THREAD),
            count: AtomicU32::new(0),
            deleted: AtomicBool::new(false),
            state: Mutex::new(state),
        }
    }

    /// Record the handle the table assigned; later calls are ignored
    pub fn bind(&self, handle: Handle) {
        if self.handle.set(handle).is_err() {
            log::warn!("Device context already bound to {}", self.handle());
        }
    }

    /// Table handle, null before [`bind`](Self::bind)
    pub fn handle(&self) -> Handle {
        self.handle.get().copied().unwrap_or(Handle::NULL)
    }

    /// [`ObjectType::Dc`] or [`ObjectType::MemDc`]
    pub fn object_type(&self) -> ObjectType {
        self.kind
    }

    /// Thread currently holding the context, [`NO_THREAD`] when free
    pub fn owner(&self) -> u64 {
        self.owner.load(Ordering::Acquire)
    }

    /// Nesting depth of the current owner's claims
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Mark the context dead; later claims fail with [`GdiError::InvalidHandle`]
    ///
    /// Set by the deleting thread while it still holds its claim, so a claim
    /// taken afterwards through an old `Arc` always observes it.
    pub fn mark_deleted(&self) {
        self.deleted.store(true, Ordering::Release);
    }

    /// Whether the context has been deleted
    pub fn is_deleted(&self) -> bool {
        self.deleted.load(Ordering::Acquire)
    }

    /// Claim the context for the calling thread
    ///
    /// Returns the new nesting depth, or the owning thread's id when another
    /// thread holds it.
    pub fn try_acquire(&self) -> Result<u32, u64> {
        let me = current_thread_id();
        match self
            .owner
            .compare_exchange(NO_THREAD, me, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => Ok(self.count.fetch_add(1, Ordering::AcqRel) + 1),
            Err(owner) if owner == me => Ok(self.count.fetch_add(1, Ordering::AcqRel) + 1),
            Err(owner) => Err(owner),
        }
    }

    /// Drop one claim; the last one clears the owner
    pub fn release(&self) {
        debug_assert_eq!(self.owner(), current_thread_id(), "released by a thread that does not own it");
        if self.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.owner.store(NO_THREAD, Ordering::Release);
        }
    }

    /// Lock the mutable state; the caller must hold a claim
    pub fn state(&self) -> GdiResult<MutexGuard<'_, DcState>> {
        match self.state.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => Err(GdiError::DcInUse(self.handle())),
        }
    }

    /// Lock the state regardless of ownership, for delete notifications
    pub(crate) fn try_state(&self) -> Option<MutexGuard<'_, DcState>> {
        match self.state.try_lock() {
            Ok(guard) => Some(guard),
            Err(TryLockError::Poisoned(poisoned)) => Some(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => None,
        }
    }
}

/// A claim on a device context by the current thread
///
/// Released on drop. Not `Send`: a claim belongs to the thread that made it.
pub struct DcGuard {
    dc: Arc<DeviceContext>,
    _not_send: PhantomData<*const ()>,
}

impl std::fmt::Debug for DcGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("DcGuard").field(&self.dc.handle()).finish()
    }
}

impl DcGuard {
    /// Claim `dc` for the calling thread
    ///
    /// A deleted context is refused even when reached through an `Arc`
    /// obtained before the deletion.
    pub fn acquire(dc: Arc<DeviceContext>) -> GdiResult<Self> {
        match dc.try_acquire() {
            Ok(_) => {
                let guard = Self {
                    dc,
                    _not_send: PhantomData,
                };
                if guard.dc.is_deleted() {
                    return Err(GdiError::InvalidHandle(guard.dc.handle()));
                }
                Ok(guard)
            }
            Err(owner) => {
                log::warn!(
                    "Device context {} belongs to thread {}, refused to thread {}",
                    dc.handle(),
                    owner,
                    current_thread_id()
                );
                Err(GdiError::ThreadOwnershipViolation {
                    handle: dc.handle(),
                    owner,
                })
            }
        }
    }

    /// The claimed context
    pub fn dc(&self) -> &Arc<DeviceContext> {
        &self.dc
    }

    /// Handle of the claimed context
    pub fn handle(&self) -> Handle {
        self.dc.handle()
    }
}

impl Drop for DcGuard {
    fn drop(&mut self) {
        self.dc.release();
    }
}
