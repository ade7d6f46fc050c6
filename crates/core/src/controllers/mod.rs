//! View controllers over the record repository.
//!
//! Controllers own presentation state only. They read through and mutate through the
//! [`RecordRepository`](crate::repository::RecordRepository), never the gateway, and they catch
//! every [`SyncError`](crate::SyncError) at their boundary, turning it into view state or a
//! [`Notice`](crate::Notice).
//!
//! A controller is torn down with `close()` when its screen goes away. Responses that arrive
//! after that are discarded instead of applied.

pub mod detail;
pub mod list;

pub use detail::{DetailController, DetailView, Slot};
pub use list::{ListController, ListScope, ListView};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Loading state of a view or of one part of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum LoadPhase {
    #[default]
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// Tracks whether the owning view is still on screen.
#[derive(Debug)]
pub(crate) struct Liveness(AtomicBool);

impl Liveness {
    pub(crate) fn new() -> Self {
        Self(AtomicBool::new(true))
    }

    pub(crate) fn is_active(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    pub(crate) fn close(&self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Lock view state, recovering it if a previous holder panicked.
///
/// View state is plain data that is always left consistent between statements.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
