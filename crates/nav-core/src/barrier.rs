//! Coarse-grained barrier between path searches (readers) and graph mutation.
//!
//! Searches hold a read guard for their whole duration. Mutations are queued and
//! applied together under the write lock, so a search never observes a half-applied
//! update. Locking is per barrier (one per graph set), never per node.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

type WorkItem<T> = Box<dyn FnOnce(&mut T) + Send>;

pub struct SafeUpdateBarrier<T> {
    state: RwLock<T>,
    pending: Mutex<VecDeque<WorkItem<T>>>,
    generation: AtomicU64,
}

/// Read access held by an in-flight search.
pub struct SearchGuard<'a, T> {
    guard: RwLockReadGuard<'a, T>,
    generation: u64,
}

impl<T> SearchGuard<'_, T> {
    /// Generation observed when the search started.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T> std::ops::Deref for SearchGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.guard
    }
}

impl<T> SafeUpdateBarrier<T> {
    pub fn new(state: T) -> Self {
        Self {
            state: RwLock::new(state),
            pending: Mutex::new(VecDeque::new()),
            generation: AtomicU64::new(0),
        }
    }

    /// Starts a search. Blocks only while a flush is running.
    pub fn read(&self) -> SearchGuard<'_, T> {
        let guard = self.state.read();
        SearchGuard {
            generation: self.generation.load(Ordering::Acquire),
            guard,
        }
    }

    /// Queues a mutation for the next flush.
    pub fn register_update(&self, work: impl FnOnce(&mut T) + Send + 'static) {
        self.pending.lock().push_back(Box::new(work));
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Applies all queued work if no search is in flight. Returns `None` when deferred.
    pub fn try_flush(&self) -> Option<usize> {
        let guard = self.state.try_write()?;
        Some(self.apply_pending(guard))
    }

    /// Waits for in-flight searches to finish, then applies all queued work.
    pub fn flush(&self) -> usize {
        let guard = self.state.write();
        self.apply_pending(guard)
    }

    fn apply_pending(&self, mut guard: RwLockWriteGuard<'_, T>) -> usize {
        let work: Vec<WorkItem<T>> = self.pending.lock().drain(..).collect();
        if work.is_empty() {
            return 0;
        }
        let count = work.len();
        for item in work {
            item(&mut *guard);
        }
        let generation = self.generation.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::debug!(count, generation, "Applied queued graph updates");
        count
    }

    /// Observed generation is stale when it differs from the current one.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    pub fn into_inner(self) -> T {
        self.state.into_inner()
    }
}
