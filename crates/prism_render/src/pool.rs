//! # Handle Pools
//!
//! "Create me a new, empty resource" is by far the most common render call
//! that needs a result, and paying a thread hop for every one would stall
//! caller threads constantly. Each [`ResourceKind`] therefore keeps a
//! caller-side cache of pre-created handles: a warm pool serves an
//! allocation with a single lock and a pop, and only an empty pool pays
//! one blocking batch-creation round trip that refills it.
//!
//! ## Locking
//!
//! Each pool has its own mutex, independent of the command queue's
//! internals, so texture allocation never serializes against mesh
//! allocation or against unrelated command traffic. The lock is held
//! across the refill: concurrent allocators of the same kind wait on the
//! mutex while one of them performs the batch, which is exactly what makes
//! "exactly one refill per empty observation" and "no handle double-issue"
//! hold.

use crate::handle::{ResourceHandle, ResourceKind};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// Per-kind caches of pre-created, not-yet-assigned resource handles.
pub struct HandlePools {
    pools: [Mutex<Vec<ResourceHandle>>; ResourceKind::COUNT],
    refills: [AtomicU64; ResourceKind::COUNT],
    prealloc: usize,
}

impl HandlePools {
    /// Creates empty pools that refill in batches of `prealloc`.
    ///
    /// # Panics
    ///
    /// Panics if `prealloc` is zero - an empty batch could never satisfy
    /// the allocation that triggered it.
    #[must_use]
    pub fn new(prealloc: usize) -> Self {
        assert!(prealloc > 0, "pool prealloc size must be at least 1");
        Self {
            pools: std::array::from_fn(|_| Mutex::new(Vec::new())),
            refills: std::array::from_fn(|_| AtomicU64::new(0)),
            prealloc,
        }
    }

    /// Batch size used when a pool runs empty.
    #[inline]
    #[must_use]
    pub fn prealloc(&self) -> usize {
        self.prealloc
    }

    /// Pops a handle for `kind`, refilling first if the pool is empty.
    ///
    /// `refill` is invoked with the batch size and must return exactly that
    /// many freshly created handles; the façade implements it as one
    /// blocking batch-creation work item on the render thread. Pool
    /// exhaustion is not an error state - it just makes this call pay the
    /// thread hop.
    pub fn allocate<F>(&self, kind: ResourceKind, refill: F) -> ResourceHandle
    where
        F: FnOnce(usize) -> Vec<ResourceHandle>,
    {
        let mut pool = self.pools[kind.index()].lock();
        if pool.is_empty() {
            let batch = refill(self.prealloc);
            debug_assert_eq!(batch.len(), self.prealloc, "refill returned a short batch");
            pool.extend(batch);
            self.refills[kind.index()].fetch_add(1, Ordering::Relaxed);
            debug!(?kind, batch = self.prealloc, "handle pool refilled");
        }
        pool.pop().expect("refilled pool cannot be empty")
    }

    /// Drains and returns every cached handle for `kind`.
    ///
    /// Shutdown path: the façade frees the drained handles on the render
    /// thread. Handles already handed to callers are not in the pool and
    /// remain the caller's responsibility.
    #[must_use]
    pub fn drain(&self, kind: ResourceKind) -> Vec<ResourceHandle> {
        std::mem::take(&mut *self.pools[kind.index()].lock())
    }

    /// Number of handles currently cached for `kind`.
    #[must_use]
    pub fn cached(&self, kind: ResourceKind) -> usize {
        self.pools[kind.index()].lock().len()
    }

    /// Number of batch refills performed for `kind` so far.
    #[must_use]
    pub fn refill_count(&self, kind: ResourceKind) -> u64 {
        self.refills[kind.index()].load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU32;

    /// Refill helper issuing globally unique handles.
    fn counting_refill(counter: &AtomicU32) -> impl FnOnce(usize) -> Vec<ResourceHandle> + '_ {
        move |n| {
            (0..n)
                .map(|_| ResourceHandle::new(counter.fetch_add(1, Ordering::Relaxed), 1))
                .collect()
        }
    }

    #[test]
    fn test_warm_pool_skips_refill() {
        let pools = HandlePools::new(4);
        let counter = AtomicU32::new(0);

        let first = pools.allocate(ResourceKind::Texture, counting_refill(&counter));
        assert_eq!(pools.refill_count(ResourceKind::Texture), 1);
        assert_eq!(pools.cached(ResourceKind::Texture), 3);

        // Warm pops: no further refills.
        for _ in 0..3 {
            let h = pools.allocate(ResourceKind::Texture, |_| panic!("unexpected refill"));
            assert_ne!(h, first);
        }
        assert_eq!(pools.refill_count(ResourceKind::Texture), 1);
        assert_eq!(pools.cached(ResourceKind::Texture), 0);
    }

    #[test]
    fn test_n_plus_one_allocations_two_refills() {
        let pools = HandlePools::new(4);
        let counter = AtomicU32::new(0);

        for _ in 0..5 {
            let _ = pools.allocate(ResourceKind::Mesh, counting_refill(&counter));
        }

        assert_eq!(pools.refill_count(ResourceKind::Mesh), 2);
        // Two batches of 4 were created, 5 handed out.
        assert_eq!(counter.load(Ordering::Relaxed), 8);
        assert_eq!(pools.cached(ResourceKind::Mesh), 3);
    }

    #[test]
    fn test_pools_are_independent_per_kind() {
        let pools = HandlePools::new(2);
        let counter = AtomicU32::new(0);

        let _ = pools.allocate(ResourceKind::Texture, counting_refill(&counter));
        assert_eq!(pools.refill_count(ResourceKind::Texture), 1);
        assert_eq!(pools.refill_count(ResourceKind::Mesh), 0);
        assert_eq!(pools.cached(ResourceKind::Mesh), 0);
    }

    #[test]
    fn test_drain_empties_pool() {
        let pools = HandlePools::new(3);
        let counter = AtomicU32::new(0);

        let _ = pools.allocate(ResourceKind::Light, counting_refill(&counter));
        let drained = pools.drain(ResourceKind::Light);
        assert_eq!(drained.len(), 2);
        assert_eq!(pools.cached(ResourceKind::Light), 0);
        assert!(pools.drain(ResourceKind::Light).is_empty());
    }

    #[test]
    #[should_panic(expected = "pool prealloc size must be at least 1")]
    fn test_zero_prealloc_panics() {
        let _ = HandlePools::new(0);
    }
}
