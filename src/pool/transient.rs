//! Transient Target Pool
//!
//! Render-target pool for short-lived, per-frame allocations. Effects borrow a
//! target early in the frame and hand it back before the frame ends; the
//! underlying storage stays in a free list and is handed out again the next
//! time an identical descriptor is requested.
//!
//! # Design
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │              TransientTargetPool<A>                 │
//! │                                                     │
//! │  active: SlotMap<TargetHandle, Pooled>              │
//! │  free:   HashMap<PoolKey, Vec<Pooled>>              │
//! │                                                     │
//! │  acquire(desc) → TargetHandle                       │
//! │  get(handle)   → &A::Target                         │
//! │  release(handle)   (idempotent)                     │
//! │  trim(n)           (drop long-idle free targets)    │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Handles are generational: once released, a handle never resolves again,
//! even after its slot is reused by a later acquire.

use rustc_hash::FxHashMap;
use slotmap::SlotMap;

use crate::errors::Result;
use crate::host::{TargetDesc, TargetHandle, TargetPool};

/// Creates the backing storage of pooled targets.
pub trait TargetAllocator {
    type Target;

    fn allocate(&mut self, desc: &TargetDesc) -> Result<Self::Target>;
}

/// Key for target recycling. The label is deliberately not part of it.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct PoolKey {
    width: u32,
    height: u32,
    format: wgpu::TextureFormat,
    depth_format: Option<wgpu::TextureFormat>,
    usage: wgpu::TextureUsages,
}

impl PoolKey {
    fn from_desc(desc: &TargetDesc) -> Self {
        Self {
            width: desc.width,
            height: desc.height,
            format: desc.format,
            depth_format: desc.depth_format,
            usage: desc.usage,
        }
    }
}

struct Pooled<T> {
    target: T,
    key: PoolKey,
    /// Number of trims this target has survived in the free list.
    idle_frames: u32,
}

/// Pool of transient render targets backed by an allocator `A`.
pub struct TransientTargetPool<A: TargetAllocator> {
    allocator: A,
    active: SlotMap<TargetHandle, Pooled<A::Target>>,
    free: FxHashMap<PoolKey, Vec<Pooled<A::Target>>>,
    allocations: u64,
}

impl<A: TargetAllocator> TransientTargetPool<A> {
    #[must_use]
    pub fn new(allocator: A) -> Self {
        Self {
            allocator,
            active: SlotMap::with_key(),
            free: FxHashMap::default(),
            allocations: 0,
        }
    }

    /// Borrows a target matching `desc`, reusing a free one when possible.
    pub fn acquire(&mut self, desc: &TargetDesc) -> Result<TargetHandle> {
        let key = PoolKey::from_desc(desc);

        let reused = self.free.get_mut(&key).and_then(Vec::pop);
        let pooled = match reused {
            Some(mut p) => {
                p.idle_frames = 0;
                p
            }
            None => {
                let target = self.allocator.allocate(desc)?;
                self.allocations += 1;
                log::debug!(
                    "Transient pool: allocated '{}' {}x{} {:?}",
                    desc.label,
                    desc.width,
                    desc.height,
                    desc.format
                );
                Pooled {
                    target,
                    key,
                    idle_frames: 0,
                }
            }
        };

        Ok(self.active.insert(pooled))
    }

    /// Returns a target to the free list.
    ///
    /// Returns `false` (and does nothing) when the handle is not active.
    pub fn release(&mut self, handle: TargetHandle) -> bool {
        match self.active.remove(handle) {
            Some(pooled) => {
                self.free.entry(pooled.key.clone()).or_default().push(pooled);
                true
            }
            None => {
                log::trace!("Transient pool: ignoring release of inactive {handle:?}");
                false
            }
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, handle: TargetHandle) -> Option<&A::Target> {
        self.active.get(handle).map(|p| &p.target)
    }

    #[inline]
    pub fn get_mut(&mut self, handle: TargetHandle) -> Option<&mut A::Target> {
        self.active.get_mut(handle).map(|p| &mut p.target)
    }

    #[inline]
    #[must_use]
    pub fn is_active(&self, handle: TargetHandle) -> bool {
        self.active.contains_key(handle)
    }

    /// Releases free targets that have been idle for more than
    /// `max_idle_frames` calls to this method.
    ///
    /// Call once per frame, or after a resolution change.
    pub fn trim(&mut self, max_idle_frames: u32) {
        for bucket in self.free.values_mut() {
            for p in bucket.iter_mut() {
                p.idle_frames += 1;
            }
            bucket.retain(|p| p.idle_frames <= max_idle_frames);
        }
        self.free.retain(|_, bucket| !bucket.is_empty());
    }

    #[inline]
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    #[must_use]
    pub fn free_count(&self) -> usize {
        self.free.values().map(Vec::len).sum()
    }

    /// Total targets held by the pool, active and free.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.active_count() + self.free_count()
    }

    /// Number of times the allocator was asked for new storage.
    #[inline]
    #[must_use]
    pub fn allocation_count(&self) -> u64 {
        self.allocations
    }

    #[inline]
    pub fn allocator(&self) -> &A {
        &self.allocator
    }

    #[inline]
    pub fn allocator_mut(&mut self) -> &mut A {
        &mut self.allocator
    }
}

impl<A: TargetAllocator> TargetPool for TransientTargetPool<A> {
    fn get_temporary(&mut self, desc: &TargetDesc) -> Result<TargetHandle> {
        self.acquire(desc)
    }

    fn release_temporary(&mut self, handle: TargetHandle) {
        self.release(handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::RayMarchError;

    #[derive(Default)]
    struct CountingAllocator {
        next: u32,
        fail: bool,
    }

    impl TargetAllocator for CountingAllocator {
        type Target = u32;

        fn allocate(&mut self, desc: &TargetDesc) -> Result<u32> {
            if self.fail {
                return Err(RayMarchError::TargetAllocationFailed {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    reason: "test".into(),
                });
            }
            self.next += 1;
            Ok(self.next)
        }
    }

    fn pool() -> TransientTargetPool<CountingAllocator> {
        TransientTargetPool::new(CountingAllocator::default())
    }

    #[test]
    fn release_then_acquire_reuses_storage() {
        let mut pool = pool();
        let desc = TargetDesc::back_face_depth(512, 512);

        let a = pool.acquire(&desc).unwrap();
        let storage = *pool.get(a).unwrap();
        assert!(pool.release(a));

        let b = pool.acquire(&desc).unwrap();
        assert_eq!(*pool.get(b).unwrap(), storage);
        assert_eq!(pool.allocation_count(), 1);
        assert_eq!(pool.total_count(), 1);
    }

    #[test]
    fn stale_handle_never_resolves() {
        let mut pool = pool();
        let desc = TargetDesc::back_face_depth(64, 64);

        let a = pool.acquire(&desc).unwrap();
        pool.release(a);
        let b = pool.acquire(&desc).unwrap();

        assert_ne!(a, b);
        assert!(pool.get(a).is_none());
        assert!(!pool.release(a));
        assert!(pool.is_active(b));
    }

    #[test]
    fn different_sizes_do_not_share() {
        let mut pool = pool();
        let a = pool.acquire(&TargetDesc::back_face_depth(64, 64)).unwrap();
        pool.release(a);
        let _b = pool.acquire(&TargetDesc::back_face_depth(128, 64)).unwrap();
        assert_eq!(pool.allocation_count(), 2);
        assert_eq!(pool.free_count(), 1);
    }

    #[test]
    fn trim_drops_idle_targets() {
        let mut pool = pool();
        let a = pool.acquire(&TargetDesc::back_face_depth(32, 32)).unwrap();
        pool.release(a);

        pool.trim(1);
        assert_eq!(pool.free_count(), 1);
        pool.trim(1);
        assert_eq!(pool.free_count(), 0);
    }

    #[test]
    fn failed_allocation_holds_nothing() {
        let mut pool = pool();
        pool.allocator_mut().fail = true;
        assert!(pool.acquire(&TargetDesc::back_face_depth(32, 32)).is_err());
        assert_eq!(pool.total_count(), 0);
    }
}
