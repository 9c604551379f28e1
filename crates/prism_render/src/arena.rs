//! # Handle Arena
//!
//! Backend-side storage behind [`ResourceHandle`]s: a slot array with a
//! free list and per-slot generation counters. Freed slots are reused, but
//! every reuse bumps the generation, so handles to the old occupant go
//! stale instead of aliasing the new one.
//!
//! # Thread Safety
//!
//! Not thread-safe by itself. The arena lives inside the backend, which is
//! mutated only by the render thread - that single-writer discipline is the
//! synchronization.

use crate::handle::ResourceHandle;

/// One slot of storage: the current generation plus the occupant, if any.
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

/// Generational slot arena mapping [`ResourceHandle`]s to values.
///
/// - `insert` is O(1), reusing a free slot when one exists
/// - `get`/`get_mut` validate slot and generation, returning `None` for
///   stale or never-issued handles
/// - `remove` bumps the slot generation so outstanding handles die
pub struct HandleArena<T> {
    slots: Vec<Slot<T>>,
    free_list: Vec<u32>,
    live: usize,
}

impl<T> HandleArena<T> {
    /// Creates an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Creates an empty arena with room for `capacity` values before
    /// reallocating.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            live: 0,
        }
    }

    /// Number of live values.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.live
    }

    /// Returns whether the arena holds no live values.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Inserts a value and returns its handle.
    ///
    /// Generations start at 1, so no issued handle ever equals
    /// [`ResourceHandle::NULL`].
    pub fn insert(&mut self, value: T) -> ResourceHandle {
        self.live += 1;
        if let Some(slot_index) = self.free_list.pop() {
            let slot = &mut self.slots[slot_index as usize];
            debug_assert!(slot.value.is_none(), "free list pointed at a live slot");
            slot.value = Some(value);
            return ResourceHandle::new(slot_index, slot.generation);
        }

        let slot_index = u32::try_from(self.slots.len()).expect("arena slot index overflow");
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        ResourceHandle::new(slot_index, 1)
    }

    /// Returns the value for `handle`, or `None` if the handle is null,
    /// stale, or was never issued by this arena.
    #[must_use]
    pub fn get(&self, handle: ResourceHandle) -> Option<&T> {
        let slot = self.slots.get(handle.slot() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_ref()
    }

    /// Mutable counterpart of [`get`](Self::get).
    pub fn get_mut(&mut self, handle: ResourceHandle) -> Option<&mut T> {
        let slot = self.slots.get_mut(handle.slot() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        slot.value.as_mut()
    }

    /// Returns whether `handle` currently names a live value.
    #[must_use]
    pub fn contains(&self, handle: ResourceHandle) -> bool {
        self.get(handle).is_some()
    }

    /// Removes and returns the value for `handle`, bumping the slot
    /// generation so every outstanding copy of the handle goes stale.
    ///
    /// Returns `None` (and changes nothing) for invalid handles, making
    /// double-free harmless.
    pub fn remove(&mut self, handle: ResourceHandle) -> Option<T> {
        let slot = self.slots.get_mut(handle.slot() as usize)?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free_list.push(handle.slot());
        self.live -= 1;
        Some(value)
    }

    /// Iterates over all live values with their handles.
    pub fn iter(&self) -> impl Iterator<Item = (ResourceHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.value.as_ref().map(|v| {
                let index = u32::try_from(index).expect("arena slot index overflow");
                (ResourceHandle::new(index, slot.generation), v)
            })
        })
    }
}

impl<T> Default for HandleArena<T> {
    fn default() -> Self {
        Self::new()
    }
}
