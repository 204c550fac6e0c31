// Copyright (c) Microsoft Corporation.
// Licensed under the MIT license.

use core::cell::Cell;

/// Per-field memoized offsets for one payload.
///
/// Slot `i` holds the byte offset of field `i`. The extra slot at index
/// `field_count` holds the end offset of the last field. Slots are filled in
/// order, so if slot `i` is set then every slot before it is also set. A set
/// slot never changes until [`OffsetCache::reset`].
///
/// Uses `Cell` so that lookups through `&self` can fill slots. This makes the
/// cache (and any view holding it) `!Sync`.
#[derive(Clone, Debug)]
pub(crate) struct OffsetCache {
    slots: Box<[Cell<Option<usize>>]>,
    size_computations: Cell<usize>,
}

impl OffsetCache {
    /// Creates a cache with all slots unset for a schema of `field_count` fields.
    pub fn new(field_count: usize) -> Self {
        return Self {
            slots: vec![Cell::new(None); field_count + 1].into_boxed_slice(),
            size_computations: Cell::new(0),
        };
    }

    /// Number of slots: field count + 1.
    pub fn slot_count(&self) -> usize {
        return self.slots.len();
    }

    /// Returns the cached offset for slot `index`, if resolved.
    pub fn get(&self, index: usize) -> Option<usize> {
        return self.slots.get(index).and_then(|slot| slot.get());
    }

    /// Stores the offset for slot `index`. Slot must be unset or already hold
    /// the same value.
    pub fn set(&self, index: usize, offset: usize) {
        if let Some(slot) = self.slots.get(index) {
            debug_assert!(slot.get().map_or(true, |old| old == offset));
            slot.set(Some(offset));
        }
    }

    /// Returns `(slot, offset)` for the highest resolved slot at or below
    /// `index`, or `None` if no slot up to `index` is resolved.
    pub fn nearest_resolved(&self, index: usize) -> Option<(usize, usize)> {
        let last = index.min(self.slots.len().checked_sub(1)?);
        return (0..=last)
            .rev()
            .find_map(|slot| self.get(slot).map(|offset| (slot, offset)));
    }

    /// Counts one field-size computation.
    pub fn count_size_computation(&self) {
        self.size_computations
            .set(self.size_computations.get().saturating_add(1));
    }

    /// Number of field sizes computed since creation or the last reset.
    pub fn size_computations(&self) -> usize {
        return self.size_computations.get();
    }

    /// Number of resolved slots.
    pub fn resolved_count(&self) -> usize {
        return self.slots.iter().filter(|slot| slot.get().is_some()).count();
    }

    /// Returns every slot to unset and clears the size computation counter.
    pub fn reset(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot.get_mut() = None;
        }
        *self.size_computations.get_mut() = 0;
    }
}
