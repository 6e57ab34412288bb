// SPDX-FileCopyrightText: 2026 Contributors to the wg media glue project.
// SPDX-License-Identifier: Apache-2.0

//! Generation-checked handle arena.
//!
//! Records handed across the parameter-block boundary are stored in a
//! [`HandleTable`] and referenced by an opaque [`Handle`]. A handle packs a
//! slot index and the slot's generation; removing a record bumps the
//! generation, so a stale handle is rejected instead of aliasing whatever
//! record reuses the slot.

use std::fmt;

/// Opaque token identifying a record in a [`HandleTable`].
///
/// The raw value `0` is reserved as the null handle.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Handle(u64);

impl Handle {
    /// The null handle, never issued by a table.
    pub const NULL: Handle = Handle(0);

    fn new(index: u32, generation: u32) -> Self {
        Handle(((generation as u64) << 32) | index as u64)
    }

    /// Rebuilds a handle from the raw value previously returned by
    /// [`Handle::into_raw`].
    pub fn from_raw(raw: u64) -> Self {
        Handle(raw)
    }

    pub fn into_raw(self) -> u64 {
        self.0
    }

    pub fn is_null(self) -> bool {
        self.0 == 0
    }

    fn index(self) -> usize {
        (self.0 & u32::MAX as u64) as usize
    }

    fn generation(self) -> u32 {
        (self.0 >> 32) as u32
    }
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handle({}v{})", self.index(), self.generation())
    }
}

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

struct Slot<T> {
    // Generations start at 1 so that no live handle equals Handle::NULL.
    generation: u32,
    value: Option<T>,
}

/// Arena of records addressed by generation-checked [`Handle`]s.
pub struct HandleTable<T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    len: usize,
}

impl<T> Default for HandleTable<T> {
    fn default() -> Self {
        HandleTable {
            slots: Vec::new(),
            free: Vec::new(),
            len: 0,
        }
    }
}

impl<T> HandleTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `value` and returns its handle.
    pub fn insert(&mut self, value: T) -> Handle {
        self.len += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.value = Some(value);
            return Handle::new(index, slot.generation);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 1,
            value: Some(value),
        });
        Handle::new(index, 1)
    }

    pub fn get(&self, handle: Handle) -> Option<&T> {
        self.slots
            .get(handle.index())
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
    }

    /// Removes and returns the record behind `handle`.
    ///
    /// Returns `None` for the null handle, a stale handle, or a handle that
    /// was already removed.
    pub fn remove(&mut self, handle: Handle) -> Option<T> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation() {
            return None;
        }
        let value = slot.value.take()?;
        slot.generation = match slot.generation.wrapping_add(1) {
            0 => 1,
            next => next,
        };
        self.free.push(handle.index() as u32);
        self.len -= 1;
        Some(value)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Removes every record, invalidating all outstanding handles.
    pub fn drain(&mut self) -> Vec<T> {
        let handles: Vec<Handle> = self
            .slots
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.value.is_some())
            .map(|(index, slot)| Handle::new(index as u32, slot.generation))
            .collect();
        handles.into_iter().filter_map(|h| self.remove(h)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_handles_are_never_null() {
        let mut table = HandleTable::new();
        let first = table.insert("a");
        let second = table.insert("b");
        assert!(!first.is_null());
        assert!(!second.is_null());
        assert_ne!(first, second);
        assert_eq!(table.get(first), Some(&"a"));
        assert_eq!(table.get(second), Some(&"b"));
    }

    #[test]
    fn removed_handle_is_rejected_after_slot_reuse() {
        let mut table = HandleTable::new();
        let stale = table.insert(1);
        assert_eq!(table.remove(stale), Some(1));
        let fresh = table.insert(2);

        assert_eq!(stale.index(), fresh.index());
        assert_ne!(stale, fresh);
        assert_eq!(table.get(stale), None);
        assert_eq!(table.remove(stale), None);
        assert_eq!(table.get(fresh), Some(&2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn double_remove_is_detected() {
        let mut table = HandleTable::new();
        let handle = table.insert(());
        assert!(table.remove(handle).is_some());
        assert!(table.remove(handle).is_none());
        assert!(table.is_empty());
    }

    #[test]
    fn null_handle_resolves_to_nothing() {
        let mut table: HandleTable<u8> = HandleTable::new();
        table.insert(7);
        assert!(table.get(Handle::NULL).is_none());
        assert!(table.remove(Handle::NULL).is_none());
    }

    #[test]
    fn drain_invalidates_every_handle() {
        let mut table = HandleTable::new();
        let a = table.insert('a');
        let b = table.insert('b');
        table.remove(a);
        let c = table.insert('c');
        assert_eq!(table.drain(), vec!['c', 'b']);
        assert!(table.is_empty());
        assert!(table.get(b).is_none());
        assert!(table.get(c).is_none());
    }

    #[test]
    fn raw_round_trip_preserves_handle() {
        let mut table = HandleTable::new();
        let handle = table.insert("x");
        assert_eq!(Handle::from_raw(handle.into_raw()), handle);
    }
}
