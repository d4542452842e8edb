//! Dense ID-keyed storage for modules, ports, and nets.

use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use std::ops::{Index, IndexMut};

/// An ID that addresses a slot of an [`Arena`].
pub trait ArenaId: Copy {
    /// Builds the ID of slot `index`.
    fn from_raw(index: u32) -> Self;

    /// The slot this ID addresses.
    fn as_raw(self) -> u32;
}

/// Append-only storage where each item is addressed by the ID it was
/// allocated under. Items are never removed, so IDs stay dense.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent, bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct Arena<I, T> {
    slots: Vec<T>,
    #[serde(skip)]
    ids: PhantomData<fn() -> I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    /// An empty arena.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            ids: PhantomData,
        }
    }

    /// Stores `item` under the next free ID.
    pub fn alloc(&mut self, item: T) -> I {
        let id = I::from_raw(self.slots.len() as u32);
        self.slots.push(item);
        id
    }

    /// The item stored under `id`, if `id` belongs to this arena.
    pub fn get(&self, id: I) -> Option<&T> {
        self.slots.get(id.as_raw() as usize)
    }

    /// Mutable access to the item stored under `id`.
    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        self.slots.get_mut(id.as_raw() as usize)
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` if nothing was allocated yet.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// `(id, item)` pairs in allocation order.
    pub fn iter(&self) -> impl Iterator<Item = (I, &T)> {
        (0u32..).map(I::from_raw).zip(self.slots.iter())
    }
}

impl<I: ArenaId, T> Index<I> for Arena<I, T> {
    type Output = T;

    fn index(&self, id: I) -> &T {
        &self.slots[id.as_raw() as usize]
    }
}

impl<I: ArenaId, T> IndexMut<I> for Arena<I, T> {
    fn index_mut(&mut self, id: I) -> &mut T {
        &mut self.slots[id.as_raw() as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{NetId, PortId};

    #[test]
    fn ports_get_dense_ids() {
        let mut ports: Arena<PortId, &str> = Arena::new();
        let clk = ports.alloc("clk");
        let out = ports.alloc("out");
        assert_eq!((clk.as_raw(), out.as_raw()), (0, 1));
        assert_eq!(ports[out], "out");
        let names: Vec<(u32, &str)> = ports.iter().map(|(id, n)| (id.as_raw(), *n)).collect();
        assert_eq!(names, vec![(0, "clk"), (1, "out")]);
    }

    #[test]
    fn foreign_ids_are_absent() {
        let mut nets: Arena<NetId, Vec<u32>> = Arena::new();
        assert!(nets.is_empty());
        let id = nets.alloc(Vec::new());
        nets[id].push(4);
        if let Some(sinks) = nets.get_mut(id) {
            sinks.push(5);
        }
        assert_eq!(nets.get(id), Some(&vec![4, 5]));
        assert!(nets.get(NetId::from_raw(7)).is_none());
    }

    #[test]
    fn serializes_as_a_plain_list() {
        let mut ports: Arena<PortId, String> = Arena::new();
        ports.alloc("sram".to_string());
        let json = serde_json::to_string(&ports).unwrap();
        assert_eq!(json, r#"["sram"]"#);
        let back: Arena<PortId, String> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.len(), 1);
        assert_eq!(back[PortId::from_raw(0)], "sram");
    }
}
