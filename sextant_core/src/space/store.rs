// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays space storage with reference counting.

use std::sync::Arc;

use crate::device::{InputName, TrackedDevice};
use crate::math::Pose;

use super::id::{INVALID, SpaceId};

/// What a space contributes to a relation chain.
#[derive(Clone, Debug)]
pub enum SpaceKind {
    /// Contributes nothing; an offset of exactly identity.
    Null,
    /// A fixed pose relative to the parent.
    Offset(Pose),
    /// The live pose of a device input, relative to the device's space.
    Pose {
        /// The tracked device.
        device: Arc<dyn TrackedDevice>,
        /// Which of its inputs.
        input: InputName,
    },
    /// Terminates every walk. Exactly one per overseer.
    Root,
}

impl SpaceKind {
    /// The payload-free variant tag.
    #[must_use]
    pub fn ty(&self) -> SpaceType {
        match self {
            Self::Null => SpaceType::Null,
            Self::Offset(_) => SpaceType::Offset,
            Self::Pose { .. } => SpaceType::Pose,
            Self::Root => SpaceType::Root,
        }
    }
}

/// Variant tag of a [`SpaceKind`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpaceType {
    /// See [`SpaceKind::Null`].
    Null,
    /// See [`SpaceKind::Offset`].
    Offset,
    /// See [`SpaceKind::Pose`].
    Pose,
    /// See [`SpaceKind::Root`].
    Root,
}

/// Struct-of-arrays storage for all spaces.
///
/// Spaces are addressed by [`SpaceId`] handles. Each live slot carries a
/// strong reference count; every child holds one reference on its parent, so
/// a parent outlives all of its descendants. Parents are fixed at allocation
/// and never rebound, which keeps the graph a tree rooted at the single root
/// slot. Freed slots are recycled via a free list, and generation counters
/// prevent stale handle access.
#[derive(Debug, Default)]
pub struct SpaceStore {
    pub(crate) kind: Vec<SpaceKind>,
    pub(crate) parent: Vec<u32>,
    pub(crate) refcount: Vec<u32>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,
}

impl SpaceStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates a space with a reference count of one.
    ///
    /// Takes a reference on `parent`, which must be `None` exactly when
    /// `kind` is [`SpaceKind::Root`].
    ///
    /// # Panics
    ///
    /// Panics if the parent handle is stale or the parent/kind pairing is
    /// wrong.
    pub fn alloc(&mut self, kind: SpaceKind, parent: Option<SpaceId>) -> SpaceId {
        assert_eq!(
            parent.is_none(),
            matches!(kind, SpaceKind::Root),
            "only the root space may be parentless"
        );
        let parent_idx = match parent {
            Some(p) => {
                self.validate(p);
                self.refcount[p.idx as usize] += 1;
                p.idx
            }
            None => INVALID,
        };

        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot; its generation was bumped when it was freed.
            self.kind[idx as usize] = kind;
            self.parent[idx as usize] = parent_idx;
            self.refcount[idx as usize] = 1;
            idx
        } else {
            let idx = self.len;
            self.len += 1;
            self.kind.push(kind);
            self.parent.push(parent_idx);
            self.refcount.push(1);
            self.generation.push(0);
            idx
        };

        SpaceId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    /// Adds a strong reference.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn retain(&mut self, id: SpaceId) {
        self.validate(id);
        self.refcount[id.idx as usize] += 1;
    }

    /// Drops a strong reference, freeing the slot at zero.
    ///
    /// Freeing a slot drops its reference on the parent, which may cascade up
    /// the tree. The cascade is a loop, not recursion. Returns every space
    /// that was freed, leaf first, with the kind it held. Dropping a kind can
    /// drop the last reference to a device, so callers holding a lock should
    /// let go of it first.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    pub fn release(&mut self, id: SpaceId) -> Vec<(SpaceId, SpaceKind)> {
        let mut freed = Vec::new();
        let mut current = id;
        loop {
            self.validate(current);
            let idx = current.idx as usize;
            self.refcount[idx] -= 1;
            if self.refcount[idx] > 0 {
                break;
            }

            let parent = self.parent[idx];
            let kind = core::mem::replace(&mut self.kind[idx], SpaceKind::Null);
            self.parent[idx] = INVALID;
            // Bump generation so old handles immediately fail validation.
            self.generation[idx] += 1;
            self.free_list.push(current.idx);
            freed.push((current, kind));

            if parent == INVALID {
                break;
            }
            current = SpaceId {
                idx: parent,
                generation: self.generation[parent as usize],
            };
        }
        freed
    }

    /// Returns whether the given handle refers to a live space.
    #[must_use]
    pub fn is_alive(&self, id: SpaceId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.refcount[id.idx as usize] > 0
    }

    /// Number of live spaces.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.len as usize - self.free_list.len()
    }

    /// Returns the space's parent, `None` for the root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent(&self, id: SpaceId) -> Option<SpaceId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        if p == INVALID {
            None
        } else {
            Some(SpaceId {
                idx: p,
                generation: self.generation[p as usize],
            })
        }
    }

    /// Returns what the space contributes to a chain.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn kind(&self, id: SpaceId) -> &SpaceKind {
        self.validate(id);
        &self.kind[id.idx as usize]
    }

    /// Returns the current strong reference count.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn refcount(&self, id: SpaceId) -> u32 {
        self.validate(id);
        self.refcount[id.idx as usize]
    }

    /// Returns `id` and its ancestors in root-ward order, stopping before the
    /// root. Empty when `id` is the root.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn path_to_root(&self, id: SpaceId) -> Vec<SpaceId> {
        self.validate(id);
        let mut path = Vec::new();
        let mut idx = id.idx;
        while !matches!(self.kind[idx as usize], SpaceKind::Root) {
            path.push(SpaceId {
                idx,
                generation: self.generation[idx as usize],
            });
            idx = self.parent[idx as usize];
            debug_assert!(idx != INVALID, "non-root space without a parent");
        }
        path
    }

    fn validate(&self, id: SpaceId) {
        assert!(
            id.idx < self.len
                && self.generation[id.idx as usize] == id.generation
                && self.refcount[id.idx as usize] > 0,
            "stale SpaceId: {id:?} (current gen: {})",
            if id.idx < self.len {
                self.generation[id.idx as usize]
            } else {
                u32::MAX
            }
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn store_with_root() -> (SpaceStore, SpaceId) {
        let mut store = SpaceStore::new();
        let root = store.alloc(SpaceKind::Root, None);
        (store, root)
    }

    #[test]
    fn alloc_takes_parent_reference() {
        let (mut store, root) = store_with_root();
        assert_eq!(store.refcount(root), 1, "root starts with one reference");
        let child = store.alloc(SpaceKind::Null, Some(root));
        assert_eq!(store.refcount(root), 2, "child holds its parent");
        assert_eq!(store.refcount(child), 1, "caller holds the child");
        assert_eq!(store.parent(child), Some(root), "parent link");
        assert_eq!(store.parent(root), None, "root has no parent");
    }

    #[test]
    fn release_cascades_to_unreferenced_parents() {
        let (mut store, root) = store_with_root();
        let a = store.alloc(SpaceKind::Offset(Pose::from_position(Vec3::X)), Some(root));
        let b = store.alloc(SpaceKind::Null, Some(a));
        // Caller drops its own handle on `a`; `b` still keeps it alive.
        assert!(store.release(a).is_empty(), "a is still referenced by b");
        assert!(store.is_alive(a), "a alive through b");

        let freed = store.release(b);
        let ids: Vec<SpaceId> = freed.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![b, a], "b then a freed, leaf first");
        assert!(
            matches!(freed[1].1, SpaceKind::Offset(_)),
            "freed kinds are handed back"
        );
        assert!(!store.is_alive(a), "a freed");
        assert_eq!(store.refcount(root), 1, "root back to one reference");
        assert_eq!(store.live_count(), 1, "only root left");
    }

    #[test]
    fn generation_prevents_stale_access() {
        let (mut store, root) = store_with_root();
        let id1 = store.alloc(SpaceKind::Null, Some(root));
        store.release(id1);
        let id2 = store.alloc(SpaceKind::Null, Some(root));
        // id2 reuses the same slot but has a different generation.
        assert!(!store.is_alive(id1), "old handle is stale");
        assert!(store.is_alive(id2), "new handle is live");
        assert_eq!(id1.idx, id2.idx, "slot reused");
        assert_ne!(id1.generation, id2.generation, "generation bumped");
    }

    #[test]
    #[should_panic(expected = "stale SpaceId")]
    fn stale_handle_panics() {
        let (mut store, root) = store_with_root();
        let id = store.alloc(SpaceKind::Null, Some(root));
        store.release(id);
        let _ = store.kind(id);
    }

    #[test]
    #[should_panic(expected = "only the root space may be parentless")]
    fn parentless_non_root_panics() {
        let mut store = SpaceStore::new();
        let _ = store.alloc(SpaceKind::Null, None);
    }

    #[test]
    fn path_to_root_is_leaf_first_and_excludes_root() {
        let (mut store, root) = store_with_root();
        let a = store.alloc(SpaceKind::Null, Some(root));
        let b = store.alloc(SpaceKind::Null, Some(a));
        let c = store.alloc(SpaceKind::Null, Some(b));
        assert_eq!(store.path_to_root(c), vec![c, b, a], "leaf first");
        assert!(store.path_to_root(root).is_empty(), "root has empty path");
    }

    #[test]
    fn deep_chain_release_does_not_recurse() {
        let (mut store, root) = store_with_root();
        let mut ids = vec![root];
        for _ in 0..10_000 {
            let parent = *ids.last().unwrap();
            ids.push(store.alloc(SpaceKind::Null, Some(parent)));
        }
        // Hand back every intermediate caller reference, keep only the leaf.
        for &id in &ids[1..ids.len() - 1] {
            store.release(id);
        }
        let leaf = *ids.last().unwrap();
        assert_eq!(store.path_to_root(leaf).len(), 10_000, "deep path");
        assert_eq!(store.release(leaf).len(), 10_000, "whole chain freed");
        assert_eq!(store.live_count(), 1, "only root left");
    }
}
