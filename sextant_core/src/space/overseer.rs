// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The space overseer: owner of the space graph.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::device::{DeviceId, InputName, TrackedDevice};
use crate::error::SpaceError;
use crate::math::Pose;
use crate::relation::{RelationChain, SpaceRelation};
use crate::trace::{Level, SpaceEvent, Tracer};

use super::id::SpaceId;
use super::store::{SpaceKind, SpaceStore};

/// The well-known spaces the state tracker maps reference spaces onto.
///
/// Handles here are borrowed from the overseer, which holds one reference
/// per occupied slot. Retain a handle before keeping it past the next
/// [`SpaceOverseer::set_semantic_space`] call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SemanticSpaces {
    /// The root of the graph. Always present.
    pub root: SpaceId,
    /// The viewer's head.
    pub view: Option<SpaceId>,
    /// A seated, gravity-aligned space near the user.
    pub local: Option<SpaceId>,
    /// The play area floor.
    pub stage: Option<SpaceId>,
    /// A world-locked space for large-scale experiences.
    pub unbounded: Option<SpaceId>,
}

/// A replaceable semantic slot. The root slot is fixed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SemanticSlot {
    /// [`SemanticSpaces::view`].
    View,
    /// [`SemanticSpaces::local`].
    Local,
    /// [`SemanticSpaces::stage`].
    Stage,
    /// [`SemanticSpaces::unbounded`].
    Unbounded,
}

#[derive(Debug)]
struct Graph {
    store: SpaceStore,
    semantic: SemanticSpaces,
    /// Each entry holds a reference on its space.
    devices: HashMap<DeviceId, SpaceId>,
}

impl Graph {
    fn slot_mut(&mut self, slot: SemanticSlot) -> &mut Option<SpaceId> {
        match slot {
            SemanticSlot::View => &mut self.semantic.view,
            SemanticSlot::Local => &mut self.semantic.local,
            SemanticSlot::Stage => &mut self.semantic.stage,
            SemanticSlot::Unbounded => &mut self.semantic.unbounded,
        }
    }

    fn device_space(&self, device: DeviceId) -> Option<SpaceId> {
        self.devices.get(&device).copied()
    }

    /// Pushes `target` and its ancestors root-ward, then the inverses of
    /// `base` and its ancestors leaf-ward.
    ///
    /// Device poses are sampled here, so this runs under the read lock.
    fn build_relation_chain(
        &self,
        chain: &mut RelationChain,
        base: SpaceId,
        target: SpaceId,
        at_timestamp_ns: u64,
    ) {
        for id in self.store.path_to_root(target) {
            match self.store.kind(id) {
                SpaceKind::Null | SpaceKind::Root => {}
                SpaceKind::Offset(pose) => chain.push_pose_if_not_identity(pose),
                SpaceKind::Pose { device, input } => {
                    chain.push_relation(&device.get_tracked_pose(*input, at_timestamp_ns));
                }
            }
        }

        for id in self.store.path_to_root(base).into_iter().rev() {
            match self.store.kind(id) {
                SpaceKind::Null | SpaceKind::Root => {}
                SpaceKind::Offset(pose) => chain.push_inverted_pose_if_not_identity(pose),
                SpaceKind::Pose { device, input } => {
                    chain.push_inverted_relation(&device.get_tracked_pose(*input, at_timestamp_ns));
                }
            }
        }
    }
}

/// Owns the space graph and resolves relations between spaces.
///
/// A single reader/writer lock guards the graph, the semantic slots and the
/// device map. Locating takes the read lock, so any number of threads can
/// locate at once; allocation, release and device linking take the write
/// lock.
#[derive(Debug)]
pub struct SpaceOverseer {
    graph: RwLock<Graph>,
    tracer: Tracer,
}

impl SpaceOverseer {
    /// Creates an overseer holding only the root space.
    #[must_use]
    pub fn new(tracer: Tracer) -> Self {
        let mut store = SpaceStore::new();
        let root = store.alloc(SpaceKind::Root, None);
        tracer.space(&SpaceEvent::Created {
            space: root,
            ty: super::SpaceType::Root,
            parent: None,
        });
        Self {
            graph: RwLock::new(Graph {
                store,
                semantic: SemanticSpaces {
                    root,
                    view: None,
                    local: None,
                    stage: None,
                    unbounded: None,
                },
                devices: HashMap::new(),
            }),
            tracer,
        }
    }

    /// The root space. Borrowed; retain it to keep it past the overseer.
    #[must_use]
    pub fn root(&self) -> SpaceId {
        self.graph.read().semantic.root
    }

    /// The tracer this overseer reports to.
    #[must_use]
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    /// A snapshot of the semantic slots.
    #[must_use]
    pub fn semantic(&self) -> SemanticSpaces {
        self.graph.read().semantic
    }

    // -- Creation --

    fn create_space(&self, kind: SpaceKind, parent: SpaceId) -> SpaceId {
        let ty = kind.ty();
        let id = self.graph.write().store.alloc(kind, Some(parent));
        self.tracer.space(&SpaceEvent::Created {
            space: id,
            ty,
            parent: Some(parent),
        });
        id
    }

    /// Creates a space that sits exactly on `parent`.
    pub fn create_null_space(&self, parent: SpaceId) -> SpaceId {
        self.create_space(SpaceKind::Null, parent)
    }

    /// Creates a space at a fixed `offset` from `parent`.
    ///
    /// An identity offset yields a null space, which contributes nothing to
    /// relation chains.
    pub fn create_offset_space(&self, parent: SpaceId, offset: &Pose) -> SpaceId {
        if offset.is_identity() {
            self.create_null_space(parent)
        } else {
            self.create_space(SpaceKind::Offset(*offset), parent)
        }
    }

    /// Creates a space following `input` on `device`, parented to the
    /// space the device is linked to.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DeviceNotLinked`] if no space was linked to the
    /// device.
    pub fn create_pose_space(
        &self,
        device: &Arc<dyn TrackedDevice>,
        input: InputName,
    ) -> Result<SpaceId, SpaceError> {
        let id = {
            let mut graph = self.graph.write();
            let parent = self.find_device_space(&graph, device.id())?;
            graph.store.alloc(
                SpaceKind::Pose {
                    device: Arc::clone(device),
                    input,
                },
                Some(parent),
            )
        };
        self.tracer.space(&SpaceEvent::Created {
            space: id,
            ty: super::SpaceType::Pose,
            parent: self.parent_of(id),
        });
        Ok(id)
    }

    fn find_device_space(&self, graph: &Graph, device: DeviceId) -> Result<SpaceId, SpaceError> {
        graph.device_space(device).ok_or_else(|| {
            self.tracer.log(
                Level::ERROR,
                format_args!("looking for space belonging to unknown device {device:?}"),
            );
            SpaceError::DeviceNotLinked { device }
        })
    }

    // -- References --

    /// Adds a reference to `space`, returning the same handle for the new
    /// owner.
    pub fn retain_space(&self, space: SpaceId) -> SpaceId {
        self.graph.write().store.retain(space);
        space
    }

    /// Gives back one reference to `space`. Spaces no longer referenced by
    /// anyone (callers, children, device links or semantic slots) are freed.
    ///
    /// Freed pose spaces drop their device only after the lock is released,
    /// so a device may call back into the overseer from its `Drop`.
    pub fn release_space(&self, space: SpaceId) {
        let freed = self.graph.write().store.release(space);
        for (space, _kind) in &freed {
            self.tracer.space(&SpaceEvent::Destroyed { space: *space });
        }
        drop(freed);
    }

    // -- Builder helpers --

    /// Associates `device` with `space`, replacing any previous association.
    ///
    /// The map takes its own reference on `space`. The reference held on the
    /// replaced space is dropped only after the lock is released.
    pub fn link_space_to_device(&self, space: SpaceId, device: DeviceId) {
        let replaced = {
            let mut graph = self.graph.write();
            graph.store.retain(space);
            graph.devices.insert(device, space)
        };

        match replaced {
            // Same link again; only the extra reference needs handing back.
            Some(old) if old == space => {}
            Some(old) => {
                self.tracer.log(
                    Level::WARN,
                    format_args!("device {device:?} already had space {old:?}, replacing it"),
                );
                self.tracer.space(&SpaceEvent::Linked {
                    device,
                    space,
                    replaced,
                });
            }
            None => self.tracer.space(&SpaceEvent::Linked {
                device,
                space,
                replaced,
            }),
        }
        if let Some(old) = replaced {
            self.release_space(old);
        }
    }

    /// Fills a semantic slot, taking a reference on the new space and
    /// dropping the one held on the previous occupant.
    pub fn set_semantic_space(&self, slot: SemanticSlot, space: Option<SpaceId>) {
        let old = {
            let mut graph = self.graph.write();
            if let Some(space) = space {
                graph.store.retain(space);
            }
            core::mem::replace(graph.slot_mut(slot), space)
        };
        if let Some(old) = old {
            self.release_space(old);
        }
    }

    // -- Queries --

    /// The parent of `space`, `None` for the root.
    #[must_use]
    pub fn parent_of(&self, space: SpaceId) -> Option<SpaceId> {
        self.graph.read().store.parent(space)
    }

    /// Whether `space` still refers to a live space.
    #[must_use]
    pub fn is_alive(&self, space: SpaceId) -> bool {
        self.graph.read().store.is_alive(space)
    }

    /// Number of live spaces, the root included.
    #[must_use]
    pub fn live_spaces(&self) -> usize {
        self.graph.read().store.live_count()
    }

    /// The space `device` is linked to, if any.
    #[must_use]
    pub fn device_space(&self, device: DeviceId) -> Option<SpaceId> {
        self.graph.read().device_space(device)
    }

    // -- Locating --

    /// Locates `space` (moved by `offset`) in `base_space` (moved by
    /// `base_offset`) at `at_timestamp_ns`.
    ///
    /// Locating a space in itself with equal offsets yields the identity,
    /// valid and tracked.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale.
    #[must_use]
    pub fn locate_space(
        &self,
        base_space: SpaceId,
        base_offset: &Pose,
        at_timestamp_ns: u64,
        space: SpaceId,
        offset: &Pose,
    ) -> SpaceRelation {
        if base_space == space && base_offset == offset {
            return SpaceRelation::IDENTITY_TRACKED;
        }

        let mut chain = RelationChain::new();

        chain.push_pose_if_not_identity(offset);
        self.graph
            .read()
            .build_relation_chain(&mut chain, base_space, space, at_timestamp_ns);
        chain.push_inverted_pose_if_not_identity(base_offset);

        chain.special_resolve()
    }

    /// Locates the space linked to `device` in `base_space` (moved by
    /// `base_offset`) at `at_timestamp_ns`.
    ///
    /// The lock is held only to resolve the device and walk the graph.
    ///
    /// # Errors
    ///
    /// Returns [`SpaceError::DeviceNotLinked`] if no space was linked to the
    /// device.
    pub fn locate_device(
        &self,
        base_space: SpaceId,
        base_offset: &Pose,
        at_timestamp_ns: u64,
        device: DeviceId,
    ) -> Result<SpaceRelation, SpaceError> {
        let mut chain = RelationChain::new();

        {
            let graph = self.graph.read();
            let space = self.find_device_space(&graph, device)?;
            if space == base_space && base_offset.is_identity() {
                return Ok(SpaceRelation::IDENTITY_TRACKED);
            }
            graph.build_relation_chain(&mut chain, base_space, space, at_timestamp_ns);
        }

        chain.push_inverted_pose_if_not_identity(base_offset);
        Ok(chain.special_resolve())
    }

    /// Tears the overseer down, releasing the semantic slots and device
    /// links. Dropping the overseer does the same.
    pub fn destroy(self) {
        drop(self);
    }
}

impl Drop for SpaceOverseer {
    fn drop(&mut self) {
        let graph = self.graph.get_mut();
        let mut held: Vec<SpaceId> = [
            graph.semantic.unbounded.take(),
            graph.semantic.stage.take(),
            graph.semantic.local.take(),
            graph.semantic.view.take(),
        ]
        .into_iter()
        .flatten()
        .collect();
        held.extend(graph.devices.drain().map(|(_, space)| space));
        held.push(graph.semantic.root);

        for space in held {
            for (freed, _kind) in graph.store.release(space) {
                self.tracer.space(&SpaceEvent::Destroyed { space: freed });
            }
        }
    }
}
