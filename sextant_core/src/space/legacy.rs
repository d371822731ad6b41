// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Bulk graph setup from a flat device list.

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::device::{InputName, TrackedDevice, TrackingOriginId};
use crate::math::Pose;
use crate::trace::Level;

use super::SpaceId;
use super::overseer::{SemanticSlot, SpaceOverseer};

/// Wires up the usual graph for a set of devices.
///
/// Devices sharing a tracking origin are grouped under one offset space
/// placed at the origin's offset from root, and each device is linked to its
/// group's space. The stage is the root itself, local sits at `local_offset`
/// from root, and the view follows `head`'s head pose when a head is given.
/// The unbounded slot is left as is.
///
/// Slots that are already filled get replaced.
pub fn legacy_setup(
    overseer: &SpaceOverseer,
    devices: &[Arc<dyn TrackedDevice>],
    head: Option<&Arc<dyn TrackedDevice>>,
    local_offset: &Pose,
) {
    let root = overseer.root();

    // Each entry holds a reference until the end of setup.
    let mut origins: BTreeMap<TrackingOriginId, SpaceId> = BTreeMap::new();
    for device in devices {
        let origin = device.tracking_origin();
        let space = *origins
            .entry(origin.id)
            .or_insert_with(|| overseer.create_offset_space(root, &origin.offset));
        overseer.link_space_to_device(space, device.id());
    }
    for space in origins.into_values() {
        overseer.release_space(space);
    }

    overseer.set_semantic_space(SemanticSlot::Stage, Some(root));

    let local = overseer.create_offset_space(root, local_offset);
    overseer.set_semantic_space(SemanticSlot::Local, Some(local));
    overseer.release_space(local);

    let Some(head) = head else {
        return;
    };
    match overseer.create_pose_space(head, InputName::HEAD_POSE) {
        Ok(view) => {
            overseer.set_semantic_space(SemanticSlot::View, Some(view));
            overseer.release_space(view);
        }
        Err(err) => overseer.tracer().log(
            Level::WARN,
            format_args!("no view space for head '{}': {err}", head.name()),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{DeviceId, TrackingOrigin};
    use crate::relation::{RelationFlags, SpaceRelation};
    use crate::trace::Tracer;
    use glam::{Quat, Vec3};

    const EPS: f32 = 1e-5;

    #[derive(Debug)]
    struct StillDevice {
        id: DeviceId,
        origin: TrackingOrigin,
        pose: Pose,
    }

    impl TrackedDevice for StillDevice {
        fn id(&self) -> DeviceId {
            self.id
        }
        fn name(&self) -> &str {
            "still"
        }
        fn tracking_origin(&self) -> &TrackingOrigin {
            &self.origin
        }
        fn get_tracked_pose(&self, _input: InputName, _at_timestamp_ns: u64) -> SpaceRelation {
            SpaceRelation {
                flags: RelationFlags::POSE_VALID_TRACKED,
                ..SpaceRelation::from_pose(self.pose)
            }
        }
    }

    fn device(id: u32, origin: u32, origin_offset: Pose, pose: Pose) -> Arc<dyn TrackedDevice> {
        Arc::new(StillDevice {
            id: DeviceId(id),
            origin: TrackingOrigin {
                id: TrackingOriginId(origin),
                name: format!("origin {origin}"),
                offset: origin_offset,
            },
            pose,
        })
    }

    #[test]
    fn devices_sharing_an_origin_share_a_space() {
        let overseer = SpaceOverseer::new(Tracer::none());
        let lighthouse = Pose::from_position(Vec3::new(0.0, 0.0, 2.0));
        let camera = Pose::new(Quat::from_rotation_y(1.0), Vec3::X);
        let devices = [
            device(1, 10, lighthouse, Pose::IDENTITY),
            device(2, 10, lighthouse, Pose::IDENTITY),
            device(3, 20, camera, Pose::IDENTITY),
        ];
        legacy_setup(&overseer, &devices, None, &Pose::IDENTITY);

        let a = overseer.device_space(DeviceId(1)).expect("device 1 linked");
        let b = overseer.device_space(DeviceId(2)).expect("device 2 linked");
        let c = overseer.device_space(DeviceId(3)).expect("device 3 linked");
        assert_eq!(a, b, "same origin, same space");
        assert_ne!(a, c, "different origin, different space");
        assert_eq!(overseer.parent_of(a), Some(overseer.root()), "under root");

        let r = overseer.locate_space(overseer.root(), &Pose::IDENTITY, 0, c, &Pose::IDENTITY);
        assert!(r.pose.abs_diff_eq(&camera, EPS), "origin offset {:?}", r.pose);
        // root, two origin spaces and local (a null space here).
        assert_eq!(overseer.live_spaces(), 4, "temporary references released");
    }

    #[test]
    fn semantic_spaces_are_filled() {
        let overseer = SpaceOverseer::new(Tracer::none());
        let origin = Pose::from_position(Vec3::new(0.0, 0.0, 1.0));
        let head_pose = Pose::from_position(Vec3::new(0.0, 1.6, 0.0));
        let head = device(1, 0, origin, head_pose);
        let local_offset = Pose::from_position(Vec3::new(0.0, 1.2, 0.0));
        legacy_setup(&overseer, &[Arc::clone(&head)], Some(&head), &local_offset);

        let semantic = overseer.semantic();
        assert_eq!(semantic.stage, Some(semantic.root), "stage is root");
        assert_eq!(semantic.unbounded, None, "unbounded untouched");

        let local = semantic.local.expect("local set");
        let r = overseer.locate_space(semantic.root, &Pose::IDENTITY, 0, local, &Pose::IDENTITY);
        assert!(r.pose.abs_diff_eq(&local_offset, EPS), "local pose {:?}", r.pose);

        let view = semantic.view.expect("view set");
        let r = overseer.locate_space(semantic.root, &Pose::IDENTITY, 0, view, &Pose::IDENTITY);
        assert!(
            r.pose.position.abs_diff_eq(Vec3::new(0.0, 1.6, 1.0), EPS),
            "head pose in origin {:?}",
            r.pose
        );
        assert_eq!(r.flags, RelationFlags::POSE_VALID_TRACKED, "view is tracked");
    }

    #[test]
    fn unlinked_head_leaves_view_empty() {
        let overseer = SpaceOverseer::new(Tracer::none());
        let head = device(7, 0, Pose::IDENTITY, Pose::IDENTITY);
        legacy_setup(&overseer, &[], Some(&head), &Pose::IDENTITY);
        assert_eq!(overseer.semantic().view, None, "head never linked");
    }
}
