// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracked device abstraction.
//!
//! Drivers are out of scope for this crate; the space overseer only needs a
//! device to identify itself, name its tracking origin and answer pose
//! queries. Implementations must not call back into the overseer from
//! [`TrackedDevice::get_tracked_pose`], which runs under its read lock.

use core::fmt;

use crate::math::Pose;
use crate::relation::SpaceRelation;

/// Stable identity of a device for the lifetime of the runtime.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeviceId(pub u32);

impl fmt::Debug for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeviceId({})", self.0)
    }
}

/// Names one pose input on a device.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct InputName(pub u32);

impl InputName {
    /// Head pose of an HMD.
    pub const HEAD_POSE: Self = Self(0x0001);
    /// Grip pose of a controller.
    pub const GRIP_POSE: Self = Self(0x0002);
    /// Aim pose of a controller.
    pub const AIM_POSE: Self = Self(0x0003);
    /// Palm pose of a controller or hand tracker.
    pub const PALM_POSE: Self = Self(0x0004);
}

impl fmt::Debug for InputName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::HEAD_POSE => f.write_str("HEAD_POSE"),
            Self::GRIP_POSE => f.write_str("GRIP_POSE"),
            Self::AIM_POSE => f.write_str("AIM_POSE"),
            Self::PALM_POSE => f.write_str("PALM_POSE"),
            Self(raw) => write!(f, "InputName({raw:#06x})"),
        }
    }
}

/// Identity of a tracking origin, shared by every device it tracks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TrackingOriginId(pub u32);

/// The frame a tracking system reports poses in, placed relative to the
/// runtime's root by `offset`.
#[derive(Clone, Debug, PartialEq)]
pub struct TrackingOrigin {
    /// Identity used to group devices sharing this origin.
    pub id: TrackingOriginId,
    /// Human-readable name.
    pub name: String,
    /// Pose of the origin in root space.
    pub offset: Pose,
}

/// A device the overseer can ask for poses.
pub trait TrackedDevice: Send + Sync {
    /// Stable identity.
    fn id(&self) -> DeviceId;

    /// Human-readable name, used in logs.
    fn name(&self) -> &str;

    /// The tracking origin this device reports poses in.
    fn tracking_origin(&self) -> &TrackingOrigin;

    /// Returns the pose of `input` in the tracking origin's frame at
    /// `at_timestamp_ns`.
    fn get_tracked_pose(&self, input: InputName, at_timestamp_ns: u64) -> SpaceRelation;
}

impl fmt::Debug for dyn TrackedDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TrackedDevice")
            .field("id", &self.id())
            .field("name", &self.name())
            .finish_non_exhaustive()
    }
}
