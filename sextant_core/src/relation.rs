// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Space relations and relation chains.
//!
//! A [`SpaceRelation`] is a pose plus velocities, each guarded by a validity
//! flag. A [`RelationChain`] accumulates relations leaf-first and
//! [`resolves`](RelationChain::resolve) them into a single relation by
//! composing each step onto the running result.

use bitflags::bitflags;
use glam::{Quat, Vec3};

use crate::math::Pose;

bitflags! {
    /// Which parts of a [`SpaceRelation`] carry meaningful data.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RelationFlags: u32 {
        /// The orientation is valid.
        const ORIENTATION_VALID = 1 << 0;
        /// The position is valid.
        const POSITION_VALID = 1 << 1;
        /// The linear velocity is valid.
        const LINEAR_VELOCITY_VALID = 1 << 2;
        /// The angular velocity is valid.
        const ANGULAR_VELOCITY_VALID = 1 << 3;
        /// The orientation is actively tracked.
        const ORIENTATION_TRACKED = 1 << 4;
        /// The position is actively tracked.
        const POSITION_TRACKED = 1 << 5;

        /// Orientation and position both valid.
        const POSE_VALID = Self::ORIENTATION_VALID.bits() | Self::POSITION_VALID.bits();
        /// Orientation and position both valid and tracked.
        const POSE_VALID_TRACKED = Self::POSE_VALID.bits()
            | Self::ORIENTATION_TRACKED.bits()
            | Self::POSITION_TRACKED.bits();
    }
}

/// The relation of one space to another at a point in time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpaceRelation {
    /// Which fields are meaningful.
    pub flags: RelationFlags,
    /// Pose of the target in the base frame.
    pub pose: Pose,
    /// Linear velocity in meters per second, in the base frame.
    pub linear_velocity: Vec3,
    /// Angular velocity in radians per second, in the base frame.
    pub angular_velocity: Vec3,
}

impl SpaceRelation {
    /// A relation with nothing valid.
    pub const ZERO: Self = Self {
        flags: RelationFlags::empty(),
        pose: Pose::IDENTITY,
        linear_velocity: Vec3::ZERO,
        angular_velocity: Vec3::ZERO,
    };

    /// The identity relation, valid and tracked.
    pub const IDENTITY_TRACKED: Self = Self {
        flags: RelationFlags::POSE_VALID_TRACKED,
        pose: Pose::IDENTITY,
        linear_velocity: Vec3::ZERO,
        angular_velocity: Vec3::ZERO,
    };

    /// A static pose: valid, not tracked, no velocities.
    #[must_use]
    pub const fn from_pose(pose: Pose) -> Self {
        Self {
            flags: RelationFlags::POSE_VALID,
            pose,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        }
    }

    /// Returns the inverse relation: inverted pose, negated velocities, same
    /// flags.
    #[must_use]
    pub fn inverse(&self) -> Self {
        Self {
            flags: self.flags,
            pose: self.pose.inverse(),
            linear_velocity: -self.linear_velocity,
            angular_velocity: -self.angular_velocity,
        }
    }

    /// Returns whether either the orientation or the position is valid.
    #[inline]
    #[must_use]
    pub fn has_pose(&self) -> bool {
        self.flags.intersects(RelationFlags::POSE_VALID)
    }
}

impl Default for SpaceRelation {
    fn default() -> Self {
        Self::ZERO
    }
}

// ---------------------------------------------------------------------------
// Chain
// ---------------------------------------------------------------------------

/// An ordered list of relations, leaf first, to be composed into one.
#[derive(Clone, Debug, Default)]
pub struct RelationChain {
    steps: Vec<SpaceRelation>,
}

impl RelationChain {
    /// Creates an empty chain.
    #[must_use]
    pub fn new() -> Self {
        Self {
            steps: Vec::with_capacity(8),
        }
    }

    /// The steps pushed so far.
    #[must_use]
    pub fn steps(&self) -> &[SpaceRelation] {
        &self.steps
    }

    /// Number of steps pushed so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps have been pushed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Appends a relation.
    pub fn push_relation(&mut self, relation: &SpaceRelation) {
        self.steps.push(*relation);
    }

    /// Appends the inverse of a relation.
    pub fn push_inverted_relation(&mut self, relation: &SpaceRelation) {
        self.steps.push(relation.inverse());
    }

    /// Appends a static pose, marked valid but not tracked.
    pub fn push_pose(&mut self, pose: &Pose) {
        self.steps.push(SpaceRelation::from_pose(*pose));
    }

    /// Appends a static pose unless it is the identity.
    pub fn push_pose_if_not_identity(&mut self, pose: &Pose) {
        if !pose.is_identity() {
            self.push_pose(pose);
        }
    }

    /// Appends the inverse of a static pose unless it is the identity.
    pub fn push_inverted_pose_if_not_identity(&mut self, pose: &Pose) {
        if !pose.is_identity() {
            self.push_pose(&pose.inverse());
        }
    }

    /// Composes all steps into a single relation.
    ///
    /// An empty chain, or one with a step that has neither a valid position
    /// nor a valid orientation, resolves to [`SpaceRelation::ZERO`].
    #[must_use]
    pub fn resolve(&self) -> SpaceRelation {
        let Some((first, rest)) = self.steps.split_first() else {
            return SpaceRelation::ZERO;
        };
        if self.steps.iter().any(|step| !step.has_pose()) {
            return SpaceRelation::ZERO;
        }

        let mut r = rest
            .iter()
            .fold(*first, |acc, step| apply_relation(&acc, step));

        // Keep floating point drift out of the orientation.
        if r.pose.orientation.length_squared() > 0.0 {
            r.pose.orientation = r.pose.orientation.normalize();
        }
        r
    }

    /// Like [`resolve`](Self::resolve), except that an empty chain means
    /// "same space" and yields [`SpaceRelation::IDENTITY_TRACKED`].
    #[must_use]
    pub fn special_resolve(&self) -> SpaceRelation {
        if self.steps.is_empty() {
            SpaceRelation::IDENTITY_TRACKED
        } else {
            self.resolve()
        }
    }
}

/// Replaces an invalid orientation with identity and an invalid position with
/// zero.
fn make_valid_pose(flags: RelationFlags, pose: &Pose) -> Pose {
    Pose {
        orientation: if flags.contains(RelationFlags::ORIENTATION_VALID) {
            pose.orientation
        } else {
            Quat::IDENTITY
        },
        position: if flags.contains(RelationFlags::POSITION_VALID) {
            pose.position
        } else {
            Vec3::ZERO
        },
    }
}

/// Expresses `a` (the body) in the frame `b` (the base) is defined in.
fn apply_relation(a: &SpaceRelation, b: &SpaceRelation) -> SpaceRelation {
    let af = a.flags;
    let bf = b.flags;

    let mut flags = RelationFlags::empty();
    let mut linear_velocity = Vec3::ZERO;
    let mut angular_velocity = Vec3::ZERO;

    if af.contains(RelationFlags::LINEAR_VELOCITY_VALID) {
        flags |= RelationFlags::LINEAR_VELOCITY_VALID;
        linear_velocity += b.pose.orientation * a.linear_velocity;
    }
    if bf.contains(RelationFlags::LINEAR_VELOCITY_VALID) {
        flags |= RelationFlags::LINEAR_VELOCITY_VALID;
        linear_velocity += b.linear_velocity;
    }

    if af.contains(RelationFlags::ANGULAR_VELOCITY_VALID) {
        flags |= RelationFlags::ANGULAR_VELOCITY_VALID;
        angular_velocity += b.pose.orientation * a.angular_velocity;
    }
    if bf.contains(RelationFlags::ANGULAR_VELOCITY_VALID) {
        // A spinning base drags the body along tangentially.
        flags |= RelationFlags::ANGULAR_VELOCITY_VALID | RelationFlags::LINEAR_VELOCITY_VALID;
        angular_velocity += b.angular_velocity;
        let rotated_position = b.pose.orientation * a.pose.position;
        linear_velocity += b.angular_velocity.cross(rotated_position);
    }

    let body = make_valid_pose(af, &a.pose);
    let base = make_valid_pose(bf, &b.pose);
    let pose = base.transform(&body);

    if af.contains(RelationFlags::ORIENTATION_VALID) || bf.contains(RelationFlags::ORIENTATION_VALID)
    {
        flags |= RelationFlags::ORIENTATION_VALID;
    }
    // A valid position upgrades the orientation to valid (identity filled in).
    if af.contains(RelationFlags::POSITION_VALID) || bf.contains(RelationFlags::POSITION_VALID) {
        flags |= RelationFlags::POSE_VALID;
    }
    flags |= (af | bf) & (RelationFlags::POSITION_TRACKED | RelationFlags::ORIENTATION_TRACKED);

    SpaceRelation {
        flags,
        pose,
        linear_velocity,
        angular_velocity,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    const POSE_ONE_Y: Pose = Pose::from_position(Vec3::Y);

    #[derive(Clone, Copy, Debug)]
    enum Step {
        /// Not valid.
        Nv,
        /// Valid and tracked.
        Vt,
        /// Valid, not tracked.
        Vnt,
        /// Non-identity pose.
        P,
        /// Identity pose (skipped).
        Ip,
        OnlyOrientation,
        OnlyPosition,
    }

    fn push(chain: &mut RelationChain, step: Step) {
        let rel = |flags| SpaceRelation {
            flags,
            pose: POSE_ONE_Y,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
        };
        match step {
            Step::Nv => chain.push_relation(&rel(RelationFlags::empty())),
            Step::Vt => chain.push_relation(&rel(RelationFlags::POSE_VALID_TRACKED)),
            Step::Vnt => chain.push_relation(&rel(RelationFlags::POSE_VALID)),
            Step::P => chain.push_pose_if_not_identity(&POSE_ONE_Y),
            Step::Ip => chain.push_pose_if_not_identity(&Pose::IDENTITY),
            Step::OnlyOrientation => chain.push_relation(&SpaceRelation {
                flags: RelationFlags::ORIENTATION_VALID,
                pose: Pose::IDENTITY,
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
            }),
            Step::OnlyPosition => chain.push_relation(&SpaceRelation {
                flags: RelationFlags::POSITION_VALID,
                pose: Pose::new(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0), Vec3::Y),
                linear_velocity: Vec3::ZERO,
                angular_velocity: Vec3::ZERO,
            }),
        }
    }

    #[track_caller]
    fn check_flags(expected: RelationFlags, steps: &[Step]) {
        let mut chain = RelationChain::new();
        for &step in steps {
            push(&mut chain, step);
        }
        assert_eq!(chain.resolve().flags, expected, "chain {steps:?}");
    }

    #[test]
    fn invalid_step_poisons_chain() {
        use Step::*;
        let none = RelationFlags::empty();
        check_flags(none, &[Vt, Nv, Vt]);
        check_flags(none, &[Vt, Vt, Vt, Nv]);
        check_flags(none, &[P, Nv, Vnt]);
        check_flags(none, &[Nv, OnlyOrientation]);
        check_flags(none, &[Nv, OnlyPosition]);
        check_flags(none, &[OnlyOrientation, Nv]);
        check_flags(none, &[OnlyPosition, Nv]);
    }

    #[test]
    fn tracked_bits_are_ored() {
        use Step::*;
        let tracked = RelationFlags::POSE_VALID_TRACKED;
        check_flags(tracked, &[P, Vt, P]);
        check_flags(tracked, &[P, Vt, P, Vt]);
        check_flags(tracked, &[Vt, Ip, P]);
        check_flags(tracked, &[Ip, Ip, Vt, Ip, Ip]);
        check_flags(tracked, &[Vnt, Ip, Vt]);
        check_flags(tracked, &[Vt, Vt, Vnt, Vt]);
        check_flags(tracked, &[Vt, OnlyOrientation]);
        check_flags(tracked, &[OnlyPosition, Vt]);
        check_flags(tracked, &[P, OnlyPosition, Vt, P]);
    }

    #[test]
    fn untracked_chains_stay_untracked() {
        use Step::*;
        let valid = RelationFlags::POSE_VALID;
        check_flags(valid, &[P, Vnt, P]);
        check_flags(valid, &[Vnt, Vnt, Vnt]);
        check_flags(valid, &[Vnt, Ip]);
        check_flags(valid, &[Ip, Vnt, P]);
        check_flags(valid, &[P, OnlyOrientation, Ip, P]);
        check_flags(valid, &[P, OnlyPosition, Ip, P]);
        check_flags(valid, &[OnlyOrientation, Vnt]);
        check_flags(valid, &[Vnt, OnlyPosition]);
        check_flags(valid, &[OnlyPosition, P, Vnt]);
    }

    #[test]
    fn empty_chain() {
        let chain = RelationChain::new();
        assert_eq!(chain.resolve(), SpaceRelation::ZERO, "plain resolve");
        assert_eq!(
            chain.special_resolve(),
            SpaceRelation::IDENTITY_TRACKED,
            "special resolve"
        );
    }

    #[test]
    fn identity_poses_are_skipped() {
        let mut chain = RelationChain::new();
        chain.push_pose_if_not_identity(&Pose::IDENTITY);
        chain.push_inverted_pose_if_not_identity(&Pose::IDENTITY);
        assert!(chain.is_empty(), "identity pushes must not add steps");
    }

    #[test]
    fn positions_accumulate_leaf_first() {
        let quarter = Quat::from_rotation_z(core::f32::consts::FRAC_PI_2);
        let mut chain = RelationChain::new();
        // Body one unit along X, in a base rotated a quarter turn about Z.
        chain.push_pose(&Pose::from_position(Vec3::X));
        chain.push_pose(&Pose::new(quarter, Vec3::ZERO));
        let r = chain.resolve();
        assert!(
            r.pose.position.abs_diff_eq(Vec3::Y, EPS),
            "position {:?}",
            r.pose.position
        );
    }

    #[test]
    fn pose_then_inverse_cancels() {
        let p = Pose::new(Quat::from_rotation_x(0.4), Vec3::new(1.0, 2.0, 3.0));
        let mut chain = RelationChain::new();
        chain.push_pose(&p);
        chain.push_inverted_relation(&SpaceRelation::from_pose(p));
        let r = chain.resolve();
        assert!(r.pose.abs_diff_eq(&Pose::IDENTITY, EPS), "pose {:?}", r.pose);
    }

    #[test]
    fn base_spin_adds_tangential_velocity() {
        let mut chain = RelationChain::new();
        chain.push_pose(&Pose::from_position(Vec3::X));
        chain.push_relation(&SpaceRelation {
            flags: RelationFlags::POSE_VALID | RelationFlags::ANGULAR_VELOCITY_VALID,
            pose: Pose::IDENTITY,
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::Z,
        });
        let r = chain.resolve();
        assert!(
            r.flags.contains(RelationFlags::LINEAR_VELOCITY_VALID),
            "spinning base makes linear velocity valid"
        );
        // Z x X = Y
        assert!(
            r.linear_velocity.abs_diff_eq(Vec3::Y, EPS),
            "linear velocity {:?}",
            r.linear_velocity
        );
        assert!(
            r.angular_velocity.abs_diff_eq(Vec3::Z, EPS),
            "angular velocity {:?}",
            r.angular_velocity
        );
    }

    #[test]
    fn inverse_negates_velocities() {
        let r = SpaceRelation {
            flags: RelationFlags::all(),
            pose: POSE_ONE_Y,
            linear_velocity: Vec3::X,
            angular_velocity: Vec3::Z,
        };
        let inv = r.inverse();
        assert_eq!(inv.flags, r.flags, "flags are kept");
        assert_eq!(inv.linear_velocity, -Vec3::X, "linear velocity");
        assert_eq!(inv.angular_velocity, -Vec3::Z, "angular velocity");
        assert_eq!(inv.pose.position, -Vec3::Y, "pose");
    }
}
