// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Rigid-body poses.
//!
//! A [`Pose`] is a rotation followed by a translation. Composition follows the
//! "base ∘ body" convention: [`Pose::transform`] maps a pose expressed in a
//! body frame into the base frame that body is defined in.

use core::fmt;

use glam::{Quat, Vec3};

/// A rotation and a translation.
#[derive(Clone, Copy, PartialEq)]
pub struct Pose {
    /// Unit quaternion orientation.
    pub orientation: Quat,
    /// Translation in meters.
    pub position: Vec3,
}

impl Pose {
    /// The identity pose.
    pub const IDENTITY: Self = Self {
        orientation: Quat::IDENTITY,
        position: Vec3::ZERO,
    };

    /// Creates a pose from an orientation and a position.
    #[inline]
    #[must_use]
    pub const fn new(orientation: Quat, position: Vec3) -> Self {
        Self {
            orientation,
            position,
        }
    }

    /// Creates a pure translation.
    #[inline]
    #[must_use]
    pub const fn from_position(position: Vec3) -> Self {
        Self {
            orientation: Quat::IDENTITY,
            position,
        }
    }

    /// Returns whether this pose is exactly the identity.
    ///
    /// Both `q` and `-q` describe the same rotation, so a `w` of `-1` counts.
    #[must_use]
    pub fn is_identity(&self) -> bool {
        let q = self.orientation;
        self.position == Vec3::ZERO && q.x == 0.0 && q.y == 0.0 && q.z == 0.0 && q.w.abs() == 1.0
    }

    /// Returns the inverse pose, so that `p.transform(&p.inverse())` is the
    /// identity.
    #[must_use]
    pub fn inverse(&self) -> Self {
        let orientation = self.orientation.conjugate();
        Self {
            orientation,
            position: orientation * -self.position,
        }
    }

    /// Composes `self` (the base) with `body`, yielding `body` expressed in
    /// the frame `self` is defined in.
    #[must_use]
    pub fn transform(&self, body: &Self) -> Self {
        Self {
            orientation: self.orientation * body.orientation,
            position: self.orientation * body.position + self.position,
        }
    }

    /// Transforms a point by this pose.
    #[inline]
    #[must_use]
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.orientation * point + self.position
    }

    /// Returns whether both components are within `max_abs_diff` of `other`.
    #[must_use]
    pub fn abs_diff_eq(&self, other: &Self, max_abs_diff: f32) -> bool {
        let same_rotation = self.orientation.abs_diff_eq(other.orientation, max_abs_diff)
            || self.orientation.abs_diff_eq(-other.orientation, max_abs_diff);
        same_rotation && self.position.abs_diff_eq(other.position, max_abs_diff)
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl fmt::Debug for Pose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let q = self.orientation;
        let p = self.position;
        write!(
            f,
            "Pose(q=[{:.4} {:.4} {:.4} {:.4}] p=[{:.4} {:.4} {:.4}])",
            q.x, q.y, q.z, q.w, p.x, p.y, p.z
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn sample() -> Pose {
        Pose::new(
            Quat::from_rotation_y(0.7) * Quat::from_rotation_x(-0.2),
            Vec3::new(0.5, 1.6, -2.0),
        )
    }

    #[test]
    fn identity_detection() {
        assert!(Pose::IDENTITY.is_identity(), "identity");
        let flipped = Pose::new(Quat::from_xyzw(0.0, 0.0, 0.0, -1.0), Vec3::ZERO);
        assert!(flipped.is_identity(), "negated identity quaternion");
        assert!(!sample().is_identity(), "non-identity pose");
        assert!(
            !Pose::from_position(Vec3::Y).is_identity(),
            "translation only"
        );
    }

    #[test]
    fn inverse_composes_to_identity() {
        let p = sample();
        let round = p.transform(&p.inverse());
        assert!(
            round.abs_diff_eq(&Pose::IDENTITY, EPS),
            "p * p^-1 = {round:?}"
        );
        let round = p.inverse().transform(&p);
        assert!(
            round.abs_diff_eq(&Pose::IDENTITY, EPS),
            "p^-1 * p = {round:?}"
        );
    }

    #[test]
    fn transform_applies_base_rotation_to_body_position() {
        let base = Pose::new(Quat::from_rotation_y(core::f32::consts::FRAC_PI_2), Vec3::X);
        let body = Pose::from_position(Vec3::Z);
        let out = base.transform(&body);
        // +Z rotated a quarter turn about Y is +X, then offset by +X.
        assert!(
            out.position.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), EPS),
            "position {:?}",
            out.position
        );
    }

    #[test]
    fn transform_point_matches_transform() {
        let p = sample();
        let point = Vec3::new(1.0, -1.0, 3.0);
        let via_pose = p.transform(&Pose::from_position(point)).position;
        assert!(
            p.transform_point(point).abs_diff_eq(via_pose, EPS),
            "point transform disagrees with pose composition"
        );
    }
}
