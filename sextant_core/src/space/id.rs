// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Space handles.

use core::fmt;

/// Parent index of the root, and of freed slots.
pub(crate) const INVALID: u32 = u32::MAX;

/// Names a space owned by a [`SpaceOverseer`](super::SpaceOverseer).
///
/// A handle is a store slot plus the generation the slot had when the space
/// was allocated. Freeing a space bumps the generation, so a handle kept past
/// release no longer resolves. Handles returned from the `create_*` calls
/// carry one reference, given back with
/// [`release_space`](super::SpaceOverseer::release_space).
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SpaceId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl SpaceId {
    /// Packs slot and generation into one value, for diagnostics.
    #[must_use]
    pub const fn to_bits(self) -> u64 {
        ((self.generation as u64) << 32) | self.idx as u64
    }
}

impl fmt::Debug for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.generation == 0 {
            write!(f, "Space#{}", self.idx)
        } else {
            write!(f, "Space#{}.{}", self.idx, self.generation)
        }
    }
}
