// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The space graph.
//!
//! Every space has exactly one parent, fixed when it is created, except the
//! single root. Spaces are reference counted: a child keeps its parent
//! alive, as do device links and semantic slots. Relations between two
//! spaces are found by walking both up to the root and composing the
//! relations met on the way.
//!
//! ```text
//!            root
//!          /      \
//!   origin A      local (offset)
//!     |
//!   view (head pose)
//! ```

mod id;
mod legacy;
mod overseer;
mod store;

pub use id::SpaceId;
pub use legacy::legacy_setup;
pub use overseer::{SemanticSlot, SemanticSpaces, SpaceOverseer};
pub use store::{SpaceKind, SpaceStore, SpaceType};
