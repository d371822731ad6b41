// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swapchain image lifecycle.
//!
//! A [`SwapchainCompositor`] allocates (or imports) a fixed set of images
//! per [`Swapchain`], builds the views and samplers the compositor samples
//! them through, and primes a FIFO of free indices. Destruction is deferred:
//! a dropped swapchain is sent to the compositor's garbage queue until it calls
//! [`SwapchainCompositor::garbage_collect`], which waits for the GPU queue
//! to go idle before freeing anything.

use core::fmt;

mod backend;
mod chain;
mod compositor;
mod fifo;
mod gc;
mod info;
mod software;

pub use backend::{
    AddressMode, GraphicsBackend, ImageAspect, ImageView, NativeImage, Queue, Sampler, Swizzle,
    ViewDesc,
};
pub use chain::Swapchain;
pub use compositor::SwapchainCompositor;
pub use fifo::IndexFifo;
pub use info::{
    CreateFlags, CreateProperties, Format, SwapchainCreateInfo, SwapchainSettings, UsageFlags,
};
pub use software::SoftwareBackend;

/// Identity of a swapchain, unique per compositor.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SwapchainId(pub u64);

impl fmt::Debug for SwapchainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SwapchainId({})", self.0)
    }
}
