// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Contract with the graphics API.
//!
//! Swapchains never talk to a GPU directly. Image allocation, views,
//! samplers, layout transitions and idle waits all go through a
//! [`GraphicsBackend`], which lets the lifecycle logic run against
//! [`SoftwareBackend`](super::SoftwareBackend) or a recording double in
//! tests.

use core::fmt;

use parking_lot::Mutex;

use crate::error::BackendError;

use super::info::{Format, SwapchainCreateInfo};

/// A platform image with its memory, as shared with the application.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NativeImage {
    /// Opaque graphics-buffer handle.
    pub handle: u64,
    /// Allocation size in bytes.
    pub size: u64,
    /// Whether the memory is a dedicated allocation.
    pub use_dedicated_allocation: bool,
}

/// An image view handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageView(pub u64);

impl fmt::Debug for ImageView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageView({:#x})", self.0)
    }
}

/// A sampler handle.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sampler(pub u64);

impl fmt::Debug for Sampler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sampler({:#x})", self.0)
    }
}

/// Channel mapping of a view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Swizzle {
    /// Channels as stored.
    Identity,
    /// Channels as stored, alpha read as one.
    ForceOpaque,
}

/// Sampler addressing outside `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AddressMode {
    /// Wrap around.
    Repeat,
    /// Clamp to the edge texel.
    ClampToEdge,
}

/// Which aspect of an image a view reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageAspect {
    /// Color.
    Color,
    /// Depth only; sampling depth/stencil images reads depth.
    Depth,
}

impl ImageAspect {
    /// The aspect a sampled view of `format` uses.
    #[must_use]
    pub const fn for_view(format: Format) -> Self {
        if format.has_depth() {
            Self::Depth
        } else {
            Self::Color
        }
    }
}

/// Parameters of one image view: a single mip level of a single layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ViewDesc {
    /// Format of the view, identical to the image's.
    pub format: Format,
    /// Aspect read.
    pub aspect: ImageAspect,
    /// Array layer.
    pub layer: u32,
    /// Channel mapping.
    pub swizzle: Swizzle,
}

/// Serializes access to the GPU queue.
///
/// Graphics APIs require external synchronization of queue submission and
/// device-wide waits. Everything touching the queue runs inside
/// [`Queue::submit`].
#[derive(Debug, Default)]
pub struct Queue {
    lock: Mutex<()>,
}

impl Queue {
    /// Creates an unlocked queue.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            lock: Mutex::new(()),
        }
    }

    /// Runs `f` while holding the queue lock.
    pub fn submit<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.lock.lock();
        f()
    }

    /// Whether someone currently holds the queue.
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.lock.is_locked()
    }
}

/// Image and resource management on a GPU device.
///
/// Implementations are shared between the compositor and every swapchain it
/// created, so all methods take `&self`.
pub trait GraphicsBackend: Send + Sync {
    /// The queue that layout transitions and idle waits run on.
    fn queue(&self) -> &Queue;

    /// Allocates `count` exportable images matching `info`.
    fn allocate_images(
        &self,
        info: &SwapchainCreateInfo,
        count: u32,
    ) -> Result<Vec<NativeImage>, BackendError>;

    /// Takes ownership of images allocated elsewhere.
    fn import_images(
        &self,
        info: &SwapchainCreateInfo,
        natives: Vec<NativeImage>,
    ) -> Result<Vec<NativeImage>, BackendError>;

    /// Creates a view of one layer of `image`.
    fn create_view(&self, image: &NativeImage, desc: &ViewDesc) -> Result<ImageView, BackendError>;

    /// Creates a linear sampler.
    fn create_sampler(&self, mode: AddressMode) -> Result<Sampler, BackendError>;

    /// Records and submits the transition of every layer of `images` to the
    /// shader-read layout. Called with the queue held.
    fn prepare_images(&self, images: &[NativeImage], array_size: u32) -> Result<(), BackendError>;

    /// Waits until the application may render to `image`.
    fn wait_image(&self, image: &NativeImage, timeout_ns: u64) -> Result<(), BackendError>;

    /// Waits until the device has finished all submitted work. Called with
    /// the queue held.
    fn wait_idle(&self) -> Result<(), BackendError>;

    /// Destroys a view.
    fn destroy_view(&self, view: ImageView);

    /// Destroys a sampler.
    fn destroy_sampler(&self, sampler: Sampler);

    /// Frees an image and its memory.
    fn release_image(&self, image: NativeImage);
}

impl fmt::Debug for dyn GraphicsBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsBackend")
            .field("queue", self.queue())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queue_is_held_during_submit() {
        let queue = Queue::new();
        assert!(!queue.is_locked(), "idle");
        let held = queue.submit(|| queue.is_locked());
        assert!(held, "held inside submit");
        assert!(!queue.is_locked(), "released after");
    }

    #[test]
    fn depth_formats_view_depth() {
        assert_eq!(ImageAspect::for_view(Format::D24_UNORM_S8_UINT), ImageAspect::Depth, "depth");
        assert_eq!(ImageAspect::for_view(Format::R8G8B8A8_UNORM), ImageAspect::Color, "color");
    }
}
