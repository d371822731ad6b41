// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A single swapchain and its image lifecycle.

use crate::error::SwapchainError;
use crate::trace::{Level, SwapchainEvent, Tracer};

use super::backend::{ImageView, NativeImage, Sampler};
use super::fifo::IndexFifo;
use super::gc::{DestroySender, SwapchainResources};
use super::SwapchainId;

/// A ring of images the application renders into and the compositor reads.
///
/// Free image indices wait in a FIFO. The application
/// [acquires](Self::acquire_image) an index, renders, and
/// [releases](Self::release_image) it back. At all times the acquired count
/// plus the queued count equals [`image_count`](Self::image_count).
///
/// Dropping a swapchain does not free GPU resources; they go to the
/// compositor's garbage queue and are freed on its next
/// [`garbage_collect`](super::SwapchainCompositor::garbage_collect). If the
/// compositor is already gone, they are freed in place.
#[derive(Debug)]
pub struct Swapchain {
    id: SwapchainId,
    resources: Option<SwapchainResources>,
    fifo: IndexFifo,
    acquired: Vec<bool>,
    gc: DestroySender,
    tracer: Tracer,
}

impl Swapchain {
    /// Wraps fully set up resources, all images free.
    pub(crate) fn new(resources: SwapchainResources, gc: DestroySender, tracer: Tracer) -> Self {
        let count = image_count_of(&resources);
        Self {
            id: resources.id,
            resources: Some(resources),
            fifo: IndexFifo::primed(count),
            acquired: vec![false; count as usize],
            gc,
            tracer,
        }
    }

    /// Identity used in trace events.
    #[must_use]
    pub fn id(&self) -> SwapchainId {
        self.id
    }

    /// Number of images.
    #[must_use]
    pub fn image_count(&self) -> u32 {
        self.resources.as_ref().map_or(0, image_count_of)
    }

    /// The images, for sharing with the application.
    #[must_use]
    pub fn images(&self) -> &[NativeImage] {
        self.resources
            .as_ref()
            .map(|r| r.images.as_slice())
            .unwrap_or_default()
    }

    /// View of `layer` of image `index`; with alpha forced to one when
    /// `opaque` is set.
    #[must_use]
    pub fn view(&self, index: u32, layer: u32, opaque: bool) -> Option<ImageView> {
        let image = self.resources.as_ref()?.per_image.get(index as usize)?;
        let views = if opaque {
            &image.views_no_alpha
        } else {
            &image.views_alpha
        };
        views.get(layer as usize).copied()
    }

    /// Clamp-to-edge and repeating samplers of image `index`.
    #[must_use]
    pub fn samplers(&self, index: u32) -> Option<(Sampler, Sampler)> {
        let image = self.resources.as_ref()?.per_image.get(index as usize)?;
        Some((image.sampler?, image.repeat_sampler?))
    }

    /// Number of images currently held by the application.
    #[must_use]
    pub fn acquired_count(&self) -> usize {
        self.acquired.iter().filter(|a| **a).count()
    }

    /// Number of images waiting in the FIFO.
    #[must_use]
    pub fn available_count(&self) -> usize {
        self.fifo.len()
    }

    /// Takes the oldest free image.
    ///
    /// # Errors
    ///
    /// Returns [`SwapchainError::NoImageAvailable`] when every image is
    /// acquired.
    pub fn acquire_image(&mut self) -> Result<u32, SwapchainError> {
        let index = self.fifo.pop().ok_or(SwapchainError::NoImageAvailable)?;
        self.acquired[index as usize] = true;
        self.tracer.swapchain(&SwapchainEvent::Acquired {
            swapchain: self.id,
            index,
        });
        Ok(index)
    }

    /// Waits until image `index` may be rendered to.
    ///
    /// # Errors
    ///
    /// Returns [`SwapchainError::IndexOutOfRange`] for a bad index and
    /// [`SwapchainError::Timeout`] if the wait timed out.
    pub fn wait_image(&self, timeout_ns: u64, index: u32) -> Result<(), SwapchainError> {
        let image = self.image(index)?;
        if let Some(resources) = &self.resources {
            resources.backend.wait_image(image, timeout_ns)?;
        }
        Ok(())
    }

    /// Gives image `index` back to the FIFO.
    ///
    /// # Errors
    ///
    /// Returns [`SwapchainError::IndexOutOfRange`] for a bad index,
    /// [`SwapchainError::NoImageAvailable`] if the FIFO is already full, and
    /// [`SwapchainError::ImageNotAcquired`] if the index is not held.
    pub fn release_image(&mut self, index: u32) -> Result<(), SwapchainError> {
        self.image(index)?;
        if self.fifo.is_full() {
            return Err(SwapchainError::NoImageAvailable);
        }
        if !self.acquired[index as usize] {
            return Err(SwapchainError::ImageNotAcquired { index });
        }
        self.fifo
            .push(index)
            .map_err(|_| SwapchainError::NoImageAvailable)?;
        self.acquired[index as usize] = false;
        self.tracer.swapchain(&SwapchainEvent::Released {
            swapchain: self.id,
            index,
        });
        Ok(())
    }

    /// Hands the swapchain to garbage collection. Same as dropping it.
    pub fn destroy(self) {
        drop(self);
    }

    fn image(&self, index: u32) -> Result<&NativeImage, SwapchainError> {
        let images = self.images();
        images.get(index as usize).ok_or(SwapchainError::IndexOutOfRange {
            index,
            count: image_count_of_slice(images),
        })
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        let Some(resources) = self.resources.take() else {
            return;
        };
        match self.gc.send(resources) {
            Ok(()) => {
                self.tracer
                    .swapchain(&SwapchainEvent::DestroyDeferred { swapchain: self.id });
            }
            Err(resources) => {
                self.tracer.log(
                    Level::DEBUG,
                    format_args!("{:?} outlived its compositor, freeing in place", self.id),
                );
                resources.really_destroy(&self.tracer);
                self.tracer
                    .swapchain(&SwapchainEvent::Collected { swapchain: self.id });
            }
        }
    }
}

fn image_count_of(resources: &SwapchainResources) -> u32 {
    image_count_of_slice(&resources.images)
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "image counts are tiny, set from u32 at creation"
)]
fn image_count_of_slice(images: &[NativeImage]) -> u32 {
    images.len() as u32
}
