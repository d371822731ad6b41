// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Deferred teardown of swapchain GPU resources.
//!
//! Destroying a swapchain happens on whichever thread the application calls
//! from, often while the compositor still has work in flight that samples
//! its images. The resources are therefore sent over a channel to the
//! compositor and only freed by [`SwapchainCompositor::garbage_collect`],
//! which drains it from the compositor thread once per frame. Any number of
//! swapchains send; the compositor is the single receiver.
//!
//! [`SwapchainCompositor::garbage_collect`]: super::SwapchainCompositor::garbage_collect

use std::sync::Arc;
use std::sync::mpsc::{Receiver, SendError, Sender, channel};

use parking_lot::Mutex;

use crate::trace::{Level, Tracer};

use super::backend::{GraphicsBackend, ImageView, NativeImage, Sampler};
use super::SwapchainId;

/// Views and samplers of one image.
#[derive(Debug, Default)]
pub(crate) struct ImageResources {
    /// One view per array layer, channels as stored.
    pub(crate) views_alpha: Vec<ImageView>,
    /// One view per array layer, alpha forced to one.
    pub(crate) views_no_alpha: Vec<ImageView>,
    /// Clamp-to-edge sampler.
    pub(crate) sampler: Option<Sampler>,
    /// Repeating sampler.
    pub(crate) repeat_sampler: Option<Sampler>,
}

/// Everything a swapchain owns on the GPU.
#[derive(Debug)]
pub(crate) struct SwapchainResources {
    pub(crate) id: SwapchainId,
    pub(crate) backend: Arc<dyn GraphicsBackend>,
    pub(crate) images: Vec<NativeImage>,
    pub(crate) per_image: Vec<ImageResources>,
}

impl SwapchainResources {
    /// Frees everything, waiting for the device to go idle first.
    ///
    /// Safe to call on partially set up resources.
    pub(crate) fn really_destroy(self, tracer: &Tracer) {
        let backend = &*self.backend;

        for image in self.per_image {
            // Work referring to the views may still be pending.
            if let Err(err) = backend.queue().submit(|| backend.wait_idle()) {
                tracer.log(
                    Level::ERROR,
                    format_args!("wait idle before destroying {:?} failed: {err}", self.id),
                );
            }
            for view in image.views_alpha.into_iter().chain(image.views_no_alpha) {
                backend.destroy_view(view);
            }
            for sampler in [image.sampler, image.repeat_sampler].into_iter().flatten() {
                backend.destroy_sampler(sampler);
            }
        }

        for image in self.images {
            backend.release_image(image);
        }
    }
}

/// Sending half held by each swapchain.
#[derive(Debug, Clone)]
pub(crate) struct DestroySender(Sender<SwapchainResources>);

impl DestroySender {
    /// Queues resources for collection. Hands them back if the compositor
    /// is gone.
    pub(crate) fn send(&self, resources: SwapchainResources) -> Result<(), SwapchainResources> {
        self.0.send(resources).map_err(|SendError(resources)| resources)
    }
}

/// Receiving half, owned by the compositor.
#[derive(Debug)]
pub(crate) struct DestroyQueue {
    tx: Sender<SwapchainResources>,
    inbox: Mutex<Inbox>,
}

#[derive(Debug)]
struct Inbox {
    rx: Receiver<SwapchainResources>,
    received: Vec<SwapchainResources>,
}

impl Inbox {
    fn pull(&mut self) {
        self.received.extend(self.rx.try_iter());
    }
}

impl DestroyQueue {
    pub(crate) fn new() -> Self {
        let (tx, rx) = channel();
        Self {
            tx,
            inbox: Mutex::new(Inbox {
                rx,
                received: Vec::new(),
            }),
        }
    }

    pub(crate) fn sender(&self) -> DestroySender {
        DestroySender(self.tx.clone())
    }

    /// Takes everything sent so far, in send order.
    pub(crate) fn drain(&self) -> Vec<SwapchainResources> {
        let mut inbox = self.inbox.lock();
        inbox.pull();
        core::mem::take(&mut inbox.received)
    }

    pub(crate) fn len(&self) -> usize {
        let mut inbox = self.inbox.lock();
        inbox.pull();
        inbox.received.len()
    }
}
