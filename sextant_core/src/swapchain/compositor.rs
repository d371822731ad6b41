// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swapchain creation and garbage collection.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::error::{BackendError, SwapchainError};
use crate::trace::{Level, SwapchainEvent, Tracer};

use super::backend::{AddressMode, GraphicsBackend, ImageAspect, NativeImage, Swizzle, ViewDesc};
use super::chain::Swapchain;
use super::gc::{DestroyQueue, ImageResources, SwapchainResources};
use super::info::{CreateFlags, CreateProperties, SwapchainCreateInfo, SwapchainSettings};
use super::SwapchainId;

/// Creates swapchains on a [`GraphicsBackend`] and frees destroyed ones.
#[derive(Debug)]
pub struct SwapchainCompositor {
    backend: Arc<dyn GraphicsBackend>,
    settings: SwapchainSettings,
    garbage: DestroyQueue,
    next_id: AtomicU64,
    tracer: Tracer,
}

impl SwapchainCompositor {
    /// Creates a compositor allocating through `backend`.
    #[must_use]
    pub fn new(backend: Arc<dyn GraphicsBackend>, settings: SwapchainSettings, tracer: Tracer) -> Self {
        Self {
            backend,
            settings,
            garbage: DestroyQueue::new(),
            next_id: AtomicU64::new(1),
            tracer,
        }
    }

    /// The backend swapchains are allocated on.
    #[must_use]
    pub fn backend(&self) -> &Arc<dyn GraphicsBackend> {
        &self.backend
    }

    /// What [`create`](Self::create) would produce for `info`.
    #[must_use]
    pub fn get_create_properties(&self, info: &SwapchainCreateInfo) -> CreateProperties {
        CreateProperties {
            image_count: self.settings.image_count_for(info),
        }
    }

    /// Allocates a new swapchain.
    ///
    /// # Errors
    ///
    /// - [`SwapchainError::FlagValidButUnsupported`] for protected content
    ///   or features the device lacks.
    /// - [`SwapchainError::FormatUnsupported`] for formats the device cannot
    ///   allocate.
    /// - [`SwapchainError::Backend`] for anything else the backend reports.
    pub fn create(&self, info: &SwapchainCreateInfo) -> Result<Swapchain, SwapchainError> {
        if info.create.contains(CreateFlags::PROTECTED_CONTENT) {
            self.tracer.log(
                Level::WARN,
                format_args!(
                    "swapchain info is valid but protected content swapchains are not supported"
                ),
            );
            return Err(SwapchainError::FlagValidButUnsupported);
        }

        let image_count = self.get_create_properties(info).image_count;
        let id = self.next_id();
        self.tracer.log(
            Level::DEBUG,
            format_args!(
                "create {id:?} {}x{} {:?}",
                info.width, info.height, info.format
            ),
        );

        let images = self
            .backend
            .allocate_images(info, image_count)
            .map_err(|err| match err {
                BackendError::FeatureNotPresent => SwapchainError::FlagValidButUnsupported,
                BackendError::FormatNotSupported => SwapchainError::FormatUnsupported {
                    format: info.format,
                },
                other => {
                    self.tracer
                        .log(Level::ERROR, format_args!("allocating {id:?} failed: {other}"));
                    SwapchainError::Backend(other)
                }
            })?;

        self.finish(id, info, images, false)
    }

    /// Wraps images allocated elsewhere, such as by the application's
    /// graphics API, in a swapchain. The swapchain takes ownership of the
    /// handles and releases them when collected.
    ///
    /// # Errors
    ///
    /// Returns [`SwapchainError::Backend`] if the backend refuses the
    /// images.
    pub fn import(
        &self,
        info: &SwapchainCreateInfo,
        natives: Vec<NativeImage>,
    ) -> Result<Swapchain, SwapchainError> {
        let id = self.next_id();
        self.tracer.log(
            Level::DEBUG,
            format_args!("create {id:?} from native {}x{}", info.width, info.height),
        );

        let images = self.backend.import_images(info, natives).map_err(|err| {
            self.tracer
                .log(Level::ERROR, format_args!("importing {id:?} failed: {err}"));
            SwapchainError::Backend(err)
        })?;

        self.finish(id, info, images, true)
    }

    /// Runs post-creation setup and wraps the result.
    fn finish(
        &self,
        id: SwapchainId,
        info: &SwapchainCreateInfo,
        images: Vec<NativeImage>,
        imported: bool,
    ) -> Result<Swapchain, SwapchainError> {
        let mut resources = SwapchainResources {
            id,
            backend: Arc::clone(&self.backend),
            images,
            per_image: Vec::new(),
        };

        if let Err(err) = self.post_create_setup(info, &mut resources) {
            self.tracer
                .log(Level::ERROR, format_args!("setting up {id:?} failed: {err}"));
            resources.really_destroy(&self.tracer);
            return Err(err.into());
        }

        let swapchain = Swapchain::new(resources, self.garbage.sender(), self.tracer.clone());
        self.tracer.swapchain(&SwapchainEvent::Created {
            swapchain: id,
            image_count: swapchain.image_count(),
            imported,
        });
        Ok(swapchain)
    }

    /// Creates samplers and per-layer views for every image, then
    /// transitions the images for sampling.
    ///
    /// Fills `resources` as it goes, so a failure leaves everything created
    /// so far in it for cleanup.
    fn post_create_setup(
        &self,
        info: &SwapchainCreateInfo,
        resources: &mut SwapchainResources,
    ) -> Result<(), BackendError> {
        let backend = &*self.backend;
        let aspect = ImageAspect::for_view(info.format);

        for image in &resources.images {
            let mut slot = ImageResources::default();
            let made = Self::setup_image(backend, info, aspect, image, &mut slot);
            resources.per_image.push(slot);
            made?;
        }

        backend
            .queue()
            .submit(|| backend.prepare_images(&resources.images, info.array_size))
    }

    fn setup_image(
        backend: &dyn GraphicsBackend,
        info: &SwapchainCreateInfo,
        aspect: ImageAspect,
        image: &NativeImage,
        slot: &mut ImageResources,
    ) -> Result<(), BackendError> {
        slot.repeat_sampler = Some(backend.create_sampler(AddressMode::Repeat)?);
        slot.sampler = Some(backend.create_sampler(AddressMode::ClampToEdge)?);

        for layer in 0..info.array_size {
            let mut desc = ViewDesc {
                format: info.format,
                aspect,
                layer,
                swizzle: Swizzle::Identity,
            };
            slot.views_alpha.push(backend.create_view(image, &desc)?);
            desc.swizzle = Swizzle::ForceOpaque;
            slot.views_no_alpha.push(backend.create_view(image, &desc)?);
        }
        Ok(())
    }

    /// Frees every swapchain destroyed since the last call, after waiting
    /// for the device to go idle. Returns how many were freed.
    ///
    /// Call from the compositor thread, typically once per frame.
    pub fn garbage_collect(&self) -> usize {
        let pending = self.garbage.drain();
        let count = pending.len();
        for resources in pending {
            let id = resources.id;
            self.tracer
                .log(Level::TRACE, format_args!("really destroying {id:?}"));
            resources.really_destroy(&self.tracer);
            self.tracer
                .swapchain(&SwapchainEvent::Collected { swapchain: id });
        }
        count
    }

    /// Number of destroyed swapchains waiting for [`garbage_collect`](Self::garbage_collect).
    #[must_use]
    pub fn pending_destroys(&self) -> usize {
        self.garbage.len()
    }

    fn next_id(&self) -> SwapchainId {
        SwapchainId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }
}

impl Drop for SwapchainCompositor {
    fn drop(&mut self) {
        self.garbage_collect();
    }
}
