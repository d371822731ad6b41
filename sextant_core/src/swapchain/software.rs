// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A CPU-only [`GraphicsBackend`].

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::error::BackendError;

use super::backend::{AddressMode, GraphicsBackend, ImageView, NativeImage, Queue, Sampler, ViewDesc};
use super::info::{Format, SwapchainCreateInfo};

/// Formats the software backend can allocate.
const SUPPORTED_FORMATS: &[Format] = &[
    Format::R8G8B8A8_UNORM,
    Format::R8G8B8A8_SRGB,
    Format::B8G8R8A8_UNORM,
    Format::B8G8R8A8_SRGB,
    Format::A2B10G10R10_UNORM,
    Format::R16G16B16A16_SFLOAT,
    Format::D16_UNORM,
    Format::D32_SFLOAT,
    Format::D24_UNORM_S8_UINT,
];

/// Hands out handles from a counter and tracks which are alive.
///
/// Multisampled images are rejected with
/// [`BackendError::FeatureNotPresent`]; formats outside a fixed table with
/// [`BackendError::FormatNotSupported`].
#[derive(Debug, Default)]
pub struct SoftwareBackend {
    queue: Queue,
    next_handle: AtomicU64,
    live: Mutex<Live>,
}

#[derive(Debug, Default)]
struct Live {
    images: HashSet<u64>,
    views: HashSet<u64>,
    samplers: HashSet<u64>,
}

impl SoftwareBackend {
    /// Creates a backend with nothing allocated.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self) -> u64 {
        self.next_handle.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// A counter handle not already taken by an imported image.
    fn image_handle(&self, live: &Live) -> u64 {
        loop {
            let handle = self.handle();
            if !live.images.contains(&handle) {
                return handle;
            }
        }
    }

    /// Number of images currently alive.
    #[must_use]
    pub fn live_images(&self) -> usize {
        self.live.lock().images.len()
    }

    /// Number of views currently alive.
    #[must_use]
    pub fn live_views(&self) -> usize {
        self.live.lock().views.len()
    }

    /// Number of samplers currently alive.
    #[must_use]
    pub fn live_samplers(&self) -> usize {
        self.live.lock().samplers.len()
    }
}

/// Tightly packed size of one image, all layers and faces.
fn image_size(info: &SwapchainCreateInfo) -> u64 {
    let texel: u64 = match info.format {
        Format::R16G16B16A16_SFLOAT => 8,
        Format::D16_UNORM => 2,
        _ => 4,
    };
    u64::from(info.width)
        * u64::from(info.height)
        * u64::from(info.array_size)
        * u64::from(info.face_count)
        * texel
}

impl GraphicsBackend for SoftwareBackend {
    fn queue(&self) -> &Queue {
        &self.queue
    }

    fn allocate_images(
        &self,
        info: &SwapchainCreateInfo,
        count: u32,
    ) -> Result<Vec<NativeImage>, BackendError> {
        if info.sample_count > 1 {
            return Err(BackendError::FeatureNotPresent);
        }
        if !SUPPORTED_FORMATS.contains(&info.format) {
            return Err(BackendError::FormatNotSupported);
        }
        if info.width == 0 || info.height == 0 || info.array_size == 0 {
            return Err(BackendError::Device(format!(
                "zero-sized image {}x{}x{}",
                info.width, info.height, info.array_size
            )));
        }

        let size = image_size(info);
        let mut live = self.live.lock();
        Ok((0..count)
            .map(|_| {
                let handle = self.image_handle(&live);
                live.images.insert(handle);
                NativeImage {
                    handle,
                    size,
                    use_dedicated_allocation: true,
                }
            })
            .collect())
    }

    fn import_images(
        &self,
        _info: &SwapchainCreateInfo,
        natives: Vec<NativeImage>,
    ) -> Result<Vec<NativeImage>, BackendError> {
        let mut live = self.live.lock();
        let mut seen = HashSet::with_capacity(natives.len());
        if let Some(dup) = natives
            .iter()
            .find(|n| live.images.contains(&n.handle) || !seen.insert(n.handle))
        {
            return Err(BackendError::Device(format!(
                "image handle {:#x} imported twice",
                dup.handle
            )));
        }
        live.images.extend(seen);
        Ok(natives)
    }

    fn create_view(&self, image: &NativeImage, _desc: &ViewDesc) -> Result<ImageView, BackendError> {
        let mut live = self.live.lock();
        if !live.images.contains(&image.handle) {
            return Err(BackendError::Device(format!(
                "view of unknown image {:#x}",
                image.handle
            )));
        }
        let handle = self.handle();
        live.views.insert(handle);
        Ok(ImageView(handle))
    }

    fn create_sampler(&self, _mode: AddressMode) -> Result<Sampler, BackendError> {
        let handle = self.handle();
        self.live.lock().samplers.insert(handle);
        Ok(Sampler(handle))
    }

    fn prepare_images(&self, _images: &[NativeImage], _array_size: u32) -> Result<(), BackendError> {
        Ok(())
    }

    fn wait_image(&self, _image: &NativeImage, _timeout_ns: u64) -> Result<(), BackendError> {
        Ok(())
    }

    fn wait_idle(&self) -> Result<(), BackendError> {
        Ok(())
    }

    fn destroy_view(&self, view: ImageView) {
        self.live.lock().views.remove(&view.0);
    }

    fn destroy_sampler(&self, sampler: Sampler) {
        self.live.lock().samplers.remove(&sampler.0);
    }

    fn release_image(&self, image: NativeImage) {
        self.live.lock().images.remove(&image.handle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::swapchain::backend::{ImageAspect, Swizzle};

    fn info() -> SwapchainCreateInfo {
        SwapchainCreateInfo::color(Format::R8G8B8A8_SRGB, 16, 8)
    }

    #[test]
    fn allocates_distinct_handles() {
        let backend = SoftwareBackend::new();
        let images = backend.allocate_images(&info(), 3).expect("allocation");
        assert_eq!(images.len(), 3, "count");
        assert_ne!(images[0].handle, images[1].handle, "distinct");
        assert_eq!(images[0].size, 16 * 8 * 4, "packed size");
        assert_eq!(backend.live_images(), 3, "tracked");
    }

    #[test]
    fn rejects_multisampling_and_unknown_formats() {
        let backend = SoftwareBackend::new();
        let mut msaa = info();
        msaa.sample_count = 4;
        assert_eq!(
            backend.allocate_images(&msaa, 1),
            Err(BackendError::FeatureNotPresent),
            "multisampling"
        );
        let mut odd = info();
        odd.format = Format(1_000_156_000);
        assert_eq!(
            backend.allocate_images(&odd, 1),
            Err(BackendError::FormatNotSupported),
            "unknown format"
        );
        assert_eq!(backend.live_images(), 0, "nothing leaked");
    }

    #[test]
    fn views_need_a_live_image() {
        let backend = SoftwareBackend::new();
        let desc = ViewDesc {
            format: Format::R8G8B8A8_SRGB,
            aspect: ImageAspect::Color,
            layer: 0,
            swizzle: Swizzle::Identity,
        };
        let stray = NativeImage {
            handle: 99,
            size: 0,
            use_dedicated_allocation: false,
        };
        assert!(backend.create_view(&stray, &desc).is_err(), "unknown image");

        let image = backend.allocate_images(&info(), 1).expect("allocation")[0];
        let view = backend.create_view(&image, &desc).expect("view");
        assert_eq!(backend.live_views(), 1, "view tracked");
        backend.destroy_view(view);
        backend.release_image(image);
        assert_eq!(backend.live_views(), 0, "view gone");
        assert_eq!(backend.live_images(), 0, "image gone");
    }

    fn native(handle: u64) -> NativeImage {
        NativeImage {
            handle,
            size: 64,
            use_dedicated_allocation: false,
        }
    }

    #[test]
    fn double_import_is_refused() {
        let backend = SoftwareBackend::new();
        assert!(
            backend.import_images(&info(), vec![native(0x1000)]).is_ok(),
            "first import"
        );
        assert!(
            backend.import_images(&info(), vec![native(0x1000)]).is_err(),
            "second import"
        );
    }

    #[test]
    fn repeated_handle_in_one_import_is_refused() {
        let backend = SoftwareBackend::new();
        assert!(
            backend
                .import_images(&info(), vec![native(1), native(1)])
                .is_err(),
            "same handle twice"
        );
        assert_eq!(backend.live_images(), 0, "nothing recorded");
    }

    #[test]
    fn allocation_skips_imported_handles() {
        let backend = SoftwareBackend::new();
        backend
            .import_images(&info(), vec![native(1), native(2)])
            .expect("import");
        let images = backend.allocate_images(&info(), 2).expect("allocation");
        assert!(
            images.iter().all(|i| i.handle != 1 && i.handle != 2),
            "fresh handles: {images:?}"
        );
        assert_eq!(backend.live_images(), 4, "all four tracked");
        for image in images {
            backend.release_image(image);
        }
        assert_eq!(backend.live_images(), 2, "imported images untouched");
    }
}
