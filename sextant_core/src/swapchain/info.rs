// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Swapchain creation parameters.

use core::fmt;

use bitflags::bitflags;

bitflags! {
    /// Special behavior requested at creation.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct CreateFlags: u32 {
        /// Images are protected from CPU access. Not supported here.
        const PROTECTED_CONTENT = 1 << 0;
        /// The application renders into the swapchain once.
        const STATIC_IMAGE = 1 << 1;
    }
}

bitflags! {
    /// How the application will use the images.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct UsageFlags: u32 {
        /// Rendered to as a color attachment.
        const COLOR = 1 << 0;
        /// Rendered to as a depth/stencil attachment.
        const DEPTH_STENCIL = 1 << 1;
        /// Written from compute shaders.
        const UNORDERED_ACCESS = 1 << 2;
        /// Copied from.
        const TRANSFER_SRC = 1 << 3;
        /// Copied to.
        const TRANSFER_DST = 1 << 4;
        /// Sampled in shaders.
        const SAMPLED = 1 << 5;
        /// Viewed with a different but compatible format.
        const MUTABLE_FORMAT = 1 << 6;
        /// Read as an input attachment.
        const INPUT_ATTACHMENT = 1 << 7;
    }
}

/// A graphics-API image format, as the raw enum value of the API.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Format(pub i64);

impl Format {
    /// 8-bit unsigned normalized RGBA.
    pub const R8G8B8A8_UNORM: Self = Self(37);
    /// 8-bit sRGB RGBA.
    pub const R8G8B8A8_SRGB: Self = Self(43);
    /// 8-bit unsigned normalized BGRA.
    pub const B8G8R8A8_UNORM: Self = Self(44);
    /// 8-bit sRGB BGRA.
    pub const B8G8R8A8_SRGB: Self = Self(50);
    /// 10-bit RGB, 2-bit alpha.
    pub const A2B10G10R10_UNORM: Self = Self(64);
    /// 16-bit float RGBA.
    pub const R16G16B16A16_SFLOAT: Self = Self(97);
    /// 16-bit depth.
    pub const D16_UNORM: Self = Self(124);
    /// 32-bit float depth.
    pub const D32_SFLOAT: Self = Self(126);
    /// 24-bit depth, 8-bit stencil.
    pub const D24_UNORM_S8_UINT: Self = Self(129);
    /// 32-bit float depth, 8-bit stencil.
    pub const D32_SFLOAT_S8_UINT: Self = Self(130);

    /// Whether the format has a depth component.
    #[must_use]
    pub const fn has_depth(self) -> bool {
        matches!(
            self,
            Self::D16_UNORM | Self::D32_SFLOAT | Self::D24_UNORM_S8_UINT | Self::D32_SFLOAT_S8_UINT
        )
    }

    /// Whether the format has a stencil component.
    #[must_use]
    pub const fn has_stencil(self) -> bool {
        matches!(self, Self::D24_UNORM_S8_UINT | Self::D32_SFLOAT_S8_UINT)
    }
}

impl fmt::Debug for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match *self {
            Self::R8G8B8A8_UNORM => "R8G8B8A8_UNORM",
            Self::R8G8B8A8_SRGB => "R8G8B8A8_SRGB",
            Self::B8G8R8A8_UNORM => "B8G8R8A8_UNORM",
            Self::B8G8R8A8_SRGB => "B8G8R8A8_SRGB",
            Self::A2B10G10R10_UNORM => "A2B10G10R10_UNORM",
            Self::R16G16B16A16_SFLOAT => "R16G16B16A16_SFLOAT",
            Self::D16_UNORM => "D16_UNORM",
            Self::D32_SFLOAT => "D32_SFLOAT",
            Self::D24_UNORM_S8_UINT => "D24_UNORM_S8_UINT",
            Self::D32_SFLOAT_S8_UINT => "D32_SFLOAT_S8_UINT",
            Self(raw) => return write!(f, "Format({raw})"),
        };
        write!(f, "{name} ({})", self.0)
    }
}

/// Everything needed to allocate or import a swapchain's images.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainCreateInfo {
    /// Special behavior.
    pub create: CreateFlags,
    /// Intended usage.
    pub usage: UsageFlags,
    /// Image format.
    pub format: Format,
    /// Samples per pixel.
    pub sample_count: u32,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// 6 for cube maps, otherwise 1.
    pub face_count: u32,
    /// Number of array layers.
    pub array_size: u32,
    /// Number of mip levels.
    pub mip_count: u32,
}

impl SwapchainCreateInfo {
    /// A single-sampled, single-layer color swapchain.
    #[must_use]
    pub const fn color(format: Format, width: u32, height: u32) -> Self {
        Self {
            create: CreateFlags::empty(),
            usage: UsageFlags::COLOR.union(UsageFlags::SAMPLED),
            format,
            sample_count: 1,
            width,
            height,
            face_count: 1,
            array_size: 1,
            mip_count: 1,
        }
    }
}

/// What the runtime recommends for a given [`SwapchainCreateInfo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CreateProperties {
    /// Number of images the swapchain will have.
    pub image_count: u32,
}

/// Image counts used when allocating.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SwapchainSettings {
    /// Images in a regular swapchain.
    pub image_count: u32,
    /// Images in a [`CreateFlags::STATIC_IMAGE`] swapchain.
    pub static_image_count: u32,
}

impl SwapchainSettings {
    /// Triple buffering, one static image.
    pub const DEFAULT: Self = Self {
        image_count: 3,
        static_image_count: 1,
    };

    /// Image count recommended for `info`.
    #[must_use]
    pub const fn image_count_for(&self, info: &SwapchainCreateInfo) -> u32 {
        if info.create.contains(CreateFlags::STATIC_IMAGE) {
            self.static_image_count
        } else {
            self.image_count
        }
    }
}

impl Default for SwapchainSettings {
    fn default() -> Self {
        Self::DEFAULT
    }
}
