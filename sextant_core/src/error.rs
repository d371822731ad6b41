// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types.
//!
//! Recoverable failures are returned as these enums; contract violations
//! (stale handles, frame id mismatches) panic instead.

use thiserror::Error;

use crate::device::DeviceId;
use crate::swapchain::Format;

/// Failures of the space overseer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum SpaceError {
    /// The device was never linked to a space.
    #[error("device {device:?} has no space linked to it")]
    DeviceNotLinked {
        /// The device that was looked up.
        device: DeviceId,
    },
}

/// Failures reported by a [`GraphicsBackend`](crate::swapchain::GraphicsBackend).
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The image format is not supported by the device.
    #[error("format not supported")]
    FormatNotSupported,
    /// A requested feature, such as multisampling, is missing.
    #[error("feature not present")]
    FeatureNotPresent,
    /// A wait did not finish in time.
    #[error("timed out")]
    Timeout,
    /// Device or host memory ran out.
    #[error("out of memory")]
    OutOfMemory,
    /// Anything else, with the backend's description.
    #[error("device error: {0}")]
    Device(String),
}

/// Failures of swapchain operations.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum SwapchainError {
    /// Every image is acquired, or the free queue is already full on
    /// release. Retry after a frame has been presented.
    #[error("no image available")]
    NoImageAvailable,
    /// A recognized create flag that this runtime does not support.
    #[error("create flag is valid but unsupported")]
    FlagValidButUnsupported,
    /// The requested format cannot be allocated.
    #[error("swapchain format {format:?} is unsupported")]
    FormatUnsupported {
        /// The rejected format.
        format: Format,
    },
    /// An image index past the end of the swapchain.
    #[error("image index {index} out of range for {count} images")]
    IndexOutOfRange {
        /// The index passed in.
        index: u32,
        /// Number of images in the swapchain.
        count: u32,
    },
    /// The image was not acquired by the caller.
    #[error("image {index} is not acquired")]
    ImageNotAcquired {
        /// The index passed in.
        index: u32,
    },
    /// Waiting for an image timed out.
    #[error("timed out waiting for image")]
    Timeout,
    /// Any other backend failure, passed through.
    #[error("graphics backend error")]
    Backend(#[source] BackendError),
}

impl From<BackendError> for SwapchainError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Timeout => Self::Timeout,
            other => Self::Backend(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn backend_timeout_maps_to_timeout() {
        assert_eq!(
            SwapchainError::from(BackendError::Timeout),
            SwapchainError::Timeout,
            "timeouts keep their meaning"
        );
    }

    #[test]
    fn backend_error_is_the_source() {
        let err = SwapchainError::from(BackendError::OutOfMemory);
        assert_eq!(err, SwapchainError::Backend(BackendError::OutOfMemory), "wrapped");
        assert_eq!(
            err.source().map(ToString::to_string),
            Some("out of memory".to_owned()),
            "source preserved"
        );
    }

    #[test]
    fn messages_name_the_details() {
        let err = SwapchainError::IndexOutOfRange { index: 4, count: 3 };
        assert_eq!(err.to_string(), "image index 4 out of range for 3 images", "display");
        let err = SpaceError::DeviceNotLinked {
            device: DeviceId(2),
        };
        assert_eq!(err.to_string(), "device DeviceId(2) has no space linked to it", "display");
    }
}
