// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Runtime core for an OpenXR-style XR runtime.
//!
//! `sextant_core` holds the three pieces every frame of an XR session goes
//! through: working out where things are, handing images to the application
//! to render into, and deciding when the compositor should run.
//!
//! # Architecture
//!
//! ```text
//!   TrackedDevice ──► SpaceOverseer::locate_space() ──► SpaceRelation
//!                                                           │
//!                 ┌─────────────────────────────────────────┘
//!                 ▼
//!   Swapchain::acquire_image() ──► render ──► release_image()
//!                                                  │
//!                 ┌────────────────────────────────┘
//!                 ▼
//!   PacingTarget::calc_frame_pacing() ──► mark_timing_point() ──► update_timings()
//! ```
//!
//! **[`space`]**: Reference-counted graph of spaces rooted at a single
//! root. Offset spaces carry a fixed pose, pose spaces follow a tracked
//! device input. Relations between any two spaces are resolved by composing
//! the steps along both paths to the root.
//!
//! **[`relation`]** and **[`math`]**: Poses, relations with validity flags,
//! and the relation chain that composes them.
//!
//! **[`device`]**: The [`TrackedDevice`](device::TrackedDevice) trait the
//! overseer queries for poses.
//!
//! **[`swapchain`]**: Image allocation and import on a
//! [`GraphicsBackend`](swapchain::GraphicsBackend), per-image views and
//! samplers, the free-index FIFO, and deferred destruction.
//!
//! **[`pacing`]**: Frame-pacing models and the compositor target driving
//! them.
//!
//! **[`time`]**: Monotonic nanosecond clock and timing helpers.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! instrumentation, behind the [`Tracer`](trace::Tracer) handle. Log lines
//! go through `tracing`.
//!
//! **[`error`]**: Error types returned by the overseer and swapchains.

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod device;
pub mod error;
pub mod math;
pub mod pacing;
pub mod relation;
pub mod space;
pub mod swapchain;
pub mod time;
pub mod trace;
