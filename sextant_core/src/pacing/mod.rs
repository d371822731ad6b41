// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor frame pacing.
//!
//! A [`PacingTarget`] asks its [`CompositorPacing`] model when to wake up
//! and which present to aim for, reports the frame's progress, and feeds
//! presentation feedback back so later predictions adapt.
//!
//! ```text
//!   calc_frame_pacing ──► sleep until wake-up ──► WakeUp ──► Begin ──► Submit
//!          ▲                                                              │
//!          └──────────── update_timings ◄── display feedback ◄────────────┘
//! ```
//!
//! Two models are provided: [`FakePacing`] for displays that report nothing
//! and [`DisplayTimingPacing`] for those reporting past presentation timing.
//! Applications are paced separately by [`AppPacing`], which is fed the
//! compositor's predictions.

mod app;
mod display_timing;
mod fake;
mod model;
pub mod sim;
mod target;

pub use app::{APP_FRAME_COUNT, AppPacing, AppPacingConfig, AppPrediction};
pub use display_timing::{DisplayTimingConfig, DisplayTimingPacing, NUM_FRAMES};
pub use fake::{FakePacing, FakePacingConfig};
pub use model::{
    CompositorPacing, FrameId, FramePrediction, PacingKind, PresentationTiming, TimingPoint,
};
pub use target::{
    NoPresentTiming, PacingTarget, PresentTimingSource, TargetImageInfo, TargetSettings,
};
