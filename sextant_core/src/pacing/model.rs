// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Types shared by the pacing models.

use core::fmt;

/// Identifies one compositor frame. Issued in increasing order by a pacing
/// model.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FrameId(pub i64);

impl fmt::Debug for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FrameId({:#x})", self.0)
    }
}

/// A point in the compositor's frame the pacing model is told about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimingPoint {
    /// Woke up after waiting for the predicted wake-up time.
    WakeUp,
    /// Began CPU work for the GPU.
    Begin,
    /// Submitted the work to the GPU.
    Submit,
}

/// Which pacing model is in use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PacingKind {
    /// Fixed-period prediction with no feedback.
    Fake,
    /// Adaptive prediction from presentation feedback.
    DisplayTiming,
}

/// When to wake up, when to present, and when photons are expected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePrediction {
    /// The frame these timings are for.
    pub frame_id: FrameId,
    /// When the compositor should wake up to start work.
    pub wake_up_time_ns: u64,
    /// When scanout of the frame should start.
    pub desired_present_time_ns: u64,
    /// How far from the desired present time the present may land.
    pub present_slop_ns: u64,
    /// When pixels are expected to turn into photons.
    pub predicted_display_time_ns: u64,
    /// Expected period between displayed frames.
    pub predicted_display_period_ns: u64,
    /// Shortest possible period between displayed frames.
    pub min_display_period_ns: u64,
}

/// Presentation feedback for one frame, as reported by the display system.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PresentationTiming {
    /// The frame the feedback is for.
    pub frame_id: FrameId,
    /// The present time that was requested.
    pub desired_present_time_ns: u64,
    /// When scanout actually started.
    pub actual_present_time_ns: u64,
    /// The earliest scanout the frame could have made.
    pub earliest_present_time_ns: u64,
    /// How long before `earliest_present_time_ns` the GPU finished.
    pub present_margin_ns: u64,
}

/// A frame-pacing model.
///
/// The compositor asks for a [`predict`](Self::predict)ion once per frame,
/// reports its progress through [`mark_point`](Self::mark_point), and feeds
/// back presentation timing through [`info`](Self::info) when the display
/// system provides it.
pub trait CompositorPacing: Send {
    /// Which model this is.
    fn kind(&self) -> PacingKind;

    /// Predicts the next frame as seen from `now_ns`, issuing a new frame id.
    fn predict(&mut self, now_ns: u64) -> FramePrediction;

    /// Records that `frame_id` reached `point` at `when_ns`.
    fn mark_point(&mut self, point: TimingPoint, frame_id: FrameId, when_ns: u64);

    /// Feeds back presentation timing for a frame, received at `when_ns`.
    fn info(&mut self, timing: &PresentationTiming, when_ns: u64);

    /// Re-anchors on a vblank observed through display control.
    fn update_vblank_from_display_control(&mut self, last_vblank_ns: u64);

    /// Updates the delay between scanout and photons.
    fn update_present_offset(&mut self, frame_id: FrameId, present_to_display_offset_ns: u64);
}

impl fmt::Debug for dyn CompositorPacing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositorPacing")
            .field("kind", &self.kind())
            .finish_non_exhaustive()
    }
}
