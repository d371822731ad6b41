// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The compositor target that owns a pacing model.

use std::sync::Arc;

use crate::swapchain::Format;
use crate::time::{Clock, NS_PER_SEC, ns_to_ms};
use crate::trace::{Level, TimingPointEvent, Tracer};

use super::display_timing::{DisplayTimingConfig, DisplayTimingPacing};
use super::fake::{FakePacing, FakePacingConfig};
use super::model::{
    CompositorPacing, FrameId, FramePrediction, PacingKind, PresentationTiming, TimingPoint,
};

/// How a [`PacingTarget`] paces its frames.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetSettings {
    /// Refresh period assumed until the display says otherwise.
    pub nominal_frame_interval_ns: u64,
    /// Settings for the display-timing model.
    pub display_timing: DisplayTimingConfig,
    /// Settings for the fake model.
    pub fake: FakePacingConfig,
    /// Use display timing when the platform reports presentation feedback.
    pub use_display_timing: bool,
}

impl TargetSettings {
    /// Settings for a display refreshing at `hz`, preferring display timing.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "a refresh period fits in u64 nanoseconds"
    )]
    pub fn from_refresh_rate(hz: f64) -> Self {
        Self {
            nominal_frame_interval_ns: (NS_PER_SEC as f64 / hz) as u64,
            ..Self::default()
        }
    }
}

impl Default for TargetSettings {
    /// 60Hz with display timing when available.
    fn default() -> Self {
        Self {
            nominal_frame_interval_ns: NS_PER_SEC / 60,
            display_timing: DisplayTimingConfig::DEFAULT,
            fake: FakePacingConfig::DEFAULT,
            use_display_timing: true,
        }
    }
}

/// Size and format of the images a target presents.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TargetImageInfo {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel format.
    pub format: Format,
}

/// Where a target learns how its presents actually went.
///
/// Polling is non-blocking; a platform without feedback keeps the defaults
/// and the target falls back to fixed-period pacing.
pub trait PresentTimingSource: Send {
    /// Whether past presentation timings are reported at all.
    fn supports_display_timing(&self) -> bool {
        false
    }

    /// Timings reported since the last poll, oldest first.
    fn poll_past_presentation_timings(&mut self) -> Vec<PresentationTiming> {
        Vec::new()
    }

    /// The latest vblank seen through display control, if any since the last
    /// call.
    fn take_last_vblank_ns(&mut self) -> Option<u64> {
        None
    }

    /// A newly measured delay between scanout and photons, if any.
    fn present_offset_ns(&mut self) -> Option<u64> {
        None
    }
}

/// A platform with no feedback at all.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoPresentTiming;

impl PresentTimingSource for NoPresentTiming {}

/// Presents compositor frames and paces them.
///
/// The pacing model is picked when images are first created: display timing
/// if the settings ask for it and the timing source supports it, the fake
/// model otherwise.
pub struct PacingTarget {
    settings: TargetSettings,
    clock: Arc<dyn Clock>,
    source: Box<dyn PresentTimingSource>,
    pacing: Option<Box<dyn CompositorPacing>>,
    image_info: Option<TargetImageInfo>,
    current_frame_id: Option<FrameId>,
    tracer: Tracer,
}

impl core::fmt::Debug for PacingTarget {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PacingTarget")
            .field("settings", &self.settings)
            .field("pacing", &self.pacing_kind())
            .field("image_info", &self.image_info)
            .field("current_frame_id", &self.current_frame_id)
            .finish_non_exhaustive()
    }
}

impl PacingTarget {
    /// Creates a target with no images and no pacing model yet.
    #[must_use]
    pub fn new(
        settings: TargetSettings,
        clock: Arc<dyn Clock>,
        source: Box<dyn PresentTimingSource>,
        tracer: Tracer,
    ) -> Self {
        Self {
            settings,
            clock,
            source,
            pacing: None,
            image_info: None,
            current_frame_id: None,
            tracer,
        }
    }

    /// (Re)creates the images to present and, on first use, the pacing
    /// model.
    pub fn create_images(&mut self, info: &TargetImageInfo) {
        self.tracer.log(
            Level::DEBUG,
            format_args!(
                "creating target images {}x{} {:?}",
                info.width, info.height, info.format
            ),
        );
        self.image_info = Some(*info);
        self.ensure_pacing();
    }

    /// The images last created, if any.
    #[must_use]
    pub fn image_info(&self) -> Option<&TargetImageInfo> {
        self.image_info.as_ref()
    }

    /// Which model paces frames, once one exists.
    #[must_use]
    pub fn pacing_kind(&self) -> Option<PacingKind> {
        self.pacing.as_ref().map(|p| p.kind())
    }

    /// The frame most recently predicted.
    #[must_use]
    pub fn current_frame_id(&self) -> Option<FrameId> {
        self.current_frame_id
    }

    fn ensure_pacing(&mut self) -> &mut dyn CompositorPacing {
        let Self {
            settings,
            clock,
            source,
            pacing,
            tracer,
            ..
        } = self;

        pacing
            .get_or_insert_with(|| -> Box<dyn CompositorPacing> {
                let period = settings.nominal_frame_interval_ns;
                if settings.use_display_timing && source.supports_display_timing() {
                    tracer.log(Level::INFO, format_args!("pacing with display timing"));
                    Box::new(DisplayTimingPacing::new(
                        period,
                        &settings.display_timing,
                        tracer.clone(),
                    ))
                } else {
                    tracer.log(
                        Level::INFO,
                        format_args!(
                            "pacing with a fixed {:.2}ms period",
                            ns_to_ms(period as i64)
                        ),
                    );
                    Box::new(FakePacing::new(
                        period,
                        clock.now_ns(),
                        &settings.fake,
                        tracer.clone(),
                    ))
                }
            })
            .as_mut()
    }

    /// Predicts the next frame from the current time.
    pub fn calc_frame_pacing(&mut self) -> FramePrediction {
        let now_ns = self.clock.now_ns();
        let prediction = self.ensure_pacing().predict(now_ns);
        self.current_frame_id = Some(prediction.frame_id);
        prediction
    }

    /// Records that the current frame reached `point` at `when_ns`.
    ///
    /// # Panics
    ///
    /// Panics if `frame_id` is not the frame most recently returned by
    /// [`calc_frame_pacing`](Self::calc_frame_pacing).
    pub fn mark_timing_point(&mut self, point: TimingPoint, frame_id: FrameId, when_ns: u64) {
        assert_eq!(
            Some(frame_id),
            self.current_frame_id,
            "marked {point:?} for {frame_id:?} but the current frame is {:?}",
            self.current_frame_id
        );
        self.tracer.timing_point(&TimingPointEvent {
            frame_id,
            point,
            when_ns,
        });
        self.ensure_pacing().mark_point(point, frame_id, when_ns);
    }

    /// Feeds whatever the platform reported since the last call back into
    /// the pacing model. Returns the number of presentation timings fed.
    pub fn update_timings(&mut self) -> usize {
        let Some(pacing) = self.pacing.as_mut() else {
            return 0;
        };

        let mut fed = 0;
        if self.source.supports_display_timing() {
            let now_ns = self.clock.now_ns();
            for timing in self.source.poll_past_presentation_timings() {
                pacing.info(&timing, now_ns);
                fed += 1;
            }
        }

        if let Some(offset_ns) = self.source.present_offset_ns() {
            pacing.update_present_offset(self.current_frame_id.unwrap_or_default(), offset_ns);
        }

        if let Some(vblank_ns) = self.source.take_last_vblank_ns().filter(|ns| *ns != 0) {
            pacing.update_vblank_from_display_control(vblank_ns);
        }

        fed
    }

    /// Tears the target down.
    pub fn destroy(self) {
        self.tracer.log(
            Level::DEBUG,
            format_args!("destroying target ({:?})", self.pacing_kind()),
        );
    }
}
