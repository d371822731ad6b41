// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Fixed-period pacing for displays without timing feedback.

use crate::time::{HALF_MS_NS, NS_PER_MS, ns_to_ms, percent_of};
use crate::trace::{FramePredictedEvent, Level, Tracer};

use super::model::{
    CompositorPacing, FrameId, FramePrediction, PacingKind, PresentationTiming, TimingPoint,
};

/// Configuration for [`FakePacing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FakePacingConfig {
    /// Initial guess of the delay between scanout and photons.
    pub present_to_display_offset_ns: u64,
    /// Compositor time as a percentage of the frame period.
    pub comp_time_fraction: u32,
    /// Lower bound on compositor time.
    pub min_comp_time_ns: u64,
    /// How far past creation the first present is placed.
    pub initial_present_delay_ns: u64,
}

impl FakePacingConfig {
    /// 4ms display offset, 20% of the frame (at least 2ms) for the
    /// compositor, first present 50ms out.
    pub const DEFAULT: Self = Self {
        present_to_display_offset_ns: 4 * NS_PER_MS,
        comp_time_fraction: 20,
        min_comp_time_ns: 2 * NS_PER_MS,
        initial_present_delay_ns: 50 * NS_PER_MS,
    };
}

impl Default for FakePacingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Predicts presents on a fixed grid of frame periods.
///
/// The grid is anchored on the last known present, initially a guess in the
/// near future, and re-anchored whenever a vblank is reported. Timing
/// points and presentation feedback are ignored.
#[derive(Debug)]
pub struct FakePacing {
    frame_period_ns: u64,
    last_present_time_ns: u64,
    present_to_display_offset_ns: u64,
    comp_time_ns: u64,
    next_frame_id: i64,
    tracer: Tracer,
}

impl FakePacing {
    /// Creates a model for a display refreshing every `frame_period_ns`.
    #[must_use]
    pub fn new(frame_period_ns: u64, now_ns: u64, config: &FakePacingConfig, tracer: Tracer) -> Self {
        let comp_time_ns =
            percent_of(frame_period_ns, config.comp_time_fraction).max(config.min_comp_time_ns);

        tracer.log(
            Level::INFO,
            format_args!(
                "created fake pacing ({:.2}ms period)",
                ns_to_ms(frame_period_ns as i64)
            ),
        );

        Self {
            frame_period_ns,
            last_present_time_ns: now_ns + config.initial_present_delay_ns,
            present_to_display_offset_ns: config.present_to_display_offset_ns,
            comp_time_ns,
            // Start away from zero so callers can't rely on ids being indices.
            next_frame_id: 5,
            tracer,
        }
    }

    /// Time set aside for the compositor before each present.
    #[must_use]
    pub fn comp_time_ns(&self) -> u64 {
        self.comp_time_ns
    }

    fn predict_next_present_time(&self, now_ns: u64) -> u64 {
        let mut present_ns = self.last_present_time_ns + self.frame_period_ns;
        while now_ns + self.comp_time_ns > present_ns {
            present_ns += self.frame_period_ns;
        }
        present_ns
    }
}

impl CompositorPacing for FakePacing {
    fn kind(&self) -> PacingKind {
        PacingKind::Fake
    }

    fn predict(&mut self, now_ns: u64) -> FramePrediction {
        let frame_id = FrameId(self.next_frame_id);
        self.next_frame_id += 1;

        let desired_present_time_ns = self.predict_next_present_time(now_ns);
        let prediction = FramePrediction {
            frame_id,
            wake_up_time_ns: desired_present_time_ns - self.comp_time_ns,
            desired_present_time_ns,
            present_slop_ns: HALF_MS_NS,
            predicted_display_time_ns: desired_present_time_ns + self.present_to_display_offset_ns,
            predicted_display_period_ns: self.frame_period_ns,
            min_display_period_ns: self.frame_period_ns,
        };

        self.tracer.frame_predicted(&FramePredictedEvent {
            kind: PacingKind::Fake,
            frame_id,
            when_ns: now_ns,
            wake_up_time_ns: prediction.wake_up_time_ns,
            desired_present_time_ns,
            predicted_display_time_ns: prediction.predicted_display_time_ns,
        });
        prediction
    }

    fn mark_point(&mut self, _point: TimingPoint, _frame_id: FrameId, _when_ns: u64) {}

    fn info(&mut self, _timing: &PresentationTiming, _when_ns: u64) {}

    fn update_vblank_from_display_control(&mut self, last_vblank_ns: u64) {
        self.last_present_time_ns = last_vblank_ns;
    }

    fn update_present_offset(&mut self, _frame_id: FrameId, present_to_display_offset_ns: u64) {
        self.present_to_display_offset_ns = present_to_display_offset_ns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::tests::capture;

    const PERIOD: u64 = 16 * NS_PER_MS;

    fn fake(now_ns: u64) -> FakePacing {
        FakePacing::new(PERIOD, now_ns, &FakePacingConfig::default(), Tracer::none())
    }

    #[test]
    fn ids_start_at_five_and_increase() {
        let mut pacing = fake(0);
        let ids: Vec<_> = (0..3).map(|_| pacing.predict(0).frame_id).collect();
        assert_eq!(ids, vec![FrameId(5), FrameId(6), FrameId(7)], "ids");
    }

    #[test]
    fn comp_time_has_a_floor() {
        assert_eq!(fake(0).comp_time_ns(), 3_200_000, "20% of 16ms");
        let fast = FakePacing::new(
            5 * NS_PER_MS,
            0,
            &FakePacingConfig::default(),
            Tracer::none(),
        );
        assert_eq!(fast.comp_time_ns(), 2 * NS_PER_MS, "at least 2ms");
    }

    #[test]
    fn first_prediction_is_one_period_after_the_guess() {
        let now = 1_000 * NS_PER_MS;
        let mut pacing = fake(now);
        let p = pacing.predict(now);
        let desired = now + 50 * NS_PER_MS + PERIOD;
        assert_eq!(p.desired_present_time_ns, desired, "desired");
        assert_eq!(p.wake_up_time_ns, desired - 3_200_000, "wake");
        assert_eq!(p.predicted_display_time_ns, desired + 4 * NS_PER_MS, "display");
        assert_eq!(p.present_slop_ns, HALF_MS_NS, "slop");
        assert_eq!(p.predicted_display_period_ns, PERIOD, "period");
        assert_eq!(p.min_display_period_ns, PERIOD, "min period");
    }

    #[test]
    fn skips_periods_that_leave_no_compositor_time() {
        let mut pacing = fake(0);
        pacing.update_vblank_from_display_control(100 * NS_PER_MS);
        // 115ms + 3.2ms overshoots 116ms, so the next slot is 132ms.
        let p = pacing.predict(115 * NS_PER_MS);
        assert_eq!(p.desired_present_time_ns, 132 * NS_PER_MS, "next usable slot");
        assert!(p.wake_up_time_ns >= 115 * NS_PER_MS, "wake in the future");
    }

    #[test]
    fn present_offset_is_applied() {
        let mut pacing = fake(0);
        pacing.update_present_offset(FrameId(5), 7 * NS_PER_MS);
        let p = pacing.predict(0);
        assert_eq!(
            p.predicted_display_time_ns - p.desired_present_time_ns,
            7 * NS_PER_MS,
            "new offset"
        );
    }

    #[test]
    fn predictions_are_traced() {
        let (tracer, sink) = capture();
        let mut pacing = FakePacing::new(PERIOD, 0, &FakePacingConfig::default(), tracer);
        let p = pacing.predict(10);
        let events = sink.predictions.lock().clone();
        assert_eq!(events.len(), 1, "one event");
        assert_eq!(events[0].frame_id, p.frame_id, "same frame");
        assert_eq!(events[0].kind, PacingKind::Fake, "kind");
        assert_eq!(sink.logged_at(Level::INFO).len(), 1, "creation logged");
    }
}
