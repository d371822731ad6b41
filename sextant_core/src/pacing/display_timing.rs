// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Adaptive pacing driven by presentation feedback.
//!
//! The model keeps the last [`NUM_FRAMES`] frames in a ring indexed by frame
//! id. Each frame walks through a fixed sequence of states:
//!
//! ```text
//!   Predicted ──► Woke ──► Began ──► Submitted ──► Info
//!   (predict)   (WakeUp)  (Begin)    (Submit)     (info)
//! ```
//!
//! Predictions extrapolate from the newest frame with feedback, stepping
//! forward a frame period at a time until there is room for the compositor
//! to do its work. Feedback then grows the compositor's time budget on a
//! missed present and nudges it towards the target margin otherwise.

use crate::time::{HALF_MS_NS, NS_PER_MS, is_within_half_ms, is_within_of_each_other, ns_to_ms, percent_of};
use crate::trace::{FramePredictedEvent, FrameTimingEvent, Level, Tracer};

use super::model::{
    CompositorPacing, FrameId, FramePrediction, PacingKind, PresentationTiming, TimingPoint,
};

/// Number of frames kept for lookups by id.
pub const NUM_FRAMES: usize = 16;

/// Configuration for [`DisplayTimingPacing`]. Fractions are percentages of
/// the frame period.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DisplayTimingConfig {
    /// Initial guess of the delay between scanout and photons.
    pub present_to_display_offset_ns: u64,
    /// How long before scanout the GPU should be done.
    pub margin_ns: u64,
    /// Starting compositor time.
    pub comp_time_fraction: u32,
    /// Upper bound on compositor time.
    pub comp_time_max_fraction: u32,
    /// Compositor time added after a missed present.
    pub adjust_missed_fraction: u32,
    /// Compositor time step when the margin drifts.
    pub adjust_non_miss_fraction: u32,
}

impl DisplayTimingConfig {
    /// 4ms display offset, 1ms margin; compositor time starts at 10% and is
    /// capped at 30%, stepping 4% on a miss and 2% otherwise.
    pub const DEFAULT: Self = Self {
        present_to_display_offset_ns: 4 * NS_PER_MS,
        margin_ns: NS_PER_MS,
        comp_time_fraction: 10,
        comp_time_max_fraction: 30,
        adjust_missed_fraction: 4,
        adjust_non_miss_fraction: 2,
    };
}

impl Default for DisplayTimingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Where a frame is in its life. Later states compare greater.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
enum FrameState {
    #[default]
    Cleared,
    Predicted,
    Woke,
    Began,
    Submitted,
    Info,
}

#[derive(Clone, Copy, Debug, Default)]
struct Frame {
    frame_id: i64,
    when_predict_ns: u64,
    wake_up_time_ns: u64,
    when_woke_ns: u64,
    when_began_ns: u64,
    when_submitted_ns: u64,
    when_infoed_ns: u64,
    current_comp_time_ns: u64,
    desired_present_time_ns: u64,
    predicted_display_time_ns: u64,
    present_margin_ns: u64,
    actual_present_time_ns: u64,
    earliest_present_time_ns: u64,
    state: FrameState,
}

impl Frame {
    fn timing_event(&self) -> FrameTimingEvent {
        FrameTimingEvent {
            frame_id: FrameId(self.frame_id),
            when_predict_ns: self.when_predict_ns,
            wake_up_time_ns: self.wake_up_time_ns,
            when_woke_ns: self.when_woke_ns,
            when_began_ns: self.when_began_ns,
            when_submitted_ns: self.when_submitted_ns,
            when_infoed_ns: self.when_infoed_ns,
            current_comp_time_ns: self.current_comp_time_ns,
            desired_present_time_ns: self.desired_present_time_ns,
            predicted_display_time_ns: self.predicted_display_time_ns,
            actual_present_time_ns: self.actual_present_time_ns,
            earliest_present_time_ns: self.earliest_present_time_ns,
            present_margin_ns: self.present_margin_ns,
        }
    }
}

/// Pacing that adapts the compositor's time budget from presentation
/// feedback.
#[derive(Debug)]
pub struct DisplayTimingPacing {
    frame_period_ns: u64,
    present_to_display_offset_ns: u64,
    comp_time_ns: u64,
    comp_time_max_ns: u64,
    adjust_missed_ns: u64,
    adjust_non_miss_ns: u64,
    margin_ns: u64,
    next_frame_id: i64,
    frames: [Frame; NUM_FRAMES],
    tracer: Tracer,
}

impl DisplayTimingPacing {
    /// Creates a model for a display refreshing roughly every
    /// `estimated_frame_period_ns`.
    #[must_use]
    pub fn new(estimated_frame_period_ns: u64, config: &DisplayTimingConfig, tracer: Tracer) -> Self {
        let period = estimated_frame_period_ns;
        tracer.log(
            Level::INFO,
            format_args!(
                "created compositor pacing ({:.2}ms)",
                ns_to_ms(period as i64)
            ),
        );
        Self {
            frame_period_ns: period,
            present_to_display_offset_ns: config.present_to_display_offset_ns,
            comp_time_ns: percent_of(period, config.comp_time_fraction),
            comp_time_max_ns: percent_of(period, config.comp_time_max_fraction),
            adjust_missed_ns: percent_of(period, config.adjust_missed_fraction),
            adjust_non_miss_ns: percent_of(period, config.adjust_non_miss_fraction),
            margin_ns: config.margin_ns,
            next_frame_id: 0,
            frames: [Frame::default(); NUM_FRAMES],
            tracer,
        }
    }

    /// Current compositor time budget, excluding the margin.
    #[must_use]
    pub fn comp_time_ns(&self) -> u64 {
        self.comp_time_ns
    }

    /// Upper bound of [`comp_time_ns`](Self::comp_time_ns).
    #[must_use]
    pub fn comp_time_max_ns(&self) -> u64 {
        self.comp_time_max_ns
    }

    fn total_comp_time_ns(&self) -> u64 {
        self.comp_time_ns + self.margin_ns
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "the remainder is below NUM_FRAMES"
    )]
    fn slot(frame_id: i64) -> usize {
        debug_assert!(frame_id >= 0, "negative frame id {frame_id}");
        frame_id.rem_euclid(NUM_FRAMES as i64) as usize
    }

    fn frame(&self, frame_id: i64) -> &Frame {
        &self.frames[Self::slot(frame_id)]
    }

    fn frame_mut(&mut self, frame_id: i64) -> &mut Frame {
        &mut self.frames[Self::slot(frame_id)]
    }

    fn create_frame(&mut self, state: FrameState) -> &mut Frame {
        let frame_id = self.next_frame_id;
        self.next_frame_id += 1;
        let f = self.frame_mut(frame_id);
        f.frame_id = frame_id;
        f.state = state;
        f
    }

    /// The newest frame still in the ring that reached at least `state`.
    fn latest_frame_with_state_at_least(&self, state: FrameState) -> Option<&Frame> {
        let start_from = self.next_frame_id;
        (1..NUM_FRAMES as i64)
            .take_while(|count| start_from >= *count)
            .map(|count| start_from - count)
            .map(|frame_id| (frame_id, self.frame(frame_id)))
            .find(|(frame_id, f)| f.state >= state && f.frame_id == *frame_id)
            .map(|(_, f)| f)
    }

    fn clean_slate_frame(&mut self, now_ns: u64) -> i64 {
        // Wild shot in the dark.
        let desired_present_time_ns = now_ns + self.frame_period_ns * 10;
        let f = self.create_frame(FrameState::Predicted);
        f.when_predict_ns = now_ns;
        f.desired_present_time_ns = desired_present_time_ns;
        f.frame_id
    }

    fn walk_forward_through_frames(&mut self, last_present_time_ns: u64, now_ns: u64) -> i64 {
        // Earliest we could present, given the compositor still has to run.
        let from_time_ns = now_ns + self.total_comp_time_ns();
        let mut desired_present_time_ns = last_present_time_ns + self.frame_period_ns;

        while desired_present_time_ns <= from_time_ns {
            self.tracer.log(
                Level::DEBUG,
                format_args!(
                    "skipped present at {desired_present_time_ns}, {:.2}ms short of {from_time_ns}",
                    ns_to_ms((from_time_ns - desired_present_time_ns) as i64)
                ),
            );
            desired_present_time_ns += self.frame_period_ns;
        }

        let f = self.create_frame(FrameState::Predicted);
        f.when_predict_ns = now_ns;
        f.desired_present_time_ns = desired_present_time_ns;
        f.frame_id
    }

    fn predict_next_frame(&mut self, now_ns: u64) -> i64 {
        let last_predicted = self
            .latest_frame_with_state_at_least(FrameState::Predicted)
            .map(|f| (f.frame_id, f.predicted_display_time_ns));
        let last_completed = self
            .latest_frame_with_state_at_least(FrameState::Info)
            .map(|f| (f.frame_id, f.earliest_present_time_ns));

        let frame_id = match (last_predicted, last_completed) {
            (None, _) => self.clean_slate_frame(now_ns),
            (Some((predicted_id, _)), Some((completed_id, earliest_ns)))
                if predicted_id == completed_id =>
            {
                // Most likely a missed frame.
                self.walk_forward_through_frames(earliest_ns, now_ns)
            }
            (Some((predicted_id, _)), Some((completed_id, earliest_ns))) => {
                debug_assert!(predicted_id > completed_id, "feedback for a future frame");
                let diff_id = predicted_id - completed_id;
                let adjusted_ns = earliest_ns + diff_id as u64 * self.frame_period_ns;
                if diff_id > 1 {
                    self.tracer.log(
                        Level::DEBUG,
                        format_args!(
                            "{diff_id} frames without feedback, extrapolated last present to {adjusted_ns}"
                        ),
                    );
                }
                self.walk_forward_through_frames(adjusted_ns, now_ns)
            }
            (Some((_, predicted_display_ns)), None) => {
                self.walk_forward_through_frames(predicted_display_ns, now_ns)
            }
        };

        let offset_ns = self.present_to_display_offset_ns;
        let total_ns = self.total_comp_time_ns();
        let comp_ns = self.comp_time_ns;
        let f = self.frame_mut(frame_id);
        f.predicted_display_time_ns = f.desired_present_time_ns + offset_ns;
        f.wake_up_time_ns = f.desired_present_time_ns - total_ns;
        f.current_comp_time_ns = comp_ns;
        frame_id
    }

    fn adjust_comp_time(&mut self, frame_id: i64) {
        let f = *self.frame(frame_id);

        if f.actual_present_time_ns > f.desired_present_time_ns
            && !is_within_half_ms(f.actual_present_time_ns, f.desired_present_time_ns)
        {
            self.tracer.log(
                Level::WARN,
                format_args!(
                    "frame {:?} missed by {:.2}ms",
                    FrameId(f.frame_id),
                    ns_to_ms((f.actual_present_time_ns - f.desired_present_time_ns) as i64)
                ),
            );
            self.comp_time_ns = (self.comp_time_ns + self.adjust_missed_ns).min(self.comp_time_max_ns);
            return;
        }

        // The GPU finished within the tolerance of the wanted margin.
        if is_within_of_each_other(f.present_margin_ns, self.margin_ns, self.adjust_non_miss_ns) {
            return;
        }

        if f.present_margin_ns > self.margin_ns {
            // Approach the present time.
            self.comp_time_ns = self.comp_time_ns.saturating_sub(self.adjust_non_miss_ns);
        } else {
            // Back off from it.
            self.comp_time_ns += self.adjust_non_miss_ns;
        }
    }

    fn log_discarded(&self, what: &str, frame_id: FrameId, latest: Option<i64>) {
        self.tracer.log(
            Level::WARN,
            format_args!("discarded {what} for unsubmitted or expired frame {frame_id:?}"),
        );
        if let Some(latest) = latest {
            self.tracer.log(
                Level::WARN,
                format_args!("the latest frame with {what} is {:?}", FrameId(latest)),
            );
        }
    }
}

impl CompositorPacing for DisplayTimingPacing {
    fn kind(&self) -> PacingKind {
        PacingKind::DisplayTiming
    }

    fn predict(&mut self, now_ns: u64) -> FramePrediction {
        let frame_id = self.predict_next_frame(now_ns);
        let f = *self.frame(frame_id);

        self.tracer.frame_predicted(&FramePredictedEvent {
            kind: PacingKind::DisplayTiming,
            frame_id: FrameId(frame_id),
            when_ns: now_ns,
            wake_up_time_ns: f.wake_up_time_ns,
            desired_present_time_ns: f.desired_present_time_ns,
            predicted_display_time_ns: f.predicted_display_time_ns,
        });

        FramePrediction {
            frame_id: FrameId(frame_id),
            wake_up_time_ns: f.wake_up_time_ns,
            desired_present_time_ns: f.desired_present_time_ns,
            present_slop_ns: HALF_MS_NS,
            predicted_display_time_ns: f.predicted_display_time_ns,
            predicted_display_period_ns: self.frame_period_ns,
            min_display_period_ns: self.frame_period_ns,
        }
    }

    fn mark_point(&mut self, point: TimingPoint, frame_id: FrameId, when_ns: u64) {
        if frame_id.0 < 0 || self.frame(frame_id.0).frame_id != frame_id.0 {
            let latest = self
                .latest_frame_with_state_at_least(FrameState::Predicted)
                .map(|f| f.frame_id);
            self.log_discarded("point marking", frame_id, latest);
            return;
        }

        let f = self.frame_mut(frame_id.0);
        match point {
            TimingPoint::WakeUp => {
                debug_assert_eq!(f.state, FrameState::Predicted, "wake-up out of order");
                f.state = FrameState::Woke;
                f.when_woke_ns = when_ns;
            }
            TimingPoint::Begin => {
                debug_assert_eq!(f.state, FrameState::Woke, "begin out of order");
                f.state = FrameState::Began;
                f.when_began_ns = when_ns;
            }
            TimingPoint::Submit => {
                debug_assert_eq!(f.state, FrameState::Began, "submit out of order");
                f.state = FrameState::Submitted;
                f.when_submitted_ns = when_ns;
            }
        }
    }

    fn info(&mut self, timing: &PresentationTiming, when_ns: u64) {
        let frame_id = timing.frame_id;
        let last = self
            .latest_frame_with_state_at_least(FrameState::Info)
            .map(|f| (f.frame_id, f.desired_present_time_ns));

        if frame_id.0 < 0 || self.frame(frame_id.0).frame_id != frame_id.0 {
            self.log_discarded("info", frame_id, last.map(|(id, _)| id));
            return;
        }

        let f = self.frame_mut(frame_id.0);
        debug_assert_eq!(f.state, FrameState::Submitted, "info for a frame not yet submitted");
        debug_assert_eq!(
            f.desired_present_time_ns, timing.desired_present_time_ns,
            "info disagrees on the desired present time"
        );
        f.when_infoed_ns = when_ns;
        f.actual_present_time_ns = timing.actual_present_time_ns;
        f.earliest_present_time_ns = timing.earliest_present_time_ns;
        f.present_margin_ns = timing.present_margin_ns;
        f.state = FrameState::Info;
        let since_last_frame_ns =
            last.map_or(0, |(_, desired)| f.desired_present_time_ns.saturating_sub(desired));

        self.adjust_comp_time(frame_id.0);

        let f = *self.frame(frame_id.0);
        self.tracer.log(
            Level::TRACE,
            format_args!(
                "got {frame_id:?}: since last {:.2}ms, desired {}, actual {}, earliest {}, margin {:.2}ms",
                ns_to_ms(since_last_frame_ns as i64),
                f.desired_present_time_ns,
                f.actual_present_time_ns,
                f.earliest_present_time_ns,
                ns_to_ms(f.present_margin_ns as i64),
            ),
        );
        self.tracer.frame_timing(&f.timing_event());
    }

    fn update_vblank_from_display_control(&mut self, _last_vblank_ns: u64) {
        // Feedback comes from presentation timing; vblanks are not needed.
    }

    fn update_present_offset(&mut self, _frame_id: FrameId, present_to_display_offset_ns: u64) {
        self.present_to_display_offset_ns = present_to_display_offset_ns;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pacing::sim::{FrameDelays, SimulatedDisplay, assert_consistent, run_frame};
    use crate::time::{Clock, ManualClock, NS_PER_US};
    use crate::trace::tests::capture;

    const PERIOD: u64 = 16 * NS_PER_MS;

    fn pacing() -> DisplayTimingPacing {
        DisplayTimingPacing::new(PERIOD, &DisplayTimingConfig::default(), Tracer::none())
    }

    /// Runs the first frame by hand, then `loops` more through the simulated
    /// display. Returns the first and the final prediction.
    fn simulate(delays: &FrameDelays, loops: usize) -> (FramePrediction, FramePrediction) {
        let mut pc = pacing();
        let clock = ManualClock::new(0);
        let mut display = SimulatedDisplay::new(PERIOD);
        clock.advance(NS_PER_MS);

        let first = pc.predict(clock.now_ns());
        assert_consistent(clock.now_ns(), &first, PERIOD);

        // The first frame wakes right away rather than at its wake-up time.
        clock.advance(delays.wake_ns);
        pc.mark_point(TimingPoint::WakeUp, first.frame_id, clock.now_ns());
        clock.advance(delays.begin_ns);
        pc.mark_point(TimingPoint::Begin, first.frame_id, clock.now_ns());
        clock.advance(delays.submit_ns);
        pc.mark_point(TimingPoint::Submit, first.frame_id, clock.now_ns());
        clock.advance(delays.gpu_ns);
        display.present(first.frame_id, first.desired_present_time_ns, clock.now_ns());

        for i in 0..loops {
            let p = pc.predict(clock.now_ns());
            assert!(p.frame_id.0 > i as i64, "frame id {:?} after {i} loops", p.frame_id);
            assert_consistent(clock.now_ns(), &p, PERIOD);
            run_frame(&mut pc, &mut display, &clock, &p, delays);
        }

        let last = pc.predict(clock.now_ns());
        assert_consistent(clock.now_ns(), &last, PERIOD);
        (first, last)
    }

    #[test]
    fn faster_than_expected_shrinks_the_budget() {
        let delays = FrameDelays::SHORT;
        let (first, last) = simulate(&delays, 20);
        let first_budget = first.desired_present_time_ns - first.wake_up_time_ns;
        let last_budget = last.desired_present_time_ns - last.wake_up_time_ns;
        assert!(last_budget < first_budget, "{last_budget} < {first_budget}");
        assert!(
            last_budget > delays.submit_ns + delays.gpu_ns,
            "{last_budget} still covers the work"
        );
    }

    #[test]
    fn slower_than_desired_grows_the_budget() {
        let delays = FrameDelays::LONG;
        let (_, last) = simulate(&delays, 50);
        let budget = last.desired_present_time_ns - last.wake_up_time_ns;
        assert!(
            budget > delays.begin_ns + delays.submit_ns + delays.gpu_ns,
            "{budget} covers begin, submit and gpu"
        );
    }

    #[test]
    fn clean_slate_predicts_ten_periods_out() {
        let mut pc = pacing();
        let p = pc.predict(NS_PER_MS);
        assert_eq!(p.frame_id, FrameId(0), "first id");
        assert_eq!(p.desired_present_time_ns, NS_PER_MS + 10 * PERIOD, "desired");
        assert_eq!(
            p.wake_up_time_ns,
            p.desired_present_time_ns - 1_600_000 - NS_PER_MS,
            "wake is comp time plus margin early"
        );
        assert_eq!(p.predicted_display_time_ns, p.desired_present_time_ns + 4 * NS_PER_MS, "display");
    }

    #[test]
    fn without_feedback_predictions_follow_the_last_display_time() {
        let mut pc = pacing();
        let first = pc.predict(0);
        let second = pc.predict(0);
        assert_eq!(
            second.desired_present_time_ns,
            first.predicted_display_time_ns + PERIOD,
            "walks from the previous predicted display time"
        );
    }

    #[test]
    fn missed_frame_grows_comp_time_up_to_the_cap() {
        let mut pc = pacing();
        let start = pc.comp_time_ns();
        for _ in 0..10 {
            let p = pc.predict(0);
            for point in [TimingPoint::WakeUp, TimingPoint::Begin, TimingPoint::Submit] {
                pc.mark_point(point, p.frame_id, p.wake_up_time_ns);
            }
            let late = p.desired_present_time_ns + PERIOD;
            pc.info(
                &PresentationTiming {
                    frame_id: p.frame_id,
                    desired_present_time_ns: p.desired_present_time_ns,
                    actual_present_time_ns: late,
                    earliest_present_time_ns: late,
                    present_margin_ns: 0,
                },
                late,
            );
        }
        assert!(pc.comp_time_ns() > start, "grew");
        assert_eq!(pc.comp_time_ns(), pc.comp_time_max_ns(), "capped at 30%");
    }

    #[test]
    fn large_margin_shrinks_small_margin_grows() {
        let mut pc = pacing();
        let start = pc.comp_time_ns();
        let feed = |pc: &mut DisplayTimingPacing, margin_ns: u64| {
            let p = pc.predict(0);
            for point in [TimingPoint::WakeUp, TimingPoint::Begin, TimingPoint::Submit] {
                pc.mark_point(point, p.frame_id, 0);
            }
            pc.info(
                &PresentationTiming {
                    frame_id: p.frame_id,
                    desired_present_time_ns: p.desired_present_time_ns,
                    actual_present_time_ns: p.desired_present_time_ns,
                    earliest_present_time_ns: p.desired_present_time_ns,
                    present_margin_ns: margin_ns,
                },
                p.desired_present_time_ns,
            );
        };

        feed(&mut pc, 5 * NS_PER_MS);
        assert_eq!(pc.comp_time_ns(), start - 320_000, "approach the present");
        feed(&mut pc, NS_PER_MS + 100 * NS_PER_US);
        assert_eq!(pc.comp_time_ns(), start - 320_000, "within tolerance, unchanged");
        feed(&mut pc, 0);
        assert_eq!(pc.comp_time_ns(), start, "back off");
    }

    #[test]
    fn expired_ids_are_discarded_with_a_warning() {
        let (tracer, sink) = capture();
        let mut pc = DisplayTimingPacing::new(PERIOD, &DisplayTimingConfig::default(), tracer);
        let first = pc.predict(0);
        for _ in 0..NUM_FRAMES {
            pc.predict(0);
        }
        pc.mark_point(TimingPoint::WakeUp, first.frame_id, 10);
        pc.info(
            &PresentationTiming {
                frame_id: first.frame_id,
                ..PresentationTiming::default()
            },
            10,
        );
        let warnings = sink.logged_at(Level::WARN);
        assert!(
            warnings.iter().any(|w| w.contains("discarded point marking")),
            "mark discarded: {warnings:?}"
        );
        assert!(
            warnings.iter().any(|w| w.contains("discarded info")),
            "info discarded: {warnings:?}"
        );
        assert!(sink.timings.lock().is_empty(), "no timing event");
    }

    #[test]
    fn info_emits_the_full_record() {
        let (tracer, sink) = capture();
        let mut pc = DisplayTimingPacing::new(PERIOD, &DisplayTimingConfig::default(), tracer);
        let p = pc.predict(100);
        pc.mark_point(TimingPoint::WakeUp, p.frame_id, p.wake_up_time_ns + 10);
        pc.mark_point(TimingPoint::Begin, p.frame_id, p.wake_up_time_ns + 20);
        pc.mark_point(TimingPoint::Submit, p.frame_id, p.wake_up_time_ns + 30);
        pc.info(
            &PresentationTiming {
                frame_id: p.frame_id,
                desired_present_time_ns: p.desired_present_time_ns,
                actual_present_time_ns: p.desired_present_time_ns,
                earliest_present_time_ns: p.desired_present_time_ns,
                present_margin_ns: NS_PER_MS,
            },
            p.desired_present_time_ns + NS_PER_MS,
        );

        let timings = sink.timings.lock().clone();
        assert_eq!(timings.len(), 1, "one record");
        let t = timings[0];
        assert_eq!(t.frame_id, p.frame_id, "frame");
        assert_eq!(t.when_predict_ns, 100, "predict time");
        assert_eq!(t.when_woke_ns, p.wake_up_time_ns + 10, "woke");
        assert_eq!(t.when_submitted_ns, p.wake_up_time_ns + 30, "submitted");
        assert_eq!(t.current_comp_time_ns, 1_600_000, "budget at prediction");
        assert_eq!(t.present_margin_ns, NS_PER_MS, "margin");
    }

    #[test]
    fn present_offset_moves_display_time() {
        let mut pc = pacing();
        pc.update_present_offset(FrameId(0), 9 * NS_PER_MS);
        pc.update_vblank_from_display_control(12_345);
        let p = pc.predict(0);
        assert_eq!(
            p.predicted_display_time_ns - p.desired_present_time_ns,
            9 * NS_PER_MS,
            "offset"
        );
    }
}
