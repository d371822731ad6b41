// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Application-side frame pacing.
//!
//! Where the compositor models decide when the compositor wakes up, the
//! [`AppPacing`] model answers the application's wait for its next frame. It
//! learns how long the application spends on the CPU, drawing, and waiting
//! for its GPU, and hands out a display time far enough ahead for all of it
//! plus the compositor's own share.
//!
//! Frames live in a ring of [`APP_FRAME_COUNT`] slots indexed by frame id:
//!
//! ```text
//!   Ready ──► Predicted ──► WaitLeft ──► Begun ──► Delivered ──► GpuDone
//!            (predict)      (WakeUp)    (Begin)   (delivered)   (gpu_done)
//!     ▲                         │          │           │            │
//!     └──────── discarded ──────┴──────────┘           └─ retired ──┘
//! ```

use crate::time::{NS_PER_MS, ns_to_ms};
use crate::trace::{AppFrameEvent, Level, Tracer};

use super::model::{FrameId, TimingPoint};

/// Number of application frames that can be in flight.
pub const APP_FRAME_COUNT: usize = 8;

/// Weight given to the old value when folding in a new sample.
const IIR_ALPHA: f64 = 0.8;

/// Period used if no compositor timing arrived before the first prediction.
const FALLBACK_PERIOD_NS: u64 = 16 * NS_PER_MS;

/// Starting estimates for [`AppPacing`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppPacingConfig {
    /// Time between leaving the wait and beginning the frame.
    pub cpu_time_ns: u64,
    /// Time between beginning the frame and delivering it.
    pub draw_time_ns: u64,
    /// Time between delivery and the GPU finishing.
    pub wait_time_ns: u64,
    /// Slack kept between the application's GPU work and the compositor.
    pub margin_ns: u64,
}

impl AppPacingConfig {
    /// 2ms each for CPU, draw and margin; no GPU wait.
    pub const DEFAULT: Self = Self {
        cpu_time_ns: 2 * NS_PER_MS,
        draw_time_ns: 2 * NS_PER_MS,
        wait_time_ns: 0,
        margin_ns: 2 * NS_PER_MS,
    };
}

impl Default for AppPacingConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// What the application is told when it waits for a frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppPrediction {
    /// The new application frame.
    pub frame_id: FrameId,
    /// When the application should leave its wait.
    pub wake_up_time_ns: u64,
    /// When the frame is expected to be displayed.
    pub predicted_display_time_ns: u64,
    /// The period the application is paced at, a multiple of the display's.
    pub predicted_display_period_ns: u64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum AppFrameState {
    #[default]
    Ready,
    Predicted,
    WaitLeft,
    Begun,
    Delivered,
    GpuDone,
}

#[derive(Clone, Copy, Debug, Default)]
struct AppFrame {
    frame_id: Option<FrameId>,
    state: AppFrameState,
    predicted_display_time_ns: u64,
    predicted_display_period_ns: u64,
    predicted_gpu_done_time_ns: u64,
    display_time_ns: u64,
    when_predicted_ns: u64,
    when_woke_ns: u64,
    when_began_ns: u64,
    when_delivered_ns: u64,
    when_gpu_done_ns: u64,
    when_latched_ns: u64,
    latched_by: Option<FrameId>,
}

impl AppFrame {
    fn event(&self, frame_id: FrameId) -> AppFrameEvent {
        AppFrameEvent {
            frame_id,
            when_predicted_ns: self.when_predicted_ns,
            when_woke_ns: self.when_woke_ns,
            when_began_ns: self.when_began_ns,
            when_delivered_ns: self.when_delivered_ns,
            when_gpu_done_ns: self.when_gpu_done_ns,
            predicted_gpu_done_time_ns: self.predicted_gpu_done_time_ns,
            predicted_display_time_ns: self.predicted_display_time_ns,
            display_time_ns: self.display_time_ns,
            predicted_display_period_ns: self.predicted_display_period_ns,
        }
    }
}

/// The latest compositor timing, as passed to [`AppPacing::info`].
#[derive(Clone, Copy, Debug, Default)]
struct CompositorInput {
    predicted_display_time_ns: u64,
    predicted_display_period_ns: u64,
    extra_ns: u64,
}

/// Paces one application against the compositor's display timing.
///
/// Feed it the compositor's predictions through [`info`](Self::info), then
/// per application frame call [`predict`](Self::predict), mark the wake-up
/// and begin points, and report delivery, GPU completion and retirement.
/// Completed frames update running estimates of the application's CPU, draw
/// and GPU-wait times.
///
/// Calls naming a frame that is not in the ring are logged and ignored.
/// Calls out of order for a frame are caught by debug assertions.
#[derive(Debug)]
pub struct AppPacing {
    frames: [AppFrame; APP_FRAME_COUNT],
    frame_counter: i64,
    cpu_time_ns: u64,
    draw_time_ns: u64,
    wait_time_ns: u64,
    margin_ns: u64,
    last_input: CompositorInput,
    last_returned_ns: u64,
    tracer: Tracer,
}

impl AppPacing {
    /// Creates a pacer with no compositor timing yet.
    #[must_use]
    pub fn new(config: &AppPacingConfig, tracer: Tracer) -> Self {
        Self {
            frames: [AppFrame::default(); APP_FRAME_COUNT],
            frame_counter: 0,
            cpu_time_ns: config.cpu_time_ns,
            draw_time_ns: config.draw_time_ns,
            wait_time_ns: config.wait_time_ns,
            margin_ns: config.margin_ns,
            last_input: CompositorInput::default(),
            last_returned_ns: 0,
            tracer,
        }
    }

    /// Estimated time between leaving the wait and beginning a frame.
    #[must_use]
    pub fn cpu_time_ns(&self) -> u64 {
        self.cpu_time_ns
    }

    /// Estimated time between beginning and delivering a frame.
    #[must_use]
    pub fn draw_time_ns(&self) -> u64 {
        self.draw_time_ns
    }

    /// Estimated time between delivery and the GPU finishing.
    #[must_use]
    pub fn wait_time_ns(&self) -> u64 {
        self.wait_time_ns
    }

    fn total_app_time_ns(&self) -> u64 {
        self.cpu_time_ns + self.draw_time_ns + self.wait_time_ns
    }

    fn total_compositor_time_ns(&self) -> u64 {
        self.margin_ns + self.last_input.extra_ns
    }

    fn total_time_ns(&self) -> u64 {
        self.total_app_time_ns() + self.total_compositor_time_ns()
    }

    #[expect(
        clippy::cast_possible_truncation,
        reason = "the remainder is below APP_FRAME_COUNT"
    )]
    fn slot(frame_id: FrameId) -> usize {
        frame_id.0.rem_euclid(APP_FRAME_COUNT as i64) as usize
    }

    /// The smallest multiple of the display period that fits each of the
    /// application's phases on its own.
    fn calc_period(&self) -> u64 {
        let mut base_ns = self.last_input.predicted_display_period_ns;
        if base_ns == 0 {
            self.tracer.log(
                Level::WARN,
                format_args!("predicting before any compositor timing, assuming a 16ms period"),
            );
            base_ns = FALLBACK_PERIOD_NS;
        }

        let mut period_ns = base_ns;
        for phase_ns in [self.cpu_time_ns, self.draw_time_ns, self.wait_time_ns] {
            while phase_ns > period_ns {
                period_ns += base_ns;
            }
        }
        period_ns
    }

    fn predict_display_time(&self, now_ns: u64, period_ns: u64) -> u64 {
        let total_ns = self.total_time_ns();
        let mut display_ns = self.last_input.predicted_display_time_ns;

        // Strictly after the last returned time; half a period of slack for
        // a compositor prediction that drifted slightly.
        while display_ns <= self.last_returned_ns + period_ns / 2 {
            display_ns += period_ns;
        }

        // Leave room for the application and the compositor.
        while display_ns.saturating_sub(total_ns) <= now_ns {
            display_ns += period_ns;
        }

        display_ns
    }

    /// Takes the compositor's latest prediction: when its next frame is
    /// displayed, its display period, and how much time it needs itself.
    pub fn info(
        &mut self,
        predicted_display_time_ns: u64,
        predicted_display_period_ns: u64,
        extra_ns: u64,
    ) {
        self.last_input = CompositorInput {
            predicted_display_time_ns,
            predicted_display_period_ns,
            extra_ns,
        };
    }

    /// Predicts the application's next frame as seen from `now_ns`, issuing
    /// a new frame id.
    pub fn predict(&mut self, now_ns: u64) -> AppPrediction {
        self.frame_counter += 1;
        let frame_id = FrameId(self.frame_counter);

        let period_ns = self.calc_period();
        let predicted_display_time_ns = self.predict_display_time(now_ns, period_ns);
        let wake_up_time_ns = predicted_display_time_ns.saturating_sub(self.total_time_ns());
        let predicted_gpu_done_time_ns =
            predicted_display_time_ns.saturating_sub(self.total_compositor_time_ns());
        self.last_returned_ns = predicted_display_time_ns;

        let slot = Self::slot(frame_id);
        if let Some(stale) = self.frames[slot].frame_id {
            self.tracer.log(
                Level::WARN,
                format_args!("app frame {stale:?} never retired, reusing its slot for {frame_id:?}"),
            );
        }
        self.frames[slot] = AppFrame {
            frame_id: Some(frame_id),
            state: AppFrameState::Predicted,
            predicted_display_time_ns,
            predicted_display_period_ns: period_ns,
            predicted_gpu_done_time_ns,
            when_predicted_ns: now_ns,
            ..AppFrame::default()
        };

        self.tracer.log(
            Level::TRACE,
            format_args!(
                "app {frame_id:?}: wake {wake_up_time_ns}, display {predicted_display_time_ns}, period {:.2}ms",
                ns_to_ms(period_ns as i64)
            ),
        );

        AppPrediction {
            frame_id,
            wake_up_time_ns,
            predicted_display_time_ns,
            predicted_display_period_ns: period_ns,
        }
    }

    fn frame_mut(&mut self, frame_id: FrameId, what: &str) -> Option<&mut AppFrame> {
        let slot = Self::slot(frame_id);
        if self.frames[slot].frame_id != Some(frame_id) {
            self.tracer.log(
                Level::WARN,
                format_args!("discarded {what} for unknown or retired app frame {frame_id:?}"),
            );
            return None;
        }
        Some(&mut self.frames[slot])
    }

    /// Records that the application left its wait or began `frame_id`.
    ///
    /// Submission is reported through [`mark_delivered`](Self::mark_delivered)
    /// instead; a [`TimingPoint::Submit`] mark is logged and ignored.
    pub fn mark_point(&mut self, point: TimingPoint, frame_id: FrameId, when_ns: u64) {
        if point == TimingPoint::Submit {
            self.tracer.log(
                Level::WARN,
                format_args!("submit marked for app frame {frame_id:?}, use mark_delivered"),
            );
            return;
        }
        let Some(f) = self.frame_mut(frame_id, "point marking") else {
            return;
        };
        match point {
            TimingPoint::WakeUp => {
                debug_assert_eq!(f.state, AppFrameState::Predicted, "wake-up out of order");
                f.when_woke_ns = when_ns;
                f.state = AppFrameState::WaitLeft;
            }
            TimingPoint::Begin => {
                debug_assert_eq!(f.state, AppFrameState::WaitLeft, "begin out of order");
                f.when_began_ns = when_ns;
                f.state = AppFrameState::Begun;
            }
            TimingPoint::Submit => {}
        }
    }

    /// The application dropped `frame_id` after waking for it. Frees its slot.
    pub fn mark_discarded(&mut self, frame_id: FrameId, when_ns: u64) {
        let Some(f) = self.frame_mut(frame_id, "discard") else {
            return;
        };
        debug_assert!(
            matches!(f.state, AppFrameState::WaitLeft | AppFrameState::Begun),
            "discarding a frame in state {:?}",
            f.state
        );
        *f = AppFrame::default();
        self.tracer.log(
            Level::TRACE,
            format_args!("app {frame_id:?} discarded at {when_ns}"),
        );
    }

    /// The application delivered `frame_id`, asking for it to be shown at
    /// `display_time_ns`. Its GPU work may still be running.
    pub fn mark_delivered(&mut self, frame_id: FrameId, when_ns: u64, display_time_ns: u64) {
        let Some(f) = self.frame_mut(frame_id, "delivery") else {
            return;
        };
        debug_assert_eq!(f.state, AppFrameState::Begun, "delivered before begun");
        f.when_delivered_ns = when_ns;
        f.display_time_ns = display_time_ns;
        f.state = AppFrameState::Delivered;
    }

    /// The application's GPU work for `frame_id` finished at `when_ns`.
    ///
    /// Folds the frame's CPU, draw and GPU-wait times into the estimates.
    pub fn mark_gpu_done(&mut self, frame_id: FrameId, when_ns: u64) {
        let Some(f) = self.frame_mut(frame_id, "gpu completion") else {
            return;
        };
        debug_assert_eq!(f.state, AppFrameState::Delivered, "gpu done before delivery");
        f.when_gpu_done_ns = when_ns;
        f.state = AppFrameState::GpuDone;
        let f = *f;

        let cpu_ns = f.when_began_ns.saturating_sub(f.when_woke_ns);
        let draw_ns = f.when_delivered_ns.saturating_sub(f.when_began_ns);
        let wait_ns = f.when_gpu_done_ns.saturating_sub(f.when_delivered_ns);

        let late = when_ns > f.predicted_gpu_done_time_ns;
        self.tracer.log(
            Level::DEBUG,
            format_args!(
                "app frame {frame_id:?} gpu done {:.2}ms {}, period {:.2}ms, \
                 cpu {:.2} -> {:.2}, draw {:.2} -> {:.2}, wait {:.2} -> {:.2}",
                ns_to_ms(when_ns.abs_diff(f.predicted_gpu_done_time_ns) as i64),
                if late { "late" } else { "early" },
                ns_to_ms(f.predicted_display_period_ns as i64),
                ns_to_ms(self.cpu_time_ns as i64),
                ns_to_ms(cpu_ns as i64),
                ns_to_ms(self.draw_time_ns as i64),
                ns_to_ms(draw_ns as i64),
                ns_to_ms(self.wait_time_ns as i64),
                ns_to_ms(wait_ns as i64),
            ),
        );

        self.cpu_time_ns = iir_filter(self.cpu_time_ns, cpu_ns);
        self.draw_time_ns = iir_filter(self.draw_time_ns, draw_ns);
        self.wait_time_ns = iir_filter(self.wait_time_ns, wait_ns);

        self.tracer.app_frame(&f.event(frame_id));
    }

    /// The compositor picked `frame_id` up for its own frame
    /// `compositor_frame_id` at `when_ns`.
    pub fn latched(&mut self, frame_id: FrameId, when_ns: u64, compositor_frame_id: FrameId) {
        let Some(f) = self.frame_mut(frame_id, "latch") else {
            return;
        };
        debug_assert!(
            matches!(f.state, AppFrameState::Delivered | AppFrameState::GpuDone),
            "latching a frame in state {:?}",
            f.state
        );
        f.when_latched_ns = when_ns;
        f.latched_by = Some(compositor_frame_id);
        self.tracer.log(
            Level::TRACE,
            format_args!("app {frame_id:?} latched by {compositor_frame_id:?} at {when_ns}"),
        );
    }

    /// The compositor is done with `frame_id`. Frees its slot.
    pub fn retired(&mut self, frame_id: FrameId, when_ns: u64) {
        let Some(f) = self.frame_mut(frame_id, "retirement") else {
            return;
        };
        debug_assert!(
            matches!(f.state, AppFrameState::Delivered | AppFrameState::GpuDone),
            "retiring a frame in state {:?}",
            f.state
        );
        let latched_by = f.latched_by;
        let latched_ns = f.when_latched_ns;
        *f = AppFrame::default();
        self.tracer.log(
            Level::TRACE,
            format_args!(
                "app {frame_id:?} retired at {when_ns}, latched by {latched_by:?} at {latched_ns}"
            ),
        );
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "a blend of two u64 durations stays in range"
)]
fn iir_filter(current_ns: u64, sample_ns: u64) -> u64 {
    (current_ns as f64 * IIR_ALPHA + sample_ns as f64 * (1.0 - IIR_ALPHA)) as u64
}
