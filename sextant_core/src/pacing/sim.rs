// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A simulated display for driving pacing models without hardware.
//!
//! [`SimulatedDisplay`] scans out on a fixed grid and reports presentation
//! feedback one millisecond after each scanout, the way a compositor would
//! hear back from a real display system. [`run_frame`] walks one frame
//! through its timing points on a [`ManualClock`].

use core::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::time::{Clock, ManualClock, NS_PER_MS, NS_PER_US, is_within_of_each_other};

use super::model::{CompositorPacing, FrameId, FramePrediction, PresentationTiming, TimingPoint};
use super::target::PresentTimingSource;

/// How long each step of a simulated frame takes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameDelays {
    /// Oversleep past the predicted wake-up time.
    pub wake_ns: u64,
    /// From waking to beginning GPU work.
    pub begin_ns: u64,
    /// From beginning to submitting.
    pub submit_ns: u64,
    /// GPU execution after submit.
    pub gpu_ns: u64,
}

impl FrameDelays {
    /// A compositor with plenty of headroom.
    pub const SHORT: Self = Self {
        wake_ns: 20 * NS_PER_US,
        begin_ns: 20 * NS_PER_US,
        submit_ns: 200 * NS_PER_US,
        gpu_ns: NS_PER_MS,
    };

    /// A compositor needing more than its initial budget.
    pub const LONG: Self = Self {
        wake_ns: 20 * NS_PER_US,
        begin_ns: NS_PER_MS,
        submit_ns: 2 * NS_PER_MS,
        gpu_ns: 2 * NS_PER_MS,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PendingInfo {
    deliver_at_ns: u64,
    timing: PresentationTiming,
}

impl Ord for PendingInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.deliver_at_ns
            .cmp(&other.deliver_at_ns)
            .then(self.timing.frame_id.cmp(&other.timing.frame_id))
    }
}

impl PartialOrd for PendingInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A display scanning out every `frame_period_ns`, phase-locked to the
/// first desired present time it sees.
#[derive(Debug)]
pub struct SimulatedDisplay {
    frame_period_ns: u64,
    pending: BinaryHeap<Reverse<PendingInfo>>,
    last_vblank_ns: Option<u64>,
}

impl SimulatedDisplay {
    /// Creates a display with no frames in flight.
    #[must_use]
    pub fn new(frame_period_ns: u64) -> Self {
        Self {
            frame_period_ns,
            pending: BinaryHeap::new(),
            last_vblank_ns: None,
        }
    }

    /// The scanout period.
    #[must_use]
    pub fn frame_period_ns(&self) -> u64 {
        self.frame_period_ns
    }

    /// First scanout at or after `timestamp_ns`, stepping forward from
    /// `known_present_ns`.
    #[must_use]
    pub fn next_present_after_known(&self, timestamp_ns: u64, known_present_ns: u64) -> u64 {
        let mut present_ns = known_present_ns;
        while present_ns < timestamp_ns {
            present_ns += self.frame_period_ns;
        }
        present_ns
    }

    /// Steps `known_present_ns` back until it lies before `timestamp_ns`.
    #[must_use]
    pub fn present_before(&self, timestamp_ns: u64, known_present_ns: u64) -> u64 {
        let mut present_ns = known_present_ns;
        while present_ns >= timestamp_ns && present_ns > self.frame_period_ns {
            present_ns -= self.frame_period_ns;
        }
        present_ns
    }

    /// First scanout at or after `timestamp_ns` on the grid through
    /// `known_present_ns`, whichever side of it the timestamp is on.
    #[must_use]
    pub fn next_present_after(&self, timestamp_ns: u64, known_present_ns: u64) -> u64 {
        let before = self.present_before(timestamp_ns, known_present_ns);
        self.next_present_after_known(timestamp_ns, before)
    }

    /// Presents a frame whose GPU work finished at `gpu_finish_ns`, queueing
    /// its feedback. Returns when scanout starts.
    pub fn present(
        &mut self,
        frame_id: FrameId,
        desired_present_time_ns: u64,
        gpu_finish_ns: u64,
    ) -> u64 {
        let actual_present_time_ns =
            self.next_present_after_known(gpu_finish_ns, desired_present_time_ns);
        let earliest_present_time_ns = self.next_present_after(gpu_finish_ns, desired_present_time_ns);
        self.pending.push(Reverse(PendingInfo {
            deliver_at_ns: actual_present_time_ns + NS_PER_MS,
            timing: PresentationTiming {
                frame_id,
                desired_present_time_ns,
                actual_present_time_ns,
                earliest_present_time_ns,
                present_margin_ns: earliest_present_time_ns - gpu_finish_ns,
            },
        }));
        self.last_vblank_ns = Some(actual_present_time_ns);
        actual_present_time_ns
    }

    /// Feedback due by `now_ns`, oldest first, each with its delivery time.
    pub fn take_ready(&mut self, now_ns: u64) -> Vec<(PresentationTiming, u64)> {
        let mut ready = Vec::new();
        while let Some(Reverse(next)) = self.pending.peek() {
            if next.deliver_at_ns > now_ns {
                break;
            }
            ready.push((next.timing, next.deliver_at_ns));
            self.pending.pop();
        }
        ready
    }

    /// All outstanding feedback, oldest first.
    pub fn drain(&mut self) -> Vec<(PresentationTiming, u64)> {
        self.take_ready(u64::MAX)
    }

    /// Number of frames whose feedback has not been taken.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// The latest scanout, once.
    pub fn take_last_vblank_ns(&mut self) -> Option<u64> {
        self.last_vblank_ns.take()
    }
}

/// Feeds feedback due by `now_ns` into `pacing`.
pub fn deliver_ready(pacing: &mut dyn CompositorPacing, display: &mut SimulatedDisplay, now_ns: u64) {
    for (timing, when_ns) in display.take_ready(now_ns) {
        pacing.info(&timing, when_ns);
    }
}

/// Runs one predicted frame: wakes, begins, submits and presents, delivering
/// any feedback that falls due on the way. Returns the scanout time.
pub fn run_frame(
    pacing: &mut dyn CompositorPacing,
    display: &mut SimulatedDisplay,
    clock: &ManualClock,
    prediction: &FramePrediction,
    delays: &FrameDelays,
) -> u64 {
    let frame_id = prediction.frame_id;

    clock.advance_to(prediction.wake_up_time_ns);
    clock.advance(delays.wake_ns);
    deliver_ready(pacing, display, clock.now_ns());
    pacing.mark_point(TimingPoint::WakeUp, frame_id, clock.now_ns());

    clock.advance(delays.begin_ns);
    deliver_ready(pacing, display, clock.now_ns());
    pacing.mark_point(TimingPoint::Begin, frame_id, clock.now_ns());

    clock.advance(delays.submit_ns);
    deliver_ready(pacing, display, clock.now_ns());
    pacing.mark_point(TimingPoint::Submit, frame_id, clock.now_ns());

    clock.advance(delays.gpu_ns);
    display.present(frame_id, prediction.desired_present_time_ns, clock.now_ns())
}

/// Checks that a prediction made at `now_ns` is self-consistent and its
/// period is within 2ms of `expected_period_ns`.
///
/// # Panics
///
/// Panics on the first property that does not hold.
pub fn assert_consistent(now_ns: u64, p: &FramePrediction, expected_period_ns: u64) {
    assert!(p.wake_up_time_ns >= now_ns, "wake-up {} before now {now_ns}", p.wake_up_time_ns);
    assert!(
        p.desired_present_time_ns > now_ns,
        "present {} not after now {now_ns}",
        p.desired_present_time_ns
    );
    assert!(
        p.desired_present_time_ns > p.wake_up_time_ns,
        "present {} not after wake-up {}",
        p.desired_present_time_ns,
        p.wake_up_time_ns
    );
    assert!(
        p.predicted_display_time_ns > now_ns,
        "display {} not after now {now_ns}",
        p.predicted_display_time_ns
    );
    assert!(
        p.predicted_display_time_ns > p.desired_present_time_ns,
        "display {} not after present {}",
        p.predicted_display_time_ns,
        p.desired_present_time_ns
    );
    assert!(
        is_within_of_each_other(p.predicted_display_period_ns, expected_period_ns, 2 * NS_PER_MS),
        "period {} too far from {expected_period_ns}",
        p.predicted_display_period_ns
    );
}

/// A [`PresentTimingSource`] backed by a shared [`SimulatedDisplay`].
#[derive(Debug)]
pub struct SimulatedTimingSource {
    display: Arc<Mutex<SimulatedDisplay>>,
    clock: Arc<ManualClock>,
}

impl SimulatedTimingSource {
    /// Reports feedback from `display` that is due according to `clock`.
    #[must_use]
    pub fn new(display: Arc<Mutex<SimulatedDisplay>>, clock: Arc<ManualClock>) -> Self {
        Self { display, clock }
    }
}

impl PresentTimingSource for SimulatedTimingSource {
    fn supports_display_timing(&self) -> bool {
        true
    }

    fn poll_past_presentation_timings(&mut self) -> Vec<PresentationTiming> {
        let now_ns = self.clock.now_ns();
        self.display
            .lock()
            .take_ready(now_ns)
            .into_iter()
            .map(|(timing, _)| timing)
            .collect()
    }

    fn take_last_vblank_ns(&mut self) -> Option<u64> {
        self.display.lock().take_last_vblank_ns()
    }
}
