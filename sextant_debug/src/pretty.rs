// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr). Timestamps
//! are printed in milliseconds.

use std::fmt;
use std::io::Write;

use parking_lot::Mutex;

use sextant_core::time::ns_to_ms;
use sextant_core::trace::{
    AppFrameEvent, FramePredictedEvent, FrameTimingEvent, Level, SpaceEvent, SwapchainEvent,
    TimingPointEvent, TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write + Send = Box<dyn Write + Send>> {
    writer: Mutex<W>,
    with_logs: bool,
}

impl<W: Write + Send> fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrettyPrintSink")
            .field("with_logs", &self.with_logs)
            .finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes events to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::with_writer(Box::new(std::io::stderr()))
    }
}

impl<W: Write + Send> PrettyPrintSink<W> {
    /// Creates a sink that writes events to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
            with_logs: false,
        }
    }

    /// Also echo log lines. They already reach `tracing`, so this is off by
    /// default.
    #[must_use]
    pub fn with_logs(mut self, with_logs: bool) -> Self {
        self.with_logs = with_logs;
        self
    }

    /// Consumes the sink and returns its writer.
    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }

    fn line(&self, args: fmt::Arguments<'_>) {
        let _ = writeln!(self.writer.lock(), "{args}");
    }
}

fn ms(ns: u64) -> f64 {
    ns_to_ms(ns as i64)
}

impl<W: Write + Send> TraceSink for PrettyPrintSink<W> {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if self.with_logs {
            self.line(format_args!("[{level}] {args}"));
        }
    }

    fn on_space(&self, e: &SpaceEvent) {
        match e {
            SpaceEvent::Created { space, ty, parent } => {
                self.line(format_args!("[space:create] {space:?} {ty:?} parent={parent:?}"));
            }
            SpaceEvent::Linked {
                device,
                space,
                replaced,
            } => {
                self.line(format_args!(
                    "[space:link] {device:?} -> {space:?} replaced={replaced:?}"
                ));
            }
            SpaceEvent::Destroyed { space } => {
                self.line(format_args!("[space:destroy] {space:?}"));
            }
        }
    }

    fn on_swapchain(&self, e: &SwapchainEvent) {
        match e {
            SwapchainEvent::Created {
                swapchain,
                image_count,
                imported,
            } => {
                let how = if *imported { "imported" } else { "allocated" };
                self.line(format_args!(
                    "[swapchain:create] {swapchain:?} images={image_count} {how}"
                ));
            }
            SwapchainEvent::Acquired { swapchain, index } => {
                self.line(format_args!("[swapchain:acquire] {swapchain:?} index={index}"));
            }
            SwapchainEvent::Released { swapchain, index } => {
                self.line(format_args!("[swapchain:release] {swapchain:?} index={index}"));
            }
            SwapchainEvent::DestroyDeferred { swapchain } => {
                self.line(format_args!("[swapchain:destroy] {swapchain:?} deferred"));
            }
            SwapchainEvent::Collected { swapchain } => {
                self.line(format_args!("[swapchain:collect] {swapchain:?}"));
            }
        }
    }

    fn on_frame_predicted(&self, e: &FramePredictedEvent) {
        self.line(format_args!(
            "[predict] {:?} {:?} at {:.3}ms wake={:.3}ms present={:.3}ms display={:.3}ms",
            e.frame_id,
            e.kind,
            ms(e.when_ns),
            ms(e.wake_up_time_ns),
            ms(e.desired_present_time_ns),
            ms(e.predicted_display_time_ns),
        ));
    }

    fn on_timing_point(&self, e: &TimingPointEvent) {
        self.line(format_args!(
            "[point] {:?} {:?} at {:.3}ms",
            e.frame_id,
            e.point,
            ms(e.when_ns),
        ));
    }

    fn on_frame_timing(&self, e: &FrameTimingEvent) {
        let missed = if e.actual_present_time_ns > e.desired_present_time_ns {
            "MISSED"
        } else {
            "ok"
        };
        self.line(format_args!(
            "[timing] {:?} comp={:.3}ms desired={:.3}ms actual={:.3}ms margin={:.3}ms {missed}",
            e.frame_id,
            ms(e.current_comp_time_ns),
            ms(e.desired_present_time_ns),
            ms(e.actual_present_time_ns),
            ms(e.present_margin_ns),
        ));
    }

    fn on_app_frame(&self, e: &AppFrameEvent) {
        let late = if e.when_gpu_done_ns > e.predicted_gpu_done_time_ns {
            "LATE"
        } else {
            "ok"
        };
        self.line(format_args!(
            "[app] {:?} cpu={:.3}ms draw={:.3}ms wait={:.3}ms display={:.3}ms {late}",
            e.frame_id,
            ms(e.when_began_ns.saturating_sub(e.when_woke_ns)),
            ms(e.when_delivered_ns.saturating_sub(e.when_began_ns)),
            ms(e.when_gpu_done_ns.saturating_sub(e.when_delivered_ns)),
            ms(e.display_time_ns),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sextant_core::pacing::{FrameId, TimingPoint};
    use sextant_core::swapchain::SwapchainId;
    use sextant_core::time::NS_PER_MS;

    fn written(sink: PrettyPrintSink<Vec<u8>>) -> String {
        String::from_utf8(sink.into_writer()).unwrap()
    }

    #[test]
    fn pretty_print_point() {
        let sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_timing_point(&TimingPointEvent {
            frame_id: FrameId(16),
            point: TimingPoint::Submit,
            when_ns: 3 * NS_PER_MS,
        });
        let output = written(sink);
        assert!(output.contains("[point]"), "got: {output}");
        assert!(output.contains("Submit at 3.000ms"), "got: {output}");
    }

    #[test]
    fn missed_frames_stand_out() {
        let sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_frame_timing(&FrameTimingEvent {
            desired_present_time_ns: 16 * NS_PER_MS,
            actual_present_time_ns: 32 * NS_PER_MS,
            ..FrameTimingEvent::default()
        });
        let output = written(sink);
        assert!(output.contains("MISSED"), "got: {output}");
    }

    #[test]
    fn late_app_frames_stand_out() {
        let sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.on_app_frame(&AppFrameEvent {
            frame_id: FrameId(3),
            when_woke_ns: 10 * NS_PER_MS,
            when_began_ns: 11 * NS_PER_MS,
            when_delivered_ns: 15 * NS_PER_MS,
            when_gpu_done_ns: 19 * NS_PER_MS,
            predicted_gpu_done_time_ns: 18 * NS_PER_MS,
            ..AppFrameEvent::default()
        });
        let output = written(sink);
        assert!(output.contains("cpu=1.000ms draw=4.000ms wait=4.000ms"), "got: {output}");
        assert!(output.contains("LATE"), "got: {output}");
    }

    #[test]
    fn logs_are_opt_in() {
        let sink = PrettyPrintSink::with_writer(Vec::<u8>::new());
        sink.log(Level::WARN, format_args!("dropped"));
        sink.on_swapchain(&SwapchainEvent::Collected {
            swapchain: SwapchainId(2),
        });
        let output = written(sink);
        assert!(!output.contains("dropped"), "got: {output}");
        assert!(output.contains("[swapchain:collect] SwapchainId(2)"), "got: {output}");

        let sink = PrettyPrintSink::with_writer(Vec::<u8>::new()).with_logs(true);
        sink.log(Level::WARN, format_args!("dropped"));
        let output = written(sink);
        assert!(output.contains("[WARN] dropped"), "got: {output}");
    }
}
