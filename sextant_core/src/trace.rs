// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Injected diagnostics for spaces, swapchains and frame pacing.
//!
//! Components never reach for a global logger. Each one is handed a
//! [`Tracer`] at construction; the tracer forwards log lines to the `tracing`
//! crate and, when a [`TraceSink`] is attached, also hands the sink every
//! structured event and log line. All sink methods default to no-ops, so
//! implementing only the events you care about is fine.

use core::fmt;
use std::sync::Arc;

pub use tracing::Level;

use crate::device::DeviceId;
use crate::pacing::{FrameId, PacingKind, TimingPoint};
use crate::space::{SpaceId, SpaceType};
use crate::swapchain::SwapchainId;

// ---------------------------------------------------------------------------
// Event types
// ---------------------------------------------------------------------------

/// Something happened to the space graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpaceEvent {
    /// A space was allocated.
    Created {
        /// The new space.
        space: SpaceId,
        /// Its variant.
        ty: SpaceType,
        /// Its parent, `None` only for the root.
        parent: Option<SpaceId>,
    },
    /// A device was (re)associated with a space.
    Linked {
        /// The device.
        device: DeviceId,
        /// The space now associated with it.
        space: SpaceId,
        /// The previous association, released after the link.
        replaced: Option<SpaceId>,
    },
    /// The last reference to a space went away and its slot was freed.
    Destroyed {
        /// The freed space.
        space: SpaceId,
    },
}

/// Something happened to a swapchain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwapchainEvent {
    /// Images were allocated or imported.
    Created {
        /// The new swapchain.
        swapchain: SwapchainId,
        /// Number of images.
        image_count: u32,
        /// Whether the images were imported rather than allocated.
        imported: bool,
    },
    /// An image index left the free FIFO.
    Acquired {
        /// The swapchain.
        swapchain: SwapchainId,
        /// The image index.
        index: u32,
    },
    /// An image index went back into the free FIFO.
    Released {
        /// The swapchain.
        swapchain: SwapchainId,
        /// The image index.
        index: u32,
    },
    /// Destruction was requested; teardown waits for garbage collection.
    DestroyDeferred {
        /// The swapchain.
        swapchain: SwapchainId,
    },
    /// GPU resources were freed after the queue went idle.
    Collected {
        /// The swapchain.
        swapchain: SwapchainId,
    },
}

/// A pacing model produced a prediction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FramePredictedEvent {
    /// Which model produced it.
    pub kind: PacingKind,
    /// The newly issued frame id.
    pub frame_id: FrameId,
    /// When the prediction was made.
    pub when_ns: u64,
    /// When the compositor should wake up.
    pub wake_up_time_ns: u64,
    /// When scanout of the frame should start.
    pub desired_present_time_ns: u64,
    /// When photons are expected.
    pub predicted_display_time_ns: u64,
}

/// A timing point was marked for the in-flight frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimingPointEvent {
    /// The frame.
    pub frame_id: FrameId,
    /// Which point.
    pub point: TimingPoint,
    /// When it happened.
    pub when_ns: u64,
}

/// Full life of one frame, emitted once presentation feedback arrives.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameTimingEvent {
    /// The frame.
    pub frame_id: FrameId,
    /// When the prediction was made.
    pub when_predict_ns: u64,
    /// When the compositor was told to wake up.
    pub wake_up_time_ns: u64,
    /// When it actually woke up.
    pub when_woke_ns: u64,
    /// When CPU work for the GPU began.
    pub when_began_ns: u64,
    /// When the work was submitted to the GPU.
    pub when_submitted_ns: u64,
    /// When the presentation feedback arrived.
    pub when_infoed_ns: u64,
    /// Compositor time budget at prediction time.
    pub current_comp_time_ns: u64,
    /// Desired start of scanout.
    pub desired_present_time_ns: u64,
    /// Predicted photon time.
    pub predicted_display_time_ns: u64,
    /// Actual start of scanout.
    pub actual_present_time_ns: u64,
    /// Earliest scanout the frame could have made.
    pub earliest_present_time_ns: u64,
    /// How long before `earliest_present_time_ns` the GPU finished.
    pub present_margin_ns: u64,
}

/// One application frame, emitted once its GPU work completes.
///
/// The `cpu`, `draw` and `wait` intervals are what the app pacer feeds into
/// its estimates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AppFrameEvent {
    /// The application frame.
    pub frame_id: FrameId,
    /// When the frame was predicted.
    pub when_predicted_ns: u64,
    /// When the application left its wait.
    pub when_woke_ns: u64,
    /// When the application began the frame.
    pub when_began_ns: u64,
    /// When the frame was delivered to the compositor.
    pub when_delivered_ns: u64,
    /// When the application's GPU work finished.
    pub when_gpu_done_ns: u64,
    /// When the GPU work was expected to finish.
    pub predicted_gpu_done_time_ns: u64,
    /// The display time handed out at prediction.
    pub predicted_display_time_ns: u64,
    /// The display time the application asked for on delivery.
    pub display_time_ns: u64,
    /// The display period chosen for the frame.
    pub predicted_display_period_ns: u64,
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives events and log lines.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about. Sinks are shared between threads, so
/// implementations use interior mutability.
pub trait TraceSink: Send + Sync {
    /// Called with every log line routed through a [`Tracer`].
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        _ = (level, args);
    }

    /// Called when the space graph changes.
    fn on_space(&self, e: &SpaceEvent) {
        _ = e;
    }

    /// Called on swapchain lifecycle transitions.
    fn on_swapchain(&self, e: &SwapchainEvent) {
        _ = e;
    }

    /// Called after a pacing prediction.
    fn on_frame_predicted(&self, e: &FramePredictedEvent) {
        _ = e;
    }

    /// Called when a timing point is marked.
    fn on_timing_point(&self, e: &TimingPointEvent) {
        _ = e;
    }

    /// Called once a frame's presentation feedback has been reconciled.
    fn on_frame_timing(&self, e: &FrameTimingEvent) {
        _ = e;
    }

    /// Called when an application frame's GPU work completes.
    fn on_app_frame(&self, e: &AppFrameEvent) {
        _ = e;
    }
}

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer handle
// ---------------------------------------------------------------------------

/// Cheap, clonable handle to an optional [`TraceSink`].
///
/// Log lines always reach `tracing`; events and log lines additionally reach
/// the sink when one is attached.
#[derive(Clone, Default)]
pub struct Tracer {
    sink: Option<Arc<dyn TraceSink>>,
}

impl fmt::Debug for Tracer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tracer")
            .field("has_sink", &self.sink.is_some())
            .finish()
    }
}

impl Tracer {
    /// Creates a tracer that dispatches to the given sink.
    #[must_use]
    pub fn new(sink: Arc<dyn TraceSink>) -> Self {
        Self { sink: Some(sink) }
    }

    /// Creates a tracer that only forwards log lines to `tracing`.
    #[must_use]
    pub const fn none() -> Self {
        Self { sink: None }
    }

    /// Logs a line at `level`.
    pub fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        if level == Level::ERROR {
            tracing::error!("{args}");
        } else if level == Level::WARN {
            tracing::warn!("{args}");
        } else if level == Level::INFO {
            tracing::info!("{args}");
        } else if level == Level::DEBUG {
            tracing::debug!("{args}");
        } else {
            tracing::trace!("{args}");
        }
        if let Some(s) = &self.sink {
            s.log(level, args);
        }
    }

    /// Emits a [`SpaceEvent`].
    #[inline]
    pub fn space(&self, e: &SpaceEvent) {
        if let Some(s) = &self.sink {
            s.on_space(e);
        }
    }

    /// Emits a [`SwapchainEvent`].
    #[inline]
    pub fn swapchain(&self, e: &SwapchainEvent) {
        if let Some(s) = &self.sink {
            s.on_swapchain(e);
        }
    }

    /// Emits a [`FramePredictedEvent`].
    #[inline]
    pub fn frame_predicted(&self, e: &FramePredictedEvent) {
        if let Some(s) = &self.sink {
            s.on_frame_predicted(e);
        }
    }

    /// Emits a [`TimingPointEvent`].
    #[inline]
    pub fn timing_point(&self, e: &TimingPointEvent) {
        if let Some(s) = &self.sink {
            s.on_timing_point(e);
        }
    }

    /// Emits a [`FrameTimingEvent`].
    #[inline]
    pub fn frame_timing(&self, e: &FrameTimingEvent) {
        if let Some(s) = &self.sink {
            s.on_frame_timing(e);
        }
    }

    /// Emits an [`AppFrameEvent`].
    #[inline]
    pub fn app_frame(&self, e: &AppFrameEvent) {
        if let Some(s) = &self.sink {
            s.on_app_frame(e);
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use parking_lot::Mutex;

    /// Captures everything it is handed, for assertions.
    #[derive(Debug, Default)]
    pub(crate) struct CaptureSink {
        pub(crate) logs: Mutex<Vec<(Level, String)>>,
        pub(crate) spaces: Mutex<Vec<SpaceEvent>>,
        pub(crate) swapchains: Mutex<Vec<SwapchainEvent>>,
        pub(crate) predictions: Mutex<Vec<FramePredictedEvent>>,
        pub(crate) points: Mutex<Vec<TimingPointEvent>>,
        pub(crate) timings: Mutex<Vec<FrameTimingEvent>>,
        pub(crate) app_frames: Mutex<Vec<AppFrameEvent>>,
    }

    impl CaptureSink {
        pub(crate) fn logged_at(&self, level: Level) -> Vec<String> {
            self.logs
                .lock()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }
    }

    impl TraceSink for CaptureSink {
        fn log(&self, level: Level, args: fmt::Arguments<'_>) {
            self.logs.lock().push((level, args.to_string()));
        }
        fn on_space(&self, e: &SpaceEvent) {
            self.spaces.lock().push(*e);
        }
        fn on_swapchain(&self, e: &SwapchainEvent) {
            self.swapchains.lock().push(*e);
        }
        fn on_frame_predicted(&self, e: &FramePredictedEvent) {
            self.predictions.lock().push(*e);
        }
        fn on_timing_point(&self, e: &TimingPointEvent) {
            self.points.lock().push(*e);
        }
        fn on_frame_timing(&self, e: &FrameTimingEvent) {
            self.timings.lock().push(*e);
        }
        fn on_app_frame(&self, e: &AppFrameEvent) {
            self.app_frames.lock().push(*e);
        }
    }

    /// A tracer wired to a fresh [`CaptureSink`].
    pub(crate) fn capture() -> (Tracer, Arc<CaptureSink>) {
        let sink = Arc::new(CaptureSink::default());
        (Tracer::new(sink.clone()), sink)
    }

    #[test]
    fn log_reaches_sink_with_level() {
        let (tracer, sink) = capture();
        tracer.log(Level::WARN, format_args!("frame {} late", 7));
        assert_eq!(
            sink.logged_at(Level::WARN),
            vec!["frame 7 late".to_owned()],
            "warn line captured"
        );
        assert!(sink.logged_at(Level::ERROR).is_empty(), "no error lines");
    }

    #[test]
    fn none_tracer_drops_events() {
        let tracer = Tracer::none();
        // Nothing to observe; this must simply not panic.
        tracer.log(Level::INFO, format_args!("hello"));
        tracer.frame_timing(&FrameTimingEvent::default());
    }

    #[test]
    fn noop_sink_accepts_everything() {
        let tracer = Tracer::new(Arc::new(NoopSink));
        tracer.timing_point(&TimingPointEvent {
            frame_id: FrameId(1),
            point: TimingPoint::WakeUp,
            when_ns: 10,
        });
        tracer.log(Level::DEBUG, format_args!("ignored"));
    }

    #[test]
    fn events_are_forwarded() {
        let (tracer, sink) = capture();
        let e = FramePredictedEvent {
            kind: PacingKind::Fake,
            frame_id: FrameId(5),
            when_ns: 1,
            wake_up_time_ns: 2,
            desired_present_time_ns: 3,
            predicted_display_time_ns: 4,
        };
        tracer.frame_predicted(&e);
        assert_eq!(sink.predictions.lock().as_slice(), &[e], "prediction captured");
    }

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl std::io::Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn log_lines_reach_tracing() {
        let buf = SharedBuf::default();
        let writer = buf.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            Tracer::none().log(Level::WARN, format_args!("frame {} missed", 9));
            Tracer::none().log(Level::TRACE, format_args!("filtered out"));
        });

        let out = String::from_utf8(buf.0.lock().clone()).unwrap();
        assert!(out.contains("WARN"), "level printed: {out}");
        assert!(out.contains("frame 9 missed"), "message printed: {out}");
        assert!(!out.contains("filtered out"), "trace below max level: {out}");
    }
}
