// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recording, pretty-printing, and Chrome trace export for sextant
//! diagnostics.
//!
//! This crate provides [`TraceSink`](sextant_core::trace::TraceSink)
//! implementations for development and post-mortem analysis:
//!
//! - [`pretty::PrettyPrintSink`]: human-readable one-line-per-event output.
//! - [`recorder::RecorderSink`]: compact binary recording of pacing events
//!   with [`recorder::decode`] for playback.
//! - [`chrome::export`]: writes Chrome Trace Event Format JSON, with
//!   per-frame timing tracks, from recorded bytes.
//! - [`Fanout`]: hands every event to several sinks.

use std::fmt;
use std::sync::Arc;

use sextant_core::trace::{
    AppFrameEvent, FramePredictedEvent, FrameTimingEvent, Level, SpaceEvent, SwapchainEvent,
    TimingPointEvent, TraceSink,
};

pub mod chrome;
pub mod pretty;
pub mod recorder;

/// Forwards every event and log line to each of its sinks, in order.
#[derive(Clone, Default)]
pub struct Fanout {
    sinks: Vec<Arc<dyn TraceSink>>,
}

impl fmt::Debug for Fanout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fanout")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

impl Fanout {
    /// Creates a fanout with no sinks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a sink.
    #[must_use]
    pub fn with(mut self, sink: Arc<dyn TraceSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl TraceSink for Fanout {
    fn log(&self, level: Level, args: fmt::Arguments<'_>) {
        for s in &self.sinks {
            s.log(level, args);
        }
    }

    fn on_space(&self, e: &SpaceEvent) {
        for s in &self.sinks {
            s.on_space(e);
        }
    }

    fn on_swapchain(&self, e: &SwapchainEvent) {
        for s in &self.sinks {
            s.on_swapchain(e);
        }
    }

    fn on_frame_predicted(&self, e: &FramePredictedEvent) {
        for s in &self.sinks {
            s.on_frame_predicted(e);
        }
    }

    fn on_timing_point(&self, e: &TimingPointEvent) {
        for s in &self.sinks {
            s.on_timing_point(e);
        }
    }

    fn on_frame_timing(&self, e: &FrameTimingEvent) {
        for s in &self.sinks {
            s.on_frame_timing(e);
        }
    }

    fn on_app_frame(&self, e: &AppFrameEvent) {
        for s in &self.sinks {
            s.on_app_frame(e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::{RecorderSink, decode};
    use sextant_core::pacing::{FrameId, TimingPoint};
    use sextant_core::trace::Tracer;

    #[test]
    fn fanout_reaches_every_sink() {
        let a = Arc::new(RecorderSink::new());
        let b = Arc::new(RecorderSink::new());
        let tracer = Tracer::new(Arc::new(Fanout::new().with(a.clone()).with(b.clone())));
        tracer.timing_point(&TimingPointEvent {
            frame_id: FrameId(1),
            point: TimingPoint::WakeUp,
            when_ns: 5,
        });
        tracer.app_frame(&AppFrameEvent {
            frame_id: FrameId(1),
            ..AppFrameEvent::default()
        });
        assert_eq!(decode(&a.bytes()).count(), 2, "first sink");
        assert_eq!(decode(&b.bytes()).count(), 2, "second sink");
    }
}
