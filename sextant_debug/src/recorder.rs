// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary recording of pacing events.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes pacing events into a
//! `Vec<u8>` as fixed-size little-endian records. [`decode`] reads them back
//! as an iterator of [`RecordedEvent`]. Compositor and application pacing
//! events are recorded; log lines, space events and swapchain events are
//! not.

use parking_lot::Mutex;

use sextant_core::pacing::{FrameId, PacingKind, TimingPoint};
use sextant_core::trace::{
    AppFrameEvent, FramePredictedEvent, FrameTimingEvent, TimingPointEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_FRAME_PREDICTED: u8 = 1;
const TAG_TIMING_POINT: u8 = 2;
const TAG_FRAME_TIMING: u8 = 3;
const TAG_APP_FRAME: u8 = 4;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes pacing events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Mutex<Vec<u8>>,
}

/// Append-only view of the buffer while one record is written.
struct Writer<'a>(&'a mut Vec<u8>);

impl Writer<'_> {
    fn u8(&mut self, v: u8) {
        self.0.push(v);
    }

    fn u64(&mut self, v: u64) {
        self.0.extend_from_slice(&v.to_le_bytes());
    }

    fn frame_id(&mut self, v: FrameId) {
        self.0.extend_from_slice(&v.0.to_le_bytes());
    }

    fn kind(&mut self, k: PacingKind) {
        self.u8(match k {
            PacingKind::Fake => 0,
            PacingKind::DisplayTiming => 1,
        });
    }

    fn point(&mut self, p: TimingPoint) {
        self.u8(match p {
            TimingPoint::WakeUp => 0,
            TimingPoint::Begin => 1,
            TimingPoint::Submit => 2,
        });
    }
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the bytes recorded so far.
    #[must_use]
    pub fn bytes(&self) -> Vec<u8> {
        self.buf.lock().clone()
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf.into_inner()
    }

    fn record(&self, f: impl FnOnce(&mut Writer<'_>)) {
        let mut buf = self.buf.lock();
        f(&mut Writer(&mut buf));
    }
}

impl TraceSink for RecorderSink {
    fn on_frame_predicted(&self, e: &FramePredictedEvent) {
        self.record(|w| {
            w.u8(TAG_FRAME_PREDICTED);
            w.kind(e.kind);
            w.frame_id(e.frame_id);
            w.u64(e.when_ns);
            w.u64(e.wake_up_time_ns);
            w.u64(e.desired_present_time_ns);
            w.u64(e.predicted_display_time_ns);
        });
    }

    fn on_timing_point(&self, e: &TimingPointEvent) {
        self.record(|w| {
            w.u8(TAG_TIMING_POINT);
            w.frame_id(e.frame_id);
            w.point(e.point);
            w.u64(e.when_ns);
        });
    }

    fn on_frame_timing(&self, e: &FrameTimingEvent) {
        self.record(|w| {
            w.u8(TAG_FRAME_TIMING);
            w.frame_id(e.frame_id);
            for v in [
                e.when_predict_ns,
                e.wake_up_time_ns,
                e.when_woke_ns,
                e.when_began_ns,
                e.when_submitted_ns,
                e.when_infoed_ns,
                e.current_comp_time_ns,
                e.desired_present_time_ns,
                e.predicted_display_time_ns,
                e.actual_present_time_ns,
                e.earliest_present_time_ns,
                e.present_margin_ns,
            ] {
                w.u64(v);
            }
        });
    }

    fn on_app_frame(&self, e: &AppFrameEvent) {
        self.record(|w| {
            w.u8(TAG_APP_FRAME);
            w.frame_id(e.frame_id);
            for v in [
                e.when_predicted_ns,
                e.when_woke_ns,
                e.when_began_ns,
                e.when_delivered_ns,
                e.when_gpu_done_ns,
                e.predicted_gpu_done_time_ns,
                e.predicted_display_time_ns,
                e.display_time_ns,
                e.predicted_display_period_ns,
            ] {
                w.u64(v);
            }
        });
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordedEvent {
    /// A [`FramePredictedEvent`].
    FramePredicted(FramePredictedEvent),
    /// A [`TimingPointEvent`].
    TimingPoint(TimingPointEvent),
    /// A [`FrameTimingEvent`].
    FrameTiming(FrameTimingEvent),
    /// An [`AppFrameEvent`].
    AppFrame(AppFrameEvent),
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events. Stops at the first truncated or unknown
/// record.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take<const N: usize>(&mut self) -> Option<[u8; N]> {
        let bytes = self.data.get(self.pos..self.pos + N)?.try_into().ok()?;
        self.pos += N;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take::<1>().map(|[v]| v)
    }

    fn read_u64(&mut self) -> Option<u64> {
        self.take::<8>().map(u64::from_le_bytes)
    }

    fn read_frame_id(&mut self) -> Option<FrameId> {
        self.take::<8>().map(i64::from_le_bytes).map(FrameId)
    }

    fn read_kind(&mut self) -> Option<PacingKind> {
        match self.read_u8()? {
            0 => Some(PacingKind::Fake),
            1 => Some(PacingKind::DisplayTiming),
            _ => None,
        }
    }

    fn read_point(&mut self) -> Option<TimingPoint> {
        match self.read_u8()? {
            0 => Some(TimingPoint::WakeUp),
            1 => Some(TimingPoint::Begin),
            2 => Some(TimingPoint::Submit),
            _ => None,
        }
    }

    fn decode_frame_predicted(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FramePredicted(FramePredictedEvent {
            kind: self.read_kind()?,
            frame_id: self.read_frame_id()?,
            when_ns: self.read_u64()?,
            wake_up_time_ns: self.read_u64()?,
            desired_present_time_ns: self.read_u64()?,
            predicted_display_time_ns: self.read_u64()?,
        }))
    }

    fn decode_timing_point(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::TimingPoint(TimingPointEvent {
            frame_id: self.read_frame_id()?,
            point: self.read_point()?,
            when_ns: self.read_u64()?,
        }))
    }

    fn decode_frame_timing(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::FrameTiming(FrameTimingEvent {
            frame_id: self.read_frame_id()?,
            when_predict_ns: self.read_u64()?,
            wake_up_time_ns: self.read_u64()?,
            when_woke_ns: self.read_u64()?,
            when_began_ns: self.read_u64()?,
            when_submitted_ns: self.read_u64()?,
            when_infoed_ns: self.read_u64()?,
            current_comp_time_ns: self.read_u64()?,
            desired_present_time_ns: self.read_u64()?,
            predicted_display_time_ns: self.read_u64()?,
            actual_present_time_ns: self.read_u64()?,
            earliest_present_time_ns: self.read_u64()?,
            present_margin_ns: self.read_u64()?,
        }))
    }

    fn decode_app_frame(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::AppFrame(AppFrameEvent {
            frame_id: self.read_frame_id()?,
            when_predicted_ns: self.read_u64()?,
            when_woke_ns: self.read_u64()?,
            when_began_ns: self.read_u64()?,
            when_delivered_ns: self.read_u64()?,
            when_gpu_done_ns: self.read_u64()?,
            predicted_gpu_done_time_ns: self.read_u64()?,
            predicted_display_time_ns: self.read_u64()?,
            display_time_ns: self.read_u64()?,
            predicted_display_period_ns: self.read_u64()?,
        }))
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_FRAME_PREDICTED => self.decode_frame_predicted(),
            TAG_TIMING_POINT => self.decode_timing_point(),
            TAG_FRAME_TIMING => self.decode_frame_timing(),
            TAG_APP_FRAME => self.decode_app_frame(),
            _ => None, // unknown tag → stop iteration
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
