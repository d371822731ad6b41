// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][format] JSON to the given writer.
//!
//! Each frame's [`FrameTimingEvent`] is split over a set of tracks:
//!
//! | Track      | Spans                                                   |
//! |------------|---------------------------------------------------------|
//! | `cpu`      | `sleep` until wake-up, `oversleep` past it               |
//! | `allotted` | compositor time budgeted at prediction                   |
//! | `gpu`      | `gpu` from submit to finish, or `gpu-time-travel`        |
//! | `margin`   | GPU finish to the desired present                        |
//! | `error`    | `slippage` past or `run-ahead` of the desired present    |
//! | `info`     | scanout to feedback, or `info_before` when it came early |
//! | `present`  | `earliest`, `predicted` and `vsync` instants             |
//!
//! Each application [`AppFrameEvent`] gets its own three tracks:
//!
//! | Track      | Spans                                                   |
//! |------------|---------------------------------------------------------|
//! | `app-cpu`  | `sleep` from prediction to wake-up, then `cpu` to begin  |
//! | `app-draw` | `draw` from begin to delivery, with a `late` part        |
//! | `app-wait` | `wait` from delivery to GPU done, with a `late` part     |
//!
//! [format]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use sextant_core::pacing::FrameId;
use sextant_core::time::is_within_half_ms;
use sextant_core::trace::{AppFrameEvent, FrameTimingEvent};

use crate::recorder::{RecordedEvent, decode};

const PID: u32 = 0;

const TID_CPU: u32 = 1;
const TID_ALLOTTED: u32 = 2;
const TID_GPU: u32 = 3;
const TID_MARGIN: u32 = 4;
const TID_ERROR: u32 = 5;
const TID_INFO: u32 = 6;
const TID_PRESENT: u32 = 7;
const TID_POINTS: u32 = 8;
const TID_APP_CPU: u32 = 9;
const TID_APP_DRAW: u32 = 10;
const TID_APP_WAIT: u32 = 11;

const TRACKS: [(u32, &str); 11] = [
    (TID_CPU, "cpu"),
    (TID_ALLOTTED, "allotted"),
    (TID_GPU, "gpu"),
    (TID_MARGIN, "margin"),
    (TID_ERROR, "error"),
    (TID_INFO, "info"),
    (TID_PRESENT, "present"),
    (TID_POINTS, "points"),
    (TID_APP_CPU, "app-cpu"),
    (TID_APP_DRAW, "app-draw"),
    (TID_APP_WAIT, "app-wait"),
];

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Timestamps are in microseconds.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = TRACKS
        .iter()
        .map(|(tid, name)| {
            json!({
                "ph": "M",
                "name": "thread_name",
                "pid": PID,
                "tid": tid,
                "args": { "name": name },
            })
        })
        .collect();

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::FramePredicted(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": "predict",
                    "cat": "Pacing",
                    "ts": ns_to_us(e.when_ns),
                    "pid": PID,
                    "tid": TID_POINTS,
                    "s": "t",
                    "args": {
                        "frame_id": e.frame_id.0,
                        "kind": format!("{:?}", e.kind),
                        "desired_present_ns": e.desired_present_time_ns,
                    }
                }));
            }
            RecordedEvent::TimingPoint(e) => {
                events.push(json!({
                    "ph": "i",
                    "name": format!("{:?}", e.point),
                    "cat": "Pacing",
                    "ts": ns_to_us(e.when_ns),
                    "pid": PID,
                    "tid": TID_POINTS,
                    "s": "t",
                    "args": { "frame_id": e.frame_id.0 }
                }));
            }
            RecordedEvent::FrameTiming(e) => frame_tracks(&e, &mut events),
            RecordedEvent::AppFrame(e) => app_tracks(&e, &mut events),
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn frame_tracks(e: &FrameTimingEvent, events: &mut Vec<Value>) {
    let id = e.frame_id;

    events.push(span(TID_CPU, "sleep", id, e.when_predict_ns, e.wake_up_time_ns));
    let oversleep_from = e.wake_up_time_ns + 1;
    if e.when_woke_ns > oversleep_from {
        events.push(span(TID_CPU, "oversleep", id, oversleep_from, e.when_woke_ns));
    }

    events.push(span(
        TID_ALLOTTED,
        "allotted",
        id,
        e.wake_up_time_ns,
        e.wake_up_time_ns + e.current_comp_time_ns,
    ));

    let gpu_end_ns = e.actual_present_time_ns.saturating_sub(e.present_margin_ns);
    if gpu_end_ns > e.when_submitted_ns {
        events.push(span(TID_GPU, "gpu", id, e.when_submitted_ns, gpu_end_ns));
    } else {
        events.push(span(TID_GPU, "gpu-time-travel", id, gpu_end_ns, e.when_submitted_ns));
    }

    if gpu_end_ns < e.desired_present_time_ns {
        events.push(span(TID_MARGIN, "margin", id, gpu_end_ns, e.desired_present_time_ns));
    }

    let (desired, actual) = (e.desired_present_time_ns, e.actual_present_time_ns);
    if !is_within_half_ms(actual, desired) {
        if actual > desired {
            events.push(span(TID_ERROR, "slippage", id, desired, actual));
        } else {
            events.push(span(TID_ERROR, "run-ahead", id, actual, desired));
        }
    }

    if e.when_infoed_ns >= actual {
        events.push(span(TID_INFO, "info", id, actual, e.when_infoed_ns));
    } else {
        events.push(span(TID_INFO, "info_before", id, e.when_infoed_ns, actual));
    }

    if actual != e.earliest_present_time_ns {
        events.push(instant(TID_PRESENT, "earliest", id, e.earliest_present_time_ns));
    }
    if !is_within_half_ms(desired, e.earliest_present_time_ns) {
        events.push(instant(TID_PRESENT, "predicted", id, desired));
    }
    events.push(instant(TID_PRESENT, "vsync", id, actual));
}

fn app_tracks(e: &AppFrameEvent, events: &mut Vec<Value>) {
    let id = e.frame_id;
    let deadline = e.predicted_gpu_done_time_ns;

    events.push(span(TID_APP_CPU, "sleep", id, e.when_predicted_ns, e.when_woke_ns));
    events.push(span(TID_APP_CPU, "cpu", id, e.when_woke_ns + 1, e.when_began_ns));

    events.push(span(TID_APP_DRAW, "draw", id, e.when_began_ns, e.when_delivered_ns));
    if e.when_delivered_ns > deadline {
        let late_from = e.when_began_ns.max(deadline);
        events.push(span(TID_APP_DRAW, "late", id, late_from, e.when_delivered_ns));
    }

    events.push(span(TID_APP_WAIT, "wait", id, e.when_delivered_ns, e.when_gpu_done_ns));
    if e.when_gpu_done_ns > deadline {
        let late_from = e.when_delivered_ns.max(deadline);
        events.push(span(TID_APP_WAIT, "late", id, late_from, e.when_gpu_done_ns));
    }
}

fn span(tid: u32, name: &str, frame_id: FrameId, start_ns: u64, end_ns: u64) -> Value {
    json!({
        "ph": "X",
        "name": name,
        "cat": "Frame",
        "ts": ns_to_us(start_ns),
        "dur": ns_to_us(end_ns.saturating_sub(start_ns)),
        "pid": PID,
        "tid": tid,
        "args": { "frame_id": frame_id.0 }
    })
}

fn instant(tid: u32, name: &str, frame_id: FrameId, at_ns: u64) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": "Frame",
        "ts": ns_to_us(at_ns),
        "pid": PID,
        "tid": tid,
        "s": "t",
        "args": { "frame_id": frame_id.0 }
    })
}

fn ns_to_us(ns: u64) -> f64 {
    ns as f64 / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use sextant_core::pacing::{PacingKind, TimingPoint};
    use sextant_core::time::NS_PER_MS;
    use sextant_core::trace::{FramePredictedEvent, TimingPointEvent, TraceSink};

    fn export_json(rec: RecorderSink) -> Vec<Value> {
        let mut out = Vec::new();
        export(&rec.into_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        serde_json::from_str(&json_str).unwrap()
    }

    fn named<'a>(events: &'a [Value], name: &str) -> Vec<&'a Value> {
        events.iter().filter(|e| e["name"] == name).collect()
    }

    fn on_time() -> FrameTimingEvent {
        FrameTimingEvent {
            frame_id: FrameId(4),
            when_predict_ns: 10 * NS_PER_MS,
            wake_up_time_ns: 20 * NS_PER_MS,
            when_woke_ns: 20 * NS_PER_MS + 50_000,
            when_began_ns: 20 * NS_PER_MS + 100_000,
            when_submitted_ns: 20 * NS_PER_MS + 300_000,
            when_infoed_ns: 24 * NS_PER_MS,
            current_comp_time_ns: 2 * NS_PER_MS,
            desired_present_time_ns: 23 * NS_PER_MS,
            predicted_display_time_ns: 27 * NS_PER_MS,
            actual_present_time_ns: 23 * NS_PER_MS,
            earliest_present_time_ns: 23 * NS_PER_MS,
            present_margin_ns: NS_PER_MS,
        }
    }

    #[test]
    fn export_names_the_tracks() {
        let events = export_json(RecorderSink::new());
        assert_eq!(events.len(), TRACKS.len(), "metadata only");
        assert!(events.iter().all(|e| e["ph"] == "M"), "all metadata");
        assert_eq!(events[0]["args"]["name"], "cpu", "first track");
    }

    #[test]
    fn on_time_frame_has_no_error_span() {
        let rec = RecorderSink::new();
        rec.on_frame_timing(&on_time());
        let events = export_json(rec);

        assert_eq!(named(&events, "sleep").len(), 1, "sleep");
        assert_eq!(named(&events, "oversleep").len(), 1, "woke 50us late");
        assert_eq!(named(&events, "gpu").len(), 1, "gpu");
        assert_eq!(named(&events, "margin").len(), 1, "margin");
        assert!(named(&events, "slippage").is_empty(), "no slippage");
        assert!(named(&events, "run-ahead").is_empty(), "no run-ahead");
        assert!(named(&events, "earliest").is_empty(), "made earliest");
        assert_eq!(named(&events, "vsync").len(), 1, "vsync");

        let gpu = named(&events, "gpu")[0];
        assert_eq!(gpu["ts"], 20_300.0, "starts at submit");
        assert_eq!(gpu["dur"], 1_700.0, "ends a margin before scanout");
        assert_eq!(named(&events, "allotted")[0]["dur"], 2_000.0, "budget");
    }

    #[test]
    fn missed_frame_shows_slippage() {
        let rec = RecorderSink::new();
        rec.on_frame_timing(&FrameTimingEvent {
            actual_present_time_ns: 39 * NS_PER_MS,
            earliest_present_time_ns: 39 * NS_PER_MS,
            when_infoed_ns: 38 * NS_PER_MS,
            ..on_time()
        });
        let events = export_json(rec);
        let slip = named(&events, "slippage");
        assert_eq!(slip.len(), 1, "slipped");
        assert_eq!(slip[0]["dur"], 16_000.0, "one period");
        assert_eq!(named(&events, "info_before").len(), 1, "feedback before scanout");
        assert_eq!(named(&events, "predicted").len(), 1, "desired missed earliest");
    }

    #[test]
    fn gpu_finishing_before_submit_is_time_travel() {
        let rec = RecorderSink::new();
        rec.on_frame_timing(&FrameTimingEvent {
            present_margin_ns: 3 * NS_PER_MS,
            ..on_time()
        });
        let events = export_json(rec);
        assert_eq!(named(&events, "gpu-time-travel").len(), 1, "time travel");
        assert!(named(&events, "gpu").is_empty(), "no gpu span");
    }

    #[test]
    fn app_frame_late_parts_start_at_the_deadline() {
        let rec = RecorderSink::new();
        rec.on_app_frame(&AppFrameEvent {
            frame_id: FrameId(2),
            when_predicted_ns: NS_PER_MS,
            when_woke_ns: 2 * NS_PER_MS,
            when_began_ns: 3 * NS_PER_MS,
            when_delivered_ns: 6 * NS_PER_MS,
            when_gpu_done_ns: 9 * NS_PER_MS,
            predicted_gpu_done_time_ns: 8 * NS_PER_MS,
            ..AppFrameEvent::default()
        });
        let events = export_json(rec);

        assert_eq!(named(&events, "sleep").len(), 1, "sleep");
        assert_eq!(named(&events, "cpu").len(), 1, "cpu");
        assert_eq!(named(&events, "draw")[0]["dur"], 3_000.0, "draw");
        let late = named(&events, "late");
        assert_eq!(late.len(), 1, "only the gpu wait ran late");
        assert_eq!(late[0]["tid"], TID_APP_WAIT, "on the wait track");
        assert_eq!(late[0]["ts"], 8_000.0, "from the deadline");
        assert_eq!(late[0]["dur"], 1_000.0, "to gpu done");
    }

    #[test]
    fn points_and_predictions_are_instants() {
        let rec = RecorderSink::new();
        rec.on_frame_predicted(&FramePredictedEvent {
            kind: PacingKind::Fake,
            frame_id: FrameId(5),
            when_ns: 1_000,
            wake_up_time_ns: 2_000,
            desired_present_time_ns: 3_000,
            predicted_display_time_ns: 4_000,
        });
        rec.on_timing_point(&TimingPointEvent {
            frame_id: FrameId(5),
            point: TimingPoint::Begin,
            when_ns: 2_500,
        });
        let events = export_json(rec);
        let predict = named(&events, "predict");
        assert_eq!(predict.len(), 1, "prediction");
        assert_eq!(predict[0]["args"]["kind"], "Fake", "kind");
        let begin = named(&events, "Begin");
        assert_eq!(begin.len(), 1, "point");
        assert_eq!(begin[0]["ts"], 2.5, "microseconds");
    }
}
