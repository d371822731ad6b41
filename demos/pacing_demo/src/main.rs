// Copyright 2026 the Sextant Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Simulated compositor loop that exercises spaces, swapchains and pacing.
//!
//! Sets up the legacy space graph for a simulated headset, then runs 120
//! frames against a [`SimulatedDisplay`]: each frame is paced by a
//! [`PacingTarget`], renders into a swapchain image and locates the head in
//! local space at the predicted display time. A simulated application is
//! paced alongside by an [`AppPacing`] fed from the compositor's
//! predictions. Events are recorded to a
//! [`RecorderSink`] and exported as a Chrome trace JSON file. Pass
//! `--verbose` to also print every event.

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use glam::{Quat, Vec3};
use parking_lot::Mutex;

use sextant_core::device::{DeviceId, InputName, TrackedDevice, TrackingOrigin, TrackingOriginId};
use sextant_core::math::Pose;
use sextant_core::pacing::sim::{FrameDelays, SimulatedDisplay, SimulatedTimingSource};
use sextant_core::pacing::{
    AppPacing, AppPacingConfig, PacingTarget, TargetImageInfo, TargetSettings, TimingPoint,
};
use sextant_core::relation::{RelationFlags, SpaceRelation};
use sextant_core::space::{SpaceOverseer, legacy_setup};
use sextant_core::swapchain::{
    Format, SoftwareBackend, SwapchainCompositor, SwapchainCreateInfo, SwapchainSettings,
};
use sextant_core::time::{Clock, ManualClock, NS_PER_SEC, ns_to_ms};
use sextant_core::trace::Tracer;

use sextant_debug::Fanout;
use sextant_debug::pretty::PrettyPrintSink;
use sextant_debug::recorder::RecorderSink;

const FRAME_COUNT: usize = 120;
const REFRESH_RATE_HZ: f64 = 90.0;

/// A headset slowly turning its head around the vertical axis.
struct SimHmd {
    origin: TrackingOrigin,
}

impl TrackedDevice for SimHmd {
    fn id(&self) -> DeviceId {
        DeviceId(0)
    }

    fn name(&self) -> &str {
        "Simulated HMD"
    }

    fn tracking_origin(&self) -> &TrackingOrigin {
        &self.origin
    }

    fn get_tracked_pose(&self, input: InputName, at_timestamp_ns: u64) -> SpaceRelation {
        if input != InputName::HEAD_POSE {
            return SpaceRelation::ZERO;
        }
        let seconds = at_timestamp_ns as f32 / NS_PER_SEC as f32;
        SpaceRelation {
            flags: RelationFlags::POSE_VALID_TRACKED | RelationFlags::ANGULAR_VELOCITY_VALID,
            pose: Pose::new(Quat::from_rotation_y(0.5 * seconds), Vec3::ZERO),
            linear_velocity: Vec3::ZERO,
            angular_velocity: Vec3::new(0.0, 0.5, 0.0),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let verbose = std::env::args().any(|a| a == "--verbose");

    // -- sinks -------------------------------------------------------------
    let recorder = Arc::new(RecorderSink::new());
    let mut fanout = Fanout::new().with(recorder.clone());
    if verbose {
        fanout = fanout.with(Arc::new(PrettyPrintSink::with_writer(std::io::stdout())));
    }
    let tracer = Tracer::new(Arc::new(fanout));

    // -- spaces ------------------------------------------------------------
    let overseer = SpaceOverseer::new(tracer.clone());
    let hmd: Arc<dyn TrackedDevice> = Arc::new(SimHmd {
        origin: TrackingOrigin {
            id: TrackingOriginId(0),
            name: "Simulated origin".to_owned(),
            offset: Pose::IDENTITY,
        },
    });
    legacy_setup(
        &overseer,
        core::slice::from_ref(&hmd),
        Some(&hmd),
        &Pose::from_position(Vec3::new(0.0, 1.6, 0.0)),
    );
    let semantic = overseer.semantic();
    let (Some(view), Some(local)) = (semantic.view, semantic.local) else {
        eprintln!("legacy setup did not produce view and local spaces");
        return;
    };

    // -- swapchain ---------------------------------------------------------
    let compositor = SwapchainCompositor::new(
        Arc::new(SoftwareBackend::new()),
        SwapchainSettings::DEFAULT,
        tracer.clone(),
    );
    let mut swapchain = compositor
        .create(&SwapchainCreateInfo::color(Format::R8G8B8A8_SRGB, 1832, 1920))
        .expect("failed to create swapchain");

    // -- pacing ------------------------------------------------------------
    let settings = TargetSettings::from_refresh_rate(REFRESH_RATE_HZ);
    let period_ns = settings.nominal_frame_interval_ns;
    let clock = Arc::new(ManualClock::new(NS_PER_SEC));
    let display = Arc::new(Mutex::new(SimulatedDisplay::new(period_ns)));
    let mut target = PacingTarget::new(
        settings,
        clock.clone(),
        Box::new(SimulatedTimingSource::new(display.clone(), clock.clone())),
        tracer.clone(),
    );
    target.create_images(&TargetImageInfo {
        width: 1832,
        height: 1920,
        format: Format::B8G8R8A8_SRGB,
    });

    let mut app = AppPacing::new(&AppPacingConfig::default(), tracer.clone());

    // -- simulated loop ----------------------------------------------------
    let mut missed = 0;
    for frame in 0..FRAME_COUNT {
        // Halfway through the compositor gets slower.
        let delays = if frame < FRAME_COUNT / 2 {
            FrameDelays::SHORT
        } else {
            FrameDelays::LONG
        };

        let p = target.calc_frame_pacing();
        clock.advance_to(p.wake_up_time_ns);
        clock.advance(delays.wake_ns);
        target.update_timings();
        target.mark_timing_point(TimingPoint::WakeUp, p.frame_id, clock.now_ns());

        app.info(
            p.predicted_display_time_ns,
            p.predicted_display_period_ns,
            p.predicted_display_time_ns - p.wake_up_time_ns,
        );
        let a = app.predict(clock.now_ns());
        app.mark_point(TimingPoint::WakeUp, a.frame_id, clock.now_ns());

        let head = overseer.locate_space(
            local,
            &Pose::IDENTITY,
            p.predicted_display_time_ns,
            view,
            &Pose::IDENTITY,
        );

        clock.advance(delays.begin_ns);
        target.mark_timing_point(TimingPoint::Begin, p.frame_id, clock.now_ns());
        app.mark_point(TimingPoint::Begin, a.frame_id, clock.now_ns());

        let index = swapchain.acquire_image().expect("no free swapchain image");
        swapchain
            .wait_image(period_ns, index)
            .expect("swapchain image wait failed");
        swapchain
            .release_image(index)
            .expect("swapchain image release failed");

        clock.advance(delays.submit_ns);
        target.mark_timing_point(TimingPoint::Submit, p.frame_id, clock.now_ns());
        app.mark_delivered(a.frame_id, clock.now_ns(), a.predicted_display_time_ns);

        clock.advance(delays.gpu_ns);
        app.mark_gpu_done(a.frame_id, clock.now_ns());
        app.latched(a.frame_id, clock.now_ns(), p.frame_id);
        let scanout_ns = display
            .lock()
            .present(p.frame_id, p.desired_present_time_ns, clock.now_ns());
        if scanout_ns > p.desired_present_time_ns {
            missed += 1;
        }
        app.retired(a.frame_id, scanout_ns);

        if frame % 30 == 0 {
            tracing::info!(
                "frame {:?}: budget {:.2}ms, head yaw {:.3}rad",
                p.frame_id,
                ns_to_ms((p.desired_present_time_ns - p.wake_up_time_ns) as i64),
                head.pose.orientation.to_euler(glam::EulerRot::YXZ).0,
            );
        }
    }

    // -- teardown ----------------------------------------------------------
    swapchain.destroy();
    let collected = compositor.garbage_collect();
    tracing::info!("collected {collected} swapchain(s)");
    tracing::info!(
        "app estimates: cpu {:.2}ms, draw {:.2}ms, wait {:.2}ms",
        ns_to_ms(app.cpu_time_ns() as i64),
        ns_to_ms(app.draw_time_ns() as i64),
        ns_to_ms(app.wait_time_ns() as i64),
    );
    target.destroy();
    overseer.destroy();

    // -- export Chrome trace -----------------------------------------------
    let path = "trace.json";
    let file = File::create(path).expect("failed to create trace.json");
    let mut writer = BufWriter::new(file);
    sextant_debug::chrome::export(&recorder.bytes(), &mut writer)
        .expect("failed to write Chrome trace");

    println!(
        "Wrote {path} ({FRAME_COUNT} frames at {:.2}ms, {missed} missed)",
        ns_to_ms(period_ns as i64)
    );
}
