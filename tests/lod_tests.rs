// Host-side tests for the adaptive LOD controller (hysteresis and dwell).

use showroom_core::*;

fn caps_for(level: PerformanceLevel) -> PerformanceCapabilities {
    let (memory, cores) = match level {
        PerformanceLevel::High => (16.0, 12),
        PerformanceLevel::Standard => (8.0, 4),
        PerformanceLevel::Low => (2.0, 2),
    };
    let caps = classify(&DeviceSignals {
        device_memory_gib: Some(memory),
        logical_cores: Some(cores),
        supports_modern_graphics_api: Some(true),
        ..Default::default()
    });
    assert_eq!(caps.level, level);
    caps
}

/// Feed frames at a steady `fps` from `start_ms` for up to `duration_ms`,
/// stopping at the first transition. Returns the transitions observed and
/// the time of the last frame fed.
fn feed(
    ctrl: &mut LodController,
    start_ms: f64,
    duration_ms: f64,
    fps: f64,
) -> (Vec<LodTransition>, f64) {
    let step = 1000.0 / fps;
    let mut t = start_ms;
    let mut out = Vec::new();
    while t + step <= start_ms + duration_ms {
        t += step;
        if let Some(tr) = ctrl.on_frame(t, 1.0 / fps) {
            out.push(tr);
            break;
        }
    }
    (out, t)
}

/// Window of one sample: the average equals the latest frame's FPS.
fn instant_tuning() -> QualityTuning {
    QualityTuning {
        window_samples: 1,
        ..Default::default()
    }
}

#[test]
fn initial_lod_follows_capabilities_and_quality() {
    let high = caps_for(PerformanceLevel::High);
    let standard = caps_for(PerformanceLevel::Standard);
    let low = caps_for(PerformanceLevel::Low);
    assert_eq!(derive_lod(&high, QualityMode::Standard), Lod::High);
    assert_eq!(derive_lod(&standard, QualityMode::Standard), Lod::Mid);
    assert_eq!(derive_lod(&standard, QualityMode::High), Lod::High);
    assert_eq!(derive_lod(&low, QualityMode::High), Lod::Low);
    assert_eq!(derive_lod(&low, QualityMode::Standard), Lod::Low);
}

#[test]
fn mid_drops_to_low_then_climbs_back_only_to_mid() {
    let mut ctrl = LodController::new(&caps_for(PerformanceLevel::Standard), QualityMode::Standard);
    assert_eq!(ctrl.current_lod(), Lod::Mid);

    let (down, t) = feed(&mut ctrl, 0.0, 2500.0, 20.0);
    assert_eq!(down.len(), 1);
    assert_eq!((down[0].from, down[0].to), (Lod::Mid, Lod::Low));
    assert_eq!(ctrl.current_lod(), Lod::Low);

    let (up, _) = feed(&mut ctrl, t, 5500.0, 50.0);
    assert_eq!(up.len(), 1);
    assert_eq!((up[0].from, up[0].to), (Lod::Low, Lod::Mid));
    assert_eq!(ctrl.current_lod(), Lod::Mid);
}

#[test]
fn downgrade_needs_the_full_dwell() {
    let mut ctrl = LodController::new(&caps_for(PerformanceLevel::High), QualityMode::Standard);
    assert_eq!(ctrl.current_lod(), Lod::High);
    let dt = 1.0 / 30.0;
    assert!(ctrl.on_frame(0.0, dt).is_none());
    assert!(ctrl.on_frame(1999.0, dt).is_none());
    assert_eq!(ctrl.current_lod(), Lod::High);
    let tr = ctrl.on_frame(2001.0, dt).expect("transition after 2001 ms");
    assert_eq!((tr.from, tr.to), (Lod::High, Lod::Mid));
}

#[test]
fn upgrade_needs_five_seconds() {
    let mut ctrl = LodController::new(&caps_for(PerformanceLevel::High), QualityMode::Standard);
    ctrl.set_forced_lod(Some(Lod::Mid));
    ctrl.set_forced_lod(None);
    // Clearing the override returns to the derived level.
    assert_eq!(ctrl.current_lod(), Lod::High);

    let mut ctrl = LodController::with_tuning(
        &caps_for(PerformanceLevel::High),
        QualityMode::Standard,
        instant_tuning(),
    );
    assert!(ctrl.on_frame(0.0, 1.0 / 20.0).is_none());
    assert!(ctrl.on_frame(2000.0, 1.0 / 20.0).is_some());
    assert_eq!(ctrl.current_lod(), Lod::Mid);

    assert!(ctrl.on_frame(3000.0, 1.0 / 60.0).is_none());
    assert!(ctrl.on_frame(7999.0, 1.0 / 60.0).is_none());
    let tr = ctrl.on_frame(8000.0, 1.0 / 60.0).expect("upgrade after 5000 ms");
    assert_eq!((tr.from, tr.to), (Lod::Mid, Lod::High));
}

#[test]
fn mid_never_upgrades_on_standard_tier() {
    let mut ctrl = LodController::with_tuning(
        &caps_for(PerformanceLevel::Standard),
        QualityMode::Standard,
        instant_tuning(),
    );
    let (transitions, _) = feed(&mut ctrl, 0.0, 20_000.0, 120.0);
    assert!(transitions.is_empty());
    assert_eq!(ctrl.current_lod(), Lod::Mid);
}

#[test]
fn a_single_good_frame_resets_the_downgrade_timer() {
    let mut ctrl = LodController::with_tuning(
        &caps_for(PerformanceLevel::High),
        QualityMode::Standard,
        instant_tuning(),
    );
    assert!(ctrl.on_frame(0.0, 1.0 / 30.0).is_none());
    assert!(ctrl.on_frame(1500.0, 1.0 / 30.0).is_none());
    assert!(ctrl.on_frame(1516.0, 1.0 / 60.0).is_none());
    assert!(ctrl.on_frame(1600.0, 1.0 / 30.0).is_none());
    // Would have fired at 2000 without the break.
    assert!(ctrl.on_frame(3000.0, 1.0 / 30.0).is_none());
    assert!(ctrl.on_frame(3600.0, 1.0 / 30.0).is_some());
}

#[test]
fn dead_zone_holds_steady() {
    let mut ctrl = LodController::with_tuning(
        &caps_for(PerformanceLevel::High),
        QualityMode::Standard,
        instant_tuning(),
    );
    ctrl.set_forced_lod(Some(Lod::Mid));
    ctrl.set_forced_lod(None);
    // Between the high downgrade threshold and the mid upgrade threshold the
    // high level holds.
    let (transitions, _) = feed(&mut ctrl, 0.0, 10_000.0, 48.0);
    assert!(transitions.is_empty());
    assert_eq!(ctrl.current_lod(), Lod::High);
}

#[test]
fn window_and_timers_clear_on_transition() {
    let mut ctrl = LodController::new(&caps_for(PerformanceLevel::Standard), QualityMode::Standard);
    let (down, t) = feed(&mut ctrl, 0.0, 2500.0, 20.0);
    assert_eq!(down.len(), 1);
    assert_eq!(ctrl.sample_count(), 0);
    assert_eq!(ctrl.average_fps(), None);

    // The low->mid upgrade must wait a fresh five seconds from here.
    let (early, t2) = feed(&mut ctrl, t, 4900.0, 50.0);
    assert!(early.is_empty());
    let (late, _) = feed(&mut ctrl, t2, 400.0, 50.0);
    assert_eq!(late.len(), 1);
}

#[test]
fn forced_lod_freezes_adaptation_and_clearing_resumes() {
    let caps = caps_for(PerformanceLevel::High);
    let mut ctrl = LodController::new(&caps, QualityMode::Standard);
    ctrl.set_forced_lod(Some(Lod::Low));
    assert_eq!(ctrl.current_lod(), Lod::Low);
    assert_eq!(ctrl.forced_lod(), Some(Lod::Low));

    let (transitions, t) = feed(&mut ctrl, 0.0, 10_000.0, 120.0);
    assert!(transitions.is_empty());
    assert_eq!(ctrl.current_lod(), Lod::Low);
    assert_eq!(ctrl.sample_count(), 0);

    ctrl.set_forced_lod(None);
    assert_eq!(ctrl.current_lod(), Lod::High);
    let (transitions, _) = feed(&mut ctrl, t, 2500.0, 10.0);
    assert_eq!(transitions.len(), 1);
    assert_eq!(ctrl.current_lod(), Lod::Mid);
}

#[test]
fn forced_high_is_allowed_on_low_tier() {
    let mut ctrl = LodController::new(&caps_for(PerformanceLevel::Low), QualityMode::Standard);
    assert_eq!(ctrl.current_lod(), Lod::Low);
    ctrl.set_forced_lod(Some(Lod::High));
    assert_eq!(ctrl.state().current, Lod::High);
    assert_eq!(ctrl.state().forced, Some(Lod::High));
}

#[test]
fn quality_sync_rederives_unless_forced() {
    let caps = caps_for(PerformanceLevel::Standard);
    let mut ctrl = LodController::new(&caps, QualityMode::Standard);
    ctrl.sync(&caps, QualityMode::High);
    assert_eq!(ctrl.current_lod(), Lod::High);

    ctrl.set_forced_lod(Some(Lod::Low));
    ctrl.sync(&caps, QualityMode::Standard);
    assert_eq!(ctrl.current_lod(), Lod::Low);
    ctrl.set_forced_lod(None);
    assert_eq!(ctrl.current_lod(), Lod::Mid);
}

#[test]
fn quality_toggle_restores_derived_level_after_a_downgrade() {
    let caps = caps_for(PerformanceLevel::High);
    let mut ctrl = LodController::new(&caps, QualityMode::Standard);
    let (down, _) = feed(&mut ctrl, 0.0, 2500.0, 30.0);
    assert_eq!(down.len(), 1);
    assert_eq!(ctrl.current_lod(), Lod::Mid);

    // The derived level is High either way; the toggle itself re-derives.
    ctrl.sync(&caps, QualityMode::High);
    assert_eq!(ctrl.current_lod(), Lod::High);
    assert_eq!(ctrl.sample_count(), 0);
}

#[test]
fn unchanged_inputs_leave_the_monitor_alone() {
    let caps = caps_for(PerformanceLevel::High);
    let mut ctrl = LodController::new(&caps, QualityMode::Standard);
    feed(&mut ctrl, 0.0, 2500.0, 30.0);
    assert_eq!(ctrl.current_lod(), Lod::Mid);
    ctrl.on_frame(2600.0, 1.0 / 30.0);
    let samples = ctrl.sample_count();
    assert!(samples > 0);

    ctrl.sync(&caps, QualityMode::Standard);
    assert_eq!(ctrl.current_lod(), Lod::Mid);
    assert_eq!(ctrl.sample_count(), samples);
}

#[test]
fn spikes_are_clamped_before_averaging() {
    let mut ctrl = LodController::new(&caps_for(PerformanceLevel::High), QualityMode::Standard);
    ctrl.on_frame(0.0, 0.0);
    ctrl.on_frame(1.0, 1e-6);
    assert_eq!(ctrl.average_fps(), Some(120.0));
}

#[test]
fn tuning_overrides_parse_from_json() {
    let tuning = QualityTuning::from_json(r#"{"downgradeDwellMs": 500}"#).unwrap();
    assert_eq!(tuning.downgrade_dwell_ms, 500.0);
    assert_eq!(tuning.upgrade_dwell_ms, 5000.0);

    let mut ctrl = LodController::with_tuning(
        &caps_for(PerformanceLevel::High),
        QualityMode::Standard,
        tuning,
    );
    assert!(ctrl.on_frame(0.0, 0.1).is_none());
    assert!(ctrl.on_frame(500.0, 0.1).is_some());
}

#[test]
fn tuning_rejects_overlapping_thresholds() {
    let err = QualityTuning::from_json(r#"{"midDowngradeBelowFps": 50}"#).unwrap_err();
    assert!(matches!(err, TuningError::Overlap { .. }));
    assert!(matches!(
        QualityTuning::from_json(r#"{"windowSamples": 0}"#),
        Err(TuningError::EmptyWindow)
    ));
}
