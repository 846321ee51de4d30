// Host-side tests for render-mode resolution and the session record.

use showroom_core::*;

fn caps(level: PerformanceLevel, gfx: bool) -> PerformanceCapabilities {
    let signals = match level {
        PerformanceLevel::High => DeviceSignals {
            device_memory_gib: Some(16.0),
            logical_cores: Some(12),
            ..Default::default()
        },
        PerformanceLevel::Standard => DeviceSignals {
            device_memory_gib: Some(8.0),
            logical_cores: Some(4),
            ..Default::default()
        },
        PerformanceLevel::Low => DeviceSignals {
            device_memory_gib: Some(2.0),
            logical_cores: Some(2),
            ..Default::default()
        },
    };
    let mut c = classify(&DeviceSignals {
        supports_modern_graphics_api: Some(true),
        ..signals
    });
    c.supports_modern_graphics_api = gfx;
    c
}

#[test]
fn initial_mode_table() {
    assert_eq!(
        resolve_initial_mode(&caps(PerformanceLevel::High, true)),
        RenderMode::Standard
    );
    assert_eq!(
        resolve_initial_mode(&caps(PerformanceLevel::Standard, true)),
        RenderMode::Standard
    );
    assert_eq!(
        resolve_initial_mode(&caps(PerformanceLevel::Low, true)),
        RenderMode::Poster
    );
    assert_eq!(
        resolve_initial_mode(&caps(PerformanceLevel::High, true).with_reduced_motion(true)),
        RenderMode::Poster
    );
}

#[test]
fn should_render_3d_requires_all_conditions() {
    let good = caps(PerformanceLevel::Standard, true);
    assert!(should_render_3d(RenderMode::Standard, &good));
    assert!(should_render_3d(RenderMode::High, &good));
    assert!(!should_render_3d(RenderMode::Poster, &good));
    assert!(!should_render_3d(
        RenderMode::Standard,
        &caps(PerformanceLevel::Standard, false)
    ));
    assert!(!should_render_3d(
        RenderMode::Standard,
        &good.with_reduced_motion(true)
    ));
}

#[test]
fn reduced_motion_only_ever_removes_3d() {
    for level in [
        PerformanceLevel::High,
        PerformanceLevel::Standard,
        PerformanceLevel::Low,
    ] {
        for gfx in [true, false] {
            for mode in [RenderMode::Poster, RenderMode::Standard, RenderMode::High] {
                let c = caps(level, gfx);
                let reduced = c.with_reduced_motion(true);
                if should_render_3d(mode, &reduced) {
                    assert!(should_render_3d(mode, &c));
                }
                assert!(!should_render_3d(mode, &reduced));
            }
        }
    }
}

#[test]
fn quality_toggle_on_standard_session() {
    let mut session = RenderSession::new(caps(PerformanceLevel::Standard, true));
    assert_eq!(session.mode(), RenderMode::Standard);
    let rev = session.revision();

    assert!(session.set_quality(QualityMode::High));
    assert_eq!(session.mode(), RenderMode::High);
    assert_eq!(session.quality(), QualityMode::High);
    assert!(session.revision() > rev);

    assert!(session.set_quality(QualityMode::Standard));
    assert_eq!(session.mode(), RenderMode::Standard);
}

#[test]
fn repeated_toggle_does_not_bump_revision() {
    let mut session = RenderSession::new(caps(PerformanceLevel::High, true));
    assert!(session.set_quality(QualityMode::Standard));
    assert_eq!(session.revision(), 0);
}

#[test]
fn poster_session_ignores_quality_toggle() {
    let mut session = RenderSession::new(caps(PerformanceLevel::Low, true));
    assert_eq!(session.mode(), RenderMode::Poster);
    assert!(!session.set_quality(QualityMode::High));
    assert!(!session.set_quality(QualityMode::Standard));
    assert_eq!(session.mode(), RenderMode::Poster);
    assert!(!session.should_render_3d());
}

#[test]
fn reduced_motion_round_trip_restores_preferred_quality() {
    let base = caps(PerformanceLevel::High, true);
    let mut session = RenderSession::new(base.clone());
    assert!(session.set_quality(QualityMode::High));

    session.update_capabilities(base.with_reduced_motion(true));
    assert_eq!(session.mode(), RenderMode::Poster);
    assert!(!session.should_render_3d());

    session.update_capabilities(base.with_reduced_motion(false));
    assert_eq!(session.mode(), RenderMode::High);
    assert!(session.should_render_3d());
}

#[test]
fn quality_mode_parsing() {
    assert_eq!(QualityMode::parse("high"), Some(QualityMode::High));
    assert_eq!(QualityMode::parse("standard"), Some(QualityMode::Standard));
    assert_eq!(QualityMode::parse("ultra"), None);
    assert_eq!(QualityMode::default(), QualityMode::Standard);
}
