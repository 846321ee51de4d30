// Host-side tests for device classification.
// The web crate is wasm-only; these drive the platform-independent core.

use showroom_core::*;

fn desktop(memory: f64, cores: u32, gfx: bool) -> DeviceSignals {
    DeviceSignals {
        device_memory_gib: Some(memory),
        logical_cores: Some(cores),
        supports_modern_graphics_api: Some(gfx),
        prefers_reduced_motion: Some(false),
        user_agent: Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/126.0".into()),
        viewport_width: Some(1440.0),
    }
}

#[test]
fn high_end_desktop_is_high_tier() {
    let caps = classify(&desktop(8.0, 8, true));
    assert_eq!(caps.level, PerformanceLevel::High);
    assert_eq!(caps.max_pixel_density, 2.0);
    assert_eq!(caps.recommended_lod, Lod::High);
}

#[test]
fn small_device_is_low_even_with_modern_graphics() {
    let caps = classify(&desktop(2.0, 2, true));
    assert_eq!(caps.level, PerformanceLevel::Low);
    assert_eq!(caps.max_pixel_density, 1.0);
    assert_eq!(caps.recommended_lod, Lod::Low);
    assert_eq!(resolve_initial_mode(&caps), RenderMode::Poster);
}

#[test]
fn memory_boundary_is_inclusive_for_high() {
    assert_eq!(classify(&desktop(8.0, 8, true)).level, PerformanceLevel::High);
    assert_eq!(
        classify(&desktop(7.9, 8, true)).level,
        PerformanceLevel::Standard
    );
}

#[test]
fn core_boundary_is_inclusive_for_high() {
    assert_eq!(classify(&desktop(16.0, 8, true)).level, PerformanceLevel::High);
    assert_eq!(
        classify(&desktop(16.0, 7, true)).level,
        PerformanceLevel::Standard
    );
}

#[test]
fn low_tier_thresholds_are_strict() {
    // Exactly 4 GiB and 4 cores is not low.
    assert_eq!(
        classify(&desktop(4.0, 4, true)).level,
        PerformanceLevel::Standard
    );
    assert_eq!(classify(&desktop(3.9, 4, true)).level, PerformanceLevel::Low);
    assert_eq!(classify(&desktop(4.0, 3, true)).level, PerformanceLevel::Low);
}

#[test]
fn missing_modern_graphics_forces_low() {
    let caps = classify(&desktop(32.0, 16, false));
    assert_eq!(caps.level, PerformanceLevel::Low);
    assert!(!should_render_3d(RenderMode::Standard, &caps));
}

#[test]
fn viewport_width_boundary_for_mobile() {
    let mut signals = desktop(16.0, 12, true);
    signals.viewport_width = Some(768.0);
    assert!(!classify(&signals).is_mobile_form_factor);
    assert_eq!(classify(&signals).level, PerformanceLevel::High);

    signals.viewport_width = Some(767.0);
    let caps = classify(&signals);
    assert!(caps.is_mobile_form_factor);
    assert_eq!(caps.level, PerformanceLevel::Low);
}

#[test]
fn mobile_user_agent_is_low_on_wide_screens() {
    let mut signals = desktop(8.0, 8, true);
    signals.user_agent =
        Some("Mozilla/5.0 (iPad; CPU OS 17_0 like Mac OS X) AppleWebKit/605.1.15".into());
    let caps = classify(&signals);
    assert!(caps.is_mobile_form_factor);
    assert_eq!(caps.level, PerformanceLevel::Low);
}

#[test]
fn absent_signals_use_defaults() {
    let caps = classify(&DeviceSignals::default());
    assert_eq!(caps.device_memory_gib, 4.0);
    assert_eq!(caps.logical_core_count, 4);
    assert!(!caps.supports_modern_graphics_api);
    assert!(!caps.prefers_reduced_motion);
    assert!(!caps.is_mobile_form_factor);
    assert_eq!(caps.level, PerformanceLevel::Low);
}

#[test]
fn pre_render_default_is_standard_and_never_high() {
    let caps = PerformanceCapabilities::default();
    assert_eq!(caps.level, PerformanceLevel::Standard);
    assert_eq!(caps.device_memory_gib, 4.0);
    assert_eq!(caps.logical_core_count, 4);
    assert_eq!(caps.max_pixel_density, 1.5);
    assert_eq!(caps.recommended_lod, Lod::Mid);
}

struct FailingProbe;

impl CapabilityProbe for FailingProbe {
    fn device_memory_gib(&self) -> Option<f64> {
        None
    }
    fn logical_cores(&self) -> Option<u32> {
        None
    }
    fn supports_modern_graphics_api(&self) -> Option<bool> {
        None
    }
    fn prefers_reduced_motion(&self) -> Option<bool> {
        None
    }
    fn user_agent(&self) -> Option<String> {
        None
    }
    fn viewport_width(&self) -> Option<f64> {
        None
    }
}

#[test]
fn detect_tolerates_a_probe_that_reports_nothing() {
    let caps = detect(&FailingProbe);
    assert_eq!(caps, classify(&DeviceSignals::default()));
}

#[test]
fn detect_reads_every_probe_signal() {
    let signals = DeviceSignals {
        prefers_reduced_motion: Some(true),
        ..desktop(8.0, 8, true)
    };
    let caps = detect(&signals);
    assert_eq!(caps.level, PerformanceLevel::High);
    assert!(caps.prefers_reduced_motion);
}

#[test]
fn reduced_motion_update_keeps_other_fields() {
    let caps = classify(&desktop(8.0, 8, true));
    let updated = caps.with_reduced_motion(true);
    assert!(updated.prefers_reduced_motion);
    assert_eq!(updated.level, caps.level);
    assert_eq!(updated.max_pixel_density, caps.max_pixel_density);
}
