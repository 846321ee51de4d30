// Host-side tests for constants and their relationships.

use showroom_core::*;

#[test]
#[allow(clippy::assertions_on_constants)]
fn hysteresis_bands_do_not_overlap() {
    // A level must be able to hold between its downgrade and upgrade points.
    assert!(MID_DOWNGRADE_BELOW_FPS < LOW_UPGRADE_ABOVE_FPS);
    assert!(HIGH_DOWNGRADE_BELOW_FPS < MID_UPGRADE_ABOVE_FPS);
    assert!(MID_DOWNGRADE_BELOW_FPS < HIGH_DOWNGRADE_BELOW_FPS);
    assert!(MID_UPGRADE_ABOVE_FPS <= FPS_CEILING);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn upgrades_wait_longer_than_downgrades() {
    assert!(DOWNGRADE_DWELL_MS > 0.0);
    assert!(UPGRADE_DWELL_MS > DOWNGRADE_DWELL_MS);
    assert!(FPS_WINDOW_SAMPLES > 0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn tier_thresholds_are_ordered() {
    assert!(LOW_TIER_MEMORY_BELOW_GIB <= HIGH_TIER_MIN_MEMORY_GIB);
    assert!(LOW_TIER_CORES_BELOW <= HIGH_TIER_MIN_CORES);
    // Defaults for hidden signals must not classify as low on their own.
    assert!(DEFAULT_DEVICE_MEMORY_GIB >= LOW_TIER_MEMORY_BELOW_GIB);
    assert!(DEFAULT_LOGICAL_CORES >= LOW_TIER_CORES_BELOW);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn pixel_density_caps_are_ordered() {
    assert!(LOW_TIER_PIXEL_DENSITY <= STANDARD_TIER_PIXEL_DENSITY);
    assert!(STANDARD_TIER_PIXEL_DENSITY <= HIGH_TIER_PIXEL_DENSITY);
    assert!(STANDARD_MODE_DPR_CAP <= HIGH_MODE_DPR_CAP);
    assert!(LOW_TIER_PIXEL_DENSITY >= 1.0);
}

#[test]
#[allow(clippy::assertions_on_constants)]
fn visibility_and_picking_are_sane() {
    assert!(VISIBILITY_THRESHOLD > 0.0 && VISIBILITY_THRESHOLD <= 1.0);
    assert!(PROPERTY_ROOT_MARGIN_PX > 0);
    assert!(OFFICE_ROOT_MARGIN_PX > 0);
    // Markers are easier to click than they look.
    assert!(HOTSPOT_PICK_RADIUS > HOTSPOT_MARKER_SIZE);
    assert!(CAMERA_Z_NEAR > 0.0 && CAMERA_Z_FAR > CAMERA_Z_NEAR);
}

#[test]
fn default_tuning_mirrors_constants() {
    let tuning = QualityTuning::default();
    assert_eq!(tuning.window_samples, FPS_WINDOW_SAMPLES);
    assert_eq!(tuning.downgrade_dwell_ms, DOWNGRADE_DWELL_MS);
    assert_eq!(tuning.upgrade_dwell_ms, UPGRADE_DWELL_MS);
    assert!(tuning.validate().is_ok());
}
