// Shared quality-control tuning constants used by the core and the web frontend.

// Capability classification
pub const HIGH_TIER_MIN_MEMORY_GIB: f64 = 8.0;
pub const HIGH_TIER_MIN_CORES: u32 = 8;
pub const LOW_TIER_MEMORY_BELOW_GIB: f64 = 4.0;
pub const LOW_TIER_CORES_BELOW: u32 = 4;
pub const MOBILE_MAX_VIEWPORT_WIDTH: f64 = 768.0; // widths strictly below this are mobile

// Probe fallbacks when the platform hides a signal
pub const DEFAULT_DEVICE_MEMORY_GIB: f64 = 4.0;
pub const DEFAULT_LOGICAL_CORES: u32 = 4;

// Device-pixel-ratio caps
pub const HIGH_TIER_PIXEL_DENSITY: f32 = 2.0;
pub const STANDARD_TIER_PIXEL_DENSITY: f32 = 1.5;
pub const LOW_TIER_PIXEL_DENSITY: f32 = 1.0;
pub const STANDARD_MODE_DPR_CAP: f32 = 1.5;
pub const HIGH_MODE_DPR_CAP: f32 = 2.0;

// Frame-rate monitor
pub const FPS_CEILING: f64 = 120.0; // clamp for spurious spikes (tiny or zero deltas)
pub const FPS_WINDOW_SAMPLES: usize = 120;

// Hysteresis thresholds (average FPS over the rolling window)
pub const HIGH_DOWNGRADE_BELOW_FPS: f64 = 40.0;
pub const MID_DOWNGRADE_BELOW_FPS: f64 = 25.0;
pub const MID_UPGRADE_ABOVE_FPS: f64 = 55.0;
pub const LOW_UPGRADE_ABOVE_FPS: f64 = 45.0;

// Dwell times: downgrades react fast, upgrades are cautious
pub const DOWNGRADE_DWELL_MS: f64 = 2000.0;
pub const UPGRADE_DWELL_MS: f64 = 5000.0;

// Visibility gating
pub const VISIBILITY_THRESHOLD: f64 = 0.1;
pub const PROPERTY_ROOT_MARGIN_PX: u32 = 100;
pub const OFFICE_ROOT_MARGIN_PX: u32 = 80;

// Hotspot markers
pub const HOTSPOT_PICK_RADIUS: f32 = 0.25; // ray-sphere radius for picking
pub const HOTSPOT_MARKER_SIZE: f32 = 0.12;

// Default camera projection
pub const DEFAULT_FOV_Y_DEGREES: f32 = 45.0;
pub const CAMERA_Z_NEAR: f32 = 0.1;
pub const CAMERA_Z_FAR: f32 = 200.0;

// Decoder asset locations served next to the site
pub const DEFAULT_GEOMETRY_DECODER_PATH: &str = "/draco/";
pub const DEFAULT_TEXTURE_TRANSCODER_PATH: &str = "/basis/";
pub const DEFAULT_DECODER_WORKER_LIMIT: u32 = 4;
