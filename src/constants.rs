/// DOM hooks and rendering tuning for the browser frontend.
///
/// Class names are the contract with the host page's stylesheet.
pub const CLASS_CANVAS: &str = "showroom-canvas";
pub const CLASS_POSTER: &str = "showroom-poster";
pub const CLASS_PLACEHOLDER: &str = "showroom-placeholder";
pub const CLASS_HOTSPOT_CARD: &str = "showroom-hotspot";
pub const CLASS_CTA: &str = "showroom-cta";
pub const CLASS_HIDDEN: &str = "hidden";

pub const PLACEHOLDER_TEXT: &str = "Loading 3D view";

pub const REDUCED_MOTION_QUERY: &str = "(prefers-reduced-motion: reduce)";

// Radians per second for office-style auto rotation
pub const AUTO_ROTATE_SPEED: f32 = 0.12;

// Directional light in world space (normalized in the shader)
pub const LIGHT_DIRECTION: [f32; 3] = [0.4, 1.0, 0.3];

// Hotspot marker colors (linear RGB)
pub const MARKER_COLOR: [f32; 3] = [0.95, 0.55, 0.15];
pub const MARKER_ACTIVE_COLOR: [f32; 3] = [1.0, 0.85, 0.25];

// Initial instance buffer capacity; grows by doubling
pub const INSTANCE_CAPACITY: usize = 64;

pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;
