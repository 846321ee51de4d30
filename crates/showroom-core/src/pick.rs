use crate::constants::*;
use crate::scene::{CameraPose, Hotspot};
use glam::{Mat4, Quat, Vec3, Vec4};

#[derive(Clone, Debug)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub aspect: f32,
    pub fovy_radians: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Camera {
    pub fn from_pose(pose: &CameraPose, fov_y_degrees: f32, width: f32, height: f32) -> Self {
        Self {
            eye: pose.position,
            target: pose.target,
            up: Vec3::Y,
            aspect: width / height.max(1.0),
            fovy_radians: fov_y_degrees.to_radians(),
            znear: CAMERA_Z_NEAR,
            zfar: CAMERA_Z_FAR,
        }
    }

    pub fn orbited(mut self, angle_radians: f32) -> Self {
        let offset = self.eye - self.target;
        self.eye = self.target + Quat::from_rotation_y(angle_radians) * offset;
        self
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fovy_radians, self.aspect, self.znear, self.zfar)
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.eye, self.target, self.up)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// World-space ray through pixel `(sx, sy)` of a `width` x `height`
    /// backing store. Returns `(origin, direction)`.
    pub fn screen_ray(&self, sx: f32, sy: f32, width: f32, height: f32) -> (Vec3, Vec3) {
        let ndc_x = (2.0 * sx / width.max(1.0)) - 1.0;
        let ndc_y = 1.0 - (2.0 * sy / height.max(1.0));
        let inv = self.view_projection().inverse();
        let p_far = inv * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let p1: Vec3 = p_far.truncate() / p_far.w;
        let rd = (p1 - self.eye).normalize();
        (self.eye, rd)
    }
}

#[inline]
pub fn ray_sphere(ray_origin: Vec3, ray_dir: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray_origin - center;
    let b = oc.dot(ray_dir);
    let c = oc.dot(oc) - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Nearest hotspot whose marker sphere the ray hits.
pub fn pick_hotspot<'a>(
    hotspots: &'a [Hotspot],
    ray_origin: Vec3,
    ray_dir: Vec3,
    radius: f32,
) -> Option<&'a Hotspot> {
    let mut best = None::<(&Hotspot, f32)>;
    for h in hotspots {
        if let Some(t) = ray_sphere(ray_origin, ray_dir, h.position, radius) {
            match best {
                Some((_, bt)) if t >= bt => {}
                _ => best = Some((h, t)),
            }
        }
    }
    best.map(|(h, _)| h)
}
