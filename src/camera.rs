use glam::{Mat4, Vec3};

/// Yaw/pitch camera. Looks down its local -Z, so points in front of it have
/// negative view-space depth and an ascending depth sort is back to front.
#[derive(Debug, Clone)]
pub struct Camera {
    pub position: Vec3,
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
    pub yaw: f32,
    pub pitch: f32,
}

impl Camera {
    pub fn new(position: Vec3, yaw: f32, pitch: f32) -> Self {
        let mut camera = Self {
            position,
            forward: Vec3::NEG_Z,
            right: Vec3::X,
            up: Vec3::Y,
            yaw,
            pitch,
        };
        camera.update_vectors();
        camera
    }

    pub fn update_vectors(&mut self) {
        let forward = Vec3::new(
            self.yaw.cos() * self.pitch.cos(),
            self.pitch.sin(),
            self.yaw.sin() * self.pitch.cos(),
        )
        .normalize();

        let right = forward.cross(Vec3::Y).normalize_or_zero();
        self.forward = forward;
        self.right = if right.length_squared() < 1e-6 {
            Vec3::X
        } else {
            right
        };
        self.up = self.right.cross(forward).normalize();
    }

    /// Camera-to-world transform; its inverse is the view matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_cols(
            self.right.extend(0.0),
            self.up.extend(0.0),
            (-self.forward).extend(0.0),
            self.position.extend(1.0),
        )
    }
}

pub fn look_at_target(camera: &mut Camera, target: Vec3) {
    let to_target = (target - camera.position).normalize_or_zero();
    if to_target.length_squared() < 1e-8 {
        return;
    }
    camera.yaw = to_target.z.atan2(to_target.x);
    camera.pitch = to_target.y.clamp(-1.0, 1.0).asin();
    camera.update_vectors();
}

/// Circular path around a target, used to drive sort requests frame by frame.
#[derive(Debug, Clone, Copy)]
pub struct Orbit {
    pub target: Vec3,
    pub radius: f32,
    pub height: f32,
    /// Radians per second.
    pub angular_speed: f32,
}

impl Orbit {
    pub fn new(target: Vec3, radius: f32) -> Self {
        Self {
            target,
            radius: radius.max(0.5),
            height: 0.0,
            angular_speed: 0.6,
        }
    }

    pub fn camera_at(&self, seconds: f32) -> Camera {
        let angle = seconds * self.angular_speed;
        let position = self.target
            + Vec3::new(
                self.radius * angle.cos(),
                self.height,
                self.radius * angle.sin(),
            );
        let mut camera = Camera::new(position, 0.0, 0.0);
        look_at_target(&mut camera, self.target);
        camera
    }
}
