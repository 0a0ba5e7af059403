use glam::Vec3;

/// Anything the depth sorter can order. Only the position is read; the rest of
/// the payload belongs to the renderer.
pub trait SortableSplat: Send + Sync + 'static {
    fn float_position(&self) -> Vec3;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Splat {
    pub position: Vec3,
    pub color: [u8; 3],
    pub opacity: f32,
    pub scale: Vec3,
    pub rotation: [f32; 4],
}

impl Splat {
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            color: [220, 220, 220],
            opacity: 1.0,
            scale: Vec3::splat(0.05),
            rotation: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl SortableSplat for Splat {
    fn float_position(&self) -> Vec3 {
        self.position
    }
}

impl SortableSplat for Vec3 {
    fn float_position(&self) -> Vec3 {
        *self
    }
}

/// Axis-aligned bounding box center, or the origin for an empty slice.
pub fn scene_center<S: SortableSplat>(splats: &[S]) -> Vec3 {
    if splats.is_empty() {
        return Vec3::ZERO;
    }
    let (min, max) = splats.iter().fold(
        (Vec3::splat(f32::INFINITY), Vec3::splat(f32::NEG_INFINITY)),
        |(min, max), s| {
            let p = s.float_position();
            (min.min(p), max.max(p))
        },
    );
    (min + max) * 0.5
}

pub(crate) fn quat_normalize(q: [f32; 4]) -> [f32; 4] {
    let len = (q[0] * q[0] + q[1] * q[1] + q[2] * q[2] + q[3] * q[3]).sqrt();
    if len < 1e-8 {
        return [1.0, 0.0, 0.0, 0.0];
    }
    [q[0] / len, q[1] / len, q[2] / len, q[3] / len]
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

pub(crate) fn clamp_u8(v: f32) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}
