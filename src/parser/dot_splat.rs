use std::path::Path;

use glam::Vec3;

use super::read_file;
use crate::error::LoadError;
use crate::splat::{quat_normalize, Splat};

/// antimatter15 `.splat`: position (3 x f32), scale (3 x f32), RGBA (4 x u8),
/// rotation (4 x u8), little endian.
pub const RECORD_SIZE: usize = 32;

fn read_vec3_f32(bytes: &[u8]) -> Vec3 {
    let f = |i: usize| f32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
    Vec3::new(f(0), f(4), f(8))
}

fn decode_scale_value(v: f32) -> f32 {
    if v > 0.0 {
        v
    } else {
        v.exp().max(1e-4)
    }
}

pub fn load_splat_file(path: impl AsRef<Path>) -> Result<Vec<Splat>, LoadError> {
    parse_splat(&read_file(path.as_ref())?)
}

pub fn parse_splat(data: &[u8]) -> Result<Vec<Splat>, LoadError> {
    if data.len() < RECORD_SIZE {
        return Err(LoadError::splat("file too small"));
    }
    if data.len() % RECORD_SIZE != 0 {
        return Err(LoadError::splat(format!(
            "size {} is not a multiple of {RECORD_SIZE} bytes ({} complete records)",
            data.len(),
            data.len() / RECORD_SIZE
        )));
    }

    let splats = data
        .chunks_exact(RECORD_SIZE)
        .map(|chunk| {
            let scale_raw = read_vec3_f32(&chunk[12..24]);
            Splat {
                position: read_vec3_f32(&chunk[0..12]),
                color: [chunk[24], chunk[25], chunk[26]],
                opacity: (chunk[27] as f32 / 255.0).clamp(0.0, 1.0),
                scale: Vec3::new(
                    decode_scale_value(scale_raw.x),
                    decode_scale_value(scale_raw.y),
                    decode_scale_value(scale_raw.z),
                ),
                rotation: quat_normalize([
                    chunk[28] as f32 / 127.5 - 1.0,
                    chunk[29] as f32 / 127.5 - 1.0,
                    chunk[30] as f32 / 127.5 - 1.0,
                    chunk[31] as f32 / 127.5 - 1.0,
                ]),
            }
        })
        .collect();
    Ok(splats)
}
