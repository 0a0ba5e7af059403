use std::path::Path;

use glam::Vec3;

use super::read_file;
use crate::error::LoadError;
use crate::splat::{clamp_u8, quat_normalize, sigmoid, Splat};

#[derive(Debug, Clone, Copy)]
enum PlyType {
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Float,
    Double,
}

impl PlyType {
    fn parse(name: &str) -> Option<Self> {
        match name {
            "char" | "int8" => Some(Self::Char),
            "uchar" | "uint8" => Some(Self::UChar),
            "short" | "int16" => Some(Self::Short),
            "ushort" | "uint16" => Some(Self::UShort),
            "int" | "int32" => Some(Self::Int),
            "uint" | "uint32" => Some(Self::UInt),
            "float" | "float32" => Some(Self::Float),
            "double" | "float64" => Some(Self::Double),
            _ => None,
        }
    }

    fn size(self) -> usize {
        match self {
            Self::Char | Self::UChar => 1,
            Self::Short | Self::UShort => 2,
            Self::Int | Self::UInt | Self::Float => 4,
            Self::Double => 8,
        }
    }

    fn read_as_f32(self, bytes: &[u8]) -> f32 {
        match self {
            Self::Char => i8::from_le_bytes([bytes[0]]) as f32,
            Self::UChar => u8::from_le_bytes([bytes[0]]) as f32,
            Self::Short => i16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            Self::UShort => u16::from_le_bytes([bytes[0], bytes[1]]) as f32,
            Self::Int => i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            Self::UInt => u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as f32,
            Self::Float => f32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
            Self::Double => {
                let mut arr = [0u8; 8];
                arr.copy_from_slice(&bytes[0..8]);
                f64::from_le_bytes(arr) as f32
            }
        }
    }
}

#[derive(Debug, Clone)]
struct PlyProperty {
    name: String,
    ty: PlyType,
}

fn find_ply_header_end(data: &[u8]) -> Option<usize> {
    let marker = b"end_header";
    let pos = data.windows(marker.len()).position(|w| w == marker)?;
    let mut end = pos + marker.len();
    while end < data.len() && data[end] != b'\n' {
        end += 1;
    }
    if end < data.len() {
        end += 1;
    }
    Some(end)
}

pub fn load_ply_file(path: impl AsRef<Path>) -> Result<Vec<Splat>, LoadError> {
    parse_ply(&read_file(path.as_ref())?)
}

fn parse_header(header_text: &str) -> Result<(usize, Vec<PlyProperty>), LoadError> {
    let mut is_binary_le = false;
    let mut vertex_count: usize = 0;
    let mut in_vertex_element = false;
    let mut vertex_props: Vec<PlyProperty> = Vec::new();

    for line in header_text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with("comment") {
            continue;
        }
        let parts: Vec<&str> = line.split_whitespace().collect();
        match parts[0] {
            "format" => {
                if parts.len() >= 2 && parts[1] == "binary_little_endian" {
                    is_binary_le = true;
                }
            }
            "element" if parts.len() >= 3 => {
                in_vertex_element = parts[1] == "vertex";
                if in_vertex_element {
                    vertex_count = parts[2].parse::<usize>().map_err(|_| {
                        LoadError::ply(format!("invalid vertex count '{}'", parts[2]))
                    })?;
                }
            }
            "property" if in_vertex_element && parts.len() >= 3 => {
                if parts[1] == "list" {
                    return Err(LoadError::ply(
                        "list properties in vertex element are unsupported",
                    ));
                }
                let ty = PlyType::parse(parts[1]).ok_or_else(|| {
                    LoadError::ply(format!("unsupported property type '{}'", parts[1]))
                })?;
                vertex_props.push(PlyProperty {
                    name: parts[2].to_string(),
                    ty,
                });
            }
            _ => {}
        }
    }

    if !is_binary_le {
        return Err(LoadError::ply("only binary_little_endian format is supported"));
    }
    if vertex_count == 0 || vertex_props.is_empty() {
        return Err(LoadError::ply("missing vertex element or properties"));
    }
    Ok((vertex_count, vertex_props))
}

pub fn parse_ply(data: &[u8]) -> Result<Vec<Splat>, LoadError> {
    let header_end =
        find_ply_header_end(data).ok_or_else(|| LoadError::ply("missing end_header"))?;
    let header_text = std::str::from_utf8(&data[..header_end])
        .map_err(|_| LoadError::ply("header is not valid UTF-8"))?;
    let (vertex_count, vertex_props) = parse_header(header_text)?;

    let overflow = || LoadError::ply("size overflow computing buffer size");
    let stride = vertex_props
        .iter()
        .try_fold(0usize, |acc, prop| acc.checked_add(prop.ty.size()))
        .ok_or_else(overflow)?;
    let needed = vertex_count
        .checked_mul(stride)
        .and_then(|bytes| bytes.checked_add(header_end))
        .ok_or_else(overflow)?;
    if data.len() < needed {
        return Err(LoadError::ply(format!(
            "file truncated (need {needed} bytes, have {})",
            data.len()
        )));
    }

    let body = &data[header_end..needed];
    let mut splats = Vec::with_capacity(vertex_count);
    for chunk in body.chunks_exact(stride) {
        splats.push(decode_vertex(chunk, &vertex_props));
    }
    Ok(splats)
}

fn decode_vertex(chunk: &[u8], vertex_props: &[PlyProperty]) -> Splat {
    let mut p = Vec3::ZERO;
    let mut dc = [0.0_f32; 3];
    let mut rgb = [0.0_f32; 3];
    let mut have_dc = false;
    let mut have_rgb = false;
    let mut opacity_raw = 4.0_f32;
    let mut scale_raw = [-3.0_f32, -3.0_f32, -3.0_f32];
    let mut have_scale = false;
    let mut rotation = [1.0_f32, 0.0_f32, 0.0_f32, 0.0_f32];
    let mut have_rotation = false;

    let mut cursor: usize = 0;
    for prop in vertex_props {
        let field_end = cursor + prop.ty.size();
        let value = prop.ty.read_as_f32(&chunk[cursor..field_end]);
        cursor = field_end;

        match prop.name.as_str() {
            "x" => p.x = value,
            "y" => p.y = value,
            "z" => p.z = value,
            "f_dc_0" | "f_dc_1" | "f_dc_2" => {
                dc[channel(&prop.name)] = value;
                have_dc = true;
            }
            "red" | "r" => {
                rgb[0] = value;
                have_rgb = true;
            }
            "green" | "g" => {
                rgb[1] = value;
                have_rgb = true;
            }
            "blue" | "b" => {
                rgb[2] = value;
                have_rgb = true;
            }
            "opacity" => opacity_raw = value,
            "scale_0" | "scale_1" | "scale_2" => {
                scale_raw[channel(&prop.name)] = value;
                have_scale = true;
            }
            "rot_0" | "rot_1" | "rot_2" | "rot_3" => {
                rotation[channel(&prop.name)] = value;
                have_rotation = true;
            }
            _ => {}
        }
    }

    let color = if have_dc {
        [
            clamp_u8(sigmoid(dc[0]) * 255.0),
            clamp_u8(sigmoid(dc[1]) * 255.0),
            clamp_u8(sigmoid(dc[2]) * 255.0),
        ]
    } else if have_rgb {
        [clamp_u8(rgb[0]), clamp_u8(rgb[1]), clamp_u8(rgb[2])]
    } else {
        [220, 220, 220]
    };

    let scale = if have_scale {
        Vec3::new(
            scale_raw[0].exp().max(1e-4),
            scale_raw[1].exp().max(1e-4),
            scale_raw[2].exp().max(1e-4),
        )
    } else {
        Vec3::splat(0.05)
    };

    Splat {
        position: p,
        color,
        opacity: sigmoid(opacity_raw).clamp(0.0, 1.0),
        scale,
        rotation: if have_rotation {
            quat_normalize(rotation)
        } else {
            [1.0, 0.0, 0.0, 0.0]
        },
    }
}

/// Trailing digit of `f_dc_N` / `scale_N` / `rot_N`.
fn channel(name: &str) -> usize {
    name.bytes().last().map_or(0, |b| (b - b'0') as usize)
}
