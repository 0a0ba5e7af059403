use std::f32::consts::TAU;

use glam::Vec3;
use rand::Rng;

use crate::splat::{clamp_u8, Splat};

pub const DEMO_TORUS_KNOT_SPLATS: usize = 30_000;
pub const DEMO_CLUSTER_SPLATS: usize = 15_000;

fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [u8; 3] {
    let c = value * saturation;
    let h = (hue.rem_euclid(360.0)) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    [
        clamp_u8((r + m) * 255.0),
        clamp_u8((g + m) * 255.0),
        clamp_u8((b + m) * 255.0),
    ]
}

fn random_sphere_point(rng: &mut impl Rng) -> Vec3 {
    let z = rng.random_range(-1.0_f32..1.0_f32);
    let theta = rng.random_range(0.0_f32..TAU);
    let r = (1.0 - z * z).sqrt();
    Vec3::new(r * theta.cos(), z, r * theta.sin())
}

fn generate_torus_knot_splats(rng: &mut impl Rng, count: usize) -> Vec<Splat> {
    let mut splats = Vec::with_capacity(count);

    let p = 2.0;
    let q = 3.0;
    // Radii keep the knot inside a ~2 unit sphere.
    let major = 1.4;
    let minor = 0.38;

    for i in 0..count {
        let t = i as f32 / count.max(1) as f32 * TAU * 2.0;

        // XZ plane, Y up: an orbiting camera sees the loop overlap itself,
        // which is where depth order matters.
        let base = Vec3::new(
            (major + minor * (q * t).cos()) * (p * t).cos(),
            minor * (q * t).sin(),
            (major + minor * (q * t).cos()) * (p * t).sin(),
        );

        let jitter = Vec3::new(
            rng.random_range(-0.04_f32..0.04_f32),
            rng.random_range(-0.04_f32..0.04_f32),
            rng.random_range(-0.04_f32..0.04_f32),
        );

        let hue = ((q * t).sin() * 0.5 + 0.5) * 360.0;
        let color = hsv_to_rgb(hue, 0.80, 0.95);

        let scale = rng.random_range(0.018_f32..0.042_f32);
        splats.push(Splat {
            position: base + jitter,
            color,
            opacity: rng.random_range(0.68_f32..0.95_f32),
            scale: Vec3::new(scale, scale * rng.random_range(0.9..1.2), scale),
            rotation: [1.0, 0.0, 0.0, 0.0],
        });
    }

    splats
}

fn generate_sphere_cluster_splats(rng: &mut impl Rng, count: usize) -> Vec<Splat> {
    let mut splats = Vec::with_capacity(count);

    // Overlapping clusters at different depths.
    let centers = [
        Vec3::new(1.8, 0.3, 0.4),
        Vec3::new(-1.6, -0.2, 0.8),
        Vec3::new(0.3, 1.2, -1.6),
        Vec3::new(-0.5, -1.0, -1.4),
    ];

    let palette = [
        [255, 120, 80],
        [100, 210, 255],
        [160, 255, 130],
        [255, 220, 90],
    ];

    for i in 0..count {
        let cluster = i % centers.len();
        let center = centers[cluster];
        let base_color = palette[cluster];

        let dir = random_sphere_point(rng);
        let radius = rng.random::<f32>().cbrt() * rng.random_range(0.5_f32..1.4_f32);

        let position = center
            + dir * radius
            + Vec3::new(
                rng.random_range(-0.03_f32..0.03_f32),
                rng.random_range(-0.03_f32..0.03_f32),
                rng.random_range(-0.03_f32..0.03_f32),
            );

        let color = [
            clamp_u8(base_color[0] as f32 + rng.random_range(-25.0_f32..25.0_f32)),
            clamp_u8(base_color[1] as f32 + rng.random_range(-25.0_f32..25.0_f32)),
            clamp_u8(base_color[2] as f32 + rng.random_range(-25.0_f32..25.0_f32)),
        ];

        let scale = rng.random_range(0.02_f32..0.06_f32);
        splats.push(Splat {
            position,
            color,
            opacity: rng.random_range(0.60_f32..0.95_f32),
            scale: Vec3::new(scale, scale * rng.random_range(0.8..1.3), scale),
            rotation: [1.0, 0.0, 0.0, 0.0],
        });
    }

    splats
}

pub fn generate_demo_splats() -> Vec<Splat> {
    generate_demo_splats_with(&mut rand::rng(), DEMO_TORUS_KNOT_SPLATS, DEMO_CLUSTER_SPLATS)
}

/// Torus knot plus four sphere clusters, with a caller-supplied generator.
pub fn generate_demo_splats_with(
    rng: &mut impl Rng,
    knot_count: usize,
    cluster_count: usize,
) -> Vec<Splat> {
    let mut splats = generate_torus_knot_splats(rng, knot_count);
    splats.extend(generate_sphere_cluster_splats(rng, cluster_count));
    splats
}
