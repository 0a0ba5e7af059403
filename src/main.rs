use clap::Parser;
use glam::Mat4;
use log::{info, warn};
use std::io::{self, BufWriter};
use std::path::PathBuf;
use std::time::{Duration, Instant};

mod app;
mod hud;
mod terminal_setup;

use app::{run_app_loop, AppResult, AppState, SortStats};
use splatsort::camera::Orbit;
use splatsort::cloud::{SplatBuffer, SplatCloud};
use splatsort::config::SortConfig;
use splatsort::sort::{AsyncSortManager, SortParameters};
use splatsort::splat::{scene_center, Splat};
use splatsort::{demo, parser};
use terminal_setup::{cleanup_terminal, install_panic_hook, prepare_status_line};

#[derive(Debug, Parser)]
#[command(
    name = "splatsort",
    version,
    about = "Background depth sorting for Gaussian Splatting scenes"
)]
struct Cli {
    /// Path to a .ply or .splat scene file (runs demo if omitted)
    input: Option<PathBuf>,
    #[arg(long, help = "Run built-in demo scene", conflicts_with = "input")]
    demo: bool,
    #[arg(long, help = "Flip Y axis")]
    flip_y: bool,
    #[arg(long, help = "Flip Z axis")]
    flip_z: bool,
    #[arg(long, help = "Sort front to back instead of back to front")]
    reversed: bool,
    #[arg(long, value_name = "N", default_value_t = 300, help = "Frames to simulate")]
    frames: u64,
    #[arg(long, value_name = "HZ", default_value_t = 60, help = "Simulated frame rate")]
    fps: u32,
    #[arg(
        long,
        value_name = "MS",
        default_value = "33.333",
        value_parser = parse_millis,
        help = "Minimum spacing between background sorts"
    )]
    throttle_ms: Duration,
    #[arg(
        long,
        value_name = "MS",
        default_value = "33",
        value_parser = parse_millis,
        help = "Warn when a single sort takes longer than this"
    )]
    budget_ms: Duration,
    #[arg(long, help = "Disable the status line")]
    quiet: bool,
}

impl Cli {
    fn sort_config(&self) -> SortConfig {
        SortConfig::default()
            .with_throttle_interval(self.throttle_ms)
            .with_sort_budget(self.budget_ms)
    }
}

fn parse_millis(value: &str) -> Result<Duration, String> {
    let millis: f64 = value
        .parse()
        .map_err(|_| format!("'{value}' is not a number of milliseconds"))?;
    Duration::try_from_secs_f64(millis / 1000.0).map_err(|err| format!("'{value}' ms: {err}"))
}

fn load_splats_from_cli(cli: &Cli) -> AppResult<(String, Vec<Splat>)> {
    match cli.input.as_ref() {
        Some(path) if !cli.demo => {
            let splats = parser::load_scene(path)?;
            Ok((path.display().to_string(), splats))
        }
        _ => Ok(("demo".to_string(), demo::generate_demo_splats())),
    }
}

fn main() -> AppResult<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let (label, mut splats) = load_splats_from_cli(&cli)?;
    if cli.flip_y || cli.flip_z {
        for splat in &mut splats {
            if cli.flip_y {
                splat.position.y = -splat.position.y;
            }
            if cli.flip_z {
                splat.position.z = -splat.position.z;
            }
        }
    }
    if splats.is_empty() {
        return Err(format!("scene '{label}' contains no splats").into());
    }

    // Orbit the AABB center at a distance that keeps the whole scene in front.
    let center = scene_center(&splats);
    let extent = splats
        .iter()
        .map(|s| (s.position - center).length())
        .fold(0.0_f32, f32::max);
    let orbit = Orbit::new(center, (extent * 2.5).max(5.0));
    let model = Mat4::IDENTITY;

    let initial = SortParameters::new(orbit.camera_at(0.0).matrix(), model, cli.reversed);
    let started = Instant::now();
    let buffer = SplatBuffer::new(splats);
    let cloud = SplatCloud::sorted(buffer.clone(), initial).with_label(label.clone());
    info!(
        "loaded {} splats from {label}, initial sort took {:.2} ms",
        cloud.len(),
        started.elapsed().as_secs_f64() * 1000.0
    );

    let config = cli.sort_config();
    let (manager, results) = AsyncSortManager::new(buffer, cloud.len(), config)?;

    let mut app_state = AppState {
        cloud,
        orbit,
        model,
        reversed: cli.reversed,
        frames: cli.frames,
        frame_target: Duration::from_secs_f64(1.0 / f64::from(cli.fps.max(1))),
        frame_count: 0,
        last_frame_time: Instant::now(),
        fps: 0.0,
        stats: SortStats::default(),
        show_hud: !cli.quiet,
        hud_string_buf: String::with_capacity(256),
    };

    let mut stdout = BufWriter::new(io::stdout());
    if app_state.show_hud {
        install_panic_hook();
        prepare_status_line(&mut stdout)?;
    }
    let run_result = run_app_loop(&mut app_state, &manager, &results, &mut stdout);
    let cleanup_result = if app_state.show_hud {
        cleanup_terminal(&mut stdout)
    } else {
        Ok(())
    };

    if let Err(err) = manager.shutdown() {
        warn!("{err}");
    }
    run_result?;
    cleanup_result
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: Duration, expected: Duration) {
        let diff = actual.max(expected) - actual.min(expected);
        assert!(diff < Duration::from_micros(1), "{actual:?} != {expected:?}");
    }

    #[test]
    fn millisecond_flags_become_durations() {
        let cli = Cli::try_parse_from(["splatsort", "--throttle-ms", "12.5", "--budget-ms", "4"])
            .unwrap();
        let config = cli.sort_config();
        assert_close(config.throttle_interval, Duration::from_micros(12_500));
        assert_close(config.sort_budget, Duration::from_millis(4));

        let defaults = Cli::try_parse_from(["splatsort"]).unwrap().sort_config();
        assert_close(defaults.throttle_interval, Duration::from_micros(33_333));
        assert_close(defaults.sort_budget, Duration::from_millis(33));
    }

    #[test]
    fn out_of_range_milliseconds_are_rejected() {
        for bad in ["inf", "NaN", "-5", "1e300", "soon"] {
            assert!(
                Cli::try_parse_from(["splatsort", "--throttle-ms", bad]).is_err(),
                "{bad} was accepted"
            );
            assert!(
                Cli::try_parse_from(["splatsort", "--budget-ms", bad]).is_err(),
                "{bad} was accepted"
            );
        }
    }
}
