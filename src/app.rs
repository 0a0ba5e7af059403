use std::io::Write;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use glam::Mat4;
use log::{info, warn};

use splatsort::camera::Orbit;
use splatsort::cloud::{Acceptance, DrainOutcome, SplatCloud};
use splatsort::sort::{AsyncSortManager, SplatIndices};
use splatsort::splat::Splat;

use crate::hud::draw_status_line;

pub type AppResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Debug, Default, Clone, Copy)]
pub struct SortStats {
    pub requests: u64,
    pub accepted: u64,
    pub stale: u64,
}

#[derive(Debug)]
pub struct AppState {
    pub cloud: SplatCloud<Splat>,
    pub orbit: Orbit,
    pub model: Mat4,
    pub reversed: bool,
    pub frames: u64,
    pub frame_target: Duration,
    pub frame_count: u64,
    pub last_frame_time: Instant,
    pub fps: f32,
    pub stats: SortStats,
    pub show_hud: bool,
    pub hud_string_buf: String,
}

impl SortStats {
    pub fn record(&mut self, acceptance: Acceptance) {
        match acceptance {
            Acceptance::Accepted => self.accepted += 1,
            Acceptance::Stale => self.stale += 1,
        }
    }

    pub fn record_drain(&mut self, outcome: DrainOutcome) {
        self.accepted += outcome.accepted as u64;
        self.stale += outcome.stale as u64;
    }
}

/// Moves the camera along the orbit, requests a sort every frame and swaps
/// finished sorts into the cloud, the way a render loop would.
pub fn run_app_loop(
    app_state: &mut AppState,
    manager: &AsyncSortManager,
    results: &Receiver<SplatIndices>,
    stdout: &mut impl Write,
) -> AppResult<()> {
    let start = Instant::now();
    let mut worker_alive = true;

    while app_state.frame_count < app_state.frames {
        let frame_start = Instant::now();
        let delta_time = frame_start
            .duration_since(app_state.last_frame_time)
            .as_secs_f32()
            .max(1e-6);
        app_state.last_frame_time = frame_start;

        let camera = app_state.orbit.camera_at(start.elapsed().as_secs_f32());
        manager.request(camera.matrix(), app_state.model, app_state.reversed);
        app_state.stats.requests += 1;

        let outcome = app_state.cloud.drain(results);
        app_state.stats.record_drain(outcome);
        if outcome.disconnected {
            warn!("sort worker stopped; keeping the last sorted order");
            worker_alive = false;
            break;
        }

        app_state.frame_count += 1;
        let instant_fps = 1.0 / delta_time;
        app_state.fps = if app_state.fps <= 0.01 {
            instant_fps
        } else {
            0.90 * app_state.fps + 0.10 * instant_fps
        };

        if app_state.show_hud {
            let cols = crossterm::terminal::size().map(|(cols, _)| cols).unwrap_or(120);
            draw_status_line(app_state, manager.sorts_run(), cols, stdout)?;
        }

        let spent = frame_start.elapsed();
        if spent < app_state.frame_target {
            std::thread::sleep(app_state.frame_target - spent);
        }
    }

    if worker_alive {
        settle(app_state, results);
    }
    log_summary(app_state, manager.sorts_run());
    Ok(())
}

/// Picks up the sort for the final camera position, which may still be in
/// the throttle window when the loop ends.
fn settle(app_state: &mut AppState, results: &Receiver<SplatIndices>) {
    const SETTLE_TIMEOUT: Duration = Duration::from_millis(250);
    loop {
        match results.recv_timeout(SETTLE_TIMEOUT) {
            Ok(result) => {
                let acceptance = app_state.cloud.accept(result);
                app_state.stats.record(acceptance);
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

fn log_summary(app_state: &AppState, sorts_run: u64) {
    let shown = app_state.cloud.indexed_distances();
    info!(
        "{} frames, {} sort requests, {} sorts run, {} applied, {} stale",
        app_state.frame_count,
        app_state.stats.requests,
        sorts_run,
        app_state.stats.accepted,
        app_state.stats.stale
    );
    if let (Some(back), Some(front)) = (shown.indices.first(), shown.indices.last()) {
        info!(
            "current order: farthest splat #{} (depth {:.3}), nearest splat #{} (depth {:.3})",
            back.index, back.distance_to_camera, front.index, front.distance_to_camera
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drained_and_settled_results_count_alike() {
        let mut stats = SortStats::default();
        stats.record_drain(DrainOutcome {
            accepted: 2,
            stale: 1,
            disconnected: false,
        });
        stats.record(Acceptance::Accepted);
        stats.record(Acceptance::Stale);
        assert_eq!((stats.accepted, stats.stale), (3, 2));
    }
}
