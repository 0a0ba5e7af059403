use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use glam::{Mat4, Quat, Vec3};
use rand::{Rng, SeedableRng};

use super::{
    float_sort_key, AsyncSortManager, CpuSplatRadixSorter, IndexedDistance, SortParameters,
    SplatIndices,
};
use crate::cloud::{Acceptance, SplatBuffer, SplatCloud};
use crate::config::SortConfig;
use crate::error::SortError;

const WAIT: Duration = Duration::from_secs(5);

fn random_positions(count: usize, seed: u64) -> Vec<Vec3> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.random_range(-20.0_f32..20.0_f32),
                rng.random_range(-20.0_f32..20.0_f32),
                rng.random_range(-20.0_f32..20.0_f32),
            )
        })
        .collect()
}

fn orbit_camera(angle: f32) -> Mat4 {
    Mat4::from_rotation_translation(
        Quat::from_rotation_y(angle),
        Quat::from_rotation_y(angle) * Vec3::new(0.0, 0.0, 30.0),
    )
}

fn order(indices: &[IndexedDistance]) -> Vec<u32> {
    indices.iter().map(|d| d.index).collect()
}

fn expect_no_result(rx: &Receiver<SplatIndices>, within: Duration) {
    match rx.recv_timeout(within) {
        Err(RecvTimeoutError::Timeout) => {}
        Ok(result) => panic!("unexpected sort result at {:?}", result.parameters.time),
        Err(RecvTimeoutError::Disconnected) => panic!("sort worker disconnected"),
    }
}

// --- Key mapping ---

#[test]
fn float_keys_preserve_numeric_order() {
    let mut values = vec![
        f32::NEG_INFINITY,
        f32::MIN,
        -1.0e20,
        -3.5,
        -1.0,
        -f32::MIN_POSITIVE,
        -1.0e-45, // negative subnormal
        -0.0,
        0.0,
        1.0e-45,
        f32::MIN_POSITIVE,
        0.5,
        1.0,
        42.0,
        f32::MAX,
        f32::INFINITY,
    ];
    for pair in values.windows(2) {
        assert!(
            float_sort_key(pair[0]) < float_sort_key(pair[1]),
            "{} should key below {}",
            pair[0],
            pair[1]
        );
    }

    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    values.extend((0..2000).map(|_| rng.random_range(-1.0e6_f32..1.0e6_f32)));
    let mut by_key = values.clone();
    by_key.sort_by_key(|v| float_sort_key(*v));
    values.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(by_key, values);
}

// --- CPU sorter ---

#[test]
fn sorter_output_is_sorted_permutation() {
    let positions = random_positions(5000, 11);
    let mut sorter = CpuSplatRadixSorter::new(positions.len());
    let result = sorter.sort(&positions, orbit_camera(0.7), Mat4::IDENTITY, false);

    assert_eq!(result.len(), positions.len());
    assert!(result
        .windows(2)
        .all(|w| w[0].distance_to_camera <= w[1].distance_to_camera));
    let mut indices = order(&result);
    indices.sort_unstable();
    assert!(indices.into_iter().eq(0..positions.len() as u32));
}

#[test]
fn repeated_sort_is_identical() {
    let positions = random_positions(2048, 3);
    let camera = orbit_camera(1.3);
    let model = Mat4::from_scale(Vec3::splat(2.0));
    let mut sorter = CpuSplatRadixSorter::new(4096);
    let first = sorter.sort(&positions, camera, model, false);
    let second = sorter.sort(&positions, camera, model, false);
    assert_eq!(first, second);
}

#[test]
fn reversed_flag_inverts_order() {
    // Distinct z on a grid keeps depths tie-free.
    let positions: Vec<Vec3> = (0..500)
        .map(|i| Vec3::new((i % 7) as f32, (i % 3) as f32, i as f32 * 0.25 - 40.0))
        .collect();
    let camera = Mat4::from_translation(Vec3::new(0.0, 0.0, 100.0));
    let mut sorter = CpuSplatRadixSorter::new(positions.len());

    let forward = order(&sorter.sort(&positions, camera, Mat4::IDENTITY, false));
    let mut reversed = order(&sorter.sort(&positions, camera, Mat4::IDENTITY, true));
    reversed.reverse();
    assert_eq!(forward, reversed);
}

// --- Async manager ---

fn fast_config() -> SortConfig {
    SortConfig::default().with_throttle_interval(Duration::from_millis(20))
}

#[test]
fn manager_publishes_sorted_indices() {
    let positions = random_positions(1000, 5);
    let buffer = SplatBuffer::new(positions.clone());
    let (manager, results) =
        AsyncSortManager::new(buffer, positions.len(), fast_config()).unwrap();

    let params = SortParameters::new(orbit_camera(0.2), Mat4::IDENTITY, false);
    manager.request_sort(params);
    let result = results.recv_timeout(WAIT).unwrap();

    let expected = CpuSplatRadixSorter::new(positions.len()).sort(
        &positions,
        params.camera,
        params.model,
        params.reversed,
    );
    assert_eq!(result.parameters.time, params.time);
    assert_eq!(&*result.indices, expected.as_slice());
    assert_eq!(manager.sorts_run(), 1);
    manager.shutdown().unwrap();
}

#[test]
fn identical_requests_in_one_window_sort_once() {
    let buffer = SplatBuffer::new(random_positions(256, 9));
    let config = SortConfig::default().with_throttle_interval(Duration::from_millis(200));
    let (manager, results) = AsyncSortManager::new(buffer, 256, config).unwrap();

    let camera = orbit_camera(0.4);
    for _ in 0..100 {
        manager.request(camera, Mat4::IDENTITY, false);
    }

    results.recv_timeout(WAIT).unwrap();
    expect_no_result(&results, Duration::from_millis(400));
    assert_eq!(manager.sorts_run(), 1);
}

#[test]
fn burst_of_views_is_throttled_to_latest() {
    let buffer = SplatBuffer::new(random_positions(256, 13));
    let config = SortConfig::default().with_throttle_interval(Duration::from_millis(300));
    let (manager, results) = AsyncSortManager::new(buffer, 256, config).unwrap();

    let requester = manager.requester();
    let views: Vec<SortParameters> = (0..20)
        .map(|i| SortParameters::new(orbit_camera(i as f32 * 0.1), Mat4::IDENTITY, false))
        .collect();
    for view in &views {
        requester.request_sort(*view);
    }

    let mut received = vec![results.recv_timeout(WAIT).unwrap()];
    while let Ok(result) = results.recv_timeout(Duration::from_millis(800)) {
        received.push(result);
    }

    // Far fewer sorts than requests, and the final one is the newest view.
    assert!(received.len() <= 3, "{} sorts for a single burst", received.len());
    let last = received.last().unwrap();
    assert_eq!(last.parameters, views[19]);
    assert_eq!(last.parameters.time, views[19].time);
    assert!(received
        .windows(2)
        .all(|w| w[0].parameters.time <= w[1].parameters.time));
}

#[test]
fn slow_consumer_still_gets_the_newest_view() {
    let buffer = SplatBuffer::new(random_positions(256, 17));
    let config = fast_config().with_result_capacity(1);
    let (manager, results) = AsyncSortManager::new(buffer, 256, config).unwrap();

    manager.request(orbit_camera(0.0), Mat4::IDENTITY, false);
    std::thread::sleep(Duration::from_millis(100));

    // The result slot is full; every one of these arrives while the worker waits.
    let views: Vec<SortParameters> = (1..200)
        .map(|i| SortParameters::new(orbit_camera(i as f32 * 0.01), Mat4::IDENTITY, false))
        .collect();
    for view in &views {
        manager.request_sort(*view);
    }
    std::thread::sleep(Duration::from_millis(100));

    let mut received = Vec::new();
    while let Ok(result) = results.recv_timeout(Duration::from_millis(300)) {
        received.push(result);
    }
    assert!(received.len() <= 4, "{} sorts for a stalled consumer", received.len());
    let last = received.last().unwrap();
    assert_eq!(last.parameters, views[views.len() - 1]);
    assert_eq!(last.parameters.time, views[views.len() - 1].time);
}

#[test]
fn consumer_tracks_latest_order() {
    let positions = random_positions(512, 21);
    let buffer = SplatBuffer::new(positions);
    let base = Instant::now();
    let initial = SortParameters::at(base, orbit_camera(0.0), Mat4::IDENTITY, false);
    let mut cloud = SplatCloud::sorted(buffer.clone(), initial);
    let (manager, results) = AsyncSortManager::new(buffer, cloud.len(), fast_config()).unwrap();

    let newer = SortParameters::at(
        base + Duration::from_millis(10),
        orbit_camera(2.0),
        Mat4::IDENTITY,
        false,
    );
    manager.request_sort(newer);
    let result = results.recv_timeout(WAIT).unwrap();
    assert_eq!(cloud.accept(result), Acceptance::Accepted);
    assert_eq!(cloud.indexed_distances().parameters, newer);

    // A result computed for the initial view arrives late and is discarded.
    let late = CpuSplatRadixSorter::sort_once(cloud.splats().as_slice(), initial);
    assert_eq!(cloud.accept(late), Acceptance::Stale);
    assert_eq!(cloud.indexed_distances().parameters, newer);
}

#[test]
fn dropping_the_manager_disconnects_results() {
    let buffer = SplatBuffer::new(random_positions(64, 1));
    let (manager, results) = AsyncSortManager::new(buffer, 64, fast_config()).unwrap();
    let requester = manager.requester();
    assert!(manager.is_running());
    drop(manager);

    // Outliving requesters do not keep the worker alive.
    requester.request(orbit_camera(0.5), Mat4::IDENTITY, false);
    assert!(matches!(
        results.recv_timeout(WAIT),
        Err(RecvTimeoutError::Disconnected)
    ));
}

#[test]
fn dropped_receiver_stops_the_worker_cleanly() {
    let buffer = SplatBuffer::new(random_positions(64, 2));
    let (manager, results) = AsyncSortManager::new(buffer, 64, fast_config()).unwrap();
    drop(results);
    manager.request(orbit_camera(0.5), Mat4::IDENTITY, false);
    manager.shutdown().unwrap();
}

#[test]
fn over_capacity_sort_is_fatal_for_the_worker() {
    let buffer = SplatBuffer::new(random_positions(32, 4));
    let (manager, results) = AsyncSortManager::new(buffer, 16, fast_config()).unwrap();
    manager.request(orbit_camera(0.5), Mat4::IDENTITY, false);

    assert!(matches!(
        results.recv_timeout(WAIT),
        Err(RecvTimeoutError::Disconnected)
    ));
    match manager.shutdown() {
        Err(SortError::WorkerPanicked(message)) => {
            assert!(message.contains("cannot sort 32 splats"), "{message}");
        }
        other => panic!("expected worker panic, got {other:?}"),
    }
}
