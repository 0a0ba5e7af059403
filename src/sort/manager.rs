use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{
    self, Receiver, RecvTimeoutError, Sender, SyncSender, TryRecvError, TrySendError,
};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use glam::Mat4;
use log::{debug, error, warn};

use super::{CpuSplatRadixSorter, SortParameters, SplatIndices, Throttle};
use crate::cloud::SplatBuffer;
use crate::config::SortConfig;
use crate::error::SortError;
use crate::splat::SortableSplat;

const PUBLISH_RETRY: Duration = Duration::from_millis(1);

#[derive(Debug)]
enum SortCommand {
    Sort(SortParameters),
    Shutdown,
}

/// Cloneable, non-blocking entry point for sort requests.
#[derive(Debug, Clone)]
pub struct SortRequester {
    tx: Sender<SortCommand>,
}

impl SortRequester {
    /// Queues `parameters` for the worker. Never blocks.
    pub fn request_sort(&self, parameters: SortParameters) {
        if self.tx.send(SortCommand::Sort(parameters)).is_err() {
            debug!("sort request dropped: worker has stopped");
        }
    }

    /// Queues a request stamped with the current time.
    pub fn request(&self, camera: Mat4, model: Mat4, reversed: bool) {
        self.request_sort(SortParameters::new(camera, model, reversed));
    }
}

/// Runs depth sorts for one splat buffer on a dedicated thread.
///
/// The worker owns the sorter and its scratch memory. Requests are
/// de-duplicated and throttled before sorting; finished sorts are published
/// on the receiver returned by [`AsyncSortManager::new`]. Dropping the
/// manager stops the worker and waits for it.
#[derive(Debug)]
pub struct AsyncSortManager {
    requester: SortRequester,
    cancelled: Arc<AtomicBool>,
    sorts_run: Arc<AtomicU64>,
    worker: Option<JoinHandle<()>>,
}

impl AsyncSortManager {
    /// # Panics
    ///
    /// If `capacity` is zero. A worker asked to sort more splats than
    /// `capacity` panics on its own thread; the panic is reported by
    /// [`AsyncSortManager::shutdown`].
    pub fn new<S: SortableSplat>(
        splats: SplatBuffer<S>,
        capacity: usize,
        config: SortConfig,
    ) -> Result<(Self, Receiver<SplatIndices>), SortError> {
        let (request_tx, request_rx) = mpsc::channel();
        let (result_tx, result_rx) = mpsc::sync_channel(config.result_capacity.max(1));
        let cancelled = Arc::new(AtomicBool::new(false));
        let sorts_run = Arc::new(AtomicU64::new(0));

        let worker = SortWorker {
            splats,
            sorter: CpuSplatRadixSorter::new(capacity),
            throttle: Throttle::new(config.throttle_interval),
            sort_budget: config.sort_budget,
            requests: request_rx,
            results: result_tx,
            cancelled: Arc::clone(&cancelled),
            sorts_run: Arc::clone(&sorts_run),
        };
        let handle = thread::Builder::new()
            .name("splat-sort".to_string())
            .spawn(move || worker.run())
            .map_err(SortError::Spawn)?;

        let manager = Self {
            requester: SortRequester { tx: request_tx },
            cancelled,
            sorts_run,
            worker: Some(handle),
        };
        Ok((manager, result_rx))
    }

    pub fn requester(&self) -> SortRequester {
        self.requester.clone()
    }

    pub fn request_sort(&self, parameters: SortParameters) {
        self.requester.request_sort(parameters);
    }

    pub fn request(&self, camera: Mat4, model: Mat4, reversed: bool) {
        self.requester.request(camera, model, reversed);
    }

    /// Sorts the worker has completed so far.
    pub fn sorts_run(&self) -> u64 {
        self.sorts_run.load(Ordering::Acquire)
    }

    pub fn is_running(&self) -> bool {
        self.worker.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the worker and waits for it, surfacing a worker panic.
    pub fn shutdown(mut self) -> Result<(), SortError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), SortError> {
        let Some(handle) = self.worker.take() else {
            return Ok(());
        };
        self.cancelled.store(true, Ordering::Release);
        // Wakes a worker parked in recv even if requesters are still alive.
        let _ = self.requester.tx.send(SortCommand::Shutdown);
        handle
            .join()
            .map_err(|payload| SortError::WorkerPanicked(panic_message(payload.as_ref())))
    }
}

impl Drop for AsyncSortManager {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            error!("sort worker ended abnormally: {err}");
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}

struct SortWorker<S> {
    splats: SplatBuffer<S>,
    sorter: CpuSplatRadixSorter,
    throttle: Throttle<SortParameters>,
    sort_budget: Duration,
    requests: Receiver<SortCommand>,
    results: SyncSender<SplatIndices>,
    cancelled: Arc<AtomicBool>,
    sorts_run: Arc<AtomicU64>,
}

impl<S: SortableSplat> SortWorker<S> {
    fn run(mut self) {
        match self.sort_loop() {
            Ok(()) => debug!("sort worker finished"),
            Err(err) if err.is_shutdown() => debug!("sort worker stopped: {err}"),
            Err(err) => error!("failed to sort splats: {err}"),
        }
    }

    fn sort_loop(&mut self) -> Result<(), SortError> {
        loop {
            match self.throttle.wait_time(Instant::now()) {
                None => {
                    let command = self.requests.recv().map_err(|_| SortError::Cancelled)?;
                    self.handle(command)?;
                }
                Some(wait) if wait.is_zero() => {}
                Some(wait) => match self.requests.recv_timeout(wait) {
                    Ok(command) => self.handle(command)?,
                    Err(RecvTimeoutError::Timeout) => {}
                    Err(RecvTimeoutError::Disconnected) => return Err(SortError::Cancelled),
                },
            }

            self.drain_requests()?;

            if let Some(parameters) = self.throttle.poll(Instant::now()) {
                self.sort_and_publish(parameters)?;
            }
        }
    }

    /// Feeds every queued command into the throttle without blocking.
    fn drain_requests(&mut self) -> Result<(), SortError> {
        loop {
            match self.requests.try_recv() {
                Ok(command) => self.handle(command)?,
                Err(TryRecvError::Empty) => return Ok(()),
                Err(TryRecvError::Disconnected) => return Err(SortError::Cancelled),
            }
        }
    }

    fn handle(&mut self, command: SortCommand) -> Result<(), SortError> {
        match command {
            SortCommand::Sort(parameters) => {
                self.throttle.offer(parameters);
                Ok(())
            }
            SortCommand::Shutdown => Err(SortError::Cancelled),
        }
    }

    fn sort_and_publish(&mut self, parameters: SortParameters) -> Result<(), SortError> {
        let start = Instant::now();
        let indices = self.sorter.sort(
            self.splats.as_slice(),
            parameters.camera,
            parameters.model,
            parameters.reversed,
        );
        let elapsed = start.elapsed();
        if elapsed > self.sort_budget {
            warn!(
                "sort of {} splats took longer than expected ({:.2} ms, {:.1}x budget)",
                indices.len(),
                elapsed.as_secs_f64() * 1000.0,
                elapsed.as_secs_f64() / self.sort_budget.as_secs_f64().max(f64::EPSILON)
            );
        }
        self.sorts_run.fetch_add(1, Ordering::AcqRel);
        self.publish(SplatIndices::new(parameters, indices))
    }

    /// Waits for room on the result channel. Requests arriving meanwhile
    /// still collapse in the throttle, so the request queue stays short.
    fn publish(&mut self, mut result: SplatIndices) -> Result<(), SortError> {
        loop {
            if self.cancelled.load(Ordering::Acquire) {
                return Err(SortError::Cancelled);
            }
            match self.results.try_send(result) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(back)) => {
                    result = back;
                    self.drain_requests()?;
                    thread::sleep(PUBLISH_RETRY);
                }
                Err(TrySendError::Disconnected(_)) => return Err(SortError::ResultChannelClosed),
            }
        }
    }
}
