use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use log::warn;

use crate::sort::{CpuSplatRadixSorter, SortParameters, SplatIndices};
use crate::splat::SortableSplat;

static NEXT_BUFFER_ID: AtomicU64 = AtomicU64::new(1);

/// Immutable, shareable splat storage with a stable identity.
///
/// Clones share both the data and the id; equality compares ids only.
#[derive(Debug)]
pub struct SplatBuffer<S> {
    id: u64,
    splats: Arc<[S]>,
}

impl<S> SplatBuffer<S> {
    pub fn new(splats: Vec<S>) -> Self {
        Self {
            id: NEXT_BUFFER_ID.fetch_add(1, Ordering::Relaxed),
            splats: splats.into(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn as_slice(&self) -> &[S] {
        &self.splats
    }

    pub fn len(&self) -> usize {
        self.splats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splats.is_empty()
    }
}

impl<S> Clone for SplatBuffer<S> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            splats: Arc::clone(&self.splats),
        }
    }
}

impl<S> PartialEq for SplatBuffer<S> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<S> Eq for SplatBuffer<S> {}

impl<S> From<Vec<S>> for SplatBuffer<S> {
    fn from(splats: Vec<S>) -> Self {
        Self::new(splats)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Acceptance {
    Accepted,
    /// Older than the order on display; discarded.
    Stale,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainOutcome {
    pub accepted: usize,
    pub stale: usize,
    /// The sort worker is gone; no further results will arrive.
    pub disconnected: bool,
}

/// A loaded point set plus the order it is currently drawn in.
#[derive(Debug)]
pub struct SplatCloud<S> {
    splats: SplatBuffer<S>,
    indexed_distances: SplatIndices,
    pub label: Option<String>,
}

impl<S: SortableSplat> SplatCloud<S> {
    pub fn new(splats: SplatBuffer<S>, indexed_distances: SplatIndices) -> Self {
        Self {
            splats,
            indexed_distances,
            label: None,
        }
    }

    /// Builds a cloud whose initial order is sorted synchronously for `parameters`.
    pub fn sorted(splats: SplatBuffer<S>, parameters: SortParameters) -> Self {
        let indexed_distances = CpuSplatRadixSorter::sort_once(splats.as_slice(), parameters);
        Self::new(splats, indexed_distances)
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn splats(&self) -> &SplatBuffer<S> {
        &self.splats
    }

    pub fn indexed_distances(&self) -> &SplatIndices {
        &self.indexed_distances
    }

    pub fn len(&self) -> usize {
        self.splats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.splats.is_empty()
    }

    /// Swaps in `result` unless it is older than the order on display.
    pub fn accept(&mut self, result: SplatIndices) -> Acceptance {
        let current = self.indexed_distances.parameters.time;
        if result.parameters.time < current {
            warn!(
                "out of order sort for {}: result is {:?} older than the displayed order",
                self.label.as_deref().unwrap_or("splat cloud"),
                current.duration_since(result.parameters.time)
            );
            return Acceptance::Stale;
        }
        self.indexed_distances = result;
        Acceptance::Accepted
    }

    /// Applies every result already waiting on `results` without blocking.
    pub fn drain(&mut self, results: &Receiver<SplatIndices>) -> DrainOutcome {
        let mut outcome = DrainOutcome::default();
        loop {
            match results.try_recv() {
                Ok(result) => match self.accept(result) {
                    Acceptance::Accepted => outcome.accepted += 1,
                    Acceptance::Stale => outcome.stale += 1,
                },
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    outcome.disconnected = true;
                    break;
                }
            }
        }
        outcome
    }
}

impl<S> PartialEq for SplatCloud<S> {
    fn eq(&self, other: &Self) -> bool {
        self.splats == other.splats && self.indexed_distances.same_buffer(&other.indexed_distances)
    }
}
