use glam::Mat4;
use rayon::prelude::*;

use super::radix::radix_sort;
use super::{IndexedDistance, SortParameters, SplatIndices};
use crate::splat::SortableSplat;

/// Orders splats by camera-space depth on the CPU.
///
/// The scratch buffer is sized once for `capacity` splats and reused by every
/// call; each call hands back a freshly allocated result so buffers the
/// renderer is still reading are never touched.
#[derive(Debug)]
pub struct CpuSplatRadixSorter {
    capacity: usize,
    scratch: Vec<IndexedDistance>,
    passes_run: u64,
}

impl CpuSplatRadixSorter {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sorter capacity must be non-zero");
        Self {
            capacity,
            scratch: vec![IndexedDistance::default(); capacity],
            passes_run: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of times the radix sort has actually run.
    pub fn passes_run(&self) -> u64 {
        self.passes_run
    }

    /// Sorts `splats` ascending by `z` in the space of `inverse(camera) * model`,
    /// negated when `reversed` is set.
    ///
    /// # Panics
    ///
    /// If `splats` holds more elements than this sorter was built for.
    pub fn sort<S: SortableSplat>(
        &mut self,
        splats: &[S],
        camera: Mat4,
        model: Mat4,
        reversed: bool,
    ) -> Vec<IndexedDistance> {
        if splats.is_empty() {
            return Vec::new();
        }
        assert!(
            splats.len() <= self.capacity,
            "cannot sort {} splats with a sorter sized for {}",
            splats.len(),
            self.capacity
        );

        let model_view = camera.inverse() * model;
        let sign = if reversed { -1.0 } else { 1.0 };

        let mut indexed = vec![IndexedDistance::default(); splats.len()];
        indexed
            .par_iter_mut()
            .zip(splats.par_iter())
            .enumerate()
            .for_each(|(index, (slot, splat))| {
                let position = model_view * splat.float_position().extend(1.0);
                *slot = IndexedDistance::new(index as u32, position.z * sign);
            });

        radix_sort(&mut indexed, &mut self.scratch);
        self.passes_run += 1;
        indexed
    }

    /// One-shot sort with a sorter sized exactly to `splats`.
    pub fn sort_once<S: SortableSplat>(splats: &[S], parameters: SortParameters) -> SplatIndices {
        let indices = if splats.is_empty() {
            Vec::new()
        } else {
            Self::new(splats.len()).sort(
                splats,
                parameters.camera,
                parameters.model,
                parameters.reversed,
            )
        };
        SplatIndices::new(parameters, indices)
    }
}
