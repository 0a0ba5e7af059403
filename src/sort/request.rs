use std::sync::Arc;
use std::time::Instant;

use glam::Mat4;

use super::IndexedDistance;

/// Everything that determines one depth ordering.
///
/// Equality ignores `time`: two requests for the same view are the same sort.
/// `time` only orders results for staleness checks.
#[derive(Debug, Clone, Copy)]
pub struct SortParameters {
    pub time: Instant,
    pub camera: Mat4,
    pub model: Mat4,
    pub reversed: bool,
}

impl SortParameters {
    pub fn new(camera: Mat4, model: Mat4, reversed: bool) -> Self {
        Self::at(Instant::now(), camera, model, reversed)
    }

    pub fn at(time: Instant, camera: Mat4, model: Mat4, reversed: bool) -> Self {
        Self {
            time,
            camera,
            model,
            reversed,
        }
    }
}

impl PartialEq for SortParameters {
    fn eq(&self, other: &Self) -> bool {
        self.camera == other.camera && self.model == other.model && self.reversed == other.reversed
    }
}

/// A finished sort: the parameters that produced it and the resulting order.
#[derive(Debug, Clone)]
pub struct SplatIndices {
    pub parameters: SortParameters,
    pub indices: Arc<[IndexedDistance]>,
}

impl SplatIndices {
    pub fn new(parameters: SortParameters, indices: Vec<IndexedDistance>) -> Self {
        Self {
            parameters,
            indices: indices.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Splat slots in draw order.
    pub fn order(&self) -> impl Iterator<Item = u32> + '_ {
        self.indices.iter().map(|d| d.index)
    }

    /// True when both values share the same index allocation.
    pub fn same_buffer(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.indices, &other.indices)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn equality_ignores_time() {
        let base = Instant::now();
        let camera = Mat4::from_translation(glam::Vec3::new(0.0, 0.0, 5.0));
        let a = SortParameters::at(base, camera, Mat4::IDENTITY, false);
        let b = SortParameters::at(base + Duration::from_secs(3), camera, Mat4::IDENTITY, false);
        assert_eq!(a, b);
        assert_ne!(a, SortParameters::at(base, camera, Mat4::IDENTITY, true));
        assert_ne!(a, SortParameters::at(base, Mat4::IDENTITY, Mat4::IDENTITY, false));
    }

    #[test]
    fn clones_share_the_index_buffer() {
        let params = SortParameters::new(Mat4::IDENTITY, Mat4::IDENTITY, false);
        let a = SplatIndices::new(params, vec![IndexedDistance::new(0, 1.0)]);
        let b = a.clone();
        let c = SplatIndices::new(params, vec![IndexedDistance::new(0, 1.0)]);
        assert!(a.same_buffer(&b));
        assert!(!a.same_buffer(&c));
    }
}
