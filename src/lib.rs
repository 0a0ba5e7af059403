//! Background depth ordering for Gaussian Splatting renderers.
//!
//! A [`sort::AsyncSortManager`] owns a CPU radix sorter on its own thread.
//! Camera movement feeds it [`sort::SortParameters`]; requests are
//! de-duplicated and throttled, and finished orders come back as
//! [`sort::SplatIndices`] that a [`cloud::SplatCloud`] accepts only if they
//! are not older than the order it is already drawing.

pub mod camera;
pub mod cloud;
pub mod config;
pub mod demo;
pub mod error;
pub mod parser;
pub mod sort;
pub mod splat;

pub use cloud::{Acceptance, SplatBuffer, SplatCloud};
pub use config::SortConfig;
pub use error::{LoadError, SortError};
pub use sort::{
    AsyncSortManager, CpuSplatRadixSorter, IndexedDistance, SortParameters, SplatIndices,
};
pub use splat::{SortableSplat, Splat};
