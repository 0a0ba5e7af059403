pub mod manager;
pub mod radix;
pub mod request;
pub mod sorter;
pub mod throttle;

#[cfg(test)]
mod tests;

pub use manager::{AsyncSortManager, SortRequester};
pub use radix::radix_sort;
pub use request::{SortParameters, SplatIndices};
pub use sorter::CpuSplatRadixSorter;
pub use throttle::Throttle;

/// One splat's slot in the splat buffer and its signed camera-space depth for
/// a single sort request.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[repr(C)]
pub struct IndexedDistance {
    pub index: u32,
    pub distance_to_camera: f32,
}

impl IndexedDistance {
    pub fn new(index: u32, distance_to_camera: f32) -> Self {
        Self {
            index,
            distance_to_camera,
        }
    }
}

/// Types that can be ordered by [`radix_sort`]: a 32-bit key read one byte
/// at a time.
pub trait RadixSortable: Copy {
    fn key(&self, shift: u32) -> u8;
}

impl RadixSortable for IndexedDistance {
    fn key(&self, shift: u32) -> u8 {
        (float_sort_key(self.distance_to_camera) >> shift) as u8
    }
}

impl RadixSortable for u32 {
    fn key(&self, shift: u32) -> u8 {
        (*self >> shift) as u8
    }
}

/// Maps an `f32` to a `u32` whose unsigned order matches the float's numeric
/// order: negatives get every bit flipped, non-negatives only the sign bit.
#[inline]
pub fn float_sort_key(value: f32) -> u32 {
    const SIGN_MASK: u32 = 0x8000_0000;
    let bits = value.to_bits();
    if bits & SIGN_MASK != 0 {
        !bits
    } else {
        bits ^ SIGN_MASK
    }
}
