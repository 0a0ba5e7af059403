use super::RadixSortable;

const RADIX_BUCKETS: usize = 256;
const KEY_SHIFTS: [u32; 4] = [0, 8, 16, 24];

/// Least-significant-digit radix sort over the four bytes of each element's
/// key, ascending.
///
/// Passes alternate `input -> temp -> input -> temp -> input`, so the sorted
/// elements end up back in `input`. Each pass is a stable counting sort.
/// `temp` is scratch and must be at least as long as `input`.
pub fn radix_sort<T: RadixSortable>(input: &mut [T], temp: &mut [T]) {
    let len = input.len();
    if len <= 1 {
        return;
    }
    assert!(
        temp.len() >= len,
        "radix sort scratch too small ({} for {len} elements)",
        temp.len()
    );
    let temp = &mut temp[..len];

    let mut in_input = true;
    for shift in KEY_SHIFTS {
        if in_input {
            counting_pass(input, temp, shift);
        } else {
            counting_pass(temp, input, shift);
        }
        in_input = !in_input;
    }
    debug_assert!(in_input);
}

fn counting_pass<T: RadixSortable>(src: &[T], dst: &mut [T], shift: u32) {
    let mut offsets = [0usize; RADIX_BUCKETS];
    for item in src {
        offsets[item.key(shift) as usize] += 1;
    }

    let mut running = 0usize;
    for slot in offsets.iter_mut() {
        let count = *slot;
        *slot = running;
        running += count;
    }

    for item in src {
        let bucket = item.key(shift) as usize;
        dst[offsets[bucket]] = *item;
        offsets[bucket] += 1;
    }
}
