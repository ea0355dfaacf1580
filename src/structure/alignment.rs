// Mon Oct 19 2026 - Alex

/// Round `value` up to the next multiple of `alignment`.
///
/// Alignments of 0 or 1 leave the value unchanged; overflow saturates at `u64::MAX`.
pub fn align_up(value: u64, alignment: u64) -> u64 {
    if alignment <= 1 {
        return value;
    }
    match value.checked_add(alignment - 1) {
        Some(sum) => (sum / alignment) * alignment,
        None => u64::MAX,
    }
}

/// Alignment a scalar of `size` bytes gets under the usual C ABIs.
pub fn natural_align(size: u64, max_align: u64) -> u64 {
    if size == 0 {
        return 1;
    }
    size.next_power_of_two().min(max_align.max(1))
}

/// Largest power of two dividing `value`, capped at `cap`. Zero is divisible by anything.
pub fn pow2_divisor(value: u64, cap: u64) -> u64 {
    let cap = cap.max(1);
    if value == 0 {
        return cap;
    }
    (1u64 << value.trailing_zeros()).min(cap)
}

pub fn is_aligned(offset: u64, alignment: u64) -> bool {
    alignment <= 1 || offset % alignment == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_up() {
        assert_eq!(align_up(0, 4), 0);
        assert_eq!(align_up(1, 4), 4);
        assert_eq!(align_up(5, 4), 8);
        assert_eq!(align_up(10, 0), 10);
        assert_eq!(align_up(4, 3), 6);
        assert_eq!(align_up(u64::MAX - 5, 16), u64::MAX);
    }

    #[test]
    fn test_natural_align() {
        assert_eq!(natural_align(1, 16), 1);
        assert_eq!(natural_align(3, 16), 4);
        assert_eq!(natural_align(8, 16), 8);
        assert_eq!(natural_align(32, 16), 16);
        assert_eq!(natural_align(0, 16), 1);
    }

    #[test]
    fn test_pow2_divisor() {
        assert_eq!(pow2_divisor(6, 8), 2);
        assert_eq!(pow2_divisor(24, 8), 8);
        assert_eq!(pow2_divisor(5, 8), 1);
        assert_eq!(pow2_divisor(0, 4), 4);
    }
}
