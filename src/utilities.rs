/// Utility functions shared by the integration and interpolation layers

/// Fold `value` into `seed` the way boost's `hash_combine` does.
///
/// Table keys are built from several independent hashes (parametrization,
/// particle, target, cut, table definition). The mixing must be stable across
/// runs and platforms because the result names files on disk, so
/// `std::collections::hash_map::DefaultHasher` is not an option here.
#[inline]
pub fn hash_combine(seed: u64, value: u64) -> u64 {
    seed ^ value
        .wrapping_add(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

/// Combine an arbitrary number of hashes into one key.
pub fn hash_combine_all(values: &[u64]) -> u64 {
    values.iter().fold(0u64, |seed, &v| hash_combine(seed, v))
}

/// FNV-1a over raw bytes. Stable replacement for the std hasher.
pub fn hash_bytes(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    bytes.iter().fold(FNV_OFFSET, |h, &b| (h ^ b as u64).wrapping_mul(FNV_PRIME))
}

#[inline]
pub fn hash_f64(value: f64) -> u64 {
    hash_bytes(&value.to_bits().to_le_bytes())
}

#[inline]
pub fn hash_str(value: &str) -> u64 {
    hash_bytes(value.as_bytes())
}

#[doc(hidden)]
/// Index of the interval containing `x_new` on a sorted grid.
///
/// Returns `i` with `x[i] <= x_new < x[i+1]`, clamped to `[0, len-2]` so the
/// caller can always use `i` and `i + 1`. `x` must hold at least two values.
pub fn locate_interval(x: &[f64], x_new: f64) -> usize {
    let n = x.len();
    if x_new <= x[0] {
        return 0;
    }
    if x_new >= x[n - 1] {
        return n - 2;
    }
    // Binary search for interval: find largest i with x[i] <= x_new
    let mut low = 0usize;
    let mut high = n - 1; // invariant: target interval within (low, high]
    while high - low > 1 {
        let mid = (low + high) >> 1;
        if x[mid] <= x_new {
            low = mid;
        } else {
            high = mid;
        }
    }
    low
}
