// ==============================================================================
// histogram.rs - Profile Binning
// ==============================================================================
// Description: Splits 1-D frequency distributions into roughly even bins
// Author: Matt Barham
// Created: 2026-10-14
// Modified: 2026-10-14
// Version: 1.0.0
// ==============================================================================

/// Chunk an ascending histogram into about `n_bins` bins of similar population
///
/// `hist` holds `(lower_bound, count)` pairs sorted by `lower_bound`. The
/// result uses the same representation: each entry's key is the first value
/// in that bin and its count is the number of observations in
/// `[key, next key)`.
///
/// # Example
/// `{0: 1, 1: 2, 2: 1, 3: 1, 5: 1, 8: 1}` with 2 bins gives `{0: 4, 3: 3}`.
pub fn bin_histogram<K: Copy>(hist: &[(K, u64)], n_bins: usize) -> Vec<(K, u64)> {
    let Some(&(first_key, first_count)) = hist.first() else {
        return Vec::new();
    };
    if n_bins == 0 {
        return Vec::new();
    }

    let n_bins = n_bins as u64;
    let total: u64 = hist.iter().map(|(_, count)| count).sum();
    let bin_spacing = (total + n_bins / 2) / n_bins;

    let mut bins = Vec::new();
    let mut bin_size = first_count;
    let mut cutpoint = first_key;

    for &(key, count) in &hist[1..] {
        if bin_size >= bin_spacing {
            bins.push((cutpoint, bin_size));
            bin_size = 0;
            cutpoint = key;
        }
        bin_size += count;
    }

    if bin_size > 0 {
        bins.push((cutpoint, bin_size));
    }

    bins
}

/// Index of the last cutpoint `<= value`, if any
pub fn last_lte<T: PartialOrd>(value: T, cutpoints: &[T]) -> Option<usize> {
    let first_gt = cutpoints.partition_point(|cut| *cut <= value);
    first_gt.checked_sub(1)
}

/// Half-open range `[lower, upper)` of the bin a value falls in
///
/// `upper` is `None` for the last bin. Values below the first cutpoint fall
/// in no bin.
pub fn bin_bounds<T: PartialOrd + Copy>(value: T, cutpoints: &[T]) -> Option<(T, Option<T>)> {
    let index = last_lte(value, cutpoints)?;
    Some((cutpoints[index], cutpoints.get(index + 1).copied()))
}
