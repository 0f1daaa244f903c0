use super::settings::FilterMode;

/// Runs the filter selected by `mode` across neighbouring bins.
///
/// Every filter reads a snapshot of the bins and writes a complete new array,
/// so the result never depends on iteration direction. `scratch` must be the
/// same length as `bins`; its previous contents are ignored. A zero `range`
/// leaves the range-based filters as no-ops.
pub fn apply(mode: FilterMode, bins: &mut [f32], scratch: &mut [f32], range: usize, alpha: f32) {
    match mode {
        FilterMode::Block => block(bins, range),
        FilterMode::BoxFilter => box_filter(bins, scratch, range),
        FilterMode::DoubleBoxFilter => double_box(bins, scratch, range),
        FilterMode::WeightedFilter => weighted(bins, scratch, range),
        FilterMode::ExponentialFilter => exponential(bins, scratch, alpha),
    }
}

/// Inclusive window `[i - range, i + range]` clipped to the array.
fn window(i: usize, range: usize, len: usize) -> std::ops::RangeInclusive<usize> {
    i.saturating_sub(range)..=(i + range).min(len - 1)
}

/// Replaces each group of `range` bins with the group mean. A short final
/// group is averaged over its own length.
pub fn block(bins: &mut [f32], range: usize) {
    if range == 0 {
        return;
    }
    for group in bins.chunks_mut(range) {
        let mean = group.iter().sum::<f32>() / group.len() as f32;
        group.fill(mean);
    }
}

pub fn box_filter(bins: &mut [f32], scratch: &mut [f32], range: usize) {
    if range == 0 || bins.is_empty() {
        return;
    }
    let len = bins.len();
    for (i, out) in scratch.iter_mut().enumerate().take(len) {
        let span = window(i, range, len);
        let count = span.end() - span.start() + 1;
        *out = bins[span].iter().sum::<f32>() / count as f32;
    }
    bins.copy_from_slice(&scratch[..len]);
}

/// Two box passes; not the same as one pass with twice the range.
pub fn double_box(bins: &mut [f32], scratch: &mut [f32], range: usize) {
    box_filter(bins, scratch, range);
    box_filter(bins, scratch, range);
}

/// 1 at the centre, falling linearly to 0 at `range`.
pub fn triangular_weight(distance: usize, range: usize) -> f32 {
    1.0 - distance as f32 / range as f32
}

pub fn weighted(bins: &mut [f32], scratch: &mut [f32], range: usize) {
    if range == 0 || bins.is_empty() {
        return;
    }
    let len = bins.len();
    for (i, out) in scratch.iter_mut().enumerate().take(len) {
        let mut sum = 0.0;
        let mut weight_sum = 0.0;
        for j in window(i, range, len) {
            let weight = triangular_weight(i.abs_diff(j), range);
            sum += bins[j] * weight;
            weight_sum += weight;
        }
        *out = sum / weight_sum;
    }
    bins.copy_from_slice(&scratch[..len]);
}

/// Forward then backward first-order IIR, giving zero-phase smoothing.
/// `alpha` of 1 is the identity.
pub fn exponential(bins: &mut [f32], scratch: &mut [f32], alpha: f32) {
    let len = bins.len();
    if len == 0 {
        return;
    }
    let tmp = &mut scratch[..len];

    tmp[0] = bins[0];
    for i in 1..len {
        tmp[i] = alpha * bins[i] + (1.0 - alpha) * tmp[i - 1];
    }

    bins[len - 1] = tmp[len - 1];
    for i in (0..len - 1).rev() {
        bins[i] = alpha * tmp[i] + (1.0 - alpha) * bins[i + 1];
    }
}
