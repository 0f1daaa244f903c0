/// Weight of the first coefficient; grows linearly with index.
const LEAKAGE_FLOOR: f32 = 0.04;
const LEAKAGE_SLOPE: f32 = 0.5;

const LOG_WEIGHT: f32 = 0.7;
const LINEAR_WEIGHT: f32 = 0.7;

/// Display bins fed by one coefficient pair.
pub const BAR_WIDTH: usize = 4;

pub fn leakage_weight(index: usize, len: usize) -> f32 {
    LEAKAGE_FLOOR + LEAKAGE_SLOPE * (index as f32 / len as f32)
}

/// Replaces the zero-frequency pair with its neighbour.
pub fn suppress_dc(coeffs: &mut [f32]) {
    coeffs[0] = coeffs[2];
    coeffs[1] = coeffs[3];
}

pub fn apply_leakage_correction(coeffs: &mut [f32]) {
    let len = coeffs.len();
    for (i, c) in coeffs.iter_mut().enumerate() {
        *c *= leakage_weight(i, len);
    }
}

/// Log + linear curve clamped to [0, 1]. Zero maps to 0.
pub fn compress(magnitude: f32) -> f32 {
    let curved = LOG_WEIGHT * (1.1 * magnitude).log10() + LINEAR_WEIGHT * magnitude;
    curved.clamp(0.0, 1.0)
}

/// Rises immediately, falls by `decay_factor` per tick.
///
/// Results below the smallest normal float snap to 0; repeated decay of a
/// subnormal would otherwise settle on it forever.
pub fn attack_decay(magnitude: f32, previous: f32, decay_factor: f32) -> f32 {
    let next = if magnitude > previous {
        magnitude
    } else if magnitude < previous {
        previous * decay_factor
    } else {
        previous
    };
    if next < f32::MIN_POSITIVE {
        0.0
    } else {
        next
    }
}

/// Merges one tick's coefficients into `bins`.
///
/// The packed `(re, im)` pairs are corrected for low-frequency leakage,
/// reduced to a magnitude, compressed onto a perceptual curve and merged
/// with the previous frame using instant attack and percentage decay.
/// `coeffs` is consumed as scratch. Only the lower half of the packed pairs
/// is used: pair `k` lands on bins `4k..4k+4`, which covers all of `bins`.
pub fn fuse(coeffs: &mut [f32], bins: &mut [f32], decay_factor: f32) {
    debug_assert_eq!(coeffs.len(), bins.len());
    suppress_dc(coeffs);
    apply_leakage_correction(coeffs);

    let n = bins.len();
    for i in (0..n / 2).step_by(2) {
        let magnitude = compress(coeffs[i].hypot(coeffs[i + 1]));
        let slot = i * 2;
        let value = attack_decay(magnitude, bins[slot], decay_factor);
        bins[slot..slot + BAR_WIDTH].fill(value);
    }
}
