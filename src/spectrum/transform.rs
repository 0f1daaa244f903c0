use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Midpoint of unsigned 8-bit PCM, i.e. silence.
const PCM_CENTER: f32 = 128.0;

/// Recenters 8-bit samples around zero and applies the user gain
/// (`amp_scalar / 128`).
pub fn prescale(block: &[u8], amp_scalar: u32, out: &mut [f32]) {
    debug_assert_eq!(block.len(), out.len());
    let gain = amp_scalar as f32 / PCM_CENTER;
    for (dst, &sample) in out.iter_mut().zip(block) {
        *dst = (sample as f32 - PCM_CENTER) * gain;
    }
}

pub fn is_valid_size(size: usize) -> bool {
    size >= 4 && size.is_power_of_two()
}

/// Forward transform of a real N-sample buffer.
///
/// Output is N floats holding the N/2 non-negative-frequency bins as
/// interleaved `(re, im)` pairs, scaled by `1/N`. All buffers are allocated
/// once here and reused on every call.
pub struct RealTransform {
    size: usize,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl RealTransform {
    pub fn new(size: usize) -> Self {
        let mut planner = FftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];
        Self {
            size,
            fft,
            buffer: vec![Complex::new(0.0, 0.0); size],
            scratch,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn process(&mut self, input: &[f32], out: &mut [f32]) {
        debug_assert_eq!(input.len(), self.size);
        debug_assert_eq!(out.len(), self.size);

        for (c, &x) in self.buffer.iter_mut().zip(input) {
            *c = Complex::new(x, 0.0);
        }
        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let norm = 1.0 / self.size as f32;
        for (pair, c) in out.chunks_exact_mut(2).zip(&self.buffer[..self.size / 2]) {
            pair[0] = c.re * norm;
            pair[1] = c.im * norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn prescale_centers_silence() {
        let block = [128u8; 16];
        let mut out = [1.0f32; 16];
        prescale(&block, 5000, &mut out);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn prescale_applies_gain() {
        let block = [0u8, 128, 255];
        let mut out = [0.0f32; 3];
        prescale(&block, 128, &mut out);
        assert_eq!(out, [-128.0, 0.0, 127.0]);

        prescale(&block, 256, &mut out);
        assert_eq!(out, [-256.0, 0.0, 254.0]);

        prescale(&block, 0, &mut out);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn valid_sizes() {
        assert!(is_valid_size(256));
        assert!(is_valid_size(4));
        assert!(!is_valid_size(2));
        assert!(!is_valid_size(0));
        assert!(!is_valid_size(300));
    }

    #[test]
    fn zero_input_gives_zero_coefficients() {
        let mut transform = RealTransform::new(64);
        let input = vec![0.0f32; 64];
        let mut out = vec![1.0f32; 64];
        transform.process(&input, &mut out);
        assert!(out.iter().all(|&x| x == 0.0));
    }

    #[test]
    fn constant_input_lands_in_dc() {
        let mut transform = RealTransform::new(32);
        let input = vec![0.5f32; 32];
        let mut out = vec![0.0f32; 32];
        transform.process(&input, &mut out);
        assert_abs_diff_eq!(out[0], 0.5, epsilon = 1e-6);
        for &x in &out[1..] {
            assert_abs_diff_eq!(x, 0.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn sine_lands_in_its_bin() {
        let n = 128;
        let k = 5;
        let input: Vec<f32> = (0..n)
            .map(|i| (2.0 * std::f32::consts::PI * k as f32 * i as f32 / n as f32).sin())
            .collect();
        let mut transform = RealTransform::new(n);
        let mut out = vec![0.0f32; n];
        transform.process(&input, &mut out);

        let magnitude = |bin: usize| out[bin * 2].hypot(out[bin * 2 + 1]);
        assert_abs_diff_eq!(magnitude(k), 0.5, epsilon = 1e-4);
        assert_abs_diff_eq!(magnitude(k + 3), 0.0, epsilon = 1e-4);
    }
}
