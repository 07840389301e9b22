// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Band-edge frequency-locked loop.
//!
//! Two complex FIR filters sit on the upper and lower band edges of the
//! matched spectrum; the power difference between them is the frequency
//! error. The filter design matches the GNU Radio `fll_band_edge_cc`
//! convention (rolloff-parameterized sinc pair, `n_taps = 2*sps + 1`),
//! and the lower band edge is the conjugate of the upper by
//! construction.

use crate::dsp::math::sinc;

/// Band-edge FLL state: filter taps plus NCO/loop state.
pub struct FllBandEdge {
    pub sps: u32,
    pub n_taps: usize,
    pub taps_upper_r: Vec<f32>,
    pub taps_upper_i: Vec<f32>,
    pub taps_lower_r: Vec<f32>,
    pub taps_lower_i: Vec<f32>,
    /// NCO phase (radians) and frequency (radians/sample).
    pub phase: f32,
    pub freq: f32,
    alpha: f32,
    beta: f32,
    max_freq: f32,
    hist: Vec<f32>,
    ext: Vec<f32>,
}

impl FllBandEdge {
    /// Design for `sps` samples/symbol with the standard 0.2 rolloff.
    pub fn new(sps: u32) -> Self {
        Self::with_rolloff(sps, 0.2)
    }

    /// Rolloff-parameterized design; `n_taps = 2*sps + 1`.
    pub fn with_rolloff(sps: u32, rolloff: f64) -> Self {
        let sps = sps.max(1);
        let filter_size = (2 * sps + 1) as usize;
        let spsf = f64::from(sps);

        let m = (filter_size as f64 / spsf).round();
        let mut bb = Vec::with_capacity(filter_size);
        let mut power = 0.0f64;
        for i in 0..filter_size {
            let k = -m + i as f64 * 2.0 / spsf;
            let tap = sinc(rolloff * k - 0.5) + sinc(rolloff * k + 0.5);
            power += tap;
            bb.push(tap);
        }

        let mut up_r = vec![0.0f32; filter_size];
        let mut up_i = vec![0.0f32; filter_size];
        let mut lo_r = vec![0.0f32; filter_size];
        let mut lo_i = vec![0.0f32; filter_size];
        let n = (filter_size as f64 - 1.0) / 2.0;
        for i in 0..filter_size {
            let tap = bb[i] / power;
            let k = (-n + i as f64) / (2.0 * spsf);
            let w = 2.0 * std::f64::consts::PI * (1.0 + rolloff) * k;
            // Upper edge spins up, lower spins down; reversed for FIR form.
            let slot = filter_size - i - 1;
            lo_r[slot] = (tap * w.cos()) as f32;
            lo_i[slot] = (tap * (-w).sin()) as f32;
            up_r[slot] = lo_r[slot];
            up_i[slot] = -lo_i[slot];
        }

        // Loop constants from a 2nd-order loop at bw ~ 2pi/100.
        let loop_bw = 2.0 * std::f32::consts::PI / 100.0;
        let damping = std::f32::consts::FRAC_1_SQRT_2 * 2.0;
        let denom = 1.0 + 2.0 * damping * loop_bw + loop_bw * loop_bw;
        let alpha = (4.0 * damping * loop_bw) / denom;
        let beta = (4.0 * loop_bw * loop_bw) / denom;

        Self {
            sps,
            n_taps: filter_size,
            taps_upper_r: up_r,
            taps_upper_i: up_i,
            taps_lower_r: lo_r,
            taps_lower_i: lo_i,
            phase: 0.0,
            freq: 0.0,
            alpha,
            beta,
            max_freq: 2.0 * std::f32::consts::PI * 0.25,
            hist: vec![0.0; 2 * (filter_size - 1)],
            ext: Vec::new(),
        }
    }

    /// Mix the block by the NCO and update the loop from the band-edge
    /// power difference. Operates in place on interleaved I/Q.
    pub fn process(&mut self, iq: &mut [f32]) {
        let pairs = iq.len() / 2;
        if pairs == 0 {
            return;
        }

        // Rotate by the NCO first so the band-edge filters see corrected
        // spectrum, then measure on the rotated signal.
        for nn in 0..pairs {
            let (s, c) = self.phase.sin_cos();
            let i = iq[2 * nn];
            let q = iq[2 * nn + 1];
            iq[2 * nn] = i * c - q * s;
            iq[2 * nn + 1] = i * s + q * c;

            self.phase += self.freq;
            while self.phase > std::f32::consts::PI {
                self.phase -= 2.0 * std::f32::consts::PI;
            }
            while self.phase < -std::f32::consts::PI {
                self.phase += 2.0 * std::f32::consts::PI;
            }
        }

        // Error from the last fully-covered sample of the block.
        let hist_pairs = self.n_taps - 1;
        self.ext.clear();
        self.ext.extend_from_slice(&self.hist);
        self.ext.extend_from_slice(iq);
        let ext_pairs = self.ext.len() / 2;
        if ext_pairs >= self.n_taps {
            let base = ext_pairs - self.n_taps;
            let mut up = (0.0f32, 0.0f32);
            let mut lo = (0.0f32, 0.0f32);
            for j in 0..self.n_taps {
                let xi = self.ext[2 * (base + j)];
                let xq = self.ext[2 * (base + j) + 1];
                up.0 += xi * self.taps_upper_r[j] - xq * self.taps_upper_i[j];
                up.1 += xi * self.taps_upper_i[j] + xq * self.taps_upper_r[j];
                lo.0 += xi * self.taps_lower_r[j] - xq * self.taps_lower_i[j];
                lo.1 += xi * self.taps_lower_i[j] + xq * self.taps_lower_r[j];
            }
            let error = (lo.0 * lo.0 + lo.1 * lo.1) - (up.0 * up.0 + up.1 * up.1);
            self.freq += self.beta * error;
            self.phase += self.alpha * error;
            if self.freq > self.max_freq {
                self.freq = self.max_freq;
            } else if self.freq < -self.max_freq {
                self.freq = -self.max_freq;
            }
        }
        if self.ext.len() >= 2 * hist_pairs {
            let tail = self.ext.len() - 2 * hist_pairs;
            self.hist.clear();
            self.hist.extend_from_slice(&self.ext[tail..]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tap_count_and_conjugate_pair() {
        for sps in [4u32, 5] {
            let f = FllBandEdge::new(sps);
            assert_eq!(f.n_taps, (2 * sps + 1) as usize);
            for j in 0..f.n_taps {
                assert!((f.taps_lower_r[j] - f.taps_upper_r[j]).abs() < 1e-6);
                assert!((f.taps_lower_i[j] + f.taps_upper_i[j]).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_center_tap_imag_zero() {
        // The center of the spun filter sits at k=0 => purely real tap.
        let f = FllBandEdge::new(5);
        let c = f.n_taps / 2;
        assert!(f.taps_upper_i[c].abs() < 1e-6);
    }

    #[test]
    fn test_taps_real_part_symmetric() {
        let f = FllBandEdge::new(5);
        let n = f.n_taps;
        for j in 0..n / 2 {
            assert!(
                (f.taps_upper_r[j] - f.taps_upper_r[n - 1 - j]).abs() < 1e-6,
                "real part must be even-symmetric"
            );
            assert!(
                (f.taps_upper_i[j] + f.taps_upper_i[n - 1 - j]).abs() < 1e-6,
                "imag part must be odd-symmetric"
            );
        }
    }

    #[test]
    fn test_process_preserves_length_and_runs() {
        let mut f = FllBandEdge::new(5);
        let mut iq = vec![0.1f32; 128];
        f.process(&mut iq);
        assert_eq!(iq.len(), 128);
        assert!(f.freq.abs() <= f.max_freq);
    }
}
