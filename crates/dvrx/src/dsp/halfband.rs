// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Half-band decimate-by-2 filters (real and complex).
//!
//! Odd-length symmetric low-pass with every odd-indexed tap zero except
//! the center (0.5). The zero taps and the fold-pair symmetry halve the
//! multiply count. A left-wing history of `taps - 1` samples is carried
//! across blocks so block boundaries are seamless.
//!
//! Taps are designed at construction (windowed sinc, Hamming) and
//! normalized to exactly unity DC gain, so a constant input emerges
//! within float rounding of itself once the history has warmed up.

/// Supported half-band lengths.
pub const HB_TAPS_SHORT: usize = 15;
pub const HB_TAPS_MID: usize = 23;
pub const HB_TAPS_LONG: usize = 31;

/// Design a half-band prototype: odd length, odd taps zero, center 0.5,
/// remaining even taps normalized so the total sums to 1.
fn design(len: usize) -> Vec<f32> {
    assert!(len % 2 == 1 && len >= 7, "half-band length must be odd >= 7");
    let center = (len - 1) / 2;
    let mut taps = vec![0.0f64; len];
    taps[center] = 0.5;
    // Windowed-sinc on the odd offsets; even off-center taps stay zero.
    let mut wing_sum = 0.0f64;
    for n in 0..len {
        let k = n as i64 - center as i64;
        if k != 0 && k % 2 != 0 {
            let window =
                0.54 - 0.46 * (2.0 * std::f64::consts::PI * n as f64 / (len - 1) as f64).cos();
            taps[n] = 0.5 * crate::dsp::math::sinc(k as f64 / 2.0) * window;
            wing_sum += taps[n];
        }
    }
    // Unity DC gain: wings must sum to exactly 0.5.
    let scale = 0.5 / wing_sum;
    for n in 0..len {
        let k = n as i64 - center as i64;
        if k != 0 && k % 2 != 0 {
            taps[n] *= scale;
        }
    }
    taps.into_iter().map(|t| t as f32).collect()
}

/// Real-valued decimate-by-2 with persistent left-wing history.
pub struct HalfbandReal {
    taps: Vec<f32>,
    hist: Vec<f32>,
    ext: Vec<f32>,
}

impl HalfbandReal {
    pub fn new(len: usize) -> Self {
        let taps = design(len);
        Self {
            hist: vec![0.0; taps.len() - 1],
            ext: Vec::new(),
            taps,
        }
    }

    /// Filter + decimate one block. Output length is `input.len() / 2`.
    pub fn process(&mut self, input: &[f32], out: &mut Vec<f32>) -> usize {
        let taps_len = self.taps.len();
        let hist_len = taps_len - 1;
        self.ext.clear();
        self.ext.extend_from_slice(&self.hist);
        self.ext.extend_from_slice(input);

        let out_len = input.len() / 2;
        out.clear();
        out.reserve(out_len);
        let center = hist_len / 2;
        for k in 0..out_len {
            let base = 2 * k;
            // Center tap plus the symmetric odd wings; even wings are zero.
            let mut acc = 0.5f32 * self.ext[base + center];
            let mut j = if center % 2 == 0 { 1 } else { 0 };
            while j < center {
                let t = self.taps[j];
                if t != 0.0 {
                    acc += t * (self.ext[base + j] + self.ext[base + (taps_len - 1 - j)]);
                }
                j += 2;
            }
            out.push(acc);
        }

        // Carry the right edge as next block's left wing.
        if self.ext.len() >= hist_len {
            let start = self.ext.len() - hist_len;
            self.hist.copy_from_slice(&self.ext[start..]);
        }
        out_len
    }
}

/// Complex (interleaved I/Q) decimate-by-2; histories per rail.
pub struct HalfbandComplex {
    i: HalfbandReal,
    q: HalfbandReal,
    di: Vec<f32>,
    dq: Vec<f32>,
    oi: Vec<f32>,
    oq: Vec<f32>,
}

impl HalfbandComplex {
    pub fn new(len: usize) -> Self {
        Self {
            i: HalfbandReal::new(len),
            q: HalfbandReal::new(len),
            di: Vec::new(),
            dq: Vec::new(),
            oi: Vec::new(),
            oq: Vec::new(),
        }
    }

    /// Decimate interleaved I/Q in place; returns the new element count.
    pub fn process_inplace(&mut self, iq: &mut Vec<f32>) -> usize {
        let pairs = iq.len() / 2;
        self.di.clear();
        self.dq.clear();
        for n in 0..pairs {
            self.di.push(iq[2 * n]);
            self.dq.push(iq[2 * n + 1]);
        }
        let ni = self.i.process(&self.di, &mut self.oi);
        let _ = self.q.process(&self.dq, &mut self.oq);
        iq.clear();
        for n in 0..ni {
            iq.push(self.oi[n]);
            iq.push(self.oq[n]);
        }
        iq.len()
    }
}
