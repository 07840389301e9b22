// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CQPSK adaptive equalizer.
//!
//! Linear feed-forward equalizer (NLMS) with an optional widely-linear
//! branch and decision feedback, plus a constant-modulus warm-up phase.
//! Runs between the FLL and the discriminator on PSK paths.
//!
//! Fixed-point by contract: samples are int16 I/Q, FFE/WL/DFE taps are
//! Q14, step sizes are Q15. With `lms_enable` off the block passes
//! through bit-exact (identity response).
//!
//! The widely-linear branch is gated on measured impropriety
//! `|E[z^2]| / E[|z|^2]` with hysteresis: engage above the on-threshold
//! and hold for `adapt_min_hold` symbols; below the off-threshold the
//! branch disengages and its taps leak away.

use crate::dsp::math::sat16;

/// Maximum FFE/WL tap count.
pub const CQPSK_EQ_MAX_TAPS: usize = 17;
/// Maximum DFE tap count.
pub const CQPSK_EQ_MAX_DFE: usize = 8;
/// Symbol ring capacity (most recent symbols, chronological).
pub const CQPSK_EQ_SYM_MAX: usize = 256;

/// QPSK decision amplitude (per-axis component; |d| ~ 8192).
const DEC_COMPONENT: i32 = 5793;
/// Constant-modulus target |y|^2.
const CMA_R2: i64 = 8192 * 8192;

/// Which branch adaptation currently favors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdaptMode {
    #[default]
    Ffe,
    Wl,
}

/// Equalizer state. Tuning fields are public; the engine adjusts them
/// through the runtime parameter plumbing.
pub struct CqpskEq {
    // --- configuration ---
    pub lms_enable: bool,
    pub num_taps: usize,
    pub mu_q15: i32,
    pub eps_q15: i32,
    /// NLMS update every `update_stride` symbol ticks.
    pub update_stride: u64,
    /// Symbol tick every `sym_stride` samples.
    pub sym_stride: u64,
    pub wl_enable: bool,
    pub wl_mu_q15: i32,
    /// WL leakage shift when disengaged (larger = gentler).
    pub wl_leak_shift: u32,
    pub dfe_enable: bool,
    pub dfe_taps: usize,
    /// Remaining CMA warm-up samples.
    pub cma_warmup: u32,
    pub cma_mu_q15: i32,
    /// FFE tap clamp (Q14); WL taps cap at an eighth of this.
    pub max_abs_q14: i32,
    /// Impropriety EMA weight (Q15).
    pub wl_improp_alpha_q15: i32,
    /// WL engage threshold on the impropriety ratio (Q15).
    pub wl_gate_thr_q15: i32,
    /// WL disengage threshold (Q15).
    pub wl_thr_off_q15: i32,
    /// Symbols to hold WL engaged after the gate fires.
    pub adapt_min_hold: u32,
    /// DQPSK-aware decision mode (rotate back by the previous decision).
    pub dqpsk_decision: bool,

    // --- adaptation state ---
    pub adapt_mode: AdaptMode,
    pub c_i: [i32; CQPSK_EQ_MAX_TAPS],
    pub c_q: [i32; CQPSK_EQ_MAX_TAPS],
    pub cw_i: [i32; CQPSK_EQ_MAX_TAPS],
    pub cw_q: [i32; CQPSK_EQ_MAX_TAPS],
    pub b_i: [i32; CQPSK_EQ_MAX_DFE],
    pub b_q: [i32; CQPSK_EQ_MAX_DFE],
    d_i: [i32; CQPSK_EQ_MAX_DFE],
    d_q: [i32; CQPSK_EQ_MAX_DFE],
    x_i: [i32; CQPSK_EQ_MAX_TAPS],
    x_q: [i32; CQPSK_EQ_MAX_TAPS],
    wl_engaged: bool,
    hold: u32,
    improp_z2_r: f64,
    improp_z2_i: f64,
    improp_p2: f64,
    prev_dec: (i32, i32),

    // --- counters / diagnostics ---
    pub update_count: u64,
    pub sym_count: u64,
    pub err_ema_q14: i32,

    // --- symbol ring ---
    sym: [(i16, i16); CQPSK_EQ_SYM_MAX],
    sym_head: usize,
    sym_len: usize,
}

impl Default for CqpskEq {
    fn default() -> Self {
        Self::new()
    }
}

impl CqpskEq {
    pub fn new() -> Self {
        let mut eq = Self {
            lms_enable: false,
            num_taps: 5,
            mu_q15: 128,
            eps_q15: 64,
            update_stride: 1,
            sym_stride: 1,
            wl_enable: false,
            wl_mu_q15: 128,
            wl_leak_shift: 8,
            dfe_enable: false,
            dfe_taps: 2,
            cma_warmup: 0,
            cma_mu_q15: 64,
            max_abs_q14: 24576,
            wl_improp_alpha_q15: 1024,
            wl_gate_thr_q15: 13107, // ~0.4
            wl_thr_off_q15: 3277,   // ~0.1
            adapt_min_hold: 64,
            dqpsk_decision: false,
            adapt_mode: AdaptMode::Ffe,
            c_i: [0; CQPSK_EQ_MAX_TAPS],
            c_q: [0; CQPSK_EQ_MAX_TAPS],
            cw_i: [0; CQPSK_EQ_MAX_TAPS],
            cw_q: [0; CQPSK_EQ_MAX_TAPS],
            b_i: [0; CQPSK_EQ_MAX_DFE],
            b_q: [0; CQPSK_EQ_MAX_DFE],
            d_i: [0; CQPSK_EQ_MAX_DFE],
            d_q: [0; CQPSK_EQ_MAX_DFE],
            x_i: [0; CQPSK_EQ_MAX_TAPS],
            x_q: [0; CQPSK_EQ_MAX_TAPS],
            wl_engaged: false,
            hold: 0,
            improp_z2_r: 0.0,
            improp_z2_i: 0.0,
            improp_p2: 0.0,
            prev_dec: (1 << 14, 0),
            update_count: 0,
            sym_count: 0,
            err_ema_q14: 0,
            sym: [(0, 0); CQPSK_EQ_SYM_MAX],
            sym_head: 0,
            sym_len: 0,
        };
        eq.reset_all();
        eq
    }

    /// Identity response + cleared WL/DFE branches and counters.
    pub fn reset_all(&mut self) {
        self.c_i = [0; CQPSK_EQ_MAX_TAPS];
        self.c_q = [0; CQPSK_EQ_MAX_TAPS];
        self.c_i[0] = 1 << 14; // center tap = 1.0 in Q14
        self.cw_i = [0; CQPSK_EQ_MAX_TAPS];
        self.cw_q = [0; CQPSK_EQ_MAX_TAPS];
        self.b_i = [0; CQPSK_EQ_MAX_DFE];
        self.b_q = [0; CQPSK_EQ_MAX_DFE];
        self.reset_runtime();
    }

    /// Clear histories, counters and gates; keep all taps.
    pub fn reset_runtime(&mut self) {
        self.x_i = [0; CQPSK_EQ_MAX_TAPS];
        self.x_q = [0; CQPSK_EQ_MAX_TAPS];
        self.d_i = [0; CQPSK_EQ_MAX_DFE];
        self.d_q = [0; CQPSK_EQ_MAX_DFE];
        self.update_count = 0;
        self.sym_count = 0;
        self.err_ema_q14 = 0;
        self.wl_engaged = false;
        self.hold = 0;
        self.adapt_mode = AdaptMode::Ffe;
        self.improp_z2_r = 0.0;
        self.improp_z2_i = 0.0;
        self.improp_p2 = 0.0;
        self.prev_dec = (1 << 14, 0);
        self.sym_head = 0;
        self.sym_len = 0;
    }

    /// Zero the widely-linear branch only.
    pub fn reset_wl(&mut self) {
        self.cw_i = [0; CQPSK_EQ_MAX_TAPS];
        self.cw_q = [0; CQPSK_EQ_MAX_TAPS];
        self.wl_engaged = false;
        self.hold = 0;
        self.adapt_mode = AdaptMode::Ffe;
    }

    /// Whether the WL branch is currently engaged.
    pub fn wl_engaged(&self) -> bool {
        self.wl_engaged
    }

    /// Smoothed impropriety ratio in Q15.
    pub fn impropriety_q15(&self) -> i32 {
        if self.improp_p2 <= 1e-12 {
            return 0;
        }
        let num = (self.improp_z2_r * self.improp_z2_r + self.improp_z2_i * self.improp_z2_i).sqrt();
        ((num / self.improp_p2) * 32768.0) as i32
    }

    /// Copy the last symbols (at most `max`) in chronological order.
    pub fn symbols(&self, out: &mut Vec<(i16, i16)>, max: usize) -> usize {
        let n = self.sym_len.min(max);
        out.clear();
        let start = self.sym_len - n;
        for k in start..self.sym_len {
            let idx = (self.sym_head + CQPSK_EQ_SYM_MAX - self.sym_len + k) % CQPSK_EQ_SYM_MAX;
            out.push(self.sym[idx]);
        }
        n
    }

    fn push_symbol(&mut self, s: (i16, i16)) {
        self.sym[self.sym_head] = s;
        self.sym_head = (self.sym_head + 1) % CQPSK_EQ_SYM_MAX;
        if self.sym_len < CQPSK_EQ_SYM_MAX {
            self.sym_len += 1;
        }
    }

    /// Process one interleaved I/Q block in place.
    pub fn process_block(&mut self, buf: &mut [i16]) {
        let pairs = buf.len() / 2;
        let taps = self.num_taps.clamp(1, CQPSK_EQ_MAX_TAPS);
        let dfe_n = self.dfe_taps.min(CQPSK_EQ_MAX_DFE);

        for n in 0..pairs {
            let xi = i32::from(buf[2 * n]);
            let xq = i32::from(buf[2 * n + 1]);

            // Shift the input history (newest at index 0).
            for k in (1..taps).rev() {
                self.x_i[k] = self.x_i[k - 1];
                self.x_q[k] = self.x_q[k - 1];
            }
            self.x_i[0] = xi;
            self.x_q[0] = xq;

            let active = self.lms_enable || self.cma_warmup > 0;

            let (yi, yq) = if active {
                let mut acc_i: i64 = 0;
                let mut acc_q: i64 = 0;
                for k in 0..taps {
                    let cr = i64::from(self.c_i[k]);
                    let ci = i64::from(self.c_q[k]);
                    let xr = i64::from(self.x_i[k]);
                    let xj = i64::from(self.x_q[k]);
                    acc_i += cr * xr - ci * xj;
                    acc_q += cr * xj + ci * xr;
                    if self.wl_engaged {
                        // cw * conj(x)
                        let wr = i64::from(self.cw_i[k]);
                        let wi = i64::from(self.cw_q[k]);
                        acc_i += wr * xr + wi * xj;
                        acc_q += wi * xr - wr * xj;
                    }
                }
                if self.dfe_enable {
                    for k in 0..dfe_n {
                        let br = i64::from(self.b_i[k]);
                        let bi = i64::from(self.b_q[k]);
                        let dr = i64::from(self.d_i[k]);
                        let dj = i64::from(self.d_q[k]);
                        acc_i -= br * dr - bi * dj;
                        acc_q -= br * dj + bi * dr;
                    }
                }
                (
                    sat16((acc_i >> 14) as i32) as i32,
                    sat16((acc_q >> 14) as i32) as i32,
                )
            } else {
                // Identity: bit-exact pass-through.
                (xi, xq)
            };

            buf[2 * n] = yi as i16;
            buf[2 * n + 1] = yq as i16;

            // Impropriety EMA on the equalized signal (adaptive paths).
            if active && self.cma_warmup == 0 {
                let alpha = f64::from(self.wl_improp_alpha_q15) / 32768.0;
                let yif = yi as f64;
                let yqf = yq as f64;
                self.improp_z2_r += alpha * ((yif * yif - yqf * yqf) - self.improp_z2_r);
                self.improp_z2_i += alpha * (2.0 * yif * yqf - self.improp_z2_i);
                self.improp_p2 += alpha * ((yif * yif + yqf * yqf) - self.improp_p2);

                let ratio = self.impropriety_q15();
                if self.wl_enable && !self.wl_engaged && ratio > self.wl_gate_thr_q15 {
                    self.wl_engaged = true;
                    self.adapt_mode = AdaptMode::Wl;
                    self.hold = self.adapt_min_hold;
                } else if self.wl_engaged && self.hold == 0 && ratio < self.wl_thr_off_q15 {
                    self.wl_engaged = false;
                    self.adapt_mode = AdaptMode::Ffe;
                }
            }

            let sym_tick = self.sym_stride <= 1 || self.sym_count % self.sym_stride == 0;
            self.sym_count += 1;

            let mut err: Option<(i64, i64)> = None;
            if sym_tick {
                self.push_symbol((yi as i16, yq as i16));
                if self.hold > 0 {
                    self.hold -= 1;
                }

                if self.cma_warmup == 0 && self.lms_enable {
                    // Slice to a QPSK decision, DQPSK-aware when enabled.
                    let (di, dq) = self.decide(yi, yq);
                    // DFE history (newest first).
                    for k in (1..dfe_n.max(1)).rev() {
                        self.d_i[k] = self.d_i[k - 1];
                        self.d_q[k] = self.d_q[k - 1];
                    }
                    self.d_i[0] = di;
                    self.d_q[0] = dq;

                    let ei = i64::from(di - yi);
                    let eq = i64::from(dq - yq);
                    err = Some((ei, eq));
                    let mag = ((ei.abs() + eq.abs()) >> 1) as i32;
                    self.err_ema_q14 += (mag - self.err_ema_q14) >> 4;
                }
            }

            if self.cma_warmup > 0 {
                // Constant-modulus error replaces slicing; WL only leaks.
                let p = i64::from(yi) * i64::from(yi) + i64::from(yq) * i64::from(yq);
                let ei = ((i64::from(yi) * (CMA_R2 - p)) >> 24).clamp(-16384, 16384);
                let eq = ((i64::from(yq) * (CMA_R2 - p)) >> 24).clamp(-16384, 16384);
                self.adapt(taps, ei, eq, self.cma_mu_q15, false);
                self.leak_wl(taps);
                self.cma_warmup -= 1;
            } else if let Some((ei, eq)) = err {
                let update_tick =
                    self.update_stride <= 1 || self.update_count % self.update_stride == 0;
                if update_tick {
                    self.adapt(taps, ei, eq, self.mu_q15, self.wl_engaged);
                    if !self.wl_engaged && self.wl_enable {
                        self.leak_wl(taps);
                    }
                    if self.dfe_enable {
                        self.adapt_dfe(dfe_n, ei, eq);
                    }
                }
            }
            self.update_count += 1;
        }
    }

    /// QPSK decision on the (optionally derotated) sample.
    fn decide(&mut self, yi: i32, yq: i32) -> (i32, i32) {
        let (ui, uq) = if self.dqpsk_decision {
            // Rotate back by the previous decision direction (Q14 unit).
            let pr = i64::from(self.prev_dec.0);
            let pi = i64::from(self.prev_dec.1);
            (
                ((i64::from(yi) * pr + i64::from(yq) * pi) >> 14) as i32,
                ((i64::from(yq) * pr - i64::from(yi) * pi) >> 14) as i32,
            )
        } else {
            (yi, yq)
        };
        let si = if ui >= 0 { DEC_COMPONENT } else { -DEC_COMPONENT };
        let sq = if uq >= 0 { DEC_COMPONENT } else { -DEC_COMPONENT };
        let (di, dq) = if self.dqpsk_decision {
            let pr = i64::from(self.prev_dec.0);
            let pi = i64::from(self.prev_dec.1);
            let ri = ((i64::from(si) * pr - i64::from(sq) * pi) >> 14) as i32;
            let rq = ((i64::from(sq) * pr + i64::from(si) * pi) >> 14) as i32;
            (ri, rq)
        } else {
            (si, sq)
        };
        // Unit direction of this decision for the next derotation.
        let norm = 8192; // |d| for axis decisions
        self.prev_dec = (
            (i64::from(di) * (1 << 14) / norm) as i32,
            (i64::from(dq) * (1 << 14) / norm) as i32,
        );
        (di, dq)
    }

    /// NLMS tap update; `wl` also updates the widely-linear branch.
    fn adapt(&mut self, taps: usize, ei: i64, eq: i64, mu_q15: i32, wl: bool) {
        let mut norm: i64 = i64::from(self.eps_q15.max(1));
        for k in 0..taps {
            norm += i64::from(self.x_i[k]) * i64::from(self.x_i[k])
                + i64::from(self.x_q[k]) * i64::from(self.x_q[k]);
        }
        let mu = i64::from(mu_q15);
        let cap = self.max_abs_q14;
        let wl_cap = (self.max_abs_q14 >> 3).max(1);
        for k in 0..taps {
            let xr = i64::from(self.x_i[k]);
            let xj = i64::from(self.x_q[k]);
            // e * conj(x)
            let gr = ei * xr + eq * xj;
            let gi = eq * xr - ei * xj;
            let di = ((mu * (gr << 14)) / norm) >> 15;
            let dq = ((mu * (gi << 14)) / norm) >> 15;
            self.c_i[k] = (self.c_i[k] + di as i32).clamp(-cap, cap);
            self.c_q[k] = (self.c_q[k] + dq as i32).clamp(-cap, cap);
            if wl {
                // e * x (conjugate-linear branch)
                let hr = ei * xr - eq * xj;
                let hi = eq * xr + ei * xj;
                let wmu = i64::from(self.wl_mu_q15);
                let dwi = ((wmu * (hr << 14)) / norm) >> 15;
                let dwq = ((wmu * (hi << 14)) / norm) >> 15;
                self.cw_i[k] = (self.cw_i[k] + dwi as i32).clamp(-wl_cap, wl_cap);
                self.cw_q[k] = (self.cw_q[k] + dwq as i32).clamp(-wl_cap, wl_cap);
            }
        }
    }

    /// DFE tap update from the decision history.
    fn adapt_dfe(&mut self, dfe_n: usize, ei: i64, eq: i64) {
        let mut norm: i64 = i64::from(self.eps_q15.max(1));
        for k in 0..dfe_n {
            norm += i64::from(self.d_i[k]) * i64::from(self.d_i[k])
                + i64::from(self.d_q[k]) * i64::from(self.d_q[k]);
        }
        let mu = i64::from(self.mu_q15);
        let cap = self.max_abs_q14;
        for k in 0..dfe_n {
            let dr = i64::from(self.d_i[k]);
            let dj = i64::from(self.d_q[k]);
            // Output subtracts b*d, so the gradient sign flips.
            let gr = ei * dr + eq * dj;
            let gi = eq * dr - ei * dj;
            let di = ((mu * (gr << 14)) / norm) >> 15;
            let dq = ((mu * (gi << 14)) / norm) >> 15;
            self.b_i[k] = (self.b_i[k] - di as i32).clamp(-cap, cap);
            self.b_q[k] = (self.b_q[k] - dq as i32).clamp(-cap, cap);
        }
    }

    /// Leak the WL taps toward zero.
    fn leak_wl(&mut self, taps: usize) {
        let shift = self.wl_leak_shift.clamp(1, 15);
        for k in 0..taps {
            let li = self.cw_i[k] >> shift;
            let lq = self.cw_q[k] >> shift;
            // Integer shift of small negatives stalls at -1; step those.
            self.cw_i[k] -= if li != 0 {
                li
            } else {
                self.cw_i[k].signum()
            };
            self.cw_q[k] -= if lq != 0 {
                lq
            } else {
                self.cw_q[k].signum()
            };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn qpsk_block(pairs: usize, amp: i16, seed: &mut u32) -> Vec<i16> {
        let mut v = Vec::with_capacity(2 * pairs);
        for _ in 0..pairs {
            *seed = seed.wrapping_mul(1103515245).wrapping_add(12345);
            v.push(if (*seed >> 31) & 1 == 1 { amp } else { -amp });
            v.push(if (*seed >> 30) & 1 == 1 { amp } else { -amp });
        }
        v
    }

    #[test]
    fn test_identity_when_disabled() {
        let mut eq = CqpskEq::new();
        eq.lms_enable = false;
        eq.num_taps = 5;
        let mut seed = 7u32;
        let buf = qpsk_block(16, 7000, &mut seed);
        let mut work = buf.clone();
        eq.process_block(&mut work);
        assert_eq!(work, buf, "identity response must be bit-exact");
    }

    #[test]
    fn test_tap_bounds_under_full_scale_input() {
        let mut eq = CqpskEq::new();
        eq.lms_enable = true;
        eq.update_stride = 1;
        eq.sym_stride = 1;
        eq.mu_q15 = 4096;
        eq.eps_q15 = 1;
        eq.wl_enable = true;
        eq.wl_mu_q15 = 4096;
        eq.wl_leak_shift = 10;
        eq.wl_gate_thr_q15 = 1; // force WL in quickly

        let mut buf = Vec::new();
        for n in 0..2048 {
            buf.push(if n & 1 == 1 { 32000i16 } else { -32000 });
            buf.push(if n & 2 == 2 { 30000i16 } else { -30000 });
        }
        eq.process_block(&mut buf);

        let cap = eq.max_abs_q14;
        let wl_cap = (cap >> 3).max(1);
        for k in 0..eq.num_taps {
            assert!(eq.c_i[k].abs() <= cap, "FFE tap {} out of bounds", k);
            assert!(eq.c_q[k].abs() <= cap, "FFE tap {} out of bounds", k);
            assert!(eq.cw_i[k].abs() <= wl_cap, "WL tap {} beyond cap", k);
            assert!(eq.cw_q[k].abs() <= wl_cap, "WL tap {} beyond cap", k);
        }
    }

    #[test]
    fn test_symbol_ring_keeps_last_in_order() {
        let mut eq = CqpskEq::new();
        eq.lms_enable = false;
        eq.sym_stride = 1;

        let total = CQPSK_EQ_SYM_MAX + 100;
        let mut buf = Vec::with_capacity(2 * total);
        for n in 0..total {
            buf.push((n & 0x7FFF) as i16);
            buf.push((((n * 3) & 0x7FFF) as i32 - 16384) as i16);
        }
        eq.process_block(&mut buf);

        let mut out = Vec::new();
        let n = eq.symbols(&mut out, CQPSK_EQ_SYM_MAX + 8);
        assert_eq!(n, CQPSK_EQ_SYM_MAX);
        let start = total - n;
        for (k, &(si, sq)) in out.iter().enumerate() {
            assert_eq!(si, buf[2 * (start + k)], "ring mismatch at {}", k);
            assert_eq!(sq, buf[2 * (start + k) + 1], "ring mismatch at {}", k);
        }
    }

    #[test]
    fn test_cma_moves_ffe_keeps_wl_leaking() {
        let mut eq = CqpskEq::new();
        eq.sym_stride = 1;
        eq.cma_warmup = 256;
        eq.cma_mu_q15 = 64;
        eq.lms_enable = true; // skipped during warm-up
        eq.update_stride = 1;
        eq.mu_q15 = 64;
        eq.wl_enable = true;
        eq.cw_i[0] = 500;
        eq.cw_q[0] = -400;

        let c0 = eq.c_i[0];
        let c1 = eq.c_i[1];
        let wl_before = eq.cw_i[0].abs() + eq.cw_q[0].abs();

        let mut seed = 0xBEEFu32;
        let mut buf = qpsk_block(256, 6000, &mut seed);
        eq.process_block(&mut buf);

        assert!(
            eq.c_i[0] != c0 || eq.c_i[1] != c1,
            "CMA left FFE taps untouched"
        );
        let wl_after = eq.cw_i[0].abs() + eq.cw_q[0].abs();
        assert!(wl_after <= wl_before, "WL taps must only leak in warm-up");
        assert_eq!(eq.adapt_mode, AdaptMode::Ffe);
        assert_eq!(eq.cma_warmup, 0);
    }

    #[test]
    fn test_wl_hysteresis_engage_then_leak() {
        let mut eq = CqpskEq::new();
        eq.lms_enable = true;
        eq.wl_enable = true;
        eq.update_stride = 1;
        eq.sym_stride = 1;
        eq.mu_q15 = 128;
        eq.wl_mu_q15 = 128;
        eq.num_taps = 11;
        eq.wl_improp_alpha_q15 = 16384;
        eq.wl_gate_thr_q15 = 20000;
        eq.wl_thr_off_q15 = 5000;
        eq.wl_leak_shift = 6;
        eq.adapt_min_hold = 2;

        // Improper phase: Q = I
        let mut improper = Vec::new();
        for n in 0..256 {
            let v = if n & 1 == 1 { 7000i16 } else { -7000 };
            improper.push(v);
            improper.push(v);
        }
        eq.process_block(&mut improper);
        assert_eq!(eq.adapt_mode, AdaptMode::Wl, "WL must engage on improper input");
        let wl_norm_imp: i32 = (0..eq.num_taps)
            .map(|k| eq.cw_i[k].abs() + eq.cw_q[k].abs())
            .sum();

        // Proper phase: random QPSK
        let mut seed = 0xAA55u32;
        let mut proper = qpsk_block(1024, 6000, &mut seed);
        eq.process_block(&mut proper);
        let wl_norm_fin: i32 = (0..eq.num_taps)
            .map(|k| eq.cw_i[k].abs() + eq.cw_q[k].abs())
            .sum();

        assert!(
            wl_norm_fin * 2 <= wl_norm_imp.max(1),
            "WL taps did not leak down (imp={} fin={})",
            wl_norm_imp,
            wl_norm_fin
        );
    }

    #[test]
    fn test_resets() {
        let mut eq = CqpskEq::new();
        eq.lms_enable = true;
        eq.sym_stride = 1;
        let mut seed = 3u32;
        let mut buf = qpsk_block(128, 8000, &mut seed);
        eq.process_block(&mut buf);
        assert!(eq.sym_count > 0);

        eq.reset_runtime();
        assert_eq!(eq.sym_count, 0);
        assert_eq!(eq.update_count, 0);

        eq.cw_i[1] = 333;
        eq.reset_wl();
        assert_eq!(eq.cw_i[1], 0);
        assert!(!eq.wl_engaged());

        eq.c_i[1] = 777;
        eq.reset_all();
        assert_eq!(eq.c_i[0], 1 << 14);
        assert_eq!(eq.c_i[1], 0);
    }

    #[test]
    fn test_larger_sym_stride_still_converges_bounds() {
        let mut a = CqpskEq::new();
        let mut b = CqpskEq::new();
        for (eq, stride) in [(&mut a, 1u64), (&mut b, 8)] {
            eq.lms_enable = true;
            eq.mu_q15 = 256;
            eq.update_stride = 1;
            eq.sym_stride = stride;
        }
        let mut seed = 0x22u32;
        let buf = qpsk_block(2048, 7000, &mut seed);
        let mut ba = buf.clone();
        let mut bb = buf;
        a.process_block(&mut ba);
        b.process_block(&mut bb);
        // Both adapted away from identity without breaking clamps
        let delta = |eq: &CqpskEq| -> i32 {
            (0..eq.num_taps)
                .map(|k| {
                    let t = if k == 0 { 1 << 14 } else { 0 };
                    (eq.c_i[k] - t).abs() + eq.c_q[k].abs()
                })
                .sum()
        };
        assert!(delta(&a) > 0);
        assert!(delta(&b) > 0);
    }
}
