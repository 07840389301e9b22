// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Gardner timing error detector.
//!
//! Runs on complex baseband after the FLL. Each produced sample is a
//! linear interpolation at the fractional timing offset `mu`; the
//! Gardner error nudges `mu` and the nominal advance keeps it walking at
//! one sample per symbol-rate tick: `mu <- (mu + mu_nom + g*e) mod 1`.
//! Output is one complex sample shorter than the input per block.

/// TED configuration.
#[derive(Debug, Clone, Copy)]
pub struct TedConfig {
    pub enabled: bool,
    /// Run even when sps is outside the supported range (tests/tools).
    pub force: bool,
    /// Loop gain applied to the Gardner error.
    pub gain: f32,
    /// Samples per symbol at the TED input.
    pub sps: u32,
}

impl Default for TedConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            force: false,
            gain: 0.001,
            sps: 10,
        }
    }
}

/// TED runtime state.
#[derive(Debug, Clone, Copy, Default)]
pub struct TedState {
    /// Fractional timing offset in [0, 1).
    pub mu: f32,
    /// EMA of the Gardner error (diagnostics).
    pub e_ema: f32,
    prev1: (f32, f32),
    prev2: (f32, f32),
    primed: u8,
}

impl TedState {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Adjust timing on one interleaved I/Q block.
///
/// Writes `len - 2` elements (one fewer complex sample) into `out` and
/// returns the new element count. Degenerate inputs pass through.
pub fn gardner_adjust(cfg: &TedConfig, st: &mut TedState, iq: &[f32], out: &mut Vec<f32>) -> usize {
    out.clear();
    let pairs = iq.len() / 2;
    if !cfg.enabled || pairs < 2 || (cfg.sps < 2 && !cfg.force) {
        out.extend_from_slice(iq);
        return out.len();
    }

    let mu_nom = 1.0 / cfg.sps.max(1) as f32;
    for n in 0..pairs - 1 {
        let i0 = iq[2 * n];
        let q0 = iq[2 * n + 1];
        let i1 = iq[2 * n + 2];
        let q1 = iq[2 * n + 3];
        let yi = i0 + st.mu * (i1 - i0);
        let yq = q0 + st.mu * (q1 - q0);
        out.push(yi);
        out.push(yq);

        // Gardner: (y[k] - y[k-2]) . y[k-1], needs two priors.
        let mut e = 0.0f32;
        if st.primed >= 2 {
            e = (yi - st.prev2.0) * st.prev1.0 + (yq - st.prev2.1) * st.prev1.1;
        } else {
            st.primed += 1;
        }
        st.e_ema = 0.95 * st.e_ema + 0.05 * e;

        st.prev2 = st.prev1;
        st.prev1 = (yi, yq);

        let mut mu = st.mu + mu_nom + cfg.gain * e;
        mu -= mu.floor();
        st.mu = mu;
    }
    out.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_signal_zero_residual() {
        let n0 = 20usize;
        let mut iq = Vec::new();
        for _ in 0..n0 {
            iq.push(0.1f32);
            iq.push(-0.05f32);
        }
        let cfg = TedConfig {
            enabled: true,
            force: true,
            gain: 0.001,
            sps: 10,
        };
        let mut st = TedState::default();
        let mut out = Vec::new();
        let len = gardner_adjust(&cfg, &mut st, &iq, &mut out);
        assert_eq!(len, 2 * (n0 - 1));

        // mu advanced by iter * mu_nom (mod 1); error stayed ~0
        let iter = (n0 - 1) as f32;
        let expected = (iter / 10.0).fract();
        assert!((st.mu - expected).abs() < 1e-3, "mu={} want {}", st.mu, expected);
        assert!(st.e_ema.abs() < 1e-3, "residual {}", st.e_ema);
    }

    #[test]
    fn test_disabled_passthrough() {
        let iq = vec![0.5f32; 40];
        let cfg = TedConfig::default();
        let mut st = TedState::default();
        let mut out = Vec::new();
        let len = gardner_adjust(&cfg, &mut st, &iq, &mut out);
        assert_eq!(len, 40);
        assert_eq!(out, iq);
    }

    #[test]
    fn test_mu_stays_in_unit_interval() {
        let mut iq = Vec::new();
        for n in 0..200 {
            iq.push(if n % 10 < 5 { 0.8 } else { -0.8 });
            iq.push(0.0);
        }
        let cfg = TedConfig {
            enabled: true,
            force: true,
            gain: 0.01,
            sps: 10,
        };
        let mut st = TedState::default();
        let mut out = Vec::new();
        gardner_adjust(&cfg, &mut st, &iq, &mut out);
        assert!((0.0..1.0).contains(&st.mu), "mu={}", st.mu);
    }
}
