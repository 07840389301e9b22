// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! FM envelope AGC and limiter.
//!
//! Pre-discriminator gain control for FM modes: the complex envelope RMS
//! is steered toward a target so the discriminator sees a consistent
//! level regardless of front-end gain. The smoothed gain is held in Q15
//! so UI snapshots and parameter plumbing stay integer-valued; blocks
//! below the minimum RMS leave the gain untouched (noise floor).

/// Q15 unity gain.
const GAIN_ONE_Q15: i32 = 32768;

#[derive(Debug, Clone, Copy)]
pub struct FmAgc {
    pub enabled: bool,
    /// Target complex-envelope RMS (normalized units).
    pub target_rms: f32,
    /// Blocks with RMS below this are ignored (squelch-adjacent noise).
    pub min_rms: f32,
    /// Smoothed gain, Q15 (32768 = 1.0).
    pub gain_q15: i32,
    /// Per-block smoothing factor toward the desired gain.
    pub alpha: f32,
    /// Hard envelope limiter.
    pub limiter_enabled: bool,
    /// Envelope magnitude ceiling (normalized units).
    pub limiter_ceiling: f32,
}

impl Default for FmAgc {
    fn default() -> Self {
        Self {
            enabled: false,
            target_rms: 0.30,
            min_rms: 0.03,
            gain_q15: GAIN_ONE_Q15,
            alpha: 0.5,
            limiter_enabled: false,
            limiter_ceiling: 0.95,
        }
    }
}

impl FmAgc {
    /// Apply gain control to one interleaved I/Q block.
    pub fn process(&mut self, iq: &mut [f32]) {
        if !self.enabled {
            return;
        }
        let pairs = iq.len() / 2;
        if pairs == 0 {
            return;
        }
        let mut acc = 0.0f64;
        for n in 0..pairs {
            let i = f64::from(iq[2 * n]);
            let q = f64::from(iq[2 * n + 1]);
            acc += i * i + q * q;
        }
        let rms = (acc / pairs as f64).sqrt() as f32;
        if rms > self.min_rms {
            let desired = self.target_rms / rms;
            let current = self.gain_q15 as f32 / GAIN_ONE_Q15 as f32;
            let next = current + self.alpha * (desired - current);
            // Q15 storage bounds the gain to [1/32768, 32)
            let q = (next * GAIN_ONE_Q15 as f32) as i32;
            self.gain_q15 = q.clamp(1, 32 * GAIN_ONE_Q15);
        }
        let g = self.gain_q15 as f32 / GAIN_ONE_Q15 as f32;
        for s in iq.iter_mut() {
            *s *= g;
        }
        if self.limiter_enabled {
            let ceil = self.limiter_ceiling;
            for n in 0..pairs {
                let i = iq[2 * n];
                let q = iq[2 * n + 1];
                let mag = i.hypot(q);
                if mag > ceil && mag > 0.0 {
                    let k = ceil / mag;
                    iq[2 * n] = i * k;
                    iq[2 * n + 1] = q * k;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rms(iq: &[f32]) -> f32 {
        let pairs = iq.len() / 2;
        let mut acc = 0.0f64;
        for n in 0..pairs {
            acc += f64::from(iq[2 * n]).powi(2) + f64::from(iq[2 * n + 1]).powi(2);
        }
        (acc / pairs as f64).sqrt() as f32
    }

    fn tone(pairs: usize, amp: f32) -> Vec<f32> {
        let mut v = Vec::with_capacity(2 * pairs);
        for n in 0..pairs {
            let ang = 2.0 * std::f32::consts::PI * n as f32 / 37.0;
            v.push(amp * ang.cos());
            v.push(amp * ang.sin());
        }
        v
    }

    #[test]
    fn test_gain_converges_to_target() {
        let mut agc = FmAgc {
            enabled: true,
            ..FmAgc::default()
        };
        let mut out_rms = 0.0;
        for _ in 0..8 {
            let mut block = tone(256, 0.10);
            agc.process(&mut block);
            out_rms = rms(&block);
        }
        assert!(
            (0.24..0.40).contains(&out_rms),
            "post RMS {} not near target {}",
            out_rms,
            agc.target_rms
        );
    }

    #[test]
    fn test_noise_floor_leaves_gain_alone() {
        let mut agc = FmAgc {
            enabled: true,
            ..FmAgc::default()
        };
        let before = agc.gain_q15;
        let mut block = tone(128, 0.001); // below min_rms
        agc.process(&mut block);
        assert_eq!(agc.gain_q15, before);
    }

    #[test]
    fn test_limiter_caps_envelope() {
        let mut agc = FmAgc {
            enabled: true,
            limiter_enabled: true,
            limiter_ceiling: 0.5,
            gain_q15: GAIN_ONE_Q15,
            alpha: 0.0, // isolate the limiter
            ..FmAgc::default()
        };
        let mut block = tone(64, 0.9);
        agc.process(&mut block);
        for n in 0..block.len() / 2 {
            let mag = block[2 * n].hypot(block[2 * n + 1]);
            assert!(mag <= 0.5 + 1e-4, "mag {}", mag);
        }
    }
}
