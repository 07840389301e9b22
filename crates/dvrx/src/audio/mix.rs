// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Slot-to-channel mixing primitives and sample-format conversion.

/// Interleave two slot streams into stereo with per-channel muting.
pub fn interleave_stereo_f32(
    left: &[f32],
    right: &[f32],
    mute_l: bool,
    mute_r: bool,
    out: &mut Vec<f32>,
) {
    let n = left.len().min(right.len());
    out.clear();
    out.reserve(2 * n);
    for i in 0..n {
        out.push(if mute_l { 0.0 } else { left[i] });
        out.push(if mute_r { 0.0 } else { right[i] });
    }
}

/// Mono downmix of the two slots; both live slots average.
pub fn mono_from_slots_f32(
    left: &[f32],
    right: &[f32],
    l_on: bool,
    r_on: bool,
    out: &mut Vec<f32>,
) {
    let n = left.len().min(right.len());
    out.clear();
    out.reserve(n);
    for i in 0..n {
        out.push(match (l_on, r_on) {
            (true, false) => left[i],
            (false, true) => right[i],
            (true, true) => 0.5 * (left[i] + right[i]),
            (false, false) => 0.0,
        });
    }
}

/// Float (normalized) to PCM16 with saturation.
pub fn f32_to_s16(input: &[f32], scale: f32, out: &mut Vec<i16>) {
    out.clear();
    out.reserve(input.len());
    for &v in input {
        let s = (v * scale).clamp(-32768.0, 32767.0);
        out.push(s as i16);
    }
}

/// PCM16 to float with a scale factor.
pub fn s16_to_f32(input: &[i16], scale: f32, out: &mut Vec<f32>) {
    out.clear();
    out.reserve(input.len());
    for &v in input {
        out.push(f32::from(v) * scale);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stereo_muting_is_per_channel() {
        let l = [0.5f32; 4];
        let r = [-0.25f32; 4];
        let mut out = Vec::new();
        interleave_stereo_f32(&l, &r, true, false, &mut out);
        for pair in out.chunks_exact(2) {
            assert_eq!(pair[0], 0.0);
            assert_eq!(pair[1], -0.25);
        }
    }

    #[test]
    fn test_mono_mix_cases() {
        let l = [0.4f32; 2];
        let r = [0.2f32; 2];
        let mut out = Vec::new();
        mono_from_slots_f32(&l, &r, true, true, &mut out);
        assert!((out[0] - 0.3).abs() < 1e-6);
        mono_from_slots_f32(&l, &r, false, false, &mut out);
        assert_eq!(out[0], 0.0);
        mono_from_slots_f32(&l, &r, false, true, &mut out);
        assert_eq!(out[0], 0.2);
    }

    #[test]
    fn test_s16_saturation() {
        let mut out = Vec::new();
        f32_to_s16(&[2.0, -2.0, 0.5], 32768.0, &mut out);
        assert_eq!(out, vec![32767, -32768, 16384]);
    }
}
