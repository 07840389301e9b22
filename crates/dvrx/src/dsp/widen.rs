// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sample widening and spectrum rotation.
//!
//! SDR-native input is interleaved u8 I/Q biased at 127.5. Widening maps
//! it to normalized f32 in [-1, 1]; the optional 90 degree rotation
//! shifts the spectrum by fs/4 in 4-complex-sample cycles (multiply by
//! j^n), preserving I/Q pairing throughout.

/// Widen u8 I/Q into normalized f32, appending to `out`.
///
/// Odd trailing bytes are ignored so pairing is never broken.
pub fn widen_u8(input: &[u8], out: &mut Vec<f32>) {
    let n = input.len() & !1;
    out.reserve(n);
    for &b in &input[..n] {
        out.push((f32::from(b) - 127.5) / 127.5);
    }
}

/// Widen s16 PCM into normalized f32, appending to `out`.
pub fn widen_i16(input: &[i16], out: &mut Vec<f32>) {
    out.reserve(input.len());
    for &s in input {
        out.push(f32::from(s) / 32768.0);
    }
}

/// Rotate the spectrum by +fs/4: z[n] *= j^n over 4-sample cycles.
///
/// Cycle on pairs (I,Q): (I,Q), (-Q,I), (-I,-Q), (Q,-I).
pub fn rotate90(iq: &mut [f32]) {
    let pairs = iq.len() / 2;
    for n in 0..pairs {
        let i = iq[2 * n];
        let q = iq[2 * n + 1];
        match n & 3 {
            1 => {
                iq[2 * n] = -q;
                iq[2 * n + 1] = i;
            }
            2 => {
                iq[2 * n] = -i;
                iq[2 * n + 1] = -q;
            }
            3 => {
                iq[2 * n] = q;
                iq[2 * n + 1] = -i;
            }
            _ => {}
        }
    }
}
