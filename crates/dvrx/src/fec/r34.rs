// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DMR rate-3/4 trellis codec.
//!
//! 18 payload bytes become 48 tribits plus a flush tribit; an 8-state
//! trellis maps each tribit to a 4-bit constellation point, and the 49
//! points leave as 98 interleaved dibits. Decode is an 8-state Viterbi;
//! the soft variant weights branch metrics by per-dibit reliability so
//! a confidently-wrong dibit costs more than a shaky one.

use super::FecStatus;

/// Constellation point per (state, input tribit); next state is the
/// tribit. Rows stride the point set so merging paths stay far apart.
const POINTS: [[u8; 8]; 8] = [
    [0, 8, 4, 12, 2, 10, 6, 14],
    [4, 12, 2, 10, 6, 14, 0, 8],
    [1, 9, 5, 13, 3, 11, 7, 15],
    [5, 13, 3, 11, 7, 15, 1, 9],
    [3, 11, 7, 15, 1, 9, 5, 13],
    [7, 15, 1, 9, 5, 13, 3, 11],
    [2, 10, 6, 14, 0, 8, 4, 12],
    [6, 14, 0, 8, 4, 12, 2, 10],
];

/// Dibit interleave stride (coprime with 98).
const INTERLEAVE_STRIDE: usize = 73;

const TRIBITS: usize = 49;
const DIBITS: usize = 98;
const PAYLOAD_BYTES: usize = 18;

fn interleave_index(i: usize) -> usize {
    (i * INTERLEAVE_STRIDE) % DIBITS
}

/// Encode 18 payload bytes into 98 interleaved dibits.
pub fn r34_encode(payload: &[u8; PAYLOAD_BYTES], dibits_out: &mut [u8; DIBITS]) {
    // Bytes -> 48 tribits (MSB-first bitstream) + flush tribit 0.
    let mut bits = [0u8; 144];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = (payload[i / 8] >> (7 - (i % 8))) & 1;
    }
    let mut tribits = [0u8; TRIBITS];
    for t in 0..48 {
        tribits[t] = (bits[3 * t] << 2) | (bits[3 * t + 1] << 1) | bits[3 * t + 2];
    }
    tribits[48] = 0;

    let mut deinter = [0u8; DIBITS];
    let mut state = 0usize;
    for (t, &tb) in tribits.iter().enumerate() {
        let point = POINTS[state][usize::from(tb)];
        deinter[2 * t] = (point >> 2) & 3;
        deinter[2 * t + 1] = point & 3;
        state = usize::from(tb);
    }
    for (i, &d) in deinter.iter().enumerate() {
        dibits_out[interleave_index(i)] = d;
    }
}

fn decode_points(
    points: &[[u32; 16]; TRIBITS],
    payload_out: &mut [u8; PAYLOAD_BYTES],
) -> (FecStatus, u32) {
    let mut metric = [u32::MAX; 8];
    metric[0] = 0;
    let mut from = [[0u8; 8]; TRIBITS];

    for (t, costs) in points.iter().enumerate() {
        let mut next = [u32::MAX; 8];
        for s in 0..8 {
            if metric[s] == u32::MAX {
                continue;
            }
            for tb in 0..8 {
                let p = POINTS[s][tb];
                let cand = metric[s] + costs[usize::from(p)];
                if cand < next[tb] {
                    next[tb] = cand;
                    from[t][tb] = s as u8;
                }
            }
        }
        metric = next;
    }

    // Flush tribit forces the end state to zero.
    let mut tribits = [0u8; TRIBITS];
    let mut s = 0usize;
    let best_metric = metric[0];
    for t in (0..TRIBITS).rev() {
        tribits[t] = s as u8;
        s = usize::from(from[t][s]);
    }

    let mut bits = [0u8; 144];
    for t in 0..48 {
        bits[3 * t] = (tribits[t] >> 2) & 1;
        bits[3 * t + 1] = (tribits[t] >> 1) & 1;
        bits[3 * t + 2] = tribits[t] & 1;
    }
    for (i, chunk) in bits.chunks_exact(8).enumerate() {
        let mut byte = 0u8;
        for &b in chunk {
            byte = (byte << 1) | b;
        }
        payload_out[i] = byte;
    }

    let status = if best_metric == 0 {
        FecStatus::Ok
    } else if best_metric == u32::MAX {
        FecStatus::Uncorrectable
    } else {
        FecStatus::Corrected
    };
    (status, if best_metric == u32::MAX { 0 } else { best_metric })
}

/// Hard-decision decode of 98 interleaved dibits.
pub fn r34_decode(dibits: &[u8; DIBITS], payload_out: &mut [u8; PAYLOAD_BYTES]) -> FecStatus {
    let reliab = [255u8; DIBITS];
    r34_decode_soft(dibits, &reliab, payload_out)
}

/// Soft-decision decode: `reliab` gives per-dibit confidence 0..=255.
///
/// A mismatched dibit contributes its reliability to the branch metric,
/// so low-confidence dibits are cheap to override. With all-255
/// reliabilities this degenerates to the hard decoder, which is why
/// soft can never do worse under a reliability-honest channel.
pub fn r34_decode_soft(
    dibits: &[u8; DIBITS],
    reliab: &[u8; DIBITS],
    payload_out: &mut [u8; PAYLOAD_BYTES],
) -> FecStatus {
    // Deinterleave both streams.
    let mut d = [0u8; DIBITS];
    let mut r = [0u8; DIBITS];
    for i in 0..DIBITS {
        let src = interleave_index(i);
        d[i] = dibits[src] & 3;
        r[i] = reliab[src];
    }

    // Per-step cost of each constellation point.
    let mut costs = [[0u32; 16]; TRIBITS];
    for t in 0..TRIBITS {
        let (d0, d1) = (d[2 * t], d[2 * t + 1]);
        let (r0, r1) = (u32::from(r[2 * t]).max(1), u32::from(r[2 * t + 1]).max(1));
        for p in 0..16u8 {
            let e0 = (p >> 2) & 3 != d0;
            let e1 = p & 3 != d1;
            costs[t][usize::from(p)] =
                if e0 { r0 } else { 0 } + if e1 { r1 } else { 0 };
        }
    }

    decode_points(&costs, payload_out).0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload_pattern(seed: u32) -> [u8; PAYLOAD_BYTES] {
        let mut p = [0u8; PAYLOAD_BYTES];
        for (i, b) in p.iter_mut().enumerate() {
            *b = ((seed >> (i % 24)) as u8).wrapping_mul(i as u8 + 3);
        }
        p
    }

    #[test]
    fn test_interleave_is_permutation() {
        let mut seen = [false; DIBITS];
        for i in 0..DIBITS {
            let j = interleave_index(i);
            assert!(!seen[j]);
            seen[j] = true;
        }
    }

    #[test]
    fn test_clean_round_trip() {
        let payload = payload_pattern(0xDA7A_BA5E);
        let mut dibits = [0u8; DIBITS];
        r34_encode(&payload, &mut dibits);
        let mut out = [0u8; PAYLOAD_BYTES];
        assert_eq!(r34_decode(&dibits, &mut out), FecStatus::Ok);
        assert_eq!(out, payload);
    }

    #[test]
    fn test_soft_recovers_marked_flips() {
        let payload = payload_pattern(0x5EED_F00D);
        let mut dibits = [0u8; DIBITS];
        r34_encode(&payload, &mut dibits);
        let mut reliab = [230u8; DIBITS];
        // Flip 6 scattered dibits, marking each as low-confidence.
        for k in 0..6 {
            let pos = k * 16 + 5;
            dibits[pos] ^= 2;
            reliab[pos] = 10;
        }
        let mut out = [0u8; PAYLOAD_BYTES];
        let st = r34_decode_soft(&dibits, &reliab, &mut out);
        assert_eq!(out, payload, "soft decode failed on marked flips");
        assert_eq!(st, FecStatus::Corrected);
    }

    #[test]
    fn test_soft_not_worse_than_hard() {
        // Noise model: flipped dibits carry low reliability, clean ones
        // high. Count payload byte errors for both decoders.
        let mut rng = 0x2468_ACE0u32;
        let mut step = || {
            rng = rng.wrapping_mul(1664525).wrapping_add(1013904223);
            rng
        };
        let mut hard_errs = 0usize;
        let mut soft_errs = 0usize;
        for trial in 0..20 {
            let payload = payload_pattern(0x1111_0000 + trial);
            let mut dibits = [0u8; DIBITS];
            r34_encode(&payload, &mut dibits);
            let mut reliab = [240u8; DIBITS];
            // ~8 random flips per frame
            for _ in 0..8 {
                let pos = (step() as usize) % DIBITS;
                let flip = ((step() >> 8) % 3 + 1) as u8;
                dibits[pos] ^= flip;
                reliab[pos] = (step() % 40) as u8;
            }
            let mut hard_out = [0u8; PAYLOAD_BYTES];
            let mut soft_out = [0u8; PAYLOAD_BYTES];
            let _ = r34_decode(&dibits, &mut hard_out);
            let _ = r34_decode_soft(&dibits, &reliab, &mut soft_out);
            hard_errs += hard_out
                .iter()
                .zip(&payload)
                .filter(|(a, b)| a != b)
                .count();
            soft_errs += soft_out
                .iter()
                .zip(&payload)
                .filter(|(a, b)| a != b)
                .count();
        }
        assert!(
            soft_errs <= hard_errs,
            "soft ({}) must not be worse than hard ({})",
            soft_errs,
            hard_errs
        );
    }
}
