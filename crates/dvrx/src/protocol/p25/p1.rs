// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! P25 Phase 1 voice frames (LDU1/LDU2).
//!
//! Each LDU carries nine 72-dibit IMBE codewords under the (iW,iX)/
//! (iY,iZ) interleave schedule, a link-control or encryption-sync word
//! spread across the frame as Hamming(10,6)-protected hexbits over a
//! shortened Reed-Solomon code, and two LSD(16,8) words.

use crate::fec::hamming::HAMMING_10_6;
use crate::fec::lsd::{lsd_decode, lsd_encode};
use crate::fec::rs::{rs24_12, rs24_16};
use crate::fec::FecStatus;

/// IMBE interleave schedule: dibit j writes bit 1 to `[IW[j]][IX[j]]`
/// and bit 0 to `[IY[j]][IZ[j]]` of the 8x23 frame matrix.
#[rustfmt::skip]
pub const IW: [usize; 72] = [
    0, 2, 4, 1, 3, 5, 0, 2, 4, 1, 3, 6, 0, 2, 4, 1, 3, 6, 0, 2, 4, 1, 3, 6,
    0, 2, 4, 1, 3, 6, 0, 2, 4, 1, 3, 6, 0, 2, 5, 1, 3, 6, 0, 2, 5, 1, 3, 6,
    0, 2, 5, 1, 3, 7, 0, 2, 5, 1, 3, 7, 0, 2, 5, 1, 4, 7, 0, 3, 5, 2, 4, 7,
];
#[rustfmt::skip]
pub const IX: [usize; 72] = [
    22, 20, 10, 20, 18,  0, 20, 18,  8, 18, 16, 13, 18, 16,  6, 16, 14, 11, 16, 14,  4, 14, 12,  9,
    14, 12,  2, 12, 10,  7, 12, 10,  0, 10,  8,  5, 10,  8, 13,  8,  6,  3,  8,  6, 11,  6,  4,  1,
     6,  4,  9,  4,  2,  6,  4,  2,  7,  2,  0,  4,  2,  0,  5,  0, 13,  2,  0, 21,  3, 21, 11,  0,
];
#[rustfmt::skip]
pub const IY: [usize; 72] = [
    1, 3, 5, 0, 2, 4, 1, 3, 6, 0, 2, 4, 1, 3, 6, 0, 2, 4, 1, 3, 6, 0, 2, 4,
    1, 3, 6, 0, 2, 4, 1, 3, 6, 0, 2, 5, 1, 3, 6, 0, 2, 5, 1, 3, 6, 0, 2, 5,
    1, 3, 6, 0, 2, 5, 1, 3, 7, 0, 2, 5, 1, 4, 7, 0, 3, 5, 2, 4, 7, 1, 3, 5,
];
#[rustfmt::skip]
pub const IZ: [usize; 72] = [
    21, 19,  1, 21, 19,  9, 19, 17, 14, 19, 17,  7, 17, 15, 12, 17, 15,  5, 15, 13, 10, 15, 13,  3,
    13, 11,  8, 13, 11,  1, 11,  9,  6, 11,  9, 14,  9,  7,  4,  9,  7, 12,  7,  5,  2,  7,  5, 10,
     5,  3,  0,  5,  3,  8,  3,  1,  5,  3,  1,  6,  1, 14,  3,  1, 22,  4, 22, 12,  1, 22, 20,  2,
];

/// 8x23 IMBE frame matrix (rows 4..7 only use 15 columns).
pub type ImbeFrame = [[u8; 23]; 8];

/// Scatter 72 dibits into the frame matrix through the schedule.
pub fn imbe_interleave(dibits: &[u8; 72], frame: &mut ImbeFrame) {
    for j in 0..72 {
        frame[IW[j]][IX[j]] = (dibits[j] >> 1) & 1;
        frame[IY[j]][IZ[j]] = dibits[j] & 1;
    }
}

/// Gather 72 dibits back out of the frame matrix.
pub fn imbe_deinterleave(frame: &ImbeFrame) -> [u8; 72] {
    let mut dibits = [0u8; 72];
    for j in 0..72 {
        let b1 = frame[IW[j]][IX[j]] & 1;
        let b0 = frame[IY[j]][IZ[j]] & 1;
        dibits[j] = (b1 << 1) | b0;
    }
    dibits
}

/// Flatten the frame matrix rows for the vocoder: rows 0..3 carry 23
/// bits, rows 4..7 carry 15. The 144 interleaved bits land inside this
/// span; the vocoder consumes the rows verbatim.
pub fn imbe_frame_bits(frame: &ImbeFrame, out: &mut Vec<u8>) {
    out.clear();
    for (r, row) in frame.iter().enumerate() {
        let cols = if r < 4 { 23 } else { 15 };
        out.extend_from_slice(&row[..cols]);
    }
}

/// Link-control word recovered from an LDU1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LduLinkControl {
    pub lco: u8,
    pub mfid: u8,
    pub svc: u8,
    pub tg: u16,
    pub src: u32,
    pub corrected_hexbits: usize,
}

/// Encryption sync word recovered from an LDU2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LduEncSync {
    pub mi: u64,
    pub algid: u8,
    pub keyid: u16,
    pub corrected_hexbits: usize,
}

/// Decode the 24 Hamming(10,6)-protected hexbits of an LDU control
/// word into RS symbols; returns the count of corrected hexbits or
/// `None` when any hexbit is unusable.
fn hexbits_from_codewords(codewords: &[[u8; 10]; 24]) -> Option<([u16; 24], usize)> {
    let mut symbols = [0u16; 24];
    let mut corrected = 0;
    for (i, cw) in codewords.iter().enumerate() {
        let mut bits = *cw;
        match HAMMING_10_6.decode(&mut bits) {
            FecStatus::Uncorrectable => return None,
            FecStatus::Corrected => corrected += 1,
            FecStatus::Ok => {}
        }
        let mut v = 0u16;
        for &b in &bits[..6] {
            v = (v << 1) | u16::from(b & 1);
        }
        symbols[i] = v;
    }
    Some((symbols, corrected))
}

/// Parse an LDU1 link control from its 24 protected hexbits.
pub fn decode_ldu1_lc(codewords: &[[u8; 10]; 24]) -> Option<LduLinkControl> {
    let (mut symbols, corrected) = hexbits_from_codewords(codewords)?;
    let (status, _) = rs24_12().decode(&mut symbols, &[]);
    if status == FecStatus::Uncorrectable {
        return None;
    }
    // 12 data hexbits = 72 bits: LCO(8) MFID(8) SVC(8) reserved(8)
    // TG(16) SRC(24).
    let mut bits = [0u8; 72];
    for (i, &s) in symbols[..12].iter().enumerate() {
        for b in 0..6 {
            bits[i * 6 + b] = ((s >> (5 - b)) & 1) as u8;
        }
    }
    let field = |lo: usize, n: usize| -> u32 {
        bits[lo..lo + n].iter().fold(0, |acc, b| (acc << 1) | u32::from(*b))
    };
    Some(LduLinkControl {
        lco: field(0, 8) as u8,
        mfid: field(8, 8) as u8,
        svc: field(16, 8) as u8,
        tg: field(32, 16) as u16,
        src: field(48, 24),
        corrected_hexbits: corrected,
    })
}

/// Build the protected hexbit codewords for an LDU1 LC (tests).
pub fn encode_ldu1_lc(lco: u8, mfid: u8, svc: u8, tg: u16, src: u32) -> [[u8; 10]; 24] {
    let mut bits = [0u8; 72];
    let mut put = |lo: usize, n: usize, v: u32| {
        for i in 0..n {
            bits[lo + i] = ((v >> (n - 1 - i)) & 1) as u8;
        }
    };
    put(0, 8, u32::from(lco));
    put(8, 8, u32::from(mfid));
    put(16, 8, u32::from(svc));
    put(32, 16, u32::from(tg));
    put(48, 24, src);

    let mut data = [0u16; 12];
    for (i, d) in data.iter_mut().enumerate() {
        let mut v = 0u16;
        for b in 0..6 {
            v = (v << 1) | u16::from(bits[i * 6 + b]);
        }
        *d = v;
    }
    let mut parity = [0u16; 12];
    rs24_12().encode(&data, &mut parity);

    let mut out = [[0u8; 10]; 24];
    for (i, cw) in out.iter_mut().enumerate() {
        let sym = if i < 12 { data[i] } else { parity[i - 12] };
        let mut sym_bits = [0u8; 6];
        for b in 0..6 {
            sym_bits[b] = ((sym >> (5 - b)) & 1) as u8;
        }
        HAMMING_10_6.encode(&sym_bits, cw);
    }
    out
}

/// Parse an LDU2 encryption sync word from its 24 protected hexbits.
pub fn decode_ldu2_es(codewords: &[[u8; 10]; 24]) -> Option<LduEncSync> {
    let (mut symbols, corrected) = hexbits_from_codewords(codewords)?;
    let (status, _) = rs24_16().decode(&mut symbols, &[]);
    if status == FecStatus::Uncorrectable {
        return None;
    }
    // 16 data hexbits = 96 bits: MI(64) ALGID(8) KID(16) reserved(8).
    let mut bits = [0u8; 96];
    for (i, &s) in symbols[..16].iter().enumerate() {
        for b in 0..6 {
            bits[i * 6 + b] = ((s >> (5 - b)) & 1) as u8;
        }
    }
    let mut mi = 0u64;
    for &b in &bits[..64] {
        mi = (mi << 1) | u64::from(b);
    }
    let mut alg = 0u8;
    for &b in &bits[64..72] {
        alg = (alg << 1) | b;
    }
    let mut kid = 0u16;
    for &b in &bits[72..88] {
        kid = (kid << 1) | u16::from(b);
    }
    Some(LduEncSync {
        mi,
        algid: alg,
        keyid: kid,
        corrected_hexbits: corrected,
    })
}

/// Build protected LDU2 ES hexbits (tests).
pub fn encode_ldu2_es(mi: u64, algid: u8, keyid: u16) -> [[u8; 10]; 24] {
    let mut bits = [0u8; 96];
    for i in 0..64 {
        bits[i] = ((mi >> (63 - i)) & 1) as u8;
    }
    for i in 0..8 {
        bits[64 + i] = (algid >> (7 - i)) & 1;
    }
    for i in 0..16 {
        bits[72 + i] = ((keyid >> (15 - i)) & 1) as u8;
    }
    let mut data = [0u16; 16];
    for (i, d) in data.iter_mut().enumerate() {
        let mut v = 0u16;
        for b in 0..6 {
            v = (v << 1) | u16::from(bits[i * 6 + b]);
        }
        *d = v;
    }
    let mut parity = [0u16; 8];
    rs24_16().encode(&data, &mut parity);
    let mut out = [[0u8; 10]; 24];
    for (i, cw) in out.iter_mut().enumerate() {
        let sym = if i < 16 { data[i] } else { parity[i - 16] };
        let mut sym_bits = [0u8; 6];
        for b in 0..6 {
            sym_bits[b] = ((sym >> (5 - b)) & 1) as u8;
        }
        HAMMING_10_6.encode(&sym_bits, cw);
    }
    out
}

/// Decode both LSD words of an LDU; returns `(lsd1, lsd2)` with `None`
/// marking an uncorrectable half.
pub fn decode_lsd(bits32: &[u8; 32]) -> (Option<u8>, Option<u8>) {
    let mut w1 = [0u8; 16];
    let mut w2 = [0u8; 16];
    w1.copy_from_slice(&bits32[..16]);
    w2.copy_from_slice(&bits32[16..]);
    let d1 = match lsd_decode(&mut w1) {
        FecStatus::Uncorrectable => None,
        _ => Some(byte_of(&w1[..8])),
    };
    let d2 = match lsd_decode(&mut w2) {
        FecStatus::Uncorrectable => None,
        _ => Some(byte_of(&w2[..8])),
    };
    (d1, d2)
}

/// Build the 32 LSD bits for a pair of data bytes (tests).
pub fn encode_lsd(d1: u8, d2: u8, out: &mut [u8; 32]) {
    let mut w = [0u8; 16];
    lsd_encode(d1, &mut w);
    out[..16].copy_from_slice(&w);
    lsd_encode(d2, &mut w);
    out[16..].copy_from_slice(&w);
}

fn byte_of(bits: &[u8]) -> u8 {
    bits.iter().fold(0, |acc, b| (acc << 1) | (b & 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleave_indices_in_range() {
        for j in 0..72 {
            assert!(IW[j] <= 7 && IY[j] <= 7);
            let xmax = if IW[j] < 4 { 23 } else { 15 };
            let zmax = if IY[j] < 4 { 23 } else { 15 };
            assert!(IX[j] < xmax, "IX[{}]={} out of range", j, IX[j]);
            assert!(IZ[j] < zmax, "IZ[{}]={} out of range", j, IZ[j]);
        }
    }

    #[test]
    fn test_interleave_round_trip() {
        let mut dibits = [0u8; 72];
        for (j, d) in dibits.iter_mut().enumerate() {
            *d = (j & 3) as u8;
        }
        let mut frame: ImbeFrame = [[0; 23]; 8];
        imbe_interleave(&dibits, &mut frame);
        assert_eq!(imbe_deinterleave(&frame), dibits);
    }

    #[test]
    fn test_frame_bits_length() {
        let frame: ImbeFrame = [[1; 23]; 8];
        let mut bits = Vec::new();
        imbe_frame_bits(&frame, &mut bits);
        assert_eq!(bits.len(), 4 * 23 + 4 * 15);
    }

    #[test]
    fn test_lc_round_trip_clean_and_with_errors() {
        let cw = encode_ldu1_lc(0x00, 0x00, 0x40, 0x2345, 0xBEE5);
        let lc = decode_ldu1_lc(&cw).expect("clean decode");
        assert_eq!(lc.tg, 0x2345);
        assert_eq!(lc.src, 0xBEE5);
        assert_eq!(lc.svc, 0x40);
        assert_eq!(lc.corrected_hexbits, 0);

        // One flipped bit inside a few hexbit codewords: Hamming layer
        // cleans them before the RS sees anything.
        let mut noisy = cw;
        noisy[0][3] ^= 1;
        noisy[7][9] ^= 1;
        noisy[20][0] ^= 1;
        let lc = decode_ldu1_lc(&noisy).expect("decode with hexbit errors");
        assert_eq!(lc.tg, 0x2345);
        assert_eq!(lc.corrected_hexbits, 3);
    }

    #[test]
    fn test_es_round_trip() {
        let cw = encode_ldu2_es(0x0123_4567_89AB_CDEF, 0x84, 0x1234);
        let es = decode_ldu2_es(&cw).expect("decode");
        assert_eq!(es.mi, 0x0123_4567_89AB_CDEF);
        assert_eq!(es.algid, 0x84);
        assert_eq!(es.keyid, 0x1234);
    }

    #[test]
    fn test_lsd_round_trip_and_correction() {
        let mut bits = [0u8; 32];
        encode_lsd(0xA5, 0x3C, &mut bits);
        bits[3] ^= 1; // single error in word 1
        bits[16] ^= 1; // single error in word 2
        let (d1, d2) = decode_lsd(&bits);
        assert_eq!(d1, Some(0xA5));
        assert_eq!(d2, Some(0x3C));
    }
}
