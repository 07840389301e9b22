// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Systematic Hamming codes used by the DMR/dPMR/NXDN paths.
//!
//! Codewords are laid out `[d0..d(k-1), p0..p(n-k-1)]` as MSB-first 0/1
//! bytes. Each code is defined by its parity masks (one mask of data
//! bits per parity bit); decode corrects any single bit via syndrome
//! matching. The extended (16,11,4) code additionally detects double
//! errors through its overall parity row.

use super::FecStatus;

/// One systematic Hamming code.
pub struct HammingCode {
    pub n: usize,
    pub k: usize,
    /// Parity masks over the data bits, one per parity bit; bit `i`
    /// (LSB = d0) of a mask includes data bit `i` in that parity.
    masks: &'static [u32],
}

/// Hamming (7,4,3).
pub const HAMMING_7_4: HammingCode = HammingCode {
    n: 7,
    k: 4,
    masks: &[0b1011, 0b1101, 0b0111],
};

/// Hamming (10,6,3): protects P25 hexbits in LC/ES words.
pub const HAMMING_10_6: HammingCode = HammingCode {
    n: 10,
    k: 6,
    masks: &[0b110101, 0b101011, 0b011110, 0b111000],
};

/// Hamming (12,8,3). Data syndrome columns are 3,5,6,7,9,10,11,12.
pub const HAMMING_12_8: HammingCode = HammingCode {
    n: 12,
    k: 8,
    masks: &[0b01011011, 0b01101101, 0b10001110, 0b11110000],
};

/// Hamming (13,9,3). Data syndrome columns are 3,5,6,7,9,10,11,12,13.
pub const HAMMING_13_9: HammingCode = HammingCode {
    n: 13,
    k: 9,
    masks: &[0b101011011, 0b001101101, 0b110001110, 0b111110000],
};

/// Hamming (15,11,3), the perfect single-error-correcting code.
/// Data columns are every non-unit value 3,5,6,7,9..15.
pub const HAMMING_15_11: HammingCode = HammingCode {
    n: 15,
    k: 11,
    masks: &[
        0b10101011011,
        0b11001101101,
        0b11110001110,
        0b11111110000,
    ],
};

/// Extended Hamming (16,11,4): (15,11) plus overall parity.
pub const HAMMING_16_11: HammingCode = HammingCode {
    n: 16,
    k: 11,
    masks: &[
        0b10101011011,
        0b11001101101,
        0b11110001110,
        0b11111110000,
        0b11111111111, // overall parity over data (plus all parity at encode)
    ],
};

/// Hamming (17,12,3): DMR short LC.
pub const HAMMING_17_12: HammingCode = HammingCode {
    n: 17,
    k: 12,
    masks: &[
        // c0 = d0^d1^d2^d3^d6^d7^d9
        0b001011001111,
        // c1 = d0^d1^d2^d3^d4^d7^d8^d10
        0b010110011111,
        // c2 = d1^d2^d3^d4^d5^d8^d9^d11
        0b101100111110,
        // c3 = d0^d1^d4^d5^d7^d10
        0b010010110011,
        // c4 = d0^d1^d2^d5^d6^d8^d11
        0b100101100111,
    ],
};

impl HammingCode {
    fn parity_count(&self) -> usize {
        self.n - self.k
    }

    /// Syndrome column of data bit `j` (LSB = first parity row).
    fn data_column(&self, j: usize) -> u32 {
        let mut col = 0u32;
        for (row, mask) in self.masks.iter().enumerate() {
            if mask >> j & 1 != 0 {
                col |= 1 << row;
            }
        }
        col
    }

    /// Compute parity bits for `data` (k bits) into `parity`.
    pub fn encode_parity(&self, data: &[u8], parity: &mut [u8]) {
        for (row, mask) in self.masks.iter().enumerate() {
            let mut p = 0u8;
            for j in 0..self.k {
                if mask >> j & 1 != 0 {
                    p ^= data[j] & 1;
                }
            }
            parity[row] = p;
        }
        // Extended code: the overall row also covers the other parity
        // bits, keeping total codeword weight even.
        if self.n == 16 && self.k == 11 {
            let last = self.parity_count() - 1;
            let mut p = parity[last];
            for bit in parity.iter().take(last) {
                p ^= *bit & 1;
            }
            parity[last] = p;
        }
    }

    /// Systematic encode: `data` (k bits) -> `out` (n bits).
    pub fn encode(&self, data: &[u8], out: &mut [u8]) {
        out[..self.k].copy_from_slice(&data[..self.k]);
        let (d, p) = out.split_at_mut(self.k);
        self.encode_parity(d, p);
    }

    /// Decode `bits` (n bits) in place, correcting one bit.
    pub fn decode(&self, bits: &mut [u8]) -> FecStatus {
        let p = self.parity_count();
        let mut expected = [0u8; 8];
        let (data, parity) = bits.split_at_mut(self.k);
        self.encode_parity(data, &mut expected[..p]);
        let mut syndrome = 0u32;
        for row in 0..p {
            if (expected[row] ^ parity[row]) & 1 != 0 {
                syndrome |= 1 << row;
            }
        }
        if syndrome == 0 {
            return FecStatus::Ok;
        }
        // Single parity-bit error: one-hot syndrome.
        if syndrome & (syndrome - 1) == 0 {
            let row = syndrome.trailing_zeros() as usize;
            // Extended code: a lone parity flip also toggles the
            // overall row, so one-hot points at the real parity bit
            // only for the overall row itself.
            if !(self.n == 16 && self.k == 11) || row == p - 1 {
                parity[row] ^= 1;
                return FecStatus::Corrected;
            }
        }
        for j in 0..self.k {
            let mut col = self.data_column(j);
            if self.n == 16 && self.k == 11 {
                col |= 1 << (p - 1); // every data bit sits in the overall row
            }
            if col == syndrome {
                data[j] ^= 1;
                return FecStatus::Corrected;
            }
        }
        // Extended code: non-overall parity flip = that row + overall.
        if self.n == 16 && self.k == 11 {
            for row in 0..p - 1 {
                if syndrome == (1 << row) | (1 << (p - 1)) {
                    parity[row] ^= 1;
                    return FecStatus::Corrected;
                }
            }
        }
        FecStatus::Uncorrectable
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_codes() -> [&'static HammingCode; 7] {
        [
            &HAMMING_7_4,
            &HAMMING_10_6,
            &HAMMING_12_8,
            &HAMMING_13_9,
            &HAMMING_15_11,
            &HAMMING_16_11,
            &HAMMING_17_12,
        ]
    }

    fn pattern_data(k: usize, seed: u32) -> Vec<u8> {
        (0..k).map(|i| ((seed >> (i % 31)) & 1) as u8).collect()
    }

    #[test]
    fn test_columns_distinct_and_nonzero() {
        for code in all_codes() {
            let p = code.n - code.k;
            let mut seen = std::collections::HashSet::new();
            for j in 0..code.k {
                let mut col = code.data_column(j);
                if code.n == 16 && code.k == 11 {
                    col |= 1 << (p - 1);
                }
                assert!(col != 0, "zero column in ({},{})", code.n, code.k);
                assert!(
                    seen.insert(col),
                    "duplicate column {} in ({},{})",
                    col,
                    code.n,
                    code.k
                );
                // Must not collide with single parity-bit syndromes
                assert!(col & (col - 1) != 0, "unit column in ({},{})", code.n, code.k);
            }
        }
    }

    #[test]
    fn test_valid_codewords_pass() {
        for code in all_codes() {
            for seed in [0u32, 0xFFFF_FFFF, 0xA5A5_5A5A, 0x1234_5678] {
                let data = pattern_data(code.k, seed);
                let mut cw = vec![0u8; code.n];
                code.encode(&data, &mut cw);
                assert_eq!(code.decode(&mut cw), FecStatus::Ok);
                assert_eq!(&cw[..code.k], &data[..]);
            }
        }
    }

    #[test]
    fn test_single_bit_correction_everywhere() {
        for code in all_codes() {
            let data = pattern_data(code.k, 0xC3A5_0F1E);
            let mut clean = vec![0u8; code.n];
            code.encode(&data, &mut clean);
            for pos in 0..code.n {
                let mut cw = clean.clone();
                cw[pos] ^= 1;
                let st = code.decode(&mut cw);
                assert_eq!(
                    st,
                    FecStatus::Corrected,
                    "({},{}) flip at {}",
                    code.n,
                    code.k,
                    pos
                );
                assert_eq!(cw, clean, "({},{}) not restored at {}", code.n, code.k, pos);
            }
        }
    }

    #[test]
    fn test_extended_code_detects_doubles() {
        let code = &HAMMING_16_11;
        let data = pattern_data(code.k, 0x0F0F_1357);
        let mut clean = vec![0u8; code.n];
        code.encode(&data, &mut clean);
        for a in 0..code.n {
            for b in (a + 1)..code.n {
                let mut cw = clean.clone();
                cw[a] ^= 1;
                cw[b] ^= 1;
                assert_eq!(
                    code.decode(&mut cw),
                    FecStatus::Uncorrectable,
                    "double error {} {} slipped through",
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_slc_activity_update_parity() {
        // Opcode=1, ts1=Group Voice (0x8), ts2=Idle (0x0): the parity
        // relations must hold for this broadcast shape.
        let code = &HAMMING_17_12;
        let mut data = vec![0u8; 12];
        // slco=0x1 in bits 0..4, ts1=0x8 in 4..8, ts2=0x0
        data[3] = 1; // opcode LSB
        data[4] = 1; // ts1 MSB
        let mut cw = vec![0u8; 17];
        code.encode(&data, &mut cw);
        assert_eq!(code.decode(&mut cw), FecStatus::Ok);

        // All-zero codeword (SLCO NULL) is valid
        let mut zero = vec![0u8; 17];
        assert_eq!(code.decode(&mut zero), FecStatus::Ok);
    }
}
