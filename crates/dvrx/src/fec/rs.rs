// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Reed-Solomon codes over GF(64) and GF(256).
//!
//! One errors-and-erasures decoder (Berlekamp-Massey + Chien + Forney)
//! serves every instance; codes differ only in field, root count and
//! first consecutive root. All P25 codes are shortened RS(63,k) over
//! 6-bit hexbits; the FACCH/SACCH wrappers additionally pad the parity
//! tail with erased zero symbols so the same RS(63,35) engine covers
//! their 19- and 22-symbol parities.
//!
//! Codewords are symbol slices `[data | parity]`, index 0 transmitted
//! first; erasure positions index into that slice.

use super::FecStatus;
use std::sync::OnceLock;

/// Log/antilog tables for one field.
pub struct GfField {
    /// Field size minus one (63 or 255).
    pub nn: usize,
    log: Vec<u16>,
    exp: Vec<u16>,
}

impl GfField {
    pub fn new(m: u32, prim: u32) -> Self {
        let nn = (1usize << m) - 1;
        let mut log = vec![0u16; nn + 1];
        let mut exp = vec![0u16; 2 * nn];
        let mut x = 1u32;
        for i in 0..nn {
            exp[i] = x as u16;
            log[x as usize] = i as u16;
            x <<= 1;
            if x & (1 << m) != 0 {
                x ^= prim;
            }
        }
        for i in nn..2 * nn {
            exp[i] = exp[i - nn];
        }
        Self { nn, log, exp }
    }

    #[inline]
    fn mul(&self, a: u16, b: u16) -> u16 {
        if a == 0 || b == 0 {
            return 0;
        }
        self.exp[(usize::from(self.log[a as usize]) + usize::from(self.log[b as usize])) % self.nn]
    }

    #[inline]
    fn div(&self, a: u16, b: u16) -> u16 {
        if a == 0 {
            return 0;
        }
        self.exp[(usize::from(self.log[a as usize]) + self.nn
            - usize::from(self.log[b as usize]))
            % self.nn]
    }

    #[inline]
    fn pow_alpha(&self, e: usize) -> u16 {
        self.exp[e % self.nn]
    }
}

/// One Reed-Solomon code bound to a field.
pub struct RsCode {
    field: &'static GfField,
    pub nroots: usize,
    pub fcr: usize,
    gen: Vec<u16>,
}

impl RsCode {
    pub fn new(field: &'static GfField, nroots: usize, fcr: usize) -> Self {
        // Generator = product (x - alpha^(fcr+i)), i = 0..nroots-1.
        let mut gen = vec![0u16; nroots + 1];
        gen[0] = 1;
        for i in 0..nroots {
            let root = field.pow_alpha(fcr + i);
            let mut next = vec![0u16; nroots + 1];
            for j in (0..=i).rev() {
                next[j + 1] ^= gen[j];
                next[j] ^= field.mul(gen[j], root);
            }
            gen[..=i + 1].copy_from_slice(&next[..=i + 1]);
        }
        Self {
            field,
            nroots,
            fcr,
            gen,
        }
    }

    /// Systematic encode: compute `nroots` parity symbols for `data`.
    pub fn encode(&self, data: &[u16], parity: &mut [u16]) {
        let f = self.field;
        for p in parity.iter_mut().take(self.nroots) {
            *p = 0;
        }
        for &d in data {
            let fb = d ^ parity[0];
            for i in 0..self.nroots - 1 {
                let g = self.gen[self.nroots - 1 - i];
                parity[i] = parity[i + 1] ^ f.mul(fb, g);
            }
            parity[self.nroots - 1] = f.mul(fb, self.gen[0]);
        }
    }

    /// Errors-and-erasures decode of `cw = [data | parity]` in place.
    ///
    /// Returns the status and the number of corrected symbols. The
    /// slice may be shorter than the natural length (shortened code).
    pub fn decode(&self, cw: &mut [u16], erasures: &[usize]) -> (FecStatus, usize) {
        let f = self.field;
        let len = cw.len();
        let nroots = self.nroots;
        if len <= nroots || erasures.len() > nroots {
            return (FecStatus::Uncorrectable, 0);
        }

        // Syndromes S_i = r(alpha^(fcr+i)); symbol j has x-power len-1-j.
        let mut s = vec![0u16; nroots];
        let mut any = false;
        for (i, si) in s.iter_mut().enumerate() {
            let mut acc = 0u16;
            for (j, &c) in cw.iter().enumerate() {
                if c != 0 {
                    let e = usize::from(f.log[c as usize]) + (self.fcr + i) * (len - 1 - j);
                    acc ^= f.exp[e % f.nn];
                }
            }
            *si = acc;
            any |= acc != 0;
        }
        if !any {
            return (FecStatus::Ok, 0);
        }

        // Erasure locator: product (1 + X_k x), X_k = alpha^(len-1-pos).
        let mut lambda = vec![0u16; nroots + 1];
        lambda[0] = 1;
        for &pos in erasures {
            if pos >= len {
                return (FecStatus::Uncorrectable, 0);
            }
            let x = f.pow_alpha(len - 1 - pos);
            for j in (0..nroots).rev() {
                let t = f.mul(lambda[j], x);
                lambda[j + 1] ^= t;
            }
        }
        let no_eras = erasures.len();

        // Berlekamp-Massey, seeded with the erasure locator.
        let mut b = lambda.clone();
        let mut el = no_eras;
        for r in (no_eras + 1)..=nroots {
            let mut discr = 0u16;
            for i in 0..r {
                if lambda[i] != 0 && s[r - i - 1] != 0 {
                    discr ^= f.mul(lambda[i], s[r - i - 1]);
                }
            }
            if discr == 0 {
                // b = x * b
                b.rotate_right(1);
                b[0] = 0;
            } else {
                let mut t = vec![0u16; nroots + 1];
                t[0] = lambda[0];
                for i in 0..nroots {
                    t[i + 1] = lambda[i + 1] ^ f.mul(discr, b[i]);
                }
                if 2 * el <= r + no_eras - 1 {
                    el = r + no_eras - el;
                    for i in 0..=nroots {
                        b[i] = f.div(lambda[i], discr);
                    }
                } else {
                    b.rotate_right(1);
                    b[0] = 0;
                }
                lambda = t;
            }
        }

        let deg_lambda = (0..=nroots).rev().find(|&i| lambda[i] != 0).unwrap_or(0);
        if deg_lambda == 0 {
            return (FecStatus::Uncorrectable, 0);
        }

        // Chien search over the transmitted positions.
        let mut roots = Vec::with_capacity(deg_lambda);
        for p in 0..len {
            // Candidate error at power p: test lambda(alpha^-p).
            let xinv = f.pow_alpha(f.nn - (p % f.nn));
            let mut v = 0u16;
            let mut xp = 1u16;
            for &l in lambda.iter().take(deg_lambda + 1) {
                if l != 0 {
                    v ^= f.mul(l, xp);
                }
                xp = f.mul(xp, xinv);
            }
            if v == 0 {
                roots.push(p);
            }
        }
        if roots.len() != deg_lambda {
            return (FecStatus::Uncorrectable, 0);
        }

        // Evaluator omega = S * lambda mod x^nroots.
        let mut omega = vec![0u16; nroots];
        for i in 0..nroots {
            let mut acc = 0u16;
            for j in 0..=i.min(deg_lambda) {
                if lambda[j] != 0 && s[i - j] != 0 {
                    acc ^= f.mul(lambda[j], s[i - j]);
                }
            }
            omega[i] = acc;
        }

        // Forney magnitudes at each root.
        let mut corrected = 0usize;
        for &p in &roots {
            let xinv = f.pow_alpha(f.nn - (p % f.nn));
            // omega(X^-1)
            let mut num = 0u16;
            let mut xp = 1u16;
            for &o in &omega {
                if o != 0 {
                    num ^= f.mul(o, xp);
                }
                xp = f.mul(xp, xinv);
            }
            // X^(1-fcr) factor
            if self.fcr == 0 {
                num = f.mul(num, f.pow_alpha(p));
            } else {
                for _ in 1..self.fcr {
                    num = f.mul(num, xinv);
                }
            }
            // lambda'(X^-1): odd-degree terms only
            let mut den = 0u16;
            let mut xp = 1u16; // (X^-1)^0, advanced by squares
            let xinv2 = f.mul(xinv, xinv);
            let mut i = 1;
            while i <= deg_lambda {
                if lambda[i] != 0 {
                    den ^= f.mul(lambda[i], xp);
                }
                xp = f.mul(xp, xinv2);
                i += 2;
            }
            if den == 0 {
                return (FecStatus::Uncorrectable, 0);
            }
            let mag = f.div(num, den);
            let idx = len - 1 - p;
            if mag != 0 {
                cw[idx] ^= mag;
                corrected += 1;
            }
        }

        // Verify: residual syndromes must vanish.
        for i in 0..nroots {
            let mut acc = 0u16;
            for (j, &c) in cw.iter().enumerate() {
                if c != 0 {
                    let e = usize::from(f.log[c as usize]) + (self.fcr + i) * (len - 1 - j);
                    acc ^= f.exp[e % f.nn];
                }
            }
            if acc != 0 {
                return (FecStatus::Uncorrectable, corrected);
            }
        }
        (FecStatus::Corrected, corrected)
    }
}

/// GF(64) with x^6 + x + 1 (P25 hexbit codes).
pub fn gf64() -> &'static GfField {
    static F: OnceLock<GfField> = OnceLock::new();
    F.get_or_init(|| GfField::new(6, 0x43))
}

/// GF(256) with x^8 + x^4 + x^3 + x^2 + 1 (DMR full LC).
pub fn gf256() -> &'static GfField {
    static F: OnceLock<GfField> = OnceLock::new();
    F.get_or_init(|| GfField::new(8, 0x11D))
}

/// Shortened RS(24,12,13) (P25 P1 LDU1 link control).
pub fn rs24_12() -> &'static RsCode {
    static C: OnceLock<RsCode> = OnceLock::new();
    C.get_or_init(|| RsCode::new(gf64(), 12, 1))
}

/// Shortened RS(24,16,9) (P25 P1 LDU2 encryption sync).
pub fn rs24_16() -> &'static RsCode {
    static C: OnceLock<RsCode> = OnceLock::new();
    C.get_or_init(|| RsCode::new(gf64(), 8, 1))
}

/// Shortened RS(36,20,17) (P25 P1 header word).
pub fn rs36_20() -> &'static RsCode {
    static C: OnceLock<RsCode> = OnceLock::new();
    C.get_or_init(|| RsCode::new(gf64(), 16, 1))
}

/// RS(63,35,29) (P25 Phase 2 FACCH/SACCH/ESS, shortened per wrapper).
pub fn rs63_35() -> &'static RsCode {
    static C: OnceLock<RsCode> = OnceLock::new();
    C.get_or_init(|| RsCode::new(gf64(), 28, 1))
}

/// RS(12,9,4) over GF(256) (DMR full link control).
pub fn rs12_9() -> &'static RsCode {
    static C: OnceLock<RsCode> = OnceLock::new();
    C.get_or_init(|| RsCode::new(gf256(), 3, 0))
}
