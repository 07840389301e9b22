// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! FM polar discriminators.
//!
//! All three variants compute `arg(b * conj(a))` between consecutive
//! complex samples and return the phase delta in Q14 (pi == 1<<14):
//!
//! - [`polar_discriminant`]: double-precision atan2 reference
//! - [`polar_disc_fast`]: integer piecewise-linear atan2
//! - [`AtanLut`]: table-backed atan; construction can decline, callers
//!   fall back to the fast variant
//!
//! Inputs are integer I/Q components; intermediates are 64-bit so
//! full-scale int16 products cannot overflow.

use crate::dsp::math::{fast_atan2_q14, Q14_PI};

/// Accurate discriminator (double-precision atan2).
#[inline]
pub fn polar_discriminant(ar: i32, aj: i32, br: i32, bj: i32) -> i32 {
    let cr = i64::from(br) * i64::from(ar) + i64::from(bj) * i64::from(aj);
    let cj = i64::from(bj) * i64::from(ar) - i64::from(br) * i64::from(aj);
    let angle = (cj as f64).atan2(cr as f64);
    (angle / std::f64::consts::PI * f64::from(Q14_PI)).round() as i32
}

/// Fast discriminator (integer atan2 approximation).
#[inline]
pub fn polar_disc_fast(ar: i32, aj: i32, br: i32, bj: i32) -> i32 {
    let cr = i64::from(br) * i64::from(ar) + i64::from(bj) * i64::from(aj);
    let cj = i64::from(bj) * i64::from(ar) - i64::from(br) * i64::from(aj);
    fast_atan2_q14(cj, cr)
}

/// Number of entries in the atan ratio table.
const LUT_BITS: u32 = 12;
const LUT_SIZE: usize = 1 << LUT_BITS;

/// Table-backed atan over the first octant with octant folding.
pub struct AtanLut {
    /// atan(t) in Q14 for t = idx / LUT_SIZE, t in [0, 1].
    table: Box<[i16]>,
}

impl AtanLut {
    /// Build the table. Returns `None` if allocation fails so callers can
    /// fall back to [`polar_disc_fast`]; allocation failure is the only
    /// decline path.
    pub fn new() -> Option<Self> {
        let mut v = Vec::new();
        v.try_reserve_exact(LUT_SIZE + 1).ok()?;
        for idx in 0..=LUT_SIZE {
            let t = idx as f64 / LUT_SIZE as f64;
            let q14 = (t.atan() / std::f64::consts::PI * f64::from(Q14_PI)).round() as i16;
            v.push(q14);
        }
        Some(Self {
            table: v.into_boxed_slice(),
        })
    }

    /// atan2 via the table, Q14 output.
    fn atan2_q14(&self, y: i64, x: i64) -> i32 {
        if x == 0 && y == 0 {
            return 0;
        }
        let ya = y.abs();
        let xa = x.abs();
        // First octant: ratio = min/max in [0,1].
        let (num, den) = if ya <= xa { (ya, xa) } else { (xa, ya) };
        let idx = if den == 0 {
            0
        } else {
            ((num << LUT_BITS) / den) as usize
        };
        let mut angle = i32::from(self.table[idx.min(LUT_SIZE)]);
        if ya > xa {
            angle = Q14_PI / 2 - angle;
        }
        if x < 0 {
            angle = Q14_PI - angle;
        }
        if y < 0 {
            angle = -angle;
        }
        angle
    }

    /// LUT discriminator.
    #[inline]
    pub fn polar_disc(&self, ar: i32, aj: i32, br: i32, bj: i32) -> i32 {
        let cr = i64::from(br) * i64::from(ar) + i64::from(bj) * i64::from(aj);
        let cj = i64::from(bj) * i64::from(ar) - i64::from(br) * i64::from(aj);
        self.atan2_q14(cj, cr)
    }
}

/// LUT discriminator with automatic fallback to the fast variant.
#[inline]
pub fn polar_disc_lut(lut: Option<&AtanLut>, ar: i32, aj: i32, br: i32, bj: i32) -> i32 {
    match lut {
        Some(l) => l.polar_disc(ar, aj, br, bj),
        None => polar_disc_fast(ar, aj, br, bj),
    }
}
