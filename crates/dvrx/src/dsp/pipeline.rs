// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Per-block demodulation pipeline.
//!
//! One [`Demodulator`] owns every stage's state and runs a block from
//! widened I/Q to audio (FM) or symbol baseband (PSK):
//!
//! 1. half-band decimation cascade
//! 2. polyphase rational resample to the DSP bandwidth
//! 3. FLL mix, Gardner timing adjust
//! 4. matched filter (RRC or short smoother)
//! 5. IQ balance (FM paths) or CQPSK equalizer (PSK paths)
//! 6. complex DC block, FM AGC/limiter, power squelch
//! 7. discriminator: FM polar, differential QPSK, or raw pass-through
//! 8. FM post-processing: deemphasis, audio DC block, one-pole LPF
//!
//! Discriminator output is normalized phase (pi == 1.0), so a clean
//! +90 degree rotation per sample lands at +0.5.

use crate::dsp::agc::FmAgc;
use crate::dsp::cqpsk::CqpskEq;
use crate::dsp::fir::SymmetricFir;
use crate::dsp::fll::FllBandEdge;
use crate::dsp::halfband::{HalfbandComplex, HB_TAPS_SHORT};
use crate::dsp::iq::{DcBlockIq, IqBalance};
use crate::dsp::math::{sat16, Q14_PI};
use crate::dsp::polar::{polar_disc_fast, polar_discriminant, AtanLut};
use crate::dsp::resampler::Resampler;
use crate::dsp::squelch::PowerSquelch;
use crate::dsp::ted::{gardner_adjust, TedConfig, TedState};

/// Discriminator selection, dispatched once per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Discriminator {
    /// FM polar discriminant between consecutive samples.
    #[default]
    Fm,
    /// Differential QPSK: arg(z[n] * conj(z[n-1])).
    QpskDiff,
    /// Pass-through (testing, symbol capture replay).
    Raw,
}

/// FM discriminator backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FmDiscBackend {
    /// Double-precision atan2 reference.
    Accurate,
    /// Integer approximation.
    #[default]
    Fast,
    /// Table-backed; falls back to Fast when the table is unavailable.
    Lut,
}

pub struct Demodulator {
    pub discriminator: Discriminator,
    pub fm_backend: FmDiscBackend,

    hb_stages: Vec<HalfbandComplex>,
    resamp: Option<(Resampler, Resampler)>,
    pub fll: Option<FllBandEdge>,
    pub ted_cfg: TedConfig,
    pub ted_state: TedState,
    matched: Option<SymmetricFir>,
    pub iqbal: IqBalance,
    pub dc_block: DcBlockIq,
    pub agc: FmAgc,
    pub squelch: PowerSquelch,
    pub cqpsk_enabled: bool,
    pub cqpsk: CqpskEq,

    // FM post-processing
    pub deemph_enabled: bool,
    pub deemph_alpha: f32,
    deemph_avg: f32,
    pub audio_dc_enabled: bool,
    audio_dc_avg: f32,
    pub audio_lpf_alpha: f32,
    pub audio_lpf_enabled: bool,
    audio_lpf_state: f32,

    lut: Option<AtanLut>,
    prev: (f32, f32),
    have_prev: bool,

    scratch: Vec<f32>,
    rail_i: Vec<f32>,
    rail_q: Vec<f32>,
    out_i: Vec<f32>,
    out_q: Vec<f32>,
    eq_buf: Vec<i16>,
    result: Vec<f32>,
}

impl Default for Demodulator {
    fn default() -> Self {
        Self::new()
    }
}

impl Demodulator {
    pub fn new() -> Self {
        Self {
            discriminator: Discriminator::Fm,
            fm_backend: FmDiscBackend::Fast,
            hb_stages: Vec::new(),
            resamp: None,
            fll: None,
            ted_cfg: TedConfig::default(),
            ted_state: TedState::default(),
            matched: None,
            iqbal: IqBalance::default(),
            dc_block: DcBlockIq::default(),
            agc: FmAgc::default(),
            squelch: PowerSquelch::default(),
            cqpsk_enabled: false,
            cqpsk: CqpskEq::new(),
            deemph_enabled: false,
            deemph_alpha: 0.1,
            deemph_avg: 0.0,
            audio_dc_enabled: false,
            audio_dc_avg: 0.0,
            audio_lpf_alpha: 0.25,
            audio_lpf_enabled: false,
            audio_lpf_state: 0.0,
            lut: AtanLut::new(),
            prev: (0.0, 0.0),
            have_prev: false,
            scratch: Vec::new(),
            rail_i: Vec::new(),
            rail_q: Vec::new(),
            out_i: Vec::new(),
            out_q: Vec::new(),
            eq_buf: Vec::new(),
            result: Vec::new(),
        }
    }

    /// Add `n` half-band decimate-by-2 stages (rate /2 each).
    pub fn set_decimation_stages(&mut self, n: usize) {
        self.hb_stages = (0..n).map(|_| HalfbandComplex::new(HB_TAPS_SHORT)).collect();
    }

    /// Enable the rational resampler at `l/m` on both rails.
    pub fn set_resampler(&mut self, l: usize, m: usize) {
        self.resamp = Some((Resampler::new(l, m), Resampler::new(l, m)));
    }

    /// Enable the band-edge FLL for `sps` samples per symbol.
    pub fn set_fll(&mut self, sps: u32) {
        self.fll = Some(FllBandEdge::new(sps));
    }

    /// Install the RRC matched filter.
    pub fn set_rrc(&mut self, sps: usize, span: usize, beta: f64) {
        self.matched = Some(SymmetricFir::rrc(sps, span, beta));
    }

    /// Install the short matched-like smoother.
    pub fn set_mf5(&mut self) {
        self.matched = Some(SymmetricFir::mf5());
    }

    /// Drop the matched filter.
    pub fn clear_matched(&mut self) {
        self.matched = None;
    }

    /// Reset per-call runtime state (timing, discriminator history).
    pub fn reset_runtime(&mut self) {
        self.ted_state.reset();
        self.have_prev = false;
        self.deemph_avg = 0.0;
        self.audio_dc_avg = 0.0;
        self.audio_lpf_state = 0.0;
        self.cqpsk.reset_runtime();
    }

    /// Run one block. `iq` is interleaved normalized I/Q and is consumed
    /// in place by the front half; the returned slice is the block's
    /// demodulated output (audio for FM, symbol phase for PSK).
    pub fn process(&mut self, iq: &mut Vec<f32>) -> &[f32] {
        for hb in &mut self.hb_stages {
            hb.process_inplace(iq);
        }

        if let Some((ri, rq)) = &mut self.resamp {
            let pairs = iq.len() / 2;
            self.rail_i.clear();
            self.rail_q.clear();
            for n in 0..pairs {
                self.rail_i.push(iq[2 * n]);
                self.rail_q.push(iq[2 * n + 1]);
            }
            self.out_i.clear();
            self.out_q.clear();
            ri.process(&self.rail_i, &mut self.out_i);
            rq.process(&self.rail_q, &mut self.out_q);
            iq.clear();
            for n in 0..self.out_i.len().min(self.out_q.len()) {
                iq.push(self.out_i[n]);
                iq.push(self.out_q[n]);
            }
        }

        if let Some(fll) = &mut self.fll {
            fll.process(iq);
        }

        if self.ted_cfg.enabled {
            gardner_adjust(&self.ted_cfg, &mut self.ted_state, iq, &mut self.scratch);
            std::mem::swap(iq, &mut self.scratch);
        }

        if let Some(mf) = &mut self.matched {
            mf.process_inplace(iq);
        }

        if self.cqpsk_enabled {
            self.eq_buf.clear();
            self.eq_buf
                .extend(iq.iter().map(|v| sat16((v * 32768.0) as i32)));
            self.cqpsk.process_block(&mut self.eq_buf);
            for (dst, src) in iq.iter_mut().zip(&self.eq_buf) {
                *dst = f32::from(*src) / 32768.0;
            }
        } else {
            self.iqbal.process(iq);
        }

        self.dc_block.process(iq);
        self.agc.process(iq);
        let squelched = self.squelch.process(iq);

        self.result.clear();
        match self.discriminator {
            Discriminator::Raw => {
                self.result.extend_from_slice(iq);
            }
            Discriminator::Fm | Discriminator::QpskDiff => {
                let pairs = iq.len() / 2;
                self.result.reserve(pairs);
                for n in 0..pairs {
                    let cur = (iq[2 * n], iq[2 * n + 1]);
                    if self.have_prev {
                        let q14 = self.disc_q14(self.prev, cur);
                        self.result.push(q14 as f32 / Q14_PI as f32);
                    } else {
                        self.result.push(0.0);
                        self.have_prev = true;
                    }
                    self.prev = cur;
                }
                if squelched {
                    self.result.fill(0.0);
                }
                if self.discriminator == Discriminator::Fm {
                    self.post_process_fm();
                }
            }
        }
        &self.result
    }

    /// Q14 phase delta between consecutive complex samples.
    fn disc_q14(&self, a: (f32, f32), b: (f32, f32)) -> i32 {
        const S: f32 = 32768.0;
        let ar = (a.0 * S) as i32;
        let aj = (a.1 * S) as i32;
        let br = (b.0 * S) as i32;
        let bj = (b.1 * S) as i32;
        match self.discriminator {
            Discriminator::QpskDiff => polar_disc_fast(ar, aj, br, bj),
            _ => match self.fm_backend {
                FmDiscBackend::Accurate => polar_discriminant(ar, aj, br, bj),
                FmDiscBackend::Fast => polar_disc_fast(ar, aj, br, bj),
                FmDiscBackend::Lut => match &self.lut {
                    Some(l) => l.polar_disc(ar, aj, br, bj),
                    None => polar_disc_fast(ar, aj, br, bj),
                },
            },
        }
    }

    fn post_process_fm(&mut self) {
        if self.deemph_enabled {
            for s in self.result.iter_mut() {
                self.deemph_avg += self.deemph_alpha * (*s - self.deemph_avg);
                *s = self.deemph_avg;
            }
        }
        if self.audio_dc_enabled {
            for s in self.result.iter_mut() {
                self.audio_dc_avg += 0.01 * (*s - self.audio_dc_avg);
                *s -= self.audio_dc_avg;
            }
        }
        if self.audio_lpf_enabled {
            for s in self.result.iter_mut() {
                self.audio_lpf_state += self.audio_lpf_alpha * (*s - self.audio_lpf_state);
                *s = self.audio_lpf_state;
            }
        }
    }
}
