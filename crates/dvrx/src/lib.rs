// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # DVRX - Real-time digital voice and trunking radio decoder
//!
//! A pure Rust decoder for digital voice and trunking protocols (P25 Phase
//! 1/2, DMR, NXDN, M17, D-STAR, YSF, dPMR, ProVoice/EDACS) fed by RF I/Q
//! from an SDR or pre-demodulated PCM.
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                          Engine / Threads                           |
//! |  source -> input ring -> demod -> dispatch -> decode -> audio sink  |
//! +---------------------------------------------------------------------+
//! |                           DSP Pipeline                              |
//! |  widen | half-band | resample | FLL | TED | RRC | IQ bal | AGC/EQ   |
//! +---------------------------------------------------------------------+
//! |                     Frame Sync + Protocol Layer                     |
//! |  sync scan (remaps/polarity) | handler table | FEC | crypto | parse |
//! +---------------------------------------------------------------------+
//! |                        Trunking + Audio Layer                       |
//! |  P25/DMR follower SMs | CC candidates | jitter rings | mixer gates  |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`engine::Engine`] | Owns the thread graph and wires rings, hooks and decoders |
//! | [`config::Config`] | Typed runtime configuration snapshot |
//! | [`dsp::pipeline::Demodulator`] | One-block DSP pipeline (I/Q in, audio or symbols out) |
//! | [`sync::FrameSync`] | Dibit sync pattern scanner |
//! | [`trunk::P25TrunkSm`] | P25 voice-channel follower state machine |
//!
//! ## Threads
//!
//! - *source*: reads samples, writes the SPSC input ring
//! - *demod*: drains the ring, runs DSP + frame sync + protocol decode
//! - *audio sink*: pops per-slot jitter rings, feeds the output backend
//! - *watchdog*: 1 Hz trunking tick while the demod thread is stalled
//!
//! Sample order is strictly preserved along the SPSC path; the trunking
//! state machine is the only state shared across threads and carries its
//! own lock.

/// Per-slot audio gating, jitter rings, mixing and the 8k->48k upsampler.
pub mod audio;
/// Typed runtime configuration and global DSP constants.
pub mod config;
/// Crypto keystream generators for voice frames (AES, DES, RC2/RC4, LFSR, PC4).
pub mod crypto;
/// Protocol dispatch table mapping sync kinds to frame handlers.
pub mod dispatch;
/// DSP kernels and the per-block demodulation pipeline.
pub mod dsp;
/// Error type for the engine/configuration/IO boundary.
pub mod error;
/// Call event records, bounded history ring and log-line formatting.
pub mod events;
/// Forward error correction primitives (Hamming, Golay, RS, BCH, BPTC, Viterbi, CRC).
pub mod fec;
/// Compile-time configurable logging system (zero-cost when disabled).
pub mod logging;
/// Protocol decoders (P25 P1/P2, DMR, M17, NXDN, D-STAR, YSF, dPMR, ProVoice).
pub mod protocol;
/// Runtime primitives: input ring, shutdown flag, hooks, scheduling, parsing.
pub mod runtime;
/// Frame sync pattern search and modulation auto-detect.
pub mod sync;
/// Trunking state machines, control-channel candidates, patches, watchdog.
pub mod trunk;

/// Engine wiring: thread graph, config apply, shutdown.
pub mod engine;

pub use config::Config;
pub use error::{Error, Result};
