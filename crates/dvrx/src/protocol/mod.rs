// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol decoders.
//!
//! Every decoder follows the same shape: deframe a protocol-specific
//! span of dibits, undo interleaving/scrambling, run FEC, parse the
//! control payloads, hand voice codewords to the vocoder black box,
//! and publish events. Decoders are explicit state machines fed by the
//! dispatcher; none keep hidden static accumulators.

pub mod dmr;
pub mod dpmr;
pub mod dstar;
pub mod m17;
pub mod nxdn;
pub mod p25;
pub mod provoice;
pub mod ysf;

use std::sync::Arc;

use crate::audio::gate::AudioGates;
use crate::audio::jitter::VoiceFrame;
use crate::config::VOICE_FRAME_SAMPLES;
use crate::events::EventHistory;
use crate::runtime::hooks::Hooks;
use crate::sync::SyncKind;
use crate::trunk::{DmrT3Sm, P25TrunkSm};

pub use p25::KeyState;

/// Vocoder black box: one voice codeword in, one 160-sample frame out.
pub trait Vocoder: Send {
    /// 88-bit IMBE codeword (as bits) -> 20 ms of PCM.
    fn decode_imbe(&mut self, codeword_bits: &[u8]) -> VoiceFrame;
    /// 49-bit AMBE codeword (as bits) -> 20 ms of PCM.
    fn decode_ambe(&mut self, codeword_bits: &[u8]) -> VoiceFrame;
}

/// Stand-in vocoder emitting silence (decode-only deployments).
#[derive(Default)]
pub struct NullVocoder;

impl Vocoder for NullVocoder {
    fn decode_imbe(&mut self, _codeword_bits: &[u8]) -> VoiceFrame {
        [0.0; VOICE_FRAME_SAMPLES]
    }

    fn decode_ambe(&mut self, _codeword_bits: &[u8]) -> VoiceFrame {
        [0.0; VOICE_FRAME_SAMPLES]
    }
}

/// Shared decode surroundings handed to every handler invocation.
pub struct DecodeContext<'a> {
    pub hooks: &'a Arc<Hooks>,
    pub events: &'a EventHistory,
    pub gates: &'a mut AudioGates,
    pub vocoder: &'a mut dyn Vocoder,
    pub p25_sm: Option<&'a Arc<P25TrunkSm>>,
    pub dmr_sm: Option<&'a Arc<DmrT3Sm>>,
    /// Loaded voice keys; the audio gates consult these against the
    /// advertised ALGID.
    pub keys: KeyState,
}

/// Result of one handler invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Handled {
    /// Dibits consumed after the sync pattern.
    pub consumed: usize,
}

/// One protocol frame handler.
pub trait FrameHandler: Send {
    fn name(&self) -> &'static str;

    /// Whether this handler takes the given sync classification.
    fn matches(&self, kind: SyncKind) -> bool;

    /// Consume the frame following a declared sync. `dibits` starts at
    /// the first dibit after the sync pattern.
    fn handle(&mut self, ctx: &mut DecodeContext<'_>, kind: SyncKind, dibits: &[u8]) -> Handled;

    /// Drop accumulated multi-frame state (sync loss, retune).
    fn on_reset(&mut self) {}
}
