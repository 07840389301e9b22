// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global configuration - single source of truth.
//!
//! Centralizes the DSP rate constants and the typed runtime configuration
//! snapshot. CLI/env/config-file parsers live outside the core; they
//! produce a [`Config`] value and hand it to the engine. The core applies
//! only the fields relevant to itself.

use std::path::PathBuf;

// =======================================================================
// Fixed rate constants
// =======================================================================

/// Vocoder output rate. Every voice frame is 160 samples at this rate.
pub const AUDIO_RATE_HZ: u32 = 8_000;

/// Output backend rate; 8 kHz voice is upsampled 6x to reach it.
pub const OUTPUT_RATE_HZ: u32 = 48_000;

/// Samples per vocoder voice frame (20 ms at 8 kHz).
pub const VOICE_FRAME_SAMPLES: usize = 160;

/// Upsampling factor from vocoder rate to output rate.
pub const UPSAMPLE_FACTOR: usize = (OUTPUT_RATE_HZ / AUDIO_RATE_HZ) as usize;

/// Default DSP bandwidth the decimation cascade targets.
pub const DSP_RATE_HZ: u32 = 48_000;

/// Input ring capacity in int16 samples (~0.25 s of 2.4 Msps u8 I/Q
/// after widening; deep enough to ride out sink hiccups).
pub const INPUT_RING_CAPACITY: usize = 1 << 20;

/// Depth of the per-slot voice jitter ring, in frames.
pub const JITTER_RING_FRAMES: usize = 3;

// =======================================================================
// Runtime configuration snapshot
// =======================================================================

/// Sample input backend selection. The backends themselves are external
/// collaborators; the engine only needs to know the shape of the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputBackend {
    /// RTL-SDR style interleaved u8 I/Q at device rate.
    #[default]
    RtlSdr,
    /// SoapySDR device (u8 or s16 I/Q).
    SoapySdr,
    /// PCM16 mono over TCP at 48 kHz.
    Tcp,
    /// PCM16 mono over UDP at 48 kHz.
    Udp,
    /// PulseAudio capture (PCM16 mono at 48 kHz).
    Pulse,
    /// File replay: WAV/RAW PCM or symbol capture `.bin`.
    File,
}

/// Audio output backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputBackend {
    #[default]
    Pulse,
    PortAudio,
    Udp,
    WavFile,
    /// Decode-only operation (trunk following, event logging).
    None,
}

/// Decode preset: which protocol family the frame sync scanner arms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePreset {
    /// All digital protocols enabled.
    #[default]
    Auto,
    P25,
    Dmr,
    Nxdn,
    M17,
    Dstar,
    Ysf,
    Dpmr,
    ProVoice,
    /// Analog monitor only.
    Analog,
}

/// Per-role realtime scheduling knobs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RtSched {
    /// Enable SCHED_FIFO for the source/demod/audio roles.
    pub enabled: bool,
    /// FIFO priority (1..=99); 0 picks a conservative default.
    pub priority: i32,
    /// Optional CPU pin per role; negative leaves affinity untouched.
    pub cpu_source: i32,
    pub cpu_demod: i32,
    pub cpu_audio: i32,
}

/// Typed runtime configuration snapshot.
///
/// Field groups mirror the subsystems that consume them. IO-specific
/// restart behavior (device reopen on backend change) is the embedding
/// application's concern.
#[derive(Debug, Clone)]
pub struct Config {
    pub input: InputBackend,
    pub output: OutputBackend,
    pub decode_preset: DecodePreset,

    /// Pulse source/sink device names (empty = server default).
    pub pulse_input_device: String,
    pub pulse_output_device: String,

    /// Master trunking enable.
    pub trunking_enable: bool,
    /// Seconds to stay on a VC after voice ends.
    pub hangtime_s: f64,
    /// Grace period added to hangtime before return-to-CC.
    pub grace_s: f64,
    /// Seconds to wait for voice after a grant before releasing.
    pub grant_voice_timeout_s: f64,
    /// Seconds without CC sync before hunting candidates.
    pub cc_timeout_s: f64,
    /// Tune encrypted calls (subject to the patch KEY=0 override).
    pub tune_enc_calls: bool,
    /// Tune group voice grants.
    pub tune_group_calls: bool,
    /// Tune individual (unit-to-unit) grants.
    pub tune_private_calls: bool,

    /// Directory for per-system CC candidate caches; `None` disables
    /// persistence entirely.
    pub cache_dir: Option<PathBuf>,

    /// Realtime scheduling knobs.
    pub rt_sched: RtSched,

    /// UI event history: strip the date from event lines.
    pub short_event_lines: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input: InputBackend::default(),
            output: OutputBackend::default(),
            decode_preset: DecodePreset::default(),
            pulse_input_device: String::new(),
            pulse_output_device: String::new(),
            trunking_enable: false,
            hangtime_s: 1.0,
            grace_s: 0.5,
            grant_voice_timeout_s: 3.0,
            cc_timeout_s: 10.0,
            tune_enc_calls: false,
            tune_group_calls: true,
            tune_private_calls: false,
            cache_dir: None,
            rt_sched: RtSched::default(),
            short_event_lines: false,
        }
    }
}

impl Config {
    /// Validate ranges that would otherwise wedge the state machine.
    ///
    /// Rejected configurations never reach the engine: an invalid
    /// argument is an error before start, not a runtime condition.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.hangtime_s.is_finite() || self.hangtime_s < 0.0 {
            return Err(crate::Error::InvalidConfig(format!(
                "hangtime_s out of range: {}",
                self.hangtime_s
            )));
        }
        if !self.grace_s.is_finite() || self.grace_s < 0.0 {
            return Err(crate::Error::InvalidConfig(format!(
                "grace_s out of range: {}",
                self.grace_s
            )));
        }
        if !self.grant_voice_timeout_s.is_finite() || self.grant_voice_timeout_s <= 0.0 {
            return Err(crate::Error::InvalidConfig(format!(
                "grant_voice_timeout_s out of range: {}",
                self.grant_voice_timeout_s
            )));
        }
        if !self.cc_timeout_s.is_finite() || self.cc_timeout_s <= 0.0 {
            return Err(crate::Error::InvalidConfig(format!(
                "cc_timeout_s out of range: {}",
                self.cc_timeout_s
            )));
        }
        if self.rt_sched.enabled && !(0..=99).contains(&self.rt_sched.priority) {
            return Err(crate::Error::InvalidConfig(format!(
                "rt priority out of range: {}",
                self.rt_sched.priority
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_negative_hangtime() {
        let cfg = Config {
            hangtime_s: -1.0,
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_rt_priority() {
        let cfg = Config {
            rt_sched: RtSched {
                enabled: true,
                priority: 250,
                ..RtSched::default()
            },
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_upsample_factor() {
        assert_eq!(UPSAMPLE_FACTOR, 6);
    }
}
