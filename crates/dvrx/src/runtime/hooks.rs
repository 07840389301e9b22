// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Runtime hook tables for optional subsystems.
//!
//! Protocol and trunking code must not depend on IO or UI backends. The
//! engine installs real implementations at startup; every wrapper
//! defaults to a safe no-op. Tables live behind `ArcSwap` so installs are
//! thread-safe and reads on the demod path are wait-free.
//!
//! The registry is an owned value (the engine holds the `Arc`), not a
//! process-global: subsystems receive the handle explicitly and never
//! store back-pointers into engine state.

use arc_swap::ArcSwap;
use std::sync::Arc;

use crate::events::Event;
use crate::sync::SyncKind;

/// Tune/return side effects requested by the trunking state machines.
#[derive(Default, Clone)]
pub struct TrunkTuningHooks {
    /// Tune to a voice channel. Args: frequency Hz, TED samples/symbol.
    pub tune_to_freq: Option<Arc<dyn Fn(i64, u32) + Send + Sync>>,
    /// Tune to a (candidate) control channel.
    pub tune_to_cc: Option<Arc<dyn Fn(i64, u32) + Send + Sync>>,
    /// Return to the last known control channel.
    pub return_to_cc: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// Decoder-side publication points consumed by UI/telemetry.
#[derive(Default, Clone)]
pub struct TelemetryHooks {
    /// Publish one call/control event.
    pub publish_event: Option<Arc<dyn Fn(&Event) + Send + Sync>>,
    /// Mark the UI dirty.
    pub request_redraw: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// Frame-sync side effects (sync acquisition display, squelch keying).
#[derive(Default, Clone)]
pub struct FrameSyncHooks {
    pub on_sync: Option<Arc<dyn Fn(SyncKind) + Send + Sync>>,
    pub on_sync_lost: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// Pump pending UI/control commands during long decoder loops.
#[derive(Default, Clone)]
pub struct ControlPumpHook {
    pub pump: Option<Arc<dyn Fn() + Send + Sync>>,
}

/// Final audio delivery (interleaved stereo f32 at 48 kHz).
#[derive(Default, Clone)]
pub struct AudioSinkHooks {
    pub write_stereo: Option<Arc<dyn Fn(&[f32]) + Send + Sync>>,
}

/// Hook registry: one slot per optional subsystem.
pub struct Hooks {
    trunk_tuning: ArcSwap<TrunkTuningHooks>,
    telemetry: ArcSwap<TelemetryHooks>,
    frame_sync: ArcSwap<FrameSyncHooks>,
    control_pump: ArcSwap<ControlPumpHook>,
    audio_sink: ArcSwap<AudioSinkHooks>,
}

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

impl Hooks {
    /// Registry with every hook a no-op.
    pub fn new() -> Self {
        Self {
            trunk_tuning: ArcSwap::from_pointee(TrunkTuningHooks::default()),
            telemetry: ArcSwap::from_pointee(TelemetryHooks::default()),
            frame_sync: ArcSwap::from_pointee(FrameSyncHooks::default()),
            control_pump: ArcSwap::from_pointee(ControlPumpHook::default()),
            audio_sink: ArcSwap::from_pointee(AudioSinkHooks::default()),
        }
    }

    // ---- installation (engine startup) ----

    pub fn set_trunk_tuning(&self, hooks: TrunkTuningHooks) {
        self.trunk_tuning.store(Arc::new(hooks));
    }

    pub fn set_telemetry(&self, hooks: TelemetryHooks) {
        self.telemetry.store(Arc::new(hooks));
    }

    pub fn set_frame_sync(&self, hooks: FrameSyncHooks) {
        self.frame_sync.store(Arc::new(hooks));
    }

    pub fn set_control_pump(&self, hook: ControlPumpHook) {
        self.control_pump.store(Arc::new(hook));
    }

    pub fn set_audio_sink(&self, hooks: AudioSinkHooks) {
        self.audio_sink.store(Arc::new(hooks));
    }

    // ---- safe wrappers (hot paths) ----

    /// Request a VC tune; no-op when no IO layer is installed.
    pub fn tune_to_freq(&self, freq_hz: i64, ted_sps: u32) {
        if let Some(f) = &self.trunk_tuning.load().tune_to_freq {
            f(freq_hz, ted_sps);
        }
    }

    /// Request a CC tune; no-op when no IO layer is installed.
    pub fn tune_to_cc(&self, freq_hz: i64, ted_sps: u32) {
        if let Some(f) = &self.trunk_tuning.load().tune_to_cc {
            f(freq_hz, ted_sps);
        }
    }

    /// Request return to the control channel.
    pub fn return_to_cc(&self) {
        if let Some(f) = &self.trunk_tuning.load().return_to_cc {
            f();
        }
    }

    /// Publish one event to UI/telemetry consumers.
    pub fn publish_event(&self, event: &Event) {
        if let Some(f) = &self.telemetry.load().publish_event {
            f(event);
        }
    }

    /// Mark the UI dirty.
    pub fn request_redraw(&self) {
        if let Some(f) = &self.telemetry.load().request_redraw {
            f();
        }
    }

    /// Frame sync acquired.
    pub fn on_sync(&self, kind: SyncKind) {
        if let Some(f) = &self.frame_sync.load().on_sync {
            f(kind);
        }
    }

    /// Frame sync lost.
    pub fn on_sync_lost(&self) {
        if let Some(f) = &self.frame_sync.load().on_sync_lost {
            f();
        }
    }

    /// Pump pending UI/control commands.
    pub fn pump_controls(&self) {
        if let Some(f) = &self.control_pump.load().pump {
            f();
        }
    }

    /// Deliver interleaved stereo audio to the sink backend.
    pub fn write_stereo(&self, samples: &[f32]) {
        if let Some(f) = &self.audio_sink.load().write_stereo {
            f(samples);
        }
    }
}
