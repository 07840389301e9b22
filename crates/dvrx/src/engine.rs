// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Engine: thread graph and lifecycle.
//!
//! ```text
//! source thread -> input ring -> demod thread -> jitter rings -> sink thread
//!                                    |                             |
//!                               trunk SMs <------- watchdog (1 Hz) +
//! ```
//!
//! The engine owns every long-lived object, installs the hook tables
//! once at startup, and tears the graph down on the cooperative
//! shutdown flag: ring waiters are unblocked first, then each thread
//! joins after draining its current block.

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crate::audio::gate::AudioGates;
use crate::audio::mix::interleave_stereo_f32;
use crate::audio::upsample::Upsampler;
use crate::config::{Config, INPUT_RING_CAPACITY, VOICE_FRAME_SAMPLES};
use crate::dispatch::Dispatcher;
use crate::dsp::pipeline::Demodulator;
use crate::dsp::symbol::{slice_c4fm, DibitWindow};
use crate::events::EventHistory;
use crate::protocol::{DecodeContext, KeyState, NullVocoder, Vocoder};
use crate::runtime::hooks::Hooks;
use crate::runtime::input_ring::{InputRing, OverflowPolicy, ReadOutcome, RingControl};
use crate::runtime::sched::{apply_to_current_thread, Role};
use crate::runtime::shutdown;
use crate::sync::FrameSync;
use crate::trunk::{DmrT3Sm, P25TrunkSm, TrunkPolicy, Watchdog};

/// Sample producer (SDR/TCP/file backends implement this; external).
pub trait SampleSource: Send {
    /// Fill `buf` with interleaved I/Q int16 samples; 0 = end of
    /// stream. Errors are surfaced and end the source thread.
    fn read(&mut self, buf: &mut [i16]) -> io::Result<usize>;
}

/// The running engine.
pub struct Engine {
    config: Config,
    hooks: Arc<Hooks>,
    events: Arc<EventHistory>,
    p25_sm: Arc<P25TrunkSm>,
    dmr_sm: Arc<DmrT3Sm>,
    keys: KeyState,
    ring_ctl: Option<RingControl>,
    threads: Vec<JoinHandle<()>>,
    watchdog: Option<Watchdog>,
    started: bool,
}

impl Engine {
    /// Validate the configuration and build the engine skeleton.
    pub fn new(config: Config) -> crate::Result<Self> {
        config.validate()?;
        let hooks = Arc::new(Hooks::new());
        let policy = TrunkPolicy {
            tune_group_calls: config.tune_group_calls,
            tune_private_calls: config.tune_private_calls,
            tune_enc_calls: config.tune_enc_calls,
            hangtime_s: config.hangtime_s,
            grace_s: config.grace_s,
            grant_voice_timeout_s: config.grant_voice_timeout_s,
            cc_timeout_s: config.cc_timeout_s,
            cache_dir: config.cache_dir.clone(),
            ..TrunkPolicy::default()
        };
        let p25_sm = Arc::new(P25TrunkSm::new(policy, Arc::clone(&hooks)));
        let dmr_sm = Arc::new(DmrT3Sm::new(config.hangtime_s, Arc::clone(&hooks)));
        Ok(Self {
            config,
            hooks,
            events: Arc::new(EventHistory::default()),
            p25_sm,
            dmr_sm,
            keys: KeyState::default(),
            ring_ctl: None,
            threads: Vec::new(),
            watchdog: None,
            started: false,
        })
    }

    /// Install the loaded voice keys consulted by the audio gates.
    /// Call before `start`; the snapshot is copied into the demod
    /// thread.
    pub fn set_keys(&mut self, keys: KeyState) {
        self.keys = keys;
    }

    /// Hook registry (install IO/telemetry implementations before
    /// `start`).
    pub fn hooks(&self) -> &Arc<Hooks> {
        &self.hooks
    }

    pub fn events(&self) -> &Arc<EventHistory> {
        &self.events
    }

    pub fn p25_sm(&self) -> &Arc<P25TrunkSm> {
        &self.p25_sm
    }

    pub fn dmr_sm(&self) -> &Arc<DmrT3Sm> {
        &self.dmr_sm
    }

    /// Spawn the thread graph around the given sample source.
    pub fn start(&mut self, mut source: Box<dyn SampleSource>) -> crate::Result<()> {
        if self.started {
            return Err(crate::Error::EngineState("engine already started"));
        }
        self.started = true;
        shutdown::reset_shutdown();

        if self.config.trunking_enable && self.config.cache_dir.is_some() {
            // Best effort: a missing cache is not an error.
            let _ = self.p25_sm.load_candidates();
        }

        let (mut producer, mut consumer, ctl) =
            InputRing::with_capacity(INPUT_RING_CAPACITY, OverflowPolicy::DropExcess);
        self.ring_ctl = Some(ctl);

        // --- source thread ---
        let rt = self.config.rt_sched;
        let source_thread = std::thread::Builder::new()
            .name("dvrx-source".into())
            .spawn(move || {
                apply_to_current_thread(&rt, Role::Source);
                let mut buf = vec![0i16; 16384];
                loop {
                    if shutdown::is_shutdown_requested() {
                        return;
                    }
                    match source.read(&mut buf) {
                        Ok(0) => {
                            crate::info!("sample source ended");
                            shutdown::request_shutdown();
                            return;
                        }
                        Ok(n) => {
                            producer.write(&buf[..n]);
                        }
                        Err(e) => {
                            crate::error!("sample source: {}", e);
                            shutdown::request_shutdown();
                            return;
                        }
                    }
                }
            })?;
        self.threads.push(source_thread);

        // --- demod thread ---
        let hooks = Arc::clone(&self.hooks);
        let events = Arc::clone(&self.events);
        let p25_sm = Arc::clone(&self.p25_sm);
        let dmr_sm = Arc::clone(&self.dmr_sm);
        let gates = Arc::new(Mutex::new(AudioGates::new()));
        let sink_gates = Arc::clone(&gates);
        let trunking = self.config.trunking_enable;
        let keys = self.keys;
        let demod_thread = std::thread::Builder::new()
            .name("dvrx-demod".into())
            .spawn(move || {
                apply_to_current_thread(&rt, Role::Demod);
                let mut demod = Demodulator::new();
                let mut frame_sync = FrameSync::new();
                let mut dispatcher = Dispatcher::new();
                let mut vocoder: Box<dyn Vocoder> = Box::new(NullVocoder);
                let mut window = DibitWindow::new(4096);
                let mut raw = vec![0i16; 8192];
                let mut iq: Vec<f32> = Vec::new();
                loop {
                    match consumer.read_block(&mut raw) {
                        ReadOutcome::Shutdown => return,
                        ReadOutcome::Samples(n) => {
                            iq.clear();
                            crate::dsp::widen::widen_i16(&raw[..n], &mut iq);
                            // Outer deviation (+-3) maps to +-0.5 of
                            // normalized discriminator phase.
                            const SYMBOL_SCALE: f32 = 6.0;
                            let out = demod.process(&mut iq);
                            for &symbol in out {
                                window.push(slice_c4fm(symbol * SYMBOL_SCALE));
                            }
                            let hit = frame_sync.scan(window.dibits());
                            if let Some(hit) = hit {
                                hooks.on_sync(hit.kind);
                                let start = hit.offset + sync_len_for(&hit);
                                let payload: Vec<u8> = window.dibits()[start.min(window.len())..]
                                    .to_vec();
                                let mut gates_guard = gates.lock();
                                let mut ctx = DecodeContext {
                                    hooks: &hooks,
                                    events: &events,
                                    gates: &mut gates_guard,
                                    vocoder: vocoder.as_mut(),
                                    p25_sm: trunking.then_some(&p25_sm),
                                    dmr_sm: trunking.then_some(&dmr_sm),
                                    keys,
                                };
                                let handled = dispatcher.dispatch(&mut ctx, hit.kind, &payload);
                                drop(gates_guard);
                                match handled {
                                    // Frame decoded: drop exactly the
                                    // sync + consumed span, keep the
                                    // tail for the next scan.
                                    Some(h) if h.consumed > 0 => {
                                        window.consume(start + h.consumed);
                                    }
                                    // Partial frame: hold the window
                                    // until more dibits arrive.
                                    Some(_) => {}
                                    // No handler: step past the sync
                                    // so the scan can move on.
                                    None => window.consume(start),
                                }
                            }
                            if trunking {
                                p25_sm.tick();
                                dmr_sm.tick();
                            }
                            hooks.pump_controls();
                        }
                    }
                }
            })?;
        self.threads.push(demod_thread);

        // --- audio sink thread ---
        let sink_hooks = Arc::clone(&self.hooks);
        let sink_thread = std::thread::Builder::new()
            .name("dvrx-audio".into())
            .spawn(move || {
                apply_to_current_thread(&rt, Role::Audio);
                let mut up_l = Upsampler::new();
                let mut up_r = Upsampler::new();
                let mut left = [0.0f32; VOICE_FRAME_SAMPLES];
                let mut right = [0.0f32; VOICE_FRAME_SAMPLES];
                let mut out_l = Vec::new();
                let mut out_r = Vec::new();
                let mut stereo = Vec::new();
                loop {
                    if shutdown::is_shutdown_requested() {
                        return;
                    }
                    {
                        let mut g = sink_gates.lock();
                        g.ring(0).pop(&mut left);
                        g.ring(1).pop(&mut right);
                        let (mute_l, mute_r) = g.mixer_gate();
                        drop(g);
                        out_l.clear();
                        out_r.clear();
                        up_l.process(&left, &mut out_l);
                        up_r.process(&right, &mut out_r);
                        interleave_stereo_f32(&out_l, &out_r, mute_l, mute_r, &mut stereo);
                        sink_hooks.write_stereo(&stereo);
                    }
                    // One voice frame per 20 ms.
                    std::thread::sleep(Duration::from_millis(20));
                }
            })?;
        self.threads.push(sink_thread);

        // --- watchdog ---
        if trunking {
            let wd_p25 = Arc::clone(&self.p25_sm);
            let wd_dmr = Arc::clone(&self.dmr_sm);
            self.watchdog = Some(Watchdog::start(move || {
                wd_p25.try_tick();
                wd_dmr.try_tick();
            }));
        }

        crate::info!("engine started ({:?})", self.config.decode_preset);
        Ok(())
    }

    /// Signal shutdown, unblock waiters and join every thread.
    pub fn stop(&mut self) {
        shutdown::request_shutdown();
        if let Some(ctl) = &self.ring_ctl {
            ctl.shutdown();
        }
        if let Some(wd) = self.watchdog.take() {
            wd.stop();
        }
        for t in self.threads.drain(..) {
            let _ = t.join();
        }
        if self.config.trunking_enable && self.config.cache_dir.is_some() {
            let _ = self.p25_sm.persist_candidates();
        }
        self.started = false;
        crate::info!("engine stopped");
    }
}

impl Drop for Engine {
    fn drop(&mut self) {
        if self.started {
            self.stop();
        }
    }
}

/// Dibit length of the sync pattern that produced a hit.
fn sync_len_for(hit: &crate::sync::SyncHit) -> usize {
    for t in crate::sync::sync_templates() {
        if t.kind_pos == hit.kind || t.kind_neg == hit.kind {
            return t.pattern.len();
        }
    }
    0
}
