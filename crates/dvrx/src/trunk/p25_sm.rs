// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! P25 voice-channel follower state machine.
//!
//! Consumes grant/release/activity events from the P25 decoders and
//! drives tune/return side effects through the hook table. States:
//!
//! ```text
//! ON_CC --grant(gates pass)--> TUNED/ARMED --voice--> FOLLOWING
//!   ^                             |                      |
//!   |<---- hangtime+grace ---- HANG <------ idle --------+
//! ```
//!
//! Grant policy gates run in order: encrypted-call lockout (with the
//! regroup KEY=0 override), talkgroup hold, group lockout, IDEN trust
//! (untrusted blocked unless provisionally allowed on the CC with no
//! provenance). A denied grant stays on the CC and bumps a counter,
//! never an error.
//!
//! State lives behind one `parking_lot` mutex so the watchdog can tick
//! concurrently with the demod thread; `try_tick` skips when a tick is
//! already running.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use super::candidates::CcCandidates;
use super::iden::{IdenTable, IdenTrust, SystemId};
use super::patch::PatchTable;
use crate::runtime::clock::now_monotonic_s;
use crate::runtime::hooks::Hooks;

/// Follower state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmState {
    #[default]
    OnCc,
    Armed,
    Following,
    Hang,
}

/// Policy knobs the grant gates consult.
#[derive(Debug, Clone)]
pub struct TrunkPolicy {
    pub tune_group_calls: bool,
    pub tune_private_calls: bool,
    pub tune_enc_calls: bool,
    pub hangtime_s: f64,
    pub grace_s: f64,
    pub grant_voice_timeout_s: f64,
    pub cc_timeout_s: f64,
    /// Window a tuned candidate CC gets to show activity.
    pub cc_eval_window_s: f64,
    /// Cooldown applied to a candidate that failed evaluation.
    pub cc_cooldown_s: f64,
    /// Seconds of recent MAC/voice activity that defers a release.
    pub activity_window_s: f64,
    pub ted_sps: u32,
    pub cache_dir: Option<PathBuf>,
}

impl Default for TrunkPolicy {
    fn default() -> Self {
        Self {
            tune_group_calls: true,
            tune_private_calls: false,
            tune_enc_calls: false,
            hangtime_s: 1.0,
            grace_s: 0.5,
            grant_voice_timeout_s: 3.0,
            cc_timeout_s: 10.0,
            cc_eval_window_s: 4.0,
            cc_cooldown_s: 30.0,
            activity_window_s: 2.0,
            ted_sps: 10,
            cache_dir: None,
        }
    }
}

/// Reasons a grant was denied (logged + counted, never an error).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantDenied {
    EncLockout,
    TgHold,
    GroupLockout,
    IdenUntrusted,
    NoFrequency,
    PolicyOff,
}

#[derive(Debug, Default)]
struct Counters {
    tune: u32,
    release: u32,
    denied: u32,
    cc_hunts: u32,
}

struct Inner {
    state: SmState,
    policy: TrunkPolicy,
    cc_freq: i64,
    vc_freq: [i64; 2],
    active_slot: usize,
    t_tune: f64,
    t_hang_start: f64,
    t_last_voice: [f64; 2],
    t_last_mac: [f64; 2],
    voice_active: [bool; 2],
    last_cc_sync: f64,
    force_release: bool,
    tg_hold: u32,
    group_lockout: HashSet<u32>,
    candidates: CcCandidates,
    iden: IdenTable,
    patches: PatchTable,
    sys: SystemId,
    cc_eval_freq: i64,
    cc_eval_start: f64,
    counters: Counters,
}

/// The follower. One per monitored P25 system.
pub struct P25TrunkSm {
    inner: Mutex<Inner>,
    hooks: Arc<Hooks>,
    /// Channel -> frequency overrides (imported channel maps); written
    /// by the UI thread, read during grants.
    chan_map: dashmap::DashMap<u16, i64>,
}

impl P25TrunkSm {
    pub fn new(policy: TrunkPolicy, hooks: Arc<Hooks>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: SmState::OnCc,
                policy,
                cc_freq: 0,
                vc_freq: [0; 2],
                active_slot: 0,
                t_tune: 0.0,
                t_hang_start: 0.0,
                t_last_voice: [0.0; 2],
                t_last_mac: [0.0; 2],
                voice_active: [false; 2],
                last_cc_sync: now_monotonic_s(),
                force_release: false,
                tg_hold: 0,
                group_lockout: HashSet::new(),
                candidates: CcCandidates::new(),
                iden: IdenTable::new(),
                patches: PatchTable::new(),
                sys: SystemId::default(),
                cc_eval_freq: 0,
                cc_eval_start: 0.0,
                counters: Counters::default(),
            }),
            hooks,
            chan_map: dashmap::DashMap::new(),
        }
    }

    // ---- wiring from decoders ----

    pub fn set_cc_freq(&self, freq: i64) {
        self.inner.lock().cc_freq = freq;
    }

    pub fn set_system(&self, sys: SystemId) {
        self.inner.lock().sys = sys;
    }

    pub fn set_tg_hold(&self, tg: u32) {
        self.inner.lock().tg_hold = tg;
    }

    pub fn add_group_lockout(&self, tg: u32) {
        self.inner.lock().group_lockout.insert(tg);
    }

    pub fn set_force_release(&self, force: bool) {
        self.inner.lock().force_release = force;
    }

    pub fn set_sys_is_tdma(&self, tdma: bool) {
        self.inner.lock().iden.sys_is_tdma = tdma;
    }

    /// Install a channel-map override (CSV import, UI).
    pub fn set_chan_override(&self, channel: u16, freq_hz: i64) {
        self.chan_map.insert(channel, freq_hz);
    }

    /// Update an IDEN from an IDEN_UP broadcast.
    pub fn update_iden(&self, iden: usize, entry: super::iden::Iden) {
        self.inner.lock().iden.set(iden, entry);
    }

    /// Confirm learned IDENs after a matching system broadcast.
    pub fn confirm_idens(&self) {
        let mut g = self.inner.lock();
        let sys = g.sys;
        g.iden.confirm_all(&sys);
    }

    pub fn patches(&self) -> parking_lot::MappedMutexGuard<'_, PatchTable> {
        parking_lot::MutexGuard::map(self.inner.lock(), |i| &mut i.patches)
    }

    /// Stamp CC sync (called whenever a CC frame decodes).
    pub fn notify_cc_sync(&self) {
        let mut g = self.inner.lock();
        g.last_cc_sync = now_monotonic_s();
        // Successful activity ends any candidate evaluation.
        g.cc_eval_freq = 0;
    }

    // ---- snapshots ----

    pub fn state(&self) -> SmState {
        self.inner.lock().state
    }

    pub fn tune_count(&self) -> u32 {
        self.inner.lock().counters.tune
    }

    pub fn release_count(&self) -> u32 {
        self.inner.lock().counters.release
    }

    pub fn denied_count(&self) -> u32 {
        self.inner.lock().counters.denied
    }

    pub fn vc_freq(&self, slot: usize) -> i64 {
        self.inner.lock().vc_freq[slot.min(1)]
    }

    pub fn candidate_count(&self) -> usize {
        self.inner.lock().candidates.len()
    }

    pub fn active_slot(&self) -> usize {
        self.inner.lock().active_slot
    }

    pub fn cc_hunt_count(&self) -> u32 {
        self.inner.lock().counters.cc_hunts
    }

    // ---- events ----

    /// Group voice grant. Returns `Ok(freq)` on tune.
    pub fn on_group_grant(
        &self,
        channel: u16,
        svc_bits: u8,
        tg: u32,
        src: u32,
    ) -> Result<i64, GrantDenied> {
        let mut g = self.inner.lock();
        if !g.policy.tune_group_calls {
            g.counters.denied += 1;
            return Err(GrantDenied::PolicyOff);
        }
        let sps = g.policy.ted_sps;
        let res = self.grant_common(&mut g, channel, svc_bits, tg, src);
        drop(g);
        if let Ok(freq) = res {
            self.hooks.tune_to_freq(freq, sps);
        }
        res
    }

    /// Individual (unit-to-unit) voice grant.
    pub fn on_indiv_grant(
        &self,
        channel: u16,
        svc_bits: u8,
        dst: u32,
        src: u32,
    ) -> Result<i64, GrantDenied> {
        let mut g = self.inner.lock();
        if !g.policy.tune_private_calls {
            g.counters.denied += 1;
            return Err(GrantDenied::PolicyOff);
        }
        let sps = g.policy.ted_sps;
        let res = self.grant_common(&mut g, channel, svc_bits, dst, src);
        drop(g);
        if let Ok(freq) = res {
            self.hooks.tune_to_freq(freq, sps);
        }
        res
    }

    fn grant_common(
        &self,
        g: &mut Inner,
        channel: u16,
        svc_bits: u8,
        tg: u32,
        _src: u32,
    ) -> Result<i64, GrantDenied> {
        // Gate 1: encrypted-call lockout, overridden when the TG is
        // regrouped clear (KEY=0 patch).
        let enc = svc_bits & 0x40 != 0;
        if enc && !g.policy.tune_enc_calls && !g.patches.tg_key_is_clear(tg as u16) {
            g.counters.denied += 1;
            crate::info!("grant denied: ENC lockout tg {}", tg);
            return Err(GrantDenied::EncLockout);
        }
        // Gate 2: talkgroup hold.
        if g.tg_hold != 0 && tg != g.tg_hold {
            g.counters.denied += 1;
            return Err(GrantDenied::TgHold);
        }
        // Gate 3: group lockout list.
        if g.group_lockout.contains(&tg) {
            g.counters.denied += 1;
            return Err(GrantDenied::GroupLockout);
        }
        // Gate 4: IDEN trust; provisional allowance only while on the
        // CC with no provenance recorded for the entry.
        let iden_idx = usize::from(channel >> 12);
        if let Some(entry) = g.iden.get(iden_idx) {
            if entry.trust < IdenTrust::Confirmed {
                let provisional =
                    g.state == SmState::OnCc && entry.wacn == 0 && entry.sysid == 0;
                if !provisional {
                    g.counters.denied += 1;
                    crate::info!("grant denied: untrusted IDEN {}", iden_idx);
                    return Err(GrantDenied::IdenUntrusted);
                }
            }
        }

        // Resolve the channel: explicit map override wins.
        let freq = match self.chan_map.get(&channel) {
            Some(f) => *f,
            None => g.iden.channel_to_freq(channel),
        };
        if freq <= 0 {
            g.counters.denied += 1;
            return Err(GrantDenied::NoFrequency);
        }

        let now = now_monotonic_s();
        g.vc_freq = [freq, freq];
        g.active_slot = g.iden.channel_slot(channel);
        g.t_tune = now;
        g.state = SmState::Armed;
        g.voice_active = [false; 2];
        g.counters.tune += 1;
        Ok(freq)
    }

    /// Voice activity on a slot.
    pub fn on_voice_active(&self, slot: usize) {
        let mut g = self.inner.lock();
        let slot = slot.min(1);
        let now = now_monotonic_s();
        g.t_last_voice[slot] = now;
        g.voice_active[slot] = true;
        if matches!(g.state, SmState::Armed | SmState::Hang) {
            g.state = SmState::Following;
        }
    }

    /// MAC (signalling) activity on a slot.
    pub fn on_mac_active(&self, slot: usize) {
        let mut g = self.inner.lock();
        g.t_last_mac[slot.min(1)] = now_monotonic_s();
    }

    /// A slot went idle.
    pub fn on_idle(&self, slot: usize) {
        let mut g = self.inner.lock();
        let slot = slot.min(1);
        g.voice_active[slot] = false;
        if g.state == SmState::Following && !g.voice_active[slot ^ 1] {
            g.state = SmState::Hang;
            g.t_hang_start = now_monotonic_s();
        }
    }

    /// Explicit release (TDU, P_CLEAR). Right-slot activity defers the
    /// return to the CC; `force_release` bypasses the gates.
    pub fn on_release(&self) {
        let mut g = self.inner.lock();
        g.counters.release += 1;
        let now = now_monotonic_s();
        if !g.force_release {
            let window = g.policy.activity_window_s;
            let busy = (0..2).any(|s| {
                g.voice_active[s]
                    || now - g.t_last_mac[s] < window
                    || now - g.t_last_voice[s] < window
            });
            if busy {
                crate::debug!("release deferred: slot activity");
                return;
            }
        }
        Self::return_to_cc_locked(&mut g);
        drop(g);
        self.hooks.return_to_cc();
    }

    /// Neighbor broadcast: feed the candidate list.
    pub fn on_neighbor_update(&self, freqs: &[i64]) {
        let mut g = self.inner.lock();
        let cc = g.cc_freq;
        for &f in freqs {
            g.candidates.add(f, true, cc);
        }
    }

    /// Adjacent-site broadcast announcing a CC channel: resolve it
    /// through the bandplan and feed the candidate list.
    pub fn on_neighbor_channel(&self, channel: u16) {
        let mut g = self.inner.lock();
        let freq = g.iden.channel_to_freq(channel);
        if freq > 0 {
            let cc = g.cc_freq;
            g.candidates.add(freq, true, cc);
        }
    }

    /// Periodic tick; called from the demod loop and the watchdog.
    pub fn tick(&self) {
        let mut g = self.inner.lock();
        let action = Self::tick_locked(&mut g);
        drop(g);
        self.dispatch(action);
    }

    /// Watchdog entry: skip if a tick is already in progress.
    pub fn try_tick(&self) -> bool {
        let action = match self.inner.try_lock() {
            Some(mut g) => Self::tick_locked(&mut g),
            None => return false,
        };
        self.dispatch(action);
        true
    }

    fn dispatch(&self, action: Option<TickAction>) {
        match action {
            Some(TickAction::ReturnToCc) => self.hooks.return_to_cc(),
            Some(TickAction::TuneCc(freq, sps)) => self.hooks.tune_to_cc(freq, sps),
            None => {}
        }
    }

    fn tick_locked(g: &mut Inner) -> Option<TickAction> {
        let now = now_monotonic_s();
        match g.state {
            SmState::Armed => {
                if now - g.t_tune >= g.policy.grant_voice_timeout_s {
                    crate::debug!("grant voice timeout, releasing");
                    g.counters.release += 1;
                    Self::return_to_cc_locked(g);
                    return Some(TickAction::ReturnToCc);
                }
                None
            }
            SmState::Following => {
                // Belt-and-braces: if both slots stopped reporting,
                // move to hang so the timers keep running.
                if !g.voice_active[0] && !g.voice_active[1] {
                    let last = g.t_last_voice[0].max(g.t_last_voice[1]);
                    if now - last >= g.policy.activity_window_s {
                        g.state = SmState::Hang;
                        g.t_hang_start = now;
                    }
                }
                None
            }
            SmState::Hang => {
                let deadline = g.policy.hangtime_s + g.policy.grace_s;
                let window = g.policy.activity_window_s;
                let quiet = g.force_release
                    || (0..2).all(|s| {
                        !g.voice_active[s]
                            && now - g.t_last_mac[s] >= window
                            && now - g.t_last_voice[s] >= window
                    });
                if now - g.t_hang_start >= deadline && quiet {
                    Self::return_to_cc_locked(g);
                    return Some(TickAction::ReturnToCc);
                }
                None
            }
            SmState::OnCc => Self::hunt_cc(g, now),
        }
    }

    fn hunt_cc(g: &mut Inner, now: f64) -> Option<TickAction> {
        // Candidate under evaluation: expire it on a quiet window.
        if g.cc_eval_freq != 0 {
            if now - g.cc_eval_start < g.policy.cc_eval_window_s {
                return None;
            }
            let failed = g.cc_eval_freq;
            let cooldown_until = now + g.policy.cc_cooldown_s;
            g.candidates.set_cooldown(failed, cooldown_until);
            g.cc_eval_freq = 0;
            crate::info!("CC candidate {} failed evaluation, cooling down", failed);
        }
        if now - g.last_cc_sync < g.policy.cc_timeout_s {
            return None;
        }
        let cc = g.cc_freq;
        if let Some(freq) = g.candidates.next(now, cc) {
            g.counters.cc_hunts += 1;
            g.cc_eval_freq = freq;
            g.cc_eval_start = now;
            crate::info!("hunting CC: trying {}", freq);
            return Some(TickAction::TuneCc(freq, g.policy.ted_sps));
        }
        None
    }

    fn return_to_cc_locked(g: &mut Inner) {
        g.state = SmState::OnCc;
        g.vc_freq = [0; 2];
        g.voice_active = [false; 2];
        g.force_release = false;
    }

    /// Persist the candidate list (no-op when caching is disabled).
    pub fn persist_candidates(&self) -> crate::Result<()> {
        let g = self.inner.lock();
        match &g.policy.cache_dir {
            Some(dir) => g.candidates.persist(dir, &g.sys),
            None => Ok(()),
        }
    }

    /// Load the candidate cache (no-op when caching is disabled).
    pub fn load_candidates(&self) -> crate::Result<usize> {
        let mut g = self.inner.lock();
        let Some(dir) = g.policy.cache_dir.clone() else {
            return Ok(0);
        };
        let sys = g.sys;
        let cc = g.cc_freq;
        g.candidates.load(&dir, &sys, cc)
    }

    /// Add one candidate directly (tests, imports).
    pub fn add_candidate(&self, freq: i64) {
        let mut g = self.inner.lock();
        let cc = g.cc_freq;
        g.candidates.add(freq, false, cc);
    }

    /// Backdate timers (test support): pretend the last CC sync and
    /// tune happened `secs` ago.
    #[doc(hidden)]
    pub fn backdate_for_tests(&self, secs: f64) {
        let mut g = self.inner.lock();
        g.last_cc_sync -= secs;
        g.t_tune -= secs;
        g.t_hang_start -= secs;
        for s in 0..2 {
            g.t_last_voice[s] -= secs;
            g.t_last_mac[s] -= secs;
        }
        g.cc_eval_start -= secs;
    }
}

/// Deferred side effect computed under the lock, dispatched outside it.
enum TickAction {
    ReturnToCc,
    TuneCc(i64, u32),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::hooks::TrunkTuningHooks;
    use crate::trunk::iden::Iden;
    use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};

    struct Probe {
        tunes: AtomicU32,
        returns: AtomicU32,
        last_vc: AtomicI64,
        last_cc: AtomicI64,
    }

    fn sm_with_probe(policy: TrunkPolicy) -> (Arc<P25TrunkSm>, Arc<Probe>) {
        let probe = Arc::new(Probe {
            tunes: AtomicU32::new(0),
            returns: AtomicU32::new(0),
            last_vc: AtomicI64::new(0),
            last_cc: AtomicI64::new(0),
        });
        let hooks = Arc::new(Hooks::new());
        let (p1, p2, p3) = (Arc::clone(&probe), Arc::clone(&probe), Arc::clone(&probe));
        hooks.set_trunk_tuning(TrunkTuningHooks {
            tune_to_freq: Some(Arc::new(move |f, _| {
                p1.tunes.fetch_add(1, Ordering::SeqCst);
                p1.last_vc.store(f, Ordering::SeqCst);
            })),
            tune_to_cc: Some(Arc::new(move |f, _| {
                p2.last_cc.store(f, Ordering::SeqCst);
            })),
            return_to_cc: Some(Arc::new(move || {
                p3.returns.fetch_add(1, Ordering::SeqCst);
            })),
        });
        (Arc::new(P25TrunkSm::new(policy, hooks)), probe)
    }

    fn confirmed_fdma_iden() -> Iden {
        Iden {
            channel_type: 1,
            tdma: false,
            base_freq: 851_000_000 / 5,
            spacing: 100,
            trust: IdenTrust::Confirmed,
            wacn: 0xBEE00,
            sysid: 0x123,
        }
    }

    const CH: u16 = (1 << 12) | 0x000A;

    #[test]
    fn test_follower_lifecycle_grant_voice_hang_return() {
        let policy = TrunkPolicy {
            hangtime_s: 0.0,
            grace_s: 0.0,
            activity_window_s: 0.0,
            ..TrunkPolicy::default()
        };
        let (sm, probe) = sm_with_probe(policy);
        sm.set_cc_freq(851_000_000);
        sm.update_iden(1, confirmed_fdma_iden());

        let freq = sm.on_group_grant(CH, 0, 0x2001, 1234).expect("tune");
        assert_eq!(freq, 851_000_000 + 10 * 100 * 125);
        assert_eq!(sm.state(), SmState::Armed);
        assert_eq!(probe.tunes.load(Ordering::SeqCst), 1);
        assert_eq!(probe.last_vc.load(Ordering::SeqCst), freq);

        sm.on_voice_active(0);
        assert_eq!(sm.state(), SmState::Following);

        sm.on_idle(0);
        assert_eq!(sm.state(), SmState::Hang);

        sm.tick();
        assert_eq!(sm.state(), SmState::OnCc);
        assert_eq!(probe.returns.load(Ordering::SeqCst), 1);
        assert_eq!(sm.vc_freq(0), 0);
    }

    #[test]
    fn test_armed_without_voice_times_out() {
        let policy = TrunkPolicy {
            grant_voice_timeout_s: 0.2,
            ..TrunkPolicy::default()
        };
        let (sm, probe) = sm_with_probe(policy);
        sm.update_iden(1, confirmed_fdma_iden());
        sm.on_group_grant(CH, 0, 7, 8).expect("tune");
        assert_eq!(sm.state(), SmState::Armed);
        sm.backdate_for_tests(1.0);
        sm.tick();
        assert_eq!(sm.state(), SmState::OnCc);
        assert!(probe.returns.load(Ordering::SeqCst) > 0);
    }

    #[test]
    fn test_release_deferred_by_right_slot_activity() {
        let (sm, probe) = sm_with_probe(TrunkPolicy::default());
        sm.update_iden(1, confirmed_fdma_iden());
        sm.on_group_grant(CH, 0, 1, 2).expect("tune");
        sm.on_voice_active(0);
        sm.on_idle(0);
        // Slot 2 MAC-active just now
        sm.on_mac_active(1);

        let before = sm.release_count();
        sm.on_release();
        assert_eq!(sm.release_count(), before + 1);
        assert_eq!(
            probe.returns.load(Ordering::SeqCst),
            0,
            "right-slot activity must defer"
        );

        // Stale activity no longer defers
        sm.backdate_for_tests(10.0);
        sm.on_release();
        assert_eq!(probe.returns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_force_release_bypasses_gating() {
        let (sm, probe) = sm_with_probe(TrunkPolicy::default());
        sm.update_iden(1, confirmed_fdma_iden());
        sm.on_group_grant(CH, 0, 1, 2).expect("tune");
        sm.on_mac_active(1);
        sm.set_force_release(true);
        sm.on_release();
        assert_eq!(probe.returns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_enc_lockout_and_patch_override() {
        let (sm, probe) = sm_with_probe(TrunkPolicy::default());
        sm.update_iden(1, confirmed_fdma_iden());

        // ENC svc bit with lockout: denied
        let denied = sm.on_group_grant(CH, 0x40, 0x2345, 1001);
        assert_eq!(denied, Err(GrantDenied::EncLockout));
        assert_eq!(probe.tunes.load(Ordering::SeqCst), 0);

        // Regroup SG 69 with KEY=0 covering the TG: override applies
        {
            let mut patches = sm.patches();
            patches.update(69, true, true);
            patches.add_wgid(69, 0x2345);
            patches.set_key_alg(69, 0, 0x84, 17);
        }
        let freq = sm.on_group_grant(CH, 0x40, 0x2345, 1001);
        assert!(freq.is_ok(), "KEY=0 patch must override ENC lockout");
        assert_eq!(probe.tunes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tg_hold_gate() {
        let (sm, _probe) = sm_with_probe(TrunkPolicy::default());
        sm.update_iden(1, confirmed_fdma_iden());
        sm.set_tg_hold(1234);
        assert_eq!(
            sm.on_group_grant(CH, 0, 4321, 999),
            Err(GrantDenied::TgHold)
        );
        assert!(sm.on_group_grant(CH, 0, 1234, 888).is_ok());
    }

    #[test]
    fn test_trust_gate_with_provisional_allowance() {
        let (sm, _probe) = sm_with_probe(TrunkPolicy::default());
        // Learned, no provenance: provisional allow while on CC
        sm.update_iden(1, Iden {
            trust: IdenTrust::Learned,
            wacn: 0,
            sysid: 0,
            ..confirmed_fdma_iden()
        });
        assert!(sm.on_group_grant(CH, 0, 10, 20).is_ok());

        // Learned with provenance: blocked
        let (sm2, _p2) = sm_with_probe(TrunkPolicy::default());
        sm2.update_iden(1, Iden {
            trust: IdenTrust::Learned,
            ..confirmed_fdma_iden()
        });
        assert_eq!(
            sm2.on_group_grant(CH, 0, 10, 20),
            Err(GrantDenied::IdenUntrusted)
        );
    }

    #[test]
    fn test_group_lockout() {
        let (sm, _probe) = sm_with_probe(TrunkPolicy::default());
        sm.update_iden(1, confirmed_fdma_iden());
        sm.add_group_lockout(666);
        assert_eq!(
            sm.on_group_grant(CH, 0, 666, 1),
            Err(GrantDenied::GroupLockout)
        );
    }

    #[test]
    fn test_chan_map_override_wins() {
        let (sm, _probe) = sm_with_probe(TrunkPolicy::default());
        sm.update_iden(1, confirmed_fdma_iden());
        sm.set_chan_override(CH, 123_456_789);
        assert_eq!(sm.on_group_grant(CH, 0, 1, 2), Ok(123_456_789));
    }

    #[test]
    fn test_cc_hunt_with_cooldown() {
        let policy = TrunkPolicy {
            cc_timeout_s: 1.0,
            cc_eval_window_s: 2.0,
            cc_cooldown_s: 30.0,
            ..TrunkPolicy::default()
        };
        let (sm, probe) = sm_with_probe(policy);
        sm.set_cc_freq(851_000_000);
        sm.add_candidate(852_000_000);
        sm.add_candidate(853_000_000);

        // CC lost: first hunt tunes candidate A
        sm.backdate_for_tests(10.0);
        sm.tick();
        assert_eq!(probe.last_cc.load(Ordering::SeqCst), 852_000_000);

        // Evaluation window passes with no CC activity: cooldown A,
        // hunt again picks B.
        sm.backdate_for_tests(10.0);
        sm.tick();
        assert_eq!(probe.last_cc.load(Ordering::SeqCst), 853_000_000);
    }

    #[test]
    fn test_cc_sync_ends_evaluation() {
        let policy = TrunkPolicy {
            cc_timeout_s: 1.0,
            ..TrunkPolicy::default()
        };
        let (sm, probe) = sm_with_probe(policy);
        sm.add_candidate(852_000_000);
        sm.backdate_for_tests(10.0);
        sm.tick();
        assert_eq!(probe.last_cc.load(Ordering::SeqCst), 852_000_000);
        sm.notify_cc_sync();
        // No further hunts while CC sync is fresh
        sm.tick();
        assert_eq!(sm.candidate_count(), 1);
    }

    #[test]
    fn test_try_tick_skips_when_busy() {
        let (sm, _probe) = sm_with_probe(TrunkPolicy::default());
        let guard = sm.inner.lock();
        assert!(!sm.try_tick(), "tick in progress must be skipped");
        drop(guard);
        assert!(sm.try_tick());
    }

    #[test]
    fn test_neighbor_channel_feeds_candidates() {
        let (sm, _probe) = sm_with_probe(TrunkPolicy::default());
        sm.update_iden(1, confirmed_fdma_iden());
        sm.on_neighbor_channel(CH);
        assert_eq!(sm.candidate_count(), 1);
        // Unknown IDEN resolves to nothing and adds nothing
        sm.on_neighbor_channel(0x7001);
        assert_eq!(sm.candidate_count(), 1);
    }

    #[test]
    fn test_candidate_persistence_disabled_without_cache_dir() {
        let (sm, _probe) = sm_with_probe(TrunkPolicy::default());
        sm.add_candidate(852_000_000);
        assert!(sm.persist_candidates().is_ok());
        assert_eq!(sm.load_candidates().unwrap(), 0);
    }

    #[test]
    fn test_candidate_persistence_round_trip() {
        let dir = tempfile::tempdir().expect("tempdir");
        let policy = TrunkPolicy {
            cache_dir: Some(dir.path().to_path_buf()),
            ..TrunkPolicy::default()
        };
        let (sm, _probe) = sm_with_probe(policy.clone());
        sm.set_system(SystemId {
            wacn: 0xBEE00,
            sysid: 0x123,
            rfss: 0,
            site: 0,
        });
        sm.add_candidate(852_000_000);
        sm.persist_candidates().expect("persist");

        let (sm2, _p2) = sm_with_probe(policy);
        sm2.set_system(SystemId {
            wacn: 0xBEE00,
            sysid: 0x123,
            rfss: 0,
            site: 0,
        });
        assert_eq!(sm2.load_candidates().expect("load"), 1);
        assert_eq!(sm2.candidate_count(), 1);
    }
}
