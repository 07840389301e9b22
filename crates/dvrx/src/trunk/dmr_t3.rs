// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DMR Tier III follower state machine.
//!
//! Same shape as the P25 follower with one addition: logical channel
//! numbers resolve through a learned LPCN map with per-entry trust.
//! Untrusted mappings may only be used while sitting on the control
//! channel (the CC itself vouches for what it announced).

use parking_lot::Mutex;
use std::sync::Arc;

use super::candidates::CcCandidates;
use crate::runtime::clock::now_monotonic_s;
use crate::runtime::hooks::Hooks;

/// Follower state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum T3State {
    #[default]
    OnCc,
    Tuned,
}

/// Trust of a learned LPCN -> frequency mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LcnTrust {
    Learned,
    Confirmed,
}

#[derive(Debug, Clone, Copy)]
struct LcnEntry {
    freq: i64,
    trust: LcnTrust,
}

#[derive(Debug, Clone, Copy, Default)]
struct SlotState {
    voice_active: bool,
    t_voice: f64,
}

struct Inner {
    state: T3State,
    cc_freq: i64,
    vc_freq: i64,
    slots: [SlotState; 2],
    hangtime_s: f64,
    candidates: CcCandidates,
    tune_count: u32,
    release_count: u32,
}

/// DMR Tier III follower.
pub struct DmrT3Sm {
    inner: Mutex<Inner>,
    hooks: Arc<Hooks>,
    /// LPCN -> frequency map; written by CSBK parsing on the demod
    /// thread, read by the watchdog and UI.
    lcn_map: dashmap::DashMap<u16, LcnEntry>,
    ted_sps: u32,
}

impl DmrT3Sm {
    pub fn new(hangtime_s: f64, hooks: Arc<Hooks>) -> Self {
        Self {
            inner: Mutex::new(Inner {
                state: T3State::OnCc,
                cc_freq: 0,
                vc_freq: 0,
                slots: [SlotState::default(); 2],
                hangtime_s,
                candidates: CcCandidates::new(),
                tune_count: 0,
                release_count: 0,
            }),
            hooks,
            lcn_map: dashmap::DashMap::new(),
            ted_sps: 10,
        }
    }

    pub fn state(&self) -> T3State {
        self.inner.lock().state
    }

    pub fn vc_freq(&self) -> i64 {
        self.inner.lock().vc_freq
    }

    pub fn tune_count(&self) -> u32 {
        self.inner.lock().tune_count
    }

    pub fn release_count(&self) -> u32 {
        self.inner.lock().release_count
    }

    pub fn set_cc_freq(&self, freq: i64) {
        self.inner.lock().cc_freq = freq;
    }

    /// Learn an LPCN mapping (from CC broadcasts).
    pub fn learn_lcn(&self, lpcn: u16, freq: i64, confirmed: bool) {
        let trust = if confirmed {
            LcnTrust::Confirmed
        } else {
            LcnTrust::Learned
        };
        // Never downgrade a confirmed mapping.
        match self.lcn_map.get(&lpcn) {
            Some(e) if e.trust == LcnTrust::Confirmed && !confirmed => {}
            _ => {
                self.lcn_map.insert(lpcn, LcnEntry { freq, trust });
            }
        }
    }

    /// Resolve an LPCN, honoring trust: learned-only mappings resolve
    /// only while on the CC.
    pub fn lcn_to_freq(&self, lpcn: u16) -> i64 {
        let on_cc = self.inner.lock().state == T3State::OnCc;
        match self.lcn_map.get(&lpcn) {
            Some(e) if e.trust == LcnTrust::Confirmed || on_cc => e.freq,
            _ => 0,
        }
    }

    /// Group voice grant: explicit frequency preferred, else the LPCN
    /// resolves through the learned map.
    pub fn on_group_grant(&self, freq_hz: i64, lpcn: u16, _tg: u32, _src: u32) -> bool {
        let freq = if freq_hz > 0 {
            freq_hz
        } else {
            self.lcn_to_freq(lpcn)
        };
        if freq <= 0 {
            return false;
        }
        let mut g = self.inner.lock();
        g.vc_freq = freq;
        g.state = T3State::Tuned;
        g.slots = [SlotState::default(); 2];
        g.tune_count += 1;
        drop(g);
        self.hooks.tune_to_freq(freq, self.ted_sps);
        true
    }

    /// Individual grant: same resolution path.
    pub fn on_indiv_grant(&self, freq_hz: i64, lpcn: u16, dst: u32, src: u32) -> bool {
        self.on_group_grant(freq_hz, lpcn, dst, src)
    }

    /// Voice sync seen on `slot`.
    pub fn on_voice_sync(&self, slot: usize) {
        let mut g = self.inner.lock();
        let slot = slot.min(1);
        g.slots[slot].voice_active = true;
        g.slots[slot].t_voice = now_monotonic_s();
    }

    /// Slot idle indication.
    pub fn on_idle(&self, slot: usize) {
        self.inner.lock().slots[slot.min(1)].voice_active = false;
    }

    /// Explicit release (P_CLEAR).
    pub fn on_release(&self) {
        let mut g = self.inner.lock();
        g.release_count += 1;
        let both_quiet = g.slots.iter().all(|s| !s.voice_active);
        if both_quiet {
            Self::release_locked(&mut g);
            drop(g);
            self.hooks.return_to_cc();
        }
    }

    /// Neighbor/alternate CC update.
    pub fn on_neighbor_update(&self, freqs: &[i64]) {
        let mut g = self.inner.lock();
        let cc = g.cc_freq;
        for &f in freqs {
            g.candidates.add(f, true, cc);
        }
    }

    /// Next candidate CC discovered from DMR PDUs.
    pub fn next_cc_candidate(&self) -> Option<i64> {
        let mut g = self.inner.lock();
        let cc = g.cc_freq;
        g.candidates.next(now_monotonic_s(), cc)
    }

    /// Hangtime tick.
    pub fn tick(&self) {
        let g = self.inner.lock();
        self.tick_guarded(g);
    }

    /// Watchdog entry with the reentrancy guard.
    pub fn try_tick(&self) -> bool {
        match self.inner.try_lock() {
            Some(g) => {
                self.tick_guarded(g);
                true
            }
            None => false,
        }
    }

    fn tick_guarded(&self, mut g: parking_lot::MutexGuard<'_, Inner>) {
        if g.state != T3State::Tuned {
            return;
        }
        let now = now_monotonic_s();
        let any_active = g.slots.iter().any(|s| s.voice_active);
        let last_voice = g.slots[0].t_voice.max(g.slots[1].t_voice);
        if !any_active && now - last_voice >= g.hangtime_s {
            Self::release_locked(&mut g);
            drop(g);
            self.hooks.return_to_cc();
        }
    }

    fn release_locked(g: &mut Inner) {
        g.state = T3State::OnCc;
        g.vc_freq = 0;
        g.slots = [SlotState::default(); 2];
    }

    /// Backdate timers (test support).
    #[doc(hidden)]
    pub fn backdate_for_tests(&self, secs: f64) {
        let mut g = self.inner.lock();
        for s in g.slots.iter_mut() {
            s.t_voice -= secs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::hooks::TrunkTuningHooks;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn sm_with_probe(hangtime: f64) -> (DmrT3Sm, Arc<AtomicU32>, Arc<AtomicU32>) {
        let tunes = Arc::new(AtomicU32::new(0));
        let returns = Arc::new(AtomicU32::new(0));
        let hooks = Arc::new(Hooks::new());
        let (t, r) = (Arc::clone(&tunes), Arc::clone(&returns));
        hooks.set_trunk_tuning(TrunkTuningHooks {
            tune_to_freq: Some(Arc::new(move |_f, _s| {
                t.fetch_add(1, Ordering::SeqCst);
            })),
            return_to_cc: Some(Arc::new(move || {
                r.fetch_add(1, Ordering::SeqCst);
            })),
            ..TrunkTuningHooks::default()
        });
        (DmrT3Sm::new(hangtime, hooks), tunes, returns)
    }

    #[test]
    fn test_grant_voice_hang_release_cycle() {
        let (sm, tunes, returns) = sm_with_probe(0.5);
        sm.set_cc_freq(851_000_000);
        assert_eq!(sm.state(), T3State::OnCc);

        assert!(sm.on_group_grant(852_000_000, 0, 101, 1234));
        assert_eq!(sm.state(), T3State::Tuned);
        assert_eq!(sm.vc_freq(), 852_000_000);
        assert_eq!(tunes.load(Ordering::SeqCst), 1);

        sm.on_voice_sync(0);
        sm.on_idle(0);
        sm.backdate_for_tests(10.0);
        sm.tick();
        assert_eq!(sm.state(), T3State::OnCc);
        assert_eq!(sm.vc_freq(), 0);
        assert_eq!(returns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_release_deferred_while_slot_active() {
        let (sm, _tunes, returns) = sm_with_probe(0.5);
        sm.on_group_grant(852_000_000, 0, 1, 2);
        sm.on_voice_sync(1);
        sm.on_release();
        assert_eq!(sm.release_count(), 1);
        assert_eq!(returns.load(Ordering::SeqCst), 0, "active slot defers");
        sm.on_idle(1);
        sm.on_release();
        assert_eq!(returns.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_lcn_trust_gating() {
        let (sm, _tunes, _returns) = sm_with_probe(1.0);
        sm.learn_lcn(5, 853_000_000, false);

        // On CC: learned mapping usable
        assert_eq!(sm.lcn_to_freq(5), 853_000_000);
        assert!(sm.on_group_grant(0, 5, 9, 10));

        // Now tuned: learned-only mapping no longer resolves
        assert_eq!(sm.lcn_to_freq(5), 0);

        // Confirmed mapping resolves anywhere
        sm.learn_lcn(6, 854_000_000, true);
        assert_eq!(sm.lcn_to_freq(6), 854_000_000);
    }

    #[test]
    fn test_confirmed_mapping_not_downgraded() {
        let (sm, _t, _r) = sm_with_probe(1.0);
        sm.learn_lcn(7, 855_000_000, true);
        sm.learn_lcn(7, 856_000_000, false);
        assert_eq!(sm.lcn_to_freq(7), 855_000_000);
    }

    #[test]
    fn test_grant_without_resolution_fails() {
        let (sm, tunes, _r) = sm_with_probe(1.0);
        assert!(!sm.on_group_grant(0, 99, 1, 2));
        assert_eq!(tunes.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_neighbors_feed_candidates() {
        let (sm, _t, _r) = sm_with_probe(1.0);
        sm.set_cc_freq(851_000_000);
        sm.on_neighbor_update(&[852_000_000, 853_000_000, 852_000_000]);
        assert_eq!(sm.next_cc_candidate(), Some(852_000_000));
        assert_eq!(sm.next_cc_candidate(), Some(853_000_000));
    }
}
