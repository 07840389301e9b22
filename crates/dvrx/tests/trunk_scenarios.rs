// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Trunking follower scenarios end to end: grants through policy
//! gates, deferred release, candidate hunting with cooldown, and the
//! background watchdog.

use dvrx::runtime::hooks::{Hooks, TrunkTuningHooks};
use dvrx::trunk::iden::{Iden, IdenTrust, SystemId};
use dvrx::trunk::p25_sm::{GrantDenied, SmState};
use dvrx::trunk::{P25TrunkSm, TrunkPolicy, Watchdog};
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct Probe {
    tunes: AtomicU32,
    returns: AtomicU32,
    last_vc: AtomicI64,
    last_cc: AtomicI64,
}

fn build(policy: TrunkPolicy) -> (Arc<P25TrunkSm>, Arc<Probe>) {
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
    let sm = Arc::new(P25TrunkSm::new(policy, hooks));
    sm.set_cc_freq(851_000_000);
    sm.update_iden(
        1,
        Iden {
            channel_type: 1,
            tdma: false,
            base_freq: 851_000_000 / 5,
            spacing: 100,
            trust: IdenTrust::Confirmed,
            wacn: 0xBEE00,
            sysid: 0x123,
        },
    );
    (sm, probe)
}

const CH: u16 = (1 << 12) | 0x000A;

#[test]
fn release_with_active_right_slot_defers_return() {
    let (sm, probe) = build(TrunkPolicy {
        hangtime_s: 2.0,
        ..TrunkPolicy::default()
    });
    sm.on_group_grant(CH, 0, 0x2001, 1234).expect("tune");
    sm.on_voice_active(0);
    sm.on_idle(0);
    sm.on_mac_active(1); // right slot just spoke

    let before = sm.release_count();
    sm.on_release();
    assert_eq!(sm.release_count(), before + 1);
    assert_eq!(
        probe.returns.load(Ordering::SeqCst),
        0,
        "release must defer while the right slot is active"
    );

    // Force-release overrides the gate immediately.
    sm.set_force_release(true);
    sm.on_release();
    assert_eq!(probe.returns.load(Ordering::SeqCst), 1);
    assert_eq!(sm.state(), SmState::OnCc);
}

#[test]
fn quiet_slots_return_within_hangtime_plus_grace() {
    let (sm, probe) = build(TrunkPolicy {
        hangtime_s: 0.05,
        grace_s: 0.05,
        activity_window_s: 0.05,
        ..TrunkPolicy::default()
    });
    sm.on_group_grant(CH, 0, 42, 7).expect("tune");
    sm.on_voice_active(0);
    sm.on_idle(0);
    assert_eq!(sm.state(), SmState::Hang);
    std::thread::sleep(Duration::from_millis(150));
    sm.tick();
    assert_eq!(sm.state(), SmState::OnCc);
    assert_eq!(probe.returns.load(Ordering::SeqCst), 1);
}

#[test]
fn candidate_cooldown_rotates_hunt() {
    let (sm, probe) = build(TrunkPolicy {
        cc_timeout_s: 0.5,
        cc_eval_window_s: 0.5,
        cc_cooldown_s: 60.0,
        ..TrunkPolicy::default()
    });
    sm.add_candidate(852_000_000);
    sm.add_candidate(853_000_000);

    // Lose the CC; first hunt tunes A.
    sm.backdate_for_tests(10.0);
    sm.tick();
    assert_eq!(probe.last_cc.load(Ordering::SeqCst), 852_000_000);

    // Evaluation expires quietly; next hunt must pick B.
    sm.backdate_for_tests(10.0);
    sm.tick();
    assert_eq!(probe.last_cc.load(Ordering::SeqCst), 853_000_000);
}

#[test]
fn enc_grant_tunes_via_patch_key_zero_override() {
    let (sm, probe) = build(TrunkPolicy::default()); // tune_enc_calls off
    {
        let mut patches = sm.patches();
        patches.update(69, true, true);
        patches.add_wgid(69, 0x2345);
        patches.set_key_alg(69, 0, 0x84, 17);
    }
    let res = sm.on_group_grant(CH, 0x40, 0x2345, 1001);
    assert!(res.is_ok(), "KEY=0 regroup must override the ENC lockout");
    assert_eq!(probe.tunes.load(Ordering::SeqCst), 1);

    // A non-member TG stays locked out.
    assert_eq!(
        sm.on_group_grant(CH, 0x40, 0x9999, 1001),
        Err(GrantDenied::EncLockout)
    );
}

#[test]
fn untrusted_iden_blocks_unless_provisional() {
    let (sm, _probe) = build(TrunkPolicy::default());
    sm.update_iden(
        2,
        Iden {
            channel_type: 1,
            tdma: false,
            base_freq: 852_000_000 / 5,
            spacing: 100,
            trust: IdenTrust::Learned,
            wacn: 0xBEE00, // provenance set: no provisional allowance
            sysid: 0x123,
        },
    );
    let ch2 = (2 << 12) | 0x0004;
    assert_eq!(
        sm.on_group_grant(ch2, 0, 10, 20),
        Err(GrantDenied::IdenUntrusted)
    );

    // Same entry without provenance while on CC: provisional allow.
    sm.update_iden(
        3,
        Iden {
            channel_type: 1,
            tdma: false,
            base_freq: 853_000_000 / 5,
            spacing: 100,
            trust: IdenTrust::Learned,
            wacn: 0,
            sysid: 0,
        },
    );
    let ch3 = (3 << 12) | 0x0004;
    assert!(sm.on_group_grant(ch3, 0, 10, 20).is_ok());
}

#[test]
fn watchdog_ticks_follower_while_demod_is_stalled() {
    let (sm, probe) = build(TrunkPolicy {
        grant_voice_timeout_s: 0.05,
        ..TrunkPolicy::default()
    });
    sm.on_group_grant(CH, 0, 77, 88).expect("tune");
    assert_eq!(sm.state(), SmState::Armed);

    let wd_sm = Arc::clone(&sm);
    let wd = Watchdog::start_with_period(Duration::from_millis(10), move || {
        wd_sm.try_tick();
    });
    // Nobody calls tick() from the "demod" side; the watchdog must
    // still time the silent grant out.
    std::thread::sleep(Duration::from_millis(300));
    wd.stop();
    assert_eq!(sm.state(), SmState::OnCc);
    assert!(probe.returns.load(Ordering::SeqCst) >= 1);
}

#[test]
fn candidate_cache_persists_per_system() {
    let dir = tempfile::tempdir().expect("tempdir");
    let policy = TrunkPolicy {
        cache_dir: Some(dir.path().to_path_buf()),
        ..TrunkPolicy::default()
    };
    let (sm, _probe) = build(policy.clone());
    sm.set_system(SystemId {
        wacn: 0xBEE00,
        sysid: 0x123,
        rfss: 0,
        site: 0,
    });
    sm.add_candidate(852_000_000);
    sm.add_candidate(853_000_000);
    sm.persist_candidates().expect("persist");

    let (sm2, _p2) = build(policy);
    sm2.set_system(SystemId {
        wacn: 0xBEE00,
        sysid: 0x123,
        rfss: 0,
        site: 0,
    });
    assert_eq!(sm2.load_candidates().expect("load"), 2);
}
