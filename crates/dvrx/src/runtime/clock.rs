// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Monotonic time helpers for state-machine timing.
//!
//! Every trunking timeout (hangtime, grants, cooldowns) runs on monotonic
//! seconds; wall-clock time is used only for event-log display.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Monotonic seconds since the first call in this process.
#[inline]
pub fn now_monotonic_s() -> f64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_secs_f64()
}

/// Wall-clock seconds since the Unix epoch (event-log display only).
#[inline]
pub fn now_wall_s() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
