// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Realtime scheduling and CPU affinity for the critical threads.
//!
//! The source, demod and audio roles may be switched to SCHED_FIFO and
//! pinned to a CPU, driven by [`crate::config::RtSched`]. Failures are
//! logged and ignored: running without elevated privileges is normal.

#![allow(unused_imports)]

use crate::config::RtSched;

/// Thread role label used for priority/affinity selection and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Source,
    Demod,
    Audio,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::Source => "source",
            Role::Demod => "demod",
            Role::Audio => "audio",
        }
    }

    fn cpu_for(self, cfg: &RtSched) -> i32 {
        match self {
            Role::Source => cfg.cpu_source,
            Role::Demod => cfg.cpu_demod,
            Role::Audio => cfg.cpu_audio,
        }
    }
}

/// Apply SCHED_FIFO and optional CPU pinning to the calling thread.
///
/// No-op when `cfg.enabled` is false. Best-effort otherwise.
#[cfg(target_os = "linux")]
pub fn apply_to_current_thread(cfg: &RtSched, role: Role) {
    if !cfg.enabled {
        return;
    }

    let priority = if cfg.priority > 0 { cfg.priority } else { 10 };
    // SAFETY: plain syscalls on the calling thread with stack-local args.
    unsafe {
        let param = libc::sched_param {
            sched_priority: priority,
        };
        if libc::sched_setscheduler(0, libc::SCHED_FIFO, &param) != 0 {
            crate::warn!(
                "{} thread: SCHED_FIFO unavailable (needs elevated privileges)",
                role.as_str()
            );
        } else {
            crate::info!("{} thread: SCHED_FIFO priority {}", role.as_str(), priority);
        }

        let cpu = role.cpu_for(cfg);
        if cpu >= 0 {
            let mut set: libc::cpu_set_t = std::mem::zeroed();
            libc::CPU_ZERO(&mut set);
            libc::CPU_SET(cpu as usize, &mut set);
            if libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set) != 0 {
                crate::warn!("{} thread: affinity to CPU {} failed", role.as_str(), cpu);
            } else {
                crate::info!("{} thread: pinned to CPU {}", role.as_str(), cpu);
            }
        }
    }
}

/// Non-Linux fallback: realtime tuning unsupported, silently skip.
#[cfg(not(target_os = "linux"))]
pub fn apply_to_current_thread(cfg: &RtSched, _role: Role) {
    let _ = cfg;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_is_noop() {
        // Must never panic regardless of privileges
        apply_to_current_thread(&RtSched::default(), Role::Demod);
    }
}
