// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Background trunking watchdog.
//!
//! Runs the follower tick at 1 Hz so hangtime and CC-return logic keep
//! moving when the demod thread is stalled in upstream IO. The tick
//! callback is expected to be reentrancy-guarded (`try_tick`); the
//! watchdog just provides the heartbeat and a clean stop.

use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

struct Shared {
    stop: Mutex<bool>,
    wake: Condvar,
}

/// Handle to the running watchdog thread.
pub struct Watchdog {
    shared: Arc<Shared>,
    handle: Option<JoinHandle<()>>,
}

impl Watchdog {
    /// Start the 1 Hz watchdog; `tick` runs on the watchdog thread.
    pub fn start<F>(tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        Self::start_with_period(Duration::from_secs(1), tick)
    }

    /// Start with an explicit period (tests use short ones).
    pub fn start_with_period<F>(period: Duration, tick: F) -> Self
    where
        F: Fn() + Send + 'static,
    {
        let shared = Arc::new(Shared {
            stop: Mutex::new(false),
            wake: Condvar::new(),
        });
        let thread_shared = Arc::clone(&shared);
        let handle = std::thread::Builder::new()
            .name("dvrx-watchdog".into())
            .spawn(move || loop {
                {
                    let mut stop = thread_shared.stop.lock();
                    if *stop {
                        return;
                    }
                    let _ = thread_shared.wake.wait_for(&mut stop, period);
                    if *stop {
                        return;
                    }
                }
                if crate::runtime::shutdown::is_shutdown_requested() {
                    return;
                }
                tick();
            })
            .expect("spawn watchdog thread");
        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Stop and join the watchdog.
    pub fn stop(mut self) {
        self.signal_stop();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }

    fn signal_stop(&self) {
        let mut stop = self.shared.stop.lock();
        *stop = true;
        self.shared.wake.notify_all();
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        self.signal_stop();
        if let Some(h) = self.handle.take() {
            let _ = h.join();
        }
    }
}
