// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global cooperative shutdown flag.
//!
//! Set from the signal handler (or the embedding application) and polled
//! by every processing loop. Shutdown is a signal, never an error: loops
//! drain their current block and return.

use std::sync::atomic::{AtomicBool, Ordering};

static SHUTDOWN: AtomicBool = AtomicBool::new(false);

/// Request a graceful shutdown of all engine threads.
///
/// Async-signal-safe (single atomic store).
#[inline]
pub fn request_shutdown() {
    SHUTDOWN.store(true, Ordering::Release);
}

/// Whether shutdown has been requested.
#[inline]
pub fn is_shutdown_requested() -> bool {
    SHUTDOWN.load(Ordering::Acquire)
}

/// Clear the flag (tests and engine restart).
#[inline]
pub fn reset_shutdown() {
    SHUTDOWN.store(false, Ordering::Release);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_sets_flag() {
        reset_shutdown();
        assert!(!is_shutdown_requested());
        request_shutdown();
        assert!(is_shutdown_requested());
        reset_shutdown();
    }
}
