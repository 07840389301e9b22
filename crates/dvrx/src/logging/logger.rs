// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global logger instance and initialization.
//!
//! Thread-safe singleton with a single active output. Initialization is
//! one-shot: the first `init_logger` wins, later calls are ignored so
//! library consumers cannot steal the sink from the application.

use super::output::{LogLevel, Output};
use parking_lot::Mutex;
use std::io;
use std::sync::{Arc, OnceLock};

static LOGGER: OnceLock<Arc<Mutex<GlobalLogger>>> = OnceLock::new();

/// Global logger state: active output plus the minimum level.
pub struct GlobalLogger {
    output: Option<Arc<dyn Output>>,
    level_filter: LogLevel,
}

impl GlobalLogger {
    fn new() -> Self {
        Self {
            output: None,
            level_filter: LogLevel::Info,
        }
    }

    fn log(&self, level: LogLevel, message: &str) -> io::Result<()> {
        if level < self.level_filter {
            return Ok(());
        }
        if let Some(ref output) = self.output {
            output.write(level, message)?;
        }
        Ok(())
    }

    fn flush(&self) -> io::Result<()> {
        if let Some(ref output) = self.output {
            output.flush()?;
        }
        Ok(())
    }
}

/// Initialize the global logger with the given output and minimum level.
///
/// Only the first call has an effect. Call early in startup, before the
/// engine threads are spawned.
pub fn init_logger(output: Arc<dyn Output>, level: LogLevel) {
    let _ = LOGGER.get_or_init(|| {
        Arc::new(Mutex::new(GlobalLogger {
            output: Some(output),
            level_filter: level,
        }))
    });
}

#[inline]
fn get_logger() -> Option<Arc<Mutex<GlobalLogger>>> {
    LOGGER.get().cloned()
}

/// Write one message through the global logger.
///
/// Silent no-op when the logger has not been initialized; the logging
/// macros call this for every message.
#[inline]
pub(crate) fn log_message(level: LogLevel, message: &str) -> io::Result<()> {
    match get_logger() {
        Some(logger) => logger.lock().log(level, message),
        None => Ok(()),
    }
}

/// Trace a function entry point (used by `trace_fn!()`).
#[cfg(feature = "trace")]
#[inline]
pub(crate) fn trace_entry(fn_name: &str) -> io::Result<()> {
    log_message(LogLevel::Debug, &format!("[ENTER:FNC] {}", fn_name))
}

/// Flush the global logger's output. Safe to call before initialization.
pub fn flush_logger() -> io::Result<()> {
    match get_logger() {
        Some(logger) => logger.lock().flush(),
        None => Ok(()),
    }
}

impl Default for GlobalLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::ConsoleOutput;

    #[test]
    fn test_log_message_no_panic() {
        // Must not panic even if logger not initialized
        assert!(log_message(LogLevel::Info, "test message").is_ok());
    }

    #[test]
    fn test_flush_logger_no_panic() {
        assert!(flush_logger().is_ok());
    }

    #[test]
    fn test_init_is_one_shot() {
        let a = Arc::new(ConsoleOutput::new(LogLevel::Debug));
        init_logger(a.clone(), LogLevel::Debug);
        // Second init is ignored; logging still works
        init_logger(a, LogLevel::Error);
        let _ = log_message(LogLevel::Info, "still works");
    }
}
