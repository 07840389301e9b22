// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type for the engine boundary.
//!
//! DSP kernels never abort or return errors: they clamp, skip or emit
//! sentinel values. FEC decoders report a [`crate::fec::FecStatus`], never an
//! error. This enum covers the only fallible surfaces: configuration
//! validation, IO backends, and persisted-state access.

use std::io;

/// Crate result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced to the engine caller.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Configuration rejected before engine start.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A sample source or audio sink failed to open or disconnected.
    #[error("io backend: {0}")]
    Io(#[from] io::Error),

    /// Candidate-cache or other persisted state could not be used.
    #[error("persisted state: {0}")]
    PersistedState(String),

    /// The engine was asked to start twice or used after shutdown.
    #[error("engine state: {0}")]
    EngineState(&'static str),
}
