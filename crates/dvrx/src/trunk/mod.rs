// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Trunking: voice-channel followers, control-channel candidates,
//! channel/IDEN tables, regroup patches and the background watchdog.
//!
//! The state machines own their state behind an internal lock so the
//! 1 Hz watchdog can tick them while the demod thread is stalled in
//! upstream IO; a tick already in progress is simply skipped. All
//! timing runs on monotonic seconds.

pub mod candidates;
pub mod dmr_t3;
pub mod iden;
pub mod p25_sm;
pub mod patch;
pub mod watchdog;

pub use candidates::CcCandidates;
pub use dmr_t3::DmrT3Sm;
pub use iden::{IdenTable, SystemId};
pub use p25_sm::{P25TrunkSm, TrunkPolicy};
pub use patch::PatchTable;
pub use watchdog::Watchdog;
