// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Voice-grade keystream generators.
//!
//! Every cipher here produces keystream for vocoder frames; the
//! protocol decoders XOR it over codeword bits when a key is loaded.
//! AES and DES are standard-exact (verified against published
//! vectors); the LFSR scramblers and the PC4-style frame cipher cover
//! the vendor side. Per policy, the remaining vendor composites (RC2
//! based suites, PC5) are out of the supported subset.

pub mod aes;
pub mod des;
pub mod lfsr;
pub mod pc4;
pub mod rc4;

pub use aes::{AesKeySize, AesKeystream};
pub use rc4::Rc4;
