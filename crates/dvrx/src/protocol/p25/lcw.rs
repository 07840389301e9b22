// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! P25 link control word opcodes.
//!
//! LCWs ride in LDU1s and terminators; the subset parsed here covers
//! what the follower and the event log consume.

/// Parsed link control content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkControl {
    GroupVoice {
        svc: u8,
        tg: u16,
        src: u32,
    },
    UnitToUnit {
        svc: u8,
        dst: u32,
        src: u32,
    },
    GroupUpdate {
        channel_a: u16,
        group_a: u16,
        channel_b: u16,
        group_b: u16,
    },
    /// Adjacent-site broadcast carrying a CC channel.
    AdjacentSite {
        rfss: u8,
        site: u8,
        channel: u16,
    },
    CallTermination {
        src: u32,
    },
    Other {
        lco: u8,
        mfid: u8,
    },
}

/// Parse a 72-bit LCW (after FEC).
pub fn parse_lcw(bits: &[u8]) -> Option<LinkControl> {
    if bits.len() < 72 {
        return None;
    }
    let field = |lo: usize, n: usize| -> u32 {
        bits[lo..lo + n]
            .iter()
            .fold(0u32, |acc, b| (acc << 1) | u32::from(*b & 1))
    };
    let lco = field(0, 8) as u8 & 0x3F;
    let mfid = field(8, 8) as u8;
    Some(match lco {
        0x00 => LinkControl::GroupVoice {
            svc: field(16, 8) as u8,
            tg: field(32, 16) as u16,
            src: field(48, 24),
        },
        0x03 => LinkControl::UnitToUnit {
            svc: field(16, 8) as u8,
            dst: field(24, 24),
            src: field(48, 24),
        },
        0x02 => LinkControl::GroupUpdate {
            channel_a: field(8, 16) as u16,
            group_a: field(24, 16) as u16,
            channel_b: field(40, 16) as u16,
            group_b: field(56, 16) as u16,
        },
        0x27 => LinkControl::AdjacentSite {
            rfss: field(24, 8) as u8,
            site: field(32, 8) as u8,
            channel: field(40, 16) as u16,
        },
        0x0F => LinkControl::CallTermination { src: field(48, 24) },
        _ => LinkControl::Other { lco, mfid },
    })
}
