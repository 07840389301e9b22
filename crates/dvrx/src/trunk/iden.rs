// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! P25 channel/IDEN tables and channel-to-frequency resolution.
//!
//! A 16-bit channel decomposes as `(iden << 12) | offset`. Each IDEN
//! carries a bandplan (base frequency in 5 Hz units, spacing in 125 Hz
//! units), a TDMA flag, a trust level and the provenance (WACN/SYSID)
//! it was learned under. The TDMA denominator comes from the channel
//! type's slots-per-carrier; when the system is TDMA but the IDEN's
//! own flag is unknown, the resolver falls back to a denominator of 2.

/// Trust level of a learned IDEN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub enum IdenTrust {
    #[default]
    Unknown,
    Learned,
    Confirmed,
}

/// System identity used for provenance and cache naming.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SystemId {
    pub wacn: u32,
    pub sysid: u32,
    pub rfss: u16,
    pub site: u16,
}

/// One bandplan entry.
#[derive(Debug, Clone, Copy, Default)]
pub struct Iden {
    pub channel_type: u8,
    pub tdma: bool,
    /// Base frequency in 5 Hz units.
    pub base_freq: i64,
    /// Channel spacing in 125 Hz units.
    pub spacing: i64,
    pub trust: IdenTrust,
    /// Provenance: system the entry was learned under (0 = unset).
    pub wacn: u32,
    pub sysid: u32,
}

/// Slots per carrier by channel type.
fn slots_per_carrier(channel_type: u8) -> i64 {
    match channel_type {
        3 | 5 => 2,
        4 => 4,
        _ => 1,
    }
}

/// All sixteen IDEN slots plus the system-wide TDMA hint.
#[derive(Debug, Default)]
pub struct IdenTable {
    idens: [Option<Iden>; 16],
    /// The control channel itself runs Phase 2 TDMA.
    pub sys_is_tdma: bool,
}

impl IdenTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install or update an IDEN entry.
    pub fn set(&mut self, iden: usize, entry: Iden) {
        if iden < 16 {
            self.idens[iden] = Some(entry);
        }
    }

    pub fn get(&self, iden: usize) -> Option<&Iden> {
        self.idens.get(iden).and_then(|e| e.as_ref())
    }

    /// Clear all learned entries (site change).
    pub fn reset(&mut self) {
        self.idens = [None; 16];
    }

    /// Mark every entry trusted for the current site (confirmed by a
    /// matching system broadcast).
    pub fn confirm_all(&mut self, sys: &SystemId) {
        for e in self.idens.iter_mut().flatten() {
            e.trust = IdenTrust::Confirmed;
            e.wacn = sys.wacn;
            e.sysid = sys.sysid;
        }
    }

    /// Resolve a 16-bit channel to a frequency in Hz. Returns 0 when
    /// the IDEN is unknown (callers treat 0 as invalid).
    pub fn channel_to_freq(&self, channel: u16) -> i64 {
        let iden = usize::from(channel >> 12);
        let offset = i64::from(channel & 0x0FFF);
        let Some(entry) = self.get(iden) else {
            return 0;
        };
        if entry.base_freq <= 0 || entry.spacing <= 0 {
            return 0;
        }
        let denom = if entry.tdma {
            slots_per_carrier(entry.channel_type)
        } else if self.sys_is_tdma {
            // TDMA system, IDEN denominator unknown: assume 2 slots.
            2
        } else {
            1
        };
        let step = offset / denom;
        entry.base_freq * 5 + step * entry.spacing * 125
    }

    /// TDMA slot addressed by a channel (low bits below the denominator).
    pub fn channel_slot(&self, channel: u16) -> usize {
        let iden = usize::from(channel >> 12);
        let offset = i64::from(channel & 0x0FFF);
        let denom = match self.get(iden) {
            Some(e) if e.tdma => slots_per_carrier(e.channel_type),
            _ if self.sys_is_tdma => 2,
            _ => 1,
        };
        if denom > 1 {
            (offset % denom) as usize
        } else {
            0
        }
    }

    /// Display suffix for a channel: `chan` for FDMA, `chan-slot` for
    /// TDMA carriers.
    pub fn format_chan_suffix(&self, channel: u16) -> String {
        let iden = usize::from(channel >> 12);
        let offset = i64::from(channel & 0x0FFF);
        let denom = match self.get(iden) {
            Some(e) if e.tdma => slots_per_carrier(e.channel_type),
            _ if self.sys_is_tdma => 2,
            _ => 1,
        };
        if denom > 1 {
            format!("{}-{}", offset / denom, (offset % denom) + 1)
        } else {
            format!("{}", offset)
        }
    }
}
