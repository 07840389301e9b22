// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! P25 trunking signal blocks (TSBK).
//!
//! One TSBK is 12 octets under CCITT CRC-16, transported as 98 dibits
//! of 1/2-rate trellis. The opcode subset parsed here is what the
//! follower consumes: voice grants, IDEN_UP bandplans, adjacent/RFSS
//! status, and network status.

use crate::fec::crc::crc16_ccitt_plain;
use crate::fec::trellis::{dibits_to_points, trellis12_decode, trellis12_encode, points_to_dibits};
use crate::trunk::iden::Iden;

/// Follower-relevant TSBK content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tsbk {
    GroupVoiceGrant {
        svc: u8,
        channel: u16,
        tg: u16,
        src: u32,
    },
    UnitVoiceGrant {
        channel: u16,
        dst: u32,
        src: u32,
    },
    IdenUp {
        iden: usize,
        entry: IdenEntryRaw,
    },
    AdjacentStatus {
        rfss: u8,
        site: u8,
        channel: u16,
    },
    NetworkStatus {
        wacn: u32,
        sysid: u16,
        channel: u16,
    },
    RfssStatus {
        rfss: u8,
        site: u8,
        channel: u16,
    },
    Other {
        opcode: u8,
        mfid: u8,
    },
}

/// Raw bandplan fields from IDEN_UP before trust stamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdenEntryRaw {
    pub channel_type: u8,
    pub tdma: bool,
    pub base_freq: i64,
    pub spacing: i64,
}

impl IdenEntryRaw {
    /// Convert to a table entry at the given trust/provenance.
    pub fn to_iden(
        self,
        trust: crate::trunk::iden::IdenTrust,
        wacn: u32,
        sysid: u32,
    ) -> Iden {
        Iden {
            channel_type: self.channel_type,
            tdma: self.tdma,
            base_freq: self.base_freq,
            spacing: self.spacing,
            trust,
            wacn,
            sysid,
        }
    }
}

/// Decode a TSBK block from its 98 received dibits (trellis + CRC).
///
/// Returns the 12 octets when the CRC passes.
pub fn tsbk_deframe(dibits98: &[u8]) -> Option<[u8; 12]> {
    let mut points = Vec::new();
    dibits_to_points(dibits98, &mut points);
    let mut decoded = Vec::new();
    trellis12_decode(&points, &mut decoded);
    // 49 decoded dibits -> 98 bits -> 12 octets + flush
    let mut bits = Vec::with_capacity(98);
    for d in &decoded {
        bits.push((d >> 1) & 1);
        bits.push(d & 1);
    }
    if bits.len() < 96 {
        return None;
    }
    let crc = crc16_ccitt_plain(&bits[..96]);
    if crc != 0 {
        return None;
    }
    let mut octets = [0u8; 12];
    for (i, chunk) in bits[..96].chunks_exact(8).enumerate() {
        octets[i] = chunk.iter().fold(0, |acc, b| (acc << 1) | b);
    }
    Some(octets)
}

/// Build the 98 transmitted dibits for a 10-octet payload (tests):
/// appends the CRC, trellis-encodes, returns dibits.
pub fn tsbk_frame(payload10: &[u8; 10], out_dibits: &mut Vec<u8>) {
    let mut bits = Vec::with_capacity(98);
    for b in payload10 {
        for i in (0..8).rev() {
            bits.push((b >> i) & 1);
        }
    }
    // CRC over the first 80 bits, appended to make 96.
    let crc = crc16_ccitt_plain(&bits);
    for i in (0..16).rev() {
        bits.push(((crc >> i) & 1) as u8);
    }
    // 96 bits -> 48 dibits + flush dibit
    let mut dibits = Vec::with_capacity(49);
    for pair in bits.chunks_exact(2) {
        dibits.push((pair[0] << 1) | pair[1]);
    }
    dibits.push(0);
    let mut points = Vec::new();
    trellis12_encode(&dibits, &mut points);
    points_to_dibits(&points, out_dibits);
}

/// Parse the follower-relevant opcodes from 12 TSBK octets.
pub fn tsbk_parse(octets: &[u8; 12]) -> Tsbk {
    let opcode = octets[0] & 0x3F;
    let mfid = octets[1];
    let ch = |hi: usize| -> u16 { (u16::from(octets[hi]) << 8) | u16::from(octets[hi + 1]) };
    let addr24 = |hi: usize| -> u32 {
        (u32::from(octets[hi]) << 16) | (u32::from(octets[hi + 1]) << 8) | u32::from(octets[hi + 2])
    };
    match opcode {
        0x00 => Tsbk::GroupVoiceGrant {
            svc: octets[2],
            channel: ch(3),
            tg: ch(5),
            src: addr24(7),
        },
        0x04 => Tsbk::UnitVoiceGrant {
            channel: ch(2),
            dst: addr24(4),
            src: addr24(7),
        },
        0x3D | 0x2D => {
            // IDEN_UP (FDMA) / IDEN_UP_TDMA
            let iden = usize::from(octets[2] >> 4);
            let tdma = opcode == 0x2D;
            let channel_type = if tdma { octets[2] & 0x0F } else { 1 };
            let spacing = i64::from(((u16::from(octets[3]) & 0x03) << 8) | u16::from(octets[4]));
            let base = (u32::from(octets[7]) << 24)
                | (u32::from(octets[8]) << 16)
                | (u32::from(octets[9]) << 8)
                | u32::from(octets[10]);
            Tsbk::IdenUp {
                iden,
                entry: IdenEntryRaw {
                    channel_type,
                    tdma,
                    base_freq: i64::from(base),
                    spacing,
                },
            }
        }
        0x3C => Tsbk::AdjacentStatus {
            rfss: octets[4],
            site: octets[5],
            channel: ch(6),
        },
        0x3B => Tsbk::NetworkStatus {
            wacn: (addr24(3) >> 4) & 0xF_FFFF,
            sysid: ch(5) & 0x0FFF,
            channel: ch(7),
        },
        0x3A => Tsbk::RfssStatus {
            rfss: octets[3],
            site: octets[4],
            channel: ch(5),
        },
        _ => Tsbk::Other { opcode, mfid },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deframe_round_trip() {
        let mut payload = [0u8; 10];
        payload[0] = 0x00; // group grant
        payload[2] = 0x40;
        payload[3] = 0x10;
        payload[4] = 0x0A;
        payload[5] = 0x23;
        payload[6] = 0x45;
        let mut dibits = Vec::new();
        tsbk_frame(&payload, &mut dibits);
        assert_eq!(dibits.len(), 98);
        let octets = tsbk_deframe(&dibits).expect("deframe");
        assert_eq!(&octets[..10], &payload);
    }

    #[test]
    fn test_deframe_survives_symbol_error() {
        let payload = [0x3Du8, 0, 0x10, 0x00, 0x64, 0, 0, 0x0A, 0x24, 0xB4];
        let mut dibits = Vec::new();
        tsbk_frame(&payload, &mut dibits);
        dibits[30] ^= 1;
        assert!(tsbk_deframe(&dibits).is_some());
    }

    #[test]
    fn test_crc_failure_rejected() {
        let payload = [0u8; 10];
        let mut dibits = Vec::new();
        tsbk_frame(&payload, &mut dibits);
        // Clobber beyond the trellis' correction reach
        for d in dibits.iter_mut().take(40) {
            *d ^= 3;
        }
        assert!(tsbk_deframe(&dibits).is_none());
    }

    #[test]
    fn test_parse_group_grant() {
        let mut octets = [0u8; 12];
        octets[0] = 0x00;
        octets[2] = 0x40;
        octets[3] = 0x10;
        octets[4] = 0x0A;
        octets[5] = 0x23;
        octets[6] = 0x45;
        octets[7] = 0x00;
        octets[8] = 0xBE;
        octets[9] = 0xE5;
        match tsbk_parse(&octets) {
            Tsbk::GroupVoiceGrant {
                svc,
                channel,
                tg,
                src,
            } => {
                assert_eq!(svc, 0x40);
                assert_eq!(channel, 0x100A);
                assert_eq!(tg, 0x2345);
                assert_eq!(src, 0xBEE5);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_iden_up_tdma() {
        let mut octets = [0u8; 12];
        octets[0] = 0x2D;
        octets[2] = 0x23; // iden 2, type 3 (2 slots)
        octets[3] = 0x00;
        octets[4] = 0x64; // spacing 100
        octets[7] = 0x0A;
        octets[8] = 0x24;
        octets[9] = 0xB4;
        octets[10] = 0x00;
        match tsbk_parse(&octets) {
            Tsbk::IdenUp { iden, entry } => {
                assert_eq!(iden, 2);
                assert!(entry.tdma);
                assert_eq!(entry.channel_type, 3);
                assert_eq!(entry.spacing, 100);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_unknown_opcode() {
        let mut octets = [0u8; 12];
        octets[0] = 0x33;
        octets[1] = 0x90;
        assert_eq!(
            tsbk_parse(&octets),
            Tsbk::Other {
                opcode: 0x33,
                mfid: 0x90
            }
        );
    }
}
