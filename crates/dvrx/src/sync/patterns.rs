// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol sync templates.
//!
//! Patterns are ASCII dibit strings ('0'..'3'); the inverted polarity is
//! derived at scanner construction by `d ^ 2`. Thresholds are the
//! maximum tolerated dibit mismatches for a declaration, sized to the
//! template length.

use super::{Modulation, SyncKind};

/// One sync template: normal-polarity pattern plus both classifications.
pub struct SyncTemplate {
    pub kind_pos: SyncKind,
    pub kind_neg: SyncKind,
    pub pattern: &'static str,
    pub threshold: u32,
    pub modulation: Modulation,
}

pub const P25P1_SYNC: &str = "111333133113133333133133";
pub const P25P2_SYNC: &str = "11131131111333133333";
pub const X2TDMA_BS_VOICE_SYNC: &str = "113131333331313113333113";
pub const X2TDMA_BS_DATA_SYNC: &str = "331313111113131331111331";
pub const DMR_BS_DATA_SYNC: &str = "313333111331131131331131";
pub const DMR_BS_VOICE_SYNC: &str = "131111333113313313113313";
pub const DMR_MS_DATA_SYNC: &str = "311131133313133331131113";
pub const DMR_MS_VOICE_SYNC: &str = "133313311131311113313331";
pub const DMR_RC_SYNC: &str = "131331111133133131333313";
pub const DSTAR_SYNC: &str = "313131313133131113313111";
pub const DSTAR_HD_SYNC: &str = "131313131333133113131111";
pub const NXDN_SYNC: &str = "3131331131";
pub const YSF_SYNC: &str = "31101301302112031031";
pub const M17_LSF_SYNC: &str = "11113313";
pub const M17_STR_SYNC: &str = "33331131";
pub const M17_PKT_SYNC: &str = "13113333";
pub const M17_BRT_SYNC: &str = "31331111";
pub const M17_PRE_SYNC: &str = "13131313";
pub const DPMR_FS1_SYNC: &str = "111333331133131131111313";
pub const DPMR_FS2_SYNC: &str = "113333131331";
pub const DPMR_FS3_SYNC: &str = "133133333111";
pub const DPMR_FS4_SYNC: &str = "333111113311313313333131";
pub const PROVOICE_SYNC: &str = "13131333111311311113113311331133";
pub const EDACS_SYNC: &str = "313131313131313131313131";

static TEMPLATES: &[SyncTemplate] = &[
    SyncTemplate {
        kind_pos: SyncKind::P25p1 { inverted: false },
        kind_neg: SyncKind::P25p1 { inverted: true },
        pattern: P25P1_SYNC,
        threshold: 4,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::P25p2 { inverted: false },
        kind_neg: SyncKind::P25p2 { inverted: true },
        pattern: P25P2_SYNC,
        threshold: 2,
        modulation: Modulation::Qpsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::X2TdmaVoice { inverted: false },
        kind_neg: SyncKind::X2TdmaVoice { inverted: true },
        pattern: X2TDMA_BS_VOICE_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::X2TdmaData { inverted: false },
        kind_neg: SyncKind::X2TdmaData { inverted: true },
        pattern: X2TDMA_BS_DATA_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::DmrBsData { inverted: false },
        kind_neg: SyncKind::DmrBsData { inverted: true },
        pattern: DMR_BS_DATA_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::DmrBsVoice { inverted: false },
        kind_neg: SyncKind::DmrBsVoice { inverted: true },
        pattern: DMR_BS_VOICE_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::DmrMsData,
        kind_neg: SyncKind::DmrMsData,
        pattern: DMR_MS_DATA_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::DmrMsVoice,
        kind_neg: SyncKind::DmrMsVoice,
        pattern: DMR_MS_VOICE_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::DmrRcData,
        kind_neg: SyncKind::DmrRcData,
        pattern: DMR_RC_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::DstarVoice { inverted: false },
        kind_neg: SyncKind::DstarVoice { inverted: true },
        pattern: DSTAR_SYNC,
        threshold: 2,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::DstarHeader { inverted: false },
        kind_neg: SyncKind::DstarHeader { inverted: true },
        pattern: DSTAR_HD_SYNC,
        threshold: 2,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::Nxdn { inverted: false },
        kind_neg: SyncKind::Nxdn { inverted: true },
        pattern: NXDN_SYNC,
        threshold: 1,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::Ysf { inverted: false },
        kind_neg: SyncKind::Ysf { inverted: true },
        pattern: YSF_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::M17Lsf { inverted: false },
        kind_neg: SyncKind::M17Lsf { inverted: true },
        pattern: M17_LSF_SYNC,
        threshold: 0,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::M17Stream { inverted: false },
        kind_neg: SyncKind::M17Stream { inverted: true },
        pattern: M17_STR_SYNC,
        threshold: 0,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::M17Packet { inverted: false },
        kind_neg: SyncKind::M17Packet { inverted: true },
        pattern: M17_PKT_SYNC,
        threshold: 0,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::M17Brt { inverted: false },
        kind_neg: SyncKind::M17Brt { inverted: true },
        pattern: M17_BRT_SYNC,
        threshold: 0,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::M17Preamble { inverted: false },
        kind_neg: SyncKind::M17Preamble { inverted: true },
        pattern: M17_PRE_SYNC,
        threshold: 0,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::Dpmr { fs: 1, inverted: false },
        kind_neg: SyncKind::Dpmr { fs: 1, inverted: true },
        pattern: DPMR_FS1_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::Dpmr { fs: 2, inverted: false },
        kind_neg: SyncKind::Dpmr { fs: 2, inverted: true },
        pattern: DPMR_FS2_SYNC,
        threshold: 1,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::Dpmr { fs: 3, inverted: false },
        kind_neg: SyncKind::Dpmr { fs: 3, inverted: true },
        pattern: DPMR_FS3_SYNC,
        threshold: 1,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::Dpmr { fs: 4, inverted: false },
        kind_neg: SyncKind::Dpmr { fs: 4, inverted: true },
        pattern: DPMR_FS4_SYNC,
        threshold: 2,
        modulation: Modulation::C4fm,
    },
    SyncTemplate {
        kind_pos: SyncKind::ProVoice { inverted: false },
        kind_neg: SyncKind::ProVoice { inverted: true },
        pattern: PROVOICE_SYNC,
        threshold: 3,
        modulation: Modulation::Gfsk,
    },
    SyncTemplate {
        kind_pos: SyncKind::Edacs { inverted: false },
        kind_neg: SyncKind::Edacs { inverted: true },
        pattern: EDACS_SYNC,
        threshold: 1,
        modulation: Modulation::Gfsk,
    },
];

/// The full template table, longest patterns first is not required: the
/// scanner keeps the best hit per offset.
pub fn sync_templates() -> &'static [SyncTemplate] {
    TEMPLATES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patterns_are_valid_dibits() {
        for t in sync_templates() {
            assert!(!t.pattern.is_empty());
            assert!(
                t.pattern.bytes().all(|b| (b'0'..=b'3').contains(&b)),
                "bad pattern {}",
                t.pattern
            );
            assert!(t.threshold < t.pattern.len() as u32 / 2);
        }
    }

    #[test]
    fn test_template_count_covers_protocol_set() {
        // One template per distinct sync word the scanner arms.
        assert_eq!(sync_templates().len(), 24);
    }
}
