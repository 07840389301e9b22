// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Frame sync pattern search.
//!
//! A rolling window of sliced dibits is matched against every protocol
//! sync template. Slicer conventions differ between receivers, so each
//! comparison considers five remaps of the observed dibits - identity,
//! 2-bit inversion (`d ^ 2`), bit swap, bitwise not (`d ^ 3`) and the
//! 90 degree rotation `0->1->3->2->0` - against both the normal and the
//! inverted polarity of the template. The best-case Hamming distance
//! wins; at or below the template's threshold a [`SyncKind`] is
//! declared.

pub mod patterns;

pub use patterns::{sync_templates, SyncTemplate};

/// Modulation label attached to a sync declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Modulation {
    #[default]
    C4fm,
    Qpsk,
    Gfsk,
}

impl Modulation {
    pub fn as_str(self) -> &'static str {
        match self {
            Modulation::C4fm => "C4FM",
            Modulation::Qpsk => "QPSK",
            Modulation::Gfsk => "GFSK",
        }
    }
}

/// Detected sync classification: protocol and polarity jointly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncKind {
    P25p1 { inverted: bool },
    P25p2 { inverted: bool },
    X2TdmaData { inverted: bool },
    X2TdmaVoice { inverted: bool },
    DmrBsData { inverted: bool },
    DmrBsVoice { inverted: bool },
    DmrMsVoice,
    DmrMsData,
    DmrRcData,
    DstarVoice { inverted: bool },
    DstarHeader { inverted: bool },
    M17Lsf { inverted: bool },
    M17Stream { inverted: bool },
    M17Packet { inverted: bool },
    M17Brt { inverted: bool },
    M17Preamble { inverted: bool },
    Nxdn { inverted: bool },
    Ysf { inverted: bool },
    Dpmr { fs: u8, inverted: bool },
    ProVoice { inverted: bool },
    Edacs { inverted: bool },
    Analog,
    Digital,
}

impl SyncKind {
    /// Human-readable protocol name.
    pub fn name(self) -> &'static str {
        match self {
            SyncKind::P25p1 { .. } => "P25p1",
            SyncKind::P25p2 { .. } => "P25p2",
            SyncKind::X2TdmaData { .. } => "X2TDMA DATA",
            SyncKind::X2TdmaVoice { .. } => "X2TDMA VOICE",
            SyncKind::DmrBsData { .. }
            | SyncKind::DmrBsVoice { .. }
            | SyncKind::DmrMsVoice
            | SyncKind::DmrMsData
            | SyncKind::DmrRcData => "DMR",
            SyncKind::DstarVoice { .. } | SyncKind::DstarHeader { .. } => "DSTAR",
            SyncKind::M17Lsf { .. } | SyncKind::M17Stream { .. } => "M17",
            SyncKind::M17Packet { .. } => "M17 PKT",
            SyncKind::M17Brt { .. } => "M17 BRT",
            SyncKind::M17Preamble { .. } => "M17 PRE",
            SyncKind::Nxdn { .. } => "NXDN",
            SyncKind::Ysf { .. } => "YSF",
            SyncKind::Dpmr { .. } => "dPMR",
            SyncKind::ProVoice { .. } | SyncKind::Edacs { .. } => "EDACS/PV",
            SyncKind::Analog => "ANALOG",
            SyncKind::Digital => "DIGITAL",
        }
    }

    /// Whether this classification carries inverted polarity.
    pub fn is_inverted(self) -> bool {
        match self {
            SyncKind::P25p1 { inverted }
            | SyncKind::P25p2 { inverted }
            | SyncKind::X2TdmaData { inverted }
            | SyncKind::X2TdmaVoice { inverted }
            | SyncKind::DmrBsData { inverted }
            | SyncKind::DmrBsVoice { inverted }
            | SyncKind::DstarVoice { inverted }
            | SyncKind::DstarHeader { inverted }
            | SyncKind::M17Lsf { inverted }
            | SyncKind::M17Stream { inverted }
            | SyncKind::M17Packet { inverted }
            | SyncKind::M17Brt { inverted }
            | SyncKind::M17Preamble { inverted }
            | SyncKind::Nxdn { inverted }
            | SyncKind::Ysf { inverted }
            | SyncKind::Dpmr { inverted, .. }
            | SyncKind::ProVoice { inverted }
            | SyncKind::Edacs { inverted } => inverted,
            _ => false,
        }
    }
}

/// One declared sync.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncHit {
    pub kind: SyncKind,
    /// Dibit offset of the pattern start within the scanned window.
    pub offset: usize,
    /// Best-case Hamming distance that produced the hit.
    pub distance: u32,
    pub modulation: Modulation,
}

/// Hamming distance between a dibit buffer and an ASCII pattern.
///
/// Buffer entries may be numeric 0..=3 or ASCII '0'..='3'.
pub fn sync_hamming_distance(buf: &[u8], pattern: &str) -> u32 {
    let mut ham = 0;
    for (d, p) in buf.iter().zip(pattern.bytes()) {
        let mut d = *d;
        if (b'0'..=b'3').contains(&d) {
            d -= b'0';
        }
        if d != p - b'0' {
            ham += 1;
        }
    }
    ham
}

/// Invert an ASCII dibit pattern (`d ^ 2`, swapping +/- levels).
pub fn invert_pattern(pattern: &str) -> String {
    pattern
        .bytes()
        .map(|b| (((b - b'0') ^ 2) + b'0') as char)
        .collect()
}

/// Best-case Hamming distance across the five dibit remaps and both
/// polarities of the template.
pub fn sync_hamming_with_remaps(buf: &[u8], pat_norm: &str, pat_inv: &str) -> u32 {
    let mut best = u32::MAX;
    let norm: Vec<u8> = pat_norm.bytes().map(|b| b - b'0').collect();
    let inv: Vec<u8> = pat_inv.bytes().map(|b| b - b'0').collect();
    let mut ham = [0u32; 10];
    for (k, d) in buf.iter().take(norm.len()).enumerate() {
        let mut d = *d;
        if (b'0'..=b'3').contains(&d) {
            d -= b'0';
        }
        let d = d & 0x3;
        let d_inv = d ^ 2;
        let d_swap = ((d & 1) << 1) | ((d & 2) >> 1);
        let d_not = d ^ 3;
        let d_rot = match d {
            0 => 1,
            1 => 3,
            2 => 0,
            _ => 2,
        };
        let en = norm[k];
        let ei = inv[k];
        for (slot, v) in [d, d_inv, d_swap, d_not, d_rot].into_iter().enumerate() {
            if v != en {
                ham[2 * slot] += 1;
            }
            if v != ei {
                ham[2 * slot + 1] += 1;
            }
        }
    }
    for h in ham {
        best = best.min(h);
    }
    best
}

/// Frame sync scanner with modulation auto-detect.
pub struct FrameSync {
    templates: &'static [SyncTemplate],
    inverted: Vec<String>,
    mod_detect: ModulationDetect,
}

impl Default for FrameSync {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameSync {
    pub fn new() -> Self {
        let templates = sync_templates();
        let inverted = templates
            .iter()
            .map(|t| invert_pattern(t.pattern))
            .collect();
        Self {
            templates,
            inverted,
            mod_detect: ModulationDetect::default(),
        }
    }

    /// Scan a dibit window for the best sync at any offset.
    ///
    /// Returns the earliest hit at or below its template threshold.
    pub fn scan(&mut self, dibits: &[u8]) -> Option<SyncHit> {
        for offset in 0..dibits.len() {
            let window = &dibits[offset..];
            let mut best: Option<SyncHit> = None;
            for (idx, t) in self.templates.iter().enumerate() {
                if window.len() < t.pattern.len() {
                    continue;
                }
                let d_norm = sync_hamming_with_remaps(window, t.pattern, &self.inverted[idx]);
                if d_norm > t.threshold {
                    continue;
                }
                // Polarity attribution: plain distance against each
                // pattern decides which kind is reported.
                let plain_norm = sync_hamming_distance(window, t.pattern);
                let plain_inv = sync_hamming_distance(window, &self.inverted[idx]);
                let kind = if plain_inv < plain_norm {
                    t.kind_neg
                } else {
                    t.kind_pos
                };
                let hit = SyncHit {
                    kind,
                    offset,
                    distance: d_norm,
                    modulation: t.modulation,
                };
                // Ties prefer the normal-polarity classification: some
                // templates are exact complements of each other (M17
                // LSF vs STR), and the upright reading wins.
                let better = match best {
                    Some(b) => {
                        d_norm < b.distance
                            || (d_norm == b.distance
                                && !hit.kind.is_inverted()
                                && b.kind.is_inverted())
                    }
                    None => true,
                };
                if better {
                    best = Some(hit);
                }
            }
            if let Some(hit) = best {
                self.mod_detect.vote(hit.modulation);
                return Some(hit);
            }
        }
        None
    }

    /// Current modulation estimate.
    pub fn modulation(&self) -> Modulation {
        self.mod_detect.current()
    }

    /// Reset the modulation auto-detect state.
    pub fn reset_mod_state(&mut self) {
        self.mod_detect = ModulationDetect::default();
    }
}

/// Hysteresis counters for modulation auto-detect.
#[derive(Debug, Default)]
struct ModulationDetect {
    c4fm: i32,
    qpsk: i32,
    gfsk: i32,
    current: Modulation,
}

const MOD_VOTE_MAX: i32 = 8;
const MOD_SWITCH_AT: i32 = 3;

impl ModulationDetect {
    fn vote(&mut self, m: Modulation) {
        let bump = |own: &mut i32| {
            *own = (*own + 1).min(MOD_VOTE_MAX);
        };
        let decay = |other: &mut i32| {
            *other = (*other - 1).max(0);
        };
        match m {
            Modulation::C4fm => {
                bump(&mut self.c4fm);
                decay(&mut self.qpsk);
                decay(&mut self.gfsk);
            }
            Modulation::Qpsk => {
                bump(&mut self.qpsk);
                decay(&mut self.c4fm);
                decay(&mut self.gfsk);
            }
            Modulation::Gfsk => {
                bump(&mut self.gfsk);
                decay(&mut self.c4fm);
                decay(&mut self.qpsk);
            }
        }
        // Switch only on a clear winner; brief flips stay put.
        let (best, count) = [
            (Modulation::C4fm, self.c4fm),
            (Modulation::Qpsk, self.qpsk),
            (Modulation::Gfsk, self.gfsk),
        ]
        .into_iter()
        .max_by_key(|(_, c)| *c)
        .unwrap_or((Modulation::C4fm, 0));
        if best != self.current && count >= MOD_SWITCH_AT {
            self.current = best;
        }
    }

    fn current(&self) -> Modulation {
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dibits_of(pattern: &str) -> Vec<u8> {
        pattern.bytes().map(|b| b - b'0').collect()
    }

    #[test]
    fn test_plain_distance() {
        assert_eq!(sync_hamming_distance(&[1, 1, 3, 3], "1133"), 0);
        assert_eq!(sync_hamming_distance(&[1, 1, 3, 1], "1133"), 1);
        // ASCII input accepted
        assert_eq!(sync_hamming_distance(b"1133", "1133"), 0);
    }

    #[test]
    fn test_remap_inversion_is_perfect_match() {
        // Observed stream with every dibit inverted (d ^ 2)
        let pat = "113313";
        let observed: Vec<u8> = dibits_of(pat).iter().map(|d| d ^ 2).collect();
        let inv = invert_pattern(pat);
        assert_eq!(sync_hamming_with_remaps(&observed, pat, &inv), 0);
    }

    #[test]
    fn test_remap_rotation_is_perfect_match() {
        let pat = "10231321";
        // Apply the inverse rotation so the scanner's forward remap
        // (0->1->3->2->0) recovers the pattern.
        let inv_rot = |d: u8| match d {
            1 => 0,
            3 => 1,
            0 => 2,
            _ => 3,
        };
        let observed: Vec<u8> = dibits_of(pat).iter().map(|d| inv_rot(*d)).collect();
        let inv = invert_pattern(pat);
        assert_eq!(sync_hamming_with_remaps(&observed, pat, &inv), 0);
    }

    #[test]
    fn test_scan_detects_p25p1_both_polarities() {
        let mut fs = FrameSync::new();
        let p25 = patterns::P25P1_SYNC;
        let mut stream = vec![0u8; 10];
        stream.extend(dibits_of(p25));
        stream.extend([2u8; 6]);
        let hit = fs.scan(&stream).expect("sync not found");
        assert_eq!(hit.kind, SyncKind::P25p1 { inverted: false });
        assert_eq!(hit.offset, 10);
        assert_eq!(hit.distance, 0);

        let mut inv_stream = vec![0u8; 4];
        inv_stream.extend(dibits_of(&invert_pattern(p25)));
        let hit = fs.scan(&inv_stream).expect("inverted sync not found");
        assert_eq!(hit.kind, SyncKind::P25p1 { inverted: true });
    }

    #[test]
    fn test_scan_tolerates_errors_within_threshold() {
        let mut fs = FrameSync::new();
        let mut stream = dibits_of(patterns::DMR_BS_VOICE_SYNC);
        stream[3] ^= 2; // one symbol error
        let hit = fs.scan(&stream).expect("sync not found with 1 error");
        assert_eq!(hit.kind, SyncKind::DmrBsVoice { inverted: false });
        assert_eq!(hit.distance, 1);
    }

    #[test]
    fn test_scan_rejects_flat_stream() {
        let mut fs = FrameSync::new();
        // A constant stream remaps to a constant stream under every
        // remap; no template is close to constant within threshold.
        let stream = vec![0u8; 64];
        assert!(fs.scan(&stream).is_none());
    }

    #[test]
    fn test_modulation_hysteresis() {
        let mut det = ModulationDetect::default();
        assert_eq!(det.current(), Modulation::C4fm);
        det.vote(Modulation::Qpsk);
        det.vote(Modulation::Qpsk);
        // Not yet: needs MOD_SWITCH_AT votes
        assert_eq!(det.current(), Modulation::C4fm);
        det.vote(Modulation::Qpsk);
        assert_eq!(det.current(), Modulation::Qpsk);
    }

    #[test]
    fn test_names() {
        assert_eq!(SyncKind::P25p1 { inverted: true }.name(), "P25p1");
        assert_eq!(SyncKind::DmrMsVoice.name(), "DMR");
        assert_eq!(SyncKind::M17Brt { inverted: false }.name(), "M17 BRT");
        assert_eq!(SyncKind::ProVoice { inverted: false }.name(), "EDACS/PV");
        assert_eq!(SyncKind::Analog.name(), "ANALOG");
    }
}
