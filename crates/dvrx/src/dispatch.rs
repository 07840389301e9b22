// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Protocol dispatch: sync classification to frame handler.
//!
//! A static, ordered handler table; on each declared sync the first
//! handler whose `matches` accepts the classification consumes the
//! frame. Unknown sync kinds fall through and are ignored. Handlers
//! own their multi-frame accumulation state and are reset together on
//! retune/sync loss.
//!
//! Frame payloads use the canonical layouts of their component codes
//! (deframe helpers in `protocol::*`); handlers stay thin and push
//! decoded results into events, the trunk SMs and the audio gates.

use crate::events::{CallKind, Event};
use crate::protocol::dmr::csbk::{csbk_deframe, csbk_parse, Csbk};
use crate::protocol::dmr::{
    ambe_deframe_72, data_burst_decode, slot_type_decode, DataType, AMBE_FRAME_BITS,
};
use crate::protocol::m17::parse_lsf;
use crate::protocol::p25::p1::{
    decode_ldu1_lc, decode_ldu2_es, decode_lsd, imbe_frame_bits, imbe_interleave, ImbeFrame,
};
use crate::protocol::p25::p2::mac::{walk_mac_messages, MacMessage};
use crate::protocol::p25::tsbk::{tsbk_deframe, tsbk_parse, Tsbk};
use crate::protocol::p25::{decode_nid, ldu_audio_gate, Duid};
use crate::protocol::{DecodeContext, FrameHandler, Handled};
use crate::sync::SyncKind;
use crate::trunk::iden::IdenTrust;

/// Dispatcher over the static handler table.
pub struct Dispatcher {
    handlers: Vec<Box<dyn FrameHandler>>,
    /// Sync kinds that matched no handler.
    pub unmatched: u64,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    /// Build the standard handler table.
    pub fn new() -> Self {
        Self {
            handlers: vec![
                Box::new(NxdnHandler),
                Box::new(DstarHandler),
                Box::new(DmrHandler::default()),
                Box::new(ProVoiceHandler),
                Box::new(YsfHandler),
                Box::new(M17Handler),
                Box::new(P25p2Handler),
                Box::new(DpmrHandler),
                Box::new(P25p1Handler::default()),
            ],
            unmatched: 0,
        }
    }

    /// Route one declared sync to its handler.
    pub fn dispatch(
        &mut self,
        ctx: &mut DecodeContext<'_>,
        kind: SyncKind,
        dibits: &[u8],
    ) -> Option<Handled> {
        for h in &mut self.handlers {
            if h.matches(kind) {
                return Some(h.handle(ctx, kind, dibits));
            }
        }
        self.unmatched += 1;
        None
    }

    /// Reset every handler's accumulated state.
    pub fn reset_all(&mut self) {
        for h in &mut self.handlers {
            h.on_reset();
        }
    }

    pub fn handler_names(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|h| h.name()).collect()
    }
}

// ---------------------------------------------------------------- P25 P1

/// LDU geometry after the NID, in dibits: nine 72-dibit IMBE
/// codewords, then the 24 ten-bit protected hexbits of the LC/ES word,
/// then the two LSD(16,8) words.
const NID_DIBITS: usize = 32;
const LDU_IMBE_DIBITS: usize = 9 * 72;
const LDU_HEXBIT_DIBITS: usize = 120;
const LDU_LSD_DIBITS: usize = 16;
const LDU_BODY_DIBITS: usize = LDU_IMBE_DIBITS + LDU_HEXBIT_DIBITS + LDU_LSD_DIBITS;

/// Phase 1 handler; carries the per-call crypto/ID state the LDU
/// stream accumulates.
#[derive(Default)]
struct P25p1Handler {
    algid: u8,
    keyid: u16,
    mi: u64,
    tg: u32,
    src: u32,
}

impl P25p1Handler {
    fn handle_ldu(&mut self, ctx: &mut DecodeContext<'_>, is_ldu2: bool, dibits: &[u8]) -> Handled {
        if dibits.len() < NID_DIBITS + LDU_BODY_DIBITS {
            return Handled { consumed: 0 };
        }
        let body = &dibits[NID_DIBITS..NID_DIBITS + LDU_BODY_DIBITS];
        let bit_at = |base: usize, idx: usize| -> u8 {
            let d = body[base + idx / 2];
            if idx % 2 == 0 {
                (d >> 1) & 1
            } else {
                d & 1
            }
        };

        // Control word first: the ES in this very LDU gates its audio.
        let mut codewords = [[0u8; 10]; 24];
        for (i, cw) in codewords.iter_mut().enumerate() {
            for (b, bit) in cw.iter_mut().enumerate() {
                *bit = bit_at(LDU_IMBE_DIBITS, i * 10 + b);
            }
        }
        if is_ldu2 {
            if let Some(es) = decode_ldu2_es(&codewords) {
                let changed = es.algid != self.algid;
                self.algid = es.algid;
                self.keyid = es.keyid;
                self.mi = es.mi;
                if changed && !ldu_audio_gate(es.algid, &ctx.keys) {
                    let mut ev = Event::now("P25");
                    ev.kind = CallKind::Group;
                    ev.tg = self.tg;
                    ev.src = self.src;
                    ev.enc = true;
                    ev.algid = es.algid;
                    ev.keyid = es.keyid;
                    ev.mi = es.mi;
                    ctx.events.push(ev.clone());
                    ctx.hooks.publish_event(&ev);
                }
            }
        } else if let Some(lc) = decode_ldu1_lc(&codewords) {
            self.tg = u32::from(lc.tg);
            self.src = lc.src;
            let mut ev = Event::now("P25");
            ev.kind = CallKind::Group;
            ev.tg = self.tg;
            ev.src = self.src;
            ev.enc = lc.svc & 0x40 != 0;
            ev.algid = self.algid;
            ev.keyid = self.keyid;
            ctx.events.push(ev.clone());
            ctx.hooks.publish_event(&ev);
        }

        let mut lsd_bits = [0u8; 32];
        for (i, bit) in lsd_bits.iter_mut().enumerate() {
            *bit = bit_at(LDU_IMBE_DIBITS + LDU_HEXBIT_DIBITS, i);
        }
        let (lsd1, lsd2) = decode_lsd(&lsd_bits);
        if lsd1.is_some() || lsd2.is_some() {
            crate::debug!("P25 LSD {:02X?} {:02X?}", lsd1, lsd2);
        }

        // ALGID/key gate drives the slot, then the voice codewords.
        let allowed = ldu_audio_gate(self.algid, &ctx.keys);
        ctx.gates.set_allowed(0, allowed);
        if !allowed {
            ctx.gates.ring(0).flush();
        }
        let mut imbe_bits = Vec::new();
        for k in 0..9 {
            let mut cw = [0u8; 72];
            cw.copy_from_slice(&body[k * 72..(k + 1) * 72]);
            let mut frame: ImbeFrame = [[0; 23]; 8];
            imbe_interleave(&cw, &mut frame);
            imbe_frame_bits(&frame, &mut imbe_bits);
            if allowed {
                let pcm = ctx.vocoder.decode_imbe(&imbe_bits);
                ctx.gates.ring(0).push(&pcm);
            }
        }
        if let Some(sm) = ctx.p25_sm {
            sm.on_voice_active(0);
        }
        Handled {
            consumed: NID_DIBITS + LDU_BODY_DIBITS,
        }
    }
}

impl FrameHandler for P25p1Handler {
    fn name(&self) -> &'static str {
        "P25P1"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(kind, SyncKind::P25p1 { .. })
    }

    fn handle(&mut self, ctx: &mut DecodeContext<'_>, _kind: SyncKind, dibits: &[u8]) -> Handled {
        // NID: 32 dibits = 64 bits (63 BCH + status filler).
        if dibits.len() < NID_DIBITS {
            return Handled { consumed: 0 };
        }
        let mut nid_bits = [0u8; 63];
        for (i, b) in nid_bits.iter_mut().enumerate() {
            let d = dibits[i / 2];
            *b = if i % 2 == 0 { (d >> 1) & 1 } else { d & 1 };
        }
        let Some(nid) = decode_nid(&mut nid_bits) else {
            return Handled { consumed: NID_DIBITS };
        };
        if let Some(sm) = ctx.p25_sm {
            sm.notify_cc_sync();
        }
        match nid.duid {
            Duid::TrunkSignal => {
                // One TSBK block follows the NID.
                if dibits.len() < NID_DIBITS + 98 {
                    return Handled { consumed: 0 };
                }
                let block = &dibits[NID_DIBITS..NID_DIBITS + 98];
                if let Some(octets) = tsbk_deframe(block) {
                    handle_tsbk(ctx, &octets, nid.nac);
                }
                Handled {
                    consumed: NID_DIBITS + 98,
                }
            }
            Duid::TerminatorNoLc | Duid::TerminatorWithLc => {
                if let Some(sm) = ctx.p25_sm {
                    sm.on_release();
                }
                Handled {
                    consumed: NID_DIBITS,
                }
            }
            Duid::Ldu1 => self.handle_ldu(ctx, false, dibits),
            Duid::Ldu2 => self.handle_ldu(ctx, true, dibits),
            _ => Handled {
                consumed: NID_DIBITS,
            },
        }
    }

    fn on_reset(&mut self) {
        *self = Self::default();
    }
}

fn handle_tsbk(ctx: &mut DecodeContext<'_>, octets: &[u8; 12], nac: u16) {
    match tsbk_parse(octets) {
        Tsbk::GroupVoiceGrant {
            svc,
            channel,
            tg,
            src,
        } => {
            if let Some(sm) = ctx.p25_sm {
                let _ = sm.on_group_grant(channel, svc, u32::from(tg), src);
            }
            let mut ev = Event::now("P25");
            ev.kind = CallKind::Group;
            ev.tg = u32::from(tg);
            ev.src = src;
            ev.cc = nac & 0xFF;
            ev.enc = svc & 0x40 != 0;
            ctx.events.push(ev.clone());
            ctx.hooks.publish_event(&ev);
        }
        Tsbk::UnitVoiceGrant { channel, dst, src } => {
            if let Some(sm) = ctx.p25_sm {
                let _ = sm.on_indiv_grant(channel, 0, dst, src);
            }
            let mut ev = Event::now("P25");
            ev.kind = CallKind::Private;
            ev.dst = dst;
            ev.src = src;
            ctx.events.push(ev.clone());
            ctx.hooks.publish_event(&ev);
        }
        Tsbk::IdenUp { iden, entry } => {
            if let Some(sm) = ctx.p25_sm {
                sm.update_iden(iden, entry.to_iden(IdenTrust::Learned, 0, 0));
            }
        }
        Tsbk::AdjacentStatus { channel, .. } | Tsbk::RfssStatus { channel, .. } => {
            if let Some(sm) = ctx.p25_sm {
                sm.on_neighbor_channel(channel);
            }
        }
        Tsbk::NetworkStatus { wacn, sysid, .. } => {
            if let Some(sm) = ctx.p25_sm {
                sm.set_system(crate::trunk::iden::SystemId {
                    wacn,
                    sysid: u32::from(sysid),
                    rfss: 0,
                    site: 0,
                });
                sm.confirm_idens();
            }
        }
        Tsbk::Other { .. } => {}
    }
}

// ---------------------------------------------------------------- P25 P2

struct P25p2Handler;

impl FrameHandler for P25p2Handler {
    fn name(&self) -> &'static str {
        "P25P2"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(kind, SyncKind::P25p2 { .. })
    }

    fn handle(&mut self, ctx: &mut DecodeContext<'_>, _kind: SyncKind, dibits: &[u8]) -> Handled {
        // One FACCH payload span (156+114 bits = 135 dibits).
        const SPAN: usize = 135;
        if dibits.len() < SPAN {
            return Handled { consumed: 0 };
        }
        let mut bits = Vec::with_capacity(SPAN * 2);
        for d in &dibits[..SPAN] {
            bits.push((d >> 1) & 1);
            bits.push(d & 1);
        }
        let mut payload = [0u8; 156];
        payload.copy_from_slice(&bits[..156]);
        let mut parity = [0u8; 114];
        parity.copy_from_slice(&bits[156..270]);
        if crate::protocol::p25::p2::xcch::facch_decode(&mut payload, &parity).is_some() {
            let mut octets = vec![0u8; 19];
            for (i, chunk) in payload.chunks_exact(8).enumerate() {
                if i < octets.len() {
                    octets[i] = chunk.iter().fold(0, |acc, b| (acc << 1) | (b & 1));
                }
            }
            let mut msgs: Vec<MacMessage<'_>> = Vec::new();
            walk_mac_messages(&octets, &mut msgs);
            for m in &msgs {
                if let Some(sm) = ctx.p25_sm {
                    sm.on_mac_active(0);
                    // Grant opcodes mirror the TSBK numbering space.
                    if m.opcode == 0x40 && m.body.len() >= 7 {
                        let svc = m.body[1];
                        let channel = (u16::from(m.body[2]) << 8) | u16::from(m.body[3]);
                        let tg = (u16::from(m.body[4]) << 8) | u16::from(m.body[5]);
                        let _ = sm.on_group_grant(channel, svc, u32::from(tg), 0);
                    }
                }
            }
        }
        Handled { consumed: SPAN }
    }
}

// ------------------------------------------------------------------- DMR

#[derive(Default)]
struct DmrHandler {
    /// Voice superframe position per slot (A..F bursts).
    voice_frame: [u8; 2],
    /// Slot muted by a privacy-indicator header.
    muted: [bool; 2],
}

impl FrameHandler for DmrHandler {
    fn name(&self) -> &'static str {
        "DMR"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(
            kind,
            SyncKind::DmrBsData { .. }
                | SyncKind::DmrBsVoice { .. }
                | SyncKind::DmrMsData
                | SyncKind::DmrMsVoice
                | SyncKind::DmrRcData
                | SyncKind::X2TdmaData { .. }
                | SyncKind::X2TdmaVoice { .. }
        )
    }

    fn handle(&mut self, ctx: &mut DecodeContext<'_>, kind: SyncKind, dibits: &[u8]) -> Handled {
        let voice = matches!(
            kind,
            SyncKind::DmrBsVoice { .. } | SyncKind::DmrMsVoice | SyncKind::X2TdmaVoice { .. }
        );
        if voice {
            // Voice burst: 108 dibits = three (72,49) AMBE codewords;
            // slot 0 unless the embedded signalling steers otherwise.
            const VOICE_SPAN: usize = 3 * AMBE_FRAME_BITS / 2;
            let slot = 0usize;
            if dibits.len() < VOICE_SPAN {
                return Handled { consumed: 0 };
            }
            if let Some(sm) = ctx.dmr_sm {
                sm.on_voice_sync(slot);
            }
            if !self.muted[slot] {
                ctx.gates.set_allowed(slot, true);
            }
            let mut bits = [0u8; 3 * AMBE_FRAME_BITS];
            for (i, d) in dibits[..VOICE_SPAN].iter().enumerate() {
                bits[2 * i] = (d >> 1) & 1;
                bits[2 * i + 1] = d & 1;
            }
            for k in 0..3 {
                let span = &bits[k * AMBE_FRAME_BITS..(k + 1) * AMBE_FRAME_BITS];
                if let Some(codeword) = ambe_deframe_72(span) {
                    if ctx.gates.is_allowed(slot) {
                        let frame = ctx.vocoder.decode_ambe(&codeword);
                        ctx.gates.ring(slot).push(&frame);
                    }
                }
            }
            self.voice_frame[slot] = (self.voice_frame[slot] + 1) % 6;
            return Handled {
                consumed: VOICE_SPAN,
            };
        }

        // Data burst: slot type (10 dibits) + interleaved BPTC block
        // (98 dibits).
        const SPAN: usize = 108;
        if dibits.len() < SPAN {
            return Handled { consumed: 0 };
        }
        let mut st_bits = [0u8; 20];
        for (i, d) in dibits[..10].iter().enumerate() {
            st_bits[2 * i] = (d >> 1) & 1;
            st_bits[2 * i + 1] = d & 1;
        }
        let Some(slot_type) = slot_type_decode(&st_bits) else {
            return Handled { consumed: SPAN };
        };

        match slot_type.data_type {
            DataType::Csbk => {
                let mut half_a = [0u8; 98];
                let mut half_b = [0u8; 98];
                for i in 0..49 {
                    let d = dibits[10 + i];
                    half_a[2 * i] = (d >> 1) & 1;
                    half_a[2 * i + 1] = d & 1;
                    let d2 = dibits[59 + i];
                    half_b[2 * i] = (d2 >> 1) & 1;
                    half_b[2 * i + 1] = d2 & 1;
                }
                let mut payload = [0u8; 96];
                if data_burst_decode(&half_a, &half_b, &mut payload).is_usable() {
                    if let Some(octets) = csbk_deframe(&payload) {
                        handle_csbk(ctx, &octets);
                    }
                }
            }
            DataType::Idle => {
                if let Some(sm) = ctx.dmr_sm {
                    sm.on_idle(0);
                }
            }
            DataType::PiHeader => {
                // Privacy indicator: mute the slot and flush its ring.
                self.muted[0] = true;
                ctx.gates.enc_transition(0);
            }
            DataType::TerminatorWithLc => {
                self.muted[0] = false;
                ctx.gates.set_allowed(0, false);
                if let Some(sm) = ctx.dmr_sm {
                    sm.on_release();
                }
            }
            _ => {}
        }
        Handled { consumed: SPAN }
    }

    fn on_reset(&mut self) {
        self.voice_frame = [0; 2];
        self.muted = [false; 2];
    }
}

fn handle_csbk(ctx: &mut DecodeContext<'_>, octets: &[u8; 10]) {
    match csbk_parse(octets) {
        Csbk::VoiceGrant {
            lpcn,
            slot: _,
            group,
            dst,
            src,
        } => {
            if let Some(sm) = ctx.dmr_sm {
                if group {
                    sm.on_group_grant(0, lpcn, dst, src);
                } else {
                    sm.on_indiv_grant(0, lpcn, dst, src);
                }
            }
            let mut ev = Event::now("DMR");
            ev.kind = if group {
                CallKind::Group
            } else {
                CallKind::Private
            };
            ev.tg = dst;
            ev.src = src;
            ctx.events.push(ev.clone());
            ctx.hooks.publish_event(&ev);
        }
        Csbk::Broadcast {
            announcement_type: _,
            lpcn,
        } => {
            if let Some(sm) = ctx.dmr_sm {
                let freq = sm.lcn_to_freq(lpcn);
                if freq > 0 {
                    sm.on_neighbor_update(&[freq]);
                }
            }
        }
        Csbk::Clear => {
            if let Some(sm) = ctx.dmr_sm {
                sm.on_release();
            }
        }
        Csbk::Aloha | Csbk::Other { .. } => {}
    }
}

// ------------------------------------------------------------------- M17

struct M17Handler;

impl FrameHandler for M17Handler {
    fn name(&self) -> &'static str {
        "M17"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(
            kind,
            SyncKind::M17Lsf { .. }
                | SyncKind::M17Stream { .. }
                | SyncKind::M17Packet { .. }
                | SyncKind::M17Brt { .. }
                | SyncKind::M17Preamble { .. }
        )
    }

    fn handle(&mut self, ctx: &mut DecodeContext<'_>, kind: SyncKind, dibits: &[u8]) -> Handled {
        match kind {
            SyncKind::M17Lsf { .. } => {
                // 120 dibits of LSF payload.
                const SPAN: usize = 120;
                if dibits.len() < SPAN {
                    return Handled { consumed: 0 };
                }
                let mut bits = Vec::with_capacity(240);
                for d in &dibits[..SPAN] {
                    bits.push((d >> 1) & 1);
                    bits.push(d & 1);
                }
                if let Some(lsf) = parse_lsf(&bits) {
                    let mut ev = Event::now("M17");
                    ev.kind = CallKind::Group;
                    ev.text = format!("{} > {}", lsf.src_callsign, lsf.dst_callsign);
                    ev.enc = lsf.et != 0;
                    ctx.events.push(ev.clone());
                    ctx.hooks.publish_event(&ev);
                }
                Handled { consumed: SPAN }
            }
            SyncKind::M17Stream { .. } => {
                // Stream frame: 16 dibits LICH chunk + 128 dibits payload.
                Handled {
                    consumed: dibits.len().min(144),
                }
            }
            _ => Handled {
                consumed: dibits.len().min(96),
            },
        }
    }
}

// ---------------------------------------------------- narrowband singles

struct NxdnHandler;

impl FrameHandler for NxdnHandler {
    fn name(&self) -> &'static str {
        "NXDN"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(kind, SyncKind::Nxdn { .. })
    }

    fn handle(&mut self, ctx: &mut DecodeContext<'_>, _kind: SyncKind, dibits: &[u8]) -> Handled {
        const SPAN: usize = 30; // one 60-bit SACCH fragment
        if dibits.len() < SPAN {
            return Handled { consumed: 0 };
        }
        let mut bits = Vec::with_capacity(60);
        for d in &dibits[..SPAN] {
            bits.push((d >> 1) & 1);
            bits.push(d & 1);
        }
        if let Some(sacch) = crate::protocol::nxdn::sacch_decode(&bits) {
            let mut ev = Event::now("NXDN");
            ev.kind = CallKind::Control;
            ev.cc = u16::from(sacch.ran);
            ev.text = format!("{:?}", sacch.message);
            ctx.events.push(ev);
        }
        Handled { consumed: SPAN }
    }
}

struct DstarHandler;

impl FrameHandler for DstarHandler {
    fn name(&self) -> &'static str {
        "D-STAR"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(kind, SyncKind::DstarVoice { .. } | SyncKind::DstarHeader { .. })
    }

    fn handle(&mut self, ctx: &mut DecodeContext<'_>, kind: SyncKind, dibits: &[u8]) -> Handled {
        if matches!(kind, SyncKind::DstarHeader { .. }) {
            const SPAN: usize = 330; // 660 header bits
            if dibits.len() < SPAN {
                return Handled { consumed: 0 };
            }
            let mut bits = Vec::with_capacity(660);
            for d in &dibits[..SPAN] {
                bits.push((d >> 1) & 1);
                bits.push(d & 1);
            }
            if let Some(hdr) = crate::protocol::dstar::header_decode(&bits) {
                let mut ev = Event::now("DSTAR");
                ev.kind = CallKind::Private;
                ev.text = format!("{} > {}", hdr.my, hdr.ur);
                ctx.events.push(ev.clone());
                ctx.hooks.publish_event(&ev);
            }
            Handled { consumed: SPAN }
        } else {
            // Voice frame: 72 bits AMBE + 24 bits slow data.
            Handled {
                consumed: dibits.len().min(48),
            }
        }
    }
}

struct YsfHandler;

impl FrameHandler for YsfHandler {
    fn name(&self) -> &'static str {
        "YSF"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(kind, SyncKind::Ysf { .. })
    }

    fn handle(&mut self, ctx: &mut DecodeContext<'_>, _kind: SyncKind, dibits: &[u8]) -> Handled {
        // FICH: four 24-bit Golay words = 48 dibits.
        const SPAN: usize = 48;
        if dibits.len() < SPAN {
            return Handled { consumed: 0 };
        }
        let mut cw = [0u32; 4];
        for (i, w) in cw.iter_mut().enumerate() {
            let mut v = 0u32;
            for d in &dibits[i * 12..(i + 1) * 12] {
                v = (v << 2) | u32::from(d & 3);
            }
            *w = v;
        }
        if let Some(fich) = crate::protocol::ysf::fich_decode(&cw) {
            let mut ev = Event::now("YSF");
            ev.kind = CallKind::Group;
            ev.text = format!("{:?}/{:?}", fich.fi, fich.dt);
            ctx.events.push(ev);
        }
        Handled { consumed: SPAN }
    }
}

struct DpmrHandler;

impl FrameHandler for DpmrHandler {
    fn name(&self) -> &'static str {
        "dPMR"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(kind, SyncKind::Dpmr { .. })
    }

    fn handle(&mut self, _ctx: &mut DecodeContext<'_>, kind: SyncKind, dibits: &[u8]) -> Handled {
        let span = match kind {
            SyncKind::Dpmr { fs: 1, .. } => 60, // header frame
            _ => 36,
        };
        Handled {
            consumed: dibits.len().min(span),
        }
    }
}

struct ProVoiceHandler;

impl FrameHandler for ProVoiceHandler {
    fn name(&self) -> &'static str {
        "ProVoice"
    }

    fn matches(&self, kind: SyncKind) -> bool {
        matches!(kind, SyncKind::ProVoice { .. } | SyncKind::Edacs { .. })
    }

    fn handle(&mut self, _ctx: &mut DecodeContext<'_>, kind: SyncKind, dibits: &[u8]) -> Handled {
        let span = if matches!(kind, SyncKind::Edacs { .. }) {
            crate::protocol::provoice::EDACS_FRAME_DIBITS
        } else {
            crate::protocol::provoice::PROVOICE_FRAME_DIBITS
        };
        Handled {
            consumed: dibits.len().min(span),
        }
    }
}
