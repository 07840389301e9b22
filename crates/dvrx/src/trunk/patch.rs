// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Regroup/patch (super-group) tracking.
//!
//! Dynamic regrouping patches working groups into a super-group and can
//! carry key/algorithm assignments. A patch with KEY=0 declares the
//! regrouped traffic clear, which the grant policy uses to override the
//! encrypted-call lockout for member talkgroups.

/// One tracked super-group.
#[derive(Debug, Clone, Default)]
pub struct Patch {
    pub sgid: u16,
    /// Two-way patch vs one-way simulselect.
    pub is_patch: bool,
    pub active: bool,
    pub wgids: Vec<u16>,
    pub key: u16,
    pub alg: u16,
    pub ssn: u8,
    key_valid: bool,
}

/// Bounded table of tracked patches.
#[derive(Debug, Default)]
pub struct PatchTable {
    entries: Vec<Patch>,
}

const PATCH_MAX: usize = 8;

impl PatchTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry_mut(&mut self, sgid: u16) -> &mut Patch {
        if let Some(i) = self.entries.iter().position(|p| p.sgid == sgid) {
            return &mut self.entries[i];
        }
        if self.entries.len() == PATCH_MAX {
            self.entries.remove(0);
        }
        self.entries.push(Patch {
            sgid,
            ..Patch::default()
        });
        let last = self.entries.len() - 1;
        &mut self.entries[last]
    }

    /// Create/refresh a super-group.
    pub fn update(&mut self, sgid: u16, is_patch: bool, active: bool) {
        let e = self.entry_mut(sgid);
        e.is_patch = is_patch;
        e.active = active;
        if !active {
            e.wgids.clear();
            e.key_valid = false;
        }
    }

    /// Add a working group to a super-group.
    pub fn add_wgid(&mut self, sgid: u16, wgid: u16) {
        let e = self.entry_mut(sgid);
        if !e.wgids.contains(&wgid) {
            e.wgids.push(wgid);
        }
    }

    /// Record a key/algorithm/SSN assignment for a super-group.
    pub fn set_key_alg(&mut self, sgid: u16, key: u16, alg: u16, ssn: u8) {
        let e = self.entry_mut(sgid);
        e.key = key;
        e.alg = alg;
        e.ssn = ssn;
        e.key_valid = true;
    }

    /// Whether `tg` is regrouped under an active super-group whose key
    /// assignment is KEY=0 (explicitly clear).
    pub fn tg_key_is_clear(&self, tg: u16) -> bool {
        self.entries.iter().any(|p| {
            p.active
                && p.key_valid
                && p.key == 0
                && (p.sgid == tg || p.wgids.contains(&tg))
        })
    }

    pub fn get(&self, sgid: u16) -> Option<&Patch> {
        self.entries.iter().find(|p| p.sgid == sgid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_zero_override_applies_to_members() {
        let mut t = PatchTable::new();
        t.update(69, true, true);
        t.add_wgid(69, 0x2345);
        t.set_key_alg(69, 0, 0x84, 17);
        assert!(t.tg_key_is_clear(0x2345));
        assert!(t.tg_key_is_clear(69));
        assert!(!t.tg_key_is_clear(0x9999));
    }

    #[test]
    fn test_nonzero_key_does_not_override() {
        let mut t = PatchTable::new();
        t.update(7, true, true);
        t.add_wgid(7, 100);
        t.set_key_alg(7, 0x1234, 0x84, 1);
        assert!(!t.tg_key_is_clear(100));
    }

    #[test]
    fn test_inactive_patch_ignored() {
        let mut t = PatchTable::new();
        t.update(5, true, true);
        t.add_wgid(5, 42);
        t.set_key_alg(5, 0, 0x84, 2);
        assert!(t.tg_key_is_clear(42));
        t.update(5, true, false);
        assert!(!t.tg_key_is_clear(42));
    }

    #[test]
    fn test_without_key_assignment_no_override() {
        let mut t = PatchTable::new();
        t.update(3, true, true);
        t.add_wgid(3, 11);
        // KEY never assigned: cannot assume clear
        assert!(!t.tg_key_is_clear(11));
    }
}
