//! Bank program/setup tables and the compilation context.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use oplbank_model::BankSetup;

use crate::registry::DeduplicationRegistry;

/// First patch number addressing a percussion key rather than a melodic
/// program. Patches 0-127 are MIDI programs, 128-255 percussion keys
/// 0-127.
pub const PERCUSSION_PATCH_BASE: u32 = 128;

/// Patch numbers per bank (melodic programs plus percussion keys).
pub const BANK_PATCH_SLOTS: u32 = 256;

/// Millisecond key-on/key-off sustain measurements for percussive
/// envelopes, carried through to the dump's delay hints.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimingHints {
    /// Time the sound stays audible after key-on.
    pub on_ms: i64,
    /// Time the release tail stays audible after key-off.
    pub off_ms: i64,
}

/// Sparse bank → patch → canonical instrument index mapping.
#[derive(Debug, Clone, Default)]
pub struct BankProgramTable {
    programs: BTreeMap<u32, BTreeMap<u32, usize>>,
}

impl BankProgramTable {
    /// Assigns an instrument to `(bank, patch)`, returning the previous
    /// assignment. Last write wins; overwrites are not rejected.
    pub fn set(&mut self, bank: u32, patch: u32, instrument: usize) -> Option<usize> {
        self.programs
            .entry(bank)
            .or_default()
            .insert(patch, instrument)
    }

    /// Looks up the instrument assigned to `(bank, patch)`.
    pub fn get(&self, bank: u32, patch: u32) -> Option<usize> {
        self.programs.get(&bank)?.get(&patch).copied()
    }

    /// Bank ids with at least one assignment.
    pub fn banks(&self) -> impl Iterator<Item = u32> + '_ {
        self.programs.keys().copied()
    }

    /// All assignments of one bank, keyed by patch.
    pub fn bank_programs(&self, bank: u32) -> Option<&BTreeMap<u32, usize>> {
        self.programs.get(&bank)
    }
}

/// Bank → playback setup mapping.
#[derive(Debug, Clone, Default)]
pub struct BankSetupTable {
    setups: BTreeMap<u32, BankSetup>,
}

impl BankSetupTable {
    /// Assigns the bank's setup, overwriting any previous one.
    pub fn set(&mut self, bank: u32, setup: BankSetup) {
        self.setups.insert(bank, setup);
    }

    /// Looks up the bank's setup.
    pub fn get(&self, bank: u32) -> Option<BankSetup> {
        self.setups.get(&bank).copied()
    }

    /// Bank ids with an assigned setup.
    pub fn banks(&self) -> impl Iterator<Item = u32> + '_ {
        self.setups.keys().copied()
    }
}

/// All state of one compilation pass.
///
/// Owned by the driver and threaded `&mut` through the compile: the
/// registry, both bank tables, bank display names, per-instrument timing
/// hints, and optional MIDI bank-select associations. Single-writer,
/// single-pass; flattening reads it once population is done.
#[derive(Debug, Clone, Default)]
pub struct CompileContext {
    registry: DeduplicationRegistry,
    programs: BankProgramTable,
    setups: BankSetupTable,
    bank_names: BTreeMap<u32, String>,
    timing: BTreeMap<usize, TimingHints>,
    bank_select: BTreeMap<u32, (u8, u8)>,
    overwritten: usize,
}

impl CompileContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// The deduplication registry.
    pub fn registry(&self) -> &DeduplicationRegistry {
        &self.registry
    }

    /// Mutable access to the deduplication registry.
    pub fn registry_mut(&mut self) -> &mut DeduplicationRegistry {
        &mut self.registry
    }

    /// The bank program table.
    pub fn programs(&self) -> &BankProgramTable {
        &self.programs
    }

    /// The bank setup table.
    pub fn setups(&self) -> &BankSetupTable {
        &self.setups
    }

    /// Assigns an instrument to `(bank, patch)`. Last write wins;
    /// a differing overwrite is counted for diagnostics, not rejected.
    pub fn set_bank_program(&mut self, bank: u32, patch: u32, instrument: usize) {
        let previous = self.programs.set(bank, patch, instrument);
        if previous.is_some() && previous != Some(instrument) {
            self.overwritten += 1;
        }
    }

    /// Assigns the bank's playback setup. May happen before, after, or
    /// between program assignments.
    pub fn set_bank_setup(&mut self, bank: u32, setup: BankSetup) {
        self.setups.set(bank, setup);
    }

    /// Records a display name for the bank.
    pub fn set_bank_name(&mut self, bank: u32, name: impl Into<String>) {
        self.bank_names.insert(bank, name.into());
    }

    /// The bank's display name, if one was recorded.
    pub fn bank_name(&self, bank: u32) -> Option<&str> {
        self.bank_names.get(&bank).map(String::as_str)
    }

    /// Records measured key-on/key-off delays for an instrument.
    pub fn set_timing_hints(&mut self, instrument: usize, hints: TimingHints) {
        self.timing.insert(instrument, hints);
    }

    /// Measured delays for an instrument, if recorded.
    pub fn timing_hints(&self, instrument: usize) -> Option<TimingHints> {
        self.timing.get(&instrument).copied()
    }

    /// Associates an explicit MIDI (MSB, LSB) bank-select pair with the
    /// bank's melodic view. Banks without one derive the pair from their
    /// id at flatten time.
    pub fn set_bank_select(&mut self, bank: u32, msb: u8, lsb: u8) {
        self.bank_select.insert(bank, (msb, lsb));
    }

    /// Explicit bank-select association, if registered.
    pub fn bank_select(&self, bank: u32) -> Option<(u8, u8)> {
        self.bank_select.get(&bank).copied()
    }

    /// Differing `set_bank_program` overwrites seen so far.
    pub fn overwritten_assignments(&self) -> usize {
        self.overwritten
    }

    /// Every bank id referenced by either table.
    pub fn bank_ids(&self) -> BTreeSet<u32> {
        self.programs.banks().chain(self.setups.banks()).collect()
    }
}
