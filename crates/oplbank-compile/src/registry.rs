//! Find-or-create deduplication registry for instrument definitions.
//!
//! The registry owns two ordered maps: raw register images and resolved
//! instrument identities. Each map entry carries a dense canonical index
//! (first-seen order, counting from zero) and the set of human-readable
//! names that resolved to it. Re-submitting an equal definition under a
//! new name folds onto the existing entry instead of minting a new index,
//! so the name sets double as provenance for duplicate reporting.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use oplbank_model::{InstrumentIdentity, InstrumentPatch, RawOperatorData};

/// Name the canonical no-sound instrument is registered under.
pub const SILENT_INSTRUMENT_NAME: &str = "nosound";

#[derive(Debug, Clone)]
struct TabEntry {
    index: usize,
    names: BTreeSet<String>,
}

/// Deduplicating store assigning stable canonical indices.
#[derive(Debug, Clone, Default)]
pub struct DeduplicationRegistry {
    raw: BTreeMap<RawOperatorData, TabEntry>,
    instruments: BTreeMap<InstrumentIdentity, TabEntry>,
    merged_raw: usize,
    merged_instruments: usize,
}

impl DeduplicationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a raw register image, returning its canonical index.
    ///
    /// An image equal to an already-registered one (exact byte equality,
    /// same fine-tune, same two-voice flag) returns the existing index
    /// and adds `name` to that entry's name set.
    pub fn insert_raw(&mut self, data: RawOperatorData, name: &str) -> usize {
        self.intern_raw(data, &[name])
    }

    /// Inserts a single-voice instrument, returning its canonical index.
    ///
    /// Resolves the register image first, then find-or-creates the
    /// identity with both voice references pointing at it.
    pub fn insert_single_voice(
        &mut self,
        data: RawOperatorData,
        patch: InstrumentPatch,
        name: &str,
        name2: Option<&str>,
    ) -> usize {
        let names = submitted_names(name, name2);
        let voice = self.intern_raw(data, &names);
        self.intern_instrument(patch.into_identity(voice, voice), &names)
    }

    /// Inserts a double-voice or 4-operator instrument, returning its
    /// canonical index.
    ///
    /// With `single_voice` set, the two register blocks are folded into
    /// one double-voice entry (callers pass identical blocks in that
    /// case) and both voice references point at it. Otherwise each block
    /// is registered independently.
    pub fn insert_double_voice(
        &mut self,
        voice_a: RawOperatorData,
        voice_b: RawOperatorData,
        patch: InstrumentPatch,
        name: &str,
        name2: Option<&str>,
        single_voice: bool,
    ) -> usize {
        let names = submitted_names(name, name2);
        let a = self.intern_raw(voice_a, &names);
        let b = if single_voice {
            a
        } else {
            self.intern_raw(voice_b, &names)
        };
        self.intern_instrument(patch.into_identity(a, b), &names)
    }

    /// Inserts the canonical no-sound placeholder instrument.
    ///
    /// Idempotent by the ordinary dedup rule: every call site gets the
    /// same index back.
    pub fn insert_silent(&mut self) -> usize {
        self.insert_single_voice(
            RawOperatorData::silent(),
            InstrumentPatch::default(),
            SILENT_INSTRUMENT_NAME,
            None,
        )
    }

    /// Number of distinct raw register images.
    pub fn raw_count(&self) -> usize {
        self.raw.len()
    }

    /// Number of distinct instruments.
    pub fn instrument_count(&self) -> usize {
        self.instruments.len()
    }

    /// Submissions folded onto an existing raw entry.
    pub fn merged_raw(&self) -> usize {
        self.merged_raw
    }

    /// Submissions folded onto an existing instrument entry.
    pub fn merged_instruments(&self) -> usize {
        self.merged_instruments
    }

    /// Raw register images ordered by canonical index.
    pub fn raw_in_index_order(&self) -> Vec<&RawOperatorData> {
        let mut out: Vec<Option<&RawOperatorData>> = vec![None; self.raw.len()];
        for (data, entry) in &self.raw {
            out[entry.index] = Some(data);
        }
        out.into_iter().flatten().collect()
    }

    /// Instrument identities ordered by canonical index.
    pub fn instruments_in_index_order(&self) -> Vec<&InstrumentIdentity> {
        let mut out: Vec<Option<&InstrumentIdentity>> = vec![None; self.instruments.len()];
        for (identity, entry) in &self.instruments {
            out[entry.index] = Some(identity);
        }
        out.into_iter().flatten().collect()
    }

    /// Names that resolved to the raw entry at `index`.
    pub fn raw_names(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.raw
            .values()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.names)
    }

    /// Names that resolved to the instrument entry at `index`.
    pub fn instrument_names(&self, index: usize) -> Option<&BTreeSet<String>> {
        self.instruments
            .values()
            .find(|entry| entry.index == index)
            .map(|entry| &entry.names)
    }

    fn intern_raw(&mut self, data: RawOperatorData, names: &[&str]) -> usize {
        intern(&mut self.raw, &mut self.merged_raw, data, names)
    }

    fn intern_instrument(&mut self, identity: InstrumentIdentity, names: &[&str]) -> usize {
        intern(&mut self.instruments, &mut self.merged_instruments, identity, names)
    }
}

fn intern<K: Ord>(
    map: &mut BTreeMap<K, TabEntry>,
    merged: &mut usize,
    key: K,
    names: &[&str],
) -> usize {
    let next = map.len();
    match map.entry(key) {
        Entry::Occupied(mut slot) => {
            *merged += 1;
            let entry = slot.get_mut();
            record_names(&mut entry.names, names);
            entry.index
        }
        Entry::Vacant(slot) => {
            let entry = slot.insert(TabEntry {
                index: next,
                names: BTreeSet::new(),
            });
            record_names(&mut entry.names, names);
            next
        }
    }
}

fn submitted_names<'a>(name: &'a str, name2: Option<&'a str>) -> Vec<&'a str> {
    let mut names = vec![name];
    if let Some(second) = name2 {
        names.push(second);
    }
    names
}

fn record_names(set: &mut BTreeSet<String>, names: &[&str]) {
    for name in names {
        if !name.is_empty() {
            set.insert((*name).to_string());
        }
    }
}
