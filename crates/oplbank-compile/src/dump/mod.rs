//! Serialization-ready dump record model.
//!
//! A [`BanksDump`] is the flattened mirror of one compilation pass: four
//! position-addressed vectors whose records reference each other purely
//! by integer index, with -1 marking an absent reference. The flattening
//! transform guarantees no dangling index by construction;
//! [`BanksDump::validate`] re-checks the invariant after the fact, the
//! same belt-and-braces habit the writer applies to its own output.

mod writer;

pub use writer::{
    read_dump_header, validate_dump_bytes, DumpHeader, DUMP_HEADER_SIZE, DUMP_MAGIC, DUMP_VERSION,
};

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, CompileResult};

/// Melodic or percussion slots per bank.
pub const BANK_PROGRAM_SLOTS: usize = 128;

/// Operator reference slots per instrument entry.
pub const INSTRUMENT_OP_SLOTS: usize = 5;

/// Marker for an absent index reference.
pub const NO_INDEX: i32 = -1;

/// Instrument flag bit: true four-operator chip mode.
pub const INST_FLAG_4OP: u32 = 0x01;

/// Instrument flag bit: pseudo four-operator (two layered 2-op voices).
pub const INST_FLAG_PSEUDO_4OP: u32 = 0x02;

/// Instrument flag bit: blank/unused entry.
pub const INST_FLAG_BLANK: u32 = 0x04;

/// Mask of the rhythm-mode class in bits 3-5.
pub const INST_RHYTHM_MASK: u32 = 0x38;

/// One bank's flattened program tables and packed setup word.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankEntry {
    /// Bank id the entry was compiled from.
    pub bank_id: u32,
    /// Packed setup word `0xAABB`: AA = OPL flags, BB = volume model.
    pub bank_setup: u16,
    /// Instrument positions by melodic program 0-127, -1 = unset.
    pub melodic: Vec<i32>,
    /// Instrument positions by percussion key 0-127, -1 = unset.
    pub percussion: Vec<i32>,
}

impl BankEntry {
    /// Creates an entry with every slot unset.
    pub fn new(bank_id: u32, bank_setup: u16) -> Self {
        Self {
            bank_id,
            bank_setup,
            melodic: vec![NO_INDEX; BANK_PROGRAM_SLOTS],
            percussion: vec![NO_INDEX; BANK_PROGRAM_SLOTS],
        }
    }
}

/// Alternate bank view keyed by the MIDI (MSB, LSB) bank-select pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MidiBank {
    /// Dense id of this record.
    pub midi_bank_id: u32,
    /// Bank-select coarse value (CC0), 7-bit.
    pub msb: u8,
    /// Bank-select fine value (CC32), 7-bit.
    pub lsb: u8,
    /// Instrument positions by program 0-127, -1 = unset.
    pub instruments: Vec<i32>,
}

impl MidiBank {
    /// Creates a record with every program slot unset.
    pub fn new(midi_bank_id: u32, msb: u8, lsb: u8) -> Self {
        Self {
            midi_bank_id,
            msb,
            lsb,
            instruments: vec![NO_INDEX; BANK_PROGRAM_SLOTS],
        }
    }
}

/// One flattened instrument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    /// Canonical index the entry was flattened from.
    pub inst_id: u32,
    /// First voice semitone offset.
    pub note_offset1: i8,
    /// Second voice semitone offset.
    pub note_offset2: i8,
    /// MIDI velocity bias.
    pub midi_velocity_offset: i8,
    /// Fixed percussion pitch, 0 = none.
    pub percussion_key_number: u8,
    /// Flag word: bit0 4-op, bit1 pseudo-4-op, bit2 blank, bits 3-5
    /// rhythm class.
    pub inst_flags: u32,
    /// Detune in Hz applied to the second voice.
    pub second_voice_detune: f64,
    /// Feedback/connection bytes for both voices, `0xBBAA`: AA = first
    /// voice, BB = second.
    pub fb_conn: u16,
    /// Operator record positions; -1 = unused slot. 2-op instruments use
    /// slots 0-1, double-voice and 4-op instruments slots 0-3.
    pub ops: [i32; INSTRUMENT_OP_SLOTS],
    /// Audible time after key-on, milliseconds.
    pub delay_on_ms: i64,
    /// Audible time after key-off, milliseconds.
    pub delay_off_ms: i64,
}

impl Default for InstrumentEntry {
    fn default() -> Self {
        Self {
            inst_id: 0,
            note_offset1: 0,
            note_offset2: 0,
            midi_velocity_offset: 0,
            percussion_key_number: 0,
            inst_flags: 0,
            second_voice_detune: 0.0,
            fb_conn: 0,
            ops: [NO_INDEX; INSTRUMENT_OP_SLOTS],
            delay_on_ms: 0,
            delay_off_ms: 0,
        }
    }
}

/// One physical operator's packed register words.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Operator {
    /// Waveform, sustain/release, attack/decay and 0x20 bytes packed
    /// high to low.
    pub d_e862: u32,
    /// Key-scale-level / output-level byte.
    pub d_40: u32,
}

impl Operator {
    /// Creates a record from pre-packed words.
    pub fn new(d_e862: u32, d_40: u32) -> Self {
        Self { d_e862, d_40 }
    }
}

/// The complete flattened dump.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BanksDump {
    /// Bank entries.
    pub banks: Vec<BankEntry>,
    /// MIDI bank-select views.
    pub midi_banks: Vec<MidiBank>,
    /// Instrument entries.
    pub instruments: Vec<InstrumentEntry>,
    /// Operator records.
    pub operators: Vec<Operator>,
}

impl BanksDump {
    /// Checks that every stored index is -1 or a valid offset into the
    /// vector it references.
    pub fn validate(&self) -> CompileResult<()> {
        for bank in &self.banks {
            check_indices("instruments", &bank.melodic, self.instruments.len())?;
            check_indices("instruments", &bank.percussion, self.instruments.len())?;
        }
        for midi_bank in &self.midi_banks {
            check_indices("instruments", &midi_bank.instruments, self.instruments.len())?;
        }
        for instrument in &self.instruments {
            check_indices("operators", &instrument.ops, self.operators.len())?;
        }
        Ok(())
    }

    /// Serializes the dump to pretty-printed JSON for diagnostics.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

fn check_indices(section: &'static str, indices: &[i32], len: usize) -> CompileResult<()> {
    for &index in indices {
        if index != NO_INDEX && (index < 0 || index as usize >= len) {
            return Err(CompileError::DanglingIndex {
                section,
                index: i64::from(index),
                len,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_dump_validates() {
        assert!(BanksDump::default().validate().is_ok());
    }

    #[test]
    fn valid_references_pass() {
        let mut dump = BanksDump::default();
        dump.operators.push(Operator::new(0x0105_0201, 0x3F));
        dump.operators.push(Operator::new(0x0205_0202, 0x00));
        let mut instrument = InstrumentEntry::default();
        instrument.ops[0] = 0;
        instrument.ops[1] = 1;
        dump.instruments.push(instrument);
        let mut bank = BankEntry::new(0, 0);
        bank.melodic[10] = 0;
        dump.banks.push(bank);
        assert!(dump.validate().is_ok());
    }

    #[test]
    fn dangling_instrument_reference_fails() {
        let mut dump = BanksDump::default();
        let mut bank = BankEntry::new(0, 0);
        bank.melodic[0] = 3;
        dump.banks.push(bank);
        let err = dump.validate().unwrap_err();
        match err {
            CompileError::DanglingIndex { section, index, len } => {
                assert_eq!(section, "instruments");
                assert_eq!(index, 3);
                assert_eq!(len, 0);
            }
            other => panic!("expected DanglingIndex, got {other:?}"),
        }
    }

    #[test]
    fn dangling_operator_reference_fails() {
        let mut dump = BanksDump::default();
        let mut instrument = InstrumentEntry::default();
        instrument.ops[4] = 7;
        dump.instruments.push(instrument);
        assert!(dump.validate().is_err());
    }
}
