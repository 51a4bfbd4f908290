//! Binary dump writer - assembles the flattened sections into one file.
//!
//! Little-endian container: an 8-byte magic, a format version word, one
//! count per section, then the four sections in bank / MIDI-bank /
//! instrument / operator order. Every record is fixed-size, so a reader
//! can seek by index and [`validate_dump_bytes`] can cross-check the
//! byte length against the header before parsing anything.

use std::io::{self, Write};

use byteorder::{LittleEndian, WriteBytesExt};

use super::{
    BankEntry, BanksDump, InstrumentEntry, MidiBank, Operator, BANK_PROGRAM_SLOTS,
    INSTRUMENT_OP_SLOTS, NO_INDEX,
};
use crate::error::{CompileError, CompileResult};

/// Dump file magic identifier.
pub const DUMP_MAGIC: &[u8; 8] = b"OPLBANKD";

/// Dump format version this build reads and writes.
pub const DUMP_VERSION: u16 = 1;

/// Header size: magic, version, four section counts.
pub const DUMP_HEADER_SIZE: usize = 8 + 2 + 4 * 4;

/// Serialized size of one bank entry.
const BANK_ENTRY_SIZE: usize = 4 + 2 + BANK_PROGRAM_SLOTS * 4 * 2;

/// Serialized size of one MIDI bank record.
const MIDI_BANK_SIZE: usize = 4 + 1 + 1 + BANK_PROGRAM_SLOTS * 4;

/// Serialized size of one instrument entry.
const INSTRUMENT_ENTRY_SIZE: usize = 4 + 1 + 1 + 1 + 1 + 4 + 8 + 2 + INSTRUMENT_OP_SLOTS * 4 + 8 + 8;

/// Serialized size of one operator record.
const OPERATOR_SIZE: usize = 4 + 4;

fn write_slots<W: Write>(writer: &mut W, slots: &[i32]) -> io::Result<()> {
    // Records are fixed-size on the wire regardless of how the vector
    // was built.
    for i in 0..BANK_PROGRAM_SLOTS {
        writer.write_i32::<LittleEndian>(slots.get(i).copied().unwrap_or(NO_INDEX))?;
    }
    Ok(())
}

impl BankEntry {
    /// Writes the entry's fixed-size record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.bank_id)?;
        writer.write_u16::<LittleEndian>(self.bank_setup)?;
        write_slots(writer, &self.melodic)?;
        write_slots(writer, &self.percussion)?;
        Ok(())
    }
}

impl MidiBank {
    /// Writes the record's fixed-size form.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.midi_bank_id)?;
        writer.write_u8(self.msb)?;
        writer.write_u8(self.lsb)?;
        write_slots(writer, &self.instruments)?;
        Ok(())
    }
}

impl InstrumentEntry {
    /// Writes the entry's fixed-size record.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.inst_id)?;
        writer.write_i8(self.note_offset1)?;
        writer.write_i8(self.note_offset2)?;
        writer.write_i8(self.midi_velocity_offset)?;
        writer.write_u8(self.percussion_key_number)?;
        writer.write_u32::<LittleEndian>(self.inst_flags)?;
        writer.write_f64::<LittleEndian>(self.second_voice_detune)?;
        writer.write_u16::<LittleEndian>(self.fb_conn)?;
        for op in self.ops {
            writer.write_i32::<LittleEndian>(op)?;
        }
        writer.write_i64::<LittleEndian>(self.delay_on_ms)?;
        writer.write_i64::<LittleEndian>(self.delay_off_ms)?;
        Ok(())
    }
}

impl Operator {
    /// Writes the record's two packed words.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_u32::<LittleEndian>(self.d_e862)?;
        writer.write_u32::<LittleEndian>(self.d_40)?;
        Ok(())
    }
}

impl BanksDump {
    /// Writes the complete dump to a writer.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(DUMP_MAGIC)?;
        writer.write_u16::<LittleEndian>(DUMP_VERSION)?;
        writer.write_u32::<LittleEndian>(self.banks.len() as u32)?;
        writer.write_u32::<LittleEndian>(self.midi_banks.len() as u32)?;
        writer.write_u32::<LittleEndian>(self.instruments.len() as u32)?;
        writer.write_u32::<LittleEndian>(self.operators.len() as u32)?;

        for bank in &self.banks {
            bank.write(writer)?;
        }
        for midi_bank in &self.midi_banks {
            midi_bank.write(writer)?;
        }
        for instrument in &self.instruments {
            instrument.write(writer)?;
        }
        for operator in &self.operators {
            operator.write(writer)?;
        }
        Ok(())
    }

    /// Writes the dump to a byte vector.
    pub fn to_bytes(&self) -> io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.write(&mut buffer)?;
        Ok(buffer)
    }

    /// Computes the BLAKE3 hash of the serialized dump.
    pub fn compute_hash(&self) -> io::Result<String> {
        let bytes = self.to_bytes()?;
        Ok(blake3::hash(&bytes).to_hex().to_string())
    }
}

/// Parsed dump header counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpHeader {
    /// Format version.
    pub version: u16,
    /// Bank entries in the file.
    pub banks: u32,
    /// MIDI bank records in the file.
    pub midi_banks: u32,
    /// Instrument entries in the file.
    pub instruments: u32,
    /// Operator records in the file.
    pub operators: u32,
}

impl DumpHeader {
    /// Total file size the header's counts imply.
    pub fn expected_len(&self) -> usize {
        DUMP_HEADER_SIZE
            + self.banks as usize * BANK_ENTRY_SIZE
            + self.midi_banks as usize * MIDI_BANK_SIZE
            + self.instruments as usize * INSTRUMENT_ENTRY_SIZE
            + self.operators as usize * OPERATOR_SIZE
    }
}

/// Parses and checks the dump header.
pub fn read_dump_header(data: &[u8]) -> CompileResult<DumpHeader> {
    if data.len() < DUMP_HEADER_SIZE {
        return Err(CompileError::DumpTooSmall {
            expected: DUMP_HEADER_SIZE,
            found: data.len(),
        });
    }
    if &data[0..8] != DUMP_MAGIC {
        return Err(CompileError::InvalidMagic);
    }
    let version = u16::from_le_bytes([data[8], data[9]]);
    if version != DUMP_VERSION {
        return Err(CompileError::UnsupportedVersion { version });
    }
    let count = |offset: usize| {
        u32::from_le_bytes([
            data[offset],
            data[offset + 1],
            data[offset + 2],
            data[offset + 3],
        ])
    };
    Ok(DumpHeader {
        version,
        banks: count(10),
        midi_banks: count(14),
        instruments: count(18),
        operators: count(22),
    })
}

/// Validates a serialized dump: magic, version, and a byte length that
/// matches the header's record counts.
pub fn validate_dump_bytes(data: &[u8]) -> CompileResult<()> {
    let header = read_dump_header(data)?;
    let expected = header.expected_len();
    if data.len() != expected {
        return Err(CompileError::LengthMismatch {
            expected,
            found: data.len(),
        });
    }
    Ok(())
}
