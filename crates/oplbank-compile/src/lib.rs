//! OPL Bank Compiler Engine
//!
//! This crate turns a stream of FM instrument definitions into a
//! serializable sound-bank dump. The hard part is deduplication: every
//! distinct register image and every distinct instrument identity gets
//! exactly one dense canonical index, assigned in first-seen order, with
//! the names of all duplicate submissions folded onto the surviving
//! entry.
//!
//! # Pipeline
//!
//! 1. The driver inserts instrument definitions into the
//!    [`DeduplicationRegistry`] owned by a [`CompileContext`] and records
//!    bank program/setup assignments on the context's tables.
//! 2. [`flatten`] rewrites the registries and tables into a
//!    [`BanksDump`]: four flat vectors referencing each other purely by
//!    integer index.
//! 3. The dump serializes to the little-endian container via
//!    [`BanksDump::to_bytes`], hashes with BLAKE3, and re-checks its own
//!    index invariants with [`BanksDump::validate`].
//!
//! # Example
//!
//! ```
//! use oplbank_compile::{flatten, CompileContext};
//! use oplbank_model::{BankSetup, InstrumentPatch, RawOperatorData, VolumeModel};
//!
//! let mut ctx = CompileContext::new();
//! let registers = [0x21, 0x11, 0xF2, 0xF2, 0x73, 0x74, 0x00, 0x00, 0x18, 0x00, 0x06];
//! let lead = ctx.registry_mut().insert_single_voice(
//!     RawOperatorData::new(registers, 0, false),
//!     InstrumentPatch::default(),
//!     "SquareLead",
//!     None,
//! );
//! ctx.set_bank_program(0, 80, lead);
//! ctx.set_bank_setup(
//!     0,
//!     BankSetup {
//!         volume_model: VolumeModel::Generic,
//!         deep_tremolo: false,
//!         deep_vibrato: false,
//!         scale_modulators: false,
//!     },
//! );
//!
//! let dump = flatten(&ctx).unwrap();
//! assert_eq!(dump.banks[0].melodic[80], lead as i32);
//! let bytes = dump.to_bytes().unwrap();
//! oplbank_compile::validate_dump_bytes(&bytes).unwrap();
//! ```
//!
//! # Modules
//!
//! - [`registry`]: Find-or-create deduplication registry
//! - [`tables`]: Bank program/setup tables and the compilation context
//! - [`flatten`]: Flattening into position-addressed records
//! - [`dump`]: Dump record model, binary writer, and byte validation
//! - [`report`]: Compile statistics
//! - [`error`]: Error types

pub mod dump;
pub mod error;
pub mod flatten;
pub mod registry;
pub mod report;
pub mod tables;

pub use dump::{
    read_dump_header, validate_dump_bytes, BankEntry, BanksDump, DumpHeader, InstrumentEntry,
    MidiBank, Operator, BANK_PROGRAM_SLOTS, DUMP_HEADER_SIZE, DUMP_MAGIC, DUMP_VERSION,
    INSTRUMENT_OP_SLOTS, INST_FLAG_4OP, INST_FLAG_BLANK, INST_FLAG_PSEUDO_4OP, INST_RHYTHM_MASK,
    NO_INDEX,
};
pub use error::{CompileError, CompileResult};
pub use flatten::flatten;
pub use registry::{DeduplicationRegistry, SILENT_INSTRUMENT_NAME};
pub use report::CompileStats;
pub use tables::{
    BankProgramTable, BankSetupTable, CompileContext, TimingHints, BANK_PATCH_SLOTS,
    PERCUSSION_PATCH_BASE,
};
