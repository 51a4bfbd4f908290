//! OPL Bank Compiler Data Model
//!
//! This crate provides the data model shared by the offline OPL bank
//! compiler: raw FM operator register images, logical instrument
//! identities, percussion rhythm classes, and per-bank playback setup.
//!
//! # Overview
//!
//! An instrument definition arrives as one or two raw register images
//! ([`RawOperatorData`]) plus note/voice metadata ([`InstrumentPatch`]).
//! The compiler's deduplication registry keys on these types, so their
//! equality and ordering rules are the heart of the model:
//!
//! - [`RawOperatorData`] compares **exactly**, byte for byte, so that two
//!   register dumps merge only when they would program the chip
//!   identically.
//! - [`InstrumentIdentity`] compares all integer fields exactly but the
//!   second-voice detune with a relative-epsilon tolerance
//!   ([`approx_eq`]), so that floating rounding noise from different
//!   source formats does not split one instrument into two.
//!
//! # Example
//!
//! ```
//! use oplbank_model::{InstrumentPatch, RawOperatorData, RhythmMode};
//!
//! let voice = RawOperatorData::from_slice(
//!     &[0x21, 0x11, 0xF2, 0xF2, 0x73, 0x74, 0x00, 0x00, 0x18, 0x00, 0x06],
//!     0,
//!     false,
//! )
//! .unwrap();
//!
//! let patch = InstrumentPatch {
//!     note_number: 0,
//!     rhythm_mode: RhythmMode::None,
//!     ..Default::default()
//! };
//!
//! let identity = patch.into_identity(0, 0);
//! assert_eq!(identity.voice_a, identity.voice_b);
//! assert!(!voice.is_silent());
//! ```
//!
//! # Modules
//!
//! - [`approx`]: Relative-epsilon floating point comparison
//! - [`error`]: Model construction errors
//! - [`identity`]: Instrument identities, patches, and rhythm classes
//! - [`opdata`]: Raw operator register images and register-word packing
//! - [`setup`]: Per-bank playback setup and the packed setup word

pub mod approx;
pub mod error;
pub mod identity;
pub mod opdata;
pub mod setup;

pub use approx::approx_eq;
pub use error::{ModelError, ModelResult};
pub use identity::{InstrumentIdentity, InstrumentPatch, RhythmMode};
pub use opdata::{RawOperatorData, REGISTER_BLOCK_LEN};
pub use setup::{
    BankSetup, VolumeModel, SETUP_FLAG_DEEP_TREMOLO, SETUP_FLAG_DEEP_VIBRATO,
};
