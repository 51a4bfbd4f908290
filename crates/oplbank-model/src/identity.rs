//! Logical instrument identities and rhythm classes.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::approx::approx_eq;

/// Percussion-rhythm slot an instrument can fill.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum RhythmMode {
    /// Ordinary melodic instrument, no rhythm slot.
    #[default]
    None,
    /// Bass drum slot.
    BassDrum,
    /// Snare slot.
    Snare,
    /// Tom-tom slot.
    TomTom,
    /// Cymbal slot.
    Cymbal,
    /// Hi-hat slot.
    HiHat,
}

impl RhythmMode {
    /// Rhythm class code (0 = none, 1..=5 per slot).
    pub fn code(&self) -> u32 {
        match self {
            RhythmMode::None => 0,
            RhythmMode::BassDrum => 1,
            RhythmMode::Snare => 2,
            RhythmMode::TomTom => 3,
            RhythmMode::Cymbal => 4,
            RhythmMode::HiHat => 5,
        }
    }

    /// Rhythm class shifted into bits 3-5 of an instrument flag word.
    pub fn flag_bits(&self) -> u32 {
        self.code() << 3
    }
}

impl std::fmt::Display for RhythmMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RhythmMode::None => write!(f, "none"),
            RhythmMode::BassDrum => write!(f, "bass_drum"),
            RhythmMode::Snare => write!(f, "snare"),
            RhythmMode::TomTom => write!(f, "tom_tom"),
            RhythmMode::Cymbal => write!(f, "cymbal"),
            RhythmMode::HiHat => write!(f, "hi_hat"),
        }
    }
}

/// A logical instrument: resolved voice references plus note metadata.
///
/// Equality compares every field exactly except `voice2_fine_tune_hz`,
/// which uses the relative-epsilon rule of [`approx_eq`]. The ordering
/// used by the registry's map treats approx-equal detunes as equal at
/// that key position and orders clearly distinct ones by `total_cmp`.
///
/// Near the tolerance boundary this comparator is not transitive: three
/// identities each within epsilon of the next may still compare unequal
/// end to end, so two entries a few epsilon apart can occasionally both
/// earn canonical indices. That matches the behavior this registry
/// replaces and is accepted; see DESIGN.md.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct InstrumentIdentity {
    /// Canonical index of the first voice's register image.
    pub voice_a: usize,
    /// Canonical index of the second voice's register image. Equal to
    /// `voice_a` for single-voice instruments.
    pub voice_b: usize,
    /// Fixed pitch override, 0 = play the requested note.
    pub note_number: u8,
    /// Two independently-triggered 2-op voices layered to fake a 4-op
    /// sound.
    pub pseudo_4op: bool,
    /// True 4-operator chip mode.
    pub real_4op: bool,
    /// Percussion rhythm slot, if any.
    pub rhythm_mode: RhythmMode,
    /// Detune in Hz applied to the second voice.
    pub voice2_fine_tune_hz: f64,
    /// MIDI velocity bias applied on note-on.
    pub velocity_offset: i8,
}

impl PartialEq for InstrumentIdentity {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for InstrumentIdentity {}

impl PartialOrd for InstrumentIdentity {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for InstrumentIdentity {
    fn cmp(&self, other: &Self) -> Ordering {
        self.voice_a
            .cmp(&other.voice_a)
            .then_with(|| self.voice_b.cmp(&other.voice_b))
            .then_with(|| self.note_number.cmp(&other.note_number))
            .then_with(|| self.pseudo_4op.cmp(&other.pseudo_4op))
            .then_with(|| self.real_4op.cmp(&other.real_4op))
            .then_with(|| self.rhythm_mode.cmp(&other.rhythm_mode))
            .then_with(|| cmp_detune(self.voice2_fine_tune_hz, other.voice2_fine_tune_hz))
            .then_with(|| self.velocity_offset.cmp(&other.velocity_offset))
    }
}

fn cmp_detune(a: f64, b: f64) -> Ordering {
    if approx_eq(a, b) {
        Ordering::Equal
    } else {
        a.total_cmp(&b)
    }
}

/// Caller-supplied instrument metadata, before voice references are
/// resolved against the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct InstrumentPatch {
    /// Fixed pitch override, 0 = none.
    pub note_number: u8,
    /// Layered double-voice emulation of a 4-op sound.
    pub pseudo_4op: bool,
    /// True 4-operator chip mode.
    pub real_4op: bool,
    /// Percussion rhythm slot, if any.
    pub rhythm_mode: RhythmMode,
    /// Detune in Hz applied to the second voice.
    pub voice2_fine_tune_hz: f64,
    /// MIDI velocity bias applied on note-on.
    pub velocity_offset: i8,
}

impl InstrumentPatch {
    /// Builds the identity once the voice references are known.
    pub fn into_identity(self, voice_a: usize, voice_b: usize) -> InstrumentIdentity {
        InstrumentIdentity {
            voice_a,
            voice_b,
            note_number: self.note_number,
            pseudo_4op: self.pseudo_4op,
            real_4op: self.real_4op,
            rhythm_mode: self.rhythm_mode,
            voice2_fine_tune_hz: self.voice2_fine_tune_hz,
            velocity_offset: self.velocity_offset,
        }
    }
}
