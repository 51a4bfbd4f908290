//! End-to-end compilation: registry -> tables -> flatten -> bytes.

use pretty_assertions::assert_eq;

use oplbank_compile::{
    flatten, read_dump_header, validate_dump_bytes, CompileContext, CompileStats, TimingHints,
    INST_FLAG_BLANK, INST_FLAG_PSEUDO_4OP, INST_RHYTHM_MASK, NO_INDEX,
};
use oplbank_model::{
    BankSetup, InstrumentPatch, RawOperatorData, RhythmMode, VolumeModel, REGISTER_BLOCK_LEN,
};

fn voice(seed: u8, feedback: u8, fine_tune: i8) -> RawOperatorData {
    let mut registers = [0u8; REGISTER_BLOCK_LEN];
    for (i, register) in registers.iter_mut().enumerate().take(10) {
        *register = seed.wrapping_mul(7).wrapping_add(i as u8);
    }
    registers[10] = feedback;
    RawOperatorData::new(registers, fine_tune, false)
}

/// Builds the same small General MIDI-ish pass every time.
fn build_context() -> CompileContext {
    let mut ctx = CompileContext::new();

    // Melodic bank 0: a piano submitted twice under different names, and
    // a layered string pad.
    let piano = ctx.registry_mut().insert_single_voice(
        voice(1, 0x06, 0),
        InstrumentPatch::default(),
        "GrandPiano",
        None,
    );
    let piano_again = ctx.registry_mut().insert_single_voice(
        voice(1, 0x06, 0),
        InstrumentPatch::default(),
        "AcousticPiano",
        None,
    );
    assert_eq!(piano, piano_again);

    let strings = ctx.registry_mut().insert_double_voice(
        voice(2, 0x04, 0),
        voice(3, 0x02, -1),
        InstrumentPatch {
            pseudo_4op: true,
            voice2_fine_tune_hz: 0.144,
            ..Default::default()
        },
        "Strings",
        Some("SlowStrings"),
        false,
    );

    ctx.set_bank_program(0, 0, piano);
    ctx.set_bank_program(0, 48, strings);
    ctx.set_bank_setup(
        0,
        BankSetup {
            volume_model: VolumeModel::Generic,
            deep_tremolo: false,
            deep_vibrato: false,
            scale_modulators: false,
        },
    );
    ctx.set_bank_name(0, "General MIDI");

    // Percussion on bank 2 with DMX-style setup and measured delays.
    let kick = ctx.registry_mut().insert_single_voice(
        voice(4, 0x00, 0),
        InstrumentPatch {
            note_number: 35,
            rhythm_mode: RhythmMode::BassDrum,
            ..Default::default()
        },
        "Kick",
        None,
    );
    ctx.set_timing_hints(kick, TimingHints { on_ms: 40, off_ms: 10 });
    ctx.set_bank_program(2, 128 + 36, kick);
    ctx.set_bank_setup(
        2,
        BankSetup {
            volume_model: VolumeModel::Dmx,
            deep_tremolo: true,
            deep_vibrato: false,
            scale_modulators: false,
        },
    );

    // Unassigned slots fall back to the shared silent placeholder.
    let silent = ctx.registry_mut().insert_silent();
    ctx.set_bank_program(0, 127, silent);

    ctx
}

#[test]
fn full_pass_flattens_and_serializes() {
    let ctx = build_context();
    let dump = flatten(&ctx).unwrap();
    dump.validate().unwrap();

    assert_eq!(dump.banks.len(), 2);
    assert_eq!(dump.instruments.len(), 4);

    // Bank 0: piano at program 0, strings at 48, silent placeholder at 127.
    let bank0 = &dump.banks[0];
    assert_eq!(bank0.bank_id, 0);
    assert_eq!(bank0.bank_setup, 0x0000);
    assert_eq!(bank0.melodic[0], 0);
    assert_eq!(bank0.melodic[48], 1);
    assert_ne!(bank0.melodic[127], NO_INDEX);

    // Bank 2: DMX volume model with deep tremolo, kick on key 36.
    let bank2 = &dump.banks[1];
    assert_eq!(bank2.bank_id, 2);
    assert_eq!(bank2.bank_setup, 0x0102);
    assert_eq!(bank2.percussion[36], 2);

    // The pseudo-4op strings carry four operators and both feedback bytes.
    let strings = &dump.instruments[1];
    assert_eq!(strings.inst_flags & INST_FLAG_PSEUDO_4OP, INST_FLAG_PSEUDO_4OP);
    assert_eq!(strings.fb_conn, 0x0204);
    assert_eq!(strings.note_offset2, -1);
    assert!(strings.ops[..4].iter().all(|&op| op != NO_INDEX));

    // The kick keeps its rhythm class and measured delays.
    let kick = &dump.instruments[2];
    assert_eq!(kick.inst_flags & INST_RHYTHM_MASK, RhythmMode::BassDrum.flag_bits());
    assert_eq!(kick.delay_on_ms, 40);
    assert_eq!(kick.delay_off_ms, 10);

    // The placeholder is blank.
    assert_eq!(
        dump.instruments[3].inst_flags & INST_FLAG_BLANK,
        INST_FLAG_BLANK
    );

    // Serialized form round-trips its own header.
    let bytes = dump.to_bytes().unwrap();
    validate_dump_bytes(&bytes).unwrap();
    let header = read_dump_header(&bytes).unwrap();
    assert_eq!(header.banks, 2);
    assert_eq!(header.instruments, 4);
    assert_eq!(header.operators as usize, dump.operators.len());
}

#[test]
fn identical_passes_hash_identically() {
    let first = flatten(&build_context()).unwrap();
    let second = flatten(&build_context()).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.compute_hash().unwrap(),
        second.compute_hash().unwrap()
    );
}

#[test]
fn stats_summarize_the_pass() {
    let ctx = build_context();
    let stats = CompileStats::collect(&ctx);
    assert_eq!(stats.raw_entries, 5);
    assert_eq!(stats.instrument_entries, 4);
    assert_eq!(stats.merged_raw_submissions, 1);
    assert_eq!(stats.merged_instrument_submissions, 1);
    assert_eq!(stats.banks, 2);
    assert_eq!(stats.melodic_assignments, 3);
    assert_eq!(stats.percussion_assignments, 1);
    assert_eq!(stats.overwritten_assignments, 0);

    // Provenance survives deduplication.
    let names = ctx.registry().instrument_names(0).unwrap();
    assert!(names.contains("GrandPiano"));
    assert!(names.contains("AcousticPiano"));
}
