//! Flattening - canonical registries to position-addressed dump records.
//!
//! A pure transform over a populated [`CompileContext`]: operator words
//! and instrument entries are emitted once per canonical registry entry,
//! bank tables are rewritten through explicit remap tables, and every
//! stored index is either -1 or a valid offset into the vector it
//! references. The remap tables make the no-dangling invariant hold by
//! construction; the result still passes [`BanksDump::validate`].

use std::collections::BTreeMap;

use oplbank_model::RhythmMode;

use crate::dump::{
    BankEntry, BanksDump, InstrumentEntry, MidiBank, Operator, INSTRUMENT_OP_SLOTS, INST_FLAG_4OP,
    INST_FLAG_BLANK, INST_FLAG_PSEUDO_4OP, NO_INDEX,
};
use crate::error::{CompileError, CompileResult};
use crate::tables::{CompileContext, BANK_PATCH_SLOTS, PERCUSSION_PATCH_BASE};

/// MSB marking the percussion view of a bank, per the XG drum-bank
/// convention.
const PERCUSSION_BANK_MSB: u8 = 0x7F;

/// Flattens one finished compilation pass into a dump.
///
/// Fails only on caller contract violations the tables cannot rule out
/// by type: an instrument index the registry never assigned, or a patch
/// number outside the melodic/percussion range.
pub fn flatten(ctx: &CompileContext) -> CompileResult<BanksDump> {
    let registry = ctx.registry();
    let raws = registry.raw_in_index_order();

    // Operator records, deduplicated by packed value. voice_ops remaps
    // canonical raw index -> (modulator, carrier) output positions.
    let mut operators: Vec<Operator> = Vec::new();
    let mut seen_ops: BTreeMap<Operator, i32> = BTreeMap::new();
    let mut voice_ops: Vec<(i32, i32)> = Vec::with_capacity(raws.len());
    for raw in &raws {
        let (mod_e862, mod_40) = raw.modulator_words();
        let (car_e862, car_40) = raw.carrier_words();
        let modulator = intern_operator(&mut operators, &mut seen_ops, Operator::new(mod_e862, mod_40));
        let carrier = intern_operator(&mut operators, &mut seen_ops, Operator::new(car_e862, car_40));
        voice_ops.push((modulator, carrier));
    }

    // Instrument entries in canonical order. instrument_positions remaps
    // canonical instrument index -> output position.
    let identities = registry.instruments_in_index_order();
    let mut instruments: Vec<InstrumentEntry> = Vec::with_capacity(identities.len());
    let mut instrument_positions: Vec<i32> = Vec::with_capacity(identities.len());
    for (index, identity) in identities.iter().enumerate() {
        let raw_a = raws[identity.voice_a];
        let raw_b = raws[identity.voice_b];
        let double_voice = identity.pseudo_4op || identity.real_4op;

        let mut ops = [NO_INDEX; INSTRUMENT_OP_SLOTS];
        let (mod_a, car_a) = voice_ops[identity.voice_a];
        ops[0] = mod_a;
        ops[1] = car_a;
        let mut fb_conn = u16::from(raw_a.feedback_connection());
        if double_voice {
            let (mod_b, car_b) = voice_ops[identity.voice_b];
            ops[2] = mod_b;
            ops[3] = car_b;
            fb_conn |= u16::from(raw_b.feedback_connection()) << 8;
        }

        let mut inst_flags = identity.rhythm_mode.flag_bits();
        if identity.real_4op {
            inst_flags |= INST_FLAG_4OP;
        }
        if identity.pseudo_4op {
            inst_flags |= INST_FLAG_PSEUDO_4OP;
        }
        if raw_a.is_silent() && identity.rhythm_mode == RhythmMode::None && !double_voice {
            inst_flags |= INST_FLAG_BLANK;
        }

        let timing = ctx.timing_hints(index).unwrap_or_default();

        instrument_positions.push(instruments.len() as i32);
        instruments.push(InstrumentEntry {
            inst_id: index as u32,
            note_offset1: raw_a.fine_tune,
            note_offset2: raw_b.fine_tune,
            midi_velocity_offset: identity.velocity_offset,
            percussion_key_number: identity.note_number,
            inst_flags,
            second_voice_detune: identity.voice2_fine_tune_hz,
            fb_conn,
            ops,
            delay_on_ms: timing.on_ms,
            delay_off_ms: timing.off_ms,
        });
    }

    // Bank entries plus the (MSB, LSB)-keyed views.
    let mut banks: Vec<BankEntry> = Vec::new();
    let mut midi_banks: Vec<MidiBank> = Vec::new();
    for bank_id in ctx.bank_ids() {
        let setup = ctx.setups().get(bank_id).unwrap_or_default();
        let mut bank = BankEntry::new(bank_id, setup.setup_word());

        if let Some(assignments) = ctx.programs().bank_programs(bank_id) {
            for (&patch, &instrument) in assignments {
                if patch >= BANK_PATCH_SLOTS {
                    return Err(CompileError::PatchOutOfRange {
                        bank: bank_id,
                        patch,
                    });
                }
                let position = instrument_positions.get(instrument).copied().ok_or(
                    CompileError::UnknownInstrument {
                        bank: bank_id,
                        patch,
                        index: instrument,
                        known: instrument_positions.len(),
                    },
                )?;
                if patch < PERCUSSION_PATCH_BASE {
                    bank.melodic[patch as usize] = position;
                } else {
                    bank.percussion[(patch - PERCUSSION_PATCH_BASE) as usize] = position;
                }
            }
        }

        if bank.melodic.iter().any(|&slot| slot != NO_INDEX) {
            let (msb, lsb) = ctx
                .bank_select(bank_id)
                .unwrap_or(((bank_id >> 7) as u8 & 0x7F, (bank_id & 0x7F) as u8));
            let mut midi_bank = MidiBank::new(midi_banks.len() as u32, msb, lsb);
            midi_bank.instruments.copy_from_slice(&bank.melodic);
            midi_banks.push(midi_bank);
        }
        if bank.percussion.iter().any(|&slot| slot != NO_INDEX) {
            let mut midi_bank = MidiBank::new(
                midi_banks.len() as u32,
                PERCUSSION_BANK_MSB,
                (bank_id & 0x7F) as u8,
            );
            midi_bank.instruments.copy_from_slice(&bank.percussion);
            midi_banks.push(midi_bank);
        }

        banks.push(bank);
    }

    Ok(BanksDump {
        banks,
        midi_banks,
        instruments,
        operators,
    })
}

fn intern_operator(
    operators: &mut Vec<Operator>,
    seen: &mut BTreeMap<Operator, i32>,
    operator: Operator,
) -> i32 {
    if let Some(&position) = seen.get(&operator) {
        return position;
    }
    let position = operators.len() as i32;
    operators.push(operator);
    seen.insert(operator, position);
    position
}
