//! Compile statistics for surrounding tooling.

use serde::{Deserialize, Serialize};

use crate::tables::{CompileContext, PERCUSSION_PATCH_BASE};

/// Summary counters of one compilation pass.
///
/// Collected from a populated [`CompileContext`] so drivers can report
/// how much the deduplication actually folded without poking at the
/// registry internals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompileStats {
    /// Distinct raw register images.
    pub raw_entries: usize,
    /// Distinct instruments.
    pub instrument_entries: usize,
    /// Raw submissions folded onto an existing entry.
    pub merged_raw_submissions: usize,
    /// Instrument submissions folded onto an existing entry.
    pub merged_instrument_submissions: usize,
    /// Program assignments that replaced a different instrument.
    pub overwritten_assignments: usize,
    /// Banks referenced by either table.
    pub banks: usize,
    /// Assigned melodic program slots across all banks.
    pub melodic_assignments: usize,
    /// Assigned percussion key slots across all banks.
    pub percussion_assignments: usize,
}

impl CompileStats {
    /// Gathers the counters from a compilation context.
    pub fn collect(ctx: &CompileContext) -> Self {
        let registry = ctx.registry();
        let mut melodic_assignments = 0;
        let mut percussion_assignments = 0;
        for bank in ctx.programs().banks() {
            if let Some(assignments) = ctx.programs().bank_programs(bank) {
                for &patch in assignments.keys() {
                    if patch < PERCUSSION_PATCH_BASE {
                        melodic_assignments += 1;
                    } else {
                        percussion_assignments += 1;
                    }
                }
            }
        }
        Self {
            raw_entries: registry.raw_count(),
            instrument_entries: registry.instrument_count(),
            merged_raw_submissions: registry.merged_raw(),
            merged_instrument_submissions: registry.merged_instruments(),
            overwritten_assignments: ctx.overwritten_assignments(),
            banks: ctx.bank_ids().len(),
            melodic_assignments,
            percussion_assignments,
        }
    }

    /// Serializes the stats to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serializes the stats to pretty-printed JSON.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
