//! Counters for tuning presets and diagnosing missed effects

use std::collections::BTreeMap;

use serde::Serialize;

use crate::trigger::{TriggerKind, TriggerResult};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DirectorStats {
    /// Every evaluation outcome, successes included
    pub results: BTreeMap<TriggerResult, u64>,
    pub fired: BTreeMap<TriggerKind, u64>,
    pub frames: u64,
    pub absorbed_faults: u64,
    pub fatal_resets: u64,
    /// Death notifications skipped because the kill was already handled
    pub deduplicated_deaths: u64,
}

impl DirectorStats {
    pub fn record_result(&mut self, result: TriggerResult) {
        *self.results.entry(result).or_insert(0) += 1;
    }

    pub fn record_fired(&mut self, kind: TriggerKind) {
        *self.fired.entry(kind).or_insert(0) += 1;
    }

    pub fn result_count(&self, result: TriggerResult) -> u64 {
        self.results.get(&result).copied().unwrap_or(0)
    }

    pub fn fired_count(&self, kind: TriggerKind) -> u64 {
        self.fired.get(&kind).copied().unwrap_or(0)
    }

    pub fn total_fired(&self) -> u64 {
        self.fired.values().sum()
    }
}
