// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Thread-safe registry of looping sequences.

use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::{Event, Sequence, SequenceId};

/// Sequences keyed by id, shared between producers and the scheduler thread.
///
/// Expansion runs under the same lock as registration, so a sequence is
/// either fully expanded for a restart or not at all.
#[derive(Debug, Default)]
pub struct SequenceRegistry {
    sequences: Mutex<HashMap<SequenceId, Sequence>>,
    next_id: AtomicU64,
}

impl SequenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a sequence, generating an id when none is given
    pub fn insert(&self, sequence: Sequence, id: Option<SequenceId>) -> SequenceId {
        let mut sequences = self.lock();
        let id = id.unwrap_or_else(|| loop {
            let n = self.next_id.fetch_add(1, Ordering::Relaxed) + 1;
            let candidate = SequenceId::new(format!("seq-{}", n));
            if !sequences.contains_key(&candidate) {
                break candidate;
            }
        });
        sequences.insert(id.clone(), sequence);
        id
    }

    /// Unregister a sequence
    pub fn remove(&self, id: &SequenceId) -> Option<Sequence> {
        self.lock().remove(id)
    }

    /// Mutate a registered sequence in place. Returns `None` if the id is unknown.
    pub fn update<R>(&self, id: &SequenceId, f: impl FnOnce(&mut Sequence) -> R) -> Option<R> {
        self.lock().get_mut(id).map(f)
    }

    /// Copy of a registered sequence
    pub fn get(&self, id: &SequenceId) -> Option<Sequence> {
        self.lock().get(id).cloned()
    }

    /// Registered ids, sorted
    pub fn ids(&self) -> Vec<SequenceId> {
        let mut ids: Vec<_> = self.lock().keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Distinct channels used by registered sequences
    pub fn channels(&self) -> BTreeSet<u8> {
        self.lock().values().map(|s| s.channel()).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Expand every sequence that restarts at `tick`.
    ///
    /// Sequences are visited in id order so simultaneous restarts produce a
    /// deterministic event order.
    pub fn expand_restarts(&self, tick: u64, ppqn: u32) -> Vec<Event> {
        let sequences = self.lock();
        let mut ids: Vec<_> = sequences
            .iter()
            .filter(|(_, seq)| seq.restarts_at(tick, ppqn))
            .map(|(id, _)| id)
            .collect();
        ids.sort();

        ids.into_iter()
            .flat_map(|id| sequences[id].expand(tick, ppqn))
            .collect()
    }

    /// One line per sequence: `id: S(...)`
    pub fn describe(&self) -> String {
        let sequences = self.lock();
        let mut ids: Vec<_> = sequences.keys().collect();
        ids.sort();
        ids.into_iter()
            .map(|id| format!("{}: {}", id, sequences[id]))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<SequenceId, Sequence>> {
        self.sequences
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
