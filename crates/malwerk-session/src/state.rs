// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Pipeline context — the single owner of session-wide mutable state.

use std::collections::BTreeMap;

use malwerk_core::config::TargetBinding;
use malwerk_core::types::{BoundTexture, CaptureStats, ModelId, PipelineStage, TargetId};

use crate::services::texture_cache::TextureCache;

/// Why a finished run must not be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Staleness {
    /// A newer capture (or a reset) started after this run.
    Superseded,
    /// The run's target is no longer the tracked one.
    TargetChanged,
}

/// Everything a capture session mutates, behind one lock.
pub struct PipelineContext {
    /// Current state-machine stage.
    pub stage: PipelineStage,
    /// Target currently reported by the AR tracker.
    active: Option<TargetBinding>,
    /// Bumped by every capture and reset; binds carrying an older value are stale.
    generation: u64,
    /// The texture bound to each model. One slot per model.
    slots: BTreeMap<ModelId, BoundTexture>,
    /// Recently created textures.
    pub cache: TextureCache,
    /// Capture outcome counters.
    pub stats: CaptureStats,
}

impl PipelineContext {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            stage: PipelineStage::Idle,
            active: None,
            generation: 0,
            slots: BTreeMap::new(),
            cache: TextureCache::new(cache_capacity),
            stats: CaptureStats::default(),
        }
    }

    pub fn active(&self) -> Option<&TargetBinding> {
        self.active.as_ref()
    }

    pub fn set_active(&mut self, binding: TargetBinding) {
        self.active = Some(binding);
    }

    /// Clear the active target if it is `target`. Returns whether it was.
    pub fn clear_active_if(&mut self, target: &TargetId) -> bool {
        if self.active.as_ref().is_some_and(|b| &b.target == target) {
            self.active = None;
            true
        } else {
            false
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Start a new generation, invalidating any bind still in flight.
    pub fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    /// Whether a run started at `generation` for `target` may still bind.
    pub fn staleness(&self, generation: u64, target: &TargetId) -> Option<Staleness> {
        if generation != self.generation {
            return Some(Staleness::Superseded);
        }
        match &self.active {
            Some(binding) if &binding.target == target => None,
            _ => Some(Staleness::TargetChanged),
        }
    }

    /// Move the stage of run `generation` forward. Stale runs cannot touch it.
    pub fn advance(&mut self, generation: u64, stage: PipelineStage) {
        if generation == self.generation {
            self.stage = stage;
        }
    }

    pub fn slot(&self, model: &ModelId) -> Option<&BoundTexture> {
        self.slots.get(model)
    }

    /// Put `bound` into its model's slot, returning the texture it displaced.
    pub fn replace_slot(&mut self, bound: BoundTexture) -> Option<BoundTexture> {
        self.slots.insert(bound.model.clone(), bound)
    }

    pub fn take_slot(&mut self, model: &ModelId) -> Option<BoundTexture> {
        self.slots.remove(model)
    }

    /// Empty every slot, e.g. on shutdown.
    pub fn drain_slots(&mut self) -> Vec<BoundTexture> {
        std::mem::take(&mut self.slots).into_values().collect()
    }
}
