// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Bounded FIFO cache of recently created textures.
//
// Entries are `Tracked` values on the cache's own ledger, so an eviction is a
// drop and the ledger shows every evicted payload as released.

use std::collections::VecDeque;
use std::sync::Arc;

use malwerk_core::types::{EncodedTexture, ModelId, RunId};
use malwerk_rectify::{ResourceLedger, ResourceScope, Tracked};
use tracing::debug;

struct CachedTexture {
    run_id: RunId,
    model: ModelId,
    /// Held until evicted; dropping it releases the payload.
    _texture: Tracked<EncodedTexture>,
}

/// Keeps the last `capacity` textures, evicting the oldest-inserted first.
pub struct TextureCache {
    capacity: usize,
    entries: VecDeque<CachedTexture>,
    ledger: Arc<ResourceLedger>,
    scope: ResourceScope,
}

impl TextureCache {
    pub fn new(capacity: usize) -> Self {
        let ledger = ResourceLedger::new();
        let scope = ResourceScope::new(&ledger, "texture-cache");
        Self {
            capacity: capacity.max(1),
            entries: VecDeque::new(),
            ledger,
            scope,
        }
    }

    /// Insert a texture, returning the run id of the entry evicted to make room.
    pub fn insert(&mut self, run_id: RunId, model: ModelId, texture: EncodedTexture) -> Option<RunId> {
        let mut evicted = None;
        while self.entries.len() >= self.capacity {
            let Some(oldest) = self.entries.pop_front() else {
                break;
            };
            debug!(run_id = %oldest.run_id, model = %oldest.model, "Evicting cached texture");
            evicted = Some(oldest.run_id);
        }
        self.entries.push_back(CachedTexture {
            run_id,
            model,
            _texture: self.scope.track(texture),
        });
        evicted
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Allocation/release counts of every payload the cache has held.
    pub fn ledger(&self) -> &ResourceLedger {
        &self.ledger
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texture(tag: u8) -> EncodedTexture {
        EncodedTexture {
            bytes: vec![tag; 8],
            mime_type: "image/jpeg",
            width: 2,
            height: 2,
            digest: format!("{tag:02x}"),
        }
    }

    #[test]
    fn evicts_oldest_and_releases_it() {
        let mut cache = TextureCache::new(2);
        let model = ModelId::new("turtle-model");
        let runs: Vec<RunId> = (0..3).map(|_| RunId::new()).collect();

        assert_eq!(cache.insert(runs[0], model.clone(), texture(0)), None);
        assert_eq!(cache.insert(runs[1], model.clone(), texture(1)), None);
        assert_eq!(cache.insert(runs[2], model.clone(), texture(2)), Some(runs[0]));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.ledger().allocated(), 3);
        assert_eq!(cache.ledger().released(), 1);
    }

    #[test]
    fn clear_releases_everything() {
        let mut cache = TextureCache::new(4);
        for i in 0..3 {
            cache.insert(RunId::new(), ModelId::new("goku-model"), texture(i));
        }
        cache.clear();
        assert!(cache.is_empty());
        assert!(cache.ledger().is_balanced());
    }

}
