// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Known AR targets and the models they drive.

use std::collections::BTreeMap;

use malwerk_core::config::TargetBinding;
use malwerk_core::error::{MalwerkError, Result};
use malwerk_core::types::TargetId;

/// Lookup table from AR target id to its model binding.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    bindings: BTreeMap<TargetId, TargetBinding>,
}

impl TargetRegistry {
    pub fn new(bindings: &[TargetBinding]) -> Self {
        Self {
            bindings: bindings
                .iter()
                .map(|b| (b.target.clone(), b.clone()))
                .collect(),
        }
    }

    /// The binding for `target`, or `UnknownTarget`.
    pub fn resolve(&self, target: &TargetId) -> Result<&TargetBinding> {
        self.bindings
            .get(target)
            .ok_or_else(|| MalwerkError::UnknownTarget(target.to_string()))
    }

    pub fn ids(&self) -> impl Iterator<Item = &TargetId> {
        self.bindings.keys()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
