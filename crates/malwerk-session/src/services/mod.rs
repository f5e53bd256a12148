// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Service layer — bridges hosts (AR shell, CLI) to the rectification crates.

pub mod capture_session;
pub mod data_dir;
pub mod targets;
pub mod texture_cache;
