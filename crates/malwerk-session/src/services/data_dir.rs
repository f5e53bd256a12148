// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Platform-aware location of the CLI's settings file.

use std::path::{Path, PathBuf};

/// Settings directory for the CLI. Nothing is created here; writers such as
/// `PipelineConfig::save` create it when they first need it.
///
/// On mobile the AR shell supplies its own configuration and never calls this.
pub fn data_dir() -> PathBuf {
    data_dir_in(&base_dir())
}

fn data_dir_in(base: &Path) -> PathBuf {
    base.join("malwerk")
}

/// Default location of the pipeline configuration file.
pub fn config_path() -> PathBuf {
    config_path_in(&data_dir())
}

pub fn config_path_in(dir: &Path) -> PathBuf {
    dir.join("config.json")
}

/// `$XDG_DATA_HOME`, else `~/.local/share`, else the temp dir. Empty
/// variables count as unset.
fn base_dir() -> PathBuf {
    let non_empty = |key: &str| std::env::var_os(key).filter(|v| !v.is_empty());
    non_empty("XDG_DATA_HOME")
        .map(PathBuf::from)
        .or_else(|| non_empty("HOME").map(|home| PathBuf::from(home).join(".local/share")))
        .unwrap_or_else(std::env::temp_dir)
}
