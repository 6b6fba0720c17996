// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `sluice config` - Print the effective engine config

use anyhow::Result;
use sluice_core::EngineConfig;
use std::path::Path;

/// Load `path`, or the defaults when no file is given
pub fn load(path: Option<&Path>) -> Result<EngineConfig> {
    let config = match path {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };
    Ok(config)
}

pub fn show(config: &EngineConfig) -> Result<()> {
    print!("{}", toml::to_string(config)?);
    Ok(())
}
