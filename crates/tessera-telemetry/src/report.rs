// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


//! Diagnostics export.

use anyhow::{Context as _, Result};
use std::path::Path;
use tessera_control::RenderDiagnostics;

/// Serializes the diagnostics as pretty-printed JSON.
pub fn to_json(diagnostics: &RenderDiagnostics) -> Result<String> {
    serde_json::to_string_pretty(diagnostics).context("Failed to serialize render diagnostics")
}

/// Writes the diagnostics as JSON to `path`, replacing any existing file.
pub fn write_json(path: impl AsRef<Path>, diagnostics: &RenderDiagnostics) -> Result<()> {
    let path = path.as_ref();
    let json = to_json(diagnostics)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write diagnostics to {}", path.display()))?;
    log::info!("Diagnostics written to {}", path.display());
    Ok(())
}

/// One-line human summary, suitable for a periodic log line.
pub fn summary_line(diagnostics: &RenderDiagnostics) -> String {
    let governor = &diagnostics.governor;
    let geometry = &diagnostics.geometry;
    let mut line = format!(
        "tier={} fps={:.1} throttled={} geometries={} hit_rate={} geometry_memory={}",
        governor.state.current_tier,
        diagnostics.performance.fps,
        governor.state.is_throttled,
        geometry.cache_size,
        geometry.cache_hit_rate,
        geometry.total_memory_usage,
    );
    if let Some(mb) = diagnostics.performance.memory_usage_mb {
        line.push_str(&format!(" heap={mb:.1}MB"));
    }
    if governor.state.pending_upgrade_deadline.is_some() {
        line.push_str(" upgrade=pending");
    }
    line
}
