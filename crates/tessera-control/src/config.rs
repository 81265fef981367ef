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

//! Tunables for the sampler and the governor, loadable from RON.
//!
//! Every field has a default, so a config file only needs to name what it
//! changes:
//!
//! ```ron
//! (
//!     governor: (target_fps: 30.0),
//! )
//! ```

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Thresholds of the tier state machine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GovernorConfig {
    /// Frame rate the host aims for.
    pub target_fps: f64,
    /// Downgrade when `fps < target_fps * downgrade_ratio`.
    pub downgrade_ratio: f64,
    /// Arm an upgrade when `fps > target_fps * upgrade_ratio`.
    pub upgrade_ratio: f64,
    /// How long the upgrade condition must hold before it commits.
    pub upgrade_debounce_ms: u64,
    /// Capacity of the tier-change notification channel.
    /// If the buffer is full, new notifications are dropped.
    pub tier_event_buffer: usize,
}

impl Default for GovernorConfig {
    fn default() -> Self {
        Self {
            target_fps: 60.0,
            downgrade_ratio: 0.8,
            upgrade_ratio: 1.2,
            upgrade_debounce_ms: 5_000,
            tier_event_buffer: 64,
        }
    }
}

impl GovernorConfig {
    /// Frame rate below which the governor downgrades.
    pub fn downgrade_threshold(&self) -> f64 {
        self.target_fps * self.downgrade_ratio
    }

    /// Frame rate above which the governor arms an upgrade.
    pub fn upgrade_threshold(&self) -> f64 {
        self.target_fps * self.upgrade_ratio
    }
}

/// Shape of the rolling frame-time window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerConfig {
    /// Number of frame durations kept.
    pub window_capacity: usize,
    /// Samples needed before the window is trusted.
    pub warmup_samples: usize,
    /// Frame rate reported while warming up.
    pub default_fps: f64,
    /// Heap usage is read once every this many frames.
    pub memory_sample_interval: u32,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            window_capacity: 60,
            warmup_samples: 30,
            default_fps: 60.0,
            memory_sample_interval: 30,
        }
    }
}

impl SamplerConfig {
    /// The warm-up length actually used: it can never exceed the window.
    pub fn effective_warmup(&self) -> usize {
        self.warmup_samples.min(self.window_capacity)
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TesseraConfig {
    /// Tier state machine settings.
    pub governor: GovernorConfig,
    /// Frame sampler settings.
    pub sampler: SamplerConfig,
}

impl TesseraConfig {
    /// Parses and validates a RON document.
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a RON file.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config = Self::from_ron_str(&source)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        log::info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    /// Checks cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let governor = &self.governor;
        if !governor.target_fps.is_finite() || governor.target_fps <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "target_fps must be positive, got {}",
                governor.target_fps
            )));
        }
        let ordered = governor.downgrade_ratio.is_finite()
            && governor.upgrade_ratio.is_finite()
            && governor.downgrade_ratio < governor.upgrade_ratio;
        if !ordered {
            return Err(ConfigError::Invalid(format!(
                "downgrade_ratio ({}) must be below upgrade_ratio ({})",
                governor.downgrade_ratio, governor.upgrade_ratio
            )));
        }
        if governor.tier_event_buffer == 0 {
            return Err(ConfigError::Invalid(
                "tier_event_buffer must be at least 1".to_string(),
            ));
        }
        if self.sampler.window_capacity == 0 {
            return Err(ConfigError::Invalid(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Errors raised while reading a configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// The document is not valid RON for this schema.
    Parse(String),
    /// The document parsed but violates a constraint.
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(msg) => write!(f, "Failed to parse configuration: {msg}"),
            ConfigError::Invalid(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
