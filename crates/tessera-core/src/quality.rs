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

//! Quality tiers and the static rendering settings attached to each of them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The unit of rendering-cost granularity.
///
/// Tiers are totally ordered: `Low < Medium < High`. The derive order of the
/// variants is what defines that ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    /// Cheapest settings; the floor of every downgrade sequence.
    #[default]
    Low,
    /// Balanced settings.
    Medium,
    /// Full quality.
    High,
}

impl QualityTier {
    /// All tiers, from cheapest to most expensive.
    pub const ALL: [QualityTier; 3] = [QualityTier::Low, QualityTier::Medium, QualityTier::High];

    /// The next cheaper tier, or `None` at `Low`.
    pub fn lower(self) -> Option<Self> {
        match self {
            QualityTier::Low => None,
            QualityTier::Medium => Some(QualityTier::Low),
            QualityTier::High => Some(QualityTier::Medium),
        }
    }

    /// The next more expensive tier, or `None` at `High`.
    pub fn higher(self) -> Option<Self> {
        match self {
            QualityTier::Low => Some(QualityTier::Medium),
            QualityTier::Medium => Some(QualityTier::High),
            QualityTier::High => None,
        }
    }

    /// Returns the static settings record for this tier.
    pub fn settings(self) -> &'static QualitySettings {
        match self {
            QualityTier::Low => &LOW_SETTINGS,
            QualityTier::Medium => &MEDIUM_SETTINGS,
            QualityTier::High => &HIGH_SETTINGS,
        }
    }

    /// Lowercase name of the tier, as used in logs and reports.
    pub fn as_str(self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rendering budget that applies while a tier is active.
///
/// Every numeric field is non-decreasing from `Low` to `High`. Consumers get
/// these records by shared reference and must treat them as read-only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualitySettings {
    /// Maximum number of live particles.
    pub particle_count: u32,
    /// Edge length of the shadow map, in texels.
    pub shadow_map_resolution: u32,
    /// Maximum number of dynamic lights.
    pub light_budget: u32,
    /// Allowed device pixel ratio as `(min, max)`.
    pub device_pixel_ratio_range: (f32, f32),
    /// Whether post-processing passes run at all.
    pub enable_post_processing: bool,
    /// Whether shadow maps are rendered.
    pub enable_shadows: bool,
    /// Bloom strength when post-processing is enabled.
    pub bloom_intensity: f32,
    /// Detail factor passed to the procedural geometry builders.
    pub geometry_detail: f32,
}

static LOW_SETTINGS: QualitySettings = QualitySettings {
    particle_count: 500,
    shadow_map_resolution: 512,
    light_budget: 2,
    device_pixel_ratio_range: (1.0, 1.0),
    enable_post_processing: false,
    enable_shadows: false,
    bloom_intensity: 0.5,
    geometry_detail: 0.5,
};

static MEDIUM_SETTINGS: QualitySettings = QualitySettings {
    particle_count: 1000,
    shadow_map_resolution: 1024,
    light_budget: 4,
    device_pixel_ratio_range: (1.0, 1.5),
    enable_post_processing: true,
    enable_shadows: true,
    bloom_intensity: 1.0,
    geometry_detail: 1.0,
};

static HIGH_SETTINGS: QualitySettings = QualitySettings {
    particle_count: 2000,
    shadow_map_resolution: 2048,
    light_budget: 6,
    device_pixel_ratio_range: (1.0, 2.0),
    enable_post_processing: true,
    enable_shadows: true,
    bloom_intensity: 1.5,
    geometry_detail: 1.5,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tiers_are_totally_ordered() {
        assert!(QualityTier::Low < QualityTier::Medium);
        assert!(QualityTier::Medium < QualityTier::High);
        let mut tiers = vec![QualityTier::High, QualityTier::Low, QualityTier::Medium];
        tiers.sort();
        assert_eq!(tiers, QualityTier::ALL.to_vec());
    }

    #[test]
    fn test_lower_and_higher_step_by_one() {
        assert_eq!(QualityTier::High.lower(), Some(QualityTier::Medium));
        assert_eq!(QualityTier::Medium.lower(), Some(QualityTier::Low));
        assert_eq!(QualityTier::Low.lower(), None);
        assert_eq!(QualityTier::Low.higher(), Some(QualityTier::Medium));
        assert_eq!(QualityTier::High.higher(), None);
    }

    #[test]
    fn test_numeric_settings_are_monotonic() {
        for pair in QualityTier::ALL.windows(2) {
            let (lo, hi) = (pair[0].settings(), pair[1].settings());
            assert!(lo.particle_count <= hi.particle_count);
            assert!(lo.shadow_map_resolution <= hi.shadow_map_resolution);
            assert!(lo.light_budget <= hi.light_budget);
            assert!(lo.device_pixel_ratio_range.0 <= hi.device_pixel_ratio_range.0);
            assert!(lo.device_pixel_ratio_range.1 <= hi.device_pixel_ratio_range.1);
            assert!(lo.bloom_intensity <= hi.bloom_intensity);
            assert!(lo.geometry_detail <= hi.geometry_detail);
        }
    }

    #[test]
    fn test_low_tier_disables_expensive_passes() {
        let low = QualityTier::Low.settings();
        assert!(!low.enable_shadows);
        assert!(!low.enable_post_processing);
    }

    #[test]
    fn test_tier_displays_lowercase() {
        assert_eq!(QualityTier::Medium.to_string(), "medium");
    }
}
