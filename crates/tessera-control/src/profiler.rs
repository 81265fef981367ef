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

//! One-shot hardware capability profiling.
//!
//! The profiler never fails. Every signal the host does not expose falls back
//! to a conservative default, and a missing graphics context degrades the
//! profile to the lowest GPU tier.

use serde::Serialize;
use tessera_core::platform::{HardwareProbe, PlatformHints, ThermalStatus};
use tessera_core::QualityTier;

/// Core count assumed when the host does not report one.
pub const DEFAULT_CORE_COUNT: u32 = 4;
/// Device memory (GiB) assumed when the host does not report it.
pub const DEFAULT_MEMORY_GIB: u32 = 4;
/// Texture size reported when no graphics context can be created.
pub const FALLBACK_MAX_TEXTURE_SIZE: u32 = 512;
/// Viewports at or below this width are treated as mobile.
pub const MOBILE_VIEWPORT_MAX_WIDTH: u32 = 768;

/// Below this texture size the GPU is low-end whatever its name says.
const LOW_END_TEXTURE_LIMIT: u32 = 2048;
/// From this texture size on the GPU is high-end whatever its name says.
const HIGH_END_TEXTURE_LIMIT: u32 = 8192;

const MOBILE_USER_AGENT_TOKENS: [&str; 8] = [
    "android",
    "webos",
    "iphone",
    "ipad",
    "ipod",
    "blackberry",
    "iemobile",
    "opera mini",
];
const IOS_USER_AGENT_TOKENS: [&str; 3] = ["iPad", "iPhone", "iPod"];

const LOW_END_GPUS: [&str; 8] = [
    "PowerVR",
    "Mali-400",
    "Mali-450",
    "Adreno 200",
    "Adreno 203",
    "Adreno 205",
    "Intel HD Graphics 3000",
    "Intel HD Graphics 4000",
];
const HIGH_END_GPUS: [&str; 11] = [
    "Adreno 6",
    "Adreno 7",
    "Mali-G7",
    "Mali-G5",
    "Apple A15",
    "Apple A14",
    "Apple A13",
    "GeForce RTX",
    "GeForce GTX 1060",
    "Radeon RX 5",
    "Radeon RX 6",
];

/// Coarse GPU capability class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GpuTier {
    /// Known low-end part, tiny texture limit, or no context at all.
    Low,
    /// Anything not positively identified.
    #[default]
    Medium,
    /// Known high-end part or a large texture limit.
    High,
}

/// Platform family flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PlatformFlags {
    /// Phone, tablet, or a narrow viewport.
    pub is_mobile: bool,
    /// Apple mobile device.
    pub is_ios: bool,
    /// Android device.
    pub is_android: bool,
}

/// Everything the governor knows about the host, computed once per session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapabilityProfile {
    /// Phone, tablet, or a narrow viewport.
    pub is_mobile: bool,
    /// Apple mobile device.
    pub is_ios: bool,
    /// Android device.
    pub is_android: bool,
    /// Classified GPU capability.
    pub gpu_tier: GpuTier,
    /// Renderer identifier, when a context could be created and exposed it.
    pub renderer: Option<String>,
    /// Installed memory in GiB, defaulted when unknown.
    pub device_memory_gib: u32,
    /// Logical CPU cores, defaulted when unknown.
    pub logical_core_count: u32,
    /// Largest 2D texture edge in texels.
    pub max_texture_size: u32,
    /// Battery charge, when exposed.
    pub battery_level_percent: Option<u8>,
    /// Thermal state, when exposed.
    pub thermal_state: Option<ThermalStatus>,
    /// Tier the governor starts in.
    pub initial_quality_tier: QualityTier,
}

/// Builds a [`CapabilityProfile`] from a [`HardwareProbe`].
#[derive(Debug)]
pub struct CapabilityProfiler<P> {
    probe: P,
}

impl<P: HardwareProbe> CapabilityProfiler<P> {
    /// Creates a profiler reading from `probe`.
    pub fn new(probe: P) -> Self {
        Self { probe }
    }

    /// Probes the host.
    ///
    /// This is a pure function of what the probe reports, so calling it again
    /// yields the same profile. Production code calls it once at startup.
    pub fn profile(&self) -> CapabilityProfile {
        let flags = detect_platform(&self.probe.platform_hints());

        let (gpu_tier, max_texture_size, renderer) = match self.probe.graphics_context() {
            Some(info) => {
                let tier = classify_gpu(&info.renderer, info.max_texture_size);
                let renderer = (!info.renderer.is_empty()).then_some(info.renderer);
                (tier, info.max_texture_size, renderer)
            }
            None => {
                log::warn!(
                    "No graphics context available, assuming a low-end GPU ({}px textures).",
                    FALLBACK_MAX_TEXTURE_SIZE
                );
                (GpuTier::Low, FALLBACK_MAX_TEXTURE_SIZE, None)
            }
        };

        let logical_core_count = known_or(self.probe.logical_core_count(), DEFAULT_CORE_COUNT);
        let device_memory_gib = known_or(self.probe.device_memory_gib(), DEFAULT_MEMORY_GIB);

        let initial_quality_tier =
            initial_tier(gpu_tier, logical_core_count, device_memory_gib, flags.is_mobile);

        let profile = CapabilityProfile {
            is_mobile: flags.is_mobile,
            is_ios: flags.is_ios,
            is_android: flags.is_android,
            gpu_tier,
            renderer,
            device_memory_gib,
            logical_core_count,
            max_texture_size,
            battery_level_percent: self.probe.battery_level_percent(),
            thermal_state: self.probe.thermal_state(),
            initial_quality_tier,
        };

        log::info!(
            "Capability profile: mobile={}, gpu={:?}, cores={}, memory={}GiB, max_texture={} -> starting at '{}'",
            profile.is_mobile,
            profile.gpu_tier,
            profile.logical_core_count,
            profile.device_memory_gib,
            profile.max_texture_size,
            profile.initial_quality_tier
        );
        profile
    }

    /// The probe this profiler reads from.
    pub fn probe(&self) -> &P {
        &self.probe
    }
}

/// A zero reading is as good as no reading.
fn known_or(value: Option<u32>, default: u32) -> u32 {
    value.filter(|&v| v > 0).unwrap_or(default)
}

/// Derives the platform family from user-agent, viewport and OS signals.
pub fn detect_platform(hints: &PlatformHints) -> PlatformFlags {
    let ua = hints.user_agent.as_deref().unwrap_or_default();
    let ua_lower = ua.to_ascii_lowercase();
    let os = hints.os.as_deref().map(str::to_ascii_lowercase);
    let os_is = |name: &str| os.as_deref() == Some(name);

    let is_ios = IOS_USER_AGENT_TOKENS.iter().any(|t| ua.contains(t)) || os_is("ios");
    let is_android = ua.contains("Android") || os_is("android");
    let is_mobile = MOBILE_USER_AGENT_TOKENS.iter().any(|t| ua_lower.contains(t))
        || hints
            .viewport_width
            .is_some_and(|w| w <= MOBILE_VIEWPORT_MAX_WIDTH)
        || is_ios
        || is_android;

    PlatformFlags {
        is_mobile,
        is_ios,
        is_android,
    }
}

/// Classifies a GPU from its renderer string, with the texture limit as an
/// override in both directions.
pub fn classify_gpu(renderer: &str, max_texture_size: u32) -> GpuTier {
    let by_name = if LOW_END_GPUS.iter().any(|gpu| renderer.contains(gpu)) {
        GpuTier::Low
    } else if HIGH_END_GPUS.iter().any(|gpu| renderer.contains(gpu)) {
        GpuTier::High
    } else {
        GpuTier::Medium
    };

    if max_texture_size < LOW_END_TEXTURE_LIMIT {
        GpuTier::Low
    } else if max_texture_size >= HIGH_END_TEXTURE_LIMIT {
        GpuTier::High
    } else {
        by_name
    }
}

/// Picks the starting tier. Mobile devices are held to lower memory and core
/// thresholds than desktops.
pub fn initial_tier(gpu: GpuTier, cores: u32, memory_gib: u32, is_mobile: bool) -> QualityTier {
    let (low_memory, high_cores, high_memory) = if is_mobile { (4, 6, 6) } else { (8, 8, 16) };

    if gpu == GpuTier::Low || cores < 4 || memory_gib < low_memory {
        QualityTier::Low
    } else if gpu == GpuTier::High && cores >= high_cores && memory_gib >= high_memory {
        QualityTier::High
    } else {
        QualityTier::Medium
    }
}

/// A deterministic [`HardwareProbe`] for tests and simulations.
pub mod testing {
    use tessera_core::platform::{GraphicsContextInfo, HardwareProbe, PlatformHints, ThermalStatus};

    /// A builder-style fake host. The default reports nothing at all, not
    /// even a graphics context.
    #[derive(Debug, Clone, Default)]
    pub struct FakeProbe {
        hints: PlatformHints,
        graphics: Option<GraphicsContextInfo>,
        cores: Option<u32>,
        memory_gib: Option<u32>,
        battery: Option<u8>,
        thermal: Option<ThermalStatus>,
    }

    impl FakeProbe {
        /// A host that exposes nothing.
        pub fn new() -> Self {
            Self::default()
        }

        /// A mid-range desktop: 8 cores, 16 GiB, a 4096px GPU.
        pub fn desktop() -> Self {
            Self::new()
                .os("linux")
                .viewport_width(1920)
                .renderer("Generic Desktop GPU", 4096)
                .cores(8)
                .memory_gib(16)
        }

        /// Sets the user-agent string.
        pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
            self.hints.user_agent = Some(ua.into());
            self
        }

        /// Sets the viewport width.
        pub fn viewport_width(mut self, width: u32) -> Self {
            self.hints.viewport_width = Some(width);
            self
        }

        /// Sets the OS identifier.
        pub fn os(mut self, os: impl Into<String>) -> Self {
            self.hints.os = Some(os.into());
            self
        }

        /// Makes a graphics context available with the given renderer.
        pub fn renderer(mut self, name: impl Into<String>, max_texture_size: u32) -> Self {
            self.graphics = Some(GraphicsContextInfo {
                renderer: name.into(),
                max_texture_size,
            });
            self
        }

        /// Removes the graphics context.
        pub fn without_graphics_context(mut self) -> Self {
            self.graphics = None;
            self
        }

        /// Sets the logical core count.
        pub fn cores(mut self, cores: u32) -> Self {
            self.cores = Some(cores);
            self
        }

        /// Sets the device memory.
        pub fn memory_gib(mut self, gib: u32) -> Self {
            self.memory_gib = Some(gib);
            self
        }

        /// Sets the battery level.
        pub fn battery(mut self, percent: u8) -> Self {
            self.battery = Some(percent);
            self
        }

        /// Sets the thermal state.
        pub fn thermal(mut self, status: ThermalStatus) -> Self {
            self.thermal = Some(status);
            self
        }
    }

    impl HardwareProbe for FakeProbe {
        fn platform_hints(&self) -> PlatformHints {
            self.hints.clone()
        }

        fn graphics_context(&self) -> Option<GraphicsContextInfo> {
            self.graphics.clone()
        }

        fn logical_core_count(&self) -> Option<u32> {
            self.cores
        }

        fn device_memory_gib(&self) -> Option<u32> {
            self.memory_gib
        }

        fn battery_level_percent(&self) -> Option<u8> {
            self.battery
        }

        fn thermal_state(&self) -> Option<ThermalStatus> {
            self.thermal
        }
    }
}
