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

//! Provides abstractions over the host platform's capability APIs.
//!
//! The governor never talks to the operating system or the graphics driver
//! directly. It reads everything through [`HardwareProbe`] and [`MemoryProbe`],
//! whose production implementations live in `tessera-infra` and whose fakes
//! live next to the code that consumes them.

use serde::{Deserialize, Serialize};

/// Represents the thermal state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ThermalStatus {
    /// Device is running cool ("nominal").
    #[default]
    Cool,
    /// Device is warming up but within normal bounds ("fair").
    Warm,
    /// Device is actively throttling performance to shed heat ("serious").
    Throttling,
    /// Device is at critical temperature, emergency measures required.
    Critical,
}

/// Environment signals used to detect the platform family.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformHints {
    /// User-agent string, when the host is a browser-like environment.
    pub user_agent: Option<String>,
    /// Current viewport width in CSS/logical pixels.
    pub viewport_width: Option<u32>,
    /// Operating system identifier (e.g. `"android"`, `"ios"`, `"linux"`).
    pub os: Option<String>,
}

/// What could be read from an offscreen rendering context.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GraphicsContextInfo {
    /// Renderer identifier string. Empty when the driver hides it.
    pub renderer: String,
    /// Largest supported 2D texture edge, in texels.
    pub max_texture_size: u32,
}

/// Trait for one-shot capability probing of the host.
///
/// Every method is best-effort: returning `None` means "not exposed by this
/// platform", never "error". Implementations must release any transient probe
/// objects (contexts, adapters) before returning.
pub trait HardwareProbe {
    /// Returns user-agent, viewport and OS signals.
    fn platform_hints(&self) -> PlatformHints;
    /// Creates an offscreen rendering context and reads it, or `None` when no
    /// context can be created.
    fn graphics_context(&self) -> Option<GraphicsContextInfo>;
    /// Number of logical CPU cores.
    fn logical_core_count(&self) -> Option<u32>;
    /// Installed device memory, in GiB.
    fn device_memory_gib(&self) -> Option<u32>;
    /// Battery charge, in percent.
    fn battery_level_percent(&self) -> Option<u8>;
    /// Current thermal state.
    fn thermal_state(&self) -> Option<ThermalStatus>;
}

/// Trait for opportunistic heap statistics.
pub trait MemoryProbe: Send {
    /// Heap bytes currently in use by the application, if the host exposes it.
    fn heap_usage_bytes(&mut self) -> Option<u64>;
}
