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


//! The hardware probe used by native hosts.

use crate::graphics::WgpuContextProbe;
use crate::system::SysinfoProbe;
use tessera_core::platform::{GraphicsContextInfo, HardwareProbe, PlatformHints, ThermalStatus};

/// Combines [`SysinfoProbe`] and [`WgpuContextProbe`] behind [`HardwareProbe`].
///
/// The OS comes from the compile target. Native hosts have no user agent,
/// and the viewport is only known once the host has opened its window, so
/// both are optional.
pub struct NativeHardwareProbe {
    system: SysinfoProbe,
    graphics: Option<WgpuContextProbe>,
    hints: PlatformHints,
}

impl NativeHardwareProbe {
    /// Creates a probe that queries the system and the graphics adapter.
    pub fn new() -> Self {
        Self {
            system: SysinfoProbe::new(),
            graphics: Some(WgpuContextProbe::new()),
            hints: PlatformHints {
                user_agent: None,
                viewport_width: None,
                os: Some(std::env::consts::OS.to_string()),
            },
        }
    }

    /// Reports the width of the host's window.
    pub fn with_viewport_width(mut self, width: u32) -> Self {
        self.hints.viewport_width = Some(width);
        self
    }

    /// Reports a user-agent string, for hosts that embed a web view.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.hints.user_agent = Some(user_agent.into());
        self
    }

    /// Skips the adapter query, as if no context could be created.
    pub fn without_graphics(mut self) -> Self {
        self.graphics = None;
        self
    }
}

impl Default for NativeHardwareProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareProbe for NativeHardwareProbe {
    fn platform_hints(&self) -> PlatformHints {
        self.hints.clone()
    }

    fn graphics_context(&self) -> Option<GraphicsContextInfo> {
        self.graphics.as_ref()?.read()
    }

    fn logical_core_count(&self) -> Option<u32> {
        self.system.logical_core_count()
    }

    fn device_memory_gib(&self) -> Option<u32> {
        self.system.device_memory_gib()
    }

    fn battery_level_percent(&self) -> Option<u8> {
        // sysinfo does not expose batteries.
        None
    }

    fn thermal_state(&self) -> Option<ThermalStatus> {
        self.system.thermal_state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_carry_target_os_and_host_values() {
        let probe = NativeHardwareProbe::new()
            .without_graphics()
            .with_viewport_width(1280)
            .with_user_agent("TesseraHost/1.0");
        let hints = probe.platform_hints();
        assert_eq!(hints.os.as_deref(), Some(std::env::consts::OS));
        assert_eq!(hints.viewport_width, Some(1280));
        assert_eq!(hints.user_agent.as_deref(), Some("TesseraHost/1.0"));
    }

    #[test]
    fn test_without_graphics_reports_no_context() {
        let probe = NativeHardwareProbe::new().without_graphics();
        assert_eq!(probe.graphics_context(), None);
        assert_eq!(probe.battery_level_percent(), None);
    }
}
