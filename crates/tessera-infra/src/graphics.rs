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


//! Graphics adapter queries through wgpu.

use anyhow::{anyhow, Result};
use tessera_core::platform::GraphicsContextInfo;
use wgpu::{Instance, InstanceDescriptor, PowerPreference, RequestAdapterOptions};

/// Reads the renderer name and texture limits of the preferred adapter.
///
/// No surface is created; the adapter is dropped as soon as it has been read.
#[derive(Debug, Clone, Copy, Default)]
pub struct WgpuContextProbe;

impl WgpuContextProbe {
    /// Creates the probe.
    pub fn new() -> Self {
        Self
    }

    /// Requests an adapter and reads it, or explains why that failed.
    pub fn try_read(&self) -> Result<GraphicsContextInfo> {
        let instance = Instance::new(InstanceDescriptor::new_without_display_handle());
        let adapter = pollster::block_on(instance.request_adapter(&RequestAdapterOptions {
            power_preference: PowerPreference::HighPerformance,
            compatible_surface: None,
            force_fallback_adapter: false,
        }))
        .map_err(|e| anyhow!("Failed to find a graphics adapter: {}", e))?;

        let info = adapter.get_info();
        let limits = adapter.limits();
        log::debug!(
            "Graphics adapter '{}' ({:?}), max texture {}",
            info.name,
            info.backend,
            limits.max_texture_dimension_2d
        );
        Ok(GraphicsContextInfo {
            renderer: info.name,
            max_texture_size: limits.max_texture_dimension_2d,
        })
    }

    /// Like [`try_read`](Self::try_read), logging the failure instead.
    pub fn read(&self) -> Option<GraphicsContextInfo> {
        match self.try_read() {
            Ok(info) => Some(info),
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }
}
