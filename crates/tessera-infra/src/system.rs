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


//! sysinfo-based readings of the host machine and of the current process.

use std::sync::{Mutex, PoisonError};
use sysinfo::{Components, Pid, ProcessesToUpdate, System};
use tessera_core::platform::{MemoryProbe, ThermalStatus};

const BYTES_PER_GIB: f64 = 1024.0 * 1024.0 * 1024.0;

/// Reads CPU, memory and temperature information through `sysinfo`.
pub struct SysinfoProbe {
    system: Mutex<System>,
}

impl SysinfoProbe {
    /// Creates a probe with CPU and memory information already loaded.
    pub fn new() -> Self {
        let mut system = System::new();
        system.refresh_cpu_all();
        system.refresh_memory();
        Self {
            system: Mutex::new(system),
        }
    }

    /// Number of logical cores, `None` when sysinfo sees no CPU.
    pub fn logical_core_count(&self) -> Option<u32> {
        let system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        match system.cpus().len() {
            0 => None,
            count => u32::try_from(count).ok(),
        }
    }

    /// Installed memory rounded to the nearest GiB.
    pub fn device_memory_gib(&self) -> Option<u32> {
        let mut system = self.system.lock().unwrap_or_else(PoisonError::into_inner);
        system.refresh_memory();
        let gib = (system.total_memory() as f64 / BYTES_PER_GIB).round();
        if gib >= 1.0 {
            Some(gib as u32)
        } else {
            None
        }
    }

    /// Thermal state derived from the hottest CPU sensor.
    pub fn thermal_state(&self) -> Option<ThermalStatus> {
        let components = Components::new_with_refreshed_list();
        let mut max_temp = 0.0;

        for component in &components {
            let label = component.label().to_lowercase();
            if label.contains("cpu") || label.contains("core") {
                if let Some(temp) = component.temperature() {
                    max_temp = f32::max(max_temp, temp);
                }
            }
        }

        if max_temp > 0.0 {
            Some(classify_temperature(max_temp))
        } else {
            // No readable sensor.
            None
        }
    }
}

impl Default for SysinfoProbe {
    fn default() -> Self {
        Self::new()
    }
}

/// Maps a CPU temperature in degrees Celsius to a thermal state.
pub fn classify_temperature(celsius: f32) -> ThermalStatus {
    if celsius > 90.0 {
        ThermalStatus::Critical
    } else if celsius > 80.0 {
        ThermalStatus::Throttling
    } else if celsius > 60.0 {
        ThermalStatus::Warm
    } else {
        ThermalStatus::Cool
    }
}

/// Resident memory of the current process, read through `sysinfo`.
pub struct ProcessMemoryProbe {
    system: System,
    pid: Option<Pid>,
}

impl ProcessMemoryProbe {
    /// Creates a probe for the calling process.
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                log::warn!("Process memory unavailable: {e}");
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }
}

impl Default for ProcessMemoryProbe {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryProbe for ProcessMemoryProbe {
    fn heap_usage_bytes(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system
            .refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
        self.system.process(pid).map(|process| process.memory())
    }
}
