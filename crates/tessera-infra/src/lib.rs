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


//! # Tessera Infra
//!
//! Production implementations of the probe contracts defined in
//! `tessera-core`: `sysinfo` for cores, memory, temperatures and the process
//! heap, `wgpu` for the graphics adapter.

#![warn(missing_docs)]

pub mod graphics;
pub mod native;
pub mod system;

pub use graphics::WgpuContextProbe;
pub use native::NativeHardwareProbe;
pub use system::{ProcessMemoryProbe, SysinfoProbe};
