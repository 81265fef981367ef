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

//! # Tessera Control
//!
//! The adaptive loop of the governor:
//!
//! 1. [`CapabilityProfiler`] probes the host once and picks a starting tier.
//! 2. [`PerformanceSampler`] turns per-frame timestamps into rolling snapshots.
//! 3. [`QualityGovernor`] moves the tier down immediately and up only after a
//!    debounce window.
//!
//! [`AdaptiveRenderContext`] wires the three together with a geometry cache so
//! a render loop only has to call `on_frame` and read the active settings.

#![warn(missing_docs)]

pub mod config;
pub mod governor;
pub mod metrics;
pub mod profiler;
pub mod service;

pub use config::{ConfigError, GovernorConfig, SamplerConfig, TesseraConfig};
pub use governor::{GovernorDiagnostics, GovernorState, QualityGovernor, TierChange, TierChangeReason};
pub use metrics::{PerformanceSampler, PerformanceSnapshot, RingBuffer};
pub use profiler::{CapabilityProfile, CapabilityProfiler, GpuTier};
pub use service::{AdaptiveRenderContext, RenderDiagnostics};
