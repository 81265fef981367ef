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

//! # Tessera Core
//!
//! Foundational crate containing the shared vocabulary of the adaptive
//! rendering governor: math primitives used by the geometry pipeline, the
//! static quality-tier presets, the host probe contracts and the injectable
//! clock.

#![warn(missing_docs)]

pub mod math;
pub mod platform;
pub mod quality;
pub mod time;

pub use quality::{QualitySettings, QualityTier};
pub use time::{Clock, ManualClock, SystemClock};
