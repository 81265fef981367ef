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


use tessera_control::{CapabilityProfiler, GpuTier};
use tessera_core::QualityTier;
use tessera_infra::NativeHardwareProbe;

#[test]
fn test_headless_native_profile_falls_back_to_low() {
    let profiler = CapabilityProfiler::new(NativeHardwareProbe::new().without_graphics());
    let profile = profiler.profile();

    assert_eq!(profile.gpu_tier, GpuTier::Low);
    assert_eq!(profile.renderer, None);
    assert_eq!(profile.max_texture_size, 512);
    assert_eq!(profile.initial_quality_tier, QualityTier::Low);
    assert!(profile.logical_core_count >= 1);
    assert!(profile.device_memory_gib >= 1);
}

#[test]
fn test_narrow_native_window_counts_as_mobile() {
    let probe = NativeHardwareProbe::new()
        .without_graphics()
        .with_viewport_width(600);
    assert!(CapabilityProfiler::new(probe).profile().is_mobile);
}
