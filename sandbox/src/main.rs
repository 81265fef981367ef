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


//! Runs the governor against a synthetic render loop.
//!
//! Frame times come from a simple cost model: each tier has a base cost,
//! scaled by how fast the simulated device is, plus an extra load during
//! the middle third of the run. The clock is simulated, so a long run
//! finishes instantly.

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tessera_control::profiler::testing::FakeProbe;
use tessera_control::{AdaptiveRenderContext, CapabilityProfile, CapabilityProfiler, TesseraConfig};
use tessera_core::{Clock, ManualClock, QualityTier};
use tessera_data::ShapeKind;
use tessera_infra::{NativeHardwareProbe, ProcessMemoryProbe};
use tessera_telemetry::{init_logging, summary_line, to_json, write_json, TelemetryService};

/// The shapes the simulated scene draws every frame.
const SCENE: [(ShapeKind, f32); 4] = [
    (ShapeKind::Sphere, 1.0),
    (ShapeKind::TorusKnot, 0.8),
    (ShapeKind::Ribbon, 0.2),
    (ShapeKind::Dodecahedron, 0.6),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Device {
    /// A budget Android phone.
    Phone,
    /// A gaming desktop.
    Desktop,
    /// The machine running the sandbox.
    Native,
}

#[derive(Debug, Parser)]
#[command(about = "Drive the adaptive quality governor with a simulated render loop")]
struct Args {
    /// RON configuration file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Which host to profile.
    #[arg(long, value_enum, default_value_t = Device::Desktop)]
    device: Device,

    /// Simulated run length, in seconds.
    #[arg(long, default_value_t = 30)]
    seconds: u32,

    /// Extra milliseconds per frame during the middle third of the run.
    #[arg(long, default_value_t = 20.0)]
    spike_ms: f64,

    /// Write the final diagnostics here instead of printing them.
    #[arg(long)]
    diagnostics: Option<PathBuf>,
}

fn profile_for(device: Device) -> CapabilityProfile {
    match device {
        Device::Phone => CapabilityProfiler::new(
            FakeProbe::new()
                .user_agent("Mozilla/5.0 (Linux; Android 10; Redmi 8)")
                .viewport_width(393)
                .renderer("Adreno (TM) 505", 4096)
                .cores(8)
                .memory_gib(4),
        )
        .profile(),
        Device::Desktop => CapabilityProfiler::new(
            FakeProbe::desktop()
                .renderer("NVIDIA GeForce RTX 3070", 16384)
                .memory_gib(32),
        )
        .profile(),
        Device::Native => {
            CapabilityProfiler::new(NativeHardwareProbe::new().with_viewport_width(1920)).profile()
        }
    }
}

/// Milliseconds one frame takes at `tier` on `device`.
fn frame_cost_ms(device: Device, tier: QualityTier, extra_ms: f64) -> f64 {
    let base = match tier {
        QualityTier::Low => 6.0,
        QualityTier::Medium => 11.0,
        QualityTier::High => 16.0,
    };
    let speed = match device {
        Device::Phone => 2.2,
        Device::Desktop | Device::Native => 0.9,
    };
    base * speed + extra_ms
}

fn main() -> Result<()> {
    init_logging("info");
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => TesseraConfig::load(path)?,
        None => TesseraConfig::default(),
    };

    let profile = profile_for(args.device);
    let clock = ManualClock::new();
    let (context, tier_rx) = AdaptiveRenderContext::new(profile, &config, Arc::new(clock.clone()));
    let mut context = match args.device {
        Device::Native => context.with_memory_probe(Box::new(ProcessMemoryProbe::new())),
        Device::Phone | Device::Desktop => context,
    };
    let mut telemetry = TelemetryService::new(tier_rx, 64, Duration::from_secs(5));

    let run_ms = f64::from(args.seconds) * 1000.0;
    let spike = (run_ms / 3.0)..(2.0 * run_ms / 3.0);

    while clock.now_ms() < run_ms {
        for (kind, radius) in SCENE {
            context
                .shape(kind, radius)
                .with_context(|| format!("Failed to build {kind}"))?;
        }

        let extra = if spike.contains(&clock.now_ms()) { args.spike_ms } else { 0.0 };
        clock.advance_ms(frame_cost_ms(args.device, context.current_tier(), extra));
        context.on_frame();

        if let Some(diagnostics) = telemetry.tick(clock.now_ms(), &context) {
            log::info!("{}", summary_line(&diagnostics));
        }
    }

    // Pick up changes from the final frames.
    telemetry.tick(f64::INFINITY, &context);
    for change in telemetry.history().iter() {
        println!(
            "{:>9.0} ms  {} -> {}  ({:?})",
            change.at_ms, change.from, change.to, change.reason
        );
    }

    let diagnostics = context.diagnostics();
    match &args.diagnostics {
        Some(path) => write_json(path, &diagnostics)?,
        None => println!("{}", to_json(&diagnostics)?),
    }
    Ok(())
}
