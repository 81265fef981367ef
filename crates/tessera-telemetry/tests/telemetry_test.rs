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


use std::sync::Arc;
use std::time::Duration;
use tessera_control::profiler::testing::FakeProbe;
use tessera_control::{AdaptiveRenderContext, CapabilityProfiler, TesseraConfig};
use tessera_core::{Clock, ManualClock, QualityTier};
use tessera_data::ShapeKind;
use tessera_telemetry::{summary_line, to_json, write_json, TelemetryService};

fn high_end_context() -> (AdaptiveRenderContext, TelemetryService, ManualClock) {
    let profile = CapabilityProfiler::new(
        FakeProbe::desktop()
            .renderer("NVIDIA GeForce RTX 4080", 16384)
            .memory_gib(32),
    )
    .profile();
    let clock = ManualClock::new();
    let (context, rx) =
        AdaptiveRenderContext::new(profile, &TesseraConfig::default(), Arc::new(clock.clone()));
    let telemetry = TelemetryService::new(rx, 16, Duration::from_secs(1));
    (context, telemetry, clock)
}

// ── Service ──

#[test]
fn test_tick_records_downgrades_and_reports_on_interval() {
    let (mut context, mut telemetry, clock) = high_end_context();
    assert_eq!(context.current_tier(), QualityTier::High);

    let mut reports = 0;
    for _ in 0..200 {
        clock.advance_ms(50.0);
        context.on_frame();
        if telemetry.tick(clock.now_ms(), &context).is_some() {
            reports += 1;
        }
    }

    // 200 frames of 50 ms span ten seconds: one report per second.
    assert_eq!(reports, 10);
    let history = telemetry.history();
    assert_eq!(history.downgrades(), 2);
    assert_eq!(history.last().map(|c| c.to), Some(QualityTier::Low));
}

// ── Reports ──

#[test]
fn test_json_report_exposes_every_section() {
    let (mut context, _telemetry, _clock) = high_end_context();
    context.shape(ShapeKind::Sphere, 1.0).unwrap();
    context.shape(ShapeKind::Sphere, 1.0).unwrap();

    let json = to_json(&context.diagnostics()).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["governor"]["current_tier"], "high");
    assert_eq!(value["governor"]["target_fps"], 60.0);
    assert_eq!(value["geometry"]["cache_size"], 1);
    assert_eq!(value["geometry"]["cache_hit_rate"], "50.0%");
    assert_eq!(value["profile"]["renderer"], "NVIDIA GeForce RTX 4080");
    assert_eq!(value["performance"]["is_warm"], false);
}

#[test]
fn test_summary_line_names_tier_and_cache() {
    let (mut context, _telemetry, _clock) = high_end_context();
    context.shape(ShapeKind::Torus, 1.0).unwrap();
    let line = summary_line(&context.diagnostics());
    assert!(line.starts_with("tier=high fps=60.0 throttled=false geometries=1"));
    assert!(!line.contains("upgrade=pending"));
}

#[test]
fn test_write_json_creates_the_file() {
    let (context, _telemetry, _clock) = high_end_context();
    let path = std::env::temp_dir().join(format!("tessera-diagnostics-{}.json", std::process::id()));
    write_json(&path, &context.diagnostics()).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert!(written.contains("\"dropped_tier_events\": 0"));
}

#[test]
fn test_write_json_reports_bad_path() {
    let (context, _telemetry, _clock) = high_end_context();
    let err = write_json("/definitely/not/here/diagnostics.json", &context.diagnostics()).unwrap_err();
    assert!(err.to_string().contains("Failed to write diagnostics"));
}
