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


//! Periodic telemetry driven from the render loop.

use crate::history::TierChangeHistory;
use crate::report::summary_line;
use crossbeam_channel::Receiver;
use std::time::Duration;
use tessera_control::{AdaptiveRenderContext, RenderDiagnostics, TierChange};

/// Collects tier changes and emits a diagnostics snapshot at a fixed interval.
#[derive(Debug)]
pub struct TelemetryService {
    tier_rx: Receiver<TierChange>,
    history: TierChangeHistory,
    report_interval_ms: f64,
    last_report_ms: Option<f64>,
}

impl TelemetryService {
    /// Creates a service reading from the context's tier-change channel.
    pub fn new(tier_rx: Receiver<TierChange>, history_capacity: usize, report_interval: Duration) -> Self {
        Self {
            tier_rx,
            history: TierChangeHistory::new(history_capacity),
            report_interval_ms: report_interval.as_secs_f64() * 1000.0,
            last_report_ms: None,
        }
    }

    /// Should be called once per frame with the same clock the context uses.
    ///
    /// Drains pending tier changes into the history, and returns a
    /// diagnostics snapshot (also logged) when the report interval has
    /// elapsed. The first call always reports.
    pub fn tick(&mut self, now_ms: f64, context: &AdaptiveRenderContext) -> Option<RenderDiagnostics> {
        self.history.drain_from(&self.tier_rx);

        let due = self
            .last_report_ms
            .is_none_or(|last| now_ms - last >= self.report_interval_ms);
        if !due {
            return None;
        }
        self.last_report_ms = Some(now_ms);

        let diagnostics = context.diagnostics();
        log::debug!("{}", summary_line(&diagnostics));
        Some(diagnostics)
    }

    /// The tier changes seen so far.
    pub fn history(&self) -> &TierChangeHistory {
        &self.history
    }
}
