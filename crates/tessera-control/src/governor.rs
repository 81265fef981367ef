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

//! The quality tier state machine.
//!
//! Hysteresis is asymmetric:
//!
//! - **Downgrade** is immediate. A frame rate below the downgrade threshold
//!   drops exactly one tier on the evaluation that sees it.
//! - **Upgrade** is debounced. A frame rate above the upgrade threshold while
//!   throttled arms a deadline; the tier only rises by one once an evaluation
//!   at or past that deadline still sees the fast frame rate. Any evaluation
//!   in between that does not cancels the deadline.
//! - **Manual override** sets the tier directly, clears throttling and cancels
//!   any pending upgrade.

use crate::config::GovernorConfig;
use crate::metrics::PerformanceSnapshot;
use serde::Serialize;
use tessera_core::{QualitySettings, QualityTier};

/// Why the tier changed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierChangeReason {
    /// The frame rate fell below the downgrade threshold.
    Downgrade {
        /// Frame rate that triggered it.
        fps: f64,
    },
    /// The frame rate stayed above the upgrade threshold for the whole
    /// debounce window.
    Upgrade {
        /// Frame rate at commit time.
        fps: f64,
    },
    /// [`QualityGovernor::set_tier`] was called.
    Manual,
}

/// A committed tier transition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TierChange {
    /// Tier before the change.
    pub from: QualityTier,
    /// Tier after the change.
    pub to: QualityTier,
    /// What caused it.
    pub reason: TierChangeReason,
    /// Clock reading when it was committed.
    pub at_ms: f64,
}

/// The mutable part of the governor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernorState {
    /// Tier whose settings are active.
    pub current_tier: QualityTier,
    /// Set by every automatic downgrade, cleared on reaching `High` or by a
    /// manual override.
    pub is_throttled: bool,
    /// When the armed upgrade may commit, if one is armed.
    pub pending_upgrade_deadline: Option<f64>,
}

/// Read-only projection of the governor for dashboards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GovernorDiagnostics {
    /// Current state.
    #[serde(flatten)]
    pub state: GovernorState,
    /// Frame rate the host aims for.
    pub target_fps: f64,
    /// Frame rate below which the governor downgrades.
    pub downgrade_threshold_fps: f64,
    /// Frame rate above which an upgrade is armed.
    pub upgrade_threshold_fps: f64,
    /// Automatic downgrades so far.
    pub downgrades: u64,
    /// Automatic upgrades so far.
    pub upgrades: u64,
    /// Upgrades armed and then cancelled.
    pub cancelled_upgrades: u64,
}

/// Decides the active [`QualityTier`] from performance snapshots.
#[derive(Debug, Clone)]
pub struct QualityGovernor {
    config: GovernorConfig,
    state: GovernorState,
    downgrades: u64,
    upgrades: u64,
    cancelled_upgrades: u64,
}

impl QualityGovernor {
    /// Creates a governor starting at `initial_tier`, not throttled.
    pub fn new(initial_tier: QualityTier, config: GovernorConfig) -> Self {
        Self {
            config,
            state: GovernorState {
                current_tier: initial_tier,
                is_throttled: false,
                pending_upgrade_deadline: None,
            },
            downgrades: 0,
            upgrades: 0,
            cancelled_upgrades: 0,
        }
    }

    /// The current state.
    pub fn state(&self) -> &GovernorState {
        &self.state
    }

    /// The active tier.
    pub fn current_tier(&self) -> QualityTier {
        self.state.current_tier
    }

    /// Whether an automatic downgrade happened since the last time the tier
    /// was `High` or manually set.
    pub fn is_throttled(&self) -> bool {
        self.state.is_throttled
    }

    /// The thresholds in use.
    pub fn config(&self) -> &GovernorConfig {
        &self.config
    }

    /// The settings of the active tier.
    pub fn active_settings(&self) -> &'static QualitySettings {
        self.state.current_tier.settings()
    }

    /// Evaluates one snapshot. Snapshots that are still warming up are
    /// ignored, since their frame rate is a placeholder.
    pub fn evaluate(&mut self, snapshot: &PerformanceSnapshot, now_ms: f64) -> Option<TierChange> {
        if !snapshot.is_warm {
            return None;
        }
        self.evaluate_fps(snapshot.fps, now_ms)
    }

    /// Runs one step of the state machine for a measured frame rate.
    pub fn evaluate_fps(&mut self, fps: f64, now_ms: f64) -> Option<TierChange> {
        if fps < self.config.downgrade_threshold() {
            self.cancel_pending_upgrade();
            let lower = self.state.current_tier.lower()?;
            self.downgrades += 1;
            self.state.is_throttled = true;
            return Some(self.commit(lower, TierChangeReason::Downgrade { fps }, now_ms));
        }

        if fps > self.config.upgrade_threshold() && self.state.is_throttled {
            let debounce = self.config.upgrade_debounce_ms as f64;
            let deadline = *self.state.pending_upgrade_deadline.get_or_insert_with(|| {
                log::debug!(
                    "Upgrade from '{}' armed at {fps:.1} fps, due in {debounce} ms",
                    self.state.current_tier
                );
                now_ms + debounce
            });
            if now_ms < deadline {
                return None;
            }

            self.state.pending_upgrade_deadline = None;
            let Some(higher) = self.state.current_tier.higher() else {
                self.state.is_throttled = false;
                return None;
            };
            self.upgrades += 1;
            if higher == QualityTier::High {
                self.state.is_throttled = false;
            }
            return Some(self.commit(higher, TierChangeReason::Upgrade { fps }, now_ms));
        }

        self.cancel_pending_upgrade();
        None
    }

    /// Forces the tier. Clears throttling and any pending upgrade.
    ///
    /// Returns the change, or `None` if `tier` was already active.
    pub fn set_tier(&mut self, tier: QualityTier, now_ms: f64) -> Option<TierChange> {
        self.state.is_throttled = false;
        self.state.pending_upgrade_deadline = None;
        if tier == self.state.current_tier {
            return None;
        }
        Some(self.commit(tier, TierChangeReason::Manual, now_ms))
    }

    /// Drops an armed upgrade, if any.
    pub fn cancel_pending_upgrade(&mut self) {
        if self.state.pending_upgrade_deadline.take().is_some() {
            self.cancelled_upgrades += 1;
            log::debug!("Pending upgrade from '{}' cancelled", self.state.current_tier);
        }
    }

    fn commit(&mut self, to: QualityTier, reason: TierChangeReason, now_ms: f64) -> TierChange {
        let change = TierChange {
            from: self.state.current_tier,
            to,
            reason,
            at_ms: now_ms,
        };
        self.state.current_tier = to;
        match reason {
            TierChangeReason::Downgrade { fps } | TierChangeReason::Upgrade { fps } => log::info!(
                "Quality tier '{}' -> '{}' ({fps:.1} fps)",
                change.from,
                change.to
            ),
            TierChangeReason::Manual => {
                log::info!("Quality tier '{}' -> '{}' (manual)", change.from, change.to)
            }
        }
        change
    }

    /// A snapshot of the state and counters.
    pub fn diagnostics(&self) -> GovernorDiagnostics {
        GovernorDiagnostics {
            state: self.state.clone(),
            target_fps: self.config.target_fps,
            downgrade_threshold_fps: self.config.downgrade_threshold(),
            upgrade_threshold_fps: self.config.upgrade_threshold(),
            downgrades: self.downgrades,
            upgrades: self.upgrades,
            cancelled_upgrades: self.cancelled_upgrades,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOW: f64 = 40.0;
    const FAST: f64 = 80.0;
    const STEADY: f64 = 60.0;

    fn governor(tier: QualityTier) -> QualityGovernor {
        QualityGovernor::new(tier, GovernorConfig::default())
    }

    // ── Downgrade ──

    #[test]
    fn test_downgrade_steps_one_tier_per_evaluation() {
        let mut gov = governor(QualityTier::High);

        let first = gov.evaluate_fps(SLOW, 0.0).unwrap();
        assert_eq!((first.from, first.to), (QualityTier::High, QualityTier::Medium));
        assert!(gov.is_throttled());

        let second = gov.evaluate_fps(SLOW, 16.0).unwrap();
        assert_eq!((second.from, second.to), (QualityTier::Medium, QualityTier::Low));

        assert_eq!(gov.evaluate_fps(SLOW, 32.0), None);
        assert_eq!(gov.current_tier(), QualityTier::Low);
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut gov = governor(QualityTier::High);
        assert_eq!(gov.evaluate_fps(48.0, 0.0), None);
        assert_eq!(gov.evaluate_fps(72.0, 0.0), None);
        assert_eq!(gov.current_tier(), QualityTier::High);
    }

    // ── Upgrade debounce ──

    #[test]
    fn test_upgrade_commits_after_debounce() {
        let mut gov = governor(QualityTier::Medium);
        gov.evaluate_fps(SLOW, 0.0);
        assert_eq!(gov.current_tier(), QualityTier::Low);

        assert_eq!(gov.evaluate_fps(FAST, 1_000.0), None);
        assert_eq!(gov.state().pending_upgrade_deadline, Some(6_000.0));
        assert_eq!(gov.evaluate_fps(FAST, 5_999.0), None);

        let change = gov.evaluate_fps(FAST, 6_000.0).unwrap();
        assert_eq!(change.to, QualityTier::Medium);
        assert!(matches!(change.reason, TierChangeReason::Upgrade { .. }));
        // Still below High: throttling stays on and the next climb re-arms.
        assert!(gov.is_throttled());
        assert_eq!(gov.state().pending_upgrade_deadline, None);
    }

    #[test]
    fn test_reaching_high_clears_throttling() {
        let mut gov = governor(QualityTier::High);
        gov.evaluate_fps(SLOW, 0.0);
        gov.evaluate_fps(FAST, 100.0);
        let change = gov.evaluate_fps(FAST, 5_100.0).unwrap();
        assert_eq!(change.to, QualityTier::High);
        assert!(!gov.is_throttled());
        // Not throttled any more, so nothing is armed.
        assert_eq!(gov.evaluate_fps(FAST, 20_000.0), None);
        assert_eq!(gov.state().pending_upgrade_deadline, None);
    }

    #[test]
    fn test_interruption_cancels_pending_upgrade() {
        let mut gov = governor(QualityTier::Medium);
        gov.evaluate_fps(SLOW, 0.0);
        gov.evaluate_fps(FAST, 1_000.0);
        gov.evaluate_fps(STEADY, 4_000.0);
        assert_eq!(gov.state().pending_upgrade_deadline, None);

        // Re-armed from scratch at 4500, so 6000 is too early.
        gov.evaluate_fps(FAST, 4_500.0);
        assert_eq!(gov.evaluate_fps(FAST, 6_000.0), None);
        assert!(gov.evaluate_fps(FAST, 9_500.0).is_some());
        assert_eq!(gov.diagnostics().cancelled_upgrades, 1);
    }

    #[test]
    fn test_downgrade_cancels_pending_upgrade() {
        let mut gov = governor(QualityTier::High);
        gov.evaluate_fps(SLOW, 0.0);
        gov.evaluate_fps(FAST, 100.0);
        let change = gov.evaluate_fps(SLOW, 200.0).unwrap();
        assert_eq!(change.to, QualityTier::Low);
        assert_eq!(gov.state().pending_upgrade_deadline, None);
    }

    #[test]
    fn test_unthrottled_session_never_upgrades() {
        let mut gov = governor(QualityTier::Low);
        for i in 0..100 {
            assert_eq!(gov.evaluate_fps(FAST, i as f64 * 1_000.0), None);
        }
        assert_eq!(gov.current_tier(), QualityTier::Low);
    }

    #[test]
    fn test_zero_debounce_upgrades_on_first_fast_evaluation() {
        let config = GovernorConfig {
            upgrade_debounce_ms: 0,
            ..GovernorConfig::default()
        };
        let mut gov = QualityGovernor::new(QualityTier::Medium, config);
        gov.evaluate_fps(SLOW, 0.0);
        assert!(gov.evaluate_fps(FAST, 1.0).is_some());
    }

    // ── Manual override ──

    #[test]
    fn test_manual_override_clears_throttling_and_deadline() {
        let mut gov = governor(QualityTier::High);
        gov.evaluate_fps(SLOW, 0.0);
        gov.evaluate_fps(FAST, 100.0);

        let change = gov.set_tier(QualityTier::Low, 200.0).unwrap();
        assert_eq!(change.reason, TierChangeReason::Manual);
        assert!(!gov.is_throttled());
        assert_eq!(gov.state().pending_upgrade_deadline, None);
        assert_eq!(gov.set_tier(QualityTier::Low, 300.0), None);
    }

    // ── Snapshots ──

    #[test]
    fn test_cold_snapshots_are_ignored() {
        let mut gov = governor(QualityTier::High);
        let cold = PerformanceSnapshot {
            window: vec![100.0; 5],
            average_frame_time_ms: 100.0,
            fps: 10.0,
            memory_usage_mb: None,
            is_warm: false,
        };
        assert_eq!(gov.evaluate(&cold, 0.0), None);
        let warm = PerformanceSnapshot { is_warm: true, ..cold };
        assert!(gov.evaluate(&warm, 0.0).is_some());
    }

    #[test]
    fn test_active_settings_follow_tier() {
        let mut gov = governor(QualityTier::High);
        assert_eq!(gov.active_settings().particle_count, 2000);
        gov.evaluate_fps(SLOW, 0.0);
        assert_eq!(gov.active_settings(), QualityTier::Medium.settings());
    }
}
