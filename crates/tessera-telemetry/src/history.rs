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


//! Bounded in-memory record of tier changes.

use crossbeam_channel::Receiver;
use serde::Serialize;
use std::collections::VecDeque;
use tessera_control::{TierChange, TierChangeReason};

/// Keeps the most recent tier changes, oldest first.
///
/// Once full, recording a change evicts the oldest one. Lifetime counters
/// are not affected by eviction.
#[derive(Debug, Clone, Serialize)]
pub struct TierChangeHistory {
    events: VecDeque<TierChange>,
    capacity: usize,
    downgrades: u64,
    upgrades: u64,
    manual: u64,
}

impl TierChangeHistory {
    /// Creates an empty history holding at most `capacity` changes.
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            events: VecDeque::with_capacity(capacity),
            capacity,
            downgrades: 0,
            upgrades: 0,
            manual: 0,
        }
    }

    /// Appends a change, evicting the oldest when full.
    pub fn record(&mut self, change: TierChange) {
        match change.reason {
            TierChangeReason::Downgrade { .. } => self.downgrades += 1,
            TierChangeReason::Upgrade { .. } => self.upgrades += 1,
            TierChangeReason::Manual => self.manual += 1,
        }
        if self.events.len() == self.capacity {
            self.events.pop_front();
        }
        self.events.push_back(change);
        log::debug!(
            "Recorded tier change '{}' -> '{}' at {:.0} ms",
            change.from,
            change.to,
            change.at_ms
        );
    }

    /// Records every change waiting on `rx` without blocking.
    /// Returns how many were drained.
    pub fn drain_from(&mut self, rx: &Receiver<TierChange>) -> usize {
        let mut drained = 0;
        while let Ok(change) = rx.try_recv() {
            self.record(change);
            drained += 1;
        }
        drained
    }

    /// The retained changes, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &TierChange> {
        self.events.iter()
    }

    /// The most recent change.
    pub fn last(&self) -> Option<&TierChange> {
        self.events.back()
    }

    /// Number of retained changes.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing is retained.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of retained changes.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Downgrades ever recorded.
    pub fn downgrades(&self) -> u64 {
        self.downgrades
    }

    /// Upgrades ever recorded.
    pub fn upgrades(&self) -> u64 {
        self.upgrades
    }

    /// Manual overrides ever recorded.
    pub fn manual_overrides(&self) -> u64 {
        self.manual
    }
}

impl Default for TierChangeHistory {
    fn default() -> Self {
        Self::new(64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_core::QualityTier;

    fn change(from: QualityTier, to: QualityTier, reason: TierChangeReason, at_ms: f64) -> TierChange {
        TierChange {
            from,
            to,
            reason,
            at_ms,
        }
    }

    #[test]
    fn test_eviction_keeps_most_recent_and_lifetime_counts() {
        let mut history = TierChangeHistory::new(2);
        history.record(change(QualityTier::High, QualityTier::Medium, TierChangeReason::Downgrade { fps: 30.0 }, 1.0));
        history.record(change(QualityTier::Medium, QualityTier::Low, TierChangeReason::Downgrade { fps: 25.0 }, 2.0));
        history.record(change(QualityTier::Low, QualityTier::Medium, TierChangeReason::Upgrade { fps: 90.0 }, 3.0));

        assert_eq!(history.len(), 2);
        let times: Vec<f64> = history.iter().map(|c| c.at_ms).collect();
        assert_eq!(times, vec![2.0, 3.0]);
        assert_eq!(history.downgrades(), 2);
        assert_eq!(history.upgrades(), 1);
        assert_eq!(history.last().map(|c| c.to), Some(QualityTier::Medium));
    }

    #[test]
    fn test_drain_from_empties_the_channel() {
        let (tx, rx) = crossbeam_channel::bounded(4);
        tx.send(change(QualityTier::Low, QualityTier::High, TierChangeReason::Manual, 5.0)).unwrap();
        tx.send(change(QualityTier::High, QualityTier::Low, TierChangeReason::Manual, 6.0)).unwrap();

        let mut history = TierChangeHistory::default();
        assert_eq!(history.drain_from(&rx), 2);
        assert_eq!(history.drain_from(&rx), 0);
        assert_eq!(history.manual_overrides(), 2);
        assert!(rx.is_empty());
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        let mut history = TierChangeHistory::new(0);
        assert_eq!(history.capacity(), 1);
        history.record(change(QualityTier::Low, QualityTier::High, TierChangeReason::Manual, 1.0));
        history.record(change(QualityTier::High, QualityTier::Low, TierChangeReason::Manual, 2.0));
        assert_eq!(history.len(), 1);
    }
}
