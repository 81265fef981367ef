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

//! Injectable time sources.
//!
//! The governor never sleeps. Debounce windows are deadlines compared against
//! a [`Clock`] reading on each evaluation, which lets tests drive time by hand
//! through [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// A monotonic millisecond time source.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since an arbitrary, fixed origin.
    fn now_ms(&self) -> f64;
}

/// A [`Clock`] backed by [`Instant`], with its origin at construction time.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Creates a clock whose origin is "now".
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// A hand-driven [`Clock`] for deterministic tests and simulations.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the code under test.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    micros: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock starting at `0 ms`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves the clock forward by `delta`.
    pub fn advance(&self, delta: Duration) {
        self.micros
            .fetch_add(delta.as_micros() as u64, Ordering::SeqCst);
    }

    /// Moves the clock forward by `ms` milliseconds.
    ///
    /// Non-finite and non-positive values leave the clock untouched.
    pub fn advance_ms(&self, ms: f64) {
        if !ms.is_finite() || ms <= 0.0 {
            return;
        }
        self.micros
            .fetch_add((ms * 1000.0).round() as u64, Ordering::SeqCst);
    }

    /// Sets the absolute time, in milliseconds.
    pub fn set_ms(&self, ms: f64) {
        self.micros
            .store((ms.max(0.0) * 1000.0).round() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        self.micros.load(Ordering::SeqCst) as f64 / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let handle = clock.clone();
        clock.advance(Duration::from_millis(250));
        assert_eq!(handle.now_ms(), 250.0);
        handle.set_ms(1_000.0);
        assert_eq!(clock.now_ms(), 1_000.0);
    }

    #[test]
    fn test_manual_clock_advance_ms() {
        let clock = ManualClock::new();
        clock.advance_ms(16.5);
        clock.advance_ms(16.5);
        assert!((clock.now_ms() - 33.0).abs() < 1e-9);
    }

    #[test]
    fn test_manual_clock_ignores_non_finite_advance() {
        let clock = ManualClock::new();
        clock.set_ms(100.0);
        clock.advance_ms(f64::INFINITY);
        clock.advance_ms(f64::NAN);
        clock.advance_ms(-5.0);
        assert_eq!(clock.now_ms(), 100.0);
        clock.advance_ms(0.5);
        assert_eq!(clock.now_ms(), 100.5);
    }

    #[test]
    fn test_system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
