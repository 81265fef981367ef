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

//! Rolling frame-time statistics.

use crate::config::SamplerConfig;
use serde::Serialize;
use tessera_core::platform::MemoryProbe;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// A circular buffer of samples whose capacity is fixed at construction.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    data: Vec<T>,
    index: usize,
    count: usize,
}

impl<T: Default + Copy> RingBuffer<T> {
    /// Creates an empty buffer holding at most `capacity` values (at least 1).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![T::default(); capacity.max(1)],
            index: 0,
            count: 0,
        }
    }

    /// Pushes a new value into the buffer, overwriting the oldest if full.
    pub fn push(&mut self, value: T) {
        let capacity = self.data.len();
        self.data[self.index] = value;
        self.index = (self.index + 1) % capacity;
        if self.count < capacity {
            self.count += 1;
        }
    }

    /// Returns the number of elements currently in the buffer.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Maximum number of elements.
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Whether the next push will evict the oldest value.
    pub fn is_full(&self) -> bool {
        self.count == self.data.len()
    }

    /// Forgets every value.
    pub fn clear(&mut self) {
        self.index = 0;
        self.count = 0;
    }

    /// Returns an iterator over the values in chronological order (oldest to newest).
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (left, right) = self.data.split_at(self.index);
        if self.is_full() {
            // Full: the oldest value sits at the write index.
            right.iter().chain(left.iter())
        } else {
            // Not full yet: the values are `data[..index]`.
            right[..0].iter().chain(left.iter())
        }
    }
}

impl RingBuffer<f64> {
    /// Arithmetic mean of the values, or `0.0` when empty.
    pub fn average(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        self.iter().sum::<f64>() / self.count as f64
    }
}

/// What the sampler reports about the recent frames.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    /// Frame durations in milliseconds, oldest first.
    pub window: Vec<f64>,
    /// Mean frame duration, or the default while warming up.
    pub average_frame_time_ms: f64,
    /// `1000 / average_frame_time_ms`, or the default while warming up.
    pub fps: f64,
    /// Heap usage in MiB, when the host exposes it.
    pub memory_usage_mb: Option<f64>,
    /// Whether the window holds enough samples to be trusted.
    pub is_warm: bool,
}

/// Turns per-frame timestamps into [`PerformanceSnapshot`]s.
///
/// The sampler has no timers. It only advances when the host calls
/// [`on_frame`](Self::on_frame); a host that stops calling simply freezes it.
pub struct PerformanceSampler {
    config: SamplerConfig,
    frame_times: RingBuffer<f64>,
    last_frame_ms: Option<f64>,
    memory_probe: Option<Box<dyn MemoryProbe>>,
    memory_usage_mb: Option<f64>,
    frames_until_memory_sample: u32,
}

impl std::fmt::Debug for PerformanceSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PerformanceSampler")
            .field("config", &self.config)
            .field("samples", &self.frame_times.count())
            .field("last_frame_ms", &self.last_frame_ms)
            .field("memory_probe", &self.memory_probe.is_some())
            .finish()
    }
}

impl PerformanceSampler {
    /// Creates a sampler without heap statistics.
    pub fn new(config: SamplerConfig) -> Self {
        Self {
            frame_times: RingBuffer::with_capacity(config.window_capacity),
            config,
            last_frame_ms: None,
            memory_probe: None,
            memory_usage_mb: None,
            frames_until_memory_sample: 0,
        }
    }

    /// Attaches a heap statistics source.
    pub fn with_memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.memory_probe = Some(probe);
        self
    }

    /// Records the frame that started at `now_ms`.
    ///
    /// The first call only sets the baseline. Non-positive deltas (clock
    /// jumps, duplicate ticks) are dropped but still move the baseline; a
    /// non-finite timestamp is ignored. Returns `true` when a duration was
    /// recorded.
    pub fn on_frame(&mut self, now_ms: f64) -> bool {
        if !now_ms.is_finite() {
            return false;
        }
        let Some(last) = self.last_frame_ms.replace(now_ms) else {
            return false;
        };
        let delta = now_ms - last;
        if delta <= 0.0 {
            log::trace!("Dropping frame delta of {delta} ms");
            return false;
        }

        self.frame_times.push(delta);
        self.sample_memory();
        true
    }

    fn sample_memory(&mut self) {
        let Some(probe) = self.memory_probe.as_mut() else {
            return;
        };
        if self.frames_until_memory_sample == 0 {
            self.memory_usage_mb = probe
                .heap_usage_bytes()
                .map(|bytes| bytes as f64 / BYTES_PER_MB);
            self.frames_until_memory_sample = self.config.memory_sample_interval.max(1);
        }
        self.frames_until_memory_sample -= 1;
    }

    /// Whether enough samples have been collected to trust the averages.
    pub fn is_warm(&self) -> bool {
        let count = self.frame_times.count();
        count > 0 && count >= self.config.effective_warmup()
    }

    /// Number of recorded frame durations.
    pub fn sample_count(&self) -> usize {
        self.frame_times.count()
    }

    /// The current statistics.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let is_warm = self.is_warm();
        let (average_frame_time_ms, fps) = if is_warm {
            let average = self.frame_times.average();
            (average, 1000.0 / average)
        } else {
            (1000.0 / self.config.default_fps, self.config.default_fps)
        };

        PerformanceSnapshot {
            window: self.frame_times.iter().copied().collect(),
            average_frame_time_ms,
            fps,
            memory_usage_mb: self.memory_usage_mb,
            is_warm,
        }
    }

    /// Forgets the window and the baseline, as if no frame had been seen.
    pub fn reset(&mut self) {
        self.frame_times.clear();
        self.last_frame_ms = None;
        self.frames_until_memory_sample = 0;
    }
}
