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

//! The per-session context handed to the render loop.

use crate::config::TesseraConfig;
use crate::governor::{GovernorDiagnostics, QualityGovernor, TierChange};
use crate::metrics::{PerformanceSampler, PerformanceSnapshot};
use crate::profiler::CapabilityProfile;
use crossbeam_channel::{Receiver, Sender, TrySendError};
use serde::Serialize;
use std::sync::Arc;
use tessera_core::platform::MemoryProbe;
use tessera_core::{Clock, QualitySettings, QualityTier};
use tessera_data::{CacheReport, GeometryCache, GeometryError, GeometryHandle, ShapeKind, ShapeParams};

/// Everything the governor knows, as one serializable value.
#[derive(Debug, Clone, Serialize)]
pub struct RenderDiagnostics {
    /// The startup capability profile.
    pub profile: CapabilityProfile,
    /// Tier state and counters.
    pub governor: GovernorDiagnostics,
    /// Latest frame statistics.
    pub performance: PerformanceSnapshot,
    /// Geometry cache summary.
    pub geometry: CacheReport,
    /// Tier-change notifications lost to a full channel.
    pub dropped_tier_events: u64,
}

/// Owns the sampler, the governor and the geometry cache for one session.
///
/// There is no global state: the host creates one context, calls
/// [`on_frame`](Self::on_frame) from its render callback, and reads
/// [`active_settings`](Self::active_settings) and [`shape`](Self::shape)
/// when it builds the scene. Tier changes are also published on the channel
/// returned by [`new`](Self::new).
pub struct AdaptiveRenderContext {
    profile: CapabilityProfile,
    sampler: PerformanceSampler,
    governor: QualityGovernor,
    geometry: GeometryCache,
    clock: Arc<dyn Clock>,
    tier_tx: Sender<TierChange>,
    dropped_tier_events: u64,
}

impl AdaptiveRenderContext {
    /// Creates a context starting at the profile's initial tier.
    pub fn new(
        profile: CapabilityProfile,
        config: &TesseraConfig,
        clock: Arc<dyn Clock>,
    ) -> (Self, Receiver<TierChange>) {
        // A zero-capacity channel is a rendezvous; `try_send` would never succeed.
        let (tx, rx) = crossbeam_channel::bounded(config.governor.tier_event_buffer.max(1));
        let context = Self {
            sampler: PerformanceSampler::new(config.sampler.clone()),
            governor: QualityGovernor::new(profile.initial_quality_tier, config.governor.clone()),
            geometry: GeometryCache::new(),
            profile,
            clock,
            tier_tx: tx,
            dropped_tier_events: 0,
        };
        (context, rx)
    }

    /// Attaches a heap statistics source to the sampler.
    pub fn with_memory_probe(mut self, probe: Box<dyn MemoryProbe>) -> Self {
        self.sampler = self.sampler.with_memory_probe(probe);
        self
    }

    /// Records a frame at the clock's current time and re-evaluates the tier.
    pub fn on_frame(&mut self) -> Option<TierChange> {
        let now_ms = self.clock.now_ms();
        self.on_frame_at(now_ms)
    }

    /// Records a frame at an explicit timestamp (e.g. the host's own
    /// animation-frame time) and re-evaluates the tier.
    pub fn on_frame_at(&mut self, now_ms: f64) -> Option<TierChange> {
        if !self.sampler.on_frame(now_ms) {
            return None;
        }
        let snapshot = self.sampler.snapshot();
        let change = self.governor.evaluate(&snapshot, now_ms)?;
        self.publish(change);
        Some(change)
    }

    /// Forces the tier, bypassing the telemetry.
    pub fn set_tier(&mut self, tier: QualityTier) -> Option<TierChange> {
        let change = self.governor.set_tier(tier, self.clock.now_ms())?;
        self.publish(change);
        Some(change)
    }

    fn publish(&mut self, change: TierChange) {
        match self.tier_tx.try_send(change) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                self.dropped_tier_events += 1;
                log::warn!(
                    "Tier change channel full, dropping '{}' -> '{}' notification",
                    change.from,
                    change.to
                );
            }
            // Nobody listens; that is allowed.
            Err(TrySendError::Disconnected(_)) => {}
        }
    }

    /// Settings of the active tier.
    pub fn active_settings(&self) -> &'static QualitySettings {
        self.governor.active_settings()
    }

    /// The active tier.
    pub fn current_tier(&self) -> QualityTier {
        self.governor.current_tier()
    }

    /// Requests a shape at the active tier's geometry detail.
    pub fn shape(&mut self, kind: ShapeKind, radius: f32) -> Result<GeometryHandle, GeometryError> {
        let params = ShapeParams::new(self.active_settings().geometry_detail, radius);
        self.geometry.get(kind, params)
    }

    /// Clears per-mount state: the pending upgrade and the frame window.
    ///
    /// The tier, the throttling flag and the geometry cache survive, since
    /// they describe the device rather than the mounted scene.
    pub fn remount(&mut self) {
        self.governor.cancel_pending_upgrade();
        self.sampler.reset();
        log::info!("Render context remounted at tier '{}'", self.current_tier());
    }

    /// The startup profile.
    pub fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    /// The governor.
    pub fn governor(&self) -> &QualityGovernor {
        &self.governor
    }

    /// The current frame statistics.
    pub fn snapshot(&self) -> PerformanceSnapshot {
        self.sampler.snapshot()
    }

    /// The geometry cache.
    pub fn geometry(&self) -> &GeometryCache {
        &self.geometry
    }

    /// Mutable access to the geometry cache, e.g. for explicit parameters
    /// or a full [`GeometryCache::clear`].
    pub fn geometry_mut(&mut self) -> &mut GeometryCache {
        &mut self.geometry
    }

    /// Notifications lost because the channel was full.
    pub fn dropped_tier_events(&self) -> u64 {
        self.dropped_tier_events
    }

    /// A read-only projection of the whole context.
    pub fn diagnostics(&self) -> RenderDiagnostics {
        RenderDiagnostics {
            profile: self.profile.clone(),
            governor: self.governor.diagnostics(),
            performance: self.sampler.snapshot(),
            geometry: self.geometry.report(),
            dropped_tier_events: self.dropped_tier_events,
        }
    }
}

impl std::fmt::Debug for AdaptiveRenderContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdaptiveRenderContext")
            .field("tier", &self.current_tier())
            .field("sampler", &self.sampler)
            .field("cached_geometries", &self.geometry.len())
            .finish_non_exhaustive()
    }
}
