//! Viewer-driven chunk streaming.
//!
//! Owns the chunk table and the generation pipeline. Once per frame the
//! consumer moves the viewer and calls [`TerrainStreamer::tick`], which
//! requests missing chunks around the viewer, updates visibility and
//! LOD targets, optionally evicts long-invisible records, and drains
//! finished background work into the table.

use glam::Vec2;
use std::sync::Arc;

use terra_config::{BiomeConfig, SplatStrategyConfig, WorldConfig};
use terra_gen::{
    AcceptAll, BiomeDef, BiomeRegistry, ElevationStats, FractalNoiseField, HeightfieldBuilder,
    NoiseParams, PlaceableDef, PlacementBuilder, PlacementValidator, VoronoiBiomeField,
};
use terra_mesh::SplatStrategy;
use terra_world::ChunkCoord;

use crate::error::StreamerError;
use crate::events::ChunkEvent;
use crate::lod::LodLadder;
use crate::pipeline::{GenerationPipeline, StageContext};
use crate::record::{ChunkRecord, ChunkTable};

/// Streams terrain chunks around a moving viewer.
///
/// Single-owner type: one logical thread constructs it, moves the
/// viewer, and ticks it. All chunk state lives in the table behind
/// `&mut self`; background workers only ever see `Arc` clones of
/// immutable inputs.
pub struct TerrainStreamer {
    records: ChunkTable,
    pipeline: GenerationPipeline,
    ladder: LodLadder,
    viewer: Vec2,
    tick: u64,
    resolution: u32,
    chunk_size: f32,
    view_distance: f32,
    max_chunk_radius: Option<i32>,
    evict_after_ticks: Option<u64>,
    log_chunk_events: bool,
}

impl TerrainStreamer {
    /// Build a streamer that accepts every placement candidate.
    ///
    /// # Errors
    ///
    /// Returns [`StreamerError`] if the configuration fails validation
    /// or a biome name is duplicated.
    pub fn new(config: WorldConfig) -> Result<Self, StreamerError> {
        Self::with_validator(config, Arc::new(AcceptAll))
    }

    /// Build a streamer with a caller-supplied placement validator
    /// (navmesh checks, exclusion zones, and the like).
    pub fn with_validator(
        config: WorldConfig,
        validator: Arc<dyn PlacementValidator>,
    ) -> Result<Self, StreamerError> {
        config.validate()?;

        let mut registry = BiomeRegistry::new();
        for biome in &config.biomes {
            registry.register(biome_def(biome))?;
        }
        let registry = Arc::new(registry);

        let field = Arc::new(VoronoiBiomeField::new(
            Arc::clone(&registry),
            config.seed,
            config.chunk.size,
            config.points_per_chunk,
        ));
        let heightfield = HeightfieldBuilder::new(
            FractalNoiseField::new(config.seed, f64::from(config.chunk.size)),
            field,
            Arc::clone(&registry),
            Arc::new(ElevationStats::new()),
            config.chunk.size,
        );
        let placement = PlacementBuilder::new(
            Arc::clone(&registry),
            validator,
            config.seed,
            config.chunk.size,
        );
        let splat_strategy = match config.splat_strategy {
            SplatStrategyConfig::BiomeIndexed => SplatStrategy::BiomeIndexed,
            SplatStrategyConfig::HeightBanded => SplatStrategy::HeightBanded,
        };
        let cell_size = config.chunk.size / config.chunk.resolution as f32;

        let ctx = StageContext::new(heightfield, placement, registry, splat_strategy, cell_size);
        let pipeline = GenerationPipeline::new(ctx, &config.pipeline);

        tracing::info!(
            seed = config.seed,
            resolution = config.chunk.resolution,
            chunk_size = config.chunk.size,
            view_distance = config.streaming.view_distance,
            biomes = config.biomes.len(),
            "terrain streamer ready"
        );

        Ok(Self {
            records: ChunkTable::default(),
            pipeline,
            ladder: LodLadder::from_config(&config.lod),
            viewer: Vec2::ZERO,
            tick: 0,
            resolution: config.chunk.resolution,
            chunk_size: config.chunk.size,
            view_distance: config.streaming.view_distance,
            max_chunk_radius: config.streaming.max_chunk_radius,
            evict_after_ticks: config.streaming.evict_after_ticks,
            log_chunk_events: config.debug.log_chunk_events,
        })
    }

    /// Move the viewer on the world plane. Takes effect on the next tick.
    pub fn set_viewer(&mut self, position: Vec2) {
        self.viewer = position;
    }

    /// Current viewer position.
    pub fn viewer(&self) -> Vec2 {
        self.viewer
    }

    /// Advance the streamer one frame.
    ///
    /// Requests chunks that entered the view window, refreshes per-chunk
    /// visibility and desired LOD, evicts long-invisible records when
    /// eviction is enabled, then drains finished background results into
    /// the table. Returns the lifecycle events of this tick, in drain
    /// order. Never blocks on background work.
    pub fn tick(&mut self) -> Vec<ChunkEvent> {
        self.tick += 1;
        self.scan_window();
        self.settle_visibility();

        let mut events = self.evict_expired();
        events.extend(self.pipeline.drain(&mut self.records));

        if self.log_chunk_events {
            for event in &events {
                tracing::debug!(?event, "chunk event");
            }
        }
        events
    }

    /// Walk the chunk window around the viewer, creating records for
    /// chunks that came into view and pumping the pipeline for those
    /// already known.
    fn scan_window(&mut self) {
        let view_sq = self.view_distance * self.view_distance;
        let mut radius = (self.view_distance / self.chunk_size).ceil() as i32;
        if let Some(max) = self.max_chunk_radius {
            radius = radius.min(max);
        }
        let center = ChunkCoord::from_world(self.viewer, self.chunk_size);

        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let coord = ChunkCoord::new(center.x + dx, center.y + dy);
                let bounds = coord.bounds(self.chunk_size);
                if bounds.distance_squared(self.viewer) > view_sq {
                    continue;
                }
                let distance = bounds.distance_squared(self.viewer).sqrt();
                let desired_lod = self.ladder.select(distance);

                let mut created = false;
                let record = self.records.entry(coord).or_insert_with(|| {
                    created = true;
                    tracing::debug!(%coord, "chunk entered view");
                    ChunkRecord::new(coord, bounds, desired_lod, self.tick)
                });

                // A faulted chunk retries only after it has left the view
                // and come back; staying in view never re-runs the stage.
                let re_entered = !created && !record.visible;
                record.visible = true;
                record.last_visible_tick = self.tick;
                record.desired_lod = desired_lod;
                self.pipeline.pump(record, self.resolution, re_entered);
            }
        }
    }

    /// Mark records the window scan did not touch as invisible. Their
    /// in-flight work is left to finish; results still apply.
    fn settle_visibility(&mut self) {
        let tick = self.tick;
        for record in self.records.values_mut() {
            if record.last_visible_tick != tick && record.visible {
                record.visible = false;
                tracing::debug!(coord = %record.coord, "chunk left view");
            }
        }
    }

    /// Drop records that stayed invisible past the configured tick
    /// budget, cancelling any work still in flight for them. Disabled by
    /// default: with `evict_after_ticks` unset, explored terrain is kept
    /// resident forever.
    fn evict_expired(&mut self) -> Vec<ChunkEvent> {
        let Some(budget) = self.evict_after_ticks else {
            return Vec::new();
        };
        let tick = self.tick;
        let expired: Vec<ChunkCoord> = self
            .records
            .values()
            .filter(|r| !r.visible && tick - r.last_visible_tick >= budget)
            .map(|r| r.coord)
            .collect();

        let mut events = Vec::with_capacity(expired.len());
        for coord in expired {
            self.pipeline.cancel_chunk(coord);
            self.records.remove(&coord);
            tracing::debug!(%coord, "chunk evicted");
            events.push(ChunkEvent::ChunkEvicted { coord });
        }
        events
    }

    /// The record for a chunk, if one exists. Never blocks or triggers
    /// generation; absent or still-generating chunks simply come back
    /// `None` or incomplete.
    pub fn try_get_chunk(&self, coord: ChunkCoord) -> Option<&ChunkRecord> {
        self.records.get(&coord)
    }

    /// Whether the chunk was inside the view distance as of the last
    /// tick.
    pub fn is_chunk_visible(&self, coord: ChunkCoord) -> bool {
        self.records.get(&coord).is_some_and(|r| r.visible)
    }

    /// Number of chunk records currently resident.
    pub fn loaded_chunk_count(&self) -> usize {
        self.records.len()
    }

    /// Iterate all resident chunk records.
    pub fn chunks(&self) -> impl Iterator<Item = &ChunkRecord> {
        self.records.values()
    }

    /// Number of background stages queued or executing.
    pub fn in_flight_count(&self) -> u64 {
        self.pipeline.in_flight_count()
    }
}

fn biome_def(config: &BiomeConfig) -> BiomeDef {
    BiomeDef {
        name: config.name.clone(),
        noise: NoiseParams {
            amplitude: config.amplitude,
            frequency: config.frequency,
            persistence: config.persistence,
            lacunarity: config.lacunarity,
            octaves: config.octaves,
        },
        height_min: config.height_min,
        height_max: config.height_max,
        placeables: config
            .placeables
            .iter()
            .map(|p| PlaceableDef {
                name: p.name.clone(),
                density: p.density,
                max_slope: p.max_slope,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::ChunkStage;
    use std::time::{Duration, Instant};

    /// Small world tuned for fast tests: 32-unit chunks at resolution 8,
    /// one-chunk view distance.
    fn test_config() -> WorldConfig {
        let mut config = WorldConfig::with_default_biome();
        config.seed = 42;
        config.chunk.resolution = 8;
        config.chunk.size = 32.0;
        config.streaming.view_distance = 48.0;
        config.lod.thresholds = vec![];
        config.lod.factors = vec![1];
        config.pipeline.worker_threads = 2;
        config.points_per_chunk = 4;
        config
    }

    fn tick_until(
        streamer: &mut TerrainStreamer,
        timeout: Duration,
        mut done: impl FnMut(&TerrainStreamer) -> bool,
    ) -> Vec<ChunkEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = Vec::new();
        while Instant::now() < deadline {
            events.extend(streamer.tick());
            if done(streamer) {
                return events;
            }
            std::thread::sleep(Duration::from_millis(5));
        }
        panic!("streamer did not settle within {timeout:?}");
    }

    fn all_complete(streamer: &TerrainStreamer) -> bool {
        streamer.loaded_chunk_count() > 0
            && streamer.chunks().all(|r| r.stage == ChunkStage::Complete)
    }

    #[test]
    fn test_invalid_config_rejected_at_construction() {
        let mut config = test_config();
        config.biomes.clear();
        assert!(matches!(
            TerrainStreamer::new(config),
            Err(StreamerError::Config(_))
        ));
    }

    #[test]
    fn test_duplicate_biome_name_rejected_at_construction() {
        let mut config = test_config();
        config.biomes.push(config.biomes[0].clone());
        assert!(matches!(
            TerrainStreamer::new(config),
            Err(StreamerError::Registry(_))
        ));
    }

    #[test]
    fn test_chunks_around_viewer_stream_to_completion() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.set_viewer(Vec2::new(16.0, 16.0));

        let events = tick_until(&mut streamer, Duration::from_secs(30), all_complete);

        let center = ChunkCoord::new(0, 0);
        assert!(streamer.is_chunk_visible(center));
        let record = streamer.try_get_chunk(center).unwrap();
        assert!(record.has_grids());
        assert!(record.mesh.is_some() && record.splat.is_some());
        assert!(record.placements.is_some());
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ChunkEvent::MeshReady { coord, .. } if *coord == center)),
            "no mesh event for the center chunk: {events:?}"
        );
        // All nine neighbors sit within the 48-unit view distance.
        for coord in center.neighborhood() {
            assert!(streamer.is_chunk_visible(coord), "{coord} not visible");
        }
    }

    #[test]
    fn test_chunk_outside_view_distance_not_loaded() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.set_viewer(Vec2::new(16.0, 16.0));
        tick_until(&mut streamer, Duration::from_secs(30), all_complete);

        // (5, 0) starts 128 units from the viewer, well past 48.
        assert!(streamer.try_get_chunk(ChunkCoord::new(5, 0)).is_none());
    }

    #[test]
    fn test_moving_viewer_hides_left_behind_chunks() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.set_viewer(Vec2::new(16.0, 16.0));
        tick_until(&mut streamer, Duration::from_secs(30), all_complete);
        let old_center = ChunkCoord::new(0, 0);
        assert!(streamer.is_chunk_visible(old_center));

        streamer.set_viewer(Vec2::new(1_000.0, 16.0));
        streamer.tick();

        assert!(!streamer.is_chunk_visible(old_center));
        // Without eviction the record stays resident.
        assert!(streamer.try_get_chunk(old_center).is_some());
        let new_center = ChunkCoord::from_world(Vec2::new(1_000.0, 16.0), 32.0);
        assert!(streamer.is_chunk_visible(new_center));
    }

    #[test]
    fn test_eviction_after_invisible_budget() {
        let mut config = test_config();
        config.streaming.evict_after_ticks = Some(3);
        let mut streamer = TerrainStreamer::new(config).unwrap();
        streamer.set_viewer(Vec2::new(16.0, 16.0));
        tick_until(&mut streamer, Duration::from_secs(30), all_complete);
        let old_center = ChunkCoord::new(0, 0);

        streamer.set_viewer(Vec2::new(1_000.0, 16.0));
        let mut events = Vec::new();
        for _ in 0..5 {
            events.extend(streamer.tick());
        }

        assert!(
            streamer.try_get_chunk(old_center).is_none(),
            "record survived the eviction budget"
        );
        assert!(
            events
                .iter()
                .any(|e| matches!(e, ChunkEvent::ChunkEvicted { coord } if *coord == old_center)),
            "no eviction event: {events:?}"
        );
    }

    #[test]
    fn test_desired_lod_tracks_distance() {
        let mut config = test_config();
        config.streaming.view_distance = 96.0;
        config.lod.thresholds = vec![40.0];
        config.lod.factors = vec![1, 4];
        let mut streamer = TerrainStreamer::new(config).unwrap();
        streamer.set_viewer(Vec2::new(16.0, 16.0));
        tick_until(&mut streamer, Duration::from_secs(30), all_complete);

        let near = streamer.try_get_chunk(ChunkCoord::new(0, 0)).unwrap();
        assert_eq!(near.desired_lod, 1);
        assert_eq!(near.built_lod, Some(1));

        // (2, 0) is at least 48 units away, past the 40-unit threshold.
        let far = streamer.try_get_chunk(ChunkCoord::new(2, 0)).unwrap();
        assert_eq!(far.desired_lod, 4);
        assert_eq!(far.built_lod, Some(4));
    }

    #[test]
    fn test_lod_change_triggers_remesh() {
        let mut config = test_config();
        config.streaming.view_distance = 96.0;
        config.lod.thresholds = vec![40.0];
        config.lod.factors = vec![1, 4];
        let mut streamer = TerrainStreamer::new(config).unwrap();
        streamer.set_viewer(Vec2::new(16.0, 16.0));
        tick_until(&mut streamer, Duration::from_secs(30), all_complete);
        let coord = ChunkCoord::new(2, 0);
        assert_eq!(streamer.try_get_chunk(coord).unwrap().built_lod, Some(4));

        // Walk toward the chunk: it crosses into the full-detail tier
        // and gets re-meshed without redoing elevation or placement.
        streamer.set_viewer(Vec2::new(80.0, 16.0));
        tick_until(&mut streamer, Duration::from_secs(30), |s| {
            s.try_get_chunk(coord).unwrap().built_lod == Some(1)
        });
        let record = streamer.try_get_chunk(coord).unwrap();
        assert_eq!(record.stage, ChunkStage::Complete);
    }

    #[test]
    fn test_tick_with_no_viewer_movement_is_stable() {
        let mut streamer = TerrainStreamer::new(test_config()).unwrap();
        streamer.set_viewer(Vec2::new(16.0, 16.0));
        tick_until(&mut streamer, Duration::from_secs(30), all_complete);
        let count = streamer.loaded_chunk_count();

        for _ in 0..10 {
            let events = streamer.tick();
            assert!(events.is_empty(), "settled world emitted events: {events:?}");
        }
        assert_eq!(streamer.loaded_chunk_count(), count);
    }
}
