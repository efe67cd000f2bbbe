//! Staged background generation with a bounded worker pool.
//!
//! Offloads heightfield, mesh/splat, and placement construction to
//! worker threads, isolates faults with `catch_unwind`, supports
//! per-stage cancellation, and delivers results through bounded
//! per-stage channels drained once per tick on the owning thread.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, bounded};
use dashmap::DashMap;
use terra_config::PipelineConfig;
use terra_gen::{BiomeRegistry, Heightfield, HeightfieldBuilder, Placement, PlacementBuilder};
use terra_mesh::{MeshBuffer, SplatBuffer, SplatStrategy, build_mesh, build_splat};
use terra_world::{BiomeGrid, ChunkCoord, ElevationGrid};

use crate::events::ChunkEvent;
use crate::record::{ChunkRecord, ChunkStage, ChunkTable};

/// The three sequential pipeline stages.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// Heightfield construction (elevation + biome grids).
    Elevation,
    /// Mesh and splat-buffer construction.
    Mesh,
    /// Placement-data construction.
    Placement,
}

impl StageKind {
    const ALL: [StageKind; 3] = [StageKind::Elevation, StageKind::Mesh, StageKind::Placement];
}

impl std::fmt::Display for StageKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StageKind::Elevation => "elevation",
            StageKind::Mesh => "mesh",
            StageKind::Placement => "placement",
        };
        f.write_str(name)
    }
}

/// Work order for one stage of one chunk. Carries everything the worker
/// needs by value or `Arc`; workers never see a [`ChunkRecord`].
enum StageTask {
    Elevation {
        coord: ChunkCoord,
        resolution: u32,
    },
    Mesh {
        coord: ChunkCoord,
        elevation: Arc<ElevationGrid>,
        biomes: Arc<BiomeGrid>,
        lod_factor: u32,
    },
    Placement {
        coord: ChunkCoord,
        elevation: Arc<ElevationGrid>,
        biomes: Arc<BiomeGrid>,
    },
}

/// Immutable result value pushed into a stage queue by a worker.
enum StageResult {
    Elevation {
        coord: ChunkCoord,
        heightfield: Heightfield,
    },
    Mesh {
        coord: ChunkCoord,
        lod_factor: u32,
        mesh: MeshBuffer,
        splat: SplatBuffer,
    },
    Placement {
        coord: ChunkCoord,
        placements: Vec<Placement>,
    },
    Faulted {
        coord: ChunkCoord,
        stage: StageKind,
        message: String,
    },
}

/// Internal wrapper carrying a task plus its cancellation flag.
struct TaskEnvelope {
    coord: ChunkCoord,
    kind: StageKind,
    cancelled: Arc<AtomicBool>,
    task: StageTask,
}

/// Shared immutable state handed to every worker thread.
pub struct StageContext {
    heightfield: HeightfieldBuilder,
    placement: PlacementBuilder,
    registry: Arc<BiomeRegistry>,
    splat_strategy: SplatStrategy,
    cell_size: f32,
}

impl StageContext {
    /// Bundle the stage builders for the worker pool.
    pub fn new(
        heightfield: HeightfieldBuilder,
        placement: PlacementBuilder,
        registry: Arc<BiomeRegistry>,
        splat_strategy: SplatStrategy,
        cell_size: f32,
    ) -> Self {
        Self {
            heightfield,
            placement,
            registry,
            splat_strategy,
            cell_size,
        }
    }
}

/// Manages staged chunk generation across a bounded worker pool.
///
/// Submissions go through one bounded task channel; each stage has its
/// own bounded result channel so the drain can keep FIFO arrival order
/// per stage. Per-chunk stage ordering is enforced structurally: the
/// next stage is only submitted after the previous stage's result has
/// been applied on the owning thread.
pub struct GenerationPipeline {
    task_tx: Sender<TaskEnvelope>,
    elevation_rx: Receiver<StageResult>,
    mesh_rx: Receiver<StageResult>,
    placement_rx: Receiver<StageResult>,
    /// Cancellation flag per submitted stage, keyed by `(coord, stage)`.
    /// An entry lives from submission until the drain consumes the
    /// stage's result (or the task is cancelled), so a finished stage
    /// whose result is still queued cannot be resubmitted.
    active: Arc<DashMap<(ChunkCoord, StageKind), Arc<AtomicBool>>>,
    in_flight: Arc<AtomicU64>,
}

impl GenerationPipeline {
    /// Spawn the worker pool.
    ///
    /// `worker_threads == 0` picks `max(1, cpus - 2)`, leaving headroom
    /// for the main thread and the render thread.
    pub fn new(ctx: StageContext, config: &PipelineConfig) -> Self {
        let threads = if config.worker_threads == 0 {
            num_cpus::get().saturating_sub(2).max(1)
        } else {
            config.worker_threads
        };

        let (task_tx, task_rx) = bounded::<TaskEnvelope>(config.task_capacity);
        let (elevation_tx, elevation_rx) = bounded::<StageResult>(config.result_capacity);
        let (mesh_tx, mesh_rx) = bounded::<StageResult>(config.result_capacity);
        let (placement_tx, placement_rx) = bounded::<StageResult>(config.result_capacity);

        let active: Arc<DashMap<(ChunkCoord, StageKind), Arc<AtomicBool>>> =
            Arc::new(DashMap::new());
        let in_flight = Arc::new(AtomicU64::new(0));
        let ctx = Arc::new(ctx);

        for _ in 0..threads {
            let task_rx = task_rx.clone();
            let senders = [
                elevation_tx.clone(),
                mesh_tx.clone(),
                placement_tx.clone(),
            ];
            let active = Arc::clone(&active);
            let in_flight = Arc::clone(&in_flight);
            let ctx = Arc::clone(&ctx);

            std::thread::Builder::new()
                .name("terra-gen-worker".into())
                .spawn(move || {
                    worker_loop(&task_rx, &senders, &active, &in_flight, &ctx);
                })
                .expect("failed to spawn generation worker thread");
        }

        Self {
            task_tx,
            elevation_rx,
            mesh_rx,
            placement_rx,
            active,
            in_flight,
        }
    }

    /// Queue stage 1 for a chunk. Returns `false` if the task queue is
    /// full; the caller retries on a later tick.
    pub fn submit_elevation(&self, coord: ChunkCoord, resolution: u32) -> bool {
        self.submit(
            coord,
            StageKind::Elevation,
            StageTask::Elevation { coord, resolution },
        )
    }

    /// Queue stage 2 for a chunk whose grids are available.
    pub fn submit_mesh(
        &self,
        coord: ChunkCoord,
        elevation: Arc<ElevationGrid>,
        biomes: Arc<BiomeGrid>,
        lod_factor: u32,
    ) -> bool {
        self.submit(
            coord,
            StageKind::Mesh,
            StageTask::Mesh {
                coord,
                elevation,
                biomes,
                lod_factor,
            },
        )
    }

    /// Queue stage 3 for a chunk whose grids are available.
    pub fn submit_placement(
        &self,
        coord: ChunkCoord,
        elevation: Arc<ElevationGrid>,
        biomes: Arc<BiomeGrid>,
    ) -> bool {
        self.submit(
            coord,
            StageKind::Placement,
            StageTask::Placement {
                coord,
                elevation,
                biomes,
            },
        )
    }

    /// True if the given stage of the given chunk is queued, running, or
    /// finished with its result not yet drained.
    pub fn is_pending(&self, coord: ChunkCoord, kind: StageKind) -> bool {
        self.active.contains_key(&(coord, kind))
    }

    /// Cancel every in-flight stage of a chunk.
    ///
    /// Already-completed stages are unaffected; a stage that has started
    /// computing finishes but its result is dropped.
    pub fn cancel_chunk(&self, coord: ChunkCoord) {
        for kind in StageKind::ALL {
            if let Some((_, cancelled)) = self.active.remove(&(coord, kind)) {
                cancelled.store(true, Ordering::Relaxed);
            }
        }
    }

    /// Number of stages currently queued or executing.
    pub fn in_flight_count(&self) -> u64 {
        self.in_flight.load(Ordering::Relaxed)
    }

    /// Drain every stage queue and apply the results to the chunk table.
    ///
    /// Called once per tick on the owning thread. Empties each queue of
    /// all currently-available items in FIFO arrival order; applying a
    /// result submits the chunk's next stage, continuing the pipeline.
    /// Never blocks on background work. A result whose record no longer
    /// exists is discarded silently.
    pub fn drain(&self, records: &mut ChunkTable) -> Vec<ChunkEvent> {
        let mut events = Vec::new();
        while let Ok(result) = self.elevation_rx.try_recv() {
            self.apply(result, records, &mut events);
        }
        while let Ok(result) = self.mesh_rx.try_recv() {
            self.apply(result, records, &mut events);
        }
        while let Ok(result) = self.placement_rx.try_recv() {
            self.apply(result, records, &mut events);
        }
        events
    }

    /// Submit the stage a record is waiting for, if any and not already
    /// in flight. Covers full-queue retries and fault recovery.
    pub fn pump(&self, record: &mut ChunkRecord, resolution: u32, retry_fault: bool) {
        match record.stage {
            ChunkStage::ElevationPending => {
                if !self.is_pending(record.coord, StageKind::Elevation) {
                    self.submit_elevation(record.coord, resolution);
                }
            }
            ChunkStage::MeshPending => {
                if !self.is_pending(record.coord, StageKind::Mesh) {
                    self.try_submit_mesh(record);
                }
            }
            ChunkStage::PlacementPending => {
                if !self.is_pending(record.coord, StageKind::Placement) {
                    self.try_submit_placement(record);
                }
            }
            ChunkStage::Complete => {
                // LOD drift: re-mesh at the newly desired factor.
                if record.built_lod != Some(record.desired_lod)
                    && !self.is_pending(record.coord, StageKind::Mesh)
                {
                    self.try_submit_mesh(record);
                }
            }
            ChunkStage::Faulted { stage } => {
                if retry_fault {
                    record.stage = match stage {
                        StageKind::Elevation => ChunkStage::ElevationPending,
                        StageKind::Mesh => ChunkStage::MeshPending,
                        StageKind::Placement => ChunkStage::PlacementPending,
                    };
                    self.pump(record, resolution, false);
                }
            }
        }
    }

    fn submit(&self, coord: ChunkCoord, kind: StageKind, task: StageTask) -> bool {
        let cancelled = Arc::new(AtomicBool::new(false));
        self.active.insert((coord, kind), Arc::clone(&cancelled));
        self.in_flight.fetch_add(1, Ordering::Relaxed);

        let envelope = TaskEnvelope {
            coord,
            kind,
            cancelled,
            task,
        };
        if self.task_tx.try_send(envelope).is_err() {
            self.in_flight.fetch_sub(1, Ordering::Relaxed);
            self.active.remove(&(coord, kind));
            tracing::warn!(%coord, stage = %kind, "task queue full, will retry next tick");
            return false;
        }
        true
    }

    fn try_submit_mesh(&self, record: &ChunkRecord) {
        if let (Some(elevation), Some(biomes)) = (&record.elevation, &record.biomes) {
            self.submit_mesh(
                record.coord,
                Arc::clone(elevation),
                Arc::clone(biomes),
                record.desired_lod,
            );
        }
    }

    fn try_submit_placement(&self, record: &ChunkRecord) {
        if let (Some(elevation), Some(biomes)) = (&record.elevation, &record.biomes) {
            self.submit_placement(record.coord, Arc::clone(elevation), Arc::clone(biomes));
        }
    }

    fn apply(&self, result: StageResult, records: &mut ChunkTable, events: &mut Vec<ChunkEvent>) {
        let (coord, kind) = match &result {
            StageResult::Elevation { coord, .. } => (*coord, StageKind::Elevation),
            StageResult::Mesh { coord, .. } => (*coord, StageKind::Mesh),
            StageResult::Placement { coord, .. } => (*coord, StageKind::Placement),
            StageResult::Faulted { coord, stage, .. } => (*coord, *stage),
        };
        // The stage is consumed here; only now may it be resubmitted.
        self.active.remove(&(coord, kind));

        match result {
            StageResult::Elevation { coord, heightfield } => {
                let Some(record) = records.get_mut(&coord) else {
                    tracing::debug!(%coord, "discarding stale elevation result");
                    return;
                };
                record.elevation = Some(Arc::new(heightfield.elevation));
                record.biomes = Some(Arc::new(heightfield.biomes));
                events.push(ChunkEvent::ElevationReady { coord });
                if record.stage == ChunkStage::ElevationPending {
                    record.stage = ChunkStage::MeshPending;
                    self.try_submit_mesh(record);
                }
            }
            StageResult::Mesh {
                coord,
                lod_factor,
                mesh,
                splat,
            } => {
                let Some(record) = records.get_mut(&coord) else {
                    tracing::debug!(%coord, "discarding stale mesh result");
                    return;
                };
                record.mesh = Some(mesh);
                record.splat = Some(splat);
                record.built_lod = Some(lod_factor);
                events.push(ChunkEvent::MeshReady { coord, lod_factor });
                if record.stage == ChunkStage::MeshPending {
                    record.stage = ChunkStage::PlacementPending;
                    self.try_submit_placement(record);
                }
            }
            StageResult::Placement { coord, placements } => {
                let Some(record) = records.get_mut(&coord) else {
                    tracing::debug!(%coord, "discarding stale placement result");
                    return;
                };
                events.push(ChunkEvent::PlacementsReady {
                    coord,
                    count: placements.len(),
                });
                record.placements = Some(placements);
                if record.stage == ChunkStage::PlacementPending {
                    record.stage = ChunkStage::Complete;
                }
            }
            StageResult::Faulted {
                coord,
                stage,
                message,
            } => {
                tracing::error!(%coord, %stage, message, "background stage faulted");
                let Some(record) = records.get_mut(&coord) else {
                    return;
                };
                record.stage = ChunkStage::Faulted { stage };
                events.push(ChunkEvent::ChunkFaulted { coord, stage });
            }
        }
    }
}

/// Worker thread body: pull tasks until the pipeline drops its sender.
fn worker_loop(
    task_rx: &Receiver<TaskEnvelope>,
    senders: &[Sender<StageResult>; 3],
    active: &DashMap<(ChunkCoord, StageKind), Arc<AtomicBool>>,
    in_flight: &AtomicU64,
    ctx: &StageContext,
) {
    while let Ok(envelope) = task_rx.recv() {
        let coord = envelope.coord;
        let kind = envelope.kind;

        // Check cancellation before starting work.
        if envelope.cancelled.load(Ordering::Relaxed) {
            active.remove(&(coord, kind));
            in_flight.fetch_sub(1, Ordering::Relaxed);
            continue;
        }

        let outcome = catch_unwind(AssertUnwindSafe(|| run_stage(ctx, envelope.task)));
        let result = match outcome {
            Ok(Ok(result)) => result,
            Ok(Err(message)) => StageResult::Faulted {
                coord,
                stage: kind,
                message,
            },
            Err(panic) => StageResult::Faulted {
                coord,
                stage: kind,
                message: panic_message(panic.as_ref()),
            },
        };

        // Check cancellation again after the computation. On the send
        // path the active entry stays: the stage counts as pending until
        // the drain consumes its result, so a pump between completion
        // and the next drain cannot resubmit it.
        if !envelope.cancelled.load(Ordering::Relaxed) {
            let sender = match kind {
                StageKind::Elevation => &senders[0],
                StageKind::Mesh => &senders[1],
                StageKind::Placement => &senders[2],
            };
            let _ = sender.send(result);
        } else {
            active.remove(&(coord, kind));
        }
        in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

/// The CPU-intensive part: compute one stage's artifact.
fn run_stage(ctx: &StageContext, task: StageTask) -> Result<StageResult, String> {
    match task {
        StageTask::Elevation { coord, resolution } => Ok(StageResult::Elevation {
            coord,
            heightfield: ctx.heightfield.build(coord, resolution),
        }),
        StageTask::Mesh {
            coord,
            elevation,
            biomes,
            lod_factor,
        } => {
            let mesh =
                build_mesh(&elevation, lod_factor, ctx.cell_size).map_err(|e| e.to_string())?;
            let stats = ctx.heightfield.stats();
            let splat = build_splat(
                ctx.splat_strategy,
                &elevation,
                &biomes,
                &ctx.registry,
                (stats.min(), stats.max()),
            );
            Ok(StageResult::Mesh {
                coord,
                lod_factor,
                mesh,
                splat,
            })
        }
        StageTask::Placement {
            coord,
            elevation,
            biomes,
        } => Ok(StageResult::Placement {
            coord,
            placements: ctx.placement.build(coord, &elevation, &biomes),
        }),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "stage panicked".to_string()
    }
}
