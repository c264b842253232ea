// THEORY:
// Each directional photo depends only on itself, so the four analyses of a
// capture session can run side by side. The parallel pipeline does exactly
// that and nothing more: fusion still waits for every submitted analysis to
// finish (a join barrier) before the predictor runs.
//
// Layout:
// - A dispatcher task receives `AnalysisTask`s and deals them round-robin to a
//   small set of worker tasks.
// - Each worker moves the pixel data onto a blocking thread, runs the
//   synchronous `SkyPipeline` stages there, and answers over the task's
//   `oneshot` channel.
// - No state is shared between analyses. Every task owns its grid or payload
//   outright and produces an immutable result, so no locks are involved.

use crate::config::AnalysisConfig;
use crate::core_modules::direction::Direction;
use crate::core_modules::pixel_grid::PixelGrid;
use crate::error::{Result, SkyError};
use crate::pipeline::{
    DirectionalAnalysis, RejectedCapture, SkyPipeline, SkyReport, check_directions,
};
use futures::future::join_all;
use log::{debug, warn};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

/// One worker per possible direction is enough.
const MAX_WORKERS: usize = 4;

/// What a worker is asked to analyse.
pub enum CaptureSource {
    /// Already sampled at the canonical resolution.
    Grid(PixelGrid),
    /// An encoded photo that still needs decoding.
    Payload(Vec<u8>),
}

pub struct AnalysisTask {
    pub direction: Direction,
    pub source: CaptureSource,
    pub result_sender: oneshot::Sender<Result<DirectionalAnalysis>>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    dispatcher: JoinHandle<()>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and workers. Must be called inside a tokio runtime.
    pub fn new(pipeline: SkyPipeline) -> Self {
        let worker_count = num_cpus::get().clamp(1, MAX_WORKERS);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        let dispatcher = tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if let Err(rejected) = worker_senders[worker_idx].send(task) {
                    let task = rejected.0;
                    let _ = task
                        .result_sender
                        .send(Err(SkyError::WorkerFailed(format!("worker {worker_idx} is gone"))));
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        });

        let mut workers = Vec::with_capacity(worker_count);
        for mut worker_receiver in worker_receivers {
            let worker_pipeline = pipeline.clone();

            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let AnalysisTask {
                        direction,
                        source,
                        result_sender,
                    } = task;
                    let pipeline = worker_pipeline.clone();

                    let outcome = tokio::task::spawn_blocking(move || {
                        Self::process_capture(&pipeline, direction, source)
                    })
                    .await
                    .unwrap_or_else(|e| Err(SkyError::WorkerFailed(e.to_string())));

                    let _ = result_sender.send(outcome);
                }
            });

            workers.push(worker);
        }

        debug!("sky worker pool started with {worker_count} workers");
        Self {
            task_sender,
            dispatcher,
            workers,
        }
    }

    fn process_capture(
        pipeline: &SkyPipeline,
        direction: Direction,
        source: CaptureSource,
    ) -> Result<DirectionalAnalysis> {
        match source {
            CaptureSource::Grid(grid) => pipeline.analyze_direction(direction, &grid),
            CaptureSource::Payload(payload) => {
                let grid = pipeline.sample_payload(&payload)?;
                pipeline.analyze_direction(direction, &grid)
            }
        }
    }

    /// Queues one capture and returns the channel its result will arrive on.
    pub fn submit(
        &self,
        direction: Direction,
        source: CaptureSource,
    ) -> Result<oneshot::Receiver<Result<DirectionalAnalysis>>> {
        let (result_sender, result_receiver) = oneshot::channel();
        let task = AnalysisTask {
            direction,
            source,
            result_sender,
        };

        self.task_sender
            .send(task)
            .map_err(|_| SkyError::WorkerFailed("failed to send task to worker pool".into()))?;
        Ok(result_receiver)
    }

    /// Closes the queue and waits for the dispatcher and workers to drain.
    pub async fn shutdown(self) {
        drop(self.task_sender);
        let _ = self.dispatcher.await;
        for worker in self.workers {
            let _ = worker.await;
        }
    }
}

/// Runs per-direction analyses concurrently, then fuses them.
pub struct ParallelSkyPipeline {
    pipeline: SkyPipeline,
    worker_pool: WorkerPool,
}

impl ParallelSkyPipeline {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        Ok(Self::from_pipeline(SkyPipeline::new(config)?))
    }

    pub fn from_pipeline(pipeline: SkyPipeline) -> Self {
        let worker_pool = WorkerPool::new(pipeline.clone());
        Self {
            pipeline,
            worker_pool,
        }
    }

    pub fn pipeline(&self) -> &SkyPipeline {
        &self.pipeline
    }

    /// Analyses canonical grids. Any per-direction error aborts the session.
    pub async fn analyze_grids(&self, captures: Vec<(Direction, PixelGrid)>) -> Result<SkyReport> {
        check_directions(captures.iter().map(|(d, _)| *d))?;

        let sources = captures
            .into_iter()
            .map(|(direction, grid)| (direction, CaptureSource::Grid(grid)));
        let mut analyses = Vec::new();
        for (_, outcome) in self.run_all(sources).await? {
            analyses.push(outcome?);
        }

        self.pipeline.fuse(analyses, Vec::new())
    }

    /// Analyses encoded photos. A payload that cannot be turned into a grid
    /// drops only its own direction; the rest are still fused.
    pub async fn analyze_payloads(&self, captures: Vec<(Direction, Vec<u8>)>) -> Result<SkyReport> {
        check_directions(captures.iter().map(|(d, _)| *d))?;

        let sources = captures
            .into_iter()
            .map(|(direction, payload)| (direction, CaptureSource::Payload(payload)));
        let mut analyses = Vec::new();
        let mut rejected = Vec::new();
        for (direction, outcome) in self.run_all(sources).await? {
            match outcome {
                Ok(analysis) => analyses.push(analysis),
                Err(
                    e @ (SkyError::ImageDecode(_)
                    | SkyError::EmptyImage
                    | SkyError::MalformedBuffer { .. }),
                ) => {
                    warn!("dropping {direction} capture: {e}");
                    rejected.push(RejectedCapture {
                        direction,
                        reason: e.to_string(),
                    });
                }
                Err(e) => return Err(e),
            }
        }

        self.pipeline.fuse(analyses, rejected)
    }

    /// Submits everything first, then waits on all of it.
    async fn run_all(
        &self,
        sources: impl Iterator<Item = (Direction, CaptureSource)>,
    ) -> Result<Vec<(Direction, Result<DirectionalAnalysis>)>> {
        let mut directions = Vec::new();
        let mut receivers = Vec::new();
        for (direction, source) in sources {
            receivers.push(self.worker_pool.submit(direction, source)?);
            directions.push(direction);
        }

        let outcomes = join_all(receivers).await;
        Ok(directions
            .into_iter()
            .zip(outcomes)
            .map(|(direction, received)| {
                let outcome = received.unwrap_or_else(|_| {
                    Err(SkyError::WorkerFailed(format!(
                        "no result received for {direction}"
                    )))
                });
                (direction, outcome)
            })
            .collect())
    }

    pub async fn shutdown(self) {
        self.worker_pool.shutdown().await;
    }
}
