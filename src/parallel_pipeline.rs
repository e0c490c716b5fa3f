// THEORY:
// The `parallel_pipeline` module runs many independent comparisons at once. The
// engine itself stays synchronous and single-threaded per pair; parallelism only
// comes from running *different* pairs on different workers.
//
// Key architectural principles:
// 1.  **Worker Pool**: A dispatcher hands tasks round-robin to a fixed set of
//     workers (one per CPU). Each worker decodes both images and runs the
//     pipeline inside `spawn_blocking`, so CPU-bound work never stalls the
//     async runtime.
// 2.  **Ordered Results**: Every task carries a oneshot reply channel. Replies are
//     awaited in submission order, so results and store appends follow the
//     order of the input list regardless of which worker finishes first.
// 3.  **One In-Flight Comparison per Pair**: Identical pairs inside a batch are
//     collapsed before dispatch; the duplicate is reported as skipped instead of
//     being compared concurrently with itself.

use crate::core_modules::error::{SourceError, StoreError};
use crate::pipeline::{ComparisonResult, QualityPipeline};
use crate::record::MetricsRecord;
use crate::source::load_image;
use crate::store::MetricsStore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};

/// One entry of a batch manifest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BatchPair {
    pub image1: PathBuf,
    pub image2: PathBuf,
}

/// A successfully decoded and compared pair.
#[derive(Debug, Clone)]
pub struct PairComparison {
    pub image1: String,
    pub image2: String,
    pub result: ComparisonResult,
}

/// What happened to one entry of the batch.
#[derive(Debug)]
pub enum BatchOutcome {
    Compared(PairComparison),
    /// The images decoded but differ in size; nothing was stored.
    Incomparable(PairComparison),
    /// An identical pair appeared earlier in the same batch.
    Duplicate(BatchPair),
    Failed { pair: BatchPair, error: SourceError },
}

type TaskReply = Result<PairComparison, SourceError>;

struct PairTask {
    pair: BatchPair,
    result_sender: oneshot::Sender<TaskReply>,
}

pub struct WorkerPool {
    task_sender: mpsc::UnboundedSender<PairTask>,
    workers: Vec<tokio::task::JoinHandle<()>>,
}

impl WorkerPool {
    /// Spawns the dispatcher and `worker_count` workers on the current runtime.
    pub fn new(pipeline: QualityPipeline, worker_count: usize) -> Self {
        let worker_count = worker_count.max(1);
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<PairTask>();
        let mut workers = Vec::with_capacity(worker_count);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<PairTask>())
            .unzip();

        tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                let _ = worker_senders[worker_idx].send(task);
                worker_idx = (worker_idx + 1) % worker_count;
            }
        });

        for mut worker_receiver in worker_receivers {
            let worker_pipeline = pipeline.clone();
            let worker = tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    let pipeline = worker_pipeline.clone();
                    let pair = task.pair;
                    let path = pair.image1.clone();
                    let reply = run_blocking(path, move || Self::compare_pair(&pipeline, &pair)).await;
                    let _ = task.result_sender.send(reply);
                }
            });
            workers.push(worker);
        }

        Self {
            task_sender,
            workers,
        }
    }

    fn compare_pair(pipeline: &QualityPipeline, pair: &BatchPair) -> TaskReply {
        let first = load_image(&pair.image1)?;
        let second = load_image(&pair.image2)?;
        Ok(PairComparison {
            result: pipeline.compare(&first.raster, &second.raster),
            image1: first.name,
            image2: second.name,
        })
    }

    pub fn worker_count(&self) -> usize {
        self.workers.len()
    }

    /// Queues a pair and returns the channel its result will arrive on.
    fn submit(&self, pair: BatchPair) -> Result<oneshot::Receiver<TaskReply>, &'static str> {
        let (result_sender, result_receiver) = oneshot::channel();
        self.task_sender
            .send(PairTask {
                pair,
                result_sender,
            })
            .map_err(|_| "Failed to send task to worker pool")?;
        Ok(result_receiver)
    }
}

/// Runs a list of pairs through a worker pool and records the results.
pub struct BatchRunner {
    pool: WorkerPool,
}

impl BatchRunner {
    pub fn new(pipeline: QualityPipeline) -> Self {
        Self::with_workers(pipeline, num_cpus::get())
    }

    pub fn with_workers(pipeline: QualityPipeline, worker_count: usize) -> Self {
        Self {
            pool: WorkerPool::new(pipeline, worker_count),
        }
    }

    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    /// Compares every pair and appends comparable results to `store` in input
    /// order. Decoding failures are reported per pair and do not stop the batch.
    pub async fn run<S: MetricsStore>(
        &self,
        pairs: Vec<BatchPair>,
        store: &mut S,
    ) -> Result<Vec<BatchOutcome>, StoreError> {
        let mut seen = HashSet::new();
        let mut pending = Vec::with_capacity(pairs.len());
        for pair in pairs {
            if !seen.insert(pair.clone()) {
                warn!(?pair, "duplicate pair in batch, skipping");
                pending.push((pair, None));
                continue;
            }
            let receiver = self.pool.submit(pair.clone()).ok();
            pending.push((pair, Some(receiver)));
        }

        let replies = futures::future::join_all(pending.into_iter().map(|(pair, receiver)| async move {
            let reply = match receiver {
                None => None,
                Some(Some(receiver)) => Some(receiver.await.unwrap_or_else(|_| Err(worker_gone(&pair)))),
                Some(None) => Some(Err(worker_gone(&pair))),
            };
            (pair, reply)
        }))
        .await;

        let mut outcomes = Vec::with_capacity(replies.len());
        for (pair, reply) in replies {
            let outcome = match reply {
                None => BatchOutcome::Duplicate(pair),
                Some(Err(error)) => {
                    warn!(?pair, %error, "pair failed");
                    BatchOutcome::Failed { pair, error }
                }
                Some(Ok(comparison)) if comparison.result.is_comparable() => {
                    store.append(MetricsRecord::build(
                        &comparison.image1,
                        &comparison.image2,
                        &comparison.result,
                    ))?;
                    BatchOutcome::Compared(comparison)
                }
                Some(Ok(comparison)) => BatchOutcome::Incomparable(comparison),
            };
            outcomes.push(outcome);
        }

        info!(pairs = outcomes.len(), "batch finished");
        Ok(outcomes)
    }
}

/// Runs `job` off the async threads. A panic inside it becomes a
/// `SourceError::Worker` against `path`.
async fn run_blocking<F>(path: PathBuf, job: F) -> TaskReply
where
    F: FnOnce() -> TaskReply + Send + 'static,
{
    tokio::task::spawn_blocking(job)
        .await
        .unwrap_or_else(|join_error| {
            Err(SourceError::Worker {
                path,
                message: join_error.to_string(),
            })
        })
}

fn worker_gone(pair: &BatchPair) -> SourceError {
    SourceError::Worker {
        path: pair.image1.clone(),
        message: "Failed to receive result from worker".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use image::{ImageEncoder, codecs::png::PngEncoder};
    use std::path::Path;

    fn write_png(dir: &Path, name: &str, width: u32, height: u32, value: u8) -> PathBuf {
        let path = dir.join(name);
        let mut rgba = Vec::with_capacity((width * height * 4) as usize);
        for i in 0..(width * height) {
            let v = value.wrapping_add((i % 17) as u8);
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
        let file = std::fs::File::create(&path).unwrap();
        PngEncoder::new(file)
            .write_image(&rgba, width, height, image::ExtendedColorType::Rgba8)
            .unwrap();
        path
    }

    fn pair(image1: &Path, image2: &Path) -> BatchPair {
        BatchPair {
            image1: image1.to_path_buf(),
            image2: image2.to_path_buf(),
        }
    }

    #[tokio::test]
    async fn results_follow_submission_order() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 16, 16, 10);
        let b = write_png(dir.path(), "b.png", 16, 16, 40);
        let c = write_png(dir.path(), "c.png", 16, 16, 90);

        let runner = BatchRunner::with_workers(QualityPipeline::default(), 3);
        let mut store = MemoryStore::new();
        let outcomes = runner
            .run(vec![pair(&a, &b), pair(&b, &c), pair(&a, &c)], &mut store)
            .await
            .unwrap();

        assert_eq!(outcomes.len(), 3);
        let names: Vec<(String, String)> = store
            .records()
            .iter()
            .map(|r| (r.image1.clone(), r.image2.clone()))
            .collect();
        assert_eq!(
            names,
            vec![
                ("a.png".to_string(), "b.png".to_string()),
                ("b.png".to_string(), "c.png".to_string()),
                ("a.png".to_string(), "c.png".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn duplicates_mismatches_and_failures_are_not_stored() {
        let dir = tempfile::tempdir().unwrap();
        let a = write_png(dir.path(), "a.png", 8, 8, 0);
        let b = write_png(dir.path(), "b.png", 8, 8, 50);
        let small = write_png(dir.path(), "small.png", 4, 4, 0);
        let missing = dir.path().join("missing.png");

        let runner = BatchRunner::with_workers(QualityPipeline::default(), 2);
        let mut store = MemoryStore::new();
        let outcomes = runner
            .run(
                vec![pair(&a, &b), pair(&a, &b), pair(&a, &small), pair(&a, &missing)],
                &mut store,
            )
            .await
            .unwrap();

        assert!(matches!(outcomes[0], BatchOutcome::Compared(_)));
        assert!(matches!(outcomes[1], BatchOutcome::Duplicate(_)));
        assert!(matches!(outcomes[2], BatchOutcome::Incomparable(_)));
        assert!(matches!(
            outcomes[3],
            BatchOutcome::Failed {
                error: SourceError::Io { .. },
                ..
            }
        ));
        assert_eq!(store.records().len(), 1);
    }

    #[tokio::test]
    async fn default_pool_uses_every_cpu() {
        let runner = BatchRunner::new(QualityPipeline::default());
        assert_eq!(runner.worker_count(), num_cpus::get().max(1));
    }

    #[tokio::test]
    async fn panicking_worker_is_reported_against_its_pair() {
        let error = run_blocking(PathBuf::from("a.png"), || panic!("comparison blew up"))
            .await
            .unwrap_err();
        assert!(matches!(&error, SourceError::Worker { path, .. } if path == Path::new("a.png")));
        assert!(error.to_string().starts_with("worker failed on a.png"));
    }

    #[test]
    fn lost_reply_names_the_pair() {
        let error = worker_gone(&pair(Path::new("left.png"), Path::new("right.png")));
        assert!(matches!(error, SourceError::Worker { ref path, .. } if path == Path::new("left.png")));
    }

    #[test]
    fn manifest_entries_deserialize() {
        let pairs: Vec<BatchPair> =
            serde_json::from_str(r#"[{"image1": "x.png", "image2": "y.webp"}]"#).unwrap();
        assert_eq!(pairs[0].image2, PathBuf::from("y.webp"));
    }
}
