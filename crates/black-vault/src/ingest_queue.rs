//! IngestQueue — a bounded worker pool fanning file-ingestion jobs out
//! across `W` workers while the Store's single mutex serializes the actual
//! writes (§4.4, §5). Index rebuilds are deferred until the queue drains so
//! a burst of ingests pays for one HNSW/BM25 rebuild instead of one per file.

use std::sync::Arc;

use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

use crate::ingester::Ingester;
use crate::store::Store;
use crate::types::IngestOutcome;

pub struct IngestJob {
    pub source_path: String,
    pub source_type: String,
    pub text: String,
    pub source_mtime: i64,
}

pub struct IngestQueue {
    sender: mpsc::Sender<(IngestJob, mpsc::Sender<IngestOutcome>)>,
    workers: Vec<JoinHandle<()>>,
    store: Arc<Store>,
}

impl IngestQueue {
    /// Spawn `workers` tasks pulling jobs off a shared channel, each running
    /// its own clone of `ingester` (cheap — every field is an `Arc`).
    pub fn spawn(store: Arc<Store>, workers: usize, ingester: Ingester) -> Self {
        let (sender, receiver) = mpsc::channel::<(IngestJob, mpsc::Sender<IngestOutcome>)>(256);
        let receiver = Arc::new(Mutex::new(receiver));

        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            let receiver = receiver.clone();
            let ingester = ingester.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let job = {
                        let mut rx = receiver.lock().await;
                        rx.recv().await
                    };
                    let Some((job, reply)) = job else { break };
                    let outcome = ingester
                        .ingest_text(&job.source_path, &job.source_type, &job.text, job.source_mtime)
                        .await;
                    let _ = reply.send(outcome).await;
                }
            }));
        }

        Self {
            sender,
            workers: handles,
            store,
        }
    }

    /// Submit a job and await its outcome.
    pub async fn submit(&self, job: IngestJob) -> IngestOutcome {
        let (reply_tx, mut reply_rx) = mpsc::channel(1);
        if self.sender.send((job, reply_tx)).await.is_err() {
            return IngestQueue::shutdown_outcome("ingest queue is shut down");
        }
        reply_rx
            .recv()
            .await
            .unwrap_or_else(|| IngestQueue::shutdown_outcome("ingest worker dropped the reply channel"))
    }

    /// Submit a batch and rebuild both indexes once after all jobs complete,
    /// rather than once per file.
    pub async fn submit_batch(&self, jobs: Vec<IngestJob>) -> crate::error::Result<Vec<IngestOutcome>> {
        let mut outcomes = Vec::with_capacity(jobs.len());
        for job in jobs {
            outcomes.push(self.submit(job).await);
        }
        self.store.rebuild_vector_index(false).await?;
        self.store.rebuild_text_index().await?;
        Ok(outcomes)
    }

    pub async fn shutdown(self) {
        drop(self.sender);
        for handle in self.workers {
            let _ = handle.await;
        }
    }

    fn shutdown_outcome(message: &str) -> IngestOutcome {
        IngestOutcome {
            path: String::new(),
            success: false,
            item_id: None,
            is_duplicate: false,
            duplicate_id: None,
            error: Some(message.to_string()),
        }
    }
}
