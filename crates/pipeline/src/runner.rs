use crate::{PipelineConfig, PipelineError, Result, ServiceRegistry};
use log::{debug, info, trace, warn};
use oasgen_har::TaggedEntry;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

/// Bounded queue in front of a single worker that feeds every entry to the
/// generator of its destination.
///
/// Producers call [`SpecPipeline::push`] from any thread; it never blocks and
/// drops the entry when the queue is full. Replays that own their pacing use
/// [`SpecPipeline::send`] instead.
pub struct SpecPipeline {
    config: PipelineConfig,
    registry: Arc<ServiceRegistry>,
    sender: Mutex<Option<mpsc::Sender<TaggedEntry>>>,
    cancel: watch::Sender<bool>,
    worker: Mutex<Option<JoinHandle<()>>>,
    started: AtomicBool,
    running: Arc<AtomicBool>,
}

impl SpecPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let (cancel, _) = watch::channel(false);
        Self {
            registry: Arc::new(ServiceRegistry::new(config.generator)),
            config,
            sender: Mutex::new(None),
            cancel,
            worker: Mutex::new(None),
            started: AtomicBool::new(false),
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Spawns the worker on the current tokio runtime. Later calls are no-ops.
    pub fn start(&self) {
        if self.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let (tx, rx) = mpsc::channel(self.config.channel_capacity.max(1));
        *self.sender.lock() = Some(tx);
        self.running.store(true, Ordering::SeqCst);

        let handle = tokio::spawn(run_worker(
            self.registry.clone(),
            rx,
            self.cancel.subscribe(),
            self.running.clone(),
        ));
        *self.worker.lock() = Some(handle);
        info!(
            "Spec pipeline started (capacity {})",
            self.config.channel_capacity
        );
    }

    /// True while the worker is consuming entries.
    pub fn is_started(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Non-blocking enqueue. Returns `false` when the entry was dropped.
    pub fn push(&self, entry: TaggedEntry) -> bool {
        let guard = self.sender.lock();
        let Some(tx) = guard.as_ref() else {
            debug!("Pipeline not accepting entries, dropping {:?}", entry.sample_id);
            return false;
        };

        match tx.try_send(entry) {
            Ok(()) => true,
            Err(TrySendError::Full(entry)) => {
                warn!(
                    "Pipeline channel full, dropping entry {:?}",
                    entry.sample_id
                );
                false
            }
            Err(TrySendError::Closed(entry)) => {
                warn!(
                    "Pipeline channel closed, dropping entry {:?}",
                    entry.sample_id
                );
                false
            }
        }
    }

    /// Enqueue, waiting for capacity.
    pub async fn send(&self, entry: TaggedEntry) -> Result<()> {
        let tx = self.sender.lock().clone();
        let Some(tx) = tx else {
            return Err(if self.started.load(Ordering::SeqCst) {
                PipelineError::Closed
            } else {
                PipelineError::NotStarted
            });
        };
        tx.send(entry).await.map_err(|_| PipelineError::Closed)
    }

    /// Stops accepting entries; the worker drains what is queued and exits.
    /// Idempotent.
    pub fn close(&self) {
        if self.sender.lock().take().is_some() {
            debug!("Spec pipeline closed");
        }
    }

    /// Signals the worker to exit after the entry in progress.
    pub fn stop(&self) {
        self.cancel.send_replace(true);
        self.close();
    }

    /// Waits for the worker to exit.
    pub async fn join(&self) {
        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!("Spec pipeline worker failed: {err}");
            }
        }
    }

    pub fn registry(&self) -> Arc<ServiceRegistry> {
        self.registry.clone()
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }
}

impl Default for SpecPipeline {
    fn default() -> Self {
        Self::new(PipelineConfig::default())
    }
}

async fn run_worker(
    registry: Arc<ServiceRegistry>,
    mut rx: mpsc::Receiver<TaggedEntry>,
    mut cancel: watch::Receiver<bool>,
    running: Arc<AtomicBool>,
) {
    let mut handled = 0u64;

    loop {
        if *cancel.borrow() {
            info!("Spec pipeline cancelled");
            break;
        }

        tokio::select! {
            biased;

            changed = cancel.changed() => {
                if changed.is_err() || *cancel.borrow() {
                    info!("Spec pipeline cancelled");
                    break;
                }
            }
            next = rx.recv() => {
                let Some(entry) = next else {
                    info!("Spec pipeline channel closed");
                    break;
                };
                handled += 1;
                match registry.route(&entry) {
                    Some(operation_id) => trace!(
                        "Handled {} as {operation_id}",
                        entry.entry.request.url
                    ),
                    None => trace!("Skipped {}", entry.entry.request.url),
                }
            }
        }
    }

    running.store(false, Ordering::SeqCst);
    debug!("Spec pipeline worker exiting after {handled} entries");
}
