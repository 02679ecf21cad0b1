//! Action executor: the single consumer that owns all device calls
//!
//! Producers (bus handlers, monitoring layers) only touch the queue and the
//! control flags; the consumer task is the one place a gateway call can
//! originate, so at most one action is ever in flight. The nominal-duration
//! wait is a polling sleep in small increments, which bounds stop latency to
//! one poll interval rather than the remaining duration.

use crate::catalog::ActionCatalog;
use crate::config::{INTERRUPT_POLL, INTER_ACTION_PAUSE, QUEUE_POLL};
use crate::gateway::DeviceGateway;
use crate::queue::{ActionQueue, ActionRequest, SubmitError};
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};
use tracing::{error, info, warn};

/// Executor pacing and stop policy
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Action re-enqueued after an immediate stop so the device ends in a
    /// known state; `None` leaves the device wherever the stop caught it.
    pub post_stop_recovery_action: Option<String>,
    /// Bounded wait of the consumer's queue poll
    pub queue_poll: Duration,
    /// Granularity of the interruptible nominal-duration wait
    pub interrupt_poll: Duration,
    /// Settling pause between consecutive actions
    pub inter_action_pause: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            post_stop_recovery_action: Some("stand".into()),
            queue_poll: QUEUE_POLL,
            interrupt_poll: INTERRUPT_POLL,
            inter_action_pause: INTER_ACTION_PAUSE,
        }
    }
}

/// What the executor is doing right now; `name: None` means idle
#[derive(Debug, Clone, Serialize)]
pub struct CurrentAction {
    pub name: Option<String>,
    pub duration: Duration,
}

impl CurrentAction {
    fn idle() -> Self {
        Self {
            name: None,
            duration: Duration::ZERO,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.name.is_none()
    }
}

/// Point-in-time status snapshot for monitoring layers
#[derive(Debug, Clone, Serialize)]
pub struct ExecutorStatus {
    pub queue: Vec<ActionRequest>,
    pub current: CurrentAction,
    pub is_running: bool,
}

/// Control-surface name that triggers an immediate stop instead of enqueueing
const STOP_NAME: &str = "stop";

/// Serializes action execution against the device gateway
pub struct ActionExecutor {
    catalog: Arc<ActionCatalog>,
    queue: ActionQueue,
    gateway: Arc<dyn DeviceGateway>,
    config: ExecutorConfig,
    current: RwLock<CurrentAction>,
    is_running: AtomicBool,
    /// Set by the control surface, consumed by the consumer's drain path
    immediate_stop: AtomicBool,
    shutting_down: AtomicBool,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ActionExecutor {
    pub fn new(
        catalog: Arc<ActionCatalog>,
        gateway: Arc<dyn DeviceGateway>,
        config: ExecutorConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            queue: ActionQueue::new(catalog.clone()),
            catalog,
            gateway,
            config,
            current: RwLock::new(CurrentAction::idle()),
            is_running: AtomicBool::new(false),
            immediate_stop: AtomicBool::new(false),
            shutting_down: AtomicBool::new(false),
            worker: Mutex::new(None),
        })
    }

    /// Start the consumer task. Must be called exactly once.
    pub async fn start(self: &Arc<Self>) {
        let mut worker = self.worker.lock().await;
        if worker.is_some() {
            panic!("Action executor already started");
        }
        let executor = self.clone();
        *worker = Some(tokio::spawn(async move { executor.consume().await }));
    }

    /// Submit an action by name. The `stop` name is a control operation and
    /// is never enqueued. Returns the queued request id, if any.
    pub async fn submit(&self, name: &str) -> Result<Option<uuid::Uuid>, SubmitError> {
        if name == STOP_NAME {
            self.stop().await;
            return Ok(None);
        }
        let id = self.queue.enqueue(name).await?;
        Ok(Some(id))
    }

    /// Remove a pending request; no effect on an in-flight action.
    pub async fn cancel(&self, id: uuid::Uuid) -> bool {
        let removed = self.queue.remove_by_id(id).await;
        if removed {
            info!("Cancelled pending request {}", id);
        }
        removed
    }

    /// Flush all pending requests without touching the in-flight action.
    pub async fn clear_all(&self) -> usize {
        let cleared = self.queue.clear().await;
        info!("Cleared {} pending request(s)", cleared);
        cleared
    }

    /// Immediate stop: interrupt the in-flight wait, halt the device, flush
    /// pending work. The consumer issues the device halt and re-enqueues the
    /// recovery action, so the halt always precedes the recovery motion.
    pub async fn stop(&self) {
        info!("Immediate stop requested");
        self.immediate_stop.store(true, Ordering::SeqCst);
        self.queue.clear().await;
    }

    pub async fn status(&self) -> ExecutorStatus {
        ExecutorStatus {
            queue: self.queue.snapshot().await,
            current: self.current.read().await.clone(),
            is_running: self.is_running.load(Ordering::SeqCst),
        }
    }

    /// Stop the consumer after its current dispatch/wait and join it.
    /// A second call is a logged no-op.
    pub async fn shutdown(&self) {
        if self.shutting_down.swap(true, Ordering::SeqCst) {
            warn!("Shutdown already requested");
            return;
        }
        let handle = self.worker.lock().await.take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                error!("Consumer task terminated abnormally: {}", e);
            }
        }
        info!("Action executor stopped");
    }

    async fn consume(&self) {
        info!("Action consumer started (gateway: {})", self.gateway.name());

        loop {
            if self.shutting_down.load(Ordering::SeqCst) {
                break;
            }

            if self.immediate_stop.swap(false, Ordering::SeqCst) {
                self.drain().await;
                continue;
            }

            match self.queue.pop_next(self.config.queue_poll).await {
                Some(request) => {
                    self.is_running.store(true, Ordering::SeqCst);
                    self.execute(request).await;
                    self.interruptible_wait(self.config.inter_action_pause).await;
                }
                None => {
                    self.is_running.store(false, Ordering::SeqCst);
                }
            }
        }

        info!("Action consumer exiting");
    }

    /// Drain path after an immediate stop: halt the device, drop anything
    /// that raced into the queue, queue the recovery motion, go idle.
    async fn drain(&self) {
        if let Err(e) = self.gateway.stop().await {
            // Best effort: local state goes idle even without confirmation
            error!("Device halt failed: {:#}", e);
        }
        self.queue.clear().await;
        *self.current.write().await = CurrentAction::idle();
        self.is_running.store(false, Ordering::SeqCst);

        if let Some(recovery) = &self.config.post_stop_recovery_action {
            match self.queue.enqueue(recovery).await {
                Ok(id) => info!("Queued recovery action '{}' as {}", recovery, id),
                Err(e) => warn!("Recovery action rejected: {}", e),
            }
        }
    }

    async fn execute(&self, request: ActionRequest) {
        let Some(definition) = self.catalog.lookup(&request.name) else {
            // Enqueue validates names, so this only fires if the catalog and
            // queue disagree about the deployment variant.
            warn!("Popped request for unknown action '{}', dropping", request.name);
            return;
        };

        *self.current.write().await = CurrentAction {
            name: Some(definition.display_name.to_string()),
            duration: definition.duration,
        };
        info!(
            "Executing '{}' ({:.1}s nominal)",
            request.name,
            definition.duration.as_secs_f32()
        );

        if let Err(e) = self.gateway.execute(definition).await {
            // Best-effort dispatch: the device may have partially started, so
            // the nominal-duration wait below still elapses.
            error!("Dispatch of '{}' failed: {:#}", request.name, e);
        }

        let interrupted = self.interruptible_wait(definition.duration).await;
        if interrupted {
            info!("Wait for '{}' interrupted", request.name);
        }

        *self.current.write().await = CurrentAction::idle();
    }

    /// Sleep out `duration` in poll-sized increments, bailing as soon as an
    /// immediate stop or shutdown is signaled. Returns true when interrupted.
    async fn interruptible_wait(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.immediate_stop.load(Ordering::SeqCst)
                || self.shutting_down.load(Ordering::SeqCst)
            {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            sleep(self.config.interrupt_poll.min(deadline - now)).await;
        }
    }
}
