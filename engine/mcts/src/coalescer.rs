//! Adaptive request coalescing for batched evaluation.
//!
//! Many search trees running concurrently each need one leaf evaluated at a
//! time. The [`RequestCoalescer`] gathers those single requests into batches
//! so the [`Evaluator`] sees as few, as large calls as possible.
//!
//! A batch is flushed when the queue reaches the target batch size or when
//! the adaptive wait interval has passed since the first request was queued,
//! whichever comes first. After every flush the target is set to the number
//! of requests in that flush, and the wait interval to a fraction of the last
//! evaluator round-trip, clamped to `[min_wait, max_wait]`. With `k` callers
//! that resubmit as soon as they get an answer, the batch size settles at `k`.
//!
//! A single background task owns the flush loop, so at most one evaluator
//! call is in flight per coalescer.

use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use engine_core::EncodedState;
use tokio::sync::{oneshot, Notify};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::evaluator::{EvalResult, Evaluator, EvaluatorError, LeafEvaluator};

/// Coalescer tuning.
#[derive(Debug, Clone)]
pub struct CoalescerConfig {
    /// Target batch size before the first flush
    pub initial_target: usize,
    /// Upper bound on the wait interval
    pub max_wait: Duration,
    /// Lower bound on the wait interval
    pub min_wait: Duration,
    /// Share of the last evaluator latency used as the next wait interval
    pub wait_fraction: f64,
    /// Fail the whole batch if the evaluator takes longer than this
    pub eval_timeout: Option<Duration>,
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            initial_target: 1,
            max_wait: Duration::from_millis(10),
            min_wait: Duration::from_millis(1),
            wait_fraction: 0.9,
            eval_timeout: None,
        }
    }
}

impl CoalescerConfig {
    pub fn with_initial_target(mut self, target: usize) -> Self {
        self.initial_target = target;
        self
    }

    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    pub fn with_min_wait(mut self, min_wait: Duration) -> Self {
        self.min_wait = min_wait;
        self
    }

    pub fn with_eval_timeout(mut self, timeout: Duration) -> Self {
        self.eval_timeout = Some(timeout);
        self
    }

    /// Next wait interval for an evaluator round-trip of `latency`.
    fn wait_for_latency(&self, latency: Duration) -> Duration {
        let max = self.max_wait.max(self.min_wait);
        latency
            .mul_f64(self.wait_fraction.max(0.0))
            .clamp(self.min_wait, max)
    }
}

/// Shared count of callers that may still submit requests.
///
/// When attached to a coalescer, the flush threshold never exceeds this
/// count, so finished callers are not waited for.
#[derive(Debug, Clone, Default)]
pub struct ActiveCallers(Arc<AtomicUsize>);

impl ActiveCallers {
    pub fn new(count: usize) -> Self {
        Self(Arc::new(AtomicUsize::new(count)))
    }

    pub fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, count: usize) {
        self.0.store(count, Ordering::Release);
    }

    pub fn increment(&self) {
        self.0.fetch_add(1, Ordering::AcqRel);
    }

    /// Decrement, saturating at zero.
    pub fn decrement(&self) {
        let _ = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }

    /// Guard that decrements the count when dropped.
    pub fn release_on_drop(&self) -> CallerGuard {
        CallerGuard(self.clone())
    }
}

/// Decrements an [`ActiveCallers`] count on drop.
#[derive(Debug)]
pub struct CallerGuard(ActiveCallers);

impl Drop for CallerGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Snapshot of coalescer activity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoalescerStats {
    /// Evaluator calls made
    pub batches: u64,
    /// Requests evaluated across all batches
    pub items: u64,
    /// Batches whose requests all received an error
    pub failed_batches: u64,
    pub last_batch_size: usize,
    pub max_batch_size: usize,
    /// Current target batch size
    pub target_batch_size: usize,
    /// Current wait interval
    pub wait: Duration,
    /// Round-trip time of the last evaluator call
    pub last_latency: Duration,
}

impl CoalescerStats {
    pub fn mean_batch_size(&self) -> f64 {
        if self.batches == 0 {
            0.0
        } else {
            self.items as f64 / self.batches as f64
        }
    }
}

type Reply = oneshot::Sender<Result<EvalResult, EvaluatorError>>;

struct PendingRequest {
    input: EncodedState,
    reply: Reply,
}

#[derive(Default)]
struct Queue {
    requests: Vec<PendingRequest>,
    /// When the oldest queued request arrived
    first_at: Option<Instant>,
}

struct Shared {
    queue: Mutex<Queue>,
    stats: Mutex<CoalescerStats>,
    notify: Notify,
    evaluator: Arc<dyn Evaluator>,
    config: CoalescerConfig,
    active: Option<ActiveCallers>,
}

/// Batches concurrent single-leaf evaluations into evaluator calls.
///
/// Must be created inside a Tokio runtime: construction spawns the flush
/// task. Dropping the coalescer stops that task and fails any request still
/// queued with [`EvaluatorError::CoalescerClosed`].
pub struct RequestCoalescer {
    shared: Arc<Shared>,
    flusher: JoinHandle<()>,
}

impl RequestCoalescer {
    pub fn new(evaluator: Arc<dyn Evaluator>, config: CoalescerConfig) -> Self {
        Self::build(evaluator, config, None)
    }

    /// Coalescer whose flush threshold is capped by `active`.
    pub fn with_active_callers(
        evaluator: Arc<dyn Evaluator>,
        config: CoalescerConfig,
        active: ActiveCallers,
    ) -> Self {
        Self::build(evaluator, config, Some(active))
    }

    fn build(
        evaluator: Arc<dyn Evaluator>,
        config: CoalescerConfig,
        active: Option<ActiveCallers>,
    ) -> Self {
        let stats = CoalescerStats {
            target_batch_size: config.initial_target.max(1),
            wait: config.max_wait.max(config.min_wait),
            ..CoalescerStats::default()
        };
        let shared = Arc::new(Shared {
            queue: Mutex::new(Queue::default()),
            stats: Mutex::new(stats),
            notify: Notify::new(),
            evaluator,
            config,
            active,
        });
        let flusher = tokio::spawn(run_flusher(shared.clone()));
        Self { shared, flusher }
    }

    /// Queue `input` for evaluation and wait for its result.
    pub async fn submit(&self, input: EncodedState) -> Result<EvalResult, EvaluatorError> {
        let (reply, rx) = oneshot::channel();
        {
            let mut queue = lock(&self.shared.queue);
            if queue.requests.is_empty() {
                queue.first_at = Some(Instant::now());
            }
            queue.requests.push(PendingRequest { input, reply });
        }
        self.shared.notify.notify_one();

        // Nobody left to flush: fail whatever is queued, this request included
        if self.flusher.is_finished() {
            for request in self.shared.drain() {
                let _ = request.reply.send(Err(EvaluatorError::CoalescerClosed));
            }
        }

        rx.await.map_err(|_| EvaluatorError::CoalescerClosed)?
    }

    /// Requests queued but not yet sent to the evaluator.
    pub fn pending(&self) -> usize {
        lock(&self.shared.queue).requests.len()
    }

    pub fn stats(&self) -> CoalescerStats {
        lock(&self.shared.stats).clone()
    }

    pub fn active_callers(&self) -> Option<&ActiveCallers> {
        self.shared.active.as_ref()
    }
}

impl Drop for RequestCoalescer {
    fn drop(&mut self) {
        self.flusher.abort();
        let orphaned = std::mem::take(&mut lock(&self.shared.queue).requests);
        for request in orphaned {
            let _ = request.reply.send(Err(EvaluatorError::CoalescerClosed));
        }
    }
}

#[async_trait]
impl LeafEvaluator for RequestCoalescer {
    async fn evaluate(&self, input: EncodedState) -> Result<EvalResult, EvaluatorError> {
        self.submit(input).await
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(message) => *message,
        Err(payload) => payload
            .downcast_ref::<&str>()
            .map(|message| message.to_string())
            .unwrap_or_else(|| "panic".to_string()),
    }
}

impl Shared {
    /// Queue length needed to flush before the deadline.
    fn threshold(&self) -> usize {
        let target = lock(&self.stats).target_batch_size;
        let target = match self.active.as_ref().map(ActiveCallers::get) {
            Some(active) if active > 0 => target.min(active),
            _ => target,
        };
        target.max(1)
    }

    fn wait(&self) -> Duration {
        lock(&self.stats).wait
    }

    fn drain(&self) -> Vec<PendingRequest> {
        let mut queue = lock(&self.queue);
        queue.first_at = None;
        std::mem::take(&mut queue.requests)
    }

    /// Run one evaluator call on its own task.
    ///
    /// A panicking evaluator fails the batch instead of the flush loop.
    async fn call_evaluator(
        &self,
        inputs: Vec<EncodedState>,
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        let evaluator = self.evaluator.clone();
        let mut call = tokio::spawn(async move { evaluator.evaluate_batch(inputs).await });

        let joined = match self.config.eval_timeout {
            Some(limit) => match tokio::time::timeout(limit, &mut call).await {
                Ok(joined) => joined,
                Err(_) => {
                    call.abort();
                    return Err(EvaluatorError::Timeout(limit));
                }
            },
            None => call.await,
        };

        joined.unwrap_or_else(|e| {
            let reason = if e.is_panic() {
                panic_message(e.into_panic())
            } else {
                e.to_string()
            };
            Err(EvaluatorError::EvaluationFailed(format!(
                "evaluator task failed: {reason}"
            )))
        })
    }

    async fn flush(&self, batch: Vec<PendingRequest>) {
        let size = batch.len();
        let (inputs, replies): (Vec<EncodedState>, Vec<Reply>) = batch
            .into_iter()
            .map(|request| (request.input, request.reply))
            .unzip();

        let started = Instant::now();
        let result = self.call_evaluator(inputs).await;
        let latency = started.elapsed();

        let result = result.and_then(|outputs| {
            if outputs.len() == size {
                Ok(outputs)
            } else {
                Err(EvaluatorError::BatchSizeMismatch {
                    expected: size,
                    actual: outputs.len(),
                })
            }
        });

        // Stats first, so a caller woken by its reply sees this batch
        let failed = result.is_err();
        let wait = self.config.wait_for_latency(latency);
        {
            let mut stats = lock(&self.stats);
            stats.batches += 1;
            stats.items += size as u64;
            stats.failed_batches += failed as u64;
            stats.last_batch_size = size;
            stats.max_batch_size = stats.max_batch_size.max(size);
            stats.target_batch_size = size.max(1);
            stats.wait = wait;
            stats.last_latency = latency;
        }

        match result {
            Ok(outputs) => {
                for (reply, output) in replies.into_iter().zip(outputs) {
                    let _ = reply.send(Ok(output));
                }
            }
            Err(e) => {
                warn!(batch_size = size, error = %e, "Evaluation batch failed");
                for reply in replies {
                    let _ = reply.send(Err(e.clone()));
                }
            }
        }

        debug!(
            batch_size = size,
            latency_us = latency.as_micros() as u64,
            next_wait_us = wait.as_micros() as u64,
            failed,
            "Flushed evaluation batch"
        );
    }
}

async fn run_flusher(shared: Arc<Shared>) {
    loop {
        // Wait for the first request of the next batch
        let first_at = loop {
            if let Some(first_at) = lock(&shared.queue).first_at {
                break first_at;
            }
            shared.notify.notified().await;
        };

        // Then for a full batch or the deadline
        loop {
            let queued = lock(&shared.queue).requests.len();
            if queued >= shared.threshold() {
                break;
            }
            let deadline = first_at + shared.wait();
            if Instant::now() >= deadline {
                break;
            }
            tokio::select! {
                _ = shared.notify.notified() => {}
                _ = tokio::time::sleep_until(deadline) => break,
            }
        }

        let batch = shared.drain();
        if !batch.is_empty() {
            shared.flush(batch).await;
        }
    }
}
