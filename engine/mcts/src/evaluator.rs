//! Evaluator traits for position evaluation.
//!
//! The evaluator provides policy (action probabilities) and value estimates
//! for encoded game states. In AlphaZero, this is a neural network. For
//! testing, we provide a uniform evaluator that returns equal priors.
//!
//! Two traits live here:
//! - [`Evaluator`] is the batch interface a model implements.
//! - [`LeafEvaluator`] is what a search tree calls for one leaf at a time.
//!   [`RequestCoalescer`](crate::RequestCoalescer) implements it by batching
//!   concurrent calls; [`Unbatched`] forwards each call as a batch of one.

use std::time::Duration;

use async_trait::async_trait;
use engine_core::EncodedState;
use thiserror::Error;

/// Errors that can occur during evaluation.
///
/// `Clone` so that a single failure can be delivered to every request of a
/// batch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvaluatorError {
    #[error("Evaluation failed: {0}")]
    EvaluationFailed(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Model error: {0}")]
    ModelError(String),

    #[error("Evaluation timed out after {0:?}")]
    Timeout(Duration),

    #[error("Evaluator returned {actual} results for a batch of {expected}")]
    BatchSizeMismatch { expected: usize, actual: usize },

    #[error("Request coalescer is closed")]
    CoalescerClosed,
}

/// Result of evaluating a game state.
#[derive(Debug, Clone, PartialEq)]
pub struct EvalResult {
    /// Policy: probability distribution over actions.
    /// Index i corresponds to action i. Entries for illegal actions are
    /// ignored by the search.
    pub policy: Vec<f32>,

    /// Value estimate for the player to move.
    /// Range: -1.0 (certain loss) to +1.0 (certain win).
    pub value: f32,
}

/// Trait for batch position evaluators.
///
/// Implementations must return exactly one result per input, in input order.
#[async_trait]
pub trait Evaluator: Send + Sync {
    async fn evaluate_batch(
        &self,
        inputs: Vec<EncodedState>,
    ) -> Result<Vec<EvalResult>, EvaluatorError>;
}

/// Single-position evaluation as seen by a search tree.
#[async_trait]
pub trait LeafEvaluator: Send + Sync {
    async fn evaluate(&self, input: EncodedState) -> Result<EvalResult, EvaluatorError>;
}

/// Adapter that sends every leaf straight to the wrapped [`Evaluator`] as a
/// batch of one. Useful for single-game search and tests.
#[derive(Debug, Clone, Default)]
pub struct Unbatched<E>(pub E);

#[async_trait]
impl<E: Evaluator> LeafEvaluator for Unbatched<E> {
    async fn evaluate(&self, input: EncodedState) -> Result<EvalResult, EvaluatorError> {
        let mut results = self.0.evaluate_batch(vec![input]).await?;
        if results.len() != 1 {
            return Err(EvaluatorError::BatchSizeMismatch {
                expected: 1,
                actual: results.len(),
            });
        }
        Ok(results.swap_remove(0))
    }
}

/// Uniform evaluator that assigns equal probability to every action.
/// Value is always 0.0 (neutral). Useful for testing MCTS without a model;
/// the search renormalizes the policy over the legal actions.
#[derive(Debug, Clone)]
pub struct UniformEvaluator {
    num_actions: usize,
    latency: Option<Duration>,
}

impl UniformEvaluator {
    pub fn new(num_actions: usize) -> Self {
        Self {
            num_actions,
            latency: None,
        }
    }

    /// Sleep for `latency` per batch, standing in for model inference time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = (!latency.is_zero()).then_some(latency);
        self
    }
}

#[async_trait]
impl Evaluator for UniformEvaluator {
    async fn evaluate_batch(
        &self,
        inputs: Vec<EncodedState>,
    ) -> Result<Vec<EvalResult>, EvaluatorError> {
        if self.num_actions == 0 {
            return Err(EvaluatorError::InvalidState(
                "uniform evaluator needs at least one action".into(),
            ));
        }
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }

        let prob = 1.0 / self.num_actions as f32;
        Ok(inputs
            .iter()
            .map(|_| EvalResult {
                policy: vec![prob; self.num_actions],
                value: 0.0,
            })
            .collect())
    }
}
