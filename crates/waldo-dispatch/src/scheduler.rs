//! Step sequences and the external scheduler contract.
//!
//! Stepped handlers return a resumable [`StepSequence`] instead of a
//! completion. No steps ever run inside the dispatch engine: the engine
//! hands the sequence to a [`StepScheduler`] and the scheduler decides
//! when each step happens. Two schedulers are provided -- an
//! [`InlineStepper`] that drains sequences on the calling thread and a
//! [`QueueingStepper`] that parks them until the host pumps it.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use waldo_types::{CommandId, CompletionCode, CompletionValue};

use crate::config::{DEFAULT_INLINE_STEP_BUDGET, DispatchConfig};
use crate::sink::CompletionSink;

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// One externally interpreted unit of work yielded by a step sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    /// Short kind tag for the driver, e.g. `"glide"`.
    pub kind: String,
    /// Structured payload the driver interprets.
    pub payload: serde_json::Value,
}

impl Step {
    /// Build a step.
    pub fn new(kind: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            kind: kind.into(),
            payload,
        }
    }
}

/// What a step sequence produced when asked to advance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// Another step for the driver; ask again afterwards.
    Step(Step),
    /// The sequence finished and this is its one real completion.
    Done(CompletionValue),
}

/// A resumable sequence of steps ending in exactly one completion.
///
/// Implementations must be idempotent past the end: once
/// [`StepOutcome::Done`] has been returned, every further call returns
/// `Done` again with an equivalent completion.
pub trait StepSequence {
    /// Advance by one step.
    fn next_step(&mut self) -> StepOutcome;

    /// The command this sequence answers, when known.
    ///
    /// Schedulers stamp it onto completions they synthesize on the
    /// sequence's behalf, such as a budget-exhaustion failure.
    fn command(&self) -> Option<CommandId> {
        None
    }
}

// ---------------------------------------------------------------------------
// Scheduler contract
// ---------------------------------------------------------------------------

/// External collaborator that drives step sequences.
pub trait StepScheduler {
    /// Drain the sequence on the calling thread and return its real
    /// completion.
    fn run_inline(&mut self, sequence: Box<dyn StepSequence>) -> CompletionValue;

    /// Park the sequence for later driving. The real completion is
    /// delivered through a sink when the host pumps the scheduler.
    fn schedule(&mut self, sequence: Box<dyn StepSequence>);
}

/// Drain a sequence to completion, guarded by an optional step budget.
///
/// With a budget of `Some(n)`, a sequence still yielding steps after `n`
/// advances is abandoned and a failed completion with
/// [`CompletionCode::StepBudgetExhausted`] is returned in its place.
pub fn drain_sequence(
    mut sequence: Box<dyn StepSequence>,
    budget: Option<u64>,
) -> CompletionValue {
    let mut steps_taken: u64 = 0;
    loop {
        match sequence.next_step() {
            StepOutcome::Done(completion) => {
                debug!(steps = steps_taken, "step sequence drained");
                return completion;
            }
            StepOutcome::Step(step) => {
                steps_taken = steps_taken.saturating_add(1);
                if let Some(limit) = budget
                    && steps_taken >= limit
                {
                    warn!(kind = %step.kind, limit, "step sequence exceeded its budget");
                    let mut failure = CompletionValue::failed(
                        CompletionCode::StepBudgetExhausted,
                        format!("step sequence abandoned after {limit} steps"),
                    );
                    failure.command_id = sequence.command();
                    return failure;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// InlineStepper
// ---------------------------------------------------------------------------

/// Scheduler that runs everything immediately on the calling thread.
///
/// `schedule` also drains immediately; the resulting completions are
/// retained and can be collected with
/// [`take_completed`](InlineStepper::take_completed). Hosts that want
/// genuinely deferred stepping should use a [`QueueingStepper`].
pub struct InlineStepper {
    step_budget: Option<u64>,
    completed: Vec<CompletionValue>,
}

impl InlineStepper {
    /// Create a stepper with the given budget; `None` removes the guard.
    pub const fn new(step_budget: Option<u64>) -> Self {
        Self {
            step_budget,
            completed: Vec::new(),
        }
    }

    /// Create a stepper adopting a dispatch configuration's step budget.
    pub const fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.inline_step_budget)
    }

    /// Completions produced by `schedule` calls so far, oldest first.
    pub fn take_completed(&mut self) -> Vec<CompletionValue> {
        std::mem::take(&mut self.completed)
    }
}

impl Default for InlineStepper {
    fn default() -> Self {
        Self::new(Some(DEFAULT_INLINE_STEP_BUDGET))
    }
}

impl StepScheduler for InlineStepper {
    fn run_inline(&mut self, sequence: Box<dyn StepSequence>) -> CompletionValue {
        drain_sequence(sequence, self.step_budget)
    }

    fn schedule(&mut self, sequence: Box<dyn StepSequence>) {
        let completion = drain_sequence(sequence, self.step_budget);
        self.completed.push(completion);
    }
}

// ---------------------------------------------------------------------------
// QueueingStepper
// ---------------------------------------------------------------------------

/// Scheduler that parks scheduled sequences until the host pumps it.
///
/// `run_inline` still drains on the spot; only `schedule` defers.
pub struct QueueingStepper {
    pending: VecDeque<Box<dyn StepSequence>>,
    step_budget: Option<u64>,
}

impl QueueingStepper {
    /// Create an empty queue with the given budget.
    pub const fn new(step_budget: Option<u64>) -> Self {
        Self {
            pending: VecDeque::new(),
            step_budget,
        }
    }

    /// Create a queue adopting a dispatch configuration's step budget.
    pub const fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.inline_step_budget)
    }

    /// Number of parked sequences.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Drain the oldest parked sequence and deliver its completion to
    /// the sink. Returns `false` when nothing was pending.
    pub fn pump_one(&mut self, sink: &mut dyn CompletionSink) -> bool {
        let Some(sequence) = self.pending.pop_front() else {
            return false;
        };
        let completion = drain_sequence(sequence, self.step_budget);
        sink.complete(completion);
        true
    }

    /// Pump until nothing is pending; returns how many sequences ran.
    pub fn pump_all(&mut self, sink: &mut dyn CompletionSink) -> usize {
        let mut ran: usize = 0;
        while self.pump_one(sink) {
            ran = ran.saturating_add(1);
        }
        ran
    }
}

impl Default for QueueingStepper {
    fn default() -> Self {
        Self::new(Some(DEFAULT_INLINE_STEP_BUDGET))
    }
}

impl StepScheduler for QueueingStepper {
    fn run_inline(&mut self, sequence: Box<dyn StepSequence>) -> CompletionValue {
        drain_sequence(sequence, self.step_budget)
    }

    fn schedule(&mut self, sequence: Box<dyn StepSequence>) {
        self.pending.push_back(sequence);
    }
}
