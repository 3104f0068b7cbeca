//! Completion delivery: the sink contract and the provided holders.
//!
//! The engine pushes every completion it produces into a
//! [`CompletionSink`]. What happens next is the host's business -- a real
//! driver forwards completions to whatever observes the agent; tests
//! record them.

use std::collections::BTreeMap;

use tracing::warn;
use waldo_types::{CommandId, CompletionValue};

/// Receiver for the single completion each dispatch produces.
///
/// Deferred step sequences deliver their real completion through the same
/// sink later, after the dispatch already delivered a placeholder.
pub trait CompletionSink {
    /// Accept one completion.
    fn complete(&mut self, completion: CompletionValue);
}

// ---------------------------------------------------------------------------
// CompletionLatch
// ---------------------------------------------------------------------------

/// Latest-completion holder, one slot per command.
///
/// Enforces the supersede rule: a real completion replaces a placeholder
/// for the same command, a placeholder never replaces a real completion.
/// Completions without a command ID cannot be correlated and are dropped
/// with a warning.
#[derive(Debug, Clone, Default)]
pub struct CompletionLatch {
    latest: BTreeMap<CommandId, CompletionValue>,
}

impl CompletionLatch {
    /// Create an empty latch.
    pub const fn new() -> Self {
        Self {
            latest: BTreeMap::new(),
        }
    }

    /// The current completion for a command, if any arrived.
    pub fn latest(&self, id: CommandId) -> Option<&CompletionValue> {
        self.latest.get(&id)
    }

    /// Remove and return the completion for a command.
    pub fn take(&mut self, id: CommandId) -> Option<CompletionValue> {
        self.latest.remove(&id)
    }

    /// Number of commands with a held completion.
    pub fn len(&self) -> usize {
        self.latest.len()
    }

    /// Whether the latch holds nothing.
    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}

impl CompletionSink for CompletionLatch {
    fn complete(&mut self, completion: CompletionValue) {
        let Some(id) = completion.command_id else {
            warn!("completion without a command id dropped by latch");
            return;
        };
        if let Some(existing) = self.latest.get(&id)
            && !completion.may_supersede(existing)
        {
            warn!(command = %id, "placeholder arrived after a real completion; keeping the real one");
            return;
        }
        self.latest.insert(id, completion);
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// Test sink that records every delivery in arrival order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    deliveries: Vec<CompletionValue>,
}

impl RecordingSink {
    /// Create an empty recorder.
    pub const fn new() -> Self {
        Self {
            deliveries: Vec::new(),
        }
    }

    /// Everything delivered so far, oldest first.
    pub fn deliveries(&self) -> &[CompletionValue] {
        &self.deliveries
    }

    /// The most recent delivery.
    pub fn last(&self) -> Option<&CompletionValue> {
        self.deliveries.last()
    }
}

impl CompletionSink for RecordingSink {
    fn complete(&mut self, completion: CompletionValue) {
        self.deliveries.push(completion);
    }
}
