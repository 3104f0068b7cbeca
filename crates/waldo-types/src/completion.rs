//! The normalized completion value every dispatch produces exactly once.

use serde::{Deserialize, Serialize};

use crate::ids::CommandId;

/// Machine-readable category for a failed completion.
///
/// `None` is the code carried by every successful completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompletionCode {
    /// No error.
    #[default]
    None,
    /// The action is not valid in the receiver's current state.
    InvalidOperation,
    /// The named target is beyond the receiver's reach.
    TargetOutOfRange,
    /// Movement was blocked before reaching the goal.
    Obstructed,
    /// An inline step run exceeded the scheduler's step budget.
    StepBudgetExhausted,
}

/// The single normalized outcome of one dispatched command.
///
/// Fire-and-forget handlers never build one of these themselves; the
/// engine synthesizes a successful placeholder on their behalf. A
/// placeholder may later be superseded by a real completion for the same
/// command, never the other way around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionValue {
    /// Whether the action succeeded.
    pub success: bool,
    /// Optional structured payload for the driver.
    pub return_value: Option<serde_json::Value>,
    /// Human-readable failure description; empty on success.
    pub error_message: String,
    /// Machine-readable failure category.
    pub error_code: CompletionCode,
    /// Whether the driver should emit a fresh state frame after recording
    /// this completion.
    pub emit_state_after: bool,
    /// True only for the synthesized interim completion.
    pub is_placeholder: bool,
    /// The command this completion answers; stamped by the engine.
    pub command_id: Option<CommandId>,
}

impl CompletionValue {
    /// A successful completion with no payload.
    pub const fn succeeded() -> Self {
        Self {
            success: true,
            return_value: None,
            error_message: String::new(),
            error_code: CompletionCode::None,
            emit_state_after: true,
            is_placeholder: false,
            command_id: None,
        }
    }

    /// A failed completion with a category and description.
    pub fn failed(code: CompletionCode, message: impl Into<String>) -> Self {
        Self {
            success: false,
            return_value: None,
            error_message: message.into(),
            error_code: code,
            emit_state_after: true,
            is_placeholder: false,
            command_id: None,
        }
    }

    /// The synthesized interim completion for fire-and-forget and
    /// deferred stepped dispatches.
    pub const fn placeholder() -> Self {
        Self {
            success: true,
            return_value: None,
            error_message: String::new(),
            error_code: CompletionCode::None,
            emit_state_after: true,
            is_placeholder: true,
            command_id: None,
        }
    }

    /// Attach a structured payload, consuming and returning the value.
    #[must_use]
    pub fn with_return(mut self, value: serde_json::Value) -> Self {
        self.return_value = Some(value);
        self
    }

    /// Stamp the originating command, consuming and returning the value.
    #[must_use]
    pub fn with_command(mut self, id: CommandId) -> Self {
        self.command_id = Some(id);
        self
    }

    /// Whether this is a real (non-placeholder) completion.
    pub const fn is_real(&self) -> bool {
        !self.is_placeholder
    }

    /// Whether this completion may replace `existing` in a sink.
    ///
    /// Everything may replace everything else, except that a placeholder
    /// never replaces a real completion.
    pub const fn may_supersede(&self, existing: &Self) -> bool {
        !(self.is_placeholder && existing.is_real())
    }
}
