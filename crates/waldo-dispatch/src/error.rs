//! Error types for the dispatch pipeline.
//!
//! Every failure mode short of a handler-body error is represented by a
//! [`DispatchError`] variant and is raised before the handler body runs.
//! Handler-body errors travel through the pipeline untouched, wrapped only
//! by the transparent [`DispatchError::Handler`] variant.

use serde::{Deserialize, Serialize};
use waldo_types::ParamType;

// ---------------------------------------------------------------------------
// Registration conflicts
// ---------------------------------------------------------------------------

/// Why two handler registrations for one action name cannot coexist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConflictKind {
    /// One signature extends the other's non-empty type prefix with a
    /// defaulted parameter. The signatures are call-compatible, so named
    /// dispatch cannot tell which one an omitted-argument command means.
    DefaultedExtension,
    /// One signature extends the other's non-empty type prefix with a
    /// required parameter: an ambiguous overload of the same action.
    RequiredExtension,
    /// Same level, parameter-name sets in a subset relation, but the
    /// shared positional prefix disagrees on types.
    NameSubsetTypeMismatch,
    /// The envelope type appeared somewhere other than as a handler's
    /// sole parameter.
    MisplacedEnvelope,
    /// A declared default value does not match the parameter's type.
    DefaultTypeMismatch,
}

/// One registration conflict recorded while building a handler table.
///
/// The affected action name is poisoned: every dispatch to it fails with
/// [`DispatchError::RegistrationConflict`] carrying these records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictRecord {
    /// The poisoned action name.
    pub action: String,
    /// What went wrong.
    pub kind: ConflictKind,
    /// Human-readable signatures of the handlers involved (one entry for
    /// single-handler defects, two for pairwise conflicts).
    pub handlers: Vec<String>,
}

impl core::fmt::Display for ConflictRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.handlers.join(" vs "))
    }
}

// ---------------------------------------------------------------------------
// Handler-body faults
// ---------------------------------------------------------------------------

/// A failure raised inside a handler body.
///
/// The engine never interprets these; they pass through dispatch with
/// their source chain intact so the caller sees exactly what the handler
/// raised.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct HandlerFault {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl HandlerFault {
    /// Wrap a typed error, keeping it as the source.
    pub fn new(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self {
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// A fault with only a message and no underlying source.
    pub fn msg(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatch errors
// ---------------------------------------------------------------------------

/// Errors produced by the dispatch pipeline.
///
/// All variants except [`DispatchError::Handler`] are raised before the
/// chosen handler body runs.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// The action name was poisoned by a registration conflict when the
    /// handler table was built. Dispatch to it stays blocked; other
    /// actions on the same table are unaffected.
    #[error("action {action:?} is blocked by {} registration conflict(s)", .conflicts.len())]
    RegistrationConflict {
        /// The poisoned action name.
        action: String,
        /// Every conflict recorded for this action.
        conflicts: Vec<ConflictRecord>,
    },

    /// No handler answers to this action name.
    #[error("no handler found for action {action:?}")]
    NotFound {
        /// The unmatched action name.
        action: String,
    },

    /// More than one handler qualifies equally and the engine refuses to
    /// guess.
    #[error("action {action:?} is ambiguous between {contenders:?}")]
    Ambiguous {
        /// The action name.
        action: String,
        /// Signatures of the handlers that tied.
        contenders: Vec<String>,
    },

    /// The bag omits required parameters. All absent names are listed,
    /// not just the first one encountered.
    #[error("action {action:?} is missing required arguments {names:?} for {handler}")]
    MissingRequired {
        /// The action name.
        action: String,
        /// Signature of the handler the arguments were bound against.
        handler: String,
        /// Every required parameter name absent from the bag.
        names: Vec<String>,
    },

    /// The bag carries names the chosen handler does not declare.
    #[error("action {action:?} does not accept arguments {names:?}; nearest overloads: {suggestions:?}")]
    UnknownNames {
        /// The action name.
        action: String,
        /// The unrecognized argument names, sorted.
        names: Vec<String>,
        /// Sibling overload signatures ranked by how many of the bag's
        /// keys each could accept, best first.
        suggestions: Vec<String>,
    },

    /// A present argument failed to convert to its declared type.
    #[error("argument {param:?} expected {expected:?} but got {value}")]
    ArgumentConversion {
        /// The parameter name.
        param: String,
        /// The declared type tag.
        expected: ParamType,
        /// The offending raw value.
        value: serde_json::Value,
    },

    /// Bookkeeping failure inside the engine itself.
    #[error("dispatch internal error: {message}")]
    Internal {
        /// Description of the inconsistency.
        message: String,
    },

    /// A handler body failed. Passed through unmodified.
    #[error(transparent)]
    Handler(#[from] HandlerFault),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_record_displays_kind_and_signatures() {
        let record = ConflictRecord {
            action: String::from("Look"),
            kind: ConflictKind::DefaultedExtension,
            handlers: vec![
                String::from("Look(degrees: Float) [level 0]"),
                String::from("Look(degrees: Float, forceThing: Bool = false) [level 1]"),
            ],
        };
        let shown = record.to_string();
        assert!(shown.starts_with("DefaultedExtension:"));
        assert!(shown.contains(" vs "));
    }

    #[test]
    fn handler_fault_keeps_the_source_chain() {
        let inner = std::io::Error::other("actuator offline");
        let fault = HandlerFault::new(inner);
        assert_eq!(fault.to_string(), "actuator offline");
        assert!(std::error::Error::source(&fault).is_some());

        let bare = HandlerFault::msg("no payload grip");
        assert!(std::error::Error::source(&bare).is_none());
    }

    #[test]
    fn handler_errors_pass_through_transparently() {
        let err = DispatchError::from(HandlerFault::msg("gyro fault"));
        assert_eq!(err.to_string(), "gyro fault");
    }

    #[test]
    fn conversion_error_names_param_type_and_value() {
        let err = DispatchError::ArgumentConversion {
            param: String::from("moveMagnitude"),
            expected: ParamType::Float,
            value: serde_json::json!("fast"),
        };
        let shown = err.to_string();
        assert!(shown.contains("moveMagnitude"));
        assert!(shown.contains("Float"));
        assert!(shown.contains("\"fast\""));
    }
}
