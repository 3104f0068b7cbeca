//! Handler descriptors: what a handler is called, where it was declared,
//! and what it accepts.
//!
//! Descriptors are pure data. The dispatch engine pairs each descriptor
//! with a callable body at registration time; everything the registry,
//! resolver, and binder decide is decided from the descriptor alone.

use serde::{Deserialize, Serialize};

use crate::value::{ArgValue, ParamType};

// ---------------------------------------------------------------------------
// Execution shapes
// ---------------------------------------------------------------------------

/// How a handler reports its outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionShape {
    /// Returns nothing; the engine synthesizes a successful placeholder
    /// completion that a later real completion may supersede.
    FireAndForget,
    /// Returns a resumable step sequence; an external scheduler drives it
    /// and exactly one completion comes out of the final step.
    Stepped,
    /// Returns a completion value directly.
    ExplicitResult,
}

// ---------------------------------------------------------------------------
// Parameters
// ---------------------------------------------------------------------------

/// One declared parameter of a handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    /// Parameter name, matched against argument-bag keys case-sensitively.
    pub name: String,
    /// Declared semantic type.
    pub ty: ParamType,
    /// Default value applied when the bag omits this name. `None` means
    /// the parameter is required.
    pub default: Option<ArgValue>,
}

impl ParamSpec {
    /// A required parameter.
    pub fn required(name: impl Into<String>, ty: ParamType) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
        }
    }

    /// An optional parameter with a declared default.
    pub fn defaulted(name: impl Into<String>, ty: ParamType, default: ArgValue) -> Self {
        Self {
            name: name.into(),
            ty,
            default: Some(default),
        }
    }

    /// Whether this parameter carries a default value.
    pub const fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

// ---------------------------------------------------------------------------
// Handler descriptors
// ---------------------------------------------------------------------------

/// Static description of one registered handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerDescriptor {
    /// The action name this handler answers to.
    pub action: String,
    /// Declaring level in the receiver hierarchy: 0 is the root type,
    /// larger numbers are more derived.
    pub declaring_level: u32,
    /// Declared parameters, in declaration order.
    pub params: Vec<ParamSpec>,
    /// How the handler reports its outcome.
    pub shape: ExecutionShape,
}

impl HandlerDescriptor {
    /// Build a descriptor.
    pub fn new(
        action: impl Into<String>,
        declaring_level: u32,
        params: Vec<ParamSpec>,
        shape: ExecutionShape,
    ) -> Self {
        Self {
            action: action.into(),
            declaring_level,
            params,
            shape,
        }
    }

    /// Whether this handler is the aggregate catch-all: exactly one
    /// parameter of the envelope type, receiving the whole command.
    pub fn is_aggregate(&self) -> bool {
        self.params.len() == 1
            && self
                .params
                .first()
                .is_some_and(|p| matches!(p.ty, ParamType::Envelope))
    }

    /// Number of parameters without defaults.
    pub fn required_count(&self) -> usize {
        self.params.iter().filter(|p| !p.has_default()).count()
    }

    /// Declared parameter names, in declaration order.
    pub fn param_names(&self) -> impl Iterator<Item = &str> {
        self.params.iter().map(|p| p.name.as_str())
    }

    /// Human-readable signature for diagnostics, e.g.
    /// `Look(degrees: Float, forceThing: Bool = false) [level 1]`.
    pub fn signature(&self) -> String {
        use core::fmt::Write as _;

        let mut out = String::new();
        out.push_str(&self.action);
        out.push('(');
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let _ = write!(out, "{}: {:?}", p.name, p.ty);
            if let Some(default) = &p.default {
                let _ = write!(out, " = {default}");
            }
        }
        let _ = write!(out, ") [level {}]", self.declaring_level);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_descriptor(params: Vec<ParamSpec>) -> HandlerDescriptor {
        HandlerDescriptor::new("Look", 1, params, ExecutionShape::FireAndForget)
    }

    #[test]
    fn aggregate_requires_a_single_envelope_param() {
        let agg = make_descriptor(vec![ParamSpec::required("envelope", ParamType::Envelope)]);
        assert!(agg.is_aggregate());

        let named = make_descriptor(vec![ParamSpec::required("degrees", ParamType::Float)]);
        assert!(!named.is_aggregate());

        let two = make_descriptor(vec![
            ParamSpec::required("envelope", ParamType::Envelope),
            ParamSpec::required("degrees", ParamType::Float),
        ]);
        assert!(!two.is_aggregate());
    }

    #[test]
    fn required_count_ignores_defaulted_params() {
        let d = make_descriptor(vec![
            ParamSpec::required("degrees", ParamType::Float),
            ParamSpec::defaulted("forceThing", ParamType::Bool, ArgValue::Bool(false)),
        ]);
        assert_eq!(d.required_count(), 1);
        assert_eq!(d.params.len(), 2);
    }

    #[test]
    fn signature_shows_defaults_and_level() {
        let d = make_descriptor(vec![
            ParamSpec::required("degrees", ParamType::Float),
            ParamSpec::defaulted("forceThing", ParamType::Bool, ArgValue::Bool(false)),
        ]);
        assert_eq!(
            d.signature(),
            "Look(degrees: Float, forceThing: Bool = false) [level 1]",
        );
    }
}
