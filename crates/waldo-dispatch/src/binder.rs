//! Argument binding: from a named-argument bag to the positional list a
//! handler body expects.
//!
//! Binding never runs the handler. For an envelope catch-all the whole
//! command passes through verbatim and binding cannot fail. For named
//! handlers the bag is checked for unknown keys first, then each declared
//! parameter is filled in declaration order: present values convert
//! strictly to the declared type, absent ones fall back to their default,
//! and required names with neither are accumulated so the caller sees the
//! complete missing list at once.

use std::cmp::Reverse;
use std::collections::BTreeSet;

use waldo_types::{ArgValue, Command, HandlerDescriptor, ParamType, Vector3};

use crate::error::{DispatchError, HandlerFault};

// ---------------------------------------------------------------------------
// Bound arguments
// ---------------------------------------------------------------------------

/// The arguments a handler body receives, in the layout it declared.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundArgs {
    /// Converted values, one per declared parameter, in declaration order.
    Positional(Vec<ArgValue>),
    /// The whole command, handed to an envelope catch-all verbatim.
    Envelope(Command),
}

impl BoundArgs {
    /// The positional values; empty for an envelope binding.
    pub fn positional(&self) -> &[ArgValue] {
        match self {
            Self::Positional(values) => values,
            Self::Envelope(_) => &[],
        }
    }

    /// Number of positional values.
    pub fn len(&self) -> usize {
        self.positional().len()
    }

    /// Whether there are no positional values.
    pub fn is_empty(&self) -> bool {
        self.positional().is_empty()
    }

    /// The value at a declared position.
    pub fn value_at(&self, index: usize) -> Option<&ArgValue> {
        self.positional().get(index)
    }

    /// The boolean at a declared position.
    pub fn bool_at(&self, index: usize) -> Option<bool> {
        self.value_at(index).and_then(ArgValue::as_bool)
    }

    /// The integer at a declared position.
    pub fn int_at(&self, index: usize) -> Option<i64> {
        self.value_at(index).and_then(ArgValue::as_int)
    }

    /// The float at a declared position.
    pub fn float_at(&self, index: usize) -> Option<f64> {
        self.value_at(index).and_then(ArgValue::as_float)
    }

    /// The string at a declared position.
    pub fn text_at(&self, index: usize) -> Option<&str> {
        self.value_at(index).and_then(ArgValue::as_text)
    }

    /// The vector at a declared position.
    pub fn vector_at(&self, index: usize) -> Option<Vector3> {
        self.value_at(index).and_then(ArgValue::as_vector)
    }

    /// The command behind an envelope binding.
    pub const fn envelope(&self) -> Option<&Command> {
        match self {
            Self::Envelope(command) => Some(command),
            Self::Positional(_) => None,
        }
    }

    // -- faulting extractors for handler bodies --------------------------
    //
    // The binder fills every declared slot before a body runs, so a miss
    // here means the body disagrees with its own descriptor. These turn
    // that wiring mistake into a fault instead of a panic.

    /// The boolean at a declared position, or a wiring fault.
    pub fn require_bool(&self, index: usize, name: &str) -> Result<bool, HandlerFault> {
        self.bool_at(index).ok_or_else(|| wiring_fault(index, name, "Bool"))
    }

    /// The integer at a declared position, or a wiring fault.
    pub fn require_int(&self, index: usize, name: &str) -> Result<i64, HandlerFault> {
        self.int_at(index).ok_or_else(|| wiring_fault(index, name, "Int"))
    }

    /// The float at a declared position, or a wiring fault.
    pub fn require_float(&self, index: usize, name: &str) -> Result<f64, HandlerFault> {
        self.float_at(index).ok_or_else(|| wiring_fault(index, name, "Float"))
    }

    /// The string at a declared position, or a wiring fault.
    pub fn require_text(&self, index: usize, name: &str) -> Result<&str, HandlerFault> {
        self.text_at(index).ok_or_else(|| wiring_fault(index, name, "Text"))
    }

    /// The vector at a declared position, or a wiring fault.
    pub fn require_vector(&self, index: usize, name: &str) -> Result<Vector3, HandlerFault> {
        self.vector_at(index).ok_or_else(|| wiring_fault(index, name, "Vector"))
    }

    /// The command behind an envelope binding, or a wiring fault.
    pub fn require_envelope(&self) -> Result<&Command, HandlerFault> {
        self.envelope()
            .ok_or_else(|| HandlerFault::msg("body expected an envelope binding"))
    }
}

fn wiring_fault(index: usize, name: &str, ty: &str) -> HandlerFault {
    HandlerFault::msg(format!(
        "body read slot {index} ({name}) as {ty} but the descriptor bound something else"
    ))
}

// ---------------------------------------------------------------------------
// Binding
// ---------------------------------------------------------------------------

/// Bind a command's argument bag against a resolved handler.
///
/// `siblings` are the other surviving overloads for the same action name;
/// they only matter for the suggestion list attached to an unknown-name
/// failure.
pub fn bind(
    descriptor: &HandlerDescriptor,
    siblings: &[&HandlerDescriptor],
    command: &Command,
) -> Result<BoundArgs, DispatchError> {
    if descriptor.is_aggregate() {
        return Ok(BoundArgs::Envelope(command.clone()));
    }

    let declared: BTreeSet<&str> = descriptor.param_names().collect();
    let unknown: Vec<String> = command
        .arguments
        .keys()
        .filter(|key| !declared.contains(key.as_str()))
        .cloned()
        .collect();
    if !unknown.is_empty() {
        return Err(DispatchError::UnknownNames {
            action: command.action.clone(),
            names: unknown,
            suggestions: rank_suggestions(siblings, command),
        });
    }

    let mut positional = Vec::with_capacity(descriptor.params.len());
    let mut missing: Vec<String> = Vec::new();
    for param in &descriptor.params {
        if let Some(raw) = command.arguments.get(&param.name) {
            let converted =
                convert(raw, param.ty).ok_or_else(|| DispatchError::ArgumentConversion {
                    param: param.name.clone(),
                    expected: param.ty,
                    value: raw.clone(),
                })?;
            positional.push(converted);
        } else if let Some(default) = &param.default {
            positional.push(default.clone());
        } else {
            missing.push(param.name.clone());
        }
    }
    if !missing.is_empty() {
        return Err(DispatchError::MissingRequired {
            action: command.action.clone(),
            handler: descriptor.signature(),
            names: missing,
        });
    }
    Ok(BoundArgs::Positional(positional))
}

/// Sibling signatures ranked by how many of the bag's keys each declares,
/// best first. Equal scores keep the candidate order.
fn rank_suggestions(siblings: &[&HandlerDescriptor], command: &Command) -> Vec<String> {
    let keys: BTreeSet<&str> = command.argument_names().collect();
    let mut scored: Vec<(usize, String)> = siblings
        .iter()
        .map(|d| {
            let overlap = d.param_names().filter(|name| keys.contains(name)).count();
            (overlap, d.signature())
        })
        .collect();
    scored.sort_by_key(|&(overlap, _)| Reverse(overlap));
    scored.into_iter().map(|(_, signature)| signature).collect()
}

/// Strict conversion from a raw JSON value to a declared type.
///
/// No coercion: strings never become numbers, decimal forms never become
/// integers. JSON numbers written without a fraction convert to both
/// `Int` and `Float`.
fn convert(raw: &serde_json::Value, ty: ParamType) -> Option<ArgValue> {
    match ty {
        ParamType::Bool => raw.as_bool().map(ArgValue::Bool),
        ParamType::Int => raw.as_i64().map(ArgValue::Int),
        ParamType::Float => raw.as_f64().map(ArgValue::Float),
        ParamType::Text => raw.as_str().map(|s| ArgValue::Text(s.to_string())),
        ParamType::Vector => serde_json::from_value::<Vector3>(raw.clone())
            .ok()
            .map(ArgValue::Vector),
        ParamType::Envelope => None,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use waldo_types::{ExecutionShape, ParamSpec};

    use super::*;

    fn make_descriptor(action: &str, params: Vec<ParamSpec>) -> HandlerDescriptor {
        HandlerDescriptor::new(action, 0, params, ExecutionShape::FireAndForget)
    }

    #[test]
    fn envelope_binding_passes_the_command_through_verbatim() {
        let descriptor = make_descriptor(
            "Perform",
            vec![ParamSpec::required("envelope", ParamType::Envelope)],
        );
        let command = Command::new("Perform")
            .with_arg("anything", serde_json::json!({"nested": [1, 2]}))
            .with_arg("bogus", serde_json::json!(true));

        let bound = bind(&descriptor, &[], &command).unwrap();
        assert_eq!(bound.envelope(), Some(&command));
        assert!(bound.is_empty());
    }

    #[test]
    fn defaults_fill_absent_optional_parameters() {
        let descriptor = make_descriptor(
            "Look",
            vec![
                ParamSpec::required("degrees", ParamType::Float),
                ParamSpec::defaulted("forceThing", ParamType::Bool, ArgValue::Bool(false)),
            ],
        );
        let command = Command::new("Look").with_arg("degrees", serde_json::json!(30.0));

        let bound = bind(&descriptor, &[], &command).unwrap();
        assert_eq!(bound.len(), 2);
        assert_eq!(bound.float_at(0), Some(30.0));
        assert_eq!(bound.bool_at(1), Some(false));
    }

    #[test]
    fn missing_required_lists_every_absent_name() {
        let descriptor = make_descriptor(
            "Teleport",
            vec![
                ParamSpec::required("x", ParamType::Float),
                ParamSpec::required("y", ParamType::Float),
                ParamSpec::required("z", ParamType::Float),
            ],
        );
        let command = Command::new("Teleport");

        let err = bind(&descriptor, &[], &command).unwrap_err();
        match err {
            DispatchError::MissingRequired { names, handler, .. } => {
                assert_eq!(names, vec!["x", "y", "z"]);
                assert!(handler.starts_with("Teleport("));
            }
            other => panic!("expected MissingRequired, got {other:?}"),
        }
    }

    #[test]
    fn unknown_names_rank_suggestions_by_bag_overlap() {
        let chosen = make_descriptor("Move", vec![]);
        let poor = make_descriptor("Move", vec![ParamSpec::required("x", ParamType::Float)]);
        let rich = make_descriptor(
            "Move",
            vec![
                ParamSpec::required("ahead", ParamType::Float),
                ParamSpec::required("right", ParamType::Float),
            ],
        );
        let command = Command::new("Move")
            .with_arg("ahead", serde_json::json!(1.0))
            .with_arg("right", serde_json::json!(0.5));

        // Pass the low-overlap sibling first to prove ranking reorders.
        let err = bind(&chosen, &[&poor, &rich], &command).unwrap_err();
        match err {
            DispatchError::UnknownNames { names, suggestions, .. } => {
                assert_eq!(names, vec!["ahead", "right"]);
                assert_eq!(suggestions.len(), 2);
                assert!(suggestions.first().unwrap().contains("ahead"));
            }
            other => panic!("expected UnknownNames, got {other:?}"),
        }
    }

    #[test]
    fn conversion_failure_identifies_param_type_and_value() {
        let descriptor = make_descriptor(
            "Look",
            vec![ParamSpec::required("degrees", ParamType::Float)],
        );
        let command = Command::new("Look").with_arg("degrees", serde_json::json!("fast"));

        let err = bind(&descriptor, &[], &command).unwrap_err();
        match err {
            DispatchError::ArgumentConversion { param, expected, value } => {
                assert_eq!(param, "degrees");
                assert_eq!(expected, ParamType::Float);
                assert_eq!(value, serde_json::json!("fast"));
            }
            other => panic!("expected ArgumentConversion, got {other:?}"),
        }
    }

    #[test]
    fn conversion_failure_preempts_missing_accumulation() {
        let descriptor = make_descriptor(
            "Grab",
            vec![
                ParamSpec::required("tag", ParamType::Text),
                ParamSpec::required("slot", ParamType::Int),
            ],
        );
        let command = Command::new("Grab").with_arg("tag", serde_json::json!(42));

        let err = bind(&descriptor, &[], &command).unwrap_err();
        assert!(matches!(err, DispatchError::ArgumentConversion { .. }));
    }

    #[test]
    fn conversion_is_strict_about_numeric_shapes() {
        assert_eq!(
            convert(&serde_json::json!(3), ParamType::Float),
            Some(ArgValue::Float(3.0)),
        );
        assert_eq!(
            convert(&serde_json::json!(3), ParamType::Int),
            Some(ArgValue::Int(3)),
        );
        assert_eq!(convert(&serde_json::json!(1.5), ParamType::Int), None);
        assert_eq!(convert(&serde_json::json!("true"), ParamType::Bool), None);
        assert_eq!(convert(&serde_json::json!(1), ParamType::Bool), None);
        assert_eq!(
            convert(
                &serde_json::json!({"x": 1.0, "y": 0.0, "z": -2.0}),
                ParamType::Vector,
            ),
            Some(ArgValue::Vector(Vector3::new(1.0, 0.0, -2.0))),
        );
        assert_eq!(convert(&serde_json::json!([1.0, 0.0]), ParamType::Vector), None);
    }

    #[test]
    fn require_extractors_fault_on_wiring_mismatches() {
        let args = BoundArgs::Positional(vec![ArgValue::Float(1.5)]);
        assert_eq!(args.require_float(0, "moveMagnitude").ok(), Some(1.5));

        let err = args.require_bool(0, "forceAim");
        assert!(err.is_err_and(|fault| fault.to_string().contains("forceAim")));

        let err = args.require_envelope();
        assert!(err.is_err());
    }
}
