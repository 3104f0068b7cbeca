//! Argument values and the semantic type tags that describe them.
//!
//! Inbound commands carry raw [`serde_json::Value`] entries; the binder
//! converts each entry to an [`ArgValue`] according to the [`ParamType`]
//! the handler declared for that position. Conversion is strict: no
//! string-to-number coercion, no truncating floats into integers.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Semantic type tags
// ---------------------------------------------------------------------------

/// The declared type of a handler parameter.
///
/// Tags are semantic rather than representational: they say what the
/// handler expects, and the binder decides which raw JSON shapes convert
/// into each tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamType {
    /// A boolean flag.
    Bool,
    /// A signed integer. JSON numbers convert only when integral.
    Int,
    /// A double-precision float. Any JSON number converts.
    Float,
    /// A UTF-8 string.
    Text,
    /// A 3-component vector, accepted as a JSON object `{x, y, z}`.
    Vector,
    /// The legacy envelope: the whole command, verbatim.
    ///
    /// Valid only as the sole parameter of a handler; such a handler is
    /// the aggregate catch-all for its action name.
    Envelope,
}

// ---------------------------------------------------------------------------
// Vector3
// ---------------------------------------------------------------------------

/// A 3-component vector used for positions and displacements.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vector3 {
    /// Lateral component.
    pub x: f64,
    /// Vertical component.
    pub y: f64,
    /// Longitudinal component.
    pub z: f64,
}

impl Vector3 {
    /// Construct a vector from its components.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Component-wise sum.
    pub const fn add(&self, other: &Self) -> Self {
        Self {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }

    /// Scale every component by `factor`.
    pub const fn scaled(&self, factor: f64) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
            z: self.z * factor,
        }
    }
}

// ---------------------------------------------------------------------------
// Converted argument values
// ---------------------------------------------------------------------------

/// A converted argument value, ready to hand to a handler body.
///
/// There is no `Envelope` variant: aggregate handlers receive the whole
/// command through a separate binding path and never see per-parameter
/// values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArgValue {
    /// A boolean flag.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A double-precision float.
    Float(f64),
    /// A UTF-8 string.
    Text(String),
    /// A 3-component vector.
    Vector(Vector3),
}

impl ArgValue {
    /// The type tag this value satisfies.
    pub const fn kind(&self) -> ParamType {
        match self {
            Self::Bool(_) => ParamType::Bool,
            Self::Int(_) => ParamType::Int,
            Self::Float(_) => ParamType::Float,
            Self::Text(_) => ParamType::Text,
            Self::Vector(_) => ParamType::Vector,
        }
    }

    /// The boolean inside, if this is a [`ArgValue::Bool`].
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// The integer inside, if this is an [`ArgValue::Int`].
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// The float inside, if this is an [`ArgValue::Float`].
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// The string inside, if this is an [`ArgValue::Text`].
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(v) => Some(v),
            _ => None,
        }
    }

    /// The vector inside, if this is an [`ArgValue::Vector`].
    pub const fn as_vector(&self) -> Option<Vector3> {
        match self {
            Self::Vector(v) => Some(*v),
            _ => None,
        }
    }
}

impl core::fmt::Display for ArgValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(v) => write!(f, "{v:?}"),
            Self::Vector(v) => write!(f, "({}, {}, {})", v.x, v.y, v.z),
        }
    }
}
