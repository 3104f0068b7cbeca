//! Shared type definitions for the waldo action dispatch engine.
//!
//! This crate is the single source of truth for the data that crosses the
//! dispatch boundary: inbound commands, handler descriptors, converted
//! argument values, and normalized completion values. It contains no
//! dispatch logic; the engine lives in `waldo-dispatch`.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrappers ([`CommandId`])
//! - [`value`] -- Argument values and semantic type tags
//! - [`command`] -- The inbound command with its named-argument bag
//! - [`descriptor`] -- Handler descriptors, parameters, execution shapes
//! - [`completion`] -- The normalized completion value

pub mod command;
pub mod completion;
pub mod descriptor;
pub mod ids;
pub mod value;

// Re-export all public types at crate root for convenience.
pub use command::Command;
pub use completion::{CompletionCode, CompletionValue};
pub use descriptor::{ExecutionShape, HandlerDescriptor, ParamSpec};
pub use ids::CommandId;
pub use value::{ArgValue, ParamType, Vector3};
