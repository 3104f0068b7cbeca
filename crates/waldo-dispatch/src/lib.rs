//! Action dispatch and overload resolution for the Waldo agent runtime.
//!
//! An inbound command names an action and carries a bag of named
//! arguments. This crate picks exactly one handler for it out of a
//! hierarchy of possibly-overloaded registrations, binds the bag to the
//! handler's positional parameters, runs the handler under its declared
//! execution shape, and normalizes whatever comes back into a single
//! completion value. Resolution is by parameter name rather than
//! positional type, overloads may live at several hierarchy levels, and
//! the legacy whole-command envelope form is supported as a fallback.
//!
//! # Modules
//!
//! - [`binder`] -- Named-argument bag to positional arguments, with
//!   strict type conversion, defaults, and accumulated missing names.
//! - [`config`] -- [`DispatchConfig`] with tie, stepping, and budget
//!   policy.
//! - [`controller`] -- Invokes a bound handler and normalizes its
//!   outcome across the three execution shapes.
//! - [`dispatcher`] -- [`ActionDispatcher`], the per-receiver entry
//!   point composing the pipeline.
//! - [`error`] -- [`DispatchError`] taxonomy plus registration conflict
//!   records.
//! - [`registry`] -- Lazy per-action candidate cache over a frozen
//!   table.
//! - [`resolver`] -- Best-match overload selection with the envelope
//!   fallback and tie policy.
//! - [`scheduler`] -- Step sequences, the [`StepScheduler`] contract,
//!   and two provided schedulers.
//! - [`sink`] -- The [`CompletionSink`] contract with a latch and a
//!   recorder.
//! - [`table`] -- Handler registration and the build-time conflict
//!   scan.

pub mod binder;
pub mod config;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod resolver;
pub mod scheduler;
pub mod sink;
pub mod table;

// Re-export primary types at crate root.
pub use binder::{BoundArgs, bind};
pub use config::{DEFAULT_INLINE_STEP_BUDGET, DispatchConfig, StepPolicy, TiePolicy};
pub use controller::execute;
pub use dispatcher::ActionDispatcher;
pub use error::{ConflictKind, ConflictRecord, DispatchError, HandlerFault};
pub use registry::{CandidateSet, Registry};
pub use resolver::{Resolution, resolve};
pub use scheduler::{
    InlineStepper, QueueingStepper, Step, StepOutcome, StepScheduler, StepSequence, drain_sequence,
};
pub use sink::{CompletionLatch, CompletionSink, RecordingSink};
pub use table::{Handler, HandlerBody, HandlerTable, HandlerTableBuilder};
