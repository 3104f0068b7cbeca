//! Reference rover receiver wired onto the waldo dispatch engine.
//!
//! This crate is the worked example the engine crates are tested against:
//! a small rover hardware model plus a two-level handler catalog that
//! together exercise overload resolution, hiding, defaults, the envelope
//! catch-all, every execution shape, and the full fault path. Hosts the
//! end-to-end dispatch tests.
//!
//! # Modules
//!
//! - [`catalog`] -- The two-level handler hierarchy ([`rover_catalog`])
//! - [`fault`] -- Rover fault conditions ([`RoverFault`])
//! - [`glide`] -- The stepped glide sequence ([`GlideSequence`])
//! - [`rover`] -- The rover hardware model ([`Rover`])

pub mod catalog;
pub mod fault;
pub mod glide;
pub mod rover;

// Re-export primary types at crate root.
pub use catalog::rover_catalog;
pub use fault::RoverFault;
pub use glide::GlideSequence;
pub use rover::Rover;
