//! Fault conditions raised by the rover hardware model.
//!
//! Handler bodies return these; the dispatch engine wraps them in a
//! [`HandlerFault`] so callers see the message and keep the typed fault
//! as the error source.

use thiserror::Error;
use waldo_dispatch::HandlerFault;

/// Why a rover operation refused to run.
#[derive(Debug, Error)]
pub enum RoverFault {
    /// The battery cannot cover the requested motion or sampling.
    #[error("battery exhausted: {needed:.1}% needed, {available:.1}% left")]
    BatteryExhausted {
        /// Charge the operation would have drawn.
        needed: f64,
        /// Charge remaining.
        available: f64,
    },

    /// The camera was aimed past the soft gimbal limit without force.
    #[error("camera pitch {requested:.1} exceeds the +/-{limit:.1} degree limit")]
    PitchBeyondLimit {
        /// Requested absolute pitch.
        requested: f64,
        /// Soft limit in degrees.
        limit: f64,
    },

    /// Every sample container is already occupied.
    #[error("all {capacity} sample containers are full")]
    ContainersFull {
        /// Number of containers on the platform.
        capacity: usize,
    },
}

impl From<RoverFault> for HandlerFault {
    fn from(fault: RoverFault) -> Self {
        Self::new(fault)
    }
}
