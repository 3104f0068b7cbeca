//! A glide: the stepped execution shape made concrete.
//!
//! The rover commits its destination when the glide launches (see
//! [`Rover::travel_to`]); the sequence replays evenly spaced waypoints
//! for the transport layer and reports the arrival pose in its final
//! completion.
//!
//! [`Rover::travel_to`]: crate::rover::Rover::travel_to

use serde_json::json;
use waldo_dispatch::{Step, StepOutcome, StepSequence};
use waldo_types::{CompletionValue, Vector3};

/// Linear interpolation from origin to target over a fixed number of
/// steps.
#[derive(Debug, Clone)]
pub struct GlideSequence {
    origin: Vector3,
    target: Vector3,
    total_steps: u32,
    taken: u32,
}

impl GlideSequence {
    /// A glide of `steps` waypoints; zero is clamped to one.
    pub const fn new(origin: Vector3, target: Vector3, steps: u32) -> Self {
        let total_steps = if steps == 0 { 1 } else { steps };
        Self {
            origin,
            target,
            total_steps,
            taken: 0,
        }
    }

    fn waypoint(&self, at: u32) -> Vector3 {
        let fraction = f64::from(at) / f64::from(self.total_steps);
        let delta = self.target.add(&self.origin.scaled(-1.0));
        self.origin.add(&delta.scaled(fraction))
    }
}

impl StepSequence for GlideSequence {
    fn next_step(&mut self) -> StepOutcome {
        if self.taken >= self.total_steps {
            return StepOutcome::Done(
                CompletionValue::succeeded()
                    .with_return(json!({ "pose": self.target, "steps": self.total_steps })),
            );
        }
        self.taken = self.taken.saturating_add(1);
        StepOutcome::Step(Step::new(
            "glide",
            json!({
                "waypoint": self.waypoint(self.taken),
                "index": self.taken,
                "of": self.total_steps,
            }),
        ))
    }
}
