//! The rover hardware model: the receiver all handlers mutate.
//!
//! A deliberately small physical model -- pose, heading, camera pitch,
//! battery, sample containers -- with just enough invariants to make
//! every fault in [`RoverFault`] reachable from a dispatched command.

use serde::Serialize;
use waldo_types::Vector3;

use crate::fault::RoverFault;

/// A full battery, in percent.
pub const FULL_BATTERY: f64 = 100.0;

/// Battery drawn per meter of travel.
pub const MOVE_COST_PER_METER: f64 = 2.0;

/// Battery drawn by one sample collection.
pub const SAMPLE_COST_PCT: f64 = 5.0;

/// Distance covered by a bare `Move` with no magnitude.
pub const NUDGE_METERS: f64 = 0.25;

/// Soft gimbal limit for the camera, in degrees either way.
pub const PITCH_SOFT_LIMIT: f64 = 60.0;

/// Hard mechanical stop for the camera, in degrees either way.
pub const PITCH_HARD_STOP: f64 = 90.0;

/// Number of sample containers on the platform.
pub const SAMPLE_CAPACITY: usize = 12;

/// The rover state. Heading 0 faces +z; positive turns are clockwise
/// seen from above.
#[derive(Debug, Clone, Serialize)]
pub struct Rover {
    pose: Vector3,
    heading_degrees: f64,
    camera_pitch: f64,
    battery_pct: f64,
    samples: Vec<String>,
}

impl Rover {
    /// A fully charged rover at the origin, facing +z.
    pub const fn new() -> Self {
        Self {
            pose: Vector3::new(0.0, 0.0, 0.0),
            heading_degrees: 0.0,
            camera_pitch: 0.0,
            battery_pct: FULL_BATTERY,
            samples: Vec::new(),
        }
    }

    /// A rover with a specific charge, for exercising battery faults.
    pub fn with_battery(pct: f64) -> Self {
        let mut rover = Self::new();
        rover.battery_pct = pct.clamp(0.0, FULL_BATTERY);
        rover
    }

    // -- motion ----------------------------------------------------------

    /// Drive `meters` along the current heading. Negative reverses.
    pub fn advance(&mut self, meters: f64) -> Result<(), RoverFault> {
        let cost = meters.abs() * MOVE_COST_PER_METER;
        self.draw(cost)?;
        self.pose = self.pose.add(&self.forward().scaled(meters));
        Ok(())
    }

    /// Teleport-commit a glide: battery is charged for the straight-line
    /// distance up front and the pose moves to `target`. Returns the
    /// origin so a step sequence can replay the path for the transport.
    pub fn travel_to(&mut self, target: Vector3) -> Result<Vector3, RoverFault> {
        let delta = target.add(&self.pose.scaled(-1.0));
        let distance = delta
            .x
            .mul_add(delta.x, delta.y.mul_add(delta.y, delta.z * delta.z))
            .sqrt();
        self.draw(distance * MOVE_COST_PER_METER)?;
        let origin = self.pose;
        self.pose = target;
        Ok(origin)
    }

    /// Rotate by `degrees`, wrapping the heading into `[0, 360)`.
    pub fn turn(&mut self, degrees: f64) {
        self.heading_degrees = (self.heading_degrees + degrees).rem_euclid(360.0);
    }

    /// Stop and safe the platform: the camera returns to level.
    pub fn halt(&mut self) {
        self.camera_pitch = 0.0;
    }

    // -- instruments -----------------------------------------------------

    /// Aim the camera at an absolute pitch. Without `force` the soft
    /// gimbal limit applies; with it the pitch clamps at the hard stop.
    pub fn aim_camera(&mut self, degrees: f64, force: bool) -> Result<(), RoverFault> {
        if !force && degrees.abs() > PITCH_SOFT_LIMIT {
            return Err(RoverFault::PitchBeyondLimit {
                requested: degrees,
                limit: PITCH_SOFT_LIMIT,
            });
        }
        if degrees.abs() > PITCH_HARD_STOP {
            tracing::debug!(requested = degrees, "camera pitch clamped at the hard stop");
        }
        self.camera_pitch = degrees.clamp(-PITCH_HARD_STOP, PITCH_HARD_STOP);
        Ok(())
    }

    /// Store a labelled sample. Returns how many containers are now
    /// occupied.
    pub fn collect_sample(&mut self, label: &str) -> Result<usize, RoverFault> {
        if self.samples.len() >= SAMPLE_CAPACITY {
            return Err(RoverFault::ContainersFull {
                capacity: SAMPLE_CAPACITY,
            });
        }
        self.draw(SAMPLE_COST_PCT)?;
        self.samples.push(label.to_string());
        Ok(self.samples.len())
    }

    /// Charge up to `target_pct`. Never discharges.
    pub fn recharge(&mut self, target_pct: f64) {
        self.battery_pct = self.battery_pct.max(target_pct.min(FULL_BATTERY));
    }

    // -- readouts --------------------------------------------------------

    /// Current position.
    pub const fn pose(&self) -> Vector3 {
        self.pose
    }

    /// Current heading in degrees, `[0, 360)`.
    pub const fn heading_degrees(&self) -> f64 {
        self.heading_degrees
    }

    /// Current camera pitch in degrees.
    pub const fn camera_pitch(&self) -> f64 {
        self.camera_pitch
    }

    /// Remaining charge in percent.
    pub const fn battery_pct(&self) -> f64 {
        self.battery_pct
    }

    /// Labels of the stored samples, oldest first.
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Number of occupied sample containers.
    pub const fn sample_count(&self) -> usize {
        self.samples.len()
    }

    /// The whole state as JSON, for telemetry completions.
    pub fn telemetry(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    fn forward(&self) -> Vector3 {
        let radians = self.heading_degrees.to_radians();
        Vector3::new(radians.sin(), 0.0, radians.cos())
    }

    fn draw(&mut self, cost: f64) -> Result<(), RoverFault> {
        if self.battery_pct < cost {
            return Err(RoverFault::BatteryExhausted {
                needed: cost,
                available: self.battery_pct,
            });
        }
        self.battery_pct -= cost;
        Ok(())
    }
}

impl Default for Rover {
    fn default() -> Self {
        Self::new()
    }
}
