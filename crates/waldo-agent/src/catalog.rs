//! The rover's handler catalog: a two-level action hierarchy.
//!
//! Level 0 is the drive platform, level 1 the science package bolted on
//! top. Between them the catalog exercises the whole dispatch surface:
//!
//! - `Move()` / `Move(moveMagnitude)` -- independent overloads at one
//!   level; the bag decides which one runs.
//! - `Rotate`, `Recharge` -- defaulted parameters.
//! - `Halt` -- declared at both levels with the same signature, so the
//!   science package's version hides the platform's.
//! - `GoTo` -- the stepped shape, yielding a [`GlideSequence`].
//! - `Look`, `CollectSample` -- explicit-result handlers that can fault.
//! - `Telemetry` -- the envelope catch-all; any argument bag reaches it.

use serde_json::json;
use waldo_dispatch::HandlerTable;
use waldo_types::{ArgValue, CompletionValue, ParamSpec, ParamType};

use crate::glide::GlideSequence;
use crate::rover::{FULL_BATTERY, NUDGE_METERS, Rover, SAMPLE_CAPACITY};

/// Rotation applied when `Rotate` is called without a value.
const DEFAULT_ROTATE_DEGREES: f64 = 90.0;

/// Waypoint count when `GoTo` is called without one.
const DEFAULT_GLIDE_STEPS: i64 = 8;

/// Upper bound on waypoints a single glide may request.
const MAX_GLIDE_STEPS: i64 = 64;

/// Build the full rover catalog.
///
/// The table is conflict-free by construction; every action here
/// resolves and binds for at least one well-formed argument bag.
pub fn rover_catalog() -> HandlerTable<Rover> {
    HandlerTable::builder()
        // -- level 0: drive platform ------------------------------------
        .fire_and_forget("Move", 0, vec![], |rover: &mut Rover, _args| {
            rover.advance(NUDGE_METERS)?;
            Ok(())
        })
        .fire_and_forget(
            "Move",
            0,
            vec![ParamSpec::required("moveMagnitude", ParamType::Float)],
            |rover, args| {
                let magnitude = args.require_float(0, "moveMagnitude")?;
                rover.advance(magnitude)?;
                Ok(())
            },
        )
        .fire_and_forget(
            "Rotate",
            0,
            vec![ParamSpec::defaulted(
                "degrees",
                ParamType::Float,
                ArgValue::Float(DEFAULT_ROTATE_DEGREES),
            )],
            |rover, args| {
                let degrees = args.require_float(0, "degrees")?;
                rover.turn(degrees);
                Ok(())
            },
        )
        .fire_and_forget(
            "Recharge",
            0,
            vec![ParamSpec::defaulted(
                "targetPercent",
                ParamType::Float,
                ArgValue::Float(FULL_BATTERY),
            )],
            |rover, args| {
                let target = args.require_float(0, "targetPercent")?;
                rover.recharge(target);
                Ok(())
            },
        )
        .fire_and_forget("Halt", 0, vec![], |rover, _args| {
            rover.halt();
            Ok(())
        })
        .stepped(
            "GoTo",
            0,
            vec![
                ParamSpec::required("position", ParamType::Vector),
                ParamSpec::defaulted(
                    "glideSteps",
                    ParamType::Int,
                    ArgValue::Int(DEFAULT_GLIDE_STEPS),
                ),
            ],
            |rover, args| {
                let target = args.require_vector(0, "position")?;
                let requested = args.require_int(1, "glideSteps")?;
                let origin = rover.travel_to(target)?;
                let steps =
                    u32::try_from(requested.clamp(1, MAX_GLIDE_STEPS)).unwrap_or(1);
                Ok(Box::new(GlideSequence::new(origin, target, steps)))
            },
        )
        // -- level 1: science package -----------------------------------
        .explicit("Halt", 1, vec![], |rover, _args| {
            rover.halt();
            Ok(CompletionValue::succeeded()
                .with_return(json!({ "halted": true, "rover": rover.telemetry() })))
        })
        .explicit(
            "Look",
            1,
            vec![
                ParamSpec::required("degrees", ParamType::Float),
                ParamSpec::defaulted("forceAim", ParamType::Bool, ArgValue::Bool(false)),
            ],
            |rover, args| {
                let degrees = args.require_float(0, "degrees")?;
                let force = args.require_bool(1, "forceAim")?;
                rover.aim_camera(degrees, force)?;
                Ok(CompletionValue::succeeded()
                    .with_return(json!({ "cameraPitch": rover.camera_pitch() })))
            },
        )
        .explicit(
            "CollectSample",
            1,
            vec![ParamSpec::required("label", ParamType::Text)],
            |rover, args| {
                let label = args.require_text(0, "label")?;
                let stored = rover.collect_sample(label)?;
                Ok(CompletionValue::succeeded()
                    .with_return(json!({ "stored": stored, "capacity": SAMPLE_CAPACITY })))
            },
        )
        .explicit(
            "Telemetry",
            1,
            vec![ParamSpec::required("envelope", ParamType::Envelope)],
            |rover, args| {
                let envelope = args.require_envelope()?;
                // A pure readout: no state frame follows it.
                let mut report = CompletionValue::succeeded().with_return(json!({
                    "action": envelope.action,
                    "argumentNames": envelope.argument_names().collect::<Vec<_>>(),
                    "rover": rover.telemetry(),
                }));
                report.emit_state_after = false;
                Ok(report)
            },
        )
        .build()
}
