//! Execution completion control: run the bound handler and normalize its
//! outcome into exactly one [`CompletionValue`].
//!
//! The controller is a single match over the handler's execution shape.
//! Fire-and-forget bodies get a synthesized successful placeholder.
//! Stepped bodies yield a sequence that is handed to the scheduler whole;
//! not one step runs here. Explicit-result bodies pass their completion
//! through with only the placeholder flag cleared. Every completion
//! leaves stamped with the dispatching command's id, and handler-body
//! faults propagate unmodified.

use waldo_types::{CommandId, CompletionValue};

use crate::binder::BoundArgs;
use crate::config::StepPolicy;
use crate::error::DispatchError;
use crate::scheduler::{StepOutcome, StepScheduler, StepSequence};
use crate::table::{Handler, HandlerBody};

/// Adapter that stamps the originating command onto whatever its inner
/// sequence completes with.
struct StampedSequence {
    inner: Box<dyn StepSequence>,
    command_id: CommandId,
}

impl StepSequence for StampedSequence {
    fn next_step(&mut self) -> StepOutcome {
        match self.inner.next_step() {
            StepOutcome::Done(completion) => {
                let mut completion = completion.with_command(self.command_id);
                completion.is_placeholder = false;
                StepOutcome::Done(completion)
            }
            step => step,
        }
    }

    fn command(&self) -> Option<CommandId> {
        Some(self.command_id)
    }
}

/// Invoke a handler under its declared shape and produce one completion.
///
/// For a deferred stepped dispatch the returned value is a placeholder;
/// the real completion arrives later through the scheduler's sink and is
/// allowed to supersede it.
pub fn execute<R>(
    receiver: &mut R,
    handler: &Handler<R>,
    args: &BoundArgs,
    command_id: CommandId,
    scheduler: &mut dyn StepScheduler,
    policy: StepPolicy,
) -> Result<CompletionValue, DispatchError> {
    match handler.body() {
        HandlerBody::FireAndForget(body) => {
            body(receiver, args)?;
            Ok(CompletionValue::placeholder().with_command(command_id))
        }
        HandlerBody::Stepped(body) => {
            let sequence = body(receiver, args)?;
            let stamped = Box::new(StampedSequence {
                inner: sequence,
                command_id,
            });
            match policy {
                StepPolicy::RunToCompletion => Ok(scheduler.run_inline(stamped)),
                StepPolicy::Deferred => {
                    scheduler.schedule(stamped);
                    Ok(CompletionValue::placeholder().with_command(command_id))
                }
            }
        }
        HandlerBody::ExplicitResult(body) => {
            let mut completion = body(receiver, args)?;
            completion.is_placeholder = false;
            Ok(completion.with_command(command_id))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use waldo_types::{CompletionCode, ParamSpec, ParamType};

    use crate::error::HandlerFault;
    use crate::scheduler::{InlineStepper, QueueingStepper, Step};
    use crate::sink::RecordingSink;
    use crate::table::HandlerTable;

    use super::*;

    #[derive(Default)]
    struct Probe {
        nudges: u32,
    }

    struct Countdown {
        remaining: u32,
        completion: CompletionValue,
    }

    impl StepSequence for Countdown {
        fn next_step(&mut self) -> StepOutcome {
            if self.remaining == 0 {
                StepOutcome::Done(self.completion.clone())
            } else {
                self.remaining = self.remaining.saturating_sub(1);
                StepOutcome::Step(Step::new("tick", serde_json::json!({})))
            }
        }
    }

    fn only_handler(table: &HandlerTable<Probe>) -> &Handler<Probe> {
        let index = *table
            .action_candidates(table.action_names().next().unwrap())
            .unwrap()
            .first()
            .unwrap();
        table.handler(index).unwrap()
    }

    #[test]
    fn fire_and_forget_synthesizes_a_stamped_placeholder() {
        let table = HandlerTable::builder()
            .fire_and_forget("Nudge", 0, vec![], |probe: &mut Probe, _| {
                probe.nudges = probe.nudges.saturating_add(1);
                Ok(())
            })
            .build();
        let mut probe = Probe::default();
        let mut scheduler = InlineStepper::default();
        let id = CommandId::new();

        let completion = execute(
            &mut probe,
            only_handler(&table),
            &BoundArgs::Positional(vec![]),
            id,
            &mut scheduler,
            StepPolicy::RunToCompletion,
        )
        .unwrap();

        assert_eq!(probe.nudges, 1);
        assert!(completion.success);
        assert!(completion.is_placeholder);
        assert_eq!(completion.command_id, Some(id));
    }

    #[test]
    fn stepped_inline_returns_the_sequence_completion() {
        let table = HandlerTable::builder()
            .stepped("Glide", 0, vec![], |_: &mut Probe, _| {
                Ok(Box::new(Countdown {
                    remaining: 3,
                    completion: CompletionValue::succeeded()
                        .with_return(serde_json::json!({"travelled": 3})),
                }) as Box<dyn StepSequence>)
            })
            .build();
        let mut probe = Probe::default();
        let mut scheduler = InlineStepper::default();
        let id = CommandId::new();

        let completion = execute(
            &mut probe,
            only_handler(&table),
            &BoundArgs::Positional(vec![]),
            id,
            &mut scheduler,
            StepPolicy::RunToCompletion,
        )
        .unwrap();

        assert!(completion.success);
        assert!(completion.is_real());
        assert_eq!(completion.command_id, Some(id));
        assert!(completion.return_value.is_some());
    }

    #[test]
    fn stepped_deferred_parks_the_sequence_and_returns_a_placeholder() {
        let table = HandlerTable::builder()
            .stepped("Glide", 0, vec![], |_: &mut Probe, _| {
                Ok(Box::new(Countdown {
                    remaining: 2,
                    completion: CompletionValue::succeeded(),
                }) as Box<dyn StepSequence>)
            })
            .build();
        let mut probe = Probe::default();
        let mut scheduler = QueueingStepper::new(None);
        let id = CommandId::new();

        let interim = execute(
            &mut probe,
            only_handler(&table),
            &BoundArgs::Positional(vec![]),
            id,
            &mut scheduler,
            StepPolicy::Deferred,
        )
        .unwrap();
        assert!(interim.is_placeholder);
        assert_eq!(scheduler.pending_len(), 1);

        let mut sink = RecordingSink::new();
        assert!(scheduler.pump_one(&mut sink));
        let real = sink.last().unwrap();
        assert!(real.is_real());
        assert_eq!(real.command_id, Some(id));
        assert!(real.may_supersede(&interim));
        assert!(!interim.may_supersede(real));
    }

    #[test]
    fn deferred_budget_failure_keeps_the_command_id() {
        struct Endless;
        impl StepSequence for Endless {
            fn next_step(&mut self) -> StepOutcome {
                StepOutcome::Step(Step::new("tick", serde_json::json!({})))
            }
        }

        let table = HandlerTable::builder()
            .stepped("Spin", 0, vec![], |_: &mut Probe, _| {
                Ok(Box::new(Endless) as Box<dyn StepSequence>)
            })
            .build();
        let mut probe = Probe::default();
        let mut scheduler = QueueingStepper::new(Some(5));
        let id = CommandId::new();

        execute(
            &mut probe,
            only_handler(&table),
            &BoundArgs::Positional(vec![]),
            id,
            &mut scheduler,
            StepPolicy::Deferred,
        )
        .unwrap();

        let mut sink = RecordingSink::new();
        scheduler.pump_one(&mut sink);
        let failure = sink.last().unwrap();
        assert!(!failure.success);
        assert_eq!(failure.error_code, CompletionCode::StepBudgetExhausted);
        assert_eq!(failure.command_id, Some(id));
    }

    #[test]
    fn explicit_result_passes_through_with_placeholder_cleared() {
        let table = HandlerTable::builder()
            .explicit(
                "Probe",
                0,
                vec![ParamSpec::required("depth", ParamType::Float)],
                |_: &mut Probe, args: &BoundArgs| {
                    let depth = args.float_at(0).unwrap_or_default();
                    Ok(CompletionValue::succeeded()
                        .with_return(serde_json::json!({"depth": depth})))
                },
            )
            .build();
        let mut probe = Probe::default();
        let mut scheduler = InlineStepper::default();
        let id = CommandId::new();

        let completion = execute(
            &mut probe,
            only_handler(&table),
            &BoundArgs::Positional(vec![waldo_types::ArgValue::Float(4.5)]),
            id,
            &mut scheduler,
            StepPolicy::RunToCompletion,
        )
        .unwrap();

        assert!(completion.is_real());
        assert_eq!(completion.command_id, Some(id));
        assert_eq!(
            completion.return_value,
            Some(serde_json::json!({"depth": 4.5})),
        );
    }

    #[test]
    fn handler_faults_propagate_untouched() {
        let table = HandlerTable::builder()
            .fire_and_forget("Jam", 0, vec![], |_: &mut Probe, _| {
                Err(HandlerFault::msg("servo jammed"))
            })
            .build();
        let mut probe = Probe::default();
        let mut scheduler = InlineStepper::default();

        let err = execute(
            &mut probe,
            only_handler(&table),
            &BoundArgs::Positional(vec![]),
            CommandId::new(),
            &mut scheduler,
            StepPolicy::RunToCompletion,
        )
        .unwrap_err();

        assert!(matches!(err, DispatchError::Handler(_)));
        assert_eq!(err.to_string(), "servo jammed");
    }
}
