//! Overload resolution: pick exactly one handler for a command.
//!
//! Candidates arrive pre-sorted from the registry, simplest signature
//! first. Resolution walks them once, counting how many declared
//! parameter names each candidate finds in the argument bag, and keeps
//! the best. An envelope catch-all is accepted as a provisional fallback
//! with no count of its own; any candidate that matches at least one name
//! displaces it. Ties on count between different levels go to the more
//! derived handler. Ties at the same level fall to the configured
//! [`TiePolicy`].

use std::collections::BTreeSet;

use tracing::warn;
use waldo_types::{Command, HandlerDescriptor};

use crate::config::TiePolicy;
use crate::error::DispatchError;

/// The outcome of a successful resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    /// Table index of the chosen handler.
    pub index: usize,
    /// Number of bag keys the winner matched by name. `None` when the
    /// winner is the envelope fallback, which is never scored.
    pub match_count: Option<usize>,
}

/// Pick one handler from pre-sorted candidates for this command.
///
/// `childmost` is the most derived declaring level present among the
/// candidates; a collision of envelope catch-alls at that level is
/// ambiguous no matter what the bag contains.
pub fn resolve(
    action: &str,
    candidates: &[(usize, &HandlerDescriptor)],
    childmost: u32,
    command: &Command,
    policy: TiePolicy,
) -> Result<Resolution, DispatchError> {
    if candidates.is_empty() {
        return Err(DispatchError::NotFound {
            action: action.to_string(),
        });
    }

    let leaf_aggregates: Vec<&HandlerDescriptor> = candidates
        .iter()
        .map(|&(_, d)| d)
        .filter(|d| d.is_aggregate() && d.declaring_level == childmost)
        .collect();
    if leaf_aggregates.len() > 1 {
        return Err(DispatchError::Ambiguous {
            action: action.to_string(),
            contenders: leaf_aggregates
                .iter()
                .map(|d| d.signature())
                .collect(),
        });
    }

    let keys: BTreeSet<&str> = command.argument_names().collect();
    let mut best: Option<(usize, &HandlerDescriptor, Option<usize>)> = None;
    let mut fallback_taken = false;
    let mut tied: Vec<&HandlerDescriptor> = Vec::new();

    for &(index, descriptor) in candidates {
        if descriptor.is_aggregate() {
            // The fallback only claims the spot while no candidate has a
            // name-based claim of its own.
            if !fallback_taken
                && best.is_none_or(|(_, _, count)| count.unwrap_or(0) == 0)
            {
                best = Some((index, descriptor, None));
                fallback_taken = true;
                tied.clear();
            }
            continue;
        }

        let count = descriptor
            .param_names()
            .filter(|name| keys.contains(name))
            .count();
        let replaces = best.is_none_or(|(_, best_desc, best_count)| {
            count > best_count.unwrap_or(0)
                || (best_count == Some(count)
                    && descriptor.declaring_level > best_desc.declaring_level)
        });
        if replaces {
            best = Some((index, descriptor, Some(count)));
            tied.clear();
        } else if best.is_some_and(|(_, best_desc, best_count)| {
            best_count == Some(count)
                && best_desc.declaring_level == descriptor.declaring_level
        }) {
            tied.push(descriptor);
        }
    }

    let Some((index, descriptor, match_count)) = best else {
        return Err(DispatchError::Internal {
            message: format!("no candidate for {action:?} was eligible"),
        });
    };

    if !tied.is_empty() {
        match policy {
            TiePolicy::Strict => {
                let contenders = std::iter::once(descriptor)
                    .chain(tied)
                    .map(HandlerDescriptor::signature)
                    .collect();
                return Err(DispatchError::Ambiguous {
                    action: action.to_string(),
                    contenders,
                });
            }
            TiePolicy::Permissive => {
                warn!(
                    action,
                    winner = %descriptor.signature(),
                    contenders = tied.len(),
                    "same-level overload tie; keeping the first candidate"
                );
            }
        }
    }

    Ok(Resolution { index, match_count })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use waldo_types::{ExecutionShape, ParamSpec, ParamType};

    use super::*;

    fn named(action: &str, level: u32, params: &[&str]) -> HandlerDescriptor {
        HandlerDescriptor::new(
            action,
            level,
            params
                .iter()
                .map(|name| ParamSpec::required(*name, ParamType::Float))
                .collect(),
            ExecutionShape::FireAndForget,
        )
    }

    fn catch_all(action: &str, level: u32) -> HandlerDescriptor {
        HandlerDescriptor::new(
            action,
            level,
            vec![ParamSpec::required("envelope", ParamType::Envelope)],
            ExecutionShape::FireAndForget,
        )
    }

    fn indexed(descriptors: &[HandlerDescriptor]) -> Vec<(usize, &HandlerDescriptor)> {
        descriptors.iter().enumerate().collect()
    }

    #[test]
    fn empty_candidate_list_is_not_found() {
        let command = Command::new("Foo")
            .with_arg("x", serde_json::json!(1))
            .with_arg("z", serde_json::json!(9));
        let err = resolve("Foo", &[], 0, &command, TiePolicy::Permissive).unwrap_err();
        assert!(matches!(err, DispatchError::NotFound { .. }));
    }

    #[test]
    fn richer_name_match_beats_zero_param_overload() {
        let descriptors = vec![named("Move", 0, &[]), named("Move", 0, &["moveMagnitude"])];
        let command = Command::new("Move").with_arg("moveMagnitude", serde_json::json!(0.5));

        let resolution = resolve(
            "Move",
            &indexed(&descriptors),
            0,
            &command,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(resolution.index, 1);
        assert_eq!(resolution.match_count, Some(1));
    }

    #[test]
    fn full_coverage_beats_partial_coverage_at_one_level() {
        let descriptors = vec![
            named("Survey", 0, &["bearing", "lift"]),
            named("Survey", 0, &["bearing", "span"]),
        ];
        let command = Command::new("Survey")
            .with_arg("bearing", serde_json::json!(90.0))
            .with_arg("span", serde_json::json!(45.0));

        let resolution = resolve(
            "Survey",
            &indexed(&descriptors),
            0,
            &command,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(resolution.index, 1);
        assert_eq!(resolution.match_count, Some(2));
    }

    #[test]
    fn lone_catch_all_takes_any_bag() {
        let descriptors = vec![catch_all("Perform", 0)];
        let command = Command::new("Perform").with_arg("whatever", serde_json::json!([1, 2]));

        let resolution = resolve(
            "Perform",
            &indexed(&descriptors),
            0,
            &command,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(resolution.index, 0);
        assert_eq!(resolution.match_count, None);
    }

    #[test]
    fn catch_all_collision_at_childmost_level_is_ambiguous() {
        let descriptors = vec![catch_all("Perform", 1), catch_all("Perform", 1)];
        let command = Command::new("Perform");

        let err = resolve(
            "Perform",
            &indexed(&descriptors),
            1,
            &command,
            TiePolicy::Permissive,
        )
        .unwrap_err();
        match err {
            DispatchError::Ambiguous { contenders, .. } => assert_eq!(contenders.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn named_match_displaces_the_fallback() {
        let descriptors = vec![catch_all("Look", 0), named("Look", 0, &["degrees"])];
        let command = Command::new("Look").with_arg("degrees", serde_json::json!(15.0));

        let resolution = resolve(
            "Look",
            &indexed(&descriptors),
            0,
            &command,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(resolution.index, 1);
        assert_eq!(resolution.match_count, Some(1));
    }

    #[test]
    fn empty_bag_stays_with_the_fallback() {
        let descriptors = vec![catch_all("Look", 0), named("Look", 0, &["degrees"])];
        let command = Command::new("Look");

        let resolution = resolve(
            "Look",
            &indexed(&descriptors),
            0,
            &command,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(resolution.index, 0);
        assert_eq!(resolution.match_count, None);
    }

    #[test]
    fn equal_count_prefers_the_more_derived_level() {
        let descriptors = vec![
            named("Scan", 1, &["range"]),
            named("Scan", 0, &["band"]),
        ];

        let empty = Command::new("Scan");
        let resolution = resolve(
            "Scan",
            &indexed(&descriptors),
            1,
            &empty,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(resolution.index, 0);

        // A real name match on the base overload still wins over the
        // derived one's zero matches.
        let banded = Command::new("Scan").with_arg("band", serde_json::json!(2.4));
        let resolution = resolve(
            "Scan",
            &indexed(&descriptors),
            1,
            &banded,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(resolution.index, 1);
        assert_eq!(resolution.match_count, Some(1));
    }

    #[test]
    fn same_level_tie_honors_the_policy() {
        let descriptors = vec![
            named("Stow", 0, &["arm"]),
            named("Stow", 0, &["latch"]),
        ];
        let command = Command::new("Stow");

        let permissive = resolve(
            "Stow",
            &indexed(&descriptors),
            0,
            &command,
            TiePolicy::Permissive,
        )
        .unwrap();
        assert_eq!(permissive.index, 0);

        let err = resolve(
            "Stow",
            &indexed(&descriptors),
            0,
            &command,
            TiePolicy::Strict,
        )
        .unwrap_err();
        match err {
            DispatchError::Ambiguous { contenders, .. } => assert_eq!(contenders.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }
}
