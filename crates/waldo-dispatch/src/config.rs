//! Tunable dispatch behavior.
//!
//! The engine itself reads nothing from disk; hosts construct a
//! [`DispatchConfig`] (or take the defaults) and hand it to the
//! dispatcher at build time.

/// Default step budget for inline step runs.
///
/// Step sequences are allowed to be long but must not be assumed finite;
/// the budget turns a runaway sequence into a failed completion instead
/// of a hang.
pub const DEFAULT_INLINE_STEP_BUDGET: u64 = 10_000;

/// What to do when two overloads at the same declaring level match the
/// argument bag equally well.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TiePolicy {
    /// Keep the first candidate in sort order and log a warning. This is
    /// the compatibility default: ties resolve silently and
    /// deterministically.
    #[default]
    Permissive,
    /// Refuse to guess: the dispatch fails as ambiguous.
    Strict,
}

/// How stepped handlers are driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StepPolicy {
    /// Drain the step sequence on the dispatching thread; the dispatch
    /// returns the sequence's real completion.
    #[default]
    RunToCompletion,
    /// Park the sequence with the scheduler; the dispatch returns a
    /// placeholder and the real completion arrives through the sink when
    /// the host pumps the scheduler.
    Deferred,
}

/// Configuration for one dispatcher instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Same-level equal-match tie handling (default: [`TiePolicy::Permissive`]).
    pub tie_policy: TiePolicy,

    /// Stepped-handler driving policy (default: [`StepPolicy::RunToCompletion`]).
    pub step_policy: StepPolicy,

    /// Maximum steps an inline run may take before the run is abandoned
    /// with a failed completion (default: 10 000). `None` removes the
    /// guard entirely.
    pub inline_step_budget: Option<u64>,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            tie_policy: TiePolicy::Permissive,
            step_policy: StepPolicy::RunToCompletion,
            inline_step_budget: Some(DEFAULT_INLINE_STEP_BUDGET),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = DispatchConfig::default();
        assert_eq!(cfg.tie_policy, TiePolicy::Permissive);
        assert_eq!(cfg.step_policy, StepPolicy::RunToCompletion);
        assert_eq!(cfg.inline_step_budget, Some(DEFAULT_INLINE_STEP_BUDGET));
    }
}
