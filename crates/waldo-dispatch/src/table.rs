//! The handler table: explicit registration plus the build-time conflict
//! scan.
//!
//! Handlers are registered through a [`HandlerTableBuilder`], one call per
//! handler, carrying the action name, declaring level, ordered parameters,
//! and a body. [`HandlerTableBuilder::build`] then scans every action name
//! once:
//!
//! - identical type signatures across levels collapse to the most derived
//!   handler (classic hiding);
//! - call-compatible or otherwise irreconcilable signatures are recorded
//!   as [`ConflictRecord`]s and poison the action name for all future
//!   dispatch, leaving other actions untouched;
//! - envelope catch-alls and same-level duplicate signatures pass through
//!   untouched, because their collisions are judged per command at
//!   resolve time rather than here.
//!
//! The scan never runs again: the surviving candidate lists are fixed for
//! the table's lifetime.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BTreeSet};

use tracing::warn;
use waldo_types::{CompletionValue, ExecutionShape, HandlerDescriptor, ParamSpec, ParamType};

use crate::binder::BoundArgs;
use crate::error::{ConflictKind, ConflictRecord, HandlerFault};
use crate::scheduler::StepSequence;

// ---------------------------------------------------------------------------
// Handler bodies
// ---------------------------------------------------------------------------

/// Body of a fire-and-forget handler.
pub type FireBody<R> = Box<dyn Fn(&mut R, &BoundArgs) -> Result<(), HandlerFault>>;

/// Body of a stepped handler, producing a resumable step sequence.
pub type SteppedBody<R> =
    Box<dyn Fn(&mut R, &BoundArgs) -> Result<Box<dyn StepSequence>, HandlerFault>>;

/// Body of an explicit-result handler.
pub type ExplicitBody<R> = Box<dyn Fn(&mut R, &BoundArgs) -> Result<CompletionValue, HandlerFault>>;

/// The callable half of a handler, one variant per execution shape.
pub enum HandlerBody<R> {
    /// Returns nothing; the engine synthesizes a placeholder completion.
    FireAndForget(FireBody<R>),
    /// Returns a step sequence for the external scheduler.
    Stepped(SteppedBody<R>),
    /// Returns its completion value directly.
    ExplicitResult(ExplicitBody<R>),
}

/// One registered handler: descriptor plus body.
///
/// The descriptor's shape always agrees with the body variant; the
/// builder constructs both together.
pub struct Handler<R> {
    descriptor: HandlerDescriptor,
    body: HandlerBody<R>,
}

impl<R> Handler<R> {
    /// The static description the registry, resolver, and binder work from.
    pub const fn descriptor(&self) -> &HandlerDescriptor {
        &self.descriptor
    }

    /// The callable body.
    pub const fn body(&self) -> &HandlerBody<R> {
        &self.body
    }
}

impl<R> core::fmt::Debug for Handler<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Handler")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Accumulates handler registrations for one receiver type.
pub struct HandlerTableBuilder<R> {
    handlers: Vec<Handler<R>>,
}

impl<R> HandlerTableBuilder<R> {
    /// Start with no registrations.
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Register a fire-and-forget handler.
    #[must_use]
    pub fn fire_and_forget(
        mut self,
        action: impl Into<String>,
        declaring_level: u32,
        params: Vec<ParamSpec>,
        body: impl Fn(&mut R, &BoundArgs) -> Result<(), HandlerFault> + 'static,
    ) -> Self {
        self.handlers.push(Handler {
            descriptor: HandlerDescriptor::new(
                action,
                declaring_level,
                params,
                ExecutionShape::FireAndForget,
            ),
            body: HandlerBody::FireAndForget(Box::new(body)),
        });
        self
    }

    /// Register a stepped handler.
    #[must_use]
    pub fn stepped(
        mut self,
        action: impl Into<String>,
        declaring_level: u32,
        params: Vec<ParamSpec>,
        body: impl Fn(&mut R, &BoundArgs) -> Result<Box<dyn StepSequence>, HandlerFault> + 'static,
    ) -> Self {
        self.handlers.push(Handler {
            descriptor: HandlerDescriptor::new(
                action,
                declaring_level,
                params,
                ExecutionShape::Stepped,
            ),
            body: HandlerBody::Stepped(Box::new(body)),
        });
        self
    }

    /// Register an explicit-result handler.
    #[must_use]
    pub fn explicit(
        mut self,
        action: impl Into<String>,
        declaring_level: u32,
        params: Vec<ParamSpec>,
        body: impl Fn(&mut R, &BoundArgs) -> Result<CompletionValue, HandlerFault> + 'static,
    ) -> Self {
        self.handlers.push(Handler {
            descriptor: HandlerDescriptor::new(
                action,
                declaring_level,
                params,
                ExecutionShape::ExplicitResult,
            ),
            body: HandlerBody::ExplicitResult(Box::new(body)),
        });
        self
    }

    /// Run the conflict scan and freeze the table.
    pub fn build(self) -> HandlerTable<R> {
        let mut groups: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
        for (index, handler) in self.handlers.iter().enumerate() {
            groups
                .entry(handler.descriptor.action.as_str())
                .or_default()
                .push(index);
        }

        let mut by_action: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        let mut conflicts: BTreeMap<String, Vec<ConflictRecord>> = BTreeMap::new();
        for (action, group) in groups {
            let described: Vec<(usize, &HandlerDescriptor)> = group
                .iter()
                .filter_map(|&i| self.handlers.get(i).map(|h| (i, h.descriptor())))
                .collect();
            let (surviving, records) = scan_action(action, &described);
            if records.is_empty() {
                by_action.insert(action.to_string(), surviving);
            } else {
                warn!(
                    action,
                    count = records.len(),
                    "registration conflicts poison action"
                );
                conflicts.insert(action.to_string(), records);
            }
        }

        HandlerTable {
            handlers: self.handlers,
            by_action,
            conflicts,
        }
    }
}

impl<R> Default for HandlerTableBuilder<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> core::fmt::Debug for HandlerTableBuilder<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerTableBuilder")
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Conflict scan
// ---------------------------------------------------------------------------

/// Scan one action's handlers, walking most-derived to least-derived.
///
/// Returns the surviving candidate indexes (hiding applied) and every
/// conflict found. A non-empty conflict list poisons the action.
fn scan_action(
    action: &str,
    candidates: &[(usize, &HandlerDescriptor)],
) -> (Vec<usize>, Vec<ConflictRecord>) {
    let mut records: Vec<ConflictRecord> = Vec::new();

    // Single-handler defects first.
    let mut well_formed: Vec<(usize, &HandlerDescriptor)> = Vec::new();
    for &(index, descriptor) in candidates {
        if let Some(kind) = single_handler_defect(descriptor) {
            records.push(ConflictRecord {
                action: action.to_string(),
                kind,
                handlers: vec![descriptor.signature()],
            });
            continue;
        }
        well_formed.push((index, descriptor));
    }

    // Most-derived first; stable within a level, so registration order
    // breaks ties.
    well_formed.sort_by_key(|&(_, d)| Reverse(d.declaring_level));

    let mut working: Vec<(usize, &HandlerDescriptor)> = Vec::new();
    for (index, incoming) in well_formed {
        let mut hidden = false;
        let mut conflicted = false;
        for &(_, kept) in &working {
            // Envelope catch-alls never take part in name-based dispatch,
            // so they neither hide nor conflict here; collisions among
            // them surface at resolve time against the childmost level.
            if kept.is_aggregate() || incoming.is_aggregate() {
                continue;
            }
            if same_type_signature(kept, incoming) {
                if kept.declaring_level > incoming.declaring_level {
                    // The working entry is more derived; the incoming
                    // handler is hidden by it.
                    hidden = true;
                    break;
                }
                // Same level: left for the resolver's tie policy.
                continue;
            }
            if let Some(kind) = pairwise_conflict(kept, incoming) {
                records.push(pair_record(action, kind, kept, incoming));
                conflicted = true;
                break;
            }
        }
        if !hidden && !conflicted {
            working.push((index, incoming));
        }
    }

    (working.into_iter().map(|(i, _)| i).collect(), records)
}

/// Defects a handler has all by itself.
fn single_handler_defect(descriptor: &HandlerDescriptor) -> Option<ConflictKind> {
    let uses_envelope = descriptor
        .params
        .iter()
        .any(|p| matches!(p.ty, ParamType::Envelope));
    if uses_envelope && !descriptor.is_aggregate() {
        return Some(ConflictKind::MisplacedEnvelope);
    }
    let default_agrees = descriptor
        .params
        .iter()
        .all(|p| p.default.as_ref().is_none_or(|d| d.kind() == p.ty));
    if !default_agrees {
        return Some(ConflictKind::DefaultTypeMismatch);
    }
    None
}

/// Conflicts between two well-formed, non-identical signatures.
fn pairwise_conflict(a: &HandlerDescriptor, b: &HandlerDescriptor) -> Option<ConflictKind> {
    if a.params.len() == b.params.len() {
        // Equal counts with a type mismatch somewhere: independent
        // overloads, no conflict.
        return None;
    }

    let (shorter, longer) = if a.params.len() < b.params.len() {
        (a, b)
    } else {
        (b, a)
    };
    let prefix = type_prefix_len(shorter, longer);

    if prefix == shorter.params.len() && prefix >= 1 {
        // The longer signature is reachable from the shorter one's calls.
        // Whether the divergence parameter is defaulted or required,
        // named dispatch cannot disambiguate reliably.
        let defaulted = longer.params.get(prefix).is_some_and(ParamSpec::has_default);
        return Some(if defaulted {
            ConflictKind::DefaultedExtension
        } else {
            ConflictKind::RequiredExtension
        });
    }

    if a.declaring_level == b.declaring_level
        && name_sets_nested(shorter, longer)
        && prefix < shorter.params.len()
    {
        return Some(ConflictKind::NameSubsetTypeMismatch);
    }

    None
}

fn pair_record(
    action: &str,
    kind: ConflictKind,
    a: &HandlerDescriptor,
    b: &HandlerDescriptor,
) -> ConflictRecord {
    ConflictRecord {
        action: action.to_string(),
        kind,
        handlers: vec![a.signature(), b.signature()],
    }
}

/// Length of the position-by-position type match, capped at the shorter
/// signature.
fn type_prefix_len(a: &HandlerDescriptor, b: &HandlerDescriptor) -> usize {
    a.params
        .iter()
        .zip(&b.params)
        .take_while(|(pa, pb)| pa.ty == pb.ty)
        .count()
}

fn same_type_signature(a: &HandlerDescriptor, b: &HandlerDescriptor) -> bool {
    a.params.len() == b.params.len() && type_prefix_len(a, b) == a.params.len()
}

fn name_sets_nested(a: &HandlerDescriptor, b: &HandlerDescriptor) -> bool {
    let names_a: BTreeSet<&str> = a.param_names().collect();
    let names_b: BTreeSet<&str> = b.param_names().collect();
    names_a.is_subset(&names_b) || names_b.is_subset(&names_a)
}

// ---------------------------------------------------------------------------
// The frozen table
// ---------------------------------------------------------------------------

/// All handlers for one receiver type, scanned and frozen.
pub struct HandlerTable<R> {
    handlers: Vec<Handler<R>>,
    by_action: BTreeMap<String, Vec<usize>>,
    conflicts: BTreeMap<String, Vec<ConflictRecord>>,
}

impl<R> HandlerTable<R> {
    /// Start a builder.
    pub const fn builder() -> HandlerTableBuilder<R> {
        HandlerTableBuilder::new()
    }

    /// Total number of registered handlers, hidden ones included.
    pub const fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the table has no handlers at all.
    pub const fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// The handler at a table index.
    pub fn handler(&self, index: usize) -> Option<&Handler<R>> {
        self.handlers.get(index)
    }

    /// Surviving candidate indexes for an action, most-derived first.
    ///
    /// `None` for unknown and for poisoned action names; the two are
    /// distinguished through [`conflicts_for`](Self::conflicts_for).
    pub fn action_candidates(&self, action: &str) -> Option<&[usize]> {
        self.by_action.get(action).map(Vec::as_slice)
    }

    /// Every recorded conflict, keyed by poisoned action name.
    pub const fn conflicts(&self) -> &BTreeMap<String, Vec<ConflictRecord>> {
        &self.conflicts
    }

    /// Conflicts recorded for one action name, if it is poisoned.
    pub fn conflicts_for(&self, action: &str) -> Option<&[ConflictRecord]> {
        self.conflicts.get(action).map(Vec::as_slice)
    }

    /// Dispatchable action names, sorted.
    pub fn action_names(&self) -> impl Iterator<Item = &str> {
        self.by_action.keys().map(String::as_str)
    }
}

impl<R> core::fmt::Debug for HandlerTable<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HandlerTable")
            .field("handlers", &self.handlers.len())
            .field("actions", &self.by_action.len())
            .field("poisoned", &self.conflicts.len())
            .finish()
    }
}
