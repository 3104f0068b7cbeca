//! Per-action candidate cache over a frozen handler table.
//!
//! The first dispatch that touches an action name computes its resolver
//! view -- the candidate list sorted ascending by (required parameter
//! count, total parameter count) together with the childmost declaring
//! level -- and memoizes it. The cache is never invalidated; the table
//! underneath cannot change.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{ConflictRecord, DispatchError};
use crate::table::HandlerTable;

/// The cached resolver view of one action name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateSet {
    /// Table indexes sorted ascending by (required count, total count);
    /// ties keep the table's most-derived-first order.
    pub ordered: Vec<usize>,
    /// The most derived declaring level present among the candidates.
    pub childmost: u32,
}

/// Candidate cache plus introspection over one handler table.
pub struct Registry<R> {
    table: HandlerTable<R>,
    cache: BTreeMap<String, CandidateSet>,
    cache_builds: usize,
}

impl<R> Registry<R> {
    /// Wrap a frozen table with an empty cache.
    pub const fn new(table: HandlerTable<R>) -> Self {
        Self {
            table,
            cache: BTreeMap::new(),
            cache_builds: 0,
        }
    }

    /// The underlying table.
    pub const fn table(&self) -> &HandlerTable<R> {
        &self.table
    }

    /// Build and memoize the candidate set for an action if it exists
    /// and is not already cached.
    ///
    /// Fails when the action name was poisoned by registration
    /// conflicts. Unknown action names succeed without caching anything;
    /// the resolver reports those as not found.
    pub fn ensure_cached(&mut self, action: &str) -> Result<(), DispatchError> {
        if let Some(records) = self.table.conflicts_for(action) {
            return Err(DispatchError::RegistrationConflict {
                action: action.to_string(),
                conflicts: records.to_vec(),
            });
        }
        if self.cache.contains_key(action) {
            return Ok(());
        }
        let Some(indexes) = self.table.action_candidates(action) else {
            return Ok(());
        };

        let mut ordered = indexes.to_vec();
        ordered.sort_by_key(|&i| {
            self.table.handler(i).map_or((usize::MAX, usize::MAX), |h| {
                (h.descriptor().required_count(), h.descriptor().params.len())
            })
        });
        let childmost = self.childmost_of(indexes);
        debug!(
            action,
            candidates = ordered.len(),
            childmost,
            "candidate cache built"
        );
        self.cache
            .insert(action.to_string(), CandidateSet { ordered, childmost });
        self.cache_builds = self.cache_builds.saturating_add(1);
        Ok(())
    }

    /// The cached candidate set for an action, if one was built.
    pub fn cached(&self, action: &str) -> Option<&CandidateSet> {
        self.cache.get(action)
    }

    /// How many candidate sets have been built so far.
    ///
    /// Lets tests assert that repeated dispatch of one action builds its
    /// set exactly once.
    pub const fn cache_builds(&self) -> usize {
        self.cache_builds
    }

    /// Action names with a built candidate set, sorted.
    pub fn cached_actions(&self) -> impl Iterator<Item = &str> {
        self.cache.keys().map(String::as_str)
    }

    /// Every registration conflict, keyed by poisoned action name.
    pub const fn conflicts(&self) -> &BTreeMap<String, Vec<ConflictRecord>> {
        self.table.conflicts()
    }

    /// Action names carrying more than one aggregate handler at their
    /// childmost level. Dispatching any of these fails as ambiguous.
    pub fn ambiguous_actions(&self) -> Vec<String> {
        self.table
            .action_names()
            .filter(|name| {
                self.table.action_candidates(name).is_some_and(|indexes| {
                    let childmost = self.childmost_of(indexes);
                    let aggregates = indexes
                        .iter()
                        .filter_map(|&i| self.table.handler(i))
                        .filter(|h| {
                            h.descriptor().is_aggregate()
                                && h.descriptor().declaring_level == childmost
                        })
                        .count();
                    aggregates > 1
                })
            })
            .map(str::to_string)
            .collect()
    }

    fn childmost_of(&self, indexes: &[usize]) -> u32 {
        indexes
            .iter()
            .filter_map(|&i| self.table.handler(i))
            .map(|h| h.descriptor().declaring_level)
            .max()
            .unwrap_or(0)
    }
}

impl<R> core::fmt::Debug for Registry<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Registry")
            .field("table", &self.table)
            .field("cached", &self.cache.len())
            .field("cache_builds", &self.cache_builds)
            .finish()
    }
}
