//! The dispatcher: one entry point composing the whole pipeline.
//!
//! Each call walks Registry, Resolver, Binder, and Controller in that
//! order for a single command. Any failure short-circuits before the
//! handler body runs; a produced completion is delivered to the sink and
//! also returned to the caller.

use tracing::debug;
use waldo_types::{Command, CompletionValue, HandlerDescriptor};

use crate::binder::bind;
use crate::config::DispatchConfig;
use crate::controller::execute;
use crate::error::DispatchError;
use crate::registry::Registry;
use crate::resolver::resolve;
use crate::scheduler::StepScheduler;
use crate::sink::CompletionSink;
use crate::table::HandlerTable;

/// Dispatch engine for one receiver type.
///
/// Dispatch runs entirely on the caller's thread and takes `&mut self`.
/// A host sharing one dispatcher across threads must supply its own
/// lock.
pub struct ActionDispatcher<R> {
    registry: Registry<R>,
    config: DispatchConfig,
}

impl<R> ActionDispatcher<R> {
    /// Wrap a frozen handler table with the default configuration.
    pub fn new(table: HandlerTable<R>) -> Self {
        Self::with_config(table, DispatchConfig::default())
    }

    /// Wrap a frozen handler table with an explicit configuration.
    pub const fn with_config(table: HandlerTable<R>, config: DispatchConfig) -> Self {
        Self {
            registry: Registry::new(table),
            config,
        }
    }

    /// The registry, for introspection and cache assertions.
    pub const fn registry(&self) -> &Registry<R> {
        &self.registry
    }

    /// The active configuration.
    pub const fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Dispatch one command against the receiver.
    ///
    /// On success the completion has already been delivered to `sink`
    /// when this returns. Errors are returned without touching the sink;
    /// the caller decides how to surface them.
    pub fn dispatch(
        &mut self,
        receiver: &mut R,
        command: &Command,
        scheduler: &mut dyn StepScheduler,
        sink: &mut dyn CompletionSink,
    ) -> Result<CompletionValue, DispatchError> {
        if command.action.is_empty() {
            return Err(DispatchError::NotFound {
                action: String::new(),
            });
        }

        self.registry.ensure_cached(&command.action)?;
        let (ordered, childmost) = self
            .registry
            .cached(&command.action)
            .map_or((&[][..], 0), |set| (set.ordered.as_slice(), set.childmost));
        let described: Vec<(usize, &HandlerDescriptor)> = ordered
            .iter()
            .filter_map(|&i| self.registry.table().handler(i).map(|h| (i, h.descriptor())))
            .collect();

        let resolution = resolve(
            &command.action,
            &described,
            childmost,
            command,
            self.config.tie_policy,
        )?;
        let handler = self
            .registry
            .table()
            .handler(resolution.index)
            .ok_or_else(|| DispatchError::Internal {
                message: format!("resolved index {} has no handler", resolution.index),
            })?;

        let siblings: Vec<&HandlerDescriptor> = described
            .iter()
            .filter(|&&(i, _)| i != resolution.index)
            .map(|&(_, d)| d)
            .collect();
        let args = bind(handler.descriptor(), &siblings, command)?;

        let completion = execute(
            receiver,
            handler,
            &args,
            command.id,
            scheduler,
            self.config.step_policy,
        )?;
        sink.complete(completion.clone());
        debug!(
            action = %command.action,
            command = %command.id,
            handler = %handler.descriptor().signature(),
            matched = ?resolution.match_count,
            "dispatched"
        );
        Ok(completion)
    }
}

impl<R> core::fmt::Debug for ActionDispatcher<R> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ActionDispatcher")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .finish()
    }
}
