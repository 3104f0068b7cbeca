//! The inbound command: an action name plus a named-argument bag.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::CommandId;

/// A single inbound command for one receiver.
///
/// The argument bag is deliberately open: keys are free-form strings and
/// values are raw JSON. The dispatch engine decides which handler the bag
/// selects and how each entry converts; nothing is validated at
/// construction time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Correlation ID, stamped onto every completion this command produces.
    #[serde(default)]
    pub id: CommandId,
    /// The action name, matched against handler names case-sensitively.
    pub action: String,
    /// Named arguments, keyed by parameter name.
    #[serde(default)]
    pub arguments: BTreeMap<String, serde_json::Value>,
    /// When the command was submitted.
    #[serde(default = "Utc::now")]
    pub submitted_at: DateTime<Utc>,
}

impl Command {
    /// Create a command with an empty argument bag.
    pub fn new(action: impl Into<String>) -> Self {
        Self {
            id: CommandId::new(),
            action: action.into(),
            arguments: BTreeMap::new(),
            submitted_at: Utc::now(),
        }
    }

    /// Add one named argument, consuming and returning the command.
    #[must_use]
    pub fn with_arg(mut self, name: impl Into<String>, value: serde_json::Value) -> Self {
        self.arguments.insert(name.into(), value);
        self
    }

    /// Whether the bag contains an argument with this exact name.
    pub fn has_argument(&self, name: &str) -> bool {
        self.arguments.contains_key(name)
    }

    /// The argument names present in the bag, in sorted order.
    pub fn argument_names(&self) -> impl Iterator<Item = &str> {
        self.arguments.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_arg_accumulates_into_the_bag() {
        let cmd = Command::new("Teleport")
            .with_arg("x", serde_json::json!(1.0))
            .with_arg("y", serde_json::json!(2.0));
        assert!(cmd.has_argument("x"));
        assert!(cmd.has_argument("y"));
        assert!(!cmd.has_argument("z"));
        let names: Vec<&str> = cmd.argument_names().collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn deserializes_with_defaults_for_id_bag_and_timestamp() {
        let parsed: Result<Command, _> =
            serde_json::from_value(serde_json::json!({"action": "Halt"}));
        let cmd = parsed.unwrap_or_else(|_| Command::new("missing"));
        assert_eq!(cmd.action, "Halt");
        assert!(cmd.arguments.is_empty());
    }

    #[test]
    fn same_action_gets_distinct_ids() {
        let a = Command::new("Move");
        let b = Command::new("Move");
        assert_ne!(a.id, b.id);
    }
}
