//! Rebuilds the Task → Subtask tree from the flat ticket registry.
//!
//! The registry only links a subtask to its parent through `parent_key`, so
//! the tree is re-derived on every read. This is a pure function of the
//! entry list; ordering follows first appearance in the list.

use crate::registry::{TicketEntry, TicketKind};
use serde::Serialize;

pub const NO_DESCRIPTION: &str = "No description available.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtaskNode {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskNode {
    pub key: String,
    pub summary: String,
    pub description: String,
    pub acceptance_criteria: Vec<String>,
    pub subtasks: Vec<SubtaskNode>,
}

/// Tasks keyed by issue key, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TicketTree {
    pub tasks: Vec<TaskNode>,
    /// Subtask keys whose parent was missing or not seen before them.
    pub dropped: Vec<String>,
}

impl TicketTree {
    pub fn get(&self, key: &str) -> Option<&TaskNode> {
        self.tasks.iter().find(|t| t.key == key)
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut TaskNode> {
        self.tasks.iter_mut().find(|t| t.key == key)
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }
}

fn description_of(entry: &TicketEntry) -> String {
    entry
        .description
        .clone()
        .unwrap_or_else(|| NO_DESCRIPTION.to_string())
}

pub fn reconstruct(entries: &[TicketEntry]) -> TicketTree {
    let mut tree = TicketTree::default();

    for entry in entries {
        match entry.kind {
            TicketKind::Task => {
                let node = TaskNode {
                    key: entry.key.clone(),
                    summary: entry.summary.clone(),
                    description: description_of(entry),
                    acceptance_criteria: entry.acceptance_criteria.clone(),
                    subtasks: Vec::new(),
                };
                match tree.get_mut(&entry.key) {
                    Some(existing) => *existing = node,
                    None => tree.tasks.push(node),
                }
            }
            TicketKind::Subtask => {
                let parent = entry
                    .parent_key
                    .as_deref()
                    .and_then(|pk| tree.tasks.iter_mut().find(|t| t.key == pk));
                let Some(parent) = parent else {
                    tracing::warn!(
                        "dropping subtask {} ({}): parent {:?} not found",
                        entry.key,
                        entry.summary,
                        entry.parent_key
                    );
                    tree.dropped.push(entry.key.clone());
                    continue;
                };
                let node = SubtaskNode {
                    key: entry.key.clone(),
                    summary: entry.summary.clone(),
                    description: description_of(entry),
                    acceptance_criteria: entry.acceptance_criteria.clone(),
                };
                match parent.subtasks.iter_mut().find(|s| s.key == entry.key) {
                    Some(existing) => *existing = node,
                    None => parent.subtasks.push(node),
                }
            }
            TicketKind::Other => {
                tracing::debug!("ignoring registry entry {} of unknown type", entry.key);
            }
        }
    }

    tree
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
