use crate::error::{Result, TicketflowError};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

const REQUIRED_FIELDS: [&str; 3] = ["key", "summary", "type"];

// ---------------------------------------------------------------------------
// TicketKind
// ---------------------------------------------------------------------------

/// Structural role of a registry entry. Anything else loads as `Other` and
/// is ignored when the hierarchy is rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketKind {
    Task,
    Subtask,
    #[serde(other)]
    Other,
}

impl fmt::Display for TicketKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TicketKind::Task => "Task",
            TicketKind::Subtask => "Subtask",
            TicketKind::Other => "Other",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// TicketEntry
// ---------------------------------------------------------------------------

/// One created issue, flattened. `parent_key` is the only structural link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketEntry {
    pub key: String,
    pub summary: String,
    #[serde(rename = "type")]
    pub kind: TicketKind,
    /// Tracker issue-type name actually used, e.g. "Story" after fallback.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_key: Option<String>,
}

impl TicketEntry {
    pub fn task(key: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            summary: summary.into(),
            kind: TicketKind::Task,
            issue_type: None,
            description: None,
            acceptance_criteria: Vec::new(),
            parent_key: None,
        }
    }

    pub fn subtask(
        key: impl Into<String>,
        summary: impl Into<String>,
        parent_key: impl Into<String>,
    ) -> Self {
        Self {
            kind: TicketKind::Subtask,
            parent_key: Some(parent_key.into()),
            ..Self::task(key, summary)
        }
    }
}

// ---------------------------------------------------------------------------
// Load / save
// ---------------------------------------------------------------------------

/// Parse registry JSON, rejecting any entry missing `key`, `summary` or `type`.
pub fn parse_registry(data: &str) -> Result<Vec<TicketEntry>> {
    let value: serde_json::Value = serde_json::from_str(data)?;
    let items = value.as_array().ok_or(TicketflowError::RegistryNotArray)?;

    let mut entries = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let missing: Vec<String> = REQUIRED_FIELDS
            .iter()
            .filter(|f| item.get(**f).is_none())
            .map(|f| f.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(TicketflowError::InvalidTicketEntry { index, missing });
        }
        entries.push(serde_json::from_value(item.clone())?);
    }
    Ok(entries)
}

pub fn load(path: &Path) -> Result<Vec<TicketEntry>> {
    let data = std::fs::read_to_string(path)?;
    let entries = parse_registry(&data)?;
    tracing::info!("read {} tickets from {}", entries.len(), path.display());
    Ok(entries)
}

/// Replace the registry file wholesale.
pub fn save(path: &Path, entries: &[TicketEntry]) -> Result<()> {
    let data = serde_json::to_string_pretty(entries)?;
    crate::io::atomic_write(path, data.as_bytes())?;
    tracing::info!("saved {} ticket keys to {}", entries.len(), path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parses_task_and_subtask_entries() {
        let json = r#"[
            {"key": "PRJ-1", "summary": "A", "type": "Task", "description": "d", "acceptance_criteria": ["c1"]},
            {"key": "PRJ-2", "summary": "B", "type": "Subtask", "parent_key": "PRJ-1"}
        ]"#;
        let entries = parse_registry(json).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].kind, TicketKind::Task);
        assert_eq!(entries[0].acceptance_criteria, vec!["c1"]);
        assert_eq!(entries[1].kind, TicketKind::Subtask);
        assert_eq!(entries[1].parent_key.as_deref(), Some("PRJ-1"));
        assert!(entries[1].description.is_none());
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let json = r#"[
            {"key": "PRJ-1", "summary": "A", "type": "Task"},
            {"key": "PRJ-2", "parent_key": "PRJ-1"}
        ]"#;
        match parse_registry(json).unwrap_err() {
            TicketflowError::InvalidTicketEntry { index, missing } => {
                assert_eq!(index, 1);
                assert_eq!(missing, vec!["summary", "type"]);
            }
            other => panic!("expected InvalidTicketEntry, got {other:?}"),
        }
    }

    #[test]
    fn unknown_type_loads_as_other() {
        let entries = parse_registry(r#"[{"key": "K", "summary": "S", "type": "Epic"}]"#).unwrap();
        assert_eq!(entries[0].kind, TicketKind::Other);
    }

    #[test]
    fn non_array_is_rejected() {
        assert!(matches!(
            parse_registry(r#"{"key": "K"}"#),
            Err(TicketflowError::RegistryNotArray)
        ));
    }

    #[test]
    fn save_overwrites_and_load_reads_back() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("ticket_keys.json");

        let mut first = TicketEntry::task("PRJ-1", "Old");
        first.description = Some("d".into());
        save(&path, &[first]).unwrap();

        let task = TicketEntry::task("PRJ-7", "New");
        let sub = TicketEntry::subtask("PRJ-8", "Child", "PRJ-7");
        save(&path, &[task.clone(), sub.clone()]).unwrap();

        let loaded = load(&path).unwrap();
        assert_eq!(loaded, vec![task, sub]);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"type\": \"Subtask\""));
        assert!(!raw.contains("PRJ-1"));
    }
}
