use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ---------------------------------------------------------------------------
// SubtaskOrdinal
// ---------------------------------------------------------------------------

/// Compound `task.index` ordinal, displayed as `"3.2"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SubtaskOrdinal {
    pub task: u32,
    pub index: u32,
}

impl SubtaskOrdinal {
    pub fn new(task: u32, index: u32) -> Self {
        Self { task, index }
    }

    /// Same subordinal, moved under `task`.
    pub fn under(self, task: u32) -> Self {
        Self { task, ..self }
    }
}

impl fmt::Display for SubtaskOrdinal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.task, self.index)
    }
}

impl FromStr for SubtaskOrdinal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (task, index) = s
            .split_once('.')
            .ok_or_else(|| format!("invalid subtask ordinal '{s}'"))?;
        let task = task
            .parse()
            .map_err(|_| format!("invalid subtask ordinal '{s}'"))?;
        let index = index
            .parse()
            .map_err(|_| format!("invalid subtask ordinal '{s}'"))?;
        Ok(Self { task, index })
    }
}

impl Serialize for SubtaskOrdinal {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for SubtaskOrdinal {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Task / Subtask
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub ordinal: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<Subtask>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subtask {
    pub ordinal: SubtaskOrdinal,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub acceptance_criteria: Vec<String>,
}

impl Task {
    pub fn new(ordinal: u32, title: impl Into<String>) -> Self {
        Self {
            ordinal,
            title: title.into(),
            description: String::new(),
            acceptance_criteria: Vec::new(),
            subtasks: Vec::new(),
        }
    }

    /// Attach `subtask`, forcing its ordinal under this task.
    pub fn adopt(&mut self, mut subtask: Subtask) {
        subtask.ordinal = subtask.ordinal.under(self.ordinal);
        self.subtasks.push(subtask);
    }
}

impl Subtask {
    pub fn new(ordinal: SubtaskOrdinal, title: impl Into<String>) -> Self {
        Self {
            ordinal,
            title: title.into(),
            description: String::new(),
            acceptance_criteria: Vec::new(),
        }
    }
}

// ---------------------------------------------------------------------------
// Task list helpers
// ---------------------------------------------------------------------------

pub fn subtask_count(tasks: &[Task]) -> usize {
    tasks.iter().map(|t| t.subtasks.len()).sum()
}

/// Human-readable summary: "3 tasks, 7 subtasks (1 task without subtasks)"
pub fn summarize(tasks: &[Task]) -> String {
    let bare = tasks.iter().filter(|t| t.subtasks.is_empty()).count();
    let base = format!("{} tasks, {} subtasks", tasks.len(), subtask_count(tasks));
    match bare {
        0 => base,
        1 => format!("{base} (1 task without subtasks)"),
        n => format!("{base} ({n} tasks without subtasks)"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
