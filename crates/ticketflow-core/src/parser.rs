//! Recovers the Task → Subtask hierarchy from language-model text.
//!
//! The model is asked to follow a line grammar (`Task N: ...`,
//! `Subtask N.M: ...`, `Description: ...`, `Acceptance Criteria:`, `- item`)
//! but nothing enforces it. Recognized lines drive a small state machine;
//! everything else is dropped. The only structural error that is corrected
//! rather than ignored is a subtask numbered under the wrong parent: it is
//! kept and renumbered under the task that is currently open.

use crate::error::Result;
use crate::task::{Subtask, SubtaskOrdinal, Task};
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Line classification
// ---------------------------------------------------------------------------

static TASK_RE: OnceLock<Regex> = OnceLock::new();
static SUBTASK_RE: OnceLock<Regex> = OnceLock::new();
static DESCRIPTION_RE: OnceLock<Regex> = OnceLock::new();
static PHASE_RE: OnceLock<Regex> = OnceLock::new();

fn task_re() -> &'static Regex {
    TASK_RE.get_or_init(|| Regex::new(r"^Task (\d+): (.+)").unwrap())
}

fn subtask_re() -> &'static Regex {
    SUBTASK_RE.get_or_init(|| Regex::new(r"^Subtask (\d+)\.(\d+): (.+)").unwrap())
}

fn description_re() -> &'static Regex {
    DESCRIPTION_RE.get_or_init(|| Regex::new(r"^Description: (.+)").unwrap())
}

fn phase_re() -> &'static Regex {
    PHASE_RE.get_or_init(|| Regex::new(r"\s*\(Phase\s*\d+\)").unwrap())
}

const CRITERIA_HEADER: &str = "Acceptance Criteria:";
const CRITERION_PREFIX: &str = "- ";

/// One trimmed, non-blank input line, classified by the first recognizer
/// that accepts it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    TaskHeader { ordinal: u32, title: &'a str },
    SubtaskHeader { ordinal: SubtaskOrdinal, title: &'a str },
    Description(&'a str),
    CriteriaHeader,
    Criterion(&'a str),
    Other,
}

/// Header numerals are all digits, so the only parse failure is overflow.
fn ordinal(digits: &str) -> u32 {
    digits.parse().unwrap_or(u32::MAX)
}

pub fn classify(line: &str) -> Line<'_> {
    if let Some(caps) = task_re().captures(line) {
        let title = caps.get(2).map_or("", |m| m.as_str()).trim();
        return Line::TaskHeader {
            ordinal: ordinal(&caps[1]),
            title,
        };
    }
    if let Some(caps) = subtask_re().captures(line) {
        let title = caps.get(3).map_or("", |m| m.as_str()).trim();
        return Line::SubtaskHeader {
            ordinal: SubtaskOrdinal::new(ordinal(&caps[1]), ordinal(&caps[2])),
            title,
        };
    }
    if let Some(caps) = description_re().captures(line) {
        return Line::Description(caps.get(1).map_or("", |m| m.as_str()));
    }
    if line.starts_with(CRITERIA_HEADER) {
        return Line::CriteriaHeader;
    }
    if let Some(rest) = line.strip_prefix(CRITERION_PREFIX) {
        return Line::Criterion(rest.trim());
    }
    Line::Other
}

/// Strip `(Phase N)` annotations the model was told not to emit.
pub fn clean_model_output(raw: &str) -> String {
    phase_re().replace_all(raw, "").trim().to_string()
}

// ---------------------------------------------------------------------------
// Parser state
// ---------------------------------------------------------------------------

/// The entity currently accepting `Description:` and `- ` lines.
#[derive(Debug, Default)]
pub enum Open {
    #[default]
    Nothing,
    Task(Task),
    Subtask(Task, Subtask),
}

impl Open {
    /// Close everything, returning the finished task if one was open.
    fn close(self) -> Option<Task> {
        match self {
            Open::Nothing => None,
            Open::Task(task) => Some(task),
            Open::Subtask(mut task, subtask) => {
                task.adopt(subtask);
                Some(task)
            }
        }
    }

    fn set_description(&mut self, text: &str) {
        match self {
            Open::Nothing => {}
            Open::Task(task) => task.description = text.to_string(),
            Open::Subtask(_, sub) => sub.description = text.to_string(),
        }
    }

    fn push_criterion(&mut self, text: &str) {
        match self {
            Open::Nothing => {}
            Open::Task(task) => task.acceptance_criteria.push(text.to_string()),
            Open::Subtask(_, sub) => sub.acceptance_criteria.push(text.to_string()),
        }
    }
}

/// A subtask whose parent number disagreed with the open task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrdinalRepair {
    pub found: SubtaskOrdinal,
    pub assigned: SubtaskOrdinal,
    pub title: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedTasks {
    pub tasks: Vec<Task>,
    pub repairs: Vec<OrdinalRepair>,
}

#[derive(Debug, Default)]
pub struct TaskParser {
    open: Open,
    tasks: Vec<Task>,
    repairs: Vec<OrdinalRepair>,
}

impl TaskParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn feed(&mut self, raw_line: &str) {
        let line = raw_line.trim();
        if line.is_empty() {
            return;
        }
        let open = std::mem::take(&mut self.open);
        self.open = self.transition(open, classify(line));
    }

    /// The single state-transition function: every flush happens here.
    pub fn transition(&mut self, open: Open, line: Line<'_>) -> Open {
        match line {
            Line::TaskHeader { ordinal, title } => {
                if let Some(done) = open.close() {
                    self.emit(done);
                }
                tracing::info!("parsed Task {ordinal}: {title}");
                Open::Task(Task::new(ordinal, title))
            }
            Line::SubtaskHeader { ordinal, title } => {
                let task = match open {
                    Open::Nothing => return Open::Nothing,
                    Open::Task(task) => task,
                    Open::Subtask(mut task, previous) => {
                        task.adopt(previous);
                        task
                    }
                };
                let assigned = ordinal.under(task.ordinal);
                if assigned != ordinal {
                    tracing::warn!(
                        "Subtask {ordinal} does not match parent task {}; renumbered to {assigned}",
                        task.ordinal
                    );
                    self.repairs.push(OrdinalRepair {
                        found: ordinal,
                        assigned,
                        title: title.to_string(),
                    });
                }
                tracing::info!(
                    "parsed Subtask {assigned}: {title} under Task {}",
                    task.ordinal
                );
                Open::Subtask(task, Subtask::new(assigned, title))
            }
            Line::Description(text) => {
                let mut open = open;
                open.set_description(text);
                open
            }
            Line::Criterion(text) => {
                let mut open = open;
                open.push_criterion(text);
                open
            }
            Line::CriteriaHeader | Line::Other => open,
        }
    }

    fn emit(&mut self, task: Task) {
        if task.subtasks.is_empty() {
            tracing::warn!("Task {}: {} has no subtasks", task.ordinal, task.title);
        }
        self.tasks.push(task);
    }

    pub fn finish(mut self) -> ParsedTasks {
        if let Some(done) = std::mem::take(&mut self.open).close() {
            self.emit(done);
        }
        ParsedTasks {
            tasks: self.tasks,
            repairs: self.repairs,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Parse model output. Never fails; malformed input yields fewer tasks.
pub fn parse_tasks(text: &str) -> ParsedTasks {
    let mut parser = TaskParser::new();
    for line in text.lines() {
        parser.feed(line);
    }
    parser.finish()
}

/// Read and parse a saved task file. Fails only if the file can't be read.
pub fn parse_task_file(path: &Path) -> Result<ParsedTasks> {
    let text = std::fs::read_to_string(path)?;
    let parsed = parse_tasks(&text);
    tracing::info!(
        "parsed {} tasks from {}",
        parsed.tasks.len(),
        path.display()
    );
    Ok(parsed)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::task_block;
    use tempfile::TempDir;

    fn ord(task: u32, index: u32) -> SubtaskOrdinal {
        SubtaskOrdinal::new(task, index)
    }

    #[test]
    fn end_to_end_single_task_and_subtask() {
        let text = "Task 1: A\nDescription: d1\nAcceptance Criteria:\n- c1\n\nSubtask 1.1: B\nDescription: d2\nAcceptance Criteria:\n- c2\n";
        let parsed = parse_tasks(text);
        assert_eq!(parsed.tasks.len(), 1);
        let task = &parsed.tasks[0];
        assert_eq!(task.ordinal, 1);
        assert_eq!(task.title, "A");
        assert_eq!(task.description, "d1");
        assert_eq!(task.acceptance_criteria, vec!["c1"]);
        assert_eq!(task.subtasks.len(), 1);
        let sub = &task.subtasks[0];
        assert_eq!(sub.ordinal, ord(1, 1));
        assert_eq!(sub.title, "B");
        assert_eq!(sub.description, "d2");
        assert_eq!(sub.acceptance_criteria, vec!["c2"]);
        assert!(parsed.repairs.is_empty());
    }

    #[test]
    fn misnumbered_subtask_is_reattached_to_open_task() {
        let parsed = parse_tasks("Task 5: X\nSubtask 3.1: Y\n");
        assert_eq!(parsed.tasks.len(), 1);
        assert_eq!(parsed.tasks[0].ordinal, 5);
        assert_eq!(parsed.tasks[0].subtasks[0].ordinal, ord(5, 1));
        assert_eq!(parsed.tasks[0].subtasks[0].title, "Y");
        assert_eq!(
            parsed.repairs,
            vec![OrdinalRepair {
                found: ord(3, 1),
                assigned: ord(5, 1),
                title: "Y".into(),
            }]
        );
    }

    #[test]
    fn task_ordinal_comes_from_source_not_position() {
        let parsed = parse_tasks("Task 7: First\nTask 2: Second\n");
        let ordinals: Vec<u32> = parsed.tasks.iter().map(|t| t.ordinal).collect();
        assert_eq!(ordinals, vec![7, 2]);
    }

    #[test]
    fn stray_lines_do_not_change_result() {
        let clean = "Task 1: A\nDescription: d\n- c\nSubtask 1.1: B\n- c2\nTask 2: C\n";
        let noisy = "Here is the plan you asked for.\n\nTask 1: A\n\n   \nSome prose.\nDescription: d\n**bold aside**\n- c\n\nSubtask 1.1: B\nNote: ignore me\n- c2\n---\nTask 2: C\nThanks!\n";
        assert_eq!(parse_tasks(clean), parse_tasks(noisy));
    }

    #[test]
    fn trailing_subtask_is_flushed() {
        let parsed = parse_tasks("Task 1: A\nSubtask 1.1: B\nSubtask 1.2: C\n- last");
        let subs = &parsed.tasks[0].subtasks;
        assert_eq!(subs.len(), 2);
        assert_eq!(subs[1].title, "C");
        assert_eq!(subs[1].acceptance_criteria, vec!["last"]);
    }

    #[test]
    fn second_description_overwrites_first() {
        let parsed = parse_tasks(
            "Task 1: A\nDescription: one\nDescription: two\nSubtask 1.1: B\nDescription: x\nDescription: y\n",
        );
        assert_eq!(parsed.tasks[0].description, "two");
        assert_eq!(parsed.tasks[0].subtasks[0].description, "y");
    }

    #[test]
    fn criteria_attach_to_innermost_entity() {
        let parsed = parse_tasks("Task 1: A\n- t1\n- t2\nSubtask 1.1: B\n- s1\n");
        assert_eq!(parsed.tasks[0].acceptance_criteria, vec!["t1", "t2"]);
        assert_eq!(parsed.tasks[0].subtasks[0].acceptance_criteria, vec!["s1"]);
    }

    #[test]
    fn criteria_without_header_are_still_collected() {
        let with = parse_tasks("Task 1: A\nAcceptance Criteria:\n- c\n");
        let without = parse_tasks("Task 1: A\n- c\n");
        assert_eq!(with, without);
    }

    #[test]
    fn lines_before_any_task_are_ignored() {
        let parsed = parse_tasks(
            "Description: orphan\n- orphan criterion\nSubtask 1.1: orphan subtask\nTask 1: A\n",
        );
        assert_eq!(parsed.tasks.len(), 1);
        assert_eq!(parsed.tasks[0].description, "");
        assert!(parsed.tasks[0].acceptance_criteria.is_empty());
        assert!(parsed.tasks[0].subtasks.is_empty());
    }

    #[test]
    fn task_without_subtasks_is_kept() {
        let parsed = parse_tasks("Task 1: Lonely\nDescription: none\n");
        assert_eq!(parsed.tasks.len(), 1);
        assert!(parsed.tasks[0].subtasks.is_empty());
    }

    #[test]
    fn empty_and_unrecognized_input_yields_no_tasks() {
        assert!(parse_tasks("").tasks.is_empty());
        assert!(parse_tasks("I could not find any tasks.\n- maybe this?").tasks.is_empty());
    }

    #[test]
    fn criterion_prefix_requires_hyphen_space() {
        let parsed = parse_tasks("Task 1: A\n-no space\n-\n-   spaced   \n");
        assert_eq!(parsed.tasks[0].acceptance_criteria, vec!["spaced"]);
    }

    #[test]
    fn oversized_numbers_saturate_and_keep_their_content() {
        let parsed = parse_tasks(
            "Task 1: A\nDescription: first\nTask 4294967296: B\nDescription: second\n- b-crit\nSubtask 1.4294967296: C\nDescription: third\n",
        );
        assert_eq!(parsed.tasks.len(), 2);

        let a = &parsed.tasks[0];
        assert_eq!(a.description, "first");
        assert!(a.acceptance_criteria.is_empty());
        assert!(a.subtasks.is_empty());

        let b = &parsed.tasks[1];
        assert_eq!(b.ordinal, u32::MAX);
        assert_eq!(b.description, "second");
        assert_eq!(b.acceptance_criteria, vec!["b-crit"]);
        assert_eq!(b.subtasks[0].title, "C");
        assert_eq!(b.subtasks[0].description, "third");
        assert_eq!(b.subtasks[0].ordinal, ord(u32::MAX, u32::MAX));
    }

    #[test]
    fn classify_priority_order() {
        assert_eq!(
            classify("Task 3: Build it"),
            Line::TaskHeader { ordinal: 3, title: "Build it" }
        );
        assert_eq!(
            classify("Subtask 3.2: Part"),
            Line::SubtaskHeader { ordinal: ord(3, 2), title: "Part" }
        );
        assert_eq!(classify("Description: text"), Line::Description("text"));
        assert_eq!(classify("Acceptance Criteria:"), Line::CriteriaHeader);
        assert_eq!(classify("- item "), Line::Criterion("item"));
        assert_eq!(classify("Description:"), Line::Other);
        assert_eq!(classify("Tasks 1: no"), Line::Other);
    }

    #[test]
    fn transition_flushes_subtask_on_new_task() {
        let mut parser = TaskParser::new();
        let mut task = Task::new(1, "A");
        task.acceptance_criteria.push("c".into());
        let open = Open::Subtask(task, Subtask::new(ord(1, 1), "B"));
        let next = parser.transition(open, Line::TaskHeader { ordinal: 2, title: "C" });
        assert!(matches!(next, Open::Task(ref t) if t.ordinal == 2));
        assert_eq!(parser.tasks.len(), 1);
        assert_eq!(parser.tasks[0].subtasks.len(), 1);
    }

    #[test]
    fn rendered_blocks_round_trip() {
        let text = "Task 1: Dashboard Development\nDescription: Develop a dashboard.\nAcceptance Criteria:\n- Dashboard is accessible to admins\n- Metrics are displayed accurately\n\nSubtask 1.1: User Metrics\nDescription: Implement user metrics.\nAcceptance Criteria:\n- Total users displayed\n\nSubtask 1.2: Referral Metrics\nDescription: Implement referral metrics.\nAcceptance Criteria:\n- Referrals displayed\n- Conversions displayed\n\nTask 2: Venues Management\nDescription: Manage venues.\nAcceptance Criteria:\n- Venue profiles can be managed\n";
        let first = parse_tasks(text);
        let rendered: String = first.tasks.iter().map(task_block).collect();
        let second = parse_tasks(&rendered);
        assert_eq!(first, second);
        assert_eq!(second.tasks[0].subtasks[1].acceptance_criteria, vec![
            "Referrals displayed",
            "Conversions displayed"
        ]);
    }

    #[test]
    fn clean_strips_phase_annotations() {
        let raw = "  Task 1: Login (Phase 1)\nDescription: Build login (Phase2) flow\n";
        assert_eq!(
            clean_model_output(raw),
            "Task 1: Login\nDescription: Build login flow"
        );
    }

    #[test]
    fn parse_task_file_reads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("extracted_tasks.txt");
        std::fs::write(&path, "Task 1: A\nSubtask 1.1: B\n").unwrap();
        let parsed = parse_task_file(&path).unwrap();
        assert_eq!(parsed.tasks[0].subtasks[0].title, "B");
    }

    #[test]
    fn parse_task_file_missing_is_error() {
        let dir = TempDir::new().unwrap();
        assert!(parse_task_file(&dir.path().join("nope.txt")).is_err());
    }
}
