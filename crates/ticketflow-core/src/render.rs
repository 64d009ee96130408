use crate::config::ProjectInfo;
use crate::hierarchy::{SubtaskNode, TaskNode, TicketTree};
use crate::task::Task;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn bullet_list(items: &[String], empty: &str) -> String {
    if items.is_empty() {
        format!("- {empty}\n")
    } else {
        let mut out = items
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        out
    }
}

// ---------------------------------------------------------------------------
// Task grammar
// ---------------------------------------------------------------------------

/// Render a parsed task back into the line grammar the model is asked for.
/// An empty description is omitted, since `Description:` with no text is not
/// a recognized line.
pub fn task_block(task: &Task) -> String {
    let mut out = format!("Task {}: {}\n", task.ordinal, task.title);
    push_fields(&mut out, &task.description, &task.acceptance_criteria);
    out.push('\n');
    for sub in &task.subtasks {
        out.push_str(&format!("Subtask {}: {}\n", sub.ordinal, sub.title));
        push_fields(&mut out, &sub.description, &sub.acceptance_criteria);
        out.push('\n');
    }
    out
}

fn push_fields(out: &mut String, description: &str, criteria: &[String]) {
    if !description.is_empty() {
        out.push_str(&format!("Description: {description}\n"));
    }
    out.push_str("Acceptance Criteria:\n");
    for c in criteria {
        out.push_str(&format!("- {c}\n"));
    }
}

/// Issue body sent to the tracker for a task or subtask.
pub fn issue_description(description: &str, criteria: &[String]) -> String {
    let items = criteria
        .iter()
        .map(|c| format!("- {c}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!("Description: {description}\n\nAcceptance Criteria:\n{items}")
}

// ---------------------------------------------------------------------------
// Repository READMEs
// ---------------------------------------------------------------------------

/// README for the default branch: project overview plus every task.
pub fn project_readme(project: &ProjectInfo, tree: &TicketTree) -> String {
    let mut out = format!(
        "# {}\n\n## Overview\n{}\n\n## Tasks\n",
        project.name, project.description
    );

    for task in &tree.tasks {
        out.push_str(&format!(
            "### {}: {}\n#### Description\n{}\n\n#### Acceptance Criteria\n",
            task.key, task.summary, task.description
        ));
        out.push_str(&bullet_list(&task.acceptance_criteria, "None provided."));

        if !task.subtasks.is_empty() {
            out.push_str("\n#### Subtasks\n");
            for sub in &task.subtasks {
                out.push_str(&format!(
                    "##### {}: {}\n###### Description\n{}\n\n###### Acceptance Criteria\n",
                    sub.key, sub.summary, sub.description
                ));
                out.push_str(&bullet_list(&sub.acceptance_criteria, "None provided."));
                out.push('\n');
            }
        }
    }
    out
}

/// README committed to a task's feature branch.
pub fn branch_readme(task: &TaskNode) -> String {
    let mut out = format!(
        "# {}: {}\n\n## Description\n{}\n\n## Acceptance Criteria\n",
        task.key, task.summary, task.description
    );
    out.push_str(&bullet_list(&task.acceptance_criteria, "None"));
    out.push('\n');

    if !task.subtasks.is_empty() {
        out.push_str("## Subtasks\n");
        for sub in &task.subtasks {
            out.push_str(&format!(
                "### {}: {}\n#### Description\n{}\n\n#### Acceptance Criteria\n",
                sub.key, sub.summary, sub.description
            ));
            out.push_str(&bullet_list(&sub.acceptance_criteria, "None"));
            out.push('\n');
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Test-case documents
// ---------------------------------------------------------------------------

pub fn test_case_title(task: &TaskNode) -> String {
    format!("# Test Cases for {}: {}", task.key, task.summary)
}

fn test_case_header(task: &TaskNode) -> String {
    format!(
        "{}\n\n## Task Description\n{}\n\n",
        test_case_title(task),
        task.description
    )
}

/// Prefix model output with the standard title block unless it already
/// starts with it.
pub fn ensure_test_case_header(task: &TaskNode, content: &str) -> String {
    let expected = format!("# Test Cases for {}", task.key);
    if content.starts_with(&expected) {
        content.to_string()
    } else {
        format!("{}{content}", test_case_header(task))
    }
}

fn fallback_case(
    out: &mut String,
    key: &str,
    summary: &str,
    description: &str,
    criteria: &[String],
    preconditions: &str,
    scope: &str,
) {
    out.push_str(&format!("### Test Case TC_{key}_01\n"));
    out.push_str(&format!(
        "**Objective**: Verify {} functionality.\n",
        summary.to_lowercase()
    ));
    out.push_str(&format!("**Preconditions**: {preconditions}\n"));
    out.push_str("**Test Steps**:\n");
    if criteria.is_empty() {
        out.push_str(&format!(
            "1. Verify the functionality as per the {scope} description.\n"
        ));
    } else {
        for (i, c) in criteria.iter().enumerate() {
            out.push_str(&format!("{}. Ensure {}.\n", i + 1, c.to_lowercase()));
        }
    }
    out.push_str("**Expected Result**:\n");
    if criteria.is_empty() {
        out.push_str(&format!("- {description}\n"));
    } else {
        for c in criteria {
            out.push_str(&format!("- {c}\n"));
        }
    }
    out.push('\n');
}

/// Deterministic test cases built from acceptance criteria alone, used when
/// the model is unavailable.
pub fn fallback_test_cases(task: &TaskNode) -> String {
    let mut out = test_case_header(task);
    fallback_case(
        &mut out,
        &task.key,
        &task.summary,
        &task.description,
        &task.acceptance_criteria,
        "System is accessible, user is logged in (if applicable).",
        "task",
    );

    if !task.subtasks.is_empty() {
        out.push_str("## Subtask Test Cases\n");
        for SubtaskNode {
            key,
            summary,
            description,
            acceptance_criteria,
        } in &task.subtasks
        {
            fallback_case(
                &mut out,
                key,
                summary,
                description,
                acceptance_criteria,
                "Parent task functionality is available, user is logged in (if applicable).",
                "subtask",
            );
        }
    }
    out
}

/// Every task's test cases in one document.
pub fn all_test_cases<'a>(
    project_name: &str,
    documents: impl IntoIterator<Item = &'a str>,
) -> String {
    let mut out = format!("# All Test Cases for {project_name}\n\n");
    for doc in documents {
        out.push_str(doc);
        out.push_str("\n---\n");
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::{Subtask, SubtaskOrdinal};

    fn node(subtasks: Vec<SubtaskNode>) -> TaskNode {
        TaskNode {
            key: "PRJ-1".into(),
            summary: "Dashboard".into(),
            description: "Build the dashboard.".into(),
            acceptance_criteria: vec!["Metrics Are Shown".into()],
            subtasks,
        }
    }

    fn sub_node(criteria: Vec<String>) -> SubtaskNode {
        SubtaskNode {
            key: "PRJ-2".into(),
            summary: "User Metrics".into(),
            description: "Show users.".into(),
            acceptance_criteria: criteria,
        }
    }

    #[test]
    fn task_block_matches_grammar() {
        let mut task = Task::new(2, "Venues");
        task.description = "Manage venues.".into();
        task.acceptance_criteria = vec!["Profiles editable".into()];
        let mut sub = Subtask::new(SubtaskOrdinal::new(2, 1), "Metrics");
        sub.acceptance_criteria = vec!["Bookings tracked".into()];
        task.subtasks.push(sub);

        assert_eq!(
            task_block(&task),
            "Task 2: Venues\nDescription: Manage venues.\nAcceptance Criteria:\n- Profiles editable\n\nSubtask 2.1: Metrics\nAcceptance Criteria:\n- Bookings tracked\n\n"
        );
    }

    #[test]
    fn issue_description_layout() {
        assert_eq!(
            issue_description("d", &["a".into(), "b".into()]),
            "Description: d\n\nAcceptance Criteria:\n- a\n- b"
        );
        assert_eq!(
            issue_description("d", &[]),
            "Description: d\n\nAcceptance Criteria:\n"
        );
    }

    #[test]
    fn project_readme_lists_tasks_and_subtasks() {
        let project = ProjectInfo {
            name: "Booking".into(),
            description: "A booking platform".into(),
        };
        let tree = TicketTree {
            tasks: vec![node(vec![sub_node(vec![])])],
            dropped: vec![],
        };
        let readme = project_readme(&project, &tree);
        assert!(readme.starts_with("# Booking\n\n## Overview\nA booking platform\n\n## Tasks\n"));
        assert!(readme.contains("### PRJ-1: Dashboard\n#### Description\nBuild the dashboard.\n\n#### Acceptance Criteria\n- Metrics Are Shown\n"));
        assert!(readme.contains("\n#### Subtasks\n##### PRJ-2: User Metrics\n"));
        assert!(readme.contains("###### Acceptance Criteria\n- None provided.\n"));
    }

    #[test]
    fn branch_readme_uses_none_for_empty_lists() {
        let mut task = node(vec![sub_node(vec![])]);
        task.acceptance_criteria.clear();
        let readme = branch_readme(&task);
        assert!(readme.starts_with("# PRJ-1: Dashboard\n\n## Description\nBuild the dashboard.\n\n## Acceptance Criteria\n- None\n\n## Subtasks\n"));
        assert!(readme.ends_with("#### Acceptance Criteria\n- None\n\n"));
    }

    #[test]
    fn fallback_covers_every_criterion() {
        let doc = fallback_test_cases(&node(vec![sub_node(vec!["Count Visible".into()])]));
        assert!(doc.starts_with("# Test Cases for PRJ-1: Dashboard\n\n## Task Description\nBuild the dashboard.\n\n"));
        assert!(doc.contains("### Test Case TC_PRJ-1_01\n**Objective**: Verify dashboard functionality.\n"));
        assert!(doc.contains("1. Ensure metrics are shown.\n**Expected Result**:\n- Metrics Are Shown\n"));
        assert!(doc.contains("## Subtask Test Cases\n### Test Case TC_PRJ-2_01\n"));
        assert!(doc.contains("1. Ensure count visible.\n"));
    }

    #[test]
    fn fallback_without_criteria_uses_description() {
        let mut task = node(vec![]);
        task.acceptance_criteria.clear();
        let doc = fallback_test_cases(&task);
        assert!(doc.contains("1. Verify the functionality as per the task description.\n"));
        assert!(doc.contains("**Expected Result**:\n- Build the dashboard.\n"));
        assert!(!doc.contains("Subtask Test Cases"));
    }

    #[test]
    fn header_added_only_when_missing() {
        let task = node(vec![]);
        let already = "# Test Cases for PRJ-1: Dashboard\n\nbody";
        assert_eq!(ensure_test_case_header(&task, already), already);
        let wrapped = ensure_test_case_header(&task, "### TC1");
        assert!(wrapped.starts_with("# Test Cases for PRJ-1: Dashboard\n\n## Task Description\n"));
        assert!(wrapped.ends_with("### TC1"));
    }

    #[test]
    fn all_test_cases_joins_with_separators() {
        let doc = all_test_cases("Booking", ["a", "b"]);
        assert_eq!(doc, "# All Test Cases for Booking\n\na\n---\nb\n---\n");
    }
}
