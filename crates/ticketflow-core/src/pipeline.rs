//! The three stages, wired to the work directory.
//!
//! Each `run_*` takes already-validated configuration and client trait
//! objects; the binary builds the HTTP clients, tests pass fakes.
//!
//! ```text
//! tickets:   document ─▶ text file ─▶ model ─▶ tasks file ─▶ parser ─▶ tracker ─▶ registry
//! mirror:    registry ─▶ reconstruct ─▶ README + branches
//! testcases: registry ─▶ reconstruct ─▶ model/fallback ─▶ all_test_cases.txt, comments, commits
//! ```

use crate::config::{ProjectInfo, TrackerConfig};
use crate::error::{Result, TicketflowError};
use crate::extract::extract_text;
use crate::hierarchy::{reconstruct, TicketTree};
use crate::io::atomic_write;
use crate::mirror::{mirror_tickets, MirrorReport};
use crate::parser::{clean_model_output, parse_task_file, ParsedTasks};
use crate::paths;
use crate::prompt;
use crate::registry;
use crate::repo::RepoHost;
use crate::testcases::{self, Generation, PublishReport, TestCaseDoc};
use crate::tracker::{create_tickets, resolve_issue_types, CreatedTickets, IssueTracker, IssueTypes};
use groq_chat::{ChatModel, ChatRequest};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Read the registry and rebuild the tree; an empty registry is an error.
pub fn load_tree(registry_path: &Path) -> Result<TicketTree> {
    let entries = registry::load(registry_path)?;
    if entries.is_empty() {
        return Err(TicketflowError::EmptyRegistry(
            registry_path.display().to_string(),
        ));
    }
    let tree = reconstruct(&entries);
    if tree.is_empty() {
        return Err(TicketflowError::EmptyRegistry(
            registry_path.display().to_string(),
        ));
    }
    Ok(tree)
}

// ---------------------------------------------------------------------------
// Stage 1
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TicketsOutcome {
    pub tasks_path: PathBuf,
    pub registry_path: PathBuf,
    pub issue_types: IssueTypes,
    pub parsed: ParsedTasks,
    pub created: CreatedTickets,
}

/// Extract tasks from `document` and create them in the tracker. The model
/// call is not retried.
pub fn run_tickets<M, T>(
    model: &M,
    model_name: &str,
    tracker: &T,
    tracker_config: &TrackerConfig,
    document: &Path,
    work_dir: &Path,
    registry_path: &Path,
) -> Result<TicketsOutcome>
where
    M: ChatModel + ?Sized,
    T: IssueTracker + ?Sized,
{
    let text = extract_text(document)?;
    let text_path = paths::extracted_text_path(work_dir);
    atomic_write(&text_path, text.as_bytes())?;
    tracing::info!("extracted text saved to {}", text_path.display());

    let available = tracker.issue_type_names()?;
    tracing::info!(
        "available issue types for {}: {available:?}",
        tracker_config.project_key
    );
    let issue_types = resolve_issue_types(
        &tracker_config.project_key,
        &available,
        &tracker_config.issue_type,
        &tracker_config.subtask_issue_type,
    )?;

    let request = ChatRequest::new(
        model_name,
        prompt::EXTRACTION_SYSTEM_PROMPT,
        prompt::extraction_prompt(&text),
    );
    let raw = model.complete(&request)?;
    let cleaned = clean_model_output(&raw);
    let tasks_path = paths::tasks_path(work_dir);
    atomic_write(&tasks_path, cleaned.as_bytes())?;
    tracing::info!("task structure saved to {}", tasks_path.display());

    let parsed = parse_task_file(&tasks_path)?;
    if parsed.tasks.is_empty() {
        return Err(TicketflowError::NoTasks);
    }

    let created = create_tickets(tracker, &issue_types, &tracker_config.labels, &parsed.tasks);
    registry::save(registry_path, &created.entries)?;

    Ok(TicketsOutcome {
        tasks_path,
        registry_path: registry_path.to_path_buf(),
        issue_types,
        parsed,
        created,
    })
}

// ---------------------------------------------------------------------------
// Stage 2
// ---------------------------------------------------------------------------

pub fn run_mirror<H: RepoHost + ?Sized>(
    host: &H,
    project: &ProjectInfo,
    default_branch: &str,
    registry_path: &Path,
) -> Result<MirrorReport> {
    let tree = load_tree(registry_path)?;
    mirror_tickets(host, project, &tree, default_branch)
}

// ---------------------------------------------------------------------------
// Stage 3
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct TestcasesOutcome {
    pub output_path: PathBuf,
    pub documents: Vec<TestCaseDoc>,
    pub publish: PublishReport,
}

/// Generate test cases for every task, write the combined file, then post
/// comments and commit documents for whichever of `tracker`/`host` is given.
pub fn run_testcases<M, T, H>(
    model: &M,
    generation: &Generation<'_>,
    tracker: Option<&T>,
    host: Option<&H>,
    registry_path: &Path,
    work_dir: &Path,
) -> Result<TestcasesOutcome>
where
    M: ChatModel + ?Sized,
    T: IssueTracker + ?Sized,
    H: RepoHost + ?Sized,
{
    let tree = load_tree(registry_path)?;
    let documents = testcases::generate_all(model, generation, &tree);

    let output_path = paths::all_test_cases_path(work_dir);
    let combined = testcases::combined_document(generation.project_name, &documents);
    atomic_write(&output_path, combined.as_bytes())?;
    tracing::info!("saved all test cases to {}", output_path.display());

    let mut publish = PublishReport::default();
    if let Some(tracker) = tracker {
        testcases::post_comments(tracker, &documents, &mut publish);
    }
    if let Some(host) = host {
        testcases::commit_documents(host, &documents, &mut publish);
    }

    Ok(TestcasesOutcome {
        output_path,
        documents,
        publish,
    })
}
