//! Stage 3: one Markdown test-case document per task, produced by the model
//! when it answers and by [`render::fallback_test_cases`] when it does not.

use crate::hierarchy::{TaskNode, TicketTree};
use crate::naming::branch_name;
use crate::paths::test_case_file_name;
use crate::prompt;
use crate::render;
use crate::repo::{upsert_file, RepoHost};
use crate::tracker::{IssueTracker, COMMENT_PREFIX};
use groq_chat::{complete_with_retry, ChatModel, ChatRequest, RetryPolicy};
use serde::Serialize;

const MAX_TOKENS: u32 = 1000;
const TEMPERATURE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TestCaseSource {
    Model,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestCaseDoc {
    pub task_key: String,
    pub summary: String,
    pub content: String,
    pub source: TestCaseSource,
}

/// Settings for the model half of generation.
#[derive(Debug, Clone)]
pub struct Generation<'a> {
    pub model_name: &'a str,
    pub project_name: &'a str,
    pub retry: RetryPolicy,
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

pub fn generate_for_task<M: ChatModel + ?Sized>(
    model: &M,
    settings: &Generation<'_>,
    task: &TaskNode,
) -> TestCaseDoc {
    let request = ChatRequest::new(
        settings.model_name,
        prompt::test_case_system_prompt(settings.project_name),
        prompt::test_case_prompt(settings.project_name, task),
    )
    .with_max_tokens(MAX_TOKENS)
    .with_temperature(TEMPERATURE);

    let (content, source) = match complete_with_retry(model, &request, settings.retry) {
        Ok(text) => (
            render::ensure_test_case_header(task, &text),
            TestCaseSource::Model,
        ),
        Err(e) => {
            tracing::warn!("using fallback test cases for {}: {e}", task.key);
            (render::fallback_test_cases(task), TestCaseSource::Fallback)
        }
    };
    tracing::info!("generated test cases for {}", task.key);

    TestCaseDoc {
        task_key: task.key.clone(),
        summary: task.summary.clone(),
        content,
        source,
    }
}

/// Every task in tree order. Never fails: each task falls back on its own.
pub fn generate_all<M: ChatModel + ?Sized>(
    model: &M,
    settings: &Generation<'_>,
    tree: &TicketTree,
) -> Vec<TestCaseDoc> {
    tree.tasks
        .iter()
        .map(|task| generate_for_task(model, settings, task))
        .collect()
}

pub fn combined_document(project_name: &str, docs: &[TestCaseDoc]) -> String {
    render::all_test_cases(project_name, docs.iter().map(|d| d.content.as_str()))
}

// ---------------------------------------------------------------------------
// Publishing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct PublishReport {
    pub commented: Vec<String>,
    pub committed: Vec<String>,
    /// Tasks whose feature branch does not exist.
    pub missing_branches: Vec<String>,
    pub failed: Vec<String>,
}

/// Attach each document to its task issue as a comment.
pub fn post_comments<T: IssueTracker + ?Sized>(
    tracker: &T,
    docs: &[TestCaseDoc],
    report: &mut PublishReport,
) {
    for doc in docs {
        if doc.content.trim().is_empty() {
            tracing::warn!("skipping comment for {}: empty test cases", doc.task_key);
            continue;
        }
        match tracker.add_comment(&doc.task_key, &format!("{COMMENT_PREFIX}{}", doc.content)) {
            Ok(()) => {
                tracing::info!("added test cases as comment to {}", doc.task_key);
                report.commented.push(doc.task_key.clone());
            }
            Err(e) => {
                tracing::error!("failed to comment on {}: {e}", doc.task_key);
                report.failed.push(doc.task_key.clone());
            }
        }
    }
}

/// Commit each document as `test_cases_{key}.md` on the task's branch.
pub fn commit_documents<H: RepoHost + ?Sized>(
    host: &H,
    docs: &[TestCaseDoc],
    report: &mut PublishReport,
) {
    for doc in docs {
        let branch = branch_name(&doc.task_key, &doc.summary);
        let result = host.branch_head(&branch).and_then(|head| match head {
            None => Ok(false),
            Some(_) => upsert_file(
                host,
                &test_case_file_name(&doc.task_key),
                &branch,
                &doc.content,
                &format!(" for {}", doc.task_key),
            )
            .map(|_| true),
        });
        match result {
            Ok(true) => report.committed.push(doc.task_key.clone()),
            Ok(false) => {
                tracing::warn!("branch {branch} does not exist, skipping {}", doc.task_key);
                report.missing_branches.push(doc.task_key.clone());
            }
            Err(e) => {
                tracing::error!("failed to commit test cases for {} to {branch}: {e}", doc.task_key);
                report.failed.push(doc.task_key.clone());
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
