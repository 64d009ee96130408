use crate::config::TrackerConfig;
use crate::error::{Result, TicketflowError};
use crate::http::{success_body, success_json};
use crate::naming;
use crate::registry::TicketEntry;
use crate::render;
use crate::task::Task;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;

const SERVICE: &str = "Jira";
const COMMENT_TIMEOUT: Duration = Duration::from_secs(10);
pub const COMMENT_PREFIX: &str = "Generated Test Cases:\n\n";

const TASK_TYPE_FALLBACKS: [&str; 3] = ["Task", "Story", "Issue"];
const SUBTASK_TYPE_FALLBACKS: [&str; 2] = ["Sub-task", "Subtask"];

// ---------------------------------------------------------------------------
// IssueTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewIssue {
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub labels: Vec<String>,
    pub parent_key: Option<String>,
}

/// Operations the pipeline needs from an issue tracker.
pub trait IssueTracker {
    /// Names of the issue types the configured project accepts.
    fn issue_type_names(&self) -> Result<Vec<String>>;
    /// Create an issue and return its key.
    fn create_issue(&self, issue: &NewIssue) -> Result<String>;
    fn add_comment(&self, issue_key: &str, text: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// JiraClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JiraClient {
    http: Client,
    base_url: String,
    email: String,
    api_token: String,
    project_key: String,
}

#[derive(Deserialize)]
struct ProjectResponse {
    #[serde(default, rename = "issueTypes")]
    issue_types: Vec<IssueTypeResponse>,
}

#[derive(Deserialize)]
struct IssueTypeResponse {
    name: String,
}

#[derive(Deserialize)]
struct CreatedIssue {
    key: String,
}

impl JiraClient {
    pub fn new(config: &TrackerConfig) -> Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            base_url: config.server_url.trim_end_matches('/').to_string(),
            email: config.email.clone(),
            api_token: config.api_token.clone(),
            project_key: config.project_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

/// Atlassian document body holding one text paragraph.
fn adf_comment(text: &str) -> serde_json::Value {
    json!({
        "body": {
            "type": "doc",
            "version": 1,
            "content": [{
                "type": "paragraph",
                "content": [{ "type": "text", "text": text }]
            }]
        }
    })
}

impl IssueTracker for JiraClient {
    fn issue_type_names(&self) -> Result<Vec<String>> {
        let resp = self
            .http
            .get(self.url(&format!("/rest/api/2/project/{}", self.project_key)))
            .basic_auth(&self.email, Some(&self.api_token))
            .send()?;
        let project: ProjectResponse = success_json(SERVICE, resp)?;
        Ok(project.issue_types.into_iter().map(|t| t.name).collect())
    }

    fn create_issue(&self, issue: &NewIssue) -> Result<String> {
        let mut fields = json!({
            "project": { "key": self.project_key },
            "summary": issue.summary,
            "description": issue.description,
            "issuetype": { "name": issue.issue_type },
            "labels": issue.labels,
        });
        if let Some(parent) = &issue.parent_key {
            fields["parent"] = json!({ "key": parent });
        }
        let resp = self
            .http
            .post(self.url("/rest/api/2/issue"))
            .basic_auth(&self.email, Some(&self.api_token))
            .json(&json!({ "fields": fields }))
            .send()?;
        let created: CreatedIssue = success_json(SERVICE, resp)?;
        Ok(created.key)
    }

    fn add_comment(&self, issue_key: &str, text: &str) -> Result<()> {
        let resp = self
            .http
            .post(self.url(&format!("/rest/api/3/issue/{issue_key}/comment")))
            .basic_auth(&self.email, Some(&self.api_token))
            .timeout(COMMENT_TIMEOUT)
            .json(&adf_comment(text))
            .send()?;
        success_body(SERVICE, resp)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Issue-type resolution
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IssueTypes {
    pub task: String,
    /// `None` when the project has no subtask type; subtasks are skipped.
    pub subtask: Option<String>,
}

fn pick(wanted: &str, fallbacks: &[&str], available: &[String]) -> Option<String> {
    if available.iter().any(|a| a == wanted) {
        return Some(wanted.to_string());
    }
    fallbacks
        .iter()
        .find(|f| available.iter().any(|a| a.as_str() == **f))
        .map(|f| f.to_string())
}

/// Choose the task and subtask issue types from what the project offers.
pub fn resolve_issue_types(
    project: &str,
    available: &[String],
    wanted_task: &str,
    wanted_subtask: &str,
) -> Result<IssueTypes> {
    let task = pick(wanted_task, &TASK_TYPE_FALLBACKS, available).ok_or_else(|| {
        TicketflowError::NoIssueType {
            project: project.to_string(),
            available: available.to_vec(),
        }
    })?;
    if task != wanted_task {
        tracing::warn!("issue type '{wanted_task}' not available, falling back to '{task}'");
    }

    let subtask = pick(wanted_subtask, &SUBTASK_TYPE_FALLBACKS, available);
    match &subtask {
        None => tracing::warn!(
            "no subtask issue type in project {project}; tasks will be created without subtasks"
        ),
        Some(s) if s != wanted_subtask => {
            tracing::warn!("subtask issue type '{wanted_subtask}' not available, falling back to '{s}'")
        }
        Some(_) => {}
    }

    Ok(IssueTypes { task, subtask })
}

// ---------------------------------------------------------------------------
// Ticket creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize)]
pub struct CreatedTickets {
    /// Registry entries in creation order, each task followed by its subtasks.
    pub entries: Vec<TicketEntry>,
    /// Titles of tasks and subtasks whose creation failed.
    pub failed: Vec<String>,
}

impl CreatedTickets {
    pub fn task_count(&self) -> usize {
        self.entries.iter().filter(|e| e.parent_key.is_none()).count()
    }
}

/// Create one issue per task and one child issue per subtask. A failed task
/// skips its subtasks; a failed subtask is skipped alone.
pub fn create_tickets<T: IssueTracker + ?Sized>(
    tracker: &T,
    types: &IssueTypes,
    labels: &[String],
    tasks: &[Task],
) -> CreatedTickets {
    let mut out = CreatedTickets::default();

    for task in tasks {
        let issue = NewIssue {
            summary: naming::issue_summary(&task.title),
            description: render::issue_description(&task.description, &task.acceptance_criteria),
            issue_type: types.task.clone(),
            labels: labels.to_vec(),
            parent_key: None,
        };
        let task_key = match tracker.create_issue(&issue) {
            Ok(key) => key,
            Err(e) => {
                tracing::error!("failed to create ticket for '{}': {e}", task.title);
                out.failed.push(task.title.clone());
                continue;
            }
        };
        tracing::info!("created task ticket {task_key} - {}", task.title);
        out.entries.push(TicketEntry {
            issue_type: Some(types.task.clone()),
            description: Some(task.description.clone()),
            acceptance_criteria: task.acceptance_criteria.clone(),
            ..TicketEntry::task(&task_key, issue.summary)
        });

        let Some(subtask_type) = &types.subtask else {
            continue;
        };
        if task.subtasks.is_empty() {
            tracing::warn!("no subtasks created for {task_key}");
        }
        for sub in &task.subtasks {
            let summary = naming::subtask_summary(&sub.title);
            let issue = NewIssue {
                summary: summary.clone(),
                description: render::issue_description(&sub.description, &sub.acceptance_criteria),
                issue_type: subtask_type.clone(),
                labels: labels.to_vec(),
                parent_key: Some(task_key.clone()),
            };
            match tracker.create_issue(&issue) {
                Ok(key) => {
                    tracing::info!("created subtask ticket {key} - {summary} under {task_key}");
                    out.entries.push(TicketEntry {
                        issue_type: Some(subtask_type.clone()),
                        description: Some(sub.description.clone()),
                        acceptance_criteria: sub.acceptance_criteria.clone(),
                        ..TicketEntry::subtask(key, summary, &task_key)
                    });
                }
                Err(e) => {
                    tracing::error!("failed to create subtask '{summary}' under {task_key}: {e}");
                    out.failed.push(sub.title.clone());
                }
            }
        }
    }

    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::TicketKind;
    use crate::task::{Subtask, SubtaskOrdinal};
    use mockito::Matcher;
    use std::cell::RefCell;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn configured_types_win_when_available() {
        let types =
            resolve_issue_types("PRJ", &names(&["Bug", "Task", "Subtask"]), "Task", "Subtask")
                .unwrap();
        assert_eq!(types.task, "Task");
        assert_eq!(types.subtask.as_deref(), Some("Subtask"));
    }

    #[test]
    fn falls_back_in_order() {
        let types =
            resolve_issue_types("PRJ", &names(&["Issue", "Story", "Sub-task"]), "Epic", "Subtask")
                .unwrap();
        assert_eq!(types.task, "Story");
        assert_eq!(types.subtask.as_deref(), Some("Sub-task"));
    }

    #[test]
    fn missing_subtask_type_is_not_fatal() {
        let types = resolve_issue_types("PRJ", &names(&["Task"]), "Task", "Subtask").unwrap();
        assert_eq!(types.subtask, None);
    }

    #[test]
    fn missing_task_type_is_fatal() {
        let err = resolve_issue_types("PRJ", &names(&["Bug"]), "Task", "Subtask").unwrap_err();
        assert!(matches!(err, TicketflowError::NoIssueType { .. }));
    }

    /// Hands out sequential keys and fails on summaries listed in `fail_on`.
    struct FakeTracker {
        created: RefCell<Vec<NewIssue>>,
        fail_on: Vec<&'static str>,
    }

    impl FakeTracker {
        fn new(fail_on: Vec<&'static str>) -> Self {
            Self {
                created: RefCell::new(Vec::new()),
                fail_on,
            }
        }
    }

    impl IssueTracker for FakeTracker {
        fn issue_type_names(&self) -> Result<Vec<String>> {
            Ok(names(&["Task", "Subtask"]))
        }

        fn create_issue(&self, issue: &NewIssue) -> Result<String> {
            if self.fail_on.contains(&issue.summary.as_str()) {
                return Err(TicketflowError::Api {
                    service: SERVICE,
                    status: 400,
                    body: "bad".into(),
                });
            }
            let mut created = self.created.borrow_mut();
            created.push(issue.clone());
            Ok(format!("PRJ-{}", created.len()))
        }

        fn add_comment(&self, _: &str, _: &str) -> Result<()> {
            Ok(())
        }
    }

    fn sample_tasks() -> Vec<Task> {
        let mut dash = Task::new(1, "Dashboard");
        dash.description = "Build it.".into();
        dash.acceptance_criteria = vec!["Loads fast".into()];
        dash.subtasks.push(Subtask::new(SubtaskOrdinal::new(1, 1), "Subtask 1.1: Users"));
        dash.subtasks.push(Subtask::new(SubtaskOrdinal::new(1, 2), "Referrals"));
        let venues = Task::new(2, "Venues");
        vec![dash, venues]
    }

    fn types() -> IssueTypes {
        IssueTypes {
            task: "Task".into(),
            subtask: Some("Subtask".into()),
        }
    }

    #[test]
    fn creates_tasks_then_subtasks() {
        let tracker = FakeTracker::new(vec![]);
        let created = create_tickets(&tracker, &types(), &names(&["pipeline"]), &sample_tasks());

        let keys: Vec<_> = created.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["PRJ-1", "PRJ-2", "PRJ-3", "PRJ-4"]);
        assert_eq!(created.task_count(), 2);

        let users = &created.entries[1];
        assert_eq!(users.kind, TicketKind::Subtask);
        assert_eq!(users.summary, "Users");
        assert_eq!(users.parent_key.as_deref(), Some("PRJ-1"));

        let issues = tracker.created.borrow();
        assert_eq!(
            issues[0].description,
            "Description: Build it.\n\nAcceptance Criteria:\n- Loads fast"
        );
        assert_eq!(issues[1].parent_key.as_deref(), Some("PRJ-1"));
        assert_eq!(issues[0].labels, vec!["pipeline"]);
    }

    #[test]
    fn failed_task_skips_its_subtasks() {
        let tracker = FakeTracker::new(vec!["Dashboard"]);
        let created = create_tickets(&tracker, &types(), &[], &sample_tasks());
        assert_eq!(created.entries.len(), 1);
        assert_eq!(created.entries[0].summary, "Venues");
        assert_eq!(created.failed, vec!["Dashboard"]);
    }

    #[test]
    fn failed_subtask_is_skipped_alone() {
        let tracker = FakeTracker::new(vec!["Users"]);
        let created = create_tickets(&tracker, &types(), &[], &sample_tasks());
        let summaries: Vec<_> = created.entries.iter().map(|e| e.summary.as_str()).collect();
        assert_eq!(summaries, vec!["Dashboard", "Referrals", "Venues"]);
    }

    #[test]
    fn registry_summary_matches_tracker_summary() {
        let tracker = FakeTracker::new(vec![]);
        let mut long = Task::new(1, "x".repeat(300));
        long.subtasks.push(Subtask::new(SubtaskOrdinal::new(1, 1), "y".repeat(300)));
        let created = create_tickets(&tracker, &types(), &[], &[long]);

        let issues = tracker.created.borrow();
        for (entry, issue) in created.entries.iter().zip(issues.iter()) {
            assert_eq!(entry.summary, issue.summary);
            assert_eq!(entry.summary.chars().count(), naming::MAX_SUMMARY_LEN);
        }
        assert_eq!(created.entries.len(), 2);
    }

    #[test]
    fn no_subtask_type_creates_tasks_only() {
        let tracker = FakeTracker::new(vec![]);
        let types = IssueTypes {
            task: "Story".into(),
            subtask: None,
        };
        let created = create_tickets(&tracker, &types, &[], &sample_tasks());
        assert_eq!(created.entries.len(), 2);
        assert_eq!(created.entries[0].issue_type.as_deref(), Some("Story"));
    }

    // -----------------------------------------------------------------------
    // HTTP
    // -----------------------------------------------------------------------

    fn client(url: &str) -> JiraClient {
        JiraClient::new(&TrackerConfig {
            server_url: url.to_string(),
            email: "dev@example.com".into(),
            api_token: "tok".into(),
            project_key: "PRJ".into(),
            issue_type: "Task".into(),
            subtask_issue_type: "Subtask".into(),
            labels: vec![],
        })
        .unwrap()
    }

    #[test]
    fn reads_issue_type_names() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/rest/api/2/project/PRJ")
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_body(r#"{"key":"PRJ","issueTypes":[{"name":"Task"},{"name":"Sub-task"}]}"#)
            .create();

        let names = client(&server.url()).issue_type_names().unwrap();
        assert_eq!(names, vec!["Task", "Sub-task"]);
        mock.assert();
    }

    #[test]
    fn create_issue_sends_parent_and_returns_key() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/api/2/issue")
            .match_body(Matcher::PartialJson(json!({
                "fields": {
                    "project": { "key": "PRJ" },
                    "summary": "Users",
                    "issuetype": { "name": "Subtask" },
                    "parent": { "key": "PRJ-1" }
                }
            })))
            .with_status(201)
            .with_body(r#"{"id":"10002","key":"PRJ-2"}"#)
            .create();

        let key = client(&server.url())
            .create_issue(&NewIssue {
                summary: "Users".into(),
                description: "d".into(),
                issue_type: "Subtask".into(),
                labels: vec![],
                parent_key: Some("PRJ-1".into()),
            })
            .unwrap();
        assert_eq!(key, "PRJ-2");
        mock.assert();
    }

    #[test]
    fn create_issue_surfaces_api_errors() {
        let mut server = mockito::Server::new();
        server
            .mock("POST", "/rest/api/2/issue")
            .with_status(400)
            .with_body(r#"{"errors":{"issuetype":"invalid"}}"#)
            .create();

        let err = client(&server.url())
            .create_issue(&NewIssue {
                summary: "x".into(),
                description: String::new(),
                issue_type: "Task".into(),
                labels: vec![],
                parent_key: None,
            })
            .unwrap_err();
        assert!(matches!(err, TicketflowError::Api { status: 400, .. }));
    }

    #[test]
    fn comment_uses_document_format() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("POST", "/rest/api/3/issue/PRJ-1/comment")
            .match_body(Matcher::Json(json!({
                "body": {
                    "type": "doc",
                    "version": 1,
                    "content": [{
                        "type": "paragraph",
                        "content": [{ "type": "text", "text": "Generated Test Cases:\n\nTC1" }]
                    }]
                }
            })))
            .with_status(201)
            .with_body("{}")
            .create();

        client(&server.url())
            .add_comment("PRJ-1", &format!("{COMMENT_PREFIX}TC1"))
            .unwrap();
        mock.assert();
    }
}
