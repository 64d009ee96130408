//! Stage 2: mirror the ticket tree into the repository as a project README
//! on the default branch plus one feature branch per task.

use crate::config::ProjectInfo;
use crate::error::{Result, TicketflowError};
use crate::hierarchy::{TaskNode, TicketTree};
use crate::naming::branch_name;
use crate::paths::README_FILE;
use crate::render;
use crate::repo::{upsert_file, RepoHost};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BranchState {
    Created,
    Reused,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchOutcome {
    pub task_key: String,
    pub branch: String,
    pub state: BranchState,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct MirrorReport {
    pub repo_url: String,
    pub readme_written: bool,
    pub branches: Vec<BranchOutcome>,
    /// Task keys whose branch or README could not be written.
    pub failed: Vec<String>,
}

/// Ensure the repository exists, write the project README and a branch with
/// its own README for every task. Per-task failures are logged and recorded.
pub fn mirror_tickets<H: RepoHost + ?Sized>(
    host: &H,
    project: &ProjectInfo,
    tree: &TicketTree,
    default_branch: &str,
) -> Result<MirrorReport> {
    let info = host.ensure_repository(&project.description)?;
    let mut report = MirrorReport {
        repo_url: info.html_url,
        ..MirrorReport::default()
    };

    let readme = render::project_readme(project, tree);
    match upsert_file(host, README_FILE, default_branch, &readme, "") {
        Ok(_) => report.readme_written = true,
        Err(e) => tracing::error!("failed to write project README: {e}"),
    }

    let base_sha = host.branch_head(default_branch)?.ok_or_else(|| {
        TicketflowError::UnexpectedResponse {
            service: "GitHub",
            detail: format!("default branch '{default_branch}' not found"),
        }
    })?;

    for task in &tree.tasks {
        let branch = branch_name(&task.key, &task.summary);
        let outcome = mirror_task(host, &branch, &base_sha, task);
        match outcome {
            Ok(state) => report.branches.push(BranchOutcome {
                task_key: task.key.clone(),
                branch,
                state,
            }),
            Err(e) => {
                tracing::error!("failed to mirror {} to {branch}: {e}", task.key);
                report.failed.push(task.key.clone());
            }
        }
    }

    Ok(report)
}

fn mirror_task<H: RepoHost + ?Sized>(
    host: &H,
    branch: &str,
    base_sha: &str,
    task: &TaskNode,
) -> Result<BranchState> {
    let state = if host.branch_head(branch)?.is_some() {
        tracing::info!("branch {branch} already exists, reusing it");
        BranchState::Reused
    } else {
        host.create_branch(branch, base_sha)?;
        tracing::info!("created branch {branch}");
        BranchState::Created
    };
    let readme = render::branch_readme(task);
    upsert_file(host, README_FILE, branch, &readme, &format!(" for {}", task.key))?;
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hierarchy::reconstruct;
    use crate::registry::TicketEntry;
    use crate::repo::RepoInfo;
    use std::cell::RefCell;
    use std::collections::BTreeMap;

    /// Branches map to head shas; files are keyed by (branch, path).
    #[derive(Default)]
    struct FakeHost {
        branches: RefCell<BTreeMap<String, String>>,
        files: RefCell<BTreeMap<(String, String), String>>,
        messages: RefCell<Vec<String>>,
        refuse_branch: Option<&'static str>,
    }

    impl FakeHost {
        fn with_main() -> Self {
            let host = Self::default();
            host.branches
                .borrow_mut()
                .insert("main".into(), "sha-main".into());
            host
        }
    }

    impl RepoHost for FakeHost {
        fn ensure_repository(&self, _: &str) -> Result<RepoInfo> {
            Ok(RepoInfo {
                html_url: "https://github.com/octo/booking".into(),
                default_branch: Some("main".into()),
            })
        }

        fn branch_head(&self, branch: &str) -> Result<Option<String>> {
            Ok(self.branches.borrow().get(branch).cloned())
        }

        fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
            if self.refuse_branch == Some(branch) {
                return Err(TicketflowError::Api {
                    service: "GitHub",
                    status: 422,
                    body: "Reference update failed".into(),
                });
            }
            self.branches
                .borrow_mut()
                .insert(branch.into(), sha.into());
            Ok(())
        }

        fn file_sha(&self, path: &str, branch: &str) -> Result<Option<String>> {
            Ok(self
                .files
                .borrow()
                .contains_key(&(branch.to_string(), path.to_string()))
                .then(|| "blob".to_string()))
        }

        fn put_file(
            &self,
            path: &str,
            branch: &str,
            message: &str,
            content: &str,
            _: Option<&str>,
        ) -> Result<()> {
            self.messages.borrow_mut().push(message.into());
            self.files
                .borrow_mut()
                .insert((branch.into(), path.into()), content.into());
            Ok(())
        }
    }

    fn project() -> ProjectInfo {
        ProjectInfo {
            name: "Booking".into(),
            description: "Books guards".into(),
        }
    }

    fn tree() -> TicketTree {
        reconstruct(&[
            TicketEntry::task("PRJ-1", "Dashboard"),
            TicketEntry::subtask("PRJ-2", "User Metrics", "PRJ-1"),
            TicketEntry::task("PRJ-3", "Venues"),
        ])
    }

    #[test]
    fn writes_project_readme_and_branches() {
        let host = FakeHost::with_main();
        let report = mirror_tickets(&host, &project(), &tree(), "main").unwrap();

        assert!(report.readme_written);
        assert_eq!(report.repo_url, "https://github.com/octo/booking");
        let names: Vec<_> = report.branches.iter().map(|b| b.branch.as_str()).collect();
        assert_eq!(names, vec!["feature/PRJ-1-dashboard", "feature/PRJ-3-venues"]);

        let branches = host.branches.borrow();
        assert_eq!(branches["feature/PRJ-1-dashboard"], "sha-main");

        let files = host.files.borrow();
        let main_readme = &files[&("main".to_string(), "README.md".to_string())];
        assert!(main_readme.starts_with("# Booking\n"));
        let branch_readme = &files[&("feature/PRJ-1-dashboard".to_string(), "README.md".to_string())];
        assert!(branch_readme.starts_with("# PRJ-1: Dashboard\n"));
        assert!(host
            .messages
            .borrow()
            .contains(&"Add README.md for PRJ-1".to_string()));
    }

    #[test]
    fn existing_branch_is_reused() {
        let host = FakeHost::with_main();
        host.branches
            .borrow_mut()
            .insert("feature/PRJ-3-venues".into(), "sha-old".into());
        let report = mirror_tickets(&host, &project(), &tree(), "main").unwrap();
        assert_eq!(report.branches[1].state, BranchState::Reused);
        assert_eq!(host.branches.borrow()["feature/PRJ-3-venues"], "sha-old");
    }

    #[test]
    fn branch_failure_skips_only_that_task() {
        let host = FakeHost {
            refuse_branch: Some("feature/PRJ-1-dashboard"),
            ..FakeHost::with_main()
        };
        let report = mirror_tickets(&host, &project(), &tree(), "main").unwrap();
        assert_eq!(report.failed, vec!["PRJ-1"]);
        assert_eq!(report.branches.len(), 1);
        assert_eq!(report.branches[0].task_key, "PRJ-3");
    }

    #[test]
    fn missing_default_branch_is_an_error() {
        let host = FakeHost::default();
        assert!(mirror_tickets(&host, &project(), &tree(), "main").is_err());
    }
}
