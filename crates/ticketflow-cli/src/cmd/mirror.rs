use crate::output::{print_json, print_section, print_table};
use crate::workdir::WorkDir;
use anyhow::Context;
use ticketflow_core::config::{ProcessEnv, ProjectInfo, RepoConfig};
use ticketflow_core::mirror::{BranchState, MirrorReport};
use ticketflow_core::pipeline::run_mirror;
use ticketflow_core::repo::GitHubClient;

pub fn run(work: &WorkDir, json: bool) -> anyhow::Result<()> {
    let repo_config = RepoConfig::from_env(&ProcessEnv).context("GitHub configuration")?;
    let project = ProjectInfo::from_env(&ProcessEnv);
    let host = GitHubClient::new(&repo_config)?;

    let report = run_mirror(&host, &project, &repo_config.default_branch, &work.registry)
        .context("repository setup failed")?;

    if json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &MirrorReport) {
    if !report.readme_written {
        println!("Project README was not written; see the log for details.");
    }
    if !report.branches.is_empty() {
        let rows = report
            .branches
            .iter()
            .map(|b| {
                let state = match b.state {
                    BranchState::Created => "created",
                    BranchState::Reused => "existing",
                };
                vec![b.task_key.clone(), b.branch.clone(), state.to_string()]
            })
            .collect();
        print_table(&["TASK", "BRANCH", "STATE"], rows);
    }
    print_section("Failed tasks", &report.failed);
    println!("\nRepository setup completed: {}", report.repo_url);
}
