use crate::output::{print_json, print_section, print_table};
use crate::workdir::WorkDir;
use anyhow::Context;
use groq_chat::RetryPolicy;
use ticketflow_core::config::{LlmConfig, ProcessEnv, ProjectInfo, RepoConfig, TrackerConfig};
use ticketflow_core::pipeline::{run_testcases, TestcasesOutcome};
use ticketflow_core::repo::GitHubClient;
use ticketflow_core::testcases::{Generation, TestCaseSource};
use ticketflow_core::tracker::JiraClient;

pub fn run(work: &WorkDir, comment: bool, commit: bool, json: bool) -> anyhow::Result<()> {
    let llm = LlmConfig::from_env(&ProcessEnv).context("language model configuration")?;
    let project = ProjectInfo::from_env(&ProcessEnv);
    let tracker = if comment {
        let cfg = TrackerConfig::from_env(&ProcessEnv).context("Jira configuration")?;
        Some(JiraClient::new(&cfg)?)
    } else {
        None
    };
    let host = if commit {
        let cfg = RepoConfig::from_env(&ProcessEnv).context("GitHub configuration")?;
        Some(GitHubClient::new(&cfg)?)
    } else {
        None
    };

    let model = llm.client()?;
    let generation = Generation {
        model_name: &llm.test_model,
        project_name: &project.name,
        retry: RetryPolicy::default(),
    };

    let outcome = run_testcases(
        &model,
        &generation,
        tracker.as_ref(),
        host.as_ref(),
        &work.registry,
        &work.dir,
    )
    .context("test case generation failed")?;

    if json {
        return print_json(&outcome);
    }
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &TestcasesOutcome) {
    let rows = outcome
        .documents
        .iter()
        .map(|d| {
            let source = match d.source {
                TestCaseSource::Model => "model",
                TestCaseSource::Fallback => "fallback",
            };
            vec![d.task_key.clone(), d.summary.clone(), source.to_string()]
        })
        .collect();
    print_table(&["TASK", "SUMMARY", "SOURCE"], rows);

    let publish = &outcome.publish;
    print_section("Branch missing, not committed", &publish.missing_branches);
    print_section("Failed to publish", &publish.failed);
    println!(
        "\n{} comments posted, {} files committed. All test cases: {}",
        publish.commented.len(),
        publish.committed.len(),
        outcome.output_path.display()
    );
}
