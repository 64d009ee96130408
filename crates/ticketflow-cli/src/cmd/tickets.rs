use crate::output::{print_json, print_section, print_table};
use crate::workdir::WorkDir;
use anyhow::Context;
use std::path::Path;
use ticketflow_core::config::{LlmConfig, ProcessEnv, TrackerConfig};
use ticketflow_core::extract::DocumentFormat;
use ticketflow_core::pipeline::{run_tickets, TicketsOutcome};
use ticketflow_core::registry::TicketKind;
use ticketflow_core::tracker::JiraClient;
use ticketflow_core::TicketflowError;

pub fn run(work: &WorkDir, document: &Path, json: bool) -> anyhow::Result<()> {
    if !document.is_file() {
        return Err(TicketflowError::InputNotFound(document.display().to_string()).into());
    }
    DocumentFormat::from_path(document)?;

    let llm = LlmConfig::from_env(&ProcessEnv).context("language model configuration")?;
    let tracker_config = TrackerConfig::from_env(&ProcessEnv).context("Jira configuration")?;
    let model = llm.client()?;
    let tracker = JiraClient::new(&tracker_config)?;

    let outcome = run_tickets(
        &model,
        &llm.extraction_model,
        &tracker,
        &tracker_config,
        document,
        &work.dir,
        &work.registry,
    )
    .with_context(|| format!("ticket creation from {} failed", document.display()))?;

    if json {
        return print_json(&outcome);
    }
    print_outcome(&outcome);
    Ok(())
}

fn print_outcome(outcome: &TicketsOutcome) {
    let created = &outcome.created;
    if created.entries.is_empty() {
        println!("No tasks or subtasks were created.");
    } else {
        let rows = created
            .entries
            .iter()
            .map(|e| {
                let summary = match e.kind {
                    TicketKind::Subtask => format!("  {}", e.summary),
                    _ => e.summary.clone(),
                };
                vec![
                    e.key.clone(),
                    e.issue_type.clone().unwrap_or_else(|| e.kind.to_string()),
                    summary,
                ]
            })
            .collect();
        print_table(&["KEY", "TYPE", "SUMMARY"], rows);
    }

    let repairs: Vec<String> = outcome
        .parsed
        .repairs
        .iter()
        .map(|r| format!("Subtask {} -> {}: {}", r.found, r.assigned, r.title))
        .collect();
    print_section("Renumbered subtasks", &repairs);
    print_section("Failed to create", &created.failed);

    println!(
        "\nCreated {} tickets ({} tasks). Registry: {}",
        created.entries.len(),
        created.task_count(),
        outcome.registry_path.display()
    );
}
