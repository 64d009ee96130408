use crate::output::{print_json, print_section, print_table};
use anyhow::Context;
use std::path::Path;
use ticketflow_core::parser::{parse_task_file, ParsedTasks};
use ticketflow_core::task::summarize;

pub fn run(file: &Path, json: bool) -> anyhow::Result<()> {
    let parsed = parse_task_file(file)
        .with_context(|| format!("failed to read task file {}", file.display()))?;

    if json {
        return print_json(&parsed);
    }
    print_parsed(&parsed);
    Ok(())
}

fn print_parsed(parsed: &ParsedTasks) {
    if parsed.tasks.is_empty() {
        println!("No tasks found.");
        return;
    }

    let mut rows = Vec::new();
    for task in &parsed.tasks {
        rows.push(vec![
            task.ordinal.to_string(),
            task.title.clone(),
            task.acceptance_criteria.len().to_string(),
        ]);
        for sub in &task.subtasks {
            rows.push(vec![
                sub.ordinal.to_string(),
                format!("  {}", sub.title),
                sub.acceptance_criteria.len().to_string(),
            ]);
        }
    }
    print_table(&["#", "TITLE", "CRITERIA"], rows);
    println!("\n{}", summarize(&parsed.tasks));

    let repairs: Vec<String> = parsed
        .repairs
        .iter()
        .map(|r| format!("Subtask {} -> {}: {}", r.found, r.assigned, r.title))
        .collect();
    print_section("Renumbered subtasks", &repairs);
}
