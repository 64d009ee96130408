use crate::output::{print_json, print_section, print_table};
use crate::workdir::WorkDir;
use anyhow::Context;
use ticketflow_core::hierarchy::{reconstruct, TicketTree};
use ticketflow_core::registry;

pub fn run(work: &WorkDir, json: bool) -> anyhow::Result<()> {
    let entries = registry::load(&work.registry)
        .with_context(|| format!("failed to read registry {}", work.registry.display()))?;
    if entries.is_empty() {
        anyhow::bail!("no tickets found in {}", work.registry.display());
    }
    let tree = reconstruct(&entries);

    if json {
        return print_json(&tree);
    }
    print_tree(&tree);
    Ok(())
}

fn print_tree(tree: &TicketTree) {
    let mut rows = Vec::new();
    for task in &tree.tasks {
        rows.push(vec![task.key.clone(), String::new(), task.summary.clone()]);
        for sub in &task.subtasks {
            rows.push(vec![
                sub.key.clone(),
                task.key.clone(),
                format!("  {}", sub.summary),
            ]);
        }
    }
    print_table(&["KEY", "PARENT", "SUMMARY"], rows);
    print_section("Dropped subtasks (parent not found)", &tree.dropped);
}
