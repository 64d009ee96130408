use crate::output::print_json;
use clap::Subcommand;
use ticketflow_core::config::{check_environment, ProcessEnv, WarnLevel};

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Report missing or invalid environment variables for every stage
    Check,
}

pub fn run(subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Check => check(json),
    }
}

fn check(json: bool) -> anyhow::Result<()> {
    let warnings = check_environment(&ProcessEnv);

    if json {
        print_json(&serde_json::json!({ "warnings": warnings }))?;
    } else if warnings.is_empty() {
        println!("Configuration is complete. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}: {}", w.stage.as_str(), w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("configuration check found errors");
    }
    Ok(())
}
