use regex::Regex;
use std::sync::OnceLock;

pub const BRANCH_PREFIX: &str = "feature/";
pub const MAX_BRANCH_LEN: usize = 50;
pub const MAX_SUMMARY_LEN: usize = 255;

static SLUG_STRIP_RE: OnceLock<Regex> = OnceLock::new();
static SUBTASK_PREFIX_RE: OnceLock<Regex> = OnceLock::new();

fn slug_strip_re() -> &'static Regex {
    SLUG_STRIP_RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9\s-]").unwrap())
}

fn subtask_prefix_re() -> &'static Regex {
    SUBTASK_PREFIX_RE.get_or_init(|| Regex::new(r"Subtask \d+\.\d+:").unwrap())
}

/// Drop everything but ASCII alphanumerics, whitespace and hyphens, then
/// lowercase and turn spaces into hyphens.
pub fn slugify(summary: &str) -> String {
    slug_strip_re()
        .replace_all(summary, "")
        .to_lowercase()
        .replace(' ', "-")
}

/// `feature/<key>-<slug>`, cut to 50 characters.
pub fn branch_name(task_key: &str, summary: &str) -> String {
    let full = format!("{BRANCH_PREFIX}{task_key}-{}", slugify(summary));
    truncate_chars(&full, MAX_BRANCH_LEN)
}

/// Issue summary for a subtask: strips any echoed `Subtask N.N:` label and
/// applies the tracker's length limit.
pub fn subtask_summary(title: &str) -> String {
    let stripped = subtask_prefix_re().replace_all(title, "");
    issue_summary(stripped.trim())
}

pub fn issue_summary(title: &str) -> String {
    truncate_chars(title, MAX_SUMMARY_LEN)
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}
