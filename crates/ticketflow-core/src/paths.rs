use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File name constants
// ---------------------------------------------------------------------------

pub const EXTRACTED_TEXT_FILE: &str = "temp_extracted_text.txt";
pub const TASKS_FILE: &str = "extracted_tasks.txt";
pub const REGISTRY_FILE: &str = "ticket_keys.json";
pub const ALL_TEST_CASES_FILE: &str = "all_test_cases.txt";
pub const README_FILE: &str = "README.md";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn extracted_text_path(work_dir: &Path) -> PathBuf {
    work_dir.join(EXTRACTED_TEXT_FILE)
}

pub fn tasks_path(work_dir: &Path) -> PathBuf {
    work_dir.join(TASKS_FILE)
}

pub fn registry_path(work_dir: &Path) -> PathBuf {
    work_dir.join(REGISTRY_FILE)
}

pub fn all_test_cases_path(work_dir: &Path) -> PathBuf {
    work_dir.join(ALL_TEST_CASES_FILE)
}

/// Repository path of the test-case document committed for `task_key`.
pub fn test_case_file_name(task_key: &str) -> String {
    format!("test_cases_{task_key}.md")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
