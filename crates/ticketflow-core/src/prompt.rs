use crate::hierarchy::TaskNode;

pub const EXTRACTION_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

const EXTRACTION_INSTRUCTIONS: &str = r#"You are a project planner AI specialized in converting requirement documents into detailed, developer-ready tasks and subtasks.

Instructions:
- Extract tasks and subtasks from the requirement document.
- Treat each top-level functional section of the document as an individual task.
- Do NOT treat subsections as separate tasks; include them as subtasks under their respective parent tasks.
- Ignore sections that are not actionable development tasks (e.g., "Overview", "Implementation Timeline").
- When a section lists metrics or KPIs to track, treat it as a task to implement tracking and break each metric down into a subtask.
- For each task and subtask, provide:
  1. A concise, descriptive title.
  2. A detailed explanation of what should be done.
  3. Acceptance criteria or key points the developer must satisfy (only include criteria that define success, not actionable subtasks).
- Use clear and precise language suitable for developers.
- Number tasks and subtasks sequentially (e.g., Task 1, Task 2, Subtask 1.1, Subtask 1.2, etc.).
- Ensure subtasks are correctly associated with their parent tasks (e.g., Subtask 9.1 must be under Task 9, not Task 8).
- Do NOT include any text like "(Phase 1)" or "(Phase 2)" in titles, descriptions, or acceptance criteria; treat all requirements as part of the current scope.
- Do NOT use any special symbols (e.g., asterisks, emojis, or other markdown symbols like "**") for task or subtask titles.
- Output format:
  - Use the exact string "Task X: <Task Title>" for tasks.
  - Use the exact string "Subtask X.Y: <Subtask Title>" for subtasks.

Example output format:

Task 1: Dashboard Development
Description: Develop a dashboard to display critical metrics.
Acceptance Criteria:
- Dashboard is accessible to admins
- Metrics are displayed accurately

Subtask 1.1: User Metrics Implementation
Description: Implement user metrics on the dashboard.
Acceptance Criteria:
- Total registered users are displayed
- Active vs. inactive users are displayed

Subtask 1.2: Referrals Metrics Implementation
Description: Implement referrals metrics on the dashboard.
Acceptance Criteria:
- Number of referrals sent is displayed

Task 2: Venues Management
Description: Develop a module to manage venues.
Acceptance Criteria:
- Venue profiles can be managed

Subtask 2.1: Venue Performance Metrics Implementation
Description: Implement venue performance metrics.
Acceptance Criteria:
- Total bookings are tracked

Now, analyze the following requirement document and extract tasks accordingly:"#;

/// Prompt asking the model to emit the `Task N:` / `Subtask N.M:` grammar.
pub fn extraction_prompt(document_text: &str) -> String {
    format!("\n{EXTRACTION_INSTRUCTIONS}\n\n\"\"\"\n{document_text}\n\"\"\"\n")
}

pub fn test_case_system_prompt(project_name: &str) -> String {
    format!("You are a test case generator for {project_name}.")
}

fn criteria_lines(criteria: &[String]) -> String {
    if criteria.is_empty() {
        "- None\n".to_string()
    } else {
        let mut out = criteria
            .iter()
            .map(|c| format!("- {c}"))
            .collect::<Vec<_>>()
            .join("\n");
        out.push('\n');
        out
    }
}

/// One prompt per task covering the task and all of its subtasks.
pub fn test_case_prompt(project_name: &str, task: &TaskNode) -> String {
    let mut prompt = format!(
        "Generate test cases for the following task in {project_name}:\n\
         Task ID: {}\n\
         Summary: {}\n\
         Description: {}\n\
         Acceptance Criteria:\n{}\n\
         Format each test case in Markdown with sections: Objective, Preconditions, Test Steps (numbered), Expected Result. \
         Generate one test case for the task and one for each subtask (if any) under a 'Subtask Test Cases' section.\n\
         Subtasks:\n",
        task.key,
        task.summary,
        task.description,
        criteria_lines(&task.acceptance_criteria),
    );
    for sub in &task.subtasks {
        prompt.push_str(&format!(
            "Subtask ID: {}\nSummary: {}\nDescription: {}\nAcceptance Criteria:\n{}\n",
            sub.key,
            sub.summary,
            sub.description,
            criteria_lines(&sub.acceptance_criteria),
        ));
    }
    prompt.push_str("Ensure test cases are specific, actionable, and cover all acceptance criteria.");
    prompt
}
