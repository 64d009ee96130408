use crate::error::{Result, TicketflowError};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Variable names
// ---------------------------------------------------------------------------

pub const JIRA_SERVER: &str = "JIRA_SERVER";
pub const JIRA_URL: &str = "JIRA_URL";
pub const JIRA_EMAIL: &str = "JIRA_EMAIL";
pub const JIRA_API_TOKEN: &str = "JIRA_API_TOKEN";
pub const JIRA_PROJECT_KEY: &str = "JIRA_PROJECT_KEY";
pub const JIRA_LABELS: &str = "JIRA_LABELS";
pub const DEFAULT_ISSUE_TYPE: &str = "DEFAULT_ISSUE_TYPE";
pub const DEFAULT_SUBTASK_ISSUE_TYPE: &str = "DEFAULT_SUBTASK_ISSUE_TYPE";
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";
pub const GITHUB_USERNAME: &str = "GITHUB_USERNAME";
pub const GITHUB_REPO: &str = "GITHUB_REPO";
pub const GITHUB_API_URL: &str = "GITHUB_API_URL";
pub const GITHUB_DEFAULT_BRANCH: &str = "GITHUB_DEFAULT_BRANCH";
pub const PROJECT_NAME: &str = "PROJECT_NAME";
pub const PROJECT_DESCRIPTION: &str = "PROJECT_DESCRIPTION";
pub const GROQ_API_KEY: &str = "GROQ_API_KEY";
pub const GROQ_API_BASE: &str = "GROQ_API_BASE";
pub const GROQ_MODEL: &str = "GROQ_MODEL";
pub const GROQ_TEST_MODEL: &str = "GROQ_TEST_MODEL";

const DEFAULT_LABEL: &str = "requirements-pipeline";
const DEFAULT_EXTRACTION_MODEL: &str = "llama3-70b-8192";
const DEFAULT_TEST_MODEL: &str = "llama-3.1-70b-versatile";
const DEFAULT_GITHUB_API: &str = "https://api.github.com";
const DEFAULT_PROJECT_NAME: &str = "Requirements Project";
const DEFAULT_PROJECT_DESCRIPTION: &str = "Tasks extracted from the project requirements document";

// ---------------------------------------------------------------------------
// EnvSource
// ---------------------------------------------------------------------------

/// Where configuration values come from. Blank values count as unset.
pub trait EnvSource {
    fn var(&self, key: &str) -> Option<String>;
}

/// The process environment.
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok().filter(|v| !v.trim().is_empty())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, key: &str) -> Option<String> {
        self.get(key).cloned().filter(|v| !v.trim().is_empty())
    }
}

/// Collects every missing required variable before failing, so one error
/// names all of them.
struct Reader<'a, E: EnvSource + ?Sized> {
    env: &'a E,
    missing: Vec<String>,
}

impl<'a, E: EnvSource + ?Sized> Reader<'a, E> {
    fn new(env: &'a E) -> Self {
        Self {
            env,
            missing: Vec::new(),
        }
    }

    fn required(&mut self, key: &str) -> String {
        match self.env.var(key) {
            Some(v) => v,
            None => {
                self.missing.push(key.to_string());
                String::new()
            }
        }
    }

    fn required_any(&mut self, keys: &[&str]) -> String {
        if let Some(v) = keys.iter().find_map(|k| self.env.var(k)) {
            return v;
        }
        self.missing.push(keys[0].to_string());
        String::new()
    }

    fn optional(&self, key: &str, default: &str) -> String {
        self.env.var(key).unwrap_or_else(|| default.to_string())
    }

    fn finish(self) -> Result<()> {
        if self.missing.is_empty() {
            Ok(())
        } else {
            Err(TicketflowError::MissingEnv(self.missing))
        }
    }
}

fn validate_url(key: &str, url: &str) -> Result<()> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(TicketflowError::InvalidConfig(format!(
            "{key} '{url}' must start with http:// or https://"
        )))
    }
}

// ---------------------------------------------------------------------------
// TrackerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerConfig {
    pub server_url: String,
    pub email: String,
    pub api_token: String,
    pub project_key: String,
    pub issue_type: String,
    pub subtask_issue_type: String,
    pub labels: Vec<String>,
}

impl TrackerConfig {
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Result<Self> {
        let mut r = Reader::new(env);
        let server_url = r.required_any(&[JIRA_SERVER, JIRA_URL]);
        let email = r.required(JIRA_EMAIL);
        let api_token = r.required(JIRA_API_TOKEN);
        let project_key = r.required(JIRA_PROJECT_KEY);
        let issue_type = r.optional(DEFAULT_ISSUE_TYPE, "Task");
        let subtask_issue_type = r.optional(DEFAULT_SUBTASK_ISSUE_TYPE, "Subtask");
        let labels = r
            .optional(JIRA_LABELS, DEFAULT_LABEL)
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        r.finish()?;
        validate_url(JIRA_SERVER, &server_url)?;
        Ok(Self {
            server_url: server_url.trim_end_matches('/').to_string(),
            email,
            api_token,
            project_key,
            issue_type,
            subtask_issue_type,
            labels,
        })
    }
}

// ---------------------------------------------------------------------------
// RepoConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub token: String,
    pub username: String,
    pub repo: String,
    pub api_url: String,
    pub default_branch: String,
}

impl RepoConfig {
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Result<Self> {
        let mut r = Reader::new(env);
        let token = r.required(GITHUB_TOKEN);
        let username = r.required(GITHUB_USERNAME);
        let repo = r.required(GITHUB_REPO);
        let api_url = r.optional(GITHUB_API_URL, DEFAULT_GITHUB_API);
        let default_branch = r.optional(GITHUB_DEFAULT_BRANCH, "main");
        r.finish()?;
        validate_url(GITHUB_API_URL, &api_url)?;
        Ok(Self {
            token,
            username,
            repo,
            api_url: api_url.trim_end_matches('/').to_string(),
            default_branch,
        })
    }

    pub fn html_url(&self) -> String {
        format!("https://github.com/{}/{}", self.username, self.repo)
    }
}

// ---------------------------------------------------------------------------
// LlmConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmConfig {
    pub api_key: String,
    pub base_url: String,
    pub extraction_model: String,
    pub test_model: String,
}

impl LlmConfig {
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Result<Self> {
        let mut r = Reader::new(env);
        let api_key = r.required(GROQ_API_KEY);
        let base_url = r.optional(GROQ_API_BASE, groq_chat::DEFAULT_BASE_URL);
        let extraction_model = r.optional(GROQ_MODEL, DEFAULT_EXTRACTION_MODEL);
        let test_model = r.optional(GROQ_TEST_MODEL, DEFAULT_TEST_MODEL);
        r.finish()?;
        validate_url(GROQ_API_BASE, &base_url)?;
        Ok(Self {
            api_key,
            base_url,
            extraction_model,
            test_model,
        })
    }

    pub fn client(&self) -> Result<groq_chat::GroqClient> {
        Ok(groq_chat::GroqClient::with_base_url(
            self.api_key.clone(),
            self.base_url.clone(),
        )?)
    }
}

// ---------------------------------------------------------------------------
// ProjectInfo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub name: String,
    pub description: String,
}

impl ProjectInfo {
    pub fn from_env<E: EnvSource + ?Sized>(env: &E) -> Self {
        Self {
            name: env
                .var(PROJECT_NAME)
                .unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string()),
            description: env
                .var(PROJECT_DESCRIPTION)
                .unwrap_or_else(|| DEFAULT_PROJECT_DESCRIPTION.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Stage requirements / ConfigWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Tickets,
    Mirror,
    Testcases,
}

impl Stage {
    pub fn all() -> [Stage; 3] {
        [Stage::Tickets, Stage::Mirror, Stage::Testcases]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Tickets => "tickets",
            Stage::Mirror => "mirror",
            Stage::Testcases => "testcases",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub stage: Stage,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

fn record<T>(warnings: &mut Vec<ConfigWarning>, stage: Stage, result: Result<T>) {
    if let Err(e) = result {
        warnings.push(ConfigWarning {
            level: WarnLevel::Error,
            stage,
            message: e.to_string(),
        });
    }
}

/// Check every stage's configuration without contacting any service.
pub fn check_environment<E: EnvSource + ?Sized>(env: &E) -> Vec<ConfigWarning> {
    let mut warnings = Vec::new();

    record(&mut warnings, Stage::Tickets, LlmConfig::from_env(env));
    record(&mut warnings, Stage::Tickets, TrackerConfig::from_env(env));
    record(&mut warnings, Stage::Mirror, RepoConfig::from_env(env));
    record(&mut warnings, Stage::Testcases, LlmConfig::from_env(env));
    record(&mut warnings, Stage::Testcases, RepoConfig::from_env(env));
    record(&mut warnings, Stage::Testcases, TrackerConfig::from_env(env));

    for key in [PROJECT_NAME, PROJECT_DESCRIPTION] {
        if env.var(key).is_none() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                stage: Stage::Mirror,
                message: format!("{key} not set, using a generic default"),
            });
        }
    }

    warnings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
