use crate::config::RepoConfig;
use crate::error::Result;
use crate::http::{is_not_found, success_body, success_json};
use base64::Engine;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::{ACCEPT, USER_AGENT};
use serde::{Deserialize, Serialize};
use serde_json::json;

const SERVICE: &str = "GitHub";
const ACCEPT_GITHUB: &str = "application/vnd.github+json";
const AGENT: &str = concat!("ticketflow/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// RepoHost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoInfo {
    pub html_url: String,
    #[serde(default)]
    pub default_branch: Option<String>,
}

/// Repository operations used by the mirror and test-case stages.
pub trait RepoHost {
    /// Create the repository, or fetch it when creation fails.
    fn ensure_repository(&self, description: &str) -> Result<RepoInfo>;
    /// Head commit sha of `branch`, `None` when the branch does not exist.
    fn branch_head(&self, branch: &str) -> Result<Option<String>>;
    fn create_branch(&self, branch: &str, sha: &str) -> Result<()>;
    /// Blob sha of `path` on `branch`, `None` when the file does not exist.
    fn file_sha(&self, path: &str, branch: &str) -> Result<Option<String>>;
    fn put_file(
        &self,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
        sha: Option<&str>,
    ) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileChange {
    Created,
    Updated,
}

/// Create `path` on `branch`, or update it in place when it already exists.
/// `context` is appended to the commit message, e.g. " for PRJ-1".
pub fn upsert_file<H: RepoHost + ?Sized>(
    host: &H,
    path: &str,
    branch: &str,
    content: &str,
    context: &str,
) -> Result<FileChange> {
    match host.file_sha(path, branch)? {
        Some(sha) => {
            host.put_file(path, branch, &format!("Update {path}{context}"), content, Some(&sha))?;
            tracing::info!("updated {path} in branch {branch}");
            Ok(FileChange::Updated)
        }
        None => {
            host.put_file(path, branch, &format!("Add {path}{context}"), content, None)?;
            tracing::info!("added {path} to branch {branch}");
            Ok(FileChange::Created)
        }
    }
}

// ---------------------------------------------------------------------------
// GitHubClient
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GitHubClient {
    http: Client,
    api_url: String,
    token: String,
    owner: String,
    repo: String,
}

#[derive(Deserialize)]
struct BranchResponse {
    commit: CommitRef,
}

#[derive(Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Deserialize)]
struct ContentResponse {
    sha: String,
}

impl GitHubClient {
    pub fn new(config: &RepoConfig) -> Result<Self> {
        Ok(Self {
            http: Client::builder().build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            token: config.token.clone(),
            owner: config.username.clone(),
            repo: config.repo.clone(),
        })
    }

    fn repo_url(&self, rest: &str) -> String {
        format!("{}/repos/{}/{}{rest}", self.api_url, self.owner, self.repo)
    }

    fn authed(&self, req: RequestBuilder) -> RequestBuilder {
        req.bearer_auth(&self.token)
            .header(ACCEPT, ACCEPT_GITHUB)
            .header(USER_AGENT, AGENT)
    }

    fn get_repository(&self) -> Result<RepoInfo> {
        let resp = self.authed(self.http.get(self.repo_url(""))).send()?;
        success_json(SERVICE, resp)
    }
}

/// Map a 404 to `None`, keep every other outcome.
fn optional<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(v) => Ok(Some(v)),
        Err(e) if is_not_found(&e) => Ok(None),
        Err(e) => Err(e),
    }
}

impl RepoHost for GitHubClient {
    fn ensure_repository(&self, description: &str) -> Result<RepoInfo> {
        let body = json!({
            "name": self.repo,
            "description": description,
            "private": false,
            "auto_init": true,
        });
        let resp = self
            .authed(self.http.post(format!("{}/user/repos", self.api_url)))
            .json(&body)
            .send()?;
        match success_json::<RepoInfo>(SERVICE, resp) {
            Ok(info) => {
                tracing::info!("created repository {}", info.html_url);
                Ok(info)
            }
            Err(e) => {
                tracing::warn!("could not create repository: {e}");
                let info = self.get_repository()?;
                tracing::info!("repository already exists: {}", info.html_url);
                Ok(info)
            }
        }
    }

    fn branch_head(&self, branch: &str) -> Result<Option<String>> {
        let resp = self
            .authed(self.http.get(self.repo_url(&format!("/branches/{branch}"))))
            .send()?;
        let branch: Option<BranchResponse> = optional(success_json(SERVICE, resp))?;
        Ok(branch.map(|b| b.commit.sha))
    }

    fn create_branch(&self, branch: &str, sha: &str) -> Result<()> {
        let resp = self
            .authed(self.http.post(self.repo_url("/git/refs")))
            .json(&json!({ "ref": format!("refs/heads/{branch}"), "sha": sha }))
            .send()?;
        success_body(SERVICE, resp)?;
        Ok(())
    }

    fn file_sha(&self, path: &str, branch: &str) -> Result<Option<String>> {
        let resp = self
            .authed(self.http.get(self.repo_url(&format!("/contents/{path}"))))
            .query(&[("ref", branch)])
            .send()?;
        let content: Option<ContentResponse> = optional(success_json(SERVICE, resp))?;
        Ok(content.map(|c| c.sha))
    }

    fn put_file(
        &self,
        path: &str,
        branch: &str,
        message: &str,
        content: &str,
        sha: Option<&str>,
    ) -> Result<()> {
        let mut body = json!({
            "message": message,
            "content": base64::engine::general_purpose::STANDARD.encode(content),
            "branch": branch,
        });
        if let Some(sha) = sha {
            body["sha"] = json!(sha);
        }
        let resp = self
            .authed(self.http.put(self.repo_url(&format!("/contents/{path}"))))
            .json(&body)
            .send()?;
        success_body(SERVICE, resp)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
