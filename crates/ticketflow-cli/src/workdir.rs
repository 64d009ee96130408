use std::path::{Path, PathBuf};
use ticketflow_core::paths;

/// Where a run reads and writes its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkDir {
    pub dir: PathBuf,
    pub registry: PathBuf,
}

/// Resolve the work directory and registry path.
///
/// Priority for the directory:
/// 1. `--work-dir` flag / `TICKETFLOW_DIR` env var (passed in as `explicit`)
/// 2. The current directory
///
/// The registry defaults to `ticket_keys.json` inside the directory.
pub fn resolve(explicit: Option<&Path>, registry: Option<&Path>) -> WorkDir {
    let dir = match explicit {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    };
    let registry = match registry {
        Some(p) => p.to_path_buf(),
        None => paths::registry_path(&dir),
    };
    WorkDir { dir, registry }
}

/// Load `.env` from the work directory, then from the current directory or
/// its ancestors. Variables already set in the process win.
pub fn load_dotenv(dir: &Path) {
    let local = dir.join(".env");
    if local.is_file() {
        if let Err(e) = dotenv::from_path(&local) {
            tracing::warn!("failed to load {}: {e}", local.display());
        }
    }
    dotenv::dotenv().ok();
}
