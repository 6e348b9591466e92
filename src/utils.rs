use std::{fs, path::Path, path::PathBuf};

use tracing_subscriber::EnvFilter;

use crate::errors::Result;

/// Installs the global fmt subscriber. Filter level comes from
/// `FINANCE_CORE_LOG`, defaulting to `info`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_env("FINANCE_CORE_LOG")
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// Creates `path` and any missing parents.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Resolves well-known storage locations under the app data root.
pub struct PathResolver;

impl PathResolver {
    const APP_DIR: &'static str = "finance_core";

    pub fn resolve_base(explicit: Option<PathBuf>) -> PathBuf {
        explicit.unwrap_or_else(Self::base_dir)
    }

    pub fn base_dir() -> PathBuf {
        dirs::data_dir()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from("."))
            .join(Self::APP_DIR)
    }

    pub fn snapshot_dir_in(base: &Path) -> PathBuf {
        base.join("snapshots")
    }

    pub fn backup_dir_in(base: &Path) -> PathBuf {
        base.join("backups")
    }
}
