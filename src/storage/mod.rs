pub mod json_backend;

use std::path::Path;

use crate::{errors::Result, store::FinanceState};

/// Abstraction over persistence backends capable of storing state snapshots.
///
/// When and how often a snapshot is written is the collaborator's decision;
/// the engine only guarantees the snapshot round-trips losslessly.
pub trait StorageBackend: Send + Sync {
    fn save(&self, state: &FinanceState, name: &str) -> Result<()>;
    fn load(&self, name: &str) -> Result<FinanceState>;
    fn list_backups(&self, name: &str) -> Result<Vec<String>>;
    fn backup(&self, state: &FinanceState, name: &str, note: Option<&str>) -> Result<()>;
    fn restore(&self, name: &str, backup_name: &str) -> Result<FinanceState>;

    /// Optional helpers for ad-hoc file operations. Default implementations
    /// forward to the JSON codec when not overridden.
    fn save_to_path(&self, state: &FinanceState, path: &Path) -> Result<()> {
        json_backend::save_state_to_path(state, path)
    }

    fn load_from_path(&self, path: &Path) -> Result<FinanceState> {
        json_backend::load_state_from_path(path)
    }
}

pub use json_backend::JsonStorage;
