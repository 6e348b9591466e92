use std::{
    fs::{self, File},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};

use crate::{
    errors::{DomainError, Result},
    store::FinanceState,
    utils::{ensure_dir, PathResolver},
};

use super::StorageBackend;

const BACKUP_EXTENSION: &str = "json";
const BACKUP_TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";
const TMP_SUFFIX: &str = "tmp";
const DEFAULT_RETENTION: usize = 5;

/// File-based backend: one pretty-printed JSON document per named snapshot,
/// with timestamped backups pruned to a retention count.
#[derive(Clone)]
pub struct JsonStorage {
    snapshots_dir: PathBuf,
    backups_dir: PathBuf,
    retention: usize,
}

impl JsonStorage {
    pub fn new(root: Option<PathBuf>, retention: Option<usize>) -> Result<Self> {
        let base = PathResolver::resolve_base(root);
        ensure_dir(&base)?;
        let snapshots_dir = PathResolver::snapshot_dir_in(&base);
        let backups_dir = PathResolver::backup_dir_in(&base);
        ensure_dir(&snapshots_dir)?;
        ensure_dir(&backups_dir)?;
        Ok(Self {
            snapshots_dir,
            backups_dir,
            retention: retention.unwrap_or(DEFAULT_RETENTION).max(1),
        })
    }

    pub fn new_default() -> Result<Self> {
        Self::new(None, None)
    }

    pub fn snapshot_path(&self, name: &str) -> PathBuf {
        self.snapshots_dir
            .join(format!("{}.json", canonical_name(name)))
    }

    fn backup_dir(&self, name: &str) -> PathBuf {
        self.backups_dir.join(canonical_name(name))
    }

    pub fn backup_path(&self, name: &str, backup_name: &str) -> PathBuf {
        self.backup_dir(name).join(backup_name)
    }

    fn write_backup_file(
        &self,
        state: &FinanceState,
        name: &str,
        note: Option<&str>,
    ) -> Result<()> {
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let mut file_stem = format!("{}_{}", canonical_name(name), timestamp);
        if let Some(label) = sanitize_note(note) {
            file_stem.push('_');
            file_stem.push_str(&label);
        }
        let path = dir.join(format!("{}.{}", file_stem, BACKUP_EXTENSION));
        let json = serde_json::to_string_pretty(state)?;
        write_atomic(&path, &json)?;
        self.prune_backups(name)?;
        Ok(())
    }

    fn backup_existing_file(&self, name: &str, path: &Path) -> Result<()> {
        if !path.exists() {
            return Ok(());
        }
        let dir = self.backup_dir(name);
        ensure_dir(&dir)?;
        let timestamp = Utc::now().format(BACKUP_TIMESTAMP_FORMAT).to_string();
        let backup_name = format!(
            "{}_{}.{}",
            canonical_name(name),
            timestamp,
            BACKUP_EXTENSION
        );
        fs::copy(path, dir.join(backup_name))?;
        self.prune_backups(name)?;
        Ok(())
    }

    fn prune_backups(&self, name: &str) -> Result<()> {
        let backups = self.list_backups(name)?;
        if backups.len() <= self.retention {
            return Ok(());
        }
        for entry in backups.iter().skip(self.retention) {
            let path = self.backup_path(name, entry);
            let _ = fs::remove_file(path);
        }
        Ok(())
    }
}

impl StorageBackend for JsonStorage {
    fn save(&self, state: &FinanceState, name: &str) -> Result<()> {
        let path = self.snapshot_path(name);
        if let Some(parent) = path.parent() {
            ensure_dir(parent)?;
        }
        // Keep the previous version around before overwriting.
        self.backup_existing_file(name, &path)?;
        save_state_to_path(state, &path)
    }

    fn load(&self, name: &str) -> Result<FinanceState> {
        load_state_from_path(&self.snapshot_path(name))
    }

    fn list_backups(&self, name: &str) -> Result<Vec<String>> {
        let dir = self.backup_dir(name);
        if !dir.exists() {
            return Ok(Vec::new());
        }
        let mut entries = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BACKUP_EXTENSION) {
                continue;
            }
            if let Some(file_name) = path.file_name().and_then(|stem| stem.to_str()) {
                entries.push(file_name.to_string());
            }
        }
        entries.sort_by(|a, b| parse_backup_timestamp(b).cmp(&parse_backup_timestamp(a)));
        Ok(entries)
    }

    fn backup(&self, state: &FinanceState, name: &str, note: Option<&str>) -> Result<()> {
        self.write_backup_file(state, name, note)
    }

    fn restore(&self, name: &str, backup_name: &str) -> Result<FinanceState> {
        let backup_path = self.backup_path(name, backup_name);
        if !backup_path.exists() {
            return Err(DomainError::Storage(format!(
                "backup `{}` not found",
                backup_name
            )));
        }
        let target = self.snapshot_path(name);
        if let Some(parent) = target.parent() {
            ensure_dir(parent)?;
        }
        fs::copy(&backup_path, &target)?;
        load_state_from_path(&target)
    }
}

pub fn save_state_to_path(state: &FinanceState, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let json = serde_json::to_string_pretty(state)?;
    let tmp = tmp_path(path);
    write_atomic(&tmp, &json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_state_from_path(path: &Path) -> Result<FinanceState> {
    if !path.exists() {
        return Err(DomainError::Storage(format!(
            "snapshot `{}` not found",
            path.display()
        )));
    }
    let data = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&data)?)
}

fn slugify(raw: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = false;
    for ch in raw.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            slug.push(ch.to_ascii_lowercase());
            last_dash = false;
        } else if !slug.is_empty() && !last_dash {
            slug.push('-');
            last_dash = true;
        }
    }
    slug.trim_matches('-').to_string()
}

fn canonical_name(name: &str) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        "snapshot".to_string()
    } else {
        slug
    }
}

fn sanitize_note(note: Option<&str>) -> Option<String> {
    let slug = slugify(note?);
    if slug.is_empty() {
        None
    } else {
        Some(slug)
    }
}

fn parse_backup_timestamp(name: &str) -> Option<DateTime<Utc>> {
    let trimmed = name.strip_suffix(&format!(".{}", BACKUP_EXTENSION))?;
    let segments: Vec<&str> = trimmed.split('_').collect();
    for window in segments.windows(2) {
        if window[0].len() == 8 && window[1].len() == 6 {
            let raw = format!("{}{}", window[0], window[1]);
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S") {
                return Some(DateTime::from_naive_utc_and_offset(naive, Utc));
            }
        }
    }
    None
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

fn write_atomic(path: &Path, data: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let mut file = File::create(path)?;
    file.write_all(data.as_bytes())?;
    file.flush()?;
    Ok(())
}
