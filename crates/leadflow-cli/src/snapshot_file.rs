//! JSON snapshot file storage.
//!
//! The whole record set lives in one pretty-printed JSON document. Writes
//! go to a sibling temporary file that is renamed over the target, so a
//! crash mid-write leaves the previous snapshot intact.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use leadflow_engine::Snapshot;

/// Read a snapshot. A missing file is an empty record set.
pub fn load(path: &Path) -> Result<Snapshot> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no snapshot file yet; starting empty");
        return Ok(Snapshot::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read snapshot file: {}", path.display()))?;
    let snapshot: Snapshot = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse snapshot file: {}", path.display()))?;
    tracing::debug!(
        path = %path.display(),
        leads = snapshot.leads.len(),
        "snapshot file loaded"
    );
    Ok(snapshot)
}

pub fn save(path: &Path, snapshot: &Snapshot) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory: {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(snapshot)?;
    let tmp = temp_path(path);
    std::fs::write(&tmp, json)
        .with_context(|| format!("failed to write snapshot file: {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("failed to replace snapshot file: {}", path.display()))?;
    tracing::debug!(path = %path.display(), "snapshot file saved");
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "leadflow.json".into());
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hire;
    use leadflow_core::{Actor, Role};
    use leadflow_engine::{Employee, EngineConfig, LeadEngine, LeadInput, LeadStore};

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot = load(&dir.path().join("absent.json")).unwrap();
        assert_eq!(snapshot, Snapshot::default());
    }

    #[test]
    fn saved_store_restores_with_valid_timeline() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let engine = LeadEngine::new(LeadStore::new(), EngineConfig::default());
        let owner = hire(&engine, Employee::new("Rohit", Role::Employee, None));
        let admin = hire(&engine, Employee::new("Admin", Role::Admin, None));
        let lead = engine
            .from_website(LeadInput::new("Gita", "9844444444"), None)
            .unwrap();
        engine
            .assign(&lead.id, &owner.id, &Actor::new(admin.id, admin.role), None)
            .unwrap();
        save(&path, &engine.store().snapshot()).unwrap();
        assert!(!temp_path(&path).exists());

        let restored = LeadStore::from_snapshot(load(&path).unwrap()).unwrap();
        let restored = LeadEngine::new(restored, EngineConfig::default());
        let timeline = restored.get_timeline(&lead.id).unwrap();
        assert_eq!(timeline.len(), 2);
        assert_eq!(timeline[0].employee_name, "Admin");
        assert!(restored.verify_timeline(&lead.id).unwrap().chain_valid);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse snapshot file"));
    }
}
