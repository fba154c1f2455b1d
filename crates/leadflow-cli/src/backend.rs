//! Where the record set lives between invocations.
//!
//! Each CLI run locks the records, loads the full [`Snapshot`] into a fresh
//! [`LeadStore`](leadflow_engine::LeadStore), runs one command against the
//! engine, saves the snapshot back if the command changed anything, and
//! only then releases the lock. Two runs against the same records therefore
//! behave like two calls on one engine.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use leadflow_engine::Snapshot;
use sqlx::{Postgres, Transaction};

use crate::{db, snapshot_file};

/// PostgreSQL connection settings.
///
/// Custom `Debug` implementation redacts the URL, which usually carries a
/// password.
#[derive(Clone)]
pub struct DbSettings {
    url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl std::fmt::Debug for DbSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbSettings")
            .field("url", &"[REDACTED]")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_secs", &self.acquire_timeout_secs)
            .finish()
    }
}

impl DbSettings {
    /// Load settings from environment variables. `None` when
    /// `DATABASE_URL` is unset or blank.
    ///
    /// Variables:
    /// - `DATABASE_URL` (required)
    /// - `LEADFLOW_DB_MAX_CONNECTIONS` (default: 5)
    /// - `LEADFLOW_DB_ACQUIRE_TIMEOUT_SECS` (default: 5)
    pub fn from_env() -> Option<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Option<Self> {
        let url = lookup("DATABASE_URL").filter(|u| !u.trim().is_empty())?;
        Some(Self {
            url,
            max_connections: lookup("LEADFLOW_DB_MAX_CONNECTIONS")
                .and_then(|s| s.trim().parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(5),
            acquire_timeout_secs: lookup("LEADFLOW_DB_ACQUIRE_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(5),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Whether a run may change records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// How long a run waits for another run to release the records.
const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Records opened for one CLI run.
///
/// Opening takes the records lock (shared for [`Access::Read`], exclusive
/// for [`Access::Write`]) and the lock is held until [`Backend::finish`] or
/// drop, so a writer's load, command and save are one critical section.
pub enum Backend {
    File {
        path: PathBuf,
        _lock: FileLock,
    },
    Postgres(Transaction<'static, Postgres>),
}

impl Backend {
    /// PostgreSQL when `DATABASE_URL` is set, otherwise the snapshot file.
    pub async fn open(state_file: &Path, access: Access) -> Result<Self> {
        match db::init_pool()
            .await
            .context("failed to connect to the database")?
        {
            Some(pool) => {
                let tx = db::begin_locked(&pool, access == Access::Write)
                    .await
                    .context("failed to lock the records in the database")?;
                Ok(Self::Postgres(tx))
            }
            None => Self::open_file(state_file, access).await,
        }
    }

    pub async fn open_file(path: &Path, access: Access) -> Result<Self> {
        let lock = FileLock::acquire(&lock_path(path), access).await?;
        Ok(Self::File {
            path: path.to_path_buf(),
            _lock: lock,
        })
    }

    pub async fn load(&mut self) -> Result<Snapshot> {
        match self {
            Self::File { path, .. } => snapshot_file::load(path),
            Self::Postgres(tx) => db::load_snapshot(tx)
                .await
                .context("failed to load records from the database"),
        }
    }

    /// Write `current` back. `loaded` is what [`Backend::load`] returned.
    pub async fn save(&mut self, loaded: &Snapshot, current: &Snapshot) -> Result<()> {
        match self {
            Self::File { path, .. } => snapshot_file::save(path, current),
            Self::Postgres(tx) => db::save_snapshot(tx, loaded, current)
                .await
                .context("failed to save records to the database"),
        }
    }

    /// Commit and release the records lock.
    pub async fn finish(self) -> Result<()> {
        match self {
            Self::File { .. } => Ok(()),
            Self::Postgres(tx) => tx
                .commit()
                .await
                .context("failed to commit records to the database"),
        }
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { path, .. } => f.debug_struct("File").field("path", path).finish(),
            Self::Postgres(_) => f.write_str("Postgres"),
        }
    }
}

impl std::fmt::Display for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::File { path, .. } => write!(f, "file {}", path.display()),
            Self::Postgres(_) => f.write_str("postgres"),
        }
    }
}

/// Advisory lock on a file next to the snapshot, released on drop.
pub struct FileLock {
    #[cfg(unix)]
    _file: nix::fcntl::Flock<std::fs::File>,
    #[cfg(not(unix))]
    _file: std::fs::File,
}

impl FileLock {
    async fn acquire(path: &Path, access: Access) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory: {}", parent.display()))?;
        }
        let lock_path = path.to_path_buf();
        let file = tokio::time::timeout(
            LOCK_TIMEOUT,
            tokio::task::spawn_blocking(move || lock_file(&lock_path, access)),
        )
        .await
        .map_err(|_| anyhow::anyhow!("timed out waiting for records lock: {}", path.display()))?
        .context("records lock task failed")??;
        tracing::debug!(path = %path.display(), ?access, "records lock acquired");
        Ok(Self { _file: file })
    }
}

#[cfg(unix)]
fn lock_file(path: &Path, access: Access) -> Result<nix::fcntl::Flock<std::fs::File>> {
    use nix::fcntl::{Flock, FlockArg};

    let file = open_lock_file(path)?;
    let arg = match access {
        Access::Read => FlockArg::LockShared,
        Access::Write => FlockArg::LockExclusive,
    };
    Flock::lock(file, arg).map_err(|(_file, e)| {
        anyhow::anyhow!("failed to acquire records lock {}: {e}", path.display())
    })
}

// Without flock, opening the file is the best available lock.
#[cfg(not(unix))]
fn lock_file(path: &Path, _access: Access) -> Result<std::fs::File> {
    open_lock_file(path)
}

fn open_lock_file(path: &Path) -> Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .with_context(|| format!("failed to open records lock: {}", path.display()))
}

fn lock_path(state_file: &Path) -> PathBuf {
    let mut name = state_file
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| "leadflow.json".into());
    name.push(".lock");
    state_file.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use leadflow_core::{Actor, EmployeeId, LeadId, Role};
    use leadflow_engine::{Employee, EngineConfig, EngineError, LeadEngine, LeadInput, LeadStore};

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn no_url_means_file_mode() {
        assert!(DbSettings::from_lookup(lookup(&[])).is_none());
        assert!(DbSettings::from_lookup(lookup(&[("DATABASE_URL", "  ")])).is_none());
    }

    #[test]
    fn debug_redacts_url() {
        let settings = DbSettings::from_lookup(lookup(&[(
            "DATABASE_URL",
            "postgres://crm:hunter2@db/leads",
        )]))
        .unwrap();
        let debug = format!("{settings:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("hunter2"));
        assert_eq!(settings.max_connections, 5);
    }

    #[test]
    fn pool_overrides_are_read() {
        let settings = DbSettings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://db/leads"),
            ("LEADFLOW_DB_MAX_CONNECTIONS", "12"),
            ("LEADFLOW_DB_ACQUIRE_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(settings.max_connections, 12);
        assert_eq!(settings.acquire_timeout_secs, 30);
    }

    #[tokio::test]
    async fn file_backend_round_trips_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadflow.json");
        let mut backend = Backend::open_file(&path, Access::Write).await.unwrap();
        let loaded = backend.load().await.unwrap();
        assert_eq!(loaded, Snapshot::default());
        backend.save(&loaded, &Snapshot::default()).await.unwrap();
        assert!(backend.to_string().starts_with("file "));
        backend.finish().await.unwrap();
        assert!(path.exists());
        assert!(dir.path().join("leadflow.json.lock").exists());
    }

    #[test]
    fn lock_file_sits_next_to_snapshot() {
        assert_eq!(
            lock_path(Path::new("/var/lib/crm/state.json")),
            PathBuf::from("/var/lib/crm/state.json.lock")
        );
    }

    struct Seeded {
        path: PathBuf,
        lead: LeadId,
        admin: Actor,
        first: EmployeeId,
        second: EmployeeId,
    }

    fn seed(dir: &Path) -> Seeded {
        let engine = LeadEngine::new(LeadStore::new(), EngineConfig::default());
        let admin = engine
            .bootstrap_admin(Employee::new("Admin", Role::Admin, None))
            .unwrap();
        let admin = Actor::new(admin.id, admin.role);
        let first = engine
            .register_employee(Employee::new("Asha", Role::Employee, None), &admin)
            .unwrap();
        let second = engine
            .register_employee(Employee::new("Bilal", Role::Employee, None), &admin)
            .unwrap();
        let lead = engine
            .from_website(LeadInput::new("Chitra", "9833333333"), None)
            .unwrap();
        let path = dir.join("leadflow.json");
        crate::snapshot_file::save(&path, &engine.store().snapshot()).unwrap();
        Seeded {
            path,
            lead: lead.id,
            admin,
            first: first.id,
            second: second.id,
        }
    }

    /// One CLI run: lock, load, assign, save on success, unlock.
    async fn assign_run(
        path: PathBuf,
        lead: LeadId,
        employee: EmployeeId,
        actor: Actor,
    ) -> Result<(), EngineError> {
        let mut backend = Backend::open_file(&path, Access::Write).await.unwrap();
        let loaded = backend.load().await.unwrap();
        let store = LeadStore::from_snapshot(loaded.clone()).unwrap();
        let engine = LeadEngine::new(store, EngineConfig::default());
        let result = engine.assign(&lead, &employee, &actor, None).map(|_| ());
        if result.is_ok() {
            backend
                .save(&loaded, &engine.store().snapshot())
                .await
                .unwrap();
        }
        backend.finish().await.unwrap();
        result
    }

    #[tokio::test]
    async fn concurrent_runs_assign_a_lead_once() {
        let dir = tempfile::tempdir().unwrap();
        let s = seed(dir.path());

        // The first run holds the lock while the second one starts.
        let mut first = Backend::open_file(&s.path, Access::Write).await.unwrap();
        let second = tokio::spawn(assign_run(s.path.clone(), s.lead, s.second, s.admin));
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!second.is_finished());

        let loaded = first.load().await.unwrap();
        let engine = LeadEngine::new(
            LeadStore::from_snapshot(loaded.clone()).unwrap(),
            EngineConfig::default(),
        );
        engine.assign(&s.lead, &s.first, &s.admin, None).unwrap();
        first
            .save(&loaded, &engine.store().snapshot())
            .await
            .unwrap();
        first.finish().await.unwrap();

        let err = second.await.unwrap().unwrap_err();
        assert!(matches!(err, EngineError::AlreadyAssigned { .. }));

        let stored = LeadStore::from_snapshot(crate::snapshot_file::load(&s.path).unwrap()).unwrap();
        let engine = LeadEngine::new(stored, EngineConfig::default());
        let assignment = engine.assignment_for_lead(&s.lead).unwrap();
        assert_eq!(assignment.employee_id, s.first);
        assert_eq!(engine.get_timeline(&s.lead).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn writes_from_both_runs_survive() {
        let dir = tempfile::tempdir().unwrap();
        let s = seed(dir.path());

        let mut first = Backend::open_file(&s.path, Access::Write).await.unwrap();
        let second = tokio::spawn({
            let path = s.path.clone();
            let admin = s.admin;
            async move {
                let mut backend = Backend::open_file(&path, Access::Write).await.unwrap();
                let loaded = backend.load().await.unwrap();
                let engine = LeadEngine::new(
                    LeadStore::from_snapshot(loaded.clone()).unwrap(),
                    EngineConfig::default(),
                );
                engine
                    .register_employee(Employee::new("Divya", Role::Employee, None), &admin)
                    .unwrap();
                backend
                    .save(&loaded, &engine.store().snapshot())
                    .await
                    .unwrap();
                backend.finish().await.unwrap();
            }
        });

        let loaded = first.load().await.unwrap();
        let engine = LeadEngine::new(
            LeadStore::from_snapshot(loaded.clone()).unwrap(),
            EngineConfig::default(),
        );
        let lead = engine
            .from_website(LeadInput::new("Esha", "9822222222"), None)
            .unwrap();
        first
            .save(&loaded, &engine.store().snapshot())
            .await
            .unwrap();
        first.finish().await.unwrap();
        second.await.unwrap();

        let stored = crate::snapshot_file::load(&s.path).unwrap();
        assert!(stored.leads.iter().any(|l| l.id == lead.id));
        assert!(stored.employees.iter().any(|e| e.name == "Divya"));
    }

    #[tokio::test]
    async fn readers_share_the_lock() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leadflow.json");
        let a = Backend::open_file(&path, Access::Read).await.unwrap();
        let b = tokio::time::timeout(
            Duration::from_secs(5),
            Backend::open_file(&path, Access::Read),
        )
        .await
        .unwrap()
        .unwrap();
        a.finish().await.unwrap();
        b.finish().await.unwrap();
    }
}
