//! # Database Persistence Layer
//!
//! PostgreSQL persistence for the lead record set via SQLx.
//!
//! The database is optional. When `DATABASE_URL` is set, the CLI opens one
//! transaction holding an advisory lock, loads the record set into a
//! [`LeadStore`](leadflow_engine::LeadStore), runs the command, writes the
//! changes back and commits. When absent, it uses a JSON snapshot file
//! instead.
//!
//! Workflow rules are enforced by the engine, not in SQL. The tables only
//! hold what the engine committed:
//!
//! - `employees`, `leads`, `lead_assignments` are upserted.
//! - `lead_comments`, `disbursements`, `close_leads` and `lead_activities`
//!   are insert-only; an existing row is never rewritten.
//! - A lead purged by the run is deleted and its dependents go with it through
//!   `ON DELETE CASCADE`. Closed-case snapshots have no foreign key and
//!   stay.

pub mod activities;
pub mod leads;
pub mod records;

use std::collections::HashSet;

use leadflow_core::{CommentId, LeadId};
use leadflow_engine::Snapshot;
use serde::de::DeserializeOwned;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{PgConnection, Postgres, Transaction};
use uuid::Uuid;

use crate::backend::DbSettings;

/// Initialize the database connection pool and run migrations.
///
/// Returns `None` if `DATABASE_URL` is not set (snapshot file mode).
/// Returns `Err` if the URL is set but the connection or migration fails.
pub async fn init_pool() -> Result<Option<PgPool>, sqlx::Error> {
    let Some(settings) = DbSettings::from_env() else {
        tracing::debug!("DATABASE_URL not set; using the snapshot file");
        return Ok(None);
    };

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(1)
        .acquire_timeout(std::time::Duration::from_secs(settings.acquire_timeout_secs))
        .connect(settings.url())
        .await?;

    tracing::info!("Connected to PostgreSQL");

    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database migrations applied");

    Ok(Some(pool))
}

/// Key of the advisory lock that serializes CLI runs against one database.
const RECORDS_LOCK_KEY: i64 = 0x6c65_6164_666c_6f77;

/// Open a transaction holding the records lock until commit or rollback.
///
/// Writers take the lock exclusively, readers share it, so a writer's
/// load, command and save never interleave with another run.
pub async fn begin_locked(
    pool: &PgPool,
    exclusive: bool,
) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    let lock = if exclusive {
        "SELECT pg_advisory_xact_lock($1)"
    } else {
        "SELECT pg_advisory_xact_lock_shared($1)"
    };
    sqlx::query(lock)
        .bind(RECORDS_LOCK_KEY)
        .execute(&mut *tx)
        .await?;
    tracing::debug!(exclusive, "records lock acquired");
    Ok(tx)
}

/// Read every table into a snapshot.
pub async fn load_snapshot(conn: &mut PgConnection) -> Result<Snapshot, sqlx::Error> {
    let snapshot = Snapshot {
        employees: leads::load_employees(conn).await?,
        leads: leads::load_leads(conn).await?,
        assignments: leads::load_assignments(conn).await?,
        comments: records::load_comments(conn).await?,
        disbursements: records::load_disbursements(conn).await?,
        closures: records::load_closures(conn).await?,
        activities: activities::load_all(conn).await?,
    };
    tracing::debug!(
        leads = snapshot.leads.len(),
        activities = snapshot.activities.len(),
        "snapshot loaded from database"
    );
    Ok(snapshot)
}

/// Leads and comments present when a run loaded its records and gone when
/// it saved them.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Removed {
    pub leads: Vec<Uuid>,
    pub comments: Vec<Uuid>,
}

impl Removed {
    pub fn between(loaded: &Snapshot, current: &Snapshot) -> Self {
        let kept_leads: HashSet<LeadId> = current.leads.iter().map(|l| l.id).collect();
        let kept_comments: HashSet<CommentId> = current.comments.iter().map(|c| c.id).collect();
        Self {
            leads: loaded
                .leads
                .iter()
                .filter(|l| !kept_leads.contains(&l.id))
                .map(|l| *l.id.as_uuid())
                .collect(),
            comments: loaded
                .comments
                .iter()
                .filter(|c| !kept_comments.contains(&c.id))
                .map(|c| *c.id.as_uuid())
                .collect(),
        }
    }
}

/// Write the changes a run made since `loaded` on the run's connection.
///
/// Only leads and comments this run purged or deleted are removed; rows
/// written by anyone else are left alone. Activities are insert-only.
pub async fn save_snapshot(
    conn: &mut PgConnection,
    loaded: &Snapshot,
    current: &Snapshot,
) -> Result<(), sqlx::Error> {
    let removed = Removed::between(loaded, current);
    let removed_leads = if removed.leads.is_empty() {
        0
    } else {
        sqlx::query("DELETE FROM leads WHERE id = ANY($1)")
            .bind(&removed.leads)
            .execute(&mut *conn)
            .await?
            .rows_affected()
    };
    let removed_comments = if removed.comments.is_empty() {
        0
    } else {
        sqlx::query("DELETE FROM lead_comments WHERE id = ANY($1)")
            .bind(&removed.comments)
            .execute(&mut *conn)
            .await?
            .rows_affected()
    };

    for employee in &current.employees {
        leads::upsert_employee(conn, employee).await?;
    }
    for lead in &current.leads {
        leads::upsert_lead(conn, lead).await?;
    }
    for assignment in &current.assignments {
        leads::upsert_assignment(conn, assignment).await?;
    }
    for comment in &current.comments {
        records::insert_comment(conn, comment).await?;
    }
    for disbursement in &current.disbursements {
        records::insert_disbursement(conn, disbursement).await?;
    }
    for closure in &current.closures {
        records::insert_closure(conn, closure).await?;
    }
    let mut appended = 0;
    for activity in &current.activities {
        appended += activities::insert(conn, activity).await?;
    }

    tracing::info!(
        removed_leads,
        removed_comments,
        appended_activities = appended,
        "snapshot saved to database"
    );
    Ok(())
}

/// Decode a TEXT column holding a snake_case enum name.
fn decode_name<T: DeserializeOwned>(column: &str, value: &str) -> Result<T, sqlx::Error> {
    serde_json::from_value(serde_json::Value::String(value.to_string())).map_err(|e| {
        tracing::error!(column, value, error = %e, "unknown enum value in database");
        sqlx::Error::Decode(format!("invalid {column} {value:?}: {e}").into())
    })
}

/// Decode a JSONB column into its typed form.
fn decode_json<T: DeserializeOwned>(column: &str, value: serde_json::Value) -> Result<T, sqlx::Error> {
    serde_json::from_value(value).map_err(|e| {
        tracing::error!(column, error = %e, "malformed JSON document in database");
        sqlx::Error::Decode(format!("invalid {column}: {e}").into())
    })
}

/// Encode a typed value as a JSONB document.
fn encode_json<T: serde::Serialize>(column: &str, value: &T) -> Result<serde_json::Value, sqlx::Error> {
    serde_json::to_value(value).map_err(|e| {
        tracing::error!(column, error = %e, "failed to encode JSON document");
        sqlx::Error::Protocol(format!("failed to serialize {column}: {e}"))
    })
}
