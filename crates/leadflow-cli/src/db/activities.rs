//! Activity log persistence.
//!
//! The `lead_activities` table is append-only. Entries are inserted once
//! with their chain digests as hex text and never updated; a row only
//! disappears when its lead is purged.

use chrono::{DateTime, Utc};
use leadflow_core::{ActivityId, ContentDigest, EmployeeId, LeadId, Timestamp};
use leadflow_engine::LeadActivity;
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode_json, decode_name, encode_json};

/// Append one activity. Returns the number of rows written: 0 if the
/// entry was already stored.
pub async fn insert(conn: &mut PgConnection, activity: &LeadActivity) -> Result<u64, sqlx::Error> {
    let sequence = i64::try_from(activity.sequence)
        .map_err(|e| sqlx::Error::Protocol(format!("activity sequence out of range: {e}")))?;
    let data = encode_json("activity data", &activity.data)?;

    let result = sqlx::query(
        "INSERT INTO lead_activities (id, lead_id, sequence, employee_id, kind, description,
                                      data, created_at, previous_digest, digest)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(*activity.id.as_uuid())
    .bind(*activity.lead_id.as_uuid())
    .bind(sequence)
    .bind(activity.employee_id.map(|e| *e.as_uuid()))
    .bind(activity.kind.as_str())
    .bind(&activity.description)
    .bind(&data)
    .bind(*activity.created_at.as_datetime())
    .bind(activity.previous_digest.to_hex())
    .bind(activity.digest.to_hex())
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}

/// Load every activity in commit order.
pub async fn load_all(conn: &mut PgConnection) -> Result<Vec<LeadActivity>, sqlx::Error> {
    let rows = sqlx::query_as::<_, ActivityRow>(
        "SELECT id, lead_id, sequence, employee_id, kind, description, data, created_at,
                previous_digest, digest
         FROM lead_activities ORDER BY sequence",
    )
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(ActivityRow::try_into_record).collect()
}

#[derive(sqlx::FromRow)]
struct ActivityRow {
    id: Uuid,
    lead_id: Uuid,
    sequence: i64,
    employee_id: Option<Uuid>,
    kind: String,
    description: String,
    data: serde_json::Value,
    created_at: DateTime<Utc>,
    previous_digest: String,
    digest: String,
}

fn decode_digest(column: &str, hex: &str) -> Result<ContentDigest, sqlx::Error> {
    ContentDigest::from_hex(hex)
        .ok_or_else(|| sqlx::Error::Decode(format!("invalid {column}: {hex:?}").into()))
}

impl ActivityRow {
    fn try_into_record(self) -> Result<LeadActivity, sqlx::Error> {
        let sequence = u64::try_from(self.sequence)
            .map_err(|e| sqlx::Error::Decode(format!("invalid activity sequence: {e}").into()))?;
        Ok(LeadActivity {
            id: ActivityId::from_uuid(self.id),
            lead_id: LeadId::from_uuid(self.lead_id),
            sequence,
            employee_id: self.employee_id.map(EmployeeId::from_uuid),
            kind: decode_name("activity kind", &self.kind)?,
            description: self.description,
            data: decode_json("activity data", self.data)?,
            created_at: Timestamp::from_utc(self.created_at),
            previous_digest: decode_digest("previous_digest", &self.previous_digest)?,
            digest: decode_digest("digest", &self.digest)?,
        })
    }
}
