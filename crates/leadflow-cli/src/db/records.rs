//! Comment, disbursement and closed-case persistence.
//!
//! Rows in these tables are written once. Saving a row that already exists
//! is a no-op.

use chrono::{DateTime, Utc};
use leadflow_core::{
    Amount, AssignmentId, CloseId, CommentId, DisbursementId, EmployeeId, LeadId, Timestamp,
};
use leadflow_engine::{CloseLead, Disbursement, LeadComment};
use sqlx::PgConnection;
use uuid::Uuid;

use super::decode_name;

pub async fn insert_comment(conn: &mut PgConnection, comment: &LeadComment) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO lead_comments (id, assignment_id, lead_id, author_id, text, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(*comment.id.as_uuid())
    .bind(*comment.assignment_id.as_uuid())
    .bind(*comment.lead_id.as_uuid())
    .bind(*comment.author_id.as_uuid())
    .bind(&comment.text)
    .bind(*comment.created_at.as_datetime())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_disbursement(
    conn: &mut PgConnection,
    disbursement: &Disbursement,
) -> Result<(), sqlx::Error> {
    let tranche_number = disbursement
        .tranche_number
        .map(i32::try_from)
        .transpose()
        .map_err(|e| sqlx::Error::Protocol(format!("tranche number out of range: {e}")))?;

    sqlx::query(
        "INSERT INTO disbursements (id, assignment_id, lead_id, amount, disbursement_type,
                                    tranche_number, notes, processed_by, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(*disbursement.id.as_uuid())
    .bind(*disbursement.assignment_id.as_uuid())
    .bind(*disbursement.lead_id.as_uuid())
    .bind(disbursement.amount.minor_units())
    .bind(disbursement.disbursement_type.as_str())
    .bind(tranche_number)
    .bind(&disbursement.notes)
    .bind(*disbursement.processed_by.as_uuid())
    .bind(*disbursement.created_at.as_datetime())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn insert_closure(conn: &mut PgConnection, closure: &CloseLead) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO close_leads (id, lead_id, name, contact, amount, outcome, close_message,
                                  close_reason, closed_by, closed_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
         ON CONFLICT (id) DO NOTHING",
    )
    .bind(*closure.id.as_uuid())
    .bind(*closure.lead_id.as_uuid())
    .bind(&closure.name)
    .bind(&closure.contact)
    .bind(closure.amount.map(|a| a.minor_units()))
    .bind(closure.outcome.as_str())
    .bind(&closure.close_message)
    .bind(&closure.close_reason)
    .bind(*closure.closed_by.as_uuid())
    .bind(*closure.closed_at.as_datetime())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn load_comments(conn: &mut PgConnection) -> Result<Vec<LeadComment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CommentRow>(
        "SELECT id, assignment_id, lead_id, author_id, text, created_at
         FROM lead_comments ORDER BY created_at, id",
    )
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(CommentRow::into_record).collect())
}

pub async fn load_disbursements(conn: &mut PgConnection) -> Result<Vec<Disbursement>, sqlx::Error> {
    let rows = sqlx::query_as::<_, DisbursementRow>(
        "SELECT id, assignment_id, lead_id, amount, disbursement_type, tranche_number, notes,
                processed_by, created_at
         FROM disbursements ORDER BY created_at, id",
    )
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(DisbursementRow::try_into_record).collect()
}

pub async fn load_closures(conn: &mut PgConnection) -> Result<Vec<CloseLead>, sqlx::Error> {
    let rows = sqlx::query_as::<_, CloseRow>(
        "SELECT id, lead_id, name, contact, amount, outcome, close_message, close_reason,
                closed_by, closed_at
         FROM close_leads ORDER BY closed_at, id",
    )
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(CloseRow::try_into_record).collect()
}

#[derive(sqlx::FromRow)]
struct CommentRow {
    id: Uuid,
    assignment_id: Uuid,
    lead_id: Uuid,
    author_id: Uuid,
    text: String,
    created_at: DateTime<Utc>,
}

impl CommentRow {
    fn into_record(self) -> LeadComment {
        LeadComment {
            id: CommentId::from_uuid(self.id),
            assignment_id: AssignmentId::from_uuid(self.assignment_id),
            lead_id: LeadId::from_uuid(self.lead_id),
            author_id: EmployeeId::from_uuid(self.author_id),
            text: self.text,
            created_at: Timestamp::from_utc(self.created_at),
        }
    }
}

#[derive(sqlx::FromRow)]
struct DisbursementRow {
    id: Uuid,
    assignment_id: Uuid,
    lead_id: Uuid,
    amount: i64,
    disbursement_type: String,
    tranche_number: Option<i32>,
    notes: Option<String>,
    processed_by: Uuid,
    created_at: DateTime<Utc>,
}

impl DisbursementRow {
    fn try_into_record(self) -> Result<Disbursement, sqlx::Error> {
        let tranche_number = self
            .tranche_number
            .map(u32::try_from)
            .transpose()
            .map_err(|e| sqlx::Error::Decode(format!("invalid tranche_number: {e}").into()))?;
        Ok(Disbursement {
            id: DisbursementId::from_uuid(self.id),
            assignment_id: AssignmentId::from_uuid(self.assignment_id),
            lead_id: LeadId::from_uuid(self.lead_id),
            amount: Amount::from_minor(self.amount),
            disbursement_type: decode_name("disbursement_type", &self.disbursement_type)?,
            tranche_number,
            notes: self.notes,
            processed_by: EmployeeId::from_uuid(self.processed_by),
            created_at: Timestamp::from_utc(self.created_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct CloseRow {
    id: Uuid,
    lead_id: Uuid,
    name: String,
    contact: String,
    amount: Option<i64>,
    outcome: String,
    close_message: String,
    close_reason: Option<String>,
    closed_by: Uuid,
    closed_at: DateTime<Utc>,
}

impl CloseRow {
    fn try_into_record(self) -> Result<CloseLead, sqlx::Error> {
        Ok(CloseLead {
            id: CloseId::from_uuid(self.id),
            lead_id: LeadId::from_uuid(self.lead_id),
            name: self.name,
            contact: self.contact,
            amount: self.amount.map(Amount::from_minor),
            outcome: decode_name("close outcome", &self.outcome)?,
            close_message: self.close_message,
            close_reason: self.close_reason,
            closed_by: EmployeeId::from_uuid(self.closed_by),
            closed_at: Timestamp::from_utc(self.closed_at),
        })
    }
}
