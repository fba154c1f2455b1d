//! Employee, lead and assignment persistence.
//!
//! These three tables are mutable: each save upserts every row by id.

use chrono::{DateTime, Utc};
use leadflow_core::{Amount, AssignmentId, EmployeeId, LeadId, TeamId, Timestamp};
use leadflow_engine::{Employee, Lead, LeadAssignment};
use sqlx::PgConnection;
use uuid::Uuid;

use super::{decode_json, decode_name, encode_json};

pub async fn upsert_employee(conn: &mut PgConnection, employee: &Employee) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO employees (id, name, role, team_id, active)
         VALUES ($1, $2, $3, $4, $5)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name, role = EXCLUDED.role,
            team_id = EXCLUDED.team_id, active = EXCLUDED.active",
    )
    .bind(*employee.id.as_uuid())
    .bind(&employee.name)
    .bind(employee.role.as_str())
    .bind(employee.team.map(|t| *t.as_uuid()))
    .bind(employee.active)
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn upsert_lead(conn: &mut PgConnection, lead: &Lead) -> Result<(), sqlx::Error> {
    let source_details = encode_json("lead source_details", &lead.source_details)?;

    sqlx::query(
        "INSERT INTO leads (id, name, contact, email, city, loan_amount, loan_type, occupation,
                            has_existing_loans, source, source_details, notes, state, priority,
                            created_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
         ON CONFLICT (id) DO UPDATE SET
            name = EXCLUDED.name, contact = EXCLUDED.contact, email = EXCLUDED.email,
            city = EXCLUDED.city, loan_amount = EXCLUDED.loan_amount,
            loan_type = EXCLUDED.loan_type, occupation = EXCLUDED.occupation,
            has_existing_loans = EXCLUDED.has_existing_loans, notes = EXCLUDED.notes,
            state = EXCLUDED.state, priority = EXCLUDED.priority,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(*lead.id.as_uuid())
    .bind(&lead.name)
    .bind(&lead.contact)
    .bind(&lead.email)
    .bind(&lead.city)
    .bind(lead.loan_amount.map(|a| a.minor_units()))
    .bind(&lead.loan_type)
    .bind(&lead.occupation)
    .bind(lead.has_existing_loans)
    .bind(lead.source().as_str())
    .bind(&source_details)
    .bind(&lead.notes)
    .bind(lead.state.as_str())
    .bind(lead.priority.as_str())
    .bind(*lead.created_at.as_datetime())
    .bind(*lead.updated_at.as_datetime())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn upsert_assignment(
    conn: &mut PgConnection,
    assignment: &LeadAssignment,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO lead_assignments (id, lead_id, employee_id, assigned_by, status, is_doable,
                                       pd_loan_amount, approved_loan_amount, close_type, notes,
                                       assigned_at, updated_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
         ON CONFLICT (id) DO UPDATE SET
            employee_id = EXCLUDED.employee_id, status = EXCLUDED.status,
            is_doable = EXCLUDED.is_doable, pd_loan_amount = EXCLUDED.pd_loan_amount,
            approved_loan_amount = EXCLUDED.approved_loan_amount,
            close_type = EXCLUDED.close_type, notes = EXCLUDED.notes,
            updated_at = EXCLUDED.updated_at",
    )
    .bind(*assignment.id.as_uuid())
    .bind(*assignment.lead_id.as_uuid())
    .bind(*assignment.employee_id.as_uuid())
    .bind(*assignment.assigned_by.as_uuid())
    .bind(assignment.status.as_str())
    .bind(assignment.is_doable)
    .bind(assignment.pd_loan_amount.map(|a| a.minor_units()))
    .bind(assignment.approved_loan_amount.map(|a| a.minor_units()))
    .bind(assignment.close_type.map(|c| c.as_str()))
    .bind(&assignment.notes)
    .bind(*assignment.assigned_at.as_datetime())
    .bind(*assignment.updated_at.as_datetime())
    .execute(&mut *conn)
    .await?;
    Ok(())
}

pub async fn load_employees(conn: &mut PgConnection) -> Result<Vec<Employee>, sqlx::Error> {
    let rows = sqlx::query_as::<_, EmployeeRow>(
        "SELECT id, name, role, team_id, active FROM employees ORDER BY name, id",
    )
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(EmployeeRow::try_into_record).collect()
}

pub async fn load_leads(conn: &mut PgConnection) -> Result<Vec<Lead>, sqlx::Error> {
    let rows = sqlx::query_as::<_, LeadRow>(
        "SELECT id, name, contact, email, city, loan_amount, loan_type, occupation,
                has_existing_loans, source_details, notes, state, priority, created_at, updated_at
         FROM leads ORDER BY created_at, id",
    )
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(LeadRow::try_into_record).collect()
}

pub async fn load_assignments(conn: &mut PgConnection) -> Result<Vec<LeadAssignment>, sqlx::Error> {
    let rows = sqlx::query_as::<_, AssignmentRow>(
        "SELECT id, lead_id, employee_id, assigned_by, status, is_doable, pd_loan_amount,
                approved_loan_amount, close_type, notes, assigned_at, updated_at
         FROM lead_assignments ORDER BY assigned_at, id",
    )
    .fetch_all(&mut *conn)
    .await?;
    rows.into_iter().map(AssignmentRow::try_into_record).collect()
}

#[derive(sqlx::FromRow)]
struct EmployeeRow {
    id: Uuid,
    name: String,
    role: String,
    team_id: Option<Uuid>,
    active: bool,
}

impl EmployeeRow {
    fn try_into_record(self) -> Result<Employee, sqlx::Error> {
        Ok(Employee {
            id: EmployeeId::from_uuid(self.id),
            name: self.name,
            role: decode_name("employee role", &self.role)?,
            team: self.team_id.map(TeamId::from_uuid),
            active: self.active,
        })
    }
}

#[derive(sqlx::FromRow)]
struct LeadRow {
    id: Uuid,
    name: String,
    contact: String,
    email: Option<String>,
    city: Option<String>,
    loan_amount: Option<i64>,
    loan_type: Option<String>,
    occupation: Option<String>,
    has_existing_loans: Option<bool>,
    source_details: serde_json::Value,
    notes: Option<String>,
    state: String,
    priority: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl LeadRow {
    fn try_into_record(self) -> Result<Lead, sqlx::Error> {
        Ok(Lead {
            id: LeadId::from_uuid(self.id),
            name: self.name,
            contact: self.contact,
            email: self.email,
            city: self.city,
            loan_amount: self.loan_amount.map(Amount::from_minor),
            loan_type: self.loan_type,
            occupation: self.occupation,
            has_existing_loans: self.has_existing_loans,
            source_details: decode_json("lead source_details", self.source_details)?,
            notes: self.notes,
            state: decode_name("lead state", &self.state)?,
            priority: decode_name("lead priority", &self.priority)?,
            created_at: Timestamp::from_utc(self.created_at),
            updated_at: Timestamp::from_utc(self.updated_at),
        })
    }
}

#[derive(sqlx::FromRow)]
struct AssignmentRow {
    id: Uuid,
    lead_id: Uuid,
    employee_id: Uuid,
    assigned_by: Uuid,
    status: String,
    is_doable: bool,
    pd_loan_amount: Option<i64>,
    approved_loan_amount: Option<i64>,
    close_type: Option<String>,
    notes: Option<String>,
    assigned_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AssignmentRow {
    fn try_into_record(self) -> Result<LeadAssignment, sqlx::Error> {
        let close_type = self
            .close_type
            .as_deref()
            .map(|c| decode_name("assignment close_type", c))
            .transpose()?;
        Ok(LeadAssignment {
            id: AssignmentId::from_uuid(self.id),
            lead_id: LeadId::from_uuid(self.lead_id),
            employee_id: EmployeeId::from_uuid(self.employee_id),
            assigned_by: EmployeeId::from_uuid(self.assigned_by),
            status: decode_name("assignment status", &self.status)?,
            is_doable: self.is_doable,
            pd_loan_amount: self.pd_loan_amount.map(Amount::from_minor),
            approved_loan_amount: self.approved_loan_amount.map(Amount::from_minor),
            close_type,
            notes: self.notes,
            assigned_at: Timestamp::from_utc(self.assigned_at),
            updated_at: Timestamp::from_utc(self.updated_at),
        })
    }
}
