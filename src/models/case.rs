use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::case::{
    Case as DomainCase, CaseMovement as DomainCaseMovement, NewCaseMovement as DomainNewMovement,
    UpdateCase as DomainUpdateCase,
};
use crate::domain::types::{
    CaseId, CaseMovementId, ClientId, CompanyId, TypeConstraintError, UserId,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::cases)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Case {
    pub id: i32,
    pub company_id: i32,
    pub client_id: i32,
    pub process_number: String,
    pub court: Option<String>,
    pub subject: Option<String>,
    pub value_cents: Option<i64>,
    pub status: String,
    pub notes: Option<String>,
    pub informar_cliente: Option<String>,
    pub ultimo_andamento: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub deadline_responsible_id: Option<i32>,
    pub deadline_completed: bool,
    pub deadline_completed_at: Option<NaiveDateTime>,
    pub last_synced_at: Option<NaiveDateTime>,
    pub last_acknowledged_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::cases)]
pub struct NewCase<'a> {
    pub company_id: i32,
    pub client_id: i32,
    pub process_number: &'a str,
    pub court: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub value_cents: Option<i64>,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub informar_cliente: Option<&'a str>,
    pub ultimo_andamento: Option<&'a str>,
    pub deadline: Option<NaiveDateTime>,
    pub deadline_responsible_id: Option<i32>,
    pub last_synced_at: Option<NaiveDateTime>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::cases)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateCase<'a> {
    pub client_id: i32,
    pub process_number: &'a str,
    pub court: Option<&'a str>,
    pub subject: Option<&'a str>,
    pub value_cents: Option<i64>,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub informar_cliente: Option<&'a str>,
    pub deadline: Option<NaiveDateTime>,
    pub deadline_responsible_id: Option<i32>,
    pub deadline_completed: bool,
    pub deadline_completed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::case_movements)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CaseMovement {
    pub id: i32,
    pub case_id: i32,
    pub code: i32,
    pub name: String,
    pub movement_date: NaiveDateTime,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::case_movements)]
pub struct NewCaseMovement<'a> {
    pub case_id: i32,
    pub code: i32,
    pub name: &'a str,
    pub movement_date: NaiveDateTime,
    pub description: Option<&'a str>,
}

impl TryFrom<Case> for DomainCase {
    type Error = TypeConstraintError;

    fn try_from(row: Case) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CaseId::new(row.id)?,
            company_id: CompanyId::new(row.company_id)?,
            client_id: ClientId::new(row.client_id)?,
            process_number: row.process_number,
            court: row.court,
            subject: row.subject,
            value_cents: row.value_cents,
            status: row.status.parse()?,
            notes: row.notes,
            informar_cliente: row.informar_cliente,
            ultimo_andamento: row.ultimo_andamento,
            deadline: row.deadline,
            deadline_responsible_id: row.deadline_responsible_id.map(UserId::new).transpose()?,
            deadline_completed: row.deadline_completed,
            deadline_completed_at: row.deadline_completed_at,
            last_synced_at: row.last_synced_at,
            last_acknowledged_at: row.last_acknowledged_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<CaseMovement> for DomainCaseMovement {
    type Error = TypeConstraintError;

    fn try_from(row: CaseMovement) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CaseMovementId::new(row.id)?,
            case_id: CaseId::new(row.case_id)?,
            code: row.code,
            name: row.name,
            movement_date: row.movement_date,
            description: row.description,
            created_at: row.created_at,
        })
    }
}

impl<'a> NewCaseMovement<'a> {
    pub fn new(case_id: CaseId, movement: &'a DomainNewMovement) -> Self {
        Self {
            case_id: case_id.get(),
            code: movement.code,
            name: movement.name.as_str(),
            movement_date: movement.movement_date,
            description: movement.description.as_deref(),
        }
    }
}

impl<'a> UpdateCase<'a> {
    pub fn new(case: &'a DomainUpdateCase, now: NaiveDateTime) -> Self {
        Self {
            client_id: case.client_id.get(),
            process_number: case.process_number.as_str(),
            court: case.court.as_deref(),
            subject: case.subject.as_deref(),
            value_cents: case.value_cents,
            status: case.status.as_str(),
            notes: case.notes.as_deref(),
            informar_cliente: case.informar_cliente.as_deref(),
            deadline: case.deadline,
            deadline_responsible_id: case.deadline_responsible_id.map(UserId::get),
            deadline_completed: case.deadline_completed,
            deadline_completed_at: case.deadline_completed_at,
            updated_at: now,
        }
    }
}
