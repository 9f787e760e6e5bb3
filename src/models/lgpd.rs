use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::lgpd::{
    ConsentLog as DomainConsentLog, DataRequest as DomainDataRequest,
    NewConsentLog as DomainNewConsentLog, NewDataRequest as DomainNewDataRequest,
    RequestProcessing,
};
use crate::domain::types::{CompanyId, ConsentId, DataRequestId, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::consent_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ConsentLog {
    pub id: i32,
    pub user_id: Option<i32>,
    pub email: String,
    pub consent_type: String,
    pub version: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub consented_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::consent_logs)]
pub struct NewConsentLog<'a> {
    pub user_id: Option<i32>,
    pub email: &'a str,
    pub consent_type: &'a str,
    pub version: &'a str,
    pub ip: Option<&'a str>,
    pub user_agent: Option<&'a str>,
    pub consented_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::data_requests)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DataRequest {
    pub id: i32,
    pub user_id: i32,
    pub company_id: Option<i32>,
    pub request_type: String,
    pub status: String,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<i32>,
    pub processed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::data_requests)]
pub struct NewDataRequest<'a> {
    pub user_id: i32,
    pub company_id: Option<i32>,
    pub request_type: &'a str,
    pub description: Option<&'a str>,
}

/// Status transition written by an administrator.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::data_requests)]
#[diesel(treat_none_as_null = true)]
pub struct ProcessRequest<'a> {
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub rejection_reason: Option<&'a str>,
    pub processed_by: Option<i32>,
    pub processed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<ConsentLog> for DomainConsentLog {
    type Error = TypeConstraintError;

    fn try_from(row: ConsentLog) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ConsentId::new(row.id)?,
            user_id: row.user_id.map(UserId::new).transpose()?,
            email: row.email,
            consent_type: row.consent_type.parse()?,
            version: row.version,
            ip: row.ip,
            user_agent: row.user_agent,
            consented_at: row.consented_at,
            revoked_at: row.revoked_at,
        })
    }
}

impl TryFrom<DataRequest> for DomainDataRequest {
    type Error = TypeConstraintError;

    fn try_from(row: DataRequest) -> Result<Self, Self::Error> {
        Ok(Self {
            id: DataRequestId::new(row.id)?,
            user_id: UserId::new(row.user_id)?,
            company_id: row.company_id.map(CompanyId::new).transpose()?,
            request_type: row.request_type.parse()?,
            status: row.status.parse()?,
            description: row.description,
            notes: row.notes,
            rejection_reason: row.rejection_reason,
            processed_by: row.processed_by.map(UserId::new).transpose()?,
            processed_at: row.processed_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> NewConsentLog<'a> {
    pub fn new(consent: &'a DomainNewConsentLog, now: NaiveDateTime) -> Self {
        Self {
            user_id: consent.user_id.map(UserId::get),
            email: consent.email.as_str(),
            consent_type: consent.consent_type.as_str(),
            version: consent.version.as_str(),
            ip: consent.ip.as_deref(),
            user_agent: consent.user_agent.as_deref(),
            consented_at: now,
        }
    }
}

impl<'a> From<&'a DomainNewDataRequest> for NewDataRequest<'a> {
    fn from(request: &'a DomainNewDataRequest) -> Self {
        Self {
            user_id: request.user_id.get(),
            company_id: request.company_id.map(CompanyId::get),
            request_type: request.request_type.as_str(),
            description: request.description.as_deref(),
        }
    }
}

impl<'a> ProcessRequest<'a> {
    pub fn new(processing: &'a RequestProcessing, now: NaiveDateTime) -> Self {
        Self {
            status: processing.status.as_str(),
            notes: processing.notes.as_deref(),
            rejection_reason: processing.rejection_reason.as_deref(),
            processed_by: processing.processed_by.map(UserId::get),
            processed_at: processing.processed_at,
            completed_at: processing.completed_at,
            updated_at: now,
        }
    }
}
