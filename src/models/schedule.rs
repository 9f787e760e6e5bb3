use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::schedule::{EventFields, ScheduleEvent as DomainScheduleEvent};
use crate::domain::types::{
    CaseId, ClientId, CompanyId, EventId, EventTitle, TypeConstraintError, UserId,
};
use crate::domain::user::UserSummary;

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::schedule_events)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ScheduleEvent {
    pub id: i32,
    pub company_id: i32,
    pub title: String,
    pub description: Option<String>,
    pub event_type: String,
    pub priority: String,
    pub date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub client_id: Option<i32>,
    pub case_id: Option<i32>,
    pub google_meet_link: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::schedule_events)]
pub struct NewScheduleEvent<'a> {
    pub company_id: i32,
    pub created_by: Option<i32>,
    #[diesel(embed)]
    pub fields: EventChangeset<'a>,
}

/// Editable event columns. `updated_at` is bumped separately on update.
#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::schedule_events)]
#[diesel(treat_none_as_null = true)]
pub struct EventChangeset<'a> {
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub event_type: &'a str,
    pub priority: &'a str,
    pub date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub client_id: Option<i32>,
    pub case_id: Option<i32>,
    pub google_meet_link: Option<&'a str>,
}

#[derive(Debug, Clone, Insertable, Queryable)]
#[diesel(table_name = crate::schema::event_assignments)]
pub struct EventAssignment {
    pub event_id: i32,
    pub user_id: i32,
}

impl ScheduleEvent {
    pub fn into_domain(
        self,
        assigned_users: Vec<UserSummary>,
    ) -> Result<DomainScheduleEvent, TypeConstraintError> {
        Ok(DomainScheduleEvent {
            id: EventId::new(self.id)?,
            company_id: CompanyId::new(self.company_id)?,
            title: EventTitle::new(self.title)?,
            description: self.description,
            event_type: self.event_type.parse()?,
            priority: self.priority.parse()?,
            date: self.date,
            end_date: self.end_date,
            completed: self.completed,
            client_id: self.client_id.map(ClientId::new).transpose()?,
            case_id: self.case_id.map(CaseId::new).transpose()?,
            google_meet_link: self.google_meet_link,
            created_by: self.created_by.map(UserId::new).transpose()?,
            created_at: self.created_at,
            updated_at: self.updated_at,
            assigned_users,
        })
    }
}

impl<'a> From<&'a EventFields> for EventChangeset<'a> {
    fn from(fields: &'a EventFields) -> Self {
        Self {
            title: fields.title.as_str(),
            description: fields.description.as_deref(),
            event_type: fields.event_type.as_str(),
            priority: fields.priority.as_str(),
            date: fields.date,
            end_date: fields.end_date,
            completed: fields.completed,
            client_id: fields.client_id.map(ClientId::get),
            case_id: fields.case_id.map(CaseId::get),
            google_meet_link: fields.google_meet_link.as_deref(),
        }
    }
}
