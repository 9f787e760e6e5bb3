use std::collections::HashMap;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::db::DbConnection;
use crate::domain::schedule::{
    ConflictQuery, EventFields, EventType, NewScheduleEvent, ScheduleEvent, overlaps,
};
use crate::domain::types::{CaseId, CompanyId, EventId, UserId};
use crate::domain::user::UserSummary;
use crate::models::schedule::{
    EventAssignment, EventChangeset, NewScheduleEvent as DbNewScheduleEvent,
    ScheduleEvent as DbScheduleEvent,
};
use crate::models::user::UserSummary as DbUserSummary;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, EventListQuery, EventReader, EventWriter, like_pattern};
use crate::schema::{event_assignments, schedule_events, users};

fn load_assignees(
    conn: &mut DbConnection,
    event_ids: &[i32],
) -> RepositoryResult<HashMap<i32, Vec<UserSummary>>> {
    let mut grouped: HashMap<i32, Vec<UserSummary>> = HashMap::new();
    if event_ids.is_empty() {
        return Ok(grouped);
    }
    let rows = event_assignments::table
        .inner_join(users::table)
        .filter(event_assignments::event_id.eq_any(event_ids))
        .order(users::name.asc())
        .select((event_assignments::event_id, DbUserSummary::as_select()))
        .load::<(i32, DbUserSummary)>(conn)?;
    for (event_id, user) in rows {
        grouped
            .entry(event_id)
            .or_default()
            .push(UserSummary::try_from(user)?);
    }
    Ok(grouped)
}

fn with_assignees(
    conn: &mut DbConnection,
    rows: Vec<DbScheduleEvent>,
) -> RepositoryResult<Vec<ScheduleEvent>> {
    let ids: Vec<i32> = rows.iter().map(|event| event.id).collect();
    let mut assignees = load_assignees(conn, &ids)?;
    rows.into_iter()
        .map(|row| {
            let users = assignees.remove(&row.id).unwrap_or_default();
            Ok(row.into_domain(users)?)
        })
        .collect()
}

fn single(
    conn: &mut DbConnection,
    row: Option<DbScheduleEvent>,
) -> RepositoryResult<Option<ScheduleEvent>> {
    match row {
        Some(row) => Ok(with_assignees(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn replace_assignees(
    conn: &mut DbConnection,
    event_id: i32,
    user_ids: &[UserId],
) -> QueryResult<()> {
    diesel::delete(event_assignments::table.filter(event_assignments::event_id.eq(event_id)))
        .execute(conn)?;
    if user_ids.is_empty() {
        return Ok(());
    }
    let mut links: Vec<EventAssignment> = user_ids
        .iter()
        .map(|user_id| EventAssignment {
            event_id,
            user_id: user_id.get(),
        })
        .collect();
    links.sort_by_key(|link| link.user_id);
    links.dedup_by_key(|link| link.user_id);
    diesel::insert_into(event_assignments::table)
        .values(&links)
        .execute(conn)?;
    Ok(())
}

impl EventReader for DieselRepository {
    fn get_event_by_id(
        &self,
        id: EventId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<ScheduleEvent>> {
        let mut conn = self.conn()?;
        let row = schedule_events::table
            .filter(schedule_events::id.eq(id.get()))
            .filter(schedule_events::company_id.eq(company_id.get()))
            .first::<DbScheduleEvent>(&mut conn)
            .optional()?;
        single(&mut conn, row)
    }

    fn list_events(&self, query: EventListQuery) -> RepositoryResult<(usize, Vec<ScheduleEvent>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = schedule_events::table
                .filter(schedule_events::company_id.eq(query.company_id.get()))
                .into_boxed::<Sqlite>();

            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = like_pattern(term);
                items = items.filter(
                    schedule_events::title
                        .like(pattern.clone())
                        .or(schedule_events::description.like(pattern)),
                );
            }
            if let Some(event_type) = query.event_type {
                items = items.filter(schedule_events::event_type.eq(event_type.as_str()));
            }
            if let Some(completed) = query.completed {
                items = items.filter(schedule_events::completed.eq(completed));
            }
            if let Some(client_id) = query.client_id {
                items = items.filter(schedule_events::client_id.eq(client_id.get()));
            }
            if let Some(case_id) = query.case_id {
                items = items.filter(schedule_events::case_id.eq(case_id.get()));
            }
            if let Some(start) = query.start {
                items = items.filter(schedule_events::date.ge(start));
            }
            if let Some(end) = query.end {
                items = items.filter(schedule_events::date.le(end));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(schedule_events::date.asc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }
        let rows = items.load::<DbScheduleEvent>(&mut conn)?;

        Ok((total, with_assignees(&mut conn, rows)?))
    }

    fn find_conflicting_events(
        &self,
        query: &ConflictQuery,
    ) -> RepositoryResult<Vec<ScheduleEvent>> {
        if query.user_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn()?;
        let user_ids: Vec<i32> = query.user_ids.iter().map(|id| id.get()).collect();
        let assigned = event_assignments::table
            .filter(event_assignments::user_id.eq_any(user_ids))
            .select(event_assignments::event_id);

        let mut candidates = schedule_events::table
            .filter(schedule_events::company_id.eq(query.company_id.get()))
            .filter(schedule_events::completed.eq(false))
            .filter(schedule_events::date.le(query.end))
            .filter(
                schedule_events::date
                    .ge(query.start)
                    .or(schedule_events::end_date.gt(query.start)),
            )
            .filter(schedule_events::id.eq_any(assigned))
            .into_boxed::<Sqlite>();
        if let Some(excluded) = query.exclude_event {
            candidates = candidates.filter(schedule_events::id.ne(excluded.get()));
        }

        let rows: Vec<DbScheduleEvent> = candidates
            .order(schedule_events::date.asc())
            .load::<DbScheduleEvent>(&mut conn)?
            .into_iter()
            .filter(|event| overlaps(query.start, query.end, event.date, event.end_date))
            .collect();

        with_assignees(&mut conn, rows)
    }

    fn list_upcoming_events(
        &self,
        company_id: CompanyId,
        after: NaiveDateTime,
        limit: usize,
    ) -> RepositoryResult<Vec<ScheduleEvent>> {
        let mut conn = self.conn()?;
        let rows = schedule_events::table
            .filter(schedule_events::company_id.eq(company_id.get()))
            .filter(schedule_events::completed.eq(false))
            .filter(schedule_events::date.ge(after))
            .order(schedule_events::date.asc())
            .limit(limit as i64)
            .load::<DbScheduleEvent>(&mut conn)?;
        with_assignees(&mut conn, rows)
    }

    fn find_case_deadline_event(
        &self,
        company_id: CompanyId,
        case_id: CaseId,
    ) -> RepositoryResult<Option<ScheduleEvent>> {
        let mut conn = self.conn()?;
        let row = schedule_events::table
            .filter(schedule_events::company_id.eq(company_id.get()))
            .filter(schedule_events::case_id.eq(case_id.get()))
            .filter(schedule_events::event_type.eq(EventType::Prazo.as_str()))
            .order(schedule_events::created_at.desc())
            .first::<DbScheduleEvent>(&mut conn)
            .optional()?;
        single(&mut conn, row)
    }
}

impl EventWriter for DieselRepository {
    fn create_event(&self, event: &NewScheduleEvent) -> RepositoryResult<ScheduleEvent> {
        let mut conn = self.conn()?;
        let row = conn.transaction::<_, RepositoryError, _>(|conn| {
            let created: DbScheduleEvent = diesel::insert_into(schedule_events::table)
                .values(DbNewScheduleEvent {
                    company_id: event.company_id.get(),
                    created_by: event.created_by.map(UserId::get),
                    fields: EventChangeset::from(&event.fields),
                })
                .returning(DbScheduleEvent::as_returning())
                .get_result(conn)?;
            replace_assignees(conn, created.id, &event.fields.assigned_user_ids)?;
            Ok(created)
        })?;
        single(&mut conn, Some(row))?.ok_or(RepositoryError::NotFound)
    }

    fn update_event(
        &self,
        id: EventId,
        company_id: CompanyId,
        fields: &EventFields,
    ) -> RepositoryResult<ScheduleEvent> {
        let mut conn = self.conn()?;
        let row = conn.transaction::<_, RepositoryError, _>(|conn| {
            let target = schedule_events::table
                .filter(schedule_events::id.eq(id.get()))
                .filter(schedule_events::company_id.eq(company_id.get()));
            let updated: DbScheduleEvent = diesel::update(target)
                .set((
                    EventChangeset::from(fields),
                    schedule_events::updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(DbScheduleEvent::as_returning())
                .get_result(conn)?;
            replace_assignees(conn, updated.id, &fields.assigned_user_ids)?;
            Ok(updated)
        })?;
        single(&mut conn, Some(row))?.ok_or(RepositoryError::NotFound)
    }

    fn delete_event(&self, id: EventId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = schedule_events::table
            .filter(schedule_events::id.eq(id.get()))
            .filter(schedule_events::company_id.eq(company_id.get()));
        let affected = diesel::delete(target).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn set_event_completed(
        &self,
        id: EventId,
        company_id: CompanyId,
        completed: bool,
    ) -> RepositoryResult<ScheduleEvent> {
        let mut conn = self.conn()?;
        let target = schedule_events::table
            .filter(schedule_events::id.eq(id.get()))
            .filter(schedule_events::company_id.eq(company_id.get()));
        let updated: DbScheduleEvent = diesel::update(target)
            .set((
                schedule_events::completed.eq(completed),
                schedule_events::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbScheduleEvent::as_returning())
            .get_result(&mut conn)?;
        single(&mut conn, Some(updated))?.ok_or(RepositoryError::NotFound)
    }
}
