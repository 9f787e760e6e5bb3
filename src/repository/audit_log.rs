use chrono::NaiveDateTime;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::audit_log::{AuditLog, NewAuditLog};
use crate::domain::types::CompanyId;
use crate::domain::user::UserSummary;
use crate::models::audit_log::{AuditLog as DbAuditLog, NewAuditLog as DbNewAuditLog};
use crate::models::user::UserSummary as DbUserSummary;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    AuditLogQuery, AuditLogReader, AuditLogWriter, DieselRepository, like_pattern,
};
use crate::schema::{audit_logs, users};

impl AuditLogReader for DieselRepository {
    fn list_audit_logs(&self, query: AuditLogQuery) -> RepositoryResult<(usize, Vec<AuditLog>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = audit_logs::table
                .filter(audit_logs::company_id.eq(query.company_id.get()))
                .into_boxed::<Sqlite>();

            if let Some(entity_type) = query.entity_type {
                items = items.filter(audit_logs::entity_type.eq(entity_type.as_str()));
            }
            if let Some(entity_id) = query.entity_id {
                items = items.filter(audit_logs::entity_id.eq(entity_id));
            }
            if let Some(action) = query.action {
                items = items.filter(audit_logs::action.eq(action.as_str()));
            }
            if let Some(user_id) = query.user_id {
                items = items.filter(audit_logs::user_id.eq(user_id.get()));
            }
            if let Some(start) = query.start {
                items = items.filter(audit_logs::created_at.ge(start));
            }
            if let Some(end) = query.end {
                items = items.filter(audit_logs::created_at.le(end));
            }
            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = like_pattern(term);
                items = items.filter(
                    audit_logs::entity_name
                        .like(pattern.clone())
                        .or(audit_logs::user_name.like(pattern.clone()))
                        .or(audit_logs::description.like(pattern)),
                );
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items =
            query_builder().order((audit_logs::created_at.desc(), audit_logs::id.desc()));
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let logs = items
            .load::<DbAuditLog>(&mut conn)?
            .into_iter()
            .map(AuditLog::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, logs))
    }

    fn list_audit_users(&self, company_id: CompanyId) -> RepositoryResult<Vec<UserSummary>> {
        let mut conn = self.conn()?;
        let rows = audit_logs::table
            .inner_join(users::table)
            .filter(audit_logs::company_id.eq(company_id.get()))
            .select(DbUserSummary::as_select())
            .distinct()
            .order(users::name.asc())
            .load::<DbUserSummary>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(UserSummary::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl AuditLogWriter for DieselRepository {
    fn create_audit_log(&self, entry: &NewAuditLog) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(audit_logs::table)
            .values(DbNewAuditLog::from(entry))
            .execute(&mut conn)?;
        Ok(())
    }

    fn delete_audit_logs_before(
        &self,
        before: NaiveDateTime,
        batch: i64,
    ) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            let ids = audit_logs::table
                .filter(audit_logs::created_at.lt(before))
                .order(audit_logs::id.asc())
                .select(audit_logs::id)
                .limit(batch)
                .load::<i32>(conn)?;
            if ids.is_empty() {
                return Ok(0);
            }
            let deleted =
                diesel::delete(audit_logs::table.filter(audit_logs::id.eq_any(ids))).execute(conn)?;
            Ok(deleted)
        })
    }
}
