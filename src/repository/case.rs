use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::case::{Case, CaseListItem, CaseMovement, CourtSync, NewCase, UpdateCase};
use crate::domain::types::{CaseId, ClientId, CompanyId, UserId};
use crate::models::case::{
    Case as DbCase, CaseMovement as DbCaseMovement, NewCase as DbNewCase,
    NewCaseMovement as DbNewCaseMovement, UpdateCase as DbUpdateCase,
};
use crate::models::case_part::NewCasePart as DbNewCasePart;
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{CaseListQuery, CaseReader, CaseWriter, DieselRepository, like_pattern};
use crate::schema::{case_movements, case_parts, cases, clients};

fn into_list_items(rows: Vec<(DbCase, String)>) -> RepositoryResult<Vec<CaseListItem>> {
    rows.into_iter()
        .map(|(case, client_name)| {
            Ok(CaseListItem {
                case: Case::try_from(case)?,
                client_name,
            })
        })
        .collect()
}

impl CaseReader for DieselRepository {
    fn get_case_by_id(&self, id: CaseId, company_id: CompanyId) -> RepositoryResult<Option<Case>> {
        let mut conn = self.conn()?;
        let case = cases::table
            .filter(cases::id.eq(id.get()))
            .filter(cases::company_id.eq(company_id.get()))
            .first::<DbCase>(&mut conn)
            .optional()?;
        Ok(case.map(Case::try_from).transpose()?)
    }

    fn get_case_by_process_number(
        &self,
        company_id: CompanyId,
        process_number: &str,
    ) -> RepositoryResult<Option<Case>> {
        let mut conn = self.conn()?;
        let case = cases::table
            .filter(cases::company_id.eq(company_id.get()))
            .filter(cases::process_number.eq(process_number))
            .first::<DbCase>(&mut conn)
            .optional()?;
        Ok(case.map(Case::try_from).transpose()?)
    }

    fn list_cases(&self, query: CaseListQuery) -> RepositoryResult<(usize, Vec<CaseListItem>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = cases::table
                .inner_join(clients::table)
                .filter(cases::company_id.eq(query.company_id.get()))
                .into_boxed::<Sqlite>();

            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = like_pattern(term);
                items = items.filter(
                    cases::process_number
                        .like(pattern.clone())
                        .or(cases::subject.like(pattern.clone()))
                        .or(cases::court.like(pattern.clone()))
                        .or(clients::name.like(pattern)),
                );
            }
            if let Some(status) = query.status {
                items = items.filter(cases::status.eq(status.as_str()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder()
            .order(cases::created_at.desc())
            .select((DbCase::as_select(), clients::name));
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }
        let rows = items.load::<(DbCase, String)>(&mut conn)?;

        Ok((total, into_list_items(rows)?))
    }

    fn list_client_cases(&self, client_id: ClientId) -> RepositoryResult<Vec<Case>> {
        let mut conn = self.conn()?;
        let rows = cases::table
            .filter(cases::client_id.eq(client_id.get()))
            .order(cases::created_at.desc())
            .load::<DbCase>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(Case::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn list_case_movements(&self, case_id: CaseId) -> RepositoryResult<Vec<CaseMovement>> {
        let mut conn = self.conn()?;
        let rows = case_movements::table
            .filter(case_movements::case_id.eq(case_id.get()))
            .order(case_movements::movement_date.desc())
            .load::<DbCaseMovement>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(CaseMovement::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn list_deadlines(
        &self,
        company_id: CompanyId,
        completed_since: chrono::NaiveDateTime,
    ) -> RepositoryResult<Vec<CaseListItem>> {
        let mut conn = self.conn()?;
        let rows = cases::table
            .inner_join(clients::table)
            .filter(cases::company_id.eq(company_id.get()))
            .filter(cases::deadline.is_not_null())
            .filter(
                cases::deadline_completed
                    .eq(false)
                    .or(cases::deadline_completed_at.ge(completed_since)),
            )
            .order(cases::deadline.asc())
            .select((DbCase::as_select(), clients::name))
            .load::<(DbCase, String)>(&mut conn)?;
        into_list_items(rows)
    }

    fn list_pending_updates(&self, company_id: CompanyId) -> RepositoryResult<Vec<CaseListItem>> {
        let mut conn = self.conn()?;
        let rows = cases::table
            .inner_join(clients::table)
            .filter(cases::company_id.eq(company_id.get()))
            .filter(cases::last_synced_at.is_not_null())
            .filter(
                cases::last_acknowledged_at
                    .is_null()
                    .or(cases::last_synced_at.gt(cases::last_acknowledged_at)),
            )
            .order(cases::last_synced_at.desc())
            .select((DbCase::as_select(), clients::name))
            .load::<(DbCase, String)>(&mut conn)?;
        into_list_items(rows)
    }

    fn search_cases(
        &self,
        company_id: CompanyId,
        term: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<Case>> {
        let mut conn = self.conn()?;
        let pattern = like_pattern(term);
        let rows = cases::table
            .filter(cases::company_id.eq(company_id.get()))
            .filter(
                cases::process_number
                    .like(pattern.clone())
                    .or(cases::subject.like(pattern)),
            )
            .order(cases::created_at.desc())
            .limit(limit as i64)
            .load::<DbCase>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(Case::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl CaseWriter for DieselRepository {
    fn create_case(&self, case: &NewCase) -> RepositoryResult<Case> {
        let mut conn = self.conn()?;
        let created = conn.transaction::<_, RepositoryError, _>(|conn| {
            let sync = case.sync.as_ref();
            let court = case
                .court
                .as_deref()
                .or_else(|| sync.and_then(|s| s.court.as_deref()));
            let created: DbCase = diesel::insert_into(cases::table)
                .values(DbNewCase {
                    company_id: case.company_id.get(),
                    client_id: case.client_id.get(),
                    process_number: case.process_number.as_str(),
                    court,
                    subject: case.subject.as_deref(),
                    value_cents: case.value_cents,
                    status: case.status.as_str(),
                    notes: case.notes.as_deref(),
                    informar_cliente: case.informar_cliente.as_deref(),
                    ultimo_andamento: sync.and_then(|s| s.ultimo_andamento.as_deref()),
                    deadline: case.deadline,
                    deadline_responsible_id: case.deadline_responsible_id.map(UserId::get),
                    last_synced_at: sync.map(|s| s.synced_at),
                })
                .returning(DbCase::as_returning())
                .get_result(conn)?;

            let case_id = CaseId::new(created.id)?;
            if let Some(sync) = sync.filter(|s| !s.movements.is_empty()) {
                let movements: Vec<DbNewCaseMovement> = sync
                    .movements
                    .iter()
                    .map(|movement| DbNewCaseMovement::new(case_id, movement))
                    .collect();
                diesel::insert_into(case_movements::table)
                    .values(&movements)
                    .execute(conn)?;
            }
            if !case.parts.is_empty() {
                let parts: Vec<DbNewCasePart> = case
                    .parts
                    .iter()
                    .map(|part| DbNewCasePart::new(case.company_id, case_id, part))
                    .collect();
                diesel::insert_into(case_parts::table)
                    .values(&parts)
                    .execute(conn)?;
            }
            Ok(created)
        })?;
        Ok(Case::try_from(created)?)
    }

    fn update_case(
        &self,
        id: CaseId,
        company_id: CompanyId,
        updates: &UpdateCase,
    ) -> RepositoryResult<Case> {
        let mut conn = self.conn()?;
        let target = cases::table
            .filter(cases::id.eq(id.get()))
            .filter(cases::company_id.eq(company_id.get()));
        let updated: DbCase = diesel::update(target)
            .set(DbUpdateCase::new(updates, Utc::now().naive_utc()))
            .returning(DbCase::as_returning())
            .get_result(&mut conn)?;
        Ok(Case::try_from(updated)?)
    }

    fn delete_case(&self, id: CaseId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = cases::table
            .filter(cases::id.eq(id.get()))
            .filter(cases::company_id.eq(company_id.get()));
        let affected = diesel::delete(target).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn replace_case_movements(&self, id: CaseId, sync: &CourtSync) -> RepositoryResult<Case> {
        let mut conn = self.conn()?;
        let updated = conn.transaction::<_, RepositoryError, _>(|conn| {
            let current: DbCase = cases::table.find(id.get()).first(conn)?;

            diesel::delete(case_movements::table.filter(case_movements::case_id.eq(id.get())))
                .execute(conn)?;
            if !sync.movements.is_empty() {
                let movements: Vec<DbNewCaseMovement> = sync
                    .movements
                    .iter()
                    .map(|movement| DbNewCaseMovement::new(id, movement))
                    .collect();
                diesel::insert_into(case_movements::table)
                    .values(&movements)
                    .execute(conn)?;
            }

            let court = sync.court.clone().or(current.court);
            let ultimo_andamento = sync.ultimo_andamento.clone().or(current.ultimo_andamento);
            let updated: DbCase = diesel::update(cases::table.find(id.get()))
                .set((
                    cases::court.eq(court),
                    cases::ultimo_andamento.eq(ultimo_andamento),
                    cases::last_synced_at.eq(Some(sync.synced_at)),
                    cases::updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(DbCase::as_returning())
                .get_result(conn)?;
            Ok(updated)
        })?;
        Ok(Case::try_from(updated)?)
    }

    fn acknowledge_case(
        &self,
        id: CaseId,
        company_id: CompanyId,
        at: chrono::NaiveDateTime,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = cases::table
            .filter(cases::id.eq(id.get()))
            .filter(cases::company_id.eq(company_id.get()));
        let affected = diesel::update(target)
            .set(cases::last_acknowledged_at.eq(Some(at)))
            .execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
