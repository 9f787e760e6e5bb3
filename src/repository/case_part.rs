use chrono::Utc;
use diesel::prelude::*;

use crate::domain::case_part::{CasePart, NewCasePart, UpdateCasePart};
use crate::domain::types::{CaseId, CasePartId, CompanyId};
use crate::models::case_part::{
    CasePart as DbCasePart, CasePartChangeset, NewCasePart as DbNewCasePart,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{CasePartReader, CasePartWriter, DieselRepository};
use crate::schema::case_parts;

impl CasePartReader for DieselRepository {
    fn list_case_parts(&self, case_id: CaseId) -> RepositoryResult<Vec<CasePart>> {
        let mut conn = self.conn()?;
        let rows = case_parts::table
            .filter(case_parts::case_id.eq(case_id.get()))
            .order((case_parts::part_type.asc(), case_parts::name.asc()))
            .load::<DbCasePart>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(CasePart::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn get_case_part(
        &self,
        id: CasePartId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<CasePart>> {
        let mut conn = self.conn()?;
        let part = case_parts::table
            .filter(case_parts::id.eq(id.get()))
            .filter(case_parts::company_id.eq(company_id.get()))
            .first::<DbCasePart>(&mut conn)
            .optional()?;
        Ok(part.map(CasePart::try_from).transpose()?)
    }
}

impl CasePartWriter for DieselRepository {
    fn create_case_part(
        &self,
        company_id: CompanyId,
        case_id: CaseId,
        part: &NewCasePart,
    ) -> RepositoryResult<CasePart> {
        let mut conn = self.conn()?;
        let created: DbCasePart = diesel::insert_into(case_parts::table)
            .values(DbNewCasePart::new(company_id, case_id, part))
            .returning(DbCasePart::as_returning())
            .get_result(&mut conn)?;
        Ok(CasePart::try_from(created)?)
    }

    fn update_case_part(
        &self,
        id: CasePartId,
        company_id: CompanyId,
        part: &UpdateCasePart,
    ) -> RepositoryResult<CasePart> {
        let mut conn = self.conn()?;
        let target = case_parts::table
            .filter(case_parts::id.eq(id.get()))
            .filter(case_parts::company_id.eq(company_id.get()));
        let updated: DbCasePart = diesel::update(target)
            .set((
                CasePartChangeset::from(part),
                case_parts::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbCasePart::as_returning())
            .get_result(&mut conn)?;
        Ok(CasePart::try_from(updated)?)
    }

    fn delete_case_part(&self, id: CasePartId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = case_parts::table
            .filter(case_parts::id.eq(id.get()))
            .filter(case_parts::company_id.eq(company_id.get()));
        let affected = diesel::delete(target).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
