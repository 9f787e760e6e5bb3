use chrono::Utc;
use diesel::prelude::*;

use crate::domain::company::{Company, NewCompany, SubscriptionUpdate, UpdateCompany};
use crate::domain::types::CompanyId;
use crate::domain::user::{NewUser, User};
use crate::models::company::{
    Company as DbCompany, NewCompany as DbNewCompany, SubscriptionChangeset,
    UpdateCompany as DbUpdateCompany,
};
use crate::models::user::{NewUser as DbNewUser, User as DbUser};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    CompanyListQuery, CompanyReader, CompanyWriter, DieselRepository, like_pattern,
};
use crate::schema::{companies, users};

impl CompanyReader for DieselRepository {
    fn get_company_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>> {
        let mut conn = self.conn()?;
        let company = companies::table
            .find(id.get())
            .select(DbCompany::as_select())
            .first(&mut conn)
            .optional()?;
        Ok(company.map(Company::try_from).transpose()?)
    }

    fn list_companies(&self, query: CompanyListQuery) -> RepositoryResult<(usize, Vec<Company>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = companies::table.into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = like_pattern(term);
                items = items.filter(
                    companies::name
                        .like(pattern.clone())
                        .or(companies::email.like(pattern.clone()))
                        .or(companies::cnpj.like(pattern)),
                );
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(companies::created_at.desc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let companies = items
            .load::<DbCompany>(&mut conn)?
            .into_iter()
            .map(Company::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, companies))
    }
}

impl CompanyWriter for DieselRepository {
    fn create_company_with_admin(
        &self,
        company: &NewCompany,
        admin: &NewUser,
    ) -> RepositoryResult<(Company, User)> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            let company: DbCompany = diesel::insert_into(companies::table)
                .values(DbNewCompany::from(company))
                .returning(DbCompany::as_returning())
                .get_result(conn)?;

            let mut insertable = DbNewUser::from(admin);
            insertable.company_id = Some(company.id);
            let user: DbUser = diesel::insert_into(users::table)
                .values(&insertable)
                .returning(DbUser::as_returning())
                .get_result(conn)?;

            Ok((Company::try_from(company)?, User::try_from(user)?))
        })
    }

    fn update_company(&self, id: CompanyId, updates: &UpdateCompany) -> RepositoryResult<Company> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        let updated: DbCompany = diesel::update(companies::table.find(id.get()))
            .set(DbUpdateCompany::new(updates, now))
            .returning(DbCompany::as_returning())
            .get_result(&mut conn)?;
        Ok(Company::try_from(updated)?)
    }

    fn update_subscription(
        &self,
        id: CompanyId,
        update: &SubscriptionUpdate,
    ) -> RepositoryResult<Company> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        let updated: DbCompany = diesel::update(companies::table.find(id.get()))
            .set(SubscriptionChangeset::new(update, now))
            .returning(DbCompany::as_returning())
            .get_result(&mut conn)?;
        Ok(Company::try_from(updated)?)
    }

    fn set_company_api_key(&self, id: CompanyId, api_key: &str) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let affected = diesel::update(companies::table.find(id.get()))
            .set((
                companies::api_key.eq(api_key),
                companies::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn delete_company(&self, id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let affected = diesel::delete(companies::table.find(id.get())).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
