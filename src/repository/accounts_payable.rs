use std::collections::BTreeMap;

use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::accounts_payable::{
    AccountPayable, NewAccountPayable, PayableFields, PayableStatus, StatusTotal,
};
use crate::domain::types::{CompanyId, PayableId};
use crate::models::accounts_payable::{
    AccountPayable as DbAccountPayable, NewAccountPayable as DbNewAccountPayable,
    PayableChangeset,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, PayableListQuery, PayableReader, PayableWriter, like_pattern,
};
use crate::schema::accounts_payable;

impl PayableReader for DieselRepository {
    fn get_payable(
        &self,
        id: PayableId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<AccountPayable>> {
        let mut conn = self.conn()?;
        let payable = accounts_payable::table
            .filter(accounts_payable::id.eq(id.get()))
            .filter(accounts_payable::company_id.eq(company_id.get()))
            .first::<DbAccountPayable>(&mut conn)
            .optional()?;
        Ok(payable.map(AccountPayable::try_from).transpose()?)
    }

    fn list_payables(
        &self,
        query: PayableListQuery,
    ) -> RepositoryResult<(usize, Vec<AccountPayable>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = accounts_payable::table
                .filter(accounts_payable::company_id.eq(query.company_id.get()))
                .into_boxed::<Sqlite>();

            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = like_pattern(term);
                items = items.filter(
                    accounts_payable::supplier
                        .like(pattern.clone())
                        .or(accounts_payable::description.like(pattern)),
                );
            }
            if let Some(status) = query.status {
                items = items.filter(accounts_payable::status.eq(status.as_str()));
            }
            if let Some(category) = query.category.as_deref() {
                items = items.filter(accounts_payable::category.eq(category.to_string()));
            }
            if let Some(start) = query.start {
                items = items.filter(accounts_payable::due_date.ge(start));
            }
            if let Some(end) = query.end {
                items = items.filter(accounts_payable::due_date.le(end));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(accounts_payable::due_date.asc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let payables = items
            .load::<DbAccountPayable>(&mut conn)?
            .into_iter()
            .map(AccountPayable::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, payables))
    }

    fn payable_totals_by_status(
        &self,
        company_id: CompanyId,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> RepositoryResult<Vec<StatusTotal>> {
        let mut conn = self.conn()?;
        let mut items = accounts_payable::table
            .filter(accounts_payable::company_id.eq(company_id.get()))
            .into_boxed::<Sqlite>();
        if let Some(start) = start {
            items = items.filter(accounts_payable::due_date.ge(start));
        }
        if let Some(end) = end {
            items = items.filter(accounts_payable::due_date.le(end));
        }
        let rows = items
            .select((accounts_payable::status, accounts_payable::amount_cents))
            .load::<(String, i64)>(&mut conn)?;

        let mut grouped: BTreeMap<String, (i64, i64)> = BTreeMap::new();
        for (status, amount) in rows {
            let entry = grouped.entry(status).or_default();
            entry.0 += 1;
            entry.1 += amount;
        }

        grouped
            .into_iter()
            .map(|(status, (count, total_cents))| {
                Ok(StatusTotal {
                    status: status.parse::<PayableStatus>()?,
                    count,
                    total_cents,
                })
            })
            .collect()
    }
}

impl PayableWriter for DieselRepository {
    fn create_payable(&self, payable: &NewAccountPayable) -> RepositoryResult<AccountPayable> {
        let mut conn = self.conn()?;
        let created: DbAccountPayable = diesel::insert_into(accounts_payable::table)
            .values(DbNewAccountPayable::from(payable))
            .returning(DbAccountPayable::as_returning())
            .get_result(&mut conn)?;
        Ok(AccountPayable::try_from(created)?)
    }

    fn update_payable(
        &self,
        id: PayableId,
        company_id: CompanyId,
        fields: &PayableFields,
    ) -> RepositoryResult<AccountPayable> {
        let mut conn = self.conn()?;
        let target = accounts_payable::table
            .filter(accounts_payable::id.eq(id.get()))
            .filter(accounts_payable::company_id.eq(company_id.get()));
        let updated: DbAccountPayable = diesel::update(target)
            .set((
                PayableChangeset::from(fields),
                accounts_payable::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbAccountPayable::as_returning())
            .get_result(&mut conn)?;
        Ok(AccountPayable::try_from(updated)?)
    }

    fn delete_payable(&self, id: PayableId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = accounts_payable::table
            .filter(accounts_payable::id.eq(id.get()))
            .filter(accounts_payable::company_id.eq(company_id.get()));
        let affected = diesel::delete(target).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn mark_payable_paid(
        &self,
        id: PayableId,
        company_id: CompanyId,
        paid_date: NaiveDateTime,
        next: Option<&NewAccountPayable>,
    ) -> RepositoryResult<(AccountPayable, Option<AccountPayable>)> {
        let mut conn = self.conn()?;
        let (paid, created) = conn.transaction::<_, RepositoryError, _>(|conn| {
            let target = accounts_payable::table
                .filter(accounts_payable::id.eq(id.get()))
                .filter(accounts_payable::company_id.eq(company_id.get()));
            let paid: DbAccountPayable = diesel::update(target)
                .set((
                    accounts_payable::status.eq(PayableStatus::Paid.as_str()),
                    accounts_payable::paid_date.eq(Some(paid_date)),
                    accounts_payable::updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(DbAccountPayable::as_returning())
                .get_result(conn)?;

            let created = match next {
                Some(next) => Some(
                    diesel::insert_into(accounts_payable::table)
                        .values(DbNewAccountPayable::from(next))
                        .returning(DbAccountPayable::as_returning())
                        .get_result::<DbAccountPayable>(conn)?,
                ),
                None => None,
            };
            Ok((paid, created))
        })?;

        Ok((
            AccountPayable::try_from(paid)?,
            created.map(AccountPayable::try_from).transpose()?,
        ))
    }
}
