use chrono::Utc;
use diesel::dsl::{InnerJoin, IntoBoxed, LeftJoin};
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::domain::financial::{
    FinancialSummary, FinancialTransaction, Installment, NewTransaction, TransactionDetails,
    TransactionFields, TransactionListItem, TransactionType, UpdateInstallment,
};
use crate::domain::types::{CompanyId, InstallmentId, TransactionId};
use crate::models::financial::{
    FinancialTransaction as DbTransaction, Installment as DbInstallment,
    NewInstallment as DbNewInstallment, NewTransaction as DbNewTransaction,
    TransactionChangeset, UpdateInstallment as DbUpdateInstallment,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    DieselRepository, TransactionListQuery, TransactionReader, TransactionWriter, like_pattern,
};
use crate::schema::{cases, clients, financial_transactions, installment_payments};

type TransactionSource =
    LeftJoin<InnerJoin<financial_transactions::table, clients::table>, cases::table>;
type BoxedTransactions = IntoBoxed<'static, TransactionSource, Sqlite>;

type ListRow = (DbTransaction, String, Option<String>, Option<String>);

/// Transactions of the company joined with client and case, with every
/// list filter applied.
fn filtered(query: &TransactionListQuery) -> BoxedTransactions {
    let mut items = financial_transactions::table
        .inner_join(clients::table)
        .left_join(cases::table)
        .filter(financial_transactions::company_id.eq(query.company_id.get()))
        .into_boxed::<Sqlite>();

    if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
        let pattern = like_pattern(term);
        items = items.filter(
            financial_transactions::description
                .like(pattern.clone())
                .or(clients::name.like(pattern.clone()))
                .or(cases::process_number.nullable().like(pattern)),
        );
    }
    if let Some(transaction_type) = query.transaction_type {
        items = items
            .filter(financial_transactions::transaction_type.eq(transaction_type.as_str()));
    }
    if let Some(client_id) = query.client_id {
        items = items.filter(financial_transactions::client_id.eq(client_id.get()));
    }
    if let Some(case_id) = query.case_id {
        items = items.filter(financial_transactions::case_id.eq(case_id.get()));
    }
    if let Some(start) = query.start {
        items = items.filter(financial_transactions::date.ge(start));
    }
    if let Some(end) = query.end {
        items = items.filter(financial_transactions::date.le(end));
    }
    items
}

fn into_list_item(row: ListRow) -> RepositoryResult<TransactionListItem> {
    let (transaction, client_name, client_cpf, process_number) = row;
    Ok(TransactionListItem {
        transaction: FinancialTransaction::try_from(transaction)?,
        client_name,
        client_cpf,
        process_number,
    })
}

impl TransactionReader for DieselRepository {
    fn get_transaction(
        &self,
        id: TransactionId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<TransactionDetails>> {
        let mut conn = self.conn()?;
        let row = financial_transactions::table
            .inner_join(clients::table)
            .left_join(cases::table)
            .filter(financial_transactions::id.eq(id.get()))
            .filter(financial_transactions::company_id.eq(company_id.get()))
            .select((
                DbTransaction::as_select(),
                clients::name,
                clients::cpf,
                cases::process_number.nullable(),
            ))
            .first::<ListRow>(&mut conn)
            .optional()?;

        let Some(row) = row else {
            return Ok(None);
        };

        let installments = installment_payments::table
            .filter(installment_payments::transaction_id.eq(id.get()))
            .order(installment_payments::installment_number.asc())
            .load::<DbInstallment>(&mut conn)?
            .into_iter()
            .map(Installment::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Some(TransactionDetails {
            item: into_list_item(row)?,
            installments,
        }))
    }

    fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> RepositoryResult<(usize, Vec<TransactionListItem>)> {
        let mut conn = self.conn()?;

        let total = filtered(&query).count().get_result::<i64>(&mut conn)? as usize;

        let mut items = filtered(&query)
            .order(financial_transactions::date.desc())
            .select((
                DbTransaction::as_select(),
                clients::name,
                clients::cpf,
                cases::process_number.nullable(),
            ));
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let transactions = items
            .load::<ListRow>(&mut conn)?
            .into_iter()
            .map(into_list_item)
            .collect::<RepositoryResult<Vec<_>>>()?;

        Ok((total, transactions))
    }

    fn summarize_transactions(
        &self,
        query: &TransactionListQuery,
    ) -> RepositoryResult<FinancialSummary> {
        let mut conn = self.conn()?;
        let rows = filtered(query)
            .select((
                financial_transactions::transaction_type,
                financial_transactions::amount_cents,
            ))
            .load::<(String, i64)>(&mut conn)?;

        let (mut income, mut expense, mut income_count, mut expense_count) = (0, 0, 0, 0);
        for (kind, amount) in rows {
            match kind.parse::<TransactionType>()? {
                TransactionType::Income => {
                    income += amount;
                    income_count += 1;
                }
                TransactionType::Expense => {
                    expense += amount;
                    expense_count += 1;
                }
            }
        }
        Ok(FinancialSummary::from_totals(
            income,
            expense,
            income_count,
            expense_count,
        ))
    }

    fn get_installment(
        &self,
        id: InstallmentId,
        transaction_id: TransactionId,
    ) -> RepositoryResult<Option<Installment>> {
        let mut conn = self.conn()?;
        let installment = installment_payments::table
            .filter(installment_payments::id.eq(id.get()))
            .filter(installment_payments::transaction_id.eq(transaction_id.get()))
            .first::<DbInstallment>(&mut conn)
            .optional()?;
        Ok(installment.map(Installment::try_from).transpose()?)
    }
}

impl TransactionWriter for DieselRepository {
    fn create_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> RepositoryResult<FinancialTransaction> {
        let mut conn = self.conn()?;
        let created = conn.transaction::<_, RepositoryError, _>(|conn| {
            let installment_count = match transaction.installments.len() {
                0 => None,
                n => Some(n as i32),
            };
            let created: DbTransaction = diesel::insert_into(financial_transactions::table)
                .values(DbNewTransaction {
                    company_id: transaction.company_id.get(),
                    fields: TransactionChangeset::from(&transaction.fields),
                    is_installment_payment: installment_count.is_some(),
                    installment_count,
                })
                .returning(DbTransaction::as_returning())
                .get_result(conn)?;

            if !transaction.installments.is_empty() {
                let transaction_id = TransactionId::new(created.id)?;
                let installments: Vec<DbNewInstallment> = transaction
                    .installments
                    .iter()
                    .map(|installment| DbNewInstallment::new(transaction_id, installment))
                    .collect();
                diesel::insert_into(installment_payments::table)
                    .values(&installments)
                    .execute(conn)?;
            }
            Ok(created)
        })?;
        Ok(FinancialTransaction::try_from(created)?)
    }

    fn update_transaction(
        &self,
        id: TransactionId,
        company_id: CompanyId,
        fields: &TransactionFields,
    ) -> RepositoryResult<FinancialTransaction> {
        let mut conn = self.conn()?;
        let target = financial_transactions::table
            .filter(financial_transactions::id.eq(id.get()))
            .filter(financial_transactions::company_id.eq(company_id.get()));
        let updated: DbTransaction = diesel::update(target)
            .set((
                TransactionChangeset::from(fields),
                financial_transactions::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbTransaction::as_returning())
            .get_result(&mut conn)?;
        Ok(FinancialTransaction::try_from(updated)?)
    }

    fn delete_transaction(&self, id: TransactionId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = financial_transactions::table
            .filter(financial_transactions::id.eq(id.get()))
            .filter(financial_transactions::company_id.eq(company_id.get()));
        let affected = diesel::delete(target).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn update_installment(
        &self,
        id: InstallmentId,
        updates: &UpdateInstallment,
    ) -> RepositoryResult<Installment> {
        let mut conn = self.conn()?;
        let updated: DbInstallment = diesel::update(installment_payments::table.find(id.get()))
            .set(DbUpdateInstallment::new(updates, Utc::now().naive_utc()))
            .returning(DbInstallment::as_returning())
            .get_result(&mut conn)?;
        Ok(Installment::try_from(updated)?)
    }
}
