use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::financial::{
    FinancialTransaction as DomainTransaction, Installment as DomainInstallment,
    NewInstallment as DomainNewInstallment, TransactionFields,
    UpdateInstallment as DomainUpdateInstallment,
};
use crate::domain::types::{
    CaseId, ClientId, CompanyId, InstallmentId, TransactionId, TypeConstraintError,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::financial_transactions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FinancialTransaction {
    pub id: i32,
    pub company_id: i32,
    pub client_id: i32,
    pub case_id: Option<i32>,
    pub transaction_type: String,
    pub description: String,
    pub amount_cents: i64,
    pub date: NaiveDateTime,
    pub is_installment_payment: bool,
    pub installment_count: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::financial_transactions)]
pub struct NewTransaction<'a> {
    pub company_id: i32,
    #[diesel(embed)]
    pub fields: TransactionChangeset<'a>,
    pub is_installment_payment: bool,
    pub installment_count: Option<i32>,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::financial_transactions)]
#[diesel(treat_none_as_null = true)]
pub struct TransactionChangeset<'a> {
    pub client_id: i32,
    pub case_id: Option<i32>,
    pub transaction_type: &'a str,
    pub description: &'a str,
    pub amount_cents: i64,
    pub date: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::installment_payments)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Installment {
    pub id: i32,
    pub transaction_id: i32,
    pub installment_number: i32,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub paid_amount_cents: Option<i64>,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::installment_payments)]
pub struct NewInstallment {
    pub transaction_id: i32,
    pub installment_number: i32,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::installment_payments)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateInstallment<'a> {
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub paid_amount_cents: Option<i64>,
    pub status: &'a str,
    pub notes: Option<&'a str>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<FinancialTransaction> for DomainTransaction {
    type Error = TypeConstraintError;

    fn try_from(row: FinancialTransaction) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TransactionId::new(row.id)?,
            company_id: CompanyId::new(row.company_id)?,
            client_id: ClientId::new(row.client_id)?,
            case_id: row.case_id.map(CaseId::new).transpose()?,
            transaction_type: row.transaction_type.parse()?,
            description: row.description,
            amount_cents: row.amount_cents,
            date: row.date,
            is_installment_payment: row.is_installment_payment,
            installment_count: row.installment_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<Installment> for DomainInstallment {
    type Error = TypeConstraintError;

    fn try_from(row: Installment) -> Result<Self, Self::Error> {
        Ok(Self {
            id: InstallmentId::new(row.id)?,
            transaction_id: TransactionId::new(row.transaction_id)?,
            installment_number: row.installment_number,
            amount_cents: row.amount_cents,
            due_date: row.due_date,
            paid_date: row.paid_date,
            paid_amount_cents: row.paid_amount_cents,
            status: row.status.parse()?,
            notes: row.notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> From<&'a TransactionFields> for TransactionChangeset<'a> {
    fn from(fields: &'a TransactionFields) -> Self {
        Self {
            client_id: fields.client_id.get(),
            case_id: fields.case_id.map(CaseId::get),
            transaction_type: fields.transaction_type.as_str(),
            description: fields.description.as_str(),
            amount_cents: fields.amount_cents,
            date: fields.date,
        }
    }
}

impl NewInstallment {
    pub fn new(transaction_id: TransactionId, installment: &DomainNewInstallment) -> Self {
        Self {
            transaction_id: transaction_id.get(),
            installment_number: installment.installment_number,
            amount_cents: installment.amount_cents,
            due_date: installment.due_date,
        }
    }
}

impl<'a> UpdateInstallment<'a> {
    pub fn new(update: &'a DomainUpdateInstallment, now: NaiveDateTime) -> Self {
        Self {
            amount_cents: update.amount_cents,
            due_date: update.due_date,
            paid_date: update.paid_date,
            paid_amount_cents: update.paid_amount_cents,
            status: update.status.as_str(),
            notes: update.notes.as_deref(),
            updated_at: now,
        }
    }
}
