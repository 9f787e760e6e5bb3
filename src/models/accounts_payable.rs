use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::accounts_payable::{
    AccountPayable as DomainAccountPayable, NewAccountPayable as DomainNewAccountPayable,
    PayableFields,
};
use crate::domain::types::{CompanyId, PayableId, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::accounts_payable)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AccountPayable {
    pub id: i32,
    pub company_id: i32,
    pub supplier: String,
    pub description: String,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub status: String,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_period: Option<String>,
    pub parent_id: Option<i32>,
    pub created_by: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::accounts_payable)]
pub struct NewAccountPayable<'a> {
    pub company_id: i32,
    pub parent_id: Option<i32>,
    pub created_by: Option<i32>,
    #[diesel(embed)]
    pub fields: PayableChangeset<'a>,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::accounts_payable)]
#[diesel(treat_none_as_null = true)]
pub struct PayableChangeset<'a> {
    pub supplier: &'a str,
    pub description: &'a str,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub status: &'a str,
    pub category: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub is_recurring: bool,
    pub recurrence_period: Option<&'a str>,
}

impl TryFrom<AccountPayable> for DomainAccountPayable {
    type Error = TypeConstraintError;

    fn try_from(row: AccountPayable) -> Result<Self, Self::Error> {
        Ok(Self {
            id: PayableId::new(row.id)?,
            company_id: CompanyId::new(row.company_id)?,
            supplier: row.supplier,
            description: row.description,
            amount_cents: row.amount_cents,
            due_date: row.due_date,
            paid_date: row.paid_date,
            status: row.status.parse()?,
            category: row.category,
            notes: row.notes,
            is_recurring: row.is_recurring,
            recurrence_period: row.recurrence_period.map(|p| p.parse()).transpose()?,
            parent_id: row.parent_id.map(PayableId::new).transpose()?,
            created_by: row.created_by.map(UserId::new).transpose()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> From<&'a PayableFields> for PayableChangeset<'a> {
    fn from(fields: &'a PayableFields) -> Self {
        Self {
            supplier: fields.supplier.as_str(),
            description: fields.description.as_str(),
            amount_cents: fields.amount_cents,
            due_date: fields.due_date,
            paid_date: fields.paid_date,
            status: fields.status.as_str(),
            category: fields.category.as_deref(),
            notes: fields.notes.as_deref(),
            is_recurring: fields.is_recurring,
            recurrence_period: fields.recurrence_period.as_ref().map(|p| p.as_str()),
        }
    }
}

impl<'a> From<&'a DomainNewAccountPayable> for NewAccountPayable<'a> {
    fn from(payable: &'a DomainNewAccountPayable) -> Self {
        Self {
            company_id: payable.company_id.get(),
            parent_id: payable.parent_id.map(PayableId::get),
            created_by: payable.created_by.map(UserId::get),
            fields: (&payable.fields).into(),
        }
    }
}
