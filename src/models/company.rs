use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::company::{
    Company as DomainCompany, NewCompany as DomainNewCompany, SubscriptionUpdate,
    UpdateCompany as DomainUpdateCompany,
};
use crate::domain::types::{CompanyId, CompanyName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::companies)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Company {
    pub id: i32,
    pub name: String,
    pub cnpj: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub active: bool,
    pub api_key: Option<String>,
    pub subscription_status: String,
    pub subscription_plan: String,
    pub trial_ends_at: Option<NaiveDateTime>,
    pub subscription_ends_at: Option<NaiveDateTime>,
    pub last_payment_at: Option<NaiveDateTime>,
    pub last_payment_cents: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::companies)]
pub struct NewCompany<'a> {
    pub name: &'a str,
    pub cnpj: Option<&'a str>,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub api_key: &'a str,
    pub subscription_status: &'a str,
    pub subscription_plan: &'a str,
    pub trial_ends_at: Option<NaiveDateTime>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::companies)]
#[diesel(treat_none_as_null = true)]
pub struct UpdateCompany<'a> {
    pub name: &'a str,
    pub cnpj: Option<&'a str>,
    pub email: &'a str,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::companies)]
#[diesel(treat_none_as_null = true)]
pub struct SubscriptionChangeset<'a> {
    pub subscription_status: &'a str,
    pub subscription_plan: &'a str,
    pub subscription_ends_at: Option<NaiveDateTime>,
    pub last_payment_at: Option<NaiveDateTime>,
    pub last_payment_cents: Option<i64>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Company> for DomainCompany {
    type Error = TypeConstraintError;

    fn try_from(row: Company) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CompanyId::new(row.id)?,
            name: CompanyName::new(row.name)?,
            cnpj: row.cnpj,
            email: row.email,
            phone: row.phone,
            address: row.address,
            city: row.city,
            state: row.state,
            active: row.active,
            api_key: row.api_key,
            subscription_status: row.subscription_status.parse()?,
            subscription_plan: row.subscription_plan.parse()?,
            trial_ends_at: row.trial_ends_at,
            subscription_ends_at: row.subscription_ends_at,
            last_payment_at: row.last_payment_at,
            last_payment_cents: row.last_payment_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewCompany> for NewCompany<'a> {
    fn from(company: &'a DomainNewCompany) -> Self {
        Self {
            name: company.name.as_str(),
            cnpj: company.cnpj.as_deref(),
            email: company.email.as_str(),
            phone: company.phone.as_deref(),
            address: company.address.as_deref(),
            city: company.city.as_deref(),
            state: company.state.as_deref(),
            api_key: company.api_key.as_str(),
            subscription_status: company.subscription_status.as_str(),
            subscription_plan: company.subscription_plan.as_str(),
            trial_ends_at: company.trial_ends_at,
        }
    }
}

impl<'a> UpdateCompany<'a> {
    pub fn new(company: &'a DomainUpdateCompany, now: NaiveDateTime) -> Self {
        Self {
            name: company.name.as_str(),
            cnpj: company.cnpj.as_deref(),
            email: company.email.as_str(),
            phone: company.phone.as_deref(),
            address: company.address.as_deref(),
            city: company.city.as_deref(),
            state: company.state.as_deref(),
            active: company.active,
            updated_at: now,
        }
    }
}

impl<'a> SubscriptionChangeset<'a> {
    pub fn new(update: &'a SubscriptionUpdate, now: NaiveDateTime) -> Self {
        Self {
            subscription_status: update.subscription_status.as_str(),
            subscription_plan: update.subscription_plan.as_str(),
            subscription_ends_at: update.subscription_ends_at,
            last_payment_at: update.last_payment_at,
            last_payment_cents: update.last_payment_cents,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::company::{SubscriptionPlan, SubscriptionStatus};

    fn row() -> Company {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        Company {
            id: 4,
            name: "Souza & Lima".into(),
            cnpj: None,
            email: "contato@souzalima.adv.br".into(),
            phone: None,
            address: None,
            city: None,
            state: None,
            active: true,
            api_key: Some("k".into()),
            subscription_status: "PAST_DUE".into(),
            subscription_plan: "ENTERPRISE".into(),
            trial_ends_at: None,
            subscription_ends_at: None,
            last_payment_at: None,
            last_payment_cents: Some(9_900),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn row_converts_to_domain() {
        let company = DomainCompany::try_from(row()).unwrap();
        assert_eq!(company.id.get(), 4);
        assert_eq!(company.subscription_status, SubscriptionStatus::PastDue);
        assert_eq!(company.subscription_plan, SubscriptionPlan::Enterprise);
    }

    #[test]
    fn unknown_status_is_rejected() {
        let mut bad = row();
        bad.subscription_status = "FROZEN".into();
        assert!(DomainCompany::try_from(bad).is_err());
    }
}
