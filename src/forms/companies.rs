use serde::Deserialize;
use validator::Validate;

use crate::domain::company::{
    SubscriptionPlan, SubscriptionStatus, SubscriptionUpdate, UpdateCompany,
};
use crate::domain::types::{CompanyName, EmailAddress};
use crate::forms::{FormError, clean, parse_optional_datetime};

#[derive(Debug, Deserialize, Validate)]
pub struct CompanyForm {
    #[validate(length(min = 1))]
    pub name: String,
    pub cnpj: Option<String>,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub active: Option<bool>,
}

impl CompanyForm {
    /// `current_active` is kept when the payload omits the flag.
    pub fn into_update(self, current_active: bool) -> Result<UpdateCompany, FormError> {
        Ok(UpdateCompany {
            name: CompanyName::new(self.name)?,
            cnpj: clean(&self.cnpj),
            email: EmailAddress::new(self.email)?,
            phone: clean(&self.phone),
            address: clean(&self.address),
            city: clean(&self.city),
            state: clean(&self.state),
            active: self.active.unwrap_or(current_active),
        })
    }
}

/// Company plus its first administrator.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyForm {
    #[validate(nested)]
    #[serde(flatten)]
    pub company: CompanyForm,
    #[validate(length(min = 1))]
    pub admin_name: String,
    #[validate(email)]
    pub admin_email: String,
    #[validate(length(min = 8))]
    pub admin_password: String,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionForm {
    pub subscription_status: String,
    pub subscription_plan: String,
    pub subscription_ends_at: Option<String>,
    pub last_payment_at: Option<String>,
    pub last_payment_cents: Option<i64>,
}

impl TryFrom<SubscriptionForm> for SubscriptionUpdate {
    type Error = FormError;

    fn try_from(form: SubscriptionForm) -> Result<Self, Self::Error> {
        if form.last_payment_cents.is_some_and(|cents| cents < 0) {
            return Err(FormError::Invalid("Valor de pagamento inválido".to_string()));
        }
        Ok(Self {
            subscription_status: form.subscription_status.parse::<SubscriptionStatus>()?,
            subscription_plan: form.subscription_plan.parse::<SubscriptionPlan>()?,
            subscription_ends_at: parse_optional_datetime(form.subscription_ends_at.as_deref())?,
            last_payment_at: parse_optional_datetime(form.last_payment_at.as_deref())?,
            last_payment_cents: form.last_payment_cents,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UserForm {
    #[validate(length(min = 1))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: Option<String>,
    pub active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscription_form_parses_enums() {
        let form = SubscriptionForm {
            subscription_status: "ACTIVE".into(),
            subscription_plan: "PROFESSIONAL".into(),
            subscription_ends_at: Some("2025-12-31".into()),
            last_payment_at: None,
            last_payment_cents: Some(19_900),
        };
        let update = SubscriptionUpdate::try_from(form).unwrap();
        assert_eq!(update.subscription_status, SubscriptionStatus::Active);
        assert_eq!(update.subscription_plan, SubscriptionPlan::Professional);
        assert!(update.subscription_ends_at.is_some());
    }

    #[test]
    fn unknown_plan_is_rejected() {
        let form = SubscriptionForm {
            subscription_status: "ACTIVE".into(),
            subscription_plan: "GOLD".into(),
            subscription_ends_at: None,
            last_payment_at: None,
            last_payment_cents: None,
        };
        assert!(SubscriptionUpdate::try_from(form).is_err());
    }

    #[test]
    fn omitted_active_flag_keeps_current() {
        let form = CompanyForm {
            name: "Silva Advogados".into(),
            cnpj: Some("  ".into()),
            email: "Contato@Silva.adv.br".into(),
            phone: None,
            address: None,
            city: None,
            state: None,
            active: None,
        };
        let update = form.into_update(false).unwrap();
        assert!(!update.active);
        assert_eq!(update.cnpj, None);
        assert_eq!(update.email.as_str(), "contato@silva.adv.br");
    }
}
