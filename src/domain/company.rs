use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::domain::types::{CompanyId, CompanyName, EmailAddress, text_enum};

/// Length of the free trial granted to newly registered firms.
pub const TRIAL_DAYS: i64 = 7;
/// Look-ahead window for subscription alerts.
pub const ALERT_WINDOW_DAYS: i64 = 7;

text_enum!(
    SubscriptionStatus {
        Trial => "TRIAL",
        Active => "ACTIVE",
        PastDue => "PAST_DUE",
        Cancelled => "CANCELLED",
    }
);

text_enum!(
    SubscriptionPlan {
        Basic => "BASIC",
        Professional => "PROFESSIONAL",
        Enterprise => "ENTERPRISE",
    }
);

/// A tenant law firm.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Company {
    pub id: CompanyId,
    pub name: CompanyName,
    pub cnpj: Option<String>,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub active: bool,
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: SubscriptionPlan,
    pub trial_ends_at: Option<NaiveDateTime>,
    pub subscription_ends_at: Option<NaiveDateTime>,
    pub last_payment_at: Option<NaiveDateTime>,
    pub last_payment_cents: Option<i64>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Compact company view embedded in user payloads.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CompanySummary {
    pub id: CompanyId,
    pub name: String,
    pub active: bool,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: SubscriptionPlan,
}

impl From<&Company> for CompanySummary {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id,
            name: company.name.as_str().to_string(),
            active: company.active,
            subscription_status: company.subscription_status,
            subscription_plan: company.subscription_plan,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCompany {
    pub name: CompanyName,
    pub cnpj: Option<String>,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub api_key: String,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: SubscriptionPlan,
    pub trial_ends_at: Option<NaiveDateTime>,
}

impl NewCompany {
    /// Company starting a trial that ends `TRIAL_DAYS` after `now`.
    pub fn trial(
        name: CompanyName,
        email: EmailAddress,
        api_key: String,
        now: NaiveDateTime,
    ) -> Self {
        Self {
            name,
            cnpj: None,
            email,
            phone: None,
            address: None,
            city: None,
            state: None,
            api_key,
            subscription_status: SubscriptionStatus::Trial,
            subscription_plan: SubscriptionPlan::Basic,
            trial_ends_at: Some(now + Duration::days(TRIAL_DAYS)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateCompany {
    pub name: CompanyName,
    pub cnpj: Option<String>,
    pub email: EmailAddress,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub active: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SubscriptionUpdate {
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: SubscriptionPlan,
    pub subscription_ends_at: Option<NaiveDateTime>,
    pub last_payment_at: Option<NaiveDateTime>,
    pub last_payment_cents: Option<i64>,
}

/// Last recorded payment of a company.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct LastPayment {
    pub company_id: CompanyId,
    pub last_payment_at: Option<NaiveDateTime>,
    pub last_payment_cents: Option<i64>,
    pub subscription_status: SubscriptionStatus,
    pub subscription_plan: SubscriptionPlan,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    TrialEnding,
    SubscriptionEnding,
    PastDue,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct SubscriptionAlert {
    pub company_id: CompanyId,
    pub company_name: String,
    pub kind: AlertKind,
    pub ends_at: Option<NaiveDateTime>,
    pub days_left: Option<i64>,
}

fn ends_soon(ends_at: Option<NaiveDateTime>, now: NaiveDateTime) -> Option<NaiveDateTime> {
    ends_at.filter(|end| *end >= now && *end <= now + Duration::days(ALERT_WINDOW_DAYS))
}

impl Company {
    /// Alert to raise for this company at `now`, if any.
    pub fn subscription_alert(&self, now: NaiveDateTime) -> Option<SubscriptionAlert> {
        let (kind, ends_at) = match self.subscription_status {
            SubscriptionStatus::PastDue => (AlertKind::PastDue, None),
            SubscriptionStatus::Trial => {
                (AlertKind::TrialEnding, Some(ends_soon(self.trial_ends_at, now)?))
            }
            SubscriptionStatus::Active => (
                AlertKind::SubscriptionEnding,
                Some(ends_soon(self.subscription_ends_at, now)?),
            ),
            SubscriptionStatus::Cancelled => return None,
        };

        Some(SubscriptionAlert {
            company_id: self.id,
            company_name: self.name.as_str().to_string(),
            kind,
            ends_at,
            days_left: ends_at.map(|end| (end - now).num_days()),
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap()
    }

    fn company(status: SubscriptionStatus) -> Company {
        Company {
            id: CompanyId::new(1).unwrap(),
            name: CompanyName::new("Silva Advogados").unwrap(),
            cnpj: None,
            email: "contato@silva.adv.br".into(),
            phone: None,
            address: None,
            city: None,
            state: None,
            active: true,
            api_key: None,
            subscription_status: status,
            subscription_plan: SubscriptionPlan::Basic,
            trial_ends_at: None,
            subscription_ends_at: None,
            last_payment_at: None,
            last_payment_cents: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    #[test]
    fn trial_ending_within_a_week_alerts() {
        let mut c = company(SubscriptionStatus::Trial);
        c.trial_ends_at = Some(now() + Duration::days(3));
        let alert = c.subscription_alert(now()).unwrap();
        assert_eq!(alert.kind, AlertKind::TrialEnding);
        assert_eq!(alert.days_left, Some(3));

        c.trial_ends_at = Some(now() + Duration::days(10));
        assert!(c.subscription_alert(now()).is_none());
    }

    #[test]
    fn past_due_always_alerts() {
        let alert = company(SubscriptionStatus::PastDue)
            .subscription_alert(now())
            .unwrap();
        assert_eq!(alert.kind, AlertKind::PastDue);
        assert!(company(SubscriptionStatus::Cancelled)
            .subscription_alert(now())
            .is_none());
    }

    #[test]
    fn new_trial_ends_after_trial_days() {
        let c = NewCompany::trial(
            CompanyName::new("Firma").unwrap(),
            EmailAddress::new("a@firma.com").unwrap(),
            "key".into(),
            now(),
        );
        assert_eq!(c.trial_ends_at, Some(now() + Duration::days(TRIAL_DAYS)));
        assert_eq!(c.subscription_status, SubscriptionStatus::Trial);
    }
}
