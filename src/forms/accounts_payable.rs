use serde::Deserialize;
use validator::Validate;

use crate::domain::accounts_payable::{PayableFields, PayableStatus, RecurrencePeriod};
use crate::forms::{FormError, clean, parse_datetime, parse_optional_datetime};

#[derive(Debug, Deserialize, Validate)]
pub struct PayableForm {
    #[validate(length(min = 1, max = 200))]
    pub supplier: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    #[validate(length(min = 1))]
    pub due_date: String,
    pub paid_date: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub is_recurring: bool,
    pub recurrence_period: Option<String>,
}

impl TryFrom<&PayableForm> for PayableFields {
    type Error = FormError;

    fn try_from(form: &PayableForm) -> Result<Self, Self::Error> {
        let supplier = clean(&Some(form.supplier.clone()))
            .ok_or_else(|| FormError::Invalid("Fornecedor é obrigatório".to_string()))?;
        let description = clean(&Some(form.description.clone()))
            .ok_or_else(|| FormError::Invalid("Descrição é obrigatória".to_string()))?;
        let status = match form.status.as_deref().map(str::trim) {
            None | Some("") => PayableStatus::Pending,
            Some(value) => value.parse()?,
        };
        let recurrence_period = match form.recurrence_period.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(value) => Some(value.parse::<RecurrencePeriod>()?),
        };
        Ok(Self {
            supplier,
            description,
            amount_cents: form.amount_cents,
            due_date: parse_datetime(&form.due_date)?,
            paid_date: parse_optional_datetime(form.paid_date.as_deref())?,
            status,
            category: clean(&form.category),
            notes: clean(&form.notes),
            is_recurring: form.is_recurring,
            recurrence_period: if form.is_recurring {
                recurrence_period.or(Some(RecurrencePeriod::Monthly))
            } else {
                None
            },
        })
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct MarkPaidForm {
    pub paid_date: Option<String>,
}
