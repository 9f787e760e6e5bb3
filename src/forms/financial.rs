use serde::Deserialize;
use validator::Validate;

use crate::domain::financial::{
    DEFAULT_INSTALLMENT_INTERVAL_DAYS, InstallmentStatus, MAX_INSTALLMENT_INTERVAL_DAYS,
    MAX_INSTALLMENTS, TransactionFields, TransactionType,
};
use crate::domain::types::{CaseId, ClientId};
use crate::forms::{FormError, clean, parse_datetime, parse_optional_datetime};

#[derive(Debug, Deserialize, Validate)]
pub struct TransactionForm {
    pub client_id: i32,
    pub case_id: Option<i32>,
    #[serde(rename = "type", alias = "transaction_type")]
    pub transaction_type: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(range(min = 1))]
    pub amount_cents: i64,
    #[validate(length(min = 1))]
    pub date: String,
    #[serde(default)]
    pub is_installment_payment: bool,
    #[validate(range(min = 2, max = 120))]
    pub installment_count: Option<i32>,
    #[validate(range(min = 1, max = 366))]
    pub installment_interval: Option<i64>,
}

impl TransactionForm {
    pub fn fields(&self) -> Result<TransactionFields, FormError> {
        let transaction_type = TransactionType::from_label(&self.transaction_type).ok_or_else(
            || FormError::Invalid("Tipo deve ser INCOME ou EXPENSE".to_string()),
        )?;
        let description = clean(&Some(self.description.clone()))
            .ok_or_else(|| FormError::Invalid("Descrição é obrigatória".to_string()))?;
        if self.amount_cents <= 0 {
            return Err(FormError::Invalid("Valor deve ser maior que zero".to_string()));
        }
        Ok(TransactionFields {
            client_id: ClientId::new(self.client_id)?,
            case_id: self.case_id.map(CaseId::new).transpose()?,
            transaction_type,
            description,
            amount_cents: self.amount_cents,
            date: parse_datetime(&self.date)?,
        })
    }

    /// Installment plan as `(count, interval_days)` when requested.
    pub fn installment_plan(&self) -> Result<Option<(i32, i64)>, FormError> {
        if !self.is_installment_payment {
            return Ok(None);
        }
        let count = self.installment_count.unwrap_or(0);
        if !(2..=MAX_INSTALLMENTS).contains(&count) {
            return Err(FormError::Invalid(format!(
                "Número de parcelas deve estar entre 2 e {MAX_INSTALLMENTS}"
            )));
        }
        let interval = self
            .installment_interval
            .unwrap_or(DEFAULT_INSTALLMENT_INTERVAL_DAYS);
        if !(1..=MAX_INSTALLMENT_INTERVAL_DAYS).contains(&interval) {
            return Err(FormError::Invalid(format!(
                "Intervalo entre parcelas deve estar entre 1 e {MAX_INSTALLMENT_INTERVAL_DAYS} dias"
            )));
        }
        Ok(Some((count, interval)))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct InstallmentForm {
    #[validate(range(min = 1))]
    pub amount_cents: Option<i64>,
    pub due_date: Option<String>,
    pub paid_date: Option<String>,
    pub paid_amount_cents: Option<i64>,
    pub status: Option<String>,
    pub notes: Option<String>,
}

impl InstallmentForm {
    pub fn status(&self) -> Result<Option<InstallmentStatus>, FormError> {
        match self.status.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(value) => Ok(Some(value.parse()?)),
        }
    }

    pub fn due_date(&self) -> Result<Option<chrono::NaiveDateTime>, FormError> {
        parse_optional_datetime(self.due_date.as_deref())
    }

    pub fn paid_date(&self) -> Result<Option<chrono::NaiveDateTime>, FormError> {
        parse_optional_datetime(self.paid_date.as_deref())
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct PayInstallmentForm {
    pub paid_date: Option<String>,
    pub paid_amount_cents: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> TransactionForm {
        TransactionForm {
            client_id: 1,
            case_id: None,
            transaction_type: "Receita".into(),
            description: "Honorários".into(),
            amount_cents: 100_000,
            date: "2025-01-15".into(),
            is_installment_payment: true,
            installment_count: Some(3),
            installment_interval: None,
        }
    }

    #[test]
    fn accepts_portuguese_type_labels() {
        let fields = form().fields().unwrap();
        assert_eq!(fields.transaction_type, TransactionType::Income);
    }

    #[test]
    fn plan_defaults_interval_to_thirty_days() {
        assert_eq!(form().installment_plan().unwrap(), Some((3, 30)));
    }

    #[test]
    fn single_installment_is_rejected() {
        let mut form = form();
        form.installment_count = Some(1);
        assert!(form.installment_plan().is_err());
    }

    #[test]
    fn plan_limits_are_enforced() {
        let mut huge_interval = form();
        huge_interval.installment_interval = Some(100_000_000);
        assert!(huge_interval.installment_plan().is_err());
        assert!(huge_interval.validate().is_err());

        let mut too_many = form();
        too_many.installment_count = Some(5_000_000);
        assert!(too_many.installment_plan().is_err());
        assert!(too_many.validate().is_err());

        let mut yearly = form();
        yearly.installment_count = Some(120);
        yearly.installment_interval = Some(366);
        assert_eq!(yearly.installment_plan().unwrap(), Some((120, 366)));
    }

    #[test]
    fn zero_amount_is_rejected() {
        let mut form = form();
        form.amount_cents = 0;
        assert!(form.fields().is_err());
    }
}
