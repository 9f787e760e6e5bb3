use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

use crate::domain::types::{
    CaseId, ClientId, CompanyId, InstallmentId, TransactionId, TypeConstraintError, text_enum,
};

/// Days between installments when none is given.
pub const DEFAULT_INSTALLMENT_INTERVAL_DAYS: i64 = 30;
pub const MAX_INSTALLMENTS: i32 = 120;
pub const MAX_INSTALLMENT_INTERVAL_DAYS: i64 = 366;

text_enum!(
    TransactionType {
        Income => "INCOME",
        Expense => "EXPENSE",
    }
);

text_enum!(
    InstallmentStatus {
        Pending => "PENDING",
        Paid => "PAID",
        Overdue => "OVERDUE",
        Cancelled => "CANCELLED",
    }
);

impl TransactionType {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionType::Income => "Receita",
            TransactionType::Expense => "Despesa",
        }
    }

    /// Accepts the wire spelling or the Portuguese label.
    pub fn from_label(value: &str) -> Option<Self> {
        match value.trim().to_uppercase().as_str() {
            "INCOME" | "RECEITA" => Some(TransactionType::Income),
            "EXPENSE" | "DESPESA" => Some(TransactionType::Expense),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct FinancialTransaction {
    pub id: TransactionId,
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub case_id: Option<CaseId>,
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount_cents: i64,
    pub date: NaiveDateTime,
    pub is_installment_payment: bool,
    pub installment_count: Option<i32>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Transaction row enriched with the names shown in lists and exports.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TransactionListItem {
    #[serde(flatten)]
    pub transaction: FinancialTransaction,
    pub client_name: String,
    pub client_cpf: Option<String>,
    pub process_number: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TransactionDetails {
    #[serde(flatten)]
    pub item: TransactionListItem,
    pub installments: Vec<Installment>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Installment {
    pub id: InstallmentId,
    pub transaction_id: TransactionId,
    pub installment_number: i32,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub paid_amount_cents: Option<i64>,
    pub status: InstallmentStatus,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewInstallment {
    pub installment_number: i32,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateInstallment {
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub paid_amount_cents: Option<i64>,
    pub status: InstallmentStatus,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TransactionFields {
    pub client_id: ClientId,
    pub case_id: Option<CaseId>,
    pub transaction_type: TransactionType,
    pub description: String,
    pub amount_cents: i64,
    pub date: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTransaction {
    pub company_id: CompanyId,
    pub fields: TransactionFields,
    pub installments: Vec<NewInstallment>,
}

/// Totals over a filtered set of transactions.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct FinancialSummary {
    pub total_income: i64,
    pub total_expense: i64,
    pub balance: i64,
    pub income_count: i64,
    pub expense_count: i64,
}

impl FinancialSummary {
    pub fn from_totals(
        total_income: i64,
        total_expense: i64,
        income_count: i64,
        expense_count: i64,
    ) -> Self {
        Self {
            total_income,
            total_expense,
            balance: total_income - total_expense,
            income_count,
            expense_count,
        }
    }
}

/// Splits `total_cents` into `count` installments `interval_days` apart.
/// The last installment absorbs the rounding remainder.
pub fn split_installments(
    total_cents: i64,
    count: i32,
    first_due: NaiveDateTime,
    interval_days: i64,
) -> Result<Vec<NewInstallment>, TypeConstraintError> {
    if !(2..=MAX_INSTALLMENTS).contains(&count) {
        return Err(TypeConstraintError::InvalidValue(format!(
            "installment count must be between 2 and {MAX_INSTALLMENTS}"
        )));
    }
    if !(1..=MAX_INSTALLMENT_INTERVAL_DAYS).contains(&interval_days) {
        return Err(TypeConstraintError::InvalidValue(format!(
            "installment interval must be between 1 and {MAX_INSTALLMENT_INTERVAL_DAYS} days"
        )));
    }
    if total_cents <= 0 {
        return Err(TypeConstraintError::InvalidValue(
            "amount must be positive".into(),
        ));
    }

    let base = total_cents / i64::from(count);
    let remainder = total_cents - base * i64::from(count);

    (1..=count)
        .map(|number| {
            let due_date = interval_days
                .checked_mul(i64::from(number - 1))
                .and_then(Duration::try_days)
                .and_then(|offset| first_due.checked_add_signed(offset))
                .ok_or_else(|| {
                    TypeConstraintError::InvalidValue("installment due date out of range".into())
                })?;
            Ok(NewInstallment {
                installment_number: number,
                amount_cents: if number == count { base + remainder } else { base },
                due_date,
            })
        })
        .collect()
}
