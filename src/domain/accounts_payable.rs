use chrono::{Duration, Months, NaiveDateTime};
use serde::Serialize;

use crate::domain::types::{CompanyId, PayableId, UserId, text_enum};

text_enum!(
    PayableStatus {
        Pending => "PENDING",
        Paid => "PAID",
        Overdue => "OVERDUE",
        Cancelled => "CANCELLED",
    }
);

text_enum!(
    /// How often a recurring bill repeats. Monthly is the fallback.
    RecurrencePeriod {
        Days15 => "DAYS_15",
        Days30 => "DAYS_30",
        Monthly => "MONTHLY",
        Months6 => "MONTHS_6",
        Year1 => "YEAR_1",
    }
);

impl RecurrencePeriod {
    /// Due date of the following occurrence.
    pub fn advance(&self, due: NaiveDateTime) -> NaiveDateTime {
        let by_months = |months: u32| due.checked_add_months(Months::new(months)).unwrap_or(due);
        match self {
            RecurrencePeriod::Days15 => due + Duration::days(15),
            RecurrencePeriod::Days30 => due + Duration::days(30),
            RecurrencePeriod::Months6 => by_months(6),
            RecurrencePeriod::Year1 => by_months(12),
            RecurrencePeriod::Monthly => by_months(1),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AccountPayable {
    pub id: PayableId,
    pub company_id: CompanyId,
    pub supplier: String,
    pub description: String,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub status: PayableStatus,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_period: Option<RecurrencePeriod>,
    pub parent_id: Option<PayableId>,
    pub created_by: Option<UserId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PayableFields {
    pub supplier: String,
    pub description: String,
    pub amount_cents: i64,
    pub due_date: NaiveDateTime,
    pub paid_date: Option<NaiveDateTime>,
    pub status: PayableStatus,
    pub category: Option<String>,
    pub notes: Option<String>,
    pub is_recurring: bool,
    pub recurrence_period: Option<RecurrencePeriod>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAccountPayable {
    pub company_id: CompanyId,
    pub created_by: Option<UserId>,
    pub parent_id: Option<PayableId>,
    pub fields: PayableFields,
}

impl AccountPayable {
    /// Next pending entry of a recurring bill, if the bill recurs.
    pub fn next_occurrence(&self) -> Option<NewAccountPayable> {
        if !self.is_recurring {
            return None;
        }
        let period = self.recurrence_period?;
        Some(NewAccountPayable {
            company_id: self.company_id,
            created_by: self.created_by,
            parent_id: Some(self.parent_id.unwrap_or(self.id)),
            fields: PayableFields {
                supplier: self.supplier.clone(),
                description: self.description.clone(),
                amount_cents: self.amount_cents,
                due_date: period.advance(self.due_date),
                paid_date: None,
                status: PayableStatus::Pending,
                category: self.category.clone(),
                notes: self.notes.clone(),
                is_recurring: true,
                recurrence_period: Some(period),
            },
        })
    }
}

/// Sum and count of bills in one status.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct StatusTotal {
    pub status: PayableStatus,
    pub count: i64,
    pub total_cents: i64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PayableStatement {
    pub start_date: Option<NaiveDateTime>,
    pub end_date: Option<NaiveDateTime>,
    pub by_status: Vec<StatusTotal>,
    pub total_cents: i64,
}

impl PayableStatement {
    pub fn new(
        start_date: Option<NaiveDateTime>,
        end_date: Option<NaiveDateTime>,
        by_status: Vec<StatusTotal>,
    ) -> Self {
        let total_cents = by_status.iter().map(|s| s.total_cents).sum();
        Self {
            start_date,
            end_date,
            by_status,
            total_cents,
        }
    }
}
