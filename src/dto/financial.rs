use serde::{Deserialize, Serialize};

use crate::domain::financial::{FinancialSummary, TransactionListItem};
use crate::pagination::Paginated;

/// Query string of the transaction listing, summary and export.
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub transaction_type: Option<String>,
    pub client_id: Option<i32>,
    pub case_id: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// Transaction page together with the totals of the whole filtered set.
#[derive(Debug, Serialize)]
pub struct TransactionPage {
    #[serde(flatten)]
    pub page: Paginated<TransactionListItem>,
    pub summary: FinancialSummary,
}
