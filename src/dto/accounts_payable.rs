use serde::{Deserialize, Serialize};

use crate::domain::accounts_payable::AccountPayable;

/// Query string of the payable listing.
#[derive(Debug, Default, Deserialize)]
pub struct PayableListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub category: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StatementParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Paid bill and, for recurring bills, the occurrence created after it.
#[derive(Debug, Serialize)]
pub struct MarkPaidResponse {
    pub payable: AccountPayable,
    pub next: Option<AccountPayable>,
}
