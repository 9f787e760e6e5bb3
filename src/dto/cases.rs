use serde::Deserialize;

/// Query string of the case listing.
#[derive(Debug, Default, Deserialize)]
pub struct CaseListParams {
    pub search: Option<String>,
    pub status: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}
