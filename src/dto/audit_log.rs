use serde::Deserialize;

/// Query string of the audit log listings.
#[derive(Debug, Default, Deserialize)]
pub struct AuditLogParams {
    pub entity_type: Option<String>,
    pub action: Option<String>,
    pub user_id: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub search: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}
