use serde::{Deserialize, Serialize};

use crate::domain::company::Company;
use crate::domain::user::User;

/// `search`, `page` and `limit` of the company and user listings.
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub search: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ApiKeyResponse {
    pub api_key: String,
}

/// Result of creating a company from the super admin console.
#[derive(Debug, Serialize)]
pub struct CompanyWithAdmin {
    pub company: Company,
    pub admin: User,
}

/// Own-company view with its user count.
#[derive(Debug, Serialize)]
pub struct CompanyOverview {
    #[serde(flatten)]
    pub company: Company,
    pub users_count: usize,
}
