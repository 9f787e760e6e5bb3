use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct TokenShareForm {
    pub provider_company_id: i32,
    pub client_company_id: i32,
    #[validate(range(min = 1))]
    pub token_limit: i64,
    pub enabled: Option<bool>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateTokenShareForm {
    #[validate(range(min = 1))]
    pub token_limit: Option<i64>,
    pub enabled: Option<bool>,
}
