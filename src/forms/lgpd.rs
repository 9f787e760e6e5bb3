use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct ConsentForm {
    #[validate(email)]
    pub email: String,
    pub consent_type: String,
    #[validate(length(min = 1, max = 20))]
    pub version: String,
}

#[derive(Debug, Deserialize)]
pub struct RevokeConsentForm {
    pub consent_type: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DataRequestForm {
    pub request_type: String,
    #[validate(length(max = 2000))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ProcessRequestForm {
    pub status: String,
    #[validate(length(max = 2000))]
    pub notes: Option<String>,
    #[validate(length(max = 2000))]
    pub rejection_reason: Option<String>,
}
