use serde::{Deserialize, Serialize};

use crate::domain::campaign::NewRecipient;

#[derive(Debug, Default, Deserialize)]
pub struct CampaignListParams {
    pub status: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipientListParams {
    pub status: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ImportClientsParams {
    pub tag_id: Option<i32>,
}

/// Active clients offered as recipients of a new campaign.
#[derive(Debug, Serialize)]
pub struct ImportedRecipients {
    pub recipients: Vec<NewRecipient>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub message: String,
    pub total_recipients: usize,
}

/// Query string of Meta's webhook verification request.
#[derive(Debug, Default, Deserialize)]
pub struct WebhookVerifyParams {
    #[serde(rename = "hub.mode")]
    pub mode: Option<String>,
    #[serde(rename = "hub.verify_token")]
    pub verify_token: Option<String>,
    #[serde(rename = "hub.challenge")]
    pub challenge: Option<String>,
}
