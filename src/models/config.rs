//! Configuration model loaded from external sources.

use serde::Deserialize;

fn default_access_token_minutes() -> i64 {
    15
}

fn default_refresh_token_days() -> i64 {
    7
}

fn default_audit_retention_days() -> i64 {
    crate::domain::audit_log::DEFAULT_RETENTION_DAYS
}

#[derive(Clone, Debug, Deserialize)]
/// Settings shared by the HTTP server and the notifier worker.
pub struct ServerConfig {
    pub address: String,
    pub port: u16,
    pub database_url: String,
    pub static_dir: String,
    pub templates_dir: String,
    pub frontend_url: String,
    pub jwt_secret: String,
    #[serde(default = "default_access_token_minutes")]
    pub access_token_minutes: i64,
    #[serde(default = "default_refresh_token_days")]
    pub refresh_token_days: i64,
    pub zmq_notifications_pub: String,
    pub zmq_notifications_sub: String,
    pub zmq_emailer_pub: String,
    pub datajud_url: String,
    #[serde(default)]
    pub datajud_api_key: String,
    pub whatsapp_api_url: String,
    #[serde(default)]
    pub whatsapp_phone_number_id: String,
    #[serde(default)]
    pub whatsapp_access_token: String,
    /// Secret echoed by Meta when it verifies the status webhook.
    #[serde(default)]
    pub whatsapp_verify_token: String,
    pub telegram_api_url: String,
    #[serde(default)]
    pub telegram_bot_token: String,
    #[serde(default = "default_audit_retention_days")]
    pub audit_retention_days: i64,
}
