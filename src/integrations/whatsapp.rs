//! WhatsApp Cloud API template messages.

use serde::{Deserialize, Serialize};

use crate::domain::campaign::{RecipientStatus, StatusUpdate};
use crate::integrations::{IntegrationError, check_status, http_client};
use crate::models::config::ServerConfig;

#[derive(Debug, Serialize)]
struct TemplateMessage<'a> {
    messaging_product: &'static str,
    to: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    template: Template<'a>,
}

#[derive(Debug, Serialize)]
struct Template<'a> {
    name: &'a str,
    language: Language<'a>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    components: Vec<Component<'a>>,
}

#[derive(Debug, Serialize)]
struct Language<'a> {
    code: &'a str,
}

#[derive(Debug, Serialize)]
struct Component<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    parameters: Vec<Parameter<'a>>,
}

#[derive(Debug, Serialize)]
struct Parameter<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

fn template_message<'a>(
    phone: &'a str,
    template_name: &'a str,
    language: &'a str,
    variables: &'a [String],
) -> TemplateMessage<'a> {
    let components = if variables.is_empty() {
        Vec::new()
    } else {
        vec![Component {
            kind: "body",
            parameters: variables
                .iter()
                .map(|text| Parameter { kind: "text", text })
                .collect(),
        }]
    };
    TemplateMessage {
        messaging_product: "whatsapp",
        to: phone,
        kind: "template",
        template: Template {
            name: template_name,
            language: Language { code: language },
            components,
        },
    }
}

/// Delivery of approved template messages.
#[cfg_attr(feature = "test-mocks", mockall::automock)]
pub trait TemplateSender {
    /// Returns the provider's message id.
    fn send_template(
        &self,
        phone: &str,
        template_name: &str,
        language: &str,
        variables: &[String],
    ) -> Result<String, IntegrationError>;
}

pub struct WhatsAppClient {
    http: reqwest::blocking::Client,
    api_url: String,
    phone_number_id: String,
    access_token: String,
}

impl WhatsAppClient {
    pub fn new(config: &ServerConfig) -> Result<Self, IntegrationError> {
        Ok(Self {
            http: http_client()?,
            api_url: config.whatsapp_api_url.trim_end_matches('/').to_string(),
            phone_number_id: config.whatsapp_phone_number_id.clone(),
            access_token: config.whatsapp_access_token.clone(),
        })
    }
}

impl TemplateSender for WhatsAppClient {
    fn send_template(
        &self,
        phone: &str,
        template_name: &str,
        language: &str,
        variables: &[String],
    ) -> Result<String, IntegrationError> {
        if self.access_token.is_empty() || self.phone_number_id.is_empty() {
            return Err(IntegrationError::NotConfigured("whatsapp_access_token"));
        }
        let url = format!("{}/{}/messages", self.api_url, self.phone_number_id);
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&template_message(phone, template_name, language, variables))
            .send()?;
        let sent: SendResponse = check_status(response)?.json()?;
        sent.messages
            .into_iter()
            .next()
            .map(|message| message.id)
            .ok_or_else(|| IntegrationError::Api {
                status: 200,
                body: "response without message id".to_string(),
            })
    }
}

/// Notification posted by the Cloud API to the webhook endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct StatusWebhook {
    #[serde(default)]
    object: String,
    #[serde(default)]
    entry: Vec<WebhookEntry>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookEntry {
    #[serde(default)]
    changes: Vec<WebhookChange>,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookChange {
    #[serde(default)]
    field: String,
    #[serde(default)]
    value: WebhookValue,
}

#[derive(Debug, Default, Deserialize)]
struct WebhookValue {
    #[serde(default)]
    statuses: Vec<MessageStatus>,
}

#[derive(Debug, Deserialize)]
struct MessageStatus {
    id: String,
    status: String,
    #[serde(default)]
    errors: Vec<StatusError>,
}

#[derive(Debug, Deserialize)]
struct StatusError {
    code: Option<i64>,
    title: Option<String>,
    message: Option<String>,
}

impl StatusError {
    fn describe(&self) -> String {
        let text = self
            .title
            .as_deref()
            .or(self.message.as_deref())
            .unwrap_or("erro desconhecido");
        match self.code {
            Some(code) => format!("{code}: {text}"),
            None => text.to_string(),
        }
    }
}

impl StatusWebhook {
    /// Delivered, read and failed reports of message status changes.
    /// Other objects, fields and statuses are ignored.
    pub fn status_updates(self) -> Vec<StatusUpdate> {
        if self.object != "whatsapp_business_account" {
            return Vec::new();
        }
        self.entry
            .into_iter()
            .flat_map(|entry| entry.changes)
            .filter(|change| change.field == "messages")
            .flat_map(|change| change.value.statuses)
            .filter_map(|report| {
                let status = match report.status.as_str() {
                    "delivered" => RecipientStatus::Delivered,
                    "read" => RecipientStatus::Read,
                    "failed" => RecipientStatus::Failed,
                    _ => return None,
                };
                Some(StatusUpdate {
                    error_message: report.errors.first().map(StatusError::describe),
                    message_id: report.id,
                    status,
                })
            })
            .collect()
    }
}
