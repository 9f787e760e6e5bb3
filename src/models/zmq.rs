//! Messages exchanged over ZeroMQ between the API, the notifier and the
//! external emailer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Work item published by the API and consumed by the notifier.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NotificationJob {
    /// Rendered by the notifier with tera and forwarded to the emailer.
    Email {
        to: String,
        subject: String,
        template: String,
        context: BTreeMap<String, String>,
    },
    Telegram {
        chat_id: String,
        text: String,
    },
    /// One recipient of a bulk campaign.
    CampaignMessage {
        campaign_id: i32,
        recipient_id: i32,
        phone: String,
        template_name: String,
        language: String,
        variables: Vec<String>,
    },
    /// One-off template message outside any campaign.
    WhatsAppTemplate {
        phone: String,
        template_name: String,
        language: String,
        variables: Vec<String>,
    },
}

/// Payload understood by the emailer service.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct ZmqEmailMessage {
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jobs_are_tagged_by_kind() {
        let job = NotificationJob::Telegram {
            chat_id: "42".into(),
            text: "<b>Oi</b>".into(),
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["kind"], "telegram");

        let parsed: NotificationJob = serde_json::from_value(json).unwrap();
        assert_eq!(parsed, job);
    }

    #[test]
    fn campaign_job_kind_is_snake_case() {
        let job = NotificationJob::CampaignMessage {
            campaign_id: 1,
            recipient_id: 2,
            phone: "5511999990000".into(),
            template_name: "boas_vindas".into(),
            language: "pt_BR".into(),
            variables: vec!["Maria".into()],
        };
        let json = serde_json::to_value(&job).unwrap();
        assert_eq!(json["kind"], "campaign_message");
    }
}
