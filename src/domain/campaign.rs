//! WhatsApp template campaigns and their recipients.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{
    CampaignId, CampaignName, ClientId, CompanyId, RecipientId, UserId, text_enum,
};

pub const MAX_RECIPIENTS: usize = 500;
pub const DEFAULT_TEMPLATE_LANGUAGE: &str = "pt_BR";
/// Error stored on recipients that were still pending when a campaign was cancelled.
pub const CANCELLED_MESSAGE: &str = "Campanha cancelada";

text_enum!(
    CampaignStatus {
        Draft => "draft",
        Sending => "sending",
        Completed => "completed",
        Cancelled => "cancelled",
    }
);

text_enum!(
    RecipientStatus {
        Pending => "pending",
        Sent => "sent",
        Delivered => "delivered",
        Read => "read",
        Failed => "failed",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Campaign {
    pub id: CampaignId,
    pub company_id: CompanyId,
    pub name: CampaignName,
    pub template_name: String,
    pub language: String,
    pub status: CampaignStatus,
    pub total_recipients: i32,
    pub sent_count: i32,
    pub delivered_count: i32,
    pub read_count: i32,
    pub failed_count: i32,
    pub created_by: Option<UserId>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Recipient {
    pub id: RecipientId,
    pub campaign_id: CampaignId,
    pub client_id: Option<ClientId>,
    pub phone: String,
    pub name: Option<String>,
    pub status: RecipientStatus,
    pub message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct NewRecipient {
    pub client_id: Option<ClientId>,
    pub phone: String,
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CampaignFields {
    pub name: CampaignName,
    pub template_name: String,
    pub language: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCampaign {
    pub company_id: CompanyId,
    pub created_by: Option<UserId>,
    pub fields: CampaignFields,
    pub recipients: Vec<NewRecipient>,
}

impl RecipientStatus {
    /// Whether a provider status report may move a recipient from `self` to
    /// `next`. Reports arrive out of order, so a recipient never moves back.
    pub fn can_advance_to(self, next: RecipientStatus) -> bool {
        use RecipientStatus::*;
        matches!(
            (self, next),
            (Sent, Delivered) | (Sent | Delivered, Read) | (Pending | Sent, Failed)
        )
    }
}

/// Status reported by the provider for a message it accepted earlier.
#[derive(Clone, Debug, PartialEq)]
pub struct StatusUpdate {
    pub message_id: String,
    pub status: RecipientStatus,
    pub error_message: Option<String>,
}

/// Delivery outcome reported for one recipient.
#[derive(Clone, Debug, PartialEq)]
pub struct RecipientDelivery {
    pub status: RecipientStatus,
    pub message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
}

/// Recipient counts by status.
#[derive(Clone, Copy, Debug, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub total: i64,
    pub pending: i64,
    pub sent: i64,
    pub delivered: i64,
    pub read: i64,
    pub failed: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: RecipientStatus, count: i64) {
        self.total += count;
        match status {
            RecipientStatus::Pending => self.pending += count,
            RecipientStatus::Sent => self.sent += count,
            RecipientStatus::Delivered => self.delivered += count,
            RecipientStatus::Read => self.read += count,
            RecipientStatus::Failed => self.failed += count,
        }
    }

    /// Messages that left the queue successfully, whatever happened afterwards.
    pub fn sent_total(&self) -> i64 {
        self.sent + self.delivered + self.read
    }

    pub fn delivery_rate(&self) -> f64 {
        percentage(self.delivered + self.read, self.total)
    }

    pub fn read_rate(&self) -> f64 {
        percentage(self.read, self.total)
    }
}

/// Denormalized counters written back to the campaign row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CampaignCounters {
    pub sent_count: i32,
    pub delivered_count: i32,
    pub read_count: i32,
    pub failed_count: i32,
}

impl From<&StatusCounts> for CampaignCounters {
    fn from(counts: &StatusCounts) -> Self {
        let clamp = |value: i64| i32::try_from(value).unwrap_or(i32::MAX);
        Self {
            sent_count: clamp(counts.sent_total()),
            delivered_count: clamp(counts.delivered),
            read_count: clamp(counts.read),
            failed_count: clamp(counts.failed),
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CampaignStats {
    pub campaign: Campaign,
    pub counts: StatusCounts,
    pub delivery_rate: f64,
    pub read_rate: f64,
}

impl CampaignStats {
    pub fn new(campaign: Campaign, counts: StatusCounts) -> Self {
        Self {
            delivery_rate: counts.delivery_rate(),
            read_rate: counts.read_rate(),
            campaign,
            counts,
        }
    }
}

/// Aggregate over all campaigns of a company.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CompanyCampaignStats {
    pub total_campaigns: i64,
    pub campaigns_by_status: Vec<(CampaignStatus, i64)>,
    pub messages: StatusCounts,
    pub delivery_rate: f64,
    pub read_rate: f64,
}

fn percentage(part: i64, total: i64) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

/// Reduces a phone to the digits WhatsApp expects, adding Brazil's country
/// code to bare 10 or 11 digit numbers.
pub fn normalize_whatsapp_phone(value: &str) -> String {
    let digits: String = value.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        12 | 13 if digits.starts_with("55") => digits,
        10 | 11 => format!("55{digits}"),
        _ => digits,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_whatsapp_phone("(11) 98765-4321"), "5511987654321");
        assert_eq!(normalize_whatsapp_phone("+55 21 3333-4444"), "552133334444");
        assert_eq!(normalize_whatsapp_phone("2133334444"), "552133334444");
        assert_eq!(normalize_whatsapp_phone("12345"), "12345");
    }

    #[test]
    fn sent_count_includes_later_states() {
        let mut counts = StatusCounts::default();
        counts.add(RecipientStatus::Sent, 2);
        counts.add(RecipientStatus::Delivered, 3);
        counts.add(RecipientStatus::Read, 1);
        counts.add(RecipientStatus::Failed, 2);
        counts.add(RecipientStatus::Pending, 2);

        let counters = CampaignCounters::from(&counts);
        assert_eq!(counters.sent_count, 6);
        assert_eq!(counters.failed_count, 2);
        assert_eq!(counts.total, 10);
        assert!((counts.delivery_rate() - 40.0).abs() < f64::EPSILON);
        assert!((counts.read_rate() - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn provider_reports_only_move_forward() {
        use RecipientStatus::*;
        assert!(Sent.can_advance_to(Delivered));
        assert!(Delivered.can_advance_to(Read));
        assert!(Sent.can_advance_to(Read));
        assert!(Sent.can_advance_to(Failed));
        assert!(!Read.can_advance_to(Delivered));
        assert!(!Delivered.can_advance_to(Failed));
        assert!(!Pending.can_advance_to(Delivered));
        assert!(!Failed.can_advance_to(Read));
    }

    #[test]
    fn empty_rates_are_zero() {
        assert_eq!(StatusCounts::default().delivery_rate(), 0.0);
    }
}
