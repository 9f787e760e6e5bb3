//! LGPD consent records and data-subject requests.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::company::Company;
use crate::domain::types::{CompanyId, ConsentId, DataRequestId, UserId, text_enum};
use crate::domain::user::User;

/// Name written over an anonymized account.
pub const ANONYMIZED_NAME: &str = "[DADOS REMOVIDOS]";

text_enum!(
    ConsentType {
        PrivacyPolicy => "PRIVACY_POLICY",
        TermsOfUse => "TERMS_OF_USE",
        MarketingEmail => "MARKETING_EMAIL",
        DataProcessing => "DATA_PROCESSING",
    }
);

text_enum!(
    RequestType {
        Access => "ACCESS",
        Correction => "CORRECTION",
        Deletion => "DELETION",
        Portability => "PORTABILITY",
        RevokeConsent => "REVOKE_CONSENT",
    }
);

text_enum!(
    RequestStatus {
        Pending => "PENDING",
        InProgress => "IN_PROGRESS",
        Completed => "COMPLETED",
        Rejected => "REJECTED",
    }
);

impl RequestStatus {
    /// Pending and in-progress requests block a new one of the same type.
    pub fn is_open(&self) -> bool {
        matches!(self, RequestStatus::Pending | RequestStatus::InProgress)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ConsentLog {
    pub id: ConsentId,
    pub user_id: Option<UserId>,
    pub email: String,
    pub consent_type: ConsentType,
    pub version: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
    pub consented_at: NaiveDateTime,
    pub revoked_at: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewConsentLog {
    pub user_id: Option<UserId>,
    pub email: String,
    pub consent_type: ConsentType,
    pub version: String,
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DataRequest {
    pub id: DataRequestId,
    pub user_id: UserId,
    pub company_id: Option<CompanyId>,
    pub request_type: RequestType,
    pub status: RequestStatus,
    pub description: Option<String>,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Pending request together with the requester's identity.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct DataRequestWithUser {
    #[serde(flatten)]
    pub request: DataRequest,
    pub user_name: String,
    pub user_email: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewDataRequest {
    pub user_id: UserId,
    pub company_id: Option<CompanyId>,
    pub request_type: RequestType,
    pub description: Option<String>,
}

/// Fields written when an administrator moves a request forward.
#[derive(Clone, Debug, PartialEq)]
pub struct RequestProcessing {
    pub status: RequestStatus,
    pub notes: Option<String>,
    pub rejection_reason: Option<String>,
    pub processed_by: Option<UserId>,
    pub processed_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
}

/// Counts included in the personal data export.
#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct DataStatistics {
    pub clients: i64,
    pub cases: i64,
    pub events: i64,
    pub transactions: i64,
    pub consents: i64,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct PersonalDataExport {
    pub user: User,
    pub company: Option<Company>,
    pub consents: Vec<ConsentLog>,
    pub requests: Vec<DataRequest>,
    pub statistics: DataStatistics,
    pub exported_at: NaiveDateTime,
}

/// Throwaway address that keeps the unique email constraint satisfied.
pub fn anonymized_email(timestamp_millis: i64) -> String {
    format!("anonimo_{timestamp_millis}@removido.lgpd")
}

/// Note appended to a completed portability request.
pub fn portability_note(existing: Option<&str>, now: NaiveDateTime) -> String {
    let note = format!(
        "Dados exportados em {} e disponibilizados ao titular.",
        now.format("%d/%m/%Y %H:%M")
    );
    match existing.map(str::trim).filter(|s| !s.is_empty()) {
        Some(existing) => format!("{existing}\n{note}"),
        None => note,
    }
}

/// Keeps only the newest consent per type. Input must be sorted newest first.
pub fn latest_per_type(consents: Vec<ConsentLog>) -> Vec<ConsentLog> {
    let mut seen = Vec::new();
    consents
        .into_iter()
        .filter(|consent| {
            if seen.contains(&consent.consent_type) {
                false
            } else {
                seen.push(consent.consent_type);
                true
            }
        })
        .collect()
}
