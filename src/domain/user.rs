use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::company::CompanySummary;
use crate::domain::types::{CompanyId, EmailAddress, PersonName, Role, UserId};

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct User {
    pub id: UserId,
    pub company_id: Option<CompanyId>,
    pub name: PersonName,
    pub email: EmailAddress,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub email_verified: bool,
    #[serde(skip_serializing)]
    pub email_verification_token: Option<String>,
    #[serde(skip_serializing)]
    pub email_verification_expiry: Option<NaiveDateTime>,
    #[serde(skip_serializing)]
    pub reset_token: Option<String>,
    #[serde(skip_serializing)]
    pub reset_token_expiry: Option<NaiveDateTime>,
    #[serde(skip_serializing)]
    pub failed_login_attempts: i32,
    #[serde(skip_serializing)]
    pub account_locked_until: Option<NaiveDateTime>,
    #[serde(skip_serializing)]
    pub tokens_invalidated_at: Option<NaiveDateTime>,
    pub telegram_chat_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl User {
    pub fn is_locked(&self, now: NaiveDateTime) -> bool {
        self.account_locked_until.is_some_and(|until| until > now)
    }
}

/// Name and contact of a user, used where full records are not needed.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub telegram_chat_id: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            telegram_chat_id: user.telegram_chat_id.clone(),
        }
    }
}

/// `me` payload: the user plus a summary of their company.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct UserProfile {
    #[serde(flatten)]
    pub user: User,
    pub company: Option<CompanySummary>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewUser {
    pub company_id: Option<CompanyId>,
    pub name: PersonName,
    pub email: EmailAddress,
    pub password_hash: String,
    pub role: Role,
    pub email_verified: bool,
    pub email_verification_token: Option<String>,
    pub email_verification_expiry: Option<NaiveDateTime>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateUser {
    pub name: PersonName,
    pub email: EmailAddress,
    /// New hash when the password changes.
    pub password_hash: Option<String>,
    pub active: bool,
}
