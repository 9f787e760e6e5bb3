use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::types::{CompanyId, EmailAddress, PersonName, TypeConstraintError, UserId};
use crate::domain::user::{
    NewUser as DomainNewUser, User as DomainUser, UserSummary as DomainUserSummary,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct User {
    pub id: i32,
    pub company_id: Option<i32>,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub active: bool,
    pub email_verified: bool,
    pub email_verification_token: Option<String>,
    pub email_verification_expiry: Option<NaiveDateTime>,
    pub reset_token: Option<String>,
    pub reset_token_expiry: Option<NaiveDateTime>,
    pub failed_login_attempts: i32,
    pub account_locked_until: Option<NaiveDateTime>,
    pub tokens_invalidated_at: Option<NaiveDateTime>,
    pub telegram_chat_id: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Columns needed to display a user next to another record.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct UserSummary {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub telegram_chat_id: Option<String>,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::users)]
pub struct NewUser<'a> {
    pub company_id: Option<i32>,
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub role: &'a str,
    pub email_verified: bool,
    pub email_verification_token: Option<&'a str>,
    pub email_verification_expiry: Option<NaiveDateTime>,
}

/// Profile changes made by an administrator. The password hash is only
/// written when present.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
pub struct UpdateUser<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password_hash: Option<&'a str>,
    pub active: bool,
    pub updated_at: NaiveDateTime,
}

/// Login bookkeeping after a password check.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct LoginAttempts {
    pub failed_login_attempts: i32,
    pub account_locked_until: Option<NaiveDateTime>,
}

/// Sets or clears a one-time token and its expiry.
#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct ResetTokenChangeset<'a> {
    pub reset_token: Option<&'a str>,
    pub reset_token_expiry: Option<NaiveDateTime>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::users)]
#[diesel(treat_none_as_null = true)]
pub struct VerificationChangeset<'a> {
    pub email_verified: bool,
    pub email_verification_token: Option<&'a str>,
    pub email_verification_expiry: Option<NaiveDateTime>,
}

impl TryFrom<User> for DomainUser {
    type Error = TypeConstraintError;

    fn try_from(row: User) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id)?,
            company_id: row.company_id.map(CompanyId::new).transpose()?,
            name: PersonName::new(row.name)?,
            email: EmailAddress::new(row.email)?,
            password_hash: row.password_hash,
            role: row.role.parse()?,
            active: row.active,
            email_verified: row.email_verified,
            email_verification_token: row.email_verification_token,
            email_verification_expiry: row.email_verification_expiry,
            reset_token: row.reset_token,
            reset_token_expiry: row.reset_token_expiry,
            failed_login_attempts: row.failed_login_attempts,
            account_locked_until: row.account_locked_until,
            tokens_invalidated_at: row.tokens_invalidated_at,
            telegram_chat_id: row.telegram_chat_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<UserSummary> for DomainUserSummary {
    type Error = TypeConstraintError;

    fn try_from(row: UserSummary) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::new(row.id)?,
            name: row.name,
            email: row.email,
            telegram_chat_id: row.telegram_chat_id,
        })
    }
}

impl<'a> From<&'a DomainNewUser> for NewUser<'a> {
    fn from(user: &'a DomainNewUser) -> Self {
        Self {
            company_id: user.company_id.map(CompanyId::get),
            name: user.name.as_str(),
            email: user.email.as_str(),
            password_hash: user.password_hash.as_str(),
            role: user.role.as_str(),
            email_verified: user.email_verified,
            email_verification_token: user.email_verification_token.as_deref(),
            email_verification_expiry: user.email_verification_expiry,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::types::Role;

    #[test]
    fn super_admin_without_company_converts() {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let row = User {
            id: 1,
            company_id: None,
            name: "Root".into(),
            email: "ROOT@advwell.com.br".into(),
            password_hash: "hash".into(),
            role: "SUPER_ADMIN".into(),
            active: true,
            email_verified: true,
            email_verification_token: None,
            email_verification_expiry: None,
            reset_token: None,
            reset_token_expiry: None,
            failed_login_attempts: 0,
            account_locked_until: None,
            tokens_invalidated_at: None,
            telegram_chat_id: None,
            created_at: now,
            updated_at: now,
        };
        let user = DomainUser::try_from(row).unwrap();
        assert_eq!(user.role, Role::SuperAdmin);
        assert_eq!(user.company_id, None);
        assert_eq!(user.email.as_str(), "root@advwell.com.br");
    }
}
