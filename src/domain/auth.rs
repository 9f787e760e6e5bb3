//! Authentication primitives: JWT claims, token types and lockout policy.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{CompanyId, Role, TypeConstraintError, UserId, text_enum};

/// Failed password attempts tolerated before the account is locked.
pub const MAX_FAILED_LOGIN_ATTEMPTS: i32 = 5;
/// Minutes an account stays locked after too many failures.
pub const LOCKOUT_MINUTES: i64 = 15;
/// Lifetime of an email verification token.
pub const VERIFICATION_TOKEN_HOURS: i64 = 24;
/// Lifetime of a password reset token.
pub const RESET_TOKEN_HOURS: i64 = 1;
/// Minimum accepted password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

text_enum!(
    /// Distinguishes short-lived access tokens from refresh tokens.
    TokenType {
        Access => "access",
        Refresh => "refresh",
    }
);

/// Claims carried by every issued JWT. Doubles as the authenticated principal
/// extracted from incoming requests.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AuthenticatedUser {
    pub sub: i32,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub company_id: Option<i32>,
    pub jti: String,
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
}

impl AuthenticatedUser {
    pub fn user_id(&self) -> Result<UserId, TypeConstraintError> {
        UserId::new(self.sub)
    }

    pub fn company(&self) -> Option<CompanyId> {
        self.company_id.and_then(|id| CompanyId::new(id).ok())
    }

    pub fn is_super_admin(&self) -> bool {
        self.role == Role::SuperAdmin
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Pair returned on successful login.
#[derive(Clone, Debug, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// A token explicitly revoked before its natural expiry.
#[derive(Clone, Debug, PartialEq)]
pub struct RevokedToken {
    pub jti: String,
    pub user_id: UserId,
    pub expires_at: NaiveDateTime,
}

/// Outcome of a wrong password: the new attempt counter and, once the limit
/// is reached, the instant until which the account is locked.
pub fn register_failed_attempt(
    previous_attempts: i32,
    now: NaiveDateTime,
) -> (i32, Option<NaiveDateTime>) {
    let attempts = previous_attempts + 1;
    if attempts >= MAX_FAILED_LOGIN_ATTEMPTS {
        (attempts, Some(now + Duration::minutes(LOCKOUT_MINUTES)))
    } else {
        (attempts, None)
    }
}

/// Whole minutes (rounded up) until a locked account opens again.
pub fn minutes_until_unlock(locked_until: NaiveDateTime, now: NaiveDateTime) -> i64 {
    let seconds = (locked_until - now).num_seconds().max(0);
    (seconds + 59) / 60
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, 10)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn fifth_failure_locks_account() {
        assert_eq!(register_failed_attempt(0, at(10, 0)), (1, None));
        assert_eq!(register_failed_attempt(3, at(10, 0)), (4, None));
        assert_eq!(
            register_failed_attempt(4, at(10, 0)),
            (5, Some(at(10, 15)))
        );
    }

    #[test]
    fn remaining_minutes_round_up() {
        let now = at(10, 0);
        let until = now + Duration::seconds(61);
        assert_eq!(minutes_until_unlock(until, now), 2);
        assert_eq!(minutes_until_unlock(now, until), 0);
    }

    #[test]
    fn claims_expose_company() {
        let user = AuthenticatedUser {
            sub: 3,
            email: "a@b.com".into(),
            name: "A".into(),
            role: Role::User,
            company_id: Some(9),
            jti: "x".into(),
            token_type: TokenType::Access,
            iat: 0,
            exp: 0,
        };
        assert_eq!(user.company().map(CompanyId::get), Some(9));
        assert!(!user.is_admin());
        assert_eq!(user.user_id().map(UserId::get), Ok(3));
    }
}
