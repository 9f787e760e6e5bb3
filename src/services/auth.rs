//! Registration, login and the JWT lifecycle.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{DateTime, Duration, NaiveDateTime};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;
use validator::Validate;

use crate::domain::auth::{
    AuthenticatedUser, RESET_TOKEN_HOURS, RevokedToken, TokenPair, TokenType,
    VERIFICATION_TOKEN_HOURS, minutes_until_unlock, register_failed_attempt,
};
use crate::domain::company::{CompanySummary, NewCompany};
use crate::domain::types::{CompanyName, EmailAddress, PersonName, Role};
use crate::domain::user::{NewUser, User, UserProfile};
use crate::dto::auth::{AccessTokenResponse, LoginResponse, MessageResponse};
use crate::forms::auth::{
    EmailForm, LoginForm, RefreshForm, RegisterForm, ResetPasswordForm, VerifyEmailForm,
};
use crate::models::config::ServerConfig;
use crate::repository::{CompanyReader, CompanyWriter, UserReader, UserWriter};
use crate::services::notifications::{
    NotificationQueue, RESET_PASSWORD_TEMPLATE, VERIFY_EMAIL_TEMPLATE, email_job, publish,
};
use crate::services::{
    INACTIVE_COMPANY_MESSAGE, ServiceError, ServiceResult, UNAUTHORIZED_MESSAGE, caller_id,
    form_error,
};

const INVALID_CREDENTIALS: &str = "Credenciais inválidas";
const INVALID_TOKEN: &str = "Token inválido ou expirado";
const RESEND_VERIFICATION_REPLY: &str =
    "Se o email estiver cadastrado e não verificado, um novo link será enviado";
const FORGOT_PASSWORD_REPLY: &str =
    "Se o email estiver cadastrado, você receberá instruções para redefinir sua senha";

/// Token lifetimes and links derived from the server configuration.
#[derive(Clone, Debug)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub frontend_url: String,
}

impl From<&ServerConfig> for AuthSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            jwt_secret: config.jwt_secret.clone(),
            access_token_minutes: config.access_token_minutes,
            refresh_token_days: config.refresh_token_days,
            frontend_url: config.frontend_url.trim_end_matches('/').to_string(),
        }
    }
}

pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| {
            log::error!("Failed to hash password: {err}");
            ServiceError::Internal
        })
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(err) => {
            log::warn!("Stored password hash is malformed: {err}");
            false
        }
    }
}

/// Opaque single-use token for email links.
fn random_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

fn sign(settings: &AuthSettings, claims: &AuthenticatedUser) -> ServiceResult<String> {
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        claims,
        &EncodingKey::from_secret(settings.jwt_secret.as_bytes()),
    )
    .map_err(|err| {
        log::error!("Failed to sign token: {err}");
        ServiceError::Internal
    })
}

fn claims_for(
    user: &User,
    token_type: TokenType,
    now: NaiveDateTime,
    lifetime: Duration,
) -> AuthenticatedUser {
    let issued = now.and_utc().timestamp();
    AuthenticatedUser {
        sub: user.id.get(),
        email: user.email.as_str().to_string(),
        name: user.name.as_str().to_string(),
        role: user.role,
        company_id: user.company_id.map(|id| id.get()),
        jti: Uuid::new_v4().to_string(),
        token_type,
        iat: issued,
        exp: issued + lifetime.num_seconds(),
    }
}

/// Signs a fresh access/refresh pair for the user.
pub fn issue_tokens(
    settings: &AuthSettings,
    user: &User,
    now: NaiveDateTime,
) -> ServiceResult<TokenPair> {
    let access = claims_for(
        user,
        TokenType::Access,
        now,
        Duration::minutes(settings.access_token_minutes),
    );
    let refresh = claims_for(
        user,
        TokenType::Refresh,
        now,
        Duration::days(settings.refresh_token_days),
    );
    Ok(TokenPair {
        access_token: sign(settings, &access)?,
        refresh_token: sign(settings, &refresh)?,
    })
}

/// Verifies the signature and expiry of a token and returns its claims.
pub fn decode_token(settings: &AuthSettings, token: &str) -> ServiceResult<AuthenticatedUser> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    jsonwebtoken::decode::<AuthenticatedUser>(
        token,
        &DecodingKey::from_secret(settings.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|err| {
        log::debug!("Rejected token: {err}");
        ServiceError::Unauthorized(INVALID_TOKEN.to_string())
    })
}

fn timestamp_of(seconds: i64) -> Option<NaiveDateTime> {
    DateTime::from_timestamp(seconds, 0).map(|dt| dt.naive_utc())
}

/// Checks that claims still belong to an active user and were not revoked.
fn ensure_live<R>(repo: &R, claims: &AuthenticatedUser) -> ServiceResult<User>
where
    R: UserReader + ?Sized,
{
    if repo.is_token_revoked(&claims.jti)? {
        return Err(ServiceError::Unauthorized(INVALID_TOKEN.to_string()));
    }

    let user = repo
        .get_user_by_id(caller_id(claims)?)?
        .filter(|user| user.active)
        .ok_or_else(|| ServiceError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()))?;

    if let Some(invalidated) = user.tokens_invalidated_at
        && claims.iat <= invalidated.and_utc().timestamp()
    {
        return Err(ServiceError::Unauthorized(INVALID_TOKEN.to_string()));
    }

    Ok(user)
}

/// Resolves the principal behind a bearer access token.
pub fn authenticate<R>(
    repo: &R,
    settings: &AuthSettings,
    token: &str,
) -> ServiceResult<AuthenticatedUser>
where
    R: UserReader + ?Sized,
{
    let claims = decode_token(settings, token)?;
    if claims.token_type != TokenType::Access {
        return Err(ServiceError::Unauthorized(INVALID_TOKEN.to_string()));
    }
    ensure_live(repo, &claims)?;
    Ok(claims)
}

fn send_verification<Q>(queue: &Q, settings: &AuthSettings, user: &User, token: &str)
where
    Q: NotificationQueue + ?Sized,
{
    let link = format!("{}/verify-email?token={token}", settings.frontend_url);
    let mut context = std::collections::BTreeMap::new();
    context.insert("name".to_string(), user.name.as_str().to_string());
    context.insert("link".to_string(), link);
    publish(
        queue,
        email_job(
            user.email.as_str(),
            "Confirme seu email - AdvWell",
            VERIFY_EMAIL_TEMPLATE,
            context,
        ),
    );
}

/// Creates a trial company with its first administrator and mails the
/// verification link.
pub fn register<R, Q>(
    repo: &R,
    queue: &Q,
    settings: &AuthSettings,
    form: RegisterForm,
    now: NaiveDateTime,
) -> ServiceResult<User>
where
    R: UserReader + CompanyWriter + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    form.validate().map_err(form_error)?;

    let email = EmailAddress::new(form.email.as_str())?;
    if repo.get_user_by_email(email.as_str())?.is_some() {
        return Err(ServiceError::Form("Email já cadastrado".to_string()));
    }

    let token = random_token();
    let company = NewCompany::trial(
        CompanyName::new(form.company_name.as_str())?,
        email.clone(),
        Uuid::new_v4().simple().to_string(),
        now,
    );
    let admin = NewUser {
        company_id: None,
        name: PersonName::new(form.name.as_str())?,
        email,
        password_hash: hash_password(&form.password)?,
        role: Role::Admin,
        email_verified: false,
        email_verification_token: Some(token.clone()),
        email_verification_expiry: Some(now + Duration::hours(VERIFICATION_TOKEN_HOURS)),
    };

    let (company, user) = repo.create_company_with_admin(&company, &admin)?;
    log::info!("Registered company {} with admin {}", company.id.get(), user.id.get());

    send_verification(queue, settings, &user, &token);

    Ok(user)
}

/// Exchanges credentials for a token pair, enforcing the lockout policy.
pub fn login<R>(
    repo: &R,
    settings: &AuthSettings,
    form: LoginForm,
    now: NaiveDateTime,
) -> ServiceResult<LoginResponse>
where
    R: UserReader + UserWriter + CompanyReader + ?Sized,
{
    form.validate().map_err(form_error)?;

    let email = form.email.trim().to_lowercase();
    let user = repo
        .get_user_by_email(&email)?
        .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()))?;

    if !user.active {
        return Err(ServiceError::Unauthorized("Usuário inativo".to_string()));
    }
    if !user.email_verified {
        return Err(ServiceError::Unauthorized("Email não verificado".to_string()));
    }
    if let Some(until) = user.account_locked_until.filter(|until| *until > now) {
        return Err(ServiceError::Unauthorized(format!(
            "Conta bloqueada. Tente novamente em {} minutos",
            minutes_until_unlock(until, now)
        )));
    }

    let company = match user.company_id {
        Some(company_id) => repo.get_company_by_id(company_id)?,
        None => None,
    };
    if company.as_ref().is_some_and(|company| !company.active) {
        return Err(ServiceError::Unauthorized(
            INACTIVE_COMPANY_MESSAGE.to_string(),
        ));
    }

    if !verify_password(&form.password, &user.password_hash) {
        let (attempts, locked_until) = register_failed_attempt(user.failed_login_attempts, now);
        repo.record_login_attempts(user.id, attempts, locked_until)?;
        log::warn!("Failed login for user {} (attempt {attempts})", user.id.get());
        return Err(match locked_until {
            Some(until) => ServiceError::Unauthorized(format!(
                "Conta bloqueada. Tente novamente em {} minutos",
                minutes_until_unlock(until, now)
            )),
            None => ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()),
        });
    }

    if user.failed_login_attempts > 0 || user.account_locked_until.is_some() {
        repo.record_login_attempts(user.id, 0, None)?;
    }

    let tokens = issue_tokens(settings, &user, now)?;
    log::info!("User {} logged in", user.id.get());

    Ok(LoginResponse {
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
        user: UserProfile {
            company: company.as_ref().map(CompanySummary::from),
            user,
        },
    })
}

/// Exchanges a live refresh token for a new access token.
pub fn refresh<R>(
    repo: &R,
    settings: &AuthSettings,
    form: RefreshForm,
    now: NaiveDateTime,
) -> ServiceResult<AccessTokenResponse>
where
    R: UserReader + ?Sized,
{
    let claims = decode_token(settings, &form.refresh_token)?;
    if claims.token_type != TokenType::Refresh {
        return Err(ServiceError::Unauthorized(INVALID_TOKEN.to_string()));
    }
    let user = ensure_live(repo, &claims)?;

    let access = claims_for(
        &user,
        TokenType::Access,
        now,
        Duration::minutes(settings.access_token_minutes),
    );
    Ok(AccessTokenResponse {
        access_token: sign(settings, &access)?,
    })
}

fn revoke<R>(repo: &R, claims: &AuthenticatedUser, now: NaiveDateTime) -> ServiceResult<()>
where
    R: UserWriter + ?Sized,
{
    repo.revoke_token(&RevokedToken {
        jti: claims.jti.clone(),
        user_id: caller_id(claims)?,
        expires_at: timestamp_of(claims.exp).unwrap_or(now),
    })?;
    Ok(())
}

/// Revokes the caller's current access token and, when supplied, the
/// matching refresh token.
pub fn logout<R>(
    repo: &R,
    settings: &AuthSettings,
    user: &AuthenticatedUser,
    refresh_token: Option<&str>,
    now: NaiveDateTime,
) -> ServiceResult<MessageResponse>
where
    R: UserWriter + ?Sized,
{
    revoke(repo, user, now)?;

    if let Some(token) = refresh_token
        && let Ok(claims) = decode_token(settings, token)
        && claims.sub == user.sub
    {
        revoke(repo, &claims, now)?;
    }

    Ok(MessageResponse::new("Logout realizado com sucesso"))
}

/// Invalidates every token issued to the caller so far.
pub fn logout_all<R>(
    repo: &R,
    user: &AuthenticatedUser,
    now: NaiveDateTime,
) -> ServiceResult<MessageResponse>
where
    R: UserWriter + ?Sized,
{
    repo.invalidate_tokens(caller_id(user)?, now)?;
    log::info!("All sessions of user {} invalidated", user.sub);
    Ok(MessageResponse::new("Todas as sessões foram encerradas"))
}

/// Mails a reset link. The reply never reveals whether the email exists.
pub fn forgot_password<R, Q>(
    repo: &R,
    queue: &Q,
    settings: &AuthSettings,
    form: EmailForm,
    now: NaiveDateTime,
) -> ServiceResult<MessageResponse>
where
    R: UserReader + UserWriter + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    form.validate().map_err(form_error)?;

    if let Some(user) = repo.get_user_by_email(&form.email.trim().to_lowercase())? {
        let token = random_token();
        repo.set_reset_token(
            user.id,
            Some(&token),
            Some(now + Duration::hours(RESET_TOKEN_HOURS)),
        )?;

        let link = format!("{}/reset-password?token={token}", settings.frontend_url);
        let mut context = std::collections::BTreeMap::new();
        context.insert("name".to_string(), user.name.as_str().to_string());
        context.insert("link".to_string(), link);
        publish(
            queue,
            email_job(
                user.email.as_str(),
                "Redefinição de senha - AdvWell",
                RESET_PASSWORD_TEMPLATE,
                context,
            ),
        );
    }

    Ok(MessageResponse::new(FORGOT_PASSWORD_REPLY))
}

pub fn reset_password<R>(
    repo: &R,
    form: ResetPasswordForm,
    now: NaiveDateTime,
) -> ServiceResult<MessageResponse>
where
    R: UserReader + UserWriter + ?Sized,
{
    form.validate().map_err(form_error)?;

    let user = repo
        .get_user_by_reset_token(form.token.trim())?
        .filter(|user| user.reset_token_expiry.is_some_and(|expiry| expiry > now))
        .ok_or_else(|| ServiceError::Form(INVALID_TOKEN.to_string()))?;

    repo.reset_password(user.id, &hash_password(&form.password)?)?;
    repo.invalidate_tokens(user.id, now)?;
    log::info!("Password reset for user {}", user.id.get());

    Ok(MessageResponse::new("Senha redefinida com sucesso"))
}

pub fn verify_email<R>(
    repo: &R,
    form: VerifyEmailForm,
    now: NaiveDateTime,
) -> ServiceResult<MessageResponse>
where
    R: UserReader + UserWriter + ?Sized,
{
    let user = repo
        .get_user_by_verification_token(form.token.trim())?
        .filter(|user| {
            user.email_verification_expiry
                .is_some_and(|expiry| expiry > now)
        })
        .ok_or_else(|| ServiceError::Form(INVALID_TOKEN.to_string()))?;

    repo.set_email_verification(user.id, true, None, None)?;

    Ok(MessageResponse::new("Email verificado com sucesso"))
}

pub fn resend_verification<R, Q>(
    repo: &R,
    queue: &Q,
    settings: &AuthSettings,
    form: EmailForm,
    now: NaiveDateTime,
) -> ServiceResult<MessageResponse>
where
    R: UserReader + UserWriter + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    form.validate().map_err(form_error)?;

    let Some(user) = repo.get_user_by_email(&form.email.trim().to_lowercase())? else {
        return Ok(MessageResponse::new(RESEND_VERIFICATION_REPLY));
    };
    if user.email_verified {
        return Err(ServiceError::Form("Email já verificado".to_string()));
    }

    let token = random_token();
    repo.set_email_verification(
        user.id,
        false,
        Some(&token),
        Some(now + Duration::hours(VERIFICATION_TOKEN_HOURS)),
    )?;
    send_verification(queue, settings, &user, &token);

    Ok(MessageResponse::new(RESEND_VERIFICATION_REPLY))
}

/// Profile of the caller with a summary of their company.
pub fn me<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<UserProfile>
where
    R: UserReader + CompanyReader + ?Sized,
{
    let record = repo
        .get_user_by_id(caller_id(user)?)?
        .ok_or(ServiceError::NotFound)?;
    let company = match record.company_id {
        Some(company_id) => repo.get_company_by_id(company_id)?,
        None => None,
    };

    Ok(UserProfile {
        company: company.as_ref().map(CompanySummary::from),
        user: record,
    })
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::types::UserId;
    use crate::repository::mock::MockRepository;
    use crate::services::notifications::MockNotificationQueue;
    use crate::services::test_support::at;

    fn settings() -> AuthSettings {
        AuthSettings {
            jwt_secret: "segredo-de-teste".to_string(),
            access_token_minutes: 15,
            refresh_token_days: 7,
            frontend_url: "http://localhost:5173".to_string(),
        }
    }

    fn stored_user(password: &str) -> User {
        let now = at("2025-03-10 09:00");
        User {
            id: UserId::new(7).expect("valid id"),
            company_id: None,
            name: PersonName::new("Ana Souza").expect("valid name"),
            email: EmailAddress::new("ana@escritorio.com.br").expect("valid email"),
            password_hash: hash_password(password).expect("hash"),
            role: Role::SuperAdmin,
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
        }
    }

    fn login_form(password: &str) -> LoginForm {
        LoginForm {
            email: "ANA@escritorio.com.br".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn password_hash_round_trip() {
        let hash = hash_password("senha-forte").expect("hash");
        assert!(verify_password("senha-forte", &hash));
        assert!(!verify_password("outra", &hash));
        assert!(!verify_password("senha-forte", "not-a-hash"));
    }

    #[test]
    fn login_issues_tokens() {
        let mut repo = MockRepository::new();
        let user = stored_user("senha-forte");
        repo.expect_get_user_by_email()
            .withf(|email| email == "ana@escritorio.com.br")
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_record_login_attempts().times(0);

        let response = login(&repo, &settings(), login_form("senha-forte"), at("2025-03-10 10:00"))
            .expect("login succeeds");

        assert_eq!(response.user.user.id.get(), 7);
        assert!(!response.access_token.is_empty());
        assert_ne!(response.access_token, response.refresh_token);
    }

    #[test]
    fn wrong_password_counts_attempts() {
        let mut repo = MockRepository::new();
        let user = stored_user("senha-forte");
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_record_login_attempts()
            .withf(|_, attempts, locked| *attempts == 1 && locked.is_none())
            .times(1)
            .returning(|_, _, _| Ok(()));

        match login(&repo, &settings(), login_form("errada"), at("2025-03-10 10:00")) {
            Err(ServiceError::Unauthorized(msg)) => assert_eq!(msg, INVALID_CREDENTIALS),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn fifth_failure_locks_account() {
        let mut repo = MockRepository::new();
        let mut user = stored_user("senha-forte");
        user.failed_login_attempts = 4;
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_record_login_attempts()
            .withf(|_, attempts, locked| *attempts == 5 && locked.is_some())
            .times(1)
            .returning(|_, _, _| Ok(()));

        match login(&repo, &settings(), login_form("errada"), at("2025-03-10 10:00")) {
            Err(ServiceError::Unauthorized(msg)) => assert!(msg.contains("15 minutos")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn locked_account_is_rejected_before_password_check() {
        let mut repo = MockRepository::new();
        let mut user = stored_user("senha-forte");
        user.account_locked_until = Some(at("2025-03-10 10:05"));
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_record_login_attempts().times(0);

        match login(&repo, &settings(), login_form("senha-forte"), at("2025-03-10 10:00")) {
            Err(ServiceError::Unauthorized(msg)) => assert!(msg.contains("5 minutos")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unverified_email_blocks_login() {
        let mut repo = MockRepository::new();
        let mut user = stored_user("senha-forte");
        user.email_verified = false;
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));

        assert!(matches!(
            login(&repo, &settings(), login_form("senha-forte"), at("2025-03-10 10:00")),
            Err(ServiceError::Unauthorized(msg)) if msg == "Email não verificado"
        ));
    }

    #[test]
    fn duplicate_email_cannot_register() {
        let mut repo = MockRepository::new();
        let user = stored_user("senha-forte");
        repo.expect_get_user_by_email()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_create_company_with_admin().times(0);
        let mut queue = MockNotificationQueue::new();
        queue.expect_enqueue().times(0);

        let form = RegisterForm {
            company_name: "Souza Advogados".to_string(),
            name: "Ana Souza".to_string(),
            email: "ana@escritorio.com.br".to_string(),
            password: "senha-forte".to_string(),
        };

        assert!(matches!(
            register(&repo, &queue, &settings(), form, at("2025-03-10 10:00")),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn forgot_password_is_silent_for_unknown_email() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email().returning(|_| Ok(None));
        repo.expect_set_reset_token().times(0);
        let mut queue = MockNotificationQueue::new();
        queue.expect_enqueue().times(0);

        let reply = forgot_password(
            &repo,
            &queue,
            &settings(),
            EmailForm {
                email: "ninguem@exemplo.com".to_string(),
            },
            at("2025-03-10 10:00"),
        )
        .expect("always succeeds");
        assert_eq!(reply.message, FORGOT_PASSWORD_REPLY);
    }

    #[test]
    fn expired_reset_token_is_rejected() {
        let mut repo = MockRepository::new();
        let mut user = stored_user("senha-forte");
        user.reset_token = Some("abc".into());
        user.reset_token_expiry = Some(at("2025-03-10 09:30"));
        repo.expect_get_user_by_reset_token()
            .returning(move |_| Ok(Some(user.clone())));
        repo.expect_reset_password().times(0);

        let form = ResetPasswordForm {
            token: "abc".to_string(),
            password: "nova-senha-forte".to_string(),
        };
        assert!(matches!(
            reset_password(&repo, form, at("2025-03-10 10:00")),
            Err(ServiceError::Form(msg)) if msg == INVALID_TOKEN
        ));
    }

    #[test]
    fn refresh_token_cannot_authenticate_requests() {
        let user = stored_user("senha-forte");
        let now = chrono::Utc::now().naive_utc();
        let tokens = issue_tokens(&settings(), &user, now).expect("tokens");
        let repo = MockRepository::new();

        assert!(matches!(
            authenticate(&repo, &settings(), &tokens.refresh_token),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn tokens_issued_before_invalidation_are_rejected() {
        let now = chrono::Utc::now().naive_utc();
        let mut user = stored_user("senha-forte");
        user.tokens_invalidated_at = Some(now + Duration::minutes(1));
        let tokens = issue_tokens(&settings(), &user, now).expect("tokens");

        let mut repo = MockRepository::new();
        repo.expect_is_token_revoked().returning(|_| Ok(false));
        repo.expect_get_user_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        assert!(authenticate(&repo, &settings(), &tokens.access_token).is_err());
    }

    #[test]
    fn live_access_token_authenticates() {
        let now = chrono::Utc::now().naive_utc();
        let user = stored_user("senha-forte");
        let tokens = issue_tokens(&settings(), &user, now).expect("tokens");

        let mut repo = MockRepository::new();
        repo.expect_is_token_revoked().returning(|_| Ok(false));
        repo.expect_get_user_by_id()
            .returning(move |_| Ok(Some(user.clone())));

        let claims = authenticate(&repo, &settings(), &tokens.access_token).expect("valid");
        assert_eq!(claims.sub, 7);
        assert_eq!(claims.token_type, TokenType::Access);
    }
}
