use actix_web::{HttpResponse, get, post, web};
use chrono::Utc;
use serde::Deserialize;

use crate::domain::auth::AuthenticatedUser;
use crate::forms::auth::{
    EmailForm, LoginForm, RefreshForm, RegisterForm, ResetPasswordForm, VerifyEmailForm,
};
use crate::queue::ZmqSender;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, ok};
use crate::services::ServiceError;
use crate::services::auth::{self, AuthSettings};

/// Optional body of `/auth/logout`.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutBody {
    pub refresh_token: Option<String>,
}

#[post("/auth/register")]
pub async fn register(
    repo: web::Data<DieselRepository>,
    queue: web::Data<ZmqSender>,
    settings: web::Data<AuthSettings>,
    web::Json(form): web::Json<RegisterForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let user = blocking(move || {
        auth::register(repo.get_ref(), queue.get_ref(), settings.get_ref(), form, now)
    })
    .await?;
    Ok(created(user))
}

#[post("/auth/login")]
pub async fn login(
    repo: web::Data<DieselRepository>,
    settings: web::Data<AuthSettings>,
    web::Json(form): web::Json<LoginForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let response =
        blocking(move || auth::login(repo.get_ref(), settings.get_ref(), form, now)).await?;
    Ok(ok(response))
}

#[post("/auth/refresh")]
pub async fn refresh(
    repo: web::Data<DieselRepository>,
    settings: web::Data<AuthSettings>,
    web::Json(form): web::Json<RefreshForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let response =
        blocking(move || auth::refresh(repo.get_ref(), settings.get_ref(), form, now)).await?;
    Ok(ok(response))
}

#[post("/auth/logout")]
pub async fn logout(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    settings: web::Data<AuthSettings>,
    body: Option<web::Json<LogoutBody>>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let refresh_token = body.and_then(|body| body.into_inner().refresh_token);
    let response = blocking(move || {
        auth::logout(
            repo.get_ref(),
            settings.get_ref(),
            &user,
            refresh_token.as_deref(),
            now,
        )
    })
    .await?;
    Ok(ok(response))
}

#[post("/auth/logout-all")]
pub async fn logout_all(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let response = blocking(move || auth::logout_all(repo.get_ref(), &user, now)).await?;
    Ok(ok(response))
}

#[post("/auth/forgot-password")]
pub async fn forgot_password(
    repo: web::Data<DieselRepository>,
    queue: web::Data<ZmqSender>,
    settings: web::Data<AuthSettings>,
    web::Json(form): web::Json<EmailForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let response = blocking(move || {
        auth::forgot_password(repo.get_ref(), queue.get_ref(), settings.get_ref(), form, now)
    })
    .await?;
    Ok(ok(response))
}

#[post("/auth/reset-password")]
pub async fn reset_password(
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ResetPasswordForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let response = blocking(move || auth::reset_password(repo.get_ref(), form, now)).await?;
    Ok(ok(response))
}

#[post("/auth/verify-email")]
pub async fn verify_email(
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<VerifyEmailForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let response = blocking(move || auth::verify_email(repo.get_ref(), form, now)).await?;
    Ok(ok(response))
}

#[post("/auth/resend-verification")]
pub async fn resend_verification(
    repo: web::Data<DieselRepository>,
    queue: web::Data<ZmqSender>,
    settings: web::Data<AuthSettings>,
    web::Json(form): web::Json<EmailForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let response = blocking(move || {
        auth::resend_verification(repo.get_ref(), queue.get_ref(), settings.get_ref(), form, now)
    })
    .await?;
    Ok(ok(response))
}

#[get("/auth/me")]
pub async fn me(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let profile = blocking(move || auth::me(repo.get_ref(), &user)).await?;
    Ok(ok(profile))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(register)
        .service(login)
        .service(refresh)
        .service(logout)
        .service(logout_all)
        .service(forgot_password)
        .service(reset_password)
        .service(verify_email)
        .service(resend_verification)
        .service(me);
}
