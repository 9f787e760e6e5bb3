use actix_web::{HttpResponse, get, post, put, web};
use chrono::Utc;

use crate::domain::auth::AuthenticatedUser;
use crate::forms::lgpd::{ConsentForm, DataRequestForm, ProcessRequestForm, RevokeConsentForm};
use crate::middleware::{MaybeUser, RequestAudit, TenantUser};
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, ok};
use crate::services::ServiceError;
use crate::services::lgpd;

/// Consents can be recorded before the account exists, e.g. on sign-up.
#[post("/lgpd/consent")]
pub async fn record_consent(
    MaybeUser(user): MaybeUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ConsentForm>,
) -> Result<HttpResponse, ServiceError> {
    let consent =
        blocking(move || lgpd::record_consent(repo.get_ref(), user.as_ref(), form, &audit))
            .await?;
    Ok(created(consent))
}

#[get("/lgpd/my-consents")]
pub async fn my_consents(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let consents = blocking(move || lgpd::my_consents(repo.get_ref(), &user)).await?;
    Ok(ok(consents))
}

#[post("/lgpd/revoke-consent")]
pub async fn revoke_consent(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<RevokeConsentForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let consent =
        blocking(move || lgpd::revoke_consent(repo.get_ref(), &user, form, now)).await?;
    Ok(ok(consent))
}

#[get("/lgpd/my-data")]
pub async fn my_data(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let export = blocking(move || lgpd::my_data(repo.get_ref(), &user, now)).await?;
    Ok(ok(export))
}

#[post("/lgpd/request")]
pub async fn create_request(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<DataRequestForm>,
) -> Result<HttpResponse, ServiceError> {
    let request = blocking(move || lgpd::create_request(repo.get_ref(), &user, form)).await?;
    Ok(created(request))
}

#[get("/lgpd/requests")]
pub async fn my_requests(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let requests = blocking(move || lgpd::my_requests(repo.get_ref(), &user)).await?;
    Ok(ok(requests))
}

#[get("/lgpd/admin/requests/pending")]
pub async fn pending_requests(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let requests = blocking(move || lgpd::pending_requests(repo.get_ref(), &user)).await?;
    Ok(ok(requests))
}

#[put("/lgpd/admin/requests/{id}")]
pub async fn process_request(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    request_id: web::Path<i32>,
    web::Json(form): web::Json<ProcessRequestForm>,
) -> Result<HttpResponse, ServiceError> {
    let request_id = request_id.into_inner();
    let now = Utc::now().naive_utc();
    let request = blocking(move || {
        lgpd::process_request(repo.get_ref(), &user, request_id, form, now)
    })
    .await?;
    Ok(ok(request))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(record_consent)
        .service(my_consents)
        .service(revoke_consent)
        .service(my_data)
        .service(create_request)
        .service(my_requests)
        .service(pending_requests)
        .service(process_request);
}
