use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;

use crate::domain::auth::AuthenticatedUser;
use crate::dto::companies::SearchParams;
use crate::forms::companies::{CompanyForm, CreateCompanyForm, SubscriptionForm};
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::companies;

#[get("/companies/own")]
pub async fn get_own(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let overview = blocking(move || companies::get_own_company(repo.get_ref(), &user)).await?;
    Ok(ok(overview))
}

#[put("/companies/own")]
pub async fn update_own(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CompanyForm>,
) -> Result<HttpResponse, ServiceError> {
    let company =
        blocking(move || companies::update_own_company(repo.get_ref(), &user, form)).await?;
    Ok(ok(company))
}

#[get("/companies/own/api-key")]
pub async fn get_api_key(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let key = blocking(move || companies::get_api_key(repo.get_ref(), &user)).await?;
    Ok(ok(key))
}

#[post("/companies/own/api-key/regenerate")]
pub async fn regenerate_api_key(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let key = blocking(move || companies::regenerate_api_key(repo.get_ref(), &user)).await?;
    Ok(ok(key))
}

#[get("/companies/subscription-alerts")]
pub async fn subscription_alerts(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let alerts =
        blocking(move || companies::subscription_alerts(repo.get_ref(), &user, now)).await?;
    Ok(ok(alerts))
}

#[get("/companies")]
pub async fn list(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<SearchParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || companies::list_companies(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[post("/companies")]
pub async fn create(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CreateCompanyForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let result =
        blocking(move || companies::create_company(repo.get_ref(), &user, form, now)).await?;
    Ok(created(result))
}

#[get("/companies/{id}")]
pub async fn show(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    let company =
        blocking(move || companies::get_company(repo.get_ref(), &user, company_id)).await?;
    Ok(ok(company))
}

#[put("/companies/{id}")]
pub async fn update(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
    web::Json(form): web::Json<CompanyForm>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    let company =
        blocking(move || companies::update_company(repo.get_ref(), &user, company_id, form))
            .await?;
    Ok(ok(company))
}

#[delete("/companies/{id}")]
pub async fn remove(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    blocking(move || companies::delete_company(repo.get_ref(), &user, company_id)).await?;
    Ok(message("Empresa excluída com sucesso"))
}

#[get("/companies/{id}/users")]
pub async fn list_users(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
    web::Query(params): web::Query<SearchParams>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    let page = blocking(move || {
        companies::list_company_users(repo.get_ref(), &user, company_id, params)
    })
    .await?;
    Ok(ok(page))
}

#[put("/companies/{company_id}/users/{user_id}/toggle-active")]
pub async fn toggle_user_active(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (company_id, user_id) = path.into_inner();
    let updated = blocking(move || {
        companies::toggle_user_active(repo.get_ref(), &user, company_id, user_id)
    })
    .await?;
    Ok(ok(updated))
}

#[put("/companies/{id}/subscription")]
pub async fn update_subscription(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
    web::Json(form): web::Json<SubscriptionForm>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    let company = blocking(move || {
        companies::update_subscription(repo.get_ref(), &user, company_id, form)
    })
    .await?;
    Ok(ok(company))
}

#[get("/companies/{id}/last-payment")]
pub async fn last_payment(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    let payment =
        blocking(move || companies::last_payment(repo.get_ref(), &user, company_id)).await?;
    Ok(ok(payment))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(get_own)
        .service(update_own)
        .service(get_api_key)
        .service(regenerate_api_key)
        .service(subscription_alerts)
        .service(list)
        .service(create)
        .service(show)
        .service(update)
        .service(remove)
        .service(list_users)
        .service(toggle_user_active)
        .service(update_subscription)
        .service(last_payment);
}
