use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;

use crate::dto::accounts_payable::{PayableListParams, StatementParams};
use crate::forms::accounts_payable::{MarkPaidForm, PayableForm};
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::accounts_payable;

#[get("/accounts-payable")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<PayableListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page =
        blocking(move || accounts_payable::list_payables(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[post("/accounts-payable")]
pub async fn create(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<PayableForm>,
) -> Result<HttpResponse, ServiceError> {
    let payable =
        blocking(move || accounts_payable::create_payable(repo.get_ref(), &user, form)).await?;
    Ok(created(payable))
}

#[get("/accounts-payable/statement")]
pub async fn statement(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<StatementParams>,
) -> Result<HttpResponse, ServiceError> {
    let totals =
        blocking(move || accounts_payable::statement(repo.get_ref(), &user, params)).await?;
    Ok(ok(totals))
}

#[get("/accounts-payable/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    payable_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let payable_id = payable_id.into_inner();
    let payable =
        blocking(move || accounts_payable::get_payable(repo.get_ref(), &user, payable_id)).await?;
    Ok(ok(payable))
}

#[put("/accounts-payable/{id}")]
pub async fn update(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    payable_id: web::Path<i32>,
    web::Json(form): web::Json<PayableForm>,
) -> Result<HttpResponse, ServiceError> {
    let payable_id = payable_id.into_inner();
    let payable = blocking(move || {
        accounts_payable::update_payable(repo.get_ref(), &user, payable_id, form)
    })
    .await?;
    Ok(ok(payable))
}

#[delete("/accounts-payable/{id}")]
pub async fn remove(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    payable_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let payable_id = payable_id.into_inner();
    blocking(move || accounts_payable::delete_payable(repo.get_ref(), &user, payable_id)).await?;
    Ok(message("Conta excluída com sucesso"))
}

#[post("/accounts-payable/{id}/pay")]
pub async fn pay(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    payable_id: web::Path<i32>,
    body: Option<web::Json<MarkPaidForm>>,
) -> Result<HttpResponse, ServiceError> {
    let payable_id = payable_id.into_inner();
    let form = body.map(web::Json::into_inner).unwrap_or_default();
    let now = Utc::now().naive_utc();
    let result = blocking(move || {
        accounts_payable::mark_as_paid(repo.get_ref(), &user, payable_id, form, now)
    })
    .await?;
    Ok(ok(result))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(statement)
        .service(show)
        .service(update)
        .service(remove)
        .service(pay);
}
