use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;

use crate::dto::financial::TransactionListParams;
use crate::forms::clients::UploadCsvForm;
use crate::forms::financial::{InstallmentForm, PayInstallmentForm, TransactionForm};
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, csv_attachment, message, ok};
use crate::services::ServiceError;
use crate::services::financial;

#[get("/financial")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<TransactionListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page =
        blocking(move || financial::list_transactions(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[post("/financial")]
pub async fn create(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<TransactionForm>,
) -> Result<HttpResponse, ServiceError> {
    let transaction =
        blocking(move || financial::create_transaction(repo.get_ref(), &user, form)).await?;
    Ok(created(transaction))
}

#[get("/financial/summary")]
pub async fn summary(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<TransactionListParams>,
) -> Result<HttpResponse, ServiceError> {
    let totals = blocking(move || financial::summary(repo.get_ref(), &user, params)).await?;
    Ok(ok(totals))
}

#[get("/financial/export/csv")]
pub async fn export_csv(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<TransactionListParams>,
) -> Result<HttpResponse, ServiceError> {
    let body =
        blocking(move || financial::export_transactions(repo.get_ref(), &user, params)).await?;
    Ok(csv_attachment("financeiro.csv", body))
}

#[post("/financial/import/csv")]
pub async fn import_csv(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    MultipartForm(mut form): MultipartForm<UploadCsvForm>,
) -> Result<HttpResponse, ServiceError> {
    let body = blocking(move || {
        let content = form.read_content()?;
        financial::import_transactions(repo.get_ref(), &user, &content)
    })
    .await?;
    Ok(ok(body))
}

#[get("/financial/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    transaction_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let transaction_id = transaction_id.into_inner();
    let details = blocking(move || {
        financial::get_transaction(repo.get_ref(), &user, transaction_id)
    })
    .await?;
    Ok(ok(details))
}

#[put("/financial/{id}")]
pub async fn update(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    transaction_id: web::Path<i32>,
    web::Json(form): web::Json<TransactionForm>,
) -> Result<HttpResponse, ServiceError> {
    let transaction_id = transaction_id.into_inner();
    let transaction = blocking(move || {
        financial::update_transaction(repo.get_ref(), &user, transaction_id, form)
    })
    .await?;
    Ok(ok(transaction))
}

#[delete("/financial/{id}")]
pub async fn remove(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    transaction_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let transaction_id = transaction_id.into_inner();
    blocking(move || financial::delete_transaction(repo.get_ref(), &user, transaction_id))
        .await?;
    Ok(message("Transação excluída com sucesso"))
}

#[get("/financial/{id}/installments")]
pub async fn installments(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    transaction_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let transaction_id = transaction_id.into_inner();
    let items = blocking(move || {
        financial::list_installments(repo.get_ref(), &user, transaction_id)
    })
    .await?;
    Ok(ok(items))
}

#[post("/financial/{id}/installments/{installment_id}/pay")]
pub async fn pay_installment(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(i32, i32)>,
    body: Option<web::Json<PayInstallmentForm>>,
) -> Result<HttpResponse, ServiceError> {
    let (transaction_id, installment_id) = path.into_inner();
    let form = body.map(web::Json::into_inner).unwrap_or_default();
    let now = Utc::now().naive_utc();
    let installment = blocking(move || {
        financial::pay_installment(repo.get_ref(), &user, transaction_id, installment_id, form, now)
    })
    .await?;
    Ok(ok(installment))
}

#[put("/financial/{id}/installments/{installment_id}")]
pub async fn update_installment(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(i32, i32)>,
    web::Json(form): web::Json<InstallmentForm>,
) -> Result<HttpResponse, ServiceError> {
    let (transaction_id, installment_id) = path.into_inner();
    let installment = blocking(move || {
        financial::update_installment(repo.get_ref(), &user, transaction_id, installment_id, form)
    })
    .await?;
    Ok(ok(installment))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(summary)
        .service(export_csv)
        .service(import_csv)
        .service(show)
        .service(update)
        .service(remove)
        .service(installments)
        .service(pay_installment)
        .service(update_installment);
}
