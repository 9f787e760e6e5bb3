use actix_multipart::form::MultipartForm;
use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::dto::clients::{AutocompleteParams, ClientListParams};
use crate::forms::clients::{ClientForm, UploadCsvForm};
use crate::middleware::{RequestAudit, TenantUser};
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, csv_attachment, message, ok};
use crate::services::ServiceError;
use crate::services::clients;

#[get("/clients")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<ClientListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || clients::list_clients(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[post("/clients")]
pub async fn create(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<ClientForm>,
) -> Result<HttpResponse, ServiceError> {
    let client =
        blocking(move || clients::create_client(repo.get_ref(), &user, form, &audit)).await?;
    Ok(created(client))
}

#[get("/clients/search")]
pub async fn search(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<AutocompleteParams>,
) -> Result<HttpResponse, ServiceError> {
    let found = blocking(move || clients::search_clients(repo.get_ref(), &user, params.q)).await?;
    Ok(ok(found))
}

#[get("/clients/export/csv")]
pub async fn export_csv(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let body = blocking(move || clients::export_clients(repo.get_ref(), &user)).await?;
    Ok(csv_attachment("clientes.csv", body))
}

#[post("/clients/import/csv")]
pub async fn import_csv(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    MultipartForm(mut form): MultipartForm<UploadCsvForm>,
) -> Result<HttpResponse, ServiceError> {
    let summary = blocking(move || {
        let content = form.read_content()?;
        clients::import_clients(repo.get_ref(), &user, &content, &audit)
    })
    .await?;
    Ok(ok(summary))
}

#[get("/clients/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    client_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let client_id = client_id.into_inner();
    let details = blocking(move || clients::get_client(repo.get_ref(), &user, client_id)).await?;
    Ok(ok(details))
}

#[put("/clients/{id}")]
pub async fn update(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    client_id: web::Path<i32>,
    web::Json(form): web::Json<ClientForm>,
) -> Result<HttpResponse, ServiceError> {
    let client_id = client_id.into_inner();
    let client = blocking(move || {
        clients::update_client(repo.get_ref(), &user, client_id, form, &audit)
    })
    .await?;
    Ok(ok(client))
}

#[delete("/clients/{id}")]
pub async fn remove(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    client_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let client_id = client_id.into_inner();
    blocking(move || clients::delete_client(repo.get_ref(), &user, client_id, &audit)).await?;
    Ok(message("Cliente excluído com sucesso"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(search)
        .service(export_csv)
        .service(import_csv)
        .service(show)
        .service(update)
        .service(remove);
}
