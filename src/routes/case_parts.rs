use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::forms::cases::CasePartForm;
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::case_parts;

#[get("/cases/{case_id}/parts")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let parts =
        blocking(move || case_parts::list_case_parts(repo.get_ref(), &user, case_id)).await?;
    Ok(ok(parts))
}

#[post("/cases/{case_id}/parts")]
pub async fn create(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
    web::Json(form): web::Json<CasePartForm>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let part = blocking(move || {
        case_parts::create_case_part(repo.get_ref(), &user, case_id, form)
    })
    .await?;
    Ok(created(part))
}

// Parts are looked up by their own id, scoped to the caller's company.
#[put("/cases/{case_id}/parts/{part_id}")]
pub async fn update(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(i32, i32)>,
    web::Json(form): web::Json<CasePartForm>,
) -> Result<HttpResponse, ServiceError> {
    let (_case_id, part_id) = path.into_inner();
    let part = blocking(move || {
        case_parts::update_case_part(repo.get_ref(), &user, part_id, form)
    })
    .await?;
    Ok(ok(part))
}

#[delete("/cases/{case_id}/parts/{part_id}")]
pub async fn remove(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(i32, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (_case_id, part_id) = path.into_inner();
    blocking(move || case_parts::delete_case_part(repo.get_ref(), &user, part_id)).await?;
    Ok(message("Parte excluída com sucesso"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(update)
        .service(remove);
}
