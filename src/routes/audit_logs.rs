use actix_web::{HttpResponse, get, web};

use crate::domain::audit_log::EntityType;
use crate::dto::audit_log::AuditLogParams;
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, csv_attachment, ok};
use crate::services::ServiceError;
use crate::services::audit_log;

#[get("/audit-logs")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<AuditLogParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || audit_log::list_audit_logs(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[get("/audit-logs/my")]
pub async fn my(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<AuditLogParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || audit_log::my_audit_logs(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[get("/audit-logs/users")]
pub async fn users(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let body = blocking(move || audit_log::audit_users(repo.get_ref(), &user)).await?;
    Ok(ok(body))
}

#[get("/audit-logs/export/csv")]
pub async fn export_csv(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<AuditLogParams>,
) -> Result<HttpResponse, ServiceError> {
    let body =
        blocking(move || audit_log::export_audit_logs(repo.get_ref(), &user, params)).await?;
    Ok(csv_attachment("auditoria.csv", body))
}

#[get("/audit-logs/{entity_type}/{entity_id}")]
pub async fn by_entity(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    path: web::Path<(String, i32)>,
) -> Result<HttpResponse, ServiceError> {
    let (entity_type, entity_id) = path.into_inner();
    let entity_type: EntityType = entity_type.to_uppercase().parse()?;
    let logs = blocking(move || {
        audit_log::entity_audit_logs(repo.get_ref(), &user, entity_type, entity_id)
    })
    .await?;
    Ok(ok(logs))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(my)
        .service(users)
        .service(export_csv)
        .service(by_entity);
}
