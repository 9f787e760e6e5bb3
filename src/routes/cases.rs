use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;

use crate::dto::cases::CaseListParams;
use crate::dto::clients::AutocompleteParams;
use crate::forms::cases::{CaseForm, DeadlineForm};
use crate::integrations::datajud::DataJudClient;
use crate::middleware::{RequestAudit, TenantUser};
use crate::queue::ZmqSender;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::cases;

#[get("/cases")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<CaseListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || cases::list_cases(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

/// Creates the case and pulls its movements from DataJud.
#[post("/cases")]
pub async fn create(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    court: web::Data<DataJudClient>,
    web::Json(form): web::Json<CaseForm>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let case = blocking(move || {
        cases::create_case(repo.get_ref(), court.get_ref(), &user, form, now, &audit)
    })
    .await?;
    Ok(created(case))
}

#[get("/cases/search")]
pub async fn search(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<AutocompleteParams>,
) -> Result<HttpResponse, ServiceError> {
    let found = blocking(move || cases::search_cases(repo.get_ref(), &user, params.q)).await?;
    Ok(ok(found))
}

#[get("/cases/deadlines")]
pub async fn deadlines(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let items = blocking(move || cases::list_deadlines(repo.get_ref(), &user, now)).await?;
    Ok(ok(items))
}

#[get("/cases/updates")]
pub async fn pending_updates(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let items = blocking(move || cases::pending_updates(repo.get_ref(), &user)).await?;
    Ok(ok(items))
}

#[put("/cases/{id}/deadline")]
pub async fn update_deadline(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
    web::Json(form): web::Json<DeadlineForm>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let case =
        blocking(move || cases::update_deadline(repo.get_ref(), &user, case_id, form)).await?;
    Ok(ok(case))
}

#[post("/cases/{id}/deadline/toggle")]
pub async fn toggle_deadline(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let now = Utc::now().naive_utc();
    let case = blocking(move || {
        cases::toggle_deadline_completed(repo.get_ref(), &user, case_id, now)
    })
    .await?;
    Ok(ok(case))
}

#[get("/cases/{id}/audit-logs")]
pub async fn audit_logs(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let logs = blocking(move || cases::case_audit_logs(repo.get_ref(), &user, case_id)).await?;
    Ok(ok(logs))
}

#[post("/cases/{id}/sync")]
pub async fn sync(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    court: web::Data<DataJudClient>,
    case_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let now = Utc::now().naive_utc();
    let case = blocking(move || {
        cases::sync_movements(repo.get_ref(), court.get_ref(), &user, case_id, now)
    })
    .await?;
    Ok(ok(case))
}

#[post("/cases/{id}/acknowledge")]
pub async fn acknowledge(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let now = Utc::now().naive_utc();
    blocking(move || cases::acknowledge_case(repo.get_ref(), &user, case_id, now)).await?;
    Ok(message("Atualização marcada como vista"))
}

#[get("/cases/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let details = blocking(move || cases::get_case(repo.get_ref(), &user, case_id)).await?;
    Ok(ok(details))
}

#[put("/cases/{id}")]
pub async fn update(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    queue: web::Data<ZmqSender>,
    case_id: web::Path<i32>,
    web::Json(form): web::Json<CaseForm>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    let case = blocking(move || {
        cases::update_case(repo.get_ref(), queue.get_ref(), &user, case_id, form, &audit)
    })
    .await?;
    Ok(ok(case))
}

#[delete("/cases/{id}")]
pub async fn remove(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    case_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let case_id = case_id.into_inner();
    blocking(move || cases::delete_case(repo.get_ref(), &user, case_id, &audit)).await?;
    Ok(message("Processo excluído com sucesso"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(search)
        .service(deadlines)
        .service(pending_updates)
        .service(update_deadline)
        .service(toggle_deadline)
        .service(audit_logs)
        .service(sync)
        .service(acknowledge)
        .service(show)
        .service(update)
        .service(remove);
}
