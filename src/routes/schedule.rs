use actix_web::{HttpResponse, delete, get, patch, post, put, web};
use chrono::Utc;

use crate::dto::schedule::{EventListParams, UpcomingParams};
use crate::forms::schedule::EventForm;
use crate::middleware::{RequestAudit, TenantUser};
use crate::queue::ZmqSender;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::schedule;

#[get("/schedule")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<EventListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || schedule::list_events(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[post("/schedule")]
pub async fn create(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    queue: web::Data<ZmqSender>,
    web::Json(form): web::Json<EventForm>,
) -> Result<HttpResponse, ServiceError> {
    let event = blocking(move || {
        schedule::create_event(repo.get_ref(), queue.get_ref(), &user, form, &audit)
    })
    .await?;
    Ok(created(event))
}

#[get("/schedule/upcoming")]
pub async fn upcoming(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<UpcomingParams>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let events = blocking(move || {
        schedule::upcoming_events(repo.get_ref(), &user, params.limit, now)
    })
    .await?;
    Ok(ok(events))
}

#[get("/schedule/today")]
pub async fn today(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let events = blocking(move || schedule::today_tasks(repo.get_ref(), &user, now)).await?;
    Ok(ok(events))
}

#[get("/schedule/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let event_id = event_id.into_inner();
    let event = blocking(move || schedule::get_event(repo.get_ref(), &user, event_id)).await?;
    Ok(ok(event))
}

#[put("/schedule/{id}")]
pub async fn update(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    queue: web::Data<ZmqSender>,
    event_id: web::Path<i32>,
    web::Json(form): web::Json<EventForm>,
) -> Result<HttpResponse, ServiceError> {
    let event_id = event_id.into_inner();
    let event = blocking(move || {
        schedule::update_event(repo.get_ref(), queue.get_ref(), &user, event_id, form, &audit)
    })
    .await?;
    Ok(ok(event))
}

#[delete("/schedule/{id}")]
pub async fn remove(
    user: TenantUser,
    RequestAudit(audit): RequestAudit,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let event_id = event_id.into_inner();
    blocking(move || schedule::delete_event(repo.get_ref(), &user, event_id, &audit)).await?;
    Ok(message("Evento excluído com sucesso"))
}

#[patch("/schedule/{id}/toggle-complete")]
pub async fn toggle_complete(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    event_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let event_id = event_id.into_inner();
    let event =
        blocking(move || schedule::toggle_complete(repo.get_ref(), &user, event_id)).await?;
    Ok(ok(event))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(upcoming)
        .service(today)
        .service(show)
        .service(update)
        .service(remove)
        .service(toggle_complete);
}
