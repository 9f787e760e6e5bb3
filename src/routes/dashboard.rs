use actix_web::{HttpResponse, get, web};
use chrono::Utc;

use crate::dto::dashboard::ActivityParams;
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, ok};
use crate::services::ServiceError;
use crate::services::dashboard;

#[get("/dashboard/stats")]
pub async fn stats(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    let body = blocking(move || dashboard::dashboard_stats(repo.get_ref(), &user, now)).await?;
    Ok(ok(body))
}

#[get("/dashboard/recent-activities")]
pub async fn recent_activities(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<ActivityParams>,
) -> Result<HttpResponse, ServiceError> {
    let activities =
        blocking(move || dashboard::recent_activities(repo.get_ref(), &user, params)).await?;
    Ok(ok(activities))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(stats).service(recent_activities);
}
