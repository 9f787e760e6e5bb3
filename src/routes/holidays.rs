use actix_web::{HttpResponse, get, web};
use chrono::Utc;

use crate::domain::auth::AuthenticatedUser;
use crate::dto::holidays::{HolidayRangeParams, HolidayYearParams};
use crate::routes::ok;
use crate::services::ServiceError;
use crate::services::holidays;

// Computed in memory, so no blocking pool is needed.
#[get("/holidays")]
pub async fn by_year(
    _user: AuthenticatedUser,
    web::Query(params): web::Query<HolidayYearParams>,
) -> Result<HttpResponse, ServiceError> {
    let now = Utc::now().naive_utc();
    Ok(ok(holidays::holidays_of_year(params, now)?))
}

#[get("/holidays/range")]
pub async fn in_range(
    _user: AuthenticatedUser,
    web::Query(params): web::Query<HolidayRangeParams>,
) -> Result<HttpResponse, ServiceError> {
    Ok(ok(holidays::holidays_in_range(params)?))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(by_year).service(in_range);
}
