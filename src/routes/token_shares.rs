use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::domain::auth::AuthenticatedUser;
use crate::forms::token_shares::{TokenShareForm, UpdateTokenShareForm};
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::token_shares;

#[get("/ai-token-share/received")]
pub async fn received(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let share = blocking(move || token_shares::received_share(repo.get_ref(), &user)).await?;
    Ok(ok(share))
}

#[get("/ai-token-share/provider/{company_id}")]
pub async fn provided(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    let shares =
        blocking(move || token_shares::list_provided(repo.get_ref(), &user, company_id)).await?;
    Ok(ok(shares))
}

#[get("/ai-token-share/provider/{company_id}/stats")]
pub async fn stats(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    company_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let company_id = company_id.into_inner();
    let body =
        blocking(move || token_shares::share_stats(repo.get_ref(), &user, company_id)).await?;
    Ok(ok(body))
}

#[post("/ai-token-share")]
pub async fn create(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<TokenShareForm>,
) -> Result<HttpResponse, ServiceError> {
    let share = blocking(move || token_shares::create_share(repo.get_ref(), &user, form)).await?;
    Ok(created(share))
}

#[put("/ai-token-share/{id}")]
pub async fn update(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    share_id: web::Path<i32>,
    web::Json(form): web::Json<UpdateTokenShareForm>,
) -> Result<HttpResponse, ServiceError> {
    let share_id = share_id.into_inner();
    let share = blocking(move || {
        token_shares::update_share(repo.get_ref(), &user, share_id, form)
    })
    .await?;
    Ok(ok(share))
}

#[delete("/ai-token-share/{id}")]
pub async fn remove(
    user: AuthenticatedUser,
    repo: web::Data<DieselRepository>,
    share_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let share_id = share_id.into_inner();
    blocking(move || token_shares::delete_share(repo.get_ref(), &user, share_id)).await?;
    Ok(message("Compartilhamento excluído com sucesso"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(received)
        .service(provided)
        .service(stats)
        .service(create)
        .service(update)
        .service(remove);
}
