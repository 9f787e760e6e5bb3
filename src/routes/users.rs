use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::dto::companies::SearchParams;
use crate::forms::companies::UserForm;
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::users;

#[get("/users")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<SearchParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || users::list_users(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[post("/users")]
pub async fn create(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<UserForm>,
) -> Result<HttpResponse, ServiceError> {
    let created_user = blocking(move || users::create_user(repo.get_ref(), &user, form)).await?;
    Ok(created(created_user))
}

#[get("/users/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    user_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = user_id.into_inner();
    let found = blocking(move || users::get_user(repo.get_ref(), &user, user_id)).await?;
    Ok(ok(found))
}

#[put("/users/{id}")]
pub async fn update(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    user_id: web::Path<i32>,
    web::Json(form): web::Json<UserForm>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = user_id.into_inner();
    let updated =
        blocking(move || users::update_user(repo.get_ref(), &user, user_id, form)).await?;
    Ok(ok(updated))
}

#[delete("/users/{id}")]
pub async fn remove(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    user_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let user_id = user_id.into_inner();
    blocking(move || users::delete_user(repo.get_ref(), &user, user_id)).await?;
    Ok(message("Usuário excluído com sucesso"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(show)
        .service(update)
        .service(remove);
}
