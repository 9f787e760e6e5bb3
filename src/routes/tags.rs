use actix_web::{HttpResponse, delete, get, post, put, web};

use crate::dto::clients::AutocompleteParams;
use crate::dto::companies::SearchParams;
use crate::forms::tags::TagForm;
use crate::middleware::TenantUser;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::tags;

#[get("/tags")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<SearchParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || tags::list_tags(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[get("/tags/search")]
pub async fn search(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<AutocompleteParams>,
) -> Result<HttpResponse, ServiceError> {
    let term = params.q.unwrap_or_default();
    let found = blocking(move || tags::search_tags(repo.get_ref(), &user, &term)).await?;
    Ok(ok(found))
}

#[post("/tags")]
pub async fn create(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<TagForm>,
) -> Result<HttpResponse, ServiceError> {
    let tag = blocking(move || tags::create_tag(repo.get_ref(), &user, form)).await?;
    Ok(created(tag))
}

#[get("/tags/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    tag_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let tag_id = tag_id.into_inner();
    let tag = blocking(move || tags::get_tag(repo.get_ref(), &user, tag_id)).await?;
    Ok(ok(tag))
}

#[put("/tags/{id}")]
pub async fn update(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    tag_id: web::Path<i32>,
    web::Json(form): web::Json<TagForm>,
) -> Result<HttpResponse, ServiceError> {
    let tag_id = tag_id.into_inner();
    let tag = blocking(move || tags::update_tag(repo.get_ref(), &user, tag_id, form)).await?;
    Ok(ok(tag))
}

#[delete("/tags/{id}")]
pub async fn remove(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    tag_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let tag_id = tag_id.into_inner();
    blocking(move || tags::delete_tag(repo.get_ref(), &user, tag_id)).await?;
    Ok(message("Tag excluída com sucesso"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(search)
        .service(create)
        .service(show)
        .service(update)
        .service(remove);
}
