use actix_web::{HttpResponse, delete, get, post, put, web};
use chrono::Utc;

use crate::dto::campaigns::{
    CampaignListParams, ImportClientsParams, RecipientListParams, WebhookVerifyParams,
};
use crate::forms::campaigns::{CampaignForm, SendTestForm};
use crate::integrations::whatsapp::StatusWebhook;
use crate::middleware::TenantUser;
use crate::queue::ZmqSender;
use crate::repository::DieselRepository;
use crate::routes::{blocking, created, message, ok};
use crate::services::ServiceError;
use crate::services::campaigns::{self, WebhookSettings};

#[get("/whatsapp-campaigns")]
pub async fn list(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Query(params): web::Query<CampaignListParams>,
) -> Result<HttpResponse, ServiceError> {
    let page = blocking(move || campaigns::list_campaigns(repo.get_ref(), &user, params)).await?;
    Ok(ok(page))
}

#[post("/whatsapp-campaigns")]
pub async fn create(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    web::Json(form): web::Json<CampaignForm>,
) -> Result<HttpResponse, ServiceError> {
    let campaign =
        blocking(move || campaigns::create_campaign(repo.get_ref(), &user, form)).await?;
    Ok(created(campaign))
}

#[get("/whatsapp-campaigns/stats")]
pub async fn company_stats(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
) -> Result<HttpResponse, ServiceError> {
    let body = blocking(move || campaigns::company_stats(repo.get_ref(), &user)).await?;
    Ok(ok(body))
}

#[post("/whatsapp-campaigns/import-clients")]
pub async fn import_clients(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    body: Option<web::Json<ImportClientsParams>>,
) -> Result<HttpResponse, ServiceError> {
    let params = body.map(web::Json::into_inner).unwrap_or_default();
    let imported =
        blocking(move || campaigns::import_from_clients(repo.get_ref(), &user, params)).await?;
    Ok(ok(imported))
}

#[post("/whatsapp-campaigns/test")]
pub async fn send_test(
    user: TenantUser,
    queue: web::Data<ZmqSender>,
    web::Json(form): web::Json<SendTestForm>,
) -> Result<HttpResponse, ServiceError> {
    blocking(move || campaigns::send_test(queue.get_ref(), &user, form)).await?;
    Ok(message("Mensagem de teste enviada para a fila"))
}

#[get("/whatsapp-campaigns/{id}")]
pub async fn show(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    campaign_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let campaign_id = campaign_id.into_inner();
    let campaign =
        blocking(move || campaigns::get_campaign(repo.get_ref(), &user, campaign_id)).await?;
    Ok(ok(campaign))
}

#[get("/whatsapp-campaigns/{id}/stats")]
pub async fn stats(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    campaign_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let campaign_id = campaign_id.into_inner();
    let body =
        blocking(move || campaigns::campaign_stats(repo.get_ref(), &user, campaign_id)).await?;
    Ok(ok(body))
}

#[get("/whatsapp-campaigns/{id}/recipients")]
pub async fn recipients(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    campaign_id: web::Path<i32>,
    web::Query(params): web::Query<RecipientListParams>,
) -> Result<HttpResponse, ServiceError> {
    let campaign_id = campaign_id.into_inner();
    let page = blocking(move || {
        campaigns::list_recipients(repo.get_ref(), &user, campaign_id, params)
    })
    .await?;
    Ok(ok(page))
}

#[put("/whatsapp-campaigns/{id}")]
pub async fn update(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    campaign_id: web::Path<i32>,
    web::Json(form): web::Json<CampaignForm>,
) -> Result<HttpResponse, ServiceError> {
    let campaign_id = campaign_id.into_inner();
    let campaign = blocking(move || {
        campaigns::update_campaign(repo.get_ref(), &user, campaign_id, form)
    })
    .await?;
    Ok(ok(campaign))
}

#[delete("/whatsapp-campaigns/{id}")]
pub async fn remove(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    campaign_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let campaign_id = campaign_id.into_inner();
    blocking(move || campaigns::delete_campaign(repo.get_ref(), &user, campaign_id)).await?;
    Ok(message("Campanha excluída com sucesso"))
}

#[post("/whatsapp-campaigns/{id}/send")]
pub async fn send(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    queue: web::Data<ZmqSender>,
    campaign_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let campaign_id = campaign_id.into_inner();
    let now = Utc::now().naive_utc();
    let response = blocking(move || {
        campaigns::send_campaign(repo.get_ref(), queue.get_ref(), &user, campaign_id, now)
    })
    .await?;
    Ok(ok(response))
}

#[post("/whatsapp-campaigns/{id}/cancel")]
pub async fn cancel(
    user: TenantUser,
    repo: web::Data<DieselRepository>,
    campaign_id: web::Path<i32>,
) -> Result<HttpResponse, ServiceError> {
    let campaign_id = campaign_id.into_inner();
    let now = Utc::now().naive_utc();
    let campaign = blocking(move || {
        campaigns::cancel_campaign(repo.get_ref(), &user, campaign_id, now)
    })
    .await?;
    Ok(ok(campaign))
}

#[get("/whatsapp-webhook")]
pub async fn verify_webhook(
    settings: web::Data<WebhookSettings>,
    web::Query(params): web::Query<WebhookVerifyParams>,
) -> Result<HttpResponse, ServiceError> {
    let challenge = campaigns::verify_webhook(settings.get_ref(), params)?;
    Ok(HttpResponse::Ok().content_type("text/plain").body(challenge))
}

/// Status reports from Meta. Always acknowledged so the provider does not
/// retry; processing failures are logged.
#[post("/whatsapp-webhook")]
pub async fn receive_webhook(
    repo: web::Data<DieselRepository>,
    web::Json(webhook): web::Json<StatusWebhook>,
) -> HttpResponse {
    let updates = webhook.status_updates();
    if !updates.is_empty() {
        let now = Utc::now().naive_utc();
        match blocking(move || campaigns::apply_status_updates(repo.get_ref(), &updates, now)).await
        {
            Ok(changed) => log::info!("WhatsApp webhook updated {changed} recipients"),
            Err(e) => log::error!("Error processing WhatsApp webhook: {e}"),
        }
    }
    HttpResponse::Ok().body("OK")
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(list)
        .service(create)
        .service(company_stats)
        .service(import_clients)
        .service(send_test)
        .service(show)
        .service(stats)
        .service(recipients)
        .service(update)
        .service(remove)
        .service(send)
        .service(cancel)
        .service(verify_webhook)
        .service(receive_webhook);
}
