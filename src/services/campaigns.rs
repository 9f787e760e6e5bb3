//! Bulk WhatsApp template campaigns.
//!
//! Sending only queues one [`NotificationJob::CampaignMessage`] per pending
//! recipient; the notifier delivers them and reports back through
//! [`record_campaign_delivery`]. Later delivery and read reports arrive on the
//! WhatsApp status webhook and go through [`apply_status_updates`].

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use validator::Validate;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::campaign::{
    CANCELLED_MESSAGE, Campaign, CampaignCounters, CampaignStats, CampaignStatus,
    CompanyCampaignStats, DEFAULT_TEMPLATE_LANGUAGE, MAX_RECIPIENTS, NewCampaign, NewRecipient,
    Recipient, RecipientDelivery, RecipientStatus, StatusUpdate, normalize_whatsapp_phone,
};
use crate::domain::types::{CampaignId, CompanyId, RecipientId, TagId, clean_optional};
use crate::dto::campaigns::{
    CampaignListParams, ImportClientsParams, ImportedRecipients, RecipientListParams,
    SendResponse, WebhookVerifyParams,
};
use crate::forms::campaigns::{CampaignForm, SendTestForm};
use crate::models::config::ServerConfig;
use crate::models::zmq::NotificationJob;
use crate::pagination::{PageParams, Paginated};
use crate::repository::{
    CampaignListQuery, CampaignReader, CampaignWriter, ClientReader, RecipientListQuery,
};
use crate::services::notifications::NotificationQueue;
use crate::services::{
    ServiceError, ServiceResult, ensure_admin, form_error, not_found_or, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 20;
const RECIPIENT_PAGE_SIZE: usize = 50;

const ONLY_DRAFTS_EDITABLE: &str = "Apenas rascunhos podem ser editados";
const ONLY_DRAFTS_SENDABLE: &str = "Apenas rascunhos podem ser enviados";
const NO_RECIPIENTS: &str = "Campanha não possui destinatários";

fn load_campaign<R>(repo: &R, company_id: CompanyId, campaign_id: i32) -> ServiceResult<Campaign>
where
    R: CampaignReader + ?Sized,
{
    repo.get_campaign(CampaignId::new(campaign_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

/// Template variables of one recipient: the name fills `{{1}}` when known.
fn recipient_variables(recipient: &Recipient) -> Vec<String> {
    recipient.name.iter().cloned().collect()
}

pub fn list_campaigns<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: CampaignListParams,
) -> ServiceResult<Paginated<Campaign>>
where
    R: CampaignReader + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = CampaignListQuery::new(company_id);
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.status(status.parse::<CampaignStatus>()?);
    }
    let (total, campaigns) = repo.list_campaigns(query.paginate(page, limit))?;
    Ok(Paginated::new(campaigns, total, page, limit))
}

pub fn get_campaign<R>(
    repo: &R,
    user: &AuthenticatedUser,
    campaign_id: i32,
) -> ServiceResult<Campaign>
where
    R: CampaignReader + ?Sized,
{
    ensure_admin(user)?;
    load_campaign(repo, tenant_of(user)?, campaign_id)
}

pub fn create_campaign<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: CampaignForm,
) -> ServiceResult<Campaign>
where
    R: CampaignWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let fields = form.fields()?;
    let recipients = form
        .recipients()?
        .ok_or_else(|| ServiceError::Form("Adicione pelo menos um destinatário".to_string()))?;

    let campaign = repo.create_campaign(&NewCampaign {
        company_id,
        created_by: user.user_id().ok(),
        fields,
        recipients,
    })?;
    log::info!(
        "Campaign {} created with {} recipients",
        campaign.id.get(),
        campaign.total_recipients
    );
    Ok(campaign)
}

pub fn update_campaign<R>(
    repo: &R,
    user: &AuthenticatedUser,
    campaign_id: i32,
    form: CampaignForm,
) -> ServiceResult<Campaign>
where
    R: CampaignReader + CampaignWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = load_campaign(repo, company_id, campaign_id)?;
    if current.status != CampaignStatus::Draft {
        return Err(ServiceError::Form(ONLY_DRAFTS_EDITABLE.to_string()));
    }
    let fields = form.fields()?;
    let recipients = form.recipients()?;
    Ok(repo.update_campaign(current.id, company_id, &fields, recipients.as_deref())?)
}

pub fn delete_campaign<R>(repo: &R, user: &AuthenticatedUser, campaign_id: i32) -> ServiceResult<()>
where
    R: CampaignReader + CampaignWriter + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    let current = load_campaign(repo, company_id, campaign_id)?;
    if current.status == CampaignStatus::Sending {
        return Err(ServiceError::Form(
            "Não é possível excluir campanha em envio".to_string(),
        ));
    }
    repo.delete_campaign(current.id, company_id)
        .map_err(not_found_or)
}

pub fn campaign_stats<R>(
    repo: &R,
    user: &AuthenticatedUser,
    campaign_id: i32,
) -> ServiceResult<CampaignStats>
where
    R: CampaignReader + ?Sized,
{
    ensure_admin(user)?;
    let campaign = load_campaign(repo, tenant_of(user)?, campaign_id)?;
    let counts = repo.recipient_status_counts(campaign.id)?;
    Ok(CampaignStats::new(campaign, counts))
}

pub fn list_recipients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    campaign_id: i32,
    params: RecipientListParams,
) -> ServiceResult<Paginated<Recipient>>
where
    R: CampaignReader + ?Sized,
{
    ensure_admin(user)?;
    let campaign = load_campaign(repo, tenant_of(user)?, campaign_id)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(RECIPIENT_PAGE_SIZE);

    let mut query = RecipientListQuery::new(campaign.id);
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.status(status.parse::<RecipientStatus>()?);
    }
    let (total, recipients) = repo.list_recipients(query.paginate(page, limit))?;
    Ok(Paginated::new(recipients, total, page, limit))
}

pub fn company_stats<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<CompanyCampaignStats>
where
    R: CampaignReader + ?Sized,
{
    ensure_admin(user)?;
    let (campaigns_by_status, messages) = repo.company_campaign_counts(tenant_of(user)?)?;
    Ok(CompanyCampaignStats {
        total_campaigns: campaigns_by_status.iter().map(|(_, count)| count).sum(),
        delivery_rate: messages.delivery_rate(),
        read_rate: messages.read_rate(),
        campaigns_by_status,
        messages,
    })
}

/// Active clients with a usable phone, ready to become recipients.
pub fn import_from_clients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: ImportClientsParams,
) -> ServiceResult<ImportedRecipients>
where
    R: ClientReader + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    let tag_id = params.tag_id.map(TagId::new).transpose()?;

    let recipients: Vec<NewRecipient> = repo
        .list_clients_with_phone(company_id, tag_id, MAX_RECIPIENTS)?
        .into_iter()
        .filter_map(|client| {
            let phone = normalize_whatsapp_phone(client.phone.as_deref()?);
            (phone.len() >= 12).then(|| NewRecipient {
                client_id: Some(client.id),
                phone,
                name: Some(client.name.into_inner()),
            })
        })
        .collect();

    Ok(ImportedRecipients {
        total: recipients.len(),
        recipients,
    })
}

/// Starts a draft campaign and queues a job per pending recipient.
pub fn send_campaign<R, Q>(
    repo: &R,
    queue: &Q,
    user: &AuthenticatedUser,
    campaign_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<SendResponse>
where
    R: CampaignReader + CampaignWriter + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    let campaign = load_campaign(repo, company_id, campaign_id)?;
    if campaign.status != CampaignStatus::Draft {
        return Err(ServiceError::Form(ONLY_DRAFTS_SENDABLE.to_string()));
    }

    let (_, recipients) = repo
        .list_recipients(RecipientListQuery::new(campaign.id).status(RecipientStatus::Pending))?;
    if recipients.is_empty() {
        return Err(ServiceError::Form(NO_RECIPIENTS.to_string()));
    }

    let campaign = repo.set_campaign_status(campaign.id, CampaignStatus::Sending, now)?;

    let mut queued = 0;
    for recipient in &recipients {
        let job = NotificationJob::CampaignMessage {
            campaign_id: campaign.id.get(),
            recipient_id: recipient.id.get(),
            phone: recipient.phone.clone(),
            template_name: campaign.template_name.clone(),
            language: campaign.language.clone(),
            variables: recipient_variables(recipient),
        };
        match queue.enqueue(&job) {
            Ok(()) => queued += 1,
            Err(err) => {
                log::error!(
                    "Failed to queue recipient {} of campaign {}: {err}",
                    recipient.id.get(),
                    campaign.id.get()
                );
                repo.record_delivery(
                    recipient.id,
                    &RecipientDelivery {
                        status: RecipientStatus::Failed,
                        message_id: None,
                        error_message: Some("Falha ao enfileirar mensagem".to_string()),
                        sent_at: None,
                    },
                )?;
            }
        }
    }
    log::info!(
        "Campaign {} queued {queued} of {} messages",
        campaign.id.get(),
        recipients.len()
    );

    if queued == 0 {
        refresh_counters(repo, campaign.id, now)?;
    }

    Ok(SendResponse {
        message: "Campanha iniciada! As mensagens serão enviadas em breve.".to_string(),
        total_recipients: recipients.len(),
    })
}

pub fn cancel_campaign<R>(
    repo: &R,
    user: &AuthenticatedUser,
    campaign_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<Campaign>
where
    R: CampaignReader + CampaignWriter + ?Sized,
{
    ensure_admin(user)?;
    let campaign = load_campaign(repo, tenant_of(user)?, campaign_id)?;
    if campaign.status != CampaignStatus::Sending {
        return Err(ServiceError::Form(
            "Apenas campanhas em envio podem ser canceladas".to_string(),
        ));
    }
    let cancelled = repo.set_campaign_status(campaign.id, CampaignStatus::Cancelled, now)?;
    let failed = repo.fail_pending_recipients(campaign.id, CANCELLED_MESSAGE)?;
    log::info!(
        "Campaign {} cancelled, {failed} pending recipients dropped",
        campaign.id.get()
    );
    refresh_counters(repo, campaign.id, now)?;
    Ok(cancelled)
}

/// Queues a single template message, typically to the operator's own phone.
pub fn send_test<Q>(queue: &Q, user: &AuthenticatedUser, form: SendTestForm) -> ServiceResult<()>
where
    Q: NotificationQueue + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let phone = normalize_whatsapp_phone(&form.phone);
    if phone.len() < 12 {
        return Err(ServiceError::Form(format!("Telefone inválido: {}", form.phone)));
    }
    queue.enqueue(&NotificationJob::WhatsAppTemplate {
        phone,
        template_name: form.template_name.trim().to_string(),
        language: clean_optional(form.language)
            .unwrap_or_else(|| DEFAULT_TEMPLATE_LANGUAGE.to_string()),
        variables: form.variables,
    })
}

/// Whether a queued message should still go out: the recipient is pending
/// and its campaign is still sending.
pub fn delivery_is_due<R>(repo: &R, campaign_id: i32, recipient_id: i32) -> ServiceResult<bool>
where
    R: CampaignReader + ?Sized,
{
    let Some(recipient) = repo.get_recipient(RecipientId::new(recipient_id)?)? else {
        return Ok(false);
    };
    if recipient.status != RecipientStatus::Pending || recipient.campaign_id.get() != campaign_id {
        return Ok(false);
    }
    Ok(repo
        .get_campaign_by_id(recipient.campaign_id)?
        .is_some_and(|campaign| campaign.status == CampaignStatus::Sending))
}

/// Stores a delivery outcome reported by the notifier and refreshes the
/// campaign counters. Recipients settled meanwhile, for example by a
/// cancellation, keep their status.
pub fn record_campaign_delivery<R>(
    repo: &R,
    campaign_id: i32,
    recipient_id: i32,
    delivery: &RecipientDelivery,
    now: NaiveDateTime,
) -> ServiceResult<()>
where
    R: CampaignReader + CampaignWriter + ?Sized,
{
    if !repo.record_delivery(RecipientId::new(recipient_id)?, delivery)? {
        log::info!("Recipient {recipient_id} already settled, delivery not recorded");
        return Ok(());
    }
    refresh_counters(repo, CampaignId::new(campaign_id)?, now)
}

/// Secret expected on the webhook verification handshake.
#[derive(Clone, Debug)]
pub struct WebhookSettings {
    pub verify_token: String,
}

impl From<&ServerConfig> for WebhookSettings {
    fn from(config: &ServerConfig) -> Self {
        Self {
            verify_token: config.whatsapp_verify_token.clone(),
        }
    }
}

/// Answers Meta's subscription check with the challenge it sent.
pub fn verify_webhook(
    settings: &WebhookSettings,
    params: WebhookVerifyParams,
) -> ServiceResult<String> {
    if params.mode.as_deref() != Some("subscribe") {
        return Err(ServiceError::Form("Modo inválido".to_string()));
    }
    let (Some(token), Some(challenge)) = (params.verify_token, params.challenge) else {
        return Err(ServiceError::Form("Token ou challenge ausente".to_string()));
    };
    if settings.verify_token.is_empty() || token != settings.verify_token {
        log::warn!("WhatsApp webhook verification with unknown token");
        return Err(ServiceError::Forbidden("Token inválido".to_string()));
    }
    log::info!("WhatsApp webhook verified");
    Ok(challenge)
}

/// Applies provider status reports to campaign recipients and refreshes the
/// counters of every campaign touched. Returns how many recipients changed.
pub fn apply_status_updates<R>(
    repo: &R,
    updates: &[StatusUpdate],
    now: NaiveDateTime,
) -> ServiceResult<usize>
where
    R: CampaignReader + CampaignWriter + ?Sized,
{
    let mut touched = BTreeSet::new();
    let mut changed = 0;
    for update in updates {
        let Some(recipient) = repo.get_recipient_by_message_id(&update.message_id)? else {
            continue;
        };
        if !recipient.status.can_advance_to(update.status) {
            continue;
        }
        let error_message = match update.status {
            RecipientStatus::Failed => update.error_message.as_deref(),
            _ => None,
        };
        if repo.advance_recipient_status(
            recipient.id,
            recipient.status,
            update.status,
            error_message,
        )? {
            changed += 1;
            touched.insert(recipient.campaign_id);
        }
    }
    for campaign_id in touched {
        refresh_counters(repo, campaign_id, now)?;
    }
    Ok(changed)
}

/// Rewrites the denormalized counters and completes a sending campaign once
/// nothing is pending.
fn refresh_counters<R>(repo: &R, campaign_id: CampaignId, now: NaiveDateTime) -> ServiceResult<()>
where
    R: CampaignReader + CampaignWriter + ?Sized,
{
    let counts = repo.recipient_status_counts(campaign_id)?;
    repo.update_campaign_counters(campaign_id, &CampaignCounters::from(&counts))?;

    if counts.pending == 0
        && let Some(campaign) = repo.get_campaign_by_id(campaign_id)?
        && campaign.status == CampaignStatus::Sending
    {
        repo.set_campaign_status(campaign_id, CampaignStatus::Completed, now)?;
        log::info!("Campaign {} completed", campaign_id.get());
    }
    Ok(())
}
