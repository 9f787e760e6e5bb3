//! Consent bookkeeping and data-subject requests under the LGPD.

use chrono::NaiveDateTime;
use validator::Validate;

use crate::domain::audit_log::AuditContext;
use crate::domain::auth::AuthenticatedUser;
use crate::domain::lgpd::{
    ANONYMIZED_NAME, ConsentLog, ConsentType, DataRequest, DataRequestWithUser, NewConsentLog,
    NewDataRequest, PersonalDataExport, RequestProcessing, RequestStatus, RequestType,
    anonymized_email, latest_per_type, portability_note,
};
use crate::domain::types::{DataRequestId, clean_optional};
use crate::forms::lgpd::{ConsentForm, DataRequestForm, ProcessRequestForm, RevokeConsentForm};
use crate::repository::{
    CompanyReader, ConsentReader, ConsentWriter, DataRequestReader, DataRequestWriter,
    UserReader,
};
use crate::services::{
    ServiceError, ServiceResult, caller_id, ensure_admin, form_error, tenant_of,
};

const OPEN_REQUEST: &str = "Já existe uma solicitação deste tipo em andamento";
const MISSING_REASON: &str = "Motivo da rejeição é obrigatório";

/// Stores a consent. Callable before login; a session links it to the user.
pub fn record_consent<R>(
    repo: &R,
    user: Option<&AuthenticatedUser>,
    form: ConsentForm,
    ctx: &AuditContext,
) -> ServiceResult<ConsentLog>
where
    R: ConsentWriter + ?Sized,
{
    form.validate().map_err(form_error)?;
    let consent_type = form.consent_type.parse::<ConsentType>()?;
    Ok(repo.create_consent(&NewConsentLog {
        user_id: user.and_then(|u| u.user_id().ok()),
        email: form.email.trim().to_lowercase(),
        consent_type,
        version: form.version.trim().to_string(),
        ip: ctx.ip_address.clone(),
        user_agent: ctx.user_agent.clone(),
    })?)
}

pub fn my_consents<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<ConsentLog>>
where
    R: ConsentReader + ?Sized,
{
    let user_id = caller_id(user)?;
    Ok(latest_per_type(repo.list_user_consents(user_id)?))
}

pub fn revoke_consent<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: RevokeConsentForm,
    now: NaiveDateTime,
) -> ServiceResult<ConsentLog>
where
    R: ConsentWriter + ?Sized,
{
    let user_id = caller_id(user)?;
    let consent_type = form.consent_type.parse::<ConsentType>()?;
    repo.revoke_latest_consent(user_id, consent_type, now)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_request<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: DataRequestForm,
) -> ServiceResult<DataRequest>
where
    R: DataRequestReader + DataRequestWriter + ?Sized,
{
    form.validate().map_err(form_error)?;
    let user_id = caller_id(user)?;
    let company_id = tenant_of(user)?;
    let request_type = form.request_type.parse::<RequestType>()?;

    if repo.has_open_request(user_id, request_type)? {
        return Err(ServiceError::Form(OPEN_REQUEST.to_string()));
    }

    let request = repo.create_data_request(&NewDataRequest {
        user_id,
        company_id: Some(company_id),
        request_type,
        description: clean_optional(form.description),
    })?;
    log::info!(
        "LGPD request {} ({}) opened by user {}",
        request.id.get(),
        request_type,
        user_id.get()
    );
    Ok(request)
}

pub fn my_requests<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<DataRequest>>
where
    R: DataRequestReader + ?Sized,
{
    Ok(repo.list_user_requests(caller_id(user)?)?)
}

pub fn pending_requests<R>(
    repo: &R,
    user: &AuthenticatedUser,
) -> ServiceResult<Vec<DataRequestWithUser>>
where
    R: DataRequestReader + ?Sized,
{
    ensure_admin(user)?;
    Ok(repo.list_open_requests(tenant_of(user)?)?)
}

/// Moves a request forward. Completing a deletion anonymizes the requester.
pub fn process_request<R>(
    repo: &R,
    user: &AuthenticatedUser,
    request_id: i32,
    form: ProcessRequestForm,
    now: NaiveDateTime,
) -> ServiceResult<DataRequest>
where
    R: DataRequestReader + DataRequestWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let admin_id = caller_id(user)?;
    let status = form.status.parse::<RequestStatus>()?;

    let request = repo
        .get_data_request(DataRequestId::new(request_id)?)?
        .filter(|r| r.company_id == Some(company_id))
        .ok_or(ServiceError::NotFound)?;

    let mut processing = RequestProcessing {
        status,
        notes: clean_optional(form.notes).or(request.notes.clone()),
        rejection_reason: request.rejection_reason.clone(),
        processed_by: request.processed_by,
        processed_at: request.processed_at,
        completed_at: request.completed_at,
    };

    match status {
        RequestStatus::Pending => {}
        RequestStatus::InProgress => {
            processing.processed_by = Some(admin_id);
            processing.processed_at = Some(now);
        }
        RequestStatus::Rejected => {
            let reason = clean_optional(form.rejection_reason)
                .ok_or_else(|| ServiceError::Form(MISSING_REASON.to_string()))?;
            processing.rejection_reason = Some(reason);
            processing.processed_by = Some(admin_id);
            processing.processed_at.get_or_insert(now);
            processing.completed_at = Some(now);
        }
        RequestStatus::Completed => {
            processing.processed_by = Some(admin_id);
            processing.processed_at.get_or_insert(now);
            processing.completed_at = Some(now);
            match request.request_type {
                RequestType::Deletion => {
                    let email = anonymized_email(now.and_utc().timestamp_millis());
                    let (done, consents) = repo.complete_deletion_request(
                        request.id,
                        &processing,
                        ANONYMIZED_NAME,
                        &email,
                    )?;
                    log::info!(
                        "Anonymized user {} and {consents} consent records",
                        request.user_id.get()
                    );
                    return Ok(done);
                }
                RequestType::Portability => {
                    processing.notes = Some(portability_note(processing.notes.as_deref(), now));
                }
                _ => {}
            }
        }
    }

    Ok(repo.process_data_request(request.id, &processing)?)
}

/// Everything the platform holds about the caller.
pub fn my_data<R>(
    repo: &R,
    user: &AuthenticatedUser,
    now: NaiveDateTime,
) -> ServiceResult<PersonalDataExport>
where
    R: UserReader + CompanyReader + ConsentReader + DataRequestReader + ?Sized,
{
    let user_id = caller_id(user)?;
    let account = repo.get_user_by_id(user_id)?.ok_or(ServiceError::NotFound)?;
    let company = match account.company_id {
        Some(company_id) => repo.get_company_by_id(company_id)?,
        None => None,
    };
    let statistics = repo.data_statistics(user_id, account.company_id)?;
    Ok(PersonalDataExport {
        consents: repo.list_user_consents(user_id)?,
        requests: repo.list_user_requests(user_id)?,
        user: account,
        company,
        statistics,
        exported_at: now,
    })
}
