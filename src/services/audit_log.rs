//! Recording and browsing the audit trail.

use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::domain::audit_log::{
    AuditAction, AuditContext, AuditEvent, AuditLog, CLEANUP_BATCH_SIZE, EntityType, build_entry,
};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{CompanyId, UserId};
use crate::domain::user::UserSummary;
use crate::dto::audit_log::AuditLogParams;
use crate::forms::{FormError, parse_optional_datetime, parse_optional_end};
use crate::pagination::{PageParams, Paginated};
use crate::repository::{AuditLogQuery, AuditLogReader, AuditLogWriter};
use crate::services::{
    ServiceResult, caller_id, csv_document, ensure_admin, normalize_search, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 50;
const EXPORT_LIMIT: usize = 10_000;

const AUDIT_CSV_HEADER: [&str; 8] = [
    "Data",
    "Usuário",
    "Ação",
    "Entidade",
    "Nome",
    "Descrição",
    "Campos Alterados",
    "IP",
];

/// JSON snapshot of an entity for the `old_values`/`new_values` columns.
pub fn snapshot<T: Serialize>(value: &T) -> Option<Value> {
    match serde_json::to_value(value) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Failed to snapshot audit values: {err}");
            None
        }
    }
}

/// Describes a change made by `user`, ready for [`record`].
pub fn event_by(
    user: &AuthenticatedUser,
    company_id: CompanyId,
    entity_type: EntityType,
    entity_id: i32,
    entity_name: impl Into<String>,
    action: AuditAction,
) -> AuditEvent {
    AuditEvent {
        company_id,
        entity_type,
        entity_id,
        entity_name: entity_name.into(),
        subject_label: None,
        user_id: user.user_id().ok(),
        user_name: Some(user.name.clone()),
        action,
        old_values: None,
        new_values: None,
    }
}

/// Persists an audit entry. Failures are logged and swallowed so the
/// surrounding operation still succeeds.
pub fn record<R>(repo: &R, event: AuditEvent, context: &AuditContext)
where
    R: AuditLogWriter + ?Sized,
{
    let Some(entry) = build_entry(event, context) else {
        return;
    };
    if let Err(err) = repo.create_audit_log(&entry) {
        log::error!(
            "Failed to record audit entry for {} {}: {err}",
            entry.entity_type.as_str(),
            entry.entity_id
        );
    }
}

fn build_query(
    company_id: CompanyId,
    params: &AuditLogParams,
) -> Result<AuditLogQuery, FormError> {
    let mut query = AuditLogQuery::new(company_id).between(
        parse_optional_datetime(params.start_date.as_deref())?,
        parse_optional_end(params.end_date.as_deref())?,
    );
    if let Some(entity_type) = params.entity_type.as_deref().filter(|v| !v.is_empty()) {
        query = query.entity_type(entity_type.parse()?);
    }
    if let Some(action) = params.action.as_deref().filter(|v| !v.is_empty()) {
        query = query.action(action.parse()?);
    }
    if let Some(user_id) = params.user_id {
        query = query.user(UserId::new(user_id)?);
    }
    if let Some(term) = normalize_search(params.search.clone()) {
        query = query.search(term);
    }
    Ok(query)
}

/// Company audit trail. Non-admins only see the entries they authored.
pub fn list_audit_logs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: AuditLogParams,
) -> ServiceResult<Paginated<AuditLog>>
where
    R: AuditLogReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = build_query(company_id, &params)?;
    if !user.is_admin() {
        query = query.user(caller_id(user)?);
    }

    let (total, logs) = repo.list_audit_logs(query.paginate(page, limit))?;
    Ok(Paginated::new(logs, total, page, limit))
}

/// Entries authored by the caller.
pub fn my_audit_logs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: AuditLogParams,
) -> ServiceResult<Paginated<AuditLog>>
where
    R: AuditLogReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let query = build_query(company_id, &params)?
        .user(caller_id(user)?)
        .paginate(page, limit);
    let (total, logs) = repo.list_audit_logs(query)?;
    Ok(Paginated::new(logs, total, page, limit))
}

/// Full history of one record, newest first.
pub fn entity_audit_logs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    entity_type: EntityType,
    entity_id: i32,
) -> ServiceResult<Vec<AuditLog>>
where
    R: AuditLogReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let query = AuditLogQuery::new(company_id).entity(entity_type, entity_id);
    let (_, logs) = repo.list_audit_logs(query)?;
    Ok(logs)
}

pub fn audit_users<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<UserSummary>>
where
    R: AuditLogReader + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    Ok(repo.list_audit_users(company_id)?)
}

pub fn export_audit_logs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: AuditLogParams,
) -> ServiceResult<String>
where
    R: AuditLogReader + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;

    let query = build_query(company_id, &params)?.paginate(1, EXPORT_LIMIT);
    let (_, logs) = repo.list_audit_logs(query)?;

    csv_document(
        &AUDIT_CSV_HEADER,
        logs.into_iter().map(|log| {
            vec![
                log.created_at.format("%d/%m/%Y %H:%M:%S").to_string(),
                log.user_name.unwrap_or_default(),
                log.action.label().to_string(),
                log.entity_type.label().to_string(),
                log.entity_name.unwrap_or_default(),
                log.description.unwrap_or_default(),
                log.changed_fields.join(", "),
                log.ip_address.unwrap_or_default(),
            ]
        }),
    )
}

/// Deletes entries older than the retention window in fixed-size batches.
pub fn cleanup_audit_logs<R>(
    repo: &R,
    now: NaiveDateTime,
    retention_days: i64,
) -> ServiceResult<usize>
where
    R: AuditLogWriter + ?Sized,
{
    let cutoff = now - Duration::days(retention_days);
    let mut removed = 0;
    loop {
        let deleted = repo.delete_audit_logs_before(cutoff, CLEANUP_BATCH_SIZE)?;
        removed += deleted;
        if (deleted as i64) < CLEANUP_BATCH_SIZE {
            break;
        }
    }
    log::info!("Audit retention sweep removed {removed} entries older than {cutoff}");
    Ok(removed)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin, at, member};

    #[test]
    fn record_swallows_storage_errors() {
        let mut repo = MockRepository::new();
        repo.expect_create_audit_log()
            .times(1)
            .returning(|_| Err(RepositoryError::ConnectionError("gone".into())));

        let mut event = event_by(
            &admin(),
            CompanyId::new(1).unwrap(),
            EntityType::Client,
            3,
            "Maria",
            AuditAction::Create,
        );
        event.new_values = Some(json!({"name": "Maria"}));

        record(&repo, event, &AuditContext::default());
    }

    #[test]
    fn unchanged_update_is_not_recorded() {
        let mut repo = MockRepository::new();
        repo.expect_create_audit_log().times(0);

        let mut event = event_by(
            &admin(),
            CompanyId::new(1).unwrap(),
            EntityType::Client,
            3,
            "Maria",
            AuditAction::Update,
        );
        event.old_values = Some(json!({"name": "Maria", "updated_at": "a"}));
        event.new_values = Some(json!({"name": "Maria", "updated_at": "b"}));

        record(&repo, event, &AuditContext::default());
    }

    #[test]
    fn members_only_see_their_entries() {
        let mut repo = MockRepository::new();
        repo.expect_list_audit_logs()
            .withf(|query| query.user_id.map(UserId::get) == Some(7))
            .times(1)
            .returning(|_| Ok((0, Vec::new())));

        let page = list_audit_logs(&repo, &member(), AuditLogParams::default()).unwrap();
        assert_eq!(page.total, 0);
        assert_eq!(page.limit, DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn admins_filter_by_any_user() {
        let mut repo = MockRepository::new();
        repo.expect_list_audit_logs()
            .withf(|query| {
                query.user_id.map(UserId::get) == Some(11)
                    && query.action == Some(AuditAction::Delete)
            })
            .times(1)
            .returning(|_| Ok((0, Vec::new())));

        let params = AuditLogParams {
            action: Some("DELETE".into()),
            user_id: Some(11),
            ..Default::default()
        };
        list_audit_logs(&repo, &admin(), params).unwrap();
    }

    #[test]
    fn cleanup_runs_until_a_short_batch() {
        let mut repo = MockRepository::new();
        let mut calls = 0;
        repo.expect_delete_audit_logs_before()
            .times(3)
            .returning(move |_, batch| {
                calls += 1;
                Ok(if calls < 3 { batch as usize } else { 10 })
            });

        let removed = cleanup_audit_logs(&repo, at("2025-03-10 03:00"), 365).unwrap();
        assert_eq!(removed, 2 * CLEANUP_BATCH_SIZE as usize + 10);
    }

    #[test]
    fn export_requires_admin() {
        let repo = MockRepository::new();
        assert!(export_audit_logs(&repo, &member(), AuditLogParams::default()).is_err());
    }
}
