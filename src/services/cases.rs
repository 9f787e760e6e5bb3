//! Lawsuits tracked by the firm, their deadlines and their court movements.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDateTime};
use validator::Validate;

use crate::domain::audit_log::{AuditAction, AuditContext, AuditLog, EntityType};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::case::{
    Case, CaseDetails, CaseListItem, CaseStatus, NewCase, UpdateCase, deadline_event_title,
    pin_deadline,
};
use crate::domain::case_part::NewCasePart;
use crate::domain::client::Client;
use crate::domain::schedule::{EventFields, EventType, NewScheduleEvent, Priority};
use crate::domain::types::{CaseId, ClientId, CompanyId, EventTitle, UserId};
use crate::dto::cases::CaseListParams;
use crate::forms::cases::{CaseForm, DeadlineForm};
use crate::forms::parse_optional_date;
use crate::integrations::datajud::{CourtLookup, CourtProcess, is_valid_tribunal};
use crate::pagination::{PageParams, Paginated};
use crate::repository::{
    AuditLogReader, AuditLogWriter, CaseListQuery, CasePartReader, CaseReader, CaseWriter,
    ClientReader, CompanyReader, EventReader, EventWriter, UserReader,
};
use crate::services::audit_log::{entity_audit_logs, event_by, record, snapshot};
use crate::services::notifications::{
    CASE_UPDATE_TEMPLATE, NotificationQueue, case_update_message, email_job, publish,
    telegram_job,
};
use crate::services::{
    ServiceError, ServiceResult, form_error, normalize_search, not_found_or, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 10;
const SEARCH_LIMIT: usize = 10;
const DUPLICATE_PROCESS: &str = "Já existe um processo com este número";

fn load_case<R>(repo: &R, company_id: CompanyId, case_id: i32) -> ServiceResult<Case>
where
    R: CaseReader + ?Sized,
{
    repo.get_case_by_id(CaseId::new(case_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

fn load_active_client<R>(
    repo: &R,
    company_id: CompanyId,
    client_id: ClientId,
) -> ServiceResult<Client>
where
    R: ClientReader + ?Sized,
{
    repo.get_client_by_id(client_id, company_id)?
        .filter(|client| client.active)
        .ok_or(ServiceError::NotFound)
}

fn ensure_unique_number<R>(
    repo: &R,
    company_id: CompanyId,
    process_number: &str,
    except: Option<CaseId>,
) -> ServiceResult<()>
where
    R: CaseReader + ?Sized,
{
    match repo.get_case_by_process_number(company_id, process_number)? {
        Some(existing) if Some(existing.id) != except => {
            Err(ServiceError::Form(DUPLICATE_PROCESS.to_string()))
        }
        _ => Ok(()),
    }
}

fn ensure_responsible<R>(
    repo: &R,
    company_id: CompanyId,
    responsible: Option<UserId>,
) -> ServiceResult<()>
where
    R: UserReader + ?Sized,
{
    let Some(user_id) = responsible else {
        return Ok(());
    };
    if repo.list_active_users_by_ids(company_id, &[user_id])?.is_empty() {
        return Err(ServiceError::Form("Responsável pelo prazo inválido".to_string()));
    }
    Ok(())
}

/// Parts linking a client must point at one of the company's clients. A
/// linked part without a name takes the client's.
fn resolve_parts<R>(
    repo: &R,
    company_id: CompanyId,
    parts: Vec<NewCasePart>,
) -> ServiceResult<Vec<NewCasePart>>
where
    R: ClientReader + ?Sized,
{
    parts
        .into_iter()
        .map(|mut part| {
            if let Some(client_id) = part.client_id {
                let client = repo
                    .get_client_by_id(client_id, company_id)?
                    .ok_or_else(|| ServiceError::Form("Cliente da parte inválido".to_string()))?;
                if part.name.is_empty() {
                    part.name = client.name.into_inner();
                }
            }
            Ok(part)
        })
        .collect()
}

/// Asks DataJud for the process. Failures leave the case without court data.
fn lookup_quietly<C>(
    court: &C,
    tribunal: Option<&str>,
    process_number: &str,
) -> Option<CourtProcess>
where
    C: CourtLookup + ?Sized,
{
    match tribunal.filter(|t| is_valid_tribunal(t)) {
        Some(tribunal) => match court.lookup(tribunal, process_number) {
            Ok(found) => found,
            Err(err) => {
                log::warn!("DataJud lookup for {process_number} failed: {err}");
                None
            }
        },
        None => court.search_all(process_number),
    }
}

/// Keeps the PRAZO event of a case in line with its deadline: upserted while
/// the case has one, removed when it is cleared.
fn sync_deadline_event<R>(repo: &R, case: &Case, created_by: Option<UserId>) -> ServiceResult<()>
where
    R: EventReader + EventWriter + ?Sized,
{
    let existing = repo.find_case_deadline_event(case.company_id, case.id)?;
    let Some(deadline) = case.deadline else {
        if let Some(event) = existing {
            repo.delete_event(event.id, case.company_id)
                .map_err(not_found_or)?;
        }
        return Ok(());
    };

    let fields = EventFields {
        title: EventTitle::new(deadline_event_title(&case.process_number))?,
        description: case.subject.clone(),
        event_type: EventType::Prazo,
        priority: Priority::Alta,
        date: deadline,
        end_date: None,
        completed: case.deadline_completed,
        client_id: Some(case.client_id),
        case_id: Some(case.id),
        google_meet_link: None,
        assigned_user_ids: case.deadline_responsible_id.into_iter().collect(),
    };
    match existing {
        Some(event) => {
            repo.update_event(event.id, case.company_id, &fields)?;
        }
        None => {
            repo.create_event(&NewScheduleEvent {
                company_id: case.company_id,
                created_by,
                fields,
            })?;
        }
    }
    Ok(())
}

/// Sends the `informar_cliente` text to the client over Telegram and email.
fn notify_client<R, Q>(repo: &R, queue: &Q, case: &Case, update: &str) -> ServiceResult<()>
where
    R: ClientReader + CompanyReader + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    let Some(client) = repo.get_client_by_id(case.client_id, case.company_id)? else {
        return Ok(());
    };
    let company_name = repo
        .get_company_by_id(case.company_id)?
        .map(|company| company.name.as_str().to_string())
        .unwrap_or_default();

    if let Some(chat_id) = client.telegram_chat_id.as_deref().filter(|id| !id.is_empty()) {
        let text = case_update_message(
            client.name.as_str(),
            &case.process_number,
            update,
            &company_name,
        );
        publish(queue, telegram_job(chat_id, text));
    }
    if let Some(email) = client.email.as_deref() {
        let context = BTreeMap::from([
            ("client_name".to_string(), client.name.as_str().to_string()),
            ("process_number".to_string(), case.process_number.clone()),
            ("update".to_string(), update.to_string()),
            ("company_name".to_string(), company_name.clone()),
        ]);
        publish(
            queue,
            email_job(
                email,
                format!("Atualização do processo {}", case.process_number),
                CASE_UPDATE_TEMPLATE,
                context,
            ),
        );
    }
    log::info!("Client {} notified about case {}", client.id.get(), case.id.get());
    Ok(())
}

fn audit_case<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case: &Case,
    action: AuditAction,
    old: Option<&Case>,
    context: &AuditContext,
) where
    R: AuditLogWriter + ?Sized,
{
    let mut event = event_by(
        user,
        case.company_id,
        EntityType::Case,
        case.id.get(),
        case.process_number.as_str(),
        action,
    );
    event.old_values = old.and_then(snapshot);
    if action != AuditAction::Delete {
        event.new_values = snapshot(case);
    }
    record(repo, event, context);
}

pub fn list_cases<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: CaseListParams,
) -> ServiceResult<Paginated<CaseListItem>>
where
    R: CaseReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = CaseListQuery::new(company_id);
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.status(status.parse::<CaseStatus>()?);
    }

    let (total, cases) = repo.list_cases(query.paginate(page, limit))?;
    Ok(Paginated::new(cases, total, page, limit))
}

pub fn get_case<R>(repo: &R, user: &AuthenticatedUser, case_id: i32) -> ServiceResult<CaseDetails>
where
    R: CaseReader + CasePartReader + ClientReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let case = load_case(repo, company_id, case_id)?;
    let client = repo
        .get_client_by_id(case.client_id, company_id)?
        .ok_or(ServiceError::NotFound)?;
    let parts = repo.list_case_parts(case.id)?;
    let movements = repo.list_case_movements(case.id)?;
    Ok(CaseDetails {
        case,
        client,
        parts,
        movements,
    })
}

/// Creates a case, pulling its court history from DataJud when the number
/// is known there.
pub fn create_case<R, C>(
    repo: &R,
    court: &C,
    user: &AuthenticatedUser,
    form: CaseForm,
    now: NaiveDateTime,
    context: &AuditContext,
) -> ServiceResult<Case>
where
    R: CaseReader
        + CaseWriter
        + ClientReader
        + UserReader
        + EventReader
        + EventWriter
        + AuditLogWriter
        + ?Sized,
    C: CourtLookup + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let input = form.input()?;

    load_active_client(repo, company_id, input.client_id)?;
    ensure_unique_number(repo, company_id, &input.process_number, None)?;
    ensure_responsible(repo, company_id, input.deadline_responsible_id)?;
    let parts = resolve_parts(repo, company_id, form.parts()?)?;

    let found = lookup_quietly(court, input.court.as_deref(), &input.process_number);
    let sync = found.map(|process| process.into_sync(now));
    let court_name = input
        .court
        .or_else(|| sync.as_ref().and_then(|sync| sync.court.clone()));

    let case = repo.create_case(&NewCase {
        company_id,
        client_id: input.client_id,
        process_number: input.process_number,
        court: court_name,
        subject: input.subject,
        value_cents: input.value_cents,
        status: input.status,
        notes: input.notes,
        informar_cliente: input.informar_cliente,
        deadline: input.deadline,
        deadline_responsible_id: input.deadline_responsible_id,
        sync,
        parts,
    })?;

    if let Err(err) = sync_deadline_event(repo, &case, user.user_id().ok()) {
        if let Err(cleanup) = repo.delete_case(case.id, company_id) {
            log::error!(
                "Failed to remove case {} after its deadline event failed: {cleanup}",
                case.id.get()
            );
        }
        return Err(err);
    }
    audit_case(repo, user, &case, AuditAction::Create, None, context);
    log::info!(
        "Case {} created for company {} (court data: {})",
        case.id.get(),
        company_id.get(),
        case.last_synced_at.is_some()
    );
    Ok(case)
}

pub fn update_case<R, Q>(
    repo: &R,
    queue: &Q,
    user: &AuthenticatedUser,
    case_id: i32,
    form: CaseForm,
    context: &AuditContext,
) -> ServiceResult<Case>
where
    R: CaseReader
        + CaseWriter
        + ClientReader
        + CompanyReader
        + UserReader
        + EventReader
        + EventWriter
        + AuditLogWriter
        + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = load_case(repo, company_id, case_id)?;
    let input = form.input()?;

    if input.client_id != current.client_id {
        load_active_client(repo, company_id, input.client_id)?;
    }
    if input.process_number != current.process_number {
        ensure_unique_number(repo, company_id, &input.process_number, Some(current.id))?;
    }
    ensure_responsible(repo, company_id, input.deadline_responsible_id)?;

    let mut updates = UpdateCase::from_case(&current);
    updates.client_id = input.client_id;
    updates.process_number = input.process_number;
    updates.court = input.court;
    updates.subject = input.subject;
    updates.value_cents = input.value_cents;
    updates.status = input.status;
    updates.notes = input.notes;
    updates.informar_cliente = input.informar_cliente;
    updates.deadline_responsible_id = input.deadline_responsible_id;
    updates.set_deadline(input.deadline);

    let updated = repo.update_case(current.id, company_id, &updates)?;
    sync_deadline_event(repo, &updated, user.user_id().ok())?;

    if updated.informar_cliente != current.informar_cliente
        && let Some(update) = updated.informar_cliente.as_deref().filter(|s| !s.is_empty())
        && let Err(err) = notify_client(repo, queue, &updated, update)
    {
        log::error!("Failed to notify client about case {}: {err}", updated.id.get());
    }

    audit_case(repo, user, &updated, AuditAction::Update, Some(&current), context);
    Ok(updated)
}

pub fn delete_case<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case_id: i32,
    context: &AuditContext,
) -> ServiceResult<()>
where
    R: CaseReader + CaseWriter + EventReader + EventWriter + AuditLogWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let current = load_case(repo, company_id, case_id)?;

    if let Some(event) = repo.find_case_deadline_event(company_id, current.id)? {
        repo.delete_event(event.id, company_id)
            .map_err(not_found_or)?;
    }
    repo.delete_case(current.id, company_id)
        .map_err(not_found_or)?;

    audit_case(repo, user, &current, AuditAction::Delete, Some(&current), context);
    Ok(())
}

/// Open deadlines plus those completed in the last 24 hours.
pub fn list_deadlines<R>(
    repo: &R,
    user: &AuthenticatedUser,
    now: NaiveDateTime,
) -> ServiceResult<Vec<CaseListItem>>
where
    R: CaseReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    Ok(repo.list_deadlines(company_id, now - Duration::hours(24))?)
}

pub fn toggle_deadline_completed<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<Case>
where
    R: CaseReader + CaseWriter + EventReader + EventWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let current = load_case(repo, company_id, case_id)?;
    if current.deadline.is_none() {
        return Err(ServiceError::Form("Processo não possui prazo".to_string()));
    }

    let mut updates = UpdateCase::from_case(&current);
    updates.deadline_completed = !current.deadline_completed;
    updates.deadline_completed_at = updates.deadline_completed.then_some(now);

    let updated = repo.update_case(current.id, company_id, &updates)?;
    sync_deadline_event(repo, &updated, user.user_id().ok())?;
    Ok(updated)
}

pub fn update_deadline<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case_id: i32,
    form: DeadlineForm,
) -> ServiceResult<Case>
where
    R: CaseReader + CaseWriter + UserReader + EventReader + EventWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let current = load_case(repo, company_id, case_id)?;

    let deadline = parse_optional_date(form.deadline.as_deref())?.map(pin_deadline);
    let responsible = form.deadline_responsible_id.map(UserId::new).transpose()?;
    ensure_responsible(repo, company_id, responsible)?;

    let mut updates = UpdateCase::from_case(&current);
    updates.deadline_responsible_id = responsible;
    updates.deadline = deadline;
    updates.deadline_completed = false;
    updates.deadline_completed_at = None;

    let updated = repo.update_case(current.id, company_id, &updates)?;
    sync_deadline_event(repo, &updated, user.user_id().ok())?;
    Ok(updated)
}

/// Cases with court data the firm has not looked at yet.
pub fn pending_updates<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<Vec<CaseListItem>>
where
    R: CaseReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    Ok(repo.list_pending_updates(company_id)?)
}

pub fn acknowledge_case<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<()>
where
    R: CaseReader + CaseWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let case = load_case(repo, company_id, case_id)?;
    repo.acknowledge_case(case.id, company_id, now)
        .map_err(not_found_or)
}

pub fn search_cases<R>(
    repo: &R,
    user: &AuthenticatedUser,
    term: Option<String>,
) -> ServiceResult<Vec<Case>>
where
    R: CaseReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    match normalize_search(term) {
        Some(term) => Ok(repo.search_cases(company_id, &term, SEARCH_LIMIT)?),
        None => Ok(Vec::new()),
    }
}

/// Re-reads the court history and replaces the stored movements.
pub fn sync_movements<R, C>(
    repo: &R,
    court: &C,
    user: &AuthenticatedUser,
    case_id: i32,
    now: NaiveDateTime,
) -> ServiceResult<Case>
where
    R: CaseReader + CaseWriter + ?Sized,
    C: CourtLookup + ?Sized,
{
    let company_id = tenant_of(user)?;
    let case = load_case(repo, company_id, case_id)?;

    let found = match case.court.as_deref().filter(|t| is_valid_tribunal(t)) {
        Some(tribunal) => court.lookup(tribunal, &case.process_number)?,
        None => court.search_all(&case.process_number),
    };
    let Some(process) = found else {
        log::info!("Process {} not found in DataJud", case.process_number);
        return Err(ServiceError::NotFound);
    };

    let updated = repo.replace_case_movements(case.id, &process.into_sync(now))?;
    log::info!("Case {} synced with DataJud", updated.id.get());
    Ok(updated)
}

/// Audit trail of one case.
pub fn case_audit_logs<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case_id: i32,
) -> ServiceResult<Vec<AuditLog>>
where
    R: CaseReader + AuditLogReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let case = load_case(repo, company_id, case_id)?;
    entity_audit_logs(repo, user, EntityType::Case, case.id.get())
}

#[cfg(all(test, feature = "test-mocks"))]
pub(crate) mod tests {
    use super::*;
    use crate::domain::case::NewCaseMovement;
    use crate::domain::client::PersonType;
    use crate::domain::schedule::ScheduleEvent;
    use crate::domain::types::{EventId, PersonName};
    use crate::integrations::datajud::MockCourtLookup;
    use crate::repository::errors::RepositoryError;
    use crate::repository::mock::MockRepository;
    use crate::services::notifications::MockNotificationQueue;
    use crate::services::test_support::{at, member};

    pub(crate) fn case(id: i32) -> Case {
        Case {
            id: CaseId::new(id).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            client_id: ClientId::new(3).unwrap(),
            process_number: "0001234-56.2024.8.19.0001".into(),
            court: None,
            subject: Some("Cobrança".into()),
            value_cents: None,
            status: CaseStatus::Active,
            notes: None,
            informar_cliente: None,
            ultimo_andamento: None,
            deadline: None,
            deadline_responsible_id: None,
            deadline_completed: false,
            deadline_completed_at: None,
            last_synced_at: None,
            last_acknowledged_at: None,
            created_at: at("2025-03-01 09:00"),
            updated_at: at("2025-03-01 09:00"),
        }
    }

    pub(crate) fn client(id: i32) -> Client {
        Client {
            id: ClientId::new(id).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            person_type: PersonType::Fisica,
            name: PersonName::new("Maria Silva").unwrap(),
            cpf: None,
            rg: None,
            email: None,
            phone: None,
            address: None,
            city: None,
            state: None,
            zip_code: None,
            profession: None,
            marital_status: None,
            birth_date: None,
            representative_name: None,
            representative_cpf: None,
            notes: None,
            telegram_chat_id: Some("555".into()),
            active: true,
            created_at: at("2025-02-01 10:00"),
            updated_at: at("2025-02-01 10:00"),
            tags: Vec::new(),
        }
    }

    fn deadline_event(case_id: CaseId) -> ScheduleEvent {
        ScheduleEvent {
            id: EventId::new(40).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            title: EventTitle::new("Prazo: 0001234-56.2024.8.19.0001").unwrap(),
            description: None,
            event_type: EventType::Prazo,
            priority: Priority::Alta,
            date: at("2025-04-01 12:00"),
            end_date: None,
            completed: false,
            client_id: None,
            case_id: Some(case_id),
            google_meet_link: None,
            created_by: None,
            created_at: at("2025-03-01 09:00"),
            updated_at: at("2025-03-01 09:00"),
            assigned_users: Vec::new(),
        }
    }

    fn form(deadline: Option<&str>, informar: Option<&str>) -> CaseForm {
        CaseForm {
            client_id: 3,
            process_number: "00012345620248190001".into(),
            court: None,
            subject: Some("Cobrança".into()),
            value_cents: None,
            status: None,
            notes: None,
            informar_cliente: informar.map(str::to_string),
            deadline: deadline.map(str::to_string),
            deadline_responsible_id: None,
            parts: Vec::new(),
        }
    }

    fn found_process() -> CourtProcess {
        CourtProcess {
            tribunal: "TJRJ".into(),
            process_number: "00012345620248190001".into(),
            class_name: None,
            subjects: Vec::new(),
            court_unit: None,
            movements: vec![NewCaseMovement {
                code: 85,
                name: "Petição".into(),
                movement_date: at("2025-02-20 10:00"),
                description: None,
            }],
        }
    }

    #[test]
    fn create_stores_court_data_when_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id()
            .returning(|id, _| Ok(Some(client(id.get()))));
        repo.expect_get_case_by_process_number().returning(|_, _| Ok(None));
        repo.expect_create_case()
            .withf(|new| {
                new.court.as_deref() == Some("TJRJ")
                    && new
                        .sync
                        .as_ref()
                        .and_then(|s| s.ultimo_andamento.as_deref())
                        == Some("Petição - 20/02/2025")
            })
            .times(1)
            .returning(|_| Ok(case(10)));
        repo.expect_find_case_deadline_event().returning(|_, _| Ok(None));
        repo.expect_create_audit_log().returning(|_| Ok(()));

        let mut court = MockCourtLookup::new();
        court
            .expect_search_all()
            .times(1)
            .returning(|_| Some(found_process()));

        let created = create_case(
            &repo,
            &court,
            &member(),
            form(None, None),
            at("2025-03-01 09:00"),
            &AuditContext::default(),
        )
        .unwrap();
        assert_eq!(created.id.get(), 10);
    }

    #[test]
    fn duplicate_number_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id()
            .returning(|id, _| Ok(Some(client(id.get()))));
        repo.expect_get_case_by_process_number()
            .returning(|_, _| Ok(Some(case(2))));
        repo.expect_create_case().times(0);
        let court = MockCourtLookup::new();

        assert!(matches!(
            create_case(
                &repo,
                &court,
                &member(),
                form(None, None),
                at("2025-03-01 09:00"),
                &AuditContext::default(),
            ),
            Err(ServiceError::Form(msg)) if msg == DUPLICATE_PROCESS
        ));
    }

    #[test]
    fn inactive_client_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id().returning(|id, _| {
            let mut inactive = client(id.get());
            inactive.active = false;
            Ok(Some(inactive))
        });
        let court = MockCourtLookup::new();

        assert!(matches!(
            create_case(
                &repo,
                &court,
                &member(),
                form(None, None),
                at("2025-03-01 09:00"),
                &AuditContext::default(),
            ),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn failed_deadline_event_removes_new_case() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id()
            .returning(|id, _| Ok(Some(client(id.get()))));
        repo.expect_get_case_by_process_number().returning(|_, _| Ok(None));
        repo.expect_create_case().times(1).returning(|new| {
            let mut created = case(10);
            created.deadline = new.deadline;
            Ok(created)
        });
        repo.expect_find_case_deadline_event().returning(|_, _| Ok(None));
        repo.expect_create_event()
            .times(1)
            .returning(|_| Err(RepositoryError::DatabaseError("disk full".into())));
        repo.expect_delete_case()
            .withf(|id, company_id| id.get() == 10 && company_id.get() == 1)
            .times(1)
            .returning(|_, _| Ok(()));
        repo.expect_create_audit_log().times(0);
        let mut court = MockCourtLookup::new();
        court.expect_search_all().returning(|_| None);

        assert!(matches!(
            create_case(
                &repo,
                &court,
                &member(),
                form(Some("2025-04-01"), None),
                at("2025-03-01 09:00"),
                &AuditContext::default(),
            ),
            Err(ServiceError::Repository(_))
        ));
    }

    #[test]
    fn setting_deadline_creates_prazo_event() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id()
            .returning(|id, _| Ok(Some(case(id.get()))));
        repo.expect_update_case()
            .withf(|_, _, updates| !updates.deadline_completed && updates.deadline.is_some())
            .returning(|id, _, updates| {
                let mut updated = case(id.get());
                updated.deadline = updates.deadline;
                Ok(updated)
            });
        repo.expect_find_case_deadline_event().returning(|_, _| Ok(None));
        repo.expect_create_event()
            .withf(|new| {
                new.fields.event_type == EventType::Prazo
                    && new.fields.priority == Priority::Alta
                    && new.fields.title.as_str() == "Prazo: 0001234-56.2024.8.19.0001"
                    && new.fields.date == at("2025-04-01 12:00")
            })
            .times(1)
            .returning(|_| Ok(deadline_event(CaseId::new(5).unwrap())));
        repo.expect_create_audit_log().returning(|_| Ok(()));
        let queue = MockNotificationQueue::new();

        update_case(
            &repo,
            &queue,
            &member(),
            5,
            form(Some("2025-04-01"), None),
            &AuditContext::default(),
        )
        .unwrap();
    }

    #[test]
    fn clearing_deadline_removes_prazo_event() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id().returning(|id, _| {
            let mut current = case(id.get());
            current.deadline = Some(at("2025-04-01 12:00"));
            Ok(Some(current))
        });
        repo.expect_update_case()
            .returning(|id, _, _| Ok(case(id.get())));
        repo.expect_find_case_deadline_event()
            .returning(|_, case_id| Ok(Some(deadline_event(case_id))));
        repo.expect_delete_event().times(1).returning(|_, _| Ok(()));

        let form = DeadlineForm {
            deadline: None,
            deadline_responsible_id: None,
        };
        update_deadline(&repo, &member(), 5, form).unwrap();
    }

    #[test]
    fn changed_client_message_is_sent_by_telegram() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id()
            .returning(|id, _| Ok(Some(case(id.get()))));
        repo.expect_update_case().returning(|id, _, updates| {
            let mut updated = case(id.get());
            updated.informar_cliente = updates.informar_cliente.clone();
            Ok(updated)
        });
        repo.expect_find_case_deadline_event().returning(|_, _| Ok(None));
        repo.expect_get_client_by_id()
            .returning(|id, _| Ok(Some(client(id.get()))));
        repo.expect_get_company_by_id().returning(|_| Ok(None));
        repo.expect_create_audit_log().returning(|_| Ok(()));

        let mut queue = MockNotificationQueue::new();
        queue
            .expect_enqueue()
            .withf(|job| {
                matches!(job, crate::models::zmq::NotificationJob::Telegram { chat_id, text }
                    if chat_id == "555" && text.contains("Audiência marcada"))
            })
            .times(1)
            .returning(|_| Ok(()));

        update_case(
            &repo,
            &queue,
            &member(),
            5,
            form(None, Some("Audiência marcada")),
            &AuditContext::default(),
        )
        .unwrap();
    }

    #[test]
    fn toggling_requires_a_deadline() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id()
            .returning(|id, _| Ok(Some(case(id.get()))));
        repo.expect_update_case().times(0);
        assert!(matches!(
            toggle_deadline_completed(&repo, &member(), 5, at("2025-03-02 10:00")),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn toggling_sets_completion_time() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id().returning(|id, _| {
            let mut current = case(id.get());
            current.deadline = Some(at("2025-04-01 12:00"));
            Ok(Some(current))
        });
        repo.expect_update_case()
            .withf(|_, _, updates| {
                updates.deadline_completed
                    && updates.deadline_completed_at == Some(at("2025-03-02 10:00"))
            })
            .times(1)
            .returning(|id, _, _| Ok(case(id.get())));
        repo.expect_find_case_deadline_event().returning(|_, _| Ok(None));

        toggle_deadline_completed(&repo, &member(), 5, at("2025-03-02 10:00")).unwrap();
    }

    #[test]
    fn sync_uses_stored_tribunal_and_reports_missing_process() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id().returning(|id, _| {
            let mut current = case(id.get());
            current.court = Some("TJRJ".into());
            Ok(Some(current))
        });
        repo.expect_replace_case_movements().times(0);

        let mut court = MockCourtLookup::new();
        court
            .expect_lookup()
            .withf(|tribunal, _| tribunal == "TJRJ")
            .times(1)
            .returning(|_, _| Ok(None));
        court.expect_search_all().times(0);

        assert!(matches!(
            sync_movements(&repo, &court, &member(), 5, at("2025-03-02 10:00")),
            Err(ServiceError::NotFound)
        ));
    }
}
