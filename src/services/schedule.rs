//! Firm calendar: appointments, tasks, hearings and deadlines.

use chrono::{Duration, NaiveDateTime, NaiveTime};
use validator::Validate;

use crate::domain::audit_log::{AuditAction, AuditContext, EntityType};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::schedule::{
    ConflictQuery, EventFields, EventType, NewScheduleEvent, ScheduleEvent, conflict_message,
    overlaps,
};
use crate::domain::types::{CaseId, ClientId, CompanyId, EventId, UserId};
use crate::domain::user::User;
use crate::dto::schedule::EventListParams;
use crate::forms::schedule::EventForm;
use crate::forms::{parse_optional_datetime, parse_optional_end};
use crate::pagination::{PageParams, Paginated};
use crate::repository::{
    AuditLogWriter, CaseReader, ClientReader, CompanyReader, EventListQuery, EventReader,
    EventWriter, UserReader,
};
use crate::services::audit_log::{event_by, record, snapshot};
use crate::services::notifications::{
    NotificationQueue, event_assignment_message, publish, telegram_job,
};
use crate::services::{
    ServiceError, ServiceResult, form_error, normalize_search, not_found_or, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 20;
const DEFAULT_UPCOMING: usize = 5;
const DAY_LIMIT: usize = 200;

fn load_event<R>(repo: &R, company_id: CompanyId, event_id: i32) -> ServiceResult<ScheduleEvent>
where
    R: EventReader + ?Sized,
{
    repo.get_event_by_id(EventId::new(event_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

/// Checks that every referenced record belongs to the company and returns
/// the assigned users.
fn check_references<R>(
    repo: &R,
    company_id: CompanyId,
    fields: &EventFields,
) -> ServiceResult<Vec<User>>
where
    R: UserReader + ClientReader + CaseReader + ?Sized,
{
    let assignees = if fields.assigned_user_ids.is_empty() {
        Vec::new()
    } else {
        repo.list_active_users_by_ids(company_id, &fields.assigned_user_ids)?
    };
    if assignees.len() != fields.assigned_user_ids.len() {
        return Err(ServiceError::Form(
            "Usuários atribuídos inválidos ou inativos".to_string(),
        ));
    }
    if let Some(client_id) = fields.client_id
        && repo.get_client_by_id(client_id, company_id)?.is_none()
    {
        return Err(ServiceError::Form("Cliente inválido".to_string()));
    }
    if let Some(case_id) = fields.case_id
        && repo.get_case_by_id(case_id, company_id)?.is_none()
    {
        return Err(ServiceError::Form("Processo inválido".to_string()));
    }
    Ok(assignees)
}

/// Rejects the event when one of its assignees already has an open event
/// overlapping the same window.
fn check_conflicts<R>(
    repo: &R,
    company_id: CompanyId,
    fields: &EventFields,
    exclude_event: Option<EventId>,
) -> ServiceResult<()>
where
    R: EventReader + ?Sized,
{
    if fields.assigned_user_ids.is_empty() || fields.completed {
        return Ok(());
    }
    let (start, end) = fields.window();
    let candidates = repo.find_conflicting_events(&ConflictQuery {
        company_id,
        user_ids: fields.assigned_user_ids.clone(),
        start,
        end,
        exclude_event,
    })?;

    let conflicts: Vec<ScheduleEvent> = candidates
        .into_iter()
        .filter(|event| {
            Some(event.id) != exclude_event
                && !event.completed
                && overlaps(start, end, event.date, event.end_date)
        })
        .collect();
    let Some(first) = conflicts.first() else {
        return Ok(());
    };
    let mut names: Vec<String> = Vec::new();
    for user in conflicts.iter().flat_map(|event| &event.assigned_users) {
        if fields.assigned_user_ids.contains(&user.id) && !names.contains(&user.name) {
            names.push(user.name.clone());
        }
    }
    Err(ServiceError::Conflict(conflict_message(
        &names,
        first.title.as_str(),
        first.date,
    )))
}

/// Telegram notice for users newly assigned to the event.
fn notify_assignees<R, Q>(
    repo: &R,
    queue: &Q,
    event: &ScheduleEvent,
    assignees: &[User],
    already_assigned: &[UserId],
) where
    R: CompanyReader + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    let recipients = assignees
        .iter()
        .filter(|user| !already_assigned.contains(&user.id))
        .filter_map(|user| user.telegram_chat_id.as_deref().filter(|id| !id.is_empty()))
        .collect::<Vec<_>>();
    if recipients.is_empty() {
        return;
    }

    let company_name = match repo.get_company_by_id(event.company_id) {
        Ok(company) => company
            .map(|company| company.name.as_str().to_string())
            .unwrap_or_default(),
        Err(err) => {
            log::error!("Failed to load company for event notification: {err}");
            String::new()
        }
    };
    let text = event_assignment_message(event, &company_name);
    for chat_id in recipients {
        publish(queue, telegram_job(chat_id, text.clone()));
    }
}

fn audit_event<R>(
    repo: &R,
    user: &AuthenticatedUser,
    event: &ScheduleEvent,
    action: AuditAction,
    old: Option<&ScheduleEvent>,
    context: &AuditContext,
) where
    R: AuditLogWriter + ?Sized,
{
    let mut entry = event_by(
        user,
        event.company_id,
        EntityType::ScheduleEvent,
        event.id.get(),
        event.title.as_str(),
        action,
    );
    entry.old_values = old.and_then(snapshot);
    if action != AuditAction::Delete {
        entry.new_values = snapshot(event);
    }
    record(repo, entry, context);
}

pub fn list_events<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: EventListParams,
) -> ServiceResult<Paginated<ScheduleEvent>>
where
    R: EventReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = EventListQuery::new(company_id).between(
        parse_optional_datetime(params.start_date.as_deref())?,
        parse_optional_end(params.end_date.as_deref())?,
    );
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    if let Some(event_type) = params.event_type.as_deref().filter(|t| !t.is_empty()) {
        query = query.event_type(event_type.parse::<EventType>()?);
    }
    if let Some(completed) = params.completed {
        query = query.completed(completed);
    }
    if let Some(client_id) = params.client_id {
        query = query.client(ClientId::new(client_id)?);
    }
    if let Some(case_id) = params.case_id {
        query = query.case(CaseId::new(case_id)?);
    }

    let (total, events) = repo.list_events(query.paginate(page, limit))?;
    Ok(Paginated::new(events, total, page, limit))
}

pub fn get_event<R>(
    repo: &R,
    user: &AuthenticatedUser,
    event_id: i32,
) -> ServiceResult<ScheduleEvent>
where
    R: EventReader + ?Sized,
{
    load_event(repo, tenant_of(user)?, event_id)
}

pub fn create_event<R, Q>(
    repo: &R,
    queue: &Q,
    user: &AuthenticatedUser,
    form: EventForm,
    context: &AuditContext,
) -> ServiceResult<ScheduleEvent>
where
    R: EventReader
        + EventWriter
        + UserReader
        + ClientReader
        + CaseReader
        + CompanyReader
        + AuditLogWriter
        + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let fields = EventFields::try_from(&form)?;

    let assignees = check_references(repo, company_id, &fields)?;
    check_conflicts(repo, company_id, &fields, None)?;

    let event = repo.create_event(&NewScheduleEvent {
        company_id,
        created_by: user.user_id().ok(),
        fields,
    })?;

    notify_assignees(repo, queue, &event, &assignees, &[]);
    audit_event(repo, user, &event, AuditAction::Create, None, context);
    Ok(event)
}

pub fn update_event<R, Q>(
    repo: &R,
    queue: &Q,
    user: &AuthenticatedUser,
    event_id: i32,
    form: EventForm,
    context: &AuditContext,
) -> ServiceResult<ScheduleEvent>
where
    R: EventReader
        + EventWriter
        + UserReader
        + ClientReader
        + CaseReader
        + CompanyReader
        + AuditLogWriter
        + ?Sized,
    Q: NotificationQueue + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = load_event(repo, company_id, event_id)?;
    let fields = EventFields::try_from(&form)?;

    let assignees = check_references(repo, company_id, &fields)?;
    check_conflicts(repo, company_id, &fields, Some(current.id))?;

    let updated = repo.update_event(current.id, company_id, &fields)?;

    notify_assignees(repo, queue, &updated, &assignees, &current.assignee_ids());
    audit_event(repo, user, &updated, AuditAction::Update, Some(&current), context);
    Ok(updated)
}

pub fn delete_event<R>(
    repo: &R,
    user: &AuthenticatedUser,
    event_id: i32,
    context: &AuditContext,
) -> ServiceResult<()>
where
    R: EventReader + EventWriter + AuditLogWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let current = load_event(repo, company_id, event_id)?;
    repo.delete_event(current.id, company_id)
        .map_err(not_found_or)?;
    audit_event(repo, user, &current, AuditAction::Delete, Some(&current), context);
    Ok(())
}

pub fn toggle_complete<R>(
    repo: &R,
    user: &AuthenticatedUser,
    event_id: i32,
) -> ServiceResult<ScheduleEvent>
where
    R: EventReader + EventWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let current = load_event(repo, company_id, event_id)?;
    Ok(repo.set_event_completed(current.id, company_id, !current.completed)?)
}

/// Next open events, soonest first.
pub fn upcoming_events<R>(
    repo: &R,
    user: &AuthenticatedUser,
    limit: Option<usize>,
    now: NaiveDateTime,
) -> ServiceResult<Vec<ScheduleEvent>>
where
    R: EventReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let limit = limit.filter(|l| *l > 0).unwrap_or(DEFAULT_UPCOMING);
    Ok(repo.list_upcoming_events(company_id, now, limit)?)
}

/// Tasks due on the current day.
pub fn today_tasks<R>(
    repo: &R,
    user: &AuthenticatedUser,
    now: NaiveDateTime,
) -> ServiceResult<Vec<ScheduleEvent>>
where
    R: EventReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let start = now.date().and_time(NaiveTime::MIN);
    let end = start + Duration::days(1) - Duration::seconds(1);
    let query = EventListQuery::new(company_id)
        .event_type(EventType::Tarefa)
        .between(Some(start), Some(end))
        .paginate(1, DAY_LIMIT);
    let (_, events) = repo.list_events(query)?;
    Ok(events)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::schedule::Priority;
    use crate::domain::types::{EmailAddress, EventTitle, PersonName, Role};
    use crate::domain::user::UserSummary;
    use crate::models::zmq::NotificationJob;
    use crate::repository::mock::MockRepository;
    use crate::services::notifications::MockNotificationQueue;
    use crate::services::test_support::{at, member};

    fn user(id: i32, name: &str, chat: Option<&str>) -> User {
        User {
            id: UserId::new(id).unwrap(),
            company_id: CompanyId::new(1).ok(),
            name: PersonName::new(name).unwrap(),
            email: EmailAddress::new(format!("user{id}@escritorio.com.br")).unwrap(),
            password_hash: String::new(),
            role: Role::User,
            active: true,
            email_verified: true,
            email_verification_token: None,
            email_verification_expiry: None,
            reset_token: None,
            reset_token_expiry: None,
            failed_login_attempts: 0,
            account_locked_until: None,
            tokens_invalidated_at: None,
            telegram_chat_id: chat.map(str::to_string),
            created_at: at("2025-01-01 09:00"),
            updated_at: at("2025-01-01 09:00"),
        }
    }

    fn event(id: i32, date: &str, assignees: &[(i32, &str)]) -> ScheduleEvent {
        ScheduleEvent {
            id: EventId::new(id).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            title: EventTitle::new("Audiência trabalhista").unwrap(),
            description: None,
            event_type: EventType::Audiencia,
            priority: Priority::Media,
            date: at(date),
            end_date: None,
            completed: false,
            client_id: None,
            case_id: None,
            google_meet_link: None,
            created_by: None,
            created_at: at("2025-03-01 09:00"),
            updated_at: at("2025-03-01 09:00"),
            assigned_users: assignees
                .iter()
                .map(|(id, name)| UserSummary {
                    id: UserId::new(*id).unwrap(),
                    name: name.to_string(),
                    email: String::new(),
                    telegram_chat_id: None,
                })
                .collect(),
        }
    }

    fn form(date: &str, assignees: Vec<i32>) -> EventForm {
        EventForm {
            title: "Reunião".into(),
            description: None,
            event_type: None,
            priority: None,
            date: date.into(),
            end_date: None,
            completed: false,
            client_id: None,
            case_id: None,
            assigned_user_ids: assignees,
        }
    }

    #[test]
    fn overlapping_assignee_is_a_conflict() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_users_by_ids()
            .returning(|_, _| Ok(vec![user(2, "Bruno Lima", None)]));
        repo.expect_find_conflicting_events()
            .returning(|_| Ok(vec![event(9, "2025-03-10 14:30", &[(2, "Bruno Lima")])]));
        repo.expect_create_event().times(0);
        let queue = MockNotificationQueue::new();

        let result = create_event(
            &repo,
            &queue,
            &member(),
            form("2025-03-10T14:00", vec![2]),
            &AuditContext::default(),
        );
        match result {
            Err(ServiceError::Conflict(msg)) => assert_eq!(
                msg,
                "Bruno Lima já possui compromisso marcado: \"Audiência trabalhista\" em 10/03/25 14:30"
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn conflict_names_every_booked_assignee() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_users_by_ids().returning(|_, _| {
            Ok(vec![user(2, "Bruno Lima", None), user(3, "Carla Dias", None)])
        });
        repo.expect_find_conflicting_events().returning(|_| {
            Ok(vec![
                event(9, "2025-03-10 14:30", &[(2, "Bruno Lima"), (4, "Davi Rocha")]),
                event(10, "2025-03-10 14:45", &[(3, "Carla Dias"), (2, "Bruno Lima")]),
            ])
        });
        repo.expect_create_event().times(0);
        let queue = MockNotificationQueue::new();

        let result = create_event(
            &repo,
            &queue,
            &member(),
            form("2025-03-10T14:00", vec![2, 3]),
            &AuditContext::default(),
        );
        match result {
            Err(ServiceError::Conflict(msg)) => assert_eq!(
                msg,
                "Bruno Lima, Carla Dias já possui compromisso marcado: \"Audiência trabalhista\" em 10/03/25 14:30"
            ),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn adjacent_event_is_not_a_conflict() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_users_by_ids()
            .returning(|_, _| Ok(vec![user(2, "Bruno Lima", Some("77"))]));
        repo.expect_find_conflicting_events()
            .returning(|_| Ok(vec![event(9, "2025-03-10 15:00", &[(2, "Bruno Lima")])]));
        repo.expect_create_event()
            .times(1)
            .returning(|_| Ok(event(11, "2025-03-10 14:00", &[(2, "Bruno Lima")])));
        repo.expect_get_company_by_id().returning(|_| Ok(None));
        repo.expect_create_audit_log().returning(|_| Ok(()));

        let mut queue = MockNotificationQueue::new();
        queue
            .expect_enqueue()
            .withf(|job| {
                matches!(job, NotificationJob::Telegram { chat_id, .. } if chat_id == "77")
            })
            .times(1)
            .returning(|_| Ok(()));

        create_event(
            &repo,
            &queue,
            &member(),
            form("2025-03-10T14:00", vec![2]),
            &AuditContext::default(),
        )
        .unwrap();
    }

    #[test]
    fn inactive_assignee_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_list_active_users_by_ids().returning(|_, _| Ok(Vec::new()));
        repo.expect_create_event().times(0);
        let queue = MockNotificationQueue::new();

        assert!(matches!(
            create_event(
                &repo,
                &queue,
                &member(),
                form("2025-03-10T14:00", vec![5]),
                &AuditContext::default(),
            ),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn existing_assignees_are_not_notified_again() {
        let mut repo = MockRepository::new();
        repo.expect_get_event_by_id()
            .returning(|id, _| Ok(Some(event(id.get(), "2025-03-10 14:00", &[(2, "Bruno Lima")]))));
        repo.expect_list_active_users_by_ids()
            .returning(|_, _| Ok(vec![user(2, "Bruno Lima", Some("77"))]));
        repo.expect_find_conflicting_events().returning(|_| Ok(Vec::new()));
        repo.expect_update_event()
            .returning(|id, _, _| Ok(event(id.get(), "2025-03-10 16:00", &[(2, "Bruno Lima")])));
        repo.expect_create_audit_log().returning(|_| Ok(()));

        let mut queue = MockNotificationQueue::new();
        queue.expect_enqueue().times(0);

        update_event(
            &repo,
            &queue,
            &member(),
            4,
            form("2025-03-10T16:00", vec![2]),
            &AuditContext::default(),
        )
        .unwrap();
    }

    #[test]
    fn today_tasks_cover_the_whole_day() {
        let mut repo = MockRepository::new();
        repo.expect_list_events()
            .withf(|query| {
                query.event_type == Some(EventType::Tarefa)
                    && query.start == Some(at("2025-03-10 00:00"))
                    && query.end.map(|end| end.to_string()).as_deref()
                        == Some("2025-03-10 23:59:59")
            })
            .times(1)
            .returning(|_| Ok((0, Vec::new())));

        assert!(today_tasks(&repo, &member(), at("2025-03-10 15:20")).unwrap().is_empty());
    }
}
