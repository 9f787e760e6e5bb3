use advwell::domain::audit_log::{AuditAction, EntityType, NewAuditLog};
use advwell::domain::auth::RevokedToken;
use advwell::domain::client::{ClientFields, NewClient, PersonType, UpdateClient};
use advwell::domain::schedule::{ConflictQuery, EventFields, EventType, NewScheduleEvent, Priority};
use advwell::domain::tag::{NewTag, UpdateTag};
use advwell::domain::types::{EventTitle, PersonName, TagName};
use advwell::repository::errors::RepositoryError;
use advwell::repository::{
    AuditLogQuery, AuditLogReader, AuditLogWriter, ClientListQuery, ClientReader, ClientWriter,
    CompanyReader, EventReader, EventWriter, TagListQuery, TagReader, TagWriter, UserListQuery,
    UserReader, UserWriter,
};
use chrono::{Duration, NaiveDate, NaiveDateTime, Utc};
use serde_json::json;

mod common;

fn at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 6, 2)
        .and_then(|d| d.and_hms_opt(hour, minute, 0))
        .unwrap()
}

fn client_fields(name: &str, cpf: &str, phone: Option<&str>) -> ClientFields {
    ClientFields {
        person_type: PersonType::Fisica,
        name: PersonName::new(name).unwrap(),
        cpf: Some(cpf.to_string()),
        rg: None,
        email: None,
        phone: phone.map(str::to_string),
        address: None,
        city: Some("Rio de Janeiro".to_string()),
        state: Some("RJ".to_string()),
        zip_code: None,
        profession: None,
        marital_status: None,
        birth_date: None,
        representative_name: None,
        representative_cpf: None,
        notes: None,
        telegram_chat_id: None,
    }
}

#[test]
fn test_company_and_user_repository() {
    let test_db = common::TestDb::new("test_company_and_user_repository.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");

    let stored = repo.get_company_by_id(company.id).unwrap().unwrap();
    assert_eq!(stored.name.as_str(), "Silva Advogados");
    assert!(stored.active);
    assert!(stored.trial_ends_at.is_some());
    assert_eq!(admin.company_id, Some(company.id));

    let found = repo.get_user_by_email("ANA@silva.adv.br").unwrap().unwrap();
    assert_eq!(found.id, admin.id);

    let (total, users) = repo.list_users(UserListQuery::new(company.id)).unwrap();
    assert_eq!(total, 1);
    assert_eq!(users[0].email.as_str(), "ana@silva.adv.br");

    assert!(!repo.is_token_revoked("jti-1").unwrap());
    repo.revoke_token(&RevokedToken {
        jti: "jti-1".to_string(),
        user_id: admin.id,
        expires_at: Utc::now().naive_utc() + Duration::days(1),
    })
    .unwrap();
    assert!(repo.is_token_revoked("jti-1").unwrap());

    let deactivated = repo.set_user_active(admin.id, false).unwrap();
    assert!(!deactivated.active);
    let active = repo
        .list_active_users_by_ids(company.id, &[admin.id])
        .unwrap();
    assert!(active.is_empty());
}

#[test]
fn test_tag_repository_is_company_scoped() {
    let test_db = common::TestDb::new("test_tag_repository_is_company_scoped.db");
    let repo = test_db.repo();
    let (company, _) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let (other, _) = common::seed_company(&repo, "Souza & Lima", "contato@souzalima.adv.br");

    let vip = repo
        .create_tag(&NewTag {
            company_id: company.id,
            name: TagName::new("VIP").unwrap(),
            color: "#FF0000".to_string(),
        })
        .unwrap();

    let duplicate = repo.create_tag(&NewTag {
        company_id: company.id,
        name: TagName::new("VIP").unwrap(),
        color: "#00FF00".to_string(),
    });
    assert!(matches!(
        duplicate,
        Err(RepositoryError::ConstraintViolation(_))
    ));

    // Same name is free in another tenant.
    repo.create_tag(&NewTag {
        company_id: other.id,
        name: TagName::new("VIP").unwrap(),
        color: "#0000FF".to_string(),
    })
    .unwrap();

    assert!(repo.get_tag_by_id(vip.id, other.id).unwrap().is_none());
    assert_eq!(repo.count_company_tags(company.id, &[vip.id]).unwrap(), 1);
    assert_eq!(repo.count_company_tags(other.id, &[vip.id]).unwrap(), 0);

    let renamed = repo
        .update_tag(
            vip.id,
            company.id,
            &UpdateTag {
                name: TagName::new("Prioritário").unwrap(),
                color: "#123456".to_string(),
            },
        )
        .unwrap();
    assert_eq!(renamed.name.as_str(), "Prioritário");

    let (total, found) = repo
        .list_tags(TagListQuery::new(company.id).search("Prior"))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(found[0].id, vip.id);

    repo.delete_tag(vip.id, company.id).unwrap();
    assert!(repo.get_tag_by_id(vip.id, company.id).unwrap().is_none());
}

#[test]
fn test_client_repository_crud() {
    let test_db = common::TestDb::new("test_client_repository_crud.db");
    let repo = test_db.repo();
    let (company, _) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let tag = repo
        .create_tag(&NewTag {
            company_id: company.id,
            name: TagName::new("Trabalhista").unwrap(),
            color: "#3B82F6".to_string(),
        })
        .unwrap();

    let maria = repo
        .create_client(&NewClient {
            company_id: company.id,
            fields: client_fields("Maria Souza", "123.456.789-00", Some("21999990000")),
            tag_ids: vec![tag.id],
        })
        .unwrap();
    let joao = repo
        .create_client(&NewClient {
            company_id: company.id,
            fields: client_fields("João Pereira", "987.654.321-00", None),
            tag_ids: Vec::new(),
        })
        .unwrap();
    assert_eq!(maria.tags.len(), 1);
    assert_eq!(maria.tags[0].id, tag.id);

    let (total, tagged) = repo
        .list_clients(ClientListQuery::new(company.id).tag(tag.id))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(tagged[0].id, maria.id);

    let by_cpf = repo
        .get_client_by_cpf(company.id, "987.654.321-00")
        .unwrap()
        .unwrap();
    assert_eq!(by_cpf.id, joao.id);

    let with_phone = repo
        .list_clients_with_phone(company.id, None, 100)
        .unwrap();
    assert_eq!(with_phone.len(), 1);
    assert_eq!(with_phone[0].id, maria.id);

    let updated = repo
        .update_client(
            maria.id,
            company.id,
            &UpdateClient {
                fields: ClientFields {
                    notes: Some("Prefere contato por WhatsApp".to_string()),
                    ..client_fields("Maria Souza", "123.456.789-00", Some("21999990000"))
                },
                tag_ids: None,
            },
        )
        .unwrap();
    assert_eq!(updated.notes.as_deref(), Some("Prefere contato por WhatsApp"));
    assert_eq!(updated.tags.len(), 1);

    repo.deactivate_client(joao.id, company.id).unwrap();
    let (total_after, remaining) = repo.list_clients(ClientListQuery::new(company.id)).unwrap();
    assert_eq!(total_after, 1);
    assert_eq!(remaining[0].id, maria.id);
}

#[test]
fn test_schedule_conflicts_follow_assignees() {
    let test_db = common::TestDb::new("test_schedule_conflicts_follow_assignees.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");

    let hearing = repo
        .create_event(&NewScheduleEvent {
            company_id: company.id,
            created_by: Some(admin.id),
            fields: EventFields {
                title: EventTitle::new("Audiência de conciliação").unwrap(),
                description: None,
                event_type: EventType::Audiencia,
                priority: Priority::Alta,
                date: at(10, 0),
                end_date: Some(at(11, 0)),
                completed: false,
                client_id: None,
                case_id: None,
                google_meet_link: None,
                assigned_user_ids: vec![admin.id],
            },
        })
        .unwrap();
    assert_eq!(hearing.assignee_ids(), vec![admin.id]);

    let overlapping = repo
        .find_conflicting_events(&ConflictQuery {
            company_id: company.id,
            user_ids: vec![admin.id],
            start: at(10, 30),
            end: at(11, 30),
            exclude_event: None,
        })
        .unwrap();
    assert_eq!(overlapping.len(), 1);

    let back_to_back = repo
        .find_conflicting_events(&ConflictQuery {
            company_id: company.id,
            user_ids: vec![admin.id],
            start: at(11, 0),
            end: at(12, 0),
            exclude_event: None,
        })
        .unwrap();
    assert!(back_to_back.is_empty());

    let excluded = repo
        .find_conflicting_events(&ConflictQuery {
            company_id: company.id,
            user_ids: vec![admin.id],
            start: at(10, 30),
            end: at(11, 30),
            exclude_event: Some(hearing.id),
        })
        .unwrap();
    assert!(excluded.is_empty());

    let mut trial_fields = EventFields {
        title: EventTitle::new("Júri").unwrap(),
        description: None,
        event_type: EventType::Audiencia,
        priority: Priority::Media,
        date: at(7, 0) - Duration::days(1),
        end_date: Some(at(12, 0)),
        completed: false,
        client_id: None,
        case_id: None,
        google_meet_link: None,
        assigned_user_ids: vec![admin.id],
    };
    let trial = repo
        .create_event(&NewScheduleEvent {
            company_id: company.id,
            created_by: Some(admin.id),
            fields: trial_fields.clone(),
        })
        .unwrap();
    trial_fields.title = EventTitle::new("Reunião matinal").unwrap();
    trial_fields.date = at(8, 0);
    trial_fields.end_date = None;
    repo.create_event(&NewScheduleEvent {
        company_id: company.id,
        created_by: Some(admin.id),
        fields: trial_fields,
    })
    .unwrap();

    let afternoon = repo
        .find_conflicting_events(&ConflictQuery {
            company_id: company.id,
            user_ids: vec![admin.id],
            start: at(11, 30),
            end: at(12, 30),
            exclude_event: Some(hearing.id),
        })
        .unwrap();
    assert_eq!(afternoon.len(), 1);
    assert_eq!(afternoon[0].id, trial.id);

    repo.delete_event(hearing.id, company.id).unwrap();
    assert!(repo.get_event_by_id(hearing.id, company.id).unwrap().is_none());
}

#[test]
fn test_audit_log_retention() {
    let test_db = common::TestDb::new("test_audit_log_retention.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");

    repo.create_audit_log(&NewAuditLog {
        company_id: company.id,
        entity_type: EntityType::Client,
        entity_id: 42,
        entity_name: Some("Maria Souza".to_string()),
        user_id: Some(admin.id),
        user_name: Some("Ana Silva".to_string()),
        action: AuditAction::Update,
        description: None,
        old_values: Some(json!({ "phone": "21999990000" })),
        new_values: Some(json!({ "phone": "21988880000" })),
        changed_fields: vec!["phone".to_string()],
        ip_address: Some("203.0.113.7".to_string()),
        user_agent: None,
    })
    .unwrap();

    let (total, entries) = repo
        .list_audit_logs(AuditLogQuery::new(company.id).entity(EntityType::Client, 42))
        .unwrap();
    assert_eq!(total, 1);
    assert_eq!(entries[0].changed_fields, vec!["phone".to_string()]);
    assert_eq!(entries[0].old_values, Some(json!({ "phone": "21999990000" })));

    let now = Utc::now().naive_utc();
    assert_eq!(
        repo.delete_audit_logs_before(now - Duration::days(1), 1000)
            .unwrap(),
        0
    );
    assert_eq!(
        repo.delete_audit_logs_before(now + Duration::days(1), 1000)
            .unwrap(),
        1
    );
}
