use std::cell::RefCell;

use advwell::domain::audit_log::AuditContext;
use advwell::domain::campaign::{
    CANCELLED_MESSAGE, CampaignStatus, RecipientDelivery, RecipientStatus, StatusUpdate,
};
use advwell::domain::financial::InstallmentStatus;
use advwell::domain::lgpd::{
    ANONYMIZED_NAME, ConsentType, NewConsentLog, NewDataRequest, RequestStatus, RequestType,
};
use advwell::domain::schedule::EventType;
use advwell::domain::types::{CampaignId, RecipientId};
use advwell::forms::accounts_payable::{MarkPaidForm, PayableForm};
use advwell::forms::campaigns::{CampaignForm, RecipientForm};
use advwell::forms::cases::CaseForm;
use advwell::forms::financial::TransactionForm;
use advwell::forms::lgpd::ProcessRequestForm;
use advwell::integrations::IntegrationError;
use advwell::integrations::datajud::{CourtLookup, CourtProcess};
use advwell::models::zmq::NotificationJob;
use advwell::repository::{
    CampaignReader, CaseReader, ConsentReader, ConsentWriter, DataRequestWriter, EventReader,
    PayableReader, RecipientListQuery, TransactionReader, UserReader,
};
use advwell::services::accounts_payable::{create_payable, mark_as_paid};
use advwell::services::campaigns::{
    apply_status_updates, cancel_campaign, create_campaign, delivery_is_due,
    record_campaign_delivery, send_campaign,
};
use advwell::services::cases::{acknowledge_case, create_case};
use advwell::services::financial::create_transaction;
use advwell::services::lgpd::process_request;
use advwell::services::notifications::NotificationQueue;
use advwell::services::{ServiceError, ServiceResult};
use chrono::{NaiveDate, NaiveDateTime};

mod common;

fn on(day: u32, hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2025, 3, day)
        .and_then(|d| d.and_hms_opt(hour, 0, 0))
        .unwrap()
}

/// Keeps every job instead of publishing it.
#[derive(Default)]
struct RecordingQueue {
    jobs: RefCell<Vec<NotificationJob>>,
}

impl NotificationQueue for RecordingQueue {
    fn enqueue(&self, job: &NotificationJob) -> ServiceResult<()> {
        self.jobs.borrow_mut().push(job.clone());
        Ok(())
    }
}

impl RecordingQueue {
    fn campaign_recipients(&self) -> Vec<(i32, i32)> {
        self.jobs
            .borrow()
            .iter()
            .filter_map(|job| match job {
                NotificationJob::CampaignMessage {
                    campaign_id,
                    recipient_id,
                    ..
                } => Some((*campaign_id, *recipient_id)),
                _ => None,
            })
            .collect()
    }
}

/// Court that never knows the process.
struct OfflineCourt;

impl CourtLookup for OfflineCourt {
    fn lookup(
        &self,
        _tribunal: &str,
        _process_number: &str,
    ) -> Result<Option<CourtProcess>, IntegrationError> {
        Ok(None)
    }
}

fn sent(message_id: &str, at: NaiveDateTime) -> RecipientDelivery {
    RecipientDelivery {
        status: RecipientStatus::Sent,
        message_id: Some(message_id.to_string()),
        error_message: None,
        sent_at: Some(at),
    }
}

#[test]
fn test_cancelled_campaign_keeps_late_deliveries_out() {
    let test_db = common::TestDb::new("test_cancelled_campaign_keeps_late_deliveries_out.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let user = common::principal(&admin);
    let queue = RecordingQueue::default();

    let campaign = create_campaign(
        &repo,
        &user,
        CampaignForm {
            name: "Aviso de recesso".to_string(),
            template_name: "aviso_recesso".to_string(),
            language: None,
            recipients: Some(vec![
                RecipientForm {
                    client_id: None,
                    phone: "(21) 99999-0001".to_string(),
                    name: Some("Maria Souza".to_string()),
                },
                RecipientForm {
                    client_id: None,
                    phone: "(21) 99999-0002".to_string(),
                    name: Some("João Pereira".to_string()),
                },
            ]),
        },
    )
    .unwrap();
    assert_eq!(campaign.status, CampaignStatus::Draft);

    let response = send_campaign(&repo, &queue, &user, campaign.id.get(), on(3, 9)).unwrap();
    assert_eq!(response.total_recipients, 2);
    let jobs = queue.campaign_recipients();
    assert_eq!(jobs.len(), 2);
    let (campaign_id, first) = jobs[0];
    let (_, second) = jobs[1];

    assert!(delivery_is_due(&repo, campaign_id, first).unwrap());
    record_campaign_delivery(&repo, campaign_id, first, &sent("wamid.1", on(3, 9)), on(3, 9))
        .unwrap();

    let cancelled = cancel_campaign(&repo, &user, campaign_id, on(3, 10)).unwrap();
    assert_eq!(cancelled.status, CampaignStatus::Cancelled);

    assert!(!delivery_is_due(&repo, campaign_id, second).unwrap());
    record_campaign_delivery(&repo, campaign_id, second, &sent("wamid.2", on(3, 11)), on(3, 11))
        .unwrap();

    let late = repo
        .get_recipient(RecipientId::new(second).unwrap())
        .unwrap()
        .unwrap();
    assert_eq!(late.status, RecipientStatus::Failed);
    assert_eq!(late.error_message.as_deref(), Some(CANCELLED_MESSAGE));
    assert!(late.message_id.is_none());

    let stored = repo
        .get_campaign(CampaignId::new(campaign_id).unwrap(), company.id)
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, CampaignStatus::Cancelled);
    assert_eq!(stored.sent_count, 1);
    assert_eq!(stored.failed_count, 1);
}

#[test]
fn test_status_reports_advance_recipients_and_counters() {
    let test_db = common::TestDb::new("test_status_reports_advance_recipients_and_counters.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let user = common::principal(&admin);
    let queue = RecordingQueue::default();

    let campaign = create_campaign(
        &repo,
        &user,
        CampaignForm {
            name: "Boas festas".to_string(),
            template_name: "boas_festas".to_string(),
            language: Some("pt_BR".to_string()),
            recipients: Some(vec![RecipientForm {
                client_id: None,
                phone: "21999990001".to_string(),
                name: None,
            }]),
        },
    )
    .unwrap();
    send_campaign(&repo, &queue, &user, campaign.id.get(), on(5, 9)).unwrap();
    let (campaign_id, recipient_id) = queue.campaign_recipients()[0];
    record_campaign_delivery(
        &repo,
        campaign_id,
        recipient_id,
        &sent("wamid.festas", on(5, 9)),
        on(5, 9),
    )
    .unwrap();

    let completed = repo.get_campaign(campaign.id, company.id).unwrap().unwrap();
    assert_eq!(completed.status, CampaignStatus::Completed);
    assert_eq!(completed.sent_count, 1);

    let report = |status| StatusUpdate {
        message_id: "wamid.festas".to_string(),
        status,
        error_message: None,
    };
    let changed = apply_status_updates(
        &repo,
        &[
            report(RecipientStatus::Delivered),
            report(RecipientStatus::Read),
            report(RecipientStatus::Delivered),
            StatusUpdate {
                message_id: "wamid.unknown".to_string(),
                status: RecipientStatus::Read,
                error_message: None,
            },
        ],
        on(5, 10),
    )
    .unwrap();
    assert_eq!(changed, 2);

    let (_, recipients) = repo
        .list_recipients(RecipientListQuery::new(campaign.id))
        .unwrap();
    assert_eq!(recipients[0].status, RecipientStatus::Read);

    let stored = repo.get_campaign(campaign.id, company.id).unwrap().unwrap();
    assert_eq!(stored.sent_count, 1);
    assert_eq!(stored.delivered_count, 0);
    assert_eq!(stored.read_count, 1);
    assert_eq!(stored.status, CampaignStatus::Completed);
}

#[test]
fn test_installment_transaction_is_stored_with_its_plan() {
    let test_db = common::TestDb::new("test_installment_transaction_is_stored_with_its_plan.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let client = common::seed_client(&repo, company.id, "Maria Souza");
    let user = common::principal(&admin);

    let created = create_transaction(
        &repo,
        &user,
        TransactionForm {
            client_id: client.id.get(),
            case_id: None,
            transaction_type: "INCOME".to_string(),
            description: "Honorários contratuais".to_string(),
            amount_cents: 100_000,
            date: "2025-03-10T00:00".to_string(),
            is_installment_payment: true,
            installment_count: Some(3),
            installment_interval: Some(30),
        },
    )
    .unwrap();
    assert!(created.is_installment_payment);
    assert_eq!(created.installment_count, Some(3));

    let details = repo.get_transaction(created.id, company.id).unwrap().unwrap();
    let plan = &details.installments;
    assert_eq!(plan.len(), 3);
    assert_eq!(
        plan.iter().map(|i| i.amount_cents).collect::<Vec<_>>(),
        vec![33_333, 33_333, 33_334]
    );
    assert_eq!(plan[0].due_date, on(10, 0));
    assert_eq!(plan[2].due_date, on(10, 0) + chrono::Duration::days(60));
    assert!(plan.iter().all(|i| i.status == InstallmentStatus::Pending));

    let oversized = create_transaction(
        &repo,
        &user,
        TransactionForm {
            client_id: client.id.get(),
            case_id: None,
            transaction_type: "INCOME".to_string(),
            description: "Plano impossível".to_string(),
            amount_cents: 100_000,
            date: "2025-03-10T00:00".to_string(),
            is_installment_payment: true,
            installment_count: Some(2),
            installment_interval: Some(i64::MAX),
        },
    );
    assert!(matches!(oversized, Err(ServiceError::Form(_))));
}

#[test]
fn test_paying_recurring_bill_schedules_next_occurrence() {
    let test_db = common::TestDb::new("test_paying_recurring_bill_schedules_next_occurrence.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let user = common::principal(&admin);

    let rent = create_payable(
        &repo,
        &user,
        PayableForm {
            supplier: "Imobiliária Centro".to_string(),
            description: "Aluguel do escritório".to_string(),
            amount_cents: 450_000,
            due_date: "2025-03-05T00:00".to_string(),
            paid_date: None,
            status: None,
            category: Some("Aluguel".to_string()),
            notes: None,
            is_recurring: true,
            recurrence_period: Some("MONTHLY".to_string()),
        },
    )
    .unwrap();

    let paid = mark_as_paid(
        &repo,
        &user,
        rent.id.get(),
        MarkPaidForm { paid_date: None },
        on(4, 15),
    )
    .unwrap();
    assert_eq!(paid.payable.paid_date, Some(on(4, 15)));
    let next = paid.next.expect("next occurrence");
    assert_eq!(next.parent_id, Some(rent.id));
    assert_eq!(next.due_date.date(), NaiveDate::from_ymd_opt(2025, 4, 5).unwrap());
    assert_eq!(next.amount_cents, 450_000);

    let stored = repo.get_payable(next.id, company.id).unwrap().unwrap();
    assert!(stored.paid_date.is_none());

    let twice = mark_as_paid(
        &repo,
        &user,
        rent.id.get(),
        MarkPaidForm { paid_date: None },
        on(4, 16),
    );
    assert!(matches!(twice, Err(ServiceError::Form(_))));
}

#[test]
fn test_completed_deletion_anonymizes_requester() {
    let test_db = common::TestDb::new("test_completed_deletion_anonymizes_requester.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let member = common::seed_member(&repo, &company, "Bruno Lima", "bruno@silva.adv.br");

    repo.create_consent(&NewConsentLog {
        user_id: Some(member.id),
        email: "bruno@silva.adv.br".to_string(),
        consent_type: ConsentType::PrivacyPolicy,
        version: "1.0".to_string(),
        ip: Some("203.0.113.7".to_string()),
        user_agent: Some("Mozilla/5.0".to_string()),
    })
    .unwrap();
    let request = repo
        .create_data_request(&NewDataRequest {
            user_id: member.id,
            company_id: Some(company.id),
            request_type: RequestType::Deletion,
            description: Some("Encerrar minha conta".to_string()),
        })
        .unwrap();

    let done = process_request(
        &repo,
        &common::principal(&admin),
        request.id.get(),
        ProcessRequestForm {
            status: "COMPLETED".to_string(),
            notes: None,
            rejection_reason: None,
        },
        on(6, 14),
    )
    .unwrap();
    assert_eq!(done.status, RequestStatus::Completed);
    assert_eq!(done.processed_by, Some(admin.id));
    assert_eq!(done.completed_at, Some(on(6, 14)));

    let anonymized = repo.get_user_by_id(member.id).unwrap().unwrap();
    assert_eq!(anonymized.name.as_str(), ANONYMIZED_NAME);
    assert!(anonymized.email.as_str().ends_with("@removido.lgpd"));
    assert!(!anonymized.active);

    let consents = repo.list_user_consents(member.id).unwrap();
    assert_eq!(consents.len(), 1);
    assert_eq!(consents[0].email, anonymized.email.as_str());
    assert!(consents[0].ip.is_none());
    assert!(consents[0].user_agent.is_none());

    let untouched = repo.get_user_by_id(admin.id).unwrap().unwrap();
    assert_eq!(untouched.name.as_str(), "Ana Silva");
}

#[test]
fn test_case_deadline_becomes_prazo_event() {
    let test_db = common::TestDb::new("test_case_deadline_becomes_prazo_event.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let client = common::seed_client(&repo, company.id, "Maria Souza");
    let user = common::principal(&admin);

    let case = create_case(
        &repo,
        &OfflineCourt,
        &user,
        CaseForm {
            client_id: client.id.get(),
            process_number: "00012345620248190001".to_string(),
            court: Some("TJRJ".to_string()),
            subject: Some("Cobrança".to_string()),
            value_cents: None,
            status: None,
            notes: None,
            informar_cliente: None,
            deadline: Some("2025-04-01".to_string()),
            deadline_responsible_id: Some(admin.id.get()),
            parts: Vec::new(),
        },
        on(1, 9),
        &AuditContext::default(),
    )
    .unwrap();
    let deadline = case.deadline.expect("deadline stored");

    let event = repo
        .find_case_deadline_event(company.id, case.id)
        .unwrap()
        .expect("deadline event");
    assert_eq!(event.event_type, EventType::Prazo);
    assert_eq!(event.date, deadline);
    assert_eq!(event.client_id, Some(client.id));
    assert_eq!(event.assignee_ids(), vec![admin.id]);
    assert!(event.title.as_str().starts_with("Prazo: "));

    acknowledge_case(&repo, &user, case.id.get(), on(2, 8)).unwrap();
    let stored = repo.get_case_by_id(case.id, company.id).unwrap().unwrap();
    assert_eq!(stored.last_acknowledged_at, Some(on(2, 8)));
}
