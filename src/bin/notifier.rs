//! Background worker consuming notification jobs published by the API.
//!
//! Sends WhatsApp templates and Telegram messages, renders emails and forwards
//! them to the emailer, and runs the daily audit-log retention sweep.

use std::collections::BTreeMap;
use std::env;
use std::time::Duration;

use chrono::{NaiveDateTime, Utc};
use config::Config;
use dotenvy::dotenv;
use tera::Tera;

use advwell::db::establish_connection_pool;
use advwell::domain::campaign::{RecipientDelivery, RecipientStatus};
use advwell::integrations::IntegrationError;
use advwell::integrations::telegram::{ChatSender, TelegramClient};
use advwell::integrations::whatsapp::{TemplateSender, WhatsAppClient};
use advwell::models::config::ServerConfig;
use advwell::models::zmq::{NotificationJob, ZmqEmailMessage};
use advwell::queue::ZmqSender;
use advwell::repository::{CampaignReader, CampaignWriter, DieselRepository};
use advwell::services::ServiceResult;
use advwell::services::audit_log::cleanup_audit_logs;
use advwell::services::campaigns::{delivery_is_due, record_campaign_delivery};
use advwell::services::notifications::render_email;

const RETENTION_SWEEP_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Outcome of one template send, as stored on the recipient row.
fn delivery_from(
    result: Result<String, IntegrationError>,
    now: NaiveDateTime,
) -> RecipientDelivery {
    match result {
        Ok(message_id) => RecipientDelivery {
            status: RecipientStatus::Sent,
            message_id: Some(message_id),
            error_message: None,
            sent_at: Some(now),
        },
        Err(err) => RecipientDelivery {
            status: RecipientStatus::Failed,
            message_id: None,
            error_message: Some(err.to_string()),
            sent_at: None,
        },
    }
}

#[allow(clippy::too_many_arguments)]
fn deliver_campaign_message<R, W>(
    repo: &R,
    whatsapp: &W,
    campaign_id: i32,
    recipient_id: i32,
    phone: &str,
    template_name: &str,
    language: &str,
    variables: &[String],
    now: NaiveDateTime,
) -> ServiceResult<()>
where
    R: CampaignReader + CampaignWriter + ?Sized,
    W: TemplateSender + ?Sized,
{
    if !delivery_is_due(repo, campaign_id, recipient_id)? {
        log::info!("Campaign {campaign_id} recipient {recipient_id} no longer pending, skipped");
        return Ok(());
    }
    let result = whatsapp.send_template(phone, template_name, language, variables);
    if let Err(err) = &result {
        log::error!("Campaign {campaign_id} recipient {recipient_id} failed: {err}");
    }
    let delivery = delivery_from(result, now);
    record_campaign_delivery(repo, campaign_id, recipient_id, &delivery, now)
}

fn email_message(
    tera: &Tera,
    to: String,
    subject: String,
    template: &str,
    context: &BTreeMap<String, String>,
) -> Result<ZmqEmailMessage, tera::Error> {
    Ok(ZmqEmailMessage {
        recipient: to,
        subject,
        body: render_email(tera, template, context)?,
    })
}

struct Channels {
    whatsapp: WhatsAppClient,
    telegram: TelegramClient,
    tera: Tera,
    emailer: ZmqSender,
}

fn process_job(job: NotificationJob, repo: &DieselRepository, channels: &Channels) {
    match job {
        NotificationJob::Email {
            to,
            subject,
            template,
            context,
        } => match email_message(&channels.tera, to, subject, &template, &context) {
            Ok(message) => {
                if let Err(e) = channels.emailer.send_json(&message) {
                    log::error!("Error forwarding email to {}: {e}", message.recipient);
                }
            }
            Err(e) => log::error!("Error rendering email template {template}: {e}"),
        },
        NotificationJob::Telegram { chat_id, text } => {
            if let Err(e) = channels.telegram.send_message(&chat_id, &text) {
                log::error!("Error sending Telegram message to {chat_id}: {e}");
            }
        }
        NotificationJob::CampaignMessage {
            campaign_id,
            recipient_id,
            phone,
            template_name,
            language,
            variables,
        } => {
            let now = Utc::now().naive_utc();
            if let Err(e) = deliver_campaign_message(
                repo,
                &channels.whatsapp,
                campaign_id,
                recipient_id,
                &phone,
                &template_name,
                &language,
                &variables,
                now,
            ) {
                log::error!("Error recording campaign delivery: {e}");
            }
        }
        NotificationJob::WhatsAppTemplate {
            phone,
            template_name,
            language,
            variables,
        } => match channels
            .whatsapp
            .send_template(&phone, &template_name, &language, &variables)
        {
            Ok(message_id) => log::info!("Test template {template_name} sent as {message_id}"),
            Err(e) => log::error!("Error sending test template {template_name}: {e}"),
        },
    }
}

fn main() {
    dotenv().ok(); // Load .env file
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    // Select config profile (defaults to `local`).
    let app_env = env::var("APP_ENV").unwrap_or_else(|_| "local".into());

    let settings = Config::builder()
        .add_source(config::File::with_name("config/default"))
        .add_source(config::File::with_name(&format!("config/{}", app_env)).required(false))
        .add_source(config::Environment::with_prefix("APP"))
        .build();

    let settings = match settings {
        Ok(settings) => settings,
        Err(err) => {
            log::error!("Error loading settings: {}", err);
            std::process::exit(1);
        }
    };

    let server_config = match settings.try_deserialize::<ServerConfig>() {
        Ok(server_config) => server_config,
        Err(err) => {
            log::error!("Error loading server config: {}", err);
            std::process::exit(1);
        }
    };

    let pool = match establish_connection_pool(&server_config.database_url) {
        Ok(pool) => pool,
        Err(e) => {
            log::error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };
    let repo = DieselRepository::new(pool);

    let tera = match Tera::new(&server_config.templates_dir) {
        Ok(tera) => tera,
        Err(e) => {
            log::error!("Template parsing error(s): {e}");
            std::process::exit(1);
        }
    };

    let (whatsapp, telegram) = match (
        WhatsAppClient::new(&server_config),
        TelegramClient::new(&server_config),
    ) {
        (Ok(whatsapp), Ok(telegram)) => (whatsapp, telegram),
        (Err(e), _) | (_, Err(e)) => {
            log::error!("Failed to build HTTP clients: {e}");
            std::process::exit(1);
        }
    };

    let emailer = match ZmqSender::connect(&server_config.zmq_emailer_pub) {
        Ok(emailer) => emailer,
        Err(e) => {
            log::error!("Failed to connect to the emailer: {e}");
            std::process::exit(1);
        }
    };

    let context = zmq::Context::new();
    let subscriber = match context.socket(zmq::SUB).and_then(|socket| {
        socket.connect(&server_config.zmq_notifications_sub)?;
        socket.set_subscribe(b"")?;
        Ok(socket)
    }) {
        Ok(socket) => socket,
        Err(e) => {
            log::error!("Failed to subscribe to notifications: {e}");
            std::process::exit(1);
        }
    };

    let retention_repo = repo.clone();
    let retention_days = server_config.audit_retention_days;
    std::thread::spawn(move || {
        loop {
            let now = Utc::now().naive_utc();
            if let Err(e) = cleanup_audit_logs(&retention_repo, now, retention_days) {
                log::error!("Audit retention sweep failed: {e}");
            }
            std::thread::sleep(RETENTION_SWEEP_INTERVAL);
        }
    });

    let channels = Channels {
        whatsapp,
        telegram,
        tera,
        emailer,
    };

    log::info!("Starting notification worker");

    loop {
        let msg = match subscriber.recv_bytes(0) {
            Ok(msg) => msg,
            Err(e) => {
                log::error!("Error receiving message: {e}");
                continue;
            }
        };
        match serde_json::from_slice::<NotificationJob>(&msg) {
            Ok(job) => process_job(job, &repo, &channels),
            Err(e) => log::error!("Error parsing notification job: {e}"),
        }
    }
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use advwell::domain::campaign::{Campaign, CampaignStatus, Recipient, StatusCounts};
    use advwell::domain::types::{CampaignId, CampaignName, CompanyId, RecipientId};
    use advwell::integrations::whatsapp::MockTemplateSender;
    use advwell::repository::mock::MockRepository;

    fn now() -> NaiveDateTime {
        chrono::NaiveDate::from_ymd_opt(2025, 3, 10)
            .and_then(|d| d.and_hms_opt(9, 0, 0))
            .expect("valid timestamp")
    }

    fn recipient(status: RecipientStatus) -> Recipient {
        Recipient {
            id: RecipientId::new(8).expect("valid id"),
            campaign_id: CampaignId::new(3).expect("valid id"),
            client_id: None,
            phone: "5521999990000".to_string(),
            name: Some("Maria".to_string()),
            status,
            message_id: None,
            error_message: None,
            sent_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn campaign(status: CampaignStatus) -> Campaign {
        Campaign {
            id: CampaignId::new(3).expect("valid id"),
            company_id: CompanyId::new(1).expect("valid id"),
            name: CampaignName::new("Boas-vindas").expect("valid name"),
            template_name: "boas_vindas".to_string(),
            language: "pt_BR".to_string(),
            status,
            total_recipients: 1,
            sent_count: 0,
            delivered_count: 0,
            read_count: 0,
            failed_count: 0,
            created_by: None,
            started_at: Some(now()),
            completed_at: None,
            created_at: now(),
            updated_at: now(),
        }
    }

    fn repo_expecting(status: RecipientStatus, pending: i64) -> MockRepository {
        let mut repo = MockRepository::new();
        repo.expect_get_recipient()
            .returning(|_| Ok(Some(recipient(RecipientStatus::Pending))));
        repo.expect_get_campaign_by_id()
            .returning(|_| Ok(Some(campaign(CampaignStatus::Sending))));
        repo.expect_record_delivery()
            .withf(move |id, delivery| id.get() == 8 && delivery.status == status)
            .times(1)
            .returning(|_, _| Ok(true));
        repo.expect_recipient_status_counts().returning(move |_| {
            Ok(StatusCounts {
                total: 1,
                pending,
                ..StatusCounts::default()
            })
        });
        repo.expect_update_campaign_counters().returning(|_, _| Ok(()));
        repo.expect_set_campaign_status()
            .returning(|_, status, _| Ok(campaign(status)));
        repo
    }

    #[test]
    fn cancelled_campaign_is_not_sent() {
        let mut repo = MockRepository::new();
        repo.expect_get_recipient().returning(|_| {
            let mut cancelled = recipient(RecipientStatus::Failed);
            cancelled.error_message = Some("Campanha cancelada".to_string());
            Ok(Some(cancelled))
        });
        repo.expect_record_delivery().times(0);
        let mut whatsapp = MockTemplateSender::new();
        whatsapp.expect_send_template().times(0);

        deliver_campaign_message(
            &repo,
            &whatsapp,
            3,
            8,
            "5521999990000",
            "boas_vindas",
            "pt_BR",
            &[],
            now(),
        )
        .expect("skipped");
    }

    #[test]
    fn pending_recipient_of_cancelled_campaign_is_not_sent() {
        let mut repo = MockRepository::new();
        repo.expect_get_recipient()
            .returning(|_| Ok(Some(recipient(RecipientStatus::Pending))));
        repo.expect_get_campaign_by_id()
            .returning(|_| Ok(Some(campaign(CampaignStatus::Cancelled))));
        let mut whatsapp = MockTemplateSender::new();
        whatsapp.expect_send_template().times(0);

        deliver_campaign_message(
            &repo,
            &whatsapp,
            3,
            8,
            "5521999990000",
            "boas_vindas",
            "pt_BR",
            &[],
            now(),
        )
        .expect("skipped");
    }

    #[test]
    fn successful_send_marks_recipient_sent() {
        let repo = repo_expecting(RecipientStatus::Sent, 0);
        let mut whatsapp = MockTemplateSender::new();
        whatsapp
            .expect_send_template()
            .withf(|phone, template, language, vars| {
                phone == "5521999990000"
                    && template == "boas_vindas"
                    && language == "pt_BR"
                    && vars == ["Maria".to_string()]
            })
            .times(1)
            .returning(|_, _, _, _| Ok("wamid.1".to_string()));

        deliver_campaign_message(
            &repo,
            &whatsapp,
            3,
            8,
            "5521999990000",
            "boas_vindas",
            "pt_BR",
            &["Maria".to_string()],
            now(),
        )
        .expect("delivery recorded");
    }

    #[test]
    fn provider_error_marks_recipient_failed() {
        let repo = repo_expecting(RecipientStatus::Failed, 0);
        let mut whatsapp = MockTemplateSender::new();
        whatsapp.expect_send_template().returning(|_, _, _, _| {
            Err(IntegrationError::Api {
                status: 400,
                body: "template not approved".to_string(),
            })
        });

        deliver_campaign_message(
            &repo,
            &whatsapp,
            3,
            8,
            "5521999990000",
            "boas_vindas",
            "pt_BR",
            &[],
            now(),
        )
        .expect("failure recorded");
    }

    #[test]
    fn renders_email_body() {
        let mut tera = Tera::default();
        tera.add_raw_template("verify_email.html", "Olá {{ name }}: {{ link }}")
            .expect("template parses");
        let mut context = BTreeMap::new();
        context.insert("name".to_string(), "Ana".to_string());
        context.insert("link".to_string(), "https://app/verify".to_string());

        let message = email_message(
            &tera,
            "ana@example.com".to_string(),
            "Confirme seu email".to_string(),
            "verify_email.html",
            &context,
        )
        .expect("renders");
        assert_eq!(message.body, "Olá Ana: https://app/verify");
        assert_eq!(message.recipient, "ana@example.com");
    }
}
