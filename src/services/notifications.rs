//! Outbound notification jobs and their message formatting.
//!
//! Handlers never talk to Telegram, WhatsApp or SMTP directly: they build a
//! [`NotificationJob`] and hand it to a [`NotificationQueue`], which in
//! production is the ZeroMQ publisher consumed by the `notifier` binary.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;

use crate::domain::schedule::ScheduleEvent;
use crate::models::zmq::NotificationJob;
use crate::services::ServiceResult;

pub const VERIFY_EMAIL_TEMPLATE: &str = "verify_email.html";
pub const RESET_PASSWORD_TEMPLATE: &str = "reset_password.html";
pub const CASE_UPDATE_TEMPLATE: &str = "case_update.html";

/// Sink for notification jobs.
#[cfg_attr(feature = "test-mocks", mockall::automock)]
pub trait NotificationQueue {
    fn enqueue(&self, job: &NotificationJob) -> ServiceResult<()>;
}

/// Publishes a job, logging instead of failing the caller.
pub fn publish<Q>(queue: &Q, job: NotificationJob)
where
    Q: NotificationQueue + ?Sized,
{
    if let Err(err) = queue.enqueue(&job) {
        log::error!("Failed to enqueue notification: {err}");
    }
}

/// Escapes the characters Telegram's HTML parse mode treats as markup.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn format_when(date: NaiveDateTime) -> String {
    date.format("%d/%m/%Y %H:%M").to_string()
}

/// Message sent to a user newly assigned to an event.
pub fn event_assignment_message(event: &ScheduleEvent, company_name: &str) -> String {
    format!(
        "<b>📅 Novo {} Atribuído</b>\n\n<b>Título:</b> {}\n<b>Data:</b> {}\n<b>Empresa:</b> {}\n\nAcesse o sistema para mais detalhes.",
        event.event_type.label(),
        escape_html(event.title.as_str()),
        format_when(event.date),
        escape_html(company_name),
    )
}

/// Message sent to a client when the firm posts a case update.
pub fn case_update_message(
    client_name: &str,
    process_number: &str,
    update: &str,
    company_name: &str,
) -> String {
    format!(
        "<b>⚖️ Atualização do Processo</b>\n\nOlá, {}!\n\n<b>Processo:</b> {}\n\n{}\n\n<i>{}</i>",
        escape_html(client_name),
        escape_html(process_number),
        escape_html(update),
        escape_html(company_name),
    )
}

pub fn telegram_job(chat_id: &str, text: String) -> NotificationJob {
    NotificationJob::Telegram {
        chat_id: chat_id.to_string(),
        text,
    }
}

pub fn email_job(
    to: &str,
    subject: impl Into<String>,
    template: &str,
    context: BTreeMap<String, String>,
) -> NotificationJob {
    NotificationJob::Email {
        to: to.to_string(),
        subject: subject.into(),
        template: template.to_string(),
        context,
    }
}

/// Renders an email job body with the loaded templates.
pub fn render_email(
    tera: &tera::Tera,
    template: &str,
    context: &BTreeMap<String, String>,
) -> Result<String, tera::Error> {
    let mut ctx = tera::Context::new();
    for (key, value) in context {
        ctx.insert(key.as_str(), value);
    }
    tera.render(template, &ctx)
}
