use chrono::{Duration, NaiveDateTime};
use serde::Serialize;
use url::form_urlencoded;

use crate::domain::types::{CaseId, ClientId, CompanyId, EventId, EventTitle, UserId, text_enum};
use crate::domain::user::UserSummary;

const MEET_INSTRUCTIONS: &str =
    "Reunião por Google Meet - Após criar, clique em \"Adicionar Google Meet\" para gerar o link.";

text_enum!(
    EventType {
        Compromisso => "COMPROMISSO",
        Tarefa => "TAREFA",
        Prazo => "PRAZO",
        Audiencia => "AUDIENCIA",
        GoogleMeet => "GOOGLE_MEET",
    }
);

text_enum!(
    Priority {
        Baixa => "BAIXA",
        Media => "MEDIA",
        Alta => "ALTA",
        Urgente => "URGENTE",
    }
);

impl Default for EventType {
    fn default() -> Self {
        EventType::Compromisso
    }
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Media
    }
}

impl EventType {
    pub fn label(&self) -> &'static str {
        match self {
            EventType::Compromisso => "Compromisso",
            EventType::Tarefa => "Tarefa",
            EventType::Prazo => "Prazo",
            EventType::Audiencia => "Audiência",
            EventType::GoogleMeet => "Google Meet",
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ScheduleEvent {
    pub id: EventId,
    pub company_id: CompanyId,
    pub title: EventTitle,
    pub description: Option<String>,
    pub event_type: EventType,
    pub priority: Priority,
    pub date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub client_id: Option<ClientId>,
    pub case_id: Option<CaseId>,
    pub google_meet_link: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub assigned_users: Vec<UserSummary>,
}

impl ScheduleEvent {
    pub fn assignee_ids(&self) -> Vec<UserId> {
        self.assigned_users.iter().map(|user| user.id).collect()
    }
}

/// Attributes written on create and update.
#[derive(Clone, Debug, PartialEq)]
pub struct EventFields {
    pub title: EventTitle,
    pub description: Option<String>,
    pub event_type: EventType,
    pub priority: Priority,
    pub date: NaiveDateTime,
    pub end_date: Option<NaiveDateTime>,
    pub completed: bool,
    pub client_id: Option<ClientId>,
    pub case_id: Option<CaseId>,
    pub google_meet_link: Option<String>,
    pub assigned_user_ids: Vec<UserId>,
}

impl EventFields {
    /// Window used for conflict detection.
    pub fn window(&self) -> (NaiveDateTime, NaiveDateTime) {
        event_window(self.date, self.end_date)
    }

    /// Regenerates or clears the Meet link to match the event type.
    pub fn refresh_meet_link(&mut self) {
        self.google_meet_link = match self.event_type {
            EventType::GoogleMeet => {
                let (start, end) = self.window();
                Some(google_meet_link(
                    self.title.as_str(),
                    start,
                    end,
                    self.description.as_deref().unwrap_or_default(),
                ))
            }
            _ => None,
        };
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewScheduleEvent {
    pub company_id: CompanyId,
    pub created_by: Option<UserId>,
    pub fields: EventFields,
}

/// Search criteria for events overlapping a window for given users.
#[derive(Clone, Debug, PartialEq)]
pub struct ConflictQuery {
    pub company_id: CompanyId,
    pub user_ids: Vec<UserId>,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub exclude_event: Option<EventId>,
}

/// `[start, end)` where a missing end means one hour after the start.
pub fn event_window(
    start: NaiveDateTime,
    end: Option<NaiveDateTime>,
) -> (NaiveDateTime, NaiveDateTime) {
    (start, end.unwrap_or(start + Duration::hours(1)))
}

/// Whether an existing event collides with the candidate window.
pub fn overlaps(
    start: NaiveDateTime,
    end: NaiveDateTime,
    existing_date: NaiveDateTime,
    existing_end: Option<NaiveDateTime>,
) -> bool {
    if existing_date >= start && existing_date < end {
        return true;
    }
    match existing_end {
        Some(existing_end) => {
            (existing_end > start && existing_end <= end)
                || (existing_date <= start && existing_end >= end)
        }
        None => false,
    }
}

/// Message returned when assignees are already booked.
pub fn conflict_message(names: &[String], title: &str, date: NaiveDateTime) -> String {
    format!(
        "{} já possui compromisso marcado: \"{}\" em {}",
        names.join(", "),
        title,
        date.format("%d/%m/%y %H:%M")
    )
}

fn encode(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Google Calendar "create event" link prefilled for a Meet call.
pub fn google_meet_link(
    title: &str,
    start: NaiveDateTime,
    end: NaiveDateTime,
    description: &str,
) -> String {
    let title = if title.is_empty() { "Reunião" } else { title };
    let details = if description.is_empty() {
        MEET_INSTRUCTIONS.to_string()
    } else {
        format!("{description}\n\n{MEET_INSTRUCTIONS}")
    };
    format!(
        "https://calendar.google.com/calendar/u/0/r/eventedit?text={}&dates={}/{}&details={}",
        encode(title),
        start.format("%Y%m%dT%H%M00"),
        end.format("%Y%m%dT%H%M00"),
        encode(&details),
    )
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, 20)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn window_defaults_to_one_hour() {
        assert_eq!(event_window(at(9, 0), None), (at(9, 0), at(10, 0)));
        assert_eq!(
            event_window(at(9, 0), Some(at(9, 30))),
            (at(9, 0), at(9, 30))
        );
    }

    #[test]
    fn overlap_rules() {
        let (start, end) = (at(10, 0), at(11, 0));
        // starts inside
        assert!(overlaps(start, end, at(10, 30), None));
        // starts exactly at the end: free
        assert!(!overlaps(start, end, at(11, 0), None));
        // ends inside
        assert!(overlaps(start, end, at(9, 0), Some(at(10, 15))));
        // ends exactly at the start: free
        assert!(!overlaps(start, end, at(9, 0), Some(at(10, 0))));
        // spans the whole window
        assert!(overlaps(start, end, at(8, 0), Some(at(12, 0))));
        // open-ended event before the window
        assert!(!overlaps(start, end, at(9, 30), None));
    }

    #[test]
    fn conflict_message_lists_names() {
        let msg = conflict_message(
            &["Ana".to_string(), "Bruno".to_string()],
            "Audiência",
            at(14, 5),
        );
        assert_eq!(
            msg,
            "Ana, Bruno já possui compromisso marcado: \"Audiência\" em 20/05/25 14:05"
        );
    }

    #[test]
    fn meet_link_encodes_parts() {
        let link = google_meet_link("Reunião cliente", at(9, 0), at(10, 0), "");
        assert!(link.starts_with(
            "https://calendar.google.com/calendar/u/0/r/eventedit?text=Reuni%C3%A3o+cliente"
        ));
        assert!(link.contains("&dates=20250520T090000/20250520T100000&details="));
        assert!(link.contains("Adicionar+Google+Meet"));
    }

    #[test]
    fn meet_link_follows_type() {
        let mut fields = EventFields {
            title: EventTitle::new("Call").unwrap(),
            description: None,
            event_type: EventType::GoogleMeet,
            priority: Priority::default(),
            date: at(9, 0),
            end_date: None,
            completed: false,
            client_id: None,
            case_id: None,
            google_meet_link: None,
            assigned_user_ids: vec![],
        };
        fields.refresh_meet_link();
        assert!(fields.google_meet_link.is_some());

        fields.event_type = EventType::Tarefa;
        fields.refresh_meet_link();
        assert_eq!(fields.google_meet_link, None);
    }
}
