use serde::Deserialize;
use validator::Validate;

use crate::domain::schedule::{EventFields, EventType, Priority};
use crate::domain::types::{CaseId, ClientId, EventTitle, UserId};
use crate::forms::{FormError, clean, parse_datetime, parse_optional_datetime};

#[derive(Debug, Deserialize, Validate)]
pub struct EventForm {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "type", alias = "event_type")]
    pub event_type: Option<String>,
    pub priority: Option<String>,
    #[validate(length(min = 1))]
    pub date: String,
    pub end_date: Option<String>,
    #[serde(default)]
    pub completed: bool,
    pub client_id: Option<i32>,
    pub case_id: Option<i32>,
    #[serde(default)]
    pub assigned_user_ids: Vec<i32>,
}

impl TryFrom<&EventForm> for EventFields {
    type Error = FormError;

    fn try_from(form: &EventForm) -> Result<Self, Self::Error> {
        let event_type = match form.event_type.as_deref().map(str::trim) {
            None | Some("") => EventType::default(),
            Some(value) => value.parse()?,
        };
        let priority = match form.priority.as_deref().map(str::trim) {
            None | Some("") => Priority::default(),
            Some(value) => value
                .parse()
                .map_err(|_| FormError::Invalid(format!("Prioridade inválida: {value}")))?,
        };
        let date = parse_datetime(&form.date)?;
        let end_date = parse_optional_datetime(form.end_date.as_deref())?;
        if end_date.is_some_and(|end| end < date) {
            return Err(FormError::Invalid(
                "Data final deve ser posterior à data inicial".to_string(),
            ));
        }

        let mut assigned_user_ids = form
            .assigned_user_ids
            .iter()
            .map(|id| UserId::new(*id))
            .collect::<Result<Vec<_>, _>>()?;
        assigned_user_ids.sort();
        assigned_user_ids.dedup();

        let mut fields = EventFields {
            title: EventTitle::new(form.title.as_str())?,
            description: clean(&form.description),
            event_type,
            priority,
            date,
            end_date,
            completed: form.completed,
            client_id: form.client_id.map(ClientId::new).transpose()?,
            case_id: form.case_id.map(CaseId::new).transpose()?,
            google_meet_link: None,
            assigned_user_ids,
        };
        fields.refresh_meet_link();
        Ok(fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> EventForm {
        EventForm {
            title: "Reunião com cliente".into(),
            description: None,
            event_type: None,
            priority: None,
            date: "2025-03-10T14:00".into(),
            end_date: None,
            completed: false,
            client_id: None,
            case_id: None,
            assigned_user_ids: vec![3, 2, 3],
        }
    }

    #[test]
    fn defaults_and_dedup() {
        let fields = EventFields::try_from(&form()).unwrap();
        assert_eq!(fields.event_type, EventType::Compromisso);
        assert_eq!(fields.priority, Priority::Media);
        assert_eq!(
            fields.assigned_user_ids.iter().map(|id| id.get()).collect::<Vec<_>>(),
            vec![2, 3]
        );
        assert_eq!(fields.google_meet_link, None);
    }

    #[test]
    fn unknown_priority_is_rejected() {
        let mut form = form();
        form.priority = Some("CRITICA".into());
        assert!(matches!(
            EventFields::try_from(&form),
            Err(FormError::Invalid(_))
        ));
    }

    #[test]
    fn meet_events_get_a_link() {
        let mut form = form();
        form.event_type = Some("GOOGLE_MEET".into());
        let fields = EventFields::try_from(&form).unwrap();
        let link = fields.google_meet_link.unwrap();
        assert!(link.contains("dates=20250310T140000/20250310T150000"));
    }
}
