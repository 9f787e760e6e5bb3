use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use crate::domain::case_part::{CasePart, NewCasePart};
use crate::domain::client::Client;
use crate::domain::types::{CaseId, CaseMovementId, ClientId, CompanyId, UserId, text_enum};

text_enum!(
    CaseStatus {
        Active => "ACTIVE",
        Archived => "ARCHIVED",
        Finished => "FINISHED",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Case {
    pub id: CaseId,
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub process_number: String,
    pub court: Option<String>,
    pub subject: Option<String>,
    pub value_cents: Option<i64>,
    pub status: CaseStatus,
    pub notes: Option<String>,
    pub informar_cliente: Option<String>,
    pub ultimo_andamento: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub deadline_responsible_id: Option<UserId>,
    pub deadline_completed: bool,
    pub deadline_completed_at: Option<NaiveDateTime>,
    pub last_synced_at: Option<NaiveDateTime>,
    pub last_acknowledged_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Case {
    /// True when court data was synced after the last acknowledgement.
    pub fn has_pending_update(&self) -> bool {
        match (self.last_synced_at, self.last_acknowledged_at) {
            (Some(_), None) => true,
            (Some(synced), Some(acknowledged)) => synced > acknowledged,
            _ => false,
        }
    }
}

/// Row of the case list with the client's display name.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CaseListItem {
    #[serde(flatten)]
    pub case: Case,
    pub client_name: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CaseDetails {
    #[serde(flatten)]
    pub case: Case,
    pub client: Client,
    pub parts: Vec<CasePart>,
    pub movements: Vec<CaseMovement>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CaseMovement {
    pub id: CaseMovementId,
    pub case_id: CaseId,
    pub code: i32,
    pub name: String,
    pub movement_date: NaiveDateTime,
    pub description: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Movement as reported by the court, not yet stored.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCaseMovement {
    pub code: i32,
    pub name: String,
    pub movement_date: NaiveDateTime,
    pub description: Option<String>,
}

/// Court data attached to a case after a successful lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct CourtSync {
    pub court: Option<String>,
    pub movements: Vec<NewCaseMovement>,
    pub ultimo_andamento: Option<String>,
    pub synced_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewCase {
    pub company_id: CompanyId,
    pub client_id: ClientId,
    pub process_number: String,
    pub court: Option<String>,
    pub subject: Option<String>,
    pub value_cents: Option<i64>,
    pub status: CaseStatus,
    pub notes: Option<String>,
    pub informar_cliente: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub deadline_responsible_id: Option<UserId>,
    pub sync: Option<CourtSync>,
    pub parts: Vec<NewCasePart>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateCase {
    pub client_id: ClientId,
    pub process_number: String,
    pub court: Option<String>,
    pub subject: Option<String>,
    pub value_cents: Option<i64>,
    pub status: CaseStatus,
    pub notes: Option<String>,
    pub informar_cliente: Option<String>,
    pub deadline: Option<NaiveDateTime>,
    pub deadline_responsible_id: Option<UserId>,
    pub deadline_completed: bool,
    pub deadline_completed_at: Option<NaiveDateTime>,
}

impl UpdateCase {
    /// Carries the current values of `case` forward; callers override fields.
    pub fn from_case(case: &Case) -> Self {
        Self {
            client_id: case.client_id,
            process_number: case.process_number.clone(),
            court: case.court.clone(),
            subject: case.subject.clone(),
            value_cents: case.value_cents,
            status: case.status,
            notes: case.notes.clone(),
            informar_cliente: case.informar_cliente.clone(),
            deadline: case.deadline,
            deadline_responsible_id: case.deadline_responsible_id,
            deadline_completed: case.deadline_completed,
            deadline_completed_at: case.deadline_completed_at,
        }
    }

    /// Sets a new deadline. Any change resets the completion state.
    pub fn set_deadline(&mut self, deadline: Option<NaiveDateTime>) {
        if self.deadline != deadline {
            self.deadline_completed = false;
            self.deadline_completed_at = None;
        }
        self.deadline = deadline;
    }
}

/// Deadlines are stored at noon so that timezone shifts never move the day.
pub fn pin_deadline(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN))
}

/// Title of the schedule event mirroring a case deadline.
pub fn deadline_event_title(process_number: &str) -> String {
    format!("Prazo: {process_number}")
}

/// Summary of the most recent movement, e.g. `Juntada de Petição - 05/03/2025`.
pub fn latest_movement_summary(movements: &[NewCaseMovement]) -> Option<String> {
    movements
        .iter()
        .max_by_key(|movement| movement.movement_date)
        .map(|movement| {
            format!(
                "{} - {}",
                movement.name,
                movement.movement_date.format("%d/%m/%Y")
            )
        })
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn movement(name: &str, d: u32) -> NewCaseMovement {
        NewCaseMovement {
            code: 1,
            name: name.into(),
            movement_date: day(d).and_hms_opt(8, 30, 0).unwrap(),
            description: None,
        }
    }

    fn sample_case() -> Case {
        let now = day(1).and_hms_opt(0, 0, 0).unwrap();
        Case {
            id: CaseId::new(1).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            client_id: ClientId::new(1).unwrap(),
            process_number: "00012345620248190001".into(),
            court: None,
            subject: None,
            value_cents: None,
            status: CaseStatus::Active,
            notes: None,
            informar_cliente: None,
            ultimo_andamento: None,
            deadline: Some(pin_deadline(day(20))),
            deadline_responsible_id: None,
            deadline_completed: true,
            deadline_completed_at: Some(now),
            last_synced_at: None,
            last_acknowledged_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn deadline_is_pinned_to_noon() {
        assert_eq!(pin_deadline(day(5)), day(5).and_hms_opt(12, 0, 0).unwrap());
    }

    #[test]
    fn latest_movement_wins() {
        let movements = vec![movement("Distribuição", 1), movement("Sentença", 9)];
        assert_eq!(
            latest_movement_summary(&movements).as_deref(),
            Some("Sentença - 09/03/2025")
        );
        assert_eq!(latest_movement_summary(&[]), None);
    }

    #[test]
    fn changing_deadline_resets_completion() {
        let case = sample_case();
        let mut same = UpdateCase::from_case(&case);
        same.set_deadline(case.deadline);
        assert!(same.deadline_completed);

        let mut moved = UpdateCase::from_case(&case);
        moved.set_deadline(Some(pin_deadline(day(25))));
        assert!(!moved.deadline_completed);
        assert_eq!(moved.deadline_completed_at, None);
    }

    #[test]
    fn pending_update_compares_sync_and_ack() {
        let mut case = sample_case();
        assert!(!case.has_pending_update());

        let synced = day(10).and_hms_opt(0, 0, 0).unwrap();
        case.last_synced_at = Some(synced);
        assert!(case.has_pending_update());

        case.last_acknowledged_at = Some(synced + Duration::hours(1));
        assert!(!case.has_pending_update());

        case.last_acknowledged_at = Some(synced - Duration::hours(1));
        assert!(case.has_pending_update());
    }
}
