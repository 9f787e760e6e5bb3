//! Audit trail entries and the pure helpers used to build them.

use chrono::NaiveDateTime;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::domain::types::{AuditLogId, CompanyId, UserId, text_enum};

/// Days an entry is kept before the retention sweep removes it.
pub const DEFAULT_RETENTION_DAYS: i64 = 365;
/// Rows deleted per statement during the retention sweep.
pub const CLEANUP_BATCH_SIZE: i64 = 1000;

const SENSITIVE_KEYS: &[&str] = &[
    "password",
    "password_hash",
    "api_key",
    "token",
    "reset_token",
    "email_verification_token",
];

const IGNORED_KEYS: &[&str] = &["id", "company_id", "created_at", "updated_at", "client_id"];

text_enum!(
    EntityType {
        Client => "CLIENT",
        Case => "CASE",
        ScheduleEvent => "SCHEDULE_EVENT",
        Other => "OTHER",
    }
);

text_enum!(
    AuditAction {
        Create => "CREATE",
        Update => "UPDATE",
        Delete => "DELETE",
    }
);

impl EntityType {
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Client => "Cliente",
            EntityType::Case => "Processo",
            EntityType::ScheduleEvent => "Evento",
            EntityType::Other => "Registro",
        }
    }
}

impl AuditAction {
    pub fn label(&self) -> &'static str {
        match self {
            AuditAction::Create => "Criação",
            AuditAction::Update => "Atualização",
            AuditAction::Delete => "Exclusão",
        }
    }

    fn past_participle(&self) -> &'static str {
        match self {
            AuditAction::Create => "criado",
            AuditAction::Update => "atualizado",
            AuditAction::Delete => "excluído",
        }
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct AuditLog {
    pub id: AuditLogId,
    pub company_id: CompanyId,
    pub entity_type: EntityType,
    pub entity_id: i32,
    pub entity_name: Option<String>,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub action: AuditAction,
    pub description: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub changed_fields: Vec<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewAuditLog {
    pub company_id: CompanyId,
    pub entity_type: EntityType,
    pub entity_id: i32,
    pub entity_name: Option<String>,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub action: AuditAction,
    pub description: Option<String>,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
    pub changed_fields: Vec<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Request metadata attached to every audit entry.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AuditContext {
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Who did what to which record. Input to [`build_entry`].
#[derive(Clone, Debug, PartialEq)]
pub struct AuditEvent {
    pub company_id: CompanyId,
    pub entity_type: EntityType,
    pub entity_id: i32,
    pub entity_name: String,
    /// Prefix used in the description; defaults to the entity label.
    pub subject_label: Option<String>,
    pub user_id: Option<UserId>,
    pub user_name: Option<String>,
    pub action: AuditAction,
    pub old_values: Option<Value>,
    pub new_values: Option<Value>,
}

/// Removes credential-like keys from a JSON object.
pub fn sanitize_values(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .filter(|(key, _)| !SENSITIVE_KEYS.contains(&key.as_str()))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

/// Keys whose values differ between the two snapshots.
pub fn changed_fields(old: &Value, new: &Value) -> Vec<String> {
    let empty = Map::new();
    let old = old.as_object().unwrap_or(&empty);
    let new = new.as_object().unwrap_or(&empty);

    let mut keys: Vec<&String> = new.keys().collect();
    keys.extend(old.keys().filter(|key| !new.contains_key(*key)));

    keys.into_iter()
        .filter(|key| !IGNORED_KEYS.contains(&key.as_str()))
        .filter(|key| old.get(*key) != new.get(*key))
        .cloned()
        .collect()
}

/// Portuguese label for a snapshot key.
pub fn field_label(key: &str) -> &str {
    match key {
        "name" => "Nome",
        "email" => "E-mail",
        "phone" => "Telefone",
        "cpf" => "CPF",
        "rg" => "RG",
        "address" => "Endereço",
        "city" => "Cidade",
        "state" => "Estado",
        "zip_code" => "CEP",
        "birth_date" => "Data de Nascimento",
        "profession" => "Profissão",
        "marital_status" => "Estado Civil",
        "notes" => "Observações",
        "tags" => "Tags",
        "active" => "Ativo",
        "person_type" => "Tipo de Pessoa",
        "representative_name" => "Nome do Representante",
        "representative_cpf" => "CPF do Representante",
        "process_number" => "Número do Processo",
        "court" => "Tribunal",
        "subject" => "Assunto",
        "value_cents" => "Valor da Causa",
        "status" => "Status",
        "deadline" => "Prazo",
        "deadline_responsible_id" => "Responsável pelo Prazo",
        "deadline_completed" => "Prazo Cumprido",
        "ultimo_andamento" => "Último Andamento",
        "informar_cliente" => "Informar Cliente",
        "title" => "Título",
        "description" => "Descrição",
        "event_type" => "Tipo",
        "priority" => "Prioridade",
        "date" => "Data",
        "end_date" => "Data Final",
        "completed" => "Concluído",
        "google_meet_link" => "Link Google Meet",
        "case_id" => "Processo",
        other => other,
    }
}

/// Human readable summary, e.g. `Cliente "Maria" atualizado. Campos: Nome, E-mail`.
pub fn describe(
    subject_label: &str,
    entity_name: &str,
    action: AuditAction,
    changed: &[String],
) -> String {
    let base = format!(
        "{subject_label} \"{entity_name}\" {}",
        action.past_participle()
    );
    if action == AuditAction::Update && !changed.is_empty() {
        let labels: Vec<&str> = changed.iter().map(|key| field_label(key)).collect();
        format!("{base}. Campos: {}", labels.join(", "))
    } else {
        base
    }
}

/// Builds the entry to persist, or `None` for an update that changed nothing.
pub fn build_entry(event: AuditEvent, context: &AuditContext) -> Option<NewAuditLog> {
    let old_values = event.old_values.map(sanitize_values);
    let new_values = event.new_values.map(sanitize_values);

    let changed = match (&old_values, &new_values, event.action) {
        (Some(old), Some(new), AuditAction::Update) => changed_fields(old, new),
        _ => Vec::new(),
    };
    if event.action == AuditAction::Update && changed.is_empty() {
        return None;
    }

    let subject = event
        .subject_label
        .unwrap_or_else(|| event.entity_type.label().to_string());
    let description = describe(&subject, &event.entity_name, event.action, &changed);

    Some(NewAuditLog {
        company_id: event.company_id,
        entity_type: event.entity_type,
        entity_id: event.entity_id,
        entity_name: Some(event.entity_name),
        user_id: event.user_id,
        user_name: event.user_name,
        action: event.action,
        description: Some(description),
        old_values,
        new_values,
        changed_fields: changed,
        ip_address: context.ip_address.clone(),
        user_agent: context.user_agent.clone(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn event(action: AuditAction, old: Option<Value>, new: Option<Value>) -> AuditEvent {
        AuditEvent {
            company_id: CompanyId::new(1).unwrap(),
            entity_type: EntityType::Client,
            entity_id: 5,
            entity_name: "Maria".into(),
            subject_label: None,
            user_id: UserId::new(2).ok(),
            user_name: Some("Admin".into()),
            action,
            old_values: old,
            new_values: new,
        }
    }

    #[test]
    fn sensitive_keys_are_removed() {
        let cleaned = sanitize_values(json!({
            "name": "Ana",
            "password_hash": "x",
            "api_key": "k",
            "reset_token": "t",
        }));
        assert_eq!(cleaned, json!({"name": "Ana"}));
    }

    #[test]
    fn diff_ignores_bookkeeping_keys() {
        let old = json!({"id": 1, "name": "Ana", "email": "a@x.com", "updated_at": "a"});
        let new = json!({
            "id": 1,
            "name": "Ana Maria",
            "email": "a@x.com",
            "updated_at": "b",
            "phone": "1"
        });
        assert_eq!(changed_fields(&old, &new), vec!["name", "phone"]);
    }

    #[test]
    fn update_description_lists_labels() {
        let entry = build_entry(
            event(
                AuditAction::Update,
                Some(json!({"name": "Maria", "email": "a@x.com"})),
                Some(json!({"name": "Maria S.", "email": "b@x.com"})),
            ),
            &AuditContext::default(),
        )
        .unwrap();
        assert_eq!(
            entry.description.as_deref(),
            Some("Cliente \"Maria\" atualizado. Campos: E-mail, Nome")
        );
        assert_eq!(entry.changed_fields, vec!["email", "name"]);
    }

    #[test]
    fn noop_update_writes_nothing() {
        let snapshot = json!({"name": "Maria"});
        assert!(build_entry(
            event(AuditAction::Update, Some(snapshot.clone()), Some(snapshot)),
            &AuditContext::default()
        )
        .is_none());
    }

    #[test]
    fn create_and_delete_descriptions() {
        let created = build_entry(
            event(AuditAction::Create, None, Some(json!({"name": "Maria"}))),
            &AuditContext {
                ip_address: Some("10.0.0.1".into()),
                user_agent: None,
            },
        )
        .unwrap();
        assert_eq!(created.description.as_deref(), Some("Cliente \"Maria\" criado"));
        assert_eq!(created.ip_address.as_deref(), Some("10.0.0.1"));

        let deleted = build_entry(
            event(AuditAction::Delete, Some(json!({"name": "Maria"})), None),
            &AuditContext::default(),
        )
        .unwrap();
        assert_eq!(deleted.description.as_deref(), Some("Cliente \"Maria\" excluído"));
    }
}
