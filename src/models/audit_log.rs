//! Audit log rows. JSON payloads are stored as text columns.
use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde_json::Value;

use crate::domain::audit_log::{AuditLog as DomainAuditLog, NewAuditLog as DomainNewAuditLog};
use crate::domain::types::{AuditLogId, CompanyId, TypeConstraintError, UserId};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::audit_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct AuditLog {
    pub id: i32,
    pub company_id: i32,
    pub entity_type: String,
    pub entity_id: i32,
    pub entity_name: Option<String>,
    pub user_id: Option<i32>,
    pub user_name: Option<String>,
    pub action: String,
    pub description: Option<String>,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub changed_fields: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::audit_logs)]
pub struct NewAuditLog<'a> {
    pub company_id: i32,
    pub entity_type: &'a str,
    pub entity_id: i32,
    pub entity_name: Option<&'a str>,
    pub user_id: Option<i32>,
    pub user_name: Option<&'a str>,
    pub action: &'a str,
    pub description: Option<&'a str>,
    pub old_values: Option<String>,
    pub new_values: Option<String>,
    pub changed_fields: Option<String>,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

fn parse_json(raw: Option<String>) -> Result<Option<Value>, TypeConstraintError> {
    raw.map(|text| {
        serde_json::from_str(&text)
            .map_err(|e| TypeConstraintError::InvalidValue(format!("audit payload: {e}")))
    })
    .transpose()
}

impl TryFrom<AuditLog> for DomainAuditLog {
    type Error = TypeConstraintError;

    fn try_from(row: AuditLog) -> Result<Self, Self::Error> {
        let changed_fields = match row.changed_fields {
            Some(text) => serde_json::from_str(&text)
                .map_err(|e| TypeConstraintError::InvalidValue(format!("changed fields: {e}")))?,
            None => Vec::new(),
        };
        Ok(Self {
            id: AuditLogId::new(row.id)?,
            company_id: CompanyId::new(row.company_id)?,
            entity_type: row.entity_type.parse()?,
            entity_id: row.entity_id,
            entity_name: row.entity_name,
            user_id: row.user_id.map(UserId::new).transpose()?,
            user_name: row.user_name,
            action: row.action.parse()?,
            description: row.description,
            old_values: parse_json(row.old_values)?,
            new_values: parse_json(row.new_values)?,
            changed_fields,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            created_at: row.created_at,
        })
    }
}

impl<'a> From<&'a DomainNewAuditLog> for NewAuditLog<'a> {
    fn from(entry: &'a DomainNewAuditLog) -> Self {
        let changed_fields = if entry.changed_fields.is_empty() {
            None
        } else {
            Some(Value::from(entry.changed_fields.clone()).to_string())
        };
        Self {
            company_id: entry.company_id.get(),
            entity_type: entry.entity_type.as_str(),
            entity_id: entry.entity_id,
            entity_name: entry.entity_name.as_deref(),
            user_id: entry.user_id.map(UserId::get),
            user_name: entry.user_name.as_deref(),
            action: entry.action.as_str(),
            description: entry.description.as_deref(),
            old_values: entry.old_values.as_ref().map(Value::to_string),
            new_values: entry.new_values.as_ref().map(Value::to_string),
            changed_fields,
            ip_address: entry.ip_address.as_deref(),
            user_agent: entry.user_agent.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::audit_log::{AuditAction, EntityType};
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn json_columns_survive_storage() {
        let entry = DomainNewAuditLog {
            company_id: CompanyId::new(1).unwrap(),
            entity_type: EntityType::Client,
            entity_id: 9,
            entity_name: Some("Maria".into()),
            user_id: Some(UserId::new(2).unwrap()),
            user_name: Some("Ana".into()),
            action: AuditAction::Update,
            description: Some("Cliente \"Maria\" atualizado".into()),
            old_values: Some(json!({"name": "Mari"})),
            new_values: Some(json!({"name": "Maria"})),
            changed_fields: vec!["name".into()],
            ip_address: Some("10.0.0.1".into()),
            user_agent: None,
        };
        let insert = NewAuditLog::from(&entry);
        assert_eq!(insert.changed_fields.as_deref(), Some("[\"name\"]"));

        let row = AuditLog {
            id: 1,
            company_id: insert.company_id,
            entity_type: insert.entity_type.to_string(),
            entity_id: insert.entity_id,
            entity_name: insert.entity_name.map(str::to_string),
            user_id: insert.user_id,
            user_name: insert.user_name.map(str::to_string),
            action: insert.action.to_string(),
            description: insert.description.map(str::to_string),
            old_values: insert.old_values.clone(),
            new_values: insert.new_values.clone(),
            changed_fields: insert.changed_fields.clone(),
            ip_address: insert.ip_address.map(str::to_string),
            user_agent: None,
            created_at: NaiveDate::from_ymd_opt(2025, 1, 1)
                .unwrap()
                .and_hms_opt(0, 0, 0)
                .unwrap(),
        };
        let log = DomainAuditLog::try_from(row).unwrap();
        assert_eq!(log.changed_fields, vec!["name".to_string()]);
        assert_eq!(log.new_values, Some(json!({"name": "Maria"})));
    }
}
