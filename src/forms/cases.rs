use serde::Deserialize;
use validator::Validate;

use crate::domain::case::{CaseStatus, pin_deadline};
use crate::domain::case_part::{NewCasePart, PartType};
use crate::domain::process_number;
use crate::domain::types::{ClientId, UserId};
use crate::forms::{FormError, clean, parse_optional_date};

#[derive(Debug, Deserialize, Validate)]
pub struct CaseForm {
    pub client_id: i32,
    #[validate(length(min = 1))]
    pub process_number: String,
    pub court: Option<String>,
    pub subject: Option<String>,
    #[validate(range(min = 0))]
    pub value_cents: Option<i64>,
    pub status: Option<String>,
    pub notes: Option<String>,
    pub informar_cliente: Option<String>,
    pub deadline: Option<String>,
    pub deadline_responsible_id: Option<i32>,
    #[serde(default)]
    #[validate(nested)]
    pub parts: Vec<CasePartForm>,
}

/// Case values after cleaning, shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct CaseInput {
    pub client_id: ClientId,
    pub process_number: String,
    pub court: Option<String>,
    pub subject: Option<String>,
    pub value_cents: Option<i64>,
    pub status: CaseStatus,
    pub notes: Option<String>,
    pub informar_cliente: Option<String>,
    pub deadline: Option<chrono::NaiveDateTime>,
    pub deadline_responsible_id: Option<UserId>,
}

impl CaseForm {
    pub fn input(&self) -> Result<CaseInput, FormError> {
        let digits = process_number::normalize(&self.process_number);
        if digits.is_empty() {
            return Err(FormError::Invalid("Número do processo inválido".to_string()));
        }
        let status = match self.status.as_deref().map(str::trim) {
            None | Some("") => CaseStatus::Active,
            Some(value) => value.parse()?,
        };
        Ok(CaseInput {
            client_id: ClientId::new(self.client_id)?,
            process_number: process_number::format(&digits),
            court: clean(&self.court),
            subject: clean(&self.subject),
            value_cents: self.value_cents,
            status,
            notes: clean(&self.notes),
            informar_cliente: clean(&self.informar_cliente),
            deadline: parse_optional_date(self.deadline.as_deref())?.map(pin_deadline),
            deadline_responsible_id: self
                .deadline_responsible_id
                .map(UserId::new)
                .transpose()?,
        })
    }

    pub fn parts(&self) -> Result<Vec<NewCasePart>, FormError> {
        self.parts.iter().map(CasePartForm::to_new_part).collect()
    }
}

#[derive(Debug, Deserialize)]
pub struct DeadlineForm {
    pub deadline: Option<String>,
    pub deadline_responsible_id: Option<i32>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CasePartForm {
    pub part_type: String,
    pub client_id: Option<i32>,
    #[validate(length(max = 200))]
    pub name: Option<String>,
    pub cpf_cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub civil_status: Option<String>,
    pub profession: Option<String>,
    pub rg: Option<String>,
    pub birth_date: Option<String>,
}

impl CasePartForm {
    /// Name is required unless the part links an existing client; the caller
    /// fills it from the client in that case.
    pub fn to_new_part(&self) -> Result<NewCasePart, FormError> {
        let part_type: PartType = self.part_type.trim().parse()?;
        let client_id = self.client_id.map(ClientId::new).transpose()?;
        let name = clean(&self.name).unwrap_or_default();
        if name.is_empty() && client_id.is_none() {
            return Err(FormError::Invalid("Nome da parte é obrigatório".to_string()));
        }
        Ok(NewCasePart {
            part_type,
            client_id,
            name,
            cpf_cnpj: clean(&self.cpf_cnpj),
            phone: clean(&self.phone),
            email: clean(&self.email),
            address: clean(&self.address),
            civil_status: clean(&self.civil_status),
            profession: clean(&self.profession),
            rg: clean(&self.rg),
            birth_date: parse_optional_date(self.birth_date.as_deref())?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case_form() -> CaseForm {
        CaseForm {
            client_id: 3,
            process_number: "00012345620248190001".into(),
            court: None,
            subject: Some("Cobrança".into()),
            value_cents: Some(150_000),
            status: None,
            notes: None,
            informar_cliente: None,
            deadline: Some("2025-04-01".into()),
            deadline_responsible_id: Some(7),
            parts: Vec::new(),
        }
    }

    #[test]
    fn input_formats_number_and_pins_deadline() {
        let input = case_form().input().unwrap();
        assert_eq!(input.process_number, "0001234-56.2024.8.19.0001");
        assert_eq!(input.status, CaseStatus::Active);
        assert_eq!(
            input.deadline.map(|d| d.to_string()).as_deref(),
            Some("2025-04-01 12:00:00")
        );
    }

    #[test]
    fn part_without_name_or_client_is_rejected() {
        let part = CasePartForm {
            part_type: "DEMANDADO".into(),
            client_id: None,
            name: Some("  ".into()),
            cpf_cnpj: None,
            phone: None,
            email: None,
            address: None,
            civil_status: None,
            profession: None,
            rg: None,
            birth_date: None,
        };
        assert!(part.to_new_part().is_err());

        let linked = CasePartForm {
            part_type: "DEMANDANTE".into(),
            client_id: Some(4),
            ..part
        };
        assert!(linked.to_new_part().is_ok());
    }

    #[test]
    fn unknown_part_type_is_rejected() {
        let part = CasePartForm {
            part_type: "TESTEMUNHA".into(),
            client_id: None,
            name: Some("João".into()),
            cpf_cnpj: None,
            phone: None,
            email: None,
            address: None,
            civil_status: None,
            profession: None,
            rg: None,
            birth_date: None,
        };
        assert!(part.to_new_part().is_err());
    }
}
