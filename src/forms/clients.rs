use std::collections::BTreeMap;

use actix_multipart::form::{MultipartForm, tempfile::TempFile};
use serde::Deserialize;
use validator::Validate;

use crate::domain::client::{ClientFields, PersonType};
use crate::domain::types::{PersonName, TagId};
use crate::forms::{FormError, clean, parse_optional_date};

#[derive(Debug, Deserialize, Validate)]
pub struct ClientForm {
    pub person_type: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    pub cpf: Option<String>,
    pub rg: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub profession: Option<String>,
    pub marital_status: Option<String>,
    pub birth_date: Option<String>,
    pub representative_name: Option<String>,
    pub representative_cpf: Option<String>,
    pub notes: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub tag_ids: Option<Vec<i32>>,
}

impl ClientForm {
    pub fn fields(&self) -> Result<ClientFields, FormError> {
        let person_type = match self.person_type.as_deref().map(str::trim) {
            None | Some("") => PersonType::Fisica,
            Some(value) => value.parse()?,
        };
        let email = clean(&self.email).map(|email| email.to_lowercase());
        if let Some(email) = &email {
            if !validator::ValidateEmail::validate_email(email) {
                return Err(FormError::Invalid("E-mail inválido".to_string()));
            }
        }

        Ok(ClientFields {
            person_type,
            name: PersonName::new(self.name.as_str())?,
            cpf: clean(&self.cpf),
            rg: clean(&self.rg),
            email,
            phone: clean(&self.phone),
            address: clean(&self.address),
            city: clean(&self.city),
            state: clean(&self.state),
            zip_code: clean(&self.zip_code),
            profession: clean(&self.profession),
            marital_status: clean(&self.marital_status),
            birth_date: parse_optional_date(self.birth_date.as_deref())?,
            representative_name: clean(&self.representative_name),
            representative_cpf: clean(&self.representative_cpf),
            notes: clean(&self.notes),
            telegram_chat_id: clean(&self.telegram_chat_id),
        })
    }

    pub fn tag_ids(&self) -> Result<Option<Vec<TagId>>, FormError> {
        self.tag_ids
            .as_ref()
            .map(|ids| {
                ids.iter()
                    .map(|id| TagId::new(*id).map_err(FormError::from))
                    .collect::<Result<Vec<_>, _>>()
            })
            .transpose()
    }
}

impl ClientForm {
    /// Builds a form from a spreadsheet row keyed by the export header labels.
    /// The `Tags` column is resolved separately.
    pub fn from_csv_row(row: &BTreeMap<String, String>) -> Self {
        let cell = |key: &str| row.get(key).cloned();
        Self {
            person_type: Some(
                PersonType::from_label(row.get("Tipo").map(String::as_str).unwrap_or_default())
                    .as_str()
                    .to_string(),
            ),
            name: cell("Nome").unwrap_or_default(),
            cpf: cell("CPF/CNPJ"),
            rg: cell("RG"),
            email: cell("Email"),
            phone: cell("Telefone"),
            address: cell("Endereço"),
            city: cell("Cidade"),
            state: cell("Estado"),
            zip_code: cell("CEP"),
            profession: cell("Profissão"),
            marital_status: cell("Estado Civil"),
            birth_date: cell("Data de Nascimento"),
            representative_name: cell("Representante Legal"),
            representative_cpf: cell("CPF Representante"),
            notes: cell("Observações"),
            telegram_chat_id: None,
            tag_ids: None,
        }
    }
}

/// Multipart upload carrying a CSV spreadsheet in the `file` field.
#[derive(MultipartForm)]
pub struct UploadCsvForm {
    #[multipart(limit = "10MB")]
    pub file: TempFile,
}

impl UploadCsvForm {
    pub fn read_content(&mut self) -> Result<String, FormError> {
        std::io::read_to_string(&mut self.file.file).map_err(|err| {
            log::warn!("Failed to read uploaded CSV: {err}");
            FormError::Invalid("Arquivo inválido. Envie um CSV em UTF-8".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form() -> ClientForm {
        ClientForm {
            person_type: None,
            name: "<b>Maria</b> Silva".into(),
            cpf: Some("".into()),
            rg: None,
            email: Some(" Maria@Email.com ".into()),
            phone: Some("(21) 99999-0000".into()),
            address: None,
            city: None,
            state: None,
            zip_code: None,
            profession: None,
            marital_status: None,
            birth_date: Some("15/04/1980".into()),
            representative_name: None,
            representative_cpf: None,
            notes: Some("<script>x</script>nota".into()),
            telegram_chat_id: None,
            tag_ids: Some(vec![1, 2]),
        }
    }

    #[test]
    fn fields_are_cleaned() {
        let fields = form().fields().unwrap();
        assert_eq!(fields.person_type, PersonType::Fisica);
        assert_eq!(fields.name.as_str(), "Maria Silva");
        assert_eq!(fields.cpf, None);
        assert_eq!(fields.email.as_deref(), Some("maria@email.com"));
        assert_eq!(fields.notes.as_deref(), Some("nota"));
        assert_eq!(fields.birth_date.map(|d| d.to_string()).as_deref(), Some("1980-04-15"));
    }

    #[test]
    fn spreadsheet_row_maps_to_form() {
        let mut row = BTreeMap::new();
        row.insert("Tipo".to_string(), "Pessoa Jurídica".to_string());
        row.insert("Nome".to_string(), "Lima Comércio".to_string());
        row.insert("Data de Nascimento".to_string(), "2001-02-03".to_string());
        row.insert("CPF/CNPJ".to_string(), String::new());

        let fields = ClientForm::from_csv_row(&row).fields().unwrap();
        assert_eq!(fields.person_type, PersonType::Juridica);
        assert_eq!(fields.name.as_str(), "Lima Comércio");
        assert_eq!(fields.cpf, None);
        assert!(fields.birth_date.is_some());
    }

    #[test]
    fn rejects_bad_tag_ids() {
        let mut form = form();
        form.tag_ids = Some(vec![0]);
        assert!(form.tag_ids().is_err());
    }
}
