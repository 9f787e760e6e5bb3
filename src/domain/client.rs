use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::case::Case;
use crate::domain::tag::Tag;
use crate::domain::types::{ClientId, CompanyId, PersonName, TagId, text_enum};

text_enum!(
    /// Natural person (CPF) or legal entity (CNPJ).
    PersonType {
        Fisica => "FISICA",
        Juridica => "JURIDICA",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Client {
    pub id: ClientId,
    pub company_id: CompanyId,
    pub person_type: PersonType,
    pub name: PersonName,
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
    pub birth_date: Option<NaiveDate>,
    pub representative_name: Option<String>,
    pub representative_cpf: Option<String>,
    pub notes: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub tags: Vec<Tag>,
}

/// Client detail view with the cases filed for them.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ClientDetails {
    #[serde(flatten)]
    pub client: Client,
    pub cases: Vec<Case>,
}

/// Editable attributes shared by create and update.
#[derive(Clone, Debug, PartialEq)]
pub struct ClientFields {
    pub person_type: PersonType,
    pub name: PersonName,
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
    pub birth_date: Option<NaiveDate>,
    pub representative_name: Option<String>,
    pub representative_cpf: Option<String>,
    pub notes: Option<String>,
    pub telegram_chat_id: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewClient {
    pub company_id: CompanyId,
    pub fields: ClientFields,
    pub tag_ids: Vec<TagId>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateClient {
    pub fields: ClientFields,
    /// `None` leaves the tag set untouched.
    pub tag_ids: Option<Vec<TagId>>,
}

/// Header of the client spreadsheet, shared by export and import.
pub const CLIENT_CSV_HEADER: [&str; 18] = [
    "Tipo",
    "Nome",
    "CPF/CNPJ",
    "RG",
    "Email",
    "Telefone",
    "Endereço",
    "Cidade",
    "Estado",
    "CEP",
    "Profissão",
    "Estado Civil",
    "Data de Nascimento",
    "Tags",
    "Representante Legal",
    "CPF Representante",
    "Observações",
    "Data de Cadastro",
];

impl PersonType {
    /// Spreadsheet label.
    pub fn label(&self) -> &'static str {
        match self {
            PersonType::Fisica => "Pessoa Física",
            PersonType::Juridica => "Pessoa Jurídica",
        }
    }

    /// Lenient parse of spreadsheet values; anything unrecognized is a natural person.
    pub fn from_label(value: &str) -> Self {
        let upper = value.trim().to_uppercase();
        if upper == "PJ" || upper.contains("JURÍDICA") || upper.contains("JURIDICA") {
            PersonType::Juridica
        } else {
            PersonType::Fisica
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn person_type_from_spreadsheet_label() {
        assert_eq!(PersonType::from_label("Pessoa Jurídica"), PersonType::Juridica);
        assert_eq!(PersonType::from_label("JURIDICA"), PersonType::Juridica);
        assert_eq!(PersonType::from_label("Pessoa Física"), PersonType::Fisica);
        assert_eq!(PersonType::from_label(""), PersonType::Fisica);
    }
}
