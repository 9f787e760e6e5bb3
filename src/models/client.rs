use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::client::{Client as DomainClient, ClientFields};
use crate::domain::tag::Tag as DomainTag;
use crate::domain::types::{ClientId, CompanyId, PersonName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
/// Diesel model for [`crate::domain::client::Client`].
pub struct Client {
    pub id: i32,
    pub company_id: i32,
    pub person_type: String,
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
    pub birth_date: Option<NaiveDate>,
    pub representative_name: Option<String>,
    pub representative_cpf: Option<String>,
    pub notes: Option<String>,
    pub telegram_chat_id: Option<String>,
    pub active: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::clients)]
/// Insertable form of [`Client`].
pub struct NewClient<'a> {
    pub company_id: i32,
    #[diesel(embed)]
    pub fields: ClientChangeset<'a>,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::clients)]
#[diesel(treat_none_as_null = true)]
/// Editable columns of a [`Client`] record.
pub struct ClientChangeset<'a> {
    pub person_type: &'a str,
    pub name: &'a str,
    pub cpf: Option<&'a str>,
    pub rg: Option<&'a str>,
    pub email: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub city: Option<&'a str>,
    pub state: Option<&'a str>,
    pub zip_code: Option<&'a str>,
    pub profession: Option<&'a str>,
    pub marital_status: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
    pub representative_name: Option<&'a str>,
    pub representative_cpf: Option<&'a str>,
    pub notes: Option<&'a str>,
    pub telegram_chat_id: Option<&'a str>,
}

impl Client {
    /// Converts the row, attaching already loaded tags.
    pub fn into_domain(self, tags: Vec<DomainTag>) -> Result<DomainClient, TypeConstraintError> {
        Ok(DomainClient {
            id: ClientId::new(self.id)?,
            company_id: CompanyId::new(self.company_id)?,
            person_type: self.person_type.parse()?,
            name: PersonName::new(self.name)?,
            cpf: self.cpf,
            rg: self.rg,
            email: self.email,
            phone: self.phone,
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            profession: self.profession,
            marital_status: self.marital_status,
            birth_date: self.birth_date,
            representative_name: self.representative_name,
            representative_cpf: self.representative_cpf,
            notes: self.notes,
            telegram_chat_id: self.telegram_chat_id,
            active: self.active,
            created_at: self.created_at,
            updated_at: self.updated_at,
            tags,
        })
    }
}

impl TryFrom<Client> for DomainClient {
    type Error = TypeConstraintError;

    fn try_from(row: Client) -> Result<Self, Self::Error> {
        row.into_domain(Vec::new())
    }
}

impl<'a> From<&'a ClientFields> for ClientChangeset<'a> {
    fn from(fields: &'a ClientFields) -> Self {
        Self {
            person_type: fields.person_type.as_str(),
            name: fields.name.as_str(),
            cpf: fields.cpf.as_deref(),
            rg: fields.rg.as_deref(),
            email: fields.email.as_deref(),
            phone: fields.phone.as_deref(),
            address: fields.address.as_deref(),
            city: fields.city.as_deref(),
            state: fields.state.as_deref(),
            zip_code: fields.zip_code.as_deref(),
            profession: fields.profession.as_deref(),
            marital_status: fields.marital_status.as_deref(),
            birth_date: fields.birth_date,
            representative_name: fields.representative_name.as_deref(),
            representative_cpf: fields.representative_cpf.as_deref(),
            notes: fields.notes.as_deref(),
            telegram_chat_id: fields.telegram_chat_id.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::client::PersonType;

    fn sample_fields() -> ClientFields {
        ClientFields {
            person_type: PersonType::Juridica,
            name: PersonName::new("Acme Ltda").unwrap(),
            cpf: Some("12345678000199".into()),
            rg: None,
            email: Some("acme@example.com".into()),
            phone: None,
            address: None,
            city: Some("Niterói".into()),
            state: Some("RJ".into()),
            zip_code: None,
            profession: None,
            marital_status: None,
            birth_date: None,
            representative_name: Some("João".into()),
            representative_cpf: None,
            notes: None,
            telegram_chat_id: None,
        }
    }

    #[test]
    fn changeset_borrows_fields() {
        let fields = sample_fields();
        let changeset = ClientChangeset::from(&fields);
        assert_eq!(changeset.person_type, "JURIDICA");
        assert_eq!(changeset.name, "Acme Ltda");
        assert_eq!(changeset.cpf, Some("12345678000199"));
        assert_eq!(changeset.rg, None);
    }
}
