use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::case_part::{CasePart as DomainCasePart, NewCasePart as DomainNewCasePart};
use crate::domain::types::{CaseId, CasePartId, ClientId, CompanyId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::case_parts)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CasePart {
    pub id: i32,
    pub company_id: i32,
    pub case_id: i32,
    pub part_type: String,
    pub client_id: Option<i32>,
    pub name: String,
    pub cpf_cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub civil_status: Option<String>,
    pub profession: Option<String>,
    pub rg: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::case_parts)]
pub struct NewCasePart<'a> {
    pub company_id: i32,
    pub case_id: i32,
    #[diesel(embed)]
    pub fields: CasePartChangeset<'a>,
}

#[derive(AsChangeset, Insertable)]
#[diesel(table_name = crate::schema::case_parts)]
#[diesel(treat_none_as_null = true)]
pub struct CasePartChangeset<'a> {
    pub part_type: &'a str,
    pub client_id: Option<i32>,
    pub name: &'a str,
    pub cpf_cnpj: Option<&'a str>,
    pub phone: Option<&'a str>,
    pub email: Option<&'a str>,
    pub address: Option<&'a str>,
    pub civil_status: Option<&'a str>,
    pub profession: Option<&'a str>,
    pub rg: Option<&'a str>,
    pub birth_date: Option<NaiveDate>,
}

impl TryFrom<CasePart> for DomainCasePart {
    type Error = TypeConstraintError;

    fn try_from(row: CasePart) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CasePartId::new(row.id)?,
            company_id: CompanyId::new(row.company_id)?,
            case_id: CaseId::new(row.case_id)?,
            part_type: row.part_type.parse()?,
            client_id: row.client_id.map(ClientId::new).transpose()?,
            name: row.name,
            cpf_cnpj: row.cpf_cnpj,
            phone: row.phone,
            email: row.email,
            address: row.address,
            civil_status: row.civil_status,
            profession: row.profession,
            rg: row.rg,
            birth_date: row.birth_date,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewCasePart> for CasePartChangeset<'a> {
    fn from(part: &'a DomainNewCasePart) -> Self {
        Self {
            part_type: part.part_type.as_str(),
            client_id: part.client_id.map(ClientId::get),
            name: part.name.as_str(),
            cpf_cnpj: part.cpf_cnpj.as_deref(),
            phone: part.phone.as_deref(),
            email: part.email.as_deref(),
            address: part.address.as_deref(),
            civil_status: part.civil_status.as_deref(),
            profession: part.profession.as_deref(),
            rg: part.rg.as_deref(),
            birth_date: part.birth_date,
        }
    }
}

impl<'a> NewCasePart<'a> {
    pub fn new(company_id: CompanyId, case_id: CaseId, part: &'a DomainNewCasePart) -> Self {
        Self {
            company_id: company_id.get(),
            case_id: case_id.get(),
            fields: part.into(),
        }
    }
}
