use chrono::{NaiveDate, NaiveDateTime};
use serde::Serialize;

use crate::domain::types::{CaseId, CasePartId, ClientId, CompanyId, text_enum};

text_enum!(
    /// Role of a party in the lawsuit.
    PartType {
        Demandante => "DEMANDANTE",
        Demandado => "DEMANDADO",
        Advogado => "ADVOGADO",
        AdvogadoAdverso => "ADVOGADO_ADVERSO",
        Autor => "AUTOR",
        Reu => "REU",
        RepresentanteLegal => "REPRESENTANTE_LEGAL",
    }
);

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct CasePart {
    pub id: CasePartId,
    pub company_id: CompanyId,
    pub case_id: CaseId,
    pub part_type: PartType,
    pub client_id: Option<ClientId>,
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

/// Attributes of a party; the owning case is supplied by the caller.
#[derive(Clone, Debug, PartialEq)]
pub struct NewCasePart {
    pub part_type: PartType,
    pub client_id: Option<ClientId>,
    pub name: String,
    pub cpf_cnpj: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub civil_status: Option<String>,
    pub profession: Option<String>,
    pub rg: Option<String>,
    pub birth_date: Option<NaiveDate>,
}

pub type UpdateCasePart = NewCasePart;
