//! Business operations exposed to the HTTP layer and the notifier.
//!
//! Services are plain functions generic over the repository traits so they
//! can run against [`crate::repository::DieselRepository`] in production and
//! against `MockRepository` in tests.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::import::{UTF8_BOM, strip_bom};
use crate::domain::types::{CompanyId, TypeConstraintError, UserId};
use crate::repository::errors::RepositoryError;

pub mod accounts_payable;
pub mod audit_log;
pub mod auth;
pub mod campaigns;
pub mod case_parts;
pub mod cases;
pub mod clients;
pub mod companies;
pub mod dashboard;
pub mod financial;
pub mod holidays;
pub mod lgpd;
pub mod notifications;
pub mod schedule;
pub mod tags;
pub mod token_shares;
pub mod users;

pub const NO_COMPANY_MESSAGE: &str = "Usuário não possui empresa associada";
pub const INACTIVE_COMPANY_MESSAGE: &str = "Empresa inativa";
pub const FORBIDDEN_MESSAGE: &str = "Acesso negado";
pub const UNAUTHORIZED_MESSAGE: &str = "Não autenticado";

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Form(String),

    #[error("{0}")]
    TypeConstraint(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("integration failure: {0}")]
    Integration(String),

    #[error("internal error")]
    Internal,
}

pub type ServiceResult<T> = Result<T, ServiceError>;

impl From<TypeConstraintError> for ServiceError {
    fn from(err: TypeConstraintError) -> Self {
        ServiceError::TypeConstraint(err.to_string())
    }
}

/// Requires ADMIN or SUPER_ADMIN.
pub fn ensure_admin(user: &AuthenticatedUser) -> ServiceResult<()> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
    }
}

pub fn ensure_super_admin(user: &AuthenticatedUser) -> ServiceResult<()> {
    if user.is_super_admin() {
        Ok(())
    } else {
        Err(ServiceError::Forbidden(FORBIDDEN_MESSAGE.to_string()))
    }
}

/// Company the caller acts on behalf of.
pub fn tenant_of(user: &AuthenticatedUser) -> ServiceResult<CompanyId> {
    user.company()
        .ok_or_else(|| ServiceError::Forbidden(NO_COMPANY_MESSAGE.to_string()))
}

pub fn caller_id(user: &AuthenticatedUser) -> ServiceResult<UserId> {
    user.user_id()
        .map_err(|_| ServiceError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()))
}

/// Trims a free-text filter, dropping it when blank.
pub(crate) fn normalize_search(term: Option<String>) -> Option<String> {
    term.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Logs a validator failure and turns it into a form error.
pub(crate) fn form_error(err: impl std::fmt::Display) -> ServiceError {
    log::error!("Failed to validate form: {err}");
    ServiceError::Form("Dados inválidos".to_string())
}

/// Serializes rows as a UTF-8 CSV document prefixed with a byte order mark.
pub(crate) fn csv_document<I>(header: &[&str], rows: I) -> ServiceResult<String>
where
    I: IntoIterator<Item = Vec<String>>,
{
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(header).map_err(csv_failure)?;
    for row in rows {
        writer.write_record(&row).map_err(csv_failure)?;
    }
    let bytes = writer.into_inner().map_err(|err| {
        log::error!("Failed to flush CSV: {err}");
        ServiceError::Internal
    })?;
    let body = String::from_utf8(bytes).map_err(|err| {
        log::error!("CSV output is not UTF-8: {err}");
        ServiceError::Internal
    })?;
    Ok(format!("{UTF8_BOM}{body}"))
}

/// Parses an uploaded CSV into header-keyed rows.
pub(crate) fn csv_rows(content: &str) -> ServiceResult<Vec<BTreeMap<String, String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(strip_bom(content).as_bytes());
    let headers = reader
        .headers()
        .map_err(|err| {
            log::warn!("Unreadable CSV header: {err}");
            ServiceError::Form("Arquivo CSV inválido".to_string())
        })?
        .clone();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|err| {
            log::warn!("Unreadable CSV row: {err}");
            ServiceError::Form("Arquivo CSV inválido".to_string())
        })?;
        rows.push(
            headers
                .iter()
                .zip(record.iter())
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
        );
    }
    Ok(rows)
}

fn csv_failure(err: csv::Error) -> ServiceError {
    log::error!("Failed to write CSV: {err}");
    ServiceError::Internal
}

/// Maps a repository `NotFound` into the service-level variant.
pub(crate) fn not_found_or(err: RepositoryError) -> ServiceError {
    match err {
        RepositoryError::NotFound => ServiceError::NotFound,
        other => ServiceError::Repository(other),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::auth::{AuthenticatedUser, TokenType};
    use crate::domain::types::Role;

    pub fn user_with(role: Role, company_id: Option<i32>) -> AuthenticatedUser {
        AuthenticatedUser {
            sub: 7,
            email: "advogada@escritorio.com.br".to_string(),
            name: "Ana Souza".to_string(),
            role,
            company_id,
            jti: "jti-1".to_string(),
            token_type: TokenType::Access,
            iat: 0,
            exp: 0,
        }
    }

    pub fn admin() -> AuthenticatedUser {
        user_with(Role::Admin, Some(1))
    }

    pub fn member() -> AuthenticatedUser {
        user_with(Role::User, Some(1))
    }

    pub fn super_admin() -> AuthenticatedUser {
        user_with(Role::SuperAdmin, None)
    }

    pub fn at(date: &str) -> chrono::NaiveDateTime {
        chrono::NaiveDateTime::parse_from_str(date, "%Y-%m-%d %H:%M").expect("valid datetime")
    }
}
