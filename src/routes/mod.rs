//! JSON handlers mounted under `/api`.
//!
//! Handlers extract the principal, run the service on the blocking pool and
//! serialize the result. Failures surface through the [`ResponseError`]
//! implementation of [`ServiceError`].

use actix_web::http::StatusCode;
use actix_web::http::header::{ContentDisposition, DispositionParam, DispositionType};
use actix_web::{HttpResponse, ResponseError, web};
use serde::Serialize;
use serde_json::json;

use crate::repository::errors::RepositoryError;
use crate::services::{ServiceError, ServiceResult};

pub mod accounts_payable;
pub mod audit_logs;
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
pub mod schedule;
pub mod tags;
pub mod token_shares;
pub mod users;

const NOT_FOUND_MESSAGE: &str = "Registro não encontrado";
const INTERNAL_MESSAGE: &str = "Erro interno do servidor";

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden(_) => StatusCode::FORBIDDEN,
            ServiceError::NotFound | ServiceError::Repository(RepositoryError::NotFound) => {
                StatusCode::NOT_FOUND
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::Form(_) | ServiceError::TypeConstraint(_) => StatusCode::BAD_REQUEST,
            ServiceError::Repository(_) | ServiceError::Integration(_) | ServiceError::Internal => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        let message = match status {
            StatusCode::NOT_FOUND => NOT_FOUND_MESSAGE.to_string(),
            StatusCode::INTERNAL_SERVER_ERROR => {
                log::error!("Request failed: {self}");
                INTERNAL_MESSAGE.to_string()
            }
            _ => self.to_string(),
        };
        HttpResponse::build(status).json(json!({ "error": message }))
    }
}

/// Runs a service call on the blocking thread pool.
pub async fn blocking<F, T>(f: F) -> ServiceResult<T>
where
    F: FnOnce() -> ServiceResult<T> + Send + 'static,
    T: Send + 'static,
{
    web::block(f).await.map_err(|err| {
        log::error!("Blocking task failed: {err}");
        ServiceError::Internal
    })?
}

pub fn ok<T: Serialize>(body: T) -> HttpResponse {
    HttpResponse::Ok().json(body)
}

pub fn created<T: Serialize>(body: T) -> HttpResponse {
    HttpResponse::Created().json(body)
}

pub fn message(text: &str) -> HttpResponse {
    HttpResponse::Ok().json(json!({ "message": text }))
}

/// CSV attachment download.
pub fn csv_attachment(filename: &str, body: String) -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header(ContentDisposition {
            disposition: DispositionType::Attachment,
            parameters: vec![DispositionParam::Filename(filename.to_string())],
        })
        .body(body)
}

/// Turns malformed JSON bodies and query strings into the usual error shape.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected JSON body: {err}");
        ServiceError::Form("JSON inválido".to_string()).into()
    })
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        log::warn!("Rejected query string: {err}");
        ServiceError::Form("Parâmetros inválidos".to_string()).into()
    })
}

/// Registers every handler. Literal segments come before `{id}` patterns.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .configure(auth::configure)
            .configure(companies::configure)
            .configure(users::configure)
            .configure(tags::configure)
            .configure(clients::configure)
            .configure(case_parts::configure)
            .configure(cases::configure)
            .configure(schedule::configure)
            .configure(financial::configure)
            .configure(accounts_payable::configure)
            .configure(audit_logs::configure)
            .configure(lgpd::configure)
            .configure(campaigns::configure)
            .configure(holidays::configure)
            .configure(dashboard::configure)
            .configure(token_shares::configure),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    #[test]
    fn maps_errors_to_statuses() {
        assert_eq!(
            ServiceError::Unauthorized("x".into()).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ServiceError::Forbidden("x".into()).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(ServiceError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::TypeConstraint("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::Integration("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[actix_web::test]
    async fn form_error_body_carries_message() {
        let response = ServiceError::Form("Email já cadastrado".into()).error_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], "Email já cadastrado");
    }

    #[actix_web::test]
    async fn internal_errors_hide_details() {
        let err = ServiceError::Repository(RepositoryError::DatabaseError("disk".into()));
        let response = err.error_response();
        let body = to_bytes(response.into_body()).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["error"], INTERNAL_MESSAGE);
    }
}
