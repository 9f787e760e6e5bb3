//! Request extractors for the bearer-token principal and audit metadata.

use std::future::{Ready, ready};
use std::ops::Deref;

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{FromRequest, HttpRequest, web};
use futures_util::future::LocalBoxFuture;

use crate::domain::audit_log::AuditContext;
use crate::domain::auth::AuthenticatedUser;
use crate::repository::DieselRepository;
use crate::routes::blocking;
use crate::services::ServiceError;
use crate::services::auth::{AuthSettings, authenticate};
use crate::services::companies::ensure_active_tenant;

const MISSING_TOKEN: &str = "Token não fornecido";

/// Pulls the token out of an `Authorization: Bearer ...` header.
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

fn app_state(
    req: &HttpRequest,
) -> Result<(web::Data<DieselRepository>, web::Data<AuthSettings>), ServiceError> {
    let repo = req.app_data::<web::Data<DieselRepository>>().cloned();
    let settings = req.app_data::<web::Data<AuthSettings>>().cloned();
    match (repo, settings) {
        (Some(repo), Some(settings)) => Ok((repo, settings)),
        _ => {
            log::error!("Authentication state is not registered on the app");
            Err(ServiceError::Internal)
        }
    }
}

impl FromRequest for AuthenticatedUser {
    type Error = ServiceError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let token = bearer_token(req);
        let state = app_state(req);
        Box::pin(async move {
            let token =
                token.ok_or_else(|| ServiceError::Unauthorized(MISSING_TOKEN.to_string()))?;
            let (repo, settings) = state?;
            blocking(move || authenticate(repo.get_ref(), settings.get_ref(), &token)).await
        })
    }
}

/// Principal whose company is active. Super admins always pass.
#[derive(Clone, Debug)]
pub struct TenantUser(pub AuthenticatedUser);

impl Deref for TenantUser {
    type Target = AuthenticatedUser;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for TenantUser {
    type Error = ServiceError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let user = AuthenticatedUser::from_request(req, payload);
        let repo = req.app_data::<web::Data<DieselRepository>>().cloned();
        Box::pin(async move {
            let user = user.await?;
            let repo = repo.ok_or_else(|| {
                log::error!("Repository is not registered on the app");
                ServiceError::Internal
            })?;
            let checked = user.clone();
            blocking(move || ensure_active_tenant(repo.get_ref(), &checked)).await?;
            Ok(TenantUser(user))
        })
    }
}

/// Principal when a bearer token is present and valid, `None` otherwise.
#[derive(Clone, Debug)]
pub struct MaybeUser(pub Option<AuthenticatedUser>);

impl FromRequest for MaybeUser {
    type Error = ServiceError;
    type Future = LocalBoxFuture<'static, Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        if bearer_token(req).is_none() {
            return Box::pin(async { Ok(MaybeUser(None)) });
        }
        let user = AuthenticatedUser::from_request(req, payload);
        Box::pin(async move {
            match user.await {
                Ok(user) => Ok(MaybeUser(Some(user))),
                Err(ServiceError::Unauthorized(_)) => Ok(MaybeUser(None)),
                Err(err) => Err(err),
            }
        })
    }
}

/// Client address and agent recorded on audit entries.
pub fn audit_context(req: &HttpRequest) -> AuditContext {
    let forwarded = req
        .headers()
        .get("X-Forwarded-For")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());
    let ip_address = forwarded.or_else(|| req.peer_addr().map(|addr| addr.ip().to_string()));
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);
    AuditContext {
        ip_address,
        user_agent,
    }
}

/// Extractor wrapper so handlers can take the audit context as an argument.
#[derive(Clone, Debug)]
pub struct RequestAudit(pub AuditContext);

impl FromRequest for RequestAudit {
    type Error = ServiceError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(Ok(RequestAudit(audit_context(req))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[test]
    fn reads_bearer_token() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Bearer abc.def"))
            .to_http_request();
        assert_eq!(bearer_token(&req).as_deref(), Some("abc.def"));
    }

    #[test]
    fn ignores_other_schemes() {
        let req = TestRequest::default()
            .insert_header((header::AUTHORIZATION, "Basic Zm9vOmJhcg=="))
            .to_http_request();
        assert!(bearer_token(&req).is_none());
    }

    #[test]
    fn prefers_forwarded_address() {
        let req = TestRequest::default()
            .insert_header(("X-Forwarded-For", "203.0.113.7, 10.0.0.1"))
            .insert_header((header::USER_AGENT, "curl/8.0"))
            .peer_addr("127.0.0.1:4000".parse().unwrap())
            .to_http_request();
        let ctx = audit_context(&req);
        assert_eq!(ctx.ip_address.as_deref(), Some("203.0.113.7"));
        assert_eq!(ctx.user_agent.as_deref(), Some("curl/8.0"));
    }

    #[test]
    fn falls_back_to_peer_address() {
        let req = TestRequest::default()
            .peer_addr("127.0.0.1:4000".parse().unwrap())
            .to_http_request();
        assert_eq!(audit_context(&req).ip_address.as_deref(), Some("127.0.0.1"));
    }
}
