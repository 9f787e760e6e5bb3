use actix_web::{App, HttpResponse, http::StatusCode, http::header, test, web};
use advwell::domain::auth::AuthenticatedUser;
use advwell::domain::company::UpdateCompany;
use advwell::domain::types::EmailAddress;
use advwell::middleware::{MaybeUser, TenantUser};
use advwell::repository::{CompanyWriter, DieselRepository};
use advwell::services::auth::{AuthSettings, issue_tokens};
use chrono::Utc;
use serde_json::Value;

mod common;

async fn whoami(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "email": user.email }))
}

async fn tenant(user: TenantUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "email": user.email }))
}

async fn maybe(user: MaybeUser) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "logged_in": user.0.is_some() }))
}

fn app(
    repo: DieselRepository,
    settings: AuthSettings,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(repo))
        .app_data(web::Data::new(settings))
        .route("/whoami", web::get().to(whoami))
        .route("/tenant", web::get().to(tenant))
        .route("/maybe", web::get().to(maybe))
}

#[actix_web::test]
async fn missing_token_is_rejected_with_json_error() {
    let test_db = common::TestDb::new("missing_token_is_rejected.db");
    let app = test::init_service(app(test_db.repo(), common::settings())).await;

    let req = test::TestRequest::get().uri("/whoami").to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Token não fornecido");
}

#[actix_web::test]
async fn valid_token_resolves_principal() {
    let test_db = common::TestDb::new("valid_token_resolves_principal.db");
    let repo = test_db.repo();
    let (_, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let settings = common::settings();
    let tokens = issue_tokens(&settings, &admin, Utc::now().naive_utc()).unwrap();
    let app = test::init_service(app(repo, settings)).await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", tokens.access_token),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["email"], "ana@silva.adv.br");
}

#[actix_web::test]
async fn refresh_token_is_not_accepted_as_access_token() {
    let test_db = common::TestDb::new("refresh_token_not_access.db");
    let repo = test_db.repo();
    let (_, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    let settings = common::settings();
    let tokens = issue_tokens(&settings, &admin, Utc::now().naive_utc()).unwrap();
    let app = test::init_service(app(repo, settings)).await;

    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header((
            header::AUTHORIZATION,
            format!("Bearer {}", tokens.refresh_token),
        ))
        .to_request();
    let resp = test::call_service(&app, req).await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn inactive_company_is_forbidden() {
    let test_db = common::TestDb::new("inactive_company_is_forbidden.db");
    let repo = test_db.repo();
    let (company, admin) = common::seed_company(&repo, "Silva Advogados", "ana@silva.adv.br");
    repo.update_company(
        company.id,
        &UpdateCompany {
            name: company.name.clone(),
            cnpj: None,
            email: EmailAddress::new(company.email.clone()).unwrap(),
            phone: None,
            address: None,
            city: None,
            state: None,
            active: false,
        },
    )
    .unwrap();
    let settings = common::settings();
    let tokens = issue_tokens(&settings, &admin, Utc::now().naive_utc()).unwrap();
    let app = test::init_service(app(repo, settings)).await;

    let bearer = format!("Bearer {}", tokens.access_token);
    let req = test::TestRequest::get()
        .uri("/whoami")
        .insert_header((header::AUTHORIZATION, bearer.clone()))
        .to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri("/tenant")
        .insert_header((header::AUTHORIZATION, bearer))
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::FORBIDDEN
    );
}

#[actix_web::test]
async fn maybe_user_tolerates_bad_tokens() {
    let test_db = common::TestDb::new("maybe_user_tolerates_bad_tokens.db");
    let app = test::init_service(app(test_db.repo(), common::settings())).await;

    let req = test::TestRequest::get().uri("/maybe").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["logged_in"], false);

    let req = test::TestRequest::get()
        .uri("/maybe")
        .insert_header((header::AUTHORIZATION, "Bearer not-a-jwt"))
        .to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(body["logged_in"], false);
}
