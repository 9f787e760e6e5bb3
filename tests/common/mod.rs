#![allow(dead_code)]

use advwell::db::{DbPool, establish_connection_pool};
use advwell::domain::auth::{AuthenticatedUser, TokenType};
use advwell::domain::client::{Client, ClientFields, NewClient, PersonType};
use advwell::domain::company::{Company, NewCompany};
use advwell::domain::types::{CompanyId, CompanyName, EmailAddress, PersonName, Role};
use advwell::domain::user::{NewUser, User};
use advwell::repository::{ClientWriter, CompanyWriter, DieselRepository, UserWriter};
use advwell::services::auth::{AuthSettings, hash_password};
use chrono::Utc;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use tempfile::TempDir;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

pub const PASSWORD: &str = "senha-forte-123";

/// SQLite database in a temporary directory with every migration applied.
pub struct TestDb {
    _dir: TempDir,
    pool: DbPool,
}

impl TestDb {
    pub fn new(name: &str) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(name);
        let url = path.to_str().expect("utf-8 path").to_string();
        let pool = establish_connection_pool(&url).expect("pool");
        let mut conn = pool.get().expect("connection");
        conn.run_pending_migrations(MIGRATIONS).expect("migrations");
        Self { _dir: dir, pool }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }

    pub fn repo(&self) -> DieselRepository {
        DieselRepository::new(self.pool())
    }
}

pub fn settings() -> AuthSettings {
    AuthSettings {
        jwt_secret: "test-secret".to_string(),
        access_token_minutes: 15,
        refresh_token_days: 7,
        frontend_url: "http://localhost:3000".to_string(),
    }
}

/// Creates a trial company whose verified admin logs in with [`PASSWORD`].
pub fn seed_company(repo: &DieselRepository, company: &str, email: &str) -> (Company, User) {
    let now = Utc::now().naive_utc();
    let new_company = NewCompany::trial(
        CompanyName::new(company).unwrap(),
        EmailAddress::new(email).unwrap(),
        format!("key-{email}"),
        now,
    );
    let admin = NewUser {
        company_id: None,
        name: PersonName::new("Ana Silva").unwrap(),
        email: EmailAddress::new(email).unwrap(),
        password_hash: hash_password(PASSWORD).unwrap(),
        role: Role::Admin,
        email_verified: true,
        email_verification_token: None,
        email_verification_expiry: None,
    };
    repo.create_company_with_admin(&new_company, &admin).unwrap()
}

/// Adds a verified member to the company.
pub fn seed_member(repo: &DieselRepository, company: &Company, name: &str, email: &str) -> User {
    repo.create_user(&NewUser {
        company_id: Some(company.id),
        name: PersonName::new(name).unwrap(),
        email: EmailAddress::new(email).unwrap(),
        password_hash: hash_password(PASSWORD).unwrap(),
        role: Role::User,
        email_verified: true,
        email_verification_token: None,
        email_verification_expiry: None,
    })
    .unwrap()
}

pub fn seed_client(repo: &DieselRepository, company_id: CompanyId, name: &str) -> Client {
    repo.create_client(&NewClient {
        company_id,
        fields: ClientFields {
            person_type: PersonType::Fisica,
            name: PersonName::new(name).unwrap(),
            cpf: None,
            rg: None,
            email: None,
            phone: Some("21999990000".to_string()),
            address: None,
            city: None,
            state: None,
            zip_code: None,
            profession: None,
            marital_status: None,
            birth_date: None,
            representative_name: None,
            representative_cpf: None,
            notes: None,
            telegram_chat_id: None,
        },
        tag_ids: Vec::new(),
    })
    .unwrap()
}

/// Access-token claims for a stored user, as the auth middleware would see them.
pub fn principal(user: &User) -> AuthenticatedUser {
    let now = Utc::now().timestamp();
    AuthenticatedUser {
        sub: user.id.get(),
        email: user.email.as_str().to_string(),
        name: user.name.as_str().to_string(),
        role: user.role,
        company_id: user.company_id.map(CompanyId::get),
        jti: format!("test-{}", user.id.get()),
        token_type: TokenType::Access,
        iat: now,
        exp: now + 900,
    }
}
