//! Management of the users of the caller's firm.

use validator::Validate;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{CompanyId, EmailAddress, PersonName, Role, UserId};
use crate::domain::user::{NewUser, UpdateUser, User};
use crate::dto::companies::SearchParams;
use crate::forms::companies::UserForm;
use crate::pagination::{PageParams, Paginated};
use crate::repository::{UserListQuery, UserReader, UserWriter};
use crate::services::auth::hash_password;
use crate::services::{
    ServiceError, ServiceResult, caller_id, ensure_admin, form_error, normalize_search, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 20;
const DUPLICATE_EMAIL: &str = "Email já cadastrado";

fn load_member<R>(repo: &R, company_id: CompanyId, user_id: i32) -> ServiceResult<User>
where
    R: UserReader + ?Sized,
{
    repo.get_user_by_id(UserId::new(user_id)?)?
        .filter(|user| user.company_id == Some(company_id))
        .ok_or(ServiceError::NotFound)
}

pub fn list_users<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: SearchParams,
) -> ServiceResult<Paginated<User>>
where
    R: UserReader + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = UserListQuery::new(company_id);
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    let (total, users) = repo.list_users(query.paginate(page, limit))?;
    Ok(Paginated::new(users, total, page, limit))
}

pub fn get_user<R>(repo: &R, user: &AuthenticatedUser, user_id: i32) -> ServiceResult<User>
where
    R: UserReader + ?Sized,
{
    ensure_admin(user)?;
    load_member(repo, tenant_of(user)?, user_id)
}

/// Adds a verified USER to the caller's firm.
pub fn create_user<R>(repo: &R, user: &AuthenticatedUser, form: UserForm) -> ServiceResult<User>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;

    let password = form
        .password
        .as_deref()
        .filter(|password| !password.is_empty())
        .ok_or_else(|| ServiceError::Form("Senha é obrigatória".to_string()))?;

    let email = EmailAddress::new(form.email.as_str())?;
    if repo.get_user_by_email(email.as_str())?.is_some() {
        return Err(ServiceError::Form(DUPLICATE_EMAIL.to_string()));
    }

    let created = repo.create_user(&NewUser {
        company_id: Some(company_id),
        name: PersonName::new(form.name.as_str())?,
        email,
        password_hash: hash_password(password)?,
        role: Role::User,
        email_verified: true,
        email_verification_token: None,
        email_verification_expiry: None,
    })?;
    log::info!("User {} added to company {}", created.id.get(), company_id.get());
    Ok(created)
}

pub fn update_user<R>(
    repo: &R,
    user: &AuthenticatedUser,
    user_id: i32,
    form: UserForm,
) -> ServiceResult<User>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let current = load_member(repo, tenant_of(user)?, user_id)?;

    let email = EmailAddress::new(form.email.as_str())?;
    if email != current.email
        && repo
            .get_user_by_email(email.as_str())?
            .is_some_and(|other| other.id != current.id)
    {
        return Err(ServiceError::Form(DUPLICATE_EMAIL.to_string()));
    }

    let password_hash = match form.password.as_deref().filter(|p| !p.is_empty()) {
        Some(password) => Some(hash_password(password)?),
        None => None,
    };

    Ok(repo.update_user(
        current.id,
        &UpdateUser {
            name: PersonName::new(form.name.as_str())?,
            email,
            password_hash,
            active: form.active.unwrap_or(current.active),
        },
    )?)
}

pub fn delete_user<R>(repo: &R, user: &AuthenticatedUser, user_id: i32) -> ServiceResult<()>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_admin(user)?;
    if caller_id(user)?.get() == user_id {
        return Err(ServiceError::Form(
            "Você não pode excluir seu próprio usuário".to_string(),
        ));
    }
    let target = load_member(repo, tenant_of(user)?, user_id)?;
    repo.delete_user(target.id)?;
    log::info!("User {} deleted by {}", target.id.get(), user.sub);
    Ok(())
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin, at, member};

    fn stored(id: i32, company: i32) -> User {
        User {
            id: UserId::new(id).unwrap(),
            company_id: CompanyId::new(company).ok(),
            name: PersonName::new("Bruno Lima").unwrap(),
            email: EmailAddress::new("bruno@escritorio.com.br").unwrap(),
            password_hash: String::new(),
            role: Role::User,
            active: true,
            email_verified: true,
            email_verification_token: None,
            email_verification_expiry: None,
            reset_token: None,
            reset_token_expiry: None,
            failed_login_attempts: 0,
            account_locked_until: None,
            tokens_invalidated_at: None,
            telegram_chat_id: None,
            created_at: at("2025-01-01 09:00"),
            updated_at: at("2025-01-01 09:00"),
        }
    }

    fn form(password: Option<&str>) -> UserForm {
        UserForm {
            name: "Bruno Lima".into(),
            email: "bruno@escritorio.com.br".into(),
            password: password.map(str::to_string),
            active: None,
        }
    }

    #[test]
    fn cannot_delete_self() {
        let mut repo = MockRepository::new();
        repo.expect_delete_user().times(0);
        assert!(matches!(
            delete_user(&repo, &admin(), 7),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn users_of_other_companies_are_hidden() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id()
            .returning(|id| Ok(Some(stored(id.get(), 2))));
        assert!(matches!(
            get_user(&repo, &admin(), 9),
            Err(ServiceError::NotFound)
        ));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email()
            .returning(|_| Ok(Some(stored(3, 1))));
        repo.expect_create_user().times(0);
        assert!(matches!(
            create_user(&repo, &admin(), form(Some("senha-forte"))),
            Err(ServiceError::Form(msg)) if msg == DUPLICATE_EMAIL
        ));
    }

    #[test]
    fn created_users_are_verified_members() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_email().returning(|_| Ok(None));
        repo.expect_create_user()
            .withf(|new| {
                new.role == Role::User
                    && new.email_verified
                    && new.company_id.map(CompanyId::get) == Some(1)
            })
            .times(1)
            .returning(|_| Ok(stored(10, 1)));

        create_user(&repo, &admin(), form(Some("senha-forte"))).unwrap();
    }

    #[test]
    fn members_cannot_manage_users() {
        let repo = MockRepository::new();
        assert!(matches!(
            create_user(&repo, &member(), form(Some("senha-forte"))),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
