//! Tenant administration: the caller's own firm and the super admin console.

use chrono::NaiveDateTime;
use uuid::Uuid;
use validator::Validate;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::company::{
    Company, LastPayment, NewCompany, SubscriptionAlert, SubscriptionUpdate,
};
use crate::domain::types::{CompanyId, CompanyName, EmailAddress, PersonName, Role, UserId};
use crate::domain::user::{NewUser, User};
use crate::dto::companies::{ApiKeyResponse, CompanyOverview, CompanyWithAdmin, SearchParams};
use crate::forms::companies::{CompanyForm, CreateCompanyForm, SubscriptionForm};
use crate::forms::clean;
use crate::pagination::{PageParams, Paginated};
use crate::repository::{
    CompanyListQuery, CompanyReader, CompanyWriter, UserListQuery, UserReader, UserWriter,
};
use crate::services::auth::hash_password;
use crate::services::{
    INACTIVE_COMPANY_MESSAGE, ServiceError, ServiceResult, ensure_admin, ensure_super_admin,
    form_error, normalize_search, not_found_or, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 20;

/// Checks the caller's company exists and is active. Super admins pass
/// through with whatever company they carry.
pub fn ensure_active_tenant<R>(
    repo: &R,
    user: &AuthenticatedUser,
) -> ServiceResult<Option<CompanyId>>
where
    R: CompanyReader + ?Sized,
{
    if user.is_super_admin() {
        return Ok(user.company());
    }

    let company_id = tenant_of(user)?;
    match repo.get_company_by_id(company_id)? {
        Some(company) if company.active => Ok(Some(company_id)),
        _ => {
            log::warn!("User {} rejected: company {} inactive", user.sub, company_id.get());
            Err(ServiceError::Forbidden(INACTIVE_COMPANY_MESSAGE.to_string()))
        }
    }
}

fn load_company<R>(repo: &R, company_id: CompanyId) -> ServiceResult<Company>
where
    R: CompanyReader + ?Sized,
{
    repo.get_company_by_id(company_id)?
        .ok_or(ServiceError::NotFound)
}

pub fn get_own_company<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<CompanyOverview>
where
    R: CompanyReader + UserReader + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    let company = load_company(repo, company_id)?;
    let (users_count, _) = repo.list_users(UserListQuery::new(company_id))?;
    Ok(CompanyOverview {
        company,
        users_count,
    })
}

/// Updates the caller's firm. Admins cannot toggle their own `active` flag.
pub fn update_own_company<R>(
    repo: &R,
    user: &AuthenticatedUser,
    mut form: CompanyForm,
) -> ServiceResult<Company>
where
    R: CompanyReader + CompanyWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = load_company(repo, company_id)?;

    form.active = None;
    let updates = form.into_update(current.active)?;
    Ok(repo.update_company(company_id, &updates)?)
}

pub fn get_api_key<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<ApiKeyResponse>
where
    R: CompanyReader + ?Sized,
{
    ensure_admin(user)?;
    let company = load_company(repo, tenant_of(user)?)?;
    match company.api_key {
        Some(api_key) => Ok(ApiKeyResponse { api_key }),
        None => Err(ServiceError::NotFound),
    }
}

pub fn regenerate_api_key<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<ApiKeyResponse>
where
    R: CompanyWriter + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    let api_key = Uuid::new_v4().simple().to_string();
    repo.set_company_api_key(company_id, &api_key)?;
    log::info!("API key regenerated for company {}", company_id.get());
    Ok(ApiKeyResponse { api_key })
}

pub fn list_companies<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: SearchParams,
) -> ServiceResult<Paginated<Company>>
where
    R: CompanyReader + ?Sized,
{
    ensure_super_admin(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = CompanyListQuery::new();
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    let (total, companies) = repo.list_companies(query.paginate(page, limit))?;
    Ok(Paginated::new(companies, total, page, limit))
}

pub fn get_company<R>(
    repo: &R,
    user: &AuthenticatedUser,
    company_id: i32,
) -> ServiceResult<Company>
where
    R: CompanyReader + ?Sized,
{
    ensure_super_admin(user)?;
    load_company(repo, CompanyId::new(company_id)?)
}

/// Creates a firm with an already verified administrator.
pub fn create_company<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: CreateCompanyForm,
    now: NaiveDateTime,
) -> ServiceResult<CompanyWithAdmin>
where
    R: UserReader + CompanyWriter + ?Sized,
{
    ensure_super_admin(user)?;
    form.validate().map_err(form_error)?;

    let admin_email = EmailAddress::new(form.admin_email.as_str())?;
    if repo.get_user_by_email(admin_email.as_str())?.is_some() {
        return Err(ServiceError::Form("Email já cadastrado".to_string()));
    }

    let mut company = NewCompany::trial(
        CompanyName::new(form.company.name.as_str())?,
        EmailAddress::new(form.company.email.as_str())?,
        Uuid::new_v4().simple().to_string(),
        now,
    );
    company.cnpj = clean(&form.company.cnpj);
    company.phone = clean(&form.company.phone);
    company.address = clean(&form.company.address);
    company.city = clean(&form.company.city);
    company.state = clean(&form.company.state);

    let admin = NewUser {
        company_id: None,
        name: PersonName::new(form.admin_name.as_str())?,
        email: admin_email,
        password_hash: hash_password(&form.admin_password)?,
        role: Role::Admin,
        email_verified: true,
        email_verification_token: None,
        email_verification_expiry: None,
    };

    let (company, admin) = repo.create_company_with_admin(&company, &admin)?;
    log::info!("Super admin {} created company {}", user.sub, company.id.get());
    Ok(CompanyWithAdmin { company, admin })
}

pub fn update_company<R>(
    repo: &R,
    user: &AuthenticatedUser,
    company_id: i32,
    form: CompanyForm,
) -> ServiceResult<Company>
where
    R: CompanyReader + CompanyWriter + ?Sized,
{
    ensure_super_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = CompanyId::new(company_id)?;
    let current = load_company(repo, company_id)?;

    let updates = form.into_update(current.active)?;
    Ok(repo.update_company(company_id, &updates)?)
}

pub fn delete_company<R>(repo: &R, user: &AuthenticatedUser, company_id: i32) -> ServiceResult<()>
where
    R: CompanyWriter + ?Sized,
{
    ensure_super_admin(user)?;
    let company_id = CompanyId::new(company_id)?;
    repo.delete_company(company_id).map_err(not_found_or)?;
    log::info!("Super admin {} deleted company {}", user.sub, company_id.get());
    Ok(())
}

pub fn list_company_users<R>(
    repo: &R,
    user: &AuthenticatedUser,
    company_id: i32,
    params: SearchParams,
) -> ServiceResult<Paginated<User>>
where
    R: UserReader + ?Sized,
{
    ensure_super_admin(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = UserListQuery::new(CompanyId::new(company_id)?);
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    let (total, users) = repo.list_users(query.paginate(page, limit))?;
    Ok(Paginated::new(users, total, page, limit))
}

/// Flips the `active` flag of a user belonging to the company.
pub fn toggle_user_active<R>(
    repo: &R,
    user: &AuthenticatedUser,
    company_id: i32,
    user_id: i32,
) -> ServiceResult<User>
where
    R: UserReader + UserWriter + ?Sized,
{
    ensure_super_admin(user)?;
    let company_id = CompanyId::new(company_id)?;
    let target = repo
        .get_user_by_id(UserId::new(user_id)?)?
        .filter(|target| target.company_id == Some(company_id))
        .ok_or(ServiceError::NotFound)?;

    Ok(repo.set_user_active(target.id, !target.active)?)
}

pub fn update_subscription<R>(
    repo: &R,
    user: &AuthenticatedUser,
    company_id: i32,
    form: SubscriptionForm,
) -> ServiceResult<Company>
where
    R: CompanyWriter + ?Sized,
{
    ensure_super_admin(user)?;
    let update = SubscriptionUpdate::try_from(form)?;
    let company = repo
        .update_subscription(CompanyId::new(company_id)?, &update)
        .map_err(not_found_or)?;
    log::info!(
        "Subscription of company {} set to {} / {}",
        company.id.get(),
        company.subscription_status.as_str(),
        company.subscription_plan.as_str()
    );
    Ok(company)
}

pub fn last_payment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    company_id: i32,
) -> ServiceResult<LastPayment>
where
    R: CompanyReader + ?Sized,
{
    ensure_super_admin(user)?;
    let company = load_company(repo, CompanyId::new(company_id)?)?;
    Ok(LastPayment {
        company_id: company.id,
        last_payment_at: company.last_payment_at,
        last_payment_cents: company.last_payment_cents,
        subscription_status: company.subscription_status,
        subscription_plan: company.subscription_plan,
    })
}

/// Trials and subscriptions ending within the alert window, plus past-due firms.
pub fn subscription_alerts<R>(
    repo: &R,
    user: &AuthenticatedUser,
    now: NaiveDateTime,
) -> ServiceResult<Vec<SubscriptionAlert>>
where
    R: CompanyReader + ?Sized,
{
    ensure_super_admin(user)?;
    let (_, companies) = repo.list_companies(CompanyListQuery::new())?;
    Ok(companies
        .iter()
        .filter(|company| company.active)
        .filter_map(|company| company.subscription_alert(now))
        .collect())
}

#[cfg(all(test, feature = "test-mocks"))]
pub(crate) mod tests {
    use chrono::Duration;

    use super::*;
    use crate::domain::company::{SubscriptionPlan, SubscriptionStatus};
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin, at, member, super_admin};

    pub(crate) fn company(id: i32, active: bool) -> Company {
        Company {
            id: CompanyId::new(id).unwrap(),
            name: CompanyName::new("Silva Advogados").unwrap(),
            cnpj: None,
            email: "contato@silva.adv.br".into(),
            phone: None,
            address: None,
            city: None,
            state: None,
            active,
            api_key: Some("abc123".into()),
            subscription_status: SubscriptionStatus::Trial,
            subscription_plan: SubscriptionPlan::Basic,
            trial_ends_at: None,
            subscription_ends_at: None,
            last_payment_at: None,
            last_payment_cents: None,
            created_at: at("2025-01-01 09:00"),
            updated_at: at("2025-01-01 09:00"),
        }
    }

    #[test]
    fn inactive_company_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_company_by_id()
            .returning(|id| Ok(Some(company(id.get(), false))));

        match ensure_active_tenant(&repo, &member()) {
            Err(ServiceError::Forbidden(msg)) => assert_eq!(msg, INACTIVE_COMPANY_MESSAGE),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn missing_company_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_company_by_id().returning(|_| Ok(None));
        assert!(ensure_active_tenant(&repo, &admin()).is_err());
    }

    #[test]
    fn super_admin_skips_tenant_check() {
        let mut repo = MockRepository::new();
        repo.expect_get_company_by_id().times(0);
        assert_eq!(ensure_active_tenant(&repo, &super_admin()).unwrap(), None);
    }

    #[test]
    fn api_key_is_regenerated_without_dashes() {
        let mut repo = MockRepository::new();
        repo.expect_set_company_api_key()
            .withf(|_, key| key.len() == 32 && !key.contains('-'))
            .times(1)
            .returning(|_, _| Ok(()));

        let response = regenerate_api_key(&repo, &admin()).unwrap();
        assert_eq!(response.api_key.len(), 32);
    }

    #[test]
    fn console_requires_super_admin() {
        let repo = MockRepository::new();
        assert!(matches!(
            list_companies(&repo, &admin(), SearchParams::default()),
            Err(ServiceError::Forbidden(_))
        ));
    }

    #[test]
    fn alerts_cover_trials_ending_soon() {
        let now = at("2025-06-01 09:00");
        let mut ending = company(1, true);
        ending.trial_ends_at = Some(now + Duration::days(2));
        let mut later = company(2, true);
        later.trial_ends_at = Some(now + Duration::days(30));
        let mut repo = MockRepository::new();
        repo.expect_list_companies()
            .returning(move |_| Ok((2, vec![ending.clone(), later.clone()])));

        let alerts = subscription_alerts(&repo, &super_admin(), now).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].company_id.get(), 1);
    }

    #[test]
    fn toggling_user_of_other_company_is_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_user_by_id().returning(|_| Ok(None));
        repo.expect_set_user_active().times(0);
        assert!(matches!(
            toggle_user_active(&repo, &super_admin(), 1, 5),
            Err(ServiceError::NotFound)
        ));
    }
}
