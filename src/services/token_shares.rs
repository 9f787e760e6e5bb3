//! AI token allowances shared between companies. Managed by super admins.

use validator::Validate;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::token_share::{
    NewTokenShare, TokenShare, TokenShareStats, TokenShareView, UpdateTokenShare,
};
use crate::domain::types::{CompanyId, TokenShareId};
use crate::dto::token_shares::ReceivedShare;
use crate::forms::token_shares::{TokenShareForm, UpdateTokenShareForm};
use crate::repository::{CompanyReader, TokenShareReader, TokenShareWriter};
use crate::services::{
    ServiceError, ServiceResult, ensure_super_admin, form_error, not_found_or, tenant_of,
};

fn ensure_company<R>(repo: &R, company_id: CompanyId) -> ServiceResult<()>
where
    R: CompanyReader + ?Sized,
{
    repo.get_company_by_id(company_id)?
        .map(|_| ())
        .ok_or_else(|| ServiceError::Form("Empresa não encontrada".to_string()))
}

pub fn list_provided<R>(
    repo: &R,
    user: &AuthenticatedUser,
    provider_company_id: i32,
) -> ServiceResult<Vec<TokenShareView>>
where
    R: TokenShareReader + ?Sized,
{
    ensure_super_admin(user)?;
    Ok(repo.list_provided_shares(CompanyId::new(provider_company_id)?)?)
}

pub fn create_share<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: TokenShareForm,
) -> ServiceResult<TokenShare>
where
    R: CompanyReader + TokenShareReader + TokenShareWriter + ?Sized,
{
    ensure_super_admin(user)?;
    form.validate().map_err(form_error)?;
    let provider = CompanyId::new(form.provider_company_id)?;
    let client = CompanyId::new(form.client_company_id)?;
    if provider == client {
        return Err(ServiceError::Form(
            "Uma empresa não pode compartilhar tokens consigo mesma".to_string(),
        ));
    }
    ensure_company(repo, provider)?;
    ensure_company(repo, client)?;
    if repo.get_token_share_by_pair(provider, client)?.is_some() {
        return Err(ServiceError::Form(
            "Já existe um compartilhamento entre essas empresas".to_string(),
        ));
    }

    let share = repo.create_token_share(&NewTokenShare {
        provider_company_id: provider,
        client_company_id: client,
        token_limit: form.token_limit,
        enabled: form.enabled.unwrap_or(true),
    })?;
    log::info!(
        "Token share {} created: company {} -> {} ({} tokens)",
        share.id.get(),
        provider.get(),
        client.get(),
        share.token_limit
    );
    Ok(share)
}

pub fn update_share<R>(
    repo: &R,
    user: &AuthenticatedUser,
    share_id: i32,
    form: UpdateTokenShareForm,
) -> ServiceResult<TokenShare>
where
    R: TokenShareReader + TokenShareWriter + ?Sized,
{
    ensure_super_admin(user)?;
    form.validate().map_err(form_error)?;
    let current = repo
        .get_token_share(TokenShareId::new(share_id)?)?
        .ok_or(ServiceError::NotFound)?;
    Ok(repo.update_token_share(
        current.id,
        &UpdateTokenShare {
            token_limit: form.token_limit.unwrap_or(current.token_limit),
            enabled: form.enabled.unwrap_or(current.enabled),
        },
    )?)
}

pub fn delete_share<R>(repo: &R, user: &AuthenticatedUser, share_id: i32) -> ServiceResult<()>
where
    R: TokenShareWriter + ?Sized,
{
    ensure_super_admin(user)?;
    repo.delete_token_share(TokenShareId::new(share_id)?)
        .map_err(not_found_or)
}

/// Usage over every share the provider hands out.
pub fn share_stats<R>(
    repo: &R,
    user: &AuthenticatedUser,
    provider_company_id: i32,
) -> ServiceResult<TokenShareStats>
where
    R: TokenShareReader + ?Sized,
{
    ensure_super_admin(user)?;
    let views = repo.list_provided_shares(CompanyId::new(provider_company_id)?)?;
    Ok(TokenShareStats::from_views(&views))
}

pub fn received_share<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<ReceivedShare>
where
    R: TokenShareReader + ?Sized,
{
    Ok(ReceivedShare {
        share: repo.get_received_share(tenant_of(user)?)?,
    })
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;
    use crate::services::companies::tests::company;
    use crate::services::test_support::{admin, at, super_admin};

    fn share(limit: i64, enabled: bool) -> TokenShare {
        TokenShare {
            id: TokenShareId::new(4).unwrap(),
            provider_company_id: CompanyId::new(1).unwrap(),
            client_company_id: CompanyId::new(2).unwrap(),
            token_limit: limit,
            tokens_used: 250,
            enabled,
            created_at: at("2025-01-01 09:00"),
            updated_at: at("2025-01-01 09:00"),
        }
    }

    fn form(provider: i32, client: i32) -> TokenShareForm {
        TokenShareForm {
            provider_company_id: provider,
            client_company_id: client,
            token_limit: 1_000,
            enabled: None,
        }
    }

    #[test]
    fn company_cannot_share_with_itself() {
        let repo = MockRepository::new();
        assert!(matches!(
            create_share(&repo, &super_admin(), form(1, 1)),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn duplicate_pair_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_company_by_id()
            .returning(|id| Ok(Some(company(id.get(), true))));
        repo.expect_get_token_share_by_pair()
            .returning(|_, _| Ok(Some(share(1_000, true))));
        repo.expect_create_token_share().times(0);
        assert!(matches!(
            create_share(&repo, &super_admin(), form(1, 2)),
            Err(ServiceError::Form(msg)) if msg.starts_with("Já existe")
        ));
    }

    #[test]
    fn new_share_is_enabled_by_default() {
        let mut repo = MockRepository::new();
        repo.expect_get_company_by_id()
            .returning(|id| Ok(Some(company(id.get(), true))));
        repo.expect_get_token_share_by_pair().returning(|_, _| Ok(None));
        repo.expect_create_token_share()
            .withf(|new| new.enabled && new.token_limit == 1_000)
            .times(1)
            .returning(|new| Ok(share(new.token_limit, new.enabled)));
        create_share(&repo, &super_admin(), form(1, 2)).unwrap();
    }

    #[test]
    fn partial_update_keeps_other_fields() {
        let mut repo = MockRepository::new();
        repo.expect_get_token_share()
            .returning(|_| Ok(Some(share(1_000, true))));
        repo.expect_update_token_share()
            .withf(|_, updates| updates.token_limit == 1_000 && !updates.enabled)
            .times(1)
            .returning(|_, updates| Ok(share(updates.token_limit, updates.enabled)));
        let updated = update_share(
            &repo,
            &super_admin(),
            4,
            UpdateTokenShareForm {
                token_limit: None,
                enabled: Some(false),
            },
        )
        .unwrap();
        assert!(!updated.enabled);
    }

    #[test]
    fn only_super_admins_manage_shares() {
        let repo = MockRepository::new();
        assert!(matches!(
            list_provided(&repo, &admin(), 1),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
