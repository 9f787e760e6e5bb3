use validator::Validate;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::case::Case;
use crate::domain::case_part::{CasePart, NewCasePart, PartType};
use crate::domain::types::{CaseId, CasePartId, CompanyId};
use crate::forms::cases::CasePartForm;
use crate::repository::{CasePartReader, CasePartWriter, CaseReader, ClientReader};
use crate::services::{ServiceError, ServiceResult, form_error, not_found_or, tenant_of};

const MISSING_NAME: &str = "Nome da parte é obrigatório";

fn load_case<R>(repo: &R, company_id: CompanyId, case_id: i32) -> ServiceResult<Case>
where
    R: CaseReader + ?Sized,
{
    repo.get_case_by_id(CaseId::new(case_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

/// Only a DEMANDANTE may reference one of the firm's clients; the link must
/// stay inside the company.
fn prepare_part<R>(
    repo: &R,
    company_id: CompanyId,
    form: &CasePartForm,
) -> ServiceResult<NewCasePart>
where
    R: ClientReader + ?Sized,
{
    let mut part = form.to_new_part()?;
    if part.part_type != PartType::Demandante {
        part.client_id = None;
    }
    match part.client_id {
        Some(client_id) => {
            let client = repo
                .get_client_by_id(client_id, company_id)?
                .ok_or_else(|| ServiceError::Form("Cliente inválido".to_string()))?;
            if part.name.is_empty() {
                part.name = client.name.into_inner();
            }
        }
        None if part.name.is_empty() => {
            return Err(ServiceError::Form(MISSING_NAME.to_string()));
        }
        None => {}
    }
    Ok(part)
}

pub fn list_case_parts<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case_id: i32,
) -> ServiceResult<Vec<CasePart>>
where
    R: CaseReader + CasePartReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let case = load_case(repo, company_id, case_id)?;
    Ok(repo.list_case_parts(case.id)?)
}

pub fn create_case_part<R>(
    repo: &R,
    user: &AuthenticatedUser,
    case_id: i32,
    form: CasePartForm,
) -> ServiceResult<CasePart>
where
    R: CaseReader + CasePartWriter + ClientReader + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let case = load_case(repo, company_id, case_id)?;
    let part = prepare_part(repo, company_id, &form)?;
    Ok(repo.create_case_part(company_id, case.id, &part)?)
}

pub fn update_case_part<R>(
    repo: &R,
    user: &AuthenticatedUser,
    part_id: i32,
    form: CasePartForm,
) -> ServiceResult<CasePart>
where
    R: CasePartReader + CasePartWriter + ClientReader + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = repo
        .get_case_part(CasePartId::new(part_id)?, company_id)?
        .ok_or(ServiceError::NotFound)?;
    let part = prepare_part(repo, company_id, &form)?;
    Ok(repo.update_case_part(current.id, company_id, &part)?)
}

pub fn delete_case_part<R>(repo: &R, user: &AuthenticatedUser, part_id: i32) -> ServiceResult<()>
where
    R: CasePartWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    repo.delete_case_part(CasePartId::new(part_id)?, company_id)
        .map_err(not_found_or)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;
    use crate::services::cases::tests::{case, client};
    use crate::services::test_support::{at, member};

    fn form(part_type: &str, client_id: Option<i32>, name: Option<&str>) -> CasePartForm {
        CasePartForm {
            part_type: part_type.into(),
            client_id,
            name: name.map(str::to_string),
            cpf_cnpj: None,
            phone: None,
            email: None,
            address: None,
            civil_status: None,
            profession: None,
            rg: None,
            birth_date: None,
        }
    }

    fn stored(part: &NewCasePart) -> CasePart {
        CasePart {
            id: CasePartId::new(1).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            case_id: CaseId::new(5).unwrap(),
            part_type: part.part_type,
            client_id: part.client_id,
            name: part.name.clone(),
            cpf_cnpj: None,
            phone: None,
            email: None,
            address: None,
            civil_status: None,
            profession: None,
            rg: None,
            birth_date: None,
            created_at: at("2025-03-01 09:00"),
            updated_at: at("2025-03-01 09:00"),
        }
    }

    #[test]
    fn linked_demandante_takes_client_name() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id()
            .returning(|id, _| Ok(Some(case(id.get()))));
        repo.expect_get_client_by_id()
            .returning(|id, _| Ok(Some(client(id.get()))));
        repo.expect_create_case_part()
            .withf(|_, _, part| part.name == "Maria Silva")
            .times(1)
            .returning(|_, _, part| Ok(stored(part)));

        let part =
            create_case_part(&repo, &member(), 5, form("DEMANDANTE", Some(3), None)).unwrap();
        assert_eq!(part.client_id.map(|id| id.get()), Some(3));
    }

    #[test]
    fn client_from_another_company_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id()
            .returning(|id, _| Ok(Some(case(id.get()))));
        repo.expect_get_client_by_id().returning(|_, _| Ok(None));
        repo.expect_create_case_part().times(0);

        assert!(matches!(
            create_case_part(&repo, &member(), 5, form("DEMANDANTE", Some(99), None)),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn other_part_types_drop_the_client_link() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id()
            .returning(|id, _| Ok(Some(case(id.get()))));
        repo.expect_create_case_part()
            .withf(|_, _, part| part.client_id.is_none())
            .times(1)
            .returning(|_, _, part| Ok(stored(part)));

        create_case_part(
            &repo,
            &member(),
            5,
            form("DEMANDADO", Some(3), Some("Empresa X")),
        )
        .unwrap();
    }

    #[test]
    fn parts_of_foreign_cases_are_not_found() {
        let mut repo = MockRepository::new();
        repo.expect_get_case_by_id().returning(|_, _| Ok(None));
        assert!(matches!(
            list_case_parts(&repo, &member(), 8),
            Err(ServiceError::NotFound)
        ));
    }
}
