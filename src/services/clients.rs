//! Client records: CRUD, autocomplete and spreadsheet exchange.

use validator::Validate;

use crate::domain::audit_log::{AuditAction, AuditContext, EntityType};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::client::{
    CLIENT_CSV_HEADER, Client, ClientDetails, ClientFields, NewClient, UpdateClient,
};
use crate::domain::import::{ImportSummary, format_br_date, format_br_datetime};
use crate::domain::types::{ClientId, CompanyId, TagId};
use crate::dto::clients::ClientListParams;
use crate::forms::clients::ClientForm;
use crate::forms::{parse_optional_datetime, parse_optional_end};
use crate::pagination::{PageParams, Paginated};
use crate::repository::{
    AuditLogWriter, CaseReader, ClientListQuery, ClientReader, ClientWriter, TagReader,
};
use crate::services::audit_log::{event_by, record, snapshot};
use crate::services::{
    ServiceError, ServiceResult, csv_document, csv_rows, form_error, normalize_search,
    not_found_or, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 10;
const SEARCH_LIMIT: usize = 10;
const EXPORT_LIMIT: usize = 100_000;
const DUPLICATE_CPF: &str = "CPF já cadastrado";

fn ensure_unique_cpf<R>(
    repo: &R,
    company_id: CompanyId,
    fields: &ClientFields,
    except: Option<ClientId>,
) -> ServiceResult<()>
where
    R: ClientReader + ?Sized,
{
    let Some(cpf) = fields.cpf.as_deref() else {
        return Ok(());
    };
    match repo.get_client_by_cpf(company_id, cpf)? {
        Some(existing) if Some(existing.id) != except => {
            Err(ServiceError::Form(DUPLICATE_CPF.to_string()))
        }
        _ => Ok(()),
    }
}

fn ensure_company_tags<R>(repo: &R, company_id: CompanyId, tag_ids: &[TagId]) -> ServiceResult<()>
where
    R: TagReader + ?Sized,
{
    if tag_ids.is_empty() {
        return Ok(());
    }
    let mut unique = tag_ids.to_vec();
    unique.sort_by_key(|id| id.get());
    unique.dedup();
    if repo.count_company_tags(company_id, &unique)? != unique.len() {
        return Err(ServiceError::Form("Tags inválidas".to_string()));
    }
    Ok(())
}

fn load_client<R>(repo: &R, company_id: CompanyId, client_id: i32) -> ServiceResult<Client>
where
    R: ClientReader + ?Sized,
{
    repo.get_client_by_id(ClientId::new(client_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

pub fn list_clients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: ClientListParams,
) -> ServiceResult<Paginated<Client>>
where
    R: ClientReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = ClientListQuery::new(company_id).created_between(
        parse_optional_datetime(params.date_from.as_deref())?,
        parse_optional_end(params.date_to.as_deref())?,
    );
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    if let Some(tag_id) = params.tag_id {
        query = query.tag(TagId::new(tag_id)?);
    }

    let (total, clients) = repo.list_clients(query.paginate(page, limit))?;
    Ok(Paginated::new(clients, total, page, limit))
}

pub fn get_client<R>(
    repo: &R,
    user: &AuthenticatedUser,
    client_id: i32,
) -> ServiceResult<ClientDetails>
where
    R: ClientReader + CaseReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let client = load_client(repo, company_id, client_id)?;
    let cases = repo.list_client_cases(client.id)?;
    Ok(ClientDetails { client, cases })
}

pub fn create_client<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: ClientForm,
    context: &AuditContext,
) -> ServiceResult<Client>
where
    R: ClientReader + ClientWriter + TagReader + AuditLogWriter + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;

    let fields = form.fields()?;
    let tag_ids = form.tag_ids()?.unwrap_or_default();
    ensure_unique_cpf(repo, company_id, &fields, None)?;
    ensure_company_tags(repo, company_id, &tag_ids)?;

    let client = repo.create_client(&NewClient {
        company_id,
        fields,
        tag_ids,
    })?;

    let mut event = event_by(
        user,
        company_id,
        EntityType::Client,
        client.id.get(),
        client.name.as_str(),
        AuditAction::Create,
    );
    event.new_values = snapshot(&client);
    record(repo, event, context);

    Ok(client)
}

pub fn update_client<R>(
    repo: &R,
    user: &AuthenticatedUser,
    client_id: i32,
    form: ClientForm,
    context: &AuditContext,
) -> ServiceResult<Client>
where
    R: ClientReader + ClientWriter + TagReader + AuditLogWriter + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = load_client(repo, company_id, client_id)?;

    let fields = form.fields()?;
    let tag_ids = form.tag_ids()?;
    ensure_unique_cpf(repo, company_id, &fields, Some(current.id))?;
    if let Some(tag_ids) = &tag_ids {
        ensure_company_tags(repo, company_id, tag_ids)?;
    }

    let updated = repo.update_client(current.id, company_id, &UpdateClient { fields, tag_ids })?;

    let mut event = event_by(
        user,
        company_id,
        EntityType::Client,
        updated.id.get(),
        updated.name.as_str(),
        AuditAction::Update,
    );
    event.old_values = snapshot(&current);
    event.new_values = snapshot(&updated);
    record(repo, event, context);

    Ok(updated)
}

/// Soft delete: the client is hidden from listings but keeps its history.
pub fn delete_client<R>(
    repo: &R,
    user: &AuthenticatedUser,
    client_id: i32,
    context: &AuditContext,
) -> ServiceResult<()>
where
    R: ClientReader + ClientWriter + AuditLogWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let current = load_client(repo, company_id, client_id)?;
    repo.deactivate_client(current.id, company_id)
        .map_err(not_found_or)?;

    let mut event = event_by(
        user,
        company_id,
        EntityType::Client,
        current.id.get(),
        current.name.as_str(),
        AuditAction::Delete,
    );
    event.old_values = snapshot(&current);
    record(repo, event, context);

    Ok(())
}

pub fn search_clients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    term: Option<String>,
) -> ServiceResult<Vec<Client>>
where
    R: ClientReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    match normalize_search(term) {
        Some(term) => Ok(repo.search_clients(company_id, &term, SEARCH_LIMIT)?),
        None => Ok(Vec::new()),
    }
}

fn client_row(client: Client) -> Vec<String> {
    let tags = client
        .tags
        .iter()
        .map(|tag| tag.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");
    vec![
        client.person_type.label().to_string(),
        client.name.into_inner(),
        client.cpf.unwrap_or_default(),
        client.rg.unwrap_or_default(),
        client.email.unwrap_or_default(),
        client.phone.unwrap_or_default(),
        client.address.unwrap_or_default(),
        client.city.unwrap_or_default(),
        client.state.unwrap_or_default(),
        client.zip_code.unwrap_or_default(),
        client.profession.unwrap_or_default(),
        client.marital_status.unwrap_or_default(),
        client.birth_date.map(format_br_date).unwrap_or_default(),
        tags,
        client.representative_name.unwrap_or_default(),
        client.representative_cpf.unwrap_or_default(),
        client.notes.unwrap_or_default(),
        format_br_datetime(client.created_at),
    ]
}

/// Active clients as a BOM-prefixed CSV spreadsheet.
pub fn export_clients<R>(repo: &R, user: &AuthenticatedUser) -> ServiceResult<String>
where
    R: ClientReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (_, clients) =
        repo.list_clients(ClientListQuery::new(company_id).paginate(1, EXPORT_LIMIT))?;
    csv_document(&CLIENT_CSV_HEADER, clients.into_iter().map(client_row))
}

/// Resolves the comma separated `Tags` cell to the company's tag ids,
/// skipping names that do not exist.
fn resolve_tags<R>(
    repo: &R,
    company_id: CompanyId,
    cell: Option<&String>,
) -> ServiceResult<Vec<TagId>>
where
    R: TagReader + ?Sized,
{
    let mut ids = Vec::new();
    for name in cell
        .into_iter()
        .flat_map(|cell| cell.split([',', ';']))
        .map(str::trim)
        .filter(|name| !name.is_empty())
    {
        if let Some(tag) = repo.get_tag_by_name(company_id, name)? {
            ids.push(tag.id);
        }
    }
    Ok(ids)
}

/// Imports clients row by row; failing rows are reported, not fatal.
pub fn import_clients<R>(
    repo: &R,
    user: &AuthenticatedUser,
    content: &str,
    context: &AuditContext,
) -> ServiceResult<ImportSummary>
where
    R: ClientReader + ClientWriter + TagReader + AuditLogWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let rows = csv_rows(content)?;

    let mut summary = ImportSummary::default();
    for (index, row) in rows.iter().enumerate() {
        let name = row.get("Nome").cloned().unwrap_or_default();
        if name.trim().is_empty() {
            summary.record_error(index, name, "Nome é obrigatório");
            continue;
        }

        let form = ClientForm::from_csv_row(row);
        let fields = match form.fields() {
            Ok(fields) => fields,
            Err(err) => {
                summary.record_error(index, name, err.to_string());
                continue;
            }
        };

        let outcome = ensure_unique_cpf(repo, company_id, &fields, None)
            .and_then(|_| resolve_tags(repo, company_id, row.get("Tags")))
            .and_then(|tag_ids| {
                Ok(repo.create_client(&NewClient {
                    company_id,
                    fields,
                    tag_ids,
                })?)
            });

        match outcome {
            Ok(client) => {
                let mut event = event_by(
                    user,
                    company_id,
                    EntityType::Client,
                    client.id.get(),
                    client.name.as_str(),
                    AuditAction::Create,
                );
                event.new_values = snapshot(&client);
                record(repo, event, context);
                summary.record_success();
            }
            Err(err) => summary.record_error(index, name, err.to_string()),
        }
    }

    log::info!(
        "Client import for company {}: {} of {} rows imported",
        company_id.get(),
        summary.success,
        summary.total
    );
    Ok(summary)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::client::PersonType;
    use crate::domain::types::PersonName;
    use crate::repository::mock::MockRepository;
    use crate::services::test_support::{admin, at, member};

    fn client(id: i32, name: &str, cpf: Option<&str>) -> Client {
        Client {
            id: ClientId::new(id).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            person_type: PersonType::Fisica,
            name: PersonName::new(name).unwrap(),
            cpf: cpf.map(str::to_string),
            rg: None,
            email: None,
            phone: None,
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
            active: true,
            created_at: at("2025-02-01 10:00"),
            updated_at: at("2025-02-01 10:00"),
            tags: Vec::new(),
        }
    }

    fn form(name: &str, cpf: Option<&str>) -> ClientForm {
        let mut row = std::collections::BTreeMap::new();
        row.insert("Nome".to_string(), name.to_string());
        if let Some(cpf) = cpf {
            row.insert("CPF/CNPJ".to_string(), cpf.to_string());
        }
        ClientForm::from_csv_row(&row)
    }

    #[test]
    fn duplicate_cpf_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_cpf()
            .returning(|_, cpf| Ok(Some(client(3, "Outro", Some(cpf)))));
        repo.expect_create_client().times(0);

        assert!(matches!(
            create_client(&repo, &member(), form("Maria", Some("123")), &AuditContext::default()),
            Err(ServiceError::Form(msg)) if msg == DUPLICATE_CPF
        ));
    }

    #[test]
    fn foreign_tags_are_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_count_company_tags().returning(|_, _| Ok(1));
        repo.expect_create_client().times(0);
        let mut form = form("Maria", None);
        form.tag_ids = Some(vec![1, 2]);

        assert!(create_client(&repo, &member(), form, &AuditContext::default()).is_err());
    }

    #[test]
    fn creation_is_audited() {
        let mut repo = MockRepository::new();
        repo.expect_create_client()
            .times(1)
            .returning(|new| Ok(client(5, new.fields.name.as_str(), None)));
        repo.expect_create_audit_log()
            .withf(|entry| {
                entry.action == AuditAction::Create
                    && entry.entity_id == 5
                    && entry.description.as_deref() == Some("Cliente \"Maria\" criado")
            })
            .times(1)
            .returning(|_| Ok(()));

        create_client(&repo, &admin(), form("Maria", None), &AuditContext::default()).unwrap();
    }

    #[test]
    fn import_reports_rows_without_name() {
        let mut repo = MockRepository::new();
        repo.expect_create_client()
            .times(1)
            .returning(|new| Ok(client(9, new.fields.name.as_str(), None)));
        repo.expect_create_audit_log().returning(|_| Ok(()));

        let csv = "\u{feff}Tipo,Nome,Email\nPessoa Física,Maria,maria@x.com\nPessoa Física,,sem@nome.com\n";
        let summary = import_clients(&repo, &admin(), csv, &AuditContext::default()).unwrap();

        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.errors.len(), 1);
        assert_eq!(summary.errors[0].line, 3);
    }

    #[test]
    fn export_writes_header_and_dates() {
        let mut repo = MockRepository::new();
        repo.expect_list_clients()
            .returning(|_| Ok((1, vec![client(1, "Maria", Some("111"))])));

        let csv = export_clients(&repo, &admin()).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().ends_with("Data de Cadastro"));
        let row = lines.next().unwrap();
        assert!(row.starts_with("Pessoa Física,Maria,111"));
        assert!(row.ends_with("01/02/2025"));
    }

    #[test]
    fn blank_search_returns_nothing() {
        let mut repo = MockRepository::new();
        repo.expect_search_clients().times(0);
        assert!(search_clients(&repo, &admin(), Some(" ".into())).unwrap().is_empty());
    }
}
