//! Income and expense bookkeeping with optional installment plans.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use validator::Validate;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::financial::{
    FinancialSummary, FinancialTransaction, Installment, InstallmentStatus, NewTransaction,
    TransactionDetails, TransactionFields, TransactionListItem, TransactionType,
    UpdateInstallment, split_installments,
};
use crate::domain::import::{
    ImportSummary, format_br_datetime, format_cents, parse_br_date, parse_cents,
};
use crate::domain::process_number;
use crate::domain::types::{CaseId, ClientId, CompanyId, InstallmentId, TransactionId};
use crate::dto::financial::{TransactionListParams, TransactionPage};
use crate::forms::financial::{InstallmentForm, PayInstallmentForm, TransactionForm};
use crate::forms::{FormError, parse_datetime, parse_optional_datetime, parse_optional_end};
use crate::pagination::{PageParams, Paginated};
use crate::repository::{
    CaseReader, ClientReader, TransactionListQuery, TransactionReader, TransactionWriter,
};
use crate::services::{
    ServiceError, ServiceResult, csv_document, csv_rows, form_error, normalize_search,
    not_found_or, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 50;
const EXPORT_LIMIT: usize = 100_000;

pub const TRANSACTION_CSV_HEADER: [&str; 7] =
    ["Tipo", "Cliente", "CPF", "Descrição", "Valor", "Data", "Processo"];

fn build_query(
    company_id: CompanyId,
    params: &TransactionListParams,
) -> Result<TransactionListQuery, FormError> {
    let mut query = TransactionListQuery::new(company_id).between(
        parse_optional_datetime(params.start_date.as_deref())?,
        parse_optional_end(params.end_date.as_deref())?,
    );
    if let Some(term) = normalize_search(params.search.clone()) {
        query = query.search(term);
    }
    if let Some(kind) = params.transaction_type.as_deref().filter(|t| !t.is_empty()) {
        query = query.transaction_type(kind.parse()?);
    }
    if let Some(client_id) = params.client_id {
        query = query.client(ClientId::new(client_id)?);
    }
    if let Some(case_id) = params.case_id {
        query = query.case(CaseId::new(case_id)?);
    }
    Ok(query)
}

/// The client is mandatory and the case optional; both must be the company's.
fn check_links<R>(repo: &R, company_id: CompanyId, fields: &TransactionFields) -> ServiceResult<()>
where
    R: ClientReader + CaseReader + ?Sized,
{
    if repo.get_client_by_id(fields.client_id, company_id)?.is_none() {
        return Err(ServiceError::Form("Cliente inválido".to_string()));
    }
    if let Some(case_id) = fields.case_id
        && repo.get_case_by_id(case_id, company_id)?.is_none()
    {
        return Err(ServiceError::Form("Processo inválido".to_string()));
    }
    Ok(())
}

fn load_transaction<R>(
    repo: &R,
    company_id: CompanyId,
    transaction_id: i32,
) -> ServiceResult<TransactionDetails>
where
    R: TransactionReader + ?Sized,
{
    repo.get_transaction(TransactionId::new(transaction_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

fn load_installment<R>(
    repo: &R,
    company_id: CompanyId,
    transaction_id: i32,
    installment_id: i32,
) -> ServiceResult<Installment>
where
    R: TransactionReader + ?Sized,
{
    let transaction = load_transaction(repo, company_id, transaction_id)?;
    repo.get_installment(InstallmentId::new(installment_id)?, transaction.item.transaction.id)?
        .ok_or(ServiceError::NotFound)
}

pub fn list_transactions<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: TransactionListParams,
) -> ServiceResult<TransactionPage>
where
    R: TransactionReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let query = build_query(company_id, &params)?;
    let summary = repo.summarize_transactions(&query)?;
    let (total, items) = repo.list_transactions(query.paginate(page, limit))?;
    Ok(TransactionPage {
        page: Paginated::new(items, total, page, limit),
        summary,
    })
}

pub fn summary<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: TransactionListParams,
) -> ServiceResult<FinancialSummary>
where
    R: TransactionReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    Ok(repo.summarize_transactions(&build_query(company_id, &params)?)?)
}

pub fn get_transaction<R>(
    repo: &R,
    user: &AuthenticatedUser,
    transaction_id: i32,
) -> ServiceResult<TransactionDetails>
where
    R: TransactionReader + ?Sized,
{
    load_transaction(repo, tenant_of(user)?, transaction_id)
}

pub fn create_transaction<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: TransactionForm,
) -> ServiceResult<FinancialTransaction>
where
    R: TransactionWriter + ClientReader + CaseReader + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let fields = form.fields()?;
    check_links(repo, company_id, &fields)?;

    let installments = match form.installment_plan()? {
        Some((count, interval)) => {
            split_installments(fields.amount_cents, count, fields.date, interval)?
        }
        None => Vec::new(),
    };

    let created = repo.create_transaction(&NewTransaction {
        company_id,
        fields,
        installments,
    })?;
    log::info!(
        "Transaction {} created for company {}",
        created.id.get(),
        company_id.get()
    );
    Ok(created)
}

/// Rewrites the transaction itself; an existing installment plan is kept.
pub fn update_transaction<R>(
    repo: &R,
    user: &AuthenticatedUser,
    transaction_id: i32,
    form: TransactionForm,
) -> ServiceResult<FinancialTransaction>
where
    R: TransactionReader + TransactionWriter + ClientReader + CaseReader + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = load_transaction(repo, company_id, transaction_id)?;
    let fields = form.fields()?;
    check_links(repo, company_id, &fields)?;
    Ok(repo.update_transaction(current.item.transaction.id, company_id, &fields)?)
}

pub fn delete_transaction<R>(
    repo: &R,
    user: &AuthenticatedUser,
    transaction_id: i32,
) -> ServiceResult<()>
where
    R: TransactionWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    repo.delete_transaction(TransactionId::new(transaction_id)?, company_id)
        .map_err(not_found_or)
}

pub fn list_installments<R>(
    repo: &R,
    user: &AuthenticatedUser,
    transaction_id: i32,
) -> ServiceResult<Vec<Installment>>
where
    R: TransactionReader + ?Sized,
{
    Ok(load_transaction(repo, tenant_of(user)?, transaction_id)?.installments)
}

/// Marks an installment paid. Date defaults to now and amount to the
/// installment value.
pub fn pay_installment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    transaction_id: i32,
    installment_id: i32,
    form: PayInstallmentForm,
    now: NaiveDateTime,
) -> ServiceResult<Installment>
where
    R: TransactionReader + TransactionWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let installment = load_installment(repo, company_id, transaction_id, installment_id)?;
    let paid_date = parse_optional_datetime(form.paid_date.as_deref())?.unwrap_or(now);

    Ok(repo.update_installment(
        installment.id,
        &UpdateInstallment {
            amount_cents: installment.amount_cents,
            due_date: installment.due_date,
            paid_date: Some(paid_date),
            paid_amount_cents: Some(form.paid_amount_cents.unwrap_or(installment.amount_cents)),
            status: InstallmentStatus::Paid,
            notes: installment.notes,
        },
    )?)
}

pub fn update_installment<R>(
    repo: &R,
    user: &AuthenticatedUser,
    transaction_id: i32,
    installment_id: i32,
    form: InstallmentForm,
) -> ServiceResult<Installment>
where
    R: TransactionReader + TransactionWriter + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let installment = load_installment(repo, company_id, transaction_id, installment_id)?;

    let status = form.status()?.unwrap_or(installment.status);
    let paid_date = match status {
        InstallmentStatus::Paid => form.paid_date()?.or(installment.paid_date),
        _ => form.paid_date()?,
    };
    Ok(repo.update_installment(
        installment.id,
        &UpdateInstallment {
            amount_cents: form.amount_cents.unwrap_or(installment.amount_cents),
            due_date: form.due_date()?.unwrap_or(installment.due_date),
            paid_date,
            paid_amount_cents: form.paid_amount_cents.or(installment.paid_amount_cents),
            status,
            notes: form.notes.or(installment.notes),
        },
    )?)
}

fn transaction_row(item: TransactionListItem) -> Vec<String> {
    let transaction = item.transaction;
    vec![
        transaction.transaction_type.label().to_string(),
        item.client_name,
        item.client_cpf.unwrap_or_default(),
        transaction.description,
        format_cents(transaction.amount_cents),
        format_br_datetime(transaction.date),
        item.process_number.unwrap_or_default(),
    ]
}

pub fn export_transactions<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: TransactionListParams,
) -> ServiceResult<String>
where
    R: TransactionReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let query = build_query(company_id, &params)?.paginate(1, EXPORT_LIMIT);
    let (_, items) = repo.list_transactions(query)?;
    csv_document(&TRANSACTION_CSV_HEADER, items.into_iter().map(transaction_row))
}

fn cell<'a>(row: &'a BTreeMap<String, String>, key: &str) -> &'a str {
    row.get(key).map(String::as_str).unwrap_or_default().trim()
}

/// Turns one spreadsheet row into transaction fields, resolving the client
/// by CPF first and by name second.
fn row_fields<R>(
    repo: &R,
    company_id: CompanyId,
    row: &BTreeMap<String, String>,
) -> ServiceResult<TransactionFields>
where
    R: ClientReader + CaseReader + ?Sized,
{
    let transaction_type = TransactionType::from_label(cell(row, "Tipo"))
        .ok_or_else(|| ServiceError::Form("Tipo inválido".to_string()))?;

    let cpf = cell(row, "CPF");
    let name = cell(row, "Cliente");
    let client = match (cpf.is_empty(), name.is_empty()) {
        (false, _) => repo.get_client_by_cpf(company_id, cpf)?,
        (true, false) => None,
        (true, true) => return Err(ServiceError::Form("Cliente é obrigatório".to_string())),
    };
    let client = match client {
        Some(client) => client,
        None if !name.is_empty() => repo
            .get_client_by_name(company_id, name)?
            .ok_or_else(|| ServiceError::Form(format!("Cliente não encontrado: {name}")))?,
        None => return Err(ServiceError::Form(format!("Cliente não encontrado: {cpf}"))),
    };

    let amount_cents = parse_cents(cell(row, "Valor"))
        .filter(|amount| *amount > 0)
        .ok_or_else(|| ServiceError::Form("Valor inválido".to_string()))?;

    let date_cell = cell(row, "Data");
    let date = match parse_br_date(date_cell) {
        Some(date) => date.and_time(chrono::NaiveTime::MIN),
        None => parse_datetime(date_cell)?,
    };

    let description = cell(row, "Descrição");
    if description.is_empty() {
        return Err(ServiceError::Form("Descrição é obrigatória".to_string()));
    }

    let number = cell(row, "Processo");
    let case_id = if number.is_empty() {
        None
    } else {
        let formatted = process_number::format(number);
        repo.get_case_by_process_number(company_id, &formatted)?
            .map(|case| case.id)
    };

    Ok(TransactionFields {
        client_id: client.id,
        case_id,
        transaction_type,
        description: description.to_string(),
        amount_cents,
        date,
    })
}

pub fn import_transactions<R>(
    repo: &R,
    user: &AuthenticatedUser,
    content: &str,
) -> ServiceResult<ImportSummary>
where
    R: TransactionWriter + ClientReader + CaseReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let rows = csv_rows(content)?;

    let mut summary = ImportSummary::default();
    for (index, row) in rows.iter().enumerate() {
        let label = cell(row, "Descrição").to_string();
        let outcome = row_fields(repo, company_id, row).and_then(|fields| {
            Ok(repo.create_transaction(&NewTransaction {
                company_id,
                fields,
                installments: Vec::new(),
            })?)
        });
        match outcome {
            Ok(_) => summary.record_success(),
            Err(err) => summary.record_error(index, label, err.to_string()),
        }
    }

    log::info!(
        "Transaction import for company {}: {} of {} rows imported",
        company_id.get(),
        summary.success,
        summary.total
    );
    Ok(summary)
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::repository::mock::MockRepository;
    use crate::services::cases::tests::client;
    use crate::services::test_support::{at, member};

    fn transaction(id: i32, amount: i64) -> FinancialTransaction {
        FinancialTransaction {
            id: TransactionId::new(id).unwrap(),
            company_id: CompanyId::new(1).unwrap(),
            client_id: ClientId::new(3).unwrap(),
            case_id: None,
            transaction_type: TransactionType::Income,
            description: "Honorários".into(),
            amount_cents: amount,
            date: at("2025-01-15 00:00"),
            is_installment_payment: false,
            installment_count: None,
            created_at: at("2025-01-15 00:00"),
            updated_at: at("2025-01-15 00:00"),
        }
    }

    fn details(id: i32) -> TransactionDetails {
        TransactionDetails {
            item: TransactionListItem {
                transaction: transaction(id, 90_000),
                client_name: "Maria Silva".into(),
                client_cpf: None,
                process_number: None,
            },
            installments: Vec::new(),
        }
    }

    fn installment(id: i32) -> Installment {
        Installment {
            id: InstallmentId::new(id).unwrap(),
            transaction_id: TransactionId::new(1).unwrap(),
            installment_number: 1,
            amount_cents: 30_000,
            due_date: at("2025-01-15 00:00"),
            paid_date: None,
            paid_amount_cents: None,
            status: InstallmentStatus::Pending,
            notes: None,
            created_at: at("2025-01-15 00:00"),
            updated_at: at("2025-01-15 00:00"),
        }
    }

    fn form(installments: Option<i32>) -> TransactionForm {
        TransactionForm {
            client_id: 3,
            case_id: None,
            transaction_type: "INCOME".into(),
            description: "Honorários".into(),
            amount_cents: 100_000,
            date: "2025-01-15".into(),
            is_installment_payment: installments.is_some(),
            installment_count: installments,
            installment_interval: None,
        }
    }

    #[test]
    fn installment_plan_is_split() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id()
            .returning(|id, _| Ok(Some(client(id.get()))));
        repo.expect_create_transaction()
            .withf(|new| {
                new.installments.iter().map(|i| i.amount_cents).collect::<Vec<_>>()
                    == vec![33_333, 33_333, 33_334]
            })
            .times(1)
            .returning(|_| Ok(transaction(1, 100_000)));

        create_transaction(&repo, &member(), form(Some(3))).unwrap();
    }

    #[test]
    fn foreign_client_is_rejected() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_id().returning(|_, _| Ok(None));
        repo.expect_create_transaction().times(0);
        assert!(matches!(
            create_transaction(&repo, &member(), form(None)),
            Err(ServiceError::Form(_))
        ));
    }

    #[test]
    fn paying_defaults_to_full_amount_and_now() {
        let mut repo = MockRepository::new();
        repo.expect_get_transaction()
            .returning(|id, _| Ok(Some(details(id.get()))));
        repo.expect_get_installment()
            .returning(|id, _| Ok(Some(installment(id.get()))));
        repo.expect_update_installment()
            .withf(|_, updates| {
                updates.status == InstallmentStatus::Paid
                    && updates.paid_amount_cents == Some(30_000)
                    && updates.paid_date == Some(at("2025-02-01 10:00"))
            })
            .times(1)
            .returning(|id, _| Ok(installment(id.get())));

        pay_installment(
            &repo,
            &member(),
            1,
            2,
            PayInstallmentForm::default(),
            at("2025-02-01 10:00"),
        )
        .unwrap();
    }

    #[test]
    fn import_resolves_clients_and_reports_bad_rows() {
        let mut repo = MockRepository::new();
        repo.expect_get_client_by_cpf().returning(|_, _| Ok(None));
        repo.expect_get_client_by_name()
            .returning(|_, name| Ok((name == "Maria Silva").then(|| client(3))));
        repo.expect_create_transaction()
            .withf(|new| new.fields.amount_cents == 150_050 && new.fields.client_id.get() == 3)
            .times(1)
            .returning(|_| Ok(transaction(1, 150_050)));

        let content = "Tipo,Cliente,CPF,Descrição,Valor,Data,Processo\n\
                       Receita,Maria Silva,,Honorários,\"1.500,50\",15/01/2025,\n\
                       Despesa,Desconhecido,,Custas,\"10,00\",16/01/2025,\n";
        let summary = import_transactions(&repo, &member(), content).unwrap();
        assert_eq!(summary.total, 2);
        assert_eq!(summary.success, 1);
        assert_eq!(summary.errors[0].line, 3);
    }
}
