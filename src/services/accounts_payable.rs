use chrono::NaiveDateTime;
use validator::Validate;

use crate::domain::accounts_payable::{
    AccountPayable, NewAccountPayable, PayableFields, PayableStatement, PayableStatus,
};
use crate::domain::auth::AuthenticatedUser;
use crate::domain::types::{CompanyId, PayableId};
use crate::dto::accounts_payable::{MarkPaidResponse, PayableListParams, StatementParams};
use crate::forms::accounts_payable::{MarkPaidForm, PayableForm};
use crate::forms::{parse_optional_datetime, parse_optional_end};
use crate::pagination::{PageParams, Paginated};
use crate::repository::{PayableListQuery, PayableReader, PayableWriter};
use crate::services::{
    ServiceError, ServiceResult, form_error, normalize_search, not_found_or, tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 50;

fn load_payable<R>(
    repo: &R,
    company_id: CompanyId,
    payable_id: i32,
) -> ServiceResult<AccountPayable>
where
    R: PayableReader + ?Sized,
{
    repo.get_payable(PayableId::new(payable_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

pub fn list_payables<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: PayableListParams,
) -> ServiceResult<Paginated<AccountPayable>>
where
    R: PayableReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = PayableListQuery::new(company_id).between(
        parse_optional_datetime(params.start_date.as_deref())?,
        parse_optional_end(params.end_date.as_deref())?,
    );
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    if let Some(status) = params.status.as_deref().filter(|s| !s.is_empty()) {
        query = query.status(status.parse::<PayableStatus>()?);
    }
    if let Some(category) = normalize_search(params.category) {
        query = query.category(category);
    }

    let (total, payables) = repo.list_payables(query.paginate(page, limit))?;
    Ok(Paginated::new(payables, total, page, limit))
}

pub fn get_payable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    payable_id: i32,
) -> ServiceResult<AccountPayable>
where
    R: PayableReader + ?Sized,
{
    load_payable(repo, tenant_of(user)?, payable_id)
}

pub fn create_payable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    form: PayableForm,
) -> ServiceResult<AccountPayable>
where
    R: PayableWriter + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let fields = PayableFields::try_from(&form)?;
    Ok(repo.create_payable(&NewAccountPayable {
        company_id,
        created_by: user.user_id().ok(),
        parent_id: None,
        fields,
    })?)
}

pub fn update_payable<R>(
    repo: &R,
    user: &AuthenticatedUser,
    payable_id: i32,
    form: PayableForm,
) -> ServiceResult<AccountPayable>
where
    R: PayableReader + PayableWriter + ?Sized,
{
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let current = load_payable(repo, company_id, payable_id)?;
    let fields = PayableFields::try_from(&form)?;
    Ok(repo.update_payable(current.id, company_id, &fields)?)
}

pub fn delete_payable<R>(repo: &R, user: &AuthenticatedUser, payable_id: i32) -> ServiceResult<()>
where
    R: PayableWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    repo.delete_payable(PayableId::new(payable_id)?, company_id)
        .map_err(not_found_or)
}

/// Settles a bill. A recurring bill spawns its next pending occurrence.
pub fn mark_as_paid<R>(
    repo: &R,
    user: &AuthenticatedUser,
    payable_id: i32,
    form: MarkPaidForm,
    now: NaiveDateTime,
) -> ServiceResult<MarkPaidResponse>
where
    R: PayableReader + PayableWriter + ?Sized,
{
    let company_id = tenant_of(user)?;
    let current = load_payable(repo, company_id, payable_id)?;
    if current.status == PayableStatus::Paid {
        return Err(ServiceError::Form("Conta já está paga".to_string()));
    }

    let paid_date = parse_optional_datetime(form.paid_date.as_deref())?.unwrap_or(now);
    let next = current.next_occurrence();
    let (payable, next) =
        repo.mark_payable_paid(current.id, company_id, paid_date, next.as_ref())?;

    if let Some(next) = &next {
        log::info!(
            "Recurring payable {} paid, next occurrence {} due {}",
            payable.id.get(),
            next.id.get(),
            next.due_date
        );
    }
    Ok(MarkPaidResponse { payable, next })
}

/// Totals grouped by status over the due-date range.
pub fn statement<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: StatementParams,
) -> ServiceResult<PayableStatement>
where
    R: PayableReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let start = parse_optional_datetime(params.start_date.as_deref())?;
    let end = parse_optional_end(params.end_date.as_deref())?;
    let totals = repo.payable_totals_by_status(company_id, start, end)?;
    Ok(PayableStatement::new(start, end, totals))
}
