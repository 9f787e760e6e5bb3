use validator::Validate;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::tag::{NewTag, Tag, UpdateTag};
use crate::domain::types::{CompanyId, TagId};
use crate::dto::companies::SearchParams;
use crate::forms::tags::TagForm;
use crate::pagination::{PageParams, Paginated};
use crate::repository::{TagListQuery, TagReader, TagWriter};
use crate::services::{
    ServiceError, ServiceResult, ensure_admin, form_error, normalize_search, not_found_or,
    tenant_of,
};

const DEFAULT_PAGE_SIZE: usize = 50;
const SEARCH_LIMIT: usize = 10;
const DUPLICATE_TAG: &str = "Já existe uma tag com este nome";

fn ensure_unique_name<R>(
    repo: &R,
    company_id: CompanyId,
    name: &str,
    except: Option<TagId>,
) -> ServiceResult<()>
where
    R: TagReader + ?Sized,
{
    match repo.get_tag_by_name(company_id, name)? {
        Some(existing) if Some(existing.id) != except => {
            Err(ServiceError::Form(DUPLICATE_TAG.to_string()))
        }
        _ => Ok(()),
    }
}

pub fn list_tags<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: SearchParams,
) -> ServiceResult<Paginated<Tag>>
where
    R: TagReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let (page, limit) = PageParams {
        page: params.page,
        limit: params.limit,
    }
    .resolve(DEFAULT_PAGE_SIZE);

    let mut query = TagListQuery::new(company_id);
    if let Some(term) = normalize_search(params.search) {
        query = query.search(term);
    }
    let (total, tags) = repo.list_tags(query.paginate(page, limit))?;
    Ok(Paginated::new(tags, total, page, limit))
}

/// Autocomplete over tag names.
pub fn search_tags<R>(repo: &R, user: &AuthenticatedUser, term: &str) -> ServiceResult<Vec<Tag>>
where
    R: TagReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let mut query = TagListQuery::new(company_id).paginate(1, SEARCH_LIMIT);
    if let Some(term) = normalize_search(Some(term.to_string())) {
        query = query.search(term);
    }
    let (_, tags) = repo.list_tags(query)?;
    Ok(tags)
}

pub fn get_tag<R>(repo: &R, user: &AuthenticatedUser, tag_id: i32) -> ServiceResult<Tag>
where
    R: TagReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    repo.get_tag_by_id(TagId::new(tag_id)?, company_id)?
        .ok_or(ServiceError::NotFound)
}

pub fn create_tag<R>(repo: &R, user: &AuthenticatedUser, form: TagForm) -> ServiceResult<Tag>
where
    R: TagReader + TagWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;

    let fields = UpdateTag::try_from(form)?;
    ensure_unique_name(repo, company_id, fields.name.as_str(), None)?;

    Ok(repo.create_tag(&NewTag {
        company_id,
        name: fields.name,
        color: fields.color,
    })?)
}

pub fn update_tag<R>(
    repo: &R,
    user: &AuthenticatedUser,
    tag_id: i32,
    form: TagForm,
) -> ServiceResult<Tag>
where
    R: TagReader + TagWriter + ?Sized,
{
    ensure_admin(user)?;
    form.validate().map_err(form_error)?;
    let company_id = tenant_of(user)?;
    let tag_id = TagId::new(tag_id)?;

    repo.get_tag_by_id(tag_id, company_id)?
        .ok_or(ServiceError::NotFound)?;

    let fields = UpdateTag::try_from(form)?;
    ensure_unique_name(repo, company_id, fields.name.as_str(), Some(tag_id))?;

    Ok(repo.update_tag(tag_id, company_id, &fields)?)
}

pub fn delete_tag<R>(repo: &R, user: &AuthenticatedUser, tag_id: i32) -> ServiceResult<()>
where
    R: TagWriter + ?Sized,
{
    ensure_admin(user)?;
    let company_id = tenant_of(user)?;
    repo.delete_tag(TagId::new(tag_id)?, company_id)
        .map_err(not_found_or)
}
