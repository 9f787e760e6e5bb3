use chrono::Utc;
use diesel::prelude::*;

use crate::domain::tag::{NewTag, Tag, UpdateTag};
use crate::domain::types::{CompanyId, TagId};
use crate::models::tag::{NewTag as DbNewTag, Tag as DbTag, UpdateTag as DbUpdateTag};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TagListQuery, TagReader, TagWriter, like_pattern};
use crate::schema::tags;

impl TagReader for DieselRepository {
    fn get_tag_by_id(&self, id: TagId, company_id: CompanyId) -> RepositoryResult<Option<Tag>> {
        let mut conn = self.conn()?;
        let tag = tags::table
            .filter(tags::id.eq(id.get()))
            .filter(tags::company_id.eq(company_id.get()))
            .first::<DbTag>(&mut conn)
            .optional()?;
        Ok(tag.map(Tag::try_from).transpose()?)
    }

    fn get_tag_by_name(&self, company_id: CompanyId, name: &str) -> RepositoryResult<Option<Tag>> {
        let mut conn = self.conn()?;
        let tag = tags::table
            .filter(tags::company_id.eq(company_id.get()))
            .filter(tags::name.eq(name))
            .first::<DbTag>(&mut conn)
            .optional()?;
        Ok(tag.map(Tag::try_from).transpose()?)
    }

    fn list_tags(&self, query: TagListQuery) -> RepositoryResult<(usize, Vec<Tag>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = tags::table
                .filter(tags::company_id.eq(query.company_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                items = items.filter(tags::name.like(like_pattern(term)));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(tags::name.asc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let tags = items
            .load::<DbTag>(&mut conn)?
            .into_iter()
            .map(Tag::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, tags))
    }

    fn count_company_tags(&self, company_id: CompanyId, ids: &[TagId]) -> RepositoryResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }
        let mut conn = self.conn()?;
        let ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();
        let count = tags::table
            .filter(tags::company_id.eq(company_id.get()))
            .filter(tags::id.eq_any(ids))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count as usize)
    }
}

impl TagWriter for DieselRepository {
    fn create_tag(&self, tag: &NewTag) -> RepositoryResult<Tag> {
        let mut conn = self.conn()?;
        let created: DbTag = diesel::insert_into(tags::table)
            .values(DbNewTag::from(tag))
            .returning(DbTag::as_returning())
            .get_result(&mut conn)?;
        Ok(Tag::try_from(created)?)
    }

    fn update_tag(
        &self,
        id: TagId,
        company_id: CompanyId,
        updates: &UpdateTag,
    ) -> RepositoryResult<Tag> {
        let mut conn = self.conn()?;
        let target = tags::table
            .filter(tags::id.eq(id.get()))
            .filter(tags::company_id.eq(company_id.get()));
        let updated: DbTag = diesel::update(target)
            .set(DbUpdateTag {
                name: updates.name.as_str(),
                color: updates.color.as_str(),
                updated_at: Utc::now().naive_utc(),
            })
            .returning(DbTag::as_returning())
            .get_result(&mut conn)?;
        Ok(Tag::try_from(updated)?)
    }

    fn delete_tag(&self, id: TagId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = tags::table
            .filter(tags::id.eq(id.get()))
            .filter(tags::company_id.eq(company_id.get()));
        let affected = diesel::delete(target).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
