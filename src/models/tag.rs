use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::tag::{NewTag as DomainNewTag, Tag as DomainTag};
use crate::domain::types::{CompanyId, TagId, TagName, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::tags)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Tag {
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub color: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::tags)]
pub struct NewTag<'a> {
    pub company_id: i32,
    pub name: &'a str,
    pub color: &'a str,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::tags)]
pub struct UpdateTag<'a> {
    pub name: &'a str,
    pub color: &'a str,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable, Queryable)]
#[diesel(table_name = crate::schema::client_tags)]
pub struct ClientTag {
    pub client_id: i32,
    pub tag_id: i32,
}

impl TryFrom<Tag> for DomainTag {
    type Error = TypeConstraintError;

    fn try_from(row: Tag) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TagId::new(row.id)?,
            company_id: CompanyId::new(row.company_id)?,
            name: TagName::new(row.name)?,
            color: row.color,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> From<&'a DomainNewTag> for NewTag<'a> {
    fn from(tag: &'a DomainNewTag) -> Self {
        Self {
            company_id: tag.company_id.get(),
            name: tag.name.as_str(),
            color: tag.color.as_str(),
        }
    }
}
