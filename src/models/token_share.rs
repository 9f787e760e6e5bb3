use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::token_share::{
    NewTokenShare as DomainNewTokenShare, TokenShare as DomainTokenShare,
    UpdateTokenShare as DomainUpdateTokenShare,
};
use crate::domain::types::{CompanyId, TokenShareId, TypeConstraintError};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::ai_token_shares)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct TokenShare {
    pub id: i32,
    pub provider_company_id: i32,
    pub client_company_id: i32,
    pub token_limit: i64,
    pub tokens_used: i64,
    pub enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::ai_token_shares)]
pub struct NewTokenShare {
    pub provider_company_id: i32,
    pub client_company_id: i32,
    pub token_limit: i64,
    pub enabled: bool,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::ai_token_shares)]
pub struct UpdateTokenShare {
    pub token_limit: i64,
    pub enabled: bool,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<TokenShare> for DomainTokenShare {
    type Error = TypeConstraintError;

    fn try_from(row: TokenShare) -> Result<Self, Self::Error> {
        Ok(Self {
            id: TokenShareId::new(row.id)?,
            provider_company_id: CompanyId::new(row.provider_company_id)?,
            client_company_id: CompanyId::new(row.client_company_id)?,
            token_limit: row.token_limit,
            tokens_used: row.tokens_used,
            enabled: row.enabled,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&DomainNewTokenShare> for NewTokenShare {
    fn from(share: &DomainNewTokenShare) -> Self {
        Self {
            provider_company_id: share.provider_company_id.get(),
            client_company_id: share.client_company_id.get(),
            token_limit: share.token_limit,
            enabled: share.enabled,
        }
    }
}

impl UpdateTokenShare {
    pub fn new(update: &DomainUpdateTokenShare, now: NaiveDateTime) -> Self {
        Self {
            token_limit: update.token_limit,
            enabled: update.enabled,
            updated_at: now,
        }
    }
}
