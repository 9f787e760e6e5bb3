use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;

use crate::db::DbConnection;
use crate::domain::token_share::{NewTokenShare, TokenShare, TokenShareView, UpdateTokenShare};
use crate::domain::types::{CompanyId, TokenShareId};
use crate::models::token_share::{
    NewTokenShare as DbNewTokenShare, TokenShare as DbTokenShare,
    UpdateTokenShare as DbUpdateTokenShare,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, TokenShareReader, TokenShareWriter};
use crate::schema::{ai_token_shares, companies};

/// Attaches both company names, looked up in one query.
fn into_views(
    conn: &mut DbConnection,
    rows: Vec<DbTokenShare>,
) -> RepositoryResult<Vec<TokenShareView>> {
    let mut ids: Vec<i32> = rows
        .iter()
        .flat_map(|row| [row.provider_company_id, row.client_company_id])
        .collect();
    ids.sort_unstable();
    ids.dedup();

    let names: HashMap<i32, String> = companies::table
        .filter(companies::id.eq_any(ids))
        .select((companies::id, companies::name))
        .load::<(i32, String)>(conn)?
        .into_iter()
        .collect();

    rows.into_iter()
        .map(|row| {
            let provider_company_name = names
                .get(&row.provider_company_id)
                .cloned()
                .unwrap_or_default();
            let client_company_name = names
                .get(&row.client_company_id)
                .cloned()
                .unwrap_or_default();
            Ok(TokenShareView {
                share: TokenShare::try_from(row)?,
                provider_company_name,
                client_company_name,
            })
        })
        .collect()
}

impl TokenShareReader for DieselRepository {
    fn get_token_share(&self, id: TokenShareId) -> RepositoryResult<Option<TokenShare>> {
        let mut conn = self.conn()?;
        let share = ai_token_shares::table
            .find(id.get())
            .first::<DbTokenShare>(&mut conn)
            .optional()?;
        Ok(share.map(TokenShare::try_from).transpose()?)
    }

    fn get_token_share_by_pair(
        &self,
        provider: CompanyId,
        client: CompanyId,
    ) -> RepositoryResult<Option<TokenShare>> {
        let mut conn = self.conn()?;
        let share = ai_token_shares::table
            .filter(ai_token_shares::provider_company_id.eq(provider.get()))
            .filter(ai_token_shares::client_company_id.eq(client.get()))
            .first::<DbTokenShare>(&mut conn)
            .optional()?;
        Ok(share.map(TokenShare::try_from).transpose()?)
    }

    fn list_provided_shares(&self, provider: CompanyId) -> RepositoryResult<Vec<TokenShareView>> {
        let mut conn = self.conn()?;
        let rows = ai_token_shares::table
            .filter(ai_token_shares::provider_company_id.eq(provider.get()))
            .order(ai_token_shares::created_at.desc())
            .load::<DbTokenShare>(&mut conn)?;
        into_views(&mut conn, rows)
    }

    fn get_received_share(&self, client: CompanyId) -> RepositoryResult<Option<TokenShareView>> {
        let mut conn = self.conn()?;
        let row = ai_token_shares::table
            .filter(ai_token_shares::client_company_id.eq(client.get()))
            .order(ai_token_shares::created_at.desc())
            .first::<DbTokenShare>(&mut conn)
            .optional()?;
        match row {
            Some(row) => Ok(into_views(&mut conn, vec![row])?.pop()),
            None => Ok(None),
        }
    }
}

impl TokenShareWriter for DieselRepository {
    fn create_token_share(&self, share: &NewTokenShare) -> RepositoryResult<TokenShare> {
        let mut conn = self.conn()?;
        let created: DbTokenShare = diesel::insert_into(ai_token_shares::table)
            .values(DbNewTokenShare::from(share))
            .returning(DbTokenShare::as_returning())
            .get_result(&mut conn)?;
        Ok(TokenShare::try_from(created)?)
    }

    fn update_token_share(
        &self,
        id: TokenShareId,
        updates: &UpdateTokenShare,
    ) -> RepositoryResult<TokenShare> {
        let mut conn = self.conn()?;
        let updated: DbTokenShare = diesel::update(ai_token_shares::table.find(id.get()))
            .set(DbUpdateTokenShare::new(updates, Utc::now().naive_utc()))
            .returning(DbTokenShare::as_returning())
            .get_result(&mut conn)?;
        Ok(TokenShare::try_from(updated)?)
    }

    fn delete_token_share(&self, id: TokenShareId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let affected = diesel::delete(ai_token_shares::table.find(id.get())).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
