use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::db::DbConnection;
use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::tag::Tag;
use crate::domain::types::{ClientId, CompanyId, TagId};
use crate::models::client::{Client as DbClient, ClientChangeset, NewClient as DbNewClient};
use crate::models::tag::{ClientTag, Tag as DbTag};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    ClientListQuery, ClientReader, ClientWriter, DieselRepository, like_pattern,
};
use crate::schema::{client_tags, clients, tags};

/// Loads the tags of every listed client with a single join.
fn load_tags(
    conn: &mut DbConnection,
    client_ids: &[i32],
) -> RepositoryResult<HashMap<i32, Vec<Tag>>> {
    let mut grouped: HashMap<i32, Vec<Tag>> = HashMap::new();
    if client_ids.is_empty() {
        return Ok(grouped);
    }
    let rows = client_tags::table
        .inner_join(tags::table)
        .filter(client_tags::client_id.eq_any(client_ids))
        .order(tags::name.asc())
        .select((client_tags::client_id, DbTag::as_select()))
        .load::<(i32, DbTag)>(conn)?;
    for (client_id, tag) in rows {
        grouped.entry(client_id).or_default().push(Tag::try_from(tag)?);
    }
    Ok(grouped)
}

fn with_tags(conn: &mut DbConnection, rows: Vec<DbClient>) -> RepositoryResult<Vec<Client>> {
    let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
    let mut tags = load_tags(conn, &ids)?;
    rows.into_iter()
        .map(|row| {
            let client_tags = tags.remove(&row.id).unwrap_or_default();
            Ok(row.into_domain(client_tags)?)
        })
        .collect()
}

fn single(conn: &mut DbConnection, row: Option<DbClient>) -> RepositoryResult<Option<Client>> {
    match row {
        Some(row) => Ok(with_tags(conn, vec![row])?.pop()),
        None => Ok(None),
    }
}

fn replace_tags(conn: &mut DbConnection, client_id: i32, tag_ids: &[TagId]) -> QueryResult<()> {
    diesel::delete(client_tags::table.filter(client_tags::client_id.eq(client_id)))
        .execute(conn)?;
    if tag_ids.is_empty() {
        return Ok(());
    }
    let links: Vec<ClientTag> = tag_ids
        .iter()
        .map(|tag_id| ClientTag {
            client_id,
            tag_id: tag_id.get(),
        })
        .collect();
    diesel::insert_into(client_tags::table)
        .values(&links)
        .execute(conn)?;
    Ok(())
}

impl ClientReader for DieselRepository {
    fn get_client_by_id(
        &self,
        id: ClientId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<Client>> {
        let mut conn = self.conn()?;
        let row = clients::table
            .filter(clients::id.eq(id.get()))
            .filter(clients::company_id.eq(company_id.get()))
            .first::<DbClient>(&mut conn)
            .optional()?;
        single(&mut conn, row)
    }

    fn get_client_by_cpf(
        &self,
        company_id: CompanyId,
        cpf: &str,
    ) -> RepositoryResult<Option<Client>> {
        let mut conn = self.conn()?;
        let row = clients::table
            .filter(clients::company_id.eq(company_id.get()))
            .filter(clients::cpf.eq(cpf))
            .filter(clients::active.eq(true))
            .first::<DbClient>(&mut conn)
            .optional()?;
        single(&mut conn, row)
    }

    fn get_client_by_name(
        &self,
        company_id: CompanyId,
        name: &str,
    ) -> RepositoryResult<Option<Client>> {
        let mut conn = self.conn()?;
        let row = clients::table
            .filter(clients::company_id.eq(company_id.get()))
            .filter(clients::name.eq(name))
            .filter(clients::active.eq(true))
            .first::<DbClient>(&mut conn)
            .optional()?;
        single(&mut conn, row)
    }

    fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = clients::table
                .filter(clients::company_id.eq(query.company_id.get()))
                .filter(clients::active.eq(true))
                .into_boxed::<Sqlite>();

            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = like_pattern(term);
                let tagged = client_tags::table
                    .inner_join(tags::table)
                    .filter(tags::name.like(pattern.clone()))
                    .select(client_tags::client_id);
                items = items.filter(
                    clients::name
                        .like(pattern.clone())
                        .or(clients::cpf.like(pattern.clone()))
                        .or(clients::email.like(pattern))
                        .or(clients::id.eq_any(tagged)),
                );
            }
            if let Some(tag_id) = query.tag_id {
                let tagged = client_tags::table
                    .filter(client_tags::tag_id.eq(tag_id.get()))
                    .select(client_tags::client_id);
                items = items.filter(clients::id.eq_any(tagged));
            }
            if let Some(from) = query.created_from {
                items = items.filter(clients::created_at.ge(from));
            }
            if let Some(to) = query.created_to {
                items = items.filter(clients::created_at.le(to));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(clients::created_at.desc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }
        let rows = items.load::<DbClient>(&mut conn)?;
        let clients = with_tags(&mut conn, rows)?;

        Ok((total, clients))
    }

    fn search_clients(
        &self,
        company_id: CompanyId,
        term: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<Client>> {
        let mut conn = self.conn()?;
        let pattern = like_pattern(term);
        let rows = clients::table
            .filter(clients::company_id.eq(company_id.get()))
            .filter(clients::active.eq(true))
            .filter(clients::name.like(pattern.clone()).or(clients::cpf.like(pattern)))
            .order(clients::name.asc())
            .limit(limit as i64)
            .load::<DbClient>(&mut conn)?;
        with_tags(&mut conn, rows)
    }

    fn list_clients_with_phone(
        &self,
        company_id: CompanyId,
        tag_id: Option<TagId>,
        limit: usize,
    ) -> RepositoryResult<Vec<Client>> {
        let mut conn = self.conn()?;
        let mut items = clients::table
            .filter(clients::company_id.eq(company_id.get()))
            .filter(clients::active.eq(true))
            .filter(clients::phone.is_not_null())
            .filter(clients::phone.ne(""))
            .into_boxed::<Sqlite>();
        if let Some(tag_id) = tag_id {
            let tagged = client_tags::table
                .filter(client_tags::tag_id.eq(tag_id.get()))
                .select(client_tags::client_id);
            items = items.filter(clients::id.eq_any(tagged));
        }
        let rows = items
            .order(clients::name.asc())
            .limit(limit as i64)
            .load::<DbClient>(&mut conn)?;
        with_tags(&mut conn, rows)
    }
}

impl ClientWriter for DieselRepository {
    fn create_client(&self, client: &NewClient) -> RepositoryResult<Client> {
        let mut conn = self.conn()?;
        let row = conn.transaction::<_, RepositoryError, _>(|conn| {
            let created: DbClient = diesel::insert_into(clients::table)
                .values(DbNewClient {
                    company_id: client.company_id.get(),
                    fields: ClientChangeset::from(&client.fields),
                })
                .returning(DbClient::as_returning())
                .get_result(conn)?;
            replace_tags(conn, created.id, &client.tag_ids)?;
            Ok(created)
        })?;
        single(&mut conn, Some(row))?.ok_or(RepositoryError::NotFound)
    }

    fn update_client(
        &self,
        id: ClientId,
        company_id: CompanyId,
        updates: &UpdateClient,
    ) -> RepositoryResult<Client> {
        let mut conn = self.conn()?;
        let row = conn.transaction::<_, RepositoryError, _>(|conn| {
            let target = clients::table
                .filter(clients::id.eq(id.get()))
                .filter(clients::company_id.eq(company_id.get()));
            let updated: DbClient = diesel::update(target)
                .set((
                    ClientChangeset::from(&updates.fields),
                    clients::updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(DbClient::as_returning())
                .get_result(conn)?;
            if let Some(tag_ids) = &updates.tag_ids {
                replace_tags(conn, updated.id, tag_ids)?;
            }
            Ok(updated)
        })?;
        single(&mut conn, Some(row))?.ok_or(RepositoryError::NotFound)
    }

    fn deactivate_client(&self, id: ClientId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = clients::table
            .filter(clients::id.eq(id.get()))
            .filter(clients::company_id.eq(company_id.get()))
            .filter(clients::active.eq(true));
        let affected = diesel::update(target)
            .set((
                clients::active.eq(false),
                clients::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
