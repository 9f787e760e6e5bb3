use chrono::Utc;
use diesel::prelude::*;

use crate::domain::auth::RevokedToken;
use crate::domain::types::{CompanyId, UserId};
use crate::domain::user::{NewUser, UpdateUser, User};
use crate::models::user::{
    LoginAttempts, NewUser as DbNewUser, ResetTokenChangeset, UpdateUser as DbUpdateUser,
    User as DbUser, VerificationChangeset,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{DieselRepository, UserListQuery, UserReader, UserWriter, like_pattern};
use crate::schema::{revoked_tokens, users};

fn into_users(rows: Vec<DbUser>) -> RepositoryResult<Vec<User>> {
    Ok(rows
        .into_iter()
        .map(User::try_from)
        .collect::<Result<Vec<_>, _>>()?)
}

impl UserReader for DieselRepository {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = users::table
            .find(id.get())
            .first::<DbUser>(&mut conn)
            .optional()?;
        Ok(user.map(User::try_from).transpose()?)
    }

    fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = users::table
            .filter(users::email.eq(email.trim().to_lowercase()))
            .first::<DbUser>(&mut conn)
            .optional()?;
        Ok(user.map(User::try_from).transpose()?)
    }

    fn get_user_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = users::table
            .filter(users::reset_token.eq(token))
            .first::<DbUser>(&mut conn)
            .optional()?;
        Ok(user.map(User::try_from).transpose()?)
    }

    fn get_user_by_verification_token(&self, token: &str) -> RepositoryResult<Option<User>> {
        let mut conn = self.conn()?;
        let user = users::table
            .filter(users::email_verification_token.eq(token))
            .first::<DbUser>(&mut conn)
            .optional()?;
        Ok(user.map(User::try_from).transpose()?)
    }

    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = users::table
                .filter(users::company_id.eq(query.company_id.get()))
                .into_boxed::<diesel::sqlite::Sqlite>();
            if let Some(term) = query.search.as_deref().filter(|t| !t.trim().is_empty()) {
                let pattern = like_pattern(term);
                items = items
                    .filter(users::name.like(pattern.clone()).or(users::email.like(pattern)));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(users::created_at.desc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        Ok((total, into_users(items.load::<DbUser>(&mut conn)?)?))
    }

    fn list_active_users_by_ids(
        &self,
        company_id: CompanyId,
        ids: &[UserId],
    ) -> RepositoryResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn()?;
        let ids: Vec<i32> = ids.iter().map(|id| id.get()).collect();
        let rows = users::table
            .filter(users::company_id.eq(company_id.get()))
            .filter(users::active.eq(true))
            .filter(users::id.eq_any(ids))
            .order(users::name.asc())
            .load::<DbUser>(&mut conn)?;
        into_users(rows)
    }

    fn is_token_revoked(&self, jti: &str) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;
        let count = revoked_tokens::table
            .filter(revoked_tokens::jti.eq(jti))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count > 0)
    }
}

impl UserWriter for DieselRepository {
    fn create_user(&self, user: &NewUser) -> RepositoryResult<User> {
        let mut conn = self.conn()?;
        let created: DbUser = diesel::insert_into(users::table)
            .values(DbNewUser::from(user))
            .returning(DbUser::as_returning())
            .get_result(&mut conn)?;
        Ok(User::try_from(created)?)
    }

    fn update_user(&self, id: UserId, updates: &UpdateUser) -> RepositoryResult<User> {
        let mut conn = self.conn()?;
        let changeset = DbUpdateUser {
            name: updates.name.as_str(),
            email: updates.email.as_str(),
            password_hash: updates.password_hash.as_deref(),
            active: updates.active,
            updated_at: Utc::now().naive_utc(),
        };
        let updated: DbUser = diesel::update(users::table.find(id.get()))
            .set(&changeset)
            .returning(DbUser::as_returning())
            .get_result(&mut conn)?;
        Ok(User::try_from(updated)?)
    }

    fn delete_user(&self, id: UserId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let affected = diesel::delete(users::table.find(id.get())).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn set_user_active(&self, id: UserId, active: bool) -> RepositoryResult<User> {
        let mut conn = self.conn()?;
        let updated: DbUser = diesel::update(users::table.find(id.get()))
            .set((
                users::active.eq(active),
                users::updated_at.eq(Utc::now().naive_utc()),
            ))
            .returning(DbUser::as_returning())
            .get_result(&mut conn)?;
        Ok(User::try_from(updated)?)
    }

    fn record_login_attempts(
        &self,
        id: UserId,
        failed_attempts: i32,
        locked_until: Option<chrono::NaiveDateTime>,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::update(users::table.find(id.get()))
            .set(LoginAttempts {
                failed_login_attempts: failed_attempts,
                account_locked_until: locked_until,
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn set_reset_token(
        &self,
        id: UserId,
        token: Option<&str>,
        expiry: Option<chrono::NaiveDateTime>,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::update(users::table.find(id.get()))
            .set(ResetTokenChangeset {
                reset_token: token,
                reset_token_expiry: expiry,
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn reset_password(&self, id: UserId, password_hash: &str) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        conn.transaction::<_, RepositoryError, _>(|conn| {
            diesel::update(users::table.find(id.get()))
                .set((
                    users::password_hash.eq(password_hash),
                    users::failed_login_attempts.eq(0),
                    users::account_locked_until.eq(None::<chrono::NaiveDateTime>),
                    users::updated_at.eq(Utc::now().naive_utc()),
                ))
                .execute(conn)?;
            diesel::update(users::table.find(id.get()))
                .set(ResetTokenChangeset {
                    reset_token: None,
                    reset_token_expiry: None,
                })
                .execute(conn)?;
            Ok(())
        })
    }

    fn set_email_verification(
        &self,
        id: UserId,
        verified: bool,
        token: Option<&str>,
        expiry: Option<chrono::NaiveDateTime>,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::update(users::table.find(id.get()))
            .set(VerificationChangeset {
                email_verified: verified,
                email_verification_token: token,
                email_verification_expiry: expiry,
            })
            .execute(&mut conn)?;
        Ok(())
    }

    fn invalidate_tokens(&self, id: UserId, at: chrono::NaiveDateTime) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::update(users::table.find(id.get()))
            .set(users::tokens_invalidated_at.eq(at))
            .execute(&mut conn)?;
        Ok(())
    }

    fn revoke_token(&self, token: &RevokedToken) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::insert_into(revoked_tokens::table)
            .values((
                revoked_tokens::jti.eq(&token.jti),
                revoked_tokens::user_id.eq(token.user_id.get()),
                revoked_tokens::expires_at.eq(token.expires_at),
            ))
            .on_conflict_do_nothing()
            .execute(&mut conn)?;
        Ok(())
    }
}
