use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;

use crate::domain::lgpd::{
    ConsentLog, ConsentType, DataRequest, DataRequestWithUser, DataStatistics, NewConsentLog,
    NewDataRequest, RequestProcessing, RequestType,
};
use crate::domain::types::{CompanyId, DataRequestId, UserId};
use crate::models::lgpd::{
    ConsentLog as DbConsentLog, DataRequest as DbDataRequest, NewConsentLog as DbNewConsentLog,
    NewDataRequest as DbNewDataRequest, ProcessRequest,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    ConsentReader, ConsentWriter, DataRequestReader, DataRequestWriter, DieselRepository,
};
use crate::schema::{
    cases, clients, consent_logs, data_requests, financial_transactions, schedule_events, users,
};

const OPEN_STATUSES: [&str; 2] = ["PENDING", "IN_PROGRESS"];

impl ConsentReader for DieselRepository {
    fn list_user_consents(&self, user_id: UserId) -> RepositoryResult<Vec<ConsentLog>> {
        let mut conn = self.conn()?;
        let rows = consent_logs::table
            .filter(consent_logs::user_id.eq(user_id.get()))
            .order((consent_logs::consented_at.desc(), consent_logs::id.desc()))
            .load::<DbConsentLog>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(ConsentLog::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }
}

impl ConsentWriter for DieselRepository {
    fn create_consent(&self, consent: &NewConsentLog) -> RepositoryResult<ConsentLog> {
        let mut conn = self.conn()?;
        let created: DbConsentLog = diesel::insert_into(consent_logs::table)
            .values(DbNewConsentLog::new(consent, Utc::now().naive_utc()))
            .returning(DbConsentLog::as_returning())
            .get_result(&mut conn)?;
        Ok(ConsentLog::try_from(created)?)
    }

    fn revoke_latest_consent(
        &self,
        user_id: UserId,
        consent_type: ConsentType,
        at: NaiveDateTime,
    ) -> RepositoryResult<Option<ConsentLog>> {
        let mut conn = self.conn()?;
        let revoked = conn.transaction::<_, RepositoryError, _>(|conn| {
            let latest = consent_logs::table
                .filter(consent_logs::user_id.eq(user_id.get()))
                .filter(consent_logs::consent_type.eq(consent_type.as_str()))
                .filter(consent_logs::revoked_at.is_null())
                .order((consent_logs::consented_at.desc(), consent_logs::id.desc()))
                .select(consent_logs::id)
                .first::<i32>(conn)
                .optional()?;
            let Some(id) = latest else {
                return Ok(None);
            };
            let updated: DbConsentLog = diesel::update(consent_logs::table.find(id))
                .set(consent_logs::revoked_at.eq(Some(at)))
                .returning(DbConsentLog::as_returning())
                .get_result(conn)?;
            Ok(Some(updated))
        })?;
        Ok(revoked.map(ConsentLog::try_from).transpose()?)
    }
}

impl DataRequestReader for DieselRepository {
    fn get_data_request(&self, id: DataRequestId) -> RepositoryResult<Option<DataRequest>> {
        let mut conn = self.conn()?;
        let request = data_requests::table
            .find(id.get())
            .first::<DbDataRequest>(&mut conn)
            .optional()?;
        Ok(request.map(DataRequest::try_from).transpose()?)
    }

    fn has_open_request(
        &self,
        user_id: UserId,
        request_type: RequestType,
    ) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;
        let count = data_requests::table
            .filter(data_requests::user_id.eq(user_id.get()))
            .filter(data_requests::request_type.eq(request_type.as_str()))
            .filter(data_requests::status.eq_any(OPEN_STATUSES))
            .count()
            .get_result::<i64>(&mut conn)?;
        Ok(count > 0)
    }

    fn list_user_requests(&self, user_id: UserId) -> RepositoryResult<Vec<DataRequest>> {
        let mut conn = self.conn()?;
        let rows = data_requests::table
            .filter(data_requests::user_id.eq(user_id.get()))
            .order(data_requests::created_at.desc())
            .load::<DbDataRequest>(&mut conn)?;
        Ok(rows
            .into_iter()
            .map(DataRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?)
    }

    fn list_open_requests(
        &self,
        company_id: CompanyId,
    ) -> RepositoryResult<Vec<DataRequestWithUser>> {
        let mut conn = self.conn()?;
        let rows = data_requests::table
            .inner_join(users::table)
            .filter(data_requests::company_id.eq(company_id.get()))
            .filter(data_requests::status.eq_any(OPEN_STATUSES))
            .order(data_requests::created_at.asc())
            .select((DbDataRequest::as_select(), users::name, users::email))
            .load::<(DbDataRequest, String, String)>(&mut conn)?;
        rows.into_iter()
            .map(|(request, user_name, user_email)| {
                Ok(DataRequestWithUser {
                    request: DataRequest::try_from(request)?,
                    user_name,
                    user_email,
                })
            })
            .collect()
    }

    fn data_statistics(
        &self,
        user_id: UserId,
        company_id: Option<CompanyId>,
    ) -> RepositoryResult<DataStatistics> {
        let mut conn = self.conn()?;
        let consents = consent_logs::table
            .filter(consent_logs::user_id.eq(user_id.get()))
            .count()
            .get_result::<i64>(&mut conn)?;

        let Some(company_id) = company_id else {
            return Ok(DataStatistics {
                consents,
                ..DataStatistics::default()
            });
        };
        let company = company_id.get();

        Ok(DataStatistics {
            clients: clients::table
                .filter(clients::company_id.eq(company))
                .count()
                .get_result(&mut conn)?,
            cases: cases::table
                .filter(cases::company_id.eq(company))
                .count()
                .get_result(&mut conn)?,
            events: schedule_events::table
                .filter(schedule_events::company_id.eq(company))
                .count()
                .get_result(&mut conn)?,
            transactions: financial_transactions::table
                .filter(financial_transactions::company_id.eq(company))
                .count()
                .get_result(&mut conn)?,
            consents,
        })
    }
}

impl DataRequestWriter for DieselRepository {
    fn create_data_request(&self, request: &NewDataRequest) -> RepositoryResult<DataRequest> {
        let mut conn = self.conn()?;
        let created: DbDataRequest = diesel::insert_into(data_requests::table)
            .values(DbNewDataRequest::from(request))
            .returning(DbDataRequest::as_returning())
            .get_result(&mut conn)?;
        Ok(DataRequest::try_from(created)?)
    }

    fn process_data_request(
        &self,
        id: DataRequestId,
        processing: &RequestProcessing,
    ) -> RepositoryResult<DataRequest> {
        let mut conn = self.conn()?;
        let updated: DbDataRequest = diesel::update(data_requests::table.find(id.get()))
            .set(ProcessRequest::new(processing, Utc::now().naive_utc()))
            .returning(DbDataRequest::as_returning())
            .get_result(&mut conn)?;
        Ok(DataRequest::try_from(updated)?)
    }

    fn complete_deletion_request(
        &self,
        id: DataRequestId,
        processing: &RequestProcessing,
        name: &str,
        email: &str,
    ) -> RepositoryResult<(DataRequest, usize)> {
        let mut conn = self.conn()?;
        let now = Utc::now().naive_utc();
        let (updated, consents) = conn.transaction::<_, RepositoryError, _>(|conn| {
            let user_id = data_requests::table
                .find(id.get())
                .select(data_requests::user_id)
                .first::<i32>(conn)?;

            diesel::update(users::table.find(user_id))
                .set((
                    users::name.eq(name),
                    users::email.eq(email),
                    users::active.eq(false),
                    users::telegram_chat_id.eq(None::<String>),
                    users::updated_at.eq(now),
                ))
                .execute(conn)?;

            let consents = diesel::update(
                consent_logs::table.filter(consent_logs::user_id.eq(user_id)),
            )
            .set((
                consent_logs::email.eq(email),
                consent_logs::ip.eq(None::<String>),
                consent_logs::user_agent.eq(None::<String>),
            ))
            .execute(conn)?;

            let updated: DbDataRequest = diesel::update(data_requests::table.find(id.get()))
                .set(ProcessRequest::new(processing, now))
                .returning(DbDataRequest::as_returning())
                .get_result(conn)?;
            Ok((updated, consents))
        })?;
        Ok((DataRequest::try_from(updated)?, consents))
    }
}
