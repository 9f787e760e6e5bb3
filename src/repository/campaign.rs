use chrono::{NaiveDateTime, Utc};
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel::sqlite::Sqlite;

use crate::db::DbConnection;
use crate::domain::campaign::{
    Campaign, CampaignCounters, CampaignFields, CampaignStatus, NewCampaign, NewRecipient,
    Recipient, RecipientDelivery, RecipientStatus, StatusCounts,
};
use crate::domain::types::{CampaignId, CompanyId, RecipientId};
use crate::models::campaign::{
    Campaign as DbCampaign, CampaignCountersChangeset, DeliveryChangeset,
    NewCampaign as DbNewCampaign, NewRecipient as DbNewRecipient, Recipient as DbRecipient,
};
use crate::repository::errors::{RepositoryError, RepositoryResult};
use crate::repository::{
    CampaignListQuery, CampaignReader, CampaignWriter, DieselRepository, RecipientListQuery,
};
use crate::schema::{campaign_recipients, whatsapp_campaigns};

fn insert_recipients(
    conn: &mut DbConnection,
    campaign_id: CampaignId,
    recipients: &[NewRecipient],
) -> QueryResult<usize> {
    if recipients.is_empty() {
        return Ok(0);
    }
    let rows: Vec<DbNewRecipient> = recipients
        .iter()
        .map(|recipient| DbNewRecipient::new(campaign_id, recipient))
        .collect();
    diesel::insert_into(campaign_recipients::table)
        .values(&rows)
        .execute(conn)
}

impl CampaignReader for DieselRepository {
    fn get_campaign(
        &self,
        id: CampaignId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<Campaign>> {
        let mut conn = self.conn()?;
        let campaign = whatsapp_campaigns::table
            .filter(whatsapp_campaigns::id.eq(id.get()))
            .filter(whatsapp_campaigns::company_id.eq(company_id.get()))
            .first::<DbCampaign>(&mut conn)
            .optional()?;
        Ok(campaign.map(Campaign::try_from).transpose()?)
    }

    fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>> {
        let mut conn = self.conn()?;
        let campaign = whatsapp_campaigns::table
            .find(id.get())
            .first::<DbCampaign>(&mut conn)
            .optional()?;
        Ok(campaign.map(Campaign::try_from).transpose()?)
    }

    fn list_campaigns(&self, query: CampaignListQuery) -> RepositoryResult<(usize, Vec<Campaign>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = whatsapp_campaigns::table
                .filter(whatsapp_campaigns::company_id.eq(query.company_id.get()))
                .into_boxed::<Sqlite>();
            if let Some(status) = query.status {
                items = items.filter(whatsapp_campaigns::status.eq(status.as_str()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(whatsapp_campaigns::created_at.desc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let campaigns = items
            .load::<DbCampaign>(&mut conn)?
            .into_iter()
            .map(Campaign::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, campaigns))
    }

    fn list_recipients(
        &self,
        query: RecipientListQuery,
    ) -> RepositoryResult<(usize, Vec<Recipient>)> {
        let mut conn = self.conn()?;

        let query_builder = || {
            let mut items = campaign_recipients::table
                .filter(campaign_recipients::campaign_id.eq(query.campaign_id.get()))
                .into_boxed::<Sqlite>();
            if let Some(status) = query.status {
                items = items.filter(campaign_recipients::status.eq(status.as_str()));
            }
            items
        };

        let total = query_builder().count().get_result::<i64>(&mut conn)? as usize;

        let mut items = query_builder().order(campaign_recipients::id.asc());
        if let Some(pagination) = &query.pagination {
            items = items
                .limit(pagination.limit())
                .offset(pagination.offset());
        }

        let recipients = items
            .load::<DbRecipient>(&mut conn)?
            .into_iter()
            .map(Recipient::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((total, recipients))
    }

    fn get_recipient(&self, id: RecipientId) -> RepositoryResult<Option<Recipient>> {
        let mut conn = self.conn()?;
        let recipient = campaign_recipients::table
            .find(id.get())
            .first::<DbRecipient>(&mut conn)
            .optional()?;
        Ok(recipient.map(Recipient::try_from).transpose()?)
    }

    fn get_recipient_by_message_id(
        &self,
        message_id: &str,
    ) -> RepositoryResult<Option<Recipient>> {
        let mut conn = self.conn()?;
        let recipient = campaign_recipients::table
            .filter(campaign_recipients::message_id.eq(message_id))
            .first::<DbRecipient>(&mut conn)
            .optional()?;
        Ok(recipient.map(Recipient::try_from).transpose()?)
    }

    fn recipient_status_counts(&self, campaign_id: CampaignId) -> RepositoryResult<StatusCounts> {
        let mut conn = self.conn()?;
        let rows = campaign_recipients::table
            .filter(campaign_recipients::campaign_id.eq(campaign_id.get()))
            .group_by(campaign_recipients::status)
            .select((campaign_recipients::status, count_star()))
            .load::<(String, i64)>(&mut conn)?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status.parse::<RecipientStatus>()?, count);
        }
        Ok(counts)
    }

    fn company_campaign_counts(
        &self,
        company_id: CompanyId,
    ) -> RepositoryResult<(Vec<(CampaignStatus, i64)>, StatusCounts)> {
        let mut conn = self.conn()?;
        let by_status = whatsapp_campaigns::table
            .filter(whatsapp_campaigns::company_id.eq(company_id.get()))
            .group_by(whatsapp_campaigns::status)
            .select((whatsapp_campaigns::status, count_star()))
            .load::<(String, i64)>(&mut conn)?
            .into_iter()
            .map(|(status, count)| Ok((status.parse::<CampaignStatus>()?, count)))
            .collect::<RepositoryResult<Vec<_>>>()?;

        let company_campaigns = whatsapp_campaigns::table
            .filter(whatsapp_campaigns::company_id.eq(company_id.get()))
            .select(whatsapp_campaigns::id);
        let rows = campaign_recipients::table
            .filter(campaign_recipients::campaign_id.eq_any(company_campaigns))
            .group_by(campaign_recipients::status)
            .select((campaign_recipients::status, count_star()))
            .load::<(String, i64)>(&mut conn)?;

        let mut messages = StatusCounts::default();
        for (status, count) in rows {
            messages.add(status.parse::<RecipientStatus>()?, count);
        }
        Ok((by_status, messages))
    }
}

impl CampaignWriter for DieselRepository {
    fn create_campaign(&self, campaign: &NewCampaign) -> RepositoryResult<Campaign> {
        let mut conn = self.conn()?;
        let created = conn.transaction::<_, RepositoryError, _>(|conn| {
            let created: DbCampaign = diesel::insert_into(whatsapp_campaigns::table)
                .values(DbNewCampaign::new(
                    campaign.company_id,
                    campaign.created_by,
                    &campaign.fields,
                    campaign.recipients.len(),
                ))
                .returning(DbCampaign::as_returning())
                .get_result(conn)?;
            insert_recipients(conn, CampaignId::new(created.id)?, &campaign.recipients)?;
            Ok(created)
        })?;
        Ok(Campaign::try_from(created)?)
    }

    fn update_campaign(
        &self,
        id: CampaignId,
        company_id: CompanyId,
        fields: &CampaignFields,
        recipients: Option<&[NewRecipient]>,
    ) -> RepositoryResult<Campaign> {
        let mut conn = self.conn()?;
        let updated = conn.transaction::<_, RepositoryError, _>(|conn| {
            let target = whatsapp_campaigns::table
                .filter(whatsapp_campaigns::id.eq(id.get()))
                .filter(whatsapp_campaigns::company_id.eq(company_id.get()));
            let mut updated: DbCampaign = diesel::update(target)
                .set((
                    whatsapp_campaigns::name.eq(fields.name.as_str()),
                    whatsapp_campaigns::template_name.eq(fields.template_name.as_str()),
                    whatsapp_campaigns::language.eq(fields.language.as_str()),
                    whatsapp_campaigns::updated_at.eq(Utc::now().naive_utc()),
                ))
                .returning(DbCampaign::as_returning())
                .get_result(conn)?;

            if let Some(recipients) = recipients {
                diesel::delete(
                    campaign_recipients::table
                        .filter(campaign_recipients::campaign_id.eq(id.get())),
                )
                .execute(conn)?;
                let inserted = insert_recipients(conn, id, recipients)?;
                updated = diesel::update(whatsapp_campaigns::table.find(id.get()))
                    .set(whatsapp_campaigns::total_recipients.eq(inserted as i32))
                    .returning(DbCampaign::as_returning())
                    .get_result(conn)?;
            }
            Ok(updated)
        })?;
        Ok(Campaign::try_from(updated)?)
    }

    fn delete_campaign(&self, id: CampaignId, company_id: CompanyId) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        let target = whatsapp_campaigns::table
            .filter(whatsapp_campaigns::id.eq(id.get()))
            .filter(whatsapp_campaigns::company_id.eq(company_id.get()));
        let affected = diesel::delete(target).execute(&mut conn)?;
        if affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn set_campaign_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<Campaign> {
        let mut conn = self.conn()?;
        let target = whatsapp_campaigns::table.find(id.get());
        let base = (
            whatsapp_campaigns::status.eq(status.as_str()),
            whatsapp_campaigns::updated_at.eq(at),
        );
        let updated: DbCampaign = match status {
            CampaignStatus::Sending => diesel::update(target)
                .set((base, whatsapp_campaigns::started_at.eq(Some(at))))
                .returning(DbCampaign::as_returning())
                .get_result(&mut conn)?,
            CampaignStatus::Completed | CampaignStatus::Cancelled => diesel::update(target)
                .set((base, whatsapp_campaigns::completed_at.eq(Some(at))))
                .returning(DbCampaign::as_returning())
                .get_result(&mut conn)?,
            CampaignStatus::Draft => diesel::update(target)
                .set(base)
                .returning(DbCampaign::as_returning())
                .get_result(&mut conn)?,
        };
        Ok(Campaign::try_from(updated)?)
    }

    fn fail_pending_recipients(
        &self,
        campaign_id: CampaignId,
        message: &str,
    ) -> RepositoryResult<usize> {
        let mut conn = self.conn()?;
        let target = campaign_recipients::table
            .filter(campaign_recipients::campaign_id.eq(campaign_id.get()))
            .filter(campaign_recipients::status.eq(RecipientStatus::Pending.as_str()));
        let affected = diesel::update(target)
            .set((
                campaign_recipients::status.eq(RecipientStatus::Failed.as_str()),
                campaign_recipients::error_message.eq(Some(message)),
                campaign_recipients::updated_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)?;
        Ok(affected)
    }

    fn record_delivery(
        &self,
        recipient_id: RecipientId,
        delivery: &RecipientDelivery,
    ) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;
        let target = campaign_recipients::table
            .filter(campaign_recipients::id.eq(recipient_id.get()))
            .filter(campaign_recipients::status.eq(RecipientStatus::Pending.as_str()));
        let affected = diesel::update(target)
            .set(DeliveryChangeset::new(delivery, Utc::now().naive_utc()))
            .execute(&mut conn)?;
        Ok(affected > 0)
    }

    fn advance_recipient_status(
        &self,
        recipient_id: RecipientId,
        from: RecipientStatus,
        to: RecipientStatus,
        error_message: Option<&str>,
    ) -> RepositoryResult<bool> {
        let mut conn = self.conn()?;
        let target = campaign_recipients::table
            .filter(campaign_recipients::id.eq(recipient_id.get()))
            .filter(campaign_recipients::status.eq(from.as_str()));
        let now = Utc::now().naive_utc();
        let affected = match error_message {
            Some(message) => diesel::update(target)
                .set((
                    campaign_recipients::status.eq(to.as_str()),
                    campaign_recipients::error_message.eq(Some(message)),
                    campaign_recipients::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
            None => diesel::update(target)
                .set((
                    campaign_recipients::status.eq(to.as_str()),
                    campaign_recipients::updated_at.eq(now),
                ))
                .execute(&mut conn)?,
        };
        Ok(affected > 0)
    }

    fn update_campaign_counters(
        &self,
        id: CampaignId,
        counters: &CampaignCounters,
    ) -> RepositoryResult<()> {
        let mut conn = self.conn()?;
        diesel::update(whatsapp_campaigns::table.find(id.get()))
            .set(CampaignCountersChangeset::new(counters, Utc::now().naive_utc()))
            .execute(&mut conn)?;
        Ok(())
    }
}
