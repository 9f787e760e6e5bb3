use chrono::NaiveDateTime;
use diesel::prelude::*;

use crate::domain::campaign::{
    Campaign as DomainCampaign, CampaignCounters, CampaignFields,
    NewRecipient as DomainNewRecipient, Recipient as DomainRecipient, RecipientDelivery,
};
use crate::domain::types::{
    CampaignId, CampaignName, ClientId, CompanyId, RecipientId, TypeConstraintError, UserId,
};

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::whatsapp_campaigns)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Campaign {
    pub id: i32,
    pub company_id: i32,
    pub name: String,
    pub template_name: String,
    pub language: String,
    pub status: String,
    pub total_recipients: i32,
    pub sent_count: i32,
    pub delivered_count: i32,
    pub read_count: i32,
    pub failed_count: i32,
    pub created_by: Option<i32>,
    pub started_at: Option<NaiveDateTime>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::whatsapp_campaigns)]
pub struct NewCampaign<'a> {
    pub company_id: i32,
    pub name: &'a str,
    pub template_name: &'a str,
    pub language: &'a str,
    pub total_recipients: i32,
    pub created_by: Option<i32>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::whatsapp_campaigns)]
pub struct CampaignCountersChangeset {
    pub sent_count: i32,
    pub delivered_count: i32,
    pub read_count: i32,
    pub failed_count: i32,
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Identifiable, Queryable, Selectable)]
#[diesel(table_name = crate::schema::campaign_recipients)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct Recipient {
    pub id: i32,
    pub campaign_id: i32,
    pub client_id: Option<i32>,
    pub phone: String,
    pub name: Option<String>,
    pub status: String,
    pub message_id: Option<String>,
    pub error_message: Option<String>,
    pub sent_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = crate::schema::campaign_recipients)]
pub struct NewRecipient<'a> {
    pub campaign_id: i32,
    pub client_id: Option<i32>,
    pub phone: &'a str,
    pub name: Option<&'a str>,
}

#[derive(AsChangeset)]
#[diesel(table_name = crate::schema::campaign_recipients)]
pub struct DeliveryChangeset<'a> {
    pub status: &'a str,
    pub message_id: Option<&'a str>,
    pub error_message: Option<&'a str>,
    pub sent_at: Option<NaiveDateTime>,
    pub updated_at: NaiveDateTime,
}

impl TryFrom<Campaign> for DomainCampaign {
    type Error = TypeConstraintError;

    fn try_from(row: Campaign) -> Result<Self, Self::Error> {
        Ok(Self {
            id: CampaignId::new(row.id)?,
            company_id: CompanyId::new(row.company_id)?,
            name: CampaignName::new(row.name)?,
            template_name: row.template_name,
            language: row.language,
            status: row.status.parse()?,
            total_recipients: row.total_recipients,
            sent_count: row.sent_count,
            delivered_count: row.delivered_count,
            read_count: row.read_count,
            failed_count: row.failed_count,
            created_by: row.created_by.map(UserId::new).transpose()?,
            started_at: row.started_at,
            completed_at: row.completed_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl TryFrom<Recipient> for DomainRecipient {
    type Error = TypeConstraintError;

    fn try_from(row: Recipient) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RecipientId::new(row.id)?,
            campaign_id: CampaignId::new(row.campaign_id)?,
            client_id: row.client_id.map(ClientId::new).transpose()?,
            phone: row.phone,
            name: row.name,
            status: row.status.parse()?,
            message_id: row.message_id,
            error_message: row.error_message,
            sent_at: row.sent_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl<'a> NewCampaign<'a> {
    pub fn new(
        company_id: CompanyId,
        created_by: Option<UserId>,
        fields: &'a CampaignFields,
        total_recipients: usize,
    ) -> Self {
        Self {
            company_id: company_id.get(),
            name: fields.name.as_str(),
            template_name: fields.template_name.as_str(),
            language: fields.language.as_str(),
            total_recipients: i32::try_from(total_recipients).unwrap_or(i32::MAX),
            created_by: created_by.map(UserId::get),
        }
    }
}

impl<'a> NewRecipient<'a> {
    pub fn new(campaign_id: CampaignId, recipient: &'a DomainNewRecipient) -> Self {
        Self {
            campaign_id: campaign_id.get(),
            client_id: recipient.client_id.map(ClientId::get),
            phone: recipient.phone.as_str(),
            name: recipient.name.as_deref(),
        }
    }
}

impl CampaignCountersChangeset {
    pub fn new(counters: &CampaignCounters, now: NaiveDateTime) -> Self {
        Self {
            sent_count: counters.sent_count,
            delivered_count: counters.delivered_count,
            read_count: counters.read_count,
            failed_count: counters.failed_count,
            updated_at: now,
        }
    }
}

impl<'a> DeliveryChangeset<'a> {
    pub fn new(delivery: &'a RecipientDelivery, now: NaiveDateTime) -> Self {
        Self {
            status: delivery.status.as_str(),
            message_id: delivery.message_id.as_deref(),
            error_message: delivery.error_message.as_deref(),
            sent_at: delivery.sent_at,
            updated_at: now,
        }
    }
}
