use chrono::NaiveDateTime;

use crate::db::{DbConnection, DbPool};
use crate::domain::accounts_payable::{
    AccountPayable, NewAccountPayable, PayableFields, PayableStatus, StatusTotal,
};
use crate::domain::audit_log::{AuditAction, AuditLog, EntityType, NewAuditLog};
use crate::domain::auth::RevokedToken;
use crate::domain::campaign::{
    Campaign, CampaignCounters, CampaignFields, CampaignStatus, NewCampaign, NewRecipient,
    Recipient, RecipientDelivery, RecipientStatus, StatusCounts,
};
use crate::domain::case::{
    Case, CaseListItem, CaseMovement, CaseStatus, CourtSync, NewCase, UpdateCase,
};
use crate::domain::case_part::{CasePart, NewCasePart, UpdateCasePart};
use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::company::{Company, NewCompany, SubscriptionUpdate, UpdateCompany};
use crate::domain::dashboard::{DashboardStats, RecentActivity};
use crate::domain::financial::{
    FinancialSummary, FinancialTransaction, Installment, NewTransaction, TransactionDetails,
    TransactionFields, TransactionListItem, TransactionType, UpdateInstallment,
};
use crate::domain::lgpd::{
    ConsentLog, ConsentType, DataRequest, DataRequestWithUser, DataStatistics, NewConsentLog,
    NewDataRequest, RequestProcessing, RequestType,
};
use crate::domain::schedule::{
    ConflictQuery, EventFields, EventType, NewScheduleEvent, ScheduleEvent,
};
use crate::domain::tag::{NewTag, Tag, UpdateTag};
use crate::domain::token_share::{NewTokenShare, TokenShare, TokenShareView, UpdateTokenShare};
use crate::domain::types::{
    CampaignId, CaseId, CasePartId, ClientId, CompanyId, DataRequestId, EventId, InstallmentId,
    PayableId, RecipientId, TagId, TokenShareId, TransactionId, UserId,
};
use crate::domain::user::{NewUser, UpdateUser, User, UserSummary};
use crate::repository::errors::RepositoryResult;

pub mod accounts_payable;
pub mod audit_log;
pub mod campaign;
pub mod case;
pub mod case_part;
pub mod client;
pub mod company;
pub mod dashboard;
pub mod errors;
pub mod financial;
pub mod lgpd;
#[cfg(feature = "test-mocks")]
pub mod mock;
pub mod schedule;
pub mod tag;
pub mod token_share;
pub mod user;

/// Diesel-backed implementation of every repository trait.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool,
}

impl DieselRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(crate::db::get_connection(&self.pool)?)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pagination {
    pub page: usize,
    pub per_page: usize,
}

impl Pagination {
    pub fn offset(&self) -> i64 {
        (self.page.max(1) as i64 - 1) * self.per_page as i64
    }

    pub fn limit(&self) -> i64 {
        self.per_page as i64
    }
}

/// Builds a `%term%` pattern for `LIKE` filters.
pub(crate) fn like_pattern(term: &str) -> String {
    format!("%{}%", term.trim())
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyListQuery {
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl CompanyListQuery {
    pub fn new() -> Self {
        Self {
            search: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

impl Default for CompanyListQuery {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserListQuery {
    pub company_id: CompanyId,
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl UserListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            search: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TagListQuery {
    pub company_id: CompanyId,
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl TagListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            search: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

/// Filters for the client list. Only active clients are listed.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientListQuery {
    pub company_id: CompanyId,
    pub search: Option<String>,
    pub tag_id: Option<TagId>,
    pub created_from: Option<NaiveDateTime>,
    pub created_to: Option<NaiveDateTime>,
    pub pagination: Option<Pagination>,
}

impl ClientListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            search: None,
            tag_id: None,
            created_from: None,
            created_to: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn tag(mut self, tag_id: TagId) -> Self {
        self.tag_id = Some(tag_id);
        self
    }

    pub fn created_between(
        mut self,
        from: Option<NaiveDateTime>,
        to: Option<NaiveDateTime>,
    ) -> Self {
        self.created_from = from;
        self.created_to = to;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CaseListQuery {
    pub company_id: CompanyId,
    pub search: Option<String>,
    pub status: Option<CaseStatus>,
    pub pagination: Option<Pagination>,
}

impl CaseListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            search: None,
            status: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: CaseStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventListQuery {
    pub company_id: CompanyId,
    pub search: Option<String>,
    pub event_type: Option<EventType>,
    pub completed: Option<bool>,
    pub client_id: Option<ClientId>,
    pub case_id: Option<CaseId>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub pagination: Option<Pagination>,
}

impl EventListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            search: None,
            event_type: None,
            completed: None,
            client_id: None,
            case_id: None,
            start: None,
            end: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn event_type(mut self, event_type: EventType) -> Self {
        self.event_type = Some(event_type);
        self
    }

    pub fn completed(mut self, completed: bool) -> Self {
        self.completed = Some(completed);
        self
    }

    pub fn client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn case(mut self, case_id: CaseId) -> Self {
        self.case_id = Some(case_id);
        self
    }

    pub fn between(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransactionListQuery {
    pub company_id: CompanyId,
    pub search: Option<String>,
    pub transaction_type: Option<TransactionType>,
    pub client_id: Option<ClientId>,
    pub case_id: Option<CaseId>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub pagination: Option<Pagination>,
}

impl TransactionListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            search: None,
            transaction_type: None,
            client_id: None,
            case_id: None,
            start: None,
            end: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn transaction_type(mut self, transaction_type: TransactionType) -> Self {
        self.transaction_type = Some(transaction_type);
        self
    }

    pub fn client(mut self, client_id: ClientId) -> Self {
        self.client_id = Some(client_id);
        self
    }

    pub fn case(mut self, case_id: CaseId) -> Self {
        self.case_id = Some(case_id);
        self
    }

    pub fn between(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PayableListQuery {
    pub company_id: CompanyId,
    pub search: Option<String>,
    pub status: Option<PayableStatus>,
    pub category: Option<String>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub pagination: Option<Pagination>,
}

impl PayableListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            search: None,
            status: None,
            category: None,
            start: None,
            end: None,
            pagination: None,
        }
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn status(mut self, status: PayableStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn between(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AuditLogQuery {
    pub company_id: CompanyId,
    pub entity_type: Option<EntityType>,
    pub entity_id: Option<i32>,
    pub action: Option<AuditAction>,
    pub user_id: Option<UserId>,
    pub start: Option<NaiveDateTime>,
    pub end: Option<NaiveDateTime>,
    pub search: Option<String>,
    pub pagination: Option<Pagination>,
}

impl AuditLogQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            entity_type: None,
            entity_id: None,
            action: None,
            user_id: None,
            start: None,
            end: None,
            search: None,
            pagination: None,
        }
    }

    pub fn entity(mut self, entity_type: EntityType, entity_id: i32) -> Self {
        self.entity_type = Some(entity_type);
        self.entity_id = Some(entity_id);
        self
    }

    pub fn entity_type(mut self, entity_type: EntityType) -> Self {
        self.entity_type = Some(entity_type);
        self
    }

    pub fn action(mut self, action: AuditAction) -> Self {
        self.action = Some(action);
        self
    }

    pub fn user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn between(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start = start;
        self.end = end;
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignListQuery {
    pub company_id: CompanyId,
    pub status: Option<CampaignStatus>,
    pub pagination: Option<Pagination>,
}

impl CampaignListQuery {
    pub fn new(company_id: CompanyId) -> Self {
        Self {
            company_id,
            status: None,
            pagination: None,
        }
    }

    pub fn status(mut self, status: CampaignStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecipientListQuery {
    pub campaign_id: CampaignId,
    pub status: Option<RecipientStatus>,
    pub pagination: Option<Pagination>,
}

impl RecipientListQuery {
    pub fn new(campaign_id: CampaignId) -> Self {
        Self {
            campaign_id,
            status: None,
            pagination: None,
        }
    }

    pub fn status(mut self, status: RecipientStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn paginate(mut self, page: usize, per_page: usize) -> Self {
        self.pagination = Some(Pagination { page, per_page });
        self
    }
}

pub trait CompanyReader {
    fn get_company_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>>;
    fn list_companies(&self, query: CompanyListQuery) -> RepositoryResult<(usize, Vec<Company>)>;
}

pub trait CompanyWriter {
    /// Inserts the company and its first user in one transaction.
    fn create_company_with_admin(
        &self,
        company: &NewCompany,
        admin: &NewUser,
    ) -> RepositoryResult<(Company, User)>;
    fn update_company(&self, id: CompanyId, updates: &UpdateCompany) -> RepositoryResult<Company>;
    fn update_subscription(
        &self,
        id: CompanyId,
        update: &SubscriptionUpdate,
    ) -> RepositoryResult<Company>;
    fn set_company_api_key(&self, id: CompanyId, api_key: &str) -> RepositoryResult<()>;
    fn delete_company(&self, id: CompanyId) -> RepositoryResult<()>;
}

pub trait UserReader {
    fn get_user_by_id(&self, id: UserId) -> RepositoryResult<Option<User>>;
    fn get_user_by_email(&self, email: &str) -> RepositoryResult<Option<User>>;
    fn get_user_by_reset_token(&self, token: &str) -> RepositoryResult<Option<User>>;
    fn get_user_by_verification_token(&self, token: &str) -> RepositoryResult<Option<User>>;
    fn list_users(&self, query: UserListQuery) -> RepositoryResult<(usize, Vec<User>)>;
    fn list_active_users_by_ids(
        &self,
        company_id: CompanyId,
        ids: &[UserId],
    ) -> RepositoryResult<Vec<User>>;
    fn is_token_revoked(&self, jti: &str) -> RepositoryResult<bool>;
}

pub trait UserWriter {
    fn create_user(&self, user: &NewUser) -> RepositoryResult<User>;
    fn update_user(&self, id: UserId, updates: &UpdateUser) -> RepositoryResult<User>;
    fn delete_user(&self, id: UserId) -> RepositoryResult<()>;
    fn set_user_active(&self, id: UserId, active: bool) -> RepositoryResult<User>;
    fn record_login_attempts(
        &self,
        id: UserId,
        failed_attempts: i32,
        locked_until: Option<NaiveDateTime>,
    ) -> RepositoryResult<()>;
    fn set_reset_token(
        &self,
        id: UserId,
        token: Option<&str>,
        expiry: Option<NaiveDateTime>,
    ) -> RepositoryResult<()>;
    /// Stores the new hash and clears any reset token.
    fn reset_password(&self, id: UserId, password_hash: &str) -> RepositoryResult<()>;
    fn set_email_verification(
        &self,
        id: UserId,
        verified: bool,
        token: Option<&str>,
        expiry: Option<NaiveDateTime>,
    ) -> RepositoryResult<()>;
    fn invalidate_tokens(&self, id: UserId, at: NaiveDateTime) -> RepositoryResult<()>;
    fn revoke_token(&self, token: &RevokedToken) -> RepositoryResult<()>;
}

pub trait TagReader {
    fn get_tag_by_id(&self, id: TagId, company_id: CompanyId) -> RepositoryResult<Option<Tag>>;
    fn get_tag_by_name(&self, company_id: CompanyId, name: &str) -> RepositoryResult<Option<Tag>>;
    fn list_tags(&self, query: TagListQuery) -> RepositoryResult<(usize, Vec<Tag>)>;
    /// Number of the given tags owned by the company.
    fn count_company_tags(&self, company_id: CompanyId, ids: &[TagId]) -> RepositoryResult<usize>;
}

pub trait TagWriter {
    fn create_tag(&self, tag: &NewTag) -> RepositoryResult<Tag>;
    fn update_tag(
        &self,
        id: TagId,
        company_id: CompanyId,
        updates: &UpdateTag,
    ) -> RepositoryResult<Tag>;
    fn delete_tag(&self, id: TagId, company_id: CompanyId) -> RepositoryResult<()>;
}

pub trait ClientReader {
    fn get_client_by_id(
        &self,
        id: ClientId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<Client>>;
    fn get_client_by_cpf(
        &self,
        company_id: CompanyId,
        cpf: &str,
    ) -> RepositoryResult<Option<Client>>;
    fn get_client_by_name(
        &self,
        company_id: CompanyId,
        name: &str,
    ) -> RepositoryResult<Option<Client>>;
    fn list_clients(&self, query: ClientListQuery) -> RepositoryResult<(usize, Vec<Client>)>;
    /// Active clients whose name or CPF matches, ordered by name.
    fn search_clients(
        &self,
        company_id: CompanyId,
        term: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<Client>>;
    fn list_clients_with_phone(
        &self,
        company_id: CompanyId,
        tag_id: Option<TagId>,
        limit: usize,
    ) -> RepositoryResult<Vec<Client>>;
}

pub trait ClientWriter {
    fn create_client(&self, client: &NewClient) -> RepositoryResult<Client>;
    fn update_client(
        &self,
        id: ClientId,
        company_id: CompanyId,
        updates: &UpdateClient,
    ) -> RepositoryResult<Client>;
    fn deactivate_client(&self, id: ClientId, company_id: CompanyId) -> RepositoryResult<()>;
}

pub trait CaseReader {
    fn get_case_by_id(&self, id: CaseId, company_id: CompanyId) -> RepositoryResult<Option<Case>>;
    fn get_case_by_process_number(
        &self,
        company_id: CompanyId,
        process_number: &str,
    ) -> RepositoryResult<Option<Case>>;
    fn list_cases(&self, query: CaseListQuery) -> RepositoryResult<(usize, Vec<CaseListItem>)>;
    fn list_client_cases(&self, client_id: ClientId) -> RepositoryResult<Vec<Case>>;
    /// Movements of the case, newest first.
    fn list_case_movements(&self, case_id: CaseId) -> RepositoryResult<Vec<CaseMovement>>;
    /// Open deadlines plus those completed after `completed_since`.
    fn list_deadlines(
        &self,
        company_id: CompanyId,
        completed_since: NaiveDateTime,
    ) -> RepositoryResult<Vec<CaseListItem>>;
    fn list_pending_updates(&self, company_id: CompanyId) -> RepositoryResult<Vec<CaseListItem>>;
    fn search_cases(
        &self,
        company_id: CompanyId,
        term: &str,
        limit: usize,
    ) -> RepositoryResult<Vec<Case>>;
}

pub trait CaseWriter {
    /// Inserts the case with its movements and parts in one transaction.
    fn create_case(&self, case: &NewCase) -> RepositoryResult<Case>;
    fn update_case(
        &self,
        id: CaseId,
        company_id: CompanyId,
        updates: &UpdateCase,
    ) -> RepositoryResult<Case>;
    fn delete_case(&self, id: CaseId, company_id: CompanyId) -> RepositoryResult<()>;
    fn replace_case_movements(&self, id: CaseId, sync: &CourtSync) -> RepositoryResult<Case>;
    fn acknowledge_case(
        &self,
        id: CaseId,
        company_id: CompanyId,
        at: NaiveDateTime,
    ) -> RepositoryResult<()>;
}

pub trait CasePartReader {
    fn list_case_parts(&self, case_id: CaseId) -> RepositoryResult<Vec<CasePart>>;
    fn get_case_part(
        &self,
        id: CasePartId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<CasePart>>;
}

pub trait CasePartWriter {
    fn create_case_part(
        &self,
        company_id: CompanyId,
        case_id: CaseId,
        part: &NewCasePart,
    ) -> RepositoryResult<CasePart>;
    fn update_case_part(
        &self,
        id: CasePartId,
        company_id: CompanyId,
        part: &UpdateCasePart,
    ) -> RepositoryResult<CasePart>;
    fn delete_case_part(&self, id: CasePartId, company_id: CompanyId) -> RepositoryResult<()>;
}

pub trait EventReader {
    fn get_event_by_id(
        &self,
        id: EventId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<ScheduleEvent>>;
    fn list_events(&self, query: EventListQuery) -> RepositoryResult<(usize, Vec<ScheduleEvent>)>;
    /// Non-completed events sharing an assignee and overlapping the window.
    fn find_conflicting_events(&self, query: &ConflictQuery)
    -> RepositoryResult<Vec<ScheduleEvent>>;
    fn list_upcoming_events(
        &self,
        company_id: CompanyId,
        after: NaiveDateTime,
        limit: usize,
    ) -> RepositoryResult<Vec<ScheduleEvent>>;
    fn find_case_deadline_event(
        &self,
        company_id: CompanyId,
        case_id: CaseId,
    ) -> RepositoryResult<Option<ScheduleEvent>>;
}

pub trait EventWriter {
    fn create_event(&self, event: &NewScheduleEvent) -> RepositoryResult<ScheduleEvent>;
    /// Rewrites the event and replaces its assignees.
    fn update_event(
        &self,
        id: EventId,
        company_id: CompanyId,
        fields: &EventFields,
    ) -> RepositoryResult<ScheduleEvent>;
    fn delete_event(&self, id: EventId, company_id: CompanyId) -> RepositoryResult<()>;
    fn set_event_completed(
        &self,
        id: EventId,
        company_id: CompanyId,
        completed: bool,
    ) -> RepositoryResult<ScheduleEvent>;
}

pub trait TransactionReader {
    fn get_transaction(
        &self,
        id: TransactionId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<TransactionDetails>>;
    fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> RepositoryResult<(usize, Vec<TransactionListItem>)>;
    /// Totals over the filtered set, ignoring pagination.
    fn summarize_transactions(
        &self,
        query: &TransactionListQuery,
    ) -> RepositoryResult<FinancialSummary>;
    fn get_installment(
        &self,
        id: InstallmentId,
        transaction_id: TransactionId,
    ) -> RepositoryResult<Option<Installment>>;
}

pub trait TransactionWriter {
    /// Inserts the transaction and its installments in one transaction.
    fn create_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> RepositoryResult<FinancialTransaction>;
    fn update_transaction(
        &self,
        id: TransactionId,
        company_id: CompanyId,
        fields: &TransactionFields,
    ) -> RepositoryResult<FinancialTransaction>;
    fn delete_transaction(&self, id: TransactionId, company_id: CompanyId) -> RepositoryResult<()>;
    fn update_installment(
        &self,
        id: InstallmentId,
        updates: &UpdateInstallment,
    ) -> RepositoryResult<Installment>;
}

pub trait PayableReader {
    fn get_payable(
        &self,
        id: PayableId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<AccountPayable>>;
    fn list_payables(
        &self,
        query: PayableListQuery,
    ) -> RepositoryResult<(usize, Vec<AccountPayable>)>;
    fn payable_totals_by_status(
        &self,
        company_id: CompanyId,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> RepositoryResult<Vec<StatusTotal>>;
}

pub trait PayableWriter {
    fn create_payable(&self, payable: &NewAccountPayable) -> RepositoryResult<AccountPayable>;
    fn update_payable(
        &self,
        id: PayableId,
        company_id: CompanyId,
        fields: &PayableFields,
    ) -> RepositoryResult<AccountPayable>;
    fn delete_payable(&self, id: PayableId, company_id: CompanyId) -> RepositoryResult<()>;
    /// Marks the entry paid and inserts the next occurrence, atomically.
    fn mark_payable_paid(
        &self,
        id: PayableId,
        company_id: CompanyId,
        paid_date: NaiveDateTime,
        next: Option<&NewAccountPayable>,
    ) -> RepositoryResult<(AccountPayable, Option<AccountPayable>)>;
}

pub trait AuditLogReader {
    fn list_audit_logs(&self, query: AuditLogQuery) -> RepositoryResult<(usize, Vec<AuditLog>)>;
    /// Distinct authors of the company's audit entries.
    fn list_audit_users(&self, company_id: CompanyId) -> RepositoryResult<Vec<UserSummary>>;
}

pub trait AuditLogWriter {
    fn create_audit_log(&self, entry: &NewAuditLog) -> RepositoryResult<()>;
    /// Deletes up to `batch` entries older than `before`, returning the count.
    fn delete_audit_logs_before(
        &self,
        before: NaiveDateTime,
        batch: i64,
    ) -> RepositoryResult<usize>;
}

pub trait ConsentReader {
    fn list_user_consents(&self, user_id: UserId) -> RepositoryResult<Vec<ConsentLog>>;
}

pub trait ConsentWriter {
    fn create_consent(&self, consent: &NewConsentLog) -> RepositoryResult<ConsentLog>;
    /// Revokes the latest active consent of the type, if any.
    fn revoke_latest_consent(
        &self,
        user_id: UserId,
        consent_type: ConsentType,
        at: NaiveDateTime,
    ) -> RepositoryResult<Option<ConsentLog>>;
}

pub trait DataRequestReader {
    fn get_data_request(&self, id: DataRequestId) -> RepositoryResult<Option<DataRequest>>;
    fn has_open_request(
        &self,
        user_id: UserId,
        request_type: RequestType,
    ) -> RepositoryResult<bool>;
    fn list_user_requests(&self, user_id: UserId) -> RepositoryResult<Vec<DataRequest>>;
    fn list_open_requests(
        &self,
        company_id: CompanyId,
    ) -> RepositoryResult<Vec<DataRequestWithUser>>;
    fn data_statistics(
        &self,
        user_id: UserId,
        company_id: Option<CompanyId>,
    ) -> RepositoryResult<DataStatistics>;
}

pub trait DataRequestWriter {
    fn create_data_request(&self, request: &NewDataRequest) -> RepositoryResult<DataRequest>;
    fn process_data_request(
        &self,
        id: DataRequestId,
        processing: &RequestProcessing,
    ) -> RepositoryResult<DataRequest>;
    /// Completes a deletion request and anonymizes its requester and their
    /// consent records in one transaction. Returns the request and the number
    /// of consent records rewritten.
    fn complete_deletion_request(
        &self,
        id: DataRequestId,
        processing: &RequestProcessing,
        name: &str,
        email: &str,
    ) -> RepositoryResult<(DataRequest, usize)>;
}

pub trait CampaignReader {
    fn get_campaign(
        &self,
        id: CampaignId,
        company_id: CompanyId,
    ) -> RepositoryResult<Option<Campaign>>;
    /// Lookup without tenant scope, for the notifier worker.
    fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>>;
    fn list_campaigns(&self, query: CampaignListQuery) -> RepositoryResult<(usize, Vec<Campaign>)>;
    fn list_recipients(
        &self,
        query: RecipientListQuery,
    ) -> RepositoryResult<(usize, Vec<Recipient>)>;
    fn get_recipient(&self, id: RecipientId) -> RepositoryResult<Option<Recipient>>;
    fn get_recipient_by_message_id(&self, message_id: &str)
    -> RepositoryResult<Option<Recipient>>;
    fn recipient_status_counts(&self, campaign_id: CampaignId) -> RepositoryResult<StatusCounts>;
    fn company_campaign_counts(
        &self,
        company_id: CompanyId,
    ) -> RepositoryResult<(Vec<(CampaignStatus, i64)>, StatusCounts)>;
}

pub trait CampaignWriter {
    fn create_campaign(&self, campaign: &NewCampaign) -> RepositoryResult<Campaign>;
    /// Rewrites a draft, replacing its recipients when given.
    fn update_campaign(
        &self,
        id: CampaignId,
        company_id: CompanyId,
        fields: &CampaignFields,
        recipients: Option<&[NewRecipient]>,
    ) -> RepositoryResult<Campaign>;
    fn delete_campaign(&self, id: CampaignId, company_id: CompanyId) -> RepositoryResult<()>;
    fn set_campaign_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
        at: NaiveDateTime,
    ) -> RepositoryResult<Campaign>;
    /// Fails every pending recipient with the given message.
    fn fail_pending_recipients(
        &self,
        campaign_id: CampaignId,
        message: &str,
    ) -> RepositoryResult<usize>;
    /// Stores a send outcome on a recipient that is still pending. Returns
    /// `false` when the recipient was already settled.
    fn record_delivery(
        &self,
        recipient_id: RecipientId,
        delivery: &RecipientDelivery,
    ) -> RepositoryResult<bool>;
    /// Moves a recipient to `to` only if it is still in `from`.
    fn advance_recipient_status(
        &self,
        recipient_id: RecipientId,
        from: RecipientStatus,
        to: RecipientStatus,
        error_message: Option<&str>,
    ) -> RepositoryResult<bool>;
    fn update_campaign_counters(
        &self,
        id: CampaignId,
        counters: &CampaignCounters,
    ) -> RepositoryResult<()>;
}

pub trait TokenShareReader {
    fn get_token_share(&self, id: TokenShareId) -> RepositoryResult<Option<TokenShare>>;
    fn get_token_share_by_pair(
        &self,
        provider: CompanyId,
        client: CompanyId,
    ) -> RepositoryResult<Option<TokenShare>>;
    fn list_provided_shares(&self, provider: CompanyId) -> RepositoryResult<Vec<TokenShareView>>;
    fn get_received_share(&self, client: CompanyId) -> RepositoryResult<Option<TokenShareView>>;
}

pub trait TokenShareWriter {
    fn create_token_share(&self, share: &NewTokenShare) -> RepositoryResult<TokenShare>;
    fn update_token_share(
        &self,
        id: TokenShareId,
        updates: &UpdateTokenShare,
    ) -> RepositoryResult<TokenShare>;
    fn delete_token_share(&self, id: TokenShareId) -> RepositoryResult<()>;
}

pub trait DashboardReader {
    fn dashboard_stats(
        &self,
        company_id: CompanyId,
        now: NaiveDateTime,
    ) -> RepositoryResult<DashboardStats>;
    /// Latest rows of each kind, unmerged.
    fn recent_activities(
        &self,
        company_id: CompanyId,
        per_kind: usize,
    ) -> RepositoryResult<Vec<RecentActivity>>;
}
