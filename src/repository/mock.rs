//! Mock repository implementations for isolating services in tests.

use chrono::NaiveDateTime;
use mockall::mock;

use crate::domain::accounts_payable::{
    AccountPayable, NewAccountPayable, PayableFields, StatusTotal,
};
use crate::domain::audit_log::{AuditLog, NewAuditLog};
use crate::domain::auth::RevokedToken;
use crate::domain::campaign::{
    Campaign, CampaignCounters, CampaignFields, CampaignStatus, NewCampaign, NewRecipient,
    Recipient, RecipientDelivery, RecipientStatus, StatusCounts,
};
use crate::domain::case::{Case, CaseListItem, CaseMovement, CourtSync, NewCase, UpdateCase};
use crate::domain::case_part::{CasePart, NewCasePart, UpdateCasePart};
use crate::domain::client::{Client, NewClient, UpdateClient};
use crate::domain::company::{Company, NewCompany, SubscriptionUpdate, UpdateCompany};
use crate::domain::dashboard::{DashboardStats, RecentActivity};
use crate::domain::financial::{
    FinancialSummary, FinancialTransaction, Installment, NewTransaction, TransactionDetails,
    TransactionFields, TransactionListItem, UpdateInstallment,
};
use crate::domain::lgpd::{
    ConsentLog, ConsentType, DataRequest, DataRequestWithUser, DataStatistics, NewConsentLog,
    NewDataRequest, RequestProcessing, RequestType,
};
use crate::domain::schedule::{ConflictQuery, EventFields, NewScheduleEvent, ScheduleEvent};
use crate::domain::tag::{NewTag, Tag, UpdateTag};
use crate::domain::token_share::{NewTokenShare, TokenShare, TokenShareView, UpdateTokenShare};
use crate::domain::types::{
    CampaignId, CaseId, CasePartId, ClientId, CompanyId, DataRequestId, EventId, InstallmentId,
    PayableId, RecipientId, TagId, TokenShareId, TransactionId, UserId,
};
use crate::domain::user::{NewUser, UpdateUser, User, UserSummary};
use crate::repository::errors::RepositoryResult;
use crate::repository::{
    AuditLogQuery, AuditLogReader, AuditLogWriter, CampaignListQuery, CampaignReader,
    CampaignWriter, CaseListQuery, CasePartReader, CasePartWriter, CaseReader, CaseWriter,
    ClientListQuery, ClientReader, ClientWriter, CompanyListQuery, CompanyReader, CompanyWriter,
    ConsentReader, ConsentWriter, DashboardReader, DataRequestReader, DataRequestWriter,
    EventListQuery, EventReader, EventWriter, PayableListQuery, PayableReader, PayableWriter,
    RecipientListQuery, TagListQuery, TagReader, TagWriter, TokenShareReader, TokenShareWriter,
    TransactionListQuery, TransactionReader, TransactionWriter, UserListQuery, UserReader,
    UserWriter,
};

mock! {
    pub Repository {}

    impl CompanyReader for Repository {
        fn get_company_by_id(&self, id: CompanyId) -> RepositoryResult<Option<Company>>;
        fn list_companies(&self, query: CompanyListQuery) -> RepositoryResult<(usize, Vec<Company>)>;
    }

    impl CompanyWriter for Repository {
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

    impl UserReader for Repository {
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

    impl UserWriter for Repository {
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
        fn set_reset_token<'a>(
            &self,
            id: UserId,
            token: Option<&'a str>,
            expiry: Option<NaiveDateTime>,
        ) -> RepositoryResult<()>;
        fn reset_password(&self, id: UserId, password_hash: &str) -> RepositoryResult<()>;
        fn set_email_verification<'a>(
            &self,
            id: UserId,
            verified: bool,
            token: Option<&'a str>,
            expiry: Option<NaiveDateTime>,
        ) -> RepositoryResult<()>;
        fn invalidate_tokens(&self, id: UserId, at: NaiveDateTime) -> RepositoryResult<()>;
        fn revoke_token(&self, token: &RevokedToken) -> RepositoryResult<()>;
    }

    impl TagReader for Repository {
        fn get_tag_by_id(&self, id: TagId, company_id: CompanyId) -> RepositoryResult<Option<Tag>>;
        fn get_tag_by_name(&self, company_id: CompanyId, name: &str) -> RepositoryResult<Option<Tag>>;
        fn list_tags(&self, query: TagListQuery) -> RepositoryResult<(usize, Vec<Tag>)>;
        fn count_company_tags(&self, company_id: CompanyId, ids: &[TagId]) -> RepositoryResult<usize>;
    }

    impl TagWriter for Repository {
        fn create_tag(&self, tag: &NewTag) -> RepositoryResult<Tag>;
        fn update_tag(
            &self,
            id: TagId,
            company_id: CompanyId,
            updates: &UpdateTag,
        ) -> RepositoryResult<Tag>;
        fn delete_tag(&self, id: TagId, company_id: CompanyId) -> RepositoryResult<()>;
    }

    impl ClientReader for Repository {
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

    impl ClientWriter for Repository {
        fn create_client(&self, client: &NewClient) -> RepositoryResult<Client>;
        fn update_client(
            &self,
            id: ClientId,
            company_id: CompanyId,
            updates: &UpdateClient,
        ) -> RepositoryResult<Client>;
        fn deactivate_client(&self, id: ClientId, company_id: CompanyId) -> RepositoryResult<()>;
    }

    impl CaseReader for Repository {
        fn get_case_by_id(&self, id: CaseId, company_id: CompanyId) -> RepositoryResult<Option<Case>>;
        fn get_case_by_process_number(
            &self,
            company_id: CompanyId,
            process_number: &str,
        ) -> RepositoryResult<Option<Case>>;
        fn list_cases(&self, query: CaseListQuery) -> RepositoryResult<(usize, Vec<CaseListItem>)>;
        fn list_client_cases(&self, client_id: ClientId) -> RepositoryResult<Vec<Case>>;
        fn list_case_movements(&self, case_id: CaseId) -> RepositoryResult<Vec<CaseMovement>>;
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

    impl CaseWriter for Repository {
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

    impl CasePartReader for Repository {
        fn list_case_parts(&self, case_id: CaseId) -> RepositoryResult<Vec<CasePart>>;
        fn get_case_part(
            &self,
            id: CasePartId,
            company_id: CompanyId,
        ) -> RepositoryResult<Option<CasePart>>;
    }

    impl CasePartWriter for Repository {
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

    impl EventReader for Repository {
        fn get_event_by_id(
            &self,
            id: EventId,
            company_id: CompanyId,
        ) -> RepositoryResult<Option<ScheduleEvent>>;
        fn list_events(&self, query: EventListQuery) -> RepositoryResult<(usize, Vec<ScheduleEvent>)>;
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

    impl EventWriter for Repository {
        fn create_event(&self, event: &NewScheduleEvent) -> RepositoryResult<ScheduleEvent>;
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

    impl TransactionReader for Repository {
        fn get_transaction(
            &self,
            id: TransactionId,
            company_id: CompanyId,
        ) -> RepositoryResult<Option<TransactionDetails>>;
        fn list_transactions(
            &self,
            query: TransactionListQuery,
        ) -> RepositoryResult<(usize, Vec<TransactionListItem>)>;
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

    impl TransactionWriter for Repository {
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

    impl PayableReader for Repository {
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

    impl PayableWriter for Repository {
        fn create_payable(&self, payable: &NewAccountPayable) -> RepositoryResult<AccountPayable>;
        fn update_payable(
            &self,
            id: PayableId,
            company_id: CompanyId,
            fields: &PayableFields,
        ) -> RepositoryResult<AccountPayable>;
        fn delete_payable(&self, id: PayableId, company_id: CompanyId) -> RepositoryResult<()>;
        fn mark_payable_paid<'a>(
            &self,
            id: PayableId,
            company_id: CompanyId,
            paid_date: NaiveDateTime,
            next: Option<&'a NewAccountPayable>,
        ) -> RepositoryResult<(AccountPayable, Option<AccountPayable>)>;
    }

    impl AuditLogReader for Repository {
        fn list_audit_logs(&self, query: AuditLogQuery) -> RepositoryResult<(usize, Vec<AuditLog>)>;
        fn list_audit_users(&self, company_id: CompanyId) -> RepositoryResult<Vec<UserSummary>>;
    }

    impl AuditLogWriter for Repository {
        fn create_audit_log(&self, entry: &NewAuditLog) -> RepositoryResult<()>;
        fn delete_audit_logs_before(
            &self,
            before: NaiveDateTime,
            batch: i64,
        ) -> RepositoryResult<usize>;
    }

    impl ConsentReader for Repository {
        fn list_user_consents(&self, user_id: UserId) -> RepositoryResult<Vec<ConsentLog>>;
    }

    impl ConsentWriter for Repository {
        fn create_consent(&self, consent: &NewConsentLog) -> RepositoryResult<ConsentLog>;
        fn revoke_latest_consent(
            &self,
            user_id: UserId,
            consent_type: ConsentType,
            at: NaiveDateTime,
        ) -> RepositoryResult<Option<ConsentLog>>;
    }

    impl DataRequestReader for Repository {
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

    impl DataRequestWriter for Repository {
        fn create_data_request(&self, request: &NewDataRequest) -> RepositoryResult<DataRequest>;
        fn process_data_request(
            &self,
            id: DataRequestId,
            processing: &RequestProcessing,
        ) -> RepositoryResult<DataRequest>;
        fn complete_deletion_request(
            &self,
            id: DataRequestId,
            processing: &RequestProcessing,
            name: &str,
            email: &str,
        ) -> RepositoryResult<(DataRequest, usize)>;
    }

    impl CampaignReader for Repository {
        fn get_campaign(
            &self,
            id: CampaignId,
            company_id: CompanyId,
        ) -> RepositoryResult<Option<Campaign>>;
        fn get_campaign_by_id(&self, id: CampaignId) -> RepositoryResult<Option<Campaign>>;
        fn list_campaigns(&self, query: CampaignListQuery) -> RepositoryResult<(usize, Vec<Campaign>)>;
        fn list_recipients(
            &self,
            query: RecipientListQuery,
        ) -> RepositoryResult<(usize, Vec<Recipient>)>;
        fn get_recipient(&self, id: RecipientId) -> RepositoryResult<Option<Recipient>>;
        fn get_recipient_by_message_id(
            &self,
            message_id: &str,
        ) -> RepositoryResult<Option<Recipient>>;
        fn recipient_status_counts(&self, campaign_id: CampaignId) -> RepositoryResult<StatusCounts>;
        fn company_campaign_counts(
            &self,
            company_id: CompanyId,
        ) -> RepositoryResult<(Vec<(CampaignStatus, i64)>, StatusCounts)>;
    }

    impl CampaignWriter for Repository {
        fn create_campaign(&self, campaign: &NewCampaign) -> RepositoryResult<Campaign>;
        fn update_campaign<'a>(
            &self,
            id: CampaignId,
            company_id: CompanyId,
            fields: &CampaignFields,
            recipients: Option<&'a [NewRecipient]>,
        ) -> RepositoryResult<Campaign>;
        fn delete_campaign(&self, id: CampaignId, company_id: CompanyId) -> RepositoryResult<()>;
        fn set_campaign_status(
            &self,
            id: CampaignId,
            status: CampaignStatus,
            at: NaiveDateTime,
        ) -> RepositoryResult<Campaign>;
        fn fail_pending_recipients(
            &self,
            campaign_id: CampaignId,
            message: &str,
        ) -> RepositoryResult<usize>;
        fn record_delivery(
            &self,
            recipient_id: RecipientId,
            delivery: &RecipientDelivery,
        ) -> RepositoryResult<bool>;
        fn advance_recipient_status<'a>(
            &self,
            recipient_id: RecipientId,
            from: RecipientStatus,
            to: RecipientStatus,
            error_message: Option<&'a str>,
        ) -> RepositoryResult<bool>;
        fn update_campaign_counters(
            &self,
            id: CampaignId,
            counters: &CampaignCounters,
        ) -> RepositoryResult<()>;
    }

    impl TokenShareReader for Repository {
        fn get_token_share(&self, id: TokenShareId) -> RepositoryResult<Option<TokenShare>>;
        fn get_token_share_by_pair(
            &self,
            provider: CompanyId,
            client: CompanyId,
        ) -> RepositoryResult<Option<TokenShare>>;
        fn list_provided_shares(&self, provider: CompanyId) -> RepositoryResult<Vec<TokenShareView>>;
        fn get_received_share(&self, client: CompanyId) -> RepositoryResult<Option<TokenShareView>>;
    }

    impl TokenShareWriter for Repository {
        fn create_token_share(&self, share: &NewTokenShare) -> RepositoryResult<TokenShare>;
        fn update_token_share(
            &self,
            id: TokenShareId,
            updates: &UpdateTokenShare,
        ) -> RepositoryResult<TokenShare>;
        fn delete_token_share(&self, id: TokenShareId) -> RepositoryResult<()>;
    }

    impl DashboardReader for Repository {
        fn dashboard_stats(
            &self,
            company_id: CompanyId,
            now: NaiveDateTime,
        ) -> RepositoryResult<DashboardStats>;
        fn recent_activities(
            &self,
            company_id: CompanyId,
            per_kind: usize,
        ) -> RepositoryResult<Vec<RecentActivity>>;
    }
}
