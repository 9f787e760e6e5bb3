use chrono::{Duration, NaiveDateTime, NaiveTime};
use diesel::prelude::*;

use crate::domain::case::CaseStatus;
use crate::domain::dashboard::{ActivityKind, DashboardStats, RecentActivity};
use crate::domain::financial::TransactionType;
use crate::domain::import::format_cents;
use crate::repository::errors::RepositoryResult;
use crate::repository::{DashboardReader, DieselRepository};
use crate::schema::{case_movements, cases, clients, financial_transactions, schedule_events};

/// Window counted as "upcoming" for deadlines.
const DEADLINE_WINDOW_DAYS: i64 = 7;

impl DashboardReader for DieselRepository {
    fn dashboard_stats(
        &self,
        company_id: crate::domain::types::CompanyId,
        now: NaiveDateTime,
    ) -> RepositoryResult<DashboardStats> {
        let mut conn = self.conn()?;
        let company = company_id.get();

        let day_start = now.date().and_time(NaiveTime::MIN);
        let day_end = day_start + Duration::days(1);

        Ok(DashboardStats {
            active_clients: clients::table
                .filter(clients::company_id.eq(company))
                .filter(clients::active.eq(true))
                .count()
                .get_result(&mut conn)?,
            active_cases: cases::table
                .filter(cases::company_id.eq(company))
                .filter(cases::status.eq(CaseStatus::Active.as_str()))
                .count()
                .get_result(&mut conn)?,
            upcoming_deadlines: cases::table
                .filter(cases::company_id.eq(company))
                .filter(cases::deadline_completed.eq(false))
                .filter(cases::deadline.ge(now))
                .filter(cases::deadline.le(now + Duration::days(DEADLINE_WINDOW_DAYS)))
                .count()
                .get_result(&mut conn)?,
            today_events: schedule_events::table
                .filter(schedule_events::company_id.eq(company))
                .filter(schedule_events::date.ge(day_start))
                .filter(schedule_events::date.lt(day_end))
                .count()
                .get_result(&mut conn)?,
        })
    }

    fn recent_activities(
        &self,
        company_id: crate::domain::types::CompanyId,
        per_kind: usize,
    ) -> RepositoryResult<Vec<RecentActivity>> {
        let mut conn = self.conn()?;
        let company = company_id.get();
        let limit = per_kind as i64;
        let mut activities = Vec::new();

        let recent_cases = cases::table
            .inner_join(clients::table)
            .filter(cases::company_id.eq(company))
            .order(cases::created_at.desc())
            .limit(limit)
            .select((cases::id, cases::process_number, clients::name, cases::created_at))
            .load::<(i32, String, String, NaiveDateTime)>(&mut conn)?;
        activities.extend(recent_cases.into_iter().map(
            |(id, process_number, client_name, created_at)| RecentActivity {
                id,
                kind: ActivityKind::Case,
                title: "Novo Processo".into(),
                description: format!("{process_number} - {client_name}"),
                timestamp: created_at,
            },
        ));

        let recent_transactions = financial_transactions::table
            .inner_join(clients::table)
            .filter(financial_transactions::company_id.eq(company))
            .order(financial_transactions::created_at.desc())
            .limit(limit)
            .select((
                financial_transactions::id,
                financial_transactions::transaction_type,
                financial_transactions::description,
                financial_transactions::amount_cents,
                clients::name,
                financial_transactions::created_at,
            ))
            .load::<(i32, String, String, i64, String, NaiveDateTime)>(&mut conn)?;
        for (id, kind, description, amount, client_name, created_at) in recent_transactions {
            let title = match kind.parse::<TransactionType>()? {
                TransactionType::Income => "Nova Receita",
                TransactionType::Expense => "Nova Despesa",
            };
            activities.push(RecentActivity {
                id,
                kind: ActivityKind::Transaction,
                title: title.into(),
                description: format!(
                    "{description} - R$ {} - {client_name}",
                    format_cents(amount)
                ),
                timestamp: created_at,
            });
        }

        let recent_clients = clients::table
            .filter(clients::company_id.eq(company))
            .order(clients::created_at.desc())
            .limit(limit)
            .select((clients::id, clients::name, clients::cpf, clients::created_at))
            .load::<(i32, String, Option<String>, NaiveDateTime)>(&mut conn)?;
        activities.extend(recent_clients.into_iter().map(|(id, name, cpf, created_at)| {
            RecentActivity {
                id,
                kind: ActivityKind::Client,
                title: "Novo Cliente".into(),
                description: match cpf {
                    Some(cpf) => format!("{name} - CPF: {cpf}"),
                    None => name,
                },
                timestamp: created_at,
            }
        }));

        let recent_movements = case_movements::table
            .inner_join(cases::table)
            .filter(cases::company_id.eq(company))
            .order(case_movements::created_at.desc())
            .limit(limit)
            .select((
                case_movements::id,
                case_movements::name,
                cases::process_number,
                case_movements::created_at,
            ))
            .load::<(i32, String, String, NaiveDateTime)>(&mut conn)?;
        activities.extend(recent_movements.into_iter().map(
            |(id, name, process_number, created_at)| RecentActivity {
                id,
                kind: ActivityKind::Movement,
                title: "Movimentação Processual".into(),
                description: format!("{name} - {process_number}"),
                timestamp: created_at,
            },
        ));

        Ok(activities)
    }
}
