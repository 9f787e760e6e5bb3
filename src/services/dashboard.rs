use chrono::NaiveDateTime;

use crate::domain::auth::AuthenticatedUser;
use crate::domain::dashboard::{DashboardStats, RecentActivity, merge_activities};
use crate::dto::dashboard::ActivityParams;
use crate::repository::DashboardReader;
use crate::services::{ServiceResult, tenant_of};

const DEFAULT_ACTIVITY_LIMIT: usize = 10;
const MAX_ACTIVITY_LIMIT: usize = 50;

pub fn dashboard_stats<R>(
    repo: &R,
    user: &AuthenticatedUser,
    now: NaiveDateTime,
) -> ServiceResult<DashboardStats>
where
    R: DashboardReader + ?Sized,
{
    Ok(repo.dashboard_stats(tenant_of(user)?, now)?)
}

/// Latest cases, transactions, clients and movements as one feed.
pub fn recent_activities<R>(
    repo: &R,
    user: &AuthenticatedUser,
    params: ActivityParams,
) -> ServiceResult<Vec<RecentActivity>>
where
    R: DashboardReader + ?Sized,
{
    let company_id = tenant_of(user)?;
    let limit = params
        .limit
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_ACTIVITY_LIMIT)
        .min(MAX_ACTIVITY_LIMIT);
    let activities = repo.recent_activities(company_id, limit)?;
    Ok(merge_activities(activities, limit))
}

#[cfg(all(test, feature = "test-mocks"))]
mod tests {
    use super::*;
    use crate::domain::dashboard::ActivityKind;
    use crate::repository::mock::MockRepository;
    use crate::services::ServiceError;
    use crate::services::test_support::{at, member, user_with};
    use crate::domain::types::Role;

    fn activity(id: i32, kind: ActivityKind, when: &str) -> RecentActivity {
        RecentActivity {
            id,
            kind,
            title: format!("item {id}"),
            description: String::new(),
            timestamp: at(when),
        }
    }

    #[test]
    fn feed_is_merged_newest_first() {
        let mut repo = MockRepository::new();
        repo.expect_recent_activities()
            .withf(|_, per_kind| *per_kind == 2)
            .returning(|_, _| {
                Ok(vec![
                    activity(1, ActivityKind::Case, "2025-03-01 10:00"),
                    activity(2, ActivityKind::Client, "2025-03-03 10:00"),
                    activity(3, ActivityKind::Movement, "2025-03-02 10:00"),
                ])
            });

        let feed = recent_activities(&repo, &member(), ActivityParams { limit: Some(2) }).unwrap();
        let ids: Vec<i32> = feed.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3]);
    }

    #[test]
    fn stats_require_a_company() {
        let repo = MockRepository::new();
        assert!(matches!(
            dashboard_stats(&repo, &user_with(Role::User, None), at("2025-03-01 10:00")),
            Err(ServiceError::Forbidden(_))
        ));
    }
}
