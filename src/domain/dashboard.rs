use chrono::NaiveDateTime;
use serde::Serialize;

#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Case,
    Transaction,
    Client,
    Movement,
}

/// One line of the dashboard activity feed.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct RecentActivity {
    pub id: i32,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    pub title: String,
    pub description: String,
    pub timestamp: NaiveDateTime,
}

#[derive(Clone, Debug, Default, Serialize, PartialEq)]
pub struct DashboardStats {
    pub active_clients: i64,
    pub active_cases: i64,
    pub upcoming_deadlines: i64,
    pub today_events: i64,
}

/// Newest first, truncated to `limit`.
pub fn merge_activities(mut activities: Vec<RecentActivity>, limit: usize) -> Vec<RecentActivity> {
    activities.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    activities.truncate(limit);
    activities
}
