use serde::Deserialize;

/// Query string of the event listing.
#[derive(Debug, Default, Deserialize)]
pub struct EventListParams {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    pub completed: Option<bool>,
    pub client_id: Option<i32>,
    pub case_id: Option<i32>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpcomingParams {
    pub limit: Option<usize>,
}
