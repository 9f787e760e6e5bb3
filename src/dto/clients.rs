use serde::Deserialize;

/// Query string of the client listing.
#[derive(Debug, Default, Deserialize)]
pub struct ClientListParams {
    pub search: Option<String>,
    pub tag_id: Option<i32>,
    pub date_from: Option<String>,
    pub date_to: Option<String>,
    pub page: Option<usize>,
    pub limit: Option<usize>,
}

/// `?q=` of the autocomplete endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct AutocompleteParams {
    pub q: Option<String>,
}
