use serde::Serialize;

use crate::domain::token_share::TokenShareView;

/// Share received by the caller's company; `share` is null when none exists.
#[derive(Debug, Serialize)]
pub struct ReceivedShare {
    pub share: Option<TokenShareView>,
}
