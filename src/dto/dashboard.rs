use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct ActivityParams {
    pub limit: Option<usize>,
}
