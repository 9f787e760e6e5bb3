use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
pub struct HolidayYearParams {
    pub year: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct HolidayRangeParams {
    pub start: String,
    pub end: String,
}
