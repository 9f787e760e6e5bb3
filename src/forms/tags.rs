use serde::Deserialize;
use validator::Validate;

use crate::domain::tag::{UpdateTag, normalize_color};
use crate::domain::types::TagName;
use crate::forms::FormError;

#[derive(Debug, Deserialize, Validate)]
pub struct TagForm {
    #[validate(length(min = 1, max = 50))]
    pub name: String,
    pub color: Option<String>,
}

impl TryFrom<TagForm> for UpdateTag {
    type Error = FormError;

    fn try_from(form: TagForm) -> Result<Self, Self::Error> {
        Ok(Self {
            name: TagName::new(form.name)?,
            color: normalize_color(form.color.as_deref())?,
        })
    }
}
