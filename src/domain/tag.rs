use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{CompanyId, TagId, TagName, TypeConstraintError};

pub const DEFAULT_TAG_COLOR: &str = "#3B82F6";

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct Tag {
    pub id: TagId,
    pub company_id: CompanyId,
    pub name: TagName,
    pub color: String,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTag {
    pub company_id: CompanyId,
    pub name: TagName,
    pub color: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateTag {
    pub name: TagName,
    pub color: String,
}

/// Accepts `#RGB` or `#RRGGBB`; a blank value falls back to the default color.
pub fn normalize_color(value: Option<&str>) -> Result<String, TypeConstraintError> {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Ok(DEFAULT_TAG_COLOR.to_string());
    }
    let hex = value
        .strip_prefix('#')
        .ok_or_else(|| TypeConstraintError::InvalidValue(format!("color `{value}`")))?;
    if matches!(hex.len(), 3 | 6) && hex.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(value.to_uppercase())
    } else {
        Err(TypeConstraintError::InvalidValue(format!("color `{value}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_defaults_and_validates() {
        assert_eq!(normalize_color(None).unwrap(), DEFAULT_TAG_COLOR);
        assert_eq!(normalize_color(Some("  ")).unwrap(), DEFAULT_TAG_COLOR);
        assert_eq!(normalize_color(Some("#10b981")).unwrap(), "#10B981");
        assert!(normalize_color(Some("red")).is_err());
        assert!(normalize_color(Some("#12345")).is_err());
    }
}
