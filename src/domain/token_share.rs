use chrono::NaiveDateTime;
use serde::Serialize;

use crate::domain::types::{CompanyId, TokenShareId};

/// AI token allowance one company grants another.
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TokenShare {
    pub id: TokenShareId,
    pub provider_company_id: CompanyId,
    pub client_company_id: CompanyId,
    pub token_limit: i64,
    pub tokens_used: i64,
    pub enabled: bool,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl TokenShare {
    pub fn usage_percent(&self) -> f64 {
        if self.token_limit <= 0 {
            0.0
        } else {
            (self.tokens_used as f64 / self.token_limit as f64) * 100.0
        }
    }

    pub fn tokens_remaining(&self) -> i64 {
        (self.token_limit - self.tokens_used).max(0)
    }
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TokenShareView {
    #[serde(flatten)]
    pub share: TokenShare,
    pub provider_company_name: String,
    pub client_company_name: String,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TokenShareStats {
    pub total_shares: usize,
    pub enabled_shares: usize,
    pub total_limit: i64,
    pub total_used: i64,
    pub usage_percent: f64,
    pub shares: Vec<TokenShareUsage>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct TokenShareUsage {
    pub id: TokenShareId,
    pub client_company_name: String,
    pub token_limit: i64,
    pub tokens_used: i64,
    pub tokens_remaining: i64,
    pub usage_percent: f64,
    pub enabled: bool,
}

impl TokenShareStats {
    pub fn from_views(views: &[TokenShareView]) -> Self {
        let total_limit: i64 = views.iter().map(|v| v.share.token_limit).sum();
        let total_used: i64 = views.iter().map(|v| v.share.tokens_used).sum();
        Self {
            total_shares: views.len(),
            enabled_shares: views.iter().filter(|v| v.share.enabled).count(),
            total_limit,
            total_used,
            usage_percent: if total_limit > 0 {
                (total_used as f64 / total_limit as f64) * 100.0
            } else {
                0.0
            },
            shares: views
                .iter()
                .map(|v| TokenShareUsage {
                    id: v.share.id,
                    client_company_name: v.client_company_name.clone(),
                    token_limit: v.share.token_limit,
                    tokens_used: v.share.tokens_used,
                    tokens_remaining: v.share.tokens_remaining(),
                    usage_percent: v.share.usage_percent(),
                    enabled: v.share.enabled,
                })
                .collect(),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NewTokenShare {
    pub provider_company_id: CompanyId,
    pub client_company_id: CompanyId,
    pub token_limit: i64,
    pub enabled: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct UpdateTokenShare {
    pub token_limit: i64,
    pub enabled: bool,
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    fn share(limit: i64, used: i64) -> TokenShare {
        let now = NaiveDate::from_ymd_opt(2025, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        TokenShare {
            id: TokenShareId::new(1).unwrap(),
            provider_company_id: CompanyId::new(1).unwrap(),
            client_company_id: CompanyId::new(2).unwrap(),
            token_limit: limit,
            tokens_used: used,
            enabled: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn usage_percent_and_remaining() {
        let s = share(1000, 250);
        assert!((s.usage_percent() - 25.0).abs() < f64::EPSILON);
        assert_eq!(s.tokens_remaining(), 750);
        assert_eq!(share(100, 150).tokens_remaining(), 0);
    }

    #[test]
    fn stats_aggregate_views() {
        let views = vec![
            TokenShareView {
                share: share(1000, 500),
                provider_company_name: "A".into(),
                client_company_name: "B".into(),
            },
            TokenShareView {
                share: share(1000, 0),
                provider_company_name: "A".into(),
                client_company_name: "C".into(),
            },
        ];
        let stats = TokenShareStats::from_views(&views);
        assert_eq!(stats.total_limit, 2000);
        assert!((stats.usage_percent - 25.0).abs() < f64::EPSILON);
        assert_eq!(stats.shares.len(), 2);
    }
}
