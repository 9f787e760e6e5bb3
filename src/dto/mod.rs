//! Request query strings and response bodies of the JSON API.

pub mod accounts_payable;
pub mod audit_log;
pub mod auth;
pub mod campaigns;
pub mod cases;
pub mod clients;
pub mod companies;
pub mod dashboard;
pub mod financial;
pub mod holidays;
pub mod schedule;
pub mod token_shares;
