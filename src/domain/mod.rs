//! Domain entities and value objects.
//!
//! Everything in this module is free of persistence and HTTP concerns. Diesel
//! models convert into these types, and services operate on them.

pub mod accounts_payable;
pub mod audit_log;
pub mod auth;
pub mod campaign;
pub mod case;
pub mod case_part;
pub mod client;
pub mod company;
pub mod dashboard;
pub mod financial;
pub mod holiday;
pub mod import;
pub mod lgpd;
pub mod process_number;
pub mod schedule;
pub mod tag;
pub mod token_share;
pub mod types;
pub mod user;
