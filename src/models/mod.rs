//! Diesel models mirroring the database schema.
//!
//! Each submodule holds the queryable row type, the insertable and changeset
//! forms, and conversions to and from the domain layer.

pub mod accounts_payable;
pub mod audit_log;
pub mod campaign;
pub mod case;
pub mod case_part;
pub mod client;
pub mod company;
pub mod financial;
pub mod lgpd;
pub mod schedule;
pub mod tag;
pub mod token_share;
pub mod user;
#[cfg(feature = "server")]
pub mod config;
#[cfg(feature = "server")]
pub mod zmq;
