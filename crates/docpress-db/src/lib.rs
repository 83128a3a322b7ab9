//! Docpress job ledger
//!
//! Durable record of finished conversions. Backends implement [`JobLedger`];
//! Postgres for deployments and an in-memory map for development and tests.

pub mod db;

pub use db::ledger::{
    create_job_ledger, JobLedger, LedgerError, LedgerResult, MemoryJobLedger, PgJobLedger,
};
