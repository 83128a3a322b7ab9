//! Ledger repositories
//!
//! `ledger` holds the [`ledger::JobLedger`] trait, its Postgres and memory
//! implementations, and the factory that picks one from configuration.

pub mod ledger;
