//! SeaORM entities for the Postgres schema in `migrations/`.

pub mod accounts;
pub mod poll_account_availability;
pub mod polls;
