//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::env;

const SCHEMA: &str = include_str!("../../migrations/0001_create_tables.sql");

/// Connection to the scratch database named by TEST_DATABASE_URL.
///
/// Returns `None` when the variable is unset so database tests can skip.
pub async fn get_test_db() -> Option<Result<DatabaseConnection, DbErr>> {
    let database_url = env::var("TEST_DATABASE_URL").ok()?;
    Some(Database::connect(database_url.as_str()).await)
}

/// Connect, apply the schema and empty every table.
pub async fn setup_test_database() -> Option<DatabaseConnection> {
    let db = match get_test_db().await? {
        Ok(db) => db,
        Err(e) => panic!("TEST_DATABASE_URL is set but unreachable: {}", e),
    };

    apply_schema(&db).await.expect("Failed to apply schema");
    cleanup_test_data(&db).await.expect("Failed to clean test data");
    Some(db)
}

/// Prepared statements hold one command each, so the file is applied statement by statement.
async fn apply_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    for statement in SCHEMA.split(';') {
        let sql: String = statement
            .lines()
            .filter(|line| !line.trim_start().starts_with("--"))
            .collect::<Vec<_>>()
            .join("\n");
        if sql.trim().is_empty() {
            continue;
        }
        db.execute(Statement::from_string(db.get_database_backend(), sql))
            .await?;
    }
    Ok(())
}

/// Truncates all tables in dependency order.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "TRUNCATE TABLE poll_account_availability, polls, accounts RESTART IDENTITY CASCADE;"
            .to_string(),
    ))
    .await?;
    Ok(())
}
