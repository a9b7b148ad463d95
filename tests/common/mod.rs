//! Shared test fixtures
//!
//! Database-backed integration tests run against the database named by
//! `TEST_DATABASE_URL` and skip themselves when it is unset, so the suite
//! passes on machines without a local PostgreSQL.

use sqlx::PgPool;

/// Test database fixture
pub struct TestDb {
    pub pool: PgPool,
}

impl TestDb {
    /// Connect and migrate, or `None` when `TEST_DATABASE_URL` is unset
    pub async fn connect() -> Option<Self> {
        let database_url = std::env::var("TEST_DATABASE_URL").ok()?;

        let pool = PgPool::connect(&database_url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .expect("Failed to run migrations");

        Some(Self { pool })
    }
}

/// Skip the current test when no test database is configured
macro_rules! require_test_db {
    () => {
        match common::TestDb::connect().await {
            Some(db) => db,
            None => {
                eprintln!("TEST_DATABASE_URL not set, skipping database test");
                return;
            }
        }
    };
}
