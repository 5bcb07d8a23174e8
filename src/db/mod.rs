//! Database layer
//!
//! Supports:
//! - SQLite (default, single-file deployment)
//! - MySQL
//!
//! The driver is selected from configuration. Repositories go through the
//! [`DatabasePool`] trait object and branch on [`DatabasePool::driver`].
//!
//! ```ignore
//! use newsdesk::config::DatabaseConfig;
//! use newsdesk::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//! pool.ping().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{
    create_pool, create_test_pool, DatabasePool, DynDatabasePool, MysqlDatabase, SqliteDatabase,
};
