//! # Opening the Store
//!
//! [`DbConfig`] describes where the SQLite file lives and how the pool around
//! it behaves. [`Database`] owns the pool plus the process-wide [`WriteGate`]
//! and hands out repositories that share both.
//!
//! ```text
//!   DbConfig ──► Database::new ──► SqlitePool (WAL, foreign keys on)
//!                     │
//!                     ├── migrations (unless disabled)
//!                     │
//!                     ├── catalog()
//!                     ├── products()         ┐
//!                     ├── purchases()        │ WriteGate held around
//!                     ├── partners()         │ each transaction
//!                     └── reseller_store()   ┘
//! ```
//!
//! WAL lets readers carry on while a transaction commits. Between processes
//! SQLite's own lock applies and `busy_timeout` bounds the wait. Within this
//! process the gate keeps read-check-write sequences (a payment reading the
//! outstanding balance, a reconcile reading every live bill) from
//! interleaving.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::migrations;
use crate::repository::catalog::CatalogRepository;
use crate::repository::partner::PartnerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::purchase::PurchaseRepository;
use crate::repository::reseller_store::ResellerStoreRepository;

/// In-process writer lock. Clones share one mutex.
#[derive(Debug, Clone, Default)]
pub struct WriteGate(Arc<Mutex<()>>);

impl WriteGate {
    pub async fn acquire(&self) -> MutexGuard<'_, ()> {
        self.0.lock().await
    }
}

/// Where the store lives and how its pool behaves.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/atelier/atelier.db")
///     .max_connections(8)
///     .busy_timeout(Duration::from_secs(10));
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, or `:memory:`.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// Wait for a free pooled connection before giving up.
    pub acquire_timeout: Duration,

    /// Idle connections are dropped after this long.
    pub idle_timeout: Duration,

    /// Wait on a lock held by another process before failing with SQLITE_BUSY.
    pub busy_timeout: Duration,

    /// Apply embedded migrations when the pool opens.
    pub migrate_on_open: bool,
}

impl DbConfig {
    /// File-backed store. The file is created on first open.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(10 * 60),
            busy_timeout: Duration::from_secs(5),
            migrate_on_open: true,
        }
    }

    /// Private in-memory store for tests.
    ///
    /// Every connection to `:memory:` opens a fresh database, so the pool is
    /// pinned to one connection.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            busy_timeout: Duration::from_secs(1),
            migrate_on_open: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn acquire_timeout(mut self, timeout: Duration) -> Self {
        self.acquire_timeout = timeout;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    pub fn migrate_on_open(mut self, migrate: bool) -> Self {
        self.migrate_on_open = migrate;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }

    fn connect_options(&self) -> DbResult<SqliteConnectOptions> {
        let options = if self.is_in_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&self.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        };

        // Bill items and payments cascade from their bill
        Ok(options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout))
    }
}

/// Handle to the store. Cheap to clone; clones share the pool and the gate.
///
/// ```rust,ignore
/// let db = Database::new(DbConfig::new("./atelier.db")).await?;
/// let summary = db.products().reconcile_stock().await?;
/// let payment = db.purchases().record_payment(&bill_id, amount, PaymentMode::Upi, None).await?;
/// ```
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    gate: WriteGate,
}

impl Database {
    /// Opens the pool and, unless disabled, migrates the schema.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening store");

        // One connection always stays open; an in-memory store lives only as long as it does
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(Some(config.idle_timeout))
            .connect_with(config.connect_options()?)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(
            max_connections = config.max_connections,
            busy_timeout_ms = config.busy_timeout.as_millis() as u64,
            "Pool ready"
        );

        let db = Database {
            pool,
            gate: WriteGate::default(),
        };

        if config.migrate_on_open {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brands, categories, sizes and vendors.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone())
    }

    /// Products, pricing and stock reconciliation.
    pub fn products(&self) -> ProductRepository {
        ProductRepository::new(self.pool.clone(), self.gate.clone())
    }

    /// Purchase bills and the payment ledger.
    pub fn purchases(&self) -> PurchaseRepository {
        PurchaseRepository::new(self.pool.clone(), self.gate.clone())
    }

    /// Wholesalers, resellers and retailers.
    pub fn partners(&self) -> PartnerRepository {
        PartnerRepository::new(self.pool.clone(), self.gate.clone())
    }

    pub fn reseller_store(&self) -> ResellerStoreRepository {
        ResellerStoreRepository::new(self.pool.clone(), self.gate.clone())
    }

    /// Waits for checked-out connections to come back, then closes the pool.
    pub async fn close(&self) {
        debug!("Closing store");
        self.pool.close().await;
    }

    /// `true` when a trivial query round-trips.
    pub async fn is_reachable(&self) -> bool {
        sqlx::query_scalar::<_, i64>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .is_ok()
    }
}
