use super::{Connection, ConnectionPool, Connector, DatabaseConfig, DatabaseError, PoolConfig, PooledConnection};
use crate::logger::SharedLogger;
use std::fmt;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// Lazily connected database handle.
///
/// Cheap to clone; clones share the same pool. Register it with
/// [`Server::services`](crate::app::Server::services) to make it reachable
/// from hooks through [`Request::service`](crate::http::Request::service).
pub struct Database<C: Connector> {
    inner: Arc<Inner<C>>,
}

struct Inner<C: Connector> {
    config: DatabaseConfig,
    pool_config: PoolConfig,
    connector: Arc<C>,
    logger: SharedLogger,
    pool: OnceCell<ConnectionPool<C::Connection>>,
}

impl<C: Connector> Database<C> {
    pub fn new(config: DatabaseConfig, pool_config: PoolConfig, connector: C, logger: &SharedLogger) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                pool_config,
                connector: Arc::new(connector),
                logger: logger.source("database"),
                pool: OnceCell::new(),
            }),
        }
    }

    pub fn config(&self) -> &DatabaseConfig {
        &self.inner.config
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.pool.initialized()
    }

    /// Connects and builds the pool. Runs at most once; concurrent callers
    /// wait for the same attempt. A failed attempt leaves the handle
    /// uninitialized so a later call retries.
    pub async fn initialize(&self) -> Result<&ConnectionPool<C::Connection>, DatabaseError> {
        self.inner
            .pool
            .get_or_try_init(|| async {
                let inner = &self.inner;
                inner.logger.info("Connecting to database");
                let connector = Arc::clone(&inner.connector);
                let config = inner.config.clone();
                let pool = ConnectionPool::new(inner.pool_config.clone(), move || connector.connect(&config));
                match pool {
                    Ok(pool) => {
                        inner.logger.debug(&format!(
                            "Connected to {} database `{}` on {}:{}",
                            inner.config.driver, inner.config.database, inner.config.host, inner.config.port
                        ));
                        Ok(pool)
                    }
                    Err(err) => {
                        inner.logger.critical(&err.to_string());
                        Err(err)
                    }
                }
            })
            .await
    }

    /// Checks a connection out of the pool, initializing it first if needed.
    pub async fn connection(&self) -> Result<PooledConnection<C::Connection>, DatabaseError> {
        self.initialize().await?.get()
    }

    /// Returns a connection to the pool it was checked out of.
    pub fn release(&self, connection: PooledConnection<C::Connection>) {
        match self.inner.pool.get() {
            Some(pool) => pool.release(connection),
            None => connection.into_inner().close(),
        }
    }
}

impl<C: Connector> Clone for Database<C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<C: Connector> fmt::Debug for Database<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("driver", &self.inner.config.driver)
            .field("database", &self.inner.config.database)
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
