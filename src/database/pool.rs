use super::{Connection, DatabaseError, PoolConfig};
use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

/// A connection checked out of a [`ConnectionPool`].
///
/// Keeps the connection's creation time across checkouts so `max_lifetime`
/// is measured from when the driver opened it.
pub struct PooledConnection<C: Connection> {
    connection: C,
    created_at: Instant,
    last_used_at: Instant,
}

impl<C: Connection> PooledConnection<C> {
    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    /// Detaches the connection from the pool's bookkeeping.
    pub fn into_inner(self) -> C {
        self.connection
    }
}

impl<C: Connection> Deref for PooledConnection<C> {
    type Target = C;

    fn deref(&self) -> &C {
        &self.connection
    }
}

impl<C: Connection> DerefMut for PooledConnection<C> {
    fn deref_mut(&mut self) -> &mut C {
        &mut self.connection
    }
}

struct PoolState<C: Connection> {
    idle: VecDeque<PooledConnection<C>>,
    /// Idle plus checked out.
    open: usize,
}

pub struct ConnectionPool<C: Connection> {
    state: Mutex<PoolState<C>>,
    config: PoolConfig,
    create_connection: Arc<dyn Fn() -> Result<C, DatabaseError> + Send + Sync>,
}

impl<C: Connection + 'static> ConnectionPool<C> {
    /// Opens the pool and warms it up to `min_idle` connections.
    ///
    /// The first connection is mandatory: if it cannot be opened the pool is
    /// not created. Further warm-up failures are tolerated.
    pub fn new<F>(config: PoolConfig, create_fn: F) -> Result<Self, DatabaseError>
    where
        F: Fn() -> Result<C, DatabaseError> + Send + Sync + 'static,
    {
        let pool = Self {
            state: Mutex::new(PoolState {
                idle: VecDeque::with_capacity(config.max_size),
                open: 0,
            }),
            config,
            create_connection: Arc::new(create_fn),
        };

        let first = pool.create_new_connection()?;
        let warm_up = pool.config.min_idle.min(pool.config.max_size);
        {
            let mut state = pool.lock();
            state.idle.push_back(first);
            state.open += 1;
            while state.open < warm_up {
                match pool.create_new_connection() {
                    Ok(conn) => {
                        state.idle.push_back(conn);
                        state.open += 1;
                    }
                    Err(_) => break,
                }
            }
        }

        Ok(pool)
    }

    pub fn get(&self) -> Result<PooledConnection<C>, DatabaseError> {
        let mut state = self.lock();
        let now = Instant::now();

        while let Some(mut pooled) = state.idle.pop_front() {
            let idle_too_long = now.duration_since(pooled.last_used_at) > self.config.idle_timeout;
            if idle_too_long || self.outlived(&pooled, now) || !pooled.connection.is_valid() {
                pooled.connection.close();
                state.open -= 1;
                continue;
            }
            pooled.last_used_at = now;
            return Ok(pooled);
        }

        if state.open >= self.config.max_size {
            return Err(DatabaseError::PoolExhausted);
        }
        let pooled = self.create_new_connection()?;
        state.open += 1;
        Ok(pooled)
    }

    /// Hands a connection back. Invalid or expired connections are closed
    /// instead.
    pub fn release(&self, mut pooled: PooledConnection<C>) {
        let mut state = self.lock();
        let now = Instant::now();
        if pooled.connection.is_valid() && !self.outlived(&pooled, now) && state.idle.len() < self.config.max_size {
            pooled.last_used_at = now;
            state.idle.push_back(pooled);
        } else {
            pooled.connection.close();
            state.open = state.open.saturating_sub(1);
        }
    }

    pub fn idle_count(&self) -> usize {
        self.lock().idle.len()
    }

    pub fn open_count(&self) -> usize {
        self.lock().open
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    fn outlived(&self, pooled: &PooledConnection<C>, now: Instant) -> bool {
        now.duration_since(pooled.created_at) > self.config.max_lifetime
    }

    fn lock(&self) -> MutexGuard<'_, PoolState<C>> {
        // A panic while holding the lock cannot leave the queue half-updated.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn create_new_connection(&self) -> Result<PooledConnection<C>, DatabaseError> {
        let connection = (self.create_connection)()?;
        if !connection.is_valid() {
            return Err(DatabaseError::InvalidConnection);
        }

        let now = Instant::now();
        Ok(PooledConnection {
            connection,
            created_at: now,
            last_used_at: now,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    struct FakeConnection {
        valid: Arc<AtomicBool>,
    }

    impl Connection for FakeConnection {
        fn is_valid(&self) -> bool {
            self.valid.load(Ordering::SeqCst)
        }

        fn close(&mut self) {
            self.valid.store(false, Ordering::SeqCst);
        }
    }

    fn config(max_size: usize, min_idle: usize) -> PoolConfig {
        PoolConfig {
            max_size,
            min_idle,
            ..PoolConfig::default()
        }
    }

    fn counting_pool(config: PoolConfig) -> (ConnectionPool<FakeConnection>, Arc<AtomicUsize>) {
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        let pool = ConnectionPool::new(config, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(FakeConnection {
                valid: Arc::new(AtomicBool::new(true)),
            })
        })
        .unwrap();
        (pool, created)
    }

    #[test]
    fn warms_up_to_min_idle() {
        let (pool, created) = counting_pool(config(5, 3));
        assert_eq!(created.load(Ordering::SeqCst), 3);
        assert_eq!(pool.idle_count(), 3);
        assert_eq!(pool.open_count(), 3);
    }

    #[test]
    fn reuses_released_connections() {
        let (pool, created) = counting_pool(config(2, 1));
        let conn = pool.get().unwrap();
        pool.release(conn);
        let _conn = pool.get().unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn exhausts_at_max_size() {
        let (pool, _) = counting_pool(config(2, 1));
        let _a = pool.get().unwrap();
        let _b = pool.get().unwrap();
        assert_eq!(pool.get().err(), Some(DatabaseError::PoolExhausted));
    }

    #[test]
    fn drops_invalid_connections_on_release() {
        let (pool, _) = counting_pool(config(2, 1));
        let conn = pool.get().unwrap();
        conn.valid.store(false, Ordering::SeqCst);
        pool.release(conn);
        assert_eq!(pool.idle_count(), 0);
        assert_eq!(pool.open_count(), 0);
    }

    #[test]
    fn evicts_idle_connections_past_timeout() {
        let (pool, created) = counting_pool(PoolConfig {
            max_size: 2,
            min_idle: 1,
            max_lifetime: Duration::from_secs(60),
            idle_timeout: Duration::ZERO,
        });
        std::thread::sleep(Duration::from_millis(5));
        let _conn = pool.get().unwrap();
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(pool.open_count(), 1);
    }

    #[test]
    fn lifetime_counts_from_creation_across_releases() {
        let (pool, created) = counting_pool(PoolConfig {
            max_size: 1,
            min_idle: 1,
            max_lifetime: Duration::from_millis(100),
            idle_timeout: Duration::from_secs(60),
        });

        let conn = pool.get().unwrap();
        let opened_at = conn.created_at();
        std::thread::sleep(Duration::from_millis(60));
        pool.release(conn);

        let conn = pool.get().unwrap();
        assert_eq!(conn.created_at(), opened_at);
        std::thread::sleep(Duration::from_millis(60));
        pool.release(conn);

        let conn = pool.get().unwrap();
        assert!(conn.created_at() > opened_at);
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(pool.open_count(), 1);
    }

    #[test]
    fn fails_when_first_connection_cannot_open() {
        let result = ConnectionPool::<FakeConnection>::new(config(2, 1), || {
            Err(DatabaseError::ConnectionFailed("refused".to_string()))
        });
        assert_eq!(
            result.err(),
            Some(DatabaseError::ConnectionFailed("refused".to_string()))
        );
    }
}
