//! Bounded connection pools, sync and async (§4.H).
//!
//! Grounded on `connection/pool.py`'s `SyncPool`/`AsyncPool`: a bounded
//! idle queue plus a size counter, growing lazily up to `max_size`,
//! health-checking on acquire and transparently replacing dead
//! connections, with `PoolExhausted` surfaced as a real error rather
//! than blocking forever.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::conn::params::ConnectParams;
use crate::error::{QError, QResult};

const DEFAULT_MIN_SIZE: usize = 1;
const DEFAULT_MAX_SIZE: usize = 10;
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Builder-style configuration shared by [`SyncPool`] and [`AsyncPool`].
#[derive(Clone, Debug)]
pub struct PoolConfig {
    pub min_size: usize,
    pub max_size: usize,
    pub timeout: Duration,
    pub check_on_acquire: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            min_size: DEFAULT_MIN_SIZE,
            max_size: DEFAULT_MAX_SIZE,
            timeout: DEFAULT_TIMEOUT,
            check_on_acquire: true,
        }
    }
}

#[cfg(feature = "sync")]
mod sync_pool {
    use super::*;
    use crate::sync::connection::Connection;
    use crossbeam_channel::{Receiver, Sender, TryRecvError};

    /// A guard returning its connection to the pool on drop.
    #[derive(Debug)]
    pub struct PooledConnection {
        conn: Option<Connection>,
        pool: SyncPool,
    }

    impl std::ops::Deref for PooledConnection {
        type Target = Connection;
        fn deref(&self) -> &Connection {
            self.conn.as_ref().expect("connection taken")
        }
    }

    impl std::ops::DerefMut for PooledConnection {
        fn deref_mut(&mut self) -> &mut Connection {
            self.conn.as_mut().expect("connection taken")
        }
    }

    impl Drop for PooledConnection {
        fn drop(&mut self) {
            if let Some(conn) = self.conn.take() {
                self.pool.release(conn);
            }
        }
    }

    /// A bounded pool of blocking connections (§4.H).
    #[derive(Clone, Debug)]
    pub struct SyncPool {
        inner: std::sync::Arc<Inner>,
    }

    #[derive(Debug)]
    struct Inner {
        params: ConnectParams,
        config: PoolConfig,
        idle_tx: Sender<Connection>,
        idle_rx: Receiver<Connection>,
        size: AtomicUsize,
        closed: std::sync::atomic::AtomicBool,
    }

    impl SyncPool {
        #[must_use]
        pub fn new(params: ConnectParams, config: PoolConfig) -> Self {
            let (idle_tx, idle_rx) = crossbeam_channel::bounded(config.max_size);
            Self {
                inner: std::sync::Arc::new(Inner {
                    params,
                    config,
                    idle_tx,
                    idle_rx,
                    size: AtomicUsize::new(0),
                    closed: std::sync::atomic::AtomicBool::new(false),
                }),
            }
        }

        /// Current number of connections owned by the pool, idle or
        /// checked out.
        #[must_use]
        pub fn size(&self) -> usize {
            self.inner.size.load(Ordering::SeqCst)
        }

        /// Acquire a connection, growing the pool lazily up to
        /// `max_size`, or blocking up to `timeout` for one to free up.
        ///
        /// # Errors
        /// `QError::PoolExhausted` if no connection becomes available
        /// within the configured timeout; any connection error while
        /// opening a new one.
        pub fn acquire(&self) -> QResult<PooledConnection> {
            let conn = match self.inner.idle_rx.try_recv() {
                Ok(conn) => conn,
                Err(TryRecvError::Empty) => self.grow_or_wait()?,
                Err(TryRecvError::Disconnected) => {
                    return Err(QError::Pool("pool is closed".into()))
                }
            };

            let conn = if self.inner.config.check_on_acquire && !conn.is_open() {
                self.replace_dead(conn)?
            } else {
                conn
            };

            Ok(PooledConnection {
                conn: Some(conn),
                pool: self.clone(),
            })
        }

        fn grow_or_wait(&self) -> QResult<Connection> {
            let current = self.inner.size.load(Ordering::SeqCst);
            if current < self.inner.config.max_size {
                self.inner
                    .size
                    .fetch_add(1, Ordering::SeqCst);
                match Connection::open(self.inner.params.clone()) {
                    Ok(conn) => return Ok(conn),
                    Err(e) => {
                        self.inner.size.fetch_sub(1, Ordering::SeqCst);
                        return Err(e);
                    }
                }
            }
            self.inner
                .idle_rx
                .recv_timeout(self.inner.config.timeout)
                .map_err(|_| QError::PoolExhausted)
        }

        fn replace_dead(&self, _dead: Connection) -> QResult<Connection> {
            Connection::open(self.inner.params.clone())
        }

        fn release(&self, conn: Connection) {
            if self.inner.closed.load(Ordering::SeqCst) {
                drop(conn);
                self.inner.size.fetch_sub(1, Ordering::SeqCst);
                return;
            }
            if conn.is_open() {
                // queue is bounded at max_size so this never blocks
                let _ = self.inner.idle_tx.try_send(conn);
            } else {
                self.inner.size.fetch_sub(1, Ordering::SeqCst);
            }
        }

        /// Drain and close all idle connections; checked-out ones close
        /// when released.
        pub fn close(&self) {
            self.inner.closed.store(true, Ordering::SeqCst);
            while let Ok(conn) = self.inner.idle_rx.try_recv() {
                drop(conn);
                self.inner.size.fetch_sub(1, Ordering::SeqCst);
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn config_defaults_match_reference() {
            let cfg = PoolConfig::default();
            assert_eq!(cfg.min_size, 1);
            assert_eq!(cfg.max_size, 10);
            assert!(cfg.check_on_acquire);
        }
    }
}

#[cfg(feature = "sync")]
pub use sync_pool::{PooledConnection, SyncPool};

#[cfg(feature = "async")]
mod async_pool {
    use super::*;
    use crate::a_sync::connection::AsyncConnection;
    use tokio::sync::{Mutex, Semaphore};

    /// A bounded pool of async connections (§4.H).
    #[derive(Debug)]
    pub struct AsyncPool {
        params: ConnectParams,
        config: PoolConfig,
        idle: Mutex<Vec<AsyncConnection>>,
        permits: Semaphore,
        size: AtomicUsize,
        closed: std::sync::atomic::AtomicBool,
    }

    /// A guard returning its connection to the pool on drop.
    #[derive(Debug)]
    pub struct PooledConnection<'a> {
        conn: Option<AsyncConnection>,
        pool: &'a AsyncPool,
    }

    impl std::ops::Deref for PooledConnection<'_> {
        type Target = AsyncConnection;
        fn deref(&self) -> &AsyncConnection {
            self.conn.as_ref().expect("connection taken")
        }
    }

    impl std::ops::DerefMut for PooledConnection<'_> {
        fn deref_mut(&mut self) -> &mut AsyncConnection {
            self.conn.as_mut().expect("connection taken")
        }
    }

    impl Drop for PooledConnection<'_> {
        fn drop(&mut self) {
            if let Some(conn) = self.conn.take() {
                self.pool.release_sync(conn);
            }
        }
    }

    impl AsyncPool {
        #[must_use]
        pub fn new(params: ConnectParams, config: PoolConfig) -> Self {
            let max_size = config.max_size;
            Self {
                params,
                config,
                idle: Mutex::new(Vec::new()),
                permits: Semaphore::new(max_size),
                size: AtomicUsize::new(0),
                closed: std::sync::atomic::AtomicBool::new(false),
            }
        }

        #[must_use]
        pub fn size(&self) -> usize {
            self.size.load(Ordering::SeqCst)
        }

        /// # Errors
        /// `QError::PoolExhausted` on timeout; connection errors from
        /// opening a fresh connection.
        pub async fn acquire(&self) -> QResult<PooledConnection<'_>> {
            if self.closed.load(Ordering::SeqCst) {
                return Err(QError::Pool("pool is closed".into()));
            }

            {
                let mut idle = self.idle.lock().await;
                if let Some(conn) = idle.pop() {
                    drop(idle);
                    let conn = if self.config.check_on_acquire && !conn.is_open() {
                        self.open_fresh().await?
                    } else {
                        conn
                    };
                    return Ok(PooledConnection {
                        conn: Some(conn),
                        pool: self,
                    });
                }
            }

            let current = self.size.load(Ordering::SeqCst);
            if current < self.config.max_size {
                self.size.fetch_add(1, Ordering::SeqCst);
                return match AsyncConnection::open(self.params.clone()).await {
                    Ok(conn) => Ok(PooledConnection {
                        conn: Some(conn),
                        pool: self,
                    }),
                    Err(e) => {
                        self.size.fetch_sub(1, Ordering::SeqCst);
                        Err(e)
                    }
                };
            }

            let permit = tokio::time::timeout(self.config.timeout, self.permits.acquire())
                .await
                .map_err(|_| QError::PoolExhausted)?
                .map_err(|_| QError::Pool("semaphore closed".into()))?;
            permit.forget();
            let mut idle = self.idle.lock().await;
            let conn = idle.pop().ok_or(QError::PoolExhausted)?;
            drop(idle);
            let conn = if self.config.check_on_acquire && !conn.is_open() {
                self.open_fresh().await?
            } else {
                conn
            };
            Ok(PooledConnection {
                conn: Some(conn),
                pool: self,
            })
        }

        async fn open_fresh(&self) -> QResult<AsyncConnection> {
            AsyncConnection::open(self.params.clone()).await
        }

        fn release_sync(&self, conn: AsyncConnection) {
            if self.closed.load(Ordering::SeqCst) || !conn.is_open() {
                self.size.fetch_sub(1, Ordering::SeqCst);
                drop(conn);
                return;
            }
            // best-effort: hand the connection back without blocking
            // the drop; a blocked `try_lock` just means a concurrent
            // acquirer is already looking, so open a fresh one instead.
            if let Ok(mut idle) = self.idle.try_lock() {
                idle.push(conn);
                self.permits.add_permits(1);
            } else {
                self.size.fetch_sub(1, Ordering::SeqCst);
            }
        }

        pub async fn close(&self) {
            self.closed.store(true, Ordering::SeqCst);
            let mut idle = self.idle.lock().await;
            let n = idle.len();
            idle.clear();
            self.size.fetch_sub(n, Ordering::SeqCst);
        }
    }
}

#[cfg(feature = "async")]
pub use async_pool::{AsyncPool, PooledConnection as AsyncPooledConnection};
