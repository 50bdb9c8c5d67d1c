//! # Connection Pool
//!
//! Purpose: Hand out reusable TCP connections to the sync client and release
//! them all on `close`.
//!
//! ## Design Principles
//! 1. **Object Pool Pattern**: Keep a bounded set of reusable connections.
//! 2. **Minimal Locking**: Hold the mutex only while moving idle connections.
//! 3. **Fail Fast**: Exceeding the pool limit returns an error immediately.
//! 4. **Poison on Failure**: A connection that saw an IO/protocol error is
//!    dropped instead of returned.

use std::collections::VecDeque;
use std::io::{BufReader, ErrorKind, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use parking_lot::Mutex;
use tracing::debug;

use pkv_common::{StoreError, StoreResult};

use crate::resp::{encode_command, Reply, ReplyReader};

/// Pool limits and transport settings.
#[derive(Debug, Clone)]
pub struct PoolConfig {
    pub addr: String,
    pub max_idle: usize,
    pub max_total: usize,
    pub read_timeout: Option<Duration>,
    pub write_timeout: Option<Duration>,
    pub connect_timeout: Option<Duration>,
}

struct PoolState {
    idle: VecDeque<Connection>,
    total: usize,
    closed: bool,
}

struct PoolInner {
    config: PoolConfig,
    state: Mutex<PoolState>,
}

impl PoolInner {
    fn release_slot(&self) {
        let mut state = self.state.lock();
        state.total = state.total.saturating_sub(1);
    }

    fn give_back(&self, conn: Connection) {
        let mut state = self.state.lock();
        if !state.closed && state.idle.len() < self.config.max_idle {
            state.idle.push_back(conn);
        } else {
            state.total = state.total.saturating_sub(1);
        }
    }
}

/// Connection pool handle.
#[derive(Clone)]
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
}

impl ConnectionPool {
    pub fn new(config: PoolConfig) -> Self {
        let state = PoolState {
            idle: VecDeque::with_capacity(config.max_idle),
            total: 0,
            closed: false,
        };
        ConnectionPool {
            inner: Arc::new(PoolInner {
                config,
                state: Mutex::new(state),
            }),
        }
    }

    pub fn addr(&self) -> &str {
        &self.inner.config.addr
    }

    /// Takes an idle connection or opens a new one within `max_total`.
    pub fn acquire(&self) -> StoreResult<PooledConnection> {
        {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Err(StoreError::Closed);
            }
            if let Some(conn) = state.idle.pop_front() {
                return Ok(PooledConnection::new(Arc::clone(&self.inner), conn));
            }
            if state.total >= self.inner.config.max_total {
                return Err(StoreError::PoolExhausted);
            }
            state.total += 1;
        }

        match Connection::open(&self.inner.config) {
            Ok(conn) => Ok(PooledConnection::new(Arc::clone(&self.inner), conn)),
            Err(err) => {
                self.inner.release_slot();
                Err(err)
            }
        }
    }

    /// Marks the pool closed and shuts down every idle connection.
    ///
    /// Connections still checked out are dropped when they come back.
    /// Closing twice is a no-op.
    pub fn close(&self) -> StoreResult<()> {
        let drained: Vec<Connection> = {
            let mut state = self.inner.state.lock();
            if state.closed {
                return Ok(());
            }
            state.closed = true;
            state.total = state.total.saturating_sub(state.idle.len());
            state.idle.drain(..).collect()
        };

        let mut first_err = None;
        for conn in drained {
            if let Err(err) = conn.shutdown() {
                first_err.get_or_insert(err);
            }
        }
        debug!(addr = %self.inner.config.addr, "connection pool closed");

        match first_err {
            Some(err) => Err(StoreError::Io(err)),
            None => Ok(()),
        }
    }
}

/// RAII wrapper returning a connection to the pool on drop.
pub struct PooledConnection {
    pool: Arc<PoolInner>,
    conn: Option<Connection>,
    healthy: bool,
}

impl PooledConnection {
    fn new(pool: Arc<PoolInner>, conn: Connection) -> Self {
        PooledConnection {
            pool,
            conn: Some(conn),
            healthy: true,
        }
    }

    /// Sends one command and reads its reply.
    pub fn exec(&mut self, args: &[&[u8]]) -> StoreResult<Reply> {
        let conn = self.conn.as_mut().ok_or(StoreError::Closed)?;
        let reply = conn.exec(args);
        if reply.is_err() {
            self.healthy = false;
        }
        reply
    }
}

impl Drop for PooledConnection {
    fn drop(&mut self) {
        let Some(conn) = self.conn.take() else {
            return;
        };
        if self.healthy {
            self.pool.give_back(conn);
        } else {
            self.pool.release_slot();
        }
    }
}

/// Single TCP connection with reusable buffers.
struct Connection {
    // Buffered reader reduces syscalls while still allowing direct writes.
    reader: BufReader<TcpStream>,
    replies: ReplyReader,
    write_buf: BytesMut,
}

impl Connection {
    fn open(config: &PoolConfig) -> StoreResult<Self> {
        let addr = resolve(&config.addr)?;
        let stream = match config.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&addr, timeout)?,
            None => TcpStream::connect(addr)?,
        };
        stream.set_read_timeout(config.read_timeout)?;
        stream.set_write_timeout(config.write_timeout)?;
        // Small request/reply pairs: Nagle would only add latency.
        stream.set_nodelay(true)?;
        debug!(%addr, "opened store connection");

        Ok(Connection {
            reader: BufReader::new(stream),
            replies: ReplyReader::new(),
            write_buf: BytesMut::with_capacity(256),
        })
    }

    fn exec(&mut self, args: &[&[u8]]) -> StoreResult<Reply> {
        self.write_buf.clear();
        encode_command(args, &mut self.write_buf);

        let stream = self.reader.get_mut();
        stream.write_all(&self.write_buf)?;
        stream.flush()?;

        self.replies.read(&mut self.reader)
    }

    fn shutdown(self) -> std::io::Result<()> {
        match self.reader.get_ref().shutdown(Shutdown::Both) {
            Err(err) if err.kind() == ErrorKind::NotConnected => Ok(()),
            other => other,
        }
    }
}

fn resolve(addr: &str) -> StoreResult<SocketAddr> {
    addr.to_socket_addrs()
        .map_err(|_| StoreError::InvalidAddress)?
        .next()
        .ok_or(StoreError::InvalidAddress)
}
