//! Redis 스토어
//!
//! 동기 `redis::Connection` 하나를 캐시해 사용합니다. 연결과 명령 모두 짧은
//! 타임아웃을 가지며, I/O 계열 에러가 나면 캐시된 연결을 버려 다음 호출이 재연결합니다.
//! 재시도는 하지 않습니다.

use std::time::Duration;

use parking_lot::Mutex;
use redis::{Client, Connection, RedisError, RedisResult};

use logrelay_core::config::RedisConfig;
use logrelay_core::error::StoreError;

use super::LogStore;

/// Redis 기반 [`LogStore`] 구현
pub struct RedisStore {
    client: Client,
    conn: Mutex<Option<Connection>>,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl RedisStore {
    /// 설정으로부터 스토어를 생성합니다.
    ///
    /// URL 형식만 검사하고 실제 연결은 첫 호출 때 맺습니다.
    pub fn from_config(config: &RedisConfig) -> Result<Self, StoreError> {
        let url = config.connection_url();
        let client = Client::open(url.as_str())
            .map_err(|e| StoreError::Connection(format!("invalid redis url: {e}")))?;
        Ok(Self {
            client,
            conn: Mutex::new(None),
            connect_timeout: Duration::from_millis(config.connect_timeout_ms),
            command_timeout: Duration::from_millis(config.command_timeout_ms),
        })
    }

    fn connect(&self) -> Result<Connection, StoreError> {
        let conn = self
            .client
            .get_connection_with_timeout(self.connect_timeout)
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        conn.set_read_timeout(Some(self.command_timeout))
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        conn.set_write_timeout(Some(self.command_timeout))
            .map_err(|e| StoreError::Connection(e.to_string()))?;
        tracing::debug!("META: [LogRouter] redis connection established");
        Ok(conn)
    }

    /// 캐시된 연결로 명령을 실행합니다.
    fn run<T>(
        &self,
        op: &str,
        f: impl FnOnce(&mut Connection) -> RedisResult<T>,
    ) -> Result<T, StoreError> {
        let mut slot = self.conn.lock();
        if slot.is_none() {
            *slot = Some(self.connect()?);
        }
        let conn = slot
            .as_mut()
            .ok_or_else(|| StoreError::Connection("connection slot empty".to_owned()))?;

        f(conn).map_err(|e| {
            if e.is_io_error() || e.is_timeout() || e.is_connection_dropped() {
                *slot = None;
            }
            map_error(op, e)
        })
    }
}

fn map_error(op: &str, err: RedisError) -> StoreError {
    if err.is_timeout() {
        StoreError::Timeout {
            op: op.to_owned(),
            reason: err.to_string(),
        }
    } else if err.is_connection_refusal() || err.is_connection_dropped() {
        StoreError::Connection(err.to_string())
    } else {
        StoreError::command(op, err)
    }
}

impl LogStore for RedisStore {
    fn ping(&self) -> Result<(), StoreError> {
        self.run("PING", |conn| redis::cmd("PING").query::<String>(conn))
            .map(|_| ())
    }

    fn hash_entries(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        self.run("HGETALL", |conn| redis::cmd("HGETALL").arg(key).query(conn))
    }

    fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        self.run("HSET", |conn| {
            redis::cmd("HSET")
                .arg(key)
                .arg(field)
                .arg(value)
                .query::<i64>(conn)
        })
        .map(|_| ())
    }

    fn stream_append(&self, key: &str, fields: &[(String, String)]) -> Result<String, StoreError> {
        self.run("XADD", |conn| {
            let mut cmd = redis::cmd("XADD");
            cmd.arg(key).arg("*");
            for (field, value) in fields {
                cmd.arg(field).arg(value);
            }
            cmd.query(conn)
        })
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        self.run("EXPIRE", |conn| {
            redis::cmd("EXPIRE").arg(key).arg(ttl_secs).query::<i64>(conn)
        })
        .map(|_| ())
    }

    fn publish(&self, channel: &str, payload: &str) -> Result<u64, StoreError> {
        self.run("PUBLISH", |conn| {
            redis::cmd("PUBLISH").arg(channel).arg(payload).query(conn)
        })
    }
}
