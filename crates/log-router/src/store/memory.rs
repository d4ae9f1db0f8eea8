//! 인메모리 스토어 -- 테스트와 오프라인 패턴 점검용
//!
//! Redis와 같은 의미로 해시/스트림/TTL/발행을 흉내 내고, 호출 결과를 검사할 수 있도록
//! 모든 쓰기를 기록합니다. 연산별로 실패를 주입할 수 있습니다.

use std::collections::{HashMap, HashSet};

use parking_lot::Mutex;

use logrelay_core::error::StoreError;

use super::LogStore;

/// 실패 주입 대상 연산
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    /// PING
    Ping,
    /// HGETALL
    HashRead,
    /// HSET
    HashWrite,
    /// XADD
    StreamAppend,
    /// EXPIRE
    Expire,
    /// PUBLISH
    Publish,
}

impl StoreOp {
    const ALL: [StoreOp; 6] = [
        StoreOp::Ping,
        StoreOp::HashRead,
        StoreOp::HashWrite,
        StoreOp::StreamAppend,
        StoreOp::Expire,
        StoreOp::Publish,
    ];

    fn command(self) -> &'static str {
        match self {
            Self::Ping => "PING",
            Self::HashRead => "HGETALL",
            Self::HashWrite => "HSET",
            Self::StreamAppend => "XADD",
            Self::Expire => "EXPIRE",
            Self::Publish => "PUBLISH",
        }
    }
}

/// 스트림에 추가된 엔트리
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEntry {
    /// 엔트리 ID (`{seq}-0`)
    pub id: String,
    /// 필드 목록 (추가된 순서)
    pub fields: Vec<(String, String)>,
}

impl StreamEntry {
    /// 필드 값을 조회합니다.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == field)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Default)]
struct State {
    hashes: HashMap<String, Vec<(String, String)>>,
    streams: HashMap<String, Vec<StreamEntry>>,
    ttls: HashMap<String, u64>,
    published: Vec<(String, String)>,
    failing: HashSet<StoreOp>,
    next_seq: u64,
}

/// 인메모리 [`LogStore`] 구현
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    /// 빈 스토어를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 모든 연산이 연결 실패를 돌려주는 스토어를 생성합니다.
    pub fn unavailable() -> Self {
        let store = Self::new();
        for op in StoreOp::ALL {
            store.fail(op);
        }
        store
    }

    /// 지정한 연산이 실패하도록 만듭니다.
    pub fn fail(&self, op: StoreOp) {
        self.state.lock().failing.insert(op);
    }

    /// 지정한 연산의 실패 주입을 해제합니다.
    pub fn recover(&self, op: StoreOp) {
        self.state.lock().failing.remove(&op);
    }

    /// 해시 필드를 직접 씁니다 (실패 주입 무시).
    pub fn seed_hash(&self, key: &str, field: &str, value: &str) {
        upsert(&mut self.state.lock(), key, field, value);
    }

    /// 스트림에 쌓인 엔트리를 반환합니다.
    pub fn stream(&self, key: &str) -> Vec<StreamEntry> {
        self.state
            .lock()
            .streams
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// 모든 스트림에 추가된 엔트리 수
    pub fn stream_len_total(&self) -> usize {
        self.state.lock().streams.values().map(Vec::len).sum()
    }

    /// 키에 마지막으로 설정된 TTL
    pub fn ttl(&self, key: &str) -> Option<u64> {
        self.state.lock().ttls.get(key).copied()
    }

    /// 발행된 (채널, 페이로드) 목록
    pub fn published(&self) -> Vec<(String, String)> {
        self.state.lock().published.clone()
    }

    fn check(&self, state: &State, op: StoreOp) -> Result<(), StoreError> {
        if state.failing.contains(&op) {
            return Err(StoreError::Connection(format!(
                "{} rejected: store unavailable",
                op.command()
            )));
        }
        Ok(())
    }
}

fn upsert(state: &mut State, key: &str, field: &str, value: &str) {
    let entries = state.hashes.entry(key.to_owned()).or_default();
    match entries.iter_mut().find(|(f, _)| f == field) {
        Some((_, v)) => *v = value.to_owned(),
        None => entries.push((field.to_owned(), value.to_owned())),
    }
}

impl LogStore for MemoryStore {
    fn ping(&self) -> Result<(), StoreError> {
        let state = self.state.lock();
        self.check(&state, StoreOp::Ping)
    }

    fn hash_entries(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        let state = self.state.lock();
        self.check(&state, StoreOp::HashRead)?;
        Ok(state.hashes.get(key).cloned().unwrap_or_default())
    }

    fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        self.check(&state, StoreOp::HashWrite)?;
        upsert(&mut state, key, field, value);
        Ok(())
    }

    fn stream_append(&self, key: &str, fields: &[(String, String)]) -> Result<String, StoreError> {
        let mut state = self.state.lock();
        self.check(&state, StoreOp::StreamAppend)?;
        state.next_seq += 1;
        let id = format!("{}-0", state.next_seq);
        state
            .streams
            .entry(key.to_owned())
            .or_default()
            .push(StreamEntry {
                id: id.clone(),
                fields: fields.to_vec(),
            });
        Ok(id)
    }

    fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError> {
        let mut state = self.state.lock();
        self.check(&state, StoreOp::Expire)?;
        state.ttls.insert(key.to_owned(), ttl_secs);
        Ok(())
    }

    fn publish(&self, channel: &str, payload: &str) -> Result<u64, StoreError> {
        let mut state = self.state.lock();
        self.check(&state, StoreOp::Publish)?;
        state
            .published
            .push((channel.to_owned(), payload.to_owned()));
        Ok(0)
    }
}
