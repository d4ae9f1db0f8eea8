//! 백킹 스토어 추상화
//!
//! 라우터가 사용하는 키-값 스토어 연산을 [`LogStore`] trait으로 묶습니다.
//! 운영 환경은 [`RedisStore`], 테스트와 오프라인 도구는 [`MemoryStore`]를 사용합니다.
//!
//! 모든 호출은 동기 네트워크 I/O이며 짧은 타임아웃을 가지고 재시도하지 않습니다.

pub mod memory;
pub mod redis_store;

pub use self::memory::{MemoryStore, StoreOp, StreamEntry};
pub use self::redis_store::RedisStore;

use logrelay_core::error::StoreError;

/// 라우터가 필요로 하는 스토어 연산
pub trait LogStore: Send + Sync {
    /// 연결 확인 (PING)
    fn ping(&self) -> Result<(), StoreError>;

    /// 해시의 모든 (필드, 값) 쌍을 스토어가 돌려준 순서대로 읽습니다 (HGETALL).
    fn hash_entries(&self, key: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// 해시 필드 하나를 씁니다 (HSET).
    fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError>;

    /// 스트림에 평탄한 문자열 맵 레코드를 추가하고 엔트리 ID를 반환합니다 (XADD `*`).
    fn stream_append(&self, key: &str, fields: &[(String, String)]) -> Result<String, StoreError>;

    /// 키의 만료 시간을 설정합니다 (EXPIRE).
    fn expire(&self, key: &str, ttl_secs: u64) -> Result<(), StoreError>;

    /// 채널에 메시지를 발행하고 수신자 수를 반환합니다 (PUBLISH).
    fn publish(&self, channel: &str, payload: &str) -> Result<u64, StoreError>;
}
