//! 전달 채널
//!
//! 서로 독립적인 두 개의 best-effort 싱크입니다.
//! - [`PubSubPublisher`]: 모든 라인을 실시간 브로드캐스트 (휘발성)
//! - [`StreamWriter`]: 작업당 한 번, TTL이 있는 내구 스트림에 에러 이벤트 기록
//!
//! 두 채널 모두 스토어 실패를 호출자에게 전파하지 않습니다.

pub mod pubsub;
pub mod stream;

pub use pubsub::{BroadcastPayload, PubSubPublisher, UNKNOWN_WORKER, channel_key};
pub use stream::{DEFAULT_STREAM_TTL_SECS, ERROR_EVENT_TYPE, ErrorEvent, StreamWriter, stream_key};
