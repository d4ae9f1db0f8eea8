#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`catalog`]: 에러 패턴 레코드 로딩, 매처 준비, 최초 매칭
//! - [`context`]: 호스트 실행 상태에서 작업 컨텍스트 해석
//! - [`dedup`]: 작업별 에러 이벤트 기록 여부
//! - [`delivery`]: 실시간 브로드캐스트와 작업 스트림 기록
//! - [`store`]: 백엔드 스토어 추상화 (Redis, 인메모리)
//! - [`router`]: 배치 처리 오케스트레이션 (BatchHandler 구현)
//! - [`config`]: 라우터 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입

pub mod catalog;
pub mod config;
pub mod context;
pub mod dedup;
pub mod delivery;
pub mod error;
pub mod router;
pub mod store;

/// 엔진 진단 메시지 접두어. 이 마커가 든 메시지는 패턴 매칭에서 제외합니다.
pub const DIAGNOSTIC_MARKER: &str = "META:";

/// 엔진 진단 메시지의 컴포넌트 태그. 이 태그가 든 라인은 전달하지 않습니다.
pub const COMPONENT_TAG: &str = "[LogRouter]";

// --- 주요 타입 re-export ---

// 라우터
pub use router::{BatchReport, BatchStatus, LogRouter, LogRouterBuilder, RouterStatsSnapshot};

// 설정
pub use config::{RouterConfig, RouterConfigBuilder};

// 에러
pub use error::LogRouterError;

// 카탈로그
pub use catalog::{ErrorPattern, LoadSummary, MatchType, PatternCatalog, PatternRecord, PatternSource};

// 컨텍스트
pub use context::{ExecutionContextResolver, ExecutionSnapshot, ExecutionStateProvider, ExtraData};

// 전달
pub use delivery::{ErrorEvent, PubSubPublisher, StreamWriter};

// 스토어
pub use store::{LogStore, MemoryStore, RedisStore, StoreOp};

pub use dedup::DedupTracker;
