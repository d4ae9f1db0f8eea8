//! 작업 컨텍스트 해석기
//!
//! 호스트의 실행 상태를 [`ExecutionStateProvider`]로 추상화하고,
//! 우선순위에 따라 하나의 [`JobContext`]로 해석합니다.
//!
//! 1. 지금 실행 중인 작업의 임시 실행 데이터 (런타임 실패를 반영)
//! 2. 실행 전 검증 단계의 대기 컨텍스트
//!
//! 제공자의 어떤 실패도 "컨텍스트 없음"과 같게 취급합니다.

use std::panic::{self, AssertUnwindSafe};

use serde::{Deserialize, Serialize};

use logrelay_core::error::ContextError;
use logrelay_core::pipeline::JobContextResolver;
use logrelay_core::types::JobContext;

/// 호스트가 붙여 두는 작업 부가 데이터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraData {
    /// 작업 ID
    #[serde(default)]
    pub job_id: Option<String>,
    /// 워크플로 ID
    #[serde(default)]
    pub workflow_id: Option<String>,
}

impl ExtraData {
    fn into_context(self) -> Option<JobContext> {
        JobContext::new(self.job_id?, self.workflow_id)
    }
}

/// 한 시점의 실행 상태
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ExecutionSnapshot {
    /// 실행 중인 작업
    #[serde(default)]
    pub executing: Option<ExtraData>,
    /// 대기 중인 작업
    #[serde(default)]
    pub pending: Option<ExtraData>,
}

impl ExecutionSnapshot {
    /// 실행 중 작업을 먼저, 없으면 대기 작업을 컨텍스트로 만듭니다.
    pub fn into_context(self) -> Option<JobContext> {
        let pending = self.pending;
        self.executing
            .and_then(ExtraData::into_context)
            .or_else(|| pending.and_then(ExtraData::into_context))
    }
}

/// 호스트 실행 상태 제공자
pub trait ExecutionStateProvider: Send + Sync {
    /// 현재 실행 중인 작업의 부가 데이터
    fn executing(&self) -> Result<Option<ExtraData>, ContextError>;

    /// 실행 전(검증 단계) 대기 중인 작업의 부가 데이터
    fn pending(&self) -> Result<Option<ExtraData>, ContextError>;

    /// 해석 한 번에 쓰는 상태
    ///
    /// 기본 구현은 실행 중 작업이 컨텍스트를 주면 대기 상태를 읽지 않습니다.
    /// 두 값을 한 번에 읽을 수 있는 제공자는 이 메서드를 재정의합니다.
    fn snapshot(&self) -> Result<ExecutionSnapshot, ContextError> {
        let executing = self.executing()?;
        if executing
            .as_ref()
            .is_some_and(|data| data.job_id.as_deref().is_some_and(|id| !id.is_empty()))
        {
            return Ok(ExecutionSnapshot {
                executing,
                pending: None,
            });
        }
        Ok(ExecutionSnapshot {
            executing,
            pending: self.pending()?,
        })
    }
}

/// 우선순위 기반 작업 컨텍스트 해석기
pub struct ExecutionContextResolver<P> {
    provider: P,
}

impl<P: ExecutionStateProvider> ExecutionContextResolver<P> {
    /// 제공자를 감싸 해석기를 만듭니다.
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// 감싼 제공자
    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn try_resolve(&self) -> Result<Option<JobContext>, ContextError> {
        Ok(self.provider.snapshot()?.into_context())
    }
}

impl<P: ExecutionStateProvider> JobContextResolver for ExecutionContextResolver<P> {
    fn resolve(&self) -> Option<JobContext> {
        match panic::catch_unwind(AssertUnwindSafe(|| self.try_resolve())) {
            Ok(Ok(ctx)) => ctx,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "META: [LogRouter] execution context unavailable");
                None
            }
            Err(_) => {
                tracing::debug!("META: [LogRouter] execution context provider panicked");
                None
            }
        }
    }
}
