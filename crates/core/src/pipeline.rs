//! 파이프라인 trait: 호스트와 엔진 사이의 확장 포인트 정의

use serde::Serialize;

use crate::types::{JobContext, LogLine};

/// 현재 실행 중인 작업을 알려주는 trait
///
/// 호스트의 실행 모델은 엔진이 알 필요가 없도록 이 trait 뒤에 숨깁니다.
/// 구현체는 어떤 실패도 밖으로 내보내지 않고 `None`으로 돌려야 합니다.
pub trait JobContextResolver: Send + Sync {
    /// 지금 이 순간 배치가 귀속될 작업 컨텍스트
    fn resolve(&self) -> Option<JobContext>;
}

impl<F> JobContextResolver for F
where
    F: Fn() -> Option<JobContext> + Send + Sync,
{
    fn resolve(&self) -> Option<JobContext> {
        self()
    }
}

/// 로그 배치를 소비하는 trait
///
/// 호스트의 플러시 콜백이 호출합니다. 반환값이 없으며(fire-and-forget)
/// 구현체는 패닉이나 에러를 호출자에게 전파하면 안 됩니다.
pub trait BatchHandler: Send + Sync {
    /// 핸들러 이름
    fn name(&self) -> &str;

    /// 배치 하나를 처리
    fn handle_batch(&self, batch: &[LogLine]);
}

/// 컴포넌트 헬스 상태
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "lowercase")]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 일부 기능만 동작 (예: 패턴 카탈로그가 비어 전달만 수행)
    Degraded(String),
    /// 동작하지 않음
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 여부
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 저하 상태 여부
    pub fn is_degraded(&self) -> bool {
        matches!(self, Self::Degraded(_))
    }

    /// 비정상 여부
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closure_acts_as_resolver() {
        let resolver = || JobContext::new("j1", None);
        assert_eq!(
            resolver.resolve().map(|c| c.job_id),
            Some("j1".to_owned())
        );
    }

    #[test]
    fn boxed_closure_resolver_without_context() {
        let resolver: Box<dyn JobContextResolver> = Box::new(|| None);
        assert!(resolver.resolve().is_none());
    }

    #[test]
    fn health_status_predicates() {
        assert!(HealthStatus::Healthy.is_healthy());
        assert!(HealthStatus::Degraded("x".to_owned()).is_degraded());
        assert!(HealthStatus::Unhealthy("x".to_owned()).is_unhealthy());
        assert!(!HealthStatus::Healthy.is_unhealthy());
    }

    #[test]
    fn health_status_serializes_with_reason() {
        let json = serde_json::to_string(&HealthStatus::Degraded("forward-only".to_owned()))
            .expect("serialize");
        assert_eq!(json, r#"{"status":"degraded","reason":"forward-only"}"#);
    }
}
