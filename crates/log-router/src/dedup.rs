//! 작업별 에러 이벤트 중복 제거
//!
//! [`DedupTracker`]는 에러 이벤트를 이미 기록한 작업 ID 집합입니다.
//! 작업의 상태는 `Unwritten -> Written` 한 방향으로만 바뀌고 되돌아가지 않습니다.
//! 집합은 프로세스 수명 동안 커지기만 하며 정리하지 않습니다.

use std::collections::HashSet;

use parking_lot::Mutex;

/// 작업별 에러 이벤트 기록 추적기
#[derive(Debug, Default)]
pub struct DedupTracker {
    /// 에러 이벤트를 기록한 작업 ID
    written: Mutex<HashSet<String>>,
}

impl DedupTracker {
    /// 빈 추적기를 만듭니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 작업에 대한 에러 이벤트를 이미 기록했는지 확인합니다.
    pub fn has_written(&self, job_id: &str) -> bool {
        self.written.lock().contains(job_id)
    }

    /// 작업을 기록 완료로 표시합니다.
    ///
    /// 새로 표시했으면 true, 이미 표시되어 있었으면 false를 반환합니다.
    pub fn mark_written(&self, job_id: &str) -> bool {
        let mut written = self.written.lock();
        if written.contains(job_id) {
            return false;
        }
        written.insert(job_id.to_owned())
    }

    /// 기록 완료된 작업 수
    pub fn len(&self) -> usize {
        self.written.lock().len()
    }

    /// 비어 있는지 여부
    pub fn is_empty(&self) -> bool {
        self.written.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn unwritten_then_written() {
        let tracker = DedupTracker::new();
        assert!(!tracker.has_written("j1"));
        assert!(tracker.mark_written("j1"));
        assert!(tracker.has_written("j1"));
    }

    #[test]
    fn second_mark_is_noop() {
        let tracker = DedupTracker::new();
        assert!(tracker.mark_written("j1"));
        assert!(!tracker.mark_written("j1"));
        assert_eq!(tracker.len(), 1);
    }

    #[test]
    fn jobs_are_tracked_independently() {
        let tracker = DedupTracker::new();
        tracker.mark_written("j1");
        assert!(!tracker.has_written("j2"));
        assert!(tracker.mark_written("j2"));
        assert_eq!(tracker.len(), 2);
    }

    #[test]
    fn concurrent_marks_succeed_exactly_once() {
        let tracker = Arc::new(DedupTracker::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let tracker = Arc::clone(&tracker);
                std::thread::spawn(move || tracker.mark_written("shared"))
            })
            .collect();

        let winners = handles
            .into_iter()
            .map(|h| h.join().expect("thread"))
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
