//! Relay integration tests -- intake through router to the store.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use logrelay_core::config::{IntakeConfig, LogRelayConfig};
use logrelay_daemon::app::{build_resolver, build_router, load_config};
use logrelay_daemon::cli::DaemonCli;
use logrelay_daemon::relay::{Relay, RelayOptions};
use logrelay_router::catalog::GLOBAL_PATTERNS_KEY;
use logrelay_router::{LogRouter, LogRouterBuilder, MemoryStore, RouterConfig};

use clap::Parser;

fn router_with_state(store: Arc<MemoryStore>, state_json: &str) -> (LogRouter, tempfile::TempDir) {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("state.json");
    std::fs::write(&path, state_json).expect("write state");

    let router = LogRouterBuilder::new()
        .config(RouterConfig::default())
        .store(store)
        .resolver(build_resolver(&path.display().to_string()))
        .build()
        .expect("router");
    (router, dir)
}

fn options(batch_size: usize) -> RelayOptions {
    let mut options = RelayOptions::from_config(&IntakeConfig::default()).expect("options");
    options.batch_size = batch_size;
    options.flush_interval = Duration::from_millis(20);
    options
}

#[tokio::test]
async fn input_lines_reach_the_store() {
    // given
    let store = Arc::new(MemoryStore::new());
    store.seed_hash(GLOBAL_PATTERNS_KEY, "oom", r#"{"pattern": "out of memory"}"#);
    let (router, _dir) = router_with_state(
        store.clone(),
        r#"{"executing": {"job_id": "j1", "workflow_id": "wf"}}"#,
    );
    let router = Arc::new(router);
    let relay = Relay::new(Arc::clone(&router), options(2));
    let input: &'static [u8] = b"loading\n{\"t\": 5.0, \"m\": \"CUDA error: out of memory\"}\n\nretrying\n";

    // when
    let summary = relay
        .run(input, CancellationToken::new())
        .await
        .expect("relay");

    // then
    assert_eq!(summary.lines_read, 4);
    assert_eq!(summary.lines_routed, 4);
    assert_eq!(summary.errors_written, 1);
    assert_eq!(store.published().len(), 3);
    assert_eq!(store.stream("job:events:j1").len(), 1);
    assert!(router.is_closed());
}

#[tokio::test]
async fn cancellation_drains_buffer_and_closes_router() {
    let store = Arc::new(MemoryStore::new());
    let (router, _dir) = router_with_state(store.clone(), r#"{"executing": {"job_id": "j1"}}"#);
    let router = Arc::new(router);
    let relay = Relay::new(Arc::clone(&router), options(1000));

    // 입력이 끝나지 않는 파이프
    let (mut writer, reader) = tokio::io::duplex(1024);
    tokio::io::AsyncWriteExt::write_all(&mut writer, b"first\nsecond\n")
        .await
        .expect("write");

    let cancel = CancellationToken::new();
    let handle = tokio::spawn(relay.run(tokio::io::BufReader::new(reader), cancel.clone()));
    tokio::time::sleep(Duration::from_millis(100)).await;
    cancel.cancel();

    let summary = handle.await.expect("join").expect("relay");
    assert_eq!(summary.lines_read, 2);
    assert_eq!(store.published().len(), 2);
    assert!(router.is_closed());
    drop(writer);
}

#[tokio::test]
async fn no_state_file_routes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let router = LogRouterBuilder::new()
        .store(store.clone())
        .resolver(build_resolver("/nonexistent/logrelay/state.json"))
        .build()
        .expect("router");
    let relay = Relay::new(Arc::new(router), options(10));
    let input: &'static [u8] = b"ERROR: boom\n";

    let summary = relay
        .run(input, CancellationToken::new())
        .await
        .expect("relay");

    assert_eq!(summary.lines_routed, 1);
    assert!(store.published().is_empty());
}

#[tokio::test]
async fn health_reports_router_and_intake() {
    let store = Arc::new(MemoryStore::new());
    let (router, _dir) = router_with_state(store, "{}");
    let relay = Relay::new(Arc::new(router), options(10));

    let health = relay.health().await;
    let names: Vec<_> = health.components.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["log-router", "intake"]);
    // 패턴이 없으므로 전달 전용 모드
    assert!(health.status.is_degraded());
}

#[test]
fn unreachable_redis_yields_disabled_router() {
    let mut config = LogRelayConfig::default();
    config.redis.url = "redis://127.0.0.1:1/0".to_owned();
    config.intake.context_file = String::new();

    let router = build_router(&config).expect("build should not fail");
    assert!(router.is_disabled());
}

#[tokio::test]
#[serial_test::serial]
async fn load_config_applies_cli_overrides() {
    let mut file = tempfile::NamedTempFile::new().expect("tempfile");
    writeln!(
        file,
        "[general]\nlog_level = \"info\"\n\n[routing]\nmachine_id = \"gpu-7\"\n"
    )
    .expect("write config");

    let path = file.path().display().to_string();
    let cli = DaemonCli::parse_from(["logrelay-daemon", "-c", &path, "--log-level", "debug"]);
    let config = load_config(&cli).await.expect("load");

    assert_eq!(config.general.log_level, "debug");
    assert_eq!(config.routing.machine_id, "gpu-7");
}

#[tokio::test]
async fn missing_config_file_is_an_error() {
    let cli = DaemonCli::parse_from(["logrelay-daemon", "-c", "/nonexistent/logrelay.toml"]);
    let err = load_config(&cli).await.unwrap_err();
    assert!(err.to_string().contains("failed to load config"));
}
