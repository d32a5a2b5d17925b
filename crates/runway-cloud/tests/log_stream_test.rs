use chrono::{DateTime, TimeZone, Utc};
use mockall::mock;
use runway_cloud::{
    CommandError, Deletion, GatewayError, LogEntry, LogQuery, LogStream, PlatformGateway,
    ServiceDescriptor, ServiceRequest, Severity, Target, Tool,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

mock! {
    Gateway {}

    impl PlatformGateway for Gateway {
        async fn is_container_engine_running(&self) -> bool;
        async fn is_authenticated(&self) -> bool;
        async fn configure_registry_auth(&self, registry_host: &str) -> Result<(), GatewayError>;
        async fn ensure_repository(&self, target: &Target, repository: &str) -> Result<(), GatewayError>;
        async fn build_image(&self, tag: &str, platform: &str, context_dir: &Path) -> Result<(), GatewayError>;
        async fn tag_image(&self, source: &str, tag: &str) -> Result<(), GatewayError>;
        async fn push_image(&self, tag: &str) -> Result<(), GatewayError>;
        async fn deploy_service(&self, target: &Target, request: &ServiceRequest) -> Result<ServiceDescriptor, GatewayError>;
        async fn get_service(&self, target: &Target, name: &str) -> Result<Option<ServiceDescriptor>, GatewayError>;
        async fn list_services(&self, target: &Target) -> Result<Vec<ServiceDescriptor>, GatewayError>;
        async fn delete_service(&self, target: &Target, name: &str) -> Result<Deletion, GatewayError>;
        async fn set_public_access(&self, target: &Target, name: &str) -> Result<(), GatewayError>;
        async fn fetch_logs(&self, target: &Target, query: &LogQuery) -> Result<Vec<LogEntry>, GatewayError>;
    }
}

fn at(secs: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, secs).unwrap()
}

fn entry(secs: u32, message: &str) -> LogEntry {
    LogEntry {
        timestamp: at(secs),
        severity: Severity::Info,
        message: message.to_owned(),
    }
}

fn target() -> Target {
    Target::new("p", "us-central1")
}

#[tokio::test(start_paused = true)]
async fn follows_with_advancing_watermark() {
    let polls = Arc::new(Mutex::new(Vec::<Option<DateTime<Utc>>>::new()));
    let calls = Arc::new(AtomicUsize::new(0));

    let mut gateway = MockGateway::new();
    {
        let polls = polls.clone();
        let calls = calls.clone();
        gateway.expect_fetch_logs().returning(move |_, query| {
            polls.lock().unwrap().push(query.since);
            Ok(match calls.fetch_add(1, Ordering::SeqCst) {
                0 => vec![entry(1, "a"), entry(2, "b")],
                // overlaps the previous batch at the watermark
                1 => vec![entry(2, "b"), entry(3, "c")],
                2 => vec![],
                _ => vec![entry(4, "d")],
            })
        });
    }

    let mut stream = LogStream::new(at(0));
    let cancel = stream.cancel_handle();
    let mut seen = Vec::new();

    stream
        .run(&gateway, &target(), "app", |e| {
            if e.message == "d" {
                cancel.cancel();
            }
            seen.push(e.message);
        })
        .await
        .unwrap();

    assert_eq!(seen, ["a", "b", "c", "d"]);
    assert_eq!(stream.watermark(), at(4));
    assert_eq!(
        *polls.lock().unwrap(),
        [Some(at(0)), Some(at(2)), Some(at(3)), Some(at(3))]
    );
}

#[tokio::test(start_paused = true)]
async fn entries_sharing_a_timestamp_in_one_batch_are_all_delivered() {
    let calls = Arc::new(AtomicUsize::new(0));
    let mut gateway = MockGateway::new();
    {
        let calls = calls.clone();
        gateway.expect_fetch_logs().returning(move |_, _| {
            Ok(match calls.fetch_add(1, Ordering::SeqCst) {
                0 => vec![entry(5, "x"), entry(5, "y")],
                _ => vec![entry(5, "x"), entry(5, "y"), entry(6, "z")],
            })
        });
    }

    let mut stream = LogStream::new(at(0));
    let cancel = stream.cancel_handle();
    let mut seen = Vec::new();

    stream
        .run(&gateway, &target(), "app", |e| {
            if e.message == "z" {
                cancel.cancel();
            }
            seen.push(e.message);
        })
        .await
        .unwrap();

    assert_eq!(seen, ["x", "y", "z"]);
}

#[tokio::test(start_paused = true)]
async fn polls_on_fixed_interval() {
    let times = Arc::new(Mutex::new(Vec::new()));
    let mut gateway = MockGateway::new();
    {
        let times = times.clone();
        gateway.expect_fetch_logs().returning(move |_, _| {
            let mut times = times.lock().unwrap();
            times.push(tokio::time::Instant::now());
            let n = times.len() as u32;
            Ok(vec![entry(n, "tick")])
        });
    }

    let mut stream = LogStream::new(at(0));
    let cancel = stream.cancel_handle();
    let mut count = 0;

    stream
        .run(&gateway, &target(), "app", |_| {
            count += 1;
            if count == 3 {
                cancel.cancel();
            }
        })
        .await
        .unwrap();

    let times = times.lock().unwrap();
    assert_eq!(times.len(), 3);
    assert_eq!(times[1] - times[0], Duration::from_secs(2));
    assert_eq!(times[2] - times[1], Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn cancelled_before_start_never_polls() {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_logs().never();

    let mut stream = LogStream::new(at(0));
    stream.cancel_handle().cancel();

    stream
        .run(&gateway, &target(), "app", |_| panic!("no entries expected"))
        .await
        .unwrap();
    assert_eq!(stream.watermark(), at(0));
}

#[tokio::test(start_paused = true)]
async fn fetch_error_ends_stream() {
    let mut gateway = MockGateway::new();
    gateway.expect_fetch_logs().times(1).returning(|_, query| {
        Err(GatewayError::Logs {
            service: query.service.clone(),
            source: CommandError::CommandFailed {
                program: Tool::Gcloud.program(),
                args: vec![],
                stderr: "PERMISSION_DENIED".to_owned(),
            },
        })
    });

    let mut stream = LogStream::new(at(0)).with_interval(Duration::from_millis(500));
    let err = stream
        .run(&gateway, &target(), "app", |_| {})
        .await
        .unwrap_err();

    assert!(matches!(err, GatewayError::Logs { .. }));
    assert!(err.is_permission_denied());
}
