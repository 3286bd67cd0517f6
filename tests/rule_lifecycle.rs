use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::io::AsyncReadExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use cheddarproxy_rules::api::rule_api::{
    active_rule, create_default_config, init_core, install_rule, load_rule,
};
use cheddarproxy_rules::models::{
    ConnectDecision, Decision, ErrorContext, ErrorKind, HttpMethod, ResponseDetail,
    ResponseSnapshot, TransactionSnapshot,
};
use cheddarproxy_rules::rules::builder::TRANSPARENT_GIF;
use cheddarproxy_rules::rules::{DefaultRule, Reporter, RuleHooks, SideChannelMessage};

#[derive(Default)]
struct CollectingReporter {
    messages: Mutex<Vec<SideChannelMessage>>,
}

impl Reporter for CollectingReporter {
    fn report(&self, message: SideChannelMessage, _path: &str) {
        self.messages.lock().unwrap().push(message);
    }
}

fn snapshot(url: &str) -> TransactionSnapshot {
    TransactionSnapshot::from_url(HttpMethod::Get, url).unwrap()
}

fn available_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

/// Read one HTTP/1.1 request, headers plus `Content-Length` body.
async fn read_request(socket: &mut TcpStream) -> String {
    let mut received = Vec::new();
    let mut buf = vec![0u8; 4096];
    loop {
        let n = socket.read(&mut buf).await.unwrap_or(0);
        if n == 0 {
            break;
        }
        received.extend_from_slice(&buf[..n]);
        let text = String::from_utf8_lossy(&received);
        if let Some((head, body)) = text.split_once("\r\n\r\n") {
            let length = head
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if body.len() >= length {
                break;
            }
        }
    }
    String::from_utf8_lossy(&received).into_owned()
}

fn default_rule() -> (Arc<dyn RuleHooks>, Arc<CollectingReporter>) {
    let reporter = Arc::new(CollectingReporter::default());
    let rule = DefaultRule::with_reporter(&create_default_config(), reporter.clone()).unwrap();
    (Arc::new(rule), reporter)
}

#[tokio::test]
async fn image_request_is_answered_with_gif() {
    let (rule, _) = default_rule();
    let decision = rule
        .on_request(&snapshot("https://p.byteimg.com/img/1.jpg"))
        .await;

    let response = decision.response().expect("image mock");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type(), Some("image/gif"));
    assert_eq!(response.body.resolve().unwrap(), *TRANSPARENT_GIF);
}

#[tokio::test]
async fn search_request_is_answered_with_empty_json() {
    let (rule, _) = default_rule();
    let decision = rule
        .on_request(&snapshot("https://www.google.com/search?q=x"))
        .await;

    let response = decision.response().expect("json mock");
    assert_eq!(response.status_code, 200);
    assert_eq!(response.content_type(), Some("application/json"));
    assert_eq!(response.body.resolve().unwrap(), b"[]");
}

#[tokio::test]
async fn other_request_passes_through() {
    let (rule, _) = default_rule();
    let decision = rule.on_request(&snapshot("https://example.com/other")).await;
    assert_eq!(decision, Decision::PassThrough);
}

#[tokio::test]
async fn full_transaction_captures_feed_once() {
    let (rule, reporter) = default_rule();
    let request = snapshot("https://aweme.snssdk.com/aweme/v1/feed/?count=6")
        .with_header("Accept", "application/json");

    assert!(rule.on_request(&request).await.is_pass_through());

    let detail = ResponseDetail::from(
        ResponseSnapshot::new(200, r#"{"status_code":0,"aweme_list":[{"aweme_id":"1"}]}"#)
            .with_header("Content-Type", "application/json"),
    );
    assert!(rule.on_response(&request, &detail).await.is_pass_through());

    let messages = reporter.messages.lock().unwrap().clone();
    assert_eq!(
        messages,
        vec![SideChannelMessage {
            json: r#"{"status_code":0,"aweme_list":[{"aweme_id":"1"}]}"#.to_string(),
        }]
    );
}

#[tokio::test]
async fn concurrent_transactions_share_one_rule() {
    let (rule, reporter) = default_rule();
    let mut tasks = Vec::new();
    for i in 0..16 {
        let rule = rule.clone();
        tasks.push(tokio::spawn(async move {
            let request = snapshot(&format!("https://api.example.com/aweme/v1/feed/?page={}", i));
            let detail = ResponseDetail::from(ResponseSnapshot::new(200, format!("[{}]", i)));
            rule.on_response(&request, &detail).await
        }));
    }
    for task in tasks {
        assert!(task.await.unwrap().is_pass_through());
    }
    assert_eq!(reporter.messages.lock().unwrap().len(), 16);
}

#[tokio::test]
async fn connect_and_error_phases_stay_passive() {
    let (rule, reporter) = default_rule();
    let request = snapshot("https://p.byteimg.com/");

    assert_eq!(rule.on_connect(&request).await, None::<ConnectDecision>);
    rule.on_request_error(
        &request,
        &ErrorContext::new(ErrorKind::UpstreamRequest, "connection reset"),
    )
    .await;
    rule.on_connect_error(
        &request,
        &ErrorContext::new(ErrorKind::UpstreamConnect, "handshake failed"),
    )
    .await;

    assert!(reporter.messages.lock().unwrap().is_empty());
}

#[tokio::test]
async fn rule_loads_from_config_file_and_installs_once() {
    let _ = init_core(None);

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(
        &path,
        r#"
        intercept_https = true

        [collector]
        host = "127.0.0.1"
        port = 18080

        [[mock_rules]]
        pattern = "tracker\\.example"
        kind = "empty_json"
        "#,
    )
    .unwrap();

    let rule = load_rule(Some(&path)).unwrap();
    assert!(rule
        .on_request(&snapshot("https://p.byteimg.com/img/1.jpg"))
        .await
        .is_pass_through());
    assert!(rule
        .on_request(&snapshot("https://TRACKER.example/pixel"))
        .await
        .response()
        .is_some());
    assert_eq!(
        rule.on_connect(&snapshot("https://example.com/")).await,
        Some(ConnectDecision::Intercept)
    );

    assert!(load_rule(Some(&dir.path().join("missing.toml"))).is_err());

    install_rule(Arc::new(rule)).unwrap();
    assert!(active_rule().is_some());
    let second = load_rule(None).unwrap();
    assert!(install_rule(Arc::new(second)).is_err());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[ignore = "Requires opening local TCP ports"]
async fn capture_does_not_wait_for_a_silent_collector() {
    let listener = TcpListener::bind(("127.0.0.1", available_port()))
        .await
        .unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Accepts reports but never answers them
    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let _ = tx.send(read_request(&mut socket).await);
                tokio::time::sleep(Duration::from_secs(30)).await;
                drop(socket);
            });
        }
    });

    let mut config = create_default_config();
    config.collector.port = Some(port);
    config.collector.timeout_ms = None;
    let rule = DefaultRule::from_config(&config).unwrap();

    let request = snapshot("https://aweme.snssdk.com/aweme/v1/feed/?count=6");
    let detail = ResponseDetail::from(ResponseSnapshot::new(200, r#"{"aweme_list":[]}"#));

    let started = Instant::now();
    assert!(rule.on_response(&request, &detail).await.is_pass_through());
    assert!(started.elapsed() < Duration::from_millis(100));

    let received = tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap();
    assert!(received.starts_with("POST / HTTP/1.1"));
    assert!(received
        .to_ascii_lowercase()
        .contains("content-type: application/x-www-form-urlencoded"));
    assert!(received.ends_with("json=%7B%22aweme_list%22%3A%5B%5D%7D"));

    // Exactly one report
    assert!(tokio::time::timeout(Duration::from_millis(300), rx.recv())
        .await
        .is_err());
}
