use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serde_json::Value;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use ptp_calc_core::client::{
    HttpReply, HttpTransport, RequestClient, RetryPolicy, SubmitError, SubmitStatus, Transport,
    TransportError, DEFAULT_ERROR_MESSAGE, RETRY_HINT,
};
use ptp_calc_core::config::ClientConfig;
use ptp_calc_core::model::{CalcRequest, REQUIRED};
use ptp_calc_core::{Calculator, UnitSystem};

const RESULT_BODY: &str = r#"{
    "calculator": "rl",
    "unit_system": "metric",
    "normalized_inputs": {"bore": 64.0, "stroke": 54.0, "rod_length": 110.0},
    "results": {"rl_ratio": 2.037, "rod_stroke_ratio": 2.037, "displacement_cc": 173.7},
    "meta": {"version": "v1", "timestamp": "2025-03-01T10:00:00Z", "source": "legacy-compatible"}
}"#;

enum Step {
    Reply(u16, &'static str),
    NetworkError,
    Hang,
}

/// Transport that plays back a fixed script and records when it was called
struct Scripted {
    steps: Mutex<VecDeque<Step>>,
    calls: Mutex<Vec<(Instant, String)>>,
}

impl Scripted {
    fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn call_times(&self) -> Vec<Instant> {
        self.calls.lock().unwrap().iter().map(|(at, _)| *at).collect()
    }

    fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for Scripted {
    async fn post_json(&self, path: &str, _body: &Value) -> Result<HttpReply, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((Instant::now(), path.to_string()));
        let step = self.steps.lock().unwrap().pop_front();
        match step {
            Some(Step::Reply(status, body)) => Ok(HttpReply::new(status, body)),
            Some(Step::NetworkError) => Err(TransportError::Network("connection refused".into())),
            Some(Step::Hang) | None => std::future::pending().await,
        }
    }
}

fn rl_request() -> CalcRequest {
    CalcRequest::builder(Calculator::Rl, UnitSystem::Metric)
        .number("bore", 64.0)
        .number("stroke", 54.0)
        .number("rod_length", 110.0)
        .build()
}

fn gaps(times: &[Instant]) -> Vec<u64> {
    times
        .windows(2)
        .map(|pair| (pair[1] - pair[0]).as_millis() as u64)
        .collect()
}

/// Paused-clock elapsed time, allowing for timer wheel rounding
fn assert_elapsed(started: Instant, expected_ms: u64) {
    let elapsed = started.elapsed().as_millis() as u64;
    assert!(
        (expected_ms..expected_ms + 5).contains(&elapsed),
        "expected ~{}ms, got {}ms",
        expected_ms,
        elapsed
    );
}

fn assert_gaps(times: &[Instant], expected_ms: &[u64]) {
    let actual = gaps(times);
    assert_eq!(actual.len(), expected_ms.len(), "gaps: {:?}", actual);
    for (gap, expected) in actual.iter().zip(expected_ms) {
        assert!(
            (*expected..*expected + 5).contains(gap),
            "gaps {:?} do not follow {:?}",
            actual,
            expected_ms
        );
    }
}

#[tokio::test(start_paused = true)]
async fn test_success_after_cold_start() {
    let transport = Scripted::new([
        Step::Reply(503, r#"{"message":"Service Unavailable"}"#),
        Step::Reply(502, ""),
        Step::Reply(504, ""),
        Step::Reply(200, RESULT_BODY),
    ]);
    let client = RequestClient::new(transport, RetryPolicy::default());

    let result = client
        .submit(&rl_request(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(result.number("displacement_cc"), Some(173.7));

    let times = client.transport().call_times();
    assert_gaps(&times, &[800, 1600, 2400]);
    assert_eq!(*client.status().borrow(), SubmitStatus::Finished);
}

#[tokio::test(start_paused = true)]
async fn test_retries_exhausted_reports_transient() {
    let transport = Scripted::new([
        Step::Reply(502, ""),
        Step::Reply(502, ""),
        Step::Reply(502, ""),
        Step::Reply(502, r#"{"message":"Bad Gateway"}"#),
        Step::Reply(200, RESULT_BODY),
    ]);
    let client = RequestClient::new(transport, RetryPolicy::default());
    let started = Instant::now();

    let err = client
        .submit(&rl_request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmitError::Transient {
            status: Some(502),
            message: "Bad Gateway".to_string(),
            attempts: 4,
        }
    );
    assert_eq!(err.retry_hint(), Some(RETRY_HINT));
    assert_eq!(client.transport().call_count(), 4);
    assert_elapsed(started, 4800);
}

#[tokio::test(start_paused = true)]
async fn test_network_error_is_retried() {
    let transport = Scripted::new([Step::NetworkError, Step::Reply(200, RESULT_BODY)]);
    let client = RequestClient::new(transport, RetryPolicy::default());

    assert!(client
        .submit(&rl_request(), &CancellationToken::new())
        .await
        .is_ok());
    assert_gaps(&client.transport().call_times(), &[800]);
}

#[tokio::test(start_paused = true)]
async fn test_server_error_is_not_retried() {
    let transport = Scripted::new([
        Step::Reply(500, r#"{"error_code":"internal","message":"Boom"}"#),
        Step::Reply(200, RESULT_BODY),
    ]);
    let client = RequestClient::new(transport, RetryPolicy::default());

    let err = client
        .submit(&rl_request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmitError::Fatal {
            status: Some(500),
            error_code: Some("internal".to_string()),
            message: "Boom".to_string(),
        }
    );
    assert_eq!(err.retry_hint(), None);
    assert_eq!(client.transport().call_count(), 1);
}

#[tokio::test]
async fn test_missing_inputs_send_nothing() {
    let client = RequestClient::new(Scripted::new([]), RetryPolicy::default());
    let request = CalcRequest::builder(Calculator::Rl, UnitSystem::Metric)
        .number("bore", 64.0)
        .text("stroke", "  ")
        .build();

    let err = client
        .submit(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    let fields = err.field_errors().unwrap();
    assert_eq!(fields.fields(), vec!["rod_length", "stroke"]);
    assert_eq!(fields.get("stroke"), Some(REQUIRED));
    assert_eq!(client.transport().call_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_retry_delay() {
    let transport = Scripted::new([Step::Reply(503, ""), Step::Reply(200, RESULT_BODY)]);
    let client = RequestClient::new(transport, RetryPolicy::default());
    let cancel = CancellationToken::new();
    let started = Instant::now();

    let canceller = async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        cancel.cancel();
    };
    let request = rl_request();
    let (result, ()) = tokio::join!(client.submit(&request, &cancel), canceller);

    assert_eq!(result, Err(SubmitError::Aborted));
    assert_elapsed(started, 100);
    assert_eq!(client.transport().call_count(), 1);
    // no status updates after cancellation
    assert_eq!(*client.status().borrow(), SubmitStatus::WarmingUp { retry: 1 });
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_hanging_request() {
    let client = RequestClient::new(Scripted::new([Step::Hang]), RetryPolicy::default());
    let cancel = CancellationToken::new();

    let canceller = async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        cancel.cancel();
    };
    let request = rl_request();
    let (result, ()) = tokio::join!(client.submit(&request, &cancel), canceller);

    assert!(result.unwrap_err().is_aborted());
    assert_eq!(*client.status().borrow(), SubmitStatus::Loading);
}

#[tokio::test(start_paused = true)]
async fn test_status_reports_warming_up() {
    let transport = Scripted::new([Step::Reply(503, ""), Step::Reply(200, RESULT_BODY)]);
    let client = RequestClient::new(transport, RetryPolicy::default());
    let mut status = client.status();

    let observer = async {
        let mut seen = Vec::new();
        while status.changed().await.is_ok() {
            let current = *status.borrow_and_update();
            seen.push(current);
            if current == SubmitStatus::Finished {
                break;
            }
        }
        seen
    };
    let request = rl_request();
    let cancel = CancellationToken::new();
    let (result, seen) = tokio::join!(client.submit(&request, &cancel), observer);

    assert!(result.is_ok());
    assert!(seen.contains(&SubmitStatus::WarmingUp { retry: 1 }));
    assert_eq!(seen.last(), Some(&SubmitStatus::Finished));
}

#[tokio::test]
async fn test_posts_to_calculator_endpoint() {
    let transport = Scripted::new([Step::Reply(200, RESULT_BODY)]);
    let client = RequestClient::new(transport, RetryPolicy::no_retry());
    client
        .submit(&rl_request(), &CancellationToken::new())
        .await
        .unwrap();
    let calls = client.transport().calls.lock().unwrap();
    assert_eq!(calls[0].1, "/api/v1/calc/rl");
}

/// Consume one request: headers plus `Content-Length` bytes of body
async fn read_request(stream: &mut TcpStream) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                return Ok(());
            }
        }
    }
}

#[tokio::test]
async fn test_truncated_gateway_body_is_still_retried() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let accepted = Arc::new(AtomicUsize::new(0));
    let counter = accepted.clone();

    // announces 100 bytes of body, sends 5, hangs up
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            let _ = read_request(&mut stream).await;
            let _ = stream
                .write_all(b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 100\r\n\r\nshort")
                .await;
            let _ = stream.shutdown().await;
        }
    });

    let config = ClientConfig {
        base_url: format!("http://{}", addr),
        timeout_ms: 5_000,
        ..ClientConfig::default()
    };
    let client = RequestClient::new(
        HttpTransport::new(&config).unwrap(),
        RetryPolicy::from_delays_ms(&[10]),
    );

    let err = client
        .submit(&rl_request(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(
        err,
        SubmitError::Transient {
            status: Some(503),
            message: DEFAULT_ERROR_MESSAGE.to_string(),
            attempts: 2,
        }
    );
    assert_eq!(accepted.load(Ordering::SeqCst), 2);
}
