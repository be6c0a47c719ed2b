//! Downloader behavior against a scripted HTTP client.
//!
//! All timing tests run on tokio's paused clock, so backoff and stall windows
//! elapse instantly while `Instant` still reports their full length.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use debsnap_fetch::{BoxStream, Downloader, FetchError, FetchOptions, HttpClient, HttpResponse};
use futures_util::StreamExt;
use tokio::time::Instant;

#[derive(Debug)]
struct TestError(String);

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for TestError {}

enum BodyEnd {
    Complete,
    Error,
    Stall,
}

enum Step {
    ConnectError,
    Respond {
        status: u16,
        content_length: Option<u64>,
        chunks: Vec<&'static [u8]>,
        end: BodyEnd,
    },
}

fn ok(body: &'static [u8]) -> Step {
    Step::Respond {
        status: 200,
        content_length: Some(body.len() as u64),
        chunks: vec![body],
        end: BodyEnd::Complete,
    }
}

fn status(code: u16) -> Step {
    Step::Respond {
        status: code,
        content_length: None,
        chunks: vec![],
        end: BodyEnd::Complete,
    }
}

struct Request {
    at: Instant,
    headers: Vec<(String, String)>,
}

/// Plays back `steps` in order, then answers 200 "ok" forever.
#[derive(Default)]
struct ScriptedClient {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedClient {
    fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    fn range_headers(&self) -> Vec<Option<String>> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.headers.iter().find(|(k, _)| k == "Range").map(|(_, v)| v.clone()))
            .collect()
    }

    fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

impl HttpClient for ScriptedClient {
    type Error = TestError;

    async fn get(
        &self,
        _url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse<TestError>, TestError> {
        self.requests.lock().unwrap().push(Request {
            at: Instant::now(),
            headers: headers.to_vec(),
        });
        let step = self.steps.lock().unwrap().pop_front().unwrap_or_else(|| ok(b"ok"));

        match step {
            Step::ConnectError => Err(TestError("connection refused".into())),
            Step::Respond {
                status,
                content_length,
                chunks,
                end,
            } => {
                let head = futures_util::stream::iter(
                    chunks.into_iter().map(|c| Ok(Bytes::from_static(c))).collect::<Vec<_>>(),
                );
                let body: BoxStream<'static, Result<Bytes, TestError>> = match end {
                    BodyEnd::Complete => Box::pin(head),
                    BodyEnd::Error => Box::pin(head.chain(futures_util::stream::iter(vec![Err(
                        TestError("connection reset".into()),
                    )]))),
                    BodyEnd::Stall => Box::pin(head.chain(futures_util::stream::pending())),
                };
                Ok(HttpResponse {
                    status,
                    content_length,
                    last_modified: Some("Tue, 15 Nov 1994 08:12:31 GMT".into()),
                    body,
                })
            }
        }
    }
}

fn options() -> FetchOptions {
    FetchOptions::default().max_rate(None)
}

#[tokio::test(start_paused = true)]
async fn recovers_after_three_connection_failures() {
    let client = ScriptedClient::new(vec![
        Step::ConnectError,
        Step::ConnectError,
        Step::ConnectError,
        ok(b"package contents"),
    ]);
    let downloader = Downloader::new(client, options());

    let start = Instant::now();
    let fetched = downloader.fetch("https://mirror.test/pool/f/foo.dsc").await.unwrap();
    let elapsed = start.elapsed();

    assert_eq!(&fetched.bytes[..], b"package contents");
    assert_eq!(fetched.outcome.attempts, 4);
    assert_eq!(fetched.outcome.status, 200);
    // 4 s + 16 s + 64 s of backoff; pacing is already satisfied by each sleep.
    assert!(elapsed >= Duration::from_secs(84), "elapsed {elapsed:?}");
    assert!(elapsed < Duration::from_secs(86), "elapsed {elapsed:?}");

    let stats = downloader.governor().stats();
    assert_eq!(stats.connect_errors, 3);
    assert_eq!(stats.successes, 1);
}

#[tokio::test(start_paused = true)]
async fn resumes_partial_transfer_with_range() {
    let client = ScriptedClient::new(vec![
        Step::Respond {
            status: 200,
            content_length: Some(10),
            chunks: vec![b"hello"],
            end: BodyEnd::Complete,
        },
        Step::Respond {
            status: 206,
            content_length: Some(5),
            chunks: vec![b"world"],
            end: BodyEnd::Complete,
        },
    ]);
    let downloader = Downloader::new(client, options());

    let fetched = downloader.fetch("https://mirror.test/a").await.unwrap();

    assert_eq!(&fetched.bytes[..], b"helloworld");
    assert_eq!(fetched.outcome.bytes_received, 10);
    assert_eq!(fetched.outcome.status, 206);
    assert_eq!(downloader.governor().stats().partial_transfers, 1);
}

#[tokio::test(start_paused = true)]
async fn range_ignored_by_server_restarts_cleanly() {
    let client = ScriptedClient::new(vec![
        Step::Respond {
            status: 200,
            content_length: Some(10),
            chunks: vec![b"hel"],
            end: BodyEnd::Error,
        },
        ok(b"helloworld"),
    ]);
    let downloader = Downloader::new(client, options());

    let fetched = downloader.fetch("https://mirror.test/a").await.unwrap();
    assert_eq!(&fetched.bytes[..], b"helloworld");
}

#[tokio::test(start_paused = true)]
async fn http_error_discards_partial_bytes() {
    let client = Arc::new(ScriptedClient::new(vec![
        Step::Respond {
            status: 200,
            content_length: Some(10),
            chunks: vec![b"hello"],
            end: BodyEnd::Error,
        },
        status(503),
        ok(b"HELLOWORLD"),
    ]));
    let downloader = Downloader::new(SharedClient(Arc::clone(&client)), options());

    let fetched = downloader.fetch("https://mirror.test/a").await.unwrap();

    assert_eq!(&fetched.bytes[..], b"HELLOWORLD");
    assert_eq!(
        client.range_headers(),
        vec![None, Some("bytes=5-".to_string()), None]
    );
}

#[tokio::test(start_paused = true)]
async fn not_found_is_not_retried() {
    let client = Arc::new(ScriptedClient::new(vec![status(404)]));
    let downloader = Downloader::new(SharedClient(Arc::clone(&client)), options());

    let err = downloader.fetch("https://mirror.test/missing").await.unwrap_err();

    assert!(matches!(err, FetchError::NotFound { .. }));
    assert_eq!(client.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn generic_http_errors_exhaust_attempts() {
    let client = Arc::new(ScriptedClient::new((0..3).map(|_| status(500)).collect()));
    let downloader = Downloader::new(SharedClient(Arc::clone(&client)), options().max_attempts(3));

    let err = downloader.fetch("https://mirror.test/a").await.unwrap_err();

    match err {
        FetchError::RetriesExhausted { attempts, last } => {
            assert_eq!(attempts, 3);
            assert!(matches!(*last, FetchError::HttpStatus { status: 500 }));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(client.request_count(), 3);
}

#[tokio::test(start_paused = true)]
async fn stalled_transfer_times_out() {
    let client = ScriptedClient::new(vec![Step::Respond {
        status: 200,
        content_length: Some(100),
        chunks: vec![b"first bytes"],
        end: BodyEnd::Stall,
    }]);
    let downloader = Downloader::new(client, options().max_attempts(1));

    let start = Instant::now();
    let err = downloader.fetch("https://mirror.test/slow").await.unwrap_err();

    assert!(start.elapsed() >= Duration::from_secs(600));
    match err {
        FetchError::RetriesExhausted { last, .. } => {
            assert!(matches!(*last, FetchError::Timeout { .. }))
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(downloader.governor().stats().timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn stall_resumes_on_retry() {
    let client = Arc::new(ScriptedClient::new(vec![
        Step::Respond {
            status: 200,
            content_length: Some(8),
            chunks: vec![b"abcd"],
            end: BodyEnd::Stall,
        },
        Step::Respond {
            status: 206,
            content_length: Some(4),
            chunks: vec![b"efgh"],
            end: BodyEnd::Complete,
        },
    ]));
    let downloader = Downloader::new(SharedClient(Arc::clone(&client)), options());

    let fetched = downloader.fetch("https://mirror.test/a").await.unwrap();

    assert_eq!(&fetched.bytes[..], b"abcdefgh");
    assert_eq!(client.range_headers(), vec![None, Some("bytes=4-".to_string())]);
}

#[tokio::test(start_paused = true)]
async fn concurrent_downloads_share_pacing() {
    let client = Arc::new(ScriptedClient::default());
    let downloader = Arc::new(Downloader::new(SharedClient(Arc::clone(&client)), options()));

    let mut handles = Vec::new();
    for i in 0..6 {
        let downloader = Arc::clone(&downloader);
        handles.push(tokio::spawn(async move {
            downloader.fetch(&format!("https://mirror.test/{i}")).await.unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let mut starts: Vec<Instant> = client.requests.lock().unwrap().iter().map(|r| r.at).collect();
    starts.sort();
    let total = *starts.last().unwrap() - starts[0];
    let mean = total / (starts.len() as u32 - 1);
    assert!(mean >= Duration::from_millis(1500), "mean spacing {mean:?}");
}

#[tokio::test(start_paused = true)]
async fn zero_valued_config_does_not_throttle_or_stall() {
    let options: FetchOptions =
        serde_json::from_str(r#"{ "max_rate_bytes_per_sec": 0, "stall_timeout_secs": 0, "max_attempts": 1 }"#)
            .unwrap();
    const HALF: &[u8] = &[b'x'; 32];
    let client = ScriptedClient::new(vec![Step::Respond {
        status: 200,
        content_length: Some(64),
        chunks: vec![HALF, HALF],
        end: BodyEnd::Complete,
    }]);
    let downloader = Downloader::new(client, options);
    assert_eq!(downloader.options().max_rate_bytes_per_sec, None);
    assert_eq!(downloader.options().stall_window(), Duration::from_secs(600));

    let start = Instant::now();
    let fetched = downloader.fetch("https://mirror.test/pool/a.dsc").await.unwrap();

    assert_eq!(fetched.bytes.len(), 64);
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn rejects_non_http_urls() {
    let downloader = Downloader::new(ScriptedClient::default(), options());
    let err = downloader.fetch("file:///etc/passwd").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

/// Lets a test keep a handle on the client after moving it into a downloader.
struct SharedClient(Arc<ScriptedClient>);

impl HttpClient for SharedClient {
    type Error = TestError;

    async fn get(
        &self,
        url: &str,
        headers: &[(String, String)],
    ) -> Result<HttpResponse<TestError>, TestError> {
        self.0.get(url, headers).await
    }
}
