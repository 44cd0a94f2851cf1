//! Common test utilities and helpers

use async_trait::async_trait;
use feedwatch::discord::Notifier;
use feedwatch::feed::FeedSource;
use feedwatch::notify::{Embed, MessageStyle};
use feedwatch::schema::RowLayout;
use feedwatch::tsv::Delimiters;
use feedwatch::{Result, Row, Snapshot, WatchError, WatchSettings};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Build a snapshot from string slices
pub fn snap(rows: &[&[&str]]) -> Snapshot {
    rows.iter().map(|r| r.iter().copied().collect::<Row>()).collect()
}

/// Render rows as a feed payload with real tab/newline separators
pub fn payload(stamp: &str, rows: &[&[&str]]) -> String {
    let mut out = stamp.to_string();
    for row in rows {
        out.push('\n');
        out.push_str(&row.join("\t"));
    }
    out
}

pub fn settings(layout: RowLayout, batch_size: usize) -> WatchSettings {
    WatchSettings {
        interval: Duration::from_millis(10),
        batch_size,
        delimiters: Delimiters::tsv(),
        style: MessageStyle::with_layout(layout),
        reject_malformed: false,
    }
}

/// Like [`payload`], but with the literal `\n`/`\t` escapes the live feed sends
pub fn escaped_payload(stamp: &str, rows: &[&[&str]]) -> String {
    payload(stamp, rows).replace('\t', "\\t").replace('\n', "\\n")
}

/// Feed that replays a fixed script of responses
#[derive(Default)]
pub struct ScriptedFeed {
    responses: Mutex<VecDeque<Result<String>>>,
}

impl ScriptedFeed {
    pub fn new(responses: Vec<Result<String>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
        }
    }
}

#[async_trait]
impl FeedSource for ScriptedFeed {
    async fn fetch(&self) -> Result<String> {
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(WatchError::FeedStatus { status: 503 }))
    }
}

/// Notifier that records every embed it is asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<Embed>>,
    pub channel_missing: bool,
    /// Zero-based indices of send calls that should fail
    pub failing_sends: Vec<usize>,
    calls: Mutex<usize>,
}

impl RecordingNotifier {
    pub fn without_channel() -> Self {
        Self {
            channel_missing: true,
            ..Self::default()
        }
    }

    pub fn failing_on(indices: &[usize]) -> Self {
        Self {
            failing_sends: indices.to_vec(),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Embed> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn resolve_channel(&self) -> Result<()> {
        if self.channel_missing {
            return Err(WatchError::channel_unavailable("0", "unknown channel"));
        }
        Ok(())
    }

    async fn send(&self, embed: &Embed) -> Result<()> {
        let call = {
            let mut calls = self.calls.lock().unwrap();
            let call = *calls;
            *calls += 1;
            call
        };
        if self.failing_sends.contains(&call) {
            return Err(WatchError::send_status(500, "internal error"));
        }
        self.sent.lock().unwrap().push(embed.clone());
        Ok(())
    }
}

/// A request observed by [`MockServer`]
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

type Router = dyn Fn(&str, &str) -> (u16, String) + Send + Sync;

/// Minimal HTTP/1.1 server answering each connection once and closing it
pub struct MockServer {
    pub base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockServer {
    pub async fn start<R>(router: R) -> Self
    where
        R: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let router: Arc<Router> = Arc::new(router);

        let recorded = requests.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut stream, _)) = listener.accept().await else {
                    break;
                };
                let recorded = recorded.clone();
                let router = router.clone();
                tokio::spawn(async move {
                    let Some(request) = read_request(&mut stream).await else {
                        return;
                    };
                    let (status, body) = router(&request.method, &request.path);
                    recorded.lock().unwrap().push(request);
                    let response = format!(
                        "HTTP/1.1 {} Status\r\nContent-Type: application/json; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        status,
                        body.len(),
                        body
                    );
                    let _ = stream.write_all(response.as_bytes()).await;
                    let _ = stream.shutdown().await;
                });
            }
        });

        Self {
            base_url: format!("http://{}", addr),
            requests,
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn read_request(stream: &mut tokio::net::TcpStream) -> Option<RecordedRequest> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];

    let head_end = loop {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..head_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next()?.split_whitespace();
    let method = request_line.next()?.to_string();
    let path = request_line.next()?.to_string();

    let headers: Vec<(String, String)> = lines
        .filter_map(|l| l.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();

    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < head_end + content_length {
        let n = stream.read(&mut chunk).await.ok()?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }

    let body_end = buf.len().min(head_end + content_length);
    let body = String::from_utf8_lossy(&buf[head_end..body_end]).to_string();

    Some(RecordedRequest {
        method,
        path,
        headers,
        body,
    })
}
