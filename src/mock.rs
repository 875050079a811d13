//! Mock implementations of the pipeline seams, for tests.
//!
//! - [`ScriptedAsk`]: replays a fixed list of model responses
//! - [`MockSource`]: returns a fixed list of news items
//! - [`MockPublisher`]: records posts and answers with a fixed outcome
//! - [`serve_once`]: loopback HTTP server answering one request with a
//!   canned response, for exercising the real HTTP adapters

use crate::api::{AskAsync, AskError};
use crate::fetch::NewsSource;
use crate::models::NewsItem;
use crate::publish::{PagePost, Publish, PublishStrategy};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Model backend that replays scripted responses in order.
#[derive(Debug)]
pub struct ScriptedAsk {
    script: Mutex<VecDeque<Result<String, AskError>>>,
    prompts: Mutex<Vec<String>>,
    call_times: Mutex<Vec<Instant>>,
}

impl ScriptedAsk {
    pub fn new(script: Vec<Result<String, AskError>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            prompts: Mutex::new(Vec::new()),
            call_times: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Time elapsed between consecutive calls.
    pub fn gaps(&self) -> Vec<Duration> {
        let times = self.call_times.lock().unwrap();
        times.windows(2).map(|w| w[1] - w[0]).collect()
    }
}

impl AskAsync for ScriptedAsk {
    async fn ask(&self, prompt: &str) -> Result<String, AskError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.call_times.lock().unwrap().push(Instant::now());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AskError::Transport("script exhausted".to_string())))
    }
}

/// News source returning a fixed list.
#[derive(Debug, Default)]
pub struct MockSource {
    pub items: Vec<NewsItem>,
}

impl NewsSource for MockSource {
    async fn fetch(&self) -> Vec<NewsItem> {
        self.items.clone()
    }
}

/// A post the [`MockPublisher`] was asked to make.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedPost {
    pub caption: String,
    pub image_url: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug)]
pub struct MockPublisher {
    pub configured: bool,
    pub strategy: PublishStrategy,
    pub succeed: bool,
    pub posts: Mutex<Vec<RecordedPost>>,
}

impl MockPublisher {
    pub fn new(configured: bool, strategy: PublishStrategy, succeed: bool) -> Self {
        Self {
            configured,
            strategy,
            succeed,
            posts: Mutex::new(Vec::new()),
        }
    }

    pub fn posts(&self) -> Vec<RecordedPost> {
        self.posts.lock().unwrap().clone()
    }
}

impl Publish for MockPublisher {
    fn is_configured(&self) -> bool {
        self.configured
    }

    fn strategy(&self) -> PublishStrategy {
        self.strategy
    }

    async fn publish(&self, post: &PagePost<'_>) -> bool {
        self.posts.lock().unwrap().push(RecordedPost {
            caption: post.caption.to_string(),
            image_url: post.image_url.map(str::to_string),
            link: post.link.map(str::to_string),
        });
        self.succeed
    }
}

/// Answer exactly one HTTP request on a loopback port with `status_line`
/// (e.g. `"429 Too Many Requests"`) and a JSON `body`.
///
/// Returns the server's base URL and a handle resolving to the raw request
/// it received (request line, headers and body).
pub async fn serve_once(status_line: &str, body: &str) -> (String, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    let response = format!(
        "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );

    let handle = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.unwrap();
        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = stream.read(&mut buf).await.unwrap();
            if n == 0 {
                break;
            }
            raw.extend_from_slice(&buf[..n]);
            if request_complete(&raw) {
                break;
            }
        }
        stream.write_all(response.as_bytes()).await.unwrap();
        stream.shutdown().await.unwrap();
        String::from_utf8_lossy(&raw).into_owned()
    });

    (base, handle)
}

/// Headers received and `Content-Length` bytes of body after them.
fn request_complete(raw: &[u8]) -> bool {
    let Some(end) = raw.windows(4).position(|w| w == b"\r\n\r\n") else {
        return false;
    };
    let head = String::from_utf8_lossy(&raw[..end]).to_ascii_lowercase();
    let content_length = head
        .lines()
        .find_map(|l| l.strip_prefix("content-length:"))
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    raw.len() >= end + 4 + content_length
}
