//! Scripted transports shared by the integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use sendchat_core::protocol::types::{BatchRequest, ChatResponse, CompletionChunk, CompletionRequest};
use sendchat_core::providers::{
    BatchTransport, CompletionStream, ProviderError, ProviderResult, RetryPolicy,
    StreamingTransport, TextStream,
};
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

/// Route log output through the test harness; filter with `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Shared buffer that collects formatted log lines
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Subscriber writing plain-text events at WARN and above into this buffer
    pub fn subscriber(&self) -> impl tracing::Subscriber + Send + Sync {
        let writer = self.clone();
        tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Retry policy with millisecond delays so retry tests finish quickly
pub fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay_ms: 1,
        exponential_base: 1.0,
        ..Default::default()
    }
}

type BatchResponder = Box<dyn Fn(u32) -> ProviderResult<ChatResponse> + Send + Sync>;

/// Batch transport whose response depends on the call number (0-based)
pub struct ScriptedBatchTransport {
    responder: BatchResponder,
    deltas: Vec<String>,
    calls: AtomicU32,
    stream_calls: AtomicU32,
    last_request: Mutex<Option<BatchRequest>>,
}

impl ScriptedBatchTransport {
    pub fn new(responder: impl Fn(u32) -> ProviderResult<ChatResponse> + Send + Sync + 'static) -> Self {
        Self {
            responder: Box::new(responder),
            deltas: Vec::new(),
            calls: AtomicU32::new(0),
            stream_calls: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Always answer with `content`
    pub fn replying(content: &str) -> Self {
        let content = content.to_string();
        Self::new(move |_| Ok(ChatResponse::from_content(content.clone())))
    }

    /// Always fail with `error`
    pub fn failing(error: ProviderError) -> Self {
        Self::new(move |_| Err(error.clone()))
    }

    pub fn with_deltas(mut self, deltas: &[&str]) -> Self {
        self.deltas = deltas.iter().map(|d| d.to_string()).collect();
        self
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn stream_calls(&self) -> u32 {
        self.stream_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<BatchRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl BatchTransport for ScriptedBatchTransport {
    async fn create(&self, request: &BatchRequest) -> ProviderResult<ChatResponse> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        (self.responder)(n)
    }

    async fn create_stream(&self, request: &BatchRequest) -> ProviderResult<TextStream> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        self.stream_calls.fetch_add(1, Ordering::SeqCst);
        let items: Vec<ProviderResult<String>> = self.deltas.iter().cloned().map(Ok).collect();
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

type OpenResponder = Box<dyn Fn(u32) -> ProviderResult<()> + Send + Sync>;

/// Streaming transport that replays a fixed list of stream items
pub struct ScriptedStreamingTransport {
    items: Vec<ProviderResult<CompletionChunk>>,
    on_open: OpenResponder,
    opens: AtomicU32,
    last_request: Mutex<Option<CompletionRequest>>,
}

impl ScriptedStreamingTransport {
    pub fn new(items: Vec<ProviderResult<CompletionChunk>>) -> Self {
        Self {
            items,
            on_open: Box::new(|_| Ok(())),
            opens: AtomicU32::new(0),
            last_request: Mutex::new(None),
        }
    }

    /// Stream that yields `fragments` in order
    pub fn fragments(fragments: &[&str]) -> Self {
        Self::new(
            fragments
                .iter()
                .map(|f| Ok(CompletionChunk::new(*f)))
                .collect(),
        )
    }

    /// Decide per open attempt (0-based) whether opening succeeds
    pub fn with_open(mut self, on_open: impl Fn(u32) -> ProviderResult<()> + Send + Sync + 'static) -> Self {
        self.on_open = Box::new(on_open);
        self
    }

    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.last_request.lock().unwrap().clone()
    }
}

#[async_trait]
impl StreamingTransport for ScriptedStreamingTransport {
    async fn open_stream(&self, request: &CompletionRequest) -> ProviderResult<CompletionStream> {
        *self.last_request.lock().unwrap() = Some(request.clone());
        let n = self.opens.fetch_add(1, Ordering::SeqCst);
        (self.on_open)(n)?;
        Ok(Box::pin(futures::stream::iter(self.items.clone())))
    }

    async fn count_tokens(&self, _model: &str, text: &str) -> ProviderResult<usize> {
        Ok(text.split_whitespace().count())
    }
}
