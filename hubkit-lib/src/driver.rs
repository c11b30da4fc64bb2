//! Storage driver contract.
//!
//! The hub never stores bytes itself. A [`Driver`] receives a
//! [`WriteDescriptor`] whose content stream is handed over unread, and
//! reports where the object can be read back.

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{ready, Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

use crate::errors::BoxError;

/// Content type used when the request does not name one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Single-pass request body.
pub type ContentStream = Box<dyn AsyncRead + Send + Unpin>;

/// Result type for driver operations.
pub type DriverResult<T> = std::result::Result<T, BoxError>;

/// One write, owned by the driver for the duration of the call.
pub struct WriteDescriptor {
    /// Namespace root, always the address the write was authorized for.
    pub storage_top_level: String,
    /// Path inside the namespace, exactly as requested.
    pub path: String,
    /// MIME type to store alongside the object.
    pub content_type: String,
    /// Declared body length; `None` when the client streams without one.
    pub content_length: Option<u64>,
    /// Body bytes. Readable once.
    pub content: ContentStream,
}

impl WriteDescriptor {
    /// Object key: `storage_top_level + "/" + path`, with no normalization.
    pub fn storage_key(&self) -> String {
        storage_key(&self.storage_top_level, &self.path)
    }
}

impl fmt::Debug for WriteDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriteDescriptor")
            .field("storage_top_level", &self.storage_top_level)
            .field("path", &self.path)
            .field("content_type", &self.content_type)
            .field("content_length", &self.content_length)
            .finish_non_exhaustive()
    }
}

/// One page of a listing.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListFilesResult {
    /// Paths relative to the namespace root.
    pub entries: Vec<String>,
    /// Continuation token for the next page.
    pub page: Option<String>,
}

/// Storage backend consumed by the hub.
#[async_trait]
pub trait Driver: Send + Sync {
    /// URL prefix under which stored objects are readable.
    fn read_url_prefix(&self) -> String;

    /// Store the descriptor's content and return its read URL.
    async fn perform_write(&self, descriptor: WriteDescriptor) -> DriverResult<String>;

    /// List objects under `storage_top_level`, resuming from `page`.
    async fn list_files(
        &self,
        storage_top_level: &str,
        page: Option<&str>,
    ) -> DriverResult<ListFilesResult>;
}

/// Object key for `path` inside the `address` namespace.
///
/// A path that already starts with `/` yields a doubled separator; callers
/// rely on that exact key.
pub fn storage_key(address: &str, path: &str) -> String {
    format!("{}/{}", address, path)
}

/// Bytes read through a [`LimitedStream`], readable after the stream has
/// been handed to a driver.
#[derive(Clone, Debug, Default)]
pub struct ReadCounter {
    read: Arc<AtomicU64>,
}

impl ReadCounter {
    /// Bytes read so far.
    pub fn bytes_read(&self) -> u64 {
        self.read.load(Ordering::SeqCst)
    }

    fn add(&self, n: u64) -> u64 {
        self.read.fetch_add(n, Ordering::SeqCst) + n
    }
}

/// Content stream that fails once more than `limit` bytes have been read.
pub struct LimitedStream {
    inner: ContentStream,
    limit: u64,
    counter: ReadCounter,
}

impl LimitedStream {
    /// Wrap `inner`, returning the stream and a handle on its byte count.
    pub fn new(inner: ContentStream, limit: u64) -> (Self, ReadCounter) {
        let counter = ReadCounter::default();
        let stream = Self {
            inner,
            limit,
            counter: counter.clone(),
        };
        (stream, counter)
    }
}

impl AsyncRead for LimitedStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let before = buf.filled().len();
        ready!(Pin::new(&mut self.inner).poll_read(cx, buf))?;
        let read = (buf.filled().len() - before) as u64;

        let total = self.counter.add(read);
        if total > self.limit {
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("body exceeds {} bytes", self.limit),
            )));
        }
        Poll::Ready(Ok(()))
    }
}
