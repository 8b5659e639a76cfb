//! Object-store client boundary.
//!
//! The cache never talks to the network itself. It consumes an
//! [`ObjectClient`] which issues range GET / HEAD requests and hands back
//! [`PendingFetch`] handles that resolve to byte streams. Retry and timeout
//! policy, if any, belong behind this boundary — the cache does not retry.
//!
//! - [`memory`]: in-process client backed by an owned byte buffer, used for
//!   tests and benchmarks

pub mod memory;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::io::AsyncRead;

use crate::range::ByteRange;

/// Errors surfaced by an object-store client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("requested range {0} is not satisfiable for this object")]
    RangeNotSatisfiable(ByteRange),
}

/// Asynchronous handle to an in-progress range fetch.
///
/// Resolves to the byte stream for the requested range once the store has
/// started delivering it. Dropping the handle aborts the fetch.
pub type PendingFetch = BoxFuture<'static, Result<ObjectContent, ClientError>>;

/// The byte stream delivered for one fetched range.
///
/// Carries exactly `range.size()` bytes on a well-behaved store; the cache
/// treats a shorter stream as a truncated read.
pub struct ObjectContent {
    stream: Box<dyn AsyncRead + Send + Unpin>,
}

impl ObjectContent {
    /// Wrap a readable byte stream.
    pub fn new(stream: impl AsyncRead + Send + Unpin + 'static) -> Self {
        Self {
            stream: Box::new(stream),
        }
    }

    /// Consume the content, yielding the underlying stream.
    pub fn into_stream(self) -> Box<dyn AsyncRead + Send + Unpin> {
        self.stream
    }
}

impl std::fmt::Debug for ObjectContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObjectContent").finish_non_exhaustive()
    }
}

/// A client capable of serving ranged reads of one remote object.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    /// Begin fetching `range`. Returns immediately; the returned handle
    /// resolves once the object store starts streaming the range.
    fn fetch_range(&self, range: ByteRange) -> PendingFetch;

    /// Total size of the object in bytes (HEAD request analogue).
    async fn object_size(&self) -> Result<u64, ClientError>;
}
