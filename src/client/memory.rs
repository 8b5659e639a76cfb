//! In-memory object client.
//!
//! Serves ranges out of an owned byte buffer. Stands in for a real
//! object-store client in tests and benchmarks, and doubles as a reference
//! implementation of the [`ObjectClient`] contract.

use std::io::Cursor;

use async_trait::async_trait;
use bytes::Bytes;

use crate::client::{ClientError, ObjectClient, ObjectContent, PendingFetch};
use crate::range::ByteRange;

/// An [`ObjectClient`] backed by a byte buffer held in process memory.
#[derive(Debug, Clone)]
pub struct InMemoryObjectClient {
    data: Bytes,
}

impl InMemoryObjectClient {
    /// Create a client serving the given object body.
    pub fn new(data: impl Into<Bytes>) -> Self {
        Self { data: data.into() }
    }
}

#[async_trait]
impl ObjectClient for InMemoryObjectClient {
    fn fetch_range(&self, range: ByteRange) -> PendingFetch {
        let data = self.data.clone();
        Box::pin(async move {
            if range.end() >= data.len() as u64 {
                return Err(ClientError::RangeNotSatisfiable(range));
            }
            let start = range.start() as usize;
            let end = range.end() as usize;
            let body = data.slice(start..=end);
            Ok(ObjectContent::new(Cursor::new(body)))
        })
    }

    async fn object_size(&self) -> Result<u64, ClientError> {
        Ok(self.data.len() as u64)
    }
}
